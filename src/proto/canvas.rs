use serde::Serialize;

use super::{
    DecodeError,
    varint::{encode_varint, read_length, read_varint},
};

/// `CanvasRequest.tracks` (field 1, length-delimited).
pub const TRACKS_TAG: u8 = 0x0A;
/// `CanvasRequest.Track.track_uri` (field 1, length-delimited).
///
/// Shares its byte with [`TRACKS_TAG`]; both messages number the field 1.
pub const TRACK_URI_TAG: u8 = 0x0A;
/// `CanvasResponse.canvases` (field 1, length-delimited).
pub const CANVASES_TAG: u8 = 0x0A;
/// `CanvasResponse.Canvas.canvas_url` (field 2, length-delimited).
pub const CANVAS_URL_TAG: u8 = 0x12;

/// How fields the decoder does not know are stepped over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SkipStrategy {
    /// Tags are read as a single byte and every unknown field is assumed to be
    /// length-delimited: a varint length followed by that many bytes. This is
    /// not a general protobuf skip; a varint or fixed-width field will make
    /// the decoder misread what follows. A skip that runs past the enclosing
    /// message ends parsing of that message instead of failing.
    #[default]
    LengthDelimited,
    /// Tags are read as varints and unknown fields are skipped according to
    /// their wire type (varint, 64-bit, length-delimited, 32-bit). Groups are
    /// rejected.
    WireType,
}

/// Request body for the canvas endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanvasRequest {
    tracks: Vec<String>,
}

impl CanvasRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_track(&mut self, track_uri: impl Into<String>) -> &mut Self {
        self.tracks.push(track_uri.into());
        self
    }

    pub fn tracks(&self) -> &[String] {
        &self.tracks
    }

    /// Serializes the request: every track becomes a `0x0A`-tagged submessage
    /// that itself holds the URI under `0x0A`.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for uri in &self.tracks {
            let track = encode_track(uri);
            out.push(TRACKS_TAG);
            encode_varint(track.len() as u64, &mut out);
            out.extend_from_slice(&track);
        }
        out
    }
}

fn encode_track(track_uri: &str) -> Vec<u8> {
    let uri = track_uri.as_bytes();
    let mut out = Vec::with_capacity(uri.len() + 6);
    out.push(TRACK_URI_TAG);
    encode_varint(uri.len() as u64, &mut out);
    out.extend_from_slice(uri);
    out
}

/// Encodes a canvas request for the given track URIs.
pub fn encode_request<S: AsRef<str>>(track_uris: &[S]) -> Vec<u8> {
    let mut request = CanvasRequest::new();
    for uri in track_uris {
        request.add_track(uri.as_ref());
    }
    request.encode()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasEntry {
    pub canvas_url: Option<String>,
}

/// Decoded canvas response, in wire order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasResponse {
    #[serde(rename = "canvasesList")]
    pub canvases: Vec<CanvasEntry>,
}

impl CanvasResponse {
    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        Self::decode_with(buf, SkipStrategy::default())
    }

    pub fn decode_with(buf: &[u8], strategy: SkipStrategy) -> Result<Self, DecodeError> {
        let mut canvases = Vec::new();
        let mut offset = 0;

        while offset < buf.len() {
            let (tag, after_tag) = read_tag(buf, offset, strategy)?;

            if tag == u64::from(CANVASES_TAG) {
                let (len, start) = read_length(buf, after_tag)?;
                let end = bounded_end(start, len, buf.len())?;
                canvases.push(decode_canvas(&buf[..end], start, strategy)?);
                offset = end;
                continue;
            }

            match skip_field(buf, tag, after_tag, strategy)? {
                Some(next) => offset = next,
                None => break,
            }
        }

        Ok(Self { canvases })
    }

    /// The first canvas on the wire, the one callers treat as the canvas.
    pub fn primary(&self) -> Option<&CanvasEntry> {
        self.canvases.first()
    }

    pub fn canvas_url(&self) -> Option<&str> {
        self.primary().and_then(|c| c.canvas_url.as_deref())
    }
}

/// Decodes a canvas response with the default [`SkipStrategy`].
pub fn decode_response(buf: &[u8]) -> Result<CanvasResponse, DecodeError> {
    CanvasResponse::decode(buf)
}

/// Parses one canvas submessage occupying `buf[start..]`; `buf` is already cut
/// at the submessage end.
fn decode_canvas(
    buf: &[u8],
    start: usize,
    strategy: SkipStrategy,
) -> Result<CanvasEntry, DecodeError> {
    let mut entry = CanvasEntry::default();
    let mut offset = start;

    while offset < buf.len() {
        let (tag, after_tag) = read_tag(buf, offset, strategy)?;

        if tag == u64::from(CANVAS_URL_TAG) {
            let (len, url_start) = read_length(buf, after_tag)?;
            let end = bounded_end(url_start, len, buf.len())?;
            entry.canvas_url = Some(String::from_utf8_lossy(&buf[url_start..end]).into_owned());
            offset = end;
            continue;
        }

        match skip_field(buf, tag, after_tag, strategy)? {
            Some(next) => offset = next,
            None => break,
        }
    }

    Ok(entry)
}

fn read_tag(buf: &[u8], offset: usize, strategy: SkipStrategy) -> Result<(u64, usize), DecodeError> {
    match strategy {
        SkipStrategy::LengthDelimited => buf
            .get(offset)
            .map(|b| (u64::from(*b), offset + 1))
            .ok_or(DecodeError::Truncated { offset }),
        SkipStrategy::WireType => read_varint(buf, offset),
    }
}

/// Steps over the value of a field whose tag has been consumed.
///
/// `Ok(None)` means a naive skip ran past the end of `buf`.
fn skip_field(
    buf: &[u8],
    tag: u64,
    offset: usize,
    strategy: SkipStrategy,
) -> Result<Option<usize>, DecodeError> {
    match strategy {
        SkipStrategy::LengthDelimited => {
            let (len, start) = read_length(buf, offset)?;
            Ok(start.checked_add(len).filter(|end| *end <= buf.len()))
        }
        SkipStrategy::WireType => {
            let next = match tag & 0x07 {
                0 => read_varint(buf, offset)?.1,
                1 => bounded_end(offset, 8, buf.len())?,
                2 => {
                    let (len, start) = read_length(buf, offset)?;
                    bounded_end(start, len, buf.len())?
                }
                5 => bounded_end(offset, 4, buf.len())?,
                wire_type => {
                    return Err(DecodeError::UnsupportedWireType {
                        wire_type: wire_type as u8,
                        offset,
                    });
                }
            };
            Ok(Some(next))
        }
    }
}

fn bounded_end(start: usize, len: usize, limit: usize) -> Result<usize, DecodeError> {
    start
        .checked_add(len)
        .filter(|end| *end <= limit)
        .ok_or(DecodeError::Truncated { offset: start })
}
