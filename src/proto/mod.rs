//! Minimal protobuf wire-format codec for the canvas endpoint.
//!
//! Only the two message shapes the canvas endpoint uses are supported:
//!
//! ```text
//! CanvasRequest  { repeated Track tracks = 1; }   Track  { string track_uri = 1; }
//! CanvasResponse { repeated Canvas canvases = 1; } Canvas { string canvas_url = 2; ... }
//! ```
//!
//! The byte layout matches what the web player sends, including the `0x0A` tag
//! used at both nesting levels of the request. See [`canvas::SkipStrategy`] for
//! how fields other than `canvas_url` are stepped over.

pub mod canvas;
pub mod varint;

use thiserror::Error;

pub use canvas::{
    CanvasEntry, CanvasRequest, CanvasResponse, SkipStrategy, decode_response, encode_request,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("message truncated at byte {offset}")]
    Truncated { offset: usize },

    #[error("varint at byte {offset} is longer than 10 bytes")]
    VarintOverflow { offset: usize },

    #[error("unsupported wire type {wire_type} at byte {offset}")]
    UnsupportedWireType { wire_type: u8, offset: usize },
}
