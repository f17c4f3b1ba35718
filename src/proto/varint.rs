use super::DecodeError;

/// Longest varint accepted for a `u64`.
const MAX_VARINT_LEN: usize = 10;

/// Appends `value` as a base-128 little-endian varint.
pub fn encode_varint(mut value: u64, out: &mut Vec<u8>) {
    while value > 0x7f {
        out.push((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

/// Reads a varint starting at `offset`.
///
/// Returns the decoded value and the offset of the first byte after it.
pub fn read_varint(buf: &[u8], offset: usize) -> Result<(u64, usize), DecodeError> {
    let mut result: u64 = 0;
    let mut shift = 0;
    let mut pos = offset;

    loop {
        let byte = *buf.get(pos).ok_or(DecodeError::Truncated { offset: pos })?;
        pos += 1;

        if pos - offset > MAX_VARINT_LEN {
            return Err(DecodeError::VarintOverflow { offset });
        }

        result |= u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return Ok((result, pos));
        }
        shift += 7;
    }
}

/// Reads a varint length prefix and converts it to `usize`.
pub fn read_length(buf: &[u8], offset: usize) -> Result<(usize, usize), DecodeError> {
    let (value, next) = read_varint(buf, offset)?;
    let len = usize::try_from(value).map_err(|_| DecodeError::Truncated { offset })?;
    Ok((len, next))
}
