//! Utility functions for reading wire data.
//!
//! Every read is bounds-checked and reports `DecodeError::Truncated` with the
//! offset that ran short instead of panicking on a bad index.

use crate::errors::DecodeError;

/// Borrow `len` bytes starting at `offset`.
///
/// # Arguments
/// * `buf` - The whole message buffer.
/// * `offset` - Absolute offset of the first byte.
/// * `len` - Number of bytes required.
///
/// # Returns
/// The requested slice, or `Truncated` if the buffer ends early.
pub fn read_slice(buf: &[u8], offset: usize, len: usize) -> Result<&[u8], DecodeError> {
    offset
        .checked_add(len)
        .and_then(|end| buf.get(offset..end))
        .ok_or(DecodeError::Truncated {
            offset,
            needed: len,
            available: buf.len().saturating_sub(offset),
        })
}

pub fn read_u8(buf: &[u8], offset: usize) -> Result<u8, DecodeError> {
    read_slice(buf, offset, 1).map(|b| b[0])
}

/// Read a big-endian `u16`.
pub fn read_u16(buf: &[u8], offset: usize) -> Result<u16, DecodeError> {
    let bytes = read_slice(buf, offset, 2)?;
    Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
}

/// Read a big-endian `u32`.
pub fn read_u32(buf: &[u8], offset: usize) -> Result<u32, DecodeError> {
    let bytes = read_slice(buf, offset, 4)?;
    Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Read a big-endian `i32`.
pub fn read_i32(buf: &[u8], offset: usize) -> Result<i32, DecodeError> {
    read_u32(buf, offset).map(|v| v as i32)
}

/// Render a packet as rows of 16 hex bytes for trace logging.
pub fn hex_dump(buf: &[u8]) -> String {
    buf.chunks(16)
        .enumerate()
        .map(|(row, chunk)| format!("{:04x}  {}", row * 16, hex::encode(chunk)))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_in_bounds() {
        let buf = [0x12, 0x34, 0xff, 0xff, 0xff, 0xfe];
        assert_eq!(read_u8(&buf, 1).unwrap(), 0x34);
        assert_eq!(read_u16(&buf, 0).unwrap(), 0x1234);
        assert_eq!(read_i32(&buf, 2).unwrap(), -2);
        assert_eq!(read_slice(&buf, 4, 2).unwrap(), &[0xff, 0xfe]);
    }

    #[test]
    fn test_reads_past_end_are_truncated() {
        let buf = [0u8; 3];
        assert_eq!(
            read_u16(&buf, 2),
            Err(DecodeError::Truncated {
                offset: 2,
                needed: 2,
                available: 1
            })
        );
        assert!(read_u32(&buf, 0).is_err());
        assert!(read_u8(&buf, 10).is_err());
        assert!(read_slice(&buf, usize::MAX, 2).is_err());
    }

    #[test]
    fn test_hex_dump_rows() {
        let dump = hex_dump(&[0xab; 20]);
        let lines: Vec<_> = dump.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("0010  abababab"));
    }
}
