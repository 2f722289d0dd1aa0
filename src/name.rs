//! Domain names and label compression.
//!
//! A [`Name`] is kept as raw label bytes; nothing about a label has to be
//! valid UTF-8 on the wire. Display follows master-file conventions, escaping
//! dots, backslashes and unprintable bytes.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use log::trace;
use serde::{Serialize, Serializer};

use crate::errors::{DecodeError, EncodeError};
use crate::utils::{read_slice, read_u8};

/// Longest label allowed on the wire.
pub const MAX_LABEL_LEN: usize = 63;

/// Longest name allowed on the wire, counting length bytes and the root label.
pub const MAX_NAME_LEN: usize = 255;

const LABEL_TYPE_MASK: u8 = 0xC0;
const POINTER_TAG: u8 = 0xC0;
const POINTER_OFFSET_MASK: u8 = 0x3F;

/// A domain name as an ordered list of labels, root excluded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Name {
    labels: Vec<Vec<u8>>,
}

impl Name {
    /// The root name `.`.
    pub fn root() -> Self {
        Self::default()
    }

    /// Build a name from raw labels, checking the RFC 1035 size limits.
    pub fn from_labels<I, L>(labels: I) -> Result<Self, EncodeError>
    where
        I: IntoIterator<Item = L>,
        L: Into<Vec<u8>>,
    {
        let labels: Vec<Vec<u8>> = labels.into_iter().map(Into::into).collect();
        let name = Self { labels };

        for label in &name.labels {
            if label.is_empty() {
                return Err(EncodeError::EmptyLabel {
                    name: name.to_string(),
                });
            }
            if label.len() > MAX_LABEL_LEN {
                return Err(EncodeError::LabelTooLong {
                    label: String::from_utf8_lossy(label).into_owned(),
                });
            }
        }
        if name.wire_len() > MAX_NAME_LEN {
            return Err(EncodeError::NameTooLong {
                name: name.to_string(),
            });
        }
        Ok(name)
    }

    pub fn labels(&self) -> impl Iterator<Item = &[u8]> {
        self.labels.iter().map(Vec::as_slice)
    }

    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    pub fn is_root(&self) -> bool {
        self.labels.is_empty()
    }

    /// Size of the uncompressed wire encoding.
    pub fn wire_len(&self) -> usize {
        self.labels.iter().map(|l| l.len() + 1).sum::<usize>() + 1
    }

    /// Append the uncompressed wire encoding to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        for label in self.labels() {
            out.push(label.len() as u8);
            out.extend_from_slice(label);
        }
        out.push(0);
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str(".");
        }
        for (i, label) in self.labels().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            for &byte in label {
                match byte {
                    b'.' | b'\\' => write!(f, "\\{}", byte as char)?,
                    0x21..=0x7e => write!(f, "{}", byte as char)?,
                    _ => write!(f, "\\{:03}", byte)?,
                }
            }
        }
        Ok(())
    }
}

impl FromStr for Name {
    type Err = EncodeError;

    /// Parse dotted text. A trailing dot is optional and `.` or an empty
    /// string is the root. `\.`, `\\` and `\DDD` escapes are understood.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s == "." {
            return Ok(Self::root());
        }

        let bytes = s.as_bytes();
        let mut labels = Vec::new();
        let mut current = Vec::new();
        let mut after_separator = false;
        let mut i = 0;
        while i < bytes.len() {
            after_separator = false;
            match bytes[i] {
                b'\\' => match bytes.get(i + 1) {
                    Some(d) if d.is_ascii_digit() => {
                        current.push(decimal_escape(s, &bytes[i + 1..])?);
                        i += 4;
                    }
                    Some(&escaped) => {
                        current.push(escaped);
                        i += 2;
                    }
                    None => {
                        current.push(b'\\');
                        i += 1;
                    }
                },
                b'.' => {
                    labels.push(std::mem::take(&mut current));
                    after_separator = true;
                    i += 1;
                }
                other => {
                    current.push(other);
                    i += 1;
                }
            }
        }
        // An unescaped trailing dot is the root, not an empty label.
        if !after_separator {
            labels.push(current);
        }

        Self::from_labels(labels)
    }
}

/// Value of a `\DDD` escape. `rest` starts at the first digit.
fn decimal_escape(name: &str, rest: &[u8]) -> Result<u8, EncodeError> {
    let invalid = || EncodeError::InvalidEscape {
        name: name.to_string(),
    };
    match rest.get(..3) {
        Some(digits) if digits.iter().all(u8::is_ascii_digit) => {
            let value = digits
                .iter()
                .fold(0u16, |acc, d| acc * 10 + u16::from(d - b'0'));
            u8::try_from(value).map_err(|_| invalid())
        }
        _ => Err(invalid()),
    }
}

impl Serialize for Name {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Decode a possibly compressed name starting at `offset`.
///
/// Compression pointers hold an absolute offset from the first byte of the
/// message. The returned offset is the position just past the name at the
/// call site: past the root label, or past the first pointer if one was
/// followed. Every pointer target is recorded so a chain that comes back to
/// an offset already visited fails with `CompressionLoop` instead of spinning.
///
/// # Arguments
/// * `buf` - The whole DNS message.
/// * `offset` - Where the name starts.
///
/// # Returns
/// The decoded name and the offset of the next field.
pub fn decode_name(buf: &[u8], offset: usize) -> Result<(Name, usize), DecodeError> {
    let mut labels = Vec::new();
    let mut pos = offset;
    let mut next_offset = None;
    let mut visited = HashSet::from([offset]);
    let mut wire_len = 1;

    loop {
        let len = read_u8(buf, pos)?;
        match len & LABEL_TYPE_MASK {
            POINTER_TAG => {
                let low = read_u8(buf, pos + 1)?;
                let target = (usize::from(len & POINTER_OFFSET_MASK) << 8) | usize::from(low);
                next_offset.get_or_insert(pos + 2);
                if !visited.insert(target) {
                    return Err(DecodeError::CompressionLoop { offset: pos });
                }
                trace!("Following compression pointer at {} to {}", pos, target);
                pos = target;
            }
            0x00 if len == 0 => {
                let end = next_offset.unwrap_or(pos + 1);
                return Ok((Name { labels }, end));
            }
            0x00 => {
                let len = usize::from(len);
                wire_len += len + 1;
                if wire_len > MAX_NAME_LEN {
                    return Err(DecodeError::NameTooLong { offset });
                }
                let label = read_slice(buf, pos + 1, len)?;
                labels.push(label.to_vec());
                pos += 1 + len;
            }
            _ => return Err(DecodeError::InvalidLabel { offset: pos, byte: len }),
        }
    }
}
