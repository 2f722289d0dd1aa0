//! Error types for the DNS server.
//!
//! Decoding and encoding errors are kept separate from the server-level
//! `DnsError` so the codec can be used without any of the transport code.

use std::fmt;

use thiserror::Error;

/// Represents errors that can occur in the DNS server.
#[derive(Error, Debug)]
pub enum DnsError {
    /// I/O errors from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A message could not be decoded.
    #[error("Decode error: {0}")]
    Decode(#[from] MessageDecodeError),

    /// A message could not be encoded.
    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),

    /// Configuration errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// YAML configuration could not be parsed.
    #[error("YAML configuration error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON configuration could not be parsed.
    #[error("JSON configuration error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A numeric code that falls outside every assigned or reserved range of a registry.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{kind} code {code} is not assigned or reserved")]
pub struct UnknownCode {
    /// Registry the lookup was made against (`OpCode`, `RCode`, ...).
    pub kind: &'static str,
    pub code: u16,
}

/// A name that no registry entry, alias or placeholder matches.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} name {name:?} not available")]
pub struct NameNotFound {
    pub kind: &'static str,
    pub name: String,
}

/// Errors produced while reading wire-format data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The buffer ends before a field is complete.
    #[error("truncated at offset {offset}: need {needed} bytes, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A numeric code was outside every known or reserved range.
    #[error(transparent)]
    UnknownCode(#[from] UnknownCode),

    /// Following compression pointers revisited an offset.
    #[error("compression pointer loop at offset {offset}")]
    CompressionLoop { offset: usize },

    /// A domain name exceeded 255 octets on the wire.
    #[error("domain name starting at offset {offset} exceeds 255 octets")]
    NameTooLong { offset: usize },

    /// A label length byte used one of the reserved `01`/`10` type prefixes.
    #[error("unsupported label type 0x{byte:02x} at offset {offset}")]
    InvalidLabel { offset: usize, byte: u8 },
}

impl DecodeError {
    /// Whether the input itself is structurally broken, as opposed to merely
    /// carrying a code this server does not know.
    pub fn is_malformed(&self) -> bool {
        !matches!(self, DecodeError::UnknownCode(_))
    }
}

/// Message section in which a decode failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Header,
    Question,
    Answer,
    Authority,
    Additional,
}

impl Section {
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Header => "header",
            Section::Question => "question",
            Section::Answer => "answer",
            Section::Authority => "authority",
            Section::Additional => "additional",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A whole-message decode failure, tagged with the section that failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to decode {section} section: {source}")]
pub struct MessageDecodeError {
    pub section: Section,
    #[source]
    pub source: DecodeError,
}

impl MessageDecodeError {
    pub fn new(section: Section, source: DecodeError) -> Self {
        Self { section, source }
    }
}

/// Errors produced while writing wire-format data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("label {label:?} exceeds 63 octets")]
    LabelTooLong { label: String },

    #[error("empty label in domain name {name:?}")]
    EmptyLabel { name: String },

    /// A `\DDD` escape that is not three digits or is above 255.
    #[error("invalid decimal escape in domain name {name:?}")]
    InvalidEscape { name: String },

    #[error("domain name {name:?} exceeds 255 octets")]
    NameTooLong { name: String },

    #[error("RDATA of {len} bytes exceeds 65535")]
    RdataTooLong { len: usize },

    #[error("{section} section has {count} entries, more than a 16-bit count allows")]
    TooManyEntries { section: Section, count: usize },

    /// OPCODE and RCODE have four bits in the header.
    #[error("{kind} code {code} does not fit the 4-bit header field")]
    CodeOutOfRange { kind: &'static str, code: u16 },
}
