//! DNS message model.
//!
//! ```text
//! +---------------------+
//! |       Header        |
//! +---------------------+
//! |       Question      | the question for the name server
//! +---------------------+
//! |       Answer        | RRs answering the question
//! +---------------------+
//! |       Authority     | RRs pointing toward an authority
//! +---------------------+
//! |       Additional    | RRs holding additional information
//! +---------------------+
//! ```

use base64::Engine;
use serde::{Serialize, Serializer};

use crate::codes::{OpCode, QClass, QType, RCode};
use crate::name::Name;

/// Size of the fixed header in bytes.
pub const HEADER_LEN: usize = 12;

/// The fixed 12-byte message header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Header {
    pub id: u16,
    /// Set on responses.
    pub qr: bool,
    pub opcode: OpCode,
    /// Authoritative answer.
    pub aa: bool,
    /// Truncated.
    pub tc: bool,
    /// Recursion desired.
    pub rd: bool,
    /// Recursion available.
    pub ra: bool,
    pub z: bool,
    /// Authentic data.
    pub ad: bool,
    /// Checking disabled.
    pub cd: bool,
    pub rcode: RCode,
    pub qd_count: u16,
    pub an_count: u16,
    pub ns_count: u16,
    pub ar_count: u16,
}

impl Default for Header {
    fn default() -> Self {
        Self {
            id: 0,
            qr: false,
            opcode: OpCode::QUERY,
            aa: false,
            tc: false,
            rd: false,
            ra: false,
            z: false,
            ad: false,
            cd: false,
            rcode: RCode::NO_ERROR,
            qd_count: 0,
            an_count: 0,
            ns_count: 0,
            ar_count: 0,
        }
    }
}

/// One entry of the question section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    pub name: Name,
    #[serde(rename = "type")]
    pub qtype: QType,
    #[serde(rename = "class")]
    pub qclass: QClass,
}

impl Question {
    pub fn new(name: Name, qtype: QType, qclass: QClass) -> Self {
        Self { name, qtype, qclass }
    }
}

/// A resource record from the answer, authority or additional section.
///
/// RDATA is kept opaque; its layout depends on `rtype` and `class` and is
/// not interpreted here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceRecord {
    pub name: Name,
    #[serde(rename = "type")]
    pub rtype: QType,
    pub class: QClass,
    /// Seconds the record may be cached. Zero means do not cache.
    pub ttl: i32,
    #[serde(serialize_with = "serialize_rdata")]
    pub rdata: Vec<u8>,
}

impl ResourceRecord {
    pub fn new(name: Name, rtype: QType, class: QClass, ttl: i32, rdata: Vec<u8>) -> Self {
        Self {
            name,
            rtype,
            class,
            ttl,
            rdata,
        }
    }

    /// RDLENGTH as it appears on the wire. Decoded records always fit.
    pub fn rdlength(&self) -> usize {
        self.rdata.len()
    }

    pub fn is_cacheable(&self) -> bool {
        self.ttl != 0
    }
}

fn serialize_rdata<S: Serializer>(rdata: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&base64::engine::general_purpose::STANDARD.encode(rdata))
}

/// A complete DNS message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Message {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<ResourceRecord>,
    pub authority: Vec<ResourceRecord>,
    pub additional: Vec<ResourceRecord>,
}

impl Message {
    /// Name of the first question, if any, for logging.
    pub fn query_name(&self) -> Option<&Name> {
        self.questions.first().map(|q| &q.name)
    }
}
