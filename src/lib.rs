//! gdns library
//!
//! A strict decoder for the RFC 1035 DNS wire format, the code registries it
//! resolves header and question codes against, and a small forwarding
//! server that logs every decoded message before relaying it upstream.

pub mod codes;
pub mod config;
pub mod dns;
pub mod encode;
pub mod errors;
pub mod forward;
pub mod handlers;
pub mod message;
pub mod name;
pub mod utils;

// Re-export commonly used items
pub use codes::{OpCode, QClass, QType, RCode};
pub use config::{Configuration, ServerConfig};
pub use dns::decode;
pub use encode::encode_message;
pub use errors::{DecodeError, DnsError, MessageDecodeError, Section};
pub use message::{Header, Message, Question, ResourceRecord};
pub use name::{decode_name, Name};
