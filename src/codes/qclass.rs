//! Query classes (CLASS / QCLASS fields).
//!
//! Names match regardless of ASCII case, unlike the other registries, so
//! configuration may write `in` or `IN`.

use std::sync::OnceLock;

use super::{Assignment, Code, CodeKind, NameMatch, Registry, ReservedRange, Table};

/// Marker for the QClass registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QClassKind {}

pub type QClass = Code<QClassKind>;

impl QClass {
    pub const IN: QClass = Code::assigned("IN", 1);
    pub const CS: QClass = Code::assigned("CS", 2);
    pub const CH: QClass = Code::assigned("CH", 3);
    pub const HS: QClass = Code::assigned("HS", 4);
    pub const NONE: QClass = Code::assigned("NONE", 254);
    pub const ANY: QClass = Code::assigned("ANY", 255);
}

const TABLE: Table<QClassKind> = Table {
    kind: "QClass",
    entries: &[
        QClass::IN,
        QClass::CS,
        QClass::CH,
        QClass::HS,
        QClass::NONE,
        QClass::ANY,
    ],
    aliases: &[],
    // OPT records reuse CLASS as the requestor's UDP payload size, which
    // lands in the open ranges.
    reserved: &[
        ReservedRange::new(5, 253, Assignment::AvailableForAssignment),
        ReservedRange::new(256, 65279, Assignment::AvailableForAssignment),
        ReservedRange::new(65280, 65534, Assignment::PrivateUse),
    ],
    placeholders: &[],
    name_match: NameMatch::IgnoreAsciiCase,
};

impl CodeKind for QClassKind {
    const TABLE: &'static Table<Self> = &TABLE;

    fn registry() -> &'static Registry<Self> {
        static REGISTRY: OnceLock<Registry<QClassKind>> = OnceLock::new();
        REGISTRY.get_or_init(|| Registry::new(Self::TABLE))
    }
}
