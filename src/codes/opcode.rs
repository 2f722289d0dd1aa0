//! Operation codes (header OPCODE field).

use std::sync::OnceLock;

use super::{Assignment, Code, CodeKind, NameMatch, Registry, ReservedRange, Table};

/// Marker for the OpCode registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpCodeKind {}

pub type OpCode = Code<OpCodeKind>;

impl OpCode {
    pub const QUERY: OpCode = Code::assigned("Query", 0);
    pub const IQUERY: OpCode = Code::assigned("IQuery", 1);
    pub const STATUS: OpCode = Code::assigned("Status", 2);
    pub const NOTIFY: OpCode = Code::assigned("Notify", 4);
    pub const UPDATE: OpCode = Code::assigned("Update", 5);
}

const TABLE: Table<OpCodeKind> = Table {
    kind: "OpCode",
    entries: &[
        OpCode::QUERY,
        OpCode::IQUERY,
        OpCode::STATUS,
        OpCode::NOTIFY,
        OpCode::UPDATE,
    ],
    aliases: &[],
    reserved: &[
        ReservedRange::new(3, 3, Assignment::AvailableForAssignment),
        ReservedRange::new(6, 15, Assignment::AvailableForAssignment),
    ],
    placeholders: &[Code::placeholder(Assignment::AvailableForAssignment, 3)],
    name_match: NameMatch::Exact,
};

impl CodeKind for OpCodeKind {
    const TABLE: &'static Table<Self> = &TABLE;

    fn registry() -> &'static Registry<Self> {
        static REGISTRY: OnceLock<Registry<OpCodeKind>> = OnceLock::new();
        REGISTRY.get_or_init(|| Registry::new(Self::TABLE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::UnknownCode;

    #[test]
    fn test_assigned_codes() {
        assert_eq!(OpCode::by_code(0).unwrap(), OpCode::QUERY);
        assert_eq!(OpCode::by_code(5).unwrap(), OpCode::UPDATE);
        assert_eq!(OpCode::by_name("Notify").unwrap().code(), 4);
    }

    #[test]
    fn test_reserved_codes() {
        for code in [3u16, 6, 10, 15] {
            let op = OpCode::by_code(code).unwrap();
            assert_eq!(op.name(), "AvailableForAssignment");
            assert_eq!(op.code(), code);
            assert!(!op.is_assigned());
        }
        assert_eq!(OpCode::by_name("AvailableForAssignment").unwrap().code(), 3);
    }

    #[test]
    fn test_out_of_range() {
        assert_eq!(
            OpCode::by_code(16),
            Err(UnknownCode { kind: "OpCode", code: 16 })
        );
    }

    #[test]
    fn test_names_are_case_sensitive() {
        assert!(OpCode::by_name("query").is_err());
        assert!(OpCode::by_name("QUERY").is_err());
        assert!(OpCode::by_name("Query").is_ok());
    }
}
