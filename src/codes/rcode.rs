//! Response codes.
//!
//! Only the low four bits travel in the header; the extended values (16 and
//! up) appear in OPT and TSIG records but share this registry.

use std::sync::OnceLock;

use super::{Assignment, Code, CodeKind, NameMatch, Registry, ReservedRange, Table};

/// Marker for the RCode registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RCodeKind {}

pub type RCode = Code<RCodeKind>;

impl RCode {
    pub const NO_ERROR: RCode = Code::assigned("NoError", 0);
    pub const FORMAT_ERROR: RCode = Code::assigned("FormatError", 1);
    pub const SERVER_FAILURE: RCode = Code::assigned("ServerFailure", 2);
    pub const NX_DOMAIN: RCode = Code::assigned("NXDomain", 3);
    pub const NOT_IMPLEMENTED: RCode = Code::assigned("NotImplemented", 4);
    pub const REFUSED: RCode = Code::assigned("Refused", 5);
    pub const YX_DOMAIN: RCode = Code::assigned("YXDomain", 6);
    pub const YX_RRSET: RCode = Code::assigned("YXRRSet", 7);
    pub const NX_RRSET: RCode = Code::assigned("NXRRSet", 8);
    pub const NOT_AUTHORITATIVE: RCode = Code::assigned("NotAuthoritative", 9);
    pub const NOT_ZONE: RCode = Code::assigned("NotZone", 10);
    /// Shares code 16 with TSIG's BADSIG, which is registered as an alias.
    pub const BAD_OPT_VERSION: RCode = Code::assigned("BadOptVersion", 16);
    pub const BADKEY: RCode = Code::assigned("BADKEY", 17);
    pub const BADTIME: RCode = Code::assigned("BADTIME", 18);
    pub const BADMODE: RCode = Code::assigned("BADMODE", 19);
    pub const BADNAME: RCode = Code::assigned("BADNAME", 20);
    pub const BADALG: RCode = Code::assigned("BADALG", 21);
}

const TABLE: Table<RCodeKind> = Table {
    kind: "RCode",
    entries: &[
        RCode::NO_ERROR,
        RCode::FORMAT_ERROR,
        RCode::SERVER_FAILURE,
        RCode::NX_DOMAIN,
        RCode::NOT_IMPLEMENTED,
        RCode::REFUSED,
        RCode::YX_DOMAIN,
        RCode::YX_RRSET,
        RCode::NX_RRSET,
        RCode::NOT_AUTHORITATIVE,
        RCode::NOT_ZONE,
        RCode::BAD_OPT_VERSION,
        RCode::BADKEY,
        RCode::BADTIME,
        RCode::BADMODE,
        RCode::BADNAME,
        RCode::BADALG,
    ],
    aliases: &[("BADSIG", 16)],
    reserved: &[
        ReservedRange::new(11, 15, Assignment::AvailableForAssignment),
        ReservedRange::new(22, 3840, Assignment::AvailableForAssignment),
        ReservedRange::new(3841, 4095, Assignment::PrivateUse),
        ReservedRange::new(4096, 65535, Assignment::AvailableForAssignment),
    ],
    placeholders: &[
        Code::placeholder(Assignment::AvailableForAssignment, 65535),
        Code::placeholder(Assignment::PrivateUse, 4095),
    ],
    name_match: NameMatch::Exact,
};

impl CodeKind for RCodeKind {
    const TABLE: &'static Table<Self> = &TABLE;

    fn registry() -> &'static Registry<Self> {
        static REGISTRY: OnceLock<Registry<RCodeKind>> = OnceLock::new();
        REGISTRY.get_or_init(|| Registry::new(Self::TABLE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_codes() {
        assert_eq!(RCode::by_code(0).unwrap(), RCode::NO_ERROR);
        assert_eq!(RCode::by_code(3).unwrap(), RCode::NX_DOMAIN);
        assert_eq!(RCode::by_code(5).unwrap().name(), "Refused");
    }

    #[test]
    fn test_every_u16_resolves() {
        // All codes are either named or fall in a reserved range.
        for code in 0..=u16::MAX {
            assert!(RCode::by_code(code).is_ok(), "code {}", code);
        }
    }

    #[test]
    fn test_private_use_is_distinguished() {
        assert_eq!(RCode::by_code(3840).unwrap().assignment(), Assignment::AvailableForAssignment);
        assert_eq!(RCode::by_code(3841).unwrap().assignment(), Assignment::PrivateUse);
        assert_eq!(RCode::by_code(4095).unwrap().assignment(), Assignment::PrivateUse);
        assert_eq!(RCode::by_code(4096).unwrap().assignment(), Assignment::AvailableForAssignment);
        assert_eq!(RCode::by_code(12).unwrap().name(), "AvailableForAssignment");
    }

    #[test]
    fn test_badsig_alias_resolves_to_primary() {
        assert_eq!(RCode::by_name("BADSIG").unwrap(), RCode::BAD_OPT_VERSION);
        assert_eq!(RCode::by_code(16).unwrap().name(), "BadOptVersion");
    }

    #[test]
    fn test_placeholder_names() {
        assert_eq!(RCode::by_name("PrivateUse").unwrap().code(), 4095);
        assert_eq!(RCode::by_name("AvailableForAssignment").unwrap().code(), 65535);
        assert!(RCode::by_name("noerror").is_err());
    }
}
