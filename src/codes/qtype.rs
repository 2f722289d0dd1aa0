//! Record and query types (TYPE / QTYPE fields).

use std::sync::OnceLock;

use super::{Assignment, Code, CodeKind, NameMatch, Registry, ReservedRange, Table};

/// Marker for the QType registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QTypeKind {}

pub type QType = Code<QTypeKind>;

impl QType {
    pub const A: QType = Code::assigned("A", 1);
    pub const NS: QType = Code::assigned("NS", 2);
    pub const MD: QType = Code::assigned("MD", 3);
    pub const MF: QType = Code::assigned("MF", 4);
    pub const CNAME: QType = Code::assigned("CNAME", 5);
    pub const SOA: QType = Code::assigned("SOA", 6);
    pub const MB: QType = Code::assigned("MB", 7);
    pub const MG: QType = Code::assigned("MG", 8);
    pub const MR: QType = Code::assigned("MR", 9);
    pub const NULL: QType = Code::assigned("NULL", 10);
    pub const WKS: QType = Code::assigned("WKS", 11);
    pub const PTR: QType = Code::assigned("PTR", 12);
    pub const HINFO: QType = Code::assigned("HINFO", 13);
    pub const MINFO: QType = Code::assigned("MINFO", 14);
    pub const MX: QType = Code::assigned("MX", 15);
    pub const TXT: QType = Code::assigned("TXT", 16);
    pub const RP: QType = Code::assigned("RP", 17);
    pub const AFSDB: QType = Code::assigned("AFSDB", 18);
    pub const SIG: QType = Code::assigned("SIG", 24);
    pub const KEY: QType = Code::assigned("KEY", 25);
    pub const AAAA: QType = Code::assigned("AAAA", 28);
    pub const LOC: QType = Code::assigned("LOC", 29);
    pub const SRV: QType = Code::assigned("SRV", 33);
    pub const NAPTR: QType = Code::assigned("NAPTR", 35);
    pub const KX: QType = Code::assigned("KX", 36);
    pub const CERT: QType = Code::assigned("CERT", 37);
    pub const DNAME: QType = Code::assigned("DNAME", 39);
    pub const OPT: QType = Code::assigned("OPT", 41);
    pub const APL: QType = Code::assigned("APL", 42);
    pub const DS: QType = Code::assigned("DS", 43);
    pub const SSHFP: QType = Code::assigned("SSHFP", 44);
    pub const IPSECKEY: QType = Code::assigned("IPSECKEY", 45);
    pub const RRSIG: QType = Code::assigned("RRSIG", 46);
    pub const NSEC: QType = Code::assigned("NSEC", 47);
    pub const DNSKEY: QType = Code::assigned("DNSKEY", 48);
    pub const DHCID: QType = Code::assigned("DHCID", 49);
    pub const NSEC3: QType = Code::assigned("NSEC3", 50);
    pub const NSEC3PARAM: QType = Code::assigned("NSEC3PARAM", 51);
    pub const TLSA: QType = Code::assigned("TLSA", 52);
    pub const CDS: QType = Code::assigned("CDS", 59);
    pub const CDNSKEY: QType = Code::assigned("CDNSKEY", 60);
    pub const TKEY: QType = Code::assigned("TKEY", 249);
    pub const TSIG: QType = Code::assigned("TSIG", 250);
    pub const IXFR: QType = Code::assigned("IXFR", 251);
    pub const AXFR: QType = Code::assigned("AXFR", 252);
    pub const MAILB: QType = Code::assigned("MAILB", 253);
    pub const MAILA: QType = Code::assigned("MAILA", 254);
    pub const QTYPE_ALL: QType = Code::assigned("QTYPE_ALL", 255);
    pub const CAA: QType = Code::assigned("CAA", 257);
    pub const TA: QType = Code::assigned("TA", 32768);
    pub const DLV: QType = Code::assigned("DLV", 32769);
}

const TABLE: Table<QTypeKind> = Table {
    kind: "QType",
    entries: &[
        QType::A,
        QType::NS,
        QType::MD,
        QType::MF,
        QType::CNAME,
        QType::SOA,
        QType::MB,
        QType::MG,
        QType::MR,
        QType::NULL,
        QType::WKS,
        QType::PTR,
        QType::HINFO,
        QType::MINFO,
        QType::MX,
        QType::TXT,
        QType::RP,
        QType::AFSDB,
        QType::SIG,
        QType::KEY,
        QType::AAAA,
        QType::LOC,
        QType::SRV,
        QType::NAPTR,
        QType::KX,
        QType::CERT,
        QType::DNAME,
        QType::OPT,
        QType::APL,
        QType::DS,
        QType::SSHFP,
        QType::IPSECKEY,
        QType::RRSIG,
        QType::NSEC,
        QType::DNSKEY,
        QType::DHCID,
        QType::NSEC3,
        QType::NSEC3PARAM,
        QType::TLSA,
        QType::CDS,
        QType::CDNSKEY,
        QType::TKEY,
        QType::TSIG,
        QType::IXFR,
        QType::AXFR,
        QType::MAILB,
        QType::MAILA,
        QType::QTYPE_ALL,
        QType::CAA,
        QType::TA,
        QType::DLV,
    ],
    aliases: &[],
    // Unnamed types still decode; only 0 and 65535 are rejected.
    reserved: &[ReservedRange::new(1, 65534, Assignment::AvailableForAssignment)],
    placeholders: &[],
    name_match: NameMatch::Exact,
};

impl CodeKind for QTypeKind {
    const TABLE: &'static Table<Self> = &TABLE;

    fn registry() -> &'static Registry<Self> {
        static REGISTRY: OnceLock<Registry<QTypeKind>> = OnceLock::new();
        REGISTRY.get_or_init(|| Registry::new(Self::TABLE))
    }
}
