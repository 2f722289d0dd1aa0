//! Protocol code registries.
//!
//! OpCode, RCode, QType and QClass are all the same shape: a closed table of
//! `(name, code)` pairs plus ranges that are reserved but unnamed. A single
//! generic [`Registry`] serves all four, parameterised by a static [`Table`].
//! Lookups go through hash maps built once on first use and shared by every
//! thread afterwards.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use serde::de::{self, Deserialize, Deserializer, Visitor};
use serde::ser::{Serialize, Serializer};

use crate::errors::{NameNotFound, UnknownCode};

pub mod opcode;
pub mod qclass;
pub mod qtype;
pub mod rcode;

pub use opcode::{OpCode, OpCodeKind};
pub use qclass::{QClass, QClassKind};
pub use qtype::{QType, QTypeKind};
pub use rcode::{RCode, RCodeKind};

/// Placeholder name for codes in a range open for future assignment.
pub const AVAILABLE_FOR_ASSIGNMENT: &str = "AvailableForAssignment";

/// Placeholder name for codes in a private-use range.
pub const PRIVATE_USE: &str = "PrivateUse";

/// How a code relates to its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Assignment {
    /// The code has a canonical name.
    Assigned,
    AvailableForAssignment,
    PrivateUse,
}

/// Name comparison policy of a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameMatch {
    Exact,
    IgnoreAsciiCase,
}

impl NameMatch {
    fn key(&self, name: &str) -> String {
        match self {
            NameMatch::Exact => name.to_string(),
            NameMatch::IgnoreAsciiCase => name.to_ascii_uppercase(),
        }
    }
}

/// An inclusive range of codes that is reserved but has no names.
#[derive(Debug, Clone, Copy)]
pub struct ReservedRange {
    pub first: u16,
    pub last: u16,
    pub assignment: Assignment,
}

impl ReservedRange {
    pub const fn new(first: u16, last: u16, assignment: Assignment) -> Self {
        Self { first, last, assignment }
    }

    pub fn contains(&self, code: u16) -> bool {
        (self.first..=self.last).contains(&code)
    }
}

/// Ties a marker type to its static table and shared registry.
pub trait CodeKind: Sized + 'static {
    const TABLE: &'static Table<Self>;

    fn registry() -> &'static Registry<Self>;
}

/// The fixed contents of one registry.
pub struct Table<K: 'static> {
    /// Registry name used in errors and debug output.
    pub kind: &'static str,
    /// Canonical entries. Codes must be unique.
    pub entries: &'static [Code<K>],
    /// Extra names that resolve to the canonical entry with the given code.
    pub aliases: &'static [(&'static str, u16)],
    /// Reserved ranges, checked after `entries`.
    pub reserved: &'static [ReservedRange],
    /// Values returned when a placeholder name is looked up.
    pub placeholders: &'static [Code<K>],
    pub name_match: NameMatch,
}

/// Bidirectional lookup over a [`Table`].
pub struct Registry<K: 'static> {
    table: &'static Table<K>,
    by_code: HashMap<u16, Code<K>>,
    by_name: HashMap<String, Code<K>>,
}

impl<K: 'static> Registry<K> {
    /// Index a table. Later duplicates never shadow earlier entries.
    pub fn new(table: &'static Table<K>) -> Self {
        let mut by_code = HashMap::with_capacity(table.entries.len());
        let mut by_name = HashMap::with_capacity(
            table.entries.len() + table.aliases.len() + table.placeholders.len(),
        );

        for &entry in table.entries {
            by_code.entry(entry.code).or_insert(entry);
            by_name
                .entry(table.name_match.key(entry.name))
                .or_insert(entry);
        }
        for &(alias, code) in table.aliases {
            if let Some(&primary) = by_code.get(&code) {
                by_name.entry(table.name_match.key(alias)).or_insert(primary);
            }
        }
        for &placeholder in table.placeholders {
            by_name
                .entry(table.name_match.key(placeholder.name))
                .or_insert(placeholder);
        }

        Self {
            table,
            by_code,
            by_name,
        }
    }

    pub fn kind(&self) -> &'static str {
        self.table.kind
    }

    /// Resolve a numeric code to its canonical value or a reserved-range placeholder.
    pub fn by_code(&self, code: u16) -> Result<Code<K>, UnknownCode> {
        if let Some(&found) = self.by_code.get(&code) {
            return Ok(found);
        }
        self.table
            .reserved
            .iter()
            .find(|range| range.contains(code))
            .map(|range| Code::placeholder(range.assignment, code))
            .ok_or(UnknownCode {
                kind: self.table.kind,
                code,
            })
    }

    /// Resolve a name, honouring the table's case policy.
    pub fn by_name(&self, name: &str) -> Result<Code<K>, NameNotFound> {
        let found = match self.table.name_match {
            NameMatch::Exact => self.by_name.get(name),
            NameMatch::IgnoreAsciiCase => self.by_name.get(&name.to_ascii_uppercase()),
        };
        found.copied().ok_or_else(|| NameNotFound {
            kind: self.table.kind,
            name: name.to_string(),
        })
    }

    /// Canonical entries in table order.
    pub fn entries(&self) -> &'static [Code<K>] {
        self.table.entries
    }
}

/// One protocol code: a canonical (or placeholder) name and its numeric value.
///
/// `K` is a marker selecting the registry, so an `OpCode` can never be
/// compared with or passed as a `QType`.
pub struct Code<K> {
    name: &'static str,
    code: u16,
    assignment: Assignment,
    kind: PhantomData<fn() -> K>,
}

impl<K> Code<K> {
    pub(crate) const fn assigned(name: &'static str, code: u16) -> Self {
        Self {
            name,
            code,
            assignment: Assignment::Assigned,
            kind: PhantomData,
        }
    }

    pub(crate) const fn placeholder(assignment: Assignment, code: u16) -> Self {
        let name = match assignment {
            Assignment::PrivateUse => PRIVATE_USE,
            _ => AVAILABLE_FOR_ASSIGNMENT,
        };
        Self {
            name,
            code,
            assignment,
            kind: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn assignment(&self) -> Assignment {
        self.assignment
    }

    pub fn is_assigned(&self) -> bool {
        self.assignment == Assignment::Assigned
    }
}

impl<K: CodeKind> Code<K> {
    /// Look up a numeric code in this kind's registry.
    pub fn by_code(code: u16) -> Result<Self, UnknownCode> {
        K::registry().by_code(code)
    }

    /// Look up a name in this kind's registry.
    pub fn by_name(name: &str) -> Result<Self, NameNotFound> {
        K::registry().by_name(name)
    }
}

impl<K> Clone for Code<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for Code<K> {}

impl<K> PartialEq for Code<K> {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code && self.name == other.name && self.assignment == other.assignment
    }
}

impl<K> Eq for Code<K> {}

impl<K> Hash for Code<K> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code.hash(state);
        self.name.hash(state);
    }
}

impl<K: CodeKind> fmt::Debug for Code<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(K::TABLE.kind)
            .field("name", &self.name)
            .field("code", &self.code)
            .finish()
    }
}

impl<K> fmt::Display for Code<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_assigned() {
            f.write_str(self.name)
        } else {
            write!(f, "{}({})", self.name, self.code)
        }
    }
}

// Assigned codes serialise as their name; placeholders as the bare number so
// the exact code survives a round trip.
impl<K> Serialize for Code<K> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_assigned() {
            serializer.serialize_str(self.name)
        } else {
            serializer.serialize_u16(self.code)
        }
    }
}

impl<'de, K: CodeKind> Deserialize<'de> for Code<K> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(CodeVisitor(PhantomData))
    }
}

struct CodeVisitor<K>(PhantomData<fn() -> K>);

impl<'de, K: CodeKind> Visitor<'de> for CodeVisitor<K> {
    type Value = Code<K>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a {} name or numeric code", K::TABLE.kind)
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        Code::by_name(value).map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
        let code = u16::try_from(value)
            .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(value), &self))?;
        Code::by_code(code).map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
        let code = u16::try_from(value)
            .map_err(|_| E::invalid_value(de::Unexpected::Signed(value), &self))?;
        Code::by_code(code).map_err(E::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_bidirectional<K: CodeKind>() {
        let registry = K::registry();
        for &entry in registry.entries() {
            let by_code = registry.by_code(entry.code()).unwrap();
            assert_eq!(by_code, entry, "{} code {}", registry.kind(), entry.code());
            assert_eq!(registry.by_name(by_code.name()).unwrap(), by_code);

            let by_name = registry.by_name(entry.name()).unwrap();
            assert_eq!(registry.by_code(by_name.code()).unwrap(), by_name);
        }
    }

    #[test]
    fn test_every_registry_is_bidirectional() {
        assert_bidirectional::<OpCodeKind>();
        assert_bidirectional::<RCodeKind>();
        assert_bidirectional::<QTypeKind>();
        assert_bidirectional::<QClassKind>();
    }

    #[test]
    fn test_codes_are_unique_within_each_table() {
        fn unique<K: CodeKind>() {
            let mut seen = std::collections::HashSet::new();
            for entry in K::TABLE.entries {
                assert!(seen.insert(entry.code()), "duplicate {} code {}", K::TABLE.kind, entry.code());
            }
        }
        unique::<OpCodeKind>();
        unique::<RCodeKind>();
        unique::<QTypeKind>();
        unique::<QClassKind>();
    }

    #[test]
    fn test_display() {
        assert_eq!(QType::AAAA.to_string(), "AAAA");
        assert_eq!(OpCode::by_code(3).unwrap().to_string(), "AvailableForAssignment(3)");
        assert_eq!(RCode::by_code(4000).unwrap().to_string(), "PrivateUse(4000)");
    }

    #[test]
    fn test_json_names_and_placeholders() {
        assert_eq!(serde_json::to_string(&QType::MX).unwrap(), "\"MX\"");
        assert_eq!(serde_json::to_string(&QClass::by_code(4096).unwrap()).unwrap(), "4096");

        let parsed: QType = serde_json::from_str("\"CNAME\"").unwrap();
        assert_eq!(parsed, QType::CNAME);
        let parsed: QClass = serde_json::from_str("\"in\"").unwrap();
        assert_eq!(parsed, QClass::IN);
        let parsed: QClass = serde_json::from_str("4096").unwrap();
        assert_eq!(parsed.code(), 4096);

        assert!(serde_json::from_str::<QType>("\"cname\"").is_err());
        assert!(serde_json::from_str::<OpCode>("99").is_err());
    }

    #[test]
    fn test_yaml_names() {
        let parsed: Vec<QType> = serde_yaml_ng::from_str("- A\n- TXT\n- 65\n").unwrap();
        assert_eq!(parsed[0], QType::A);
        assert_eq!(parsed[1], QType::TXT);
        assert_eq!(parsed[2].assignment(), Assignment::AvailableForAssignment);
    }

    #[test]
    fn test_registries_are_shared_across_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| std::thread::spawn(|| QType::by_name("SRV").unwrap().code()))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 33);
        }
    }
}
