use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserialize, Deserializer, Visitor};
use serde::ser::{Serialize, Serializer};
use uuid::Uuid;

use crate::SemanticError;

/// Reserved newtype-struct name identifying an [`Identifier`] to the engine.
pub const IDENTIFIER_TOKEN: &str = "$__dictionary_coding_private_Identifier";

/// A 128-bit unique identifier.
///
/// The canonical text form is the upper-case hyphenated rendering
/// (`E621E1F8-C36C-495A-93FC-0C247A3E6E5F`); parsing accepts either case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Identifier(Uuid);

impl Identifier {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Builds an identifier from a 16-octet slice.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, SemanticError> {
        Uuid::from_slice(bytes)
            .map(Self)
            .map_err(|_| SemanticError::InvalidIdentifierLength(bytes.len()))
    }

    /// Parses the hyphenated form.
    pub fn parse(text: &str) -> Result<Self, SemanticError> {
        if text.len() != 36 {
            return Err(SemanticError::InvalidIdentifier(text.to_owned()));
        }
        Uuid::parse_str(text)
            .map(Self)
            .map_err(|_| SemanticError::InvalidIdentifier(text.to_owned()))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    /// Canonical upper-case hyphenated text.
    pub fn canonical(&self) -> String {
        self.0.hyphenated().to_string().to_ascii_uppercase()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl FromStr for Identifier {
    type Err = SemanticError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Uuid> for Identifier {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<Identifier> for Uuid {
    fn from(id: Identifier) -> Self {
        id.0
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_newtype_struct(IDENTIFIER_TOKEN, &self.canonical())
    }
}

struct IdentifierVisitor;

impl<'de> Visitor<'de> for IdentifierVisitor {
    type Value = Identifier;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a hyphenated identifier string or 16 bytes")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Identifier, E> {
        Identifier::parse(v).map_err(E::custom)
    }

    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Identifier, E> {
        Identifier::from_slice(v).map_err(E::custom)
    }

    fn visit_newtype_struct<D: Deserializer<'de>>(
        self,
        deserializer: D,
    ) -> Result<Identifier, D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_newtype_struct(IDENTIFIER_TOKEN, IdentifierVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_is_upper_case_and_parse_accepts_any_case() {
        let id = Identifier::parse("e621e1f8-c36c-495a-93fc-0c247a3e6e5f").unwrap();
        assert_eq!(id.canonical(), "E621E1F8-C36C-495A-93FC-0C247A3E6E5F");
        assert_eq!(Identifier::parse(&id.canonical()).unwrap(), id);
    }

    #[test]
    fn parse_rejects_non_hyphenated_forms() {
        assert!(Identifier::parse("e621e1f8c36c495a93fc0c247a3e6e5f").is_err());
        assert!(Identifier::parse("not an identifier").is_err());
        assert!(Identifier::parse("").is_err());
    }

    #[test]
    fn from_slice_requires_sixteen_bytes() {
        let id = Identifier::new_v4();
        assert_eq!(Identifier::from_slice(id.as_bytes()).unwrap(), id);
        assert_eq!(
            Identifier::from_slice(&[1, 2, 3]),
            Err(SemanticError::InvalidIdentifierLength(3))
        );
    }
}
