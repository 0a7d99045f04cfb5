use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::de::{self, Deserialize, Deserializer, Visitor};
use serde::ser::{Serialize, Serializer};
use url::Url;

use crate::SemanticError;

/// Reserved newtype-struct name identifying a [`Locator`] to the engine.
pub const LOCATOR_TOKEN: &str = "$__dictionary_coding_private_Locator";

/// An absolute resource locator (URL).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Locator(Url);

impl Locator {
    pub fn parse(text: &str) -> Result<Self, SemanticError> {
        Url::parse(text)
            .map(Self)
            .map_err(|e| SemanticError::InvalidLocator(format!("{text}: {e}")))
    }

    /// Builds a `file://` locator from an absolute filesystem path.
    pub fn from_file_path(path: impl AsRef<Path>) -> Result<Self, SemanticError> {
        Url::from_file_path(path)
            .map(Self)
            .map_err(|_| SemanticError::RelativeFilePath)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }

    pub fn into_url(self) -> Url {
        self.0
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locator {
    type Err = SemanticError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Url> for Locator {
    fn from(url: Url) -> Self {
        Self(url)
    }
}

impl From<Locator> for Url {
    fn from(locator: Locator) -> Self {
        locator.0
    }
}

impl Serialize for Locator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_newtype_struct(LOCATOR_TOKEN, self.as_str())
    }
}

struct LocatorVisitor;

impl<'de> Visitor<'de> for LocatorVisitor {
    type Value = Locator;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an absolute locator string")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Locator, E> {
        Locator::parse(v).map_err(E::custom)
    }

    fn visit_newtype_struct<D: Deserializer<'de>>(
        self,
        deserializer: D,
    ) -> Result<Locator, D::Error> {
        deserializer.deserialize_str(self)
    }
}

impl<'de> Deserialize<'de> for Locator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_newtype_struct(LOCATOR_TOKEN, LocatorVisitor)
    }
}
