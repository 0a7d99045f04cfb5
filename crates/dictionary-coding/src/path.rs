//! Coding paths: where in the document tree an operation is happening.
//!
//! Paths exist for error attribution only. Entering a nested container
//! produces an extended copy; the parent's path is never mutated.

use std::fmt;

/// One step into a map (by name) or a list (by index).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CodingKey {
    pub name: String,
    pub index: Option<usize>,
}

impl CodingKey {
    pub fn field(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            index: None,
        }
    }

    /// An array step; its name is the decimal index.
    pub fn index(index: usize) -> Self {
        Self {
            name: index.to_string(),
            index: Some(index),
        }
    }

    pub fn is_index(&self) -> bool {
        self.index.is_some()
    }
}

impl fmt::Display for CodingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Ordered sequence of [`CodingKey`]s from the document root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CodingPath {
    keys: Vec<CodingKey>,
}

impl CodingPath {
    pub const fn root() -> Self {
        Self { keys: Vec::new() }
    }

    /// Returns a copy of this path extended by `key`.
    pub fn appending(&self, key: CodingKey) -> Self {
        let mut keys = Vec::with_capacity(self.keys.len() + 1);
        keys.extend_from_slice(&self.keys);
        keys.push(key);
        Self { keys }
    }

    pub fn keys(&self) -> &[CodingKey] {
        &self.keys
    }

    /// Key names in order, handy for assertions.
    pub fn names(&self) -> Vec<&str> {
        self.keys.iter().map(|k| k.name.as_str()).collect()
    }

    pub fn last(&self) -> Option<&CodingKey> {
        self.keys.last()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// RFC 6901 pointer for this path (`""` for the root).
    pub fn to_pointer(&self) -> String {
        let mut out = String::new();
        for key in &self.keys {
            out.push('/');
            if key.name.contains('~') || key.name.contains('/') {
                out.push_str(&key.name.replace('~', "~0").replace('/', "~1"));
            } else {
                out.push_str(&key.name);
            }
        }
        out
    }
}

impl fmt::Display for CodingPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.keys.is_empty() {
            return f.write_str("<root>");
        }
        f.write_str(&self.to_pointer())
    }
}

impl From<Vec<CodingKey>> for CodingPath {
    fn from(keys: Vec<CodingKey>) -> Self {
        Self { keys }
    }
}

impl FromIterator<CodingKey> for CodingPath {
    fn from_iter<I: IntoIterator<Item = CodingKey>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appending_leaves_parent_untouched() {
        let root = CodingPath::root();
        let pets = root.appending(CodingKey::field("pets"));
        let first = pets.appending(CodingKey::index(0));
        let second = pets.appending(CodingKey::index(1));
        assert!(root.is_empty());
        assert_eq!(pets.names(), vec!["pets"]);
        assert_eq!(first.names(), vec!["pets", "0"]);
        assert_eq!(second.names(), vec!["pets", "1"]);
        assert_eq!(second.last().and_then(|k| k.index), Some(1));
    }

    #[test]
    fn display_uses_pointer_syntax() {
        let path: CodingPath = vec![
            CodingKey::field("a/b"),
            CodingKey::field("~k"),
            CodingKey::index(3),
        ]
        .into();
        assert_eq!(path.to_string(), "/a~1b/~0k/3");
        assert_eq!(CodingPath::root().to_string(), "<root>");
        assert_eq!(CodingPath::root().to_pointer(), "");
    }
}
