//! Path codec - flat keys for nested properties.
//!
//! Users address nested data with dots (`user.address.city`). Internally every
//! path is a single flat key joined by the reserved separator `&`
//! (`user&address&city`), so one map can hold the binding entries for every
//! depth of the data.
//!
//! Property names may contain neither separator. [`Store::wrap`] enforces this
//! for data keys and [`PropertyPath::parse`] for directive values.
//!
//! [`Store::wrap`]: crate::store::Store::wrap

use std::fmt;

use crate::error::BindingError;

/// Reserved separator used in flat path keys.
pub const SEPARATOR: char = '&';

/// Separator used in directive values and the public accessors.
pub const USER_SEPARATOR: char = '.';

/// Translate a dotted path into its flat key form.
pub fn encode(dotted: &str) -> String {
    dotted.replace(USER_SEPARATOR, "&")
}

/// Translate a flat key back into its dotted form.
pub fn decode(key: &str) -> String {
    key.replace(SEPARATOR, ".")
}

/// Whether `name` can be used as a single path segment.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(SEPARATOR) && !name.contains(USER_SEPARATOR)
}

// =============================================================================
// PropertyPath
// =============================================================================

/// A non-empty sequence of property names, stored as a flat key.
///
/// `Display` prints the dotted form, which is what error messages show.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyPath(String);

impl PropertyPath {
    /// Path of a top-level property.
    ///
    /// The caller guarantees `key` is a valid name.
    pub(crate) fn root(key: &str) -> Self {
        Self(key.to_string())
    }

    /// Parse a dotted, user-facing path such as `a.b.c`.
    pub fn parse(dotted: &str) -> Result<Self, BindingError> {
        let dotted = dotted.trim();
        let valid = !dotted.is_empty()
            && dotted
                .split(USER_SEPARATOR)
                .all(is_valid_name);
        if !valid {
            return Err(BindingError::InvalidPath { path: dotted.to_string() });
        }
        Ok(Self(encode(dotted)))
    }

    /// Path of property `key` nested under this one.
    pub fn child(&self, key: &str) -> Self {
        let mut flat = String::with_capacity(self.0.len() + 1 + key.len());
        flat.push_str(&self.0);
        flat.push(SEPARATOR);
        flat.push_str(key);
        Self(flat)
    }

    /// The flat key (`a&b&c`).
    pub fn as_key(&self) -> &str {
        &self.0
    }

    /// The dotted form (`a.b.c`).
    pub fn to_dotted(&self) -> String {
        decode(&self.0)
    }

    /// Property names from the outermost to the innermost.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(SEPARATOR)
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// Name of the innermost property.
    pub fn leaf(&self) -> &str {
        match self.0.rfind(SEPARATOR) {
            Some(at) => &self.0[at + 1..],
            None => &self.0,
        }
    }

    /// Path of the enclosing object, `None` for a top-level property.
    pub fn parent(&self) -> Option<PropertyPath> {
        self.0.rfind(SEPARATOR).map(|at| Self(self.0[..at].to_string()))
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_dotted())
    }
}

impl std::str::FromStr for PropertyPath {
    type Err = BindingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode() {
        assert_eq!(encode("a.b.c"), "a&b&c");
        assert_eq!(decode("a&b&c"), "a.b.c");
        assert_eq!(encode("count"), "count");
    }

    #[test]
    fn test_parse() {
        let path = PropertyPath::parse(" user.name ").unwrap();
        assert_eq!(path.as_key(), "user&name");
        assert_eq!(path.to_string(), "user.name");
        assert_eq!(path.depth(), 2);
    }

    #[test]
    fn test_parse_rejects_bad_segments() {
        for bad in ["", "  ", "a..b", ".a", "a.", "a&b"] {
            assert!(
                matches!(PropertyPath::parse(bad), Err(BindingError::InvalidPath { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_child_parent_leaf() {
        let a = PropertyPath::root("a");
        let abc = a.child("b").child("c");
        assert_eq!(abc.as_key(), "a&b&c");
        assert_eq!(abc.leaf(), "c");
        assert_eq!(abc.parent().unwrap().as_key(), "a&b");
        assert_eq!(a.parent(), None);
        assert_eq!(a.leaf(), "a");
        assert_eq!(abc.segments().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_valid_names() {
        assert!(is_valid_name("count"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("a.b"));
        assert!(!is_valid_name("a&b"));
    }
}
