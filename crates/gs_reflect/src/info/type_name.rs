use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::info::TypeDescriptor;

/// Search value that matches any part.
pub const WILDCARD: &str = "*";

const DEFAULT_VERSION: &str = "0.0.0";
const DEFAULT_CULTURE: &str = "neutral";
const DEFAULT_TOKEN: &str = "null";

// -----------------------------------------------------------------------------
// TypeNameError

/// An error when parsing a type name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TypeNameError {
    #[error("type name `{name}` has {parts} top-level parts, expected 5")]
    PartCount { name: String, parts: usize },
    #[error("type name `{name}` is missing the `{key}=` prefix")]
    MissingKey { name: String, key: &'static str },
    #[error("type name `{name}` has an empty {part}")]
    EmptyPart { name: String, part: &'static str },
    #[error("unbalanced generic brackets in `{0}`")]
    Unbalanced(String),
    #[error("type name `{0}` does not reproduce itself from its generic parts")]
    Mismatch(String),
}

// -----------------------------------------------------------------------------
// TypeNameDescriptor

/// The five parts of a fully qualified type name.
///
/// The text form is
/// `path, component, Version=version, Culture=culture, Token=token`.
/// Commas inside generic argument brackets `[...]` are not separators, so
/// `coll.Bag`1[[core.i32, core, ...]]` is a single path part.
///
/// The same struct is used as a search or replacement pattern by the
/// [override tables](crate::overrides): an empty part matches anything, and
/// [`WILDCARD`] matches anything and takes the replacement value.
///
/// # Examples
///
/// ```
/// use gs_reflect::info::TypeNameDescriptor;
///
/// let name = "geometry.shapes.Circle, geometry, Version=1.2.0, Culture=neutral, Token=null";
/// let desc: TypeNameDescriptor = name.parse().unwrap();
///
/// assert_eq!(desc.path, "geometry.shapes.Circle");
/// assert_eq!(desc.component, "geometry");
/// assert_eq!(desc.version, "1.2.0");
/// assert_eq!(desc.short_name(), "Circle");
/// assert_eq!(desc.to_string(), name);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeNameDescriptor {
    pub path: String,
    pub component: String,
    pub version: String,
    pub culture: String,
    pub token: String,
}

impl TypeNameDescriptor {
    /// Creates a descriptor with default version, culture and token.
    pub fn new(path: impl Into<String>, component: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            component: component.into(),
            version: DEFAULT_VERSION.into(),
            culture: DEFAULT_CULTURE.into(),
            token: DEFAULT_TOKEN.into(),
        }
    }

    /// Creates a search or replacement pattern, every part taken verbatim.
    pub fn pattern(
        path: impl Into<String>,
        component: impl Into<String>,
        version: impl Into<String>,
        culture: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            component: component.into(),
            version: version.into(),
            culture: culture.into(),
            token: token.into(),
        }
    }

    /// Returns the descriptor of a live type.
    #[inline]
    pub fn from_type(ty: &TypeDescriptor) -> Self {
        ty.descriptor().clone()
    }

    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    #[must_use]
    pub fn with_culture(mut self, culture: impl Into<String>) -> Self {
        self.culture = culture.into();
        self
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    /// Parses a full five-part name.
    pub fn parse(name: &str) -> Result<Self, TypeNameError> {
        let parts = split_top_level(name, ',').ok_or_else(|| TypeNameError::Unbalanced(name.into()))?;
        if parts.len() != 5 {
            return Err(TypeNameError::PartCount {
                name: name.into(),
                parts: parts.len(),
            });
        }

        let keyed = |index: usize, key: &'static str| -> Result<String, TypeNameError> {
            let part = parts[index].trim();
            part.strip_prefix(key)
                .and_then(|rest| rest.strip_prefix('='))
                .map(|value| value.trim().to_owned())
                .ok_or_else(|| TypeNameError::MissingKey {
                    name: name.into(),
                    key,
                })
        };

        let desc = Self {
            path: parts[0].trim().to_owned(),
            component: parts[1].trim().to_owned(),
            version: keyed(2, "Version")?,
            culture: keyed(3, "Culture")?,
            token: keyed(4, "Token")?,
        };

        if desc.path.is_empty() {
            return Err(TypeNameError::EmptyPart {
                name: name.into(),
                part: "path",
            });
        }
        if desc.component.is_empty() {
            return Err(TypeNameError::EmptyPart {
                name: name.into(),
                part: "component",
            });
        }
        Ok(desc)
    }

    /// Formats the descriptor as a full five-part name.
    pub fn full_name(&self) -> String {
        self.to_string()
    }

    /// The last dotted segment of the path, generic arguments excluded.
    pub fn short_name(&self) -> &str {
        let head = self.path.split('[').next().unwrap_or(&self.path);
        head.rsplit('.').next().unwrap_or(head)
    }

    /// The path without its last segment.
    pub fn namespace(&self) -> &str {
        let head = self.path.split('[').next().unwrap_or(&self.path);
        head.rsplit_once('.').map_or("", |(ns, _)| ns)
    }
}

impl fmt::Display for TypeNameDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, Version={}, Culture={}, Token={}",
            self.path, self.component, self.version, self.culture, self.token
        )
    }
}

impl FromStr for TypeNameDescriptor {
    type Err = TypeNameError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// -----------------------------------------------------------------------------
// Helpers

/// Splits `s` on `sep`, ignoring separators nested inside `[...]`.
///
/// Returns `None` if the brackets are unbalanced.
pub(crate) fn split_top_level(s: &str, sep: char) -> Option<Vec<&str>> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (index, ch) in s.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => depth = depth.checked_sub(1)?,
            c if c == sep && depth == 0 => {
                parts.push(&s[start..index]);
                start = index + c.len_utf8();
            }
            _ => {}
        }
    }
    if depth != 0 {
        return None;
    }
    parts.push(&s[start..]);
    Some(parts)
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{TypeNameDescriptor, TypeNameError, split_top_level};

    #[test]
    fn parse_and_format() {
        let desc = TypeNameDescriptor::parse(
            "app.Person, app, Version=2.0.1, Culture=en, Token=abc123",
        )
        .unwrap();
        assert_eq!(desc.path, "app.Person");
        assert_eq!(desc.culture, "en");
        assert_eq!(desc.token, "abc123");
        assert_eq!(desc.namespace(), "app");
        assert_eq!(
            desc.full_name(),
            "app.Person, app, Version=2.0.1, Culture=en, Token=abc123"
        );
    }

    #[test]
    fn generic_commas_are_not_separators() {
        let name = "coll.Bag`1[[core.i32, core, Version=0.0.0, Culture=neutral, Token=null]], coll, Version=0.0.0, Culture=neutral, Token=null";
        let desc = TypeNameDescriptor::parse(name).unwrap();
        assert!(desc.path.starts_with("coll.Bag`1[["));
        assert_eq!(desc.component, "coll");
        assert_eq!(desc.short_name(), "Bag`1");
        assert_eq!(desc.full_name(), name);
    }

    #[test]
    fn malformed_names() {
        assert!(matches!(
            TypeNameDescriptor::parse("app.Person, app"),
            Err(TypeNameError::PartCount { parts: 2, .. })
        ));
        assert!(matches!(
            TypeNameDescriptor::parse("app.Person, app, 1.0, Culture=x, Token=y"),
            Err(TypeNameError::MissingKey { key: "Version", .. })
        ));
        assert!(matches!(
            TypeNameDescriptor::parse(", app, Version=1, Culture=x, Token=y"),
            Err(TypeNameError::EmptyPart { part: "path", .. })
        ));
        assert!(matches!(
            TypeNameDescriptor::parse("a[[b, app, Version=1, Culture=x, Token=y"),
            Err(TypeNameError::Unbalanced(_))
        ));
    }

    #[test]
    fn split_respects_brackets() {
        assert_eq!(split_top_level("a,[b,c],d", ','), Some(vec!["a", "[b,c]", "d"]));
        assert_eq!(split_top_level("a]", ','), None);
    }

    #[test]
    fn descriptor_serde() {
        let desc = TypeNameDescriptor::new("app.Person", "app");
        let text = ron::to_string(&desc).unwrap();
        let back: TypeNameDescriptor = ron::from_str(&text).unwrap();
        assert_eq!(back, desc);

        let partial: TypeNameDescriptor = serde_json::from_str(r#"{"path":"app"}"#).unwrap();
        assert_eq!(partial.path, "app");
        assert!(partial.component.is_empty());
    }
}
