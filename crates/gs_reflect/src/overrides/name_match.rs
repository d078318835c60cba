use crate::info::{TypeNameDescriptor, WILDCARD};

/// Matches a single part.
///
/// - empty search: matches, keeps the original;
/// - [`WILDCARD`]: matches, takes the replacement;
/// - literal: matches an equal part, takes the replacement unless it is
///   empty.
fn match_part(original: &str, search: &str, replace: &str) -> Option<String> {
    if search.is_empty() {
        return Some(original.to_owned());
    }
    if search == WILDCARD {
        return Some(replace.to_owned());
    }
    if search != original {
        return None;
    }
    Some(if replace.is_empty() { original } else { replace }.to_owned())
}

/// Matches the path part against every dotted prefix, longest first.
///
/// The segments following the matched prefix are kept.
fn match_path(original: &str, search: &str, replace: &str) -> Option<String> {
    if search.is_empty() || search == WILDCARD {
        return match_part(original, search, replace);
    }
    let segments: Vec<&str> = original.split('.').collect();
    (1..=segments.len()).rev().find_map(|len| {
        let prefix = segments[..len].join(".");
        let head = match_part(&prefix, search, replace)?;
        let tail = segments[len..].join(".");
        Some(match (head.is_empty(), tail.is_empty()) {
            (_, true) => head,
            (true, false) => tail,
            (false, false) => format!("{head}.{tail}"),
        })
    })
}

/// Matches `name` against `search` part by part and builds the rewritten
/// descriptor from `replace`.
///
/// Returns `None` if any part fails to match.
///
/// # Examples
///
/// ```
/// use gs_reflect::info::TypeNameDescriptor;
/// use gs_reflect::overrides::name_match;
///
/// let name = TypeNameDescriptor::new("legacy.model.User", "legacy").with_version("1.0.0");
/// let search = TypeNameDescriptor::pattern("legacy", "legacy", "*", "", "");
/// let replace = TypeNameDescriptor::pattern("app", "app", "2.0.0", "", "");
///
/// let moved = name_match(&name, &search, &replace).unwrap();
/// assert_eq!(moved.path, "app.model.User");
/// assert_eq!(moved.component, "app");
/// assert_eq!(moved.version, "2.0.0");
/// assert_eq!(moved.culture, "neutral");
///
/// let other = TypeNameDescriptor::new("other.User", "legacy");
/// assert!(name_match(&other, &search, &replace).is_none());
/// ```
pub fn name_match(
    name: &TypeNameDescriptor,
    search: &TypeNameDescriptor,
    replace: &TypeNameDescriptor,
) -> Option<TypeNameDescriptor> {
    Some(TypeNameDescriptor {
        path: match_path(&name.path, &search.path, &replace.path)?,
        component: match_part(&name.component, &search.component, &replace.component)?,
        version: match_part(&name.version, &search.version, &replace.version)?,
        culture: match_part(&name.culture, &search.culture, &replace.culture)?,
        token: match_part(&name.token, &search.token, &replace.token)?,
    })
}

// -----------------------------------------------------------------------------
// Tests
