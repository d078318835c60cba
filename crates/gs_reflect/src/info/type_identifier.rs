use core::fmt;

use crate::info::{TypeNameError, split_top_level};

// -----------------------------------------------------------------------------
// TypeIdentifier

/// A type name split into its generic definition and arguments.
///
/// A closed generic name embeds its arguments right after the definition
/// path, each argument being a full type name in its own brackets:
///
/// ```text
/// coll.Map`2[[core.string, core, ...],[app.User, app, ...]], coll, Version=.., Culture=.., Token=..
/// ```
///
/// Parsing always checks that [`to_name`](TypeIdentifier::to_name)
/// reproduces the input exactly, so an identifier can be rewritten and
/// flattened back without changing anything it did not touch.
///
/// # Examples
///
/// ```
/// use gs_reflect::info::TypeIdentifier;
///
/// let arg = "core.i32, core, Version=0.0.0, Culture=neutral, Token=null";
/// let name = format!("coll.Bag`1[[{arg}]], coll, Version=0.0.0, Culture=neutral, Token=null");
///
/// let id = TypeIdentifier::parse(&name).unwrap();
/// assert!(id.is_generic());
/// assert_eq!(id.definition(), "coll.Bag`1, coll, Version=0.0.0, Culture=neutral, Token=null");
/// assert_eq!(id.params()[0].to_name(), arg);
/// assert_eq!(id.to_name(), name);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeIdentifier {
    /// A name without generic arguments.
    Simple(String),
    /// A generic definition name and its ordered arguments.
    Generic {
        definition: String,
        params: Vec<TypeIdentifier>,
    },
}

impl TypeIdentifier {
    /// Parses a type name, validating that it reconstructs exactly.
    pub fn parse(name: &str) -> Result<Self, TypeNameError> {
        let id = Self::parse_unchecked(name)?;
        if id.to_name() != name {
            return Err(TypeNameError::Mismatch(name.into()));
        }
        Ok(id)
    }

    fn parse_unchecked(name: &str) -> Result<Self, TypeNameError> {
        let Some(open) = name.find('[') else {
            return Ok(Self::Simple(name.to_owned()));
        };
        let close = matching_bracket(name, open).ok_or_else(|| TypeNameError::Unbalanced(name.into()))?;

        let inner = &name[open + 1..close];
        let groups = split_top_level(inner, ',').ok_or_else(|| TypeNameError::Unbalanced(name.into()))?;

        let mut params = Vec::with_capacity(groups.len());
        for group in groups {
            let arg = group
                .strip_prefix('[')
                .and_then(|g| g.strip_suffix(']'))
                .ok_or_else(|| TypeNameError::Unbalanced(name.into()))?;
            params.push(Self::parse_unchecked(arg)?);
        }

        let definition = format!("{}{}", &name[..open], &name[close + 1..]);
        Ok(Self::Generic { definition, params })
    }

    /// Returns `true` for a closed generic name.
    #[inline]
    pub fn is_generic(&self) -> bool {
        matches!(self, Self::Generic { .. })
    }

    /// The generic definition, or the whole name for a simple identifier.
    pub fn definition(&self) -> &str {
        match self {
            Self::Simple(name) => name,
            Self::Generic { definition, .. } => definition,
        }
    }

    /// Generic arguments, empty for a simple identifier.
    pub fn params(&self) -> &[TypeIdentifier] {
        match self {
            Self::Simple(_) => &[],
            Self::Generic { params, .. } => params,
        }
    }

    /// Flattens the identifier back to a single name.
    pub fn to_name(&self) -> String {
        match self {
            Self::Simple(name) => name.clone(),
            Self::Generic { definition, params } => {
                let (head, tail) = match definition.find(',') {
                    Some(index) => definition.split_at(index),
                    None => (definition.as_str(), ""),
                };
                let args = params
                    .iter()
                    .map(|p| format!("[{}]", p.to_name()))
                    .collect::<Vec<_>>()
                    .join(",");
                format!("{head}[{args}]{tail}")
            }
        }
    }

    /// Rebuilds the identifier, passing every definition through `f`.
    ///
    /// Arguments are visited only when `cascade` is `true`.
    pub fn map_definitions(&self, cascade: bool, f: &mut impl FnMut(&str) -> String) -> Self {
        match self {
            Self::Simple(name) => Self::Simple(f(name)),
            Self::Generic { definition, params } => {
                let definition = f(definition);
                let params = if cascade {
                    let mut mapped = Vec::with_capacity(params.len());
                    for param in params {
                        mapped.push(param.map_definitions(cascade, &mut *f));
                    }
                    mapped
                } else {
                    params.clone()
                };
                Self::Generic { definition, params }
            }
        }
    }
}

impl fmt::Display for TypeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_name())
    }
}

fn matching_bracket(s: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (index, ch) in s[open..].char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(open + index);
                }
            }
            _ => {}
        }
    }
    None
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::TypeIdentifier;
    use crate::info::TypeNameError;

    const I32: &str = "core.i32, core, Version=0.0.0, Culture=neutral, Token=null";
    const USER: &str = "app.User, app, Version=1.0.0, Culture=neutral, Token=null";

    #[test]
    fn simple_name() {
        let id = TypeIdentifier::parse(USER).unwrap();
        assert_eq!(id, TypeIdentifier::Simple(USER.into()));
        assert!(id.params().is_empty());
    }

    #[test]
    fn nested_generics() {
        let inner = format!("coll.Bag`1[[{USER}]], coll, Version=0.0.0, Culture=neutral, Token=null");
        let name = format!(
            "coll.Map`2[[{I32}],[{inner}]], coll, Version=0.0.0, Culture=neutral, Token=null"
        );

        let id = TypeIdentifier::parse(&name).unwrap();
        assert_eq!(id.params().len(), 2);
        assert_eq!(id.params()[0].definition(), I32);
        assert!(id.params()[1].is_generic());
        assert_eq!(id.params()[1].params()[0].to_name(), USER);
        assert_eq!(id.to_string(), name);
    }

    #[test]
    fn non_canonical_spacing_is_rejected() {
        let name = format!("coll.Map`2[[{I32}], [{USER}]], coll, Version=0.0.0, Culture=neutral, Token=null");
        assert!(matches!(
            TypeIdentifier::parse(&name),
            Err(TypeNameError::Unbalanced(_) | TypeNameError::Mismatch(_))
        ));
    }

    #[test]
    fn map_definitions_respects_cascade() {
        let name = format!("coll.Bag`1[[{USER}]], coll, Version=0.0.0, Culture=neutral, Token=null");
        let id = TypeIdentifier::parse(&name).unwrap();

        let mut upper = |s: &str| s.replace("app.", "renamed.").replace("coll.", "c2.");

        let shallow = id.map_definitions(false, &mut upper);
        assert!(shallow.definition().starts_with("c2.Bag`1"));
        assert_eq!(shallow.params()[0].to_name(), USER);

        let deep = id.map_definitions(true, &mut upper);
        assert!(deep.params()[0].to_name().starts_with("renamed.User"));
    }
}
