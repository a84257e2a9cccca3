//! Contract-scoped path expressions
//!
//! Provides [`FieldPath`], the small path language used by mapping
//! configurations: an anchor followed by a chain of namespace-qualified name
//! tests.
//!
//! # Scoping
//! Every expression is scoped to a contract element when parsed:
//! - `//hr:A/hr:B` → `.//hr:A/hr:B` (search below the contract, not the root)
//! - `.//hr:A/hr:B`, `./hr:A/hr:B` → unchanged
//! - `hr:A/hr:B` → `.//hr:A/hr:B`

use crate::error::PathError;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// HR-XML 2004-08-02 namespace
pub const HR_NS: &str = "http://ns.hr-xml.org/2004-08-02";

/// Prefix bound to [`HR_NS`] in path expressions
pub const HR_PREFIX: &str = "hr";

/// Where the first step of a path is searched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anchor {
    /// Any depth below the contract element (`.//`)
    Descendant,
    /// Direct children of the contract element (`./`)
    Child,
}

/// One name test
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Step {
    namespace: Option<String>,
    local: String,
}

impl Step {
    /// Name test in the HR-XML namespace
    #[inline]
    #[must_use]
    pub fn hr(local: impl Into<String>) -> Self {
        Self {
            namespace: Some(HR_NS.to_string()),
            local: local.into(),
        }
    }

    /// Name test without namespace
    #[inline]
    #[must_use]
    pub fn unqualified(local: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local: local.into(),
        }
    }

    /// Namespace URI
    #[inline]
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Local name
    #[inline]
    #[must_use]
    pub fn local(&self) -> &str {
        &self.local
    }

    fn parse(raw: &str, expr: &str) -> Result<Self, PathError> {
        if raw.is_empty() {
            return Err(PathError::EmptyStep(expr.to_string()));
        }
        if raw.contains(|c: char| matches!(c, '[' | ']' | '(' | ')' | '@' | '*' | '|' | '=' | ' '))
            || raw.contains("::")
            || raw == "."
            || raw == ".."
        {
            return Err(PathError::UnsupportedStep(raw.to_string()));
        }
        match raw.split_once(':') {
            Some((prefix, local)) if prefix == HR_PREFIX && !local.is_empty() => Ok(Self::hr(local)),
            Some((prefix, _)) if prefix != HR_PREFIX => Err(PathError::UnknownPrefix(prefix.to_string())),
            Some(_) => Err(PathError::UnsupportedStep(raw.to_string())),
            None => Ok(Self::unqualified(raw)),
        }
    }
}

impl Display for Step {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.namespace.as_deref() {
            Some(HR_NS) => write!(f, "{HR_PREFIX}:{}", self.local),
            Some(other) => write!(f, "{{{other}}}{}", self.local),
            None => write!(f, "{}", self.local),
        }
    }
}

/// Path scoped to a contract element
///
/// Always holds at least one step.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    anchor: Anchor,
    steps: Vec<Step>,
}

impl FieldPath {
    /// Parse and scope an expression
    ///
    /// # Errors
    /// Returns error for empty expressions or steps, single-rooted absolute
    /// paths, unknown prefixes, and anything beyond plain name tests.
    pub fn parse(expr: &str) -> Result<Self, PathError> {
        let trimmed = expr.trim();
        let (anchor, rest) = if let Some(rest) = trimmed.strip_prefix("//") {
            (Anchor::Descendant, rest)
        } else if let Some(rest) = trimmed.strip_prefix(".//") {
            (Anchor::Descendant, rest)
        } else if let Some(rest) = trimmed.strip_prefix("./") {
            (Anchor::Child, rest)
        } else if trimmed.starts_with('/') {
            return Err(PathError::Absolute(trimmed.to_string()));
        } else {
            (Anchor::Descendant, trimmed)
        };

        if rest.is_empty() {
            return Err(PathError::Empty);
        }

        let steps = rest
            .split('/')
            .map(|raw| Step::parse(raw, trimmed))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { anchor, steps })
    }

    /// Descendant path from HR-XML local names
    ///
    /// # Examples
    /// `FieldPath::hr(&["ReferenceInformation", "OrderId", "IdValue"])` is
    /// `.//hr:ReferenceInformation/hr:OrderId/hr:IdValue`.
    #[must_use]
    pub fn hr(locals: &[&str]) -> Self {
        Self {
            anchor: Anchor::Descendant,
            steps: locals.iter().map(|local| Step::hr(*local)).collect(),
        }
    }

    /// Anchor of the first step
    #[inline]
    #[must_use]
    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    /// Name tests in order
    #[inline]
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Number of steps
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always `false`: parsing rejects empty paths
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Same anchor, first `len` steps
    #[must_use]
    pub fn truncated(&self, len: usize) -> Self {
        Self {
            anchor: self.anchor,
            steps: self.steps[..len.min(self.steps.len())].to_vec(),
        }
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.anchor {
            Anchor::Descendant => write!(f, ".//")?,
            Anchor::Child => write!(f, "./")?,
        }
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubly_rooted_is_scoped_to_context() {
        let path = FieldPath::parse("//hr:ReferenceInformation/hr:OrderId/hr:IdValue").unwrap();
        assert_eq!(path.anchor(), Anchor::Descendant);
        assert_eq!(path.to_string(), ".//hr:ReferenceInformation/hr:OrderId/hr:IdValue");
    }

    #[test]
    fn relative_paths_pass_through() {
        let path = FieldPath::parse(".//hr:PositionLevel").unwrap();
        assert_eq!(path.to_string(), ".//hr:PositionLevel");

        let path = FieldPath::parse("./hr:PositionCharacteristics/hr:PositionLevel").unwrap();
        assert_eq!(path.anchor(), Anchor::Child);
        assert_eq!(path.to_string(), "./hr:PositionCharacteristics/hr:PositionLevel");
    }

    #[test]
    fn bare_path_searches_below_context() {
        let path: FieldPath = "hr:PositionCharacteristics/hr:PositionLevel".parse().unwrap();
        assert_eq!(path, FieldPath::hr(&["PositionCharacteristics", "PositionLevel"]));
    }

    #[test]
    fn unqualified_steps_have_no_namespace() {
        let path = FieldPath::parse("//Envelope/Item").unwrap();
        assert_eq!(path.steps()[0].namespace(), None);
        assert_eq!(path.steps()[1].local(), "Item");
    }

    #[test]
    fn rejects_malformed_expressions() {
        assert_eq!(FieldPath::parse(""), Err(PathError::Empty));
        assert_eq!(FieldPath::parse("//"), Err(PathError::Empty));
        assert!(matches!(FieldPath::parse("/hr:A"), Err(PathError::Absolute(_))));
        assert!(matches!(FieldPath::parse("//hr:A//hr:B"), Err(PathError::EmptyStep(_))));
        assert!(matches!(FieldPath::parse("//xs:A"), Err(PathError::UnknownPrefix(p)) if p == "xs"));
        assert!(matches!(FieldPath::parse("//hr:A[1]"), Err(PathError::UnsupportedStep(_))));
        assert!(matches!(FieldPath::parse("//hr:A/.."), Err(PathError::UnsupportedStep(_))));
        assert!(matches!(FieldPath::parse("//hr:"), Err(PathError::UnsupportedStep(_))));
    }

    #[test]
    fn truncated_keeps_anchor() {
        let path = FieldPath::parse("./hr:A/hr:B/hr:C").unwrap();
        let partial = path.truncated(2);
        assert_eq!(partial.anchor(), Anchor::Child);
        assert_eq!(partial.len(), 2);
        assert_eq!(partial.to_string(), "./hr:A/hr:B");
    }
}
