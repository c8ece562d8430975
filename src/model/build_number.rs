use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors produced when a build number string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildNumberError {
    #[error("empty build number")]
    Empty,
    #[error("empty product code in build number {0:?}")]
    EmptyProductCode(String),
    #[error("invalid component {component:?} in build number {input:?}")]
    InvalidComponent { input: String, component: String },
}

/// One dot-separated part of a build number.
///
/// `*` and `SNAPSHOT` both sort above every numeric component; they are kept
/// distinct so a number renders back the way it was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    Number(u32),
    Snapshot,
    Wildcard,
}

impl Component {
    const WILDCARD: &'static str = "*";
    const SNAPSHOT: &'static str = "SNAPSHOT";

    fn rank(self) -> (u64, u8) {
        match self {
            Component::Number(n) => (u64::from(n), 0),
            Component::Snapshot => (u64::MAX, 1),
            Component::Wildcard => (u64::MAX, 2),
        }
    }

    /// Numeric weight used for range checks; wildcard and snapshot are equal here.
    fn weight(self) -> u64 {
        self.rank().0
    }
}

impl Ord for Component {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for Component {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Number(n) => write!(f, "{n}"),
            Component::Snapshot => f.write_str(Self::SNAPSHOT),
            Component::Wildcard => f.write_str(Self::WILDCARD),
        }
    }
}

/// A product build identifier such as `IU-233.11555.12` or `233.*`.
///
/// The product code is optional; feeds routinely omit it and rely on the
/// enclosing product to supply one (see [`BuildNumber::with_product_code`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BuildNumber {
    product_code: Option<String>,
    components: Vec<Component>,
}

impl BuildNumber {
    /// Parses `[CODE-]c1.c2...`.
    pub fn parse(input: &str) -> Result<Self, BuildNumberError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(BuildNumberError::Empty);
        }

        let (product_code, baseline) = match trimmed.split_once('-') {
            Some((code, _)) if code.is_empty() => {
                return Err(BuildNumberError::EmptyProductCode(trimmed.to_string()))
            }
            Some((code, rest)) => (Some(code.to_string()), rest),
            None => (None, trimmed),
        };

        let components = baseline
            .split('.')
            .map(|part| parse_component(trimmed, part))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            product_code,
            components,
        })
    }

    pub fn product_code(&self) -> Option<&str> {
        self.product_code.as_deref()
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Returns the number with `code` filled in if it carries no product code.
    pub fn with_product_code(mut self, code: &str) -> Self {
        if self.product_code.is_none() && !code.is_empty() {
            self.product_code = Some(code.to_string());
        }
        self
    }

    /// Renders the components only, e.g. `233.11555.12`.
    pub fn as_string_without_product_code(&self) -> String {
        self.components
            .iter()
            .map(Component::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }

    pub fn is_snapshot(&self) -> bool {
        self.components.contains(&Component::Snapshot)
    }

    /// Compares component values only, treating `*` and `SNAPSHOT` as equal
    /// and ignoring the product code.
    pub fn compare_components(&self, other: &Self) -> Ordering {
        for (a, b) in self.components.iter().zip(&other.components) {
            match a.weight().cmp(&b.weight()) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        self.components.len().cmp(&other.components.len())
    }
}

fn parse_component(input: &str, part: &str) -> Result<Component, BuildNumberError> {
    match part {
        Component::WILDCARD => Ok(Component::Wildcard),
        Component::SNAPSHOT => Ok(Component::Snapshot),
        _ if !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()) => part
            .parse()
            .map(Component::Number)
            .map_err(|_| BuildNumberError::InvalidComponent {
                input: input.to_string(),
                component: part.to_string(),
            }),
        _ => Err(BuildNumberError::InvalidComponent {
            input: input.to_string(),
            component: part.to_string(),
        }),
    }
}

impl Ord for BuildNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        self.components
            .cmp(&other.components)
            .then_with(|| self.product_code.cmp(&other.product_code))
    }
}

impl PartialOrd for BuildNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for BuildNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(code) = &self.product_code {
            write!(f, "{code}-")?;
        }
        f.write_str(&self.as_string_without_product_code())
    }
}

impl FromStr for BuildNumber {
    type Err = BuildNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Inclusive range of builds; a missing bound is unbounded on that side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRange {
    pub since: Option<BuildNumber>,
    pub until: Option<BuildNumber>,
}

impl BuildRange {
    pub fn new(since: Option<BuildNumber>, until: Option<BuildNumber>) -> Self {
        Self { since, until }
    }

    /// Product codes are ignored; only component values are compared.
    pub fn contains(&self, build: &BuildNumber) -> bool {
        let after_since = self
            .since
            .as_ref()
            .map_or(true, |since| since.compare_components(build) != Ordering::Greater);
        let before_until = self
            .until
            .as_ref()
            .map_or(true, |until| build.compare_components(until) != Ordering::Greater);
        after_since && before_until
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn bn(s: &str) -> BuildNumber {
        BuildNumber::parse(s).unwrap()
    }

    #[test]
    fn test_parse_with_product_code() {
        let number = bn("IU-233.11555.12");
        assert_eq!(number.product_code(), Some("IU"));
        assert_eq!(
            number.components(),
            &[
                Component::Number(233),
                Component::Number(11555),
                Component::Number(12)
            ]
        );
        assert_eq!(number.to_string(), "IU-233.11555.12");
    }

    #[test]
    fn test_parse_without_product_code() {
        let number = bn("2024.1");
        assert_eq!(number.product_code(), None);
        assert_eq!(number.to_string(), "2024.1");
    }

    #[test]
    fn test_parse_wildcard_and_snapshot() {
        assert_eq!(bn("233.*").components()[1], Component::Wildcard);
        let snapshot = bn("IC-233.SNAPSHOT");
        assert!(snapshot.is_snapshot());
        assert_eq!(snapshot.to_string(), "IC-233.SNAPSHOT");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(BuildNumber::parse("  "), Err(BuildNumberError::Empty));
        assert!(matches!(
            BuildNumber::parse("-233.1"),
            Err(BuildNumberError::EmptyProductCode(_))
        ));
        assert!(matches!(
            BuildNumber::parse("233..1"),
            Err(BuildNumberError::InvalidComponent { .. })
        ));
        assert!(matches!(
            BuildNumber::parse("v1.2"),
            Err(BuildNumberError::InvalidComponent { .. })
        ));
        assert!(BuildNumber::parse("233.+1").is_err());
    }

    #[test]
    fn test_with_product_code_only_fills_missing() {
        assert_eq!(bn("233.1").with_product_code("IU").to_string(), "IU-233.1");
        assert_eq!(bn("IC-233.1").with_product_code("IU").to_string(), "IC-233.1");
        assert_eq!(bn("233.1").with_product_code("").product_code(), None);
    }

    #[test]
    fn test_ordering() {
        assert!(bn("233.1") < bn("233.2"));
        assert!(bn("233") < bn("233.1"));
        assert!(bn("233.99999") < bn("233.SNAPSHOT"));
        assert!(bn("233.10") > bn("233.9"));
        assert!(bn("IU-233.1") < bn("IU-241.1"));
    }

    #[test]
    fn test_range_contains() {
        let range = BuildRange::new(Some(bn("233.100")), Some(bn("233.*")));
        assert!(range.contains(&bn("IU-233.100")));
        assert!(range.contains(&bn("IU-233.500.3")));
        assert!(!range.contains(&bn("IU-233.99")));
        assert!(!range.contains(&bn("IU-241.1")));
    }

    #[test]
    fn test_range_unbounded_sides() {
        let since_only = BuildRange::new(Some(bn("233.1")), None);
        assert!(since_only.contains(&bn("999.1")));
        assert!(!since_only.contains(&bn("232.1")));

        let until_only = BuildRange::new(None, Some(bn("233.1")));
        assert!(until_only.contains(&bn("1.0")));
        assert!(until_only.contains(&bn("IU-233.1")));
        assert!(!until_only.contains(&bn("233.2")));
    }

    proptest! {
        #[test]
        fn prop_display_parses_back(
            code in proptest::option::of("[A-Z]{2,3}"),
            parts in proptest::collection::vec(0u32..100_000, 1..5),
        ) {
            let text = parts.iter().map(u32::to_string).collect::<Vec<_>>().join(".");
            let text = match &code {
                Some(code) => format!("{code}-{text}"),
                None => text,
            };
            let parsed = BuildNumber::parse(&text).unwrap();
            prop_assert_eq!(parsed.to_string(), text);
        }

        #[test]
        fn prop_extension_sorts_after_prefix(
            parts in proptest::collection::vec(0u32..100_000, 1..5),
            extra in 0u32..100_000,
        ) {
            let base = parts.iter().map(u32::to_string).collect::<Vec<_>>().join(".");
            let shorter = bn(&base);
            let longer = bn(&format!("{base}.{extra}"));
            prop_assert!(shorter < longer);
            prop_assert_eq!(shorter.compare_components(&longer), Ordering::Less);
        }
    }
}
