use std::borrow::Borrow;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use std::sync::OnceLock;

use oxrdf::NamedNode;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Maximum number of characters a label may hold.
pub const MAX_LABEL_LENGTH: usize = 8164;

/// Fuzzy search terms shorter than this fall back to an exact match.
pub const MIN_FUZZY_SEARCH_LENGTH: usize = 3;

const MAX_ID_LENGTH: usize = 255;

fn id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9:_-]+$").expect("identifier pattern compiles"))
}

fn validate_id(value: &str) -> bool {
    value.len() <= MAX_ID_LENGTH && id_pattern().is_match(value)
}

/// Identifier shared by resources, literals, predicates and classes.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ThingId(String);

impl ThingId {
    /// Validates and constructs a new [`ThingId`].
    pub fn new(value: impl Into<String>) -> Result<Self, IdError> {
        let value = value.into();
        if validate_id(&value) {
            Ok(Self(value))
        } else {
            Err(IdError::InvalidThingId { value })
        }
    }

    /// Builds an identifier from text that is known to be well formed, such
    /// as generator output or well-known constants.
    pub(crate) fn from_trusted(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ThingId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ThingId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_owned())
    }
}

impl TryFrom<String> for ThingId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ThingId> for String {
    fn from(value: ThingId) -> Self {
        value.0
    }
}

impl Borrow<str> for ThingId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ThingId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ThingId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Identifier of a statement.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StatementId(String);

impl StatementId {
    /// Validates and constructs a new [`StatementId`].
    pub fn new(value: impl Into<String>) -> Result<Self, IdError> {
        let value = value.into();
        if validate_id(&value) {
            Ok(Self(value))
        } else {
            Err(IdError::InvalidStatementId { value })
        }
    }

    pub(crate) fn from_trusted(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for StatementId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for StatementId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_owned())
    }
}

impl TryFrom<String> for StatementId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl Borrow<str> for StatementId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<StatementId> for String {
    fn from(value: StatementId) -> Self {
        value.0
    }
}

/// Errors produced when validating identifiers.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum IdError {
    #[error("invalid thing id: {value}")]
    InvalidThingId { value: String },
    #[error("invalid statement id: {value}")]
    InvalidStatementId { value: String },
}

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Placeholder used when the owner is not known.
            pub const UNKNOWN: Self = Self(Uuid::nil());

            #[must_use]
            pub fn new(value: Uuid) -> Self {
                Self(value)
            }

            #[must_use]
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }

            #[must_use]
            pub fn value(&self) -> Uuid {
                self.0
            }

            #[must_use]
            pub fn is_unknown(&self) -> bool {
                self.0.is_nil()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::UNKNOWN
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
                Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }
    };
}

uuid_id!(
    /// Identifier of the user who created or modified an entity.
    ContributorId
);
uuid_id!(
    /// Identifier of an observatory.
    ObservatoryId
);
uuid_id!(
    /// Identifier of an organization.
    OrganizationId
);

/// Value object ensuring that supplied text represents an absolute IRI.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Uri {
    value: String,
}

impl Uri {
    /// Validates and constructs a new [`Uri`] value object.
    ///
    /// Relative references are rejected; class URIs are used as global
    /// identifiers and must resolve without a base.
    pub fn new(value: impl Into<String>) -> Result<Self, UriError> {
        let value = value.into();
        NamedNode::new(value.as_str()).map_err(|_| UriError::Invalid {
            value: value.clone(),
        })?;
        Ok(Self { value })
    }

    /// Returns the underlying textual representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl Display for Uri {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl FromStr for Uri {
    type Err = UriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_owned())
    }
}

impl TryFrom<String> for Uri {
    type Error = UriError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Uri> for String {
    fn from(value: Uri) -> Self {
        value.value
    }
}

/// Errors produced when validating a [`Uri`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum UriError {
    /// The provided text could not be parsed as an absolute IRI.
    #[error("invalid URI: {value}")]
    Invalid { value: String },
}

/// A validated, human readable label.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Label(String);

impl Label {
    /// Validates a label: it must not be blank, must not contain control
    /// characters (newlines included) and is bounded by [`MAX_LABEL_LENGTH`].
    pub fn new(value: impl Into<String>) -> Result<Self, LabelError> {
        let value = value.into();
        if value.chars().count() > MAX_LABEL_LENGTH {
            return Err(LabelError::TooLong {
                max: MAX_LABEL_LENGTH,
            });
        }
        if value.trim().is_empty() || value.chars().any(char::is_control) {
            return Err(LabelError::Invalid);
        }
        Ok(Self(value))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Reasons a label is rejected.
#[derive(Copy, Clone, Debug, Error, PartialEq, Eq)]
pub enum LabelError {
    #[error("a label must not be blank or contain newlines")]
    Invalid,
    #[error("a label must be at most {max} characters long")]
    TooLong { max: usize },
}

/// Label search term, either matched exactly or fuzzily.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchString {
    Exact(String),
    Fuzzy(String),
}

impl SearchString {
    #[must_use]
    pub fn of(value: impl Into<String>, exact: bool) -> Self {
        let value = value.into();
        if exact {
            Self::Exact(value.trim().to_owned())
        } else {
            Self::Fuzzy(normalize(&value))
        }
    }

    /// Tests a label against the search term.
    ///
    /// Exact terms compare case-sensitively after trimming. Fuzzy terms are
    /// whitespace-normalized and matched as a case-insensitive substring;
    /// terms below [`MIN_FUZZY_SEARCH_LENGTH`] must match the whole label.
    #[must_use]
    pub fn matches(&self, label: &str) -> bool {
        match self {
            Self::Exact(term) => label.trim() == term,
            Self::Fuzzy(term) => {
                let candidate = normalize(label);
                if term.chars().count() < MIN_FUZZY_SEARCH_LENGTH {
                    candidate == *term
                } else {
                    candidate.contains(term.as_str())
                }
            }
        }
    }

    #[must_use]
    pub fn input(&self) -> &str {
        match self {
            Self::Exact(term) | Self::Fuzzy(term) => term,
        }
    }
}

fn normalize(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn accepts_valid_uri() {
        let uri = Uri::new("https://example.org/resource").expect("valid URI");
        assert_eq!(uri.as_str(), "https://example.org/resource");
    }

    #[test]
    fn rejects_relative_uri() {
        let err = Uri::new("not a uri").expect_err("invalid URI");
        assert!(matches!(err, UriError::Invalid { value } if value == "not a uri"));
    }

    #[rstest]
    #[case("R123")]
    #[case("Paper")]
    #[case("some_id-with:colon")]
    fn accepts_thing_ids(#[case] value: &str) {
        assert_eq!(ThingId::new(value).expect("valid id").as_str(), value);
    }

    #[rstest]
    #[case("")]
    #[case("has space")]
    #[case("ünïcode")]
    fn rejects_malformed_thing_ids(#[case] value: &str) {
        assert!(ThingId::new(value).is_err());
    }

    #[rstest]
    #[case("a\nb")]
    #[case("  \t ")]
    #[case("")]
    #[case("bell\u{7}")]
    fn rejects_invalid_labels(#[case] value: &str) {
        assert_eq!(Label::new(value), Err(LabelError::Invalid));
    }

    #[test]
    fn rejects_overlong_labels() {
        let label = "x".repeat(MAX_LABEL_LENGTH + 1);
        assert_eq!(
            Label::new(label),
            Err(LabelError::TooLong {
                max: MAX_LABEL_LENGTH
            })
        );
        assert!(Label::new("x".repeat(MAX_LABEL_LENGTH)).is_ok());
    }

    #[test]
    fn fuzzy_search_is_case_insensitive_substring() {
        let search = SearchString::of("  Knowledge   GRAPH ", false);
        assert!(search.matches("open knowledge graph"));
        assert!(!search.matches("knowledge base"));
    }

    #[test]
    fn short_fuzzy_terms_require_whole_label() {
        let search = SearchString::of("ab", false);
        assert!(search.matches("AB"));
        assert!(!search.matches("abc"));
    }

    #[test]
    fn exact_search_is_case_sensitive() {
        let search = SearchString::of("Paper", true);
        assert!(search.matches("Paper"));
        assert!(!search.matches("paper"));
    }

    #[test]
    fn thing_ids_compare_with_str() {
        let id = ThingId::new("List").expect("valid id");
        assert!(id == "List");
    }
}
