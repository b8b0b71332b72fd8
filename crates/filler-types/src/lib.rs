//! # Filler Types
//!
//! Validated primitives shared across the slide filler crates.
//!
//! - [`NonEmptyText`] for configuration values and names that must carry content
//! - [`DocumentId`] and [`SlideId`] for objects owned by a document store
//! - [`Placeholder`] for `{{name}}` tokens embedded in template text

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
    /// A placeholder name contained characters outside `[a-z0-9_]`
    #[error("invalid placeholder name: {0}")]
    InvalidPlaceholder(String),
}

/// A string type that guarantees non-empty content.
///
/// The input is trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// # Returns
    ///
    /// Returns `Ok(NonEmptyText)` if the trimmed input is non-empty,
    /// or `Err(TextError::Empty)` if it's empty or contains only whitespace.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

macro_rules! store_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        pub struct $name(NonEmptyText);

        impl $name {
            pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
                NonEmptyText::new(input).map(Self)
            }

            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = TextError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }
    };
}

store_id!(
    /// Identifier of a document (presentation) held by a document store.
    DocumentId
);

store_id!(
    /// Identifier of a single slide (page object) within a document.
    SlideId
);

/// A `{{name}}` placeholder token.
///
/// Names are restricted to lowercase ASCII letters, digits and underscores, which is
/// what template authors type into slide text boxes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Placeholder {
    name: String,
    token: String,
}

impl Placeholder {
    pub fn new(name: impl AsRef<str>) -> Result<Self, TextError> {
        let name = name.as_ref();
        if name.is_empty() {
            return Err(TextError::Empty);
        }
        let ok = name
            .bytes()
            .all(|b| matches!(b, b'a'..=b'z' | b'0'..=b'9' | b'_'));
        if !ok {
            return Err(TextError::InvalidPlaceholder(name.to_owned()));
        }
        Ok(Self {
            name: name.to_owned(),
            token: format!("{{{{{name}}}}}"),
        })
    }

    /// The bare name, without braces.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The literal token as it appears in template text, e.g. `{{nome}}`.
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl std::fmt::Display for Placeholder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.token)
    }
}
