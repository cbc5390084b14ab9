//! Payload location and typed extraction

use serde::de::DeserializeOwned;
use std::fmt;

/// Expected top-level shape of a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// JSON array, `[` ... `]`
    Array,
    /// JSON object, `{` ... `}`
    Object,
}

impl Shape {
    /// Opening bracket
    #[inline]
    #[must_use]
    pub fn open(self) -> char {
        match self {
            Shape::Array => '[',
            Shape::Object => '{',
        }
    }

    /// Closing bracket
    #[inline]
    #[must_use]
    pub fn close(self) -> char {
        match self {
            Shape::Array => ']',
            Shape::Object => '}',
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Array => f.write_str("array"),
            Shape::Object => f.write_str("object"),
        }
    }
}

/// Why a payload could not be extracted
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// No bracketed span of the expected shape
    #[error("no {shape} payload found in response")]
    NoPayload {
        /// Expected shape
        shape: Shape,
    },

    /// Span found but it does not deserialize into the target type
    #[error("malformed {shape} payload: {source}")]
    Malformed {
        /// Expected shape
        shape: Shape,
        /// Deserialization failure
        #[source]
        source: serde_json::Error,
    },
}

/// Typed extraction outcome
///
/// Both variants carry a usable value; `Fallback` marks that the value is
/// the substitute rather than the model's answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted<T> {
    /// Payload parsed into the target type
    Success(T),
    /// Payload missing or malformed, caller's fallback substituted
    Fallback(T),
}

impl<T> Extracted<T> {
    /// Value regardless of origin
    #[inline]
    pub fn into_inner(self) -> T {
        match self {
            Extracted::Success(value) | Extracted::Fallback(value) => value,
        }
    }

    /// True when the fallback was substituted
    #[inline]
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        matches!(self, Extracted::Fallback(_))
    }

    /// Parsed value, `None` on fallback
    #[inline]
    pub fn success(self) -> Option<T> {
        match self {
            Extracted::Success(value) => Some(value),
            Extracted::Fallback(_) => None,
        }
    }

    /// Map the carried value, preserving the variant
    #[inline]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Extracted<U> {
        match self {
            Extracted::Success(value) => Extracted::Success(f(value)),
            Extracted::Fallback(value) => Extracted::Fallback(f(value)),
        }
    }
}

/// Span from the first opening bracket to the last closing bracket
#[must_use]
pub fn locate(raw: &str, shape: Shape) -> Option<&str> {
    let start = raw.find(shape.open())?;
    let end = raw.rfind(shape.close())?;
    (end > start).then(|| &raw[start..=end])
}

/// Extract and deserialize, reporting why it failed
///
/// # Errors
/// - `ExtractError::NoPayload` when no span of the expected shape exists
/// - `ExtractError::Malformed` when the span does not deserialize into `T`
pub fn try_extract<T: DeserializeOwned>(raw: &str, shape: Shape) -> Result<T, ExtractError> {
    let span = locate(raw, shape).ok_or(ExtractError::NoPayload { shape })?;
    serde_json::from_str(span).map_err(|source| ExtractError::Malformed { shape, source })
}

/// Extract with an explicit fallback value
pub fn extract_or<T: DeserializeOwned>(
    raw: &str,
    shape: Shape,
    fallback: impl FnOnce() -> T,
) -> Extracted<T> {
    match try_extract(raw, shape) {
        Ok(value) => Extracted::Success(value),
        Err(err) => {
            tracing::debug!(error = %err, "structured extraction fell back");
            Extracted::Fallback(fallback())
        }
    }
}

/// Extract with `T::default()` as fallback
#[inline]
pub fn extract<T: DeserializeOwned + Default>(raw: &str, shape: Shape) -> Extracted<T> {
    extract_or(raw, shape, T::default)
}

/// Parser bound to one expected shape
///
/// Convenience for call sites that always expect the same shape.
#[derive(Debug, Clone, Copy)]
pub struct StructuredResponseParser {
    shape: Shape,
}

impl StructuredResponseParser {
    /// Parser for arrays
    #[inline]
    #[must_use]
    pub fn array() -> Self {
        Self {
            shape: Shape::Array,
        }
    }

    /// Parser for objects
    #[inline]
    #[must_use]
    pub fn object() -> Self {
        Self {
            shape: Shape::Object,
        }
    }

    /// Expected shape
    #[inline]
    #[must_use]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Extract with explicit fallback
    pub fn extract_or<T: DeserializeOwned>(
        &self,
        raw: &str,
        fallback: impl FnOnce() -> T,
    ) -> Extracted<T> {
        extract_or(raw, self.shape, fallback)
    }

    /// Extract, reporting why it failed
    ///
    /// # Errors
    /// See [`try_extract`].
    pub fn try_extract<T: DeserializeOwned>(&self, raw: &str) -> Result<T, ExtractError> {
        try_extract(raw, self.shape)
    }
}
