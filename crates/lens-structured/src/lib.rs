//! RepoLens Structured Responses
//!
//! Text-generation collaborators return JSON wrapped in prose, code fences or
//! both. This crate pulls the payload out and deserializes it into a typed
//! value, substituting a caller-chosen fallback when that is not possible.
//!
//! Bracket matching is textual: the payload is the span from the first
//! opening bracket of the expected [`Shape`] to the last closing one.
//! Narrative text before the payload that itself contains brackets can make
//! the span wrong; the result is then a fallback, never an error.
//!
//! # Example
//!
//! ```rust
//! use lens_structured::{extract, Shape};
//!
//! let numbers: Vec<u32> = extract("Here you go: [1,2,3] thanks", Shape::Array).into_inner();
//! assert_eq!(numbers, vec![1, 2, 3]);
//!
//! let missing = extract::<Vec<u32>>("no brackets here", Shape::Array);
//! assert!(missing.is_fallback());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod parser;

pub use parser::{
    extract, extract_or, locate, try_extract, ExtractError, Extracted, Shape,
    StructuredResponseParser,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
