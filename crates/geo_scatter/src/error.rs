//! Error types and result alias for the crate.
//!
//! This module defines [`enum@crate::error::Error`] and the crate-wide [Result] alias.
//! Variants cover malformed boundary input, degenerate area tables, exhausted rejection sampling,
//! invalid configuration and IO.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    #[error("sampling in region '{region}' exceeded {attempts} attempts for a single point")]
    SamplingTimeout { region: String, attempts: u64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("duplicate region '{name}'")]
    DuplicateRegion { name: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Name of the region that caused the failure, when the error carries one.
    pub fn region(&self) -> Option<&str> {
        match self {
            Error::SamplingTimeout { region, .. } => Some(region),
            Error::DuplicateRegion { name } => Some(name),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_names_region() {
        let err = Error::SamplingTimeout {
            region: "polygon_3".into(),
            attempts: 10,
        };
        assert_eq!(err.region(), Some("polygon_3"));
        assert!(err.to_string().contains("polygon_3"));
    }

    #[test]
    fn parse_error_has_no_region() {
        let err = Error::Parse("no coordinates".into());
        assert!(err.region().is_none());
        assert_eq!(err.to_string(), "parse error: no coordinates");
    }
}
