//! Fatal estimate errors and non-fatal input notices

use miette::Diagnostic;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// An input problem that aborts the estimate
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum EstimateError {
    #[error("Missing required input '{field}': {reason}")]
    #[diagnostic(
        code(est::estimate::missing_input),
        help("Add `{field}` to the request file or pass it as a flag")
    )]
    MissingRequiredInput { field: String, reason: String },

    #[error("Invalid input '{field}': {reason}")]
    #[diagnostic(code(est::estimate::invalid_input))]
    InvalidInput { field: String, reason: String },
}

impl EstimateError {
    pub fn missing(field: &str, reason: impl Into<String>) -> Self {
        EstimateError::MissingRequiredInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        EstimateError::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// A recoverable input problem recorded alongside a successful estimate
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputNotice {
    /// An enumerated field held an unknown value; the default was used
    UnrecognizedEnum {
        field: String,
        value: String,
        substituted: String,
    },
    /// A team-mix rank has no monthly cost and contributes nothing
    UnknownRank { rank: String },
    /// The team mix did not sum to a positive total; the standard mix was used
    TeamMixFallback,
    /// A department is not in the catalog
    UnknownDepartment { value: String },
    /// Department allocation was given but the catalog has no departments
    DepartmentsIgnored,
}

impl fmt::Display for InputNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputNotice::UnrecognizedEnum {
                field,
                value,
                substituted,
            } => write!(f, "unrecognized {} '{}', using '{}'", field, value, substituted),
            InputNotice::UnknownRank { rank } => {
                write!(f, "rank '{}' has no monthly cost and contributes zero", rank)
            }
            InputNotice::TeamMixFallback => {
                write!(f, "team mix weights do not sum to a positive total, using the standard mix")
            }
            InputNotice::UnknownDepartment { value } => {
                write!(f, "unknown department '{}' ignored", value)
            }
            InputNotice::DepartmentsIgnored => {
                write!(f, "department allocation ignored by the flat-rate catalog")
            }
        }
    }
}
