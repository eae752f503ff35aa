//! Pre-submission checks of the user's file selections.
//!
//! Each [`Mode`] declares its input fields as a static [`FieldSpec`] table.
//! [`validate`] walks that table in order and stops at the first field that
//! does not satisfy its [`Cardinality`], so at most one reason is ever
//! reported.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::types::Mode;

/// How many files a field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// One or more files (repeated multipart field).
    AtLeastOne,
    /// Exactly one file (single multipart field).
    ExactlyOne,
}

/// Static description of one input field of a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Multipart field name, also the key in [`Selections`].
    pub name: &'static str,
    pub cardinality: Cardinality,
    /// Message shown when the field has no file selected.
    pub missing: &'static str,
}

/// Files the user selected, keyed by field name.
#[derive(Debug, Clone, Default)]
pub struct Selections {
    fields: HashMap<&'static str, Vec<PathBuf>>,
}

impl Selections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style variant of [`set`](Self::set).
    pub fn with<I, P>(mut self, field: &'static str, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.set(field, files);
        self
    }

    /// Replace the selection of one field.
    pub fn set<I, P>(&mut self, field: &'static str, files: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.fields
            .insert(field, files.into_iter().map(Into::into).collect());
    }

    /// Files selected for `field`; empty when the field was never set.
    pub fn files(&self, field: &str) -> &[PathBuf] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// The first unmet requirement of a selection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// No file selected for a required field.
    #[error("{message}")]
    Missing {
        field: &'static str,
        message: &'static str,
    },

    /// More than one file selected for a single-file field.
    #[error("Only one file may be selected for {field} ({count} selected)")]
    TooMany { field: &'static str, count: usize },
}

impl ValidationError {
    /// Field that failed the check.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Missing { field, .. } | Self::TooMany { field, .. } => field,
        }
    }
}

/// Check `selections` against the field table of `mode`.
pub fn validate(mode: Mode, selections: &Selections) -> Result<(), ValidationError> {
    for spec in mode.fields() {
        check_field(spec, selections.files(spec.name).len())?;
    }
    Ok(())
}

fn check_field(spec: &FieldSpec, count: usize) -> Result<(), ValidationError> {
    if count == 0 {
        return Err(ValidationError::Missing {
            field: spec.name,
            message: spec.missing,
        });
    }
    if spec.cardinality == Cardinality::ExactlyOne && count > 1 {
        return Err(ValidationError::TooMany {
            field: spec.name,
            count,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
