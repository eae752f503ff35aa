//! Identifier and parameter types shared by every layer.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::validation::{Cardinality, FieldSpec};

// ---------------------------------------------------------------------------
// JobId
// ---------------------------------------------------------------------------

/// Client-generated job identifier.
///
/// Created before the submission request is sent so that progress polling
/// can be correlated with the upload regardless of which request reaches
/// the server first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(uuid::Uuid);

impl JobId {
    /// Generate a fresh random (v4) identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl From<uuid::Uuid> for JobId {
    fn from(value: uuid::Uuid) -> Self {
        Self(value)
    }
}

// ---------------------------------------------------------------------------
// Multipart field names
// ---------------------------------------------------------------------------

/// Repeated field carrying design documents in single-document mode.
pub const FIELD_DOCUMENT_FILES: &str = "documentFiles";
/// Repeated field carrying the new-version design documents.
pub const FIELD_NEW_EXCEL_FILES: &str = "newExcelFiles";
/// Single field carrying the previous structured design document.
pub const FIELD_OLD_STRUCTURED_MD: &str = "oldStructuredMd";
/// Single field carrying the previous test specification.
pub const FIELD_OLD_TEST_SPEC_MD: &str = "oldTestSpecMd";
/// Text field carrying the granularity value.
pub const FIELD_GRANULARITY: &str = "granularity";

const SINGLE_DOCUMENT_FIELDS: &[FieldSpec] = &[FieldSpec {
    name: FIELD_DOCUMENT_FILES,
    cardinality: Cardinality::AtLeastOne,
    missing: "Please select a design document",
}];

const COMPARATIVE_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: FIELD_NEW_EXCEL_FILES,
        cardinality: Cardinality::AtLeastOne,
        missing: "Please select the new version design documents",
    },
    FieldSpec {
        name: FIELD_OLD_STRUCTURED_MD,
        cardinality: Cardinality::ExactlyOne,
        missing: "Please select the old structured design document",
    },
    FieldSpec {
        name: FIELD_OLD_TEST_SPEC_MD,
        cardinality: Cardinality::ExactlyOne,
        missing: "Please select the old test specification document",
    },
];

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// Processing variant chosen once per job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Generate a test specification from one or more design documents.
    SingleDocument,
    /// Generate a test specification from the difference between a new
    /// document set and the previous structured document/specification.
    Comparative,
}

impl Mode {
    /// Endpoint path segment, relative to the API base URL.
    pub fn endpoint_path(&self) -> &'static str {
        match self {
            Self::SingleDocument => "upload",
            Self::Comparative => "upload_diff",
        }
    }

    /// Archive name used when the response carries no usable filename.
    pub fn default_archive_name(&self) -> &'static str {
        match self {
            Self::SingleDocument => "generated_files.zip",
            Self::Comparative => "generated_files_diff.zip",
        }
    }

    /// Input fields for this mode, in validation order.
    pub fn fields(&self) -> &'static [FieldSpec] {
        match self {
            Self::SingleDocument => SINGLE_DOCUMENT_FIELDS,
            Self::Comparative => COMPARATIVE_FIELDS,
        }
    }

    /// Status text shown while a job of this mode is running.
    pub fn generating_text(&self) -> &'static str {
        match self {
            Self::SingleDocument => "Generating...",
            Self::Comparative => {
                "Generating... (includes change detection, this may take a while)"
            }
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SingleDocument => f.write_str("single_document"),
            Self::Comparative => f.write_str("comparative"),
        }
    }
}

// ---------------------------------------------------------------------------
// Granularity
// ---------------------------------------------------------------------------

/// Output detail level, forwarded verbatim to the server.
///
/// The client never interprets the value; [`Granularity::SIMPLE`] and
/// [`Granularity::DETAILED`] are the values the service documents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Granularity(String);

impl Granularity {
    pub const SIMPLE: &'static str = "simple";
    pub const DETAILED: &'static str = "detailed";

    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Granularity {
    fn default() -> Self {
        Self::new(Self::SIMPLE)
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
