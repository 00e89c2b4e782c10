//! Error types for the PAN validation harness.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Harness errors.
///
/// Check failures are not errors; they are reported through
/// [`crate::validator::ValidationResult`]. These variants cover conditions
/// that stop a step outright.
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("XML parsing error: {0}")]
    XmlParse(String),

    #[error("Password unavailable (HTTP {status}): {reason}")]
    PasswordUnavailable { status: u16, reason: String },

    #[error("Unknown test case: {0}")]
    UnknownTestCase(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl HarnessError {
    /// True when the error must stop every dependent test in the run.
    pub fn blocks_run(&self) -> bool {
        matches!(self, Self::PasswordUnavailable { .. })
    }
}

/// Identifies which check produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CheckCode {
    /// HTTP status equals the expected status
    HttpStatus,
    /// Elapsed time below the profile ceiling
    ResponseTime,
    /// Content-Type mentions xml
    ContentType,
    /// Raw body looks like a PAN validation XML/SOAP document
    RawStructure,
    /// Body parsed as XML
    XmlParseable,
    /// APP_RES_ROOT with inquiry and summary nodes
    SoapStructure,
    /// Expected error token found in the raw body
    ErrorCode,
    /// APP_STATUS equals the expected application status
    AppStatus,
    /// PAN number echoed
    PanEcho,
    /// OKRA code echoed
    OkraCodeEcho,
    /// OKRA batch echoed
    OkraBatchEcho,
    /// Total record count echoed
    TotalRecordsEcho,
    /// Response date present
    ResponseDate,
}

impl CheckCode {
    /// Get the string code for this check.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HttpStatus => "HTTP_STATUS",
            Self::ResponseTime => "RESPONSE_TIME",
            Self::ContentType => "CONTENT_TYPE",
            Self::RawStructure => "RAW_STRUCTURE",
            Self::XmlParseable => "XML_PARSEABLE",
            Self::SoapStructure => "SOAP_STRUCTURE",
            Self::ErrorCode => "ERROR_CODE",
            Self::AppStatus => "APP_STATUS",
            Self::PanEcho => "PAN_ECHO",
            Self::OkraCodeEcho => "OKRA_CODE_ECHO",
            Self::OkraBatchEcho => "OKRA_BATCH_ECHO",
            Self::TotalRecordsEcho => "TOTAL_RECORDS_ECHO",
            Self::ResponseDate => "RESPONSE_DATE",
        }
    }
}
