//! Password service response handling.
//!
//! The password step runs once before any PAN validation request. A fresh
//! password is written to the environment; when the service fails, an
//! earlier password already in the environment is reused.

use crate::environment::Environment;
use crate::error::HarnessError;
use crate::parser::{locate_envelope, parse_xml};
use tracing::{debug, info, warn};

const PASSWORD_PATH: [&str; 2] = ["GetPasswordResponse", "GetPasswordResult"];

/// Where the password in effect came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordSource {
    /// Extracted from this response and stored
    Fresh(String),
    /// Reused from the environment after the service failed
    Cached(String),
}

impl PasswordSource {
    pub fn password(&self) -> &str {
        match self {
            Self::Fresh(password) | Self::Cached(password) => password,
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh(_))
    }
}

/// Extract the password from a `GetPassword` response body.
///
/// Returns a description of what was missing when no password is found.
pub fn extract_password(body: &str) -> Result<String, String> {
    let document = parse_xml(body).map_err(|e| e.to_string())?;
    let envelope = locate_envelope(&document)
        .ok_or_else(|| "no soap:Envelope or soap12:Envelope".to_string())?;
    let soap_body = envelope
        .body()
        .ok_or_else(|| format!("{}:Body missing", envelope.dialect.prefix()))?;

    let node = soap_body
        .descend(&PASSWORD_PATH)
        .map_err(|level| format!("{} missing", level))?;

    match node.as_text() {
        Some(password) if !password.is_empty() => Ok(password.to_string()),
        Some(_) => Err("GetPasswordResult is empty".to_string()),
        None => Err("GetPasswordResult is not a text value".to_string()),
    }
}

/// Resolve the run password from the password service response.
///
/// On success the password is stored under `env_key`. On failure the
/// environment is left untouched; an existing password there is returned as
/// [`PasswordSource::Cached`], otherwise the run cannot continue.
pub fn resolve_password(
    status: u16,
    body: &str,
    env: &mut Environment,
    env_key: &str,
) -> Result<PasswordSource, HarnessError> {
    let reason = if status == 200 {
        match extract_password(body) {
            Ok(password) => {
                env.set(env_key, password.clone());
                info!(env_key, "Password retrieved and stored");
                return Ok(PasswordSource::Fresh(password));
            }
            Err(reason) => {
                warn!(reason = %reason, "Password missing from service response");
                reason
            }
        }
    } else {
        warn!(status, "Password service returned error");
        debug!(body, "Password service response");
        format!("password service returned HTTP {}", status)
    };

    match env.get(env_key) {
        Some(existing) => {
            info!(env_key, "Using existing password from environment");
            Ok(PasswordSource::Cached(existing.to_string()))
        }
        None => Err(HarnessError::PasswordUnavailable {
            status,
            reason: format!("{}; no existing password found", reason),
        }),
    }
}
