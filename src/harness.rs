//! Test run orchestration.
//!
//! Gates the run on the password step, then validates each test case
//! against its captured response and logs the outcome.

use crate::cases::{test_id_from_request_name, TestCase, TestSuite};
use crate::config::{HarnessConfig, Profile};
use crate::environment::Environment;
use crate::error::HarnessError;
use crate::password::{resolve_password, PasswordSource};
use crate::validator::{ResponseMetadata, ResponseValidator, ValidationResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

/// A response as captured by the request layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapturedResponse {
    /// HTTP status code
    pub status: u16,
    /// Content-Type header
    pub content_type: Option<String>,
    /// Elapsed time in milliseconds
    pub elapsed_ms: u64,
    /// Raw response body
    pub body: String,
}

impl CapturedResponse {
    /// Metadata seen by the validator.
    pub fn metadata(&self) -> ResponseMetadata {
        ResponseMetadata {
            status: self.status,
            content_type: self.content_type.clone(),
            elapsed_ms: self.elapsed_ms,
        }
    }
}

/// Captured responses for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseSet {
    /// Password service response
    pub password: CapturedResponse,
    /// PAN validation responses keyed by request name
    #[serde(default)]
    pub requests: BTreeMap<String, CapturedResponse>,
}

impl ResponseSet {
    /// Parse a response set from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, HarnessError> {
        serde_yaml::from_str(yaml)
            .map_err(|e| HarnessError::Config(format!("invalid response file: {}", e)))
    }
}

/// Outcome of a whole run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Password used by the run
    pub password: PasswordSource,
    /// Per-case results, in suite order. A case captured more than once
    /// has one result per captured response, in request name order.
    pub results: Vec<ValidationResult>,
    /// Cases with no captured response
    pub missing: Vec<String>,
}

impl RunReport {
    /// True when every case ran and passed.
    pub fn passed(&self) -> bool {
        self.missing.is_empty() && self.results.iter().all(ValidationResult::passed)
    }

    pub fn passed_cases(&self) -> usize {
        self.results.iter().filter(|r| r.passed()).count()
    }

    pub fn failed_cases(&self) -> usize {
        self.results.len() - self.passed_cases()
    }
}

/// Counters over the harness lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HarnessMetrics {
    pub cases_validated: u64,
    pub cases_failed: u64,
}

/// Runs test cases against captured responses.
pub struct Harness {
    config: HarnessConfig,
    validator: ResponseValidator,
    cases_validated: AtomicU64,
    cases_failed: AtomicU64,
}

impl Harness {
    /// Create a harness for the given profile.
    pub fn new(config: HarnessConfig, profile: Profile) -> Self {
        let validator = ResponseValidator::new(config.clone(), profile);
        Self {
            config,
            validator,
            cases_validated: AtomicU64::new(0),
            cases_failed: AtomicU64::new(0),
        }
    }

    pub fn profile(&self) -> Profile {
        self.validator.profile()
    }

    /// Whether a request is the password request rather than a PAN case.
    pub fn is_password_request(&self, request_name: &str) -> bool {
        request_name.contains(&self.config.password.request_marker)
    }

    /// Handle the password service response. An error here blocks the run.
    pub fn prepare_password(
        &self,
        response: &CapturedResponse,
        env: &mut Environment,
    ) -> Result<PasswordSource, HarnessError> {
        resolve_password(
            response.status,
            &response.body,
            env,
            &self.config.password.env_key,
        )
    }

    /// Validate one case and log its outcome.
    pub fn validate_case(&self, case: &TestCase, response: &CapturedResponse) -> ValidationResult {
        let inputs = case
            .inputs
            .display_fields()
            .iter()
            .map(|(label, value)| format!("{}={}", label, value))
            .collect::<Vec<_>>()
            .join(", ");

        info!(
            test_id = %case.id,
            description = %case.description,
            "[TEST] Starting test case"
        );
        debug!(test_id = %case.id, inputs = %inputs, "[INPUT] Input data");
        debug!(
            test_id = %case.id,
            expected_http_status = %case.expected_http_status,
            expected_app_status = %case.expected_app_status,
            "[EXPECTED] Expected outcome"
        );

        let result = self
            .validator
            .validate(case, &response.metadata(), &response.body);

        self.cases_validated.fetch_add(1, Ordering::Relaxed);
        if result.passed() {
            info!("{}", result.summary_line());
        } else {
            self.cases_failed.fetch_add(1, Ordering::Relaxed);
            warn!("{}", result.summary_line());
            for failure in result.failures() {
                warn!(
                    test_id = %case.id,
                    code = failure.code.as_str(),
                    detail = failure.message.as_deref().unwrap_or(""),
                    "   - {}",
                    failure.name
                );
            }
        }

        result
    }

    /// Run the password step and then every case in `suite`.
    ///
    /// Responses are matched to cases by the `TC_INQ_REQ_NNN` id in their
    /// request name, or by the whole name when it carries no such id.
    /// Every response matching a case is validated.
    pub fn run(
        &self,
        suite: &TestSuite,
        responses: &ResponseSet,
        env: &mut Environment,
    ) -> Result<RunReport, HarnessError> {
        let password = self.prepare_password(&responses.password, env)?;

        let mut by_id: BTreeMap<&str, Vec<&CapturedResponse>> = BTreeMap::new();
        for (name, response) in &responses.requests {
            if self.is_password_request(name) {
                debug!(request = %name, "Skipping password request");
                continue;
            }
            let id = test_id_from_request_name(name).unwrap_or(name.as_str());
            let captured = by_id.entry(id).or_default();
            if !captured.is_empty() {
                warn!(
                    test_id = %id,
                    request = %name,
                    "Several captured responses for one test case, validating each"
                );
            }
            captured.push(response);
        }

        let mut results = Vec::with_capacity(suite.cases.len());
        let mut missing = Vec::new();
        for case in &suite.cases {
            match by_id.get(case.id.as_str()) {
                Some(captured) => {
                    for response in captured {
                        results.push(self.validate_case(case, response));
                    }
                }
                None => {
                    warn!(test_id = %case.id, "No captured response for test case");
                    missing.push(case.id.clone());
                }
            }
        }

        let report = RunReport {
            password,
            results,
            missing,
        };
        info!(
            profile = ?self.profile(),
            passed = report.passed_cases(),
            failed = report.failed_cases(),
            missing = report.missing.len(),
            "Run complete"
        );
        Ok(report)
    }

    /// Snapshot of the counters.
    pub fn metrics(&self) -> HarnessMetrics {
        HarnessMetrics {
            cases_validated: self.cases_validated.load(Ordering::Relaxed),
            cases_failed: self.cases_failed.load(Ordering::Relaxed),
        }
    }
}
