//! PAN validation response checks.

use crate::cases::TestCase;
use crate::config::{HarnessConfig, Profile};
use crate::error::CheckCode;
use crate::parser::{locate_envelope, parse_xml, XmlNode};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;
use tracing::debug;

/// Path from the SOAP body to the application response root.
const APP_ROOT_PATH: [&str; 3] = ["PANValidationResponse", "PANValidationResult", "APP_RES_ROOT"];
const INQUIRY: &str = "APP_PAN_INQ";
const SUMMARY: &str = "APP_PAN_SUMM";

/// What the request layer observed for one response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseMetadata {
    /// HTTP status code
    pub status: u16,
    /// Content-Type header, if any
    pub content_type: Option<String>,
    /// Elapsed time in milliseconds
    pub elapsed_ms: u64,
}

/// Outcome of a single named check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Check {
    /// Check code
    pub code: CheckCode,
    /// Human-readable check name
    pub name: String,
    /// Whether the check passed
    pub passed: bool,
    /// Failure detail
    pub message: Option<String>,
}

impl Check {
    fn pass(code: CheckCode, name: impl Into<String>) -> Self {
        Self {
            code,
            name: name.into(),
            passed: true,
            message: None,
        }
    }

    fn fail(code: CheckCode, name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            name: name.into(),
            passed: false,
            message: Some(message.into()),
        }
    }

    fn outcome(
        code: CheckCode,
        name: impl Into<String>,
        passed: bool,
        message: impl FnOnce() -> String,
    ) -> Self {
        if passed {
            Self::pass(code, name)
        } else {
            Self::fail(code, name, message())
        }
    }
}

/// Ordered check results for one test case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    /// Test case id
    pub test_id: String,
    /// Profile the checks ran under
    pub profile: Profile,
    /// Checks in execution order
    pub checks: Vec<Check>,
}

impl ValidationResult {
    /// True when every check passed.
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|check| check.passed)
    }

    /// Number of passing checks.
    pub fn passed_count(&self) -> usize {
        self.checks.iter().filter(|check| check.passed).count()
    }

    /// Failing checks, in order.
    pub fn failures(&self) -> impl Iterator<Item = &Check> {
        self.checks.iter().filter(|check| !check.passed)
    }

    /// First check with the given code.
    pub fn check(&self, code: CheckCode) -> Option<&Check> {
        self.checks.iter().find(|check| check.code == code)
    }

    /// One-line outcome in the profile's log format.
    pub fn summary_line(&self) -> String {
        match (self.profile, self.passed()) {
            (Profile::Smoke, true) => format!("[SUCCESS] SMOKE PASS - {}", self.test_id),
            (Profile::Smoke, false) => format!("[FAILURE] SMOKE FAIL - {}", self.test_id),
            (Profile::Regression, passed) => format!(
                "[{}] {}: {}/{} checks passed",
                if passed { "PASS" } else { "FAIL" },
                self.test_id,
                self.passed_count(),
                self.checks.len()
            ),
        }
    }

    fn add(&mut self, mut check: Check) {
        if self.profile == Profile::Regression {
            check.name = format!("{} - {}", self.test_id, check.name);
        }
        debug!(
            test_id = %self.test_id,
            code = check.code.as_str(),
            passed = check.passed,
            "{}",
            check.name
        );
        self.checks.push(check);
    }
}

/// Inquiry and summary nodes under `APP_RES_ROOT`.
struct AppResponse<'a> {
    inquiry: &'a XmlNode,
    summary: &'a XmlNode,
}

/// Loose match for an XML declaration or a SOAP opening tag.
fn opening_tag() -> &'static Regex {
    static OPENING_TAG: OnceLock<Regex> = OnceLock::new();
    OPENING_TAG.get_or_init(|| {
        Regex::new(r"<\?xml|<soap|<[\w.-]+:Envelope").expect("opening tag pattern is valid")
    })
}

/// Validates PAN validation responses for one profile.
///
/// Holds no state beyond configuration; the same inputs always produce
/// the same result.
pub struct ResponseValidator {
    config: HarnessConfig,
    profile: Profile,
}

impl ResponseValidator {
    /// Create a validator for the given profile.
    pub fn new(config: HarnessConfig, profile: Profile) -> Self {
        Self { config, profile }
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    /// Run every applicable check. Checks never stop one another.
    pub fn validate(
        &self,
        case: &TestCase,
        response: &ResponseMetadata,
        body: &str,
    ) -> ValidationResult {
        let mut result = ValidationResult {
            test_id: case.id.clone(),
            profile: self.profile,
            checks: Vec::new(),
        };

        self.check_status(case, response, &mut result);
        self.check_response_time(response, &mut result);
        if self.profile.checks_content_type() {
            self.check_content_type(response, &mut result);
        }
        self.check_raw_structure(body, &mut result);

        let expected_app = case.expected_app_status.as_str();
        if expected_app == self.config.checks.success_status {
            self.check_success_response(case, body, &mut result);
        } else if !expected_app.is_empty() {
            result.add(Check::outcome(
                CheckCode::ErrorCode,
                format!("Error code: {}", expected_app),
                body.contains(expected_app),
                || format!("response body does not contain '{}'", expected_app),
            ));
        }

        result
    }

    fn check_status(&self, case: &TestCase, response: &ResponseMetadata, result: &mut ValidationResult) {
        let Some(expected) = case.expected_status_code() else {
            debug!(
                test_id = %case.id,
                expected_http_status = %case.expected_http_status,
                "Expected HTTP status is not a number, skipping status check"
            );
            return;
        };

        result.add(Check::outcome(
            CheckCode::HttpStatus,
            format!("HTTP Status: {}", expected),
            i64::from(response.status) == expected,
            || format!("expected HTTP {}, got {}", expected, response.status),
        ));
    }

    fn check_response_time(&self, response: &ResponseMetadata, result: &mut ValidationResult) {
        let ceiling = self.config.max_response_time_ms(self.profile);
        result.add(Check::outcome(
            CheckCode::ResponseTime,
            format!("Response time (< {}ms)", ceiling),
            response.elapsed_ms < ceiling,
            || format!("response took {}ms", response.elapsed_ms),
        ));
    }

    fn check_content_type(&self, response: &ResponseMetadata, result: &mut ValidationResult) {
        let name = "Response content type is XML";
        let check = match response.content_type.as_deref() {
            Some(ct) => Check::outcome(CheckCode::ContentType, name, ct.contains("xml"), || {
                format!("Content-Type '{}' does not mention xml", ct)
            }),
            None => Check::fail(CheckCode::ContentType, name, "Content-Type header missing"),
        };
        result.add(check);
    }

    fn check_raw_structure(&self, body: &str, result: &mut ValidationResult) {
        let marker = self.config.checks.service_marker.as_str();
        let name = "Valid SOAP response structure";

        let check = if !body.contains(marker) {
            Check::fail(
                CheckCode::RawStructure,
                name,
                format!("response body does not contain '{}'", marker),
            )
        } else if !opening_tag().is_match(body) {
            Check::fail(
                CheckCode::RawStructure,
                name,
                "response body has no XML declaration or SOAP envelope tag",
            )
        } else {
            Check::pass(CheckCode::RawStructure, name)
        };
        result.add(check);
    }

    /// Structural traversal, then echo checks against the resolved nodes.
    fn check_success_response(&self, case: &TestCase, body: &str, result: &mut ValidationResult) {
        let document = match parse_xml(body) {
            Ok(document) => document,
            Err(e) => {
                result.add(Check::fail(
                    CheckCode::XmlParseable,
                    "XML response parseable",
                    e.to_string(),
                ));
                return;
            }
        };

        let app = match resolve_app_response(&document) {
            Ok(app) => {
                result.add(Check::pass(
                    CheckCode::SoapStructure,
                    "Response has correct SOAP structure",
                ));
                app
            }
            Err(missing) => {
                result.add(Check::fail(
                    CheckCode::SoapStructure,
                    "Response has correct SOAP structure",
                    missing,
                ));
                return;
            }
        };

        if self.config.checks.app_status_field {
            result.add(field_check(
                CheckCode::AppStatus,
                format!("APP_STATUS should be {}", case.expected_app_status),
                &case.expected_app_status,
                app.inquiry,
                "APP_STATUS",
            ));
        }

        let inputs = &case.inputs;
        let echoes = [
            (CheckCode::PanEcho, "PAN number echoed correctly", &inputs.pan_no, app.inquiry, "APP_PAN_NO"),
            (CheckCode::OkraCodeEcho, "OKRA code preserved", &inputs.okra_code, app.summary, "APP_OTHKRA_CODE"),
            (CheckCode::OkraBatchEcho, "OKRA batch preserved", &inputs.okra_batch, app.summary, "APP_OTHKRA_BATCH"),
            (CheckCode::TotalRecordsEcho, "Total records preserved", &inputs.total_records, app.summary, "APP_TOTAL_REC"),
        ];
        for (code, name, expected, node, field) in echoes {
            if expected.is_empty() {
                continue;
            }
            result.add(field_check(code, name, expected, node, field));
        }

        let response_date = app.summary.text_at(&["APP_RESPONSE_DATE"]).unwrap_or("");
        result.add(Check::outcome(
            CheckCode::ResponseDate,
            "Response date is present",
            !response_date.is_empty(),
            || format!("{}.APP_RESPONSE_DATE missing or empty", SUMMARY),
        ));
    }
}

/// Compare a leaf field of `node` with the expected text.
fn field_check(
    code: CheckCode,
    name: impl Into<String>,
    expected: &str,
    node: &XmlNode,
    field: &str,
) -> Check {
    match node.text_at(&[field]) {
        Some(actual) => Check::outcome(code, name, actual == expected, || {
            format!("{} expected '{}', found '{}'", field, expected, actual)
        }),
        None => Check::fail(code, name, format!("{} missing", field)),
    }
}

/// Locate `APP_RES_ROOT` and its populated inquiry and summary nodes.
///
/// The error names the first level that was absent.
fn resolve_app_response(document: &XmlNode) -> Result<AppResponse<'_>, String> {
    let envelope = locate_envelope(document)
        .ok_or_else(|| "soap:Envelope / soap12:Envelope missing".to_string())?;
    let body = envelope
        .body()
        .ok_or_else(|| format!("{}:Body missing", envelope.dialect.prefix()))?;
    let root = body
        .descend(&APP_ROOT_PATH)
        .map_err(|level| format!("{} missing", level))?;

    let populated = |name: &str| {
        root.get(name)
            .filter(|node| node.is_populated())
            .ok_or_else(|| format!("{} missing or empty", name))
    };

    Ok(AppResponse {
        inquiry: populated(INQUIRY)?,
        summary: populated(SUMMARY)?,
    })
}
