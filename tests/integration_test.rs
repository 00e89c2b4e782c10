//! Integration tests for the pan-validation-harness crate.
//!
//! These tests exercise the public API surface end-to-end, combining
//! parsing, validation, the password step and the run harness.

use pan_validation_harness::cases::{smoke_cases, CaseInputs};
use pan_validation_harness::config::{HarnessConfig, Profile};
use pan_validation_harness::environment::Environment;
use pan_validation_harness::error::{CheckCode, HarnessError};
use pan_validation_harness::harness::{CapturedResponse, Harness, ResponseSet};
use pan_validation_harness::parser::{locate_envelope, parse_xml, SoapDialect};
use pan_validation_harness::password::{resolve_password, PasswordSource};
use pan_validation_harness::validator::{ResponseMetadata, ResponseValidator};
use pan_validation_harness::{TestCase, TestSuite};

// ============================================================================
// Helpers: captured service responses
// ============================================================================

const REQUEST_DATE: &str = "19-10-2026";

fn pan_success_body(prefix: &str, pan_no: &str) -> String {
    let ns = match prefix {
        "soap12" => "http://www.w3.org/2003/05/soap-envelope",
        _ => "http://schemas.xmlsoap.org/soap/envelope/",
    };
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<{p}:Envelope xmlns:{p}="{ns}" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <{p}:Body>
    <PANValidationResponse xmlns="https://pancheck.www.kracvl.com">
      <PANValidationResult>
        <APP_RES_ROOT>
          <APP_PAN_INQ>
            <APP_PAN_NO>{pan}</APP_PAN_NO>
            <APP_NAME>TEST NAME</APP_NAME>
            <APP_STATUS>Success</APP_STATUS>
          </APP_PAN_INQ>
          <APP_PAN_SUMM>
            <APP_OTHKRA_CODE>CVL</APP_OTHKRA_CODE>
            <APP_OTHKRA_BATCH>1234</APP_OTHKRA_BATCH>
            <APP_REQ_DATE>19-10-2026</APP_REQ_DATE>
            <APP_RESPONSE_DATE>19-10-2026 11:02:45</APP_RESPONSE_DATE>
            <APP_TOTAL_REC>1</APP_TOTAL_REC>
          </APP_PAN_SUMM>
        </APP_RES_ROOT>
      </PANValidationResult>
    </PANValidationResponse>
  </{p}:Body>
</{p}:Envelope>"#,
        p = prefix,
        ns = ns,
        pan = pan_no
    )
}

fn pan_error_body(code: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    <PANValidationResponse xmlns="https://pancheck.www.kracvl.com">
      <PANValidationResult>{code}|Invalid PAN number</PANValidationResult>
    </PANValidationResponse>
  </soap:Body>
</soap:Envelope>"#,
        code = code
    )
}

fn password_body(value: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    <GetPasswordResponse xmlns="https://pancheck.www.kracvl.com">
      <GetPasswordResult>{}</GetPasswordResult>
    </GetPasswordResponse>
  </soap:Body>
</soap:Envelope>"#,
        value
    )
}

fn smoke_case(id: &str) -> TestCase {
    smoke_cases(REQUEST_DATE)
        .into_iter()
        .find(|case| case.id == id)
        .expect("smoke case exists")
}

fn metadata(status: u16, elapsed_ms: u64) -> ResponseMetadata {
    ResponseMetadata {
        status,
        content_type: Some("text/xml; charset=utf-8".to_string()),
        elapsed_ms,
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_scenario_a_blank_request_400() {
    let case = smoke_case("TC_INQ_REQ_001");
    let validator = ResponseValidator::new(HarnessConfig::default(), Profile::Smoke);
    let result = validator.validate(&case, &metadata(400, 90), "");

    let status = result.check(CheckCode::HttpStatus).unwrap();
    assert!(status.passed);
    assert_eq!(status.name, "HTTP Status: 400");

    assert!(result.check(CheckCode::XmlParseable).is_none());
    assert!(result.check(CheckCode::SoapStructure).is_none());
    assert!(result.check(CheckCode::ErrorCode).is_none());
    assert!(result.check(CheckCode::PanEcho).is_none());

    // The raw body check runs for every case, so an empty body fails it
    let raw = result.check(CheckCode::RawStructure).unwrap();
    assert!(!raw.passed);
    assert_eq!(
        raw.message.as_deref(),
        Some("response body does not contain 'PANValidation'")
    );
    assert!(!result.passed());
    assert_eq!(result.failures().count(), 1);
    assert_eq!(result.summary_line(), "[FAILURE] SMOKE FAIL - TC_INQ_REQ_001");
}

#[test]
fn test_scenario_b_valid_pan_all_pass() {
    let case = smoke_case("TC_INQ_REQ_002");
    for profile in [Profile::Smoke, Profile::Regression] {
        let validator = ResponseValidator::new(HarnessConfig::default(), profile);
        let result = validator.validate(
            &case,
            &metadata(200, 400),
            &pan_success_body("soap", "OVSWF8950H"),
        );
        assert!(
            result.passed(),
            "Expected all checks to pass under {:?}, got: {:?}",
            profile,
            result.failures().collect::<Vec<_>>()
        );
        assert!(result.check(CheckCode::PanEcho).unwrap().passed);
        assert!(result.check(CheckCode::OkraCodeEcho).unwrap().passed);
        assert!(result.check(CheckCode::OkraBatchEcho).unwrap().passed);
        assert!(result.check(CheckCode::TotalRecordsEcho).unwrap().passed);
        assert!(result.check(CheckCode::ResponseDate).unwrap().passed);
    }
}

#[test]
fn test_scenario_c_special_character_pan() {
    let case = smoke_case("TC_INQ_REQ_004");
    let validator = ResponseValidator::new(HarnessConfig::default(), Profile::Smoke);
    let result = validator.validate(&case, &metadata(200, 150), &pan_error_body("WEBERR-999"));

    assert!(result.passed());
    assert!(result.check(CheckCode::ErrorCode).unwrap().passed);
    assert!(result.check(CheckCode::SoapStructure).is_none());
    assert!(result.check(CheckCode::PanEcho).is_none());
    assert!(result.check(CheckCode::OkraCodeEcho).is_none());
}

#[test]
fn test_scenario_d_password_unavailable() {
    let mut env = Environment::new();
    let err = resolve_password(500, "Internal Server Error", &mut env, "password").unwrap_err();

    assert!(matches!(err, HarnessError::PasswordUnavailable { status: 500, .. }));
    assert!(err.blocks_run());
    assert!(!env.contains("password"));
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn test_expected_400_status_depends_only_on_code() {
    let case = TestCase {
        id: "TC_INQ_REQ_030".to_string(),
        expected_http_status: "400".to_string(),
        ..Default::default()
    };
    let validator = ResponseValidator::new(HarnessConfig::default(), Profile::Regression);
    let success = pan_success_body("soap", "X");
    let bodies = ["", "garbage", success.as_str()];

    for body in bodies {
        for status in [200u16, 400, 401, 500] {
            let result = validator.validate(&case, &metadata(status, 10), body);
            assert_eq!(
                result.check(CheckCode::HttpStatus).unwrap().passed,
                status == 400,
                "status {} body {:?}",
                status,
                body
            );
        }
    }
}

#[test]
fn test_missing_app_res_root_is_one_failure_both_dialects() {
    let case = smoke_case("TC_INQ_REQ_002");
    let validator = ResponseValidator::new(HarnessConfig::default(), Profile::Regression);

    for prefix in ["soap", "soap12"] {
        let body = pan_success_body(prefix, "OVSWF8950H")
            .replace("<APP_RES_ROOT>", "<OTHER_ROOT>")
            .replace("</APP_RES_ROOT>", "</OTHER_ROOT>");
        let result = validator.validate(&case, &metadata(200, 10), &body);

        let structural: Vec<_> = result
            .failures()
            .filter(|c| matches!(c.code, CheckCode::SoapStructure | CheckCode::XmlParseable))
            .collect();
        assert_eq!(structural.len(), 1, "{}: {:?}", prefix, result.checks);
        assert_eq!(structural[0].message.as_deref(), Some("APP_RES_ROOT missing"));
        assert_eq!(result.failures().count(), 1);
    }
}

#[test]
fn test_pan_echo_round_trip() {
    let validator = ResponseValidator::new(HarnessConfig::default(), Profile::Smoke);
    let case = TestCase {
        id: "TC_INQ_REQ_002".to_string(),
        inputs: CaseInputs {
            pan_no: "OVSWF8950H".to_string(),
            ..Default::default()
        },
        expected_http_status: "200".to_string(),
        expected_app_status: "Success".to_string(),
        ..Default::default()
    };

    let echo = |case: &TestCase, body_pan: &str| {
        validator
            .validate(case, &metadata(200, 10), &pan_success_body("soap12", body_pan))
            .check(CheckCode::PanEcho)
            .map(|c| c.passed)
    };

    assert_eq!(echo(&case, "OVSWF8950H"), Some(true));
    assert_eq!(echo(&case, "OVSWF8950J"), Some(false));

    let mut changed = case.clone();
    changed.inputs.pan_no = "AAAPA1234A".to_string();
    assert_eq!(echo(&changed, "OVSWF8950H"), Some(false));
}

#[test]
fn test_repeated_validation_is_identical() {
    let validator = ResponseValidator::new(HarnessConfig::default(), Profile::Regression);
    let case = smoke_case("TC_INQ_REQ_002");
    let body = pan_success_body("soap", "OVSWF8950H");

    let first = validator.validate(&case, &metadata(200, 4999), &body);
    for _ in 0..5 {
        assert_eq!(validator.validate(&case, &metadata(200, 4999), &body), first);
    }
}

// ============================================================================
// Parsing
// ============================================================================

#[test]
fn test_parse_both_dialects() {
    let doc11 = parse_xml(&pan_success_body("soap", "A")).unwrap();
    assert_eq!(locate_envelope(&doc11).unwrap().dialect, SoapDialect::Soap11);

    let doc12 = parse_xml(&pan_success_body("soap12", "A")).unwrap();
    let envelope = locate_envelope(&doc12).unwrap();
    assert_eq!(envelope.dialect, SoapDialect::Soap12);
    assert_eq!(
        envelope.body().unwrap().text_at(&[
            "PANValidationResponse",
            "PANValidationResult",
            "APP_RES_ROOT",
            "APP_PAN_SUMM",
            "APP_TOTAL_REC",
        ]),
        Some("1")
    );
}

#[test]
fn test_repeated_inquiry_nodes_fail_parse_check() {
    let case = smoke_case("TC_INQ_REQ_002");
    let body = pan_success_body("soap", "OVSWF8950H").replace(
        "<APP_NAME>TEST NAME</APP_NAME>",
        "<APP_NAME>ONE</APP_NAME><APP_NAME>TWO</APP_NAME>",
    );
    let validator = ResponseValidator::new(HarnessConfig::default(), Profile::Smoke);
    let result = validator.validate(&case, &metadata(200, 10), &body);

    let parse = result.check(CheckCode::XmlParseable).unwrap();
    assert!(!parse.passed);
    assert!(parse.message.as_deref().unwrap().contains("APP_NAME"));
}

// ============================================================================
// Password step
// ============================================================================

#[test]
fn test_password_fresh_then_cached() {
    let mut env = Environment::new();

    let fresh = resolve_password(200, &password_body("first"), &mut env, "password").unwrap();
    assert_eq!(fresh, PasswordSource::Fresh("first".to_string()));

    let cached = resolve_password(503, "", &mut env, "password").unwrap();
    assert_eq!(cached, PasswordSource::Cached("first".to_string()));
    assert_eq!(env.get("password"), Some("first"));
}

#[test]
fn test_password_environment_persists_as_json() {
    let mut env = Environment::new();
    resolve_password(200, &password_body("persisted"), &mut env, "password").unwrap();

    let reloaded = Environment::from_json(&env.to_json().unwrap()).unwrap();
    let mut fresh_run = reloaded.clone();
    let source = resolve_password(500, "", &mut fresh_run, "password").unwrap();
    assert_eq!(source.password(), "persisted");
}

// ============================================================================
// End-to-end runs
// ============================================================================

fn smoke_responses() -> ResponseSet {
    let yaml = format!(
        r#"
password:
  status: 200
  content_type: text/xml
  elapsed_ms: 40
  body: {password}
requests:
  "00 Get Password":
    status: 200
    body: {password}
  "Smoke - TC_INQ_REQ_001 - blank":
    status: 400
    content_type: text/xml
    elapsed_ms: 70
    body: {blank}
  "Smoke - TC_INQ_REQ_002 - valid":
    status: 200
    content_type: text/xml
    elapsed_ms: 310
    body: {valid}
  "Smoke - TC_INQ_REQ_004 - symbols":
    status: 200
    content_type: text/xml
    elapsed_ms: 120
    body: {symbols}
"#,
        password = serde_json::to_string(&password_body("smoke-pw")).unwrap(),
        blank = serde_json::to_string(&pan_error_body("WEBERR-001")).unwrap(),
        valid = serde_json::to_string(&pan_success_body("soap", "OVSWF8950H")).unwrap(),
        symbols = serde_json::to_string(&pan_error_body("WEBERR-999")).unwrap(),
    );
    ResponseSet::from_yaml(&yaml).unwrap()
}

#[test]
fn test_e2e_smoke_run_passes() {
    let harness = Harness::new(HarnessConfig::default(), Profile::Smoke);
    let mut env = Environment::new();
    let report = harness
        .run(&TestSuite::smoke(REQUEST_DATE), &smoke_responses(), &mut env)
        .unwrap();

    assert!(report.passed(), "{:#?}", report.results);
    assert_eq!(report.passed_cases(), 3);
    assert!(report.password.is_fresh());
    assert_eq!(env.get("password"), Some("smoke-pw"));

    let lines: Vec<String> = report.results.iter().map(|r| r.summary_line()).collect();
    assert_eq!(
        lines,
        vec![
            "[SUCCESS] SMOKE PASS - TC_INQ_REQ_001",
            "[SUCCESS] SMOKE PASS - TC_INQ_REQ_002",
            "[SUCCESS] SMOKE PASS - TC_INQ_REQ_004",
        ]
    );
    assert_eq!(harness.metrics().cases_validated, 3);
    assert_eq!(harness.metrics().cases_failed, 0);
}

#[test]
fn test_e2e_regression_suite_from_yaml() {
    let suite = TestSuite::from_yaml(
        r#"
cases:
  - test_id: TC_INQ_REQ_002
    test_description: Valid PAN
    input_pan_no: OVSWF8950H
    input_okra_code: CVL
    input_okra_batch: 1234
    input_total_records: 1
    expected_http_status: 200
    expected_app_status: Success
  - test_id: TC_INQ_REQ_004
    test_description: Special characters
    input_pan_no: "!@#$%^&*"
    expected_http_status: 200
    expected_app_status: WEBERR-999
"#,
    )
    .unwrap();

    let mut responses = smoke_responses();
    // Regression asserts on Content-Type
    responses
        .requests
        .get_mut("Smoke - TC_INQ_REQ_004 - symbols")
        .unwrap()
        .content_type = Some("text/html".to_string());

    let harness = Harness::new(HarnessConfig::default(), Profile::Regression);
    let mut env = Environment::new();
    let report = harness.run(&suite, &responses, &mut env).unwrap();

    assert!(!report.passed());
    assert_eq!(report.passed_cases(), 1);
    assert_eq!(report.failed_cases(), 1);

    let failed = &report.results[1];
    let failures: Vec<CheckCode> = failed.failures().map(|c| c.code).collect();
    assert_eq!(failures, vec![CheckCode::ContentType]);
    assert_eq!(failed.summary_line(), "[FAIL] TC_INQ_REQ_004: 4/5 checks passed");
}

#[test]
fn test_e2e_row_selection_narrows_run() {
    let suite = TestSuite::smoke(REQUEST_DATE).select_rows("2-3").unwrap();
    let harness = Harness::new(HarnessConfig::default(), Profile::Smoke);
    let mut env = Environment::new();
    let report = harness.run(&suite, &smoke_responses(), &mut env).unwrap();

    let ids: Vec<&str> = report.results.iter().map(|r| r.test_id.as_str()).collect();
    assert_eq!(ids, vec!["TC_INQ_REQ_002", "TC_INQ_REQ_004"]);
    assert!(report.passed());

    assert!(matches!(
        TestSuite::smoke(REQUEST_DATE).select_rows("3-4"),
        Err(HarnessError::Config(_))
    ));
}

#[test]
fn test_e2e_password_outage_uses_cached_password() {
    let mut responses = smoke_responses();
    responses.password = CapturedResponse {
        status: 500,
        body: "Internal Server Error".to_string(),
        ..Default::default()
    };

    let mut env = Environment::new();
    env.set("password", "from-last-run");

    let harness = Harness::new(HarnessConfig::default(), Profile::Smoke);
    let report = harness
        .run(&TestSuite::smoke(REQUEST_DATE), &responses, &mut env)
        .unwrap();
    assert_eq!(report.password, PasswordSource::Cached("from-last-run".to_string()));
    assert!(report.passed());
}

#[test]
fn test_e2e_password_outage_blocks_run() {
    let mut responses = smoke_responses();
    responses.password.status = 500;

    let harness = Harness::new(HarnessConfig::default(), Profile::Smoke);
    let mut env = Environment::new();
    let err = harness
        .run(&TestSuite::smoke(REQUEST_DATE), &responses, &mut env)
        .unwrap_err();

    assert!(err.blocks_run());
    assert!(env.is_empty());
    assert_eq!(harness.metrics().cases_validated, 0);
}
