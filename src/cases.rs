//! Test case fixtures and suite loading.

use crate::error::HarnessError;
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::OnceLock;

/// Request inputs sent to the PAN validation service.
///
/// Every field is kept as text; a blank field means the input was omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaseInputs {
    #[serde(rename = "input_pan_no", deserialize_with = "scalar_string")]
    pub pan_no: String,
    #[serde(rename = "input_dob", deserialize_with = "scalar_string")]
    pub dob: String,
    #[serde(rename = "input_iop_flag", deserialize_with = "scalar_string")]
    pub iop_flag: String,
    #[serde(rename = "input_pos_code", deserialize_with = "scalar_string")]
    pub pos_code: String,
    #[serde(rename = "input_okra_code", deserialize_with = "scalar_string")]
    pub okra_code: String,
    #[serde(rename = "input_okra_batch", deserialize_with = "scalar_string")]
    pub okra_batch: String,
    #[serde(rename = "input_request_date", deserialize_with = "scalar_string")]
    pub request_date: String,
    #[serde(rename = "input_total_records", deserialize_with = "scalar_string")]
    pub total_records: String,
}

impl CaseInputs {
    /// Inputs as (label, value) pairs for logging, blanks shown as `BLANK`.
    pub fn display_fields(&self) -> Vec<(&'static str, &str)> {
        [
            ("PAN", &self.pan_no),
            ("DOB", &self.dob),
            ("IOP", &self.iop_flag),
            ("POS", &self.pos_code),
            ("OKRA_Code", &self.okra_code),
            ("OKRA_Batch", &self.okra_batch),
            ("Req_Date", &self.request_date),
            ("Total_Records", &self.total_records),
        ]
        .into_iter()
        .map(|(label, value)| {
            let shown = if value.is_empty() { "BLANK" } else { value.as_str() };
            (label, shown)
        })
        .collect()
    }
}

/// One input/expected-output fixture.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestCase {
    #[serde(rename = "test_id", deserialize_with = "scalar_string")]
    pub id: String,

    #[serde(rename = "test_description", deserialize_with = "scalar_string")]
    pub description: String,

    #[serde(flatten)]
    pub inputs: CaseInputs,

    /// Raw expected HTTP status; may be blank or malformed in test data
    #[serde(deserialize_with = "scalar_string")]
    pub expected_http_status: String,

    /// Expected application status; blank means none
    #[serde(deserialize_with = "scalar_string")]
    pub expected_app_status: String,
}

impl TestCase {
    /// Expected HTTP status, if the test data holds a valid integer.
    ///
    /// Integers no response can carry (`70000`, `-1`) are still returned so
    /// the status check fails rather than being skipped.
    pub fn expected_status_code(&self) -> Option<i64> {
        self.expected_http_status.trim().parse().ok()
    }
}

/// Accept any YAML/JSON scalar where text is expected (`1234` reads as `"1234"`).
fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Int(i64),
        Float(f64),
        Bool(bool),
        Null(()),
    }

    Ok(match Scalar::deserialize(deserializer)? {
        Scalar::Text(s) => s,
        Scalar::Int(n) => n.to_string(),
        Scalar::Float(f) => f.to_string(),
        Scalar::Bool(b) => b.to_string(),
        Scalar::Null(()) => String::new(),
    })
}

/// A list of test cases, typically loaded from YAML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestSuite {
    pub cases: Vec<TestCase>,
}

impl TestSuite {
    /// Parse a suite from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, HarnessError> {
        serde_yaml::from_str(yaml)
            .map_err(|e| HarnessError::Config(format!("invalid test suite: {}", e)))
    }

    /// The built-in smoke battery.
    pub fn smoke(request_date: &str) -> Self {
        Self {
            cases: smoke_cases(request_date),
        }
    }

    /// Look up a case by id.
    pub fn find(&self, id: &str) -> Result<&TestCase, HarnessError> {
        self.cases
            .iter()
            .find(|case| case.id == id)
            .ok_or_else(|| HarnessError::UnknownTestCase(id.to_string()))
    }

    /// Keep only the named cases, in the order given.
    pub fn select_cases<S: AsRef<str>>(&self, ids: &[S]) -> Result<TestSuite, HarnessError> {
        let cases = ids
            .iter()
            .map(|id| self.find(id.as_ref()).cloned())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(TestSuite { cases })
    }

    /// Keep the cases at the selected 1-based rows, in suite order.
    ///
    /// Accepts a single row (`2`), an inclusive range (`2-5`) or a comma
    /// separated list (`1,3,5`).
    pub fn select_rows(&self, selection: &str) -> Result<TestSuite, HarnessError> {
        let rows = parse_row_selection(selection)?;
        if let Some(row) = rows.iter().find(|&&row| row == 0 || row > self.cases.len()) {
            return Err(HarnessError::Config(format!(
                "row {} is outside the suite (1-{})",
                row,
                self.cases.len()
            )));
        }

        let cases = self
            .cases
            .iter()
            .enumerate()
            .filter(|(index, _)| rows.contains(&(index + 1)))
            .map(|(_, case)| case.clone())
            .collect();
        Ok(TestSuite { cases })
    }
}

/// Parse a row selection: `2`, `2-5` or `1,3,5`.
pub fn parse_row_selection(selection: &str) -> Result<Vec<usize>, HarnessError> {
    let invalid = |reason: &str| {
        HarnessError::Config(format!("invalid row selection '{}': {}", selection, reason))
    };
    let number = |text: &str| -> Result<usize, HarnessError> {
        if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("expected a row number"));
        }
        text.parse().map_err(|_| invalid("row number too large"))
    };

    let selection = selection.trim();
    if selection.is_empty() {
        return Err(invalid("empty selection"));
    }

    if let Some((start, end)) = selection.split_once('-') {
        let (start, end) = (number(start)?, number(end)?);
        if start > end {
            return Err(invalid("range start is after its end"));
        }
        return Ok((start..=end).collect());
    }

    let rows = selection
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(number)
        .collect::<Result<Vec<_>, _>>()?;
    if rows.is_empty() {
        return Err(invalid("empty selection"));
    }
    Ok(rows)
}

/// Format a date as the service expects it (`dd-mm-yyyy`).
pub fn format_request_date(date: NaiveDate) -> String {
    date.format("%d-%m-%Y").to_string()
}

/// Today's date in request format.
pub fn today_request_date() -> String {
    format_request_date(chrono::Local::now().date_naive())
}

/// Extract a `TC_INQ_REQ_NNN` identifier from a request name.
pub fn test_id_from_request_name(request_name: &str) -> Option<&str> {
    static TEST_ID: OnceLock<Regex> = OnceLock::new();
    TEST_ID
        .get_or_init(|| Regex::new(r"TC_INQ_REQ_\d{3}").expect("test id pattern is valid"))
        .find(request_name)
        .map(|m| m.as_str())
}

/// Smoke battery: a blank request, a valid PAN, and a PAN of symbols.
pub fn smoke_cases(request_date: &str) -> Vec<TestCase> {
    let valid_inputs = |pan_no: &str| CaseInputs {
        pan_no: pan_no.to_string(),
        dob: "28-08-1996".to_string(),
        iop_flag: "IE".to_string(),
        pos_code: "A1249".to_string(),
        okra_code: "CVL".to_string(),
        okra_batch: "1234".to_string(),
        request_date: request_date.to_string(),
        total_records: "1".to_string(),
    };

    vec![
        TestCase {
            id: "TC_INQ_REQ_001".to_string(),
            description: "All request fields blank".to_string(),
            inputs: CaseInputs::default(),
            expected_http_status: "400".to_string(),
            expected_app_status: String::new(),
        },
        TestCase {
            id: "TC_INQ_REQ_002".to_string(),
            description: "Valid PAN inquiry".to_string(),
            inputs: valid_inputs("OVSWF8950H"),
            expected_http_status: "200".to_string(),
            expected_app_status: "Success".to_string(),
        },
        TestCase {
            id: "TC_INQ_REQ_004".to_string(),
            description: "PAN made of special characters".to_string(),
            inputs: valid_inputs("!@#$%^&*"),
            expected_http_status: "200".to_string(),
            expected_app_status: "WEBERR-999".to_string(),
        },
    ]
}
