//! PAN Validation Response Harness
//!
//! Validates responses of the SOAP PAN validation service against
//! expected-outcome test cases, the way the smoke and regression
//! collections assert on them.
//!
//! # Features
//!
//! - HTTP status, response time and content type checks
//! - Raw body shape check for PAN validation XML/SOAP responses
//! - `APP_RES_ROOT` traversal under `soap:` or `soap12:` envelopes
//! - Echo checks for PAN number, OKRA code/batch and record count
//! - Password service handling with fallback to a cached password
//! - Built-in smoke battery and YAML-loaded regression suites
//! - Row and test id selection over a suite
//!
//! # Example
//!
//! ```ignore
//! use pan_validation_harness::{Environment, Harness, HarnessConfig, Profile, ResponseSet, TestSuite};
//!
//! let harness = Harness::new(HarnessConfig::default(), Profile::Smoke);
//! let mut env = Environment::new();
//! let report = harness.run(&TestSuite::smoke("19-10-2026"), &responses, &mut env)?;
//! assert!(report.passed());
//! ```

pub mod cases;
pub mod config;
pub mod environment;
pub mod error;
pub mod harness;
pub mod parser;
pub mod password;
pub mod validator;

pub use cases::{TestCase, TestSuite};
pub use config::{HarnessConfig, Profile};
pub use environment::Environment;
pub use error::{CheckCode, HarnessError};
pub use harness::{CapturedResponse, Harness, ResponseSet, RunReport};
pub use validator::{ResponseMetadata, ResponseValidator, ValidationResult};
