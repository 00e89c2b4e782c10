//! Configuration types for the PAN validation harness.

use serde::{Deserialize, Serialize};

/// Main configuration for the harness.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Config version
    pub version: String,

    /// Response time ceilings per profile
    pub timing: TimingConfig,

    /// Response shape checks
    pub checks: ChecksConfig,

    /// Password service settings
    pub password: PasswordConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            version: "1".to_string(),
            timing: TimingConfig::default(),
            checks: ChecksConfig::default(),
            password: PasswordConfig::default(),
        }
    }
}

impl HarnessConfig {
    /// Response time ceiling (exclusive) for the given profile.
    pub fn max_response_time_ms(&self, profile: Profile) -> u64 {
        match profile {
            Profile::Smoke => self.timing.smoke_max_response_ms,
            Profile::Regression => self.timing.regression_max_response_ms,
        }
    }
}

/// Test profile, selected by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Fixed smoke battery
    #[default]
    Smoke,
    /// Externally supplied regression suite
    Regression,
}

impl Profile {
    /// Only the regression suite asserts on Content-Type.
    pub fn checks_content_type(&self) -> bool {
        matches!(self, Self::Regression)
    }
}

impl std::str::FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "smoke" => Ok(Self::Smoke),
            "regression" => Ok(Self::Regression),
            other => Err(format!("unknown profile '{}'", other)),
        }
    }
}

/// Response time ceilings, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Smoke profile ceiling
    pub smoke_max_response_ms: u64,

    /// Regression profile ceiling
    pub regression_max_response_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            smoke_max_response_ms: 3000,
            regression_max_response_ms: 5000,
        }
    }
}

/// Response shape checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChecksConfig {
    /// Substring every PAN validation response body must contain
    pub service_marker: String,

    /// Expected application status that triggers structural traversal
    pub success_status: String,

    /// Also compare APP_PAN_INQ.APP_STATUS to the expected application status
    pub app_status_field: bool,
}

impl Default for ChecksConfig {
    fn default() -> Self {
        Self {
            service_marker: "PANValidation".to_string(),
            success_status: "Success".to_string(),
            app_status_field: false,
        }
    }
}

/// Password service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordConfig {
    /// Environment key the password is stored under
    pub env_key: String,

    /// Request names containing this marker are password requests, not PAN cases
    pub request_marker: String,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            env_key: "password".to_string(),
            request_marker: "Get Password".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HarnessConfig::default();
        assert_eq!(config.max_response_time_ms(Profile::Smoke), 3000);
        assert_eq!(config.max_response_time_ms(Profile::Regression), 5000);
        assert_eq!(config.password.env_key, "password");
        assert!(!config.checks.app_status_field);
    }

    #[test]
    fn test_config_serialization() {
        let config = HarnessConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: HarnessConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(
            parsed.timing.regression_max_response_ms,
            config.timing.regression_max_response_ms
        );
        assert_eq!(parsed.checks.service_marker, "PANValidation");
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
version: "1"
timing:
  smoke_max_response_ms: 1500
checks:
  app_status_field: true
password:
  env_key: kra_password
"#;
        let config: HarnessConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.max_response_time_ms(Profile::Smoke), 1500);
        assert_eq!(config.max_response_time_ms(Profile::Regression), 5000);
        assert!(config.checks.app_status_field);
        assert_eq!(config.checks.success_status, "Success");
        assert_eq!(config.password.env_key, "kra_password");
        assert_eq!(config.password.request_marker, "Get Password");
    }

    #[test]
    fn test_profile_from_str() {
        assert_eq!("smoke".parse::<Profile>(), Ok(Profile::Smoke));
        assert_eq!("Regression".parse::<Profile>(), Ok(Profile::Regression));
        assert!("nightly".parse::<Profile>().is_err());
    }

    #[test]
    fn test_profile_content_type_rule() {
        assert!(!Profile::Smoke.checks_content_type());
        assert!(Profile::Regression.checks_content_type());
    }
}
