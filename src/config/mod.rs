use std::{str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const REGISTRY_TIMEOUT_ENV: &str = "ACADEMICHAIN_REGISTRY_TIMEOUT_MS";
pub const CONTROLLER_POLICY_ENV: &str = "ACADEMICHAIN_CONTROLLER_POLICY";
pub const REVOCATION_POLICY_ENV: &str = "ACADEMICHAIN_REVOCATION_POLICY";

const DEFAULT_REGISTRY_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("ACADEMICHAIN_REGISTRY_TIMEOUT_MS must be a positive number of milliseconds, got {0:?}")]
    InvalidTimeout(String),
    #[error("ACADEMICHAIN_CONTROLLER_POLICY must be `lenient` or `strict`, got {0:?}")]
    InvalidPolicy(String),
    #[error("ACADEMICHAIN_REVOCATION_POLICY must be `required` or `best-effort`, got {0:?}")]
    InvalidRevocationPolicy(String),
}

/// What the verifier does when the identity registry names a controller
/// other than the recovered signer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControllerPolicy {
    /// Record a warning.
    Lenient,
    /// Reject the signature.
    Strict,
}

impl Default for ControllerPolicy {
    fn default() -> Self {
        ControllerPolicy::Lenient
    }
}

impl FromStr for ControllerPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(ControllerPolicy::Lenient),
            "strict" => Ok(ControllerPolicy::Strict),
            _ => Err(ConfigError::InvalidPolicy(s.to_string())),
        }
    }
}

/// What the verifier concludes when the revocation registry cannot answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RevocationPolicy {
    /// Withhold a `Valid` verdict until revocation status is known.
    Required,
    /// Record a warning and keep the verdict.
    BestEffort,
}

impl Default for RevocationPolicy {
    fn default() -> Self {
        RevocationPolicy::Required
    }
}

impl FromStr for RevocationPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "required" => Ok(RevocationPolicy::Required),
            "best-effort" | "best_effort" => Ok(RevocationPolicy::BestEffort),
            _ => Err(ConfigError::InvalidRevocationPolicy(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierConfig {
    #[serde(rename = "registryTimeoutMs", with = "millis")]
    pub registry_timeout: Duration,

    #[serde(rename = "controllerPolicy", default)]
    pub controller_policy: ControllerPolicy,

    #[serde(rename = "revocationPolicy", default)]
    pub revocation_policy: RevocationPolicy,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        VerifierConfig {
            registry_timeout: Duration::from_millis(DEFAULT_REGISTRY_TIMEOUT_MS),
            controller_policy: ControllerPolicy::default(),
            revocation_policy: RevocationPolicy::default(),
        }
    }
}

impl VerifierConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Unset variables fall back to the defaults.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self, ConfigError> {
        let mut config = VerifierConfig::default();

        if let Some(value) = lookup(REGISTRY_TIMEOUT_ENV) {
            let millis = value
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|m| *m > 0)
                .ok_or_else(|| ConfigError::InvalidTimeout(value.clone()))?;
            config.registry_timeout = Duration::from_millis(millis);
        }
        if let Some(value) = lookup(CONTROLLER_POLICY_ENV) {
            config.controller_policy = value.parse()?;
        }
        if let Some(value) = lookup(REVOCATION_POLICY_ENV) {
            config.revocation_policy = value.parse()?;
        }

        Ok(config)
    }
}

mod millis {
    use std::{convert::TryFrom, time::Duration};

    use serde::{ser::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(duration.as_millis())
            .map_err(|_| S::Error::custom("duration does not fit in u64 milliseconds"))?;
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
