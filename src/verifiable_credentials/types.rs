use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const CREDENTIALS_V1_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";
pub const CREDENTIALS_EXAMPLES_V1_CONTEXT: &str =
    "https://www.w3.org/2018/credentials/examples/v1";

pub const VERIFIABLE_CREDENTIAL_TYPE: &str = "VerifiableCredential";
pub const UNIVERSITY_DEGREE_CREDENTIAL_TYPE: &str = "UniversityDegreeCredential";
pub const DERIVED_TYPE_PREFIX: &str = "Derived";

pub const SOURCE_CREDENTIAL_EVIDENCE_TYPE: &str = "SourceCredential";
pub const TRANSCRIPT_EVIDENCE_TYPE: &str = "Transcript";

/// Subject members with a fixed meaning. Extension fields may not use them.
pub const RESERVED_SUBJECT_KEYS: [&str; 3] = ["id", "degree", "issueDate"];
pub const RESERVED_DEGREE_KEYS: [&str; 3] = ["type", "name", "major"];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MalformedCredentialError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("invalid field `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("`credentialSubject.{0}` is reserved and cannot be an extension field")]
    ReservedKey(String),
    #[error("credential could not be parsed: {0}")]
    Unparsable(String),
}

/// ISO-8601 in UTC with millisecond precision, e.g. `2024-06-01T12:00:00.000Z`.
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn fresh_urn_uuid() -> String {
    format!("urn:uuid:{}", uuid::Uuid::new_v4())
}

#[derive(Debug, Serialize, Deserialize, Eq, PartialEq, Clone, Default)]
pub struct Degree {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,

    #[serde(rename = "name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "major", default, skip_serializing_if = "Option::is_none")]
    pub major: Option<String>,

    // NOTE: members this schema does not know about, kept so they stay signed.
    #[serde(flatten)]
    extensions: BTreeMap<String, Value>,
}

impl Degree {
    pub fn new(r#type: &str, name: &str, major: &str) -> Self {
        Degree {
            r#type: Some(r#type.to_string()),
            name: Some(name.to_string()),
            major: Some(major.to_string()),
            extensions: BTreeMap::new(),
        }
    }

    pub fn has_disclosed_field(&self) -> bool {
        self.r#type.is_some() || self.name.is_some() || self.major.is_some()
    }

    pub fn extensions(&self) -> &BTreeMap<String, Value> {
        &self.extensions
    }

    pub fn extension(&self, key: &str) -> Option<&Value> {
        self.extensions.get(key)
    }

    /// Extension members may not shadow `type`, `name` or `major`.
    pub fn insert_extension(
        &mut self,
        key: &str,
        value: Value,
    ) -> Result<Option<Value>, MalformedCredentialError> {
        if RESERVED_DEGREE_KEYS.contains(&key) {
            return Err(MalformedCredentialError::ReservedKey(format!("degree.{}", key)));
        }
        Ok(self.extensions.insert(key.to_string(), value))
    }
}

#[derive(Debug, Serialize, Deserialize, Eq, PartialEq, Clone)]
pub struct CredentialSubject {
    #[serde(rename = "id")]
    id: String,

    #[serde(rename = "degree")]
    pub degree: Degree,

    #[serde(rename = "issueDate", default, skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<String>,

    #[serde(flatten)]
    extensions: BTreeMap<String, Value>,
}

impl CredentialSubject {
    pub fn new(id: &str, degree: Degree) -> Self {
        CredentialSubject {
            id: id.to_string(),
            degree,
            issue_date: None,
            extensions: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn extensions(&self) -> &BTreeMap<String, Value> {
        &self.extensions
    }

    pub fn extension(&self, key: &str) -> Option<&Value> {
        self.extensions.get(key)
    }

    pub fn insert_extension(
        &mut self,
        key: &str,
        value: Value,
    ) -> Result<Option<Value>, MalformedCredentialError> {
        if RESERVED_SUBJECT_KEYS.contains(&key) {
            return Err(MalformedCredentialError::ReservedKey(key.to_string()));
        }
        Ok(self.extensions.insert(key.to_string(), value))
    }

    pub fn with_extension(mut self, key: &str, value: Value) -> Result<Self, MalformedCredentialError> {
        self.insert_extension(key, value)?;
        Ok(self)
    }
}

#[derive(Debug, Serialize, Deserialize, Eq, PartialEq, Clone)]
pub struct Evidence {
    #[serde(rename = "id")]
    pub id: String,

    #[serde(rename = "type")]
    pub r#type: Vec<String>,

    #[serde(rename = "name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "cid", default, skip_serializing_if = "Option::is_none")]
    pub cid: Option<String>,
}

impl Evidence {
    pub fn has_type(&self, r#type: &str) -> bool {
        self.r#type.iter().any(|t| t == r#type)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq)]
pub struct Proof {
    #[serde(rename = "type")]
    pub r#type: String,

    #[serde(rename = "created")]
    pub created: String,

    #[serde(rename = "proofPurpose")]
    pub proof_purpose: String,

    #[serde(rename = "verificationMethod")]
    pub verification_method: String,

    #[serde(rename = "signature")]
    pub signature: String,
}

#[derive(Debug, Serialize, Deserialize, Eq, PartialEq, Clone)]
pub struct VerifiableCredential {
    #[serde(rename = "@context")]
    pub context: Vec<String>,

    #[serde(rename = "id")]
    pub id: String,

    #[serde(rename = "type")]
    pub r#type: Vec<String>,

    #[serde(rename = "issuer")]
    pub issuer: String,

    #[serde(rename = "issuanceDate")]
    pub issuance_date: String,

    #[serde(rename = "credentialSubject")]
    pub credential_subject: CredentialSubject,

    #[serde(rename = "evidence", default, skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<Evidence>,

    #[serde(rename = "proof", default, skip_serializing_if = "Option::is_none")]
    pub proof: Option<Proof>,
}

impl VerifiableCredential {
    pub fn without_proof(&self) -> VerifiableCredential {
        VerifiableCredential { proof: None, ..self.clone() }
    }

    /// Last type entry after the base type, e.g. `UniversityDegreeCredential`.
    pub fn specialization(&self) -> Option<&str> {
        self.r#type.iter().skip(1).last().map(|t| t.as_str())
    }

    pub fn is_derived(&self) -> bool {
        self.r#type.iter().skip(1).any(|t| t.starts_with(DERIVED_TYPE_PREFIX))
    }

    pub fn source_evidence(&self) -> Option<&Evidence> {
        self.evidence.iter().find(|e| e.has_type(SOURCE_CREDENTIAL_EVIDENCE_TYPE))
    }

    /// Structural checks every credential must pass before its signature is
    /// worth looking at.
    pub fn validate(&self) -> Result<(), MalformedCredentialError> {
        if self.context.is_empty() {
            return Err(MalformedCredentialError::MissingField("@context"));
        }
        if self.id.trim().is_empty() {
            return Err(MalformedCredentialError::MissingField("id"));
        }
        match self.r#type.first() {
            None => return Err(MalformedCredentialError::MissingField("type")),
            Some(first) if first != VERIFIABLE_CREDENTIAL_TYPE => {
                return Err(MalformedCredentialError::InvalidField {
                    field: "type",
                    reason: format!("first entry must be {}, got {}", VERIFIABLE_CREDENTIAL_TYPE, first),
                })
            }
            _ => {}
        }
        if self.issuer.trim().is_empty() {
            return Err(MalformedCredentialError::MissingField("issuer"));
        }
        if self.issuance_date.trim().is_empty() {
            return Err(MalformedCredentialError::MissingField("issuanceDate"));
        }
        if self.credential_subject.id().trim().is_empty() {
            return Err(MalformedCredentialError::MissingField("credentialSubject.id"));
        }
        if !self.credential_subject.degree.has_disclosed_field() {
            return Err(MalformedCredentialError::InvalidField {
                field: "credentialSubject.degree",
                reason: "at least one of type, name or major is required".to_string(),
            });
        }

        if self.is_derived() {
            if let Some(issue_date) = &self.credential_subject.issue_date {
                if *issue_date != self.issuance_date {
                    return Err(MalformedCredentialError::InvalidField {
                        field: "credentialSubject.issueDate",
                        reason: format!(
                            "derived credential issueDate {} differs from issuanceDate {}",
                            issue_date, self.issuance_date
                        ),
                    });
                }
            }
            if self.source_evidence().is_none() {
                return Err(MalformedCredentialError::InvalidField {
                    field: "evidence",
                    reason: format!(
                        "derived credential has no {} evidence",
                        SOURCE_CREDENTIAL_EVIDENCE_TYPE
                    ),
                });
            }
        }

        Ok(())
    }
}
