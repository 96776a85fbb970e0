use std::{collections::BTreeSet, fmt, iter::FromIterator, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    credential_signer::CredentialSigner,
    types::{
        format_timestamp, fresh_urn_uuid, CredentialSubject, Degree, Evidence,
        MalformedCredentialError, VerifiableCredential, DERIVED_TYPE_PREFIX,
        SOURCE_CREDENTIAL_EVIDENCE_TYPE, VERIFIABLE_CREDENTIAL_TYPE,
    },
};
use crate::keyring::key_holder::{KeyHolder, SigningError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DegreeField {
    Type,
    Name,
    Major,
}

impl DegreeField {
    pub const ALL: [DegreeField; 3] = [DegreeField::Type, DegreeField::Name, DegreeField::Major];

    pub fn as_str(&self) -> &'static str {
        match self {
            DegreeField::Type => "type",
            DegreeField::Name => "name",
            DegreeField::Major => "major",
        }
    }

    fn value<'a>(&self, degree: &'a Degree) -> Option<&'a String> {
        match self {
            DegreeField::Type => degree.r#type.as_ref(),
            DegreeField::Name => degree.name.as_ref(),
            DegreeField::Major => degree.major.as_ref(),
        }
    }
}

impl fmt::Display for DegreeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DegreeField {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DegreeField::ALL
            .iter()
            .find(|field| field.as_str() == s)
            .copied()
            .ok_or_else(|| ValidationError::UnknownField(s.to_string()))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("at least one degree field must be selected")]
    EmptySelection,
    #[error("unknown degree field `{0}`")]
    UnknownField(String),
    #[error("degree field `{0}` is not present in the source credential")]
    FieldNotPresent(DegreeField),
    #[error("source credential carries no proof")]
    SourceNotSigned,
}

#[derive(Debug, Error)]
pub enum DeriveError {
    #[error("invalid derivation request")]
    Validation(#[from] ValidationError),
    #[error("derived credential could not be signed")]
    Signing(#[from] SigningError),
    #[error("source credential is malformed")]
    Malformed(#[from] MalformedCredentialError),
}

/// Degree fields to disclose in a derived credential.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSelection(BTreeSet<DegreeField>);

impl FieldSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every field the degree actually carries.
    pub fn present_in(degree: &Degree) -> Self {
        DegreeField::ALL.iter().copied().filter(|field| field.value(degree).is_some()).collect()
    }

    pub fn parse<I, S>(names: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names.into_iter().map(|name| name.as_ref().parse()).collect()
    }

    pub fn with(mut self, field: DegreeField) -> Self {
        self.0.insert(field);
        self
    }

    pub fn contains(&self, field: DegreeField) -> bool {
        self.0.contains(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = DegreeField> + '_ {
        self.0.iter().copied()
    }

    fn validate(&self, degree: &Degree) -> Result<(), ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::EmptySelection);
        }
        match self.iter().find(|field| field.value(degree).is_none()) {
            Some(missing) => Err(ValidationError::FieldNotPresent(missing)),
            None => Ok(()),
        }
    }

    fn apply(&self, degree: &Degree) -> Degree {
        let pick = |field: DegreeField| {
            if self.contains(field) {
                field.value(degree).cloned()
            } else {
                None
            }
        };

        let mut disclosed = Degree::default();
        disclosed.r#type = pick(DegreeField::Type);
        disclosed.name = pick(DegreeField::Name);
        disclosed.major = pick(DegreeField::Major);
        disclosed
    }
}

impl FromIterator<DegreeField> for FieldSelection {
    fn from_iter<I: IntoIterator<Item = DegreeField>>(iter: I) -> Self {
        FieldSelection(iter.into_iter().collect())
    }
}

/// `UniversityDegreeCredential` becomes `DerivedUniversityDegreeCredential`.
pub fn derived_type(source: &VerifiableCredential) -> String {
    let base = source.specialization().unwrap_or("");
    let base = base.strip_suffix("Credential").unwrap_or(base);
    format!("{}{}Credential", DERIVED_TYPE_PREFIX, base)
}

// "UniversityDegreeCredential" -> "University Degree Credential"
fn humanize(type_name: &str) -> String {
    let mut words = String::with_capacity(type_name.len() + 4);
    for (i, c) in type_name.chars().enumerate() {
        if i > 0 && c.is_ascii_uppercase() {
            words.push(' ');
        }
        words.push(c);
    }
    words
}

/// Builds and signs a credential disclosing only `selection` of the source
/// degree. The key holder becomes the issuer; the source is referenced from
/// the evidence and is not modified.
pub async fn derive<K: KeyHolder + ?Sized>(
    source: &VerifiableCredential,
    selection: &FieldSelection,
    key_holder: &K,
    issuance_date: DateTime<Utc>,
) -> Result<VerifiableCredential, DeriveError> {
    if source.proof.is_none() {
        return Err(ValidationError::SourceNotSigned.into());
    }
    source.validate()?;
    selection.validate(&source.credential_subject.degree)?;

    let identity = key_holder.identity().await?;
    let issued_at = format_timestamp(issuance_date);

    let mut subject = CredentialSubject::new(
        source.credential_subject.id(),
        selection.apply(&source.credential_subject.degree),
    );
    subject.issue_date = Some(issued_at.clone());

    let source_type = source.specialization().unwrap_or(VERIFIABLE_CREDENTIAL_TYPE);
    let unsigned = VerifiableCredential {
        context: source.context.clone(),
        id: fresh_urn_uuid(),
        r#type: vec![VERIFIABLE_CREDENTIAL_TYPE.to_string(), derived_type(source)],
        issuer: identity.did.clone(),
        issuance_date: issued_at,
        credential_subject: subject,
        evidence: vec![Evidence {
            id: source.id.clone(),
            r#type: vec![SOURCE_CREDENTIAL_EVIDENCE_TYPE.to_string()],
            name: Some(format!("Original {}", humanize(source_type))),
            cid: None,
        }],
        proof: None,
    };

    let derived = CredentialSigner::sign(&unsigned, key_holder, issuance_date).await?;
    log::info!(
        "derived {} from {} disclosing [{}]",
        derived.id,
        source.id,
        selection.iter().map(|f| f.as_str()).collect::<Vec<_>>().join(", ")
    );

    Ok(derived)
}
