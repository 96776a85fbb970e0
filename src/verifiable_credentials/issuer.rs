use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::types::{
    format_timestamp, fresh_urn_uuid, CredentialSubject, Degree, Evidence,
    MalformedCredentialError, VerifiableCredential, CREDENTIALS_EXAMPLES_V1_CONTEXT,
    CREDENTIALS_V1_CONTEXT, TRANSCRIPT_EVIDENCE_TYPE, UNIVERSITY_DEGREE_CREDENTIAL_TYPE,
    VERIFIABLE_CREDENTIAL_TYPE,
};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TranscriptEvidence {
    #[serde(rename = "name")]
    pub name: String,

    #[serde(rename = "cid")]
    pub cid: String,
}

/// Everything a university supplies to issue a degree credential.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DegreeCredentialRequest {
    #[serde(rename = "issuerDid")]
    pub issuer_did: String,

    #[serde(rename = "studentDid")]
    pub subject_did: String,

    #[serde(rename = "universityName")]
    pub university: String,

    #[serde(rename = "degree")]
    pub degree: Degree,

    #[serde(rename = "transcript", default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<TranscriptEvidence>,
}

impl DegreeCredentialRequest {
    pub fn new(issuer_did: &str, subject_did: &str, university: &str, degree: Degree) -> Self {
        DegreeCredentialRequest {
            issuer_did: issuer_did.to_string(),
            subject_did: subject_did.to_string(),
            university: university.to_string(),
            degree,
            transcript: None,
        }
    }

    pub fn with_transcript(mut self, name: &str, cid: &str) -> Self {
        self.transcript = Some(TranscriptEvidence { name: name.to_string(), cid: cid.to_string() });
        self
    }

    /// Unsigned degree credential with a fresh id.
    pub fn build(
        &self,
        issuance_date: DateTime<Utc>,
    ) -> Result<VerifiableCredential, MalformedCredentialError> {
        let mut subject = CredentialSubject::new(&self.subject_did, self.degree.clone());
        if !self.university.trim().is_empty() {
            subject.insert_extension("university", Value::String(self.university.clone()))?;
        }

        let evidence = match &self.transcript {
            Some(transcript) => vec![Evidence {
                id: fresh_urn_uuid(),
                r#type: vec![TRANSCRIPT_EVIDENCE_TYPE.to_string()],
                name: Some(transcript.name.clone()),
                cid: Some(transcript.cid.clone()),
            }],
            None => vec![],
        };

        let object = VerifiableCredential {
            context: vec![
                CREDENTIALS_V1_CONTEXT.to_string(),
                CREDENTIALS_EXAMPLES_V1_CONTEXT.to_string(),
            ],
            id: fresh_urn_uuid(),
            r#type: vec![
                VERIFIABLE_CREDENTIAL_TYPE.to_string(),
                UNIVERSITY_DEGREE_CREDENTIAL_TYPE.to_string(),
            ],
            issuer: self.issuer_did.clone(),
            issuance_date: format_timestamp(issuance_date),
            credential_subject: subject,
            evidence,
            proof: None,
        };
        object.validate()?;

        Ok(object)
    }
}

#[cfg(test)]
pub mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    fn request() -> DegreeCredentialRequest {
        DegreeCredentialRequest::new(
            "did:example:uniA",
            "did:example:alice",
            "University of Technology",
            Degree::new("BSc", "Computer Science", "AI"),
        )
    }

    #[test]
    fn test_build() {
        let issued = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();

        let vc = request().build(issued).unwrap();

        assert_eq!(
            vc.context,
            vec![
                "https://www.w3.org/2018/credentials/v1",
                "https://www.w3.org/2018/credentials/examples/v1"
            ]
        );
        assert!(vc.id.starts_with("urn:uuid:"));
        assert_eq!(vc.r#type, vec!["VerifiableCredential", "UniversityDegreeCredential"]);
        assert_eq!(vc.issuer, "did:example:uniA");
        assert_eq!(vc.issuance_date, "2024-06-01T12:00:00.000Z");
        assert_eq!(vc.credential_subject.id(), "did:example:alice");
        assert_eq!(
            vc.credential_subject.extension("university"),
            Some(&json!("University of Technology"))
        );
        assert_eq!(vc.credential_subject.issue_date, None);
        assert!(vc.evidence.is_empty());
        assert!(vc.proof.is_none());
    }

    #[test]
    fn test_build_with_transcript() {
        let vc = request()
            .with_transcript("transcript.pdf", "bafytranscript")
            .build(Utc::now())
            .unwrap();

        assert_eq!(vc.evidence.len(), 1);
        let evidence = &vc.evidence[0];
        assert!(evidence.id.starts_with("urn:uuid:"));
        assert_ne!(evidence.id, vc.id);
        assert_eq!(evidence.r#type, vec!["Transcript"]);
        assert_eq!(evidence.name.as_deref(), Some("transcript.pdf"));
        assert_eq!(evidence.cid.as_deref(), Some("bafytranscript"));
    }

    #[test]
    fn test_build_fresh_ids() {
        let request = request();

        assert_ne!(request.build(Utc::now()).unwrap().id, request.build(Utc::now()).unwrap().id);
    }

    #[test]
    fn test_build_rejects_incomplete_request() {
        let mut incomplete = request();
        incomplete.subject_did = String::new();
        assert_eq!(
            incomplete.build(Utc::now()),
            Err(MalformedCredentialError::MissingField("credentialSubject.id"))
        );

        let mut incomplete = request();
        incomplete.degree = Degree::default();
        assert!(incomplete.build(Utc::now()).is_err());
    }

    #[test]
    fn test_request_from_form_json() {
        let request: DegreeCredentialRequest = serde_json::from_value(json!({
            "issuerDid": "did:example:uniA",
            "studentDid": "did:example:alice",
            "universityName": "University of Technology",
            "degree": { "type": "BSc", "name": "Computer Science" }
        }))
        .unwrap();

        assert_eq!(request.degree.major, None);
        assert!(request.build(Utc::now()).is_ok());
    }
}
