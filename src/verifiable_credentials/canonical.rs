use thiserror::Error;

use super::types::VerifiableCredential;

#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("credential cannot be represented canonically: {0}")]
    Unrepresentable(#[from] serde_json::Error),
}

/// Canonical byte form of a credential without its proof: RFC 8785 (JCS)
/// serialization, keys sorted at every level, arrays in authored order.
///
/// Only [`canonicalize`] constructs it, so everything that signs, recovers or
/// hashes a credential works on the same bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

pub fn canonicalize(object: &VerifiableCredential) -> Result<CanonicalBytes, EncodingError> {
    // NOTE: a proof must never end up in the bytes it signs
    let stripped = object.without_proof();
    let value = serde_json::to_value(&stripped)?;
    Ok(CanonicalBytes(serde_jcs::to_vec(&value)?))
}

#[cfg(test)]
pub mod tests {
    use rand::seq::SliceRandom;
    use serde_json::{json, Map, Value};

    use super::*;
    use crate::{
        test_utils::signed_degree_credential_fixture,
        verifiable_credentials::types::{CredentialSubject, Degree, Evidence},
    };

    fn credential() -> VerifiableCredential {
        let subject = CredentialSubject::new(
            "did:example:alice",
            Degree::new("BSc", "Computer Science", "AI"),
        )
        .with_extension("university", json!("University of Technology"))
        .unwrap();

        VerifiableCredential {
            context: vec!["https://www.w3.org/2018/credentials/v1".to_string()],
            id: "urn:uuid:1".to_string(),
            r#type: vec!["VerifiableCredential".to_string()],
            issuer: "did:example:uniA".to_string(),
            issuance_date: "2024-06-01T12:00:00.000Z".to_string(),
            credential_subject: subject,
            evidence: vec![Evidence {
                id: "urn:uuid:2".to_string(),
                r#type: vec!["Transcript".to_string()],
                name: Some("transcript.pdf".to_string()),
                cid: None,
            }],
            proof: None,
        }
    }

    #[test]
    fn test_canonicalize() {
        let result = canonicalize(&credential()).unwrap();

        assert_eq!(
            String::from_utf8(result.as_bytes().to_vec()).unwrap(),
            concat!(
                r#"{"@context":["https://www.w3.org/2018/credentials/v1"],"#,
                r#""credentialSubject":{"degree":{"major":"AI","name":"Computer Science","type":"BSc"},"#,
                r#""id":"did:example:alice","university":"University of Technology"},"#,
                r#""evidence":[{"id":"urn:uuid:2","name":"transcript.pdf","type":["Transcript"]}],"#,
                r#""id":"urn:uuid:1","issuanceDate":"2024-06-01T12:00:00.000Z","#,
                r#""issuer":"did:example:uniA","type":["VerifiableCredential"]}"#
            )
        );
    }

    #[test]
    fn test_canonicalize_ignores_proof() {
        let signed = signed_degree_credential_fixture();

        let with_proof = canonicalize(&signed).unwrap();
        let without_proof = canonicalize(&signed.without_proof()).unwrap();

        assert_eq!(with_proof, without_proof);
        assert!(!String::from_utf8(with_proof.as_bytes().to_vec()).unwrap().contains("proof"));
    }

    #[test]
    fn test_canonicalize_independent_of_insertion_order() {
        let expected = canonicalize(&credential()).unwrap();
        let raw = serde_json::to_value(credential()).unwrap();

        let mut rng = rand::thread_rng();
        for _ in 0..16 {
            let shuffled = shuffle_keys(&raw, &mut rng);
            let rebuilt: VerifiableCredential = serde_json::from_str(&shuffled).unwrap();

            assert_eq!(canonicalize(&rebuilt).unwrap(), expected);
        }
    }

    #[test]
    fn test_canonicalize_preserves_array_order() {
        let mut reordered = credential();
        reordered.context.push("https://www.w3.org/2018/credentials/examples/v1".to_string());
        let mut swapped = reordered.clone();
        swapped.context.reverse();

        assert_ne!(canonicalize(&reordered).unwrap(), canonicalize(&swapped).unwrap());
    }

    #[test]
    fn test_canonicalize_empty_evidence_equals_absent() {
        let mut vc = credential();
        vc.evidence.clear();

        let from_struct = canonicalize(&vc).unwrap();
        let mut raw = serde_json::to_value(&vc).unwrap();
        raw.as_object_mut().unwrap().insert("evidence".to_string(), json!([]));
        let from_json: VerifiableCredential = serde_json::from_value(raw).unwrap();

        assert_eq!(canonicalize(&from_json).unwrap(), from_struct);
        assert!(!String::from_utf8(from_struct.as_bytes().to_vec()).unwrap().contains("evidence"));
    }

    // Serializes `value` with object members emitted in a random order.
    fn shuffle_keys<R: rand::Rng>(value: &Value, rng: &mut R) -> String {
        match value {
            Value::Object(map) => {
                let mut entries: Vec<(&String, &Value)> = map.iter().collect();
                entries.shuffle(rng);
                let members: Vec<String> = entries
                    .into_iter()
                    .map(|(k, v)| format!("{}:{}", Value::String(k.clone()), shuffle_keys(v, rng)))
                    .collect();
                format!("{{{}}}", members.join(","))
            }
            Value::Array(items) => {
                let items: Vec<String> = items.iter().map(|v| shuffle_keys(v, rng)).collect();
                format!("[{}]", items.join(","))
            }
            other => other.to_string(),
        }
    }

    #[test]
    fn test_shuffle_keys_keeps_content() {
        let raw = serde_json::to_value(credential()).unwrap();

        let shuffled = shuffle_keys(&raw, &mut rand::thread_rng());
        let parsed: Map<String, Value> = serde_json::from_str(&shuffled).unwrap();

        assert_eq!(Value::Object(parsed), raw);
    }
}
