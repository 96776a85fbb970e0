use data_encoding::BASE64;

use super::types::{MalformedCredentialError, VerifiableCredential};

/// Shareable form of a credential: standard base64 of its JSON.
pub fn encode(object: &VerifiableCredential) -> Result<String, MalformedCredentialError> {
    let json = serde_json::to_vec(object)
        .map_err(|e| MalformedCredentialError::Unparsable(e.to_string()))?;
    Ok(BASE64.encode(&json))
}

/// Accepts the base64 form, line-wrapped or not, or raw JSON.
pub fn decode(input: &str) -> Result<VerifiableCredential, MalformedCredentialError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(MalformedCredentialError::Unparsable("empty input".to_string()));
    }

    let compact: Vec<u8> = input.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    let json = match BASE64.decode(&compact) {
        Ok(bytes) => bytes,
        Err(_) => input.as_bytes().to_vec(),
    };

    serde_json::from_slice(&json).map_err(|e| MalformedCredentialError::Unparsable(e.to_string()))
}
