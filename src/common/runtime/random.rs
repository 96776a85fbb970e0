use thiserror::Error;

#[derive(Debug, Error)]
pub enum RandomError {
    #[error("os random source failed: {0}")]
    SourceFailed(String),
}

pub struct Random {}

impl Random {
    pub fn bytes(size: &usize) -> Result<Vec<u8>, RandomError> {
        let mut buffer = vec![0u8; *size];
        getrandom::getrandom(&mut buffer).map_err(|e| RandomError::SourceFailed(e.to_string()))?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_length() {
        let result = Random::bytes(&32).unwrap();

        assert_eq!(result.len(), 32);
        assert_ne!(result, vec![0u8; 32]);
    }
}
