use thiserror::Error;

use crate::common::runtime::random::{Random, RandomError};

#[derive(Error, Debug)]
pub enum TrngError {
    #[error("Buffer length over")]
    BufferLengthOver,
    #[error("Random generation failed")]
    RandomGenerationFailed(#[from] RandomError),
}

/// Source of key material for freshly generated identities.
pub trait Trng {
    const MAX_BUFFER_LENGTH: usize = 1024;
    fn generate(&self, size: &usize) -> Result<Vec<u8>, TrngError>;
}

#[derive(Default)]
pub struct OSRandomNumberGenerator {}

impl Trng for OSRandomNumberGenerator {
    fn generate(&self, size: &usize) -> Result<Vec<u8>, TrngError> {
        if Self::MAX_BUFFER_LENGTH < *size {
            return Err(TrngError::BufferLengthOver);
        }
        Random::bytes(size).map_err(TrngError::RandomGenerationFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate() {
        let trng = OSRandomNumberGenerator::default();

        let first = trng.generate(&32).unwrap();
        let second = trng.generate(&32).unwrap();

        assert_eq!(first.len(), 32);
        assert_ne!(first, second);
    }

    #[test]
    fn test_buffer_length_over() {
        let trng = OSRandomNumberGenerator::default();

        let result = trng.generate(&(OSRandomNumberGenerator::MAX_BUFFER_LENGTH + 1));

        assert!(matches!(result, Err(TrngError::BufferLengthOver)));
    }
}
