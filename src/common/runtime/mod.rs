pub mod keccak;
pub mod random;
pub mod secp256k1;
