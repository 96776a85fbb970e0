pub mod canonical;
pub mod credential_signer;
pub mod derivation;
pub mod hash;
pub mod issuer;
pub mod transport;
pub mod types;
pub mod verifier;
