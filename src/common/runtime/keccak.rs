use sha3::{Digest, Keccak256};

/// Prefix mandated by the personal-message signing convention of the ledger's
/// wallets. The decimal byte length of the message follows it.
pub const PERSONAL_MESSAGE_PREFIX: &str = "\x19Ethereum Signed Message:\n";

pub struct Keccak {}

impl Keccak {
    pub fn digest(message: &[u8]) -> [u8; 32] {
        Keccak256::digest(message).into()
    }

    /// Digest of `message` framed as a personal message. This is what wallets
    /// actually sign, and what recovery has to be computed against.
    pub fn personal_message_digest(message: &[u8]) -> [u8; 32] {
        let mut hasher = Keccak256::new();
        hasher.update(PERSONAL_MESSAGE_PREFIX.as_bytes());
        hasher.update(message.len().to_string().as_bytes());
        hasher.update(message);
        hasher.finalize().into()
    }
}
