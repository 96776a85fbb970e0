use std::collections::BTreeMap;

use thiserror::Error;

use crate::keyring::secp256k1::{Address, AddressError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DidResolveError {
    #[error("not a decentralized identifier: {0}")]
    InvalidDid(String),
    #[error("did method `{method}` does not embed an address: {did}")]
    UnsupportedMethod { method: String, did: String },
    #[error("invalid address in {did}: {source}")]
    InvalidAddress {
        did: String,
        #[source]
        source: AddressError,
    },
}

/// Decodes a DID to the address of the key that controls it.
///
/// Resolution is local and synchronous; the advisory on-ledger controller
/// lookup lives in [`crate::registry::IdentityRegistry`].
pub trait DidResolver: Send + Sync {
    fn resolve_address(&self, did: &str) -> Result<Address, DidResolveError>;
}

/// `did:ethr:[<network>:]<address>` and `did:pkh:eip155:<chain>:<address>`.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmbeddedAddressResolver;

impl DidResolver for EmbeddedAddressResolver {
    fn resolve_address(&self, did: &str) -> Result<Address, DidResolveError> {
        let segments: Vec<&str> = did.split(':').collect();
        if segments.len() < 3 || segments[0] != "did" || segments.iter().any(|s| s.is_empty()) {
            return Err(DidResolveError::InvalidDid(did.to_string()));
        }

        let method = segments[1];
        let embeds_address = match method {
            "ethr" => true,
            "pkh" => segments.len() == 5 && segments[2] == "eip155",
            _ => false,
        };
        if !embeds_address {
            return Err(DidResolveError::UnsupportedMethod {
                method: method.to_string(),
                did: did.to_string(),
            });
        }

        let last = segments[segments.len() - 1];
        last.parse()
            .map_err(|source| DidResolveError::InvalidAddress { did: did.to_string(), source })
    }
}

/// Explicit DID to address bindings, falling back to embedded addresses.
#[derive(Clone, Debug, Default)]
pub struct StaticDidResolver {
    bindings: BTreeMap<String, Address>,
}

impl StaticDidResolver {
    pub fn new(bindings: BTreeMap<String, Address>) -> Self {
        StaticDidResolver { bindings }
    }

    pub fn bind(mut self, did: &str, address: Address) -> Self {
        self.bindings.insert(did.to_string(), address);
        self
    }
}

impl DidResolver for StaticDidResolver {
    fn resolve_address(&self, did: &str) -> Result<Address, DidResolveError> {
        match self.bindings.get(did) {
            Some(address) => Ok(*address),
            None => EmbeddedAddressResolver.resolve_address(did),
        }
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    const ADDRESS: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

    fn address() -> Address {
        ADDRESS.parse().unwrap()
    }

    #[test]
    fn test_resolve_ethr() {
        let resolver = EmbeddedAddressResolver;

        assert_eq!(resolver.resolve_address(&format!("did:ethr:{}", ADDRESS)), Ok(address()));
        assert_eq!(
            resolver.resolve_address(&format!("did:ethr:sepolia:{}", ADDRESS.to_lowercase())),
            Ok(address())
        );
    }

    #[test]
    fn test_resolve_pkh() {
        let resolver = EmbeddedAddressResolver;

        assert_eq!(resolver.resolve_address(&format!("did:pkh:eip155:1:{}", ADDRESS)), Ok(address()));
        assert!(matches!(
            resolver.resolve_address("did:pkh:solana:abc:def"),
            Err(DidResolveError::UnsupportedMethod { .. })
        ));
    }

    #[test]
    fn test_resolve_errors() {
        let resolver = EmbeddedAddressResolver;

        assert!(matches!(resolver.resolve_address("uniA"), Err(DidResolveError::InvalidDid(_))));
        assert!(matches!(resolver.resolve_address("did::x"), Err(DidResolveError::InvalidDid(_))));
        assert!(matches!(
            resolver.resolve_address("did:example:uniA"),
            Err(DidResolveError::UnsupportedMethod { .. })
        ));
        assert!(matches!(
            resolver.resolve_address("did:ethr:0x1234"),
            Err(DidResolveError::InvalidAddress { .. })
        ));
    }

    #[test]
    fn test_static_bindings() {
        let resolver = StaticDidResolver::default().bind("did:example:uniA", address());

        assert_eq!(resolver.resolve_address("did:example:uniA"), Ok(address()));
        assert_eq!(resolver.resolve_address(&format!("did:ethr:{}", ADDRESS)), Ok(address()));
        assert!(resolver.resolve_address("did:example:uniB").is_err());
    }
}
