pub mod common;
pub mod config;
pub mod did;
pub mod keyring;
pub mod registry;
pub mod services;
pub mod storage;
pub mod verifiable_credentials;

#[cfg(test)]
mod test_utils;
