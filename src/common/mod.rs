pub mod extension;
pub mod runtime;
