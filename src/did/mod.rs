pub mod did_resolver;
