pub mod core;
pub mod legacy;
pub mod loader;
pub mod verifier;
