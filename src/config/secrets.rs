//! Secret handling utilities.
//!
//! Re-exports the secrecy types used for the generation API key.

pub use secrecy::{ExposeSecret, SecretString};
