//! Credential, secret, and token models shared by the issuer and the executor.

pub mod credentials;
pub mod secret;
pub mod token;

pub use credentials::*;
pub use secret::*;
pub use token::*;
