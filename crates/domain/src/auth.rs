use thiserror::Error;

use crate::context::UserId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing bearer credential")]
    MissingCredential,

    #[error("Invalid credential")]
    InvalidCredential,

    #[error("Credential expired")]
    Expired,
}

/// Resolves a bearer credential to the user it was issued for.
///
/// Implemented outside the domain; the core never validates credentials.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, token: &str) -> Result<UserId, AuthError>;
}
