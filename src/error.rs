use warp::reject::Reject;

use crate::directory::DirectoryError;

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("Could not validate credentials")]
    Unauthenticated,
    #[error("User with this email already exists")]
    EmailAlreadyTaken,
    #[error("Invalid email or password")]
    LoginFailed,
    #[error("invalid {field}: {reason}")]
    InvalidInput {
        field: &'static str,
        reason: &'static str,
    },
    #[error("error during directory operation")]
    DirectoryError {
        #[from]
        source: DirectoryError,
    },
    #[error("error hashing password")]
    HashingError {
        #[from]
        source: argon2::Error,
    },
    #[error("error issuing token")]
    TokenError {
        #[from]
        source: jsonwebtoken::errors::Error,
    },
}

impl Reject for AuthError {}
