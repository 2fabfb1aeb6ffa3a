//! Authentication: password hashing, login checks and sessions.

mod gate;
mod password;
mod session;

pub use gate::*;
pub use password::*;
pub use session::*;

use thiserror::Error;

use crate::db::DbError;

/// Authentication errors.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Malformed password hash: {0}")]
    MalformedHash(String),
}

pub type AuthResult<T> = Result<T, AuthError>;
