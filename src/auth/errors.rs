/// Failures of the authentication layer.
///
/// Handlers never show these to the user directly; see `AppError` for how each
/// one maps to a redirect or a generic error page.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("email and password are required")]
    MissingCredentials,

    // Unknown email and wrong password both end up here.
    #[error("invalid credentials")]
    AuthFailure,

    #[error("email already registered")]
    EmailTaken,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("stored password digest is malformed: {0}")]
    Verification(String),

    #[error("token signing failed: {0}")]
    Signing(String),

    #[error("token is malformed or has a bad signature")]
    TokenMalformed,

    #[error("token expired")]
    TokenExpired,

    #[error("token is past its refresh window")]
    RefreshWindowExceeded,

    #[error("store error: {0:#}")]
    Store(#[from] anyhow::Error),
}

impl AuthError {
    /// Whether the user should simply be sent back to the login page.
    pub fn is_session_failure(&self) -> bool {
        matches!(
            self,
            AuthError::MissingCredentials
                | AuthError::AuthFailure
                | AuthError::TokenMalformed
                | AuthError::TokenExpired
                | AuthError::RefreshWindowExceeded
        )
    }
}
