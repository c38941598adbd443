use std::fmt;
use std::sync::RwLock;

// ============================================================================
// Credentials
// ============================================================================

#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

/// Where the calling collaborator keeps its bearer token
pub trait CredentialStore: Send + Sync {
    fn token(&self) -> Option<AuthToken>;

    /// Forget the token after the server reported it expired
    fn discard(&self);
}

#[derive(Default)]
pub struct StaticCredentials {
    token: RwLock<Option<AuthToken>>,
}

impl StaticCredentials {
    pub fn new(token: Option<AuthToken>) -> Self {
        Self {
            token: RwLock::new(token),
        }
    }

    pub fn set(&self, token: AuthToken) {
        *self.token.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(token);
    }
}

impl CredentialStore for StaticCredentials {
    fn token(&self) -> Option<AuthToken> {
        self.token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn discard(&self) {
        tracing::warn!("Discarding stored credential");
        *self.token.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }
}
