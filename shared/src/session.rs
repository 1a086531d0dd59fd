//! The signed-in session: bearer credential plus the current user.
//!
//! Passed explicitly to whatever needs it. The lifecycle is
//! `init` (load credential, fetch profile) and `teardown` (clear credential).

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, instrument, warn};

use crate::error::{NetworkError, NetworkResult, SessionError};
use crate::model::CurrentUser;

/// Opaque token forwarded on every authenticated request.
#[derive(Clone)]
pub struct BearerToken(SecretString);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::new(token.into()))
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    #[must_use]
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.expose())
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken([REDACTED])")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Anonymous,
    /// Reading the stored credential.
    Restoring,
    /// Credential found; fetching the current user.
    LoadingProfile,
    Authenticated,
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    state: SessionState,
    credential: Option<BearerToken>,
    user: Option<CurrentUser>,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A session that is already signed in; mostly for hosts and tests that
    /// obtained the token elsewhere.
    #[must_use]
    pub fn authenticated(token: BearerToken, user: CurrentUser) -> Self {
        let mut session = Self::new();
        session.sign_in(token, user);
        session
    }

    pub fn begin_restore(&mut self) {
        self.state = SessionState::Restoring;
    }

    /// Returns `true` when a credential was found and the profile must be
    /// fetched next.
    pub fn credential_loaded(&mut self, token: Option<BearerToken>) -> bool {
        match token {
            Some(token) => {
                self.credential = Some(token);
                self.state = SessionState::LoadingProfile;
                true
            }
            None => {
                self.clear();
                false
            }
        }
    }

    /// A failed profile fetch invalidates the stored credential.
    pub fn profile_loaded(&mut self, result: NetworkResult<CurrentUser>) -> Result<(), SessionError> {
        match result {
            Ok(user) if self.credential.is_some() => {
                info!(user = %user.username, "session restored");
                self.user = Some(user);
                self.state = SessionState::Authenticated;
                Ok(())
            }
            Ok(_) => {
                self.clear();
                Err(SessionError::NotAuthenticated)
            }
            Err(e) => {
                warn!(code = e.code(), status = e.http_status(), "session restore failed; dropping credential");
                self.clear();
                Err(SessionError::Profile(e))
            }
        }
    }

    pub fn sign_in(&mut self, token: BearerToken, user: CurrentUser) {
        info!(user = %user.username, "signed in");
        self.credential = Some(token);
        self.user = Some(user);
        self.state = SessionState::Authenticated;
    }

    pub fn update_user(&mut self, user: CurrentUser) {
        if self.is_authenticated() {
            self.user = Some(user);
        }
    }

    pub fn teardown(&mut self) {
        info!("session torn down");
        self.clear();
    }

    fn clear(&mut self) {
        self.credential = None;
        self.user = None;
        self.state = SessionState::Anonymous;
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn bearer(&self) -> Option<&BearerToken> {
        self.credential.as_ref()
    }

    #[must_use]
    pub fn current_user(&self) -> Option<&CurrentUser> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self.state, SessionState::Restoring | SessionState::LoadingProfile)
    }
}

/// Where the credential lives between runs.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn load(&self) -> Result<Option<BearerToken>, SessionError>;
    async fn store(&self, token: &BearerToken) -> Result<(), SessionError>;
    async fn clear(&self) -> Result<(), SessionError>;
}

#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn current_user(&self, credential: &BearerToken) -> Result<CurrentUser, NetworkError>;
}

impl Session {
    /// Loads the stored credential and resolves the current user. A stale
    /// credential yields an anonymous session, not an error.
    #[instrument(skip_all)]
    pub async fn init(
        store: &dyn CredentialStore,
        profiles: &dyn ProfileSource,
    ) -> Result<Self, SessionError> {
        let mut session = Self::new();
        session.begin_restore();

        let Some(token) = store.load().await? else {
            session.credential_loaded(None);
            return Ok(session);
        };
        session.credential_loaded(Some(token.clone()));

        let result = profiles.current_user(&token).await;
        if session.profile_loaded(result).is_err() {
            if let Err(e) = store.clear().await {
                warn!(error = %e, "failed to clear stale credential");
            }
        }
        Ok(session)
    }

    pub async fn sign_in_with(
        &mut self,
        store: &dyn CredentialStore,
        token: BearerToken,
        user: CurrentUser,
    ) -> Result<(), SessionError> {
        store.store(&token).await?;
        self.sign_in(token, user);
        Ok(())
    }

    /// Clears the in-memory session even when the store fails.
    pub async fn teardown_with(&mut self, store: &dyn CredentialStore) -> Result<(), SessionError> {
        self.teardown();
        store.clear().await
    }
}
