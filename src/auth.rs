//! Account registration, sessions, and the current-user lookup.

use crate::backend::AccountService;
use crate::models::Account;
use crate::{Error, Result};

pub struct AuthService {
    account: Box<dyn AccountService>,
}

impl AuthService {
    pub fn new(account: Box<dyn AccountService>) -> Self {
        Self { account }
    }

    /// Creates the account, then immediately logs it in with the same
    /// credentials. Every failure propagates: callers must know when the
    /// account step did not happen.
    pub async fn register(&self, email: &str, password: &str, name: &str) -> Result<Account> {
        self.account.create(email, password, name).await?;
        self.login(email, password).await
    }

    /// Opens a session and returns the account now bound to it.
    pub async fn login(&self, email: &str, password: &str) -> Result<Account> {
        self.account.create_session(email, password).await?;
        match self.current_user().await? {
            Some(account) => Ok(account),
            None => Err(Error::Unauthorized(
                "session was not established".to_string(),
            )),
        }
    }

    /// The account bound to the active session. `Ok(None)` means nobody is
    /// logged in; transport and backend failures stay errors.
    pub async fn current_user(&self) -> Result<Option<Account>> {
        match self.account.current().await {
            Ok(account) => Ok(Some(account)),
            Err(err) if err.is_unauthorized() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Tears down all sessions for the current account. Failures are logged
    /// and swallowed: to the caller, logout always succeeds.
    pub async fn logout(&self) {
        if let Err(err) = self.account.delete_sessions().await {
            tracing::warn!("Logout failed: {}", err);
        }
    }
}
