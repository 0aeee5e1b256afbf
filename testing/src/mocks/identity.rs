//! Mock identity provider for testing.

use coursehub_core::providers::{BoxFuture, IdentityService, ServiceResult};
use coursehub_core::{AccountId, ServiceError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Minimum password length accepted by the mock provider.
pub const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Debug, Default)]
struct State {
    /// account id → email
    accounts: HashMap<String, String>,
    next: u64,
    create_failure: Option<ServiceError>,
    delete_failure: Option<ServiceError>,
    deletes: usize,
}

/// In-memory identity provider.
///
/// Rejects malformed emails, short passwords and duplicate emails the way a
/// hosted provider would. Account ids are `acct-1`, `acct-2`, ...
#[derive(Debug, Clone, Default)]
pub struct InMemoryIdentityService {
    state: Arc<Mutex<State>>,
}

impl InMemoryIdentityService {
    /// Create an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every subsequent `create_account` with `error`.
    pub fn fail_create(&self, error: ServiceError) {
        self.lock().create_failure = Some(error);
    }

    /// Fail every subsequent `delete_account` with `error`.
    pub fn fail_delete(&self, error: ServiceError) {
        self.lock().delete_failure = Some(error);
    }

    /// Number of live accounts.
    #[must_use]
    pub fn account_count(&self) -> usize {
        self.lock().accounts.len()
    }

    /// Whether the account exists.
    #[must_use]
    pub fn contains(&self, id: &AccountId) -> bool {
        self.lock().accounts.contains_key(id.as_str())
    }

    /// Number of `delete_account` calls, failed ones included.
    #[must_use]
    pub fn delete_calls(&self) -> usize {
        self.lock().deletes
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl IdentityService for InMemoryIdentityService {
    fn create_account<'a>(
        &'a self,
        email: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, ServiceResult<AccountId>> {
        Box::pin(async move {
            tokio::task::yield_now().await;
            let mut state = self.lock();
            if let Some(err) = state.create_failure.clone() {
                return Err(err);
            }
            if !email.contains('@') {
                return Err(ServiceError::Rejected(format!("invalid email: {email}")));
            }
            if password.chars().count() < MIN_PASSWORD_LENGTH {
                return Err(ServiceError::Rejected(format!(
                    "password must be at least {MIN_PASSWORD_LENGTH} characters"
                )));
            }
            if state.accounts.values().any(|existing| existing == email) {
                return Err(ServiceError::Rejected(format!(
                    "email already registered: {email}"
                )));
            }

            state.next += 1;
            let id = format!("acct-{}", state.next);
            state.accounts.insert(id.clone(), email.to_string());
            Ok(AccountId::new(id))
        })
    }

    fn delete_account<'a>(&'a self, id: &'a AccountId) -> BoxFuture<'a, ServiceResult<()>> {
        Box::pin(async move {
            tokio::task::yield_now().await;
            let mut state = self.lock();
            state.deletes += 1;
            if let Some(err) = state.delete_failure.clone() {
                return Err(err);
            }
            state
                .accounts
                .remove(id.as_str())
                .map(|_| ())
                .ok_or_else(|| ServiceError::NotFound(format!("account {id}")))
        })
    }
}
