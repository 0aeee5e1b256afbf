//! Identity provider trait.

use super::{BoxFuture, ServiceResult};
use crate::model::AccountId;

/// Identity provider.
///
/// Owns accounts and credentials. The orchestration layer only creates an
/// account during registration and deletes it again as a compensating action.
pub trait IdentityService: Send + Sync {
    /// Create an account for `email` / `password`.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The email is malformed or already registered → `ServiceError::Rejected`
    /// - The password is too weak → `ServiceError::Rejected`
    /// - The provider is unreachable → `ServiceError::Unavailable`
    fn create_account<'a>(
        &'a self,
        email: &'a str,
        password: &'a str,
    ) -> BoxFuture<'a, ServiceResult<AccountId>>;

    /// Delete an account.
    ///
    /// # Errors
    ///
    /// Returns error if the account is unknown or the provider fails.
    fn delete_account<'a>(&'a self, id: &'a AccountId) -> BoxFuture<'a, ServiceResult<()>>;
}
