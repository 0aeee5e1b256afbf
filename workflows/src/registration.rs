//! Compensating account registration.
//!
//! Registration touches two services that share no transaction: the identity
//! provider owns the account, the document store owns the profile. Steps run
//! strictly in order, cheapest and most reversible first:
//!
//! 1. probe the store for a profile with the requested username
//! 2. stop with [`Error::Conflict`] if one exists
//! 3. create the account
//! 4. write the profile keyed by the new account id
//! 5. if the write fails, delete the account again
//!
//! After the operation settles either both the account and the profile exist
//! or neither does. The one exception is [`Error::CompensationFailed`], which
//! reports an orphaned account that an operator has to clean up.
//!
//! The probe is not race-free. Two registrations for the same username can
//! both pass it; a store-level unique index, where one exists, closes the
//! window and its rejection is reported as a conflict.

use crate::environment::ServiceEnvironment;
use coursehub_core::constants::{USERS, fields};
use coursehub_core::{AccountId, Error, Profile, Result, ServiceError, Stage, StoredRecord};
use coursehub_runtime::metrics::RegistrationMetrics;
use serde_json::Value;

/// Message of the conflict reported for a taken username.
pub const USERNAME_TAKEN: &str = "username taken";

/// Registration workflow.
#[derive(Debug, Clone)]
pub struct Registration {
    env: ServiceEnvironment,
}

impl Registration {
    /// Create the workflow.
    #[must_use]
    pub const fn new(env: ServiceEnvironment) -> Self {
        Self { env }
    }

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`]: empty input or a username containing whitespace
    /// - [`Error::Conflict`]: the username is taken
    /// - [`Error::Remote`]: a step failed; nothing was left behind
    /// - [`Error::CompensationFailed`]: the profile write failed and the account
    ///   could not be deleted again
    #[tracing::instrument(skip(self, email, password), fields(username = %username))]
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<Profile> {
        let result = self.run(username, email, password).await;
        RegistrationMetrics::record_outcome(outcome_label(&result));
        result
    }

    async fn run(&self, username: &str, email: &str, password: &str) -> Result<Profile> {
        validate(username, email, password)?;

        let taken = self
            .env
            .documents
            .query(USERS, fields::USERNAME, &Value::String(username.to_string()))
            .await
            .map_err(|e| Error::remote(Stage::UsernameProbe, &e))?;
        if !taken.is_empty() {
            tracing::info!("Username already taken");
            return Err(Error::Conflict(USERNAME_TAKEN.to_string()));
        }

        let account = self
            .env
            .identity
            .create_account(email, password)
            .await
            .map_err(|e| Error::remote(Stage::CreateAccount, &e))?;
        tracing::debug!(account = %account, "Account created");

        let profile = Profile {
            id: account.as_str().to_string(),
            username: username.to_string(),
            email: email.to_string(),
            created_at: self.env.clock.now().into(),
        };

        match self.write_profile(&profile).await {
            Ok(()) => {
                tracing::info!(account = %account, "Registration complete");
                Ok(profile)
            }
            Err(failure) => Err(self.compensate(&account, failure).await),
        }
    }

    async fn write_profile(&self, profile: &Profile) -> Result<()> {
        let fields = profile.to_fields()?;
        self.env
            .documents
            .set(USERS, &profile.id, fields)
            .await
            .map_err(|e| match e {
                ServiceError::AlreadyExists(_) => Error::Conflict(USERNAME_TAKEN.to_string()),
                other => Error::remote(Stage::WriteProfile, &other),
            })
    }

    /// Delete the account created for a profile that could not be written.
    ///
    /// Returns the error the caller should see.
    async fn compensate(&self, account: &AccountId, failure: Error) -> Error {
        tracing::warn!(
            account = %account,
            error = %failure,
            "Profile write failed, deleting account"
        );

        match self.env.identity.delete_account(account).await {
            Ok(()) => {
                RegistrationMetrics::record_compensation(true);
                failure
            }
            Err(err) => {
                RegistrationMetrics::record_compensation(false);
                tracing::error!(
                    stage = %Stage::DeleteAccount,
                    account = %account,
                    cause = %failure,
                    error = %err,
                    "Compensation failed, account is orphaned"
                );
                Error::CompensationFailed {
                    stage: Stage::WriteProfile,
                    cause: cause_message(&failure),
                    compensation: err.message().to_string(),
                }
            }
        }
    }
}

fn validate(username: &str, email: &str, password: &str) -> Result<()> {
    if username.trim().is_empty() {
        return Err(Error::validation("username", "must not be empty"));
    }
    if username.chars().any(char::is_whitespace) {
        return Err(Error::validation("username", "must not contain whitespace"));
    }
    if email.trim().is_empty() {
        return Err(Error::validation("email", "must not be empty"));
    }
    if password.is_empty() {
        return Err(Error::validation("password", "must not be empty"));
    }
    Ok(())
}

fn cause_message(failure: &Error) -> String {
    match failure {
        Error::Remote { message, .. } => message.clone(),
        other => other.to_string(),
    }
}

const fn outcome_label(result: &Result<Profile>) -> &'static str {
    match result {
        Ok(_) => "success",
        Err(Error::Validation { .. }) => "invalid",
        Err(Error::Conflict(_)) => "conflict",
        Err(Error::CompensationFailed { .. }) => "compensation_failed",
        Err(_) => "failure",
    }
}
