//! Password-reset requests and confirmations.
//!
//! A request never reveals whether the address belongs to an account. The
//! lookup, token minting and mail delivery run as a detached background task
//! so the response is immediate and uniform.
//!
//! A confirmation redeems the mailed token: the token is checked, consumed
//! and the new password hash stored in one unit of work.

use std::sync::Arc;
use std::time::Duration;

use mockable::Clock;
use tracing::info;
use zeroize::Zeroizing;

use super::ports::{Deadline, Mailer, Store, StoreError, in_unit_of_work};
use super::{
    AccountFilter, AccountUpdate, BackgroundTasks, EmailToken, Error, Password, TokenPurpose,
    stored_now,
};

/// Template rendered by the mail relay.
pub const PASSWORD_RESET_TEMPLATE: &str = "password-reset-request";

/// Default bound on one reset task, end to end.
pub const PASSWORD_RESET_TIMEOUT: Duration = Duration::from_secs(30);

/// How long a mailed reset token can be redeemed.
pub const PASSWORD_RESET_TOKEN_LIFETIME: Duration = Duration::from_secs(60 * 60);

/// Password-reset service over the [`Store`] and [`Mailer`] ports.
#[derive(Clone)]
pub struct PasswordResetService {
    store: Arc<dyn Store>,
    mailer: Arc<dyn Mailer>,
    clock: Arc<dyn Clock>,
    tasks: BackgroundTasks,
    timeout: Duration,
}

impl PasswordResetService {
    /// Create a service spawning its work on `tasks`, each bounded by `timeout`.
    pub fn new(
        store: Arc<dyn Store>,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
        tasks: BackgroundTasks,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            mailer,
            clock,
            tasks,
            timeout,
        }
    }

    /// Queue a reset for `email` and return at once.
    pub fn request(&self, email: &str) {
        let this = self.clone();
        let email = email.trim().to_owned();
        self.tasks.spawn("password-reset", self.timeout, async move {
            this.send_reset(email).await
        });
    }

    async fn send_reset(&self, email: String) -> Result<(), Error> {
        let filter = AccountFilter::default()
            .with_emails([email.as_str()])
            .with_active(true);
        let deadline = Deadline::after(self.timeout);
        let accounts = self.store.find_accounts(&filter, deadline).await?;
        let [account] = accounts.as_slice() else {
            info!("password reset requested for unknown or inactive address");
            return Ok(());
        };

        let (token, raw) = EmailToken::issue(
            account,
            TokenPurpose::PasswordReset,
            stored_now(self.clock.as_ref()),
        );
        in_unit_of_work(self.store.as_ref(), deadline, move |unit| {
            Box::pin(async move {
                unit.create_email_token(&token).await?;
                Ok::<_, Error>(())
            })
        })
        .await?;

        let payload = serde_json::to_value(&raw).map_err(|err| Error::internal(err.to_string()))?;
        self.mailer
            .send(PASSWORD_RESET_TEMPLATE, &email, payload)
            .await
            .map_err(|err| Error::service_unavailable(err.to_string()))?;
        info!(account_id = %account.id, "password reset mail sent");
        Ok(())
    }

    /// Redeem the token `id`/`raw` and replace the owner's password.
    ///
    /// Unknown, consumed, expired and mismatched tokens are indistinguishable
    /// to the caller.
    pub async fn confirm(&self, id: &str, raw: &str, password: &Password) -> Result<(), Error> {
        let password_hash = password
            .hash_blocking()
            .await
            .map_err(|err| Error::internal(err.to_string()))?;
        let now = stored_now(self.clock.as_ref());
        let id = id.to_owned();
        let raw = Zeroizing::new(raw.to_owned());
        let account_id = in_unit_of_work(self.store.as_ref(), Deadline::after(self.timeout), move |unit| {
            Box::pin(async move {
                let token = unit.find_email_token(&id).await.map_err(invalid_token_as)?;
                let redeemable = token.is_redeemable(
                    TokenPurpose::PasswordReset,
                    now,
                    PASSWORD_RESET_TOKEN_LIFETIME,
                );
                if !redeemable || !token.matches(&raw) {
                    return Err(invalid_reset_token());
                }
                unit.consume_email_token(&id, now)
                    .await
                    .map_err(invalid_token_as)?;
                let update = AccountUpdate {
                    password_hash: Some(password_hash),
                    ..AccountUpdate::default()
                };
                unit.update_account(&token.account_id, &update, now)
                    .await
                    .map_err(invalid_token_as)?;
                Ok(token.account_id)
            })
        })
        .await?;
        info!(%account_id, "password reset completed");
        Ok(())
    }
}

fn invalid_reset_token() -> Error {
    Error::invalid_request("invalid or expired reset token")
}

fn invalid_token_as(err: StoreError) -> Error {
    match err {
        StoreError::NotFound => invalid_reset_token(),
        other => Error::from(other),
    }
}
