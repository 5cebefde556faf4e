use crate::{
    db_types::{Account, Profile, ProfileKind},
    traits::MarketError,
};

#[allow(async_fn_in_trait)]
pub trait AccountManagement {
    /// Creates an account and a profile of the given kind in one transaction.
    ///
    /// An email can only ever be registered once. If it exists, the call fails with
    /// [`MarketError::RegistrationConflict`], and the message tells the user whether they already hold the same or
    /// the other kind of profile.
    async fn create_account(
        &self,
        email: &str,
        password_hash: &str,
        kind: ProfileKind,
        name: &str,
        avatar: Option<&str>,
    ) -> Result<(Account, Profile), MarketError>;

    /// Creates a staff account (no profile). Fails with [`MarketError::RegistrationConflict`] if the email exists.
    async fn create_staff_account(&self, email: &str, password_hash: &str) -> Result<Account, MarketError>;

    async fn fetch_account_by_email(&self, email: &str) -> Result<Option<Account>, MarketError>;

    async fn fetch_account(&self, account_id: i64) -> Result<Option<Account>, MarketError>;

    /// The profile of the given kind attached to the account, if any.
    async fn fetch_profile_for_account(
        &self,
        account_id: i64,
        kind: ProfileKind,
    ) -> Result<Option<Profile>, MarketError>;

    async fn fetch_profile(&self, kind: ProfileKind, profile_id: i64) -> Result<Option<Profile>, MarketError>;
}
