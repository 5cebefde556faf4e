//! Registration, login and profile views.
use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Account, NewAccount, Profile, ProfileKind, Role},
    helpers::{hash_password, verify_password},
    traits::{AccountManagement, MarketError, OrderQueries, ProfileView},
};

pub struct AccountApi<B> {
    db: B,
}

impl<B: Debug> Debug for AccountApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountApi ({:?})", self.db)
    }
}

fn normalize_email(email: &str) -> Result<String, MarketError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((user, domain)) if !user.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(MarketError::InvalidRequest(format!("{email} is not a valid email address"))),
    }
}

fn invalid_credentials() -> MarketError {
    MarketError::Unauthorized("Invalid email or password".into())
}

impl<B> AccountApi<B>
where B: AccountManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Registers a new customer or vendor. An email can hold exactly one profile.
    pub async fn register(&self, account: NewAccount) -> Result<(Account, Profile), MarketError> {
        let email = normalize_email(&account.email)?;
        let name = account.name.trim();
        if name.is_empty() {
            return Err(MarketError::InvalidRequest("A name is required".into()));
        }
        let hash = hash_password(&account.password)?;
        let avatar = account.avatar.as_deref().filter(|a| !a.is_empty());
        let result = self.db.create_account(&email, &hash, account.kind, name, avatar).await?;
        info!("👤️ New {} registered: account #{}", account.kind, result.0.id);
        Ok(result)
    }

    pub async fn create_staff_account(&self, email: &str, password: &str) -> Result<Account, MarketError> {
        let email = normalize_email(email)?;
        let hash = hash_password(password)?;
        let account = self.db.create_staff_account(&email, &hash).await?;
        info!("👤️ Staff account #{} created for {email}", account.id);
        Ok(account)
    }

    /// Checks a login and resolves the role the session will carry.
    ///
    /// Staff accounts always resolve to [`Role::Staff`] and may not ask for a profile kind. Other accounts resolve to
    /// the profile they hold. If `kind` is given it must match that profile.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
        kind: Option<ProfileKind>,
    ) -> Result<(Account, Role), MarketError> {
        let email = email.trim().to_lowercase();
        let account = self.db.fetch_account_by_email(&email).await?.ok_or_else(invalid_credentials)?;
        if !verify_password(password, &account.password_hash) {
            debug!("👤️ Wrong password for account #{}", account.id);
            return Err(invalid_credentials());
        }
        if account.is_staff {
            return match kind {
                None => Ok((account, Role::Staff)),
                Some(k) => Err(MarketError::Unauthorized(format!("Staff accounts cannot log in as a {k}"))),
            };
        }
        let kinds = match kind {
            Some(k) => vec![k],
            None => vec![ProfileKind::Customer, ProfileKind::Vendor],
        };
        for k in kinds {
            if let Some(profile) = self.db.fetch_profile_for_account(account.id, k).await? {
                let role = match k {
                    ProfileKind::Customer => Role::Customer(profile.id),
                    ProfileKind::Vendor => Role::Vendor(profile.id),
                };
                trace!("👤️ Account #{} logged in as {role}", account.id);
                return Ok((account, role));
            }
        }
        Err(MarketError::Unauthorized(match kind {
            Some(k) => format!("This account is not registered as a {k}"),
            None => "This account has no profile".to_string(),
        }))
    }

}

impl<B> AccountApi<B>
where B: AccountManagement + OrderQueries
{
    /// The profile page for the logged-in account.
    pub async fn profile_view(&self, account_id: i64, role: Role) -> Result<ProfileView, MarketError> {
        let missing = || MarketError::NotFound(format!("Profile for {role}"));
        match role {
            Role::Customer(id) => {
                let profile = self.db.fetch_profile(ProfileKind::Customer, id).await?.ok_or_else(missing)?;
                let orders = self.db.fetch_orders_for_customer(id).await?;
                Ok(ProfileView::Customer { profile, orders })
            },
            Role::Vendor(id) => {
                let profile = self.db.fetch_profile(ProfileKind::Vendor, id).await?.ok_or_else(missing)?;
                let order_count = self.db.count_orders_for_vendor(id).await?;
                Ok(ProfileView::Vendor { profile, order_count })
            },
            Role::Staff => {
                let account = self
                    .db
                    .fetch_account(account_id)
                    .await?
                    .ok_or_else(|| MarketError::NotFound(format!("Account #{account_id}")))?;
                Ok(ProfileView::Staff { email: account.email })
            },
        }
    }
}

#[cfg(test)]
mod test {
    use super::normalize_email;

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email("  Alice@Example.COM ").unwrap(), "alice@example.com");
        assert!(normalize_email("alice").is_err());
        assert!(normalize_email("@example.com").is_err());
        assert!(normalize_email("alice@localhost").is_err());
    }
}
