//! Sign-up and account settings.

use serde::Deserialize;

use crate::db::models::UserId;
use crate::error::{CoreError, CoreResult};
use crate::social::views::SettingsView;
use crate::store::{GraphStore, NewUser, ProfileChange, SettingsChange, WriteOutcome};

pub const MIN_ACCOUNT_CHARS: usize = 5;
pub const MAX_NAME_CHARS: usize = 50;
pub const MAX_INTRODUCTION_CHARS: usize = 160;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpForm {
    pub account: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub check_password: String,
}

/// Settings update; an empty password keeps the current one.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsForm {
    pub account: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub check_password: String,
}

/// Public profile edit. Avatar and cover are image URLs; blank clears them.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileForm {
    pub name: String,
    #[serde(default)]
    pub introduction: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub cover: Option<String>,
}

struct Identity {
    account: String,
    name: String,
    email: String,
}

fn validate_identity(account: &str, name: &str, email: &str) -> CoreResult<Identity> {
    let account = account.trim();
    let email = email.trim();

    if account.chars().count() < MIN_ACCOUNT_CHARS {
        return Err(CoreError::validation(format!(
            "Account must be at least {MIN_ACCOUNT_CHARS} characters"
        )));
    }
    let name = validate_name(name)?;
    if email.is_empty() {
        return Err(CoreError::validation("Email is required"));
    }

    Ok(Identity {
        account: account.to_string(),
        name,
        email: email.to_string(),
    })
}

fn validate_name(name: &str) -> CoreResult<String> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_CHARS {
        return Err(CoreError::validation(format!(
            "Name must be between 1 and {MAX_NAME_CHARS} characters"
        )));
    }
    Ok(name.to_string())
}

fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn check_passwords(password: &str, check_password: &str) -> CoreResult<()> {
    if password != check_password {
        return Err(CoreError::validation("Passwords do not match"));
    }
    Ok(())
}

/// Reject an account or email already held by someone other than `except`.
async fn ensure_available(
    store: &dyn GraphStore,
    identity: &Identity,
    except: Option<UserId>,
) -> CoreResult<()> {
    let taken = store
        .users_matching(&identity.account, &identity.email, except)
        .await?;
    if taken.iter().any(|u| u.account == identity.account) {
        return Err(CoreError::validation("Account is already taken"));
    }
    if taken.iter().any(|u| u.email == identity.email) {
        return Err(CoreError::validation("Email is already taken"));
    }
    Ok(())
}

async fn hash_password(password: &str, cost: u32) -> CoreResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| CoreError::Internal(e.to_string()))?
        .map_err(|e| CoreError::Internal(format!("Password hashing failed: {e}")))
}

pub async fn sign_up(
    store: &dyn GraphStore,
    form: &SignUpForm,
    hash_cost: u32,
) -> CoreResult<UserId> {
    let identity = validate_identity(&form.account, &form.name, &form.email)?;
    if form.password.is_empty() {
        return Err(CoreError::validation("Password is required"));
    }
    check_passwords(&form.password, &form.check_password)?;
    ensure_available(store, &identity, None).await?;

    let user = NewUser {
        account: identity.account,
        email: identity.email,
        name: identity.name,
        password_hash: hash_password(&form.password, hash_cost).await?,
    };
    // The unique indexes catch a sign-up racing this one
    store
        .insert_user(&user)
        .await?
        .ok_or_else(|| CoreError::validation("Account or email is already taken"))
}

pub async fn settings(
    store: &dyn GraphStore,
    viewer: UserId,
    subject: UserId,
) -> CoreResult<SettingsView> {
    if viewer != subject {
        return Err(CoreError::authorization(
            "You cannot edit another user's settings",
        ));
    }
    let user = store
        .user(subject)
        .await?
        .ok_or_else(|| CoreError::not_found(format!("User {subject} not found")))?;

    Ok(SettingsView {
        id: user.id,
        account: user.account,
        name: user.name,
        email: user.email,
    })
}

pub async fn update_settings(
    store: &dyn GraphStore,
    viewer: UserId,
    subject: UserId,
    form: &SettingsForm,
    hash_cost: u32,
) -> CoreResult<()> {
    if viewer != subject {
        return Err(CoreError::authorization(
            "You cannot edit another user's settings",
        ));
    }
    let identity = validate_identity(&form.account, &form.name, &form.email)?;
    check_passwords(&form.password, &form.check_password)?;

    if store.user(subject).await?.is_none() {
        return Err(CoreError::not_found(format!("User {subject} not found")));
    }
    ensure_available(store, &identity, Some(subject)).await?;

    let password_hash = if form.password.is_empty() {
        None
    } else {
        Some(hash_password(&form.password, hash_cost).await?)
    };
    let change = SettingsChange {
        account: identity.account,
        email: identity.email,
        name: identity.name,
        password_hash,
    };

    match store.update_settings(subject, &change).await? {
        WriteOutcome::Created => Ok(()),
        WriteOutcome::Duplicate => Err(CoreError::validation(
            "Account or email is already taken",
        )),
    }
}

pub async fn update_profile(
    store: &dyn GraphStore,
    viewer: UserId,
    subject: UserId,
    form: &ProfileForm,
) -> CoreResult<()> {
    if viewer != subject {
        return Err(CoreError::authorization(
            "You cannot edit another user's profile",
        ));
    }
    let name = validate_name(&form.name)?;
    let introduction = optional_text(form.introduction.as_deref());
    if introduction
        .as_ref()
        .is_some_and(|v| v.chars().count() > MAX_INTRODUCTION_CHARS)
    {
        return Err(CoreError::validation(format!(
            "Introduction must be at most {MAX_INTRODUCTION_CHARS} characters"
        )));
    }

    let change = ProfileChange {
        name,
        introduction,
        avatar: optional_text(form.avatar.as_deref()),
        cover: optional_text(form.cover.as_deref()),
    };
    if !store.update_profile(subject, &change).await? {
        return Err(CoreError::not_found(format!("User {subject} not found")));
    }
    Ok(())
}
