use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use crate::constants::{MSG_PROFILE_CREATED, MSG_PROFILE_EXISTS};
use crate::db::{Db, StoreError};
use crate::models::{NewUserProfile, UserProfile};

/// Sync request as sent by the client on sign-up or login
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncRequest {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    pub email: Option<String>,
    /// Display name
    #[serde(rename = "nome", alias = "name")]
    pub name: Option<String>,
}

impl SyncRequest {
    pub fn new(user_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            email: Some(email.into()),
            name: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Missing required fields: userId and email")]
    MissingFields,

    #[error("Profile lookup failed: {0}")]
    LookupFailed(StoreError),

    #[error("Profile creation failed: {0}")]
    CreationFailed(StoreError),
}

/// What a successful sync did
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// No row existed; this call inserted it
    Created(UserProfile),
    /// A row already existed; nothing was written
    Existing(UserProfile),
    /// A concurrent sync inserted the row between our lookup and insert
    CreatedConcurrently,
}

impl SyncOutcome {
    /// The profile row, when this sync has it at hand
    pub fn profile(&self) -> Option<&UserProfile> {
        match self {
            SyncOutcome::Created(profile) | SyncOutcome::Existing(profile) => Some(profile),
            SyncOutcome::CreatedConcurrently => None,
        }
    }

    pub fn into_profile(self) -> Option<UserProfile> {
        match self {
            SyncOutcome::Created(profile) | SyncOutcome::Existing(profile) => Some(profile),
            SyncOutcome::CreatedConcurrently => None,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            SyncOutcome::Created(_) => MSG_PROFILE_CREATED,
            SyncOutcome::Existing(_) | SyncOutcome::CreatedConcurrently => MSG_PROFILE_EXISTS,
        }
    }
}

/// Ensures every authenticated user has exactly one profile row.
///
/// The lookup and insert are separate store calls, so two devices logging in
/// at once can both miss the row and both insert. The table's primary key
/// keeps one row; the losing insert's duplicate-key error is reported as
/// [`SyncOutcome::CreatedConcurrently`].
#[derive(Clone)]
pub struct ProfileSynchronizer {
    store: Db,
}

impl ProfileSynchronizer {
    pub fn new(store: Db) -> Self {
        Self { store }
    }

    #[instrument(skip(self, request), fields(user_id = request.user_id.as_deref().unwrap_or("")))]
    pub async fn sync(&self, request: SyncRequest) -> Result<SyncOutcome, SyncError> {
        let (Some(user_id), Some(email)) = (non_blank(request.user_id), non_blank(request.email))
        else {
            tracing::warn!("Sync request missing userId or email");
            return Err(SyncError::MissingFields);
        };

        match self.store.find_profile(&user_id).await {
            Ok(Some(profile)) => {
                tracing::debug!("Profile already exists");
                return Ok(SyncOutcome::Existing(profile));
            }
            Ok(None) => {}
            Err(e) => {
                tracing::error!("Profile lookup failed: {}", e);
                return Err(SyncError::LookupFailed(e));
            }
        }

        let profile = NewUserProfile::with_defaults(
            user_id,
            email,
            non_blank(request.name),
            Utc::now().date_naive(),
        );

        match self.store.insert_profile(profile).await {
            Ok(profile) => {
                tracing::info!("Profile created");
                Ok(SyncOutcome::Created(profile))
            }
            Err(e) if e.is_duplicate() => {
                tracing::info!("Profile created by a concurrent sync: {}", e);
                Ok(SyncOutcome::CreatedConcurrently)
            }
            Err(e) => {
                tracing::error!("Profile creation failed: {}", e);
                Err(SyncError::CreationFailed(e))
            }
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
