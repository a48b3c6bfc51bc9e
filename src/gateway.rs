//! Foreground request/response operations for group membership, custom
//! categories, and profile preferences.
//!
//! The gateway holds no group invariants: every authorization rule
//! (admin-only removal, admin-only currency change, join-code uniqueness)
//! is enforced remotely. Client-side checks here are input validation
//! only, rejected before any remote call is made.

use std::sync::Arc;
use thiserror::Error;

use crate::constants::{JOIN_CODE_LENGTH, MAX_CATEGORY_LABEL_LENGTH, MAX_GROUP_NAME_LENGTH};
use crate::models::{AuthSession, Category, Group, GroupAnalytics};
use crate::remote::{RemoteError, RemoteRpc};
use crate::session::SessionHandle;
use crate::utils::validate_label;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Not authenticated")]
    NotAuthenticated,
    #[error("{0}")]
    Validation(String),
    #[error("Group not found")]
    GroupNotFound,
    #[error("Already a member")]
    AlreadyMember,
    #[error("{0}")]
    Rejected(String),
    #[error("connection error: {0}")]
    Connection(String),
}

impl From<RemoteError> for GatewayError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::NotFound => GatewayError::Rejected("not found".to_string()),
            RemoteError::Conflict(msg) | RemoteError::Rejected(msg) => GatewayError::Rejected(msg),
            RemoteError::Invalid(msg) => GatewayError::Rejected(msg),
            RemoteError::Connection(msg) => GatewayError::Connection(msg),
        }
    }
}

/// Stateless wrapper over the remote RPCs. Constructed once and passed by
/// reference alongside the store.
pub struct GroupGateway {
    remote: Arc<dyn RemoteRpc>,
    session: SessionHandle,
}

impl GroupGateway {
    pub fn new(remote: Arc<dyn RemoteRpc>, session: SessionHandle) -> Self {
        Self { remote, session }
    }

    async fn require_session(&self) -> Result<AuthSession, GatewayError> {
        self.session
            .read()
            .await
            .clone()
            .ok_or(GatewayError::NotAuthenticated)
    }

    /// Create a group. The server generates the join code and makes the
    /// creator admin atomically; the returned group carries the code to
    /// share.
    pub async fn create_group(&self, name: &str) -> Result<Group, GatewayError> {
        let auth = self.require_session().await?;
        validate_label(name, "Group name", MAX_GROUP_NAME_LENGTH)
            .map_err(GatewayError::Validation)?;
        Ok(self.remote.create_group(&auth, name.trim()).await?)
    }

    /// Join by code. Unknown codes and duplicate membership fail with
    /// distinct errors so the UI can word them differently.
    pub async fn join_group(&self, code: &str) -> Result<(), GatewayError> {
        let auth = self.require_session().await?;
        let code = code.trim().to_uppercase();
        if code.is_empty() {
            return Err(GatewayError::Validation(
                "Join code cannot be empty".to_string(),
            ));
        }
        if code.len() != JOIN_CODE_LENGTH {
            return Err(GatewayError::Validation(format!(
                "Join code must be {} characters",
                JOIN_CODE_LENGTH
            )));
        }
        match self.remote.join_group(&auth, &code).await {
            Ok(()) => Ok(()),
            Err(RemoteError::NotFound) => Err(GatewayError::GroupNotFound),
            Err(RemoteError::Conflict(_)) => Err(GatewayError::AlreadyMember),
            Err(e) => Err(e.into()),
        }
    }

    /// The caller's group, or `None` when they belong to none.
    pub async fn user_group(&self) -> Result<Option<Group>, GatewayError> {
        let auth = self.require_session().await?;
        Ok(self.remote.user_group(&auth).await?)
    }

    /// Server-computed roster, daily history, and category totals for the
    /// caller's group. `None` when they belong to none.
    pub async fn group_analytics(&self) -> Result<Option<GroupAnalytics>, GatewayError> {
        let auth = self.require_session().await?;
        Ok(self.remote.group_analytics(&auth).await?)
    }

    /// Admin-only, enforced remotely.
    pub async fn remove_member(&self, user_id: &str, group_id: &str) -> Result<(), GatewayError> {
        let auth = self.require_session().await?;
        Ok(self.remote.remove_member(&auth, user_id, group_id).await?)
    }

    /// Admin-only, enforced remotely.
    pub async fn update_currency(
        &self,
        group_id: &str,
        currency: &str,
    ) -> Result<(), GatewayError> {
        let auth = self.require_session().await?;
        if currency.trim().is_empty() {
            return Err(GatewayError::Validation(
                "Currency cannot be empty".to_string(),
            ));
        }
        Ok(self
            .remote
            .update_group_currency(&auth, group_id, currency.trim())
            .await?)
    }

    pub async fn create_category(
        &self,
        icon: &str,
        label: &str,
    ) -> Result<Category, GatewayError> {
        let auth = self.require_session().await?;
        validate_label(label, "Category label", MAX_CATEGORY_LABEL_LENGTH)
            .map_err(GatewayError::Validation)?;
        if icon.trim().is_empty() {
            return Err(GatewayError::Validation(
                "Category icon cannot be empty".to_string(),
            ));
        }
        Ok(self
            .remote
            .create_category(&auth, icon.trim(), label.trim())
            .await?)
    }

    pub async fn delete_category(&self, id: &str) -> Result<(), GatewayError> {
        let auth = self.require_session().await?;
        Ok(self.remote.delete_category(&auth, id).await?)
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, GatewayError> {
        let auth = self.require_session().await?;
        Ok(self.remote.list_categories(&auth).await?)
    }

    pub async fn update_username(&self, username: &str) -> Result<(), GatewayError> {
        let auth = self.require_session().await?;
        let username = username.trim();
        if username.len() <= 1 {
            return Err(GatewayError::Validation(
                "Username must be at least 2 characters".to_string(),
            ));
        }
        Ok(self.remote.update_username(&auth, username).await?)
    }

    pub async fn update_user_currency(&self, currency: &str) -> Result<(), GatewayError> {
        let auth = self.require_session().await?;
        if currency.trim().is_empty() {
            return Err(GatewayError::Validation(
                "Currency cannot be empty".to_string(),
            ));
        }
        Ok(self
            .remote
            .update_user_currency(&auth, currency.trim())
            .await?)
    }
}
