//! Remote data operations: row CRUD on the `expenses` and `categories`
//! tables plus RPC-style calls for group management.
//!
//! The traits are the seam between the client and the hosted service; the
//! [`RestRemote`] implementation talks PostgREST-style HTTP, and tests
//! substitute an in-memory mock. Authorization is enforced server-side —
//! the client only attaches the session's bearer token.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

use crate::config::RemoteConfig;
use crate::constants::{ERR_ALREADY_MEMBER, ERR_GROUP_NOT_FOUND};
use crate::models::{AuthSession, Category, Expense, ExpensePatch, Group, GroupAnalytics};

const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("resource not found")]
    NotFound,
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("invalid payload: {0}")]
    Invalid(String),
    #[error("connection error: {0}")]
    Connection(String),
}

/// Row-level CRUD on the remote `expenses` table, used by the sync worker
/// and by the one-shot hydration after sign-in.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn insert_expense(
        &self,
        auth: &AuthSession,
        expense: &Expense,
    ) -> Result<(), RemoteError>;

    async fn update_expense(
        &self,
        auth: &AuthSession,
        id: &str,
        patch: &ExpensePatch,
    ) -> Result<(), RemoteError>;

    async fn delete_expense(&self, auth: &AuthSession, id: &str) -> Result<(), RemoteError>;

    async fn fetch_expenses(&self, auth: &AuthSession) -> Result<Vec<Expense>, RemoteError>;
}

/// RPC-style operations beyond plain row CRUD. Group creation is atomic
/// server-side: the join code is generated there and the creator becomes
/// admin in the same call.
#[async_trait]
pub trait RemoteRpc: Send + Sync {
    async fn create_group(&self, auth: &AuthSession, name: &str) -> Result<Group, RemoteError>;
    async fn join_group(&self, auth: &AuthSession, code: &str) -> Result<(), RemoteError>;
    async fn user_group(&self, auth: &AuthSession) -> Result<Option<Group>, RemoteError>;
    async fn group_analytics(
        &self,
        auth: &AuthSession,
    ) -> Result<Option<GroupAnalytics>, RemoteError>;
    async fn remove_member(
        &self,
        auth: &AuthSession,
        user_id: &str,
        group_id: &str,
    ) -> Result<(), RemoteError>;
    async fn update_group_currency(
        &self,
        auth: &AuthSession,
        group_id: &str,
        currency: &str,
    ) -> Result<(), RemoteError>;

    async fn create_category(
        &self,
        auth: &AuthSession,
        icon: &str,
        label: &str,
    ) -> Result<Category, RemoteError>;
    async fn delete_category(&self, auth: &AuthSession, id: &str) -> Result<(), RemoteError>;
    async fn list_categories(&self, auth: &AuthSession) -> Result<Vec<Category>, RemoteError>;

    async fn update_username(&self, auth: &AuthSession, username: &str)
    -> Result<(), RemoteError>;
    async fn update_user_currency(
        &self,
        auth: &AuthSession,
        currency: &str,
    ) -> Result<(), RemoteError>;
}

// ── Wire types ──

/// Row shape of the remote `expenses` table. Timestamps travel as RFC 3339
/// strings; the ledger keeps epoch milliseconds.
#[derive(Serialize, Deserialize, Debug, Clone)]
struct ExpenseRow {
    id: String,
    user_id: String,
    amount: f64,
    category: Option<String>,
    group_id: Option<String>,
    created_at: String,
}

fn rfc3339_from_ms(ms: i64) -> Result<String, RemoteError> {
    let dt = OffsetDateTime::from_unix_timestamp_nanos(ms as i128 * 1_000_000)
        .map_err(|e| RemoteError::Invalid(format!("timestamp out of range: {}", e)))?;
    dt.format(&Rfc3339)
        .map_err(|e| RemoteError::Invalid(format!("timestamp format failed: {}", e)))
}

fn ms_from_rfc3339(value: &str) -> Result<i64, RemoteError> {
    let dt = OffsetDateTime::parse(value, &Rfc3339)
        .map_err(|e| RemoteError::Invalid(format!("bad created_at '{}': {}", value, e)))?;
    Ok((dt.unix_timestamp_nanos() / 1_000_000) as i64)
}

impl ExpenseRow {
    fn from_expense(user_id: &str, expense: &Expense) -> Result<Self, RemoteError> {
        Ok(Self {
            id: expense.id.clone(),
            user_id: user_id.to_string(),
            amount: expense.amount,
            category: expense.category.clone(),
            group_id: expense.group_id.clone(),
            created_at: rfc3339_from_ms(expense.timestamp)?,
        })
    }

    fn into_expense(self) -> Result<Expense, RemoteError> {
        let timestamp = ms_from_rfc3339(&self.created_at)?;
        Ok(Expense {
            id: self.id,
            amount: self.amount,
            timestamp,
            category: self.category,
            group_id: self.group_id,
        })
    }
}

/// Structured error payload the service returns alongside non-2xx statuses
/// (and occasionally inside 2xx RPC results).
#[derive(Deserialize, Debug, Default)]
struct ErrorPayload {
    error: Option<String>,
    message: Option<String>,
}

impl ErrorPayload {
    fn text(&self) -> Option<&str> {
        self.error.as_deref().or(self.message.as_deref())
    }
}

// ── REST implementation ──

pub struct RestRemote {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl RestRemote {
    pub fn new(config: &RemoteConfig) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| RemoteError::Connection(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        auth: &AuthSession,
    ) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header("apikey", &self.api_key)
            .bearer_auth(&auth.access_token)
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, RemoteError> {
        let response = builder
            .send()
            .await
            .map_err(|e| RemoteError::Connection(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let payload: ErrorPayload = response.json().await.unwrap_or_default();
        let detail = payload.text().unwrap_or(status.as_str()).to_string();
        Err(match status.as_u16() {
            404 => RemoteError::NotFound,
            409 => RemoteError::Conflict(detail),
            _ => RemoteError::Rejected(detail),
        })
    }

    /// RPC results can carry `{ "error": "..." }` inside a 2xx body; map
    /// the known messages onto the same taxonomy as HTTP statuses.
    fn rpc_error(value: &Value) -> Option<RemoteError> {
        let text = value.get("error")?.as_str()?;
        Some(match text {
            t if t == ERR_GROUP_NOT_FOUND => RemoteError::NotFound,
            t if t == ERR_ALREADY_MEMBER => RemoteError::Conflict(text.to_string()),
            _ => RemoteError::Rejected(text.to_string()),
        })
    }

    async fn rpc(
        &self,
        auth: &AuthSession,
        name: &str,
        params: Value,
    ) -> Result<Value, RemoteError> {
        let response = self
            .send(
                self.request(
                    reqwest::Method::POST,
                    &format!("/rest/v1/rpc/{}", name),
                    auth,
                )
                .json(&params),
            )
            .await?;

        let value: Value = response
            .json()
            .await
            .map_err(|e| RemoteError::Connection(e.to_string()))?;
        if let Some(err) = Self::rpc_error(&value) {
            return Err(err);
        }
        Ok(value)
    }
}

#[async_trait]
impl RemoteStore for RestRemote {
    async fn insert_expense(
        &self,
        auth: &AuthSession,
        expense: &Expense,
    ) -> Result<(), RemoteError> {
        let row = ExpenseRow::from_expense(&auth.user_id, expense)?;
        self.send(
            self.request(reqwest::Method::POST, "/rest/v1/expenses", auth)
                .json(&row),
        )
        .await?;
        Ok(())
    }

    async fn update_expense(
        &self,
        auth: &AuthSession,
        id: &str,
        patch: &ExpensePatch,
    ) -> Result<(), RemoteError> {
        self.send(
            self.request(
                reqwest::Method::PATCH,
                &format!("/rest/v1/expenses?id=eq.{}", id),
                auth,
            )
            .json(patch),
        )
        .await?;
        Ok(())
    }

    async fn delete_expense(&self, auth: &AuthSession, id: &str) -> Result<(), RemoteError> {
        self.send(self.request(
            reqwest::Method::DELETE,
            &format!("/rest/v1/expenses?id=eq.{}", id),
            auth,
        ))
        .await?;
        Ok(())
    }

    async fn fetch_expenses(&self, auth: &AuthSession) -> Result<Vec<Expense>, RemoteError> {
        let response = self
            .send(self.request(
                reqwest::Method::GET,
                &format!(
                    "/rest/v1/expenses?user_id=eq.{}&order=created_at.desc",
                    auth.user_id
                ),
                auth,
            ))
            .await?;

        let rows: Vec<ExpenseRow> = response
            .json()
            .await
            .map_err(|e| RemoteError::Connection(e.to_string()))?;
        rows.into_iter().map(ExpenseRow::into_expense).collect()
    }
}

#[async_trait]
impl RemoteRpc for RestRemote {
    async fn create_group(&self, auth: &AuthSession, name: &str) -> Result<Group, RemoteError> {
        let value = self
            .rpc(auth, "create_group", json!({ "group_name": name }))
            .await?;
        serde_json::from_value(value).map_err(|e| RemoteError::Invalid(e.to_string()))
    }

    async fn join_group(&self, auth: &AuthSession, code: &str) -> Result<(), RemoteError> {
        self.rpc(auth, "join_group", json!({ "join_code": code }))
            .await?;
        Ok(())
    }

    async fn user_group(&self, auth: &AuthSession) -> Result<Option<Group>, RemoteError> {
        let value = self.rpc(auth, "get_user_group", json!({})).await?;
        if value.is_null() {
            return Ok(None);
        }
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| RemoteError::Invalid(e.to_string()))
    }

    async fn group_analytics(
        &self,
        auth: &AuthSession,
    ) -> Result<Option<GroupAnalytics>, RemoteError> {
        let value = self.rpc(auth, "get_group_analytics", json!({})).await?;
        if value.is_null() {
            return Ok(None);
        }
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| RemoteError::Invalid(e.to_string()))
    }

    async fn remove_member(
        &self,
        auth: &AuthSession,
        user_id: &str,
        group_id: &str,
    ) -> Result<(), RemoteError> {
        self.rpc(
            auth,
            "remove_group_member",
            json!({ "target_user_id": user_id, "target_group_id": group_id }),
        )
        .await?;
        Ok(())
    }

    async fn update_group_currency(
        &self,
        auth: &AuthSession,
        group_id: &str,
        currency: &str,
    ) -> Result<(), RemoteError> {
        self.rpc(
            auth,
            "update_group_currency",
            json!({ "target_group_id": group_id, "currency": currency }),
        )
        .await?;
        Ok(())
    }

    async fn create_category(
        &self,
        auth: &AuthSession,
        icon: &str,
        label: &str,
    ) -> Result<Category, RemoteError> {
        let category = Category {
            id: Uuid::new_v4().to_string(),
            icon: icon.to_string(),
            label: label.to_string(),
        };
        self.send(
            self.request(reqwest::Method::POST, "/rest/v1/categories", auth)
                .json(&json!({
                    "id": category.id,
                    "user_id": auth.user_id,
                    "icon": category.icon,
                    "label": category.label,
                })),
        )
        .await?;
        Ok(category)
    }

    async fn delete_category(&self, auth: &AuthSession, id: &str) -> Result<(), RemoteError> {
        self.send(self.request(
            reqwest::Method::DELETE,
            &format!("/rest/v1/categories?id=eq.{}", id),
            auth,
        ))
        .await?;
        Ok(())
    }

    async fn list_categories(&self, auth: &AuthSession) -> Result<Vec<Category>, RemoteError> {
        let response = self
            .send(self.request(
                reqwest::Method::GET,
                &format!(
                    "/rest/v1/categories?user_id=eq.{}&order=created_at",
                    auth.user_id
                ),
                auth,
            ))
            .await?;
        response
            .json()
            .await
            .map_err(|e| RemoteError::Connection(e.to_string()))
    }

    async fn update_username(
        &self,
        auth: &AuthSession,
        username: &str,
    ) -> Result<(), RemoteError> {
        self.send(
            self.request(
                reqwest::Method::PATCH,
                &format!("/rest/v1/profiles?id=eq.{}", auth.user_id),
                auth,
            )
            .json(&json!({ "username": username })),
        )
        .await?;
        Ok(())
    }

    async fn update_user_currency(
        &self,
        auth: &AuthSession,
        currency: &str,
    ) -> Result<(), RemoteError> {
        self.send(
            self.request(
                reqwest::Method::PATCH,
                &format!("/rest/v1/profiles?id=eq.{}", auth.user_id),
                auth,
            )
            .json(&json!({ "preference_currency": currency })),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expense_row_round_trips_timestamp() {
        let expense = Expense {
            id: "e1".to_string(),
            amount: 12.5,
            timestamp: 1_700_000_000_000,
            category: Some("food".to_string()),
            group_id: None,
        };
        let row = ExpenseRow::from_expense("u1", &expense).unwrap();
        assert_eq!(row.user_id, "u1");
        assert_eq!(row.created_at, "2023-11-14T22:13:20Z");

        let back = row.into_expense().unwrap();
        assert_eq!(back, expense);
    }

    #[test]
    fn rpc_error_maps_known_messages() {
        let not_found = json!({ "error": "Group not found" });
        assert!(matches!(
            RestRemote::rpc_error(&not_found),
            Some(RemoteError::NotFound)
        ));

        let member = json!({ "error": "Already a member" });
        assert!(matches!(
            RestRemote::rpc_error(&member),
            Some(RemoteError::Conflict(_))
        ));

        let ok = json!({ "group_info": {} });
        assert!(RestRemote::rpc_error(&ok).is_none());
    }
}
