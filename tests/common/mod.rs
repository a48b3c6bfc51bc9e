#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use hormiga::models::{
    AuthSession, Category, Expense, ExpensePatch, Group, GroupAnalytics, MemberStats, Role,
};
use hormiga::remote::{RemoteError, RemoteRpc, RemoteStore};
use hormiga::session::{self, SessionHandle};

pub const TEST_USER: &str = "user-1";
pub const TEST_GROUP_CODE: &str = "ABC123";

pub fn test_session() -> SessionHandle {
    session::authenticated(AuthSession {
        user_id: TEST_USER.to_string(),
        access_token: "test-token".to_string(),
    })
}

pub fn session_for(user_id: &str) -> SessionHandle {
    session::authenticated(AuthSession {
        user_id: user_id.to_string(),
        access_token: "test-token".to_string(),
    })
}

pub fn expense_at(id: &str, amount: f64, timestamp: i64, category: Option<&str>) -> Expense {
    Expense {
        id: id.to_string(),
        amount,
        timestamp,
        category: category.map(|c| c.to_string()),
        group_id: None,
    }
}

/// Poll `check` until it returns true or the timeout expires. Background
/// sync has no join point, so tests observe its effects by polling.
pub async fn wait_until<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        if check().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCall {
    Insert(Expense),
    Update(String, ExpensePatch),
    Delete(String),
}

/// In-memory stand-in for the hosted service. Row pushes can be made to
/// fail a fixed number of times (or always) to exercise the retry path;
/// RPC behavior models one group with one admin.
#[derive(Default)]
pub struct MockRemote {
    pub calls: Mutex<Vec<RemoteCall>>,
    pub push_attempts: AtomicU32,
    pub fail_next: AtomicU32,
    pub always_fail: AtomicBool,
    pub fetch_result: Mutex<Vec<Expense>>,

    pub group: Mutex<Option<Group>>,
    pub admin: Mutex<Option<String>>,
    pub members: Mutex<Vec<String>>,
    pub categories: Mutex<Vec<Category>>,
}

impl MockRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_pushes(&self, count: u32) {
        self.fail_next.store(count, Ordering::SeqCst);
    }

    pub fn set_always_fail(&self, value: bool) {
        self.always_fail.store(value, Ordering::SeqCst);
    }

    pub fn set_fetch_result(&self, records: Vec<Expense>) {
        *self.fetch_result.lock().unwrap() = records;
    }

    /// Seed an existing group so join/roster tests have something to hit.
    pub fn seed_group(&self, admin_user: &str) -> Group {
        let group = Group {
            id: "group-1".to_string(),
            name: "Casa".to_string(),
            code: TEST_GROUP_CODE.to_string(),
            currency: "$".to_string(),
        };
        *self.group.lock().unwrap() = Some(group.clone());
        *self.admin.lock().unwrap() = Some(admin_user.to_string());
        *self.members.lock().unwrap() = vec![admin_user.to_string()];
        group
    }

    pub fn recorded_calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().unwrap().clone()
    }

    fn maybe_fail(&self) -> Result<(), RemoteError> {
        self.push_attempts.fetch_add(1, Ordering::SeqCst);
        if self.always_fail.load(Ordering::SeqCst) {
            return Err(RemoteError::Connection("simulated outage".to_string()));
        }
        let remaining = self.fail_next.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_next.store(remaining - 1, Ordering::SeqCst);
            return Err(RemoteError::Connection("simulated outage".to_string()));
        }
        Ok(())
    }

    fn is_member(&self, user_id: &str) -> bool {
        self.members.lock().unwrap().iter().any(|m| m == user_id)
    }
}

#[async_trait]
impl RemoteStore for MockRemote {
    async fn insert_expense(
        &self,
        _auth: &AuthSession,
        expense: &Expense,
    ) -> Result<(), RemoteError> {
        self.maybe_fail()?;
        self.calls
            .lock()
            .unwrap()
            .push(RemoteCall::Insert(expense.clone()));
        Ok(())
    }

    async fn update_expense(
        &self,
        _auth: &AuthSession,
        id: &str,
        patch: &ExpensePatch,
    ) -> Result<(), RemoteError> {
        self.maybe_fail()?;
        self.calls
            .lock()
            .unwrap()
            .push(RemoteCall::Update(id.to_string(), patch.clone()));
        Ok(())
    }

    async fn delete_expense(&self, _auth: &AuthSession, id: &str) -> Result<(), RemoteError> {
        self.maybe_fail()?;
        self.calls
            .lock()
            .unwrap()
            .push(RemoteCall::Delete(id.to_string()));
        Ok(())
    }

    async fn fetch_expenses(&self, _auth: &AuthSession) -> Result<Vec<Expense>, RemoteError> {
        Ok(self.fetch_result.lock().unwrap().clone())
    }
}

#[async_trait]
impl RemoteRpc for MockRemote {
    async fn create_group(&self, auth: &AuthSession, name: &str) -> Result<Group, RemoteError> {
        let group = Group {
            id: "group-1".to_string(),
            name: name.to_string(),
            code: TEST_GROUP_CODE.to_string(),
            currency: "$".to_string(),
        };
        *self.group.lock().unwrap() = Some(group.clone());
        *self.admin.lock().unwrap() = Some(auth.user_id.clone());
        *self.members.lock().unwrap() = vec![auth.user_id.clone()];
        Ok(group)
    }

    async fn join_group(&self, auth: &AuthSession, code: &str) -> Result<(), RemoteError> {
        let known = self.group.lock().unwrap().clone();
        match known {
            Some(group) if group.code == code => {
                if self.is_member(&auth.user_id) {
                    return Err(RemoteError::Conflict("Already a member".to_string()));
                }
                self.members.lock().unwrap().push(auth.user_id.clone());
                Ok(())
            }
            _ => Err(RemoteError::NotFound),
        }
    }

    async fn user_group(&self, auth: &AuthSession) -> Result<Option<Group>, RemoteError> {
        if self.is_member(&auth.user_id) {
            Ok(self.group.lock().unwrap().clone())
        } else {
            Ok(None)
        }
    }

    async fn group_analytics(
        &self,
        auth: &AuthSession,
    ) -> Result<Option<GroupAnalytics>, RemoteError> {
        if !self.is_member(&auth.user_id) {
            return Ok(None);
        }
        let group = self.group.lock().unwrap().clone().expect("seeded group");
        let admin = self.admin.lock().unwrap().clone();
        let members = self
            .members
            .lock()
            .unwrap()
            .iter()
            .map(|user_id| MemberStats {
                user_id: user_id.clone(),
                name: user_id.clone(),
                role: if admin.as_deref() == Some(user_id) {
                    Role::Admin
                } else {
                    Role::Member
                },
                total_spent: 0.0,
                transaction_count: 0,
            })
            .collect();
        Ok(Some(GroupAnalytics {
            group_info: group,
            members,
            history: Vec::new(),
            categories: Vec::new(),
        }))
    }

    async fn remove_member(
        &self,
        auth: &AuthSession,
        user_id: &str,
        _group_id: &str,
    ) -> Result<(), RemoteError> {
        if self.admin.lock().unwrap().as_deref() != Some(auth.user_id.as_str()) {
            return Err(RemoteError::Rejected(
                "Only the group admin can remove members".to_string(),
            ));
        }
        let mut members = self.members.lock().unwrap();
        if !members.iter().any(|m| m == user_id) {
            return Err(RemoteError::NotFound);
        }
        members.retain(|m| m != user_id);
        Ok(())
    }

    async fn update_group_currency(
        &self,
        auth: &AuthSession,
        _group_id: &str,
        currency: &str,
    ) -> Result<(), RemoteError> {
        if self.admin.lock().unwrap().as_deref() != Some(auth.user_id.as_str()) {
            return Err(RemoteError::Rejected(
                "Only the group admin can change the currency".to_string(),
            ));
        }
        if let Some(group) = self.group.lock().unwrap().as_mut() {
            group.currency = currency.to_string();
        }
        Ok(())
    }

    async fn create_category(
        &self,
        _auth: &AuthSession,
        icon: &str,
        label: &str,
    ) -> Result<Category, RemoteError> {
        let category = Category {
            id: format!("cat-{}", self.categories.lock().unwrap().len() + 1),
            icon: icon.to_string(),
            label: label.to_string(),
        };
        self.categories.lock().unwrap().push(category.clone());
        Ok(category)
    }

    async fn delete_category(&self, _auth: &AuthSession, id: &str) -> Result<(), RemoteError> {
        let mut categories = self.categories.lock().unwrap();
        let before = categories.len();
        categories.retain(|c| c.id != id);
        if categories.len() == before {
            return Err(RemoteError::NotFound);
        }
        Ok(())
    }

    async fn list_categories(&self, _auth: &AuthSession) -> Result<Vec<Category>, RemoteError> {
        Ok(self.categories.lock().unwrap().clone())
    }

    async fn update_username(
        &self,
        _auth: &AuthSession,
        _username: &str,
    ) -> Result<(), RemoteError> {
        Ok(())
    }

    async fn update_user_currency(
        &self,
        _auth: &AuthSession,
        _currency: &str,
    ) -> Result<(), RemoteError> {
        Ok(())
    }
}
