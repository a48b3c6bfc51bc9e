use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::AuthSession;

/// Shared handle to the (optional) authenticated session. The store, sync
/// worker, and gateway all read through the same handle, so a sign-out is
/// observed everywhere immediately.
pub type SessionHandle = Arc<RwLock<Option<AuthSession>>>;

pub fn unauthenticated() -> SessionHandle {
    Arc::new(RwLock::new(None))
}

pub fn authenticated(session: AuthSession) -> SessionHandle {
    Arc::new(RwLock::new(Some(session)))
}

pub async fn sign_in(handle: &SessionHandle, session: AuthSession) {
    *handle.write().await = Some(session);
}

pub async fn sign_out(handle: &SessionHandle) {
    *handle.write().await = None;
}

pub async fn current(handle: &SessionHandle) -> Option<AuthSession> {
    handle.read().await.clone()
}
