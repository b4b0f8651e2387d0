use serde_json::Value;
use uuid::Uuid;

use crate::store::OrderStore;

/// Writes an audit row. Failures are logged and never reach the caller.
pub async fn log_audit(
    store: &dyn OrderStore,
    user_id: Option<Uuid>,
    action: &str,
    resource: Option<&str>,
    metadata: Option<Value>,
) {
    if let Err(err) = store.log_audit(user_id, action, resource, metadata).await {
        tracing::warn!(error = %err, action, "audit log failed");
    }
}
