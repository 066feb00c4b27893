use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::client::{DirectoryClient, DirectoryError};

/// A session entry's parsed value: the owning node's externally reachable
/// URL and the opaque connection id on that node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLocation {
    pub node_url: String,
    pub conn_id: String,
}

/// Maps `(account, session)` to a node/connection address and owns the
/// tailgator set for that pair (§4.2). Two nodes sharing a directory MUST
/// agree on `namespace`; a mismatch silently partitions them (unchanged
/// from the spec -- this type does not attempt to detect it).
#[derive(Clone)]
pub struct SessionDirectory {
    client: Arc<dyn DirectoryClient>,
    namespace: String,
    timeout: Duration,
}

impl SessionDirectory {
    pub fn new(client: Arc<dyn DirectoryClient>, namespace: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            namespace: namespace.into(),
            timeout,
        }
    }

    fn session_key(&self, account: &str, session: &str) -> String {
        format!("{}::{}::{}", self.namespace, account, session)
    }

    fn tailgator_key(&self, account: &str, session: &str) -> String {
        format!("{}::{}::{}::pipe", self.namespace, account, session)
    }

    fn format_value(node_url: &str, conn_id: &str) -> String {
        format!("{node_url}@{conn_id}")
    }

    /// Split on the first `@`: everything before is the node URL, everything
    /// after is the opaque connection id (the value may itself contain `@`
    /// only within the connection id portion, never the node URL).
    fn parse_value(value: &str) -> Option<SessionLocation> {
        let (node_url, conn_id) = value.split_once('@')?;
        Some(SessionLocation {
            node_url: node_url.to_owned(),
            conn_id: conn_id.to_owned(),
        })
    }

    /// Register `(account, session, connId)`, returning the current
    /// tailgator list via one atomic set-with-TTL + read-set-members call.
    pub async fn register(
        &self,
        account: &str,
        session: &str,
        node_url: &str,
        conn_id: &str,
    ) -> Result<Vec<String>, DirectoryError> {
        let key = self.session_key(account, session);
        let set_key = self.tailgator_key(account, session);
        let value = Self::format_value(node_url, conn_id);
        self.client
            .put_and_members(&key, self.timeout, &value, &set_key)
            .await
            .inspect_err(|err| warn!(account, session, conn_id, %err, "session register failed"))
    }

    /// Delete the session key. `conn_id` is accepted only for diagnostic
    /// context -- the delete is keyed by `(account, session)`.
    pub async fn unregister(
        &self,
        account: &str,
        session: &str,
        _conn_id: &str,
    ) -> Result<(), DirectoryError> {
        let key = self.session_key(account, session);
        self.client
            .delete(&key)
            .await
            .inspect_err(|err| warn!(account, session, %err, "session unregister failed"))
    }

    pub async fn lookup(
        &self,
        account: &str,
        session: &str,
    ) -> Result<Option<SessionLocation>, DirectoryError> {
        let key = self.session_key(account, session);
        let value = self.client.get(&key).await?;
        Ok(value.and_then(|v| Self::parse_value(&v)))
    }

    pub async fn add_tailgator(
        &self,
        account: &str,
        session: &str,
        follower_address: &str,
    ) -> Result<(), DirectoryError> {
        let set_key = self.tailgator_key(account, session);
        self.client.add(&set_key, follower_address).await
    }
}
