use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::ws::Message;
use serde_json::Value;
use tokio::sync::{mpsc, RwLock};

use crate::codec::Codec;

pub type ConnId = String;

/// A locally-attached client connection (§3's "Local connection record").
/// Exclusively owned by `ConnectionManager`; `tail` is a plain per-instance
/// field, never shared across connections (Design Note: "`tail` on the
/// connection object").
pub struct Connection {
    pub id: ConnId,
    pub account: String,
    pub session: String,
    tail: RwLock<Vec<String>>,
    sender: mpsc::UnboundedSender<Message>,
}

impl Connection {
    pub async fn tail(&self) -> Vec<String> {
        self.tail.read().await.clone()
    }

    pub async fn set_tail(&self, tail: Vec<String>) {
        *self.tail.write().await = tail;
    }

    /// Append addresses not already present, preserving order -- used by
    /// the inbound broadcast handler's "tail" dispatch and by
    /// `SessionDirectory::add_tailgator`'s local mirror.
    pub async fn append_tail(&self, addrs: &[String]) {
        let mut tail = self.tail.write().await;
        for addr in addrs {
            if !tail.contains(addr) {
                tail.push(addr.clone());
            }
        }
    }

    pub fn send_raw(&self, text: String) -> bool {
        self.sender.send(Message::Text(text.into())).is_ok()
    }
}

/// Owns the set of locally-attached connections, indexed both by
/// connection id and by `(account, session)` (Design Note: "Connection
/// registry indexed two ways" -- one owner, two intrusive lookup
/// structures, mutated together).
pub struct ConnectionManager {
    codec: Arc<dyn Codec>,
    by_id: RwLock<HashMap<ConnId, Arc<Connection>>>,
    by_session: RwLock<HashMap<(String, String), ConnId>>,
}

impl ConnectionManager {
    pub fn new(codec: Arc<dyn Codec>) -> Self {
        Self {
            codec,
            by_id: RwLock::new(HashMap::new()),
            by_session: RwLock::new(HashMap::new()),
        }
    }

    pub fn codec(&self) -> &Arc<dyn Codec> {
        &self.codec
    }

    pub async fn open(
        &self,
        id: ConnId,
        account: String,
        session: String,
        sender: mpsc::UnboundedSender<Message>,
    ) -> Arc<Connection> {
        let conn = Arc::new(Connection {
            id: id.clone(),
            account: account.clone(),
            session: session.clone(),
            tail: RwLock::new(Vec::new()),
            sender,
        });
        self.by_id.write().await.insert(id.clone(), conn.clone());
        self.by_session
            .write()
            .await
            .insert((account, session), id);
        conn
    }

    /// Removes the connection from both indexes in one fixed order
    /// (`by_id` then `by_session`), returning the removed record so the
    /// caller can run Session Directory `unregister`.
    pub async fn close(&self, id: &str) -> Option<Arc<Connection>> {
        let conn = self.by_id.write().await.remove(id)?;
        self.by_session
            .write()
            .await
            .remove(&(conn.account.clone(), conn.session.clone()));
        Some(conn)
    }

    pub async fn get(&self, id: &str) -> Option<Arc<Connection>> {
        self.by_id.read().await.get(id).cloned()
    }

    pub async fn get_by_session(&self, account: &str, session: &str) -> Option<Arc<Connection>> {
        let id = self
            .by_session
            .read()
            .await
            .get(&(account.to_owned(), session.to_owned()))
            .cloned()?;
        self.get(&id).await
    }

    /// All currently-attached connections for `account`, for admin/testing
    /// introspection where the caller doesn't know the session id up front.
    pub async fn all_for_account(&self, account: &str) -> Vec<Arc<Connection>> {
        self.by_id
            .read()
            .await
            .values()
            .filter(|conn| conn.account == account)
            .cloned()
            .collect()
    }

    /// Deliver `message` to the local connection `id`, encoding it through
    /// the configured codec first.
    pub async fn deliver_message(&self, id: &str, message: &Value) -> bool {
        let Some(conn) = self.get(id).await else {
            return false;
        };
        match self.codec.encode(message) {
            Ok(text) => conn.send_raw(text),
            Err(_) => false,
        }
    }
}
