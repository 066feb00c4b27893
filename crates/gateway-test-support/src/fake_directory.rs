// FakeDirectoryClient: an in-memory stand-in for the shared KV store,
// honoring TTL expiry so cross-node tests can exercise the directory
// without a running redis instance.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use gateway_directory::{DirectoryClient, DirectoryError};

struct Entry {
    value: String,
    expires_at: Instant,
}

#[derive(Default)]
pub struct FakeDirectoryClient {
    values: Mutex<HashMap<String, Entry>>,
    sets: Mutex<HashMap<String, HashSet<String>>>,
}

impl FakeDirectoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force an entry to appear expired, for TTL tests that would
    /// otherwise need to sleep out a real timeout.
    pub fn expire_now(&self, key: &str) {
        if let Some(entry) = self.values.lock().unwrap().get_mut(key) {
            entry.expires_at = Instant::now() - Duration::from_millis(1);
        }
    }
}

#[async_trait]
impl DirectoryClient for FakeDirectoryClient {
    async fn put(&self, key: &str, ttl: Duration, value: &str) -> Result<(), DirectoryError> {
        self.values.lock().unwrap().insert(
            key.to_owned(),
            Entry {
                value: value.to_owned(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, DirectoryError> {
        let mut values = self.values.lock().unwrap();
        match values.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                values.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), DirectoryError> {
        self.values.lock().unwrap().remove(key);
        Ok(())
    }

    async fn add(&self, set_key: &str, member: &str) -> Result<(), DirectoryError> {
        self.sets
            .lock()
            .unwrap()
            .entry(set_key.to_owned())
            .or_default()
            .insert(member.to_owned());
        Ok(())
    }

    async fn members(&self, set_key: &str) -> Result<Vec<String>, DirectoryError> {
        Ok(self
            .sets
            .lock()
            .unwrap()
            .get(set_key)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .collect())
    }

    async fn put_and_members(
        &self,
        key: &str,
        ttl: Duration,
        value: &str,
        set_key: &str,
    ) -> Result<Vec<String>, DirectoryError> {
        self.put(key, ttl, value).await?;
        self.members(set_key).await
    }
}
