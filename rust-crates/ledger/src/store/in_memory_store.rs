use crate::store::KeyValueStore;
use anyhow::anyhow;
use std::{
    collections::BTreeMap,
    sync::{
        Arc,
        Mutex,
    },
};

/// Clones share the same map, so a test can hand one copy to the ledger and
/// inspect or corrupt entries through another.
#[derive(Clone, Default)]
pub struct InMemoryKeyValueStore {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Arc<Mutex<BTreeMap<String, String>>> {
        self.entries.clone()
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get(&self, key: &str) -> crate::Result<Option<String>> {
        let guard = self
            .entries
            .lock()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))?;
        Ok(guard.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> crate::Result<()> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))?;
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> crate::Result<()> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))?;
        guard.remove(key);
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> crate::Result<Vec<String>> {
        let guard = self
            .entries
            .lock()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))?;
        Ok(guard
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect())
    }
}
