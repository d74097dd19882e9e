// Sled-backed key-value store used as the on-disk ledger.
use crate::store::KeyValueStore;
use anyhow::Context;
use sled::{
    Config,
    Db,
    Tree,
};
use std::path::Path;

const LEDGER_TREE: &str = "arena_ledger";

#[derive(Clone)]
pub struct SledKeyValueStore {
    tree: Tree,
}

impl SledKeyValueStore {
    pub fn new(db: &Db) -> crate::Result<Self> {
        let tree = db
            .open_tree(LEDGER_TREE)
            .context("open arena_ledger tree")?;
        Ok(Self { tree })
    }

    pub fn open<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let config = Config::default().path(path);
        let db = config.open().context("open sled database")?;
        Self::new(&db)
    }

    fn decode(bytes: &[u8], key: &str) -> crate::Result<String> {
        String::from_utf8(bytes.to_vec())
            .with_context(|| format!("value at {key} is not valid UTF-8"))
    }
}

impl KeyValueStore for SledKeyValueStore {
    fn get(&self, key: &str) -> crate::Result<Option<String>> {
        let value = self
            .tree
            .get(key.as_bytes())
            .with_context(|| format!("read {key}"))?;
        value.map(|bytes| Self::decode(&bytes, key)).transpose()
    }

    fn set(&mut self, key: &str, value: &str) -> crate::Result<()> {
        self.tree
            .insert(key.as_bytes(), value.as_bytes())
            .with_context(|| format!("write {key}"))?;
        self.tree.flush().with_context(|| format!("flush {key}"))?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> crate::Result<()> {
        self.tree
            .remove(key.as_bytes())
            .with_context(|| format!("remove {key}"))?;
        self.tree.flush().with_context(|| format!("flush {key}"))?;
        Ok(())
    }

    fn keys_with_prefix(&self, prefix: &str) -> crate::Result<Vec<String>> {
        let mut keys = Vec::new();
        for entry in self.tree.scan_prefix(prefix.as_bytes()) {
            let (key, _) = entry.with_context(|| format!("scan keys under {prefix}"))?;
            keys.push(Self::decode(&key, prefix)?);
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use tempdir::TempDir;

    fn sled_db(temp_dir: &TempDir) -> Db {
        Config::default()
            .path(temp_dir.path())
            .open()
            .expect("open sled db")
    }

    #[test]
    fn sut__when_value_written_then_get_returns_it() {
        // given
        let temp_dir = TempDir::new("sled_ledger_store").unwrap();
        let db = sled_db(&temp_dir);
        let mut store = SledKeyValueStore::new(&db).unwrap();
        assert!(store.get("gameHistory").unwrap().is_none());

        // when
        store.set("gameHistory", "[]").unwrap();
        store.set("gameHistory", "[{}]").unwrap();

        // then
        assert_eq!(store.get("gameHistory").unwrap().as_deref(), Some("[{}]"));
    }

    #[test]
    fn sut__when_value_removed_then_get_returns_none() {
        // given
        let temp_dir = TempDir::new("sled_ledger_remove").unwrap();
        let db = sled_db(&temp_dir);
        let mut store = SledKeyValueStore::new(&db).unwrap();
        store.set("userBets", "[]").unwrap();

        // when
        store.remove("userBets").unwrap();

        // then
        assert!(store.get("userBets").unwrap().is_none());
    }

    #[test]
    fn keys_with_prefix__scans_only_bet_lists() {
        // given
        let temp_dir = TempDir::new("sled_ledger_prefix").unwrap();
        let db = sled_db(&temp_dir);
        let mut store = SledKeyValueStore::new(&db).unwrap();
        store.set("bets_0x02", "[]").unwrap();
        store.set("bets_0x01", "[]").unwrap();
        store.set("gameHistory", "[]").unwrap();

        // when
        let keys = store.keys_with_prefix("bets_").unwrap();

        // then
        assert_eq!(keys, vec!["bets_0x01".to_string(), "bets_0x02".to_string()]);
    }
}
