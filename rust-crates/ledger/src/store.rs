pub mod in_memory_store;
pub mod sled_store;

pub use in_memory_store::InMemoryKeyValueStore;
pub use sled_store::SledKeyValueStore;

/// String-keyed store of JSON documents, the same contract a browser's local
/// storage offers. Writes replace the whole value; there is no locking.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> crate::Result<Option<String>>;

    /// write or overwrite the value at `key`
    fn set(&mut self, key: &str, value: &str) -> crate::Result<()>;

    fn remove(&mut self, key: &str) -> crate::Result<()>;

    /// all keys starting with `prefix`, in ascending order
    fn keys_with_prefix(&self, prefix: &str) -> crate::Result<Vec<String>>;
}
