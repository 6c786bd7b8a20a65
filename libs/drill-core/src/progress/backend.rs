//! Storage seam for serialized progress records.

use crate::error::BackendError;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Key/value storage for serialized progress records, one per learner.
pub trait ProgressBackend {
    fn read(&self, key: &str) -> Result<Option<String>, BackendError>;
    fn write(&self, key: &str, payload: &str) -> Result<(), BackendError>;
    fn remove(&self, key: &str) -> Result<(), BackendError>;
}

/// In-process backend, for tests and for running without a database.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    records: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored payload for `key`, as written.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Seed a payload directly, bypassing the store.
    pub fn insert_raw(&self, key: &str, payload: &str) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), payload.to_string());
    }
}

impl ProgressBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>, BackendError> {
        Ok(self.raw(key))
    }

    fn write(&self, key: &str, payload: &str) -> Result<(), BackendError> {
        self.insert_raw(key, payload);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), BackendError> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}
