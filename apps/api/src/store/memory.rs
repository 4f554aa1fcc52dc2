//! In-process `DocumentStore` used by tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::{merge_patch, Document, DocumentStore, Filter, StoreError};

#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: Mutex<HashMap<String, Vec<Document>>>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent insert/update fail, to exercise best-effort paths.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    /// Number of successful insert + update calls.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub fn seed(&self, collection: &str, document: Document) {
        self.collections
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .push(document);
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::InvalidFilter("writes disabled".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Option<Document>, StoreError> {
        let guard = self.collections.lock().unwrap();
        Ok(guard
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| filter.matches(&d.data)).cloned()))
    }

    async fn find_many(
        &self,
        collection: &str,
        filter: &Filter,
    ) -> Result<Vec<Document>, StoreError> {
        let guard = self.collections.lock().unwrap();
        Ok(guard
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|d| filter.matches(&d.data))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn insert(&self, collection: &str, document: &Document) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut guard = self.collections.lock().unwrap();
        let docs = guard.entry(collection.to_string()).or_default();
        if docs.iter().any(|d| d.id == document.id) {
            return Err(StoreError::Conflict(collection.to_string()));
        }
        docs.push(document.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        patch: &Value,
    ) -> Result<bool, StoreError> {
        self.check_writable()?;
        let mut guard = self.collections.lock().unwrap();
        let target = guard
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| filter.matches(&d.data)));
        match target {
            Some(doc) => {
                merge_patch(&mut doc.data, patch);
                self.writes.fetch_add(1, Ordering::SeqCst);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        let mut guard = self.collections.lock().unwrap();
        let Some(docs) = guard.get_mut(collection) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|d| !filter.matches(&d.data));
        Ok((before - docs.len()) as u64)
    }

    async fn filtered_scan(
        &self,
        collection: &str,
        filter: &Filter,
        limit: usize,
    ) -> Result<Vec<Document>, StoreError> {
        let mut docs = self.find_many(collection, filter).await?;
        docs.truncate(limit);
        Ok(docs)
    }
}
