//! Catalog loading: the newline-delimited JSON task list and lazy attachment
//! fetches.
//!
//! The catalog itself is hard-fail (a bad fetch or a bad line aborts with a
//! line-numbered error). Attachments are soft-fail: a failed fetch substitutes
//! a visible placeholder string so the review can continue without the file.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;

use gaiabench_store::ObjectStore;
use gaiabench_types::TaskRecord;

pub const CATALOG_FILE: &str = "metadata.jsonl";

#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn load(&self) -> Result<Vec<TaskRecord>>;
}

/// Reads `<prefix>/metadata.jsonl` from the object store.
pub struct StoreCatalogSource {
    store: Arc<ObjectStore>,
}

impl StoreCatalogSource {
    pub fn new(store: Arc<ObjectStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CatalogSource for StoreCatalogSource {
    async fn load(&self) -> Result<Vec<TaskRecord>> {
        let key = self.store.key(CATALOG_FILE);
        let content = self
            .store
            .get_text(&key)
            .await
            .with_context(|| format!("failed to fetch catalog '{key}'"))?;
        parse_catalog(&content)
    }
}

/// Local JSONL file, for offline runs and tests.
pub struct JsonlFileSource {
    path: PathBuf,
}

impl JsonlFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CatalogSource for JsonlFileSource {
    async fn load(&self) -> Result<Vec<TaskRecord>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read {:?}", self.path))?;
        parse_catalog(&content)
    }
}

fn parse_catalog(content: &str) -> Result<Vec<TaskRecord>> {
    let mut records = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: TaskRecord = serde_json::from_str(line)
            .with_context(|| format!("invalid JSON on line {}", idx + 1))?;
        records.push(record);
    }
    Ok(records)
}

/// Ordered, read-only collection of tasks with an id index.
pub struct Catalog {
    tasks: Vec<TaskRecord>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub async fn load(source: &dyn CatalogSource) -> Result<Self> {
        Ok(Self::from_records(source.load().await?))
    }

    pub fn from_records(tasks: Vec<TaskRecord>) -> Self {
        let index = tasks
            .iter()
            .enumerate()
            .map(|(i, task)| (task.task_id.clone(), i))
            .collect();
        Self { tasks, index }
    }

    pub fn get(&self, task_id: &str) -> Option<&TaskRecord> {
        self.index.get(task_id).map(|&i| &self.tasks[i])
    }

    pub fn contains(&self, task_id: &str) -> bool {
        self.index.contains_key(task_id)
    }

    pub fn tasks(&self) -> &[TaskRecord] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Fetch an attachment's content, substituting a visible placeholder on any
/// failure. Called lazily, only for the currently selected task.
pub async fn fetch_attachment(store: &ObjectStore, file_name: &str) -> String {
    let key = store.key(file_name);
    match store.get_text(&key).await {
        Ok(content) => content,
        Err(err) => format!("Failed to load file: {err}"),
    }
}
