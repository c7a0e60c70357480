//! Persisted popup arguments.
//!
//! Each popup is bound to a named variable. "Set" writes a transient
//! override that lasts for the process; "save" also writes the JSON file.

use crate::args::PersistedValue;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Durability {
    Transient,
    Durable,
}

pub trait ArgStore {
    fn read(&self, variable: &str) -> Option<PersistedValue>;
    fn write(&mut self, variable: &str, value: PersistedValue, durability: Durability) -> Result<()>;
    /// Forget `variable` entirely, in memory and on disk.
    fn clear(&mut self, variable: &str) -> Result<()>;
}

/// Store without a backing file; `Durable` writes only live in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    saved: BTreeMap<String, PersistedValue>,
    overrides: BTreeMap<String, PersistedValue>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value that would survive a restart.
    pub fn saved(&self, variable: &str) -> Option<&PersistedValue> {
        self.saved.get(variable)
    }
}

impl ArgStore for MemoryStore {
    fn read(&self, variable: &str) -> Option<PersistedValue> {
        self.overrides
            .get(variable)
            .or_else(|| self.saved.get(variable))
            .cloned()
    }

    fn write(&mut self, variable: &str, value: PersistedValue, durability: Durability) -> Result<()> {
        if durability == Durability::Durable {
            self.saved.insert(variable.to_string(), value.clone());
        }
        self.overrides.insert(variable.to_string(), value);
        Ok(())
    }

    fn clear(&mut self, variable: &str) -> Result<()> {
        self.saved.remove(variable);
        self.overrides.remove(variable);
        Ok(())
    }
}

/// Store backed by a JSON document mapping variable names to values.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    inner: MemoryStore,
}

impl FileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let saved = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("reading arguments from {}", path.display()))?;
            if contents.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&contents)
                    .with_context(|| format!("parsing arguments in {}", path.display()))?
            }
        } else {
            BTreeMap::new()
        };
        debug!(path = %path.display(), variables = saved.len(), "argument store opened");
        Ok(Self {
            path,
            inner: MemoryStore {
                saved,
                overrides: BTreeMap::new(),
            },
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `saved` to disk. Callers commit it to memory only on success.
    fn flush(&self, saved: &BTreeMap<String, PersistedValue>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut json = serde_json::to_string_pretty(saved).context("serializing arguments")?;
        json.push('\n');
        std::fs::write(&self.path, json)
            .with_context(|| format!("writing arguments to {}", self.path.display()))
    }
}

impl ArgStore for FileStore {
    fn read(&self, variable: &str) -> Option<PersistedValue> {
        self.inner.read(variable)
    }

    fn write(&mut self, variable: &str, value: PersistedValue, durability: Durability) -> Result<()> {
        if durability == Durability::Durable {
            let mut saved = self.inner.saved.clone();
            saved.insert(variable.to_string(), value.clone());
            self.flush(&saved)?;
            self.inner.saved = saved;
            info!(variable, path = %self.path.display(), "arguments saved");
        }
        self.inner.overrides.insert(variable.to_string(), value);
        Ok(())
    }

    fn clear(&mut self, variable: &str) -> Result<()> {
        let mut saved = self.inner.saved.clone();
        saved.remove(variable);
        self.flush(&saved)?;
        self.inner.saved = saved;
        self.inner.overrides.remove(variable);
        Ok(())
    }
}
