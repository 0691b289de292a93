//! Message-key lookup. The translations themselves live outside this crate;
//! callers plug in a resolver and missing keys fall back to the raw key.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{ApiError, ApiResult};

pub trait MessageResolver: Send + Sync {
    fn lookup(&self, key: &str) -> Option<String>;
}

/// Resolver with no entries: every key renders as itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyEcho;

impl MessageResolver for KeyEcho {
    fn lookup(&self, _key: &str) -> Option<String> { None }
}

/// Flat `dotted.key -> text` table, usually loaded from a locale JSON file.
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    entries: HashMap<String, String>,
}

impl Catalog {
    pub fn new() -> Self { Self::default() }

    pub fn insert<K: Into<String>, V: Into<String>>(&mut self, key: K, text: V) {
        self.entries.insert(key.into(), text.into());
    }

    /// Nested objects are flattened: `{"snackbar": {"roomCreated": ".."}}`
    /// becomes `snackbar.roomCreated`. Non-string leaves are ignored.
    pub fn from_json(v: &Value) -> Self {
        let mut cat = Catalog::new();
        flatten_into(&mut cat.entries, "", v);
        cat
    }

    pub fn load(path: &Path) -> ApiResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ApiError::input(format!("cannot read message catalog {}: {}", path.display(), e)))?;
        let v: Value = serde_json::from_str(&text)?;
        Ok(Self::from_json(&v))
    }

    pub fn len(&self) -> usize { self.entries.len() }
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}

fn flatten_into(out: &mut HashMap<String, String>, prefix: &str, v: &Value) {
    match v {
        Value::Object(map) => {
            for (k, child) in map {
                let key = if prefix.is_empty() { k.clone() } else { format!("{}.{}", prefix, k) };
                flatten_into(out, &key, child);
            }
        }
        Value::String(s) if !prefix.is_empty() => {
            out.insert(prefix.to_string(), s.clone());
        }
        _ => {}
    }
}

impl MessageResolver for Catalog {
    fn lookup(&self, key: &str) -> Option<String> { self.entries.get(key).cloned() }
}

/// Cheap cloneable handle used by composables to render message keys.
#[derive(Clone)]
pub struct Messages {
    resolver: Arc<dyn MessageResolver>,
}

impl Messages {
    pub fn new(resolver: Arc<dyn MessageResolver>) -> Self { Self { resolver } }

    pub fn t(&self, key: &str) -> String {
        self.resolver.lookup(key).unwrap_or_else(|| key.to_string())
    }
}

impl Default for Messages {
    fn default() -> Self { Self::new(Arc::new(KeyEcho)) }
}

impl std::fmt::Debug for Messages {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Messages").finish_non_exhaustive()
    }
}
