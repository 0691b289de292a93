use serde::Serialize;
use serde_json::Value;

use crate::error::ApiResult;

/// Query-string builder that drops absent and empty values, so optional
/// filters never reach the service as `key=`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self { Self::default() }

    pub fn push<K: Into<String>, V: ToString>(mut self, key: K, value: V) -> Self {
        let v = value.to_string();
        if !v.is_empty() {
            self.pairs.push((key.into(), v));
        }
        self
    }

    pub fn push_opt<K: Into<String>, V: ToString>(self, key: K, value: Option<V>) -> Self {
        match value {
            Some(v) => self.push(key, v),
            None => self,
        }
    }

    /// Flatten a struct's top-level fields. Nulls and empty strings are skipped,
    /// arrays repeat the key.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> ApiResult<Self> {
        let mut out = QueryParams::new();
        if let Value::Object(map) = serde_json::to_value(value)? {
            for (k, v) in map {
                out.push_value(&k, &v);
            }
        }
        Ok(out)
    }

    fn push_value(&mut self, key: &str, v: &Value) {
        match v {
            Value::Null => {}
            Value::String(s) if s.is_empty() => {}
            Value::String(s) => self.pairs.push((key.to_string(), s.clone())),
            Value::Array(items) => {
                for it in items {
                    self.push_value(key, it);
                }
            }
            other => self.pairs.push((key.to_string(), other.to_string())),
        }
    }

    pub fn is_empty(&self) -> bool { self.pairs.is_empty() }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn into_pairs(self) -> Vec<(String, String)> { self.pairs }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter().fold(QueryParams::new(), |q, (k, v)| q.push(k, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Filter {
        student_name: Option<String>,
        room_number: String,
        status: Option<String>,
        skip: u32,
        limit: Option<u32>,
        ids: Vec<u8>,
    }

    #[test]
    fn drops_empty_values() {
        let q = QueryParams::new().push("skip", 0).push("q", "").push_opt::<_, u32>("limit", None).push("status", "pending");
        assert_eq!(q.clone().into_pairs(), vec![("skip".to_string(), "0".to_string()), ("status".to_string(), "pending".to_string())]);
        assert_eq!(q.get("status"), Some("pending"));
    }

    #[test]
    fn flattens_struct_fields() {
        let f = Filter {
            student_name: Some("Lin".into()),
            room_number: String::new(),
            status: None,
            skip: 20,
            limit: Some(10),
            ids: vec![1, 2],
        };
        let q = QueryParams::from_serialize(&f).unwrap();
        assert_eq!(q.get("student_name"), Some("Lin"));
        assert_eq!(q.get("room_number"), None);
        assert_eq!(q.get("status"), None);
        assert_eq!(q.get("skip"), Some("20"));
        assert_eq!(q.get("limit"), Some("10"));
        let ids: Vec<_> = q.into_pairs().into_iter().filter(|(k, _)| k == "ids").map(|(_, v)| v).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }
}
