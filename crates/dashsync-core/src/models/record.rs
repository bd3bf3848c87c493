//! User-authored records (projects and team members).

use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[cfg(feature = "ts")]
use ts_rs::TS;

/// Length of the random part of a generated id.
const ID_SUFFIX_LEN: usize = 10;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// A record collection. Each has a per-id durable collection and a
/// denormalized list in the fast tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Projects,
    Team,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::Projects, Collection::Team];

    /// Fast-tier key holding the denormalized list.
    pub fn list_key(&self) -> &'static str {
        match self {
            Collection::Projects => "projectsList",
            Collection::Team => "teamList",
        }
    }

    /// Durable-tier collection holding one record per id.
    pub fn durable_name(&self) -> &'static str {
        match self {
            Collection::Projects => "projectsData",
            Collection::Team => "teamData",
        }
    }

}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("Unknown collection '{0}' (expected projects or team)")]
pub struct UnknownCollection(pub String);

impl FromStr for Collection {
    type Err = UnknownCollection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "projects" => Ok(Collection::Projects),
            "team" => Ok(Collection::Team),
            other => Err(UnknownCollection(other.to_string())),
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collection::Projects => write!(f, "projects"),
            Collection::Team => write!(f, "team"),
        }
    }
}

/// A stored record: an id, a write timestamp and arbitrary caller fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(TS))]
pub struct Record {
    pub id: String,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// Build a record from caller fields.
    ///
    /// A non-empty string `id` field is kept; otherwise a new id is generated.
    /// Any incoming `updatedAt` is replaced with the current time.
    pub fn from_fields(mut fields: Map<String, Value>) -> Self {
        let id = match fields.remove("id") {
            Some(Value::String(id)) if !id.is_empty() => id,
            _ => generate_id(),
        };
        fields.remove("updatedAt");

        Self {
            id,
            updated_at: Utc::now(),
            fields,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }
}

/// Generate a record id: the current time in milliseconds in base 36,
/// followed by a random base-36 suffix.
pub fn generate_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();

    let mut id = to_base36(millis);
    let mut rng = rand::thread_rng();
    for _ in 0..ID_SUFFIX_LEN {
        id.push(BASE36[rng.gen_range(0..BASE36.len())] as char);
    }
    id
}

fn to_base36(mut n: u128) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE36[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("test fields must be an object")
    }

    #[test]
    fn test_to_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }

    #[test]
    fn test_generate_id_unique() {
        let a = generate_id();
        let b = generate_id();
        assert_ne!(a, b);
        assert!(a.len() > ID_SUFFIX_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_from_fields_assigns_id() {
        let record = Record::from_fields(fields(json!({"title": "X"})));
        assert!(!record.id.is_empty());
        assert_eq!(record.get_str("title"), Some("X"));
        assert!(record.get("id").is_none());
    }

    #[test]
    fn test_from_fields_keeps_existing_id() {
        let record = Record::from_fields(fields(json!({
            "id": "abc",
            "updatedAt": "2020-01-01T00:00:00Z",
            "name": "Ana"
        })));
        assert_eq!(record.id, "abc");
        assert!(record.get("updatedAt").is_none());
        assert!(record.updated_at > "2021-01-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap());
    }

    #[test]
    fn test_record_serializes_flat() {
        let record = Record::from_fields(fields(json!({"id": "p1", "title": "X"})));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], "p1");
        assert_eq!(json["title"], "X");
        assert!(json.get("updatedAt").is_some());

        let back: Record = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_collection_names() {
        assert_eq!("projects".parse::<Collection>(), Ok(Collection::Projects));
        assert_eq!(
            "nope".parse::<Collection>(),
            Err(UnknownCollection("nope".to_string()))
        );
        assert_eq!(Collection::Team.list_key(), "teamList");
        assert_eq!(Collection::Team.to_string(), "team");
    }
}
