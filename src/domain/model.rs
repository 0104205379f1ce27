use crate::utils::error::{ContactError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

pub const UNKNOWN_AGE: &str = "Unknown";

/// A contact's age as reported by the API.
///
/// The API sends either a number or the literal `"Unknown"`. Anything else
/// is kept verbatim as `Invalid` so transforms that need a numeric age can
/// report it instead of failing the whole fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum Age {
    Years(u32),
    Unknown,
    Invalid(Value),
}

impl Age {
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Number(n) => {
                if let Some(years) = n.as_u64().and_then(|v| u32::try_from(v).ok()) {
                    return Age::Years(years);
                }
                match n.as_f64() {
                    Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 => {
                        Age::Years(f as u32)
                    }
                    _ => Age::Invalid(value.clone()),
                }
            }
            Value::String(s) if s == UNKNOWN_AGE => Age::Unknown,
            Value::String(s) => match s.trim().parse::<u32>() {
                Ok(years) => Age::Years(years),
                Err(_) => Age::Invalid(value.clone()),
            },
            other => Age::Invalid(other.clone()),
        }
    }

    pub fn years(&self) -> Option<u32> {
        match self {
            Age::Years(years) => Some(*years),
            _ => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Age::Unknown)
    }
}

impl fmt::Display for Age {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Age::Years(years) => write!(f, "{}", years),
            Age::Unknown => f.write_str(UNKNOWN_AGE),
            Age::Invalid(raw) => write!(f, "{}", raw),
        }
    }
}

impl Serialize for Age {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Age::Years(years) => serializer.serialize_u32(*years),
            Age::Unknown => serializer.serialize_str(UNKNOWN_AGE),
            Age::Invalid(raw) => raw.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Age {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Age::from_json(&value))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub first_name: String,
    pub last_name: String,
    pub title: String,
    pub status: String,
    pub age: Age,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub powers: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abilities: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_year: Option<String>,
    /// Fields the API sends that this crate does not model. Round-tripped untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Contact {
    pub fn new(first_name: &str, last_name: &str, title: &str) -> Self {
        Self {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            title: title.to_string(),
            status: String::new(),
            age: Age::Unknown,
            location: String::new(),
            powers: None,
            abilities: None,
            birth_year: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn with_status(mut self, status: &str) -> Self {
        self.status = status.to_string();
        self
    }

    pub fn with_age(mut self, age: Age) -> Self {
        self.age = age;
        self
    }

    pub fn with_location(mut self, location: &str) -> Self {
        self.location = location.to_string();
        self
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Optional server-side constraint for `ContactStore::list_contacts`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactFilter {
    pub status: Option<String>,
}

impl ContactFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_status(status: &str) -> Self {
        Self {
            status: Some(status.to_string()),
        }
    }

    pub fn matches(&self, contact: &Contact) -> bool {
        self.status
            .as_deref()
            .map_or(true, |status| contact.status == status)
    }
}

/// The operation a pipeline cycle runs. Also sent to the API as the `test_case` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Connect,
    Heist,
    Powers,
    Birthdays,
    Sorting,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::Connect,
        Operation::Heist,
        Operation::Powers,
        Operation::Birthdays,
        Operation::Sorting,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            Operation::Connect => "connect",
            Operation::Heist => "heist",
            Operation::Powers => "powers",
            Operation::Birthdays => "birthdays",
            Operation::Sorting => "sorting",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Operation {
    type Err = ContactError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Operation::ALL
            .into_iter()
            .find(|op| op.tag() == wanted)
            .ok_or_else(|| ContactError::InvalidConfigValue {
                field: "operation".to_string(),
                value: s.to_string(),
                reason: "Expected one of: connect, heist, powers, birthdays, sorting".to_string(),
            })
    }
}

/// Headers that authorize one operation against the contacts API.
///
/// The pipeline never looks inside; it hands the bundle to the store as is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub operation: Operation,
    pub headers: HashMap<String, String>,
}

impl AuthContext {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            headers: HashMap::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn bearer_token(&self) -> Option<&str> {
        self.header("Authorization")
            .and_then(|value| value.strip_prefix("Bearer "))
    }
}
