use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fmt;

pub const ADMINISTRATOR_ROLE: &str = "administrator";

/// Leading numeric part of a string, exponent included (`"1e3"` is 1000).
static NUMERIC_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[ \t\n\r\x0B\x0C]*([+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?)")
        .expect("static pattern")
});

/// Numeric identifier of a host user.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl UserId {
    /// Lenient integer coercion of a loosely typed value.
    ///
    /// Follows integer casting of form values: integers, `true` (1), finite
    /// floats (truncated) and strings with a numeric prefix (`"7"`, `" 7"`,
    /// `"7abc"`, `"1e3"`, `"7.9"`). Everything else, zero and negatives
    /// included, yields `None`, which never matches a real user.
    pub fn coerce(value: &serde_json::Value) -> Option<UserId> {
        match value {
            serde_json::Value::Number(n) => match n.as_u64() {
                Some(u) => Self::positive(u),
                None => n.as_f64().and_then(Self::truncate),
            },
            serde_json::Value::Bool(true) => Some(UserId(1)),
            serde_json::Value::String(s) => Self::coerce_str(s),
            _ => None,
        }
    }

    fn coerce_str(raw: &str) -> Option<UserId> {
        let number = NUMERIC_PREFIX.captures(raw)?.get(1)?.as_str();
        match number.trim_start_matches('+').parse::<u64>() {
            Ok(u) => Self::positive(u),
            Err(_) => number.parse::<f64>().ok().and_then(Self::truncate),
        }
    }

    fn positive(id: u64) -> Option<UserId> {
        Some(id).filter(|u| *u > 0).map(UserId)
    }

    fn truncate(f: f64) -> Option<UserId> {
        Some(f)
            .filter(|f| f.is_finite() && *f >= 1.0 && *f < u64::MAX as f64)
            .map(|f| UserId(f.trunc() as u64))
    }
}

/// Deserializes an optional id through [`UserId::coerce`].
pub(crate) fn lenient_user_id<'de, D>(deserializer: D) -> std::result::Result<Option<UserId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(UserId::coerce(&raw))
}

/// The identity behind the current request.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Viewer {
    #[serde(default, deserialize_with = "lenient_user_id")]
    pub id: Option<UserId>,

    #[serde(default, deserialize_with = "lenient_roles")]
    pub roles: HashSet<String>,
}

/// Roles arrive as a list, or as an object when the host re-keyed the list.
fn lenient_roles<'de, D>(deserializer: D) -> std::result::Result<HashSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    let values: Vec<serde_json::Value> = match raw {
        serde_json::Value::Array(values) => values,
        serde_json::Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
        serde_json::Value::String(role) => vec![serde_json::Value::String(role)],
        _ => Vec::new(),
    };
    Ok(values
        .into_iter()
        .filter_map(|v| match v {
            serde_json::Value::String(role) => Some(role),
            _ => None,
        })
        .collect())
}

impl Viewer {
    pub fn new<I, S>(id: u64, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Viewer {
            id: Some(UserId(id)).filter(|u| u.0 > 0),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    pub fn is_administrator(&self) -> bool {
        self.has_role(ADMINISTRATOR_ROLE)
    }
}

impl fmt::Display for Viewer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "user {}", id),
            None => write!(f, "unidentified user"),
        }
    }
}

/// A user as returned by the host directory.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct User {
    pub id: UserId,
    #[serde(default)]
    pub display_name: String,
}
