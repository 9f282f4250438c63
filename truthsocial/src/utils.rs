use std::cmp::Ordering;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Str(String),
    Num(u64),
}

impl From<RawId> for String {
    fn from(id: RawId) -> Self {
        match id {
            RawId::Str(s) => s,
            RawId::Num(n) => n.to_string(),
        }
    }
}

/// Ids are sent as strings by the API but as numbers by some older endpoints
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let id = Option::<RawId>::deserialize(deserializer)?;
    Ok(id.map(String::from))
}

/// RFC 3339 timestamp, anything unparseable is treated as missing
pub(crate) fn deserialize_timestamp<'de, D>(
    deserializer: D,
) -> Result<Option<OffsetDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|s| OffsetDateTime::parse(s, &Rfc3339).ok()))
}

/// Extract the `id` field of a raw JSON object
pub(crate) fn value_id(value: &Value) -> Option<String> {
    match value.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Order snowflake-style ids numerically without parsing them
pub(crate) fn compare_ids(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Truthiness of a JSON value, empty containers and zero are false
pub(crate) fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

/// Accept either a bare post id or a post URL
pub(crate) fn post_id(post: &str) -> &str {
    post.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(post)
}


#[cfg(test)]
pub(crate) fn test_client(server_uri: &str) -> crate::TruthSocialClient {
    let mut config = crate::ClientConfig::new("test_bearer_token");
    config.base_url = server_uri.to_owned();
    crate::TruthSocialClient::from_config(config).unwrap()
}
