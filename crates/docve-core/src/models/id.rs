//! Identifier helpers. The service returns ids as numbers on some endpoints
//! and strings on others; both are kept as strings client-side. Also holds
//! the merge helper for fields that arrive under more than one name.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Str(String),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Int(n) => n.to_string(),
            RawId::Str(s) => s,
        }
    }
}

pub fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(String::from)
}

pub fn deserialize_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<RawId>::deserialize(deserializer).map(|raw| raw.map(String::from))
}

/// First value that is present and not blank. Used to merge the alternate
/// spellings a record may carry for one field.
pub fn first_non_empty<const N: usize>(values: [Option<String>; N]) -> Option<String> {
    values
        .into_iter()
        .flatten()
        .find(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Holder {
        #[serde(deserialize_with = "deserialize_id")]
        id: String,
        #[serde(default, deserialize_with = "deserialize_opt_id")]
        parent: Option<String>,
    }

    #[test]
    fn test_ids_accept_numbers_and_strings() {
        let h: Holder = serde_json::from_str(r#"{"id": 12, "parent": "a-b"}"#).unwrap();
        assert_eq!(h.id, "12");
        assert_eq!(h.parent.as_deref(), Some("a-b"));

        let h: Holder = serde_json::from_str(r#"{"id": "x"}"#).unwrap();
        assert_eq!(h.id, "x");
        assert_eq!(h.parent, None);

        let h: Holder = serde_json::from_str(r#"{"id": "x", "parent": null}"#).unwrap();
        assert_eq!(h.parent, None);
    }
}
