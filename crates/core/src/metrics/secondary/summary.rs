use super::{Field, LocalFundamentals};
use crate::cascade::{first_some, Strategy};
use crate::normalize::number;
use serde_json::{Map, Value};
use std::collections::HashMap;

// Lists of `{code|key, value}` entries; the integration endpoint uses `totalInfos`.
const INFO_LISTS: [&str; 2] = ["totalInfos", "infos"];

/// Reads the summary payload. A body that is not a JSON object yields no fields.
///
/// Two shapes are accepted: flat keys (`{"per": "13.53", ...}`, any case) and
/// entry lists (`{"totalInfos": [{"code": "per", "value": "13.53배"}, ...]}`).
pub fn parse(body: &str) -> LocalFundamentals {
    let root = match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(root)) => root,
        Ok(_) => {
            tracing::debug!("summary payload is not an object");
            return LocalFundamentals::default();
        }
        Err(err) => {
            tracing::debug!(error = %err, "summary payload is not JSON");
            return LocalFundamentals::default();
        }
    };

    let flat = lowercase_keys(&root);
    let listed = info_entries(&root);

    let mut out = LocalFundamentals::default();
    for field in Field::ALL {
        let key = field.key();
        let value = first_some(
            key,
            &[
                Strategy::new("flat", || flat.get(key).and_then(|v| number(v))),
                Strategy::new("info_list", || listed.get(key).copied()),
            ],
        );
        out.set(field, value);
    }
    out
}

fn lowercase_keys(root: &Map<String, Value>) -> HashMap<String, &Value> {
    let mut out = HashMap::new();
    for (k, v) in root {
        out.entry(k.to_ascii_lowercase()).or_insert(v);
    }
    out
}

fn info_entries(root: &Map<String, Value>) -> HashMap<String, f64> {
    let mut out = HashMap::new();
    let entries = INFO_LISTS
        .iter()
        .filter_map(|name| root.get(*name).and_then(Value::as_array))
        .flatten();

    for entry in entries {
        let Some(code) = entry
            .get("code")
            .or_else(|| entry.get("key"))
            .and_then(Value::as_str)
        else {
            continue;
        };
        if let Some(value) = entry.get("value").and_then(number) {
            out.entry(code.trim().to_ascii_lowercase()).or_insert(value);
        }
    }
    out
}
