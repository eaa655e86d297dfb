//! Conversions from page data into template [`Value`]s.

use crate::page::PageData;
use crate::probe::AssetProbeResult;
use gtmpl_value::Value;
use std::collections::HashMap;

impl From<&PageData> for Value {
    fn from(page: &PageData) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("project_id".to_owned(), page.project_id.as_str().into());
        m.insert("name".to_owned(), (&page.name).into());
        m.insert("description".to_owned(), (&page.description).into());
        m.insert("status".to_owned(), page.status.as_str().into());
        m.insert("progress".to_owned(), option_to_value(page.progress));
        m.insert("area".to_owned(), page.area.into());
        m.insert("contributors".to_owned(), option_to_value(page.contributors));
        m.insert(
            "geometry".to_owned(),
            page.geometry.as_ref().map_or(Value::Nil, from_json),
        );
        m.insert(
            "history".to_owned(),
            page.history.as_ref().map_or(Value::Nil, |h| h.into()),
        );
        m.insert(
            "downloads".to_owned(),
            Value::Array(page.downloads.iter().map(Value::from).collect()),
        );
        Value::Object(m)
    }
}

impl From<&AssetProbeResult> for Value {
    fn from(result: &AssetProbeResult) -> Value {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("name".to_owned(), result.descriptor.name.as_str().into());
        m.insert(
            "file_kind".to_owned(),
            result.descriptor.file_kind.as_str().into(),
        );
        m.insert(
            "url_template".to_owned(),
            result.descriptor.url_template.as_str().into(),
        );
        m.insert("reachable".to_owned(), result.reachable.into());
        m.insert("byte_size".to_owned(), result.byte_size.into());
        Value::Object(m)
    }
}

/// Converts arbitrary JSON (e.g., a GeoJSON geometry) into a [`Value`].
pub fn from_json(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Nil,
        serde_json::Value::Bool(b) => (*b).into(),
        serde_json::Value::Number(n) => match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => i.into(),
            (None, Some(u)) => u.into(),
            _ => n.as_f64().unwrap_or(0.0).into(),
        },
        serde_json::Value::String(s) => s.into(),
        serde_json::Value::Array(items) => Value::Array(items.iter().map(from_json).collect()),
        serde_json::Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), from_json(v)))
                .collect(),
        ),
    }
}

fn option_to_value<T: Into<Value>>(opt: Option<T>) -> Value {
    match opt {
        Some(v) => v.into(),
        None => Value::Nil,
    }
}
