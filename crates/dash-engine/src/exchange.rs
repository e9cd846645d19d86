//! JSON export and import of categories.
//!
//! The exchange document is a JSON object keyed by category (`"ACQUISITION"`,
//! ...), each value holding the persisted category shape. Imports also accept
//! the persisted state document, which nests the same map under `categories`.

use std::collections::BTreeMap;

use dash_model::CategoryKey;

use crate::category::CategorySnapshot;
use crate::dashboard::Dashboard;
use crate::error::{EngineError, Result};

/// Pretty-printed JSON for `keys`, or for every category when `keys` is `None`.
pub fn export_json(dashboard: &Dashboard, keys: Option<&[CategoryKey]>) -> Result<String> {
    let document: BTreeMap<CategoryKey, CategorySnapshot> = dashboard
        .categories()
        .filter(|category| keys.is_none_or(|keys| keys.contains(&category.key())))
        .map(|category| (category.key(), category.snapshot()))
        .collect();
    tracing::debug!(categories = document.len(), "exporting categories");
    Ok(serde_json::to_string_pretty(&document)?)
}

/// Replaces every category named in `text` wholesale.
///
/// Unknown top-level keys are ignored. The import is all or nothing: if any
/// named category fails to decode, the dashboard is left unchanged. Returns the
/// imported keys in taxonomy order.
pub fn import_json(dashboard: &mut Dashboard, text: &str) -> Result<Vec<CategoryKey>> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    let object = value
        .as_object()
        .ok_or_else(|| EngineError::InvalidImport {
            message: "expected a JSON object keyed by category".to_string(),
        })?;
    let object = match object.get("categories").and_then(serde_json::Value::as_object) {
        Some(nested) if !object.keys().any(|name| name.parse::<CategoryKey>().is_ok()) => nested,
        _ => object,
    };

    let mut decoded = BTreeMap::new();
    for (name, entry) in object {
        let Ok(key) = name.parse::<CategoryKey>() else {
            tracing::debug!(key = %name, "ignoring unknown import key");
            continue;
        };
        let snapshot: CategorySnapshot =
            serde_json::from_value(entry.clone()).map_err(|e| EngineError::InvalidImport {
                message: format!("{key}: {e}"),
            })?;
        decoded.insert(key, snapshot);
    }

    let keys: Vec<CategoryKey> = decoded.keys().copied().collect();
    for (key, snapshot) in decoded {
        dashboard.restore_category(key, snapshot);
    }
    tracing::info!(categories = ?keys, "imported categories");
    Ok(keys)
}
