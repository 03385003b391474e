//! Loading the JSON export of a parsed Terraform project.
//!
//! The export maps each resource type to its instances, e.g.
//! `{"aws_instance": [{...}, {...}], "aws_vpc": [{...}]}`. The parser also
//! emits a `__tfmeta` bookkeeping key that is meaningless to the model and is
//! dropped on load.

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::TfaError;

/// Parser bookkeeping key removed before analysis.
pub const META_KEY: &str = "__tfmeta";

/// One line of the resource summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceCount {
    pub resource_type: String,
    pub count: usize,
}

/// Reads and parses a resource export from disk.
pub fn load_resources(path: &Path) -> Result<Value, TfaError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| TfaError::Input(format!("cannot read {}: {e}", path.display())))?;
    parse_resources(&raw)
        .map_err(|e| TfaError::Input(format!("{}: {e}", path.display())))
}

/// Parses a resource export. The top level must be a JSON object.
pub fn parse_resources(raw: &str) -> Result<Value, TfaError> {
    let mut value: Value =
        serde_json::from_str(raw).map_err(|e| TfaError::Input(format!("invalid JSON: {e}")))?;

    let Some(map) = value.as_object_mut() else {
        return Err(TfaError::Input(
            "expected a JSON object keyed by resource type".to_string(),
        ));
    };
    if map.remove(META_KEY).is_some() {
        debug!("dropped '{META_KEY}' from resource export");
    }
    Ok(value)
}

/// Resource types with their instance counts: arrays count their items,
/// objects their keys, anything else counts once.
pub fn resource_summary(resources: &Value) -> Vec<ResourceCount> {
    let Some(map) = resources.as_object() else {
        return Vec::new();
    };
    map.iter()
        .map(|(resource_type, instances)| ResourceCount {
            resource_type: resource_type.clone(),
            count: match instances {
                Value::Array(items) => items.len(),
                Value::Object(fields) => fields.len(),
                _ => 1,
            },
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn meta_key_is_dropped() {
        let value = parse_resources(r#"{"__tfmeta": {"path": "."}, "aws_vpc": [{}]}"#).unwrap();
        assert!(value.get(META_KEY).is_none());
        assert!(value.get("aws_vpc").is_some());
    }

    #[test]
    fn non_object_export_is_rejected() {
        assert!(matches!(parse_resources("[1, 2]"), Err(TfaError::Input(_))));
        assert!(matches!(parse_resources("not json"), Err(TfaError::Input(_))));
    }

    #[test]
    fn summary_counts_by_shape() {
        let resources = json!({
            "aws_instance": [{}, {}, {}],
            "aws_lb": {"main": {}, "internal": {}},
            "aws_region": "ap-northeast-1"
        });
        let summary = resource_summary(&resources);
        let counts: Vec<(&str, usize)> = summary
            .iter()
            .map(|c| (c.resource_type.as_str(), c.count))
            .collect();
        assert_eq!(
            counts,
            vec![("aws_instance", 3), ("aws_lb", 2), ("aws_region", 1)]
        );
    }

    #[test]
    fn summary_of_non_object_is_empty() {
        assert!(resource_summary(&json!([1])).is_empty());
    }

    #[test]
    fn load_reports_missing_file() {
        let err = load_resources(Path::new("/nonexistent/tfavail/resources.json")).unwrap_err();
        assert!(err.to_string().contains("resources.json"));
    }
}
