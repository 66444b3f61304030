//! Settings validation - warns about unknown fields

use serde_json::Value;
use std::collections::HashSet;
use tracing::warn;

const SETTINGS_KEYS: &[&str] = &[
    "imageWidthDip",
    "imageMarginDip",
    "entriesMarginDip",
    "launcherSensitivityDip",
    "launcherOffsetPositionDip",
    "launcherOffsetHeightDip",
    "onRightSide",
    "vibrateOnActivation",
    "stripBackground",
    "overflowFolderName",
];

/// Validate settings JSON and warn about unknown fields.
pub fn warn_unknown_fields(content: &str, config_name: &str) {
    let Ok(value) = serde_json::from_str::<Value>(content) else {
        return;
    };

    let expected: HashSet<&str> = SETTINGS_KEYS.iter().copied().collect();
    for key in find_unknown_keys(&value, &expected) {
        warn!("Unknown config field in {config_name}: {key}");
    }
}

fn find_unknown_keys(value: &Value, expected: &HashSet<&str>) -> Vec<String> {
    let Value::Object(obj) = value else {
        return Vec::new();
    };

    obj.keys()
        .filter(|key| !expected.contains(key.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unknowns(json: &str) -> Vec<String> {
        let value: Value = serde_json::from_str(json).unwrap();
        let expected: HashSet<&str> = SETTINGS_KEYS.iter().copied().collect();
        let mut keys = find_unknown_keys(&value, &expected);
        keys.sort();
        keys
    }

    #[test]
    fn test_known_keys_pass() {
        assert!(unknowns(r#"{"imageWidthDip": 40, "onRightSide": true}"#).is_empty());
    }

    #[test]
    fn test_unknown_keys_reported() {
        assert_eq!(
            unknowns(r#"{"imageWidth": 40, "sideRight": true, "vibrateOnActivation": false}"#),
            vec!["imageWidth".to_string(), "sideRight".to_string()]
        );
    }

    #[test]
    fn test_non_object_is_ignored() {
        assert!(unknowns("[1, 2, 3]").is_empty());
    }

    #[test]
    fn test_invalid_json_does_not_panic() {
        warn_unknown_fields("{ not json", "settings.json");
    }
}
