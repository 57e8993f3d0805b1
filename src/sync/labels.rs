use std::path::Path;

use serde_json::Value;

use crate::cvat::CvatError;

/// Load the label schema from a local JSON file.
///
/// The structure is passed through to task creation opaquely; the client
/// never interprets it. A missing, unreadable, or malformed file is a
/// configuration error, not a transport error.
pub fn load_labels(path: &Path) -> Result<Value, CvatError> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        CvatError::Configuration(format!("Cannot read label file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&contents).map_err(|e| {
        CvatError::Configuration(format!(
            "Label file {} is not valid JSON: {}",
            path.display(),
            e
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn test_dir(name: &str) -> PathBuf {
        let dir = PathBuf::from("/tmp/claude/label_tests").join(name);
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_load_valid_labels() {
        let dir = test_dir("valid");
        let path = dir.join("labels.json");
        std::fs::write(
            &path,
            r#"[{"name": "car", "attributes": [{"name": "color"}]}]"#,
        )
        .unwrap();

        let labels = load_labels(&path).unwrap();
        assert_eq!(labels[0]["name"], "car");
    }

    #[test]
    fn test_missing_file_is_configuration_error() {
        let dir = test_dir("missing");
        let err = load_labels(&dir.join("labels.json")).unwrap_err();
        assert!(err.is_configuration(), "unexpected error: {err}");
    }

    #[test]
    fn test_invalid_json_is_configuration_error() {
        let dir = test_dir("invalid");
        let path = dir.join("labels.json");
        std::fs::write(&path, "not json {").unwrap();
        let err = load_labels(&path).unwrap_err();
        assert!(err.is_configuration(), "unexpected error: {err}");
    }
}
