//! Persisted scene schema.
//!
//! A scene is a JSON document produced by the (out-of-scope) persistence
//! collaborator: a list of spawn records plus engine-level scalars. This
//! crate owns the schema and its sanitization rules; actually spawning
//! entities from records is the engine's job.
//!
//! Loading is tolerant per entry — a malformed record is sanitized or
//! skipped, never fatal — while an unparseable document is the one failure
//! that surfaces to the host.

mod schema;

pub use schema::{PropsRecord, QuatRecord, SceneFile, SceneRecord, Vec3Record};

use std::path::Path;

use thiserror::Error;

/// Errors from reading or writing a scene document.
///
/// Only [`SceneError::Parse`] and [`SceneError::Read`] can surface to the
/// host (as a load-error flag plus an empty reset scene); per-record
/// problems are handled inside the load and never reach here.
#[derive(Debug, Error)]
pub enum SceneError {
    /// Failed to read the scene file from disk.
    #[error("failed to read scene: {0}")]
    Read(#[source] std::io::Error),

    /// Failed to write the scene file to disk.
    #[error("failed to write scene: {0}")]
    Write(#[source] std::io::Error),

    /// The document is not valid JSON for the scene schema.
    #[error("failed to parse scene: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Parses a scene document from a JSON string.
pub fn parse_scene(json: &str) -> Result<SceneFile, SceneError> {
    Ok(serde_json::from_str(json)?)
}

/// Serializes a scene document to pretty JSON.
pub fn scene_to_json(scene: &SceneFile) -> Result<String, SceneError> {
    Ok(serde_json::to_string_pretty(scene)?)
}

/// Loads a scene document from disk.
pub fn load_scene_file(path: &Path) -> Result<SceneFile, SceneError> {
    let json = std::fs::read_to_string(path).map_err(SceneError::Read)?;
    parse_scene(&json)
}

/// Saves a scene document to disk.
pub fn save_scene_file(path: &Path, scene: &SceneFile) -> Result<(), SceneError> {
    let json = scene_to_json(scene)?;
    std::fs::write(path, json).map_err(SceneError::Write)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_scene_parses() {
        let json = r#"{
            "gravityY": -9.81,
            "texturesEnabled": true,
            "entities": [
                {
                    "templateId": "crate",
                    "position": {"x": 1.0, "y": 2.0, "z": 3.0},
                    "rotation": {"x": 0.0, "y": 0.0, "z": 0.0, "w": 1.0},
                    "scale": {"x": 1.0, "y": 1.0, "z": 1.0}
                }
            ]
        }"#;
        let scene = parse_scene(json).expect("valid scene");
        assert_eq!(scene.gravity_y, -9.81);
        assert!(scene.textures_enabled);
        assert_eq!(scene.entities.len(), 1);
        assert_eq!(scene.entities[0].template_id, "crate");
    }

    #[test]
    fn test_props_are_optional() {
        let json = r#"{
            "gravityY": -9.81,
            "texturesEnabled": false,
            "entities": [
                {
                    "templateId": "crate",
                    "position": {"x": 0, "y": 0, "z": 0},
                    "rotation": {"x": 0, "y": 0, "z": 0, "w": 1},
                    "scale": {"x": 1, "y": 1, "z": 1},
                    "props": {"friction": 0.4, "restitution": 0.2, "density": 2.5}
                }
            ]
        }"#;
        let scene = parse_scene(json).unwrap();
        let props = scene.entities[0].props.as_ref().expect("props present");
        assert_eq!(props.density, 2.5);
    }

    #[test]
    fn test_garbage_document_is_a_parse_error() {
        assert!(matches!(
            parse_scene("not json at all"),
            Err(SceneError::Parse(_))
        ));
    }

    #[test]
    fn test_disk_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.json");

        let scene = SceneFile {
            gravity_y: -3.7,
            textures_enabled: false,
            entities: vec![SceneRecord::at_origin("glass_pane")],
        };
        save_scene_file(&path, &scene).unwrap();
        let loaded = load_scene_file(&path).unwrap();
        assert_eq!(loaded, scene);
    }

    #[test]
    fn test_missing_file_is_a_read_error() {
        let err = load_scene_file(Path::new("/nonexistent/scene.json")).unwrap_err();
        assert!(matches!(err, SceneError::Read(_)));
    }
}
