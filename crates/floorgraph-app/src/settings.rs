use anyhow::{Context, Result};
use floorgraph_graph::{Camera, EdgeDefaults, InteractionConfig, NodeDefaults};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    pub interaction: InteractionConfig,
    pub node_defaults: NodeDefaults,
    pub edge_defaults: EdgeDefaults,
    /// Initial camera of the 3D overview.
    pub camera: Camera,
    /// Written into exported document metadata.
    pub app_name: String,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            interaction: InteractionConfig::default(),
            node_defaults: NodeDefaults::default(),
            edge_defaults: EdgeDefaults::default(),
            camera: Camera::default(),
            app_name: "floorgraph".to_string(),
        }
    }
}

impl EditorSettings {
    pub fn load(path: &Path) -> Result<Self> {
        tracing::info!("Loading settings from {:?}", path);
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        let mut settings: EditorSettings = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))?;
        settings.camera = settings.camera.clamped();
        settings.edge_defaults = settings.edge_defaults.validated();
        Ok(settings)
    }

    /// Load from `path` when given, falling back to defaults if the file is absent.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) if path.exists() => Self::load(path),
            Some(path) => {
                tracing::info!("Settings file {:?} not found, using defaults", path);
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use floorgraph_core::NodeType;

    #[test]
    fn test_partial_file_fills_defaults() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{"node_defaults": {"node_type": "office"}, "camera": {"zoom": 7.5}}"#,
        )?;

        let settings = EditorSettings::load(&path)?;
        assert_eq!(settings.node_defaults.node_type, NodeType::Office);
        assert_eq!(settings.node_defaults.capacity, 30);
        assert_eq!(settings.camera.zoom(), 2.0);
        assert_eq!(settings.interaction.min_box_size, 10.0);
        assert_eq!(settings.app_name, "floorgraph");
        Ok(())
    }

    #[test]
    fn test_invalid_default_traversal_time_is_replaced() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{"edge_defaults": {"traversal_time": -3.0, "capacity": 12}}"#,
        )?;

        let settings = EditorSettings::load(&path)?;
        assert_eq!(settings.edge_defaults.traversal_time, 10.0);
        assert_eq!(settings.edge_defaults.capacity, 12);
        Ok(())
    }

    #[test]
    fn test_save_then_load() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("settings.json");
        let mut settings = EditorSettings::default();
        settings.edge_defaults.traversal_time = 4.5;
        settings.app_name = "campus-editor".to_string();
        settings.save(&path)?;

        assert_eq!(EditorSettings::load(&path)?, settings);
        Ok(())
    }

    #[test]
    fn test_missing_file_uses_defaults() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let missing = dir.path().join("nope.json");
        assert_eq!(
            EditorSettings::load_or_default(Some(&missing))?,
            EditorSettings::default()
        );
        assert!(EditorSettings::load(&missing).is_err());
        Ok(())
    }
}
