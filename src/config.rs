use serde::Deserialize;

pub const DEFAULT_MAX_HISTORY: usize = 30;
pub const DEFAULT_STORAGE_NAMESPACE: &str = "content-studio/v1";

/// Tunables for the canvas core. Every field has a default, so a partial
/// JSON object is enough to override a single value.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct CanvasConfig {
    pub max_history: usize,
    pub min_item_width: f64,
    pub min_item_height: f64,
    pub min_image_size: f64,
    /// Shapes at or below this height are treated as lines while resizing.
    pub line_mode_threshold: f64,
    pub line_min_height: f64,
    pub wheel_zoom_factor: f64,
    pub button_zoom_factor: f64,
    /// Resize handle edge length in screen pixels.
    pub resize_handle_size: f64,
    pub storage_namespace: String,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            max_history: DEFAULT_MAX_HISTORY,
            min_item_width: 50.0,
            min_item_height: 30.0,
            min_image_size: 100.0,
            line_mode_threshold: 10.0,
            line_min_height: 2.0,
            wheel_zoom_factor: 1.1,
            button_zoom_factor: 1.2,
            resize_handle_size: 8.0,
            storage_namespace: DEFAULT_STORAGE_NAMESPACE.to_string(),
        }
    }
}

impl CanvasConfig {
    pub fn items_key(&self) -> String {
        format!("{}/canvas-items", self.storage_namespace)
    }

    pub fn viewport_key(&self) -> String {
        format!("{}/canvas-viewport", self.storage_namespace)
    }

    pub fn history_key(&self) -> String {
        format!("{}/canvas-history", self.storage_namespace)
    }

    pub fn content_key(&self) -> String {
        format!("{}/content-history", self.storage_namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = CanvasConfig::default();
        assert_eq!(config.max_history, 30);
        assert_eq!(config.min_item_width, 50.0);
        assert_eq!(config.min_item_height, 30.0);
        assert_eq!(config.line_min_height, 2.0);
        assert_eq!(config.wheel_zoom_factor, 1.1);
        assert_eq!(config.button_zoom_factor, 1.2);
    }

    #[test]
    fn partial_json_overrides_single_field() {
        let config: CanvasConfig = serde_json::from_str(r#"{"maxHistory": 5}"#).unwrap();
        assert_eq!(config.max_history, 5);
        assert_eq!(config.min_item_width, 50.0);
        assert_eq!(config.storage_namespace, "content-studio/v1");
    }

    #[test]
    fn storage_keys_use_namespace() {
        let config = CanvasConfig {
            storage_namespace: "test".to_string(),
            ..CanvasConfig::default()
        };
        assert_eq!(config.items_key(), "test/canvas-items");
        assert_eq!(config.viewport_key(), "test/canvas-viewport");
        assert_eq!(config.history_key(), "test/canvas-history");
        assert_eq!(config.content_key(), "test/content-history");
    }
}
