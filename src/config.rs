//! Configuration loading from skatolo.toml

use serde::Deserialize;
use skatolo_ui::{BindingKind, BusConfig, MultiListConfig, ValueKind};
use std::path::Path;
use thiserror::Error;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bus: BusConfig,
    #[serde(default)]
    pub menu: MenuConfig,
    #[serde(default)]
    pub plugs: Vec<PlugConfig>,
}

/// Menu layout and entries
#[derive(Debug, Clone, Deserialize)]
pub struct MenuConfig {
    #[serde(default = "default_menu_name")]
    pub name: String,
    /// Top-left corner [x, y]
    #[serde(default = "default_menu_position")]
    pub position: [f32; 2],
    #[serde(flatten)]
    pub layout: MultiListConfig,
    #[serde(default)]
    pub items: Vec<ItemConfig>,
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            name: default_menu_name(),
            position: default_menu_position(),
            layout: MultiListConfig::default(),
            items: Vec::new(),
        }
    }
}

fn default_menu_name() -> String {
    "menu".to_string()
}

fn default_menu_position() -> [f32; 2] {
    [20.0, 20.0]
}

/// A menu button, possibly with nested buttons
#[derive(Debug, Clone, Deserialize)]
pub struct ItemConfig {
    pub name: String,
    #[serde(default)]
    pub value: f32,
    #[serde(default)]
    pub items: Vec<ItemConfig>,
}

/// Connects a controller to a member of the sketch
#[derive(Debug, Clone, Deserialize)]
pub struct PlugConfig {
    /// Menu or item name emitting the events
    pub source: String,
    /// Member name on the sketch
    pub target: String,
    /// Binding kind; picked from the sketch's members when omitted
    pub kind: Option<BindingKind>,
    /// Accepted parameter kinds, defaults to the bus setting
    pub accept: Option<Vec<ValueKind>>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use skatolo_ui::Direction;

    #[test]
    fn test_parse_full_config() {
        let config = Config::parse(
            r#"
            [bus]
            restricted_execution = true
            accepted = ["int", "float"]

            [menu]
            name = "presets"
            position = [5.0, 10.0]
            close_delay = 45
            direction = "left"

            [[menu.items]]
            name = "tempo"
            value = 1.0

            [[menu.items.items]]
            name = "fast"
            value = 2.0

            [[plugs]]
            source = "presets"
            target = "preset"
            kind = "method"
            "#,
        )
        .unwrap();

        assert!(config.bus.restricted_execution);
        assert_eq!(config.bus.accepted, vec![ValueKind::Int, ValueKind::Float]);
        assert_eq!(config.bus.handler, "controlEvent");
        assert_eq!(config.menu.name, "presets");
        assert_eq!(config.menu.layout.close_delay, 45);
        assert_eq!(config.menu.layout.direction, Direction::Left);
        assert_eq!(config.menu.layout.button_height, 19.0);
        assert_eq!(config.menu.items[0].items[0].name, "fast");
        assert_eq!(config.plugs[0].kind, Some(BindingKind::Method));
        assert_eq!(config.plugs[0].accept, None);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.menu.name, "menu");
        assert_eq!(config.menu.layout.close_delay, 30);
        assert!(config.plugs.is_empty());
    }

    #[test]
    fn test_bad_config_is_parse_error() {
        assert!(matches!(
            Config::parse("[menu]\nclose_delay = \"soon\""),
            Err(ConfigError::Parse(_))
        ));
    }
}
