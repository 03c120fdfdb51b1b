use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::effects::RenderSettings;
use crate::pixels::{LayoutError, Rgb, ZoneLayout};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse config file {path}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid pixel layout")]
    Layout(#[from] LayoutError),
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub opc: OpcConfig,
    pub status: StatusConfig,
    pub layout: LayoutConfig,
    pub render: RenderConfig,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OpcConfig {
    /// `host:port` of the Open Pixel Control server.
    pub addr: String,
}

impl Default for OpcConfig {
    fn default() -> Self {
        Self {
            addr: String::from("127.0.0.1:7890"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StatusConfig {
    /// Where status datagrams are received.
    pub listen: String,
    pub recv_timeout_ms: u64,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            listen: String::from("127.0.0.1:6665"),
            recv_timeout_ms: 50,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutConfig {
    pub pixels: usize,
    pub ring_start: usize,
    /// Innermost first.
    pub ring_sizes: Vec<usize>,
    pub cabinet_start: usize,
    pub cabinet_count: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            pixels: 512,
            ring_start: 448,
            ring_sizes: vec![1, 6, 12, 24],
            cabinet_start: 0,
            cabinet_count: 30,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    pub frame_interval_ms: u64,
    /// Color at the bottom of every wave.
    pub glow: Rgb,
    /// Color at the top of the timer bar.
    pub power: Rgb,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 20,
            glow: Rgb::OFF,
            power: Rgb::new(128, 128, 128),
        }
    }
}

impl Config {
    /// Reads `path`, or returns the stock configuration when there is none.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        let Some(path) = path else {
            return Ok(Config::default());
        };

        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Config::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;

        config.layout()?;
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Config, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn layout(&self) -> Result<ZoneLayout, LayoutError> {
        let l = &self.layout;
        ZoneLayout::new(
            l.pixels,
            l.ring_start,
            &l.ring_sizes,
            l.cabinet_start,
            l.cabinet_count,
        )
    }

    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            frame_interval: Duration::from_millis(self.render.frame_interval_ms),
            glow: self.render.glow,
            power: self.render.power,
        }
    }

    pub fn recv_timeout(&self) -> Duration {
        Duration::from_millis(self.status.recv_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixels::RingIndex;

    #[test]
    fn empty_file_gives_stock_layout() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());

        let layout = config.layout().unwrap();
        assert_eq!(layout.total(), 512);
        assert_eq!(
            layout.ring(RingIndex::OUTER).unwrap().offset,
            448 + 1 + 6 + 12
        );
        assert_eq!(layout.cabinet().count, 30);
        assert_eq!(config.recv_timeout(), Duration::from_millis(50));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::parse(
            r#"
            [opc]
            addr = "10.0.0.5:7890"

            [render]
            glow = [5, 5, 5]
            "#,
        )
        .unwrap();

        assert_eq!(config.opc.addr, "10.0.0.5:7890");
        assert_eq!(config.render.glow, Rgb::new(5, 5, 5));
        assert_eq!(config.render.power, Rgb::new(128, 128, 128));
        assert_eq!(config.layout, LayoutConfig::default());
    }

    #[test]
    fn overlapping_zones_are_rejected() {
        let config = Config::parse(
            r#"
            [layout]
            cabinet_start = 440
            cabinet_count = 10
            "#,
        )
        .unwrap();

        assert!(matches!(config.layout(), Err(LayoutError::Overlap(..))));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::parse("[opc]\nport = 7890\n").is_err());
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let result = Config::load(Some(Path::new("/nonexistent/statuslights.toml")));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
