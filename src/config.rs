use anyhow::{bail, Result};
use simplelog::LevelFilter;

pub const LOG_ENV: &str = "PARTIAL_DERIVATIVES_LOG";

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridWindow {
    pub half_width: f64,
    pub samples: usize,
}

impl Default for GridWindow {
    fn default() -> Self {
        Self {
            half_width: 2.0,
            samples: 50,
        }
    }
}

// углы в радианах
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct View {
    pub yaw: f64,
    pub pitch: f64,
}

impl Default for View {
    fn default() -> Self {
        Self {
            yaw: 0.5,
            pitch: 0.4,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub default_function: String,
    pub default_x0: f64,
    pub default_y0: f64,
    pub grid: GridWindow,
    pub image_size: (u32, u32),
    pub view: View,
    pub log_level: LevelFilter,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_function: "x**2 + y + y**3".to_string(),
            default_x0: 1.0,
            default_y0: 2.0,
            grid: GridWindow::default(),
            image_size: (800, 600),
            view: View::default(),
            log_level: LevelFilter::Info,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(value) = std::env::var(LOG_ENV) {
            config.log_level = match parse_log_level(&value) {
                Some(level) => level,
                None => bail!(
                    "{} должен быть одним из off, error, warn, info, debug, trace (получено {:?})",
                    LOG_ENV,
                    value
                ),
            };
        }
        Ok(config)
    }
}

pub fn parse_log_level(value: &str) -> Option<LevelFilter> {
    match value.trim().to_lowercase().as_str() {
        "off" | "none" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.default_function, "x**2 + y + y**3");
        assert_eq!(config.default_x0, 1.0);
        assert_eq!(config.default_y0, 2.0);
        assert_eq!(config.grid.half_width, 2.0);
        assert_eq!(config.grid.samples, 50);
    }

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("Debug"), Some(LevelFilter::Debug));
        assert_eq!(parse_log_level(" warn "), Some(LevelFilter::Warn));
        assert_eq!(parse_log_level("loud"), None);
    }
}
