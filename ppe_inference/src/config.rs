use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default, deserialize_with = "deserialize_log_level")]
    pub log_level: LogLevel,
    #[serde(default)]
    pub execution_provider: ExecutionProvider,
    #[serde(default)]
    pub person_model: ModelConfig,
    #[serde(default)]
    pub ppe_model: ModelConfig,
    /// Only regions of this person-model class are cropped. Every region when unset.
    #[serde(default)]
    pub region_class: Option<usize>,
    #[serde(default)]
    pub annotation: AnnotationConfig,
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<LogLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.try_into().map_err(serde::de::Error::custom)
}

pub trait Validatable {
    fn validate(&self) -> Result<(), String>;
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    #[serde(default = "default_input_size")]
    pub input_size: u32,
    #[serde(default = "default_min_probability")]
    pub min_probability: f32,
    #[serde(default = "default_iou_threshold")]
    pub iou_threshold: f32,
    #[serde(default)]
    pub labels_file: Option<PathBuf>,
}

fn default_input_size() -> u32 {
    640
}

fn default_min_probability() -> f32 {
    0.25
}

fn default_iou_threshold() -> f32 {
    0.7
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            input_size: default_input_size(),
            min_probability: default_min_probability(),
            iou_threshold: default_iou_threshold(),
            labels_file: None,
        }
    }
}

impl Validatable for ModelConfig {
    fn validate(&self) -> Result<(), String> {
        if self.input_size == 0 {
            return Err("input_size must be positive".to_string());
        }
        if !(0.0..=1.0).contains(&self.min_probability) {
            return Err(format!(
                "min_probability must be within [0, 1], got {}",
                self.min_probability
            ));
        }
        if !(0.0..=1.0).contains(&self.iou_threshold) {
            return Err(format!(
                "iou_threshold must be within [0, 1], got {}",
                self.iou_threshold
            ));
        }
        if let Some(labels_file) = &self.labels_file {
            if !labels_file.exists() {
                return Err(format!("Labels file not found: {:?}", labels_file));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnnotationConfig {
    #[serde(default = "default_thickness")]
    pub thickness: u32,
    #[serde(default)]
    pub font_file: Option<PathBuf>,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
    #[serde(default)]
    pub draw_regions: bool,
}

fn default_thickness() -> u32 {
    2
}

fn default_font_size() -> f32 {
    16.0
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            thickness: default_thickness(),
            font_file: None,
            font_size: default_font_size(),
            draw_regions: false,
        }
    }
}

impl Validatable for AnnotationConfig {
    fn validate(&self) -> Result<(), String> {
        if self.thickness == 0 {
            return Err("annotation thickness must be positive".to_string());
        }
        if self.font_size <= 0.0 {
            return Err(format!(
                "font_size must be positive, got {}",
                self.font_size
            ));
        }
        if let Some(font_file) = &self.font_file {
            if !font_file.exists() {
                return Err(format!("Font file not found: {:?}", font_file));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionProvider {
    #[default]
    Cpu,
    Cuda,
    TensorRT,
}

#[derive(Debug, Deserialize, Clone)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `local` or `production`.",
                other
            )),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
        }
    }
}

impl TryFrom<String> for LogLevel {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            other => Err(format!(
                "{} is not a supported minimum log level. Use either `debug` or `info`.",
                other
            )),
        }
    }
}

/// Layers `base.yaml`, then `<APP_ENVIRONMENT>.yaml`, then `PPE_*` variables.
/// Missing files fall back to the built-in defaults.
pub fn get_configuration(configuration_directory: &Path) -> Result<Config, config::ConfigError> {
    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;

    let config = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")).required(false))
        .add_source(
            config::File::from(
                configuration_directory.join(format!("{}.yaml", environment.as_str())),
            )
            .required(false),
        )
        .add_source(
            config::Environment::with_prefix("PPE")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let config = config.try_deserialize::<Config>()?;

    for validation in [
        config.person_model.validate(),
        config.ppe_model.validate(),
        config.annotation.validate(),
    ] {
        if let Err(e) = validation {
            tracing::error!("Configuration validation failed: {}", e);
            return Err(config::ConfigError::Message(e));
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults_without_configuration_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = get_configuration(dir.path()).unwrap();

        assert_eq!(config.execution_provider, ExecutionProvider::Cpu);
        assert_eq!(config.person_model.input_size, 640);
        assert_eq!(config.ppe_model.min_probability, 0.25);
        assert_eq!(config.ppe_model.iou_threshold, 0.7);
        assert_eq!(config.region_class, None);
        assert_eq!(config.annotation.thickness, 2);
        assert!(!config.annotation.draw_regions);
    }

    #[test]
    fn test_base_yaml_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("base.yaml"),
            "log_level: debug\n\
             execution_provider: tensorrt\n\
             region_class: 0\n\
             ppe_model:\n  min_probability: 0.4\n  input_size: 320\n\
             annotation:\n  thickness: 3\n  draw_regions: true\n",
        )
        .unwrap();

        let config = get_configuration(dir.path()).unwrap();

        assert_eq!(config.log_level.as_str(), "debug");
        assert_eq!(config.execution_provider, ExecutionProvider::TensorRT);
        assert_eq!(config.region_class, Some(0));
        assert_eq!(config.ppe_model.min_probability, 0.4);
        assert_eq!(config.ppe_model.input_size, 320);
        assert_eq!(config.ppe_model.iou_threshold, 0.7);
        assert_eq!(config.annotation.thickness, 3);
        assert!(config.annotation.draw_regions);
    }

    #[test]
    fn test_invalid_threshold_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("base.yaml"),
            "person_model:\n  min_probability: 1.5\n",
        )
        .unwrap();

        assert!(get_configuration(dir.path()).is_err());
    }

    #[test]
    fn test_log_level_parsing() {
        assert!(LogLevel::try_from("DEBUG".to_string()).is_ok());
        assert!(LogLevel::try_from("trace".to_string()).is_err());
    }
}
