use std::fs;
use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    algorithms::Renderer,
    error::{CircleError, Result},
    types::DetectionParameters,
};

/// Settings for the HTTP service
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body, in bytes
    pub max_content_length: usize,
    /// Optional TTF/OTF font for radius labels
    pub font_path: Option<PathBuf>,
    pub font_size: f32,
    /// Parameters used when a request does not override them
    pub detection: DetectionParameters,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            max_content_length: 16 * 1024 * 1024,
            font_path: None,
            font_size: 14.0,
            detection: DetectionParameters::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from JSON string
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Auto-detect file format and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let content = fs::read_to_string(path_ref)?;
        let config = match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml(&content)?,
            Some("json") => Self::from_json(&content)?,
            _ => return Err(CircleError::UnsupportedConfigFormat(path_ref.display().to_string())),
        };
        config.validate()?;
        Ok(config)
    }

    /// Convert to TOML string
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_content_length == 0 {
            return Err(CircleError::InvalidParameter(
                "max_content_length must be greater than 0".to_string(),
            ));
        }
        self.detection.validate()
    }

    /// `host:port` string for binding
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Renderer honouring the configured label font
    pub fn renderer(&self) -> Result<Renderer> {
        match &self.font_path {
            Some(path) => Renderer::default().with_font_file(path, self.font_size),
            None => Ok(Renderer::default()),
        }
    }
}
