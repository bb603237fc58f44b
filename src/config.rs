use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub const DEFAULT_CONFIG_PATH: &str = "config.json";
pub const DEFAULT_REGION: &str = "us-east-1";

/// Everything one upload run needs, read once at startup.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UploadConfig {
    #[serde(alias = "file_path")]
    pub file_path: PathBuf,
    #[serde(alias = "bucket_name")]
    pub bucket_name: String,
    #[serde(alias = "object_name")]
    pub object_name: String,
    #[serde(alias = "endpoint")]
    pub endpoint: String,
    #[serde(alias = "access_key")]
    pub access_key: String,
    #[serde(alias = "secret_key")]
    pub secret_key: String,
    #[serde(default, alias = "region")]
    pub region: Option<String>,
}

impl UploadConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| Error::Config {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        let mut config: UploadConfig = serde_json::from_str(&raw).map_err(|err| Error::Config {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        config.normalize();
        config.validate().map_err(|reason| Error::Config {
            path: path.to_path_buf(),
            reason,
        })?;
        Ok(config)
    }

    /// Strips surrounding whitespace from every field; a blank region falls
    /// back to the provider chain.
    pub fn normalize(&mut self) {
        for field in [
            &mut self.bucket_name,
            &mut self.object_name,
            &mut self.endpoint,
            &mut self.access_key,
            &mut self.secret_key,
        ] {
            *field = field.trim().to_string();
        }
        if let Some(path) = self.file_path.to_str() {
            self.file_path = PathBuf::from(path.trim());
        }
        self.region = self
            .region
            .take()
            .map(|region| region.trim().to_string())
            .filter(|region| !region.is_empty());
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        let required = [
            ("FilePath", self.file_path.as_os_str().is_empty()),
            ("BucketName", self.bucket_name.trim().is_empty()),
            ("ObjectName", self.object_name.trim().is_empty()),
            ("Endpoint", self.endpoint.trim().is_empty()),
            ("AccessKey", self.access_key.trim().is_empty()),
            ("SecretKey", self.secret_key.trim().is_empty()),
        ];
        match required.iter().find(|(_, empty)| *empty) {
            Some((field, _)) => Err(format!("{field} must not be empty")),
            None => Ok(()),
        }
    }
}
