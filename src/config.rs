use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct MarketConfig {
    pub db_path: PathBuf,
    pub uploads_dir: PathBuf,
    pub log_level: String,
    pub use_json: bool,
    /// Also write logs to `<log_dir>/<log_file>` when set.
    pub log_dir: Option<PathBuf>,
    pub log_file: String,
    pub rules: Rules,
    pub uploads: UploadLimits,
    pub admin: AdminSeed,
}

/// Point economics applied by the settlement engine and moderation.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct Rules {
    /// Paid to the item owner on points redemption, and to both parties on a direct swap.
    pub swap_bonus: u64,
    /// Paid to the uploader when a listing is first approved.
    pub listing_bonus: u64,
    pub default_point_value: u64,
    pub starting_points: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct UploadLimits {
    pub max_bytes: u64,
    pub max_files: usize,
    pub extensions: Vec<String>,
    /// URL prefix returned in stored file paths.
    pub public_prefix: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./data/rewear.db"),
            uploads_dir: PathBuf::from("./uploads"),
            log_level: "info".to_string(),
            use_json: false,
            log_dir: None,
            log_file: "rewear.log".to_string(),
            rules: Rules::default(),
            uploads: UploadLimits::default(),
            admin: AdminSeed::default(),
        }
    }
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            swap_bonus: 10,
            listing_bonus: 10,
            default_point_value: 10,
            starting_points: 0,
        }
    }
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_bytes: 5 * 1024 * 1024,
            max_files: 5,
            extensions: ["jpeg", "jpg", "png", "gif", "webp"]
                .into_iter()
                .map(String::from)
                .collect(),
            public_prefix: "/uploads".to_string(),
        }
    }
}

impl Default for AdminSeed {
    fn default() -> Self {
        Self {
            name: "Admin User".to_string(),
            email: "admin@rewear.com".to_string(),
        }
    }
}

impl MarketConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }

    /// Defaults when the file does not exist; a present but broken file is still an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}
