//! Data models and structures
//!
//! Defines the request and response bodies of the HTTP surface, plus the
//! runtime configuration resolved from the environment.

use serde::{Deserialize, Serialize};

/// Body of `POST /api/solve/text`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextQuery {
    pub query: String,
    #[serde(default)]
    pub system_instruction: Option<String>,
}

/// Decoded `POST /api/solve/image` upload.
#[derive(Debug, Clone)]
pub struct ImageQuery {
    pub image: Vec<u8>,
    pub media_type: String,
    pub query: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
}

impl Answer {
    pub fn new(answer: String) -> Self {
        Self { answer }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

/// Body of `GET /test`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub backend: String,
    pub database: String,
    pub database_url: String,
    pub database_name: String,
    pub connection_status: String,
    pub collections: Vec<String>,
}

impl Diagnostics {
    /// Report for a backend without a database module; only the presence of
    /// the database environment variables is inspected.
    pub fn from_config(config: &Config) -> Self {
        let set_or_not = |set: bool| {
            if set {
                "✅ Set".to_string()
            } else {
                "❌ Not Set".to_string()
            }
        };

        Self {
            backend: "✅ Running".to_string(),
            database: "❌ Not Available".to_string(),
            database_url: set_or_not(config.database_url_set),
            database_name: set_or_not(config.database_name_set),
            connection_status: "Not Connected".to_string(),
            collections: Vec::new(),
        }
    }
}

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    pub database_url_set: bool,
    pub database_name_set: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            database_url_set: false,
            database_name_set: false,
        }
    }
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let port = match non_empty("PORT") {
            Some(raw) => raw.parse().map_err(|_| {
                crate::Error::Configuration(format!("Invalid PORT '{}'", raw))
            })?,
            None => DEFAULT_PORT,
        };

        let max_upload_bytes = match non_empty("MAX_UPLOAD_BYTES") {
            Some(raw) => raw.parse().map_err(|_| {
                crate::Error::Configuration(format!("Invalid MAX_UPLOAD_BYTES '{}'", raw))
            })?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Self {
            gemini_api_key: resolve_api_key(&lookup),
            host: non_empty("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            max_upload_bytes,
            database_url_set: non_empty("DATABASE_URL").is_some(),
            database_name_set: non_empty("DATABASE_NAME").is_some(),
        })
    }
}

/// `GEMINI_API_KEY` wins over `GOOGLE_API_KEY`; empty values count as unset.
pub fn resolve_api_key<F>(lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    ["GEMINI_API_KEY", "GOOGLE_API_KEY"]
        .iter()
        .find_map(|name| lookup(name).filter(|v| !v.is_empty()))
}
