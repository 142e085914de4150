// Run configuration resolved from CLI flags and the environment.

use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

// Checked in order; variables already set in the process win.
const ENV_FILES: [&str; 2] = [".env.local", ".env"];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("batch size must be at least 1")]
    ZeroBatchSize,

    #[error("missing Supabase URL: pass --supabase-url or set SUPABASE_URL")]
    MissingUrl,

    #[error("missing service role key: pass --service-key or set SUPABASE_SERVICE_ROLE_KEY (e.g. in .env.local)")]
    MissingServiceKey,
}

// What to read from the dump and where to put it.
#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub batch_size: usize,
    pub events_table: String,
    pub photos_table: String,
    pub events_collection: String,
    pub photos_collection: String,
    pub photo_base_url: String,
    pub clear_existing: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            batch_size: 500,
            events_table: "events".to_string(),
            photos_table: "photos".to_string(),
            events_collection: "dw_events".to_string(),
            photos_collection: "dw_photos".to_string(),
            photo_base_url: "https://d-w.pl/".to_string(),
            clear_existing: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub url: String,
    pub service_key: String,
    pub timeout: Duration,
}

impl StoreConfig {
    // The web app's public variable is accepted as a fallback for the URL.
    pub fn resolve(
        url: Option<String>,
        service_key: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, ConfigError> {
        let url = url
            .or_else(|| env::var("NEXT_PUBLIC_SUPABASE_URL").ok())
            .filter(|u| !u.trim().is_empty())
            .ok_or(ConfigError::MissingUrl)?;
        let service_key = service_key
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingServiceKey)?;
        Ok(Self {
            url,
            service_key,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

pub fn validate_batch_size(batch_size: usize) -> Result<usize, ConfigError> {
    if batch_size == 0 {
        return Err(ConfigError::ZeroBatchSize);
    }
    Ok(batch_size)
}

// Load dotenv files from the working directory. Returns the ones found so
// they can be logged once logging is up.
pub fn load_env_files() -> Vec<PathBuf> {
    ENV_FILES
        .iter()
        .filter_map(|name| dotenvy::from_filename(name).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_size() {
        assert_eq!(validate_batch_size(0), Err(ConfigError::ZeroBatchSize));
        assert_eq!(validate_batch_size(500), Ok(500));
    }

    #[test]
    fn test_missing_key() {
        let err = StoreConfig::resolve(Some("https://x.supabase.co".into()), None, 30).unwrap_err();
        assert_eq!(err, ConfigError::MissingServiceKey);

        let err =
            StoreConfig::resolve(Some("https://x.supabase.co".into()), Some("  ".into()), 30)
                .unwrap_err();
        assert_eq!(err, ConfigError::MissingServiceKey);
    }

    #[test]
    fn test_resolve_explicit() {
        let cfg = StoreConfig::resolve(Some("https://x.supabase.co".into()), Some("k".into()), 30)
            .unwrap();
        assert_eq!(cfg.url, "https://x.supabase.co");
        assert_eq!(cfg.service_key, "k");
        assert_eq!(cfg.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_defaults() {
        let cfg = ImportConfig::default();
        assert_eq!(cfg.batch_size, 500);
        assert_eq!(cfg.events_collection, "dw_events");
        assert!(cfg.clear_existing);
    }
}
