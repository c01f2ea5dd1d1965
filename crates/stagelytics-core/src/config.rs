use std::path::PathBuf;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;
pub const DEFAULT_MAX_DATASETS: usize = 16;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Directory scanned for exported tutorial data files.
    pub tutorial_dir: PathBuf,
    pub max_upload_bytes: usize,
    /// Datasets kept in memory; the oldest upload is evicted past this.
    pub max_datasets: usize,
    pub cors_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            tutorial_dir: PathBuf::from("./data/tutorial"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_datasets: DEFAULT_MAX_DATASETS,
            cors_origins: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let defaults = Self::default();
        Ok(Self {
            port: var("STAGELYTICS_PORT")
                .unwrap_or_else(|| "3000".to_string())
                .parse()
                .map_err(|e| format!("invalid port: {e}"))?,
            tutorial_dir: var("STAGELYTICS_TUTORIAL_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.tutorial_dir),
            max_upload_bytes: match var("STAGELYTICS_MAX_UPLOAD_BYTES") {
                Some(raw) => raw
                    .parse()
                    .map_err(|e| format!("invalid STAGELYTICS_MAX_UPLOAD_BYTES: {e}"))?,
                None => defaults.max_upload_bytes,
            },
            max_datasets: var("STAGELYTICS_MAX_DATASETS")
                .and_then(|v| v.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.max_datasets),
            cors_origins: var("STAGELYTICS_CORS_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, String> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = load(&[]).expect("config");
        assert_eq!(config.port, 3000);
        assert_eq!(config.tutorial_dir, PathBuf::from("./data/tutorial"));
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(config.max_datasets, DEFAULT_MAX_DATASETS);
        assert!(config.cors_origins.is_empty());
    }

    #[test]
    fn values_are_read() {
        let config = load(&[
            ("STAGELYTICS_PORT", "8080"),
            ("STAGELYTICS_TUTORIAL_DIR", "/srv/tutorial"),
            ("STAGELYTICS_MAX_UPLOAD_BYTES", "1024"),
            ("STAGELYTICS_MAX_DATASETS", "2"),
            ("STAGELYTICS_CORS_ORIGINS", "https://a.example, https://b.example,"),
        ])
        .expect("config");
        assert_eq!(config.port, 8080);
        assert_eq!(config.tutorial_dir, PathBuf::from("/srv/tutorial"));
        assert_eq!(config.max_upload_bytes, 1024);
        assert_eq!(config.max_datasets, 2);
        assert_eq!(
            config.cors_origins,
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn bad_port_is_an_error() {
        assert!(load(&[("STAGELYTICS_PORT", "http")]).is_err());
        assert!(load(&[("STAGELYTICS_MAX_UPLOAD_BYTES", "lots")]).is_err());
    }

    #[test]
    fn zero_dataset_cap_falls_back() {
        let config = load(&[("STAGELYTICS_MAX_DATASETS", "0")]).expect("config");
        assert_eq!(config.max_datasets, DEFAULT_MAX_DATASETS);
    }
}
