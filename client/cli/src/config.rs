use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides the configured backend host.
pub const BACKEND_URL_ENV: &str = "GALLERY_BACKEND_URL";

const GALLERY_API_PATH: &str = "/api/v1/gallery";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub uploads_prefix: String,
    pub page_limit: u32,
    pub include_credentials: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000".to_string(),
            uploads_prefix: "uploads".to_string(),
            page_limit: 12,
            include_credentials: true,
        }
    }
}

impl Config {
    pub fn config_path() -> anyhow::Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "gallery", "gallery")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        let config_dir = proj_dirs.config_dir();
        std::fs::create_dir_all(config_dir)?;

        Ok(config_dir.join("config.toml"))
    }

    /// Load the config file, then apply the environment override.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        if let Ok(url) = std::env::var(BACKEND_URL_ENV) {
            config.set_api_base_url(&url);
        }
        Ok(config)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_base_url.trim().is_empty() {
            anyhow::bail!("api_base_url cannot be empty");
        }
        if self.page_limit == 0 {
            anyhow::bail!("page_limit must be greater than zero");
        }
        Ok(())
    }

    pub fn set_api_base_url(&mut self, url: &str) {
        let url = url.trim();
        // Add http:// if missing
        self.api_base_url = if url.starts_with("http") {
            url.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", url.trim_end_matches('/'))
        };
    }

    /// Root of every gallery endpoint, e.g. `http://localhost:3000/api/v1/gallery`.
    pub fn gallery_api_base(&self) -> String {
        format!(
            "{}{}",
            self.api_base_url.trim_end_matches('/'),
            GALLERY_API_PATH
        )
    }

    /// Public URL of a stored image file.
    pub fn image_url(&self, image_path: &str) -> String {
        let segments = [
            self.uploads_prefix.as_str(),
            image_path,
        ];
        let path: Vec<&str> = segments
            .iter()
            .flat_map(|s| s.split('/'))
            .filter(|s| !s.is_empty())
            .collect();
        format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            path.join("/")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.gallery_api_base(), "http://localhost:3000/api/v1/gallery");
        assert_eq!(config.page_limit, 12);
        assert!(config.include_credentials);
    }

    #[test]
    fn test_set_api_base_url_normalizes() {
        let mut config = Config::default();
        config.set_api_base_url("photos.example.com:8080/");
        assert_eq!(config.api_base_url, "http://photos.example.com:8080");
        assert_eq!(
            config.gallery_api_base(),
            "http://photos.example.com:8080/api/v1/gallery"
        );
    }

    #[test]
    fn test_image_url_collapses_slashes() {
        let config = Config::default();
        assert_eq!(
            config.image_url("/2024/cat.png"),
            "http://localhost:3000/uploads/2024/cat.png"
        );

        let config = Config {
            uploads_prefix: String::new(),
            ..Config::default()
        };
        assert_eq!(config.image_url("cat.png"), "http://localhost:3000/cat.png");
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.set_api_base_url("https://gallery.test");
        config.page_limit = 24;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "page_limit = 6\n").unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.page_limit, 6);
        assert_eq!(loaded.api_base_url, "http://localhost:3000");
    }

    #[test]
    fn test_rejects_zero_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "page_limit = 0\n").unwrap();

        assert!(Config::load_from(&path).is_err());
    }
}
