use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::registry::{ErrorPageRegistry, is_valid_status};
use crate::response::ServerIdentity;
use crate::template::{DEFAULT_LINE_BUFFER_SIZE, TemplateRenderer};

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
    pub default_error_page: PathBuf,
    #[serde(default)]
    pub error_pages: Vec<ErrorPage>,
    #[serde(default = "default_line_buffer_size")]
    pub line_buffer_size: usize,
    #[serde(default)]
    pub server_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorPage {
    pub code: u16,
    pub path: PathBuf,
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8888))
}

fn default_line_buffer_size() -> usize {
    DEFAULT_LINE_BUFFER_SIZE
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if let Some(page) = self.error_pages.iter().find(|p| !is_valid_status(p.code)) {
            return Err(Error::Config(format!(
                "error page code {} is outside 100-999",
                page.code
            )));
        }
        if self.line_buffer_size < 2 {
            return Err(Error::Config(format!(
                "line_buffer_size must be at least 2, got {}",
                self.line_buffer_size
            )));
        }
        Ok(())
    }

    /// Builds the registry from the configured pages.
    pub fn registry(&self) -> Result<ErrorPageRegistry> {
        let mut registry = ErrorPageRegistry::new(&self.default_error_page);
        for page in &self.error_pages {
            registry.register(page.code, &page.path)?;
        }
        Ok(registry)
    }

    pub fn renderer(&self) -> TemplateRenderer {
        TemplateRenderer::new(self.line_buffer_size)
    }

    pub fn identity(&self) -> ServerIdentity {
        let mut identity = ServerIdentity::default();
        if let Some(name) = &self.server_name {
            identity.package = name.clone();
        }
        identity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let yaml = r#"
listen: "0.0.0.0:9000"
default_error_page: "./error_pages/default.html"
line_buffer_size: 1024
server_name: "tinyproxy"
error_pages:
  - code: 404
    path: "./error_pages/404.html"
  - code: 502
    path: "./error_pages/502.html"
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.listen, "0.0.0.0:9000".parse().unwrap());
        assert_eq!(config.renderer().line_buffer_size(), 1024);
        assert_eq!(config.identity().package, "tinyproxy");
        assert_eq!(config.identity().version, env!("CARGO_PKG_VERSION"));

        let registry = config.registry().unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.resolve(404), Path::new("./error_pages/404.html"));
        assert_eq!(registry.resolve(502), Path::new("./error_pages/502.html"));
        assert_eq!(registry.resolve(500), Path::new("./error_pages/default.html"));
    }

    #[test]
    fn defaults_apply() {
        let config = Config::from_yaml("default_error_page: default.html\n").unwrap();
        assert_eq!(config.listen, default_listen());
        assert_eq!(config.line_buffer_size, DEFAULT_LINE_BUFFER_SIZE);
        assert!(config.error_pages.is_empty());
        assert!(config.registry().unwrap().is_empty());
        assert_eq!(config.identity(), ServerIdentity::default());
    }

    #[test]
    fn rejects_out_of_range_code() {
        let yaml = "default_error_page: d.html\nerror_pages:\n  - code: 42\n    path: x.html\n";
        assert!(matches!(Config::from_yaml(yaml), Err(Error::Config(_))));
    }

    #[test]
    fn rejects_tiny_line_buffer() {
        let yaml = "default_error_page: d.html\nline_buffer_size: 1\n";
        assert!(matches!(Config::from_yaml(yaml), Err(Error::Config(_))));
    }

    #[test]
    fn missing_default_page_is_a_parse_error() {
        assert!(matches!(Config::from_yaml("listen: \"127.0.0.1:1\"\n"), Err(Error::Yaml(_))));
    }
}
