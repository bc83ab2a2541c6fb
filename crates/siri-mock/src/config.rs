//! Configuration file for the `siri-mock serve` command.
//!
//! ```yaml
//! wait:
//!   attempts: 10
//!   interval_ms: 500
//! debug_requests: false
//! servers:
//!   - name: partner
//!     url: http://localhost:8090/siri
//!     responses:
//!       - type: StopMonitoring
//!         body: "<R>{RequestMessageRef}</R>"
//!       - type: GeneralMessage
//!         file: responses/gm.xml
//! ```

use crate::mock::{MockEndpoint, MockRegistry, WaitPolicy};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MockConfig {
    #[serde(default)]
    pub wait: WaitConfig,
    /// Log every captured request body
    #[serde(default)]
    pub debug_requests: bool,
    #[serde(default)]
    pub servers: Vec<ServerConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WaitConfig {
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

fn default_attempts() -> u32 {
    WaitPolicy::DEFAULT_ATTEMPTS
}

fn default_interval_ms() -> u64 {
    WaitPolicy::DEFAULT_INTERVAL.as_millis() as u64
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            interval_ms: default_interval_ms(),
        }
    }
}

impl From<WaitConfig> for WaitPolicy {
    fn from(config: WaitConfig) -> Self {
        WaitPolicy::new(config.attempts, Duration::from_millis(config.interval_ms))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub name: String,
    pub url: String,
    /// Responses queued at startup, served in order
    #[serde(default)]
    pub responses: Vec<ResponseConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ResponseConfig {
    #[serde(rename = "type", default)]
    pub request_type: String,
    /// Inline template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Template file, relative to the configuration file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl MockConfig {
    /// Load, validate and resolve a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: MockConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        config.resolve_files(base_dir)?;
        config.validate()?;
        Ok(config)
    }

    /// Check names are unique, URLs parse and every response has one source
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.wait.attempts == 0 {
            bail!("wait.attempts must be at least 1");
        }

        let mut names = HashSet::new();
        for server in &self.servers {
            if !names.insert(server.name.as_str()) {
                bail!("Duplicate mock server name '{}'", server.name);
            }
            MockEndpoint::parse(&server.url)?;

            for (index, response) in server.responses.iter().enumerate() {
                match (&response.body, &response.file) {
                    (Some(_), None) | (None, Some(_)) => {}
                    _ => bail!(
                        "Response #{} of '{}' needs exactly one of 'body' or 'file'",
                        index,
                        server.name
                    ),
                }
            }
        }
        Ok(())
    }

    /// Replace `file` responses by their content
    fn resolve_files(&mut self, base_dir: &Path) -> anyhow::Result<()> {
        for server in &mut self.servers {
            for response in &mut server.responses {
                let Some(file) = response.file.take() else {
                    continue;
                };
                if response.body.is_some() {
                    bail!(
                        "Response of '{}' has both 'body' and 'file'",
                        server.name
                    );
                }
                let file_path = base_dir.join(&file);
                let body = std::fs::read_to_string(&file_path).with_context(|| {
                    format!("Failed to read response file {}", file_path.display())
                })?;
                response.body = Some(body);
            }
        }
        Ok(())
    }

    pub fn wait_policy(&self) -> WaitPolicy {
        self.wait.into()
    }

    /// Build a registry holding every configured server, responses queued.
    ///
    /// Servers are registered but not started.
    pub fn build_registry(&self) -> anyhow::Result<MockRegistry> {
        let registry = MockRegistry::new()
            .with_wait_policy(self.wait_policy())
            .with_debug_requests(self.debug_requests);

        for server_config in &self.servers {
            let server = registry.create(&server_config.name, &server_config.url)?;
            for response in &server_config.responses {
                let body = response.body.as_deref().with_context(|| {
                    format!("Unresolved response file for '{}'", server_config.name)
                })?;
                server.expect_request(response.request_type.as_str(), body);
            }
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_minimal_config() {
        let config: MockConfig = serde_yaml::from_str("servers: []").unwrap();
        assert_eq!(config.wait, WaitConfig::default());
        assert!(!config.debug_requests);
        assert_eq!(
            config.wait_policy(),
            WaitPolicy::new(10, Duration::from_millis(500))
        );
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
wait:
  attempts: 3
  interval_ms: 100
debug_requests: true
servers:
  - name: partner
    url: http://localhost:8090/siri
    responses:
      - type: StopMonitoring
        body: "<R>{RequestMessageRef}</R>"
"#;
        let config: MockConfig = serde_yaml::from_str(yaml).unwrap();
        config.validate().unwrap();
        assert_eq!(config.wait_policy().timeout(), Duration::from_millis(300));
        assert!(config.debug_requests);
        assert_eq!(config.servers[0].responses[0].request_type, "StopMonitoring");
    }

    #[test]
    fn test_validate_duplicate_names() {
        let yaml = r#"
servers:
  - name: a
    url: http://localhost:8090/siri
  - name: a
    url: http://localhost:8091/siri
"#;
        let config: MockConfig = serde_yaml::from_str(yaml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Duplicate mock server name 'a'"));
    }

    #[test]
    fn test_validate_invalid_url() {
        let yaml = r#"
servers:
  - name: a
    url: ftp://localhost/siri
"#;
        let config: MockConfig = serde_yaml::from_str(yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_response_source() {
        let yaml = r#"
servers:
  - name: a
    url: http://localhost:8090/siri
    responses:
      - type: StopMonitoring
"#;
        let config: MockConfig = serde_yaml::from_str(yaml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("exactly one of 'body' or 'file'"));
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let result: Result<MockConfig, _> = serde_yaml::from_str("sevrers: []");
        assert!(result.is_err());
    }

    #[test]
    fn test_from_file_resolves_response_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("responses")).unwrap();
        std::fs::write(
            dir.path().join("responses/gm.xml"),
            "<GM>{LastRequestMessageRef}</GM>",
        )
        .unwrap();

        let config_path = dir.path().join("mock.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"servers:
  - name: partner
    url: http://localhost:8090/siri
    responses:
      - type: GeneralMessage
        file: responses/gm.xml
      - type: StopMonitoring
        body: "<SM/>""#
        )
        .unwrap();

        let config = MockConfig::from_file(&config_path).unwrap();
        let responses = &config.servers[0].responses;
        assert_eq!(
            responses[0].body.as_deref(),
            Some("<GM>{LastRequestMessageRef}</GM>")
        );
        assert!(responses[0].file.is_none());

        let registry = config.build_registry().unwrap();
        let pending = registry.find("partner").unwrap().pending_responses();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].request_type, "GeneralMessage");
        assert_eq!(pending[1].template, "<SM/>");
    }

    #[test]
    fn test_from_file_missing_response_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("mock.yaml");
        std::fs::write(
            &config_path,
            "servers:\n  - name: a\n    url: http://localhost:8090/siri\n    responses:\n      - file: missing.xml\n",
        )
        .unwrap();

        let err = MockConfig::from_file(&config_path).unwrap_err();
        assert!(format!("{err:#}").contains("missing.xml"));
    }

    #[test]
    fn test_build_registry_leaves_servers_stopped() {
        let yaml = r#"
wait:
  attempts: 2
  interval_ms: 10
servers:
  - name: a
    url: http://localhost:8090/siri
"#;
        let config: MockConfig = serde_yaml::from_str(yaml).unwrap();
        let registry = config.build_registry().unwrap();
        assert_eq!(registry.names(), vec!["a"]);
        assert!(!registry.find("a").unwrap().is_started());
    }
}
