//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `billhub.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values. Secrets (trigger key, operator token, SMTP
//! password) are usually supplied through the environment.

use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Gateway credentials.
    pub auth: AuthSection,
    /// Outbound email/SMS delivery.
    pub delivery: DeliveryConfig,
    /// Invoice artifact output.
    pub artifacts: ArtifactsConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Gateway credentials. Endpoints whose credential is left unset reject
/// every request.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AuthSection {
    /// Shared secret for webhook triggers.
    pub api_key: Option<String>,
    /// Bearer token for operator endpoints.
    pub operator_token: Option<String>,
}

/// Outbound delivery channels. Both are optional; without them the server
/// still runs and stores in-app notifications.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// SMTP relay for outgoing email.
    pub smtp: Option<SmtpSection>,
    /// HTTP gateway accepting `POST { "to", "body" }` for SMS.
    pub sms_gateway_url: Option<String>,
}

/// SMTP relay settings.
#[derive(Debug, Deserialize)]
pub struct SmtpSection {
    pub host: String,
    pub username: String,
    pub password: String,
    /// Sender shown on outgoing mail, e.g. `BillHub <noreply@billhub.test>`.
    pub from: String,
}

/// Invoice artifact output.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    /// Directory that rendered invoice documents are written to.
    pub dir: String,
}

impl Config {
    /// Load configuration from `billhub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("billhub.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("BILLHUB_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("BILLHUB_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("BILLHUB_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Ok(val) = std::env::var("BILLHUB_DATABASE_URL") {
            self.database.url = val;
        }
        if let Ok(val) = std::env::var("BILLHUB_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("BILLHUB_API_KEY") {
            self.auth.api_key = Some(val);
        }
        if let Ok(val) = std::env::var("BILLHUB_OPERATOR_TOKEN") {
            self.auth.operator_token = Some(val);
        }
        if let Ok(val) = std::env::var("BILLHUB_SMS_GATEWAY_URL") {
            self.delivery.sms_gateway_url = Some(val);
        }
        if let Ok(val) = std::env::var("BILLHUB_ARTIFACT_DIR") {
            self.artifacts.dir = val;
        }
        if let Some(smtp) = self.delivery.smtp.as_mut() {
            if let Ok(val) = std::env::var("BILLHUB_SMTP_PASSWORD") {
                smtp.password = val;
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:billhub.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "billhubd=info,billhub=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            dir: "invoices".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.url, "sqlite:billhub.db?mode=rwc");
        assert_eq!(config.artifacts.dir, "invoices");
        assert!(config.auth.api_key.is_none());
        assert!(config.delivery.smtp.is_none());
    }

    #[test]
    fn should_parse_minimal_toml() {
        let toml = "";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = r#"
            [server]
            host = '127.0.0.1'
            port = 9090

            [database]
            url = 'sqlite:test.db'

            [logging]
            filter = 'debug'

            [auth]
            api_key = 'trigger-secret'
            operator_token = 'op-token'

            [delivery]
            sms_gateway_url = 'http://sms.test/send'

            [delivery.smtp]
            host = 'smtp.test'
            username = 'mailer'
            password = 'hunter2'
            from = 'BillHub <noreply@billhub.test>'

            [artifacts]
            dir = '/var/lib/billhub/invoices'
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.database.url, "sqlite:test.db");
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(config.auth.api_key.as_deref(), Some("trigger-secret"));
        assert_eq!(
            config.delivery.sms_gateway_url.as_deref(),
            Some("http://sms.test/send")
        );
        let smtp = config.delivery.smtp.unwrap();
        assert_eq!(smtp.host, "smtp.test");
        assert_eq!(config.artifacts.dir, "/var/lib/billhub/invoices");
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn should_reject_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn should_format_bind_addr() {
        let mut config = Config::default();
        config.server.host = "127.0.0.1".to_string();
        config.server.port = 9090;
        assert_eq!(config.bind_addr(), "127.0.0.1:9090");
    }

    #[test]
    fn should_parse_partial_toml_with_defaults() {
        let toml = "
            [server]
            port = 8080
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.database.url, "sqlite:billhub.db?mode=rwc");
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }
}
