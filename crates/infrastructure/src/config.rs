use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

impl HttpConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

/// Retention windows in days
#[derive(Debug, Deserialize, Serialize, Clone, Copy)]
pub struct RetentionConfig {
    pub action_days: i64,
    pub telemetry_days: i64,
    pub audit_days: i64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub database: DatabaseConfig,
    pub server: HttpConfig,
    pub auth: AuthConfig,
    pub retention: RetentionConfig,
}

impl ServerConfig {
    /// Layers built-in defaults, `<dir>/default`, `<dir>/<RUN_MODE>` and
    /// `DEVICEHUB__*` environment variables, later sources winning.
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .set_default("database.url", "postgres://localhost/device_hub")?
            .set_default("database.max_connections", 10)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("auth.jwt_secret", "")?
            .set_default("retention.action_days", 30)?
            .set_default("retention.telemetry_days", 90)?
            .set_default("retention.audit_days", 365)?
            .add_source(File::with_name(&format!("{}/default", config_dir)).required(false))
            .add_source(File::with_name(&format!("{}/{}", config_dir, run_mode)).required(false))
            // e.g. DEVICEHUB__DATABASE__URL=postgres://...
            .add_source(Environment::with_prefix("DEVICEHUB").separator("__"))
            .build()?;

        let config: Self = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let RetentionConfig {
            action_days,
            telemetry_days,
            audit_days,
        } = self.retention;
        if action_days < 1 || telemetry_days < 1 || audit_days < 1 {
            return Err(ConfigError::Message(
                "retention windows must be at least 1 day".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::Message(
                "database.max_connections must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// The signing secret, required only by commands that serve HTTP.
    pub fn jwt_secret(&self) -> Result<&str, ConfigError> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::Message(
                "auth.jwt_secret is not set (DEVICEHUB__AUTH__JWT_SECRET)".to_string(),
            ));
        }
        Ok(&self.auth.jwt_secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_files() {
        let config = ServerConfig::load("/nonexistent/device-hub-config").unwrap();
        assert_eq!(config.retention.action_days, 30);
        assert_eq!(config.retention.telemetry_days, 90);
        assert_eq!(config.retention.audit_days, 365);
        assert!(config.database.max_connections > 0);
    }

    #[test]
    fn test_retention_must_be_positive() {
        let mut config = ServerConfig::load("/nonexistent/device-hub-config").unwrap();
        config.retention.telemetry_days = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_jwt_secret_is_reported() {
        let mut config = ServerConfig::load("/nonexistent/device-hub-config").unwrap();
        config.auth.jwt_secret = String::new();
        assert!(config.jwt_secret().is_err());

        config.auth.jwt_secret = "s3cret".to_string();
        assert_eq!(config.jwt_secret().unwrap(), "s3cret");
    }
}
