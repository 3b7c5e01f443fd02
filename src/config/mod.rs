use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub api: ApiConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    /// Transport connect timeout; requests themselves are not time-limited
    pub connect_timeout_secs: u64,
    pub user_agent: String,
    pub enable_gzip: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub filter: String,
    /// Adds a debug directive for per-request logging in the API client
    pub log_requests: bool,
}

impl LoggingConfig {
    /// Filter directives for `tracing_subscriber::EnvFilter`
    pub fn directives(&self) -> String {
        if self.log_requests {
            format!("{},atlas_client::api=debug", self.filter)
        } else {
            self.filter.clone()
        }
    }
}

impl ApiConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..AppConfig::development().api
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // API overrides
        if let Ok(v) = env::var("ATLAS_API_BASE_URL") {
            if !v.trim().is_empty() {
                self.api.base_url = v.trim().to_string();
            }
        }
        if let Ok(v) = env::var("ATLAS_CONNECT_TIMEOUT_SECS") {
            self.api.connect_timeout_secs = v.parse().unwrap_or(self.api.connect_timeout_secs);
        }
        if let Ok(v) = env::var("ATLAS_USER_AGENT") {
            self.api.user_agent = v;
        }
        if let Ok(v) = env::var("ATLAS_ENABLE_GZIP") {
            self.api.enable_gzip = v.parse().unwrap_or(self.api.enable_gzip);
        }

        // Logging overrides
        if let Ok(v) = env::var("ATLAS_LOG_FILTER") {
            self.logging.filter = v;
        }
        if let Ok(v) = env::var("ATLAS_LOG_REQUESTS") {
            self.logging.log_requests = v.parse().unwrap_or(self.logging.log_requests);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            api: ApiConfig {
                base_url: "http://localhost:8000".to_string(),
                connect_timeout_secs: 10,
                user_agent: default_user_agent(),
                enable_gzip: false,
            },
            logging: LoggingConfig {
                filter: "atlas_client=debug,atlas=debug".to_string(),
                log_requests: true,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            api: ApiConfig {
                base_url: "https://staging.example.com/api".to_string(),
                connect_timeout_secs: 10,
                user_agent: default_user_agent(),
                enable_gzip: true,
            },
            logging: LoggingConfig {
                filter: "atlas_client=info,atlas=info".to_string(),
                log_requests: true,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            api: ApiConfig {
                base_url: "https://app.example.com/api".to_string(),
                connect_timeout_secs: 5,
                user_agent: default_user_agent(),
                enable_gzip: true,
            },
            logging: LoggingConfig {
                filter: "atlas_client=warn,atlas=warn".to_string(),
                log_requests: false,
            },
        }
    }
}

fn default_user_agent() -> String {
    format!("atlas-client/{}", env!("CARGO_PKG_VERSION"))
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_development {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Development)
    };
}
