//! Application settings, bot credentials and database configuration.

use std::time::Duration;

use sqlx::postgres::PgConnectOptions;

/// Telegram Bot API configuration.
#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot token issued by `@BotFather`.
    pub token: String,
}

impl TelegramConfig {
    /// Creates a new Telegram configuration.
    #[must_use]
    pub fn new(token: String) -> Self {
        Self { token }
    }

    /// Creates configuration from environment variables.
    ///
    /// Expects `TELEGRAM_BOT_TOKEN` to be set.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is missing or empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let token = lookup("TELEGRAM_BOT_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingEnvVar("TELEGRAM_BOT_TOKEN"))?;

        Ok(Self { token })
    }
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &mask_secret(&self.token))
            .finish()
    }
}

/// PostgreSQL connection parameters.
#[derive(Clone)]
pub struct DatabaseConfig {
    /// Full connection URL; takes precedence over the individual fields.
    pub url: Option<String>,

    /// Database host.
    pub host: String,

    /// Database port.
    pub port: u16,

    /// Database user.
    pub user: Option<String>,

    /// Database password.
    pub password: Option<String>,

    /// Database name.
    pub database: Option<String>,

    /// Schema placed on the connection `search_path`.
    pub schema: Option<String>,
}

fn default_host() -> String {
    "localhost".to_owned()
}

fn default_port() -> u16 {
    5432
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: default_host(),
            port: default_port(),
            user: None,
            password: None,
            database: None,
            schema: None,
        }
    }
}

impl DatabaseConfig {
    /// Creates configuration from environment variables.
    ///
    /// Uses `DATABASE_URL` when present, otherwise the libpq-style
    /// `PGHOST`, `PGPORT`, `PGUSER`, `PGPASSWORD` and `PGDATABASE`.
    /// `DB_SCHEMA` applies in both cases.
    ///
    /// # Errors
    ///
    /// Returns an error if `PGPORT` is not a valid port number.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("PGPORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidPort(raw))?,
            None => default_port(),
        };

        Ok(Self {
            url: lookup("DATABASE_URL").filter(|u| !u.is_empty()),
            host: lookup("PGHOST").unwrap_or_else(default_host),
            port,
            user: lookup("PGUSER"),
            password: lookup("PGPASSWORD"),
            database: lookup("PGDATABASE"),
            schema: lookup("DB_SCHEMA").filter(|s| !s.is_empty()),
        })
    }

    /// Builds `sqlx` connection options from this configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `url` is set but cannot be parsed.
    pub fn connect_options(&self) -> Result<PgConnectOptions, ConfigError> {
        let mut options = match &self.url {
            Some(url) => url
                .parse::<PgConnectOptions>()
                .map_err(|e| ConfigError::InvalidDatabaseUrl(e.to_string()))?,
            None => {
                let mut options = PgConnectOptions::new_without_pgpass()
                    .host(&self.host)
                    .port(self.port);
                if let Some(user) = &self.user {
                    options = options.username(user);
                }
                if let Some(password) = &self.password {
                    options = options.password(password);
                }
                if let Some(database) = &self.database {
                    options = options.database(database);
                }
                options
            }
        };

        if let Some(schema) = &self.schema {
            options = options.options([("search_path", schema.as_str())]);
        }

        Ok(options)
    }

    /// Returns a description of the target suitable for logs.
    #[must_use]
    pub fn display_target(&self) -> String {
        if self.url.is_some() {
            return "DATABASE_URL".to_owned();
        }
        format!(
            "{}:{}/{}",
            self.host,
            self.port,
            self.database.as_deref().unwrap_or("<default>")
        )
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url.as_deref().map(|_| "***"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_deref().map(|_| "***"))
            .field("database", &self.database)
            .field("schema", &self.schema)
            .finish()
    }
}

/// Bot-specific settings.
#[derive(Debug, Clone)]
pub struct BotSettings {
    /// Message text that re-shows the action menu.
    pub menu_trigger: String,

    /// Maximum number of pooled database connections.
    pub max_connections: u32,

    /// How long to wait for a pooled connection, in seconds.
    pub acquire_timeout_secs: u64,
}

fn default_menu_trigger() -> String {
    ".".to_owned()
}

fn default_max_connections() -> u32 {
    5
}

fn default_acquire_timeout() -> u64 {
    30
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            menu_trigger: default_menu_trigger(),
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout(),
        }
    }
}

impl BotSettings {
    /// Creates bot settings from environment variables with defaults.
    #[must_use]
    pub fn from_env_with_defaults() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            menu_trigger: lookup("MENU_TRIGGER")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(default_menu_trigger),
            max_connections: lookup("DB_MAX_CONNECTIONS")
                .and_then(|s| s.parse().ok())
                .filter(|&n| n > 0)
                .unwrap_or_else(default_max_connections),
            acquire_timeout_secs: lookup("DB_ACQUIRE_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_acquire_timeout),
        }
    }

    /// Pool acquire timeout as a [`Duration`].
    #[must_use]
    pub const fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid PGPORT value: {0:?}")]
    InvalidPort(String),

    #[error("Invalid DATABASE_URL: {0}")]
    InvalidDatabaseUrl(String),
}

/// Masks a secret for logging (shows the last 4 characters).
fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count > 8 {
        let tail: String = secret.chars().skip(count - 4).collect();
        format!("***{tail}")
    } else {
        "****".to_owned()
    }
}
