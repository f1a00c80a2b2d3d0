use serde::Deserialize;

/// Prefix of every environment variable read by [`Config::from_env`].
pub const ENV_PREFIX: &str = "TODO";

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_db_url")]
    pub db_url: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Comma separated list of origins allowed to call the API from a browser.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: String,
}

impl Config {
    /// Loads configuration from `TODO_*` environment variables, e.g. `TODO_DB_URL`.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_builder(
            config::Config::builder().add_source(config::Environment::with_prefix(ENV_PREFIX)),
        )
    }

    /// Builds the configuration from any prepared source.
    pub fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> anyhow::Result<Self> {
        let settings = builder.build()?;
        let config: Config = settings.try_deserialize()?;
        Ok(config)
    }

    /// Address the HTTP listener binds to.
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The configured CORS origins, trimmed, without empty entries.
    pub fn allowed_origins(&self) -> Vec<&str> {
        self.cors_origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .collect()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_url: default_db_url(),
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
        }
    }
}

fn default_db_url() -> String {
    "sqlite://todos.db?mode=rwc".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origins() -> String {
    [
        "http://localhost:5173",
        "http://localhost:3000",
        "http://127.0.0.1:5173",
        "http://127.0.0.1:3000",
    ]
    .join(",")
}
