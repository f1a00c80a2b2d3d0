use serde::Deserialize;

/// Prefix of every environment variable read by [`ClientConfig::from_env`].
pub const ENV_PREFIX: &str = "TODO";

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the server, without the `/api/todos` suffix.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Interface the browser front end listens on.
    #[serde(default = "default_ui_host")]
    pub ui_host: String,
    #[serde(default = "default_ui_port")]
    pub ui_port: u16,
}

impl ClientConfig {
    /// Loads configuration from `TODO_*` environment variables, e.g. `TODO_API_URL`
    /// or `TODO_UI_PORT`.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_builder(
            config::Config::builder().add_source(config::Environment::with_prefix(ENV_PREFIX)),
        )
    }

    pub fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> anyhow::Result<Self> {
        let settings = builder.build()?;
        Ok(settings.try_deserialize()?)
    }

    pub fn ui_address(&self) -> String {
        format!("{}:{}", self.ui_host, self.ui_port)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            ui_host: default_ui_host(),
            ui_port: default_ui_port(),
        }
    }
}

fn default_api_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_ui_host() -> String {
    "127.0.0.1".to_string()
}

fn default_ui_port() -> u16 {
    5173
}
