use serde::Deserialize;

pub const DEFAULT_API_URL: &str = "http://localhost:8080";

#[derive(Deserialize, Debug)]
pub struct Config {
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

impl Config {
    /// Loads configuration from environment variables (`TODO_API_URL`).
    pub fn from_env() -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix("TODO"))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        Ok(config)
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}
