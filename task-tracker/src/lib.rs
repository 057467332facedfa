pub mod config {
    use serde::Deserialize;
    use std::path::PathBuf;

    #[derive(Deserialize, Debug, Clone)]
    pub struct Config {
        #[serde(default = "default_bind_address")]
        pub bind_address: String,
        #[serde(default = "default_port")]
        pub port: u16,
        #[serde(default = "default_data_file")]
        pub data_file: PathBuf,
        /// Removes a task's comments together with the task when set.
        #[serde(default)]
        pub cascade_comment_deletes: bool,
    }

    impl Config {
        /// Loads configuration from environment variables.
        pub fn from_env() -> anyhow::Result<Self> {
            Self::from_environment(config::Environment::default())
        }

        /// Loads configuration from the given environment source.
        pub fn from_environment(environment: config::Environment) -> anyhow::Result<Self> {
            let settings = config::Config::builder()
                .add_source(environment.try_parsing(true))
                .build()?;

            let config: Config = settings.try_deserialize()?;
            Ok(config)
        }
    }

    impl Default for Config {
        fn default() -> Self {
            Self {
                bind_address: default_bind_address(),
                port: default_port(),
                data_file: default_data_file(),
                cascade_comment_deletes: false,
            }
        }
    }

    fn default_bind_address() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        5000
    }

    fn default_data_file() -> PathBuf {
        PathBuf::from("data.json")
    }

}
pub mod comment;
pub mod store;
pub mod task;
pub mod user;
pub mod web;
