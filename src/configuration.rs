use secrecy::Secret;
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;
use std::time::Duration;

/// Every setting of the service, built once at startup and handed to each component.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub embedding: EmbeddingSettings,
    pub vector_index: VectorIndexSettings,
    pub images: ImagesSettings,
    /// Only needed when images are read from an S3-compatible bucket
    pub object_storage: Option<ObjectStorageSettings>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    /// Number of search pipelines allowed to run at the same time.
    /// Further requests wait for a free slot.
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_concurrent_searches: usize,
}

/// Multimodal embedding provider (DashScope API)
#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingSettings {
    pub base_url: String,
    pub api_key: Secret<String>,
    pub model: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

impl EmbeddingSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_milliseconds)
    }
}

/// Managed vector index (OSS Vectors API)
#[derive(Debug, Deserialize, Clone)]
pub struct VectorIndexSettings {
    pub base_url: String,
    pub api_key: Secret<String>,
    pub bucket: String,
    pub index: String,
    /// Must match the dimension the index was created with
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub dimension: usize,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

impl VectorIndexSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_milliseconds)
    }
}

/// Where the images referenced by the vector keys live
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ImageBackend {
    Local,
    Url,
    ObjectStorage,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImagesSettings {
    pub backend: ImageBackend,
    /// Used by the `local` backend
    pub directory: Option<String>,
    /// Used by the `url` backend, ex: `http://my-bucket.oss-cn-hangzhou.aliyuncs.com/photograph/`
    pub url_prefix: Option<String>,
    /// Used by the `object_storage` backend
    pub object_folder: Option<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

impl ImagesSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_milliseconds)
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct ObjectStorageSettings {
    pub username: String,
    pub password: Secret<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    pub region: String,
    pub bucket_name: String,
}

impl ObjectStorageSettings {
    pub fn endpoint(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// Extracts app settings from configuration files and env variables
///
/// `base.yaml` contains the settings shared by all environments.
/// Each environment has its own file: `develop.yaml`, `local.yaml` and `production.yaml`,
/// selected with the env var `APP_ENVIRONMENT` (`develop` by default).
///
/// Settings are also read from environment variables, with a prefix of APP and '__' as separator.
/// For ex: `APP_EMBEDDING__API_KEY=sk-xxx` sets `Settings.embedding.api_key`
pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().map_err(|e| {
        config::ConfigError::Message(format!("Failed to determine the current directory: {e}"))
    })?;
    let configuration_directory = base_path.join("configuration");

    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "develop".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;
    let environment_filename = format!("{}.yaml", environment.as_str());

    let settings = config::Config::builder()
        .add_source(config::File::from(
            configuration_directory.join("base.yaml"),
        ))
        .add_source(config::File::from(
            configuration_directory.join(environment_filename),
        ))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

/// The possible runtime environment for our application.
pub enum Environment {
    Develop,
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Develop => "develop",
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "develop" => Ok(Self::Develop),
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `develop`, `local` or `production`.",
                other
            )),
        }
    }
}
