use crate::{
    configuration::EmbeddingSettings,
    domain::entities::embedding::{Embedding, EmbeddingInput},
    ports::embedding_port::{EmbeddingError, EmbeddingPort},
};
use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use tracing::info;

const MULTIMODAL_EMBEDDING_PATH: &str =
    "api/v1/services/embeddings/multimodal-embedding/multimodal-embedding";

/// Weight of the single item sent to the provider
const ITEM_FACTOR: f32 = 1.0;

/// Multimodal embeddings from DashScope (Alibaba Cloud Model Studio).
///
/// The same model embeds texts and images in one vector space,
/// so a text query can be matched against image vectors.
pub struct DashScopeEmbeddingRepository {
    http_client: reqwest::Client,
    base_url: String,
    api_key: Secret<String>,
    model: String,
}

impl DashScopeEmbeddingRepository {
    pub fn try_new(settings: &EmbeddingSettings) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()?;

        Ok(Self {
            http_client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
        })
    }

    fn request_body<'a>(&'a self, input: &'a EmbeddingInput) -> EmbeddingRequestBody<'a> {
        let item = match input {
            EmbeddingInput::Text(text) => EmbeddingRequestItem::Text {
                text,
                factor: ITEM_FACTOR,
            },
            EmbeddingInput::Image(image) => EmbeddingRequestItem::Image {
                image,
                factor: ITEM_FACTOR,
            },
        };

        EmbeddingRequestBody {
            model: &self.model,
            input: EmbeddingRequestInput {
                contents: vec![item],
            },
        }
    }
}

#[async_trait]
impl EmbeddingPort for DashScopeEmbeddingRepository {
    #[tracing::instrument(name = "Generating an embedding with DashScope", skip(self))]
    async fn embed(&self, input: &EmbeddingInput) -> Result<Embedding, EmbeddingError> {
        let is_empty = match input {
            EmbeddingInput::Text(text) => text.trim().is_empty(),
            EmbeddingInput::Image(url) => url.trim().is_empty(),
        };
        if is_empty {
            return Err(EmbeddingError::EmptyInput);
        }

        let url = format!("{}/{}", self.base_url, MULTIMODAL_EMBEDDING_PATH);
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&self.request_body(input))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ProviderError {
                status: status.as_u16(),
                message: provider_error_message(&body),
            });
        }

        let body: EmbeddingResponseBody = response.json().await?;
        info!(request_id = ?body.request_id, "Generated embedding");

        body.output
            .embeddings
            .into_iter()
            .next()
            .map(|item| item.embedding)
            .ok_or(EmbeddingError::EmptyResponse)
    }
}

/// Extracts `code: message` from a DashScope error body, or keeps the raw body
fn provider_error_message(body: &str) -> String {
    match serde_json::from_str::<ProviderErrorBody>(body) {
        Ok(ProviderErrorBody {
            code: Some(code),
            message: Some(message),
        }) => format!("{}: {}", code, message),
        Ok(ProviderErrorBody {
            message: Some(message),
            ..
        }) => message,
        _ => body.to_string(),
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequestBody<'a> {
    model: &'a str,
    input: EmbeddingRequestInput<'a>,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequestInput<'a> {
    contents: Vec<EmbeddingRequestItem<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum EmbeddingRequestItem<'a> {
    Text { text: &'a str, factor: f32 },
    Image { image: &'a str, factor: f32 },
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponseBody {
    output: EmbeddingOutput,
    #[serde(default)]
    request_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingOutput {
    #[serde(default)]
    embeddings: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    embedding: Embedding,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    code: Option<String>,
    message: Option<String>,
}
