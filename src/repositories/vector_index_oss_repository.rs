use crate::{
    configuration::VectorIndexSettings,
    domain::entities::{predicate::Predicate, vector_record::VectorRecord},
    ports::vector_index_port::{
        VectorIndexPort, VectorQuery, VectorQueryError, VectorQueryResponse,
    },
};
use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const REQUEST_ID_HEADER: &str = "x-oss-request-id";

/// Vector index hosted in an OSS vector bucket.
///
/// Only the "query vectors" operation is used: the index is populated by a separate ingestion process.
pub struct OssVectorIndexRepository {
    http_client: reqwest::Client,
    base_url: String,
    api_key: Secret<String>,
    bucket: String,
    index: String,
    dimension: usize,
}

impl OssVectorIndexRepository {
    pub fn try_new(settings: &VectorIndexSettings) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()?;

        Ok(Self {
            http_client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            bucket: settings.bucket.clone(),
            index: settings.index.clone(),
            dimension: settings.dimension,
        })
    }

    fn request_body<'a>(&'a self, query: &'a VectorQuery) -> QueryVectorsBody<'a> {
        QueryVectorsBody {
            vector_bucket_name: &self.bucket,
            index_name: &self.index,
            query_vector: QueryVectorData {
                float32: &query.vector,
            },
            filter: query.filter.as_ref(),
            top_k: query.top_k.get(),
            return_distance: query.return_distance,
            return_metadata: query.return_metadata,
        }
    }
}

#[async_trait]
impl VectorIndexPort for OssVectorIndexRepository {
    fn dimension(&self) -> usize {
        self.dimension
    }

    #[tracing::instrument(
        name = "Querying nearest vectors",
        skip(self, query),
        fields(top_k = query.top_k.get(), filter = ?query.filter)
    )]
    async fn query(&self, query: &VectorQuery) -> Result<VectorQueryResponse, VectorQueryError> {
        if query.vector.len() != self.dimension {
            return Err(VectorQueryError::DimensionMismatch {
                expected: self.dimension,
                actual: query.vector.len(),
            });
        }

        let response = self
            .http_client
            .post(format!("{}/?queryVectors", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&self.request_body(query))
            .send()
            .await?;

        let status = response.status();
        let header_request_id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(String::from);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VectorQueryError::QueryError {
                status: status.as_u16(),
                message: index_error_message(&body),
                request_id: header_request_id,
            });
        }

        let body: QueryVectorsResponseBody = response.json().await?;
        let request_id = header_request_id.or(body.request_id);
        let vectors: Vec<VectorRecord> = body
            .vectors
            .into_iter()
            .map(|record| fit_record_to_query(record, query))
            .collect();

        info!(
            bucket = %self.bucket,
            index = %self.index,
            ?request_id,
            nb_vectors = vectors.len(),
            "Queried vectors"
        );
        Ok(VectorQueryResponse {
            request_id,
            vectors,
        })
    }
}

/// Keeps only the fields the query asked for, so every record has the same shape
fn fit_record_to_query(mut record: VectorRecord, query: &VectorQuery) -> VectorRecord {
    if !query.return_distance {
        record.distance = None;
    } else if record.distance.is_none() {
        warn!(key = %record.key, "Distance was requested but is missing from the record");
    }

    if !query.return_metadata {
        record.metadata = None;
    } else if record.metadata.is_none() {
        warn!(key = %record.key, "Metadata was requested but is missing from the record");
    }

    record
}

/// Extracts the message from an error body (`{"Code", "Message"}` or `{"code", "message"}`),
/// or keeps the raw body
fn index_error_message(body: &str) -> String {
    match serde_json::from_str::<IndexErrorBody>(body) {
        Ok(IndexErrorBody {
            code: Some(code),
            message: Some(message),
        }) => format!("{}: {}", code, message),
        Ok(IndexErrorBody {
            message: Some(message),
            ..
        }) => message,
        _ => body.to_string(),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryVectorsBody<'a> {
    vector_bucket_name: &'a str,
    index_name: &'a str,
    query_vector: QueryVectorData<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<&'a Predicate>,
    top_k: u32,
    return_distance: bool,
    return_metadata: bool,
}

/// Query vector keyed by its element type
#[derive(Debug, Serialize)]
struct QueryVectorData<'a> {
    float32: &'a [f32],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryVectorsResponseBody {
    #[serde(default)]
    vectors: Vec<VectorRecord>,
    #[serde(default)]
    request_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IndexErrorBody {
    #[serde(alias = "Code")]
    code: Option<String>,
    #[serde(alias = "Message")]
    message: Option<String>,
}
