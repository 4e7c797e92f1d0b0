use crate::store::StoreHit;
use crate::traits::VectorIndex;
use crate::{PdfChunk, SearchError};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Value};
use url::Url;
use uuid::Uuid;

pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6333";
pub const DEFAULT_COLLECTION: &str = "learning_rag";

const UPSERT_BATCH: usize = 64;

pub struct QdrantStore {
    endpoint: String,
    collection: String,
    api_key: Option<String>,
    client: Client,
    vector_size: usize,
}

impl QdrantStore {
    pub fn new(
        endpoint: impl AsRef<str>,
        collection: impl Into<String>,
        vector_size: usize,
    ) -> Result<Self, SearchError> {
        let endpoint = Url::parse(endpoint.as_ref())?;
        Ok(Self {
            endpoint: endpoint.as_str().trim_end_matches('/').to_string(),
            collection: collection.into(),
            api_key: None,
            client: Client::new(),
            vector_size,
        })
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|key| !key.trim().is_empty());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn collection_url(&self) -> String {
        format!("{}/collections/{}", self.endpoint, self.collection)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("api-key", key),
            None => request,
        }
    }

    pub async fn collection_exists(&self) -> Result<bool, SearchError> {
        let response = self
            .authorize(self.client.get(self.collection_url()))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(backend_error(status, response.text().await.unwrap_or_default())),
        }
    }

    pub async fn delete_collection(&self) -> Result<(), SearchError> {
        let response = self
            .authorize(self.client.delete(self.collection_url()))
            .send()
            .await?;

        if !response.status().is_success() && response.status() != StatusCode::NOT_FOUND {
            return Err(backend_error(
                response.status(),
                response.text().await.unwrap_or_default(),
            ));
        }
        Ok(())
    }

    // Creates the collection when missing. With `recreate`, an existing
    // collection is dropped first so stale points do not survive a re-index.
    pub async fn ensure_collection(&self, recreate: bool) -> Result<(), SearchError> {
        if recreate {
            self.delete_collection().await?;
        } else if self.collection_exists().await? {
            return Ok(());
        }

        let response = self
            .authorize(self.client.put(self.collection_url()))
            .json(&json!({
                "vectors": {
                    "size": self.vector_size,
                    "distance": "Cosine",
                }
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(backend_error(
                response.status(),
                response.text().await.unwrap_or_default(),
            ));
        }

        tracing::info!(
            collection = %self.collection,
            vector_size = self.vector_size,
            "created qdrant collection"
        );
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for QdrantStore {
    async fn index_vector_chunks(
        &self,
        chunks: &[PdfChunk],
        embeddings: &[Vec<f32>],
    ) -> Result<(), SearchError> {
        if chunks.len() != embeddings.len() {
            return Err(SearchError::Request(format!(
                "embedding count {} doesn't match chunk count {}",
                embeddings.len(),
                chunks.len()
            )));
        }

        let points = chunks
            .iter()
            .zip(embeddings.iter())
            .map(|(chunk, embedding)| {
                if embedding.len() != self.vector_size {
                    return Err(SearchError::Request(format!(
                        "embedding dimension {} != {}",
                        embedding.len(),
                        self.vector_size
                    )));
                }
                Ok(point_for_chunk(chunk, embedding))
            })
            .collect::<Result<Vec<_>, SearchError>>()?;

        for batch in points.chunks(UPSERT_BATCH) {
            let response = self
                .authorize(
                    self.client
                        .put(format!("{}/points?wait=true", self.collection_url())),
                )
                .json(&json!({ "points": batch }))
                .send()
                .await?;

            if !response.status().is_success() {
                return Err(backend_error(
                    response.status(),
                    response.text().await.unwrap_or_default(),
                ));
            }
        }

        Ok(())
    }

    async fn search_vector(
        &self,
        query_vector: &[f32],
        limit: usize,
    ) -> Result<Vec<StoreHit>, SearchError> {
        if query_vector.len() != self.vector_size {
            return Err(SearchError::Request(format!(
                "query vector dim {} is not {}",
                query_vector.len(),
                self.vector_size
            )));
        }

        let response = self
            .authorize(
                self.client
                    .post(format!("{}/points/search", self.collection_url())),
            )
            .json(&json!({
                "vector": query_vector,
                "limit": limit,
                "with_payload": true,
                "with_vector": true,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(backend_error(
                response.status(),
                response.text().await.unwrap_or_default(),
            ));
        }

        let parsed: Value = response.json().await?;
        parse_search_hits(&parsed)
    }
}

fn backend_error(status: StatusCode, body: String) -> SearchError {
    SearchError::BackendResponse {
        backend: "qdrant".to_string(),
        details: if body.is_empty() {
            status.to_string()
        } else {
            format!("{status}: {body}")
        },
    }
}

fn point_id(chunk_id: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, chunk_id.as_bytes())
}

fn point_for_chunk(chunk: &PdfChunk, embedding: &[f32]) -> Value {
    json!({
        "id": point_id(&chunk.chunk_id).to_string(),
        "vector": embedding,
        "payload": {
            "page_content": chunk.text,
            "metadata": {
                "chunk_id": chunk.chunk_id,
                "document_id": chunk.document_id,
                "source": chunk.source_path,
                "title": chunk.title,
                "page": chunk.page,
                "page_label": chunk.page_label,
                "chunk_index": chunk.chunk_index,
                "ingested_at": chunk.ingested_at.to_rfc3339(),
            },
        },
    })
}

fn parse_search_hits(parsed: &Value) -> Result<Vec<StoreHit>, SearchError> {
    let hits = parsed
        .pointer("/result")
        .and_then(Value::as_array)
        .ok_or_else(|| SearchError::BackendResponse {
            backend: "qdrant".to_string(),
            details: "search response has no result array".to_string(),
        })?;

    let mut result = Vec::with_capacity(hits.len());
    for hit in hits {
        let id = match hit.pointer("/id") {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => String::new(),
        };
        let text = hit
            .pointer("/payload/page_content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let page_label = match hit.pointer("/payload/metadata/page_label") {
            Some(Value::String(label)) => Some(label.clone()),
            Some(Value::Number(label)) => Some(label.to_string()),
            _ => None,
        };
        let score = hit.pointer("/score").and_then(Value::as_f64).unwrap_or(0.0) as f32;
        let vector = hit
            .pointer("/vector")
            .and_then(Value::as_array)
            .map(|values| {
                values
                    .iter()
                    .filter_map(Value::as_f64)
                    .map(|value| value as f32)
                    .collect()
            })
            .unwrap_or_default();

        result.push(StoreHit {
            id,
            score,
            text,
            page_label,
            vector,
        });
    }

    Ok(result)
}
