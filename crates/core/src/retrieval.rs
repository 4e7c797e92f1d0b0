use crate::embeddings::Embedder;
use crate::mmr::mmr_rerank;
use crate::traits::{Retriever, VectorIndex};
use crate::{Passage, RetrievalOptions, SearchError};
use async_trait::async_trait;

pub struct VectorRetriever<E, V> {
    embedder: E,
    index: V,
    options: RetrievalOptions,
}

impl<E, V> VectorRetriever<E, V>
where
    E: Embedder,
    V: VectorIndex,
{
    pub fn new(embedder: E, index: V, options: RetrievalOptions) -> Self {
        Self {
            embedder,
            index,
            options,
        }
    }
}

#[async_trait]
impl<E, V> Retriever for VectorRetriever<E, V>
where
    E: Embedder,
    V: VectorIndex,
{
    async fn retrieve(&self, query: &str) -> Result<Vec<Passage>, SearchError> {
        if query.trim().is_empty() {
            return Err(SearchError::Request("query is empty".to_string()));
        }

        let query_vector = self.embedder.embed(query).await?;
        let fetch_k = self.options.fetch_k.max(self.options.k);
        let hits = self.index.search_vector(&query_vector, fetch_k).await?;

        let candidates = hits
            .into_iter()
            .map(|hit| hit.into_mmr_candidate())
            .collect();

        Ok(mmr_rerank(
            &query_vector,
            candidates,
            self.options.k,
            self.options.lambda,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::CharacterNgramEmbedder;
    use crate::store::StoreHit;
    use crate::PdfChunk;
    use std::sync::Mutex;

    struct FakeIndex {
        hits: Vec<StoreHit>,
        requested_limit: Mutex<Option<usize>>,
    }

    #[async_trait]
    impl VectorIndex for FakeIndex {
        async fn index_vector_chunks(
            &self,
            _chunks: &[PdfChunk],
            _embeddings: &[Vec<f32>],
        ) -> Result<(), SearchError> {
            Ok(())
        }

        async fn search_vector(
            &self,
            _query_vector: &[f32],
            limit: usize,
        ) -> Result<Vec<StoreHit>, SearchError> {
            if let Ok(mut slot) = self.requested_limit.lock() {
                *slot = Some(limit);
            }
            Ok(self.hits.iter().take(limit).cloned().collect())
        }
    }

    fn hit(embedder: &CharacterNgramEmbedder, text: &str, page: &str) -> StoreHit {
        StoreHit {
            id: text.to_string(),
            score: 0.0,
            text: text.to_string(),
            page_label: Some(page.to_string()),
            vector: embedder.embed_sync(text),
        }
    }

    #[tokio::test]
    async fn retrieves_k_passages_from_a_larger_pool() -> Result<(), SearchError> {
        let embedder = CharacterNgramEmbedder::default();
        let hits = (0..10)
            .map(|index| hit(&embedder, &format!("premium payment option {index}"), "2"))
            .collect();
        let index = FakeIndex {
            hits,
            requested_limit: Mutex::new(None),
        };

        let retriever = VectorRetriever::new(embedder, index, RetrievalOptions::default());
        let passages = retriever.retrieve("premium payment").await?;

        assert_eq!(passages.len(), 4);
        assert_eq!(passages[0].page_label.as_deref(), Some("2"));
        let limit = retriever
            .index
            .requested_limit
            .lock()
            .ok()
            .and_then(|slot| *slot);
        assert_eq!(limit, Some(10));
        Ok(())
    }

    #[tokio::test]
    async fn empty_query_is_rejected() {
        let retriever = VectorRetriever::new(
            CharacterNgramEmbedder::default(),
            FakeIndex {
                hits: Vec::new(),
                requested_limit: Mutex::new(None),
            },
            RetrievalOptions::default(),
        );
        assert!(retriever.retrieve("   ").await.is_err());
    }
}
