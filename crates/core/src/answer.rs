use crate::classifier::{classify, QueryKind};
use crate::prompt::{build_prompt, format_context};
use crate::traits::{ChatModel, Retriever};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

pub const GREETING_RESPONSE: &str = "Hello! 👋 I'm your **RAG Document Assistant**, powered by Gemini + Qdrant.\n\n\
I answer questions based on the uploaded document. \
Feel free to ask me anything about its content!";

pub const NOISE_RESPONSE: &str =
    "I couldn't understand your question. Please ask a clear question related to the document.";

pub const SCOPE_RESPONSE: &str = "I can only answer questions based on the uploaded document.";

pub const RATE_LIMIT_RESPONSE: &str =
    "I'm currently receiving too many requests. Please wait a few seconds and try again.";

pub const RETRIEVAL_ERROR_RESPONSE: &str = "I'm having trouble accessing the document right now.";

pub const NOT_FOUND_RESPONSE: &str = "I could not find this information in the document.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerKind {
    Noise,
    Greeting,
    Generated,
    NotFound,
    RetrievalError,
    RateLimited,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub kind: AnswerKind,
    pub text: String,
}

impl Answer {
    fn canned(kind: AnswerKind, text: &str) -> Self {
        Self {
            kind,
            text: text.to_string(),
        }
    }
}

#[derive(Clone)]
pub struct Assistant {
    retriever: Option<Arc<dyn Retriever>>,
    llm: Arc<dyn ChatModel>,
}

impl Assistant {
    // `retriever` is `None` when the vector index could not be reached at
    // startup; substantive questions then get the retrieval error message.
    pub fn new(retriever: Option<Arc<dyn Retriever>>, llm: Arc<dyn ChatModel>) -> Self {
        Self { retriever, llm }
    }

    pub async fn answer(&self, question: &str) -> Answer {
        match classify(question) {
            QueryKind::Noise => return Answer::canned(AnswerKind::Noise, NOISE_RESPONSE),
            QueryKind::Greeting => return Answer::canned(AnswerKind::Greeting, GREETING_RESPONSE),
            QueryKind::Substantive => {}
        }

        let Some(retriever) = &self.retriever else {
            error!("vector index was not initialized at startup");
            return Answer::canned(AnswerKind::RetrievalError, RETRIEVAL_ERROR_RESPONSE);
        };

        let started = Instant::now();
        info!(query = %question, "starting retrieval");
        let passages = match retriever.retrieve(question).await {
            Ok(passages) => passages,
            Err(err) => {
                error!(error = %err, "retrieval failed");
                return Answer::canned(AnswerKind::RetrievalError, RETRIEVAL_ERROR_RESPONSE);
            }
        };
        info!(
            passages = passages.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "retrieval finished"
        );

        if passages.is_empty() {
            return Answer::canned(AnswerKind::NotFound, NOT_FOUND_RESPONSE);
        }

        let prompt = build_prompt(&format_context(&passages), question);

        let started = Instant::now();
        info!(model = self.llm.model_name(), "starting generation");
        match self.llm.generate(&prompt).await {
            Ok(text) => {
                info!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "generation finished"
                );
                let text = text.trim();
                if text.is_empty() {
                    Answer::canned(AnswerKind::NotFound, NOT_FOUND_RESPONSE)
                } else {
                    Answer {
                        kind: AnswerKind::Generated,
                        text: text.to_string(),
                    }
                }
            }
            Err(err) if err.is_rate_limited() => {
                warn!(error = %err, "model is rate limited");
                Answer::canned(AnswerKind::RateLimited, RATE_LIMIT_RESPONSE)
            }
            Err(err) => {
                error!(error = %err, "generation failed");
                Answer::canned(AnswerKind::RetrievalError, RETRIEVAL_ERROR_RESPONSE)
            }
        }
    }
}
