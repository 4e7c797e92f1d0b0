use crate::answer::{NOISE_RESPONSE, NOT_FOUND_RESPONSE, RETRIEVAL_ERROR_RESPONSE, SCOPE_RESPONSE};
use crate::Passage;

const MISSING_PAGE_LABEL: &str = "N/A";

pub fn format_context(passages: &[Passage]) -> String {
    passages
        .iter()
        .map(|passage| {
            format!(
                "Page {}:\n{}",
                passage.page_label.as_deref().unwrap_or(MISSING_PAGE_LABEL),
                passage.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        r#"You are a document-based chatbot. Follow ALL rules below strictly.

RULE 1 – SINGLE RESPONSE:
Generate only one final answer. Do not attempt multiple generations or self-retries.

RULE 2 – GREETING:
If input is a greeting (hello, hi, hey, how are you, what can you do),
respond politely and explain you answer document-based questions.

RULE 3 – NOISE:
If input is random text, symbols, or meaningless words, respond:
"{NOISE_RESPONSE}"

RULE 4 – RETRIEVAL FAILURE:
If document context is empty or unavailable, respond:
"{RETRIEVAL_ERROR_RESPONSE}"

RULE 5 – HALLUCINATION PREVENTION:
Never guess or fabricate information when context is missing.

RULE 6 – ANSWER NOT FOUND:
If the answer is not in the document context, respond exactly:
"{NOT_FOUND_RESPONSE}"

RULE 7 – OUT OF SCOPE:
If the question is unrelated to the document, respond:
"{SCOPE_RESPONSE}"

RULE 8 – CLARIFICATION:
If the question is unclear or incomplete, ask for clarification instead of multiple attempts.

RULE 9 – EFFICIENCY & TONE:
Keep answers short, simple, polite, and helpful. Avoid unnecessary reasoning steps.

=== DOCUMENT CONTEXT ===
{context}

=== USER QUESTION ===
{question}

=== YOUR ANSWER ==="#
    )
}
