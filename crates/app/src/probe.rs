use crate::server::ChatResponse;
use anyhow::Context;
use serde_json::json;
use std::time::Duration;

/// One labelled question per answer path the server can take.
pub const PROBE_CASES: [(&str, &str); 6] = [
    ("GREETING", "hello"),
    ("GREETING2", "hi, what can you do?"),
    ("NOISE", "^ #$%# asdasd 123456"),
    ("NOISE2", "!!!"),
    ("OUT-OF-SCOPE", "What is the weather in Mumbai?"),
    ("DOCUMENT Q", "What is ICICI Pru iProtect Smart Plus?"),
];

const PREVIEW_CHARS: usize = 200;

pub async fn run(base_url: &str) -> anyhow::Result<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;
    let url = format!("{}/chat", base_url.trim_end_matches('/'));

    for (label, question) in PROBE_CASES {
        let response: ChatResponse = client
            .post(&url)
            .json(&json!({ "question": question }))
            .send()
            .await
            .with_context(|| format!("failed to reach {url}"))?
            .error_for_status()?
            .json()
            .await
            .context("response was not a chat answer")?;

        println!("[{label}] Q: {question}");
        println!("         A: {}", preview(&response.answer));
        println!();
    }

    Ok(())
}

fn preview(answer: &str) -> String {
    answer.chars().take(PREVIEW_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::{preview, PROBE_CASES};
    use doc_assistant_core::{classify, QueryKind};

    #[test]
    fn probe_cases_cover_every_classification() {
        let kinds: Vec<QueryKind> = PROBE_CASES
            .iter()
            .map(|(_, question)| classify(question))
            .collect();
        assert!(kinds.contains(&QueryKind::Greeting));
        assert!(kinds.contains(&QueryKind::Noise));
        assert!(kinds.contains(&QueryKind::Substantive));
    }

    #[test]
    fn preview_is_cut_on_char_boundaries() {
        let answer = "é".repeat(300);
        assert_eq!(preview(&answer).chars().count(), 200);
    }
}
