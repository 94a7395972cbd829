//! Remote prompt generation via the Anthropic Messages API.
//!
//! Errors here never reach the session FSM; the fallback source shadows
//! every failure with the local template bank.

use std::collections::HashSet;
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const MODEL: &str = "claude-3-5-haiku-latest";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

pub struct RemoteGenerator {
    client: reqwest::Client,
    api_key: String,
}

impl RemoteGenerator {
    pub fn new(api_key: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { client, api_key }
    }

    async fn complete(&self, system: &str, user: &str, max_tokens: u32) -> anyhow::Result<String> {
        let body = json!({
            "model": MODEL,
            "max_tokens": max_tokens,
            "system": system,
            "messages": [{"role": "user", "content": user}],
        });

        let response = self
            .client
            .post(API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("API returned {status}: {detail}");
        }

        let parsed: MessagesResponse = response.json().await?;
        parsed
            .content
            .first()
            .map(|block| block.text.clone())
            .ok_or_else(|| anyhow::anyhow!("API response contained no text content"))
    }

    /// Request `count` prompts as a line-separated list. A short or partly
    /// unusable response is fine; the caller tops up locally.
    pub async fn generate_prompts(
        &self,
        count: usize,
        seen: &HashSet<String>,
        theme: Option<&str>,
    ) -> anyhow::Result<Vec<String>> {
        let system = "You write short, funny fill-in-the-blank prompts for a party game, \
                      in the style of \"The worst name for a boat\". One prompt per line, \
                      no numbering, no quotes, under 90 characters each.";
        let user = match theme {
            Some(theme) => format!("Write {count} prompts themed around: {theme}"),
            None => format!("Write {count} prompts on any everyday topics"),
        };

        let text = self.complete(system, &user, 1024).await?;
        let prompts: Vec<String> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && line.len() <= 120)
            .map(str::to_string)
            .filter(|line| !seen.contains(line))
            .take(count)
            .collect();

        tracing::debug!(requested = count, received = prompts.len(), "Remote prompt batch");
        Ok(prompts)
    }

    /// Request one story setup ending in a cliffhanger for the finale.
    pub async fn generate_flashback(
        &self,
        seen: &HashSet<String>,
        theme: Option<&str>,
    ) -> anyhow::Result<String> {
        let system = "You write one-sentence story setups for a party game. The sentence \
                      must end with an ellipsis so players can finish the story. Reply \
                      with the sentence only.";
        let user = match theme {
            Some(theme) => format!("Write one story setup themed around: {theme}"),
            None => "Write one story setup".to_string(),
        };

        let text = self.complete(system, &user, 256).await?;
        let setup = text.trim().to_string();
        if setup.is_empty() || seen.contains(&setup) {
            anyhow::bail!("unusable story setup");
        }
        Ok(if setup.ends_with("...") {
            setup
        } else {
            format!("{}...", setup.trim_end_matches(['.', '!', '?']))
        })
    }

    /// Minimal live call used by the config test endpoint.
    pub async fn probe(api_key: &str) -> Result<(), String> {
        let generator = Self::new(api_key.to_string());
        generator
            .complete("Reply with the word ok.", "ping", 8)
            .await
            .map(|_| ())
            .map_err(|err| err.to_string())
    }
}
