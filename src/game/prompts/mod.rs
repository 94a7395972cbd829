//! Prompt sources.
//!
//! The session FSM consumes prompts through the [`PromptSource`] trait only.
//! The built-in template generator always succeeds; the optional remote
//! generator (Anthropic Messages API) is wrapped by a fallback that tops up
//! any shortfall locally, so callers never observe a short batch or an error.

mod local;
mod remote;

pub use local::LocalPromptSource;
pub use remote::RemoteGenerator;

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::protocol::LastLashMode;

/// A finale prompt descriptor.
#[derive(Debug, Clone)]
pub struct LastLashPrompt {
    pub prompt: String,
    pub mode: LastLashMode,
    pub letters: Option<Vec<char>>,
    pub instructions: Option<String>,
}

/// Produces distinct prompt strings, avoiding a caller-supplied "seen" set.
/// Implementations add every returned string to `seen`.
///
/// Must be safe for concurrent use from multiple room tasks.
#[async_trait]
pub trait PromptSource: Send + Sync {
    /// Return exactly `count` distinct prompts not present in `seen`.
    async fn generate_prompts(
        &self,
        count: usize,
        seen: &mut HashSet<String>,
        theme: Option<&str>,
    ) -> Vec<String>;

    /// Return one finale prompt with its mode and any letters.
    async fn generate_last_lash(
        &self,
        seen: &mut HashSet<String>,
        theme: Option<&str>,
    ) -> LastLashPrompt;
}

/// Remote-first prompt source with an infallible local floor.
pub struct FallbackPromptSource {
    local: LocalPromptSource,
    remote: RwLock<Option<RemoteGenerator>>,
}

impl FallbackPromptSource {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            local: LocalPromptSource::new(),
            remote: RwLock::new(api_key.map(RemoteGenerator::new)),
        }
    }

    /// Swap in a remote generator for a newly configured key. Rooms pick up
    /// the change on their next prompt request.
    pub async fn set_remote_key(&self, api_key: &str) {
        let mut remote = self.remote.write().await;
        *remote = Some(RemoteGenerator::new(api_key.to_string()));
        tracing::info!("Remote prompt generation enabled");
    }

    pub async fn remote_ready(&self) -> bool {
        self.remote.read().await.is_some()
    }
}

#[async_trait]
impl PromptSource for FallbackPromptSource {
    async fn generate_prompts(
        &self,
        count: usize,
        seen: &mut HashSet<String>,
        theme: Option<&str>,
    ) -> Vec<String> {
        let mut batch: Vec<String> = Vec::with_capacity(count);

        let remote = self.remote.read().await;
        if let Some(generator) = remote.as_ref() {
            match generator.generate_prompts(count, seen, theme).await {
                Ok(remote_batch) => batch = remote_batch,
                Err(err) => {
                    tracing::warn!(error = %err, "Remote prompt generation failed, using local bank");
                }
            }
        }
        drop(remote);

        for text in &batch {
            seen.insert(text.clone());
        }

        if batch.len() < count {
            let shortfall = count - batch.len();
            if !batch.is_empty() {
                tracing::debug!(shortfall, "Topping up prompt batch from local bank");
            }
            batch.extend(self.local.generate_prompts(shortfall, seen, theme).await);
        }

        batch
    }

    async fn generate_last_lash(
        &self,
        seen: &mut HashSet<String>,
        theme: Option<&str>,
    ) -> LastLashPrompt {
        let mode = local::pick_last_lash_mode();

        if mode == LastLashMode::Flashback {
            let remote = self.remote.read().await;
            if let Some(generator) = remote.as_ref() {
                match generator.generate_flashback(seen, theme).await {
                    Ok(prompt) => {
                        seen.insert(prompt.clone());
                        return self.local.flashback_with_prompt(prompt);
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "Remote finale generation failed, using local bank");
                    }
                }
            }
        }

        self.local.last_lash_for_mode(mode, seen, theme)
    }
}
