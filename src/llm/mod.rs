//! LLM provider setup via rig-core, plus the generation client.
//!
//! The remote service is reached through the [`Completer`] seam: one
//! prompt in, free text out. [`RigCompleter`] is the production
//! implementation backed by DeepSeek's chat model; tests substitute their
//! own implementation.
//!
//! # Example
//! ```no_run
//! use essaygen::llm::{GenerationClient, RigCompleter, deepseek_client};
//! use secrecy::SecretString;
//! use std::time::Duration;
//!
//! # async fn run() -> essaygen::error::Result<()> {
//! let key = SecretString::from("sk-...");
//! let client = deepseek_client(&key)?;
//! let completer = RigCompleter::new(&client, "deepseek-chat");
//! let generator = GenerationClient::new(completer, Duration::from_secs(60));
//! let summary = generator.generate("Телемедицина в сельских районах").await?;
//! # Ok(())
//! # }
//! ```

pub mod generation;

pub use generation::{GenerationClient, build_prompt, fallback_summary, find_json_object};

use std::future::Future;

use rig::agent::Agent;
use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::providers::deepseek;
use secrecy::{ExposeSecret, SecretString};

use crate::error::{Error, Result};

/// Low randomness; replies should lean reproducible.
pub const TEMPERATURE: f64 = 0.3;
/// Upper bound on reply length, in tokens.
pub const MAX_TOKENS: u64 = 1000;

/// One outbound text-completion call.
pub trait Completer: Send + Sync {
    /// Send `prompt` and return the raw reply text.
    fn complete(&self, prompt: &str) -> impl Future<Output = Result<String>> + Send;

    /// Model name reported in telemetry.
    fn model(&self) -> &str;

    /// Provider name reported in telemetry.
    fn provider(&self) -> &str {
        "deepseek"
    }
}

/// Create a DeepSeek client from a secret API key.
///
/// # Errors
/// Returns an error if the underlying HTTP client cannot be constructed.
pub fn deepseek_client(api_key: &SecretString) -> Result<deepseek::Client> {
    deepseek::Client::new(api_key.expose_secret())
        .map_err(|e| Error::Config(format!("failed to create DeepSeek client: {e}")))
}

/// [`Completer`] backed by a rig agent with fixed sampling settings.
pub struct RigCompleter {
    agent: Agent<deepseek::CompletionModel>,
    model: String,
}

impl RigCompleter {
    pub fn new(client: &deepseek::Client, model: &str) -> Self {
        let agent = client
            .agent(model)
            .temperature(TEMPERATURE)
            .max_tokens(MAX_TOKENS)
            .build();
        Self {
            agent,
            model: model.to_string(),
        }
    }
}

impl Completer for RigCompleter {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.agent
            .prompt(prompt)
            .await
            .map_err(|e| Error::Generation(e.to_string()))
    }

    fn model(&self) -> &str {
        &self.model
    }
}
