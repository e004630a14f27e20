use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::llm_client::Provider;

const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_OPENROUTER_MODEL: &str = "google/gemini-2.0-flash-lite-preview-02-05:free";
const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PROVIDER_BUDGET_SECS: u64 = 40;
const DEFAULT_TURN_TIMEOUT_SECS: u64 = 90;

/// Application configuration loaded from environment variables.
/// Startup fails if no LLM provider key is configured, or if the turn
/// timeout cannot cover a full pass over every provider.
#[derive(Debug, Clone)]
pub struct Config {
    /// Providers in fallback order: OpenRouter first, then Groq.
    pub providers: Vec<Provider>,
    pub temperature: f32,
    /// Per HTTP attempt.
    pub llm_http_timeout: Duration,
    /// Per provider, across all of its retries.
    pub provider_budget: Duration,
    /// Upper bound on a single engine call to the prompt client.
    pub turn_timeout: Duration,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(optional_env)
    }

    /// Builds the config from any key → value source. Blank values count as unset.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let providers = assemble_providers(&lookup)?;
        let provider_budget = Duration::from_secs(parse_value(
            "LLM_PROVIDER_BUDGET_SECS",
            lookup("LLM_PROVIDER_BUDGET_SECS"),
            DEFAULT_PROVIDER_BUDGET_SECS,
        )?);
        let turn_timeout = Duration::from_secs(parse_value(
            "TURN_TIMEOUT_SECS",
            lookup("TURN_TIMEOUT_SECS"),
            DEFAULT_TURN_TIMEOUT_SECS,
        )?);
        check_turn_timeout(turn_timeout, provider_budget, providers.len())?;

        Ok(Config {
            providers,
            temperature: parse_value("LLM_TEMPERATURE", lookup("LLM_TEMPERATURE"), 0.7)?,
            llm_http_timeout: Duration::from_secs(parse_value(
                "LLM_HTTP_TIMEOUT_SECS",
                lookup("LLM_HTTP_TIMEOUT_SECS"),
                DEFAULT_HTTP_TIMEOUT_SECS,
            )?),
            provider_budget,
            turn_timeout,
            port: parse_value("PORT", lookup("PORT"), 8080)?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }
}

/// Providers in fallback order, one per configured API key.
fn assemble_providers(lookup: impl Fn(&str) -> Option<String>) -> Result<Vec<Provider>> {
    let candidates = [
        ("openrouter", "OPENROUTER", OPENROUTER_BASE_URL, DEFAULT_OPENROUTER_MODEL),
        ("groq", "GROQ", GROQ_BASE_URL, DEFAULT_GROQ_MODEL),
    ];

    let providers: Vec<Provider> = candidates
        .iter()
        .filter_map(|(name, prefix, base_url, default_model)| {
            let api_key = lookup(format!("{prefix}_API_KEY").as_str())?;
            Some(Provider {
                name: name.to_string(),
                base_url: base_url.to_string(),
                api_key,
                model: lookup(format!("{prefix}_MODEL").as_str())
                    .unwrap_or_else(|| default_model.to_string()),
            })
        })
        .collect();

    if providers.is_empty() {
        bail!("No LLM provider configured: set OPENROUTER_API_KEY or GROQ_API_KEY");
    }
    Ok(providers)
}

/// The engine's deadline must leave room for every provider to spend its
/// whole budget, otherwise fallback never gets a chance.
fn check_turn_timeout(turn_timeout: Duration, provider_budget: Duration, providers: usize) -> Result<()> {
    let needed = provider_budget * providers as u32;
    if turn_timeout < needed {
        bail!(
            "TURN_TIMEOUT_SECS ({}s) must be at least {} provider(s) x LLM_PROVIDER_BUDGET_SECS ({}s) = {}s",
            turn_timeout.as_secs(),
            providers,
            provider_budget.as_secs(),
            needed.as_secs()
        );
    }
    Ok(())
}

/// Treats unset and blank variables the same way.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_value<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        None => Ok(default),
    }
}
