use crate::config::CollaboratorConfig;
use anyhow::{Context, Result};
use regex_lite::Regex;
use serde::Deserialize;
use serde_json::json;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum CollabError {
    #[error("rules collaborator request failed: {0}")]
    Rules(String),
}

/// What became of a free-text command.
#[derive(Debug)]
pub enum ParseOutcome {
    /// Rule created; the collaborator's response body, relayed verbatim
    Created(serde_json::Value),
    /// Neither the heuristic nor the NLU fallback produced a rule
    NotParsed,
}

#[derive(Debug, Deserialize)]
struct NluParse {
    #[serde(default)]
    intent: Option<String>,
    #[serde(default)]
    trigger: Option<String>,
    #[serde(default)]
    action: Option<String>,
}

/// Extract a (trigger, action) pair from "if TRIGGER then ACTION".
pub fn parse_rule(transcript: &str) -> Option<(String, String)> {
    static RULE_PATTERN: OnceLock<Regex> = OnceLock::new();
    let re = RULE_PATTERN.get_or_init(|| {
        Regex::new(r"(?i)if (.+?) then (.+)").expect("fixed pattern compiles")
    });
    let caps = re.captures(transcript)?;
    Some((
        caps.get(1)?.as_str().trim().to_string(),
        caps.get(2)?.as_str().trim().to_string(),
    ))
}

/// Forwards parsed trigger/action pairs to the rules engine, falling back to
/// the NLU parser for free text the heuristic cannot handle. No rule logic
/// lives here.
pub struct RuleForwarder {
    client: reqwest::Client,
    rules_url: String,
    nlu_url: String,
}

impl RuleForwarder {
    pub fn new(cfg: &CollaboratorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("failed to build collaborator HTTP client")?;

        Ok(Self {
            client,
            rules_url: cfg.rules_url.clone(),
            nlu_url: cfg.nlu_url.clone(),
        })
    }

    pub async fn parse_and_create(&self, transcript: &str) -> Result<ParseOutcome, CollabError> {
        // Heuristic first: "if <trigger> then <action>"
        if let Some((trigger, action)) = parse_rule(transcript) {
            debug!(trigger, action, "heuristic matched rule form");
            return self.create_rule(&trigger, &action).await;
        }

        // Fallback to the NLU parser. An NLU failure is non-fatal; the
        // command simply goes unparsed.
        match self.parse_with_nlu(transcript).await {
            Ok(Some((trigger, action))) => self.create_rule(&trigger, &action).await,
            Ok(None) => Ok(ParseOutcome::NotParsed),
            Err(e) => {
                warn!(error = %e, "nlu fallback unavailable; treating command as unparsed");
                Ok(ParseOutcome::NotParsed)
            }
        }
    }

    async fn create_rule(&self, trigger: &str, action: &str) -> Result<ParseOutcome, CollabError> {
        let url = format!("{}/rules", self.rules_url);
        let payload = json!({ "text": format!("if {trigger} then {action}") });

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| CollabError::Rules(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CollabError::Rules(format!(
                "rules engine returned {}",
                response.status()
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| CollabError::Rules(format!("unparseable rules response: {e}")))?;

        info!(trigger, action, "rule created");

        Ok(ParseOutcome::Created(body))
    }

    async fn parse_with_nlu(&self, transcript: &str) -> Result<Option<(String, String)>> {
        let url = format!("{}/parse", self.nlu_url);

        let parsed: NluParse = self
            .client
            .post(&url)
            .json(&json!({ "text": transcript }))
            .send()
            .await?
            .json()
            .await?;

        if parsed.intent.as_deref() == Some("create_rule") {
            if let (Some(trigger), Some(action)) = (parsed.trigger, parsed.action) {
                return Ok(Some((trigger, action)));
            }
        }

        Ok(None)
    }
}
