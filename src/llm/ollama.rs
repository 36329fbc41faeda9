//! Ollama Client
//!
//! Turns a session summary into an activity-timeline prompt and asks a
//! local Ollama model for automation suggestions. The timeline is the
//! interesting part: it renders workflow steps as a numbered narrative
//! with explicit application-switch markers, which small local models
//! follow far better than raw JSON.

use super::retry::{post_with_retry, RetryPolicy};
use crate::analyzer::segmenter::WorkflowStep;
use crate::analyzer::session::SessionSummary;
use crate::app::config::LlmConfig;
use crate::capture::types::EventKind;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "tinyllama";

/// Ollama `/api/generate` request body.
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// Ollama `/api/generate` response body (non-streaming).
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Client for a local Ollama server.
pub struct OllamaClient {
    base_url: String,
    model: String,
    client: Client,
    retry: RetryPolicy,
}

impl OllamaClient {
    /// Client with default endpoint and model.
    pub fn new() -> crate::Result<Self> {
        Self::from_config(&LlmConfig::default())
    }

    pub fn from_config(config: &LlmConfig) -> crate::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| crate::Error::Llm(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            client,
            retry: RetryPolicy::from_config(config),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Build the full prompt for a session summary.
    pub fn build_prompt(&self, summary: &SessionSummary) -> String {
        let timeline = render_timeline(&summary.workflow_steps);
        format!(
            "You are an automation analysis assistant.\n\
             Analyze the user's desktop activity log below and suggest realistic automations.\n\
             \n\
             === ACTIVITY TIMELINE ===\n\
             {timeline}\n\
             \n\
             === TASK ===\n\
             1. Understand what overall task the user is trying to complete.\n\
             2. Identify any repeated sequences or multi-step workflows.\n\
             3. Suggest specific automations that could save time or reduce manual effort.\n\
             - Focus on automations that are possible using common desktop tools (Excel, browser, etc.).\n\
             - Avoid generic advice. Suggest concrete steps.\n\
             \n\
             === OUTPUT FORMAT ===\n\
             USER GOAL:\n\
             [Brief and specific goal statement]\n\
             \n\
             REPEATING PATTERNS:\n\
             - [Pattern 1: concise description of repeated behavior]\n\
             - [Pattern 2: another repeated sequence, if any]\n\
             \n\
             AUTOMATION IDEAS:\n\
             - [Automation 1: what can be automated + how (macro/script/workflow)]\n\
             - [Automation 2: another possible automation]\n"
        )
    }

    /// Ask the model for automation suggestions.
    pub async fn generate_suggestions(&self, summary: &SessionSummary) -> crate::Result<String> {
        let prompt = self.build_prompt(summary);
        debug!(chars = prompt.len(), "prompt built");
        self.generate(&prompt).await
    }

    /// Run one non-streaming generation.
    pub async fn generate(&self, prompt: &str) -> crate::Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response = post_with_retry(&self.client, &url, &body, &self.retry, "ollama generate")
            .await
            .ok_or_else(|| {
                crate::Error::Llm(format!(
                    "no response from Ollama at {} (is `ollama serve` running?)",
                    self.base_url
                ))
            })?;

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| crate::Error::Llm(format!("malformed Ollama response: {e}")))?;

        info!(model = %self.model, chars = parsed.response.len(), "suggestions generated");
        Ok(parsed.response)
    }
}

/// Render workflow steps as a numbered activity timeline.
///
/// Window switches get an explicit `--- SWITCHED TO: <window> ---` marker
/// so the model can track application context without comparing windows
/// itself.
pub fn render_timeline(steps: &[WorkflowStep]) -> String {
    let mut timeline = String::new();
    let mut previous_window: Option<&str> = None;

    for (i, step) in steps.iter().enumerate() {
        if previous_window.is_some_and(|prev| prev != step.window) {
            timeline.push_str(&format!("--- SWITCHED TO: {} ---\n", step.window));
        }

        timeline.push_str(&format!("{}. ", i + 1));
        match &step.action_type {
            EventKind::MouseClick => {
                let click = step.click.as_ref();
                if let Some(label) = click.and_then(|c| c.label.as_deref()) {
                    timeline.push_str(&format!("Clicked '{label}'"));
                } else if let Some((x, y)) =
                    click.and_then(|c| c.location.x.zip(c.location.y))
                {
                    timeline.push_str(&format!("Clicked at coordinates: ({x}, {y})"));
                } else {
                    timeline.push_str("Clicked");
                }
                timeline.push_str(&format!(" in {}", step.window));
            }
            EventKind::KeyPress => {
                let keys = step.keys.as_deref().unwrap_or_default().join(" ");
                if keys.contains('+') || keys.contains('(') {
                    timeline.push_str(&format!("Keyboard shortcut: {keys}"));
                } else {
                    timeline.push_str(&format!("Typed: {keys}"));
                }
                timeline.push_str(&format!(" in {}", step.window));
            }
            _ => timeline.push_str(&step.summary),
        }
        timeline.push('\n');

        previous_window = Some(&step.window);
    }

    timeline
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::segmenter::{segment, SegmenterConfig};
    use crate::analyzer::session::SessionTotals;
    use crate::capture::types::RawEvent;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn steps() -> Vec<WorkflowStep> {
        let ts = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let events = vec![
            RawEvent::mouse_click(ts, "Excel", 10, 20, "Button.left").with_clicked_element("Save"),
            RawEvent::key_press(ts, "Excel", "H"),
            RawEvent::key_press(ts, "Excel", "i"),
            RawEvent::key_press(ts, "Browser", "Ctrl + V Paste"),
            RawEvent::mouse_scroll(ts, "Browser", 0, 0, 0, -3),
        ];
        segment(&events, &SegmenterConfig::default())
    }

    fn summary_of(steps: Vec<WorkflowStep>) -> SessionSummary {
        SessionSummary {
            id: Uuid::new_v4(),
            session_id: "s1".into(),
            generated_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            summary: SessionTotals::default(),
            events: Vec::new(),
            screenshots: Vec::new(),
            transcripts: Vec::new(),
            workflow_steps: steps,
        }
    }

    #[test]
    fn test_timeline_numbering_and_switch_markers() {
        let timeline = render_timeline(&steps());

        assert!(timeline.contains("1. Clicked 'Save' in Excel"));
        assert!(timeline.contains("2. Typed: H i in Excel"));
        assert!(timeline.contains("--- SWITCHED TO: Browser ---"));
        assert!(timeline.contains("3. Keyboard shortcut: Ctrl + V Paste in Browser"));
        assert!(timeline.contains("4. mouse_scroll recorded"));
        // no marker before the first step
        assert!(!timeline.starts_with("---"));
    }

    #[test]
    fn test_timeline_click_without_label_uses_coordinates() {
        let ts = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let events = vec![RawEvent::mouse_click(ts, "Excel", 10, 20, "Button.left")];
        let timeline = render_timeline(&segment(&events, &SegmenterConfig::default()));
        assert!(timeline.contains("1. Clicked at coordinates: (10, 20) in Excel"));
    }

    #[test]
    fn test_timeline_empty_steps() {
        assert!(render_timeline(&[]).is_empty());
    }

    #[test]
    fn test_prompt_embeds_timeline_and_sections() {
        let client = OllamaClient::new().unwrap();
        let prompt = client.build_prompt(&summary_of(steps()));

        assert!(prompt.contains("=== ACTIVITY TIMELINE ==="));
        assert!(prompt.contains("Clicked 'Save' in Excel"));
        assert!(prompt.contains("=== TASK ==="));
        assert!(prompt.contains("USER GOAL:"));
        assert!(prompt.contains("AUTOMATION IDEAS:"));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = LlmConfig {
            base_url: "http://localhost:11434/".into(),
            ..Default::default()
        };
        let client = OllamaClient::from_config(&config).unwrap();
        assert_eq!(client.base_url, "http://localhost:11434");
    }

    #[tokio::test]
    async fn test_generate_fails_cleanly_without_server() {
        let config = LlmConfig {
            base_url: "http://127.0.0.1:1".into(),
            timeout_secs: 1,
            max_retries: 1,
            ..Default::default()
        };
        let client = OllamaClient::from_config(&config).unwrap();
        let result = client.generate("hello").await;
        assert!(matches!(result, Err(crate::Error::Llm(_))));
    }
}
