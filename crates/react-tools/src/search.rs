//! Web Search Tool
//!
//! Google search through SerpApi, condensed to the most direct answer
//! available.

use agent_core::{Result as CoreResult, Tool};
use async_trait::async_trait;
use serde_json::Value;

use crate::error::ToolError;

const SERPAPI_URL: &str = "https://serpapi.com/search.json";
const MAX_ORGANIC: usize = 3;

pub struct SearchTool {
    http: reqwest::Client,
    api_key: Option<String>,
    country: String,
    language: String,
}

impl SearchTool {
    pub fn new(http: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_key: Some(api_key.into()),
            country: "us".into(),
            language: "en".into(),
        }
    }

    /// Reads `SERPAPI_API_KEY`, `SERPAPI_GL` and `SERPAPI_HL`.
    /// A missing key is reported when the tool is called, not here.
    pub fn from_env(http: reqwest::Client) -> Self {
        Self {
            http,
            api_key: std::env::var("SERPAPI_API_KEY").ok().filter(|k| !k.is_empty()),
            country: std::env::var("SERPAPI_GL").unwrap_or_else(|_| "us".into()),
            language: std::env::var("SERPAPI_HL").unwrap_or_else(|_| "en".into()),
        }
    }

    async fn search(&self, query: &str) -> Result<String, ToolError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ToolError::MissingApiKey("SERPAPI_API_KEY"))?;

        tracing::info!(%query, "Running SerpApi web search");
        let results: Value = self
            .http
            .get(SERPAPI_URL)
            .query(&[
                ("engine", "google"),
                ("q", query),
                ("api_key", api_key),
                ("gl", self.country.as_str()),
                ("hl", self.language.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = results.get("error").and_then(Value::as_str) {
            return Err(ToolError::Decode(error.to_string()));
        }

        Ok(summarize_results(&results)
            .unwrap_or_else(|| format!("No results found for '{query}'.")))
    }
}

/// Pick the most direct answer from a SerpApi result document.
///
/// Preference: answer box list, answer box, knowledge graph, then the top
/// organic snippets.
pub fn summarize_results(results: &Value) -> Option<String> {
    if let Some(list) = results.get("answer_box_list").and_then(Value::as_array) {
        let lines: Vec<&str> = list.iter().filter_map(Value::as_str).collect();
        if !lines.is_empty() {
            return Some(lines.join("\n"));
        }
    }

    if let Some(answer) = results.pointer("/answer_box/answer").and_then(Value::as_str) {
        return Some(answer.to_string());
    }

    if let Some(description) = results
        .pointer("/knowledge_graph/description")
        .and_then(Value::as_str)
    {
        return Some(description.to_string());
    }

    let organic = results.get("organic_results").and_then(Value::as_array)?;
    if organic.is_empty() {
        return None;
    }
    let snippets: Vec<String> = organic
        .iter()
        .take(MAX_ORGANIC)
        .enumerate()
        .map(|(i, res)| {
            let title = res.get("title").and_then(Value::as_str).unwrap_or_default();
            let snippet = res.get("snippet").and_then(Value::as_str).unwrap_or_default();
            format!("[{}] {title}\n {snippet}", i + 1)
        })
        .collect();
    Some(snippets.join("\n\n"))
}

#[async_trait]
impl Tool for SearchTool {
    async fn call(&self, input: &str) -> CoreResult<String> {
        let query = input.trim();
        if query.is_empty() {
            return Err(ToolError::InvalidInput("search query is empty".into()).into());
        }
        Ok(self.search(query).await?)
    }
}
