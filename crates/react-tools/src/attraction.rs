//! Attraction Recommendation Tool
//!
//! Asks Tavily for sights worth visiting in a city under given weather.

use agent_core::{Result as CoreResult, Tool};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ToolError;

const TAVILY_URL: &str = "https://api.tavily.com/search";

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    api_key: &'a str,
    query: String,
    search_depth: &'static str,
    include_answer: bool,
}

#[derive(Debug, Default, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
}

pub struct AttractionTool {
    http: reqwest::Client,
    api_key: Option<String>,
}

impl AttractionTool {
    pub fn new(http: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_key: Some(api_key.into()),
        }
    }

    /// Reads `TAVILY_API_KEY`; a missing key is reported at call time.
    pub fn from_env(http: reqwest::Client) -> Self {
        Self {
            http,
            api_key: std::env::var("TAVILY_API_KEY").ok().filter(|k| !k.is_empty()),
        }
    }

    async fn recommend(&self, city: &str, weather: &str) -> Result<String, ToolError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ToolError::MissingApiKey("TAVILY_API_KEY"))?;

        let request = TavilyRequest {
            api_key,
            query: format!(
                "Most worthwhile tourist attractions in '{city}' during '{weather}' weather, with reasons"
            ),
            search_depth: "basic",
            include_answer: true,
        };
        tracing::info!(%city, %weather, "Searching attractions");

        let response: TavilyResponse = self
            .http
            .post(TAVILY_URL)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(summarize(&response))
    }
}

/// Split `city, weather`; weather defaults to "any" when omitted.
fn split_argument(input: &str) -> Result<(&str, &str), ToolError> {
    let (city, weather) = input.split_once(',').unwrap_or((input, "any"));
    let city = city.trim();
    let weather = weather.trim();

    if city.is_empty() {
        return Err(ToolError::InvalidInput("expected `city, weather`".into()));
    }
    Ok((city, if weather.is_empty() { "any" } else { weather }))
}

fn summarize(response: &TavilyResponse) -> String {
    if let Some(answer) = response.answer.as_deref().filter(|a| !a.trim().is_empty()) {
        return answer.to_string();
    }
    if response.results.is_empty() {
        return "Sorry, no attraction recommendations were found.".into();
    }

    let lines: Vec<String> = response
        .results
        .iter()
        .map(|r| format!("- {}: {}", r.title, r.content))
        .collect();
    format!("Based on the search, here is what I found:\n{}", lines.join("\n"))
}

#[async_trait]
impl Tool for AttractionTool {
    async fn call(&self, input: &str) -> CoreResult<String> {
        let (city, weather) = split_argument(input)?;
        Ok(self.recommend(city, weather).await?)
    }
}
