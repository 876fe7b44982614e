//! Weather Lookup Tool
//!
//! Current conditions from wttr.in's JSON format. No API key needed.

use agent_core::{Result as CoreResult, Tool};
use async_trait::async_trait;
use serde::Deserialize;

use crate::error::ToolError;

const WTTR_URL: &str = "https://wttr.in";

#[derive(Debug, Deserialize)]
struct WttrReport {
    #[serde(default)]
    current_condition: Vec<CurrentCondition>,
}

#[derive(Debug, Deserialize)]
struct CurrentCondition {
    #[serde(rename = "temp_C")]
    temp_c: String,
    #[serde(rename = "weatherDesc", default)]
    weather_desc: Vec<TextValue>,
}

#[derive(Debug, Deserialize)]
struct TextValue {
    value: String,
}

pub struct WeatherTool {
    http: reqwest::Client,
    base_url: String,
}

impl WeatherTool {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            base_url: WTTR_URL.into(),
        }
    }

    /// `{base}/{city}` with the city percent-encoded as one path segment
    fn report_url(&self, city: &str) -> Result<reqwest::Url, ToolError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| ToolError::InvalidInput(format!("weather endpoint: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| ToolError::InvalidInput(format!("weather endpoint: {}", self.base_url)))?
            .pop_if_empty()
            .push(city);
        Ok(url)
    }

    async fn lookup(&self, city: &str) -> Result<String, ToolError> {
        let url = self.report_url(city)?;
        tracing::info!(%city, "Fetching weather");

        let report: WttrReport = self
            .http
            .get(url)
            .query(&[("format", "j1")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        describe(city, &report)
    }
}

fn describe(city: &str, report: &WttrReport) -> Result<String, ToolError> {
    let current = report.current_condition.first().ok_or_else(|| {
        ToolError::Decode(format!("no current conditions for '{city}', the city name may be invalid"))
    })?;
    let description = current
        .weather_desc
        .first()
        .map_or("unknown conditions", |d| d.value.trim());

    Ok(format!("{city}: {description}, {}°C", current.temp_c))
}

#[async_trait]
impl Tool for WeatherTool {
    async fn call(&self, input: &str) -> CoreResult<String> {
        let city = input.trim();
        if city.is_empty() {
            return Err(ToolError::InvalidInput("city name is empty".into()).into());
        }
        Ok(self.lookup(city).await?)
    }
}
