//! # react-tools
//!
//! Concrete tools for the ReAct agent. Each takes the raw bracketed argument
//! from `Name[argument]` and returns observation text.
//!
//! | Tool         | Backend  | Argument          |
//! |--------------|----------|-------------------|
//! | `Search`     | SerpApi  | free-text query   |
//! | `Weather`    | wttr.in  | city name         |
//! | `Attraction` | Tavily   | `city, weather`   |

pub mod attraction;
pub mod error;
pub mod search;
pub mod weather;

use std::time::Duration;

use agent_core::ToolRegistry;

pub use attraction::AttractionTool;
pub use error::ToolError;
pub use search::SearchTool;
pub use weather::WeatherTool;

pub const SEARCH_DESCRIPTION: &str = "A web search engine. Use it for current events, facts, \
     and anything you cannot find in your own knowledge.";
pub const WEATHER_DESCRIPTION: &str =
    "Current weather for a city. Input is the city name, e.g. Weather[Beijing].";
pub const ATTRACTION_DESCRIPTION: &str = "Recommends tourist attractions for a city given its \
     weather. Input is `city, weather`, e.g. Attraction[Xiamen, light rain].";

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared HTTP client for tool backends
pub fn http_client() -> Result<reqwest::Client, ToolError> {
    Ok(reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?)
}

/// Register `Search`, `Weather` and `Attraction`, reading API keys from the
/// environment.
pub fn register_defaults(registry: &mut ToolRegistry) -> Result<(), ToolError> {
    let http = http_client()?;
    registry.register("Search", SEARCH_DESCRIPTION, SearchTool::from_env(http.clone()));
    registry.register("Weather", WEATHER_DESCRIPTION, WeatherTool::new(http.clone()));
    registry.register(
        "Attraction",
        ATTRACTION_DESCRIPTION,
        AttractionTool::from_env(http),
    );
    Ok(())
}
