// NOTE: needless_pass_by_value was removed - all pass-by-value is intentional
// String ownership is transferred to struct fields

//! `OpenWeatherMap` API integration for `DashFlow` Rust.
//!
//! This crate provides tools for accessing `OpenWeatherMap` weather data APIs.
//!
//! # Features
//!
//! - Current weather data for any location
//! - Weather forecasts (optional)
//! - Multiple query formats: city name, coordinates, zip code
//! - Temperature units: Metric (Celsius), Imperial (Fahrenheit), Kelvin
//! - Free tier available (60 calls/minute, 1M calls/month)
//!
//! # API Documentation
//!
//! - API: [OpenWeatherMap Current Weather API](https://openweathermap.org/current)
//! - Pricing: [OpenWeatherMap Pricing](https://openweathermap.org/price)
//! - Free tier: 60 calls/minute, 1,000,000 calls/month
//!
//! # Example
//!
//! ```rust,no_run
//! use dashflow_openweathermap::OpenWeatherMapTool;
//! use dashflow::core::tools::{Tool, ToolInput};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tool = OpenWeatherMapTool::new("your-api-key".to_string())
//!         .with_units("metric");
//!
//!     let result = tool._call(ToolInput::String("London".to_string())).await?;
//!     println!("{}", result);
//!     Ok(())
//! }
//! ```

use dashflow::constants::{DEFAULT_HTTP_CONNECT_TIMEOUT, DEFAULT_HTTP_REQUEST_TIMEOUT};
use dashflow::core::http_client::{json_with_limit, DEFAULT_RESPONSE_SIZE_LIMIT};
use dashflow::core::tools::{Tool, ToolInput};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Create an HTTP client with standard timeouts
fn create_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(DEFAULT_HTTP_REQUEST_TIMEOUT)
        .connect_timeout(DEFAULT_HTTP_CONNECT_TIMEOUT)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

fn extract_query_from_input(input: ToolInput) -> Result<String, dashflow::core::Error> {
    match input {
        ToolInput::String(s) => Ok(s),
        ToolInput::Structured(value) => value
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                dashflow::core::Error::tool_error("Missing 'query' field in structured input")
            })
            .map(std::string::ToString::to_string),
    }
}

/// `OpenWeatherMap` tool for retrieving current weather data.
///
/// This tool uses the `OpenWeatherMap` Current Weather Data API to get real-time
/// weather information for any location worldwide.
///
/// # API Details
///
/// - **Endpoint**: `https://api.openweathermap.org/data/2.5/weather`
/// - **Authentication**: API key required (free tier available)
/// - **Rate Limits**: 60 calls/minute (free tier)
/// - **Query Formats**:
///   - City name: "London", "London,UK", "London,GB"
///   - Coordinates: "lat=51.5074&lon=-0.1278"
///   - Zip code: "zip=94040,US"
/// - **Units**:
///   - `metric`: Celsius, meters/sec (default)
///   - `imperial`: Fahrenheit, miles/hour
///   - `standard`: Kelvin, meters/sec
///
/// # Example
///
/// ```rust,no_run
/// use dashflow_openweathermap::OpenWeatherMapTool;
/// use dashflow::core::tools::{Tool, ToolInput};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let tool = OpenWeatherMapTool::new("your-api-key".to_string())
///     .with_units("metric");
///
/// // Query by city name
/// let weather = tool._call(ToolInput::String("Paris,FR".to_string())).await?;
/// println!("{}", weather);
///
/// // Query by coordinates
/// let weather = tool._call(ToolInput::String("lat=48.8566&lon=2.3522".to_string())).await?;
/// println!("{}", weather);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct OpenWeatherMapTool {
    /// `OpenWeatherMap` API key
    api_key: String,
    /// Temperature units: "metric", "imperial", or "standard" (default: "metric")
    units: String,
    /// Request timeout in seconds (default: 30)
    timeout: u64,
    /// HTTP client
    client: reqwest::Client,
}

// Custom Debug implementation to prevent API key exposure in logs
impl std::fmt::Debug for OpenWeatherMapTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenWeatherMapTool")
            .field("api_key", &"[REDACTED]")
            .field("units", &self.units)
            .field("timeout", &self.timeout)
            .field("client", &"reqwest::Client")
            .finish()
    }
}

impl OpenWeatherMapTool {
    /// Creates a new `OpenWeatherMap` tool with an API key.
    ///
    /// # Arguments
    ///
    /// * `api_key` - `OpenWeatherMap` API key (get one at <https://openweathermap.org/api>)
    ///
    /// # Example
    ///
    /// ```rust
    /// use dashflow_openweathermap::OpenWeatherMapTool;
    ///
    /// let tool = OpenWeatherMapTool::new("your-api-key".to_string());
    /// ```
    #[must_use]
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            units: "metric".to_string(),
            timeout: 30,
            client: create_http_client(),
        }
    }

    /// Sets the temperature units for weather data.
    ///
    /// # Arguments
    ///
    /// * `units` - One of "metric" (Celsius), "imperial" (Fahrenheit), or "standard" (Kelvin)
    ///
    /// # Example
    ///
    /// ```rust
    /// use dashflow_openweathermap::OpenWeatherMapTool;
    ///
    /// let tool = OpenWeatherMapTool::new("key".to_string())
    ///     .with_units("imperial"); // Use Fahrenheit
    /// ```
    #[must_use]
    pub fn with_units(mut self, units: &str) -> Self {
        self.units = units.to_string();
        self
    }

    /// Sets the request timeout in seconds.
    ///
    /// # Arguments
    ///
    /// * `timeout` - Timeout in seconds (default: 30)
    ///
    /// # Example
    ///
    /// ```rust
    /// use dashflow_openweathermap::OpenWeatherMapTool;
    ///
    /// let tool = OpenWeatherMapTool::new("key".to_string())
    ///     .with_timeout(60);
    /// ```
    #[must_use]
    pub fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }

    /// Formats weather data into a human-readable string.
    fn format_weather(&self, data: &WeatherResponse) -> String {
        let temp_unit = match self.units.as_str() {
            "metric" => "°C",
            "imperial" => "°F",
            _ => "K",
        };
        let speed_unit = match self.units.as_str() {
            "imperial" => "mph",
            _ => "m/s",
        };

        let weather_desc = data.weather.first().map_or_else(
            || "Unknown".to_string(),
            |w| format!("{} ({})", w.main, w.description),
        );

        format!(
            "Weather in {}, {}:\n\
             - Condition: {}\n\
             - Temperature: {}{} (feels like: {}{})\n\
             - Humidity: {}%\n\
             - Wind Speed: {}{}\n\
             - Pressure: {} hPa\n\
             - Visibility: {} meters\n\
             - Cloudiness: {}%",
            data.name,
            data.sys.country,
            weather_desc,
            data.main.temp,
            temp_unit,
            data.main.feels_like,
            temp_unit,
            data.main.humidity,
            data.wind.speed,
            speed_unit,
            data.main.pressure,
            data.visibility.unwrap_or(0),
            data.clouds.all
        )
    }

    /// Parses the query string to build API parameters.
    ///
    /// Supports:
    /// - City name: "London" or "London,UK"
    /// - Coordinates: "lat=51.5074&lon=-0.1278"
    /// - Zip code: "zip=94040,US"
    fn parse_query(&self, query: &str) -> HashMap<String, String> {
        let query = query.trim();
        let mut params = HashMap::new();

        // Check if query contains lat/lon parameters
        if query.contains("lat=") && query.contains("lon=") {
            for part in query.split('&') {
                let part = part.trim();
                if part.is_empty() {
                    continue;
                }
                if let Some((key, value)) = part.split_once('=') {
                    let key = key.trim();
                    if key.is_empty() {
                        continue;
                    }
                    params.insert(key.to_string(), value.trim().to_string());
                }
            }
        }
        // Check if query is a zip code
        else if query.starts_with("zip=") {
            if let Some(zip_value) = query.strip_prefix("zip=") {
                params.insert("zip".to_string(), zip_value.trim().to_string());
            }
        }
        // Otherwise treat as city name
        else {
            params.insert("q".to_string(), query.to_string());
        }

        params.insert("appid".to_string(), self.api_key.clone());
        params.insert("units".to_string(), self.units.clone());

        params
    }
}

#[async_trait::async_trait]
impl Tool for OpenWeatherMapTool {
    fn name(&self) -> &'static str {
        "openweathermap"
    }

    fn description(&self) -> &'static str {
        "Get current weather data for any location worldwide. \
         Input should be a city name (e.g., 'London', 'Paris,FR'), \
         coordinates (e.g., 'lat=51.5074&lon=-0.1278'), \
         or zip code (e.g., 'zip=94040,US'). \
         Returns current temperature, conditions, humidity, wind speed, and more."
    }

    fn args_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Location to get weather for. Can be city name (London), coordinates (lat=51&lon=-0.1), or zip code (zip=94040,US)"
                }
            },
            "required": ["query"]
        })
    }

    async fn _call(&self, input: ToolInput) -> Result<String, dashflow::core::Error> {
        let query = extract_query_from_input(input)?;

        let params = self.parse_query(&query);
        let url = "https://api.openweathermap.org/data/2.5/weather";

        let response = self
            .client
            .get(url)
            .query(&params)
            .timeout(std::time::Duration::from_secs(self.timeout))
            .send()
            .await
            .map_err(|e| {
                dashflow::core::Error::tool_error(format!("OpenWeatherMap API request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(dashflow::core::Error::tool_error(format!(
                "OpenWeatherMap API error ({status}): {error_text}"
            )));
        }

        // M-216: Use size-limited JSON parsing to prevent memory exhaustion
        let weather_data: WeatherResponse = json_with_limit(response, DEFAULT_RESPONSE_SIZE_LIMIT)
            .await
            .map_err(|e| {
                dashflow::core::Error::tool_error(format!(
                    "Failed to parse OpenWeatherMap response: {e}"
                ))
            })?;

        Ok(self.format_weather(&weather_data))
    }
}

/// `OpenWeatherMap` API response structure for current weather data.
#[derive(Debug, Deserialize, Serialize)]
struct WeatherResponse {
    /// Weather condition information
    weather: Vec<WeatherCondition>,
    /// Main weather parameters (temperature, pressure, humidity)
    main: MainWeather,
    /// Wind information
    wind: Wind,
    /// Cloudiness
    clouds: Clouds,
    /// Visibility in meters (optional, may be missing in some responses)
    visibility: Option<i32>,
    /// System information (country, sunrise, sunset)
    sys: Sys,
    /// City name
    name: String,
}

#[derive(Debug, Deserialize, Serialize)]
struct WeatherCondition {
    /// Weather condition id
    id: i32,
    /// Group of weather parameters (Rain, Snow, Extreme, etc.)
    main: String,
    /// Weather condition description
    description: String,
}

#[derive(Debug, Deserialize, Serialize)]
struct MainWeather {
    /// Temperature
    temp: f64,
    /// Temperature feels like
    feels_like: f64,
    /// Minimum temperature
    temp_min: f64,
    /// Maximum temperature
    temp_max: f64,
    /// Atmospheric pressure in hPa
    pressure: i32,
    /// Humidity percentage
    humidity: i32,
}

#[derive(Debug, Deserialize, Serialize)]
struct Wind {
    /// Wind speed (m/s or mph depending on units)
    speed: f64,
    /// Wind direction in degrees
    #[serde(default)]
    deg: i32,
}

#[derive(Debug, Deserialize, Serialize)]
struct Clouds {
    /// Cloudiness percentage
    all: i32,
}

#[derive(Debug, Deserialize, Serialize)]
struct Sys {
    /// Country code (e.g., "GB", "US")
    country: String,
}
