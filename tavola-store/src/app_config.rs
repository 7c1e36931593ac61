use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub redis: Option<RedisConfig>,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub venue: VenueConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Unset means the in-memory store.
    pub url: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
        }
    }
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitConfig {
    pub requests: i64,
    pub window_seconds: i64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests: 100,
            window_seconds: 60,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CorsConfig {
    /// Empty allows any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct VenueConfig {
    pub opening_hour: u32,
    pub closing_hour: u32,
    pub hold_minutes: i64,
    /// Venue wall clock, minutes east of UTC.
    pub utc_offset_minutes: i32,
    pub default_days: u32,
    pub max_days: u32,
    pub seats: Vec<String>,
}

impl Default for VenueConfig {
    fn default() -> Self {
        Self {
            opening_hour: 9,
            closing_hour: 21,
            hold_minutes: 60,
            utc_offset_minutes: 0,
            default_days: 7,
            max_days: 31,
            seats: ["A", "B", "C", "D"]
                .iter()
                .flat_map(|row| (1..=5).map(move |n| format!("{}{}", row, n)))
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CatalogConfig {
    pub menu_path: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `TAVOLA_SERVER__PORT=8080`
            .add_source(
                config::Environment::with_prefix("TAVOLA")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("venue.seats")
                    .with_list_parse_key("cors.allowed_origins")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), config::ConfigError> {
        let venue = &self.venue;
        let fail = |msg: String| Err(config::ConfigError::Message(msg));

        if venue.closing_hour > 23 {
            return fail(format!("venue.closing_hour must be at most 23, got {}", venue.closing_hour));
        }
        if venue.opening_hour >= venue.closing_hour {
            return fail(format!(
                "venue.opening_hour ({}) must be before venue.closing_hour ({})",
                venue.opening_hour, venue.closing_hour
            ));
        }
        if venue.hold_minutes <= 0 {
            return fail("venue.hold_minutes must be positive".to_string());
        }
        if venue.utc_offset_minutes.abs() >= 24 * 60 {
            return fail("venue.utc_offset_minutes must be within a day".to_string());
        }
        if venue.default_days == 0 || venue.default_days > venue.max_days {
            return fail("venue.default_days must be between 1 and venue.max_days".to_string());
        }
        if venue.seats.is_empty() {
            return fail("venue.seats must not be empty".to_string());
        }
        if self.rate_limit.requests <= 0 || self.rate_limit.window_seconds <= 0 {
            return fail("rate_limit.requests and rate_limit.window_seconds must be positive".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            server: ServerConfig { port: 3000 },
            database: DatabaseConfig::default(),
            redis: None,
            rate_limit: RateLimitConfig::default(),
            cors: CorsConfig::default(),
            venue: VenueConfig::default(),
            catalog: CatalogConfig::default(),
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = config();
        assert!(config.validate().is_ok());
        assert_eq!(config.venue.seats.len(), 20);
        assert_eq!(config.venue.seats[0], "A1");
        assert_eq!(config.venue.seats[19], "D5");
    }

    #[test]
    fn test_rejects_bad_hours() {
        let mut late = config();
        late.venue.closing_hour = 24;
        assert!(late.validate().is_err());

        let mut inverted = config();
        inverted.venue.opening_hour = 22;
        assert!(inverted.validate().is_err());

        let mut no_hold = config();
        no_hold.venue.hold_minutes = 0;
        assert!(no_hold.validate().is_err());
    }
}
