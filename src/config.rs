use std::env;
use std::time::Duration;

use crate::domain::selection::PriceField;

// ============================================================================
// Engine Configuration - loaded from environment variables
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How long a Succeeded workflow stays visible before reading as Idle
    pub success_display_delay: Duration,
    /// Image reference the upload widget reports before a real image exists
    pub placeholder_image: String,
    pub page_size: u32,
    /// Money field summed into selection totals
    pub price_field: PriceField,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            success_display_delay: Duration::from_millis(1500),
            placeholder_image: "placeholder".to_string(),
            page_size: 20,
            price_field: PriceField::PriceWeb,
        }
    }
}

impl EngineConfig {
    /// Read `CONSOLE_*` variables, falling back to defaults when unset
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let success_display_delay = match env::var("CONSOLE_SUCCESS_DELAY_MS") {
            Ok(value) => Duration::from_millis(parse_var("CONSOLE_SUCCESS_DELAY_MS", &value)?),
            Err(_) => defaults.success_display_delay,
        };

        let placeholder_image = env::var("CONSOLE_PLACEHOLDER_IMAGE")
            .map(|value| value.trim().to_string())
            .unwrap_or(defaults.placeholder_image);

        let page_size = match env::var("CONSOLE_PAGE_SIZE") {
            Ok(value) => {
                let size: u32 = parse_var("CONSOLE_PAGE_SIZE", &value)?;
                if size == 0 {
                    return Err(ConfigError::InvalidValue {
                        name: "CONSOLE_PAGE_SIZE",
                        value,
                    });
                }
                size
            }
            Err(_) => defaults.page_size,
        };

        let price_field = match env::var("CONSOLE_PRICE_FIELD") {
            Ok(value) => parse_var("CONSOLE_PRICE_FIELD", &value)?,
            Err(_) => defaults.price_field,
        };

        Ok(Self {
            success_display_delay,
            placeholder_image,
            page_size,
            price_field,
        })
    }

    pub fn with_success_display_delay(mut self, delay: Duration) -> Self {
        self.success_display_delay = delay;
        self
    }

    /// True when `image` is absent in substance: blank or the placeholder sentinel
    pub fn is_placeholder_image(&self, image: &str) -> bool {
        let image = image.trim();
        !self.placeholder_image.is_empty() && image == self.placeholder_image
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name,
        value: value.to_string(),
    })
}
