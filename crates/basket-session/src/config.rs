//! # Configuration
//!
//! Configuration for the session layer.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     BASKET_SESSION_KEY=shop_basket                                     │
//! │     BASKET_INSTANCE=main                                               │
//! │     BASKET_JURISDICTION=uk                                             │
//! │                                                                         │
//! │  2. TOML Config (host-provided string or file contents)                │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     session_key = "basket", instance = "main", jurisdiction = "de"     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # basket.toml
//! session_key = "basket"   # namespace inside the host session
//! instance = "main"        # default basket slot
//! jurisdiction = "de"      # preset code for new baskets
//! ```

use serde::{Deserialize, Serialize};

use basket_core::Jurisdiction;

use crate::error::{BasketError, BasketResult};

/// Environment variable overriding the session key.
pub const ENV_SESSION_KEY: &str = "BASKET_SESSION_KEY";

/// Environment variable overriding the default instance.
pub const ENV_INSTANCE: &str = "BASKET_INSTANCE";

/// Environment variable overriding the jurisdiction code.
pub const ENV_JURISDICTION: &str = "BASKET_JURISDICTION";

// =============================================================================
// Basket Configuration
// =============================================================================

/// The session layer's configuration surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BasketConfig {
    /// Namespace key inside the host's session store.
    pub session_key: String,

    /// The basket slot targeted until the caller switches instances.
    pub instance: String,

    /// Preset code of the jurisdiction new baskets are created under.
    pub jurisdiction: String,
}

impl Default for BasketConfig {
    fn default() -> Self {
        BasketConfig {
            session_key: "basket".to_string(),
            instance: "main".to_string(),
            jurisdiction: "de".to_string(),
        }
    }
}

impl BasketConfig {
    /// Parses configuration from a TOML document.
    ///
    /// Missing keys fall back to their defaults.
    pub fn from_toml_str(toml: &str) -> BasketResult<Self> {
        toml::from_str(toml).map_err(|e| BasketError::InvalidConfig(e.to_string()))
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        BasketConfig::default().with_env_overrides()
    }

    /// Applies environment overrides on top of this configuration.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(value) = std::env::var(ENV_SESSION_KEY) {
            self.session_key = value;
        }
        if let Ok(value) = std::env::var(ENV_INSTANCE) {
            self.instance = value;
        }
        if let Ok(value) = std::env::var(ENV_JURISDICTION) {
            self.jurisdiction = value;
        }

        self
    }

    /// Resolves the configured jurisdiction code.
    pub fn jurisdiction(&self) -> BasketResult<Jurisdiction> {
        self.jurisdiction
            .parse()
            .map_err(|e: basket_core::CoreError| BasketError::InvalidConfig(e.to_string()))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
