//! Core library for the weather relay.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Clients for the two upstream weather providers
//! - The forecast and current-weather relays with their status mapping
//!
//! It is used by `weather-server`, but carries no HTTP framework types so it
//! can be reused by other binaries.

pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod relay;

pub use config::{Config, ProviderConfig, ProviderSettings, RelaySettings, ServerConfig};
pub use error::{ConfigError, RelayError, TransportError};
pub use model::{ErrorEnvelope, RelayResponse, RelayStatus, WeatherRequest};
pub use provider::{ProviderId, WeatherProvider};
pub use relay::Relays;
