//! Venue and environment selection.
//!
//! Every venue has a production and a testnet REST endpoint. The pair
//! `(Venue, Environment)` fully determines the base URL an adapter talks to.

use std::fmt;
use std::str::FromStr;

/// Supported trading venues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Venue {
    Binance,
    Bitmex,
    Kraken,
}

impl Venue {
    /// REST API base URL for this venue in the given environment.
    pub fn rest_base_url(&self, environment: Environment) -> &'static str {
        match (self, environment) {
            (Self::Binance, Environment::Production) => "https://api.binance.com",
            (Self::Binance, Environment::Testnet) => "https://testnet.binance.vision",
            (Self::Bitmex, Environment::Production) => "https://www.bitmex.com",
            (Self::Bitmex, Environment::Testnet) => "https://testnet.bitmex.com",
            // Kraken has no public sandbox for spot.
            (Self::Kraken, _) => "https://api.kraken.com",
        }
    }

    /// Prefix used for this venue's environment variables (e.g. `BITMEX_API_KEY`).
    pub fn env_prefix(&self) -> &'static str {
        match self {
            Self::Binance => "BINANCE",
            Self::Bitmex => "BITMEX",
            Self::Kraken => "KRAKEN",
        }
    }

    /// Load the venue from `BARGAIN_VENUE`.
    ///
    /// Returns `Bitmex` if not set or invalid.
    pub fn from_env() -> Self {
        std::env::var("BARGAIN_VENUE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(Self::Bitmex)
    }
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binance => write!(f, "binance"),
            Self::Bitmex => write!(f, "bitmex"),
            Self::Kraken => write!(f, "kraken"),
        }
    }
}

impl FromStr for Venue {
    type Err = ParseVenueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "binance" => Ok(Self::Binance),
            "bitmex" => Ok(Self::Bitmex),
            "kraken" => Ok(Self::Kraken),
            _ => Err(ParseVenueError(s.to_string())),
        }
    }
}

/// Error parsing venue string.
#[derive(Debug, Clone)]
pub struct ParseVenueError(String);

impl fmt::Display for ParseVenueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid venue '{}', expected 'binance', 'bitmex' or 'kraken'",
            self.0
        )
    }
}

impl std::error::Error for ParseVenueError {}

/// Trading environment (production or testnet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Production environment (real money).
    Production,
    /// Testnet environment (fake money for testing).
    #[default]
    Testnet,
}

impl Environment {
    /// Returns true if this is the production environment.
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Load environment from `BARGAIN_ENVIRONMENT` env var.
    ///
    /// Returns `Testnet` if not set or invalid, so a missing variable never
    /// sends real orders.
    pub fn from_env() -> Self {
        std::env::var("BARGAIN_ENVIRONMENT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Production => write!(f, "production"),
            Self::Testnet => write!(f, "testnet"),
        }
    }
}

impl FromStr for Environment {
    type Err = ParseEnvironmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" | "prod" | "live" | "mainnet" => Ok(Self::Production),
            "testnet" | "test" | "sandbox" => Ok(Self::Testnet),
            _ => Err(ParseEnvironmentError(s.to_string())),
        }
    }
}

/// Error parsing environment string.
#[derive(Debug, Clone)]
pub struct ParseEnvironmentError(String);

impl fmt::Display for ParseEnvironmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid environment '{}', expected 'production' or 'testnet'",
            self.0
        )
    }
}

impl std::error::Error for ParseEnvironmentError {}
