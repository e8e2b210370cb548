//! # evtracker-client
//!
//! Async client for the EV Tracker REST API.
//!
//! The client wraps the fixed JSON wire contract of the EV Tracker service
//! behind typed method calls: listing cars, fetching aggregate statistics,
//! logging charging sessions and validating an API key. Each operation
//! performs exactly one HTTP request; nothing is cached or retried.
//!
//! ```no_run
//! use evtracker_client::{EnergySource, EvTrackerClient, EvTrackerConfig, RateTier, SessionLog};
//!
//! # async fn run() -> Result<(), evtracker_client::Error> {
//! let client = EvTrackerClient::new(EvTrackerConfig::new("my-api-key"))?;
//!
//! let cars = client.get_vehicles().await?;
//! println!("{} cars registered", cars.len());
//!
//! let session = client
//!     .log_session_simple(45.5, EnergySource::Grid, RateTier::Low, SessionLog::default())
//!     .await?;
//! println!("logged session {}", session.id);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod error;
pub mod models;

pub use client::{EvTrackerClient, EvTrackerConfig, DEFAULT_BASE_URL};
pub use error::Error;
pub use models::{
    AggregateState, ChargingSession, EnergySource, RateTier, SessionLog, Vehicle,
};
