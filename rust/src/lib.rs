pub mod cli;
pub mod config;
pub mod delay;
pub mod error;
pub mod logging;
pub mod models;
pub mod service;
pub mod transport;

pub use error::{ConfigError, ServiceError};
pub use service::ReservationService;
