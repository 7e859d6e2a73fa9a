//! `remessa` - local-first patient shipment logistics tracking
//!
//! This library provides the data-access layer of the tracker: a local
//! SQLite store every mutation lands in, a best-effort client for the
//! hosted table backend, and the service façade combining the two with a
//! local-first consistency policy.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod record;
pub mod remote;
pub mod service;
pub mod session;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
pub use export::{display_date, parse_display_date, to_csv};
pub use logging::init_logging;
pub use record::ShipmentRecord;
pub use remote::{HttpRemote, RemoteStore};
pub use service::{ServiceStatus, ShipmentService, StorageMode};
pub use session::{Session, SessionStore};
pub use store::LocalStore;
