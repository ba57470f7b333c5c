//! Space-weather feeds for the Stellar Tales learning app.
//!
//! - [`infrastructure::cache`]: TTL request cache with de-duplication,
//!   background refresh and stale-on-error fallback
//! - [`application`]: NASA and NOAA normalizers built on that cache
//! - [`service_worker`]: offline cache for the app shell and static assets

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod service_worker;
pub mod state;
