//! Photo Booth backend service
//!
//! HTTP gateway over the photo storage backends plus the retention sweeper.

#![deny(clippy::all, clippy::pedantic, clippy::nursery, dead_code)]
#![allow(clippy::module_name_repetitions)]

pub mod photo_backend;
pub mod retention_sweeper;
pub mod routes;
pub mod server;
pub mod types;
