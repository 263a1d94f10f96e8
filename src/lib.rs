//! Order Sheet Sync Library
//!
//! Pulls recent orders from the Shopify Admin REST API, flattens them into a
//! fixed-column report and overwrites a Google Sheets tab with the result.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod errors;
pub mod models;
pub mod pipeline;
pub mod services;

pub use errors::{SyncError, SyncResult};
pub use pipeline::{run_sync, SyncReport};
