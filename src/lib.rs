//! Channel Job Watcher library.
//!
//! Watches a video channel for new uploads, pulls job-application links out of
//! each video description, records new finds in a JSON ledger and announces
//! them on Telegram.

pub mod browser;
pub mod config;
pub mod constants;
mod fs_utils;
pub mod links;
pub mod notify;
pub mod pipeline;
pub mod processor;
pub mod scanner;
pub mod store;
