//! HTTP service that reports the recent daily closing prices of one symbol.
//!
//! Requests are answered from the cache when it holds a full window and from
//! the upstream otherwise. The full history is loaded into the cache once at
//! startup.

pub mod app;
pub mod config;
pub mod server;
pub mod service;
pub mod telemetry;
