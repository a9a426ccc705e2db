//! transctl: client tooling for a local machine-translation server.
//!
//! Persists user state (last model, history, corrections), manages models
//! over the server's REST API, collects and aggregates server and client
//! metrics, and renders diagnostic reports for the terminal, JSON exports,
//! and the embedded web dashboard.

pub mod cli;
pub mod client;
pub mod config;
pub mod metrics;
pub mod render;
pub mod report;
pub mod storage;
pub mod translate;
pub mod web;
