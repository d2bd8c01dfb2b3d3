//! # GhostCut
//!
//! Application layer for GhostCut: configuration, the LLM-backed claims
//! producer, session and pipeline orchestration, JSON export, and the
//! HTTP server. The deterministic verification and scoring logic lives in
//! [`ghostcut_core`].

pub mod config;
pub mod export;
pub mod pipeline;
pub mod producer;
pub mod server;
pub mod session;
