//! # GhostCut Core
//!
//! Deterministic verification and scoring logic for GhostCut: data models,
//! line-indexed chunking, evidence verification against source text,
//! whole-document aggregation, compression quality analysis, and the
//! retrieval-audit contract.
//!
//! This crate contains no tokio, network, filesystem I/O, or other
//! native-only dependencies. Everything here is pure computation over
//! `(source text, claims tree)` pairs already in memory, so it compiles
//! to both native targets and `wasm32-unknown-unknown`.

pub mod audit;
pub mod chunk;
pub mod models;
pub mod producer;
pub mod quality;
pub mod stats;
pub mod verify;
