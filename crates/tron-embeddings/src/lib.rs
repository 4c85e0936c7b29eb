//! # tron-embeddings
//!
//! `ONNX`-based semantic embeddings and vector search.
//!
//! Uses Qwen3-Embedding-0.6B with q4 quantization via `ort`:
//! - Tokenize -> inference -> last-token pooling
//! - Matryoshka truncation (1024d -> 512d) + L2 normalization
//! - `sqlite-vec` integration for vector similarity search
//!
//! This crate is feature-gated and only compiled when embeddings are needed.

#![deny(unsafe_code)]

pub mod config;
pub mod controller;
pub mod errors;
pub mod normalize;
#[cfg(feature = "ort")]
pub mod ort_service;
pub mod service;
pub mod text;
pub mod vector_repo;

pub use config::EmbeddingConfig;
pub use controller::{BackfillEntry, BackfillResult, EmbeddingController};
pub use errors::{EmbeddingError, Result};
pub use service::EmbeddingService;
pub use vector_repo::{SearchOptions, VectorRepository, VectorSearchResult};
