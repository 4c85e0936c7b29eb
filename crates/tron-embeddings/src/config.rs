//! Embedding configuration.

use serde::{Deserialize, Serialize};
use tron_settings::types::MemoryEmbeddingSettings;

/// Full embedding dimensions before Matryoshka truncation.
const FULL_DIMENSIONS: usize = 1024;

/// Configuration for the embedding system.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmbeddingConfig {
    /// Whether embeddings are enabled.
    pub enabled: bool,
    /// ONNX model identifier.
    pub model: String,
    /// Quantization dtype.
    pub dtype: String,
    /// Output dimensions (after Matryoshka truncation).
    pub dimensions: usize,
    /// Full model output dimensions (before truncation).
    pub full_dimensions: usize,
    /// Local model cache directory (may contain `~`).
    pub cache_dir: String,
    /// Maximum tokens for workspace lesson injection.
    pub max_workspace_lessons_tokens: usize,
    /// Maximum tokens for cross-project memory injection.
    pub max_cross_project_tokens: usize,
    /// Top-K results for cross-project search.
    pub cross_project_top_k: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self::from_settings(&MemoryEmbeddingSettings::default())
    }
}

impl EmbeddingConfig {
    /// Create config from settings.
    pub fn from_settings(s: &MemoryEmbeddingSettings) -> Self {
        Self {
            enabled: s.enabled,
            model: s.model.clone(),
            dtype: s.dtype.clone(),
            dimensions: s.dimensions,
            full_dimensions: FULL_DIMENSIONS,
            cache_dir: s.cache_dir.clone(),
            max_workspace_lessons_tokens: s.max_workspace_lessons_tokens,
            max_cross_project_tokens: s.max_cross_project_tokens,
            cross_project_top_k: s.cross_project_top_k,
        }
    }

    /// Resolve the cache directory, expanding `~/` to the home directory.
    pub fn resolved_cache_dir(&self) -> String {
        if self.cache_dir.starts_with("~/") {
            if let Ok(home) = std::env::var("HOME") {
                return format!("{}{}", home, &self.cache_dir[1..]);
            }
        }
        self.cache_dir.clone()
    }

    /// Create a disabled config (for testing or when embeddings are off).
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}
