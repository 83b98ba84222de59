//! Client for the AI tag generation backend.
//!
//! The backend proposes tags for a location in one of two modes. SEO mode
//! returns free-text tags per category, which are reconciled with existing
//! tags by [`crate::tags::FuzzyMatcher`] before they are stored. Wizard mode
//! returns weights for the fixed wizard tag ids.
//!
//! ```no_run
//! use loctag::ai::{GenerateTagsRequest, GenerationMode, TagGenerationClientBuilder, TagGenerator};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = TagGenerationClientBuilder::new()
//!     .base_url("http://localhost:8000")
//!     .build()?;
//!
//! let request = GenerateTagsRequest {
//!     location_name: "Livigno".to_string(),
//!     description: "High-altitude duty-free ski town".to_string(),
//!     services: serde_json::json!([]),
//!     language: "it".to_string(),
//!     mode: GenerationMode::Seo,
//! };
//! let suggestion = client.generate_tags(&request)?;
//! # Ok(())
//! # }
//! ```

mod client;

pub use client::{
    AiError, DEFAULT_TIMEOUT_SECS, GenerateTagsRequest, GenerationMode, TagGenerationClient,
    TagGenerationClientBuilder, TagGenerator, TagSuggestion, TagWeights, parse_response,
};
