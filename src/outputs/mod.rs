//! Output generation.
//!
//! # Submodules
//!
//! - [`json`]: Writes the scored articles of a run as one JSON array
//!
//! # Output Structure
//!
//! ```text
//! data.json   # [ {"url": ..., "news_importance_score": 5.5, ...}, ... ]
//! ```

pub mod json;
