//! # proposal-forge – proposal document composition and pagination
//!
//! This crate turns a flat record of proposal fields into a paginated,
//! render-ready document and a self-contained HTML string for an external
//! rasteriser. The pipeline stages are:
//!
//! 1. **Compose** – fields → semantic blocks with rules attached ([`compose`])
//! 2. **Layout** – box geometry, margins and column layout ([`layout`])
//! 3. **Flow** – height estimates, stacking and flow groups ([`flow`])
//! 4. **Paginate** – place blocks onto fixed-size pages ([`pagination`])
//! 5. **Render** – per-block markup and stylesheets ([`render`])
//!
//! Each stage takes a [`DocumentModel`] by reference and returns a new one.
//! A C-compatible FFI surface is exposed via the [`ffi`] module.

pub mod compose;
pub mod error;
pub mod ffi;
pub mod fields;
pub mod flow;
pub mod layout;
pub mod metrics;
pub mod model;
pub mod page_layout;
pub mod pagination;
pub mod pipeline;
pub mod render;
pub mod rules;
pub mod style;
pub mod templates;
pub mod validate;

// Re-exports for convenience
pub use error::{Error, Result};
pub use fields::ProposalFields;
pub use model::{Block, BlockType, DocumentModel};
pub use pipeline::{generate_html, generate_html_from_fields, PipelineConfig};
