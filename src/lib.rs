//! # Pagina
//!
//! Line breaking, bidi reordering and overflow-aware pagination for paged
//! media.
//!
//! Paged output has a problem screens don't: content that is wider than the
//! page, or rotated or translated past its edge, has nowhere to go. Pagina
//! takes a positioned box tree, cuts it into pages, and for every page whose
//! content spills out sideways it adds *shadow pages* holding just the
//! spilled part. Content clipped by a hidden-overflow ancestor stays
//! clipped; fixed headers, footers and watermarks appear on every page,
//! shadow pages included, without ever causing pages of their own.
//!
//! ## Architecture
//!
//! ```text
//! Input (JSON/API)
//!       ↓
//!   [model]    — Positioned box tree, page config, fonts
//!       ↓
//!   [style]    — Inheritance and defaults
//!       ↓
//!   [text]     — Break opportunities, bidi runs, lines, justification
//!       ↓
//!   [layout]   — Pages, overflow detection, shadow pages, fixed/running copies
//!       ↓
//!   Pagination (to an external renderer)
//! ```

pub mod config;
pub mod error;
pub mod font;
pub mod geometry;
pub mod layout;
pub mod model;
pub mod style;
pub mod text;

pub use config::{Engine, EngineBuilder};
pub use error::PaginaError;
pub use layout::Pagination;

use model::Document;

/// Paginate a document with the default engine.
pub fn paginate(document: &Document) -> Result<Pagination, PaginaError> {
    Engine::default().paginate(document)
}

/// Paginate a document described as JSON with the default engine.
pub fn paginate_json(json: &str) -> Result<Pagination, PaginaError> {
    Engine::default().paginate_json(json)
}
