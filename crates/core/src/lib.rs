#![deny(missing_docs)]
//! mdpress core: directive resolution, region extraction, fences, and slugs.

/// Code fence detection utilities.
pub mod code_fence;
/// Render configuration.
pub mod config;
/// Container, alert, and TOC macro line syntax.
pub mod directives;
/// Input document type.
pub mod document;
/// Core error and diagnostic types.
pub mod error;
/// Region and line-range extraction.
pub mod region;
/// Include and import directive resolution.
pub mod resolve;
/// Slug generation utilities.
pub mod slug;

pub use code_fence::{FenceLine, FenceOpening, FenceTracker, parse_fence_opening};
pub use config::RenderOptions;
pub use directives::{
    AlertKind, ContainerKind, ContainerOpening, is_container_closer, is_toc_macro,
    opens_any_container, parse_alert_marker, parse_container_opening,
};
pub use document::Document;
pub use error::{Diagnostic, Diagnostics, PressError, SourceLocation};
pub use region::{LineRange, Selector, extract};
pub use resolve::{FsLoader, MemoryLoader, Resolver, SourceLoader, resolve, resolve_document};
pub use slug::{Slugger, extract_custom_id, extract_toc_ignore, slugify};
