// Contract layout: font metrics, markup classification, greedy wrapping and
// pagination into an absolutely positioned page model.
// The engine is CPU-bound and must run inside tokio::task::spawn_blocking.

pub mod engine;
pub mod font_metrics;
pub mod markup;
pub mod page;
pub mod wrap;

// Re-export the public API consumed by other modules (generator, export, handlers).
pub use engine::{layout_document, RenderedDocument};
pub use page::{LaidOutDocument, LayoutConfig};
