//! Contract generation: variable resolution, template rendering and the
//! generate/regenerate pipeline that feeds the layout engine.

pub mod generator;
pub mod handlers;
pub mod renderer;
pub mod store;
pub mod variables;

pub use store::{EntityStore, PgEntityStore};
