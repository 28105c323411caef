//! chemora-expert - The expert knowledge layer as one programmatic surface.
//!
//! [`ExpertLayer`] owns the graph loader and every component configured
//! from [`Config`]. Each component is also usable on its own from its crate,
//! taking the graph as an argument.

pub mod config;
pub mod context;
pub mod error;
pub mod expert;

pub use config::Config;
pub use context::{ContextBuilder, ContextBundle, ContextConcept, ContextMethod, ContextMetadata, CONTEXT_SOURCE};
pub use error::{ChemoraError, Result};
pub use expert::ExpertLayer;
