//! Flow composition over the live catalog.
//!
//! Templates are fixed; a template becomes an [`AutoFlow`](apiloom_core::AutoFlow)
//! only when every one of its steps resolves to a live auto endpoint.

pub mod composer;
pub mod templates;

pub use composer::FlowComposer;
pub use templates::{FlowTemplate, TemplateStep, FLOW_TEMPLATES};
