//! HTML error pages for a proxy.
//!
//! An [`ErrorPageRegistry`] maps status codes to template files. For each
//! failed request the [`ErrorResponder`] records the error and its variables
//! in a [`ResponseContext`], writes the response headers and streams the
//! template through the [`TemplateRenderer`], falling back to a built-in page
//! when the template can't be opened.

pub mod config;
pub mod error;
pub mod models;
pub mod read;
pub mod registry;
pub mod request;
pub mod responder;
pub mod response;
pub mod server;
pub mod template;
pub mod variables;
pub mod write;

pub use error::{Error, Result};
pub use registry::ErrorPageRegistry;
pub use responder::{ErrorResponder, Phase, ResponseContext};
pub use response::ServerIdentity;
pub use template::TemplateRenderer;
pub use variables::VariableStore;
