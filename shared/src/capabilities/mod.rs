//! Effects the core asks the shell to perform.
//!
//! Render, HTTP and key-value storage are the stock Crux capabilities;
//! the submodules hold the Chirp-specific routing and encoding around them.
pub use crux_core::render::Render;
pub use crux_http::Http;
pub use crux_kv::KeyValue;

pub mod http;
pub mod kv;

use crate::event::Event;
use crate::App;

pub use self::http::ApiRoutes;

/// Effect variants are named after the capability types: `Http`,
/// `KeyValue` and `Render`.
#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub http: Http<Event>,
    pub key_value: KeyValue<Event>,
    pub render: Render<Event>,
}
