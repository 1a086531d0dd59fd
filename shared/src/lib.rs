#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

//! Shared core of the Chirp client: paginated feeds and user lists with
//! optimistic likes, retweets and follows, plus the session that authorizes
//! them. Shells drive it through Crux events; async hosts can use
//! [`list::PagedList`] directly.
//!
//! The core never reads the system clock. Time only advances through
//! [`Event::TimerTick`], which the shell sends from its own clock.

pub mod app;
pub mod capabilities;
pub mod compose;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod event;
pub mod list;
pub mod model;
pub mod notify;
pub mod profile;
pub mod session;

pub use app::{App, Model, ViewModel};
pub use capabilities::{Capabilities, Effect};
pub use config::ClientConfig;
pub use crux_core::{render::Render, App as CruxApp};
pub use error::{NetworkError, NetworkResult};
pub use event::Event;
pub use list::{ListController, ListQuery, ListResource, ListStatus, ToggleField};
pub use session::{BearerToken, Session};
