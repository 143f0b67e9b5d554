//! salonbook: client-side state and terminal front end for a salon
//! scheduling backend.
//!
//! ```text
//! user action ─▶ ApiClient ─▶ EntityStore reload ─▶ view projection
//!                  │
//!                  └─▶ Notifier (transient success/error messages)
//! ```

pub mod api;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod form;
pub mod model;
pub mod settings;
pub mod store;
pub mod view;

pub use crate::error::{Error, Result};
