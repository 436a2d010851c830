//! Client-side view models.
//!
//! Headless: they hold state and talk to the `SessionStore` and `ChatApi`
//! ports; the terminal front end in palaver-api draws them.

pub mod api;
pub mod chat;
pub mod profile;

pub use api::ChatApi;
pub use chat::{ChatView, SubmitOutcome, ViewMessage};
pub use profile::ProfileView;
