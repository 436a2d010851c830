//! Client-side adapters for the terminal front end.
//!
//! [`HttpChatApi`] talks to a running `palaver serve`; [`FileSessionStore`]
//! keeps the signed-in session in the data directory.

pub mod http_api;
pub mod session_store;

pub use http_api::HttpChatApi;
pub use session_store::FileSessionStore;
