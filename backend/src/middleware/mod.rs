//! Request middleware.

pub mod api_key;

pub use api_key::{api_key_relay, ApiKey, API_KEY_HEADER};
