//! Application services layer.

pub mod api_keys;
pub mod books;
pub mod catalog;
pub mod error;
pub mod repos;
pub mod settings;
pub mod shortcode;
