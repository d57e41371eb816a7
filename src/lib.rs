//! Bookshelf: a small book catalogue with typed metadata, taxonomies, HTML
//! widgets and a cached admin API.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
