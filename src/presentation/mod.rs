//! HTML views rendered by the public listener.

pub mod views;
