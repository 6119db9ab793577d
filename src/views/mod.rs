pub mod catalog;
pub mod common;
pub mod debug;
pub mod status_bar;
