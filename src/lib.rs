//! Guidebook server: a SQLite guide store and an HTTP API around the
//! [`guidebook_core`] outline editor.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod render;

pub use guidebook_core as core;
