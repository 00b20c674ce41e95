//! Pixel-art agent - turns structured asset requests into sprite designs
//!
//! Renders a design prompt for a text model, extracts palette and animation
//! hints from its answer, and optionally asks a diffusion model for a matching
//! sprite image, serving all of it over a small REST API.

pub mod ai;
pub mod app;
pub mod error;
pub mod image;
pub mod models;
pub mod parser;
pub mod prompts;
pub mod server;
pub mod service;

pub use error::{Error, Result};
