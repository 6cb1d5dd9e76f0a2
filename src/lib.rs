//! Math problem gateway backed by Gemini
//!
//! Accepts a math problem as text or as an uploaded image, forwards it to
//! Gemini's `generateContent` endpoint, and returns the model's answer over a
//! small JSON HTTP API.

pub mod ai;
pub mod error;
pub mod gateway;
pub mod models;
pub mod prompts;
pub mod server;

pub use error::{Error, Result};
