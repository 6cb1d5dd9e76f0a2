//! Generative model integration
//!
//! The gateway talks to its model through [`GenerativeModel`]; Gemini's REST
//! API is the production implementation and [`MockModelClient`] stands in
//! for it in tests.

pub mod gemini;
pub mod mime;
pub mod mock;

pub use gemini::GeminiClient;
pub use mock::MockModelClient;

use crate::Result;
use async_trait::async_trait;
use gemini::Content;

#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Send one `generateContent` call and return the answer text.
    ///
    /// Transport, status and configuration problems are errors; an
    /// unexpected response shape is not.
    async fn generate_content(&self, contents: &[Content]) -> Result<String>;
}
