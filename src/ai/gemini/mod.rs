pub mod client;
pub mod extract;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::{GeminiClient, GEMINI_MODEL};
pub use extract::extract_answer;
pub use types::{Content, InlineData, Part};
