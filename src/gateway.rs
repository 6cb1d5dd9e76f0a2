//! Math problem solving on top of a [`GenerativeModel`].
//!
//! Each solve builds exactly one user message and makes exactly one model
//! call; nothing is cached or retried.

use crate::ai::gemini::{Content, Part};
use crate::ai::GenerativeModel;
use crate::models::{Answer, ImageQuery, TextQuery};
use crate::{prompts, Error, Result};
use base64::Engine as _;
use std::sync::Arc;

#[derive(Clone)]
pub struct ModelGateway {
    model: Arc<dyn GenerativeModel>,
}

impl ModelGateway {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }

    pub async fn solve_text(&self, query: &TextQuery) -> Result<Answer> {
        tracing::info!(
            query_len = query.query.len(),
            custom_instruction = query.system_instruction.is_some(),
            "Solving text problem"
        );

        let contents = text_contents(query);
        let answer = self.model.generate_content(&contents).await?;
        Ok(Answer::new(answer))
    }

    pub async fn solve_image(&self, query: &ImageQuery) -> Result<Answer> {
        let contents = image_contents(query)?;

        tracing::info!(
            image_bytes = query.image.len(),
            media_type = %query.media_type,
            "Solving image problem"
        );

        let answer = self.model.generate_content(&contents).await?;
        Ok(Answer::new(answer))
    }
}

/// `[instruction, "Problem:", query]` as a single user message.
pub fn text_contents(query: &TextQuery) -> Vec<Content> {
    let instruction = query
        .system_instruction
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or(prompts::TEXT_INSTRUCTION);

    vec![Content::user(vec![
        Part::text(instruction),
        Part::text(prompts::PROBLEM_LABEL),
        Part::text(query.query.as_str()),
    ])]
}

/// `[instruction, image]`, plus `["Additional context:", query]` when a
/// non-empty query accompanies the upload.
pub fn image_contents(query: &ImageQuery) -> Result<Vec<Content>> {
    if query.image.is_empty() {
        return Err(Error::InvalidInput("Empty image upload".to_string()));
    }

    let encoded = base64::engine::general_purpose::STANDARD.encode(&query.image);

    let mut parts = vec![
        Part::text(prompts::IMAGE_INSTRUCTION),
        Part::inline_data(query.media_type.as_str(), encoded),
    ];

    if let Some(context) = query.query.as_deref().filter(|q| !q.is_empty()) {
        parts.push(Part::text(prompts::CONTEXT_LABEL));
        parts.push(Part::text(context));
    }

    Ok(vec![Content::user(parts)])
}
