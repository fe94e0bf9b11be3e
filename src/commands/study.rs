//! Study package generation actions

use crate::ai::prompts::{Prompt, PromptBuilder};
use crate::ai::{decode_study_package, CompletionClient, CompletionRequest, ModelTier, StudyPackage};
use crate::ai::types::GenerationOptions;
use crate::documents::Upload;
use crate::error::StudyError;

use super::{extract_upload, ActionContext, ActionResult};

/// Generate a study package from an uploaded document
pub async fn from_document(
    client: &dyn CompletionClient,
    context: &ActionContext,
    upload: Upload,
    options: GenerationOptions,
) -> ActionResult<StudyPackage> {
    tracing::info!(
        file = %upload.file_name,
        bytes = upload.bytes.len(),
        "Generating study package from document"
    );
    let result = document_pipeline(client, context, upload, &options).await;
    context.finish("from_document", result)
}

/// Generate a study package from a course and topic name
pub async fn from_topic(
    client: &dyn CompletionClient,
    context: &ActionContext,
    course: &str,
    topic: &str,
    options: GenerationOptions,
) -> ActionResult<StudyPackage> {
    tracing::info!(course = course, topic = topic, "Generating study package from topic");
    let result = topic_pipeline(client, course, topic, &options).await;
    context.finish("from_topic", result)
}

async fn document_pipeline(
    client: &dyn CompletionClient,
    context: &ActionContext,
    upload: Upload,
    options: &GenerationOptions,
) -> Result<StudyPackage, StudyError> {
    let document = extract_upload(context, upload).await?;
    tracing::debug!(
        kind = ?document.kind,
        words = document.word_count,
        pages = ?document.page_count,
        "Document extracted"
    );

    let prompt = PromptBuilder::for_model(client.model_for(ModelTier::Generation))
        .from_document(&document.text, options);
    generate(client, prompt).await
}

async fn topic_pipeline(
    client: &dyn CompletionClient,
    course: &str,
    topic: &str,
    options: &GenerationOptions,
) -> Result<StudyPackage, StudyError> {
    if course.trim().is_empty() {
        return Err(StudyError::InvalidInput("course must not be empty".to_string()));
    }
    if topic.trim().is_empty() {
        return Err(StudyError::InvalidInput("topic must not be empty".to_string()));
    }

    let prompt = PromptBuilder::for_model(client.model_for(ModelTier::Generation))
        .from_topic(course, topic, options);
    generate(client, prompt).await
}

async fn generate(client: &dyn CompletionClient, prompt: Prompt) -> Result<StudyPackage, StudyError> {
    let raw = client.complete(CompletionRequest::generation(prompt)).await?;
    let package = decode_study_package(&raw)?;
    tracing::info!(
        quiz = package.quiz.len(),
        flashcards = package.flashcards.len(),
        "Study package generated"
    );
    Ok(package)
}
