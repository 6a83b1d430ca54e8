//! Document upload and document-grounded question endpoints

use axum::{
    extract::{Multipart, State},
    http::HeaderMap,
    Json,
};

use crate::error::{Error, Result};
use crate::generation::PromptBuilder;
use crate::pipeline::IngestOutcome;
use crate::server::state::AppState;
use crate::types::{AskWithDocResponse, FileType, UploadResponse};

use super::report_reference;

/// Case-lookup hint used for whole-document analysis
const DOCUMENT_ANALYSIS_HINT: &str = "document analysis";

/// An uploaded file pulled out of a multipart body
struct UploadedFile {
    filename: String,
    data: Vec<u8>,
}

/// Fields of an upload form
#[derive(Default)]
struct UploadForm {
    file: Option<UploadedFile>,
    query: Option<String>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| Error::bad_request(format!("Failed to read multipart field: {}", e)))?
        {
            let name = field.name().unwrap_or("").to_string();
            match name.as_str() {
                "file" => {
                    let filename = field.file_name().map(sanitize_filename).unwrap_or_default();
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| Error::bad_request(format!("Failed to read file: {}", e)))?;
                    form.file = Some(UploadedFile {
                        filename,
                        data: data.to_vec(),
                    });
                }
                "query" => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| Error::bad_request(format!("Failed to read query: {}", e)))?;
                    form.query = Some(text);
                }
                other => tracing::debug!("Ignoring multipart field {:?}", other),
            }
        }

        Ok(form)
    }

    /// The uploaded file, checked for content and a supported extension
    fn take_file(&mut self) -> Result<UploadedFile> {
        let file = self
            .file
            .take()
            .ok_or_else(|| Error::bad_request("Missing file"))?;

        if file.data.is_empty() {
            return Err(Error::bad_request("Empty file"));
        }
        if file.filename.is_empty() {
            return Err(Error::bad_request("Missing filename"));
        }
        if FileType::from_filename(&file.filename).is_none() {
            return Err(Error::UnsupportedFileType(file.filename));
        }

        Ok(file)
    }
}

/// Keep only the final path component of a client-supplied filename
fn sanitize_filename(raw: &str) -> String {
    let name = raw.rsplit(['/', '\\']).next().unwrap_or("").trim();
    if name == "." || name == ".." {
        String::new()
    } else {
        name.to_string()
    }
}

async fn ingest(state: &AppState, file: UploadedFile) -> Result<(String, IngestOutcome)> {
    tracing::info!("Processing upload: {} ({} bytes)", file.filename, file.data.len());

    let path = state.upload_path(&file.filename);
    let outcome = state
        .pipeline()
        .ingest_upload(&path, &file.filename, file.data)
        .await?;
    Ok((file.filename, outcome))
}

/// POST /upload - Index a document and analyse it for a layperson
pub async fn upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let mut form = UploadForm::read(multipart).await?;
    let file = form.take_file()?;

    let (filename, ingested) = ingest(&state, file).await?;
    let prompt = PromptBuilder::document_analysis(
        &ingested.text,
        state.config().analysis.max_document_chars,
    );

    let outcome = state.pipeline().run(&prompt, DOCUMENT_ANALYSIS_HINT).await?;
    let reference = report_reference(&state, &headers, &outcome.report.filename);

    Ok(Json(UploadResponse {
        filename,
        chunks_added: ingested.chunks_added,
        analysis: outcome.answer,
        references: vec![reference],
    }))
}

/// POST /ask-with-doc - Answer a question about an uploaded document
pub async fn ask_with_doc(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<AskWithDocResponse>> {
    let mut form = UploadForm::read(multipart).await?;
    let query = form
        .query
        .take()
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| Error::bad_request("Missing query"))?;
    let file = form.take_file()?;

    let (filename, ingested) = ingest(&state, file).await?;
    let prompt = PromptBuilder::query_with_document(
        &query,
        &ingested.text,
        state.config().analysis.max_document_chars,
    );

    let outcome = state.pipeline().run(&prompt, &query).await?;
    let reference = report_reference(&state, &headers, &outcome.report.filename);

    Ok(Json(AskWithDocResponse {
        query,
        filename,
        chunks_added: ingested.chunks_added,
        analysis: outcome.answer,
        references: vec![reference],
    }))
}
