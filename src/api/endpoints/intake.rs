//! Intake endpoint.
//!
//! `POST /intake`: `file`, `json_body` or `email_body`, sent either as
//! `multipart/form-data` or (text fields only) as
//! `application/x-www-form-urlencoded`. The first present in that order
//! wins, regardless of field order in the body. Empty values count as
//! absent, and so does a body of any other content type.

use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ErrorResponse};
use crate::pipeline::{RawInput, DEFAULT_SOURCE};

#[derive(Default)]
struct IntakeForm {
    file: Option<(Option<String>, Vec<u8>)>,
    json_body: Option<String>,
    email_body: Option<String>,
}

impl IntakeForm {
    /// Pick the payload and the source name recorded for it.
    fn into_input(self) -> Option<(String, RawInput)> {
        if let Some((filename, bytes)) = self.file {
            let source = filename.unwrap_or_else(|| DEFAULT_SOURCE.to_string());
            return Some((source, RawInput::Bytes(bytes)));
        }
        self.json_body
            .or(self.email_body)
            .map(|text| (DEFAULT_SOURCE.to_string(), RawInput::Text(text)))
    }
}

/// Text fields of a urlencoded intake form.
#[derive(Debug, Default, Deserialize)]
struct TextFields {
    json_body: Option<String>,
    email_body: Option<String>,
}

impl From<TextFields> for IntakeForm {
    fn from(fields: TextFields) -> Self {
        Self {
            file: None,
            json_body: fields.json_body.filter(|text| !text.is_empty()),
            email_body: fields.email_body.filter(|text| !text.is_empty()),
        }
    }
}

enum BodyEncoding {
    Multipart,
    UrlEncoded,
    Other,
}

fn body_encoding(request: &Request) -> BodyEncoding {
    let mime = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|essence| essence.trim().to_ascii_lowercase());

    match mime.as_deref() {
        Some("multipart/form-data") => BodyEncoding::Multipart,
        Some("application/x-www-form-urlencoded") => BodyEncoding::UrlEncoded,
        _ => BodyEncoding::Other,
    }
}

/// Read the form in whichever encoding the request declares. A missing
/// or unsupported content type yields an empty form.
async fn read_form(request: Request) -> Result<IntakeForm, ApiError> {
    match body_encoding(&request) {
        BodyEncoding::Multipart => {
            let mut multipart = Multipart::from_request(request, &())
                .await
                .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {e}")))?;
            read_multipart(&mut multipart).await
        }
        BodyEncoding::UrlEncoded => {
            let Form(fields) = Form::<TextFields>::from_request(request, &())
                .await
                .map_err(|e| ApiError::BadRequest(format!("Malformed form body: {e}")))?;
            Ok(fields.into())
        }
        BodyEncoding::Other => {
            tracing::debug!("Intake body has no form content type");
            Ok(IntakeForm::default())
        }
    }
}

async fn read_multipart(multipart: &mut Multipart) -> Result<IntakeForm, ApiError> {
    let mut form = IntakeForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let filename = field
                    .file_name()
                    .filter(|f| !f.is_empty())
                    .map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read file: {e}")))?;
                if !bytes.is_empty() {
                    form.file = Some((filename, bytes.to_vec()));
                }
            }
            "json_body" | "email_body" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read {name}: {e}")))?;
                if text.is_empty() {
                    continue;
                }
                if name == "json_body" {
                    form.json_body = Some(text);
                } else {
                    form.email_body = Some(text);
                }
            }
            other => tracing::debug!(field = other, "Ignoring unknown intake field"),
        }
    }

    Ok(form)
}

/// `POST /intake`: run one input through the pipeline.
pub async fn submit(
    State(ctx): State<ApiContext>,
    request: Request,
) -> Result<Response, ApiError> {
    let form = read_form(request).await?;

    let Some((source, raw)) = form.into_input() else {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "No input provided".into(),
            }),
        )
            .into_response());
    };

    tracing::info!(source = %source, bytes = raw.len(), "Intake received");

    // Synchronous pipeline (SQLite, PDF parsing). A panic inside surfaces
    // as a JoinError → 500.
    let core = ctx.core.clone();
    let response = tokio::task::spawn_blocking(move || {
        core.processor().handle_from(&source, &raw)
    })
    .await?;

    Ok(Json(response).into_response())
}
