//! The audit submission endpoint.
//!
//! `POST /audit` accepts either a JSON body (`{text|url, category,
//! analysisMode, country, region}`) or `multipart/form-data` with a
//! single `file` part plus the same fields. The caller identity arrives
//! in the `X-User-Id` header; authentication itself is upstream.

use audit::{AuditInput, AuditOptions, Jurisdiction, Report};
use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;

use crate::app::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
struct AuditBody {
    text: Option<String>,
    url: Option<String>,
    category: Option<String>,
    #[serde(rename = "analysisMode")]
    analysis_mode: Option<String>,
    country: Option<String>,
    region: Option<String>,
}

#[derive(Default)]
struct Fields {
    category: Option<String>,
    analysis_mode: Option<String>,
    country: Option<String>,
    region: Option<String>,
}

impl Fields {
    fn into_options(self, user_id: String) -> AuditOptions {
        let mut options = AuditOptions::new(user_id, self.category.unwrap_or_default());
        let mut jurisdiction = Jurisdiction::new(self.country.unwrap_or_default());
        jurisdiction.region = self.region.filter(|r| !r.trim().is_empty());
        options = options.with_jurisdiction(jurisdiction);
        if let Some(mode) = self.analysis_mode.filter(|m| !m.trim().is_empty()) {
            options = options.with_analysis_mode(mode);
        }
        options
    }
}

/// Submit content for audit.
pub async fn audit_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
) -> Result<(StatusCode, Json<Report>), ApiError> {
    let user_id = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::new(StatusCode::UNAUTHORIZED, "missing X-User-Id header"))?
        .to_string();

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let (input, options) = if content_type.starts_with("multipart/form-data") {
        parse_multipart(request, &state, user_id).await?
    } else {
        parse_json(request, &state, user_id).await?
    };

    let report = state.pipeline.audit(input, options).await?;

    // Reasoner-unrecoverable results come back as an error shell; per the
    // "never crash" contract they are a 200, successful audits a 201.
    let status = if report.error.is_some() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(report)))
}

async fn parse_json(
    request: Request,
    state: &AppState,
    user_id: String,
) -> Result<(AuditInput, AuditOptions), ApiError> {
    let Json(body) = Json::<AuditBody>::from_request(request, state)
        .await
        .map_err(|e| ApiError::bad_request(format!("invalid JSON body: {e}")))?;

    let input = match (body.text, body.url) {
        (Some(text), None) => AuditInput::Text { body: text },
        (None, Some(url)) => AuditInput::Url { href: url },
        (Some(_), Some(_)) => {
            return Err(ApiError::bad_request("provide either text or url, not both"))
        }
        (None, None) => return Err(ApiError::bad_request("provide text or url")),
    };

    let fields = Fields {
        category: body.category,
        analysis_mode: body.analysis_mode,
        country: body.country,
        region: body.region,
    };
    Ok((input, fields.into_options(user_id)))
}

async fn parse_multipart(
    request: Request,
    state: &AppState,
    user_id: String,
) -> Result<(AuditInput, AuditOptions), ApiError> {
    let mut multipart = Multipart::from_request(request, state)
        .await
        .map_err(|e| ApiError::bad_request(format!("invalid multipart body: {e}")))?;

    let mut file: Option<AuditInput> = None;
    let mut fields = Fields::default();

    while let Some(part) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("malformed multipart part: {e}")))?
    {
        match part.name().unwrap_or_default() {
            "file" => {
                let filename = part.file_name().unwrap_or("upload").to_string();
                let mime = part
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = part
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("failed to read file: {e}")))?;
                file = Some(AuditInput::File {
                    bytes: bytes.to_vec(),
                    filename,
                    mime,
                });
            }
            "category" => fields.category = Some(text_field(part).await?),
            "analysisMode" => fields.analysis_mode = Some(text_field(part).await?),
            "country" => fields.country = Some(text_field(part).await?),
            "region" => fields.region = Some(text_field(part).await?),
            _ => {}
        }
    }

    let input = file.ok_or_else(|| ApiError::bad_request("missing file part"))?;
    Ok((input, fields.into_options(user_id)))
}

async fn text_field(part: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    part.text()
        .await
        .map_err(|e| ApiError::bad_request(format!("malformed field: {e}")))
}
