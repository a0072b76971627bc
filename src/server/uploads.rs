use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::backup::secure_filename;
use crate::server::AppState;
use crate::server::response::ApiError;
use crate::server::validation::validate_image_upload;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Perfil,
    Logos,
}

impl UploadKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            UploadKind::Perfil => "perfil",
            UploadKind::Logos => "logos",
        }
    }

    fn parse(s: &str) -> Option<UploadKind> {
        match s {
            "perfil" => Some(UploadKind::Perfil),
            "logos" => Some(UploadKind::Logos),
            _ => None,
        }
    }
}

/// Reads the named image field from a multipart body and stores it.
///
/// Returns the public URL of the stored file.
pub async fn save_image(
    state: &AppState,
    kind: UploadKind,
    multipart: &mut Multipart,
    field_name: &str,
) -> Result<String, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Falha ao ler o envio: {e}")))?
    {
        if field.name() != Some(field_name) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Falha ao ler o arquivo: {e}")))?;
        let ext = validate_image_upload(&filename, data.len())?;

        let dir = state.uploads_dir().join(kind.as_str());
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|_| ApiError::internal("Falha ao salvar o arquivo."))?;

        let stored = format!("{}.{ext}", uuid::Uuid::new_v4());
        tokio::fs::write(dir.join(&stored), &data)
            .await
            .map_err(|_| ApiError::internal("Falha ao salvar o arquivo."))?;

        return Ok(format!("/uploads/{}/{stored}", kind.as_str()));
    }

    Err(ApiError::bad_request("Nenhum arquivo enviado."))
}

/// Deletes a file previously returned by `save_image`. Failures are only logged.
pub async fn remove_image(state: &AppState, url: &str) {
    let Some(rest) = url.strip_prefix("/uploads/") else {
        return;
    };
    let Some((kind, file)) = rest.split_once('/') else {
        return;
    };
    if UploadKind::parse(kind).is_none() || secure_filename(file) != file {
        return;
    }

    let path = state.uploads_dir().join(kind).join(file);
    if let Err(e) = tokio::fs::remove_file(&path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "failed to remove old upload");
        }
    }
}

fn content_type(file: &str) -> &'static str {
    match file.rsplit('.').next().map(str::to_lowercase).as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

/// GET /uploads/{kind}/{file}
pub async fn serve_upload(
    State(state): State<Arc<AppState>>,
    Path((kind, file)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let kind = UploadKind::parse(&kind).ok_or_else(|| ApiError::not_found("Arquivo não encontrado."))?;
    if file.is_empty() || secure_filename(&file) != file {
        return Err(ApiError::not_found("Arquivo não encontrado."));
    }

    let path = state.uploads_dir().join(kind.as_str()).join(&file);
    let content = tokio::fs::read(&path)
        .await
        .map_err(|_| ApiError::not_found("Arquivo não encontrado."))?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(content_type(&file)),
    );

    Ok((StatusCode::OK, headers, content).into_response())
}
