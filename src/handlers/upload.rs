//! Shared multipart reading for file-upload endpoints

use crate::error::AppError;
use axum::extract::Multipart;

/// One uploaded file, pulled out of a multipart body.
pub struct UploadedFile {
    pub bytes: axum::body::Bytes,
    pub content_type: String,
    pub orig_name: String,
}

/// Read the first file field from a multipart request.
pub async fn read_file_field(mut multipart: Multipart) -> Result<UploadedFile, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("malformed multipart body: {}", e)))?
    {
        if field.file_name().is_none() {
            continue;
        }

        let orig_name = field.file_name().unwrap_or("file").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("failed to read upload: {}", e)))?;

        if bytes.is_empty() {
            return Err(AppError::validation("uploaded file is empty"));
        }

        return Ok(UploadedFile {
            bytes,
            content_type,
            orig_name,
        });
    }

    Err(AppError::validation("missing file field"))
}
