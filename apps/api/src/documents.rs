use std::path::Path;

use bytes::Bytes;

use crate::errors::ScreeningError;

/// Extracts plain text from an uploaded or on-disk document.
/// Supports `.pdf` (via pdf-extract) and `.txt` (UTF-8).
pub async fn extract_text(file_name: &str, bytes: Bytes) -> Result<String, ScreeningError> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let text = match extension.as_str() {
        "pdf" => {
            // CPU-bound parse; keep it off the async workers.
            let name = file_name.to_string();
            tokio::task::spawn_blocking(move || {
                pdf_extract::extract_text_from_mem(&bytes).map_err(|e| {
                    ScreeningError::Document(format!("could not read PDF '{name}': {e}"))
                })
            })
            .await
            .map_err(|e| {
                ScreeningError::Worker(format!("PDF extraction for '{file_name}' failed: {e}"))
            })??
        }
        "txt" => String::from_utf8(bytes.to_vec()).map_err(|_| {
            ScreeningError::Document(format!("'{file_name}' is not valid UTF-8"))
        })?,
        other => {
            return Err(ScreeningError::Document(format!(
                "unsupported file type '.{other}' for '{file_name}'"
            )))
        }
    };

    Ok(normalize_whitespace(&text))
}

/// Candidate and job names are the file name without its extension.
pub fn document_name(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
        .to_string()
}

/// Reads and extracts a document from disk.
pub async fn read_document(path: &Path) -> Result<(String, String), ScreeningError> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ScreeningError::Document(format!("invalid path {}", path.display())))?
        .to_string();
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ScreeningError::Document(format!("could not read {}: {e}", path.display())))?;
    let text = extract_text(&file_name, Bytes::from(bytes)).await?;
    Ok((document_name(&file_name), text))
}

fn normalize_whitespace(text: &str) -> String {
    text.replace('\u{a0}', " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_txt_is_decoded_and_normalized() {
        let text = extract_text("cv.TXT", Bytes::from("  Jane\u{a0}Doe\nRust  "))
            .await
            .unwrap();
        assert_eq!(text, "Jane Doe\nRust");
    }

    #[tokio::test]
    async fn test_unsupported_extension_rejected() {
        let err = extract_text("cv.docx", Bytes::from_static(b"whatever"))
            .await
            .unwrap_err();
        assert!(matches!(err, ScreeningError::Document(_)));
    }

    #[tokio::test]
    async fn test_invalid_utf8_rejected() {
        let err = extract_text("cv.txt", Bytes::from_static(&[0xff, 0xfe, 0x00]))
            .await
            .unwrap_err();
        assert!(matches!(err, ScreeningError::Document(_)));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_garbage_pdf_rejected_on_single_worker_runtime() {
        let result = extract_text("cv.pdf", Bytes::from_static(b"not a pdf")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_read_document_names_by_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alice_smith.txt");
        std::fs::write(&path, "Alice\u{a0}Smith").unwrap();
        let (name, text) = read_document(&path).await.unwrap();
        assert_eq!(name, "alice_smith");
        assert_eq!(text, "Alice Smith");
    }

    #[test]
    fn test_document_name_strips_extension() {
        assert_eq!(document_name("alice_smith.pdf"), "alice_smith");
        assert_eq!(document_name("noext"), "noext");
    }
}
