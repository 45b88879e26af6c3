//! Plain text from document files.
//!
//! `.pdf` files go through `pdf-extract` (feature `pdf`); everything else
//! must already be UTF-8 text.

use std::path::Path;

use crate::error::{RagError, RagResult};

/// Case-insensitive check for a `.pdf` extension.
pub fn is_pdf(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Decode a file's bytes into document text, choosing the reader by extension.
///
/// CPU bound for PDFs; call from a blocking context.
pub fn extract_text(file_name: &str, bytes: &[u8]) -> RagResult<String> {
    if is_pdf(file_name) {
        return extract_pdf_text(file_name, bytes);
    }

    String::from_utf8(bytes.to_vec())
        .map_err(|_| RagError::Validation(format!("{file_name} is not valid UTF-8 text")))
}

#[cfg(feature = "pdf")]
fn extract_pdf_text(file_name: &str, bytes: &[u8]) -> RagResult<String> {
    // pdf-extract panics on some malformed documents
    let text = match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            return Err(RagError::Validation(format!(
                "could not read PDF {file_name}: {e}"
            )));
        }
        Err(_) => {
            return Err(RagError::Validation(format!(
                "could not read PDF {file_name}: malformed document"
            )));
        }
    };

    if text.trim().is_empty() {
        return Err(RagError::Validation(format!(
            "PDF {file_name} contains no extractable text (it may be scanned or encrypted)"
        )));
    }

    tracing::debug!(target: "extract", "{file_name}: {} chars of text", text.chars().count());
    Ok(text)
}

#[cfg(not(feature = "pdf"))]
fn extract_pdf_text(file_name: &str, _bytes: &[u8]) -> RagResult<String> {
    Err(RagError::Validation(format!(
        "cannot read {file_name}: PDF support is not enabled in this build"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_detection() {
        assert!(is_pdf("paper.pdf"));
        assert!(is_pdf("SCAN.PDF"));
        assert!(!is_pdf("notes.md"));
        assert!(!is_pdf("pdf"));
    }

    #[test]
    fn test_text_files_must_be_utf8() {
        assert_eq!(extract_text("a.txt", "héllo".as_bytes()).unwrap(), "héllo");

        let err = extract_text("a.txt", &[0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, RagError::Validation(ref msg) if msg.contains("UTF-8")));
    }

    #[test]
    fn test_unreadable_pdf_is_a_validation_error() {
        let err = extract_text("broken.pdf", b"%PDF-1.7\nthis is not a pdf body").unwrap_err();
        assert!(matches!(err, RagError::Validation(ref msg) if msg.contains("broken.pdf")));
    }
}
