//! PDF sniffing.
//!
//! A response counts as a PDF when either its declared content type or
//! its leading bytes say so. Hosts that answer 200 with a login page or
//! an inline viewer fail both checks.
//!
//! A partial response that starts past byte 0 has no signature to look at,
//! so only its declared type is checked, and only markup is refused.

pub const PDF_MIME: &str = "application/pdf";
pub const PDF_SIGNATURE: &[u8] = b"%PDF";

/// The fetched response is not the expected document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Not a PDF (content-type={declared})")]
pub struct ValidationFailed {
    pub declared: String,
}

/// Accept when the content type names a PDF or the body starts with `%PDF`.
pub fn validate(content_type: Option<&str>, prefix: &[u8]) -> Result<(), ValidationFailed> {
    let declared = content_type.unwrap_or_default().trim().to_ascii_lowercase();
    if declared.contains(PDF_MIME) || prefix.starts_with(PDF_SIGNATURE) {
        return Ok(());
    }

    Err(ValidationFailed {
        declared: if declared.is_empty() {
            "unknown".to_string()
        } else {
            declared
        },
    })
}

/// Check a partial response that does not start at byte 0.
pub fn validate_continuation(content_type: Option<&str>) -> Result<(), ValidationFailed> {
    let declared = content_type.unwrap_or_default().trim().to_ascii_lowercase();
    if is_markup(&declared) {
        return Err(ValidationFailed { declared });
    }
    Ok(())
}

/// HTML, XHTML and XML bodies are error or login pages, never document bytes.
fn is_markup(declared: &str) -> bool {
    let essence = declared.split(';').next().unwrap_or_default().trim();
    essence.contains("html") || essence.ends_with("/xml") || essence.ends_with("+xml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_declared_pdf() {
        assert!(validate(Some("application/pdf"), b"").is_ok());
        assert!(validate(Some("Application/PDF; charset=binary"), b"garbage").is_ok());
    }

    #[test]
    fn test_accepts_signature_with_generic_type() {
        assert!(validate(Some("application/octet-stream"), b"%PDF-1.7\n").is_ok());
        assert!(validate(None, b"%PDF").is_ok());
    }

    #[test]
    fn test_rejects_html() {
        let err = validate(Some("text/html; charset=utf-8"), b"<!DOCTYPE html>").unwrap_err();
        assert_eq!(err.declared, "text/html; charset=utf-8");
    }

    #[test]
    fn test_rejects_short_prefix() {
        let err = validate(None, b"%PD").unwrap_err();
        assert_eq!(err.to_string(), "Not a PDF (content-type=unknown)");
    }

    #[test]
    fn test_continuation_accepts_generic_types() {
        assert!(validate_continuation(Some("application/octet-stream")).is_ok());
        assert!(validate_continuation(Some("application/pdf")).is_ok());
        assert!(validate_continuation(None).is_ok());
    }

    #[test]
    fn test_continuation_rejects_markup() {
        let err = validate_continuation(Some("Text/HTML; charset=utf-8")).unwrap_err();
        assert_eq!(err.declared, "text/html; charset=utf-8");
        assert!(validate_continuation(Some("application/xhtml+xml")).is_err());
        assert!(validate_continuation(Some("application/xml")).is_err());
    }
}
