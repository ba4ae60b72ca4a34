//! Customer information step: names plus optional logo and signature uploads.

use std::path::Path;

use log::{debug, warn};

use crate::error::{Result, UploadError};
use crate::model::{CustomerInfo, ImageAttachment};

/// Which uploaded image a call refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSlot {
    Logo,
    Signature,
}

/// Step component for the customer block.
///
/// Holds no document state of its own: every operation takes the current
/// `CustomerInfo` and returns the replacement value for the controller.
#[derive(Debug, Clone)]
pub struct CustomerInfoStep {
    max_upload_bytes: usize,
}

impl CustomerInfoStep {
    pub fn new(max_upload_bytes: usize) -> Self {
        Self { max_upload_bytes }
    }

    pub fn set_customer_name(&self, info: &CustomerInfo, name: &str) -> CustomerInfo {
        CustomerInfo {
            customer_name: name.to_string(),
            ..info.clone()
        }
    }

    pub fn set_company_name(&self, info: &CustomerInfo, name: &str) -> CustomerInfo {
        CustomerInfo {
            company_name: name.to_string(),
            ..info.clone()
        }
    }

    /// Validate an upload and store it in `slot`.
    ///
    /// Oversized or non-image files are rejected and `info` is left as it was.
    pub fn attach(
        &self,
        info: &CustomerInfo,
        slot: ImageSlot,
        file_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> Result<CustomerInfo> {
        if bytes.len() > self.max_upload_bytes {
            warn!("rejected {:?} upload {}: {} bytes", slot, file_name, bytes.len());
            return Err(UploadError::TooLarge {
                size: bytes.len(),
                limit_mb: self.max_upload_bytes / (1024 * 1024),
            }
            .into());
        }
        if !mime_type.starts_with("image/") {
            warn!("rejected {:?} upload {}: type {}", slot, file_name, mime_type);
            return Err(UploadError::NotAnImage {
                mime_type: mime_type.to_string(),
            }
            .into());
        }

        debug!("attached {:?} {} ({} bytes)", slot, file_name, bytes.len());
        let attachment = ImageAttachment::new(file_name, mime_type, bytes);
        let mut next = info.clone();
        match slot {
            ImageSlot::Logo => next.logo = Some(attachment),
            ImageSlot::Signature => next.signature = Some(attachment),
        }
        Ok(next)
    }

    /// Read `path` from disk and attach it, guessing the type from the extension.
    pub fn attach_file(&self, info: &CustomerInfo, slot: ImageSlot, path: &Path) -> Result<CustomerInfo> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.attach(info, slot, &file_name, guess_mime_type(path), bytes)
    }

    /// Clear the image in `slot`, payload and URL together.
    pub fn remove(&self, info: &CustomerInfo, slot: ImageSlot) -> CustomerInfo {
        let mut next = info.clone();
        match slot {
            ImageSlot::Logo => next.logo = None,
            ImageSlot::Signature => next.signature = None,
        }
        next
    }

    pub fn render_text(&self, info: &CustomerInfo) -> String {
        let describe = |a: &Option<ImageAttachment>| match a {
            Some(a) => format!("{} ({} bytes)", a.file_name, a.len()),
            None => "(none)".to_string(),
        };
        let company = if info.company_name.is_empty() {
            "(none)"
        } else {
            info.company_name.as_str()
        };
        format!(
            "Customer Name *: {}\nCompany Name:    {}\nCompany Logo:    {}\nSignature:       {}\n",
            info.customer_name,
            company,
            describe(&info.logo),
            describe(&info.signature),
        )
    }
}

/// MIME type from a file extension; unknown extensions are not images.
pub fn guess_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    const MB: usize = 1024 * 1024;

    #[test]
    fn names_replace_only_their_field() {
        let step = CustomerInfoStep::new(5 * MB);
        let info = step.set_customer_name(&CustomerInfo::default(), "Acme");
        let info = step.set_company_name(&info, "Acme Ltd");
        assert_eq!(info.customer_name, "Acme");
        assert_eq!(info.company_name, "Acme Ltd");
        assert!(info.logo.is_none());
    }

    #[test]
    fn oversized_upload_is_discarded() {
        let step = CustomerInfoStep::new(5 * MB);
        let info = CustomerInfo::default();
        let err = step
            .attach(&info, ImageSlot::Logo, "big.png", "image/png", vec![0; 5 * MB + 1])
            .unwrap_err();
        assert!(matches!(err, Error::Upload(UploadError::TooLarge { .. })));
        assert_eq!(err.to_string(), "File size should be less than 5MB");
    }

    #[test]
    fn exactly_at_limit_is_accepted() {
        let step = CustomerInfoStep::new(5 * MB);
        let info = step
            .attach(&CustomerInfo::default(), ImageSlot::Logo, "ok.png", "image/png", vec![0; 5 * MB])
            .unwrap();
        assert!(info.logo.is_some());
    }

    #[test]
    fn non_image_upload_is_discarded() {
        let step = CustomerInfoStep::new(5 * MB);
        let err = step
            .attach(&CustomerInfo::default(), ImageSlot::Signature, "a.pdf", "application/pdf", vec![1])
            .unwrap_err();
        assert!(matches!(err, Error::Upload(UploadError::NotAnImage { .. })));
    }

    #[test]
    fn remove_clears_payload_and_url_together() {
        let step = CustomerInfoStep::new(5 * MB);
        let info = step
            .attach(&CustomerInfo::default(), ImageSlot::Logo, "l.png", "image/png", vec![1, 2])
            .unwrap();
        let info = step
            .attach(&info, ImageSlot::Signature, "s.png", "image/png", vec![3])
            .unwrap();
        let info = step.remove(&info, ImageSlot::Logo);
        assert!(info.logo.is_none());
        assert_eq!(info.signature.as_ref().map(|s| s.bytes().to_vec()), Some(vec![3]));
        let info = step.remove(&info, ImageSlot::Signature);
        assert!(info.signature.is_none());
    }

    #[test]
    fn mime_guessing() {
        assert_eq!(guess_mime_type(Path::new("logo.PNG")), "image/png");
        assert_eq!(guess_mime_type(Path::new("sig.jpeg")), "image/jpeg");
        assert_eq!(guess_mime_type(Path::new("notes.txt")), "application/octet-stream");
        assert_eq!(guess_mime_type(Path::new("noext")), "application/octet-stream");
    }

    #[test]
    fn attach_file_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();
        let step = CustomerInfoStep::new(5 * MB);
        let info = step.attach_file(&CustomerInfo::default(), ImageSlot::Logo, &path).unwrap();
        let logo = info.logo.unwrap();
        assert_eq!(logo.file_name, "logo.png");
        assert!(logo.data_url().starts_with("data:image/png;base64,"));
    }
}
