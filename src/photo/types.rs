//! Core types for photo transformation.

use crate::error::{CulinaryError, Result};
use crate::photo::prompt::{normalize_label, TransformMode};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Image formats accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format (modern, efficient).
    WebP,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::WebP => "webp",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
        }
    }

    /// Parses an accepted MIME type. Anything else is `None`.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.trim().to_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Attempts to detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }
}

/// A photo selected for transformation, held as a base64 data URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    data_url: String,
    mime_type: String,
}

impl UploadedImage {
    /// Encodes raw bytes of an accepted image type.
    pub fn from_bytes(data: &[u8], mime_type: &str) -> Result<Self> {
        let format = ImageFormat::from_mime_type(mime_type)
            .ok_or_else(|| CulinaryError::UnsupportedImage(mime_type.to_string()))?;
        if data.is_empty() {
            return Err(CulinaryError::FileRead("file is empty".into()));
        }
        let encoded = base64::engine::general_purpose::STANDARD.encode(data);
        Ok(Self {
            data_url: format!("data:{};base64,{}", format.mime_type(), encoded),
            mime_type: format.mime_type().to_string(),
        })
    }

    /// Reads a file, detecting its type from the extension or, failing that,
    /// from its leading bytes.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let by_extension = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(ImageFormat::from_extension);

        let data = std::fs::read(path)
            .map_err(|e| CulinaryError::FileRead(format!("{}: {}", path.display(), e)))?;

        let format = by_extension
            .or_else(|| ImageFormat::from_magic_bytes(&data))
            .ok_or_else(|| {
                let ext = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("unknown");
                CulinaryError::UnsupportedImage(format!("file type '{ext}'"))
            })?;

        Self::from_bytes(&data, format.mime_type())
    }

    /// Parses a `data:<mime>;base64,<payload>` URL.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| CulinaryError::FileRead("not a data URL".into()))?;
        let (mime_type, payload) = rest
            .split_once(";base64,")
            .ok_or_else(|| CulinaryError::FileRead("data URL is not base64 encoded".into()))?;

        let data = base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| CulinaryError::FileRead(format!("invalid base64: {e}")))?;

        Self::from_bytes(&data, mime_type)
    }

    /// The full data URL, including the MIME prefix.
    pub fn data_url(&self) -> &str {
        &self.data_url
    }

    /// The MIME type of the image.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// The base64 payload without the `data:...;base64,` prefix.
    pub fn base64_data(&self) -> &str {
        self.data_url
            .split_once(',')
            .map(|(_, data)| data)
            .unwrap_or_default()
    }
}

/// One transform attempt: the photo, the mode and an optional dish name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformRequest {
    /// Base64-encoded image bytes (no data URL prefix).
    pub image_base64: String,
    /// MIME type of the image.
    pub mime_type: String,
    /// Prompt strategy.
    pub mode: TransformMode,
    /// Optional menu item name, e.g. "Signature Angus Burger".
    pub label: Option<String>,
}

impl TransformRequest {
    /// Creates a request from raw base64 data.
    pub fn new(
        image_base64: impl Into<String>,
        mime_type: impl Into<String>,
        mode: TransformMode,
    ) -> Self {
        Self {
            image_base64: image_base64.into(),
            mime_type: mime_type.into(),
            mode,
            label: None,
        }
    }

    /// Creates a request for an uploaded photo.
    pub fn from_upload(image: &UploadedImage, mode: TransformMode) -> Self {
        Self::new(image.base64_data(), image.mime_type(), mode)
    }

    /// Sets the food label. Blank labels are dropped.
    pub fn with_label(mut self, label: impl AsRef<str>) -> Self {
        self.label = normalize_label(Some(label.as_ref())).map(str::to_string);
        self
    }
}

/// File name offered when downloading a result.
pub const DOWNLOAD_FILE_NAME: &str = "professional-food-photo.jpeg";

/// A photo returned by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "transformed photo should be shown or saved"]
pub struct TransformedPhoto {
    base64: String,
    mime_type: String,
}

impl TransformedPhoto {
    /// Wraps a base64 payload returned by the model.
    pub fn new(base64: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            base64: base64.into(),
            mime_type: mime_type.into(),
        }
    }

    /// The base64 payload.
    pub fn base64(&self) -> &str {
        &self.base64
    }

    /// MIME type reported by the model.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Returns the photo as a data URL for display.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64)
    }

    /// Decodes the payload into raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(&self.base64)
            .map_err(|e| CulinaryError::Decode(e.to_string()))
    }

    /// Saves the decoded photo to the specified path.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.decode()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const PNG_MAGIC: [u8; 12] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    const JPEG_MAGIC: [u8; 12] = [0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0, 0, 0, 0, 0];
    const WEBP_MAGIC: [u8; 12] = *b"RIFF\x00\x00\x00\x00WEBP";

    #[test]
    fn test_format_from_magic_bytes() {
        assert_eq!(ImageFormat::from_magic_bytes(&PNG_MAGIC), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_magic_bytes(&JPEG_MAGIC), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_magic_bytes(&WEBP_MAGIC), Some(ImageFormat::WebP));
        assert_eq!(ImageFormat::from_magic_bytes(b"GIF89a......"), None);
    }

    #[test]
    fn test_only_png_jpeg_webp_accepted() {
        assert_eq!(ImageFormat::from_mime_type("image/jpeg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_mime_type("IMAGE/PNG"), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_mime_type("image/webp"), Some(ImageFormat::WebP));
        assert_eq!(ImageFormat::from_mime_type("image/gif"), None);
        assert_eq!(ImageFormat::from_mime_type("application/pdf"), None);
    }

    #[test]
    fn test_uploaded_image_from_bytes() {
        let image = UploadedImage::from_bytes(&JPEG_MAGIC, "image/jpeg").unwrap();
        assert_eq!(image.mime_type(), "image/jpeg");
        assert!(image.data_url().starts_with("data:image/jpeg;base64,"));
        assert_eq!(
            image.base64_data(),
            base64::engine::general_purpose::STANDARD.encode(JPEG_MAGIC)
        );
    }

    #[test]
    fn test_uploaded_image_rejects_gif() {
        let err = UploadedImage::from_bytes(b"GIF89a", "image/gif").unwrap_err();
        assert!(matches!(err, CulinaryError::UnsupportedImage(_)));
    }

    #[test]
    fn test_uploaded_image_from_data_url() {
        let original = UploadedImage::from_bytes(&PNG_MAGIC, "image/png").unwrap();
        let parsed = UploadedImage::from_data_url(original.data_url()).unwrap();
        assert_eq!(parsed, original);

        let err = UploadedImage::from_data_url("data:image/png;base64,@@@").unwrap_err();
        assert!(matches!(err, CulinaryError::FileRead(_)));
        assert!(UploadedImage::from_data_url("https://example.com/a.png").is_err());
    }

    #[test]
    fn test_uploaded_image_from_path() {
        let mut file = tempfile::Builder::new().suffix(".jpg").tempfile().unwrap();
        file.write_all(&JPEG_MAGIC).unwrap();

        let image = UploadedImage::from_path(file.path()).unwrap();
        assert_eq!(image.mime_type(), "image/jpeg");
    }

    #[test]
    fn test_uploaded_image_from_path_sniffs_unknown_extension() {
        let mut file = tempfile::Builder::new().suffix(".bin").tempfile().unwrap();
        file.write_all(&WEBP_MAGIC).unwrap();

        let image = UploadedImage::from_path(file.path()).unwrap();
        assert_eq!(image.mime_type(), "image/webp");
    }

    #[test]
    fn test_uploaded_image_missing_file() {
        let err = UploadedImage::from_path("/definitely/not/here.png").unwrap_err();
        assert!(matches!(err, CulinaryError::FileRead(_)));
    }

    #[test]
    fn test_request_from_upload_drops_blank_label() {
        let image = UploadedImage::from_bytes(&PNG_MAGIC, "image/png").unwrap();
        let req = TransformRequest::from_upload(&image, TransformMode::Polish).with_label("  ");
        assert_eq!(req.label, None);
        assert_eq!(req.mime_type, "image/png");
        assert_eq!(req.image_base64, image.base64_data());

        let req = req.with_label(" Pad Thai ");
        assert_eq!(req.label.as_deref(), Some("Pad Thai"));
    }

    #[test]
    fn test_transformed_photo_data_url_and_save() {
        let photo = TransformedPhoto::new(
            base64::engine::general_purpose::STANDARD.encode(JPEG_MAGIC),
            "image/jpeg",
        );
        assert!(photo.to_data_url().starts_with("data:image/jpeg;base64,/9j/"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DOWNLOAD_FILE_NAME);
        photo.save(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), JPEG_MAGIC);
    }

    #[test]
    fn test_transformed_photo_bad_base64() {
        let photo = TransformedPhoto::new("not base64!", "image/png");
        assert!(matches!(photo.decode(), Err(CulinaryError::Decode(_))));
    }
}
