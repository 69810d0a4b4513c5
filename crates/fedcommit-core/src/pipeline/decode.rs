//! Image codec: payload admission, format detection and decoding.
//!
//! Only JPEG and PNG are accepted. Admission checks (declared content type,
//! size cap, magic bytes) run before the decoder ever sees the payload so an
//! oversized or foreign payload costs nothing to reject.

use std::fmt;
use std::io::Cursor;

use image::{ColorType, DynamicImage, GenericImageView, ImageFormat, Limits};

use crate::config::LimitsConfig;
use crate::error::FormatError;
use crate::types::{CropOptions, ImagePayload};

/// The image formats the codec admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportedFormat {
    Jpeg,
    Png,
}

impl SupportedFormat {
    /// Canonical MIME type.
    pub fn mime_type(self) -> &'static str {
        match self {
            SupportedFormat::Jpeg => "image/jpeg",
            SupportedFormat::Png => "image/png",
        }
    }

    /// Parse a declared content type.
    ///
    /// Accepts the MIME types plus the bare format names clients send in the
    /// wire request (`jpeg`, `jpg`, `png`). Parameters after `;` are ignored.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "image/jpeg" | "jpeg" | "jpg" => Some(SupportedFormat::Jpeg),
            "image/png" | "png" => Some(SupportedFormat::Png),
            _ => None,
        }
    }

    /// Detect the format from the payload's leading bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(SupportedFormat::Jpeg)
        } else if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some(SupportedFormat::Png)
        } else {
            None
        }
    }

    fn image_format(self) -> ImageFormat {
        match self {
            SupportedFormat::Jpeg => ImageFormat::Jpeg,
            SupportedFormat::Png => ImageFormat::Png,
        }
    }
}

impl fmt::Display for SupportedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupportedFormat::Jpeg => write!(f, "jpeg"),
            SupportedFormat::Png => write!(f, "png"),
        }
    }
}

/// Pixel layout of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Luma8,
    LumaAlpha8,
    Rgb8,
    Rgba8,
    Luma16,
    LumaAlpha16,
    Rgb16,
    Rgba16,
    Other,
}

impl From<ColorType> for PixelFormat {
    fn from(color: ColorType) -> Self {
        match color {
            ColorType::L8 => PixelFormat::Luma8,
            ColorType::La8 => PixelFormat::LumaAlpha8,
            ColorType::Rgb8 => PixelFormat::Rgb8,
            ColorType::Rgba8 => PixelFormat::Rgba8,
            ColorType::L16 => PixelFormat::Luma16,
            ColorType::La16 => PixelFormat::LumaAlpha16,
            ColorType::Rgb16 => PixelFormat::Rgb16,
            ColorType::Rgba16 => PixelFormat::Rgba16,
            _ => PixelFormat::Other,
        }
    }
}

/// Result of decoding an image payload.
#[derive(Debug)]
pub struct DecodedImage {
    /// The decoded pixels
    pub image: DynamicImage,
    /// Container format detected from the payload
    pub format: SupportedFormat,
    /// Pixel layout
    pub pixel_format: PixelFormat,
    /// Image width in pixels, always > 0
    pub width: u32,
    /// Image height in pixels, always > 0
    pub height: u32,
}

impl DecodedImage {
    /// Crop to the requested region, clamped to the image bounds.
    ///
    /// An unset crop, or one whose clamped region is empty, returns the image
    /// unchanged.
    pub fn cropped(self, crop: &CropOptions) -> Self {
        if !crop.is_set() {
            return self;
        }
        if crop.x >= self.width || crop.y >= self.height {
            tracing::warn!(
                "Crop origin ({}, {}) outside {}x{} image, ignoring crop",
                crop.x,
                crop.y,
                self.width,
                self.height
            );
            return self;
        }

        let width = crop.width.min(self.width - crop.x);
        let height = crop.height.min(self.height - crop.y);
        let image = self.image.crop_imm(crop.x, crop.y, width, height);
        Self {
            image,
            width,
            height,
            ..self
        }
    }
}

/// Image codec with configurable limits.
#[derive(Debug, Clone)]
pub struct ImageDecoder {
    limits: LimitsConfig,
}

impl ImageDecoder {
    /// Create a new decoder with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Run the cheap admission checks without decoding.
    ///
    /// Order: declared content type, size cap, magic bytes. Returns the
    /// format the payload will be decoded as.
    pub fn admit(&self, payload: &ImagePayload) -> Result<SupportedFormat, FormatError> {
        let declared = match payload.content_type.as_deref() {
            Some(content_type) => Some(
                SupportedFormat::from_content_type(content_type).ok_or_else(|| {
                    FormatError::UnsupportedFormat {
                        format: content_type.to_string(),
                    }
                })?,
            ),
            None => None,
        };

        let size = payload.len() as u64;
        if size > self.limits.max_payload_bytes {
            return Err(FormatError::PayloadTooLarge {
                size,
                max: self.limits.max_payload_bytes,
            });
        }

        let sniffed =
            SupportedFormat::sniff(&payload.data).ok_or_else(|| FormatError::UnsupportedFormat {
                format: describe_unsupported(&payload.data).to_string(),
            })?;

        if let Some(declared) = declared {
            if declared != sniffed {
                tracing::warn!(
                    "Declared content type {} does not match payload ({}), decoding as {}",
                    declared.mime_type(),
                    sniffed.mime_type(),
                    sniffed
                );
            }
        }

        Ok(sniffed)
    }

    /// Admit and fully decode a payload.
    pub fn decode(&self, payload: &ImagePayload) -> Result<DecodedImage, FormatError> {
        let format = self.admit(payload)?;
        self.decode_admitted(&payload.data, format)
    }

    /// Decode bytes already admitted as `format`.
    pub(crate) fn decode_admitted(
        &self,
        bytes: &[u8],
        format: SupportedFormat,
    ) -> Result<DecodedImage, FormatError> {
        let mut limits = Limits::default();
        limits.max_image_width = Some(self.limits.max_image_dimension);
        limits.max_image_height = Some(self.limits.max_image_dimension);

        let mut reader =
            image::ImageReader::with_format(Cursor::new(bytes), format.image_format());
        reader.limits(limits);
        let image = reader.decode().map_err(|e| FormatError::MalformedImage {
            message: e.to_string(),
        })?;

        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(FormatError::MalformedImage {
                message: format!("image has zero dimension ({width}x{height})"),
            });
        }
        if width > self.limits.max_image_dimension || height > self.limits.max_image_dimension {
            return Err(FormatError::MalformedImage {
                message: format!(
                    "image dimensions {width}x{height} exceed {}",
                    self.limits.max_image_dimension
                ),
            });
        }

        Ok(DecodedImage {
            pixel_format: image.color().into(),
            image,
            format,
            width,
            height,
        })
    }
}

/// Best-effort name for a payload that is neither JPEG nor PNG.
fn describe_unsupported(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(b"GIF8") {
        "gif"
    } else if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
        "webp"
    } else if bytes.starts_with(b"BM") {
        "bmp"
    } else if bytes.starts_with(&[b'I', b'I', 0x2A, 0x00])
        || bytes.starts_with(&[b'M', b'M', 0x00, 0x2A])
    {
        "tiff"
    } else {
        "unknown"
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Encode a blank RGB image in the given format.
    pub(crate) fn encode_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::new_rgb8(width, height)
            .write_to(&mut Cursor::new(&mut bytes), format)
            .unwrap();
        bytes
    }

    fn decoder() -> ImageDecoder {
        ImageDecoder::new(LimitsConfig::default())
    }

    #[test]
    fn test_content_type_parsing() {
        assert_eq!(
            SupportedFormat::from_content_type("image/jpeg"),
            Some(SupportedFormat::Jpeg)
        );
        assert_eq!(
            SupportedFormat::from_content_type("IMAGE/PNG; charset=binary"),
            Some(SupportedFormat::Png)
        );
        assert_eq!(SupportedFormat::from_content_type("jpg"), Some(SupportedFormat::Jpeg));
        assert_eq!(SupportedFormat::from_content_type("image/gif"), None);
    }

    #[test]
    fn test_decode_png() {
        let bytes = encode_image(100, 50, ImageFormat::Png);
        let decoded = decoder()
            .decode(&ImagePayload::new(bytes, Some("image/png".into())))
            .unwrap();
        assert_eq!((decoded.width, decoded.height), (100, 50));
        assert_eq!(decoded.format, SupportedFormat::Png);
        assert_eq!(decoded.pixel_format, PixelFormat::Rgb8);
    }

    #[test]
    fn test_decode_jpeg_without_content_type() {
        let bytes = encode_image(32, 16, ImageFormat::Jpeg);
        let decoded = decoder().decode(&ImagePayload::new(bytes, None)).unwrap();
        assert_eq!(decoded.format, SupportedFormat::Jpeg);
        assert_eq!((decoded.width, decoded.height), (32, 16));
    }

    #[test]
    fn test_gif_content_type_rejected_regardless_of_size() {
        let small = ImagePayload::new(b"GIF89a".to_vec(), Some("image/gif".into()));
        let huge = ImagePayload::new(vec![0u8; 11 << 20], Some("image/gif".into()));
        for payload in [small, huge] {
            assert_eq!(
                decoder().admit(&payload),
                Err(FormatError::UnsupportedFormat {
                    format: "image/gif".into()
                })
            );
        }
    }

    #[test]
    fn test_oversized_jpeg_rejected_before_decode() {
        // Valid magic followed by garbage: reaching the decoder would yield MalformedImage.
        let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
        bytes.resize(11 << 20, 0);
        let err = decoder()
            .decode(&ImagePayload::new(bytes, Some("image/jpeg".into())))
            .unwrap_err();
        assert_eq!(
            err,
            FormatError::PayloadTooLarge {
                size: 11 << 20,
                max: 10 << 20
            }
        );
    }

    #[test]
    fn test_undeclared_gif_bytes_rejected() {
        let err = decoder()
            .admit(&ImagePayload::new(b"GIF89a\x01\x00".to_vec(), None))
            .unwrap_err();
        assert_eq!(err, FormatError::UnsupportedFormat { format: "gif".into() });
    }

    #[test]
    fn test_sniffed_format_wins_over_declared() {
        let bytes = encode_image(8, 8, ImageFormat::Png);
        let format = decoder()
            .admit(&ImagePayload::new(bytes, Some("image/jpeg".into())))
            .unwrap();
        assert_eq!(format, SupportedFormat::Png);
    }

    #[test]
    fn test_truncated_png_is_malformed() {
        let mut bytes = encode_image(64, 64, ImageFormat::Png);
        bytes.truncate(20);
        let err = decoder().decode(&ImagePayload::new(bytes, None)).unwrap_err();
        assert!(matches!(err, FormatError::MalformedImage { .. }));
    }

    #[test]
    fn test_dimension_cap() {
        let bytes = encode_image(64, 8, ImageFormat::Png);
        let decoder = ImageDecoder::new(LimitsConfig {
            max_image_dimension: 32,
            ..LimitsConfig::default()
        });
        let err = decoder.decode(&ImagePayload::new(bytes, None)).unwrap_err();
        assert!(matches!(err, FormatError::MalformedImage { .. }));
    }

    #[test]
    fn test_crop_clamps_to_bounds() {
        let bytes = encode_image(100, 50, ImageFormat::Png);
        let decoded = decoder().decode(&ImagePayload::new(bytes, None)).unwrap();
        let cropped = decoded.cropped(&CropOptions {
            x: 80,
            y: 10,
            width: 40,
            height: 20,
        });
        assert_eq!((cropped.width, cropped.height), (20, 20));
        assert_eq!(cropped.image.dimensions(), (20, 20));
    }

    #[test]
    fn test_crop_outside_bounds_ignored() {
        let bytes = encode_image(10, 10, ImageFormat::Png);
        let decoded = decoder().decode(&ImagePayload::new(bytes, None)).unwrap();
        let cropped = decoded.cropped(&CropOptions {
            x: 10,
            y: 0,
            width: 5,
            height: 5,
        });
        assert_eq!((cropped.width, cropped.height), (10, 10));
    }
}
