//! Prescription label scanner.
//!
//! States: idle (picker) → processing (preview + spinner) → result (editable
//! extracted fields), with an error state reachable only from processing.

use std::fmt::Display;
use std::io::Cursor;
use std::str::FromStr;

use base64::Engine as _;
use image::{GenericImageView, ImageOutputFormat};

use super::FormError;
use crate::models::ExtractedData;
use crate::service::ImageUpload;

/// Longest side of the generated preview, in pixels.
const PREVIEW_MAX_DIMENSION_PX: u32 = 320;

pub const EXTRACTION_FAILED_MESSAGE: &str =
    "Failed to extract medication information. Please try again or enter manually.";

/// Locally decoded preview of the picked image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePreview {
    /// `data:image/png;base64,...` thumbnail.
    pub data_url: String,
    /// Dimensions of the original image.
    pub width: u32,
    pub height: u32,
}

impl ImagePreview {
    /// Decode `bytes`, shrink to a thumbnail and encode it as a PNG data URL.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, image::ImageError> {
        let img = image::load_from_memory(bytes)?;
        let (width, height) = img.dimensions();
        let thumb = img.thumbnail(PREVIEW_MAX_DIMENSION_PX, PREVIEW_MAX_DIMENSION_PX);

        let mut buf = Cursor::new(Vec::new());
        thumb.write_to(&mut buf, ImageOutputFormat::Png)?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(buf.into_inner());

        Ok(Self {
            data_url: format!("data:image/png;base64,{encoded}"),
            width,
            height,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanField {
    Name,
    Dosage,
    Frequency,
    Instructions,
}

impl FromStr for ScanField {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" | "drug_name" => Ok(Self::Name),
            "dosage" => Ok(Self::Dosage),
            "frequency" => Ok(Self::Frequency),
            "instructions" => Ok(Self::Instructions),
            other => Err(FormError::UnknownField(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScannerState {
    Idle,
    Processing {
        preview: Option<ImagePreview>,
    },
    Result {
        preview: Option<ImagePreview>,
        data: ExtractedData,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Clone)]
pub struct ScannerForm {
    state: ScannerState,
}

impl Default for ScannerForm {
    fn default() -> Self {
        Self::new()
    }
}

impl ScannerForm {
    pub fn new() -> Self {
        Self {
            state: ScannerState::Idle,
        }
    }

    pub fn state(&self) -> &ScannerState {
        &self.state
    }

    pub fn is_processing(&self) -> bool {
        matches!(self.state, ScannerState::Processing { .. })
    }

    /// Accept a picked file: build the preview and enter processing.
    ///
    /// The caller then dispatches the same file for extraction and reports
    /// back through [`ScannerForm::finish`]. A file the local decoder cannot
    /// read still goes to extraction, just without a preview.
    pub fn begin(&mut self, upload: &ImageUpload) -> Result<(), FormError> {
        if self.is_processing() {
            return Err(FormError::Busy);
        }

        let preview = match ImagePreview::from_bytes(&upload.bytes) {
            Ok(preview) => Some(preview),
            Err(e) => {
                tracing::warn!(file_name = %upload.file_name, error = %e, "No local preview for image");
                None
            }
        };
        self.state = ScannerState::Processing { preview };
        Ok(())
    }

    /// Report the extraction result for the file passed to `begin`.
    ///
    /// The body is interpreted here; one that does not carry extracted
    /// fields is treated like a failed extraction.
    pub fn finish<E: Display>(&mut self, outcome: Result<serde_json::Value, E>) {
        let preview = match &mut self.state {
            ScannerState::Processing { preview } => preview.take(),
            other => {
                tracing::debug!(state = ?other, "Extraction result ignored outside processing");
                return;
            }
        };

        let decoded = outcome.map(|body| {
            if body.is_object() {
                serde_json::from_value::<ExtractedData>(body).map_err(|e| e.to_string())
            } else {
                Err("expected a JSON object".to_string())
            }
        });

        self.state = match decoded {
            Ok(Ok(data)) => {
                tracing::info!(
                    confidence = data.confidence,
                    tier = ?data.confidence_tier(),
                    "Label extracted"
                );
                ScannerState::Result { preview, data }
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Extraction body not understood");
                ScannerState::Error {
                    message: EXTRACTION_FAILED_MESSAGE.to_string(),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Extraction failed");
                ScannerState::Error {
                    message: EXTRACTION_FAILED_MESSAGE.to_string(),
                }
            }
        };
    }

    /// Edit an extracted field before accepting it.
    pub fn set_field(&mut self, field: ScanField, value: &str) -> Result<(), FormError> {
        let ScannerState::Result { data, .. } = &mut self.state else {
            return Err(FormError::NotEditable);
        };
        let slot = match field {
            ScanField::Name => &mut data.name,
            ScanField::Dosage => &mut data.dosage,
            ScanField::Frequency => &mut data.frequency,
            ScanField::Instructions => &mut data.instructions,
        };
        *slot = value.to_string();
        Ok(())
    }

    /// "Scan Again" from the result or "Try Again" from the error: back to idle.
    pub fn reset(&mut self) {
        if !self.is_processing() {
            self.state = ScannerState::Idle;
        }
    }

    /// Take the (possibly edited) extracted data and return to idle.
    pub fn accept(&mut self) -> Result<ExtractedData, FormError> {
        match std::mem::replace(&mut self.state, ScannerState::Idle) {
            ScannerState::Result { data, .. } => Ok(data),
            other => {
                self.state = other;
                Err(FormError::NothingToUse)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(w, h, image::Rgb([200u8, 200, 200]));
        let mut buf = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, ImageOutputFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    fn processing_scanner() -> ScannerForm {
        let mut scanner = ScannerForm::new();
        scanner
            .begin(&ImageUpload::new("label.png", png_bytes(32, 32)))
            .unwrap();
        scanner
    }

    #[test]
    fn preview_is_png_data_url_with_original_size() {
        let preview = ImagePreview::from_bytes(&png_bytes(640, 480)).unwrap();
        assert!(preview.data_url.starts_with("data:image/png;base64,"));
        assert_eq!((preview.width, preview.height), (640, 480));
    }

    #[test]
    fn undecodable_image_still_processes() {
        let mut scanner = ScannerForm::new();
        scanner
            .begin(&ImageUpload::new("label.jpg", b"not an image".to_vec()))
            .unwrap();
        assert_eq!(scanner.state(), &ScannerState::Processing { preview: None });
    }

    #[test]
    fn begin_while_processing_is_busy() {
        let mut scanner = processing_scanner();
        assert_eq!(
            scanner.begin(&ImageUpload::new("b.png", png_bytes(8, 8))),
            Err(FormError::Busy)
        );
    }

    #[test]
    fn successful_extraction_shows_result() {
        let mut scanner = processing_scanner();
        scanner.finish::<String>(Ok(json!({
            "name": "Amoxicillin",
            "dosage": "500mg",
            "frequency": "Thrice daily",
            "instructions": "Finish the course",
            "confidence": 0.65
        })));

        match scanner.state() {
            ScannerState::Result { preview, data } => {
                assert!(preview.is_some());
                assert_eq!(data.name, "Amoxicillin");
                assert_eq!(data.confidence_percent(), 65);
            }
            other => panic!("expected result, got {other:?}"),
        }
    }

    #[test]
    fn failed_extraction_shows_error_then_resets() {
        let mut scanner = processing_scanner();
        scanner.finish(Err("connection refused"));
        assert_eq!(
            scanner.state(),
            &ScannerState::Error {
                message: EXTRACTION_FAILED_MESSAGE.into()
            }
        );

        scanner.reset();
        assert_eq!(scanner.state(), &ScannerState::Idle);
    }

    #[test]
    fn malformed_body_is_an_error() {
        let mut scanner = processing_scanner();
        scanner.finish::<String>(Ok(json!(["not", "an", "object"])));
        assert!(matches!(scanner.state(), ScannerState::Error { .. }));

        let mut scanner = processing_scanner();
        scanner.finish::<String>(Ok(json!("Amoxicillin 500mg")));
        assert!(matches!(scanner.state(), ScannerState::Error { .. }));
    }

    #[test]
    fn null_confidence_still_shows_result() {
        let mut scanner = processing_scanner();
        scanner.finish::<String>(Ok(json!({"name": "Amoxicillin", "confidence": null})));
        match scanner.state() {
            ScannerState::Result { data, .. } => assert_eq!(data.confidence_percent(), 0),
            other => panic!("expected result, got {other:?}"),
        }
    }

    #[test]
    fn finish_outside_processing_is_ignored() {
        let mut scanner = ScannerForm::new();
        scanner.finish::<String>(Ok(json!({"name": "X"})));
        assert_eq!(scanner.state(), &ScannerState::Idle);
    }

    #[test]
    fn edited_fields_are_accepted() {
        let mut scanner = processing_scanner();
        scanner.finish::<String>(Ok(json!({"name": "Amoxicilin", "dosage": "500mg", "confidence": 0.9})));
        scanner.set_field(ScanField::Name, "Amoxicillin").unwrap();

        let data = scanner.accept().unwrap();
        assert_eq!(data.name, "Amoxicillin");
        assert_eq!(data.dosage, "500mg");
        assert_eq!(scanner.state(), &ScannerState::Idle);
    }

    #[test]
    fn accept_without_result_fails() {
        let mut scanner = processing_scanner();
        assert_eq!(scanner.accept(), Err(FormError::NothingToUse));
        assert!(scanner.is_processing());
        assert_eq!(
            scanner.set_field(ScanField::Dosage, "1"),
            Err(FormError::NotEditable)
        );
    }

    #[test]
    fn reset_is_refused_while_processing() {
        let mut scanner = processing_scanner();
        scanner.reset();
        assert!(scanner.is_processing());
    }
}
