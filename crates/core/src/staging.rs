//! Staged input images for a transfer submission.
//!
//! [`AssetStaging`] holds the user-selected content and style payloads
//! until both are present and a submission is initiated. Validation
//! happens here, before any network call is made.

use crate::error::TransferError;

/// A binary image payload plus the metadata needed for a multipart part.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: String,
}

impl ImagePayload {
    pub fn new(
        bytes: Vec<u8>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            bytes,
            file_name: file_name.into(),
            content_type: content_type.into(),
        }
    }
}

/// Holds the two staged inputs for the next submission.
#[derive(Debug, Default)]
pub struct AssetStaging {
    content: Option<ImagePayload>,
    style: Option<ImagePayload>,
}

impl AssetStaging {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage (or replace) the content image.
    pub fn set_content(&mut self, payload: ImagePayload) {
        self.content = Some(payload);
    }

    /// Stage (or replace) the style image.
    pub fn set_style(&mut self, payload: ImagePayload) {
        self.style = Some(payload);
    }

    pub fn content(&self) -> Option<&ImagePayload> {
        self.content.as_ref()
    }

    pub fn style(&self) -> Option<&ImagePayload> {
        self.style.as_ref()
    }

    /// Drop both staged payloads.
    pub fn clear(&mut self) {
        self.content = None;
        self.style = None;
    }

    /// Validate and consume both payloads for submission.
    ///
    /// Both images must be staged and non-empty. On failure nothing is
    /// consumed, so the user can fix the missing input and resubmit.
    pub fn take_pair(&mut self) -> Result<(ImagePayload, ImagePayload), TransferError> {
        self.validate()?;
        // validate() guarantees both are present.
        let content = self.content.take().ok_or_else(Self::missing_content)?;
        let style = self.style.take().ok_or_else(Self::missing_style)?;
        Ok((content, style))
    }

    fn validate(&self) -> Result<(), TransferError> {
        let content = self.content.as_ref().ok_or_else(Self::missing_content)?;
        let style = self.style.as_ref().ok_or_else(Self::missing_style)?;
        if content.bytes.is_empty() {
            return Err(TransferError::Validation(
                "Content image is empty".to_string(),
            ));
        }
        if style.bytes.is_empty() {
            return Err(TransferError::Validation("Style image is empty".to_string()));
        }
        Ok(())
    }

    fn missing_content() -> TransferError {
        TransferError::Validation("Content image is required".to_string())
    }

    fn missing_style() -> TransferError {
        TransferError::Validation("Style image is required".to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
