//! Screen sharing: grabs the current frame and attaches it to a chat message.

use crate::error::SessionError;
use avatalk_types::Part;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage};

/// JPEG quality used for shared frames.
pub const FRAME_QUALITY: u8 = 70;

pub const FRAME_MIME: &str = "image/jpeg";

/// A raw RGBA frame, row-major.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// A live capture, usually a shared display or window.
pub trait FrameSource: Send + Sync {
    /// `false` once the user ended the share from outside the app.
    fn is_active(&self) -> bool;

    fn grab(&self) -> Result<Frame, SessionError>;

    fn stop(&self);
}

pub struct ScreenShare {
    source: Box<dyn FrameSource>,
    quality: u8,
}

impl ScreenShare {
    pub fn new(source: Box<dyn FrameSource>) -> Self {
        Self {
            source,
            quality: FRAME_QUALITY,
        }
    }

    pub fn is_active(&self) -> bool {
        self.source.is_active()
    }

    /// Grabs the current frame as an inline JPEG part.
    pub fn capture(&self) -> Result<Part, SessionError> {
        let frame = self.source.grab()?;
        let jpeg = encode_jpeg(&frame, self.quality)?;
        Ok(Part::inline(FRAME_MIME, STANDARD.encode(jpeg)))
    }

    pub fn stop(&self) {
        self.source.stop();
    }
}

impl std::fmt::Debug for ScreenShare {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScreenShare")
            .field("active", &self.source.is_active())
            .field("quality", &self.quality)
            .finish()
    }
}

pub fn encode_jpeg(frame: &Frame, quality: u8) -> Result<Vec<u8>, SessionError> {
    let rgba = RgbaImage::from_raw(frame.width, frame.height, frame.rgba.clone()).ok_or_else(|| {
        SessionError::Capture(format!(
            "frame buffer of {} bytes does not fit {}x{}",
            frame.rgba.len(),
            frame.width,
            frame.height
        ))
    })?;
    // JPEG has no alpha channel.
    let rgb = DynamicImage::ImageRgba8(rgba).to_rgb8();

    let mut out = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut out, quality);
        encoder
            .encode_image(&rgb)
            .map_err(|e| SessionError::Capture(e.to_string()))?;
    }
    Ok(out)
}
