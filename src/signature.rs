use nalgebra_glm as glm;
use serde::{Deserialize, Serialize};

use crate::canvas::PageCanvas;
use crate::error::ContextError;
use crate::pdf::ImageXObject;

/// A raw RGBA capture of a freehand signature, four bytes per pixel, row by row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// The signature of the applicant, which may not have been captured at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Signature {
    Present(PixelBuffer),
    Absent,
}

impl Signature {
    pub fn is_present(&self) -> bool {
        matches!(self, Signature::Present(_))
    }
}

/// A signature split into the planes that end up in the document: the color samples and the
/// alpha samples, the latter becoming the soft mask of the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
    pub alpha: Vec<u8>,
}

impl DecodedImage {
    pub fn to_image_xobject(&self) -> ImageXObject {
        ImageXObject {
            width: self.width,
            height: self.height,
            bits_per_component: 8,
            interpolate: true,
            image_data: self.rgb.clone(),
            soft_mask_data: Some(self.alpha.clone()),
        }
    }
}

/// The result of decoding a pixel buffer, a failure is never propagated past the compositor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    Decoded(DecodedImage),
    Failed(ContextError),
}

impl PixelBuffer {
    /// Reads a PNG image into an RGBA pixel buffer, whatever the color type of the file.
    pub fn from_png(png_bytes: &[u8]) -> Result<Self, ContextError> {
        let image = image::load_from_memory_with_format(png_bytes, image::ImageFormat::Png)
            .map_err(|error| ContextError::with_error("Failed to load the signature image", &error))?
            .to_rgba8();

        Ok(PixelBuffer {
            width: image.width(),
            height: image.height(),
            data: image.into_raw(),
        })
    }

    /// Checks the buffer against its declared dimensions and splits it into color and alpha.
    pub fn decode(&self) -> DecodeOutcome {
        if self.width == 0 || self.height == 0 {
            return DecodeOutcome::Failed(ContextError::with_context(format!(
                "The signature has an empty size of {}x{} pixels",
                self.width, self.height
            )));
        }
        let expected_length = (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|pixels| pixels.checked_mul(4));
        if expected_length != Some(self.data.len()) {
            return DecodeOutcome::Failed(ContextError::with_context(format!(
                "The signature buffer holds {} bytes, which is not the RGBA size of {}x{} pixels",
                self.data.len(),
                self.width,
                self.height
            )));
        }
        let Some(rgba_image) = image::RgbaImage::from_raw(self.width, self.height, self.data.clone())
        else {
            return DecodeOutcome::Failed(ContextError::with_context(
                "The signature buffer could not be read as an RGBA image",
            ));
        };

        let alpha = rgba_image.pixels().map(|pixel| pixel.0[3]).collect();
        let rgb = image::DynamicImage::ImageRgba8(rgba_image)
            .to_rgb8()
            .into_raw();

        DecodeOutcome::Decoded(DecodedImage {
            width: self.width,
            height: self.height,
            rgb,
            alpha,
        })
    }
}

/// The area reserved for the signature: its bottom left corner and its maximum size in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignatureBox {
    pub x: f32,
    pub y: f32,
    pub max_width: f32,
    pub max_height: f32,
}

/// Where an image ends up on the page, in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Placement {
    /// The transformation from the unit square of the image space onto the placement.
    pub fn transform(&self) -> glm::Mat3 {
        glm::translation2d(&glm::vec2(self.x, self.y))
            * glm::scaling2d(&glm::vec2(self.width, self.height))
    }
}

impl SignatureBox {
    /// Scales an image of the given size to fit the box without distorting it, then centers it
    /// inside the box. The image is scaled up as well as down.
    pub fn fit(&self, image_width: u32, image_height: u32) -> Placement {
        let (image_width, image_height) = (image_width as f32, image_height as f32);
        let scale = (self.max_width / image_width).min(self.max_height / image_height);
        let (width, height) = (image_width * scale, image_height * scale);

        Placement {
            x: self.x + (self.max_width - width) / 2.0,
            y: self.y + (self.max_height - height) / 2.0,
            width,
            height,
        }
    }
}

/// Draws the signature into its box. An absent or malformed signature leaves the box blank, the
/// failure being only logged. Returns the placement of the image, if one was drawn.
pub fn composite(
    canvas: &mut PageCanvas,
    signature: &Signature,
    signature_box: &SignatureBox,
) -> Option<Placement> {
    let pixel_buffer = match signature {
        Signature::Present(pixel_buffer) => pixel_buffer,
        Signature::Absent => {
            log::debug!("No signature was provided, leaving its area blank");
            return None;
        }
    };

    match pixel_buffer.decode() {
        DecodeOutcome::Decoded(decoded_image) => {
            let placement = signature_box.fit(decoded_image.width, decoded_image.height);
            log::debug!(
                "Placing the {}x{} signature at {:?}",
                decoded_image.width,
                decoded_image.height,
                placement
            );
            canvas.draw_image(decoded_image, placement);

            Some(placement)
        }
        DecodeOutcome::Failed(error) => {
            log::warn!("Leaving the signature area blank: {}", error);
            None
        }
    }
}
