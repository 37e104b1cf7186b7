use std::path::Path;

use crate::foundation::core::Canvas;
use crate::foundation::error::{ReviewError, ReviewResult};
use crate::render::composite;

/// An RGBA8 frame, premultiplied unless stated otherwise.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

impl FrameRGBA {
    pub fn transparent(canvas: Canvas) -> Self {
        Self {
            width: canvas.width,
            height: canvas.height,
            data: vec![0; canvas.byte_len()],
            premultiplied: true,
        }
    }

    pub fn filled(canvas: Canvas, premul_rgba: [u8; 4]) -> Self {
        Self {
            width: canvas.width,
            height: canvas.height,
            data: premul_rgba.repeat(canvas.width as usize * canvas.height as usize),
            premultiplied: true,
        }
    }

    /// Straight-alpha copy of the pixel data.
    pub fn to_straight(&self) -> Vec<u8> {
        let mut data = self.data.clone();
        if self.premultiplied {
            composite::unpremultiply_in_place(&mut data);
        }
        data
    }

    pub fn to_image(&self) -> ReviewResult<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.to_straight())
            .ok_or_else(|| ReviewError::render("frame byte length does not match its size"))
    }

    /// Resample to `width`×`height` with a triangle filter, keeping the alpha representation.
    pub fn resized(&self, width: u32, height: u32) -> ReviewResult<Self> {
        if (width, height) == (self.width, self.height) {
            return Ok(self.clone());
        }
        let img = image::RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| ReviewError::render("frame byte length does not match its size"))?;
        let out = image::imageops::resize(&img, width, height, image::imageops::FilterType::Triangle);
        Ok(Self {
            width,
            height,
            data: out.into_raw(),
            premultiplied: self.premultiplied,
        })
    }

    pub fn save_png(&self, path: &Path) -> ReviewResult<()> {
        self.to_image()?
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|e| ReviewError::render(format!("write png '{}': {e}", path.display())))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/frame.rs"]
mod tests;
