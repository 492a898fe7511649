use std::path::Path;

use image::{ImageBuffer, Rgba, RgbaImage, imageops::FilterType};

use crate::foundation::{
    core::{Canvas, FrameRgba},
    error::{ChromaError, ChromaResult},
};

/// Pixel-addressable drawing target the filtered frames are shown on.
pub trait DisplaySurface {
    fn size(&self) -> Canvas;

    /// Draw `frame` resampled to the surface's current size.
    fn draw_frame_scaled(&mut self, frame: &FrameRgba) -> ChromaResult<()>;

    /// Copy the surface content (RGBA8, row-major) into `out`, replacing its contents.
    fn read_pixels(&self, out: &mut Vec<u8>) -> ChromaResult<()>;

    /// Replace the surface content with `data` (RGBA8, row-major, exactly `size()` pixels).
    fn write_pixels(&mut self, data: &[u8]) -> ChromaResult<()>;
}

/// In-memory surface backed by an [`RgbaImage`].
#[derive(Clone, Debug)]
pub struct PixelSurface {
    pixels: RgbaImage,
    resample: FilterType,
    commits: u64,
}

impl PixelSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
            resample: FilterType::Triangle,
            commits: 0,
        }
    }

    pub fn with_resample(mut self, resample: FilterType) -> Self {
        self.resample = resample;
        self
    }

    /// Resize the surface; content is cleared.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.pixels = RgbaImage::new(width, height);
    }

    /// Number of successful `write_pixels` calls.
    pub fn commits(&self) -> u64 {
        self.commits
    }

    pub fn to_frame(&self) -> FrameRgba {
        FrameRgba {
            width: self.pixels.width(),
            height: self.pixels.height(),
            data: self.pixels.as_raw().clone(),
        }
    }

    pub fn save_png(&self, path: &Path) -> ChromaResult<()> {
        self.pixels
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|e| {
                ChromaError::surface(format!("write png '{}': {e}", path.display()))
            })
    }
}

impl DisplaySurface for PixelSurface {
    fn size(&self) -> Canvas {
        Canvas::new(self.pixels.width(), self.pixels.height())
    }

    fn draw_frame_scaled(&mut self, frame: &FrameRgba) -> ChromaResult<()> {
        let dst = self.size();
        if dst.is_empty() {
            return Err(ChromaError::surface("cannot draw onto a zero-area surface"));
        }
        if frame.canvas().is_empty() {
            return Err(ChromaError::surface("cannot draw a zero-area frame"));
        }
        let expected = frame.canvas().rgba8_len()?;
        if frame.data.len() != expected {
            return Err(ChromaError::surface(format!(
                "frame buffer has {} bytes, {}x{} needs {expected}",
                frame.data.len(),
                frame.width,
                frame.height
            )));
        }

        let src: ImageBuffer<Rgba<u8>, &[u8]> =
            ImageBuffer::from_raw(frame.width, frame.height, frame.data.as_slice())
                .ok_or_else(|| ChromaError::surface("frame buffer does not match its size"))?;

        if frame.canvas() == dst {
            let out: &mut [u8] = &mut self.pixels;
            out.copy_from_slice(src.as_raw());
        } else {
            self.pixels = image::imageops::resize(&src, dst.width, dst.height, self.resample);
        }
        Ok(())
    }

    fn read_pixels(&self, out: &mut Vec<u8>) -> ChromaResult<()> {
        out.clear();
        out.extend_from_slice(self.pixels.as_raw());
        Ok(())
    }

    fn write_pixels(&mut self, data: &[u8]) -> ChromaResult<()> {
        let expected = self.size().rgba8_len()?;
        if data.len() != expected {
            return Err(ChromaError::surface(format!(
                "write_pixels got {} bytes, surface holds {expected}",
                data.len()
            )));
        }
        let out: &mut [u8] = &mut self.pixels;
        out.copy_from_slice(data);
        self.commits += 1;
        Ok(())
    }
}
