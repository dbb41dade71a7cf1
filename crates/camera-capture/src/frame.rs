//! Video frame types and processing

use image::{GrayImage, Luma};

/// Pixel format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 3 bytes per pixel, blue first (native webcam order)
    Bgr24,
    /// 3 bytes per pixel, red first
    Rgb24,
    /// 1 byte per pixel
    Gray8,
}

impl PixelFormat {
    /// Bytes per pixel
    pub fn channels(self) -> usize {
        match self {
            PixelFormat::Bgr24 | PixelFormat::Rgb24 => 3,
            PixelFormat::Gray8 => 1,
        }
    }
}

/// Decoded video frame
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Pixel data (width * height * channels)
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Pixel layout of `data`
    pub format: PixelFormat,
    /// Capture timestamp (nanoseconds)
    pub timestamp_ns: u64,
    /// Frame sequence number
    pub sequence: u32,
}

impl VideoFrame {
    /// Create a new video frame from raw pixel data.
    ///
    /// Returns `None` when `data` does not match `width * height * channels`.
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: PixelFormat,
        timestamp_ns: u64,
        sequence: u32,
    ) -> Option<Self> {
        let expected = width as usize * height as usize * format.channels();
        if data.len() != expected {
            return None;
        }
        Some(Self {
            data,
            width,
            height,
            format,
            timestamp_ns,
            sequence,
        })
    }

    /// Wrap an existing grayscale image
    pub fn from_gray(image: GrayImage, timestamp_ns: u64, sequence: u32) -> Self {
        let (width, height) = image.dimensions();
        Self {
            data: image.into_raw(),
            width,
            height,
            format: PixelFormat::Gray8,
            timestamp_ns,
            sequence,
        }
    }

    /// Get pixel at (x, y) as [r, g, b] regardless of storage order
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let channels = self.format.channels();
        let idx = (y as usize * self.width as usize + x as usize) * channels;
        let px = &self.data[idx..idx + channels];
        Some(match self.format {
            PixelFormat::Bgr24 => [px[2], px[1], px[0]],
            PixelFormat::Rgb24 => [px[0], px[1], px[2]],
            PixelFormat::Gray8 => [px[0], px[0], px[0]],
        })
    }

    /// Convert to a grayscale image
    pub fn to_grayscale(&self) -> GrayImage {
        if self.format == PixelFormat::Gray8 {
            if let Some(img) = GrayImage::from_raw(self.width, self.height, self.data.clone()) {
                return img;
            }
        }

        let channels = self.format.channels();
        let mut gray = GrayImage::new(self.width, self.height);
        for (i, (x, y)) in (0..self.height)
            .flat_map(|y| (0..self.width).map(move |x| (x, y)))
            .enumerate()
        {
            let px = &self.data[i * channels..i * channels + channels];
            let (r, g, b) = match self.format {
                PixelFormat::Bgr24 => (px[2], px[1], px[0]),
                PixelFormat::Rgb24 => (px[0], px[1], px[2]),
                PixelFormat::Gray8 => (px[0], px[0], px[0]),
            };
            // Luminance formula: 0.299*R + 0.587*G + 0.114*B
            let luma = r as f32 * 0.299 + g as f32 * 0.587 + b as f32 * 0.114;
            gray.put_pixel(x, y, Luma([luma.round().min(255.0) as u8]));
        }
        gray
    }
}
