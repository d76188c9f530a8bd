//! Writing rendered frames to image files

use crate::render::Frame;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ColorType, ImageEncoder};
use orbitview_core::{Error, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

const JPEG_QUALITY: u8 = 90;

/// Image formats a frame can be exported to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            _ => None,
        }
    }
}

/// Write `frame` as PNG or JPEG, chosen by the file extension
pub fn export_frame<P: AsRef<Path>>(frame: &Frame, path: P) -> Result<()> {
    let path = path.as_ref();
    let format = ImageFormat::from_path(path).ok_or_else(|| {
        Error::UnsupportedFormat(format!("cannot export an image to '{}'; use .png or .jpg", path.display()))
    })?;

    let expected = 4 * frame.width as usize * frame.height as usize;
    if frame.pixels.len() != expected || expected == 0 {
        return Err(Error::InvalidData(format!(
            "frame buffer holds {} bytes, expected {} for {}x{} RGBA8",
            frame.pixels.len(),
            expected,
            frame.width,
            frame.height
        )));
    }

    let writer = BufWriter::new(File::create(path)?);
    let encoded = match format {
        ImageFormat::Png => PngEncoder::new_with_quality(writer, CompressionType::Default, FilterType::Adaptive)
            .write_image(&frame.pixels, frame.width, frame.height, ColorType::Rgba8),
        ImageFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb: Vec<u8> = frame.pixels.chunks_exact(4).flat_map(|p| [p[0], p[1], p[2]]).collect();
            JpegEncoder::new_with_quality(writer, JPEG_QUALITY).write_image(
                &rgb,
                frame.width,
                frame.height,
                ColorType::Rgb8,
            )
        }
    };
    encoded.map_err(|e| Error::Io(std::io::Error::other(e)))?;
    log::info!("Exported {}x{} frame to {}", frame.width, frame.height, path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbitview_core::ErrorKind;

    fn frame() -> Frame {
        let mut frame = Frame::new(0, 4, 3);
        for px in frame.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&[10, 200, 30, 255]);
        }
        frame
    }

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("orbitview-export-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_png_round_trip() {
        let path = temp_path("frame.png");
        export_frame(&frame(), &path).unwrap();
        let decoded = image::open(&path).unwrap().to_rgba8();
        std::fs::remove_file(&path).ok();
        assert_eq!(decoded.dimensions(), (4, 3));
        assert_eq!(decoded.get_pixel(2, 1).0, [10, 200, 30, 255]);
    }

    #[test]
    fn test_jpeg_written() {
        let path = temp_path("frame.JPG");
        export_frame(&frame(), &path).unwrap();
        let decoded = image::open(&path).unwrap().to_rgb8();
        std::fs::remove_file(&path).ok();
        assert_eq!(decoded.dimensions(), (4, 3));
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let err = export_frame(&frame(), temp_path("frame.tga")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
    }

    #[test]
    fn test_short_buffer_rejected() {
        let mut bad = frame();
        bad.pixels.truncate(8);
        let err = export_frame(&bad, temp_path("bad.png")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }
}
