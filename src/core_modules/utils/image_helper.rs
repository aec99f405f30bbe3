// Glue between files on disk and `Canvas`. Decoding and encoding are delegated to the
// `image` crate; the only policy here is the maximum accepted target size.

pub mod image_helper {
    use crate::core_modules::canvas::canvas::Canvas;
    use image::ImageEncoder;
    use std::path::Path;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum ImageHelperError {
        #[error("couldn't decode image: {0}")]
        Decode(#[from] image::ImageError),

        #[error("image is {width}x{height}, larger than the {max}px limit")]
        TooLarge { width: u32, height: u32, max: u32 },
    }

    /// Loads any format `image` understands as an RGBA canvas.
    pub fn load(path: impl AsRef<Path>, max_dimension: u32) -> Result<Canvas, ImageHelperError> {
        let decoded = image::open(path)?;
        let (width, height) = (decoded.width(), decoded.height());
        if width > max_dimension || height > max_dimension {
            return Err(ImageHelperError::TooLarge {
                width,
                height,
                max: max_dimension,
            });
        }
        Ok(Canvas::from(decoded.into_rgba8()))
    }

    pub fn save(path: impl AsRef<Path>, canvas: &Canvas) -> Result<(), ImageHelperError> {
        let output = std::fs::File::create(path).map_err(image::ImageError::IoError)?;
        let encoder = image::codecs::png::PngEncoder::new(std::io::BufWriter::new(output));

        encoder.write_image(
            canvas.as_bytes(),
            canvas.width(),
            canvas.height(),
            image::ExtendedColorType::Rgba8,
        )?;

        Ok(())
    }
}
