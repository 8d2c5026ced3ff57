use super::data_uri::{DataUri, encode_data_uri, estimate_size};
use super::dimensions::Dimensions;
use crate::errors::CompressError;
use image::codecs::jpeg::JpegEncoder as JpegWriter;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, RgbImage};

pub const OUTPUT_MIME: &str = "image/jpeg";

/// A decoded source image. Never mutated after construction.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    pub mime: String,
    pub size: u64,
    pub width: u32,
    pub height: u32,
    raster: DynamicImage,
}

impl ImageAsset {
    pub fn from_data_uri(uri: &str) -> Result<Self, CompressError> {
        let parsed = DataUri::parse(uri)?;
        if !parsed.mime.starts_with("image/") {
            return Err(CompressError::UnreadableFile(format!(
                "{} is not an image type",
                parsed.mime
            )));
        }
        let bytes = parsed.decode()?;
        Self::from_bytes(parsed.mime, &bytes)
    }

    pub fn from_bytes(mime: &str, bytes: &[u8]) -> Result<Self, CompressError> {
        let raster = image::load_from_memory(bytes)
            .map_err(|err| CompressError::UnreadableFile(err.to_string()))?;

        Ok(Self {
            mime: mime.to_string(),
            size: bytes.len() as u64,
            width: raster.width(),
            height: raster.height(),
            raster,
        })
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    pub fn raster(&self) -> &DynamicImage {
        &self.raster
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Encoded {
    pub data_uri: String,
    pub size: u64,
    pub width: u32,
    pub height: u32,
}

impl Encoded {
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }
}

/// Re-encodes a raster at a target size and quality factor in `(0, 1]`.
pub trait RasterEncoder: Send + Sync {
    fn encode(
        &self,
        raster: &DynamicImage,
        target: Dimensions,
        quality: f32,
    ) -> Result<Encoded, CompressError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JpegEncoder;

impl RasterEncoder for JpegEncoder {
    fn encode(
        &self,
        raster: &DynamicImage,
        target: Dimensions,
        quality: f32,
    ) -> Result<Encoded, CompressError> {
        if target.width == 0 || target.height == 0 {
            return Err(CompressError::EncodeFailure(format!(
                "invalid target size {}x{}",
                target.width, target.height
            )));
        }

        let resized;
        let source = if raster.width() == target.width && raster.height() == target.height {
            raster
        } else {
            resized = raster.resize_exact(target.width, target.height, FilterType::Triangle);
            &resized
        };

        let flattened = flatten_on_white(source);
        let mut buffer = Vec::new();
        JpegWriter::new_with_quality(&mut buffer, jpeg_quality(quality))
            .write_image(
                flattened.as_raw(),
                flattened.width(),
                flattened.height(),
                ExtendedColorType::Rgb8,
            )
            .map_err(|err| CompressError::EncodeFailure(err.to_string()))?;

        let data_uri = encode_data_uri(OUTPUT_MIME, &buffer);
        Ok(Encoded {
            size: estimate_size(&data_uri),
            data_uri,
            width: flattened.width(),
            height: flattened.height(),
        })
    }
}

fn jpeg_quality(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Composites the raster over opaque white so transparent regions don't turn
/// black in a format without alpha.
fn flatten_on_white(raster: &DynamicImage) -> RgbImage {
    if !raster.color().has_alpha() {
        return raster.to_rgb8();
    }

    let rgba = raster.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = u16::from(a);
        let blend = |c: u8| ((u16::from(c) * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        image::Rgb([blend(r), blend(g), blend(b)])
    })
}
