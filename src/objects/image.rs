//! Image2D: raster image data, possibly palettized.

use crate::codec::{M3gReader, M3gWriter};
use crate::objects::ObjectBase;
use crate::table::{EncodeContext, ObjectTable};
use crate::util::{Error, Result};

/// Pixel layout of an image.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[repr(u8)]
pub enum ImageFormat {
    Alpha = 96,
    Luminance = 97,
    LuminanceAlpha = 98,
    Rgb = 99,
    #[default]
    Rgba = 100,
}

impl ImageFormat {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            96 => Some(Self::Alpha),
            97 => Some(Self::Luminance),
            98 => Some(Self::LuminanceAlpha),
            99 => Some(Self::Rgb),
            100 => Some(Self::Rgba),
            _ => None,
        }
    }

    /// Bytes one pixel (or one palette entry) occupies.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Alpha | Self::Luminance => 1,
            Self::LuminanceAlpha => 2,
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }
}

/// Pixel storage of an immutable image. An empty palette means the pixels
/// are stored directly; otherwise each pixel byte indexes the palette.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct ImageData {
    pub palette: Vec<u8>,
    pub pixels: Vec<u8>,
}

/// Decoded pixel data handed over by an external-reference resolver.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelImage {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    pub pixels: Vec<u8>,
}

/// 2D image object. `data` is `None` for mutable (renderable-target) images,
/// which carry no pixels in the file.
#[derive(Clone, Debug, PartialEq)]
pub struct Image2D {
    pub base: ObjectBase,
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
    pub data: Option<ImageData>,
}

impl Default for Image2D {
    fn default() -> Self {
        Self {
            base: ObjectBase::default(),
            format: ImageFormat::Rgba,
            width: 0,
            height: 0,
            data: None,
        }
    }
}

impl Image2D {
    /// Wrap resolver-supplied pixels as a direct-color immutable image.
    pub fn from_pixels(img: PixelImage) -> Result<Self> {
        let out = Self {
            base: ObjectBase::default(),
            format: img.format,
            width: img.width,
            height: img.height,
            data: Some(ImageData {
                palette: Vec::new(),
                pixels: img.pixels,
            }),
        };
        out.validate()?;
        Ok(out)
    }

    fn validate(&self) -> Result<()> {
        let Some(data) = &self.data else {
            return Ok(());
        };
        let pixel_count = self.width as usize * self.height as usize;
        let bpp = self.format.bytes_per_pixel();
        if data.palette.is_empty() {
            if data.pixels.len() != pixel_count * bpp {
                return Err(Error::invalid(format!(
                    "image pixel data is {} bytes, {}x{} {:?} needs {}",
                    data.pixels.len(),
                    self.width,
                    self.height,
                    self.format,
                    pixel_count * bpp
                )));
            }
        } else {
            if data.palette.len() % bpp != 0 || data.palette.len() / bpp > 256 {
                return Err(Error::invalid("image palette size invalid"));
            }
            if data.pixels.len() != pixel_count {
                return Err(Error::invalid(
                    "palettized image needs one index byte per pixel",
                ));
            }
        }
        Ok(())
    }

    pub(crate) fn decode(r: &mut M3gReader<'_>, table: &mut ObjectTable) -> Result<Self> {
        let base = ObjectBase::decode(r, table)?;
        let f = r.read_u8()?;
        let format = ImageFormat::from_u8(f).ok_or_else(|| Error::bad_enum("image.format", f))?;
        let is_mutable = r.read_bool()?;
        let width = r.read_u32()?;
        let height = r.read_u32()?;
        let data = if is_mutable {
            None
        } else {
            let palette_len = r.read_array_count(1)?;
            let palette = r.bytes(palette_len)?.to_vec();
            let pixels_len = r.read_array_count(1)?;
            let pixels = r.bytes(pixels_len)?.to_vec();
            Some(ImageData { palette, pixels })
        };
        let image = Self {
            base,
            format,
            width,
            height,
            data,
        };
        image.validate()?;
        Ok(image)
    }

    pub(crate) fn encode(&self, w: &mut M3gWriter, ctx: &EncodeContext<'_>) -> Result<()> {
        self.validate()?;
        self.base.encode(w, ctx)?;
        w.write_u8(self.format as u8);
        w.write_bool(self.data.is_none());
        w.write_u32(self.width);
        w.write_u32(self.height);
        if let Some(data) = &self.data {
            w.write_u32(data.palette.len() as u32);
            w.put(&data.palette);
            w.write_u32(data.pixels.len() as u32);
            w.put(&data.pixels);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ObjectIndex;

    fn roundtrip(img: &Image2D) -> Image2D {
        let table = ObjectTable::new();
        let ctx = EncodeContext {
            table: &table,
            current: ObjectIndex(1),
        };
        let mut w = M3gWriter::new();
        img.encode(&mut w, &ctx).unwrap();
        let bytes = w.into_inner();
        let mut table = ObjectTable::new();
        let mut r = M3gReader::new(&bytes);
        Image2D::decode(&mut r, &mut table).unwrap()
    }

    #[test]
    fn test_direct_color_roundtrip() {
        let img = Image2D {
            format: ImageFormat::Rgb,
            width: 2,
            height: 2,
            data: Some(ImageData {
                palette: Vec::new(),
                pixels: vec![0; 12],
            }),
            ..Image2D::default()
        };
        assert_eq!(roundtrip(&img), img);
    }

    #[test]
    fn test_palettized_roundtrip() {
        let img = Image2D {
            format: ImageFormat::Rgba,
            width: 4,
            height: 1,
            data: Some(ImageData {
                palette: vec![1, 2, 3, 4, 5, 6, 7, 8],
                pixels: vec![0, 1, 0, 1],
            }),
            ..Image2D::default()
        };
        assert_eq!(roundtrip(&img), img);
    }

    #[test]
    fn test_mutable_image_has_no_data() {
        let img = Image2D {
            format: ImageFormat::Luminance,
            width: 64,
            height: 64,
            data: None,
            ..Image2D::default()
        };
        assert_eq!(roundtrip(&img), img);
    }

    #[test]
    fn test_pixel_length_mismatch() {
        let img = Image2D {
            format: ImageFormat::Rgb,
            width: 2,
            height: 2,
            data: Some(ImageData {
                palette: Vec::new(),
                pixels: vec![0; 11],
            }),
            ..Image2D::default()
        };
        let table = ObjectTable::new();
        let ctx = EncodeContext {
            table: &table,
            current: ObjectIndex(1),
        };
        let mut w = M3gWriter::new();
        assert!(img.encode(&mut w, &ctx).is_err());
    }

    #[test]
    fn test_from_pixels() {
        let img = Image2D::from_pixels(PixelImage {
            width: 1,
            height: 2,
            format: ImageFormat::LuminanceAlpha,
            pixels: vec![10, 20, 30, 40],
        })
        .unwrap();
        assert_eq!(img.width, 1);
        assert!(img.data.is_some());
    }
}
