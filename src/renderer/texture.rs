//! 2D textures loaded from image files

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("failed to decode image {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("image {path:?} is too large ({width}x{height})")]
    TooLarge { path: PathBuf, width: u32, height: u32 },
}

/// RGBA8 pixels in GL row order (bottom row first)
///
/// Lives only between decoding and upload; [`Texture::new`] consumes it.
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    pub const BITS_PER_PIXEL: u32 = 32;

    pub fn load(path: &Path) -> Result<Self, TextureError> {
        let image = image::open(path)
            .map_err(|source| TextureError::Decode { path: path.to_path_buf(), source })?;

        // GL samples row 0 as the bottom of the texture
        let rgba = image.flipv().into_rgba8();
        let (width, height) = rgba.dimensions();
        if width > i32::MAX as u32 || height > i32::MAX as u32 {
            return Err(TextureError::TooLarge { path: path.to_path_buf(), width, height });
        }

        Ok(Self {
            width,
            height,
            pixels: rgba.into_raw(),
        })
    }
}

/// GPU texture. Keeps no CPU copy of the pixels after upload.
pub struct Texture {
    id: u32,
    path: PathBuf,
    width: u32,
    height: u32,
    bpp: u32,
}

impl Texture {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, TextureError> {
        let path = path.as_ref();
        let image = DecodedImage::load(path)?;
        Ok(Self::upload(path, image))
    }

    fn upload(path: &Path, image: DecodedImage) -> Self {
        let mut id = 0;
        unsafe {
            gl::GenTextures(1, &mut id);
            gl::BindTexture(gl::TEXTURE_2D, id);

            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, gl::LINEAR as i32);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, gl::LINEAR as i32);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, gl::CLAMP_TO_EDGE as i32);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, gl::CLAMP_TO_EDGE as i32);

            gl::TexImage2D(
                gl::TEXTURE_2D,
                0,
                gl::RGBA8 as i32,
                image.width as i32,
                image.height as i32,
                0,
                gl::RGBA,
                gl::UNSIGNED_BYTE,
                image.pixels.as_ptr() as *const _,
            );
            gl::BindTexture(gl::TEXTURE_2D, 0);
        }
        debug!("Uploaded {} bytes to texture {}, releasing CPU copy", image.pixels.len(), id);

        Self {
            id,
            path: path.to_path_buf(),
            width: image.width,
            height: image.height,
            bpp: DecodedImage::BITS_PER_PIXEL,
        }
    }

    /// Bind to texture unit `slot`
    pub fn bind(&self, slot: u32) {
        unsafe {
            gl::ActiveTexture(gl::TEXTURE0 + slot);
            gl::BindTexture(gl::TEXTURE_2D, self.id);
        }
    }

    pub fn unbind(&self) {
        unsafe { gl::BindTexture(gl::TEXTURE_2D, 0) };
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bpp(&self) -> u32 {
        self.bpp
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        debug!("Deleting texture {}", self.id);
        unsafe { gl::DeleteTextures(1, &self.id) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn write_png(dir: &Path, name: &str, image: &RgbaImage) -> PathBuf {
        let path = dir.join(name);
        image.save(&path).unwrap();
        path
    }

    #[test]
    fn test_decode_flips_rows_for_gl() {
        let dir = tempfile::tempdir().unwrap();
        // Top row red, bottom row blue
        let image = RgbaImage::from_fn(3, 2, |_, y| {
            if y == 0 { Rgba([255, 0, 0, 255]) } else { Rgba([0, 0, 255, 255]) }
        });
        let path = write_png(dir.path(), "rows.png", &image);

        let decoded = DecodedImage::load(&path).unwrap();
        assert_eq!(decoded.width, 3);
        assert_eq!(decoded.height, 2);
        assert_eq!(decoded.pixels.len(), 3 * 2 * 4);
        assert_eq!(&decoded.pixels[0..4], &[0, 0, 255, 255]);
        assert_eq!(&decoded.pixels[12..16], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_decode_expands_rgb_to_rgba() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rgb.png");
        image::RgbImage::from_pixel(2, 2, image::Rgb([10, 20, 30])).save(&path).unwrap();

        let decoded = DecodedImage::load(&path).unwrap();
        assert_eq!(decoded.pixels.len(), (2 * 2 * DecodedImage::BITS_PER_PIXEL / 8) as usize);
        assert_eq!(&decoded.pixels[0..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn test_bundled_texture_decodes() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("res/textures/grass.png");
        let decoded = DecodedImage::load(&path).unwrap();
        assert_eq!((decoded.width, decoded.height), (64, 64));
        assert_eq!(decoded.pixels.len(), 64 * 64 * 4);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.png");

        match DecodedImage::load(&path) {
            Err(TextureError::Decode { path: failed, .. }) => assert_eq!(failed, path),
            other => panic!("expected decode error, got {:?}", other.map(|i| i.width)),
        }
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.png");
        std::fs::write(&path, b"\x89PNG\r\n\x1a\nnot really a png").unwrap();

        assert!(matches!(DecodedImage::load(&path), Err(TextureError::Decode { .. })));
    }
}
