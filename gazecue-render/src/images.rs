use anyhow::{Context, Result, anyhow};
use image::RgbaImage;
use image::imageops::FilterType;
use std::path::Path;
use tiny_skia::{ColorU8, Pixmap};

/// Decodes `path` and scales it to exactly `size` pixels.
pub fn load_scaled(path: &Path, size: (u32, u32)) -> Result<Pixmap> {
    let decoded = image::open(path).with_context(|| format!("decoding {}", path.display()))?;
    let scaled = decoded.resize_exact(size.0, size.1, FilterType::Triangle);
    log::debug!("Loaded {} as {}x{}", path.display(), size.0, size.1);
    rgba_to_pixmap(&scaled.to_rgba8())
}

/// Copies straight-alpha RGBA into a premultiplied pixmap.
pub fn rgba_to_pixmap(rgba: &RgbaImage) -> Result<Pixmap> {
    let (w, h) = rgba.dimensions();
    let mut pixmap = Pixmap::new(w, h).ok_or_else(|| anyhow!("cannot allocate {w}x{h} pixmap"))?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(rgba.pixels()) {
        let [r, g, b, a] = src.0;
        *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
    }
    Ok(pixmap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn decodes_and_scales_a_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dog_L_1.png");
        RgbaImage::from_pixel(8, 4, Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let pm = load_scaled(&path, (40, 40)).unwrap();
        assert_eq!((pm.width(), pm.height()), (40, 40));
        let p = pm.pixel(20, 20).unwrap();
        assert_eq!((p.red(), p.green(), p.blue(), p.alpha()), (10, 20, 30, 255));
    }

    #[test]
    fn translucent_pixels_are_premultiplied() {
        let pm = rgba_to_pixmap(&RgbaImage::from_pixel(1, 1, Rgba([200, 100, 0, 128]))).unwrap();
        let p = pm.pixel(0, 0).unwrap();
        assert_eq!(p.alpha(), 128);
        assert!(p.red() <= 101 && p.red() >= 99);
    }

    #[test]
    fn unreadable_file_names_the_path() {
        let err = load_scaled(Path::new("/no/such/T.tif"), (10, 10)).unwrap_err();
        assert!(format!("{err:#}").contains("/no/such/T.tif"));
    }
}
