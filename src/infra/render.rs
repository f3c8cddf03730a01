// ============================================================
// Layer 6 — Render Sinks
// ============================================================
// Destinations for visualized predictions:
//
//   LogSink       — one log line per prediction
//   ImageDirSink  — one PNG per prediction, named
//                   NN_predicted_<label>.png
//
// Both can be combined with a tuple: (LogSink, ImageDirSink).

use anyhow::{anyhow, Context, Result};
use image::{ImageFormat, RgbImage};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::traits::{RenderSink, RenderedPrediction};

// ─── LogSink ──────────────────────────────────────────────────────────────────
#[derive(Debug, Default)]
pub struct LogSink;

impl RenderSink for LogSink {
    fn render(&mut self, item: &RenderedPrediction<'_>) -> Result<()> {
        tracing::info!(
            "Image {}: predicted: {} (class {}, {}x{})",
            item.position,
            item.label,
            item.predicted,
            item.image.width,
            item.image.height,
        );
        Ok(())
    }
}

// ─── ImageDirSink ─────────────────────────────────────────────────────────────
pub struct ImageDirSink {
    dir:     PathBuf,
    written: Vec<PathBuf>,
}

impl ImageDirSink {
    pub fn new(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Cannot create output folder '{}'", dir.display()))?;
        Ok(Self { dir: dir.to_path_buf(), written: Vec::new() })
    }

    /// Files written so far, in render order
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl RenderSink for ImageDirSink {
    fn render(&mut self, item: &RenderedPrediction<'_>) -> Result<()> {
        let image = &item.image;
        let buffer = RgbImage::from_raw(image.width, image.height, image.rgb.clone())
            .ok_or_else(|| {
                anyhow!(
                    "Image {} has {} bytes, expected {}x{}x3",
                    item.position, image.rgb.len(), image.width, image.height
                )
            })?;

        let path = self.dir.join(format!("{:02}_predicted_{}.png", item.position, item.label));
        buffer
            .save_with_format(&path, ImageFormat::Png)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;

        tracing::debug!("Wrote '{}'", path.display());
        self.written.push(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::traits::RenderImage;

    fn prediction(position: usize, label: &str, rgb: Vec<u8>) -> RenderedPrediction<'_> {
        RenderedPrediction {
            position,
            predicted: 1,
            label,
            image: RenderImage { width: 2, height: 2, rgb },
        }
    }

    #[test]
    fn test_png_is_named_after_position_and_label() {
        let dir      = tempfile::tempdir().unwrap();
        let mut sink = ImageDirSink::new(&dir.path().join("preds")).unwrap();

        sink.render(&prediction(1, "bees", vec![255; 12])).unwrap();

        let path = dir.path().join("preds/01_predicted_bees.png");
        assert_eq!(sink.written(), [path.clone()]);
        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (2, 2));
        assert_eq!(img.get_pixel(1, 1).0, [255, 255, 255]);
    }

    #[test]
    fn test_wrong_buffer_size_is_rejected() {
        let dir      = tempfile::tempdir().unwrap();
        let mut sink = ImageDirSink::new(dir.path()).unwrap();
        assert!(sink.render(&prediction(1, "ants", vec![0; 5])).is_err());
        assert!(sink.written().is_empty());
    }

    #[test]
    fn test_log_and_dir_sinks_combine() {
        let dir      = tempfile::tempdir().unwrap();
        let mut sink = (LogSink, ImageDirSink::new(dir.path()).unwrap());
        sink.render(&prediction(2, "ants", vec![0; 12])).unwrap();
        assert_eq!(sink.1.written().len(), 1);
    }
}
