// ============================================================
// Layer 4 — Image Folder Dataset
// ============================================================
// Reads the class-per-directory layout:
//
//   data/
//     train/
//       ants/  0013035.jpg  ...
//       bees/  1092977343_cb42b38d62.jpg  ...
//     val/
//       ants/  ...
//       bees/  ...
//
// Class indices come from the sorted directory names of the
// training folder and are reused for validation, so "ants" is
// class 0 in both partitions.
//
// Files are only checked (header read) while scanning; pixels
// are decoded when the data loader asks for an item.
//
// Reference: Burn Book §4 (Dataset trait)

use anyhow::{ensure, Context, Result};
use burn::data::dataset::Dataset;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::data::{preprocessor::Preprocessor, splitter::split_train_val};

/// File extensions recognised as images
const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

/// One decoded, preprocessed sample.
#[derive(Debug, Clone)]
pub struct ImageItem {
    /// Normalised CHW pixels
    pub pixels: Vec<f32>,
    pub label:  usize,
}

/// An image file and its class index.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSample {
    pub path:  PathBuf,
    pub label: usize,
}

pub struct ImageFolder {
    classes:      Vec<String>,
    samples:      Vec<ImageSample>,
    preprocessor: Preprocessor,
}

impl ImageFolder {
    /// Scan `root` for the given classes.
    pub fn open(root: &Path, classes: &[String], preprocessor: Preprocessor) -> Result<Self> {
        let samples = scan_samples(root, classes)?;
        Ok(Self::from_samples(classes.to_vec(), samples, preprocessor))
    }

    pub fn from_samples(
        classes:      Vec<String>,
        samples:      Vec<ImageSample>,
        preprocessor: Preprocessor,
    ) -> Self {
        Self { classes, samples, preprocessor }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessor
    }
}

impl Dataset<ImageItem> for ImageFolder {
    fn get(&self, index: usize) -> Option<ImageItem> {
        let sample = self.samples.get(index)?;
        match self.preprocessor.load(&sample.path) {
            Ok(pixels) => Some(ImageItem { pixels, label: sample.label }),
            Err(e) => {
                tracing::error!("{e:#}");
                None
            }
        }
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

// ─── ImageSets ────────────────────────────────────────────────────────────────
/// The train and validation folders of one dataset root.
pub struct ImageSets {
    pub train: ImageFolder,
    pub val:   ImageFolder,
}

impl ImageSets {
    /// Open `root/train` and `root/val` for `classes`. Without a `val/`
    /// folder, a seeded `val_fraction` of the training images is held out,
    /// so the same arguments always give the same split.
    pub fn open(
        root:         &Path,
        classes:      &[String],
        preprocessor: Preprocessor,
        val_fraction: f64,
        seed:         u64,
    ) -> Result<Self> {
        let train_samples = scan_samples(&root.join("train"), classes)?;
        let val_root      = root.join("val");

        let (train_samples, val_samples) = if val_root.is_dir() {
            (train_samples, scan_samples(&val_root, classes)?)
        } else {
            tracing::info!(
                "No '{}' folder; holding out {:.0}% of the training images",
                val_root.display(),
                val_fraction * 100.0,
            );
            split_train_val(train_samples, 1.0 - val_fraction, seed)
        };

        Ok(Self {
            train: ImageFolder::from_samples(classes.to_vec(), train_samples, preprocessor.clone()),
            val:   ImageFolder::from_samples(classes.to_vec(), val_samples, preprocessor),
        })
    }
}

// ─── Scanning ─────────────────────────────────────────────────────────────────

/// Sorted names of the subdirectories of `root`.
pub fn discover_classes(root: &Path) -> Result<Vec<String>> {
    let entries = fs::read_dir(root)
        .with_context(|| format!("Cannot read dataset folder '{}'", root.display()))?;

    let mut classes = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if !path.is_dir() {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            classes.push(name.to_string());
        }
    }
    classes.sort();

    ensure!(!classes.is_empty(), "No class folders found in '{}'", root.display());
    Ok(classes)
}

/// List every image under `root/<class>/`, in class order then file name
/// order. Each file's header is read so undecodable files fail here.
pub fn scan_samples(root: &Path, classes: &[String]) -> Result<Vec<ImageSample>> {
    let mut samples = Vec::new();

    for (label, class) in classes.iter().enumerate() {
        let dir = root.join(class);
        if !dir.is_dir() {
            tracing::warn!("Class '{}' has no folder under '{}'", class, root.display());
            continue;
        }

        let mut paths: Vec<PathBuf> = fs::read_dir(&dir)
            .with_context(|| format!("Cannot read class folder '{}'", dir.display()))?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && has_image_extension(p))
            .collect();
        paths.sort();
        tracing::debug!("Class {} '{}': {} images", label, class, paths.len());

        for path in paths {
            image::image_dimensions(&path)
                .with_context(|| format!("Unreadable image '{}'", path.display()))?;
            samples.push(ImageSample { path, label });
        }
    }

    Ok(samples)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::preprocessor::Normalization;
    use image::{ImageFormat, Rgb, RgbImage};

    fn write_png(path: &Path, color: [u8; 3]) {
        RgbImage::from_pixel(12, 10, Rgb(color))
            .save_with_format(path, ImageFormat::Png)
            .unwrap();
    }

    fn layout() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for class in ["bees", "ants"] {
            fs::create_dir_all(dir.path().join(class)).unwrap();
        }
        write_png(&dir.path().join("ants/b.png"), [10, 10, 10]);
        write_png(&dir.path().join("ants/a.png"), [20, 20, 20]);
        write_png(&dir.path().join("bees/c.png"), [200, 200, 0]);
        fs::write(dir.path().join("bees/notes.txt"), "not an image").unwrap();
        fs::write(dir.path().join("README"), "top-level file").unwrap();
        dir
    }

    fn preprocessor() -> Preprocessor {
        Preprocessor::new(8, 6, Normalization::default()).unwrap()
    }

    #[test]
    fn test_classes_are_sorted_directory_names() {
        let dir = layout();
        assert_eq!(discover_classes(dir.path()).unwrap(), vec!["ants", "bees"]);
    }

    #[test]
    fn test_scan_orders_by_class_then_name_and_skips_non_images() {
        let dir     = layout();
        let classes = discover_classes(dir.path()).unwrap();
        let samples = scan_samples(dir.path(), &classes).unwrap();

        let names: Vec<(String, usize)> = samples
            .iter()
            .map(|s| (s.path.file_name().unwrap().to_string_lossy().into_owned(), s.label))
            .collect();
        assert_eq!(
            names,
            vec![("a.png".into(), 0), ("b.png".into(), 0), ("c.png".into(), 1)]
        );
    }

    #[test]
    fn test_extension_match_ignores_case() {
        assert!(has_image_extension(Path::new("x/IMG_01.JPG")));
        assert!(has_image_extension(Path::new("x/a.jpeg")));
        assert!(!has_image_extension(Path::new("x/notes.txt")));
        assert!(!has_image_extension(Path::new("x/no_extension")));
    }

    #[test]
    fn test_missing_class_folder_is_skipped() {
        let dir     = layout();
        let classes = vec!["ants".to_string(), "wasps".to_string()];
        let samples = scan_samples(dir.path(), &classes).unwrap();
        assert_eq!(samples.len(), 2);
    }

    #[test]
    fn test_corrupt_image_fails_the_scan() {
        let dir = layout();
        fs::write(dir.path().join("ants/broken.jpg"), b"not really a jpeg").unwrap();
        let classes = discover_classes(dir.path()).unwrap();
        assert!(scan_samples(dir.path(), &classes).is_err());
    }

    #[test]
    fn test_empty_root_has_no_classes() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_classes(dir.path()).is_err());
    }

    #[test]
    fn test_get_decodes_and_preprocesses() {
        let dir     = layout();
        let classes = discover_classes(dir.path()).unwrap();
        let folder  = ImageFolder::open(dir.path(), &classes, preprocessor()).unwrap();

        assert_eq!(folder.len(), 3);
        let item = folder.get(2).unwrap();
        assert_eq!(item.label, 1);
        assert_eq!(item.pixels.len(), 3 * 6 * 6);
        assert!(folder.get(3).is_none());
    }

    fn dataset_root(with_val: bool) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let mut splits = vec!["train"];
        if with_val {
            splits.push("val");
        }
        for split in splits {
            for class in ["ants", "bees"] {
                let folder = dir.path().join(split).join(class);
                fs::create_dir_all(&folder).unwrap();
                for i in 0..5 {
                    write_png(&folder.join(format!("{i}.png")), [i * 40, 0, 0]);
                }
            }
        }
        dir
    }

    #[test]
    fn test_sets_use_val_folder_when_present() {
        let dir     = dataset_root(true);
        let classes = discover_classes(&dir.path().join("train")).unwrap();
        let sets    = ImageSets::open(dir.path(), &classes, preprocessor(), 0.2, 1).unwrap();
        assert_eq!(sets.train.len(), 10);
        assert_eq!(sets.val.len(),   10);
        assert_eq!(sets.val.classes(), ["ants", "bees"]);
    }

    #[test]
    fn test_sets_hold_out_a_seeded_fraction_without_val_folder() {
        let dir     = dataset_root(false);
        let classes = discover_classes(&dir.path().join("train")).unwrap();

        let a = ImageSets::open(dir.path(), &classes, preprocessor(), 0.2, 5).unwrap();
        let b = ImageSets::open(dir.path(), &classes, preprocessor(), 0.2, 5).unwrap();
        assert_eq!(a.train.len(), 8);
        assert_eq!(a.val.len(),   2);
        assert_eq!(a.val.samples, b.val.samples);
    }
}
