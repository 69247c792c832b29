//! Prediction collection: loading the image list, fetching images and
//! running the classifier over a window of them.
//!
//! - **fetch**: Download URL images and inline them as data URLs
//! - **runner**: Sequential batch runner with per-item checkpoints

pub mod fetch;
pub mod runner;

use std::collections::HashSet;
use std::path::Path;

use crate::config::ImageMode;
use crate::error::{ConfigError, Result};
use crate::output;
use crate::types::{ImageInput, ImageSpec};

pub use fetch::ImageFetcher;
pub use runner::{estimate_remaining, BatchRunner, RunEvent, RunOptions, RunReport};

/// Load an `images.json` file and resolve each record for `mode`.
///
/// Records without any image source and repeated image ids are rejected.
pub fn load_images(path: &Path, mode: ImageMode) -> Result<Vec<ImageInput>> {
    let specs: Vec<ImageSpec> = output::read_json(path, "images")?;
    let images = resolve_images(&specs, mode)?;
    tracing::debug!("Loaded {} images from {:?}", images.len(), path);
    Ok(images)
}

pub fn resolve_images(
    specs: &[ImageSpec],
    mode: ImageMode,
) -> std::result::Result<Vec<ImageInput>, ConfigError> {
    let mut seen = HashSet::new();
    specs
        .iter()
        .map(|spec| {
            if !seen.insert(spec.image_id.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate image_id {:?}",
                    spec.image_id
                )));
            }
            spec.to_input(mode)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BenchError;
    use crate::types::ImageSource;
    use tempfile::tempdir;

    #[test]
    fn test_load_images() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("images.json");
        std::fs::write(
            &path,
            r#"[{"image_id":"1.png","url":"https://example.com/1.png"},
                {"image_id":"2.png","b64":"AAAA","mime":"image/gif"}]"#,
        )
        .unwrap();

        let images = load_images(&path, ImageMode::Url).unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].source, ImageSource::Url("https://example.com/1.png".into()));
        assert_eq!(images[1].content_url(), "data:image/gif;base64,AAAA");
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let specs = [
            ImageSpec::remote("1.png", "https://example.com/a.png"),
            ImageSpec::remote("1.png", "https://example.com/b.png"),
        ];
        let err = resolve_images(&specs, ImageMode::Url).unwrap_err();
        assert!(err.to_string().contains("1.png"));
    }

    #[test]
    fn test_missing_source_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("images.json");
        std::fs::write(&path, r#"[{"image_id":"3.png"}]"#).unwrap();
        let err = load_images(&path, ImageMode::Base64).unwrap_err();
        assert!(matches!(
            err,
            BenchError::Config(ConfigError::InvalidImageSpec { .. })
        ));
    }

    #[test]
    fn test_not_an_array_is_format_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("images.json");
        std::fs::write(&path, r#"{"image_id":"3.png"}"#).unwrap();
        let err = load_images(&path, ImageMode::Base64).unwrap_err();
        assert!(matches!(err, BenchError::Format { kind: "images", .. }));
    }
}
