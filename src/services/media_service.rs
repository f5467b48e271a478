//! Card image management for kiosk staff: uploading replacements and shuffling which
//! image sits behind which face.

use std::path::{Path, PathBuf};

use axum::body::Bytes;
use rand::Rng;
use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};

use crate::state::deck::fisher_yates;

const PNG_CONTENT_TYPE: &str = "image/png";
const LOGO_STEM: &str = "flashka";

/// Failures of the image admin operations.
#[derive(Debug, Error)]
pub enum MediaError {
    /// A file did not pass the name/type filter; nothing was written.
    #[error("Only PNG files named image_1.png to image_10.png or flashka.png are allowed")]
    Rejected {
        /// Name of the first offending file.
        name: String,
    },
    /// The request carried no files.
    #[error("No valid images were uploaded.")]
    NothingUploaded,
    /// Writing an accepted upload failed.
    #[error("failed to store `{}`", .path.display())]
    Store {
        /// Destination that could not be written.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Copying or renaming during a shuffle failed.
    #[error("failed to shuffle `{}`", .path.display())]
    Shuffle {
        /// File being copied or renamed.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One file received from the upload form.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Client-side file name, also the stored name.
    pub file_name: String,
    /// MIME type declared by the form part.
    pub content_type: Option<String>,
    /// File contents.
    pub bytes: Bytes,
}

/// Accept `image/png` files named `image_<digits>.png` or `flashka.png`.
pub fn is_allowed_upload(file_name: &str, content_type: Option<&str>) -> bool {
    if content_type != Some(PNG_CONTENT_TYPE) {
        return false;
    }
    let Some(stem) = file_name.strip_suffix(".png") else {
        return false;
    };
    if stem == LOGO_STEM {
        return true;
    }
    stem.strip_prefix("image_")
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

/// Check every upload, then write them into `dir` under their original names.
///
/// A single rejected file fails the whole request before anything is written.
pub async fn store_uploads(dir: &Path, uploads: Vec<Upload>) -> Result<usize, MediaError> {
    if uploads.is_empty() {
        return Err(MediaError::NothingUploaded);
    }
    if let Some(rejected) = uploads
        .iter()
        .find(|upload| !is_allowed_upload(&upload.file_name, upload.content_type.as_deref()))
    {
        return Err(MediaError::Rejected {
            name: rejected.file_name.clone(),
        });
    }

    let count = uploads.len();
    for upload in uploads {
        let path = dir.join(&upload.file_name);
        fs::write(&path, &upload.bytes)
            .await
            .map_err(|source| MediaError::Store {
                path: path.clone(),
                source,
            })?;
        info!(path = %path.display(), bytes = upload.bytes.len(), "stored uploaded image");
    }
    Ok(count)
}

/// Names `image_1.png..image_<count>.png` in a Fisher–Yates order.
pub fn shuffled_image_names<R: Rng + ?Sized>(count: u8, rng: &mut R) -> Vec<String> {
    let mut names: Vec<String> = (1..=count).map(image_name).collect();
    fisher_yates(&mut names, rng);
    names
}

/// Shuffle the `count` image slots in `dir` and return the order that was applied.
pub async fn shuffle_slots(dir: &Path, count: u8) -> Result<Vec<String>, MediaError> {
    let order = shuffled_image_names(count, &mut rand::rng());
    shuffle_images(dir, &order).await?;
    Ok(order)
}

/// Move the image listed at index `i` of `order` into slot `image_<i + 1>.png`.
///
/// Every source is first copied to a temporary name so slots never overwrite each other
/// mid-way; the temporaries are then renamed into place.
pub async fn shuffle_images(dir: &Path, order: &[String]) -> Result<(), MediaError> {
    let temp_paths: Vec<PathBuf> = order
        .iter()
        .enumerate()
        .map(|(index, name)| dir.join(format!("temp_{index}_{name}")))
        .collect();

    for (index, (name, temp)) in order.iter().zip(&temp_paths).enumerate() {
        let source = dir.join(name);
        if let Err(err) = fs::copy(&source, temp).await {
            discard_temporaries(&temp_paths[..index]).await;
            return Err(MediaError::Shuffle {
                path: source,
                source: err,
            });
        }
    }

    for (index, temp) in temp_paths.iter().enumerate() {
        let destination = dir.join(image_name(index as u8 + 1));
        fs::rename(temp, &destination)
            .await
            .map_err(|source| MediaError::Shuffle {
                path: temp.clone(),
                source,
            })?;
    }

    info!(dir = %dir.display(), order = ?order, "shuffled image slots");
    Ok(())
}

async fn discard_temporaries(paths: &[PathBuf]) {
    for path in paths {
        if let Err(err) = fs::remove_file(path).await {
            warn!(path = %path.display(), error = %err, "failed to remove temporary image");
        }
    }
}

fn image_name(slot: u8) -> String {
    format!("image_{slot}.png")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};
    use uuid::Uuid;

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("flashka-media-{}", Uuid::new_v4().simple()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn png(name: &str, bytes: &'static [u8]) -> Upload {
        Upload {
            file_name: name.into(),
            content_type: Some(PNG_CONTENT_TYPE.into()),
            bytes: Bytes::from_static(bytes),
        }
    }

    #[test]
    fn upload_filter_matches_slot_and_logo_names() {
        assert!(is_allowed_upload("image_1.png", Some("image/png")));
        assert!(is_allowed_upload("image_10.png", Some("image/png")));
        assert!(is_allowed_upload("flashka.png", Some("image/png")));

        assert!(!is_allowed_upload("image_.png", Some("image/png")));
        assert!(!is_allowed_upload("image_1a.png", Some("image/png")));
        assert!(!is_allowed_upload("image_1.jpg", Some("image/png")));
        assert!(!is_allowed_upload("../image_1.png", Some("image/png")));
        assert!(!is_allowed_upload("logo.png", Some("image/png")));
        assert!(!is_allowed_upload("image_1.png", Some("image/jpeg")));
        assert!(!is_allowed_upload("image_1.png", None));
    }

    #[tokio::test]
    async fn uploads_are_written_under_their_names() {
        let dir = scratch_dir();
        let stored = store_uploads(&dir, vec![png("image_2.png", b"two"), png("flashka.png", b"logo")])
            .await
            .unwrap();
        assert_eq!(stored, 2);
        assert_eq!(std::fs::read(dir.join("image_2.png")).unwrap(), b"two");
        assert_eq!(std::fs::read(dir.join("flashka.png")).unwrap(), b"logo");
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn one_bad_file_rejects_the_batch() {
        let dir = scratch_dir();
        let err = store_uploads(&dir, vec![png("image_1.png", b"one"), png("evil.png", b"x")])
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::Rejected { ref name } if name == "evil.png"));
        assert!(!dir.join("image_1.png").exists());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn empty_upload_is_rejected() {
        let dir = scratch_dir();
        assert!(matches!(
            store_uploads(&dir, Vec::new()).await,
            Err(MediaError::NothingUploaded)
        ));
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn shuffle_permutes_slot_contents() {
        let dir = scratch_dir();
        for slot in 1..=10u8 {
            std::fs::write(dir.join(image_name(slot)), format!("content-{slot}")).unwrap();
        }

        let mut rng = StdRng::seed_from_u64(5);
        let order = shuffled_image_names(10, &mut rng);
        shuffle_images(&dir, &order).await.unwrap();

        for (index, name) in order.iter().enumerate() {
            let original_slot = name
                .trim_start_matches("image_")
                .trim_end_matches(".png")
                .to_string();
            let content = std::fs::read_to_string(dir.join(image_name(index as u8 + 1))).unwrap();
            assert_eq!(content, format!("content-{original_slot}"));
        }

        let leftovers = std::fs::read_dir(&dir)
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().starts_with("temp_"))
            .count();
        assert_eq!(leftovers, 0);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn missing_slot_aborts_without_touching_images() {
        let dir = scratch_dir();
        for slot in 1..=9u8 {
            std::fs::write(dir.join(image_name(slot)), format!("content-{slot}")).unwrap();
        }

        let order: Vec<String> = (1..=10u8).rev().map(image_name).collect();
        let err = shuffle_images(&dir, &order).await.unwrap_err();
        assert!(matches!(err, MediaError::Shuffle { .. }));

        for slot in 1..=9u8 {
            let content = std::fs::read_to_string(dir.join(image_name(slot))).unwrap();
            assert_eq!(content, format!("content-{slot}"));
        }
        let _ = std::fs::remove_dir_all(dir);
    }
}
