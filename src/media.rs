//! Media discovery: find the images the rotation loop scrolls.
//!
//! ## Rust concepts
//! - `fs::read_dir()` for directory traversal
//! - `Path` and `PathBuf` for cross-platform file paths
//! - `serde::Serialize` for automatic JSON conversion

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Information about a single image file.
#[derive(Clone, Debug, Serialize, utoipa::ToSchema)]
pub struct MediaEntry {
    /// Filename (e.g., "logo.png")
    pub name: String,
    /// Relative path from media dir (e.g., "images/logo.png")
    pub path: String,
    /// File size in bytes
    pub size: u64,
}

/// True for the formats the decoder is built with.
fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg"))
}

/// Full paths of every supported image under `<media_dir>/images`, sorted by name.
pub fn image_paths(media_dir: &Path) -> Vec<PathBuf> {
    let Ok(read_dir) = fs::read_dir(media_dir.join("images")) else {
        return Vec::new();
    };

    let mut paths: Vec<PathBuf> = read_dir
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_supported_image(path))
        .collect();
    paths.sort();
    paths
}

/// Scan the images directory for PNG and JPEG files.
pub fn list_images(media_dir: &Path) -> Vec<MediaEntry> {
    image_paths(media_dir)
        .into_iter()
        .map(|path| {
            let size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            let name = path
                .file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .into_owned();
            MediaEntry {
                path: format!("images/{name}"),
                name,
                size,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn create_file(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"fake").unwrap();
    }

    fn images_dir(tmp: &TempDir) -> PathBuf {
        let dir = tmp.path().join("images");
        std::fs::create_dir(&dir).unwrap();
        dir
    }

    #[test]
    fn list_images_finds_supported_formats() {
        let tmp = TempDir::new().unwrap();
        let dir = images_dir(&tmp);

        create_file(&dir, "photo.png");
        create_file(&dir, "pic.jpg");
        create_file(&dir, "shot.JPEG");
        create_file(&dir, "anim.gif"); // no decoder
        create_file(&dir, "readme.txt");
        std::fs::create_dir(dir.join("nested.png")).unwrap();

        let entries = list_images(tmp.path());
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();

        assert_eq!(names, vec!["photo.png", "pic.jpg", "shot.JPEG"]);
        assert_eq!(entries[0].path, "images/photo.png");
        assert_eq!(entries[0].size, 4);
    }

    #[test]
    fn list_images_returns_empty_when_no_dir() {
        let tmp = TempDir::new().unwrap();
        assert!(list_images(tmp.path()).is_empty());
        assert!(image_paths(tmp.path()).is_empty());
    }

    #[test]
    fn image_paths_sorted_alphabetically() {
        let tmp = TempDir::new().unwrap();
        let dir = images_dir(&tmp);

        create_file(&dir, "zebra.png");
        create_file(&dir, "apple.png");
        create_file(&dir, "mango.jpg");

        let paths = image_paths(tmp.path());
        assert_eq!(
            paths,
            vec![dir.join("apple.png"), dir.join("mango.jpg"), dir.join("zebra.png")]
        );
    }
}
