//! Selection scanning: turn command-line paths into the ordered list of files
//! to process.
//!
//! ## Rules
//!
//! - A path that is not a directory is selected as given, whatever its
//!   extension. A file that turns out to be unreadable or not an image fails
//!   later, with a per-item status message.
//! - A directory contributes the image files it contains, sorted by file
//!   name. Only the top level is read unless `recursive` is set.
//! - Inside directories, hidden entries (`.name`) are skipped and files are
//!   filtered by [`supported_input_extensions`], case-insensitively.
//! - Command-line order is preserved; each directory's files are spliced in
//!   where the directory was named.
//!
//! ```text
//! rioyi-crop process hero.png shoots/ extra.jpg
//!
//! shoots/
//! ├── b.JPG          → selected
//! ├── a.png          → selected
//! ├── notes.txt      → skipped (not an image)
//! ├── .thumb.jpg     → skipped (hidden)
//! └── older/
//!     └── c.jpg      → selected only with --recursive
//!
//! selection: hero.png, shoots/a.png, shoots/b.JPG, extra.jpg
//! ```

use crate::imaging::supported_input_extensions;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("cannot walk directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Expand command-line paths into the files to process, in order.
pub fn collect_selection(paths: &[PathBuf], recursive: bool) -> Result<Vec<PathBuf>, ScanError> {
    let mut selection = Vec::new();
    for path in paths {
        if path.is_dir() {
            selection.extend(scan_directory(path, recursive)?);
        } else {
            selection.push(path.clone());
        }
    }
    Ok(selection)
}

fn scan_directory(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>, ScanError> {
    let mut walker = WalkDir::new(dir).min_depth(1).sort_by_file_name();
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut files = Vec::new();
    for entry in walker.into_iter().filter_entry(|e| !is_hidden(e)) {
        let entry = entry?;
        if entry.file_type().is_file() && is_image(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Whether the extension is one of the decodable image formats.
pub fn is_image(path: &Path) -> bool {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    supported_input_extensions().contains(&ext.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, rel: &str) -> PathBuf {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, "x").unwrap();
        path
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn explicit_files_are_kept_as_given() {
        let tmp = TempDir::new().unwrap();
        let a = touch(tmp.path(), "z.jpg");
        let b = touch(tmp.path(), "notes.txt");
        let missing = tmp.path().join("missing.png");

        let selection =
            collect_selection(&[a.clone(), b.clone(), missing.clone()], false).unwrap();
        assert_eq!(selection, vec![a, b, missing]);
    }

    #[test]
    fn directory_is_filtered_and_sorted() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "b.JPG");
        touch(tmp.path(), "a.png");
        touch(tmp.path(), "notes.txt");
        touch(tmp.path(), ".thumb.jpg");

        let selection = collect_selection(&[tmp.path().to_path_buf()], false).unwrap();
        assert_eq!(names(&selection), vec!["a.png", "b.JPG"]);
    }

    #[test]
    fn subdirectories_need_recursive() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "a.jpg");
        touch(tmp.path(), "older/c.jpg");
        touch(tmp.path(), ".cache/d.jpg");

        let flat = collect_selection(&[tmp.path().to_path_buf()], false).unwrap();
        assert_eq!(names(&flat), vec!["a.jpg"]);

        let deep = collect_selection(&[tmp.path().to_path_buf()], true).unwrap();
        assert_eq!(names(&deep), vec!["a.jpg", "c.jpg"]);
    }

    #[test]
    fn command_line_order_is_preserved() {
        let tmp = TempDir::new().unwrap();
        let hero = touch(tmp.path(), "hero.png");
        let shoots = tmp.path().join("shoots");
        touch(&shoots, "b.jpg");
        touch(&shoots, "a.jpg");
        let extra = touch(tmp.path(), "extra.jpg");

        let selection = collect_selection(&[hero, shoots, extra], false).unwrap();
        assert_eq!(
            names(&selection),
            vec!["hero.png", "a.jpg", "b.jpg", "extra.jpg"]
        );
    }

    #[test]
    fn empty_directory_selects_nothing() {
        let tmp = TempDir::new().unwrap();
        let selection = collect_selection(&[tmp.path().to_path_buf()], true).unwrap();
        assert!(selection.is_empty());
    }

    #[test]
    fn is_image_is_case_insensitive() {
        assert!(is_image(Path::new("a.JPEG")));
        assert!(is_image(Path::new("a.webp")));
        assert!(!is_image(Path::new("a.txt")));
        assert!(!is_image(Path::new("noext")));
    }
}
