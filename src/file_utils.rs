use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, Context};
use walkdir::WalkDir;
use log::warn;
use crate::errors::EncodeError;
use crate::media::Title;

// @module: File and directory utilities

/// Smallest output accepted as a real encode
pub const MIN_OUTPUT_SIZE_BYTES: u64 = 1024 * 1024;

/// Format of the `#ts#` placeholder
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H_%M_%S";

// @const: Output template placeholders
pub const PLACEHOLDER_POSITION: &str = "#pos#";
pub const PLACEHOLDER_SIZE: &str = "#size#";
pub const PLACEHOLDER_FPS: &str = "#fps#";
pub const PLACEHOLDER_TIMESTAMP: &str = "#ts#";
pub const PLACEHOLDER_TITLE: &str = "#title#";

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {}", path.display()))?;
        }
        Ok(())
    }

    // @creates: Parent directory of a file
    pub fn ensure_parent_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        match path.as_ref().parent() {
            Some(parent) if !parent.as_os_str().is_empty() => Self::ensure_dir(parent),
            _ => Ok(()),
        }
    }

    /// Expand a leading `~` to the home directory
    pub fn expand_home(path: &str) -> PathBuf {
        if path == "~" || path.starts_with("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(path.trim_start_matches('~').trim_start_matches('/'));
            }
        }
        PathBuf::from(path)
    }

    /// Render the output template for a title.
    ///
    /// Substitutes `#pos#` (two digits), `#size#`, `#fps#`, `#ts#` and `#title#`.
    pub fn render_output_path(template: &str, title: &Title, source_name: &str, timestamp: &str) -> PathBuf {
        let rendered = template
            .replace(PLACEHOLDER_POSITION, &format!("{:02}", title.position))
            .replace(PLACEHOLDER_SIZE, title.size.as_deref().unwrap_or_default())
            .replace(PLACEHOLDER_FPS, title.fps.as_deref().unwrap_or_default())
            .replace(PLACEHOLDER_TIMESTAMP, timestamp)
            .replace(PLACEHOLDER_TITLE, source_name);

        Self::expand_home(&rendered)
    }

    /// Fail if the output, or a sibling with the same stem and another extension, exists
    pub fn check_output_free(path: &Path) -> std::result::Result<(), EncodeError> {
        if path.exists() {
            return Err(EncodeError::OutputAlreadyExists(path.to_path_buf()));
        }

        match Self::find_same_stem_sibling(path) {
            Some(sibling) => Err(EncodeError::OutputAlreadyExists(sibling)),
            None => Ok(()),
        }
    }

    // @finds: A file next to `path` with the same stem and a different extension
    fn find_same_stem_sibling(path: &Path) -> Option<PathBuf> {
        let stem = path.file_stem()?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        if !dir.is_dir() {
            return None;
        }

        WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.into_path())
            .find(|candidate| {
                candidate.is_file()
                    && candidate.file_stem() == Some(stem)
                    && candidate.extension() != path.extension()
            })
    }

    /// Check the file left by the engine.
    ///
    /// Returns the size of a usable output, `None` if nothing was written. An
    /// output below `minimum` bytes is deleted and reported as
    /// [`EncodeError::UndersizedOutput`].
    pub fn verify_output(path: &Path, minimum: u64) -> std::result::Result<Option<u64>, EncodeError> {
        if !Self::file_exists(path) {
            return Ok(None);
        }

        let size = fs::metadata(path)?.len();
        if size < minimum {
            warn!("file-size only {} KB - removing file {:?}", size / 1024, path.file_name().unwrap_or_default());
            fs::remove_file(path)?;
            return Err(EncodeError::UndersizedOutput {
                path: path.to_path_buf(),
                size,
                minimum,
            });
        }

        Ok(Some(size))
    }
}
