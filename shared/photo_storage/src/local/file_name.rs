use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{PhotoStorageError, PhotoStorageResult};
use crate::photo::ImageFormat;

/// Longest file name most file systems accept
const MAX_FILE_NAME_LEN: usize = 255;

static FILE_NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("valid regex"));

fn has_image_extension(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(ImageFormat::from_extension)
        .is_some()
}

/// An image file whose name cannot be used as an identifier.
///
/// Such files are never listed, so retention never removes them either.
pub(crate) fn is_orphaned_image(file_name: &str) -> bool {
    has_image_extension(file_name) && validate_file_name(file_name).is_err()
}

/// Checks that an identifier names a photo directly inside the uploads directory.
///
/// Rejects path separators, traversal sequences, hidden files and anything
/// without a recognized image extension.
///
/// # Errors
///
/// Returns `PhotoStorageError::InvalidIdentifier` describing the first violation
pub fn validate_file_name(file_name: &str) -> PhotoStorageResult<()> {
    let invalid = |reason: &str| {
        Err(PhotoStorageError::InvalidIdentifier(format!(
            "{file_name:?}: {reason}"
        )))
    };

    if file_name.is_empty() {
        return invalid("empty");
    }
    if file_name.len() > MAX_FILE_NAME_LEN {
        return invalid("too long");
    }
    if !FILE_NAME_PATTERN.is_match(file_name) {
        return invalid("unexpected characters");
    }
    if file_name.contains("..") {
        return invalid("traversal sequence");
    }

    if !has_image_extension(file_name) {
        return invalid("not an image file name");
    }

    Ok(())
}
