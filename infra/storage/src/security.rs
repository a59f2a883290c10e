use crate::error::StorageError;
use std::path::{Path, PathBuf};

/// File holding the value of a key inside the key's own directory.
pub(crate) const VALUE_FILE: &str = "@value";

/// Marker prefixed to segments that would otherwise clash with reserved file names.
const ESCAPE: char = '%';

/// Maps one key segment onto a directory name.
///
/// Segments starting with `@`, `%` or `.` get a `%` prefix, so no directory can shadow the
/// value file, a temporary file, or `.`/`..`.
fn encode_segment(segment: &str) -> Result<String, StorageError> {
    if segment.is_empty() {
        return Err(StorageError::InvalidKey {
            message: "empty key segment".into(),
            context: None,
        });
    }
    if segment.contains(['\0', '\\']) {
        return Err(StorageError::PathTraversalAttempt {
            message: segment.to_owned().into(),
            context: Some("Key segment contains a forbidden character".into()),
        });
    }

    if segment.starts_with(['@', ESCAPE, '.']) {
        Ok(format!("{ESCAPE}{segment}"))
    } else {
        Ok(segment.to_owned())
    }
}

/// Inverse of [`encode_segment`].
pub(crate) fn decode_segment(name: &str) -> &str {
    name.strip_prefix(ESCAPE).unwrap_or(name)
}

/// Translates a `/`-separated key into a relative directory path. `""` maps to the root.
pub(crate) fn key_to_relative(key: &str) -> Result<PathBuf, StorageError> {
    let mut out = PathBuf::new();
    if key.is_empty() {
        return Ok(out);
    }
    for segment in key.split('/') {
        out.push(encode_segment(segment).map_err(|err| match err {
            StorageError::InvalidKey { message, .. } => {
                StorageError::InvalidKey { message, context: Some(key.to_owned().into()) }
            },
            other => other,
        })?);
    }
    Ok(out)
}

/// Resolves the directory of `key` below `root` and verifies it stays inside the sandbox.
pub(crate) fn resolve_key(root: &Path, key: &str) -> Result<PathBuf, StorageError> {
    let joined = root.join(key_to_relative(key)?);

    match joined.canonicalize() {
        Ok(canonical) => validate_canonical(root, canonical),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => validate_path(root, &joined),
        Err(e) => Err(StorageError::Io { source: e, context: None }),
    }
}

fn validate_canonical(root: &Path, canonical: PathBuf) -> Result<PathBuf, StorageError> {
    if canonical.starts_with(root) {
        Ok(canonical)
    } else {
        Err(StorageError::PathTraversalAttempt {
            message: canonical.display().to_string().into(),
            context: Some("Key directory resolves outside the sandbox".into()),
        })
    }
}

/// Validates a path that doesn't exist yet by verifying its first existing ancestor.
///
/// Walking up until an ancestor exists lets deeply nested keys be checked without creating
/// the intermediate directories, while a symlinked ancestor pointing outside the root is
/// still caught.
fn validate_path(root: &Path, joined: &Path) -> Result<PathBuf, StorageError> {
    if !joined.starts_with(root) {
        return Err(StorageError::PathTraversalAttempt {
            message: joined.display().to_string().into(),
            context: Some("Path is outside sandbox boundaries".into()),
        });
    }

    let mut current = Some(joined);

    while let Some(path) = current {
        if path == root {
            return Ok(joined.to_path_buf());
        }

        if path.exists() {
            return match path.canonicalize() {
                Ok(canonical) if canonical.starts_with(root) => Ok(joined.to_path_buf()),
                Ok(canonical) => Err(StorageError::PathTraversalAttempt {
                    message: canonical.display().to_string().into(),
                    context: Some("Existing parent directory is a symlink outside sandbox".into()),
                }),
                Err(e) => Err(StorageError::Io {
                    source: e,
                    context: Some("Failed to verify parent directory".into()),
                }),
            };
        }

        current = path.parent();
    }

    Err(StorageError::PathTraversalAttempt {
        message: joined.display().to_string().into(),
        context: Some("No valid parent directory found within sandbox".into()),
    })
}

/// Rebuilds a key from a value file path relative to the root.
pub(crate) fn relative_to_key(relative: &Path) -> Option<String> {
    let mut segments = Vec::new();
    for component in relative.parent()?.components() {
        segments.push(decode_segment(component.as_os_str().to_str()?));
    }
    if segments.is_empty() {
        return None;
    }
    Some(segments.join("/"))
}
