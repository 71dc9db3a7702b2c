//! Static file lookup under the document root.

use std::fs::File;
use std::io;
use std::path::Path;

use url::Url;

/// What a request target resolved to.
#[derive(Debug)]
pub enum Resource {
    File { file: File, len: u64 },
    Missing,
    Forbidden,
}

/// Turns a request target into a path relative to the document root.
///
/// Absolute-form targets lose their `scheme://authority` prefix and keep the
/// rest byte for byte, `/` maps to `/index.html` and `%20` decodes to a
/// space. Returns `None` when the target has no path at all (`*`, an
/// authority).
pub fn request_path(uri: &str) -> Option<String> {
    let path = if uri.starts_with('/') {
        uri
    } else {
        // Only the scheme and authority are checked; the path is not
        // normalised or re-encoded.
        Url::parse(uri).ok().filter(|url| url.has_authority())?;
        let (_, rest) = uri.split_once("://")?;
        rest.find('/').map_or("/", |start| &rest[start..])
    };

    if path == "/" {
        return Some("/index.html".to_string());
    }

    Some(path.replace("%20", " "))
}

/// Opens the file a request target names.
///
/// Missing files map to [`Resource::Missing`]; permission problems, `..`
/// segments and directories map to [`Resource::Forbidden`]. Any other
/// failure is returned as an error.
pub fn open(root: &Path, uri: &str) -> io::Result<Resource> {
    let Some(rel) = request_path(uri) else {
        return Ok(Resource::Missing);
    };

    if rel.split('/').any(|segment| segment == "..") {
        return Ok(Resource::Forbidden);
    }

    let path = root.join(rel.trim_start_matches('/'));
    let file = match File::open(&path) {
        Ok(file) => file,
        Err(e) => {
            return match e.kind() {
                io::ErrorKind::NotFound
                | io::ErrorKind::NotADirectory
                // embedded NUL, no such file can exist
                | io::ErrorKind::InvalidInput => Ok(Resource::Missing),
                io::ErrorKind::PermissionDenied => Ok(Resource::Forbidden),
                _ => Err(e),
            };
        }
    };

    let metadata = file.metadata()?;
    if metadata.is_dir() {
        return Ok(Resource::Forbidden);
    }

    Ok(Resource::File {
        file,
        len: metadata.len(),
    })
}
