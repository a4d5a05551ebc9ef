use std::path::Path;

use walkdir::WalkDir;

use crate::domain::IncomingFile;
use crate::error::Result;

/// Map a file extension to its image MIME type.
pub fn mime_for_extension(ext: &str) -> Option<&'static str> {
    let mime = match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "avif" => "image/avif",
        "heic" => "image/heic",
        "tif" | "tiff" => "image/tiff",
        "ico" => "image/x-icon",
        _ => return None,
    };
    Some(mime)
}

/// Read every image under `dir` (recursively, sorted by file name).
/// Files with unknown extensions are left out.
pub fn scan_directory(dir: &Path) -> Result<Vec<IncomingFile>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let Some(mime) = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(mime_for_extension)
        else {
            log::debug!("skipping non-image file {}", path.display());
            continue;
        };
        let bytes = std::fs::read(path)?;
        files.push(IncomingFile::new(
            entry.file_name().to_string_lossy(),
            mime,
            bytes,
        ));
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_mime_for_extension() {
        assert_eq!(mime_for_extension("JPG"), Some("image/jpeg"));
        assert_eq!(mime_for_extension("png"), Some("image/png"));
        assert_eq!(mime_for_extension("txt"), None);
    }

    #[test]
    fn test_scan_directory_picks_images_sorted() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("nested");
        fs::create_dir_all(&nested).unwrap();
        fs::write(tmp.path().join("b.png"), b"png-bytes").unwrap();
        fs::write(tmp.path().join("a.JPG"), b"jpeg-bytes").unwrap();
        fs::write(tmp.path().join("notes.txt"), b"skip me").unwrap();
        fs::write(nested.join("c.webp"), b"webp").unwrap();

        let files = scan_directory(tmp.path()).unwrap();
        let summary: Vec<(&str, &str)> = files
            .iter()
            .map(|f| (f.name.as_str(), f.mime_type.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![("a.JPG", "image/jpeg"), ("b.png", "image/png"), ("c.webp", "image/webp")]
        );
        assert_eq!(files[1].bytes, b"png-bytes");
    }

    #[test]
    fn test_scan_nonexistent_directory() {
        assert!(scan_directory(Path::new("/nonexistent/gallery/dir")).is_err());
    }
}
