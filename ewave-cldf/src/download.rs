//! Download of the raw eWAVE export.

use std::fs;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::DownloadError;

/// Fetch the archive at `url` and unpack it into `dir`.
///
/// Returns the paths of the extracted files.
pub async fn download_and_unpack(url: &str, dir: &Path) -> Result<Vec<PathBuf>, DownloadError> {
    info!(url, "downloading raw data");
    let client = reqwest::Client::new();
    let bytes = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;
    debug!(bytes = bytes.len(), "download complete");

    unpack(&bytes, dir)
}

/// Extract a ZIP archive into `dir`, keeping its directory layout.
pub fn unpack(data: &[u8], dir: &Path) -> Result<Vec<PathBuf>, DownloadError> {
    let io_error = |path: &Path| {
        let path = path.to_path_buf();
        move |source| DownloadError::Io { path, source }
    };

    fs::create_dir_all(dir).map_err(io_error(dir))?;
    let mut archive = zip::ZipArchive::new(Cursor::new(data))?;
    let mut extracted = Vec::with_capacity(archive.len());

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let Some(name) = file.enclosed_name() else {
            warn!(name = file.name(), "skipping archive entry with unsafe path");
            continue;
        };
        let dest = dir.join(name);

        if file.is_dir() {
            fs::create_dir_all(&dest).map_err(io_error(&dest))?;
            continue;
        }
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(io_error(parent))?;
        }
        let mut out = fs::File::create(&dest).map_err(io_error(&dest))?;
        io::copy(&mut file, &mut out).map_err(io_error(&dest))?;
        debug!(path = %dest.display(), "extracted");
        extracted.push(dest);
    }

    info!(files = extracted.len(), dir = %dir.display(), "unpacked raw data");
    Ok(extracted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn archive(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in entries {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_unpack() {
        let dir = tempfile::tempdir().unwrap();
        let data = archive(&[("region.psv", "1|Europe\n"), ("sub/cc.csv", "1,2,1\n")]);
        let files = unpack(&data, dir.path()).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(
            fs::read_to_string(dir.path().join("sub").join("cc.csv")).unwrap(),
            "1,2,1\n"
        );
    }

    #[test]
    fn test_unpack_rejects_non_zip() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            unpack(b"not a zip", dir.path()),
            Err(DownloadError::Archive(_))
        ));
    }
}
