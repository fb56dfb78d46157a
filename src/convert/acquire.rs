//! Acquire the source tarball
//!
//! URLs are downloaded into a temporary file that is deleted when the
//! returned [`Archive`] is dropped. Anything else is taken as a local path.

use super::error::ConvertError;
use crate::core::output;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// A tarball ready for extraction
#[derive(Debug)]
pub enum Archive {
    Local(PathBuf),
    Downloaded(NamedTempFile),
}

impl Archive {
    /// Filesystem location of the tarball
    pub fn path(&self) -> &Path {
        match self {
            Self::Local(path) => path,
            Self::Downloaded(file) => file.path(),
        }
    }
}

/// Whether the input names a remote file
pub fn is_url(input: &str) -> bool {
    input.starts_with("http:") || input.starts_with("https:")
}

/// Resolve a URL or path into a local tarball.
///
/// A path that does not exist is passed through unchanged; opening it
/// during extraction reports the error.
pub fn acquire(input: &str) -> Result<Archive, ConvertError> {
    if is_url(input) {
        output::sub_action(&format!("download {}", input));
        return Ok(Archive::Downloaded(download(input)?));
    }

    let path = Path::new(input);
    if path.exists() {
        Ok(Archive::Local(std::path::absolute(path)?))
    } else {
        Ok(Archive::Local(path.to_path_buf()))
    }
}

/// File name portion of a URL, without query string or fragment
fn url_filename(url: &str) -> &str {
    let url = url.split(['?', '#']).next().unwrap_or(url);
    url.rsplit('/')
        .find(|seg| !seg.is_empty())
        .filter(|seg| !seg.contains(':'))
        .unwrap_or("download")
}

/// Download a URL into a temporary file named after it.
fn download(url: &str) -> Result<NamedTempFile, ConvertError> {
    let filename = url_filename(url);
    let mut file = tempfile::Builder::new()
        .prefix("tar2conda-")
        .suffix(&format!("-{}", filename))
        .tempfile()?;

    let pb = output::spinner(&format!("downloading {}", filename));

    let response = ureq::get(url).call().map_err(|e| {
        pb.finish_and_clear();
        ConvertError::Download {
            url: url.to_string(),
            reason: e.to_string(),
        }
    })?;

    if let Some(len) = response
        .header("content-length")
        .and_then(|s| s.parse().ok())
    {
        output::upgrade_to_bytes(&pb, len);
    }

    let mut reader = response.into_reader();
    let mut buffer = [0u8; 8192];
    let mut total_bytes = 0u64;

    loop {
        let bytes_read = reader.read(&mut buffer).map_err(|e| ConvertError::Download {
            url: url.to_string(),
            reason: format!("read error: {}", e),
        })?;
        if bytes_read == 0 {
            break;
        }
        file.write_all(&buffer[..bytes_read])?;
        total_bytes += bytes_read as u64;
        pb.set_position(total_bytes);
    }
    file.flush()?;

    pb.finish_and_clear();
    output::detail(&format!("downloaded {} ({} bytes)", filename, total_bytes));
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_is_url() {
        assert!(is_url("http://example.com/R-swat-1.0.tar.gz"));
        assert!(is_url("https://example.com/R-swat-1.0.tar.gz"));
        assert!(!is_url("ftp://example.com/R-swat-1.0.tar.gz"));
        assert!(!is_url("/tmp/R-swat-1.0.tar.gz"));
        assert!(!is_url("R-swat-1.0.tar.gz"));
    }

    #[test]
    fn test_url_filename() {
        assert_eq!(
            url_filename("https://example.com/dl/R-swat-1.6.0-linux64.tar.gz"),
            "R-swat-1.6.0-linux64.tar.gz"
        );
        assert_eq!(url_filename("https://example.com/a.tar?token=x#frag"), "a.tar");
        assert_eq!(url_filename("https://example.com/dir/"), "dir");
        assert_eq!(url_filename("https://"), "download");
    }

    #[test]
    fn test_acquire_existing_path_is_absolute() {
        let dir = TempDir::new().unwrap();
        let tarball = dir.path().join("R-swat-1.0.tar.gz");
        std::fs::write(&tarball, b"").unwrap();

        let archive = acquire(tarball.to_str().unwrap()).unwrap();
        assert!(matches!(archive, Archive::Local(_)));
        assert!(archive.path().is_absolute());
        assert_eq!(archive.path(), tarball);
    }

    #[test]
    fn test_acquire_missing_path_passes_through() {
        let archive = acquire("does/not/exist.tar.gz").unwrap();
        assert_eq!(archive.path(), Path::new("does/not/exist.tar.gz"));
    }

    mod mock_tests {
        use super::*;
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        #[tokio::test(flavor = "multi_thread")]
        async fn test_download_success() {
            let mock_server = MockServer::start().await;

            Mock::given(method("GET"))
                .and(path("/dl/R-swat-1.6.0.tar.gz"))
                .respond_with(ResponseTemplate::new(200).set_body_bytes(b"tarball-bytes".to_vec()))
                .mount(&mock_server)
                .await;

            let url = format!("{}/dl/R-swat-1.6.0.tar.gz", mock_server.uri());
            let archive = acquire(&url).unwrap();

            let downloaded = archive.path().to_path_buf();
            assert!(downloaded.to_string_lossy().ends_with("R-swat-1.6.0.tar.gz"));
            assert_eq!(std::fs::read(&downloaded).unwrap(), b"tarball-bytes");

            drop(archive);
            assert!(!downloaded.exists(), "download should be removed on drop");
        }

        #[tokio::test(flavor = "multi_thread")]
        async fn test_download_404() {
            let mock_server = MockServer::start().await;

            Mock::given(method("GET"))
                .and(path("/missing.tar.gz"))
                .respond_with(ResponseTemplate::new(404))
                .mount(&mock_server)
                .await;

            let url = format!("{}/missing.tar.gz", mock_server.uri());
            let err = acquire(&url).unwrap_err();
            assert!(matches!(err, ConvertError::Download { .. }));
        }
    }
}
