//! HTTP download functionality
//!
//! Fetches a remote file into a destination directory. A local copy is kept
//! when its size matches the remote content length and its modification time
//! matches the remote `Last-Modified` header (or the remote time is unknown).

use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::DownloadError;

/// Outcome of a single download
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched {
    /// File was transferred
    Transferred { path: PathBuf, size: u64 },
    /// Existing local file was kept
    Kept { path: PathBuf },
}

impl Fetched {
    /// Path of the local file
    pub fn path(&self) -> &Path {
        match self {
            Self::Transferred { path, .. } | Self::Kept { path } => path,
        }
    }
}

/// Extract the last path element of the URI, without query or fragment
pub fn file_name(uri: &str) -> Result<String, DownloadError> {
    let url = reqwest::Url::parse(uri).map_err(|e| DownloadError::InvalidUri {
        uri: uri.to_string(),
        error: e.to_string(),
    })?;
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .ok_or_else(|| DownloadError::InvalidUri {
            uri: uri.to_string(),
            error: "no file name in path".to_string(),
        })
}

/// Parse an HTTP date as used by `Last-Modified`
pub fn parse_http_date(value: &str) -> Option<SystemTime> {
    let date = chrono::DateTime::parse_from_rfc2822(value).ok()?;
    let seconds = u64::try_from(date.timestamp()).ok()?;
    Some(SystemTime::UNIX_EPOCH + Duration::from_secs(seconds))
}

/// Downloader honoring the offline mode
#[derive(Debug, Clone)]
pub struct Downloader {
    client: reqwest::Client,
    offline: bool,
}

impl Downloader {
    /// Create a downloader
    pub fn new(offline: bool) -> Result<Self, DownloadError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DownloadError::Client {
                error: e.to_string(),
            })?;
        Ok(Self { client, offline })
    }

    /// Whether network access is disabled
    pub fn is_offline(&self) -> bool {
        self.offline
    }

    /// Download `uri` into `destination/<file name>`
    pub async fn download(&self, uri: &str, destination: &Path) -> Result<Fetched, DownloadError> {
        debug!("Downloading {uri}...");
        let target = destination.join(file_name(uri)?);
        if self.offline {
            if target.exists() {
                debug!("Offline mode is active and target already exists.");
                return Ok(Fetched::Kept { path: target });
            }
            return Err(DownloadError::OfflineMissing { path: target });
        }

        tokio::fs::create_dir_all(destination)
            .await
            .map_err(|e| io_error(destination, &e))?;

        let response = self
            .client
            .get(uri)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| DownloadError::Network {
                uri: uri.to_string(),
                error: e.to_string(),
            })?;

        let remote_modified = response
            .headers()
            .get(reqwest::header::LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_http_date);
        let content_length = response.content_length();

        if target.exists() && local_matches(&target, remote_modified, content_length) {
            debug!("Local and remote file attributes seem to match.");
            return Ok(Fetched::Kept { path: target });
        }

        debug!("Transferring {uri}...");
        let mut file = File::create(&target).await.map_err(|e| io_error(&target, &e))?;
        let mut size: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| DownloadError::Network {
                uri: uri.to_string(),
                error: e.to_string(),
            })?;
            file.write_all(&chunk).await.map_err(|e| io_error(&target, &e))?;
            size += chunk.len() as u64;
        }
        file.flush().await.map_err(|e| io_error(&target, &e))?;
        drop(file);

        if let Some(modified) = remote_modified {
            set_modified(&target, modified)?;
        }
        info!("Downloaded {} successfully.", target.display());
        debug!(" o Size -> {size} bytes");
        Ok(Fetched::Transferred { path: target, size })
    }
}

fn local_matches(target: &Path, remote_modified: Option<SystemTime>, content_length: Option<u64>) -> bool {
    let Ok(metadata) = std::fs::metadata(target) else {
        return false;
    };
    let time_matches = match remote_modified {
        None => true,
        Some(remote) => metadata.modified().is_ok_and(|local| same_second(local, remote)),
    };
    time_matches && content_length == Some(metadata.len())
}

fn same_second(a: SystemTime, b: SystemTime) -> bool {
    let seconds = |t: SystemTime| t.duration_since(SystemTime::UNIX_EPOCH).map(|d| d.as_secs()).ok();
    seconds(a) == seconds(b)
}

fn set_modified(path: &Path, time: SystemTime) -> Result<(), DownloadError> {
    std::fs::File::options()
        .write(true)
        .open(path)
        .and_then(|file| file.set_modified(time))
        .map_err(|e| io_error(path, &e))
}

fn io_error(path: &Path, error: &std::io::Error) -> DownloadError {
    DownloadError::Io {
        path: path.to_path_buf(),
        error: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LAST_MODIFIED: &str = "Tue, 15 Nov 1994 08:12:31 GMT";

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("https://host/a/b/tool-1.0.jar").unwrap(), "tool-1.0.jar");
        assert_eq!(file_name("https://host/x.jar?download=1#top").unwrap(), "x.jar");
        assert!(file_name("https://host/").is_err());
        assert!(file_name("not a uri").is_err());
    }

    #[test]
    fn test_parse_http_date() {
        let time = parse_http_date(LAST_MODIFIED).unwrap();
        let seconds = time.duration_since(SystemTime::UNIX_EPOCH).unwrap().as_secs();
        assert_eq!(seconds, 784_887_151);
        assert!(parse_http_date("yesterday").is_none());
    }

    #[test]
    fn test_new_reports_offline_mode() {
        assert!(Downloader::new(true).unwrap().is_offline());
        assert!(!Downloader::new(false).unwrap().is_offline());
    }

    #[tokio::test]
    async fn test_offline_missing_target_fails() {
        let temp = TempDir::new().unwrap();
        let downloader = Downloader::new(true).unwrap();
        let result = downloader.download("https://host/x.jar", temp.path()).await;
        assert!(matches!(result, Err(DownloadError::OfflineMissing { .. })));
    }

    #[tokio::test]
    async fn test_offline_existing_target_is_kept() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("x.jar"), "cached").unwrap();
        let downloader = Downloader::new(true).unwrap();
        let fetched = downloader.download("https://host/x.jar", temp.path()).await.unwrap();
        assert_eq!(fetched, Fetched::Kept { path: temp.path().join("x.jar") });
    }

    #[tokio::test]
    async fn test_download_transfers_and_sets_time() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/lib/x.jar"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(b"jar-content".to_vec())
                    .insert_header("Last-Modified", LAST_MODIFIED),
            )
            .mount(&server)
            .await;

        let temp = TempDir::new().unwrap();
        let downloader = Downloader::new(false).unwrap();
        let uri = format!("{}/lib/x.jar", server.uri());

        let fetched = downloader.download(&uri, temp.path()).await.unwrap();
        let target = temp.path().join("x.jar");
        assert_eq!(fetched, Fetched::Transferred { path: target.clone(), size: 11 });
        assert_eq!(std::fs::read(&target).unwrap(), b"jar-content");
        let modified = std::fs::metadata(&target).unwrap().modified().unwrap();
        assert!(same_second(modified, parse_http_date(LAST_MODIFIED).unwrap()));

        let again = downloader.download(&uri, temp.path()).await.unwrap();
        assert_eq!(again, Fetched::Kept { path: target });
    }

    #[tokio::test]
    async fn test_download_replaces_differing_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/y.jar"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"new".to_vec()))
            .mount(&server)
            .await;

        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("y.jar"), "old-and-longer").unwrap();
        let downloader = Downloader::new(false).unwrap();
        let fetched = downloader
            .download(&format!("{}/y.jar", server.uri()), temp.path())
            .await
            .unwrap();
        assert!(matches!(fetched, Fetched::Transferred { size: 3, .. }));
        assert_eq!(std::fs::read(temp.path().join("y.jar")).unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_download_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let temp = TempDir::new().unwrap();
        let downloader = Downloader::new(false).unwrap();
        let result = downloader
            .download(&format!("{}/missing.jar", server.uri()), temp.path())
            .await;
        assert!(matches!(result, Err(DownloadError::Network { .. })));
        assert!(!temp.path().join("missing.jar").exists());
    }
}
