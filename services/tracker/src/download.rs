//! Streaming downloads to the work directory.
//!
//! Each file is streamed to a `.partial` file, renamed once complete and
//! removed if the stream fails, so a truncated GRIB file never sits under
//! the final name. A non-200 response is an error; there is no retry.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use futures::StreamExt;
use reqwest::{header, Client, Response, StatusCode};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

/// Configuration for the download manager.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// HTTP request timeout
    pub request_timeout: Duration,
    /// Directory for downloaded files
    pub output_dir: PathBuf,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(120),
            output_dir: PathBuf::from("work"),
        }
    }
}

/// Fetches files over HTTP into `output_dir`.
pub struct DownloadManager {
    client: Client,
    config: DownloadConfig,
}

impl DownloadManager {
    pub fn new(config: DownloadConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(Duration::from_secs(30))
            .tcp_nodelay(true)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    pub fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }

    /// Download `url` to `output_dir/filename`, replacing any earlier copy.
    ///
    /// Returns the path to the completed download.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn download(&self, url: &str, filename: &str) -> Result<PathBuf> {
        let final_path = self.config.output_dir.join(filename);
        self.download_to(url, &final_path).await?;
        Ok(final_path)
    }

    /// Return `path` if it already exists, otherwise download `url` there.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch_cached(&self, url: &str, path: &Path) -> Result<PathBuf> {
        if fs::try_exists(path).await.unwrap_or(false) {
            debug!(path = %path.display(), "Using cached file");
            return Ok(path.to_path_buf());
        }
        self.download_to(url, path).await?;
        Ok(path.to_path_buf())
    }

    async fn download_to(&self, url: &str, final_path: &Path) -> Result<()> {
        if let Some(parent) = final_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let temp_path = partial_path(final_path);

        info!(url = %url, path = %final_path.display(), "Starting download");

        let response = self.client.get(url).send().await.context("HTTP request failed")?;
        match response.status() {
            StatusCode::OK => {}
            status => return Err(anyhow!("HTTP error: {}", status)),
        }

        let expected = response
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());

        let written = match stream_to_file(response, &temp_path).await {
            Ok(written) => written,
            Err(e) => {
                fs::remove_file(&temp_path).await.ok();
                return Err(e);
            }
        };
        if let Some(expected) = expected {
            if written != expected {
                fs::remove_file(&temp_path).await.ok();
                return Err(anyhow!(
                    "Download size mismatch: expected {} bytes, got {}",
                    expected,
                    written
                ));
            }
        }

        fs::rename(&temp_path, final_path)
            .await
            .with_context(|| format!("Failed to move download to {}", final_path.display()))?;

        info!(path = %final_path.display(), bytes = written, "Download completed");
        Ok(())
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

/// Stream the response body to `path`, returning the number of bytes written.
async fn stream_to_file(response: Response, path: &Path) -> Result<u64> {
    let mut file = File::create(path)
        .await
        .context("Failed to open output file")?;

    let mut stream = response.bytes_stream();
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("Error reading response chunk")?;
        file.write_all(&chunk)
            .await
            .context("Error writing to file")?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    file.sync_all().await?;
    debug!(path = %path.display(), bytes = written, "Stream finished");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_path() {
        assert_eq!(
            partial_path(Path::new("work/gdas.grib2")),
            PathBuf::from("work/gdas.grib2.partial")
        );
        assert_eq!(partial_path(Path::new("africa.geojson")), PathBuf::from("africa.geojson.partial"));
    }

    #[tokio::test]
    async fn test_fetch_cached_skips_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("africa.geojson");
        std::fs::write(&path, "{}").unwrap();

        let manager = DownloadManager::new(DownloadConfig {
            output_dir: dir.path().to_path_buf(),
            ..Default::default()
        })
        .unwrap();
        // The URL is never contacted because the file is already there.
        let got = manager.fetch_cached("http://127.0.0.1:9/unreachable", &path).await.unwrap();
        assert_eq!(got, path);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let manager = DownloadManager::new(DownloadConfig {
            request_timeout: Duration::from_secs(5),
            output_dir: dir.path().to_path_buf(),
        })
        .unwrap();
        let result = manager.download("http://127.0.0.1:9/file", "file.grib2").await;
        assert!(result.is_err());
        assert!(!dir.path().join("file.grib2").exists());
    }

    #[tokio::test]
    async fn test_truncated_body_leaves_no_partial_file() {
        use tokio::io::AsyncReadExt;
        use tokio::net::TcpListener;

        // Announces 100 bytes, sends 5, then closes the connection.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\nshort")
                .await
                .unwrap();
            socket.shutdown().await.ok();
        });

        let dir = tempfile::tempdir().unwrap();
        let manager = DownloadManager::new(DownloadConfig {
            request_timeout: Duration::from_secs(5),
            output_dir: dir.path().to_path_buf(),
        })
        .unwrap();
        let result = manager
            .download(&format!("http://{}/gdas.grib2", addr), "gdas.grib2")
            .await;
        server.await.unwrap();

        assert!(result.is_err());
        assert!(!dir.path().join("gdas.grib2").exists());
        assert!(!dir.path().join("gdas.grib2.partial").exists());
    }
}
