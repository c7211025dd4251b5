use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::header::HeaderMap;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::common::client::client::BiliClient;
use crate::common::client::error::ApiError;
use crate::downloader::error::DownloadError;

/// 按8KiB为单位做进度统计
const CHUNK_SIZE: usize = 8192;

/// 单文件流式下载器：一个URL写入一个文件，失败时清理半成品。
/// 不做重试，重试策略由调用方决定
pub struct ChunkedDownloader<'a> {
    client: &'a BiliClient,
}

impl<'a> ChunkedDownloader<'a> {
    pub fn new(client: &'a BiliClient) -> Self {
        Self { client }
    }

    /// 流式下载到指定路径。`timeout_secs` 是读超时：连续这么久没收到
    /// 新数据才算失败，整体传输时长不受限制。任何失败（连接、非2xx
    /// 状态码、读超时、写盘）都会删除已写入的部分文件再返回错误
    pub async fn fetch(
        &self,
        url: &str,
        dest: &Path,
        extra_headers: HeaderMap,
        timeout_secs: u64,
    ) -> Result<(), DownloadError> {
        let result = self
            .fetch_inner(url, dest, extra_headers, timeout_secs)
            .await;

        if result.is_err() && dest.exists() {
            debug!("下载失败，清理半成品文件: {:?}", dest);
            if let Err(e) = tokio::fs::remove_file(dest).await {
                warn!("清理半成品文件失败: {:?}: {}", dest, e);
            }
        }

        result
    }

    async fn fetch_inner(
        &self,
        url: &str,
        dest: &Path,
        extra_headers: HeaderMap,
        timeout_secs: u64,
    ) -> Result<(), DownloadError> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let read_timeout = Duration::from_secs(timeout_secs);

        let response = tokio::time::timeout(
            read_timeout,
            self.client.get_raw_response(url, extra_headers),
        )
        .await
        .map_err(|_| DownloadError::IdleTimeout(timeout_secs))?
        .map_err(|e| match e {
            ApiError::Reqwest(err) => DownloadError::Http(err),
            other => DownloadError::Stream(other.to_string()),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::BadStatus(status, url.to_string()));
        }

        let total_size = response
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|ct_len| ct_len.to_str().ok())
            .and_then(|ct_len| ct_len.parse().ok())
            .unwrap_or(0u64);

        let pb = if total_size > 0 {
            let pb = ProgressBar::new(total_size);
            pb.set_style(
                ProgressStyle::with_template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
            );
            Some(pb)
        } else {
            None
        };

        debug!("开始下载: {} -> {:?}", url, dest);

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut downloaded = 0u64;
        let mut since_report = 0usize;

        loop {
            // 逐块计读超时：慢而不断的传输不会被掐，卡住的才会
            let next = tokio::time::timeout(read_timeout, stream.next())
                .await
                .map_err(|_| {
                    if let Some(pb) = &pb {
                        pb.finish_with_message("下载超时");
                    }
                    DownloadError::IdleTimeout(timeout_secs)
                })?;

            let Some(chunk_result) = next else {
                break;
            };

            let chunk = chunk_result.map_err(|e| {
                if let Some(pb) = &pb {
                    pb.finish_with_message("下载失败");
                }
                DownloadError::Stream(e.to_string())
            })?;

            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
            since_report += chunk.len();

            // 每写满一个块刷新一次进度
            if since_report >= CHUNK_SIZE {
                since_report = 0;
                if let Some(pb) = &pb {
                    pb.set_position(downloaded);
                }
            }
        }

        file.flush().await?;

        if let Some(pb) = pb {
            pb.set_position(downloaded);
            pb.finish_with_message("下载完成");
            if total_size > 0 {
                debug!(
                    "下载进度: {:.1}% ({}/{})",
                    downloaded as f64 / total_size as f64 * 100.0,
                    downloaded,
                    total_size
                );
            }
        }

        Ok(())
    }
}
