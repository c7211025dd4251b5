use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::common::client::client::BiliClient;
use crate::common::utils::sanitize_filename;
use crate::courseware::{AcquisitionResult, CoursewareAcquirer, artifacts};
use crate::downloader::core::ChunkedDownloader;
use crate::downloader::error::DownloadError;
use crate::parser::detail::CourseDetailResolver;
use crate::parser::errors::ParseError;
use crate::parser::models::{Course, CoursewareItem, Episode};
use crate::parser::stream_selector::StreamSelector;
use crate::post_process::merger::{MediaMerger, MergeError};
use crate::{log_step, log_success, log_warning};

/// 二进制传输（视频流、课件文件）的读超时，秒。
/// 超过这个时间没收到新数据才算失败，传输总时长不限
const TRANSFER_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    Parse(#[from] ParseError),

    #[error("{0}")]
    Download(#[from] DownloadError),

    #[error("{0}")]
    Merge(#[from] MergeError),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
}

/// 单集下载的结果：新下载完成，或输出文件已存在直接跳过
#[derive(Debug, PartialEq, Eq)]
pub enum EpisodeOutcome {
    Downloaded,
    AlreadyExists,
}

/// 一门课程跑完后的统计
#[derive(Debug, Default)]
pub struct CourseSummary {
    pub episodes_ok: usize,
    pub episodes_total: usize,
    pub courseware_ok: usize,
    pub courseware_total: usize,
}

/// 按课程驱动整个下载流水线：详情 -> 课件循环 -> 视频循环。
/// 单个视频或课件失败只影响自己，不中断整门课程
pub struct DownloadOrchestrator {
    client: BiliClient,
    output_root: PathBuf,
    skip_courseware: bool,
}

impl DownloadOrchestrator {
    pub fn new(client: BiliClient, output_root: PathBuf, skip_courseware: bool) -> Self {
        Self {
            client,
            output_root,
            skip_courseware,
        }
    }

    /// 下载一门课程的全部内容。课程详情拿不到时整门课程失败，
    /// 由调用方决定是否继续批次里的下一门
    pub async fn run(&self, course: &Course) -> Result<CourseSummary, PipelineError> {
        let resolver = CourseDetailResolver::new(&self.client);
        let (detail, raw_detail) = resolver.fetch_detail(course.season_id).await?;

        let course_dir = self.output_root.join(sanitize_filename(&course.title));
        tokio::fs::create_dir_all(&course_dir).await?;

        // 课程元数据整体落盘
        let info_path = course_dir.join("course_info.json");
        let info_text = serde_json::to_string_pretty(&raw_detail)
            .unwrap_or_else(|_| raw_detail.to_string());
        tokio::fs::write(&info_path, info_text).await?;

        let mut summary = CourseSummary {
            episodes_total: detail.episodes.len(),
            courseware_total: detail.courseware.len(),
            ..Default::default()
        };

        if !detail.courseware.is_empty() && !self.skip_courseware {
            log_step!("发现 {} 个课件，开始下载...", detail.courseware.len());
            for (idx, item) in detail.courseware.iter().enumerate() {
                info!(
                    "[{}/{}] 正在处理课件: {}",
                    idx + 1,
                    detail.courseware.len(),
                    item.file_name
                );
                if self
                    .handle_courseware_item(item, course.season_id, &course_dir)
                    .await
                {
                    summary.courseware_ok += 1;
                }
            }
            log_success!(
                "课件处理完成: {}/{} 成功",
                summary.courseware_ok,
                summary.courseware_total
            );
        } else if self.skip_courseware {
            summary.courseware_total = 0;
        }

        for (idx, episode) in detail.episodes.iter().enumerate() {
            let number = idx + 1;
            log_step!("准备下载: {:02}. {}", number, episode.title);

            match self.download_episode(episode, number, &course_dir).await {
                Ok(EpisodeOutcome::Downloaded) => {
                    summary.episodes_ok += 1;
                    log_success!("第 {} 集下载完成", number);
                }
                Ok(EpisodeOutcome::AlreadyExists) => {
                    summary.episodes_ok += 1;
                    log_success!("第 {} 集已存在，跳过", number);
                }
                Err(e) => {
                    log_warning!("第 {} 集下载失败: {}", number, e);
                }
            }
        }

        Ok(summary)
    }

    /// 单集流水线：幂等检查 -> 清单解析 -> 选流 -> 两路下载 -> 合并。
    /// 合并输出文件存在即视为这一集完成，不看任何其他信号。
    /// 两个临时流文件在返回前一定被删掉，无论成败
    pub async fn download_episode(
        &self,
        episode: &Episode,
        number: usize,
        course_dir: &Path,
    ) -> Result<EpisodeOutcome, PipelineError> {
        let base_name = format!("{:02}. {}", number, sanitize_filename(&episode.title));
        let output_path = course_dir.join(format!("{}.mp4", base_name));

        // 幂等检查放在一切网络调用之前
        if output_path.exists() {
            info!("文件已存在，跳过: {:?}", output_path);
            return Ok(EpisodeOutcome::AlreadyExists);
        }

        let video_tmp = course_dir.join(format!("{}_video.m4s", base_name));
        let audio_tmp = course_dir.join(format!("{}_audio.m4s", base_name));

        let result = self
            .fetch_and_merge(episode, &video_tmp, &audio_tmp, &output_path)
            .await;

        // 临时流文件的清理不依赖上面的结果
        remove_temp_file(&video_tmp).await;
        remove_temp_file(&audio_tmp).await;

        result.map(|_| EpisodeOutcome::Downloaded)
    }

    async fn fetch_and_merge(
        &self,
        episode: &Episode,
        video_tmp: &Path,
        audio_tmp: &Path,
        output_path: &Path,
    ) -> Result<(), PipelineError> {
        let resolver = CourseDetailResolver::new(&self.client);
        let play_info = resolver.fetch_play_url(episode.id, episode.cid).await?;
        let (video_url, audio_url) = StreamSelector::select_best(&play_info)?;

        let downloader = ChunkedDownloader::new(&self.client);

        info!("下载视频流...");
        downloader
            .fetch(
                &video_url,
                video_tmp,
                BiliClient::download_headers(),
                TRANSFER_TIMEOUT_SECS,
            )
            .await?;

        info!("下载音频流...");
        downloader
            .fetch(
                &audio_url,
                audio_tmp,
                BiliClient::download_headers(),
                TRANSFER_TIMEOUT_SECS,
            )
            .await?;

        info!("合并视频和音频...");
        MediaMerger::merge_av(video_tmp, audio_tmp, output_path).await?;

        Ok(())
    }

    /// 处理单个课件，返回是否算作成功。
    /// 拿不到下载方式时落一份手动下载说明，不算成功但也不报错
    pub async fn handle_courseware_item(
        &self,
        item: &CoursewareItem,
        season_id: i64,
        course_dir: &Path,
    ) -> bool {
        let courseware_dir = course_dir.join("courseware");
        if let Err(e) = tokio::fs::create_dir_all(&courseware_dir).await {
            warn!("创建课件目录失败: {}", e);
            return false;
        }

        let Some(file_id) = item.file_id else {
            warn!("课件缺少file_id，跳过: {}", item.file_name);
            return false;
        };

        let acquirer = CoursewareAcquirer::new(&self.client);
        match acquirer.acquire(file_id, season_id).await {
            Ok(AcquisitionResult::DirectFile { url }) => {
                self.download_courseware_file(&url, &courseware_dir, &item.file_name)
                    .await
            }
            Ok(AcquisitionResult::CloudLink {
                link,
                password,
                provider,
            }) => {
                info!("课件为网盘链接: {}", link);
                artifacts::save_cloud_link_note(
                    &courseware_dir,
                    &item.file_name,
                    &link,
                    &password,
                    &provider,
                )
                .await
                .map_err(|e| warn!("保存网盘链接失败: {}", e))
                .is_ok()
            }
            Ok(AcquisitionResult::RawMetadata(blob)) => {
                if artifacts::save_raw_info(&courseware_dir, &item.file_name, &blob)
                    .await
                    .is_err()
                {
                    return false;
                }
                // 尽力从元数据里挖一个链接出来试试
                if let Some(url) = artifacts::extract_embedded_url(&blob) {
                    debug!("从元数据中提取到链接: {}", url);
                    self.download_courseware_file(&url, &courseware_dir, &item.file_name)
                        .await;
                }
                true
            }
            Err(e) => {
                warn!("获取课件下载方式失败: {}", e);
                if let Err(e) =
                    artifacts::save_manual_note(&courseware_dir, &item.file_name, file_id, season_id)
                        .await
                {
                    warn!("保存手动下载说明失败: {}", e);
                }
                info!("已保存课件信息，请稍后在浏览器中手动下载");
                false
            }
        }
    }

    /// 直接下载课件文件，目标已存在则跳过
    async fn download_courseware_file(&self, url: &str, dir: &Path, file_name: &str) -> bool {
        let named = artifacts::apply_extension_guess(file_name, url);
        let target = dir.join(sanitize_filename(&named));

        if target.exists() {
            info!("文件已存在: {:?}", target);
            return true;
        }

        info!("下载中: {:?}", target);
        let downloader = ChunkedDownloader::new(&self.client);
        match downloader
            .fetch(
                url,
                &target,
                BiliClient::download_headers(),
                TRANSFER_TIMEOUT_SECS,
            )
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!("课件下载失败: {}", e);
                false
            }
        }
    }
}

/// 删除临时流文件，文件不存在时静默跳过
pub async fn remove_temp_file(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!("已删除临时文件: {:?}", path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("删除临时文件失败: {:?}: {}", path, e),
    }
}
