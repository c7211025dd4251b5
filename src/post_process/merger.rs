use std::path::Path;
use std::process::Stdio;

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, error, info};

/// ffmpeg未安装和合并失败是两类问题：前者要装工具，后者要查输入文件。
/// 错误类型上区分开，调用方不能混为一谈
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("未找到ffmpeg，请安装并加入PATH，或设置环境变量 FFMPEG_PATH")]
    FfmpegNotFound,

    #[error("ffmpeg合并失败: {0}")]
    FfmpegFailed(String),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
}

pub struct MediaMerger;

impl MediaMerger {
    /// 无损合并音视频到一个mp4容器（流复制，不转码），覆盖已存在的输出。
    /// 两个临时流文件的删除由调用方负责，这里不碰
    pub async fn merge_av(
        video_path: &Path,
        audio_path: &Path,
        output_path: &Path,
    ) -> Result<(), MergeError> {
        // 支持环境变量指定ffmpeg路径
        let ffmpeg_cmd = std::env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string());

        debug!("检查系统中是否安装了 ffmpeg...");
        let ffmpeg_check = Command::new(&ffmpeg_cmd)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match ffmpeg_check {
            Ok(status) if status.success() => {}
            _ => {
                error!("未检测到 ffmpeg，无法合并音视频");
                error!("安装方法参考: https://ffmpeg.org/download.html");
                return Err(MergeError::FfmpegNotFound);
            }
        }

        debug!(
            "开始合并: {:?} + {:?} -> {:?}",
            video_path, audio_path, output_path
        );

        let output = Command::new(&ffmpeg_cmd)
            .arg("-i")
            .arg(video_path)
            .arg("-i")
            .arg(audio_path)
            .arg("-c")
            .arg("copy")
            .arg("-y") // 自动覆盖
            .arg(output_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let err_msg = String::from_utf8_lossy(&output.stderr);
            error!("ffmpeg 合并失败，错误日志如下:\n{}", err_msg);
            return Err(MergeError::FfmpegFailed(err_msg.to_string()));
        }

        info!("视频与音频合并成功，输出文件: {:?}", output_path);
        Ok(())
    }
}
