use tracing::debug;

use crate::parser::errors::ParseError;
use crate::parser::models::PlayUrlData;

/// 从播放清单中选出要下载的音视频流
pub struct StreamSelector;

impl StreamSelector {
    /// 平台返回的清单按画质从高到低排序，直接取各列表的第一项。
    /// 这个排序约定未经独立验证，这里保持原样，不做客户端重排
    pub fn select_best(play_info: &PlayUrlData) -> Result<(String, String), ParseError> {
        let dash = play_info
            .dash
            .as_ref()
            .ok_or(ParseError::Schema("播放清单中没有DASH数据".to_string()))?;

        let video = dash.video.first().ok_or(ParseError::MissingStream("视频"))?;
        let audio = dash.audio.first().ok_or(ParseError::MissingStream("音频"))?;

        debug!(
            "视频画质: {} - {}x{}",
            video.id, video.width, video.height
        );

        let video_url = video
            .source_url()
            .ok_or_else(|| ParseError::Schema("视频流缺少可用的URL字段".to_string()))?;
        let audio_url = audio
            .source_url()
            .ok_or_else(|| ParseError::Schema("音频流缺少可用的URL字段".to_string()))?;

        Ok((video_url.to_string(), audio_url.to_string()))
    }
}
