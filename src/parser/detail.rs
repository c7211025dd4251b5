use serde_json::Value;
use tracing::debug;

use crate::common::client::client::BiliClient;
use crate::common::client::models::CommonResponse;
use crate::parser::errors::ParseError;
use crate::parser::models::{CourseDetail, PlayUrlData};

const SEASON_URL: &str = "https://api.bilibili.com/pugv/view/web/season";
const PLAY_URL: &str = "https://api.bilibili.com/pugv/player/web/playurl";

/// 课程详情解析器：详情只取一次，单次尝试不重试
pub struct CourseDetailResolver<'a> {
    client: &'a BiliClient,
}

impl<'a> CourseDetailResolver<'a> {
    pub fn new(client: &'a BiliClient) -> Self {
        Self { client }
    }

    /// 获取课程详情。同时保留原始JSON，后续整体落盘为 course_info.json
    pub async fn fetch_detail(&self, season_id: i64) -> Result<(CourseDetail, Value), ParseError> {
        let url = format!("{}?season_id={}", SEASON_URL, season_id);
        let resp = self.client.get::<CommonResponse<Value>>(&url).await?;

        let raw = resp
            .data
            .ok_or_else(|| ParseError::Schema("课程详情响应中没有data字段".to_string()))?;

        let detail: CourseDetail = serde_json::from_value(raw.clone())
            .map_err(|e| ParseError::Schema(format!("课程详情结构匹配失败: {}", e)))?;

        debug!(
            "课程 ss{} 详情: {} 个视频, {} 个课件",
            season_id,
            detail.episodes.len(),
            detail.courseware.len()
        );

        Ok((detail, raw))
    }

    /// 获取单集的播放清单。qn=127 请求最高画质，服务端会自动降级；
    /// fnval=16 要求DASH格式
    pub async fn fetch_play_url(&self, ep_id: i64, cid: i64) -> Result<PlayUrlData, ParseError> {
        let url = format!(
            "{}?ep_id={}&cid={}&qn=127&fnval=16&fourk=1",
            PLAY_URL, ep_id, cid
        );
        let resp = self.client.get::<CommonResponse<PlayUrlData>>(&url).await?;

        resp.data
            .ok_or_else(|| ParseError::Schema("播放地址响应中没有data字段".to_string()))
    }
}
