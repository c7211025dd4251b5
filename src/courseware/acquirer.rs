use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::common::client::client::BiliClient;
use crate::common::client::error::ApiError;
use crate::common::client::models::CommonResponse;

const DOWNLOAD_API: &str = "https://api.bilibili.com/pugv/app/web/course/download";

/// 课件获取失败都是可恢复错误：调用方落一份手动下载说明后继续处理下一项，
/// 不允许因为单个课件中断整个批次
#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("缺少CSRF token (bili_jct)")]
    MissingCsrf,

    #[error("缺少课程ID (season_id)")]
    MissingSeasonId,

    #[error("网络请求失败: {0}")]
    Network(String),

    #[error("API返回错误: {0}")]
    Api(String),

    #[error("API返回成功但无数据")]
    EmptyData,

    #[error("返回数据格式异常: {0}")]
    Unexpected(String),
}

impl From<ApiError> for AcquireError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Reqwest(e) => AcquireError::Network(e.to_string()),
            ApiError::BadStatus(s) => AcquireError::Network(format!("HTTP状态码 {}", s)),
            ApiError::Api(code, msg) => AcquireError::Api(format!("code={}: {}", code, msg)),
            ApiError::InvalidResponse(msg) => AcquireError::Unexpected(msg),
            ApiError::AuthRequired => AcquireError::Api("需要登录认证".to_string()),
        }
    }
}

/// 课件接口的data字段是多态的，解码成显式的标签联合，
/// 识别不了的对象一律落入 RawMetadata，不做猜测
#[derive(Debug, Clone, PartialEq)]
pub enum AcquisitionResult {
    /// 可直接下载的文件链接
    DirectFile { url: String },
    /// 网盘分享链接，留给用户手动取回
    CloudLink {
        link: String,
        password: String,
        provider: String,
    },
    /// 其他对象，原样保留
    RawMetadata(Value),
}

/// 课件获取器：一次表单POST，按响应形状分流
pub struct CoursewareAcquirer<'a> {
    client: &'a BiliClient,
}

impl<'a> CoursewareAcquirer<'a> {
    pub fn new(client: &'a BiliClient) -> Self {
        Self { client }
    }

    /// 获取一个课件的下载方式。csrf和season_id缺任何一个都直接报错，
    /// 不发起网络请求
    pub async fn acquire(
        &self,
        file_id: i64,
        season_id: i64,
    ) -> Result<AcquisitionResult, AcquireError> {
        let csrf = self
            .client
            .cookie_value("bili_jct")
            .ok_or(AcquireError::MissingCsrf)?;
        if season_id <= 0 {
            return Err(AcquireError::MissingSeasonId);
        }

        let url = format!("{}?csrf={}", DOWNLOAD_API, csrf);
        let form = format!(
            "file_id={}&season_id={}&section_id=0&episode_id=0&csrf={}&csource=",
            file_id, season_id, csrf
        );

        let resp = self
            .client
            .post_form::<CommonResponse<Value>>(&url, &form)
            .await?;

        let data = match resp.data {
            Some(Value::Null) | None => return Err(AcquireError::EmptyData),
            Some(data) => data,
        };

        debug!("课件 {} 响应data: {}", file_id, data);
        decode_acquisition(data)
    }
}

/// data字段的多态解码，每种形状一个确定分支：
///   - http开头的字符串         -> 直接下载链接
///   - 带 url / download_url    -> 直接下载链接
///   - 带 link / netdisk        -> 网盘链接
///   - 其他对象                 -> 原始元数据
pub fn decode_acquisition(data: Value) -> Result<AcquisitionResult, AcquireError> {
    match data {
        Value::String(s) => {
            if s.starts_with("http") {
                Ok(AcquisitionResult::DirectFile { url: s })
            } else {
                warn!("课件接口返回了非URL字符串: {}", truncate(&s, 100));
                Err(AcquireError::Unexpected(truncate(&s, 100)))
            }
        }
        Value::Object(map) => {
            if let Some(url) = first_str(&map, &["url", "download_url"]) {
                return Ok(AcquisitionResult::DirectFile {
                    url: url.to_string(),
                });
            }

            if map.contains_key("link") || map.contains_key("netdisk") {
                // 网盘信息可能嵌在netdisk对象里，也可能平铺在外层
                let info = map
                    .get("netdisk")
                    .and_then(|v| v.as_object())
                    .unwrap_or(&map);
                return Ok(AcquisitionResult::CloudLink {
                    link: str_field(info, "link"),
                    password: str_field(info, "password"),
                    provider: {
                        let t = str_field(info, "type");
                        if t.is_empty() { "网盘".to_string() } else { t }
                    },
                });
            }

            Ok(AcquisitionResult::RawMetadata(Value::Object(map)))
        }
        other => Err(AcquireError::Unexpected(format!(
            "未知的数据类型: {}",
            other
        ))),
    }
}

fn first_str<'v>(
    map: &'v serde_json::Map<String, Value>,
    keys: &[&str],
) -> Option<&'v str> {
    keys.iter()
        .filter_map(|k| map.get(*k).and_then(|v| v.as_str()))
        .find(|s| !s.is_empty())
}

fn str_field(map: &serde_json::Map<String, Value>, key: &str) -> String {
    map.get(key)
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

fn truncate(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}
