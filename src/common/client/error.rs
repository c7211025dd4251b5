use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("网络请求失败: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("HTTP状态码异常: {0}")]
    BadStatus(reqwest::StatusCode),

    #[error("响应解析失败: {0}")]
    InvalidResponse(String),

    #[error("需要登录认证")]
    AuthRequired,

    #[error("B站 API 错误 (code={0}): {1}")]
    Api(i64, String),
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidResponse(e.to_string())
    }
}
