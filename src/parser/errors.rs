use thiserror::Error;

use crate::common::client::error::ApiError;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("网络错误: {0}")]
    Network(String),

    #[error("API错误: {0}")]
    Api(String),

    #[error("缺少{0}流")]
    MissingStream(&'static str),

    #[error("响应结构异常: {0}")]
    Schema(String),
}

impl From<ApiError> for ParseError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Reqwest(e) => ParseError::Network(e.to_string()),
            ApiError::BadStatus(s) => ParseError::Network(format!("HTTP状态码 {}", s)),
            ApiError::Api(_, msg) => ParseError::Api(msg),
            ApiError::InvalidResponse(msg) => ParseError::Schema(msg),
            ApiError::AuthRequired => ParseError::Api("需要登录认证".to_string()),
        }
    }
}
