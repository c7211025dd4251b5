use serde_derive::Deserialize;

/// B站接口的通用外层结构
#[derive(Debug, Deserialize)]
pub struct CommonResponse<T> {
    pub code: i64,

    #[serde(default)]
    pub message: String,

    pub data: Option<T>,
}

/// 登录状态响应（x/web-interface/nav）
#[derive(Debug, Deserialize)]
pub struct NavData {
    #[serde(rename = "isLogin")]
    pub is_login: bool,

    #[serde(default)]
    pub uname: String,
}
