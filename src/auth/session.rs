use tracing::{debug, warn};

use crate::common::client::client::BiliClient;
use crate::common::client::error::ApiError;
use crate::common::client::models::{CommonResponse, NavData};

const NAV_URL: &str = "https://api.bilibili.com/x/web-interface/nav";

/// 认证会话。Cookie的获取（浏览器登录、扫码等）在本工具之外完成，
/// 这里只负责把现成的cookie字符串装进客户端并验证有效性
pub struct AuthSession {
    client: BiliClient,
}

impl AuthSession {
    /// 用浏览器复制的cookie字符串构造会话
    pub fn from_cookie_str(cookie_str: &str) -> Result<Self, ApiError> {
        let client = BiliClient::new()?;
        client.set_cookies_from_str(cookie_str)?;

        if client.cookie_value("bili_jct").is_none() {
            warn!("Cookie中缺少 bili_jct 字段，课件下载将不可用");
        }

        Ok(Self { client })
    }

    /// 检查登录状态，成功时返回用户名
    pub async fn check_login(&self) -> Result<String, ApiError> {
        let resp = self
            .client
            .get::<CommonResponse<NavData>>(NAV_URL)
            .await?;

        debug!("登录状态响应: {:?}", resp);

        match resp.data {
            Some(nav) if nav.is_login => Ok(nav.uname),
            _ => Err(ApiError::AuthRequired),
        }
    }

    /// 认证后的客户端，所有组件只读共享这一份
    pub fn client(&self) -> BiliClient {
        self.client.clone()
    }
}
