use std::sync::Arc;
use std::time::Duration;

use cookie::Cookie;
use cookie_store::CookieStore;
use reqwest::{
    Client, ClientBuilder, Response, Url,
    header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, HeaderMap, HeaderValue, REFERER, USER_AGENT},
};
use reqwest_cookie_store::CookieStoreMutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use crate::common::client::error::ApiError;

/// 普通接口调用的超时时间
const API_TIMEOUT: Duration = Duration::from_secs(10);

/// 携带Cookie认证状态的客户端，所有模块共享同一份默认请求头
#[derive(Debug, Clone)]
pub struct BiliClient {
    pub inner: Client,
    pub cookie_store: Arc<CookieStoreMutex>,
}

impl BiliClient {
    pub fn new() -> Result<Self, ApiError> {
        let cookie_store = Arc::new(CookieStoreMutex::new(CookieStore::default()));

        // 客户端层面只限制建连时间。接口调用的总超时在各请求上单独设置，
        // 二进制下载则按"多久没收到数据"计超时，长传输不能因为总时长被掐断
        let inner = ClientBuilder::new()
            .connect_timeout(API_TIMEOUT)
            .cookie_provider(Arc::clone(&cookie_store))
            .default_headers(Self::default_headers())
            .build()
            .map_err(|e| {
                error!("创建HTTP客户端失败: {}", e);
                ApiError::Reqwest(e)
            })?;

        Ok(Self {
            inner,
            cookie_store,
        })
    }

    /// 默认请求头只在这里构造一份，避免各模块散落重复的字面量
    pub fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("zh-CN,zh;q=0.9"),
        );
        headers.insert(
            REFERER,
            HeaderValue::from_static("https://www.bilibili.com/"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/135.0.0.0 Safari/537.36"));
        headers
    }

    /// 从浏览器复制的cookie字符串写入Cookie存储，形如 "SESSDATA=xx; bili_jct=yy"
    pub fn set_cookies_from_str(&self, cookie_str: &str) -> Result<(), ApiError> {
        let url = Url::parse("https://www.bilibili.com/")
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;

        let mut store = self
            .cookie_store
            .lock()
            .map_err(|_| ApiError::InvalidResponse("Cookie存储加锁失败".to_string()))?;

        for item in cookie_str.split(';') {
            let item = item.trim();
            let Some((name, value)) = item.split_once('=') else {
                continue;
            };
            let cookie = Cookie::build((name.trim().to_string(), value.trim().to_string()))
                .domain("bilibili.com")
                .path("/")
                .build();
            store
                .insert_raw(&cookie, &url)
                .map_err(|e| ApiError::InvalidResponse(format!("写入Cookie失败: {}", e)))?;
        }

        Ok(())
    }

    /// 按名字取一个Cookie值（比如 bili_jct 作为CSRF token）
    pub fn cookie_value(&self, name: &str) -> Option<String> {
        let store = self.cookie_store.lock().ok()?;
        store
            .iter_any()
            .find(|c| c.name() == name)
            .map(|c| c.value().to_string())
    }

    /// 通用GET请求，按B站格式解析外层code
    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let resp = self.inner.get(url).timeout(API_TIMEOUT).send().await?;
        Self::handle_response::<T>(resp).await
    }

    /// 表单POST请求，body为已编码好的 application/x-www-form-urlencoded 字符串
    pub async fn post_form<T: DeserializeOwned>(
        &self,
        url: &str,
        form: &str,
    ) -> Result<T, ApiError> {
        let resp = self
            .inner
            .post(url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(form.to_string())
            .timeout(API_TIMEOUT)
            .send()
            .await?;
        Self::handle_response(resp).await
    }

    /// 二进制下载用的原始响应，不做JSON解析。
    /// 这里不设总超时，读超时由调用方在逐块读取时控制
    pub async fn get_raw_response(
        &self,
        url: &str,
        extra_headers: HeaderMap,
    ) -> Result<Response, ApiError> {
        let resp = self.inner.get(url).headers(extra_headers).send().await?;
        Ok(resp)
    }

    async fn handle_response<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::BadStatus(status));
        }

        let url = resp.url().to_string();
        let text = resp.text().await?;

        let json_value: Value = serde_json::from_str(&text).map_err(|_| {
            // 不是JSON，多半是风控页或登录页
            if text.contains("<html") {
                ApiError::AuthRequired
            } else {
                ApiError::InvalidResponse(text.chars().take(200).collect())
            }
        })?;

        if let Some(code) = json_value.get("code").and_then(|v| v.as_i64())
            && code != 0
        {
            let message = json_value
                .get("message")
                .and_then(|v| v.as_str())
                .unwrap_or("未知错误")
                .to_string();
            return Err(ApiError::Api(code, message));
        }

        serde_json::from_value::<T>(json_value).map_err(|e| {
            error!("失败的请求的URL: {}", url);
            error!("JSON 结构匹配失败: {}", e);
            debug!("期望的结构可能是: {}", std::any::type_name::<T>());
            ApiError::InvalidResponse(format!("结构匹配失败: {}", e))
        })
    }

    /// 视频/课件等二进制下载所需的额外请求头
    pub fn download_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Origin",
            HeaderValue::from_static("https://www.bilibili.com"),
        );
        headers.insert(
            REFERER,
            HeaderValue::from_static("https://www.bilibili.com/"),
        );
        headers
    }
}
