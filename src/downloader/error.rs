use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("HTTP错误: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP状态码异常: {0}, URL: {1}")]
    BadStatus(reqwest::StatusCode, String),

    #[error("下载流中断: {0}")]
    Stream(String),

    #[error("读超时: {0}秒内未收到新数据")]
    IdleTimeout(u64),
}
