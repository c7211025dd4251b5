use std::path::Path;

use serde_derive::Deserialize;

/// config.json 配置文件，cookie从浏览器复制
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cookie: String,

    #[serde(default = "default_download_path")]
    pub download_path: String,
}

// 手写Default：配置文件不存在时的兜底也要落到默认下载目录，
// 不能给出空字符串把文件下到当前目录
impl Default for Config {
    fn default() -> Self {
        Self {
            cookie: String::new(),
            download_path: default_download_path(),
        }
    }
}

fn default_download_path() -> String {
    "./downloads".to_string()
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = serde_json::from_str(&text)?;
        Ok(config)
    }
}
