use std::path::{Path, PathBuf};

use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::common::utils::sanitize_filename;

/// 常见课件扩展名，文件名里已经带了就不再猜
const KNOWN_EXTENSIONS: &[&str] = &[
    ".pdf", ".doc", ".docx", ".zip", ".rar", ".ppt", ".pptx",
];

/// 文件名没有扩展名时，从下载URL里猜一个
pub fn apply_extension_guess(file_name: &str, url: &str) -> String {
    let lower = file_name.to_lowercase();
    if KNOWN_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        return file_name.to_string();
    }

    let url_lower = url.to_lowercase();
    for ext in [".pdf", ".zip", ".doc"] {
        if url_lower.contains(ext) {
            return format!("{}{}", file_name, ext);
        }
    }
    file_name.to_string()
}

/// 网盘链接落成文本说明，留给用户手动取回
pub async fn save_cloud_link_note(
    dir: &Path,
    file_name: &str,
    link: &str,
    password: &str,
    provider: &str,
) -> std::io::Result<PathBuf> {
    let safe_name = sanitize_filename(file_name);
    let note_path = dir.join(format!("{}_link.txt", safe_name));

    let mut content = format!("课件名称: {}\n", file_name);
    content.push_str(&format!("网盘类型: {}\n", provider));
    content.push_str(&format!("网盘链接: {}\n", link));
    if !password.is_empty() {
        content.push_str(&format!("提取码: {}\n", password));
    }
    content.push_str("\n请手动下载课件文件\n");

    tokio::fs::write(&note_path, content).await?;
    debug!("网盘链接已保存: {:?}", note_path);
    Ok(note_path)
}

/// 课件接口走不通时的手动下载说明，带课程网页地址和课件ID
pub async fn save_manual_note(
    dir: &Path,
    file_name: &str,
    file_id: i64,
    season_id: i64,
) -> std::io::Result<PathBuf> {
    let safe_name = sanitize_filename(file_name);
    let note_path = dir.join(format!("{}_manual.txt", safe_name));

    let content = format!(
        "课件名称: {}\n\
         课件ID: {}\n\
         课程ID: {}\n\
         \n\
         手动下载方法:\n\
         1. 在浏览器中访问: https://www.bilibili.com/cheese/play/ss{}\n\
         2. 找到课件下载按钮（可能标注为\"附赠课件\"或\"点击下载\"）\n\
         3. 点击下载或复制网盘链接\n",
        file_name, file_id, season_id, season_id
    );

    tokio::fs::write(&note_path, content).await?;
    debug!("手动下载说明已保存: {:?}", note_path);
    Ok(note_path)
}

/// 识别不了的响应对象原样落盘，便于事后人工排查
pub async fn save_raw_info(
    dir: &Path,
    file_name: &str,
    blob: &Value,
) -> std::io::Result<PathBuf> {
    let safe_name = sanitize_filename(file_name);
    let json_path = dir.join(format!("{}_info.json", safe_name));

    let text = serde_json::to_string_pretty(blob).unwrap_or_else(|_| blob.to_string());
    tokio::fs::write(&json_path, text).await?;
    debug!("课件信息已保存: {:?}", json_path);
    Ok(json_path)
}

/// 从原始元数据里尽力找一个可用的下载地址。先看常见字段，
/// 再整体正则扫一遍。不保证找得全，找不到就算了
pub fn extract_embedded_url(blob: &Value) -> Option<String> {
    if let Some(map) = blob.as_object() {
        for key in ["url", "download_url", "link"] {
            if let Some(url) = map.get(key).and_then(|v| v.as_str())
                && url.starts_with("http")
            {
                return Some(url.to_string());
            }
        }
    }

    let text = blob.to_string();
    let re = match Regex::new(r#"https?://[^\s"\\]+"#) {
        Ok(re) => re,
        Err(e) => {
            warn!("URL提取正则构造失败: {}", e);
            return None;
        }
    };
    re.find(&text).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_apply_extension_guess() {
        assert_eq!(
            apply_extension_guess("讲义", "https://cdn/a.pdf?sign=1"),
            "讲义.pdf"
        );
        assert_eq!(
            apply_extension_guess("课件.PDF", "https://cdn/a.zip"),
            "课件.PDF"
        );
        assert_eq!(apply_extension_guess("附件", "https://cdn/a"), "附件");
    }

    #[test]
    fn test_extract_embedded_url_prefers_known_keys() {
        let blob = json!({"note": "见 https://other/x", "url": "https://cdn/real.pdf"});
        assert_eq!(
            extract_embedded_url(&blob),
            Some("https://cdn/real.pdf".to_string())
        );
    }

    #[test]
    fn test_extract_embedded_url_falls_back_to_regex() {
        let blob = json!({"detail": {"inner": "地址是 https://cdn/deep.zip 这个"}});
        assert_eq!(
            extract_embedded_url(&blob),
            Some("https://cdn/deep.zip".to_string())
        );
        assert_eq!(extract_embedded_url(&json!({"a": 1})), None);
    }

    #[tokio::test]
    async fn test_save_cloud_link_note() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_cloud_link_note(dir.path(), "讲义/第1章", "https://pan/s/1", "abcd", "百度网盘")
            .await
            .unwrap();

        assert_eq!(path.file_name().unwrap(), "讲义_第1章_link.txt");
        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(content.contains("https://pan/s/1"));
        assert!(content.contains("提取码: abcd"));
    }

    #[tokio::test]
    async fn test_save_manual_note_contains_course_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_manual_note(dir.path(), "附件", 42, 999).await.unwrap();

        assert_eq!(path.file_name().unwrap(), "附件_manual.txt");
        let content = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(content.contains("https://www.bilibili.com/cheese/play/ss999"));
        assert!(content.contains("课件ID: 42"));
    }
}
