use serde_derive::Deserialize;

/// 已购课程列表中的一项（归一化后）
#[derive(Debug, Clone)]
pub struct Course {
    pub season_id: i64,
    pub title: String,
    pub ep_count: i64,
    pub cover: String,
}

/// 已购课程接口的内层数据，注意列表在 data.data 里（双层data）
#[derive(Debug, Deserialize)]
pub struct PaidPage {
    #[serde(default)]
    pub data: Vec<PaidItem>,

    #[serde(default)]
    pub total: i64,
}

#[derive(Debug, Deserialize)]
pub struct PaidItem {
    /// 该接口返回的是 id 字段，个别版本用 season_id
    pub id: Option<i64>,
    pub season_id: Option<i64>,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub ep_count: i64,

    #[serde(default)]
    pub cover: String,
}

impl PaidItem {
    pub fn effective_season_id(&self) -> Option<i64> {
        self.id.or(self.season_id)
    }
}

/// 课程详情：视频集列表 + 课件列表
#[derive(Debug, Deserialize)]
pub struct CourseDetail {
    #[serde(default)]
    pub episodes: Vec<Episode>,

    /// 课件列表在详情的 courses 字段里
    #[serde(default, rename = "courses")]
    pub courseware: Vec<CoursewareItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Episode {
    /// ep_id
    pub id: i64,
    pub cid: i64,

    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoursewareItem {
    pub file_id: Option<i64>,

    #[serde(default)]
    pub file_name: String,
}

/// 播放地址接口返回的数据
#[derive(Debug, Clone, Deserialize)]
pub struct PlayUrlData {
    pub dash: Option<DashInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashInfo {
    #[serde(default)]
    pub video: Vec<DashItem>,

    #[serde(default)]
    pub audio: Vec<DashItem>,
}

/// DASH流描述。不同API版本的URL字段名存在漂移，
/// 按 baseUrl > base_url > url 的固定顺序取第一个非空值
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashItem {
    #[serde(default)]
    pub id: i64,

    #[serde(default, rename = "baseUrl")]
    pub base_url_camel: Option<String>,

    #[serde(default, rename = "base_url")]
    pub base_url: Option<String>,

    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub width: i64,

    #[serde(default)]
    pub height: i64,
}

impl DashItem {
    pub fn source_url(&self) -> Option<&str> {
        [
            self.base_url_camel.as_deref(),
            self.base_url.as_deref(),
            self.url.as_deref(),
        ]
        .into_iter()
        .flatten()
        .find(|u| !u.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_url_alias_order() {
        let item = DashItem {
            base_url_camel: Some("https://a/camel".to_string()),
            base_url: Some("https://a/snake".to_string()),
            url: Some("https://a/plain".to_string()),
            ..Default::default()
        };
        assert_eq!(item.source_url(), Some("https://a/camel"));

        let item = DashItem {
            base_url: Some("https://a/snake".to_string()),
            url: Some("https://a/plain".to_string()),
            ..Default::default()
        };
        assert_eq!(item.source_url(), Some("https://a/snake"));
    }

    #[test]
    fn test_source_url_skips_empty() {
        let item = DashItem {
            base_url_camel: Some(String::new()),
            url: Some("https://a/plain".to_string()),
            ..Default::default()
        };
        assert_eq!(item.source_url(), Some("https://a/plain"));

        let item = DashItem::default();
        assert_eq!(item.source_url(), None);
    }

    #[test]
    fn test_dash_item_deserializes_both_naming_styles() {
        let camel: DashItem =
            serde_json::from_str(r#"{"id": 127, "baseUrl": "https://cdn/v.m4s"}"#).unwrap();
        assert_eq!(camel.source_url(), Some("https://cdn/v.m4s"));

        let snake: DashItem =
            serde_json::from_str(r#"{"id": 127, "base_url": "https://cdn/v.m4s"}"#).unwrap();
        assert_eq!(snake.source_url(), Some("https://cdn/v.m4s"));
    }

    #[test]
    fn test_paid_item_season_id_fallback() {
        let item: PaidItem = serde_json::from_str(r#"{"id": 123, "title": "课程"}"#).unwrap();
        assert_eq!(item.effective_season_id(), Some(123));

        let item: PaidItem =
            serde_json::from_str(r#"{"season_id": 456, "title": "课程"}"#).unwrap();
        assert_eq!(item.effective_season_id(), Some(456));
    }
}
