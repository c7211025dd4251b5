use tracing::{debug, info, warn};

use crate::common::client::client::BiliClient;
use crate::common::client::models::CommonResponse;
use crate::parser::models::{Course, PaidPage};

/// 已购课程列表的默认分页大小
pub const DEFAULT_PAGE_SIZE: usize = 20;

const PAID_LIST_URL: &str = "https://api.bilibili.com/pugv/pay/web/my/paid";

/// 已购课程目录，分页拉取并归一化为 Course 列表
pub struct CourseCatalog<'a> {
    client: &'a BiliClient,
}

impl<'a> CourseCatalog<'a> {
    pub fn new(client: &'a BiliClient) -> Self {
        Self { client }
    }

    /// 分页获取全部已购课程。任何一页失败就停止翻页，
    /// 返回已经拿到的部分（不重试，不中断整个批次）
    pub async fn fetch_purchased(&self, page_size: usize) -> Vec<Course> {
        let mut courses: Vec<Course> = Vec::new();
        let mut page = 1usize;

        loop {
            info!("正在请求第 {} 页...", page);
            let url = format!("{}?pn={}&ps={}", PAID_LIST_URL, page, page_size);

            let resp = match self.client.get::<CommonResponse<PaidPage>>(&url).await {
                Ok(resp) => resp,
                Err(e) => {
                    warn!("获取课程列表失败: {}", e);
                    break;
                }
            };

            let Some(page_data) = resp.data else {
                warn!("课程列表响应中没有data字段");
                break;
            };

            let page_len = page_data.data.len();
            debug!("第 {} 页返回 {} 项, total={}", page, page_len, page_data.total);

            for item in page_data.data {
                let Some(season_id) = item.effective_season_id() else {
                    warn!("课程项缺少id，跳过: {}", item.title);
                    continue;
                };
                courses.push(Course {
                    season_id,
                    title: item.title,
                    ep_count: item.ep_count,
                    cover: item.cover,
                });
            }
            info!("已获取 {} 个课程...", courses.len());

            if last_page_reached(page_len, page_size, courses.len(), page_data.total) {
                break;
            }
            page += 1;
        }

        info!("共获取到 {} 个已购买的课程", courses.len());
        courses
    }
}

/// 翻页终止条件：当前页不满，或累计数量已达到接口声明的总数
fn last_page_reached(page_len: usize, page_size: usize, fetched: usize, total: i64) -> bool {
    page_len < page_size || (total > 0 && fetched as i64 >= total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::models::PaidItem;

    fn page_of(n: usize, start: i64) -> Vec<PaidItem> {
        (0..n)
            .map(|i| PaidItem {
                id: Some(start + i as i64),
                season_id: None,
                title: format!("课程{}", start + i as i64),
                ep_count: 10,
                cover: String::new(),
            })
            .collect()
    }

    /// 用和 fetch_purchased 相同的终止条件在本地页序列上模拟翻页，
    /// 统计实际发出的请求数
    fn simulate(pages: Vec<Vec<PaidItem>>, total: i64, page_size: usize) -> (usize, usize) {
        let mut fetched = 0usize;
        let mut requests = 0usize;

        for page in pages {
            requests += 1;
            let page_len = page.len();
            fetched += page_len;
            if last_page_reached(page_len, page_size, fetched, total) {
                break;
            }
        }
        (fetched, requests)
    }

    #[test]
    fn test_pagination_stops_on_short_page() {
        // total=25, ps=20 -> 两页：20项 + 5项，共两次请求
        let pages = vec![page_of(20, 0), page_of(5, 20), page_of(0, 25)];
        let (fetched, requests) = simulate(pages, 25, 20);
        assert_eq!(fetched, 25);
        assert_eq!(requests, 2);
    }

    #[test]
    fn test_pagination_stops_on_total_without_extra_request() {
        // 累计数正好等于total且最后一页是满页，不应再发一次多余的请求
        let pages = vec![page_of(20, 0), page_of(20, 20), page_of(0, 40)];
        let (fetched, requests) = simulate(pages, 40, 20);
        assert_eq!(fetched, 40);
        assert_eq!(requests, 2);
    }

    #[test]
    fn test_pagination_single_short_page() {
        let pages = vec![page_of(3, 0)];
        let (fetched, requests) = simulate(pages, 3, 20);
        assert_eq!(fetched, 3);
        assert_eq!(requests, 1);
    }

    #[test]
    fn test_pagination_empty_feed() {
        let pages = vec![page_of(0, 0)];
        let (fetched, requests) = simulate(pages, 0, 20);
        assert_eq!(fetched, 0);
        assert_eq!(requests, 1);
    }

    #[test]
    fn test_last_page_predicate() {
        assert!(last_page_reached(5, 20, 25, 25));
        assert!(last_page_reached(20, 20, 20, 20));
        assert!(!last_page_reached(20, 20, 20, 25));
        // total缺失（0）时只看页是否满
        assert!(!last_page_reached(20, 20, 40, 0));
        assert!(last_page_reached(19, 20, 19, 0));
    }
}
