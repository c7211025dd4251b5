use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info};

use bili_course_dl::auth::session::AuthSession;
use bili_course_dl::cli::Cli;
use bili_course_dl::common::config::Config;
use bili_course_dl::common::logger::PrettyLogger;
use bili_course_dl::common::utils::parse_selection;
use bili_course_dl::orchestrator::DownloadOrchestrator;
use bili_course_dl::parser::catalog::{CourseCatalog, DEFAULT_PAGE_SIZE};
use bili_course_dl::{log_error, log_info, log_success, log_warning};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Cli::parse();

    PrettyLogger::title("B站课程批量下载工具");

    // cookie优先取命令行，其次配置文件
    let config = if args.cookie.is_none() || args.output_dir.is_none() {
        Config::load(&args.config).unwrap_or_default()
    } else {
        Config::default()
    };

    let cookie = match args.cookie.as_deref() {
        Some(c) => c.to_string(),
        None if !config.cookie.is_empty() => config.cookie.clone(),
        None => {
            log_error!("缺少Cookie，请通过 --cookie 或 config.json 提供");
            log_info!("获取cookie的方法:");
            println!("  1. 在浏览器中登录B站");
            println!("  2. 按F12打开开发者工具，切换到Network标签并刷新页面");
            println!("  3. 找到任意请求，在Headers中复制完整的Cookie值");
            return Ok(());
        }
    };

    let output_root: PathBuf = args
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.download_path));

    // 建立认证会话
    let session = match AuthSession::from_cookie_str(&cookie) {
        Ok(session) => session,
        Err(e) => {
            log_error!("会话初始化失败: {}", e);
            return Ok(());
        }
    };

    match session.check_login().await {
        Ok(uname) => log_success!("登录成功! 用户名: {}", uname),
        Err(e) => {
            log_error!("未登录或cookie已失效: {}", e);
            log_info!("请确认Cookie包含 SESSDATA、bili_jct、buvid3 等字段");
            return Ok(());
        }
    }

    let client = session.client();

    // 拉取已购课程列表
    info!("正在获取课程列表...");
    let catalog = CourseCatalog::new(&client);
    let courses = catalog.fetch_purchased(DEFAULT_PAGE_SIZE).await;

    if courses.is_empty() {
        log_warning!("未找到已购买的课程");
        return Ok(());
    }

    PrettyLogger::separator();
    PrettyLogger::title("已购买的课程列表");
    for (idx, course) in courses.iter().enumerate() {
        println!(
            "{}. {} (ID: {}, 共 {} 集)",
            idx + 1,
            course.title,
            course.season_id,
            course.ep_count
        );
    }
    PrettyLogger::separator();

    if args.list_only {
        return Ok(());
    }

    let selected = match parse_selection(&args.select, courses.len()) {
        Ok(selected) => selected,
        Err(e) => {
            log_error!("课程选择无效: {}", e);
            return Ok(());
        }
    };
    debug!("选中的课程下标: {:?}", selected);

    let orchestrator =
        DownloadOrchestrator::new(client, output_root, args.skip_courseware);

    // 逐门课程下载，单门失败不影响其余课程
    for (seq, &idx) in selected.iter().enumerate() {
        let course = &courses[idx];
        PrettyLogger::separator();
        log_info!(
            "开始下载课程 {}/{}: {}",
            seq + 1,
            selected.len(),
            course.title
        );

        match orchestrator.run(course).await {
            Ok(summary) => {
                log_success!(
                    "课程 '{}' 完成: 视频 {}/{} 成功, 课件 {}/{} 成功",
                    course.title,
                    summary.episodes_ok,
                    summary.episodes_total,
                    summary.courseware_ok,
                    summary.courseware_total
                );
            }
            Err(e) => {
                log_error!("课程 '{}' 下载失败: {}", course.title, e);
            }
        }
    }

    PrettyLogger::separator();
    log_success!("所有课程处理完成!");
    Ok(())
}
