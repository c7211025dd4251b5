use clap::Parser;
use std::path::PathBuf;

/// B站已购课程批量下载工具
#[derive(Parser, Debug)]
#[command(name = "bilicoursedl")]
#[command(version)]
#[command(about = "批量下载B站已购课程的视频和课件", long_about = None)]
pub struct Cli {
    /// Cookie字符串（从浏览器复制，需包含 SESSDATA 和 bili_jct）
    #[arg(long, value_name = "COOKIE")]
    pub cookie: Option<String>,

    /// 配置文件路径（JSON，含 cookie / download_path 字段）
    #[arg(long, value_name = "FILE")]
    #[arg(default_value = "config.json")]
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// 下载保存目录（优先于配置文件中的 download_path）
    #[arg(long, value_name = "DIR")]
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub output_dir: Option<PathBuf>,

    /// 要下载的课程，如 "all" 或 "1,3,5"（序号以列表输出为准）
    #[arg(long, value_name = "SELECT")]
    #[arg(default_value = "all")]
    pub select: String,

    /// 只列出已购课程，不下载
    #[arg(long)]
    pub list_only: bool,

    /// 跳过课件，只下载视频
    #[arg(long)]
    pub skip_courseware: bool,
}
