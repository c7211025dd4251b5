use std::path::PathBuf;

use bili_course_dl::common::client::client::BiliClient;
use bili_course_dl::courseware::{AcquireError, CoursewareAcquirer};
use bili_course_dl::orchestrator::{DownloadOrchestrator, EpisodeOutcome, remove_temp_file};
use bili_course_dl::parser::models::{CoursewareItem, Episode};
use bili_course_dl::post_process::merger::{MediaMerger, MergeError};

fn test_client() -> BiliClient {
    BiliClient::new().unwrap()
}

fn sample_episode() -> Episode {
    Episode {
        id: 100,
        cid: 200,
        title: "第一课".to_string(),
    }
}

#[tokio::test]
async fn test_episode_skips_when_output_exists() {
    let dir = tempfile::tempdir().unwrap();
    let course_dir = dir.path().to_path_buf();

    // 合并输出文件的存在就是完成的证明，第二次跑不应有任何网络或子进程调用
    let output = course_dir.join("01. 第一课.mp4");
    tokio::fs::write(&output, b"fake mp4").await.unwrap();

    let orchestrator = DownloadOrchestrator::new(test_client(), PathBuf::from("."), true);
    let outcome = orchestrator
        .download_episode(&sample_episode(), 1, &course_dir)
        .await
        .unwrap();

    assert_eq!(outcome, EpisodeOutcome::AlreadyExists);
    // 跳过路径上不应产生任何临时文件
    assert!(!course_dir.join("01. 第一课_video.m4s").exists());
    assert!(!course_dir.join("01. 第一课_audio.m4s").exists());

    // 再跑一次，结果一致
    let outcome = orchestrator
        .download_episode(&sample_episode(), 1, &course_dir)
        .await
        .unwrap();
    assert_eq!(outcome, EpisodeOutcome::AlreadyExists);
}

#[tokio::test]
async fn test_episode_failure_leaves_no_temp_files() {
    let dir = tempfile::tempdir().unwrap();
    let course_dir = dir.path().to_path_buf();

    // 模拟上次运行中断残留的临时流文件
    let video_tmp = course_dir.join("01. 第一课_video.m4s");
    let audio_tmp = course_dir.join("01. 第一课_audio.m4s");
    tokio::fs::write(&video_tmp, b"stale video").await.unwrap();
    tokio::fs::write(&audio_tmp, b"stale audio").await.unwrap();

    // 未登录的客户端，清单解析必然失败（网络不可用或接口拒绝）
    let orchestrator = DownloadOrchestrator::new(test_client(), PathBuf::from("."), true);
    let result = orchestrator
        .download_episode(&sample_episode(), 1, &course_dir)
        .await;

    assert!(result.is_err());
    // 无论在哪一步失败，临时流文件都不能留下来
    assert!(!video_tmp.exists());
    assert!(!audio_tmp.exists());
    assert!(!course_dir.join("01. 第一课.mp4").exists());
}

#[tokio::test]
async fn test_mux_failure_cleans_up_temp_streams() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();

    // 假ffmpeg：版本检查通过，合并调用失败，
    // 用来触发"已安装但合并失败"这条路径
    let stub = dir.path().join("fake_ffmpeg.sh");
    tokio::fs::write(
        &stub,
        "#!/bin/sh\nif [ \"$1\" = \"-version\" ]; then exit 0; fi\necho '合并出错' >&2\nexit 1\n",
    )
    .await
    .unwrap();
    let mut perms = tokio::fs::metadata(&stub).await.unwrap().permissions();
    perms.set_mode(0o755);
    tokio::fs::set_permissions(&stub, perms).await.unwrap();

    let video_tmp = dir.path().join("01. 第一课_video.m4s");
    let audio_tmp = dir.path().join("01. 第一课_audio.m4s");
    let output = dir.path().join("01. 第一课.mp4");
    tokio::fs::write(&video_tmp, b"v").await.unwrap();
    tokio::fs::write(&audio_tmp, b"a").await.unwrap();

    // SAFETY: 本测试二进制里只有这一个用例读写FFMPEG_PATH
    unsafe { std::env::set_var("FFMPEG_PATH", &stub) };
    let result = MediaMerger::merge_av(&video_tmp, &audio_tmp, &output).await;
    unsafe { std::env::remove_var("FFMPEG_PATH") };

    // 版本检查过了之后的失败必须归为合并失败，而不是未安装
    assert!(matches!(result, Err(MergeError::FfmpegFailed(_))));
    assert!(!output.exists());

    // 合并失败后走与单集下载相同的收尾：无条件清掉两个临时流文件
    remove_temp_file(&video_tmp).await;
    remove_temp_file(&audio_tmp).await;
    assert!(!video_tmp.exists());
    assert!(!audio_tmp.exists());
}

#[tokio::test]
async fn test_courseware_without_csrf_writes_manual_note() {
    let dir = tempfile::tempdir().unwrap();
    let course_dir = dir.path().to_path_buf();

    let item = CoursewareItem {
        file_id: Some(7),
        file_name: "讲义".to_string(),
    };

    // 客户端没有bili_jct，获取前置条件不满足，应落手动下载说明
    let orchestrator = DownloadOrchestrator::new(test_client(), PathBuf::from("."), false);
    let ok = orchestrator
        .handle_courseware_item(&item, 123, &course_dir)
        .await;

    assert!(!ok);
    let note = course_dir.join("courseware/讲义_manual.txt");
    assert!(note.exists());
    let content = tokio::fs::read_to_string(&note).await.unwrap();
    assert!(content.contains("https://www.bilibili.com/cheese/play/ss123"));
}

#[tokio::test]
async fn test_courseware_missing_file_id_is_skipped() {
    let dir = tempfile::tempdir().unwrap();

    let item = CoursewareItem {
        file_id: None,
        file_name: "无ID课件".to_string(),
    };

    let orchestrator = DownloadOrchestrator::new(test_client(), PathBuf::from("."), false);
    let ok = orchestrator
        .handle_courseware_item(&item, 123, dir.path())
        .await;

    assert!(!ok);
    assert!(!dir.path().join("courseware/无ID课件_manual.txt").exists());
}

#[tokio::test]
async fn test_acquire_preconditions_checked_before_network() {
    // 缺CSRF
    let client = test_client();
    let acquirer = CoursewareAcquirer::new(&client);
    assert!(matches!(
        acquirer.acquire(7, 123).await,
        Err(AcquireError::MissingCsrf)
    ));

    // 有CSRF但缺season_id
    let client = test_client();
    client.set_cookies_from_str("bili_jct=token").unwrap();
    let acquirer = CoursewareAcquirer::new(&client);
    assert!(matches!(
        acquirer.acquire(7, 0).await,
        Err(AcquireError::MissingSeasonId)
    ));
}
