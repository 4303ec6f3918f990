//! # gmagic-app
//!
//! General Magic 컴패니언 바이너리 진입점.
//! 설정 로드, 어댑터 와이어링, stdio 호스트 실행, 단발성 CLI 명령.

mod stdio_host;
mod wiring;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use gmagic_core::config::{AppConfig, StorageBackend};
use gmagic_core::config_manager::ConfigManager;
use gmagic_core::models::message::AppMessage;
use gmagic_core::models::settings::SettingsRecord;
use gmagic_core::ports::storage::KeyValueStore;
use gmagic_sync::{outbox, DeviceDispatcher, SettingsEventLoop, SettingsSync, SyncOptions};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::stdio_host::StdioHost;

/// General Magic 워치페이스 설정 브리지
///
/// 저장소, 워치, 설정 페이지 사이에서 사용자 설정을 동기화한다.
#[derive(Parser, Debug)]
#[command(name = "gmagic")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 설정 파일 경로 (기본: 플랫폼별 설정 디렉토리의 config.json)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// 데이터 저장 경로 (SQLite 파일 위치)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// 저장소 백엔드 오버라이드
    #[arg(long, value_enum, global = true)]
    storage: Option<BackendArg>,

    /// 설정 페이지 URL 오버라이드
    #[arg(long, global = true)]
    config_url: Option<String>,

    /// 정시 알림 세기 필드를 송수신하지 않음 (세기 미지원 워치 빌드)
    #[arg(long, global = true)]
    no_chime_strength: bool,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// stdio 호스트 실행 (기본)
    Run,
    /// 현재 설정 출력
    Show,
    /// 설정 페이지 URL 출력
    ConfigUrl,
    /// 설정 페이지 응답 반영
    ApplyWebview {
        /// URL 인코딩된 JSON 응답
        response: String,
    },
    /// 워치 메시지 반영
    ApplyMessage {
        /// JSON 객체 (예: {"TimeFormat":12})
        payload: String,
    },
    /// 기본 설정으로 초기화
    Reset,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum BackendArg {
    Sqlite,
    Memory,
}

impl From<BackendArg> for StorageBackend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Sqlite => StorageBackend::Sqlite,
            BackendArg::Memory => StorageBackend::Memory,
        }
    }
}

/// tracing 초기화 (stdout은 호스트 프로토콜 전용이므로 stderr로 출력)
fn init_tracing(log_level: &str) {
    let log_filter = format!(
        "gmagic={log_level},gmagic_core={log_level},gmagic_storage={log_level},gmagic_sync={log_level}"
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// 설정 파일 로드 + CLI 오버라이드
fn load_config(args: &Args) -> Result<AppConfig> {
    let manager = match &args.config {
        Some(path) => ConfigManager::with_path(path.clone())?,
        None => ConfigManager::new()?,
    };
    info!("설정 파일: {}", manager.config_path().display());

    let mut config = manager.get();
    if let Some(backend) = args.storage {
        config.storage.backend = backend.into();
    }
    if let Some(url) = &args.config_url {
        config.sync.config_url = url.clone();
    }
    if args.no_chime_strength {
        config.sync.track_chime_strength = false;
    }

    config.validate()?;
    Ok(config)
}

/// 단발성 명령이 아웃박스에 남긴 메시지 출력
fn print_outbox(rx: &mut mpsc::UnboundedReceiver<AppMessage>) -> Result<()> {
    while let Ok(message) = rx.try_recv() {
        println!("→ watch: {}", serde_json::to_string(&message)?);
    }
    Ok(())
}

fn print_settings(record: &SettingsRecord) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(record)?);
    Ok(())
}

/// stdio 호스트 실행: 입력이 끝나거나 close 이벤트까지
async fn run_host(
    config: &AppConfig,
    store: Arc<dyn KeyValueStore>,
    options: SyncOptions,
) -> Result<()> {
    let host = Arc::new(StdioHost::stdio());

    let (tx, rx) = outbox();
    let dispatcher = DeviceDispatcher::new(host.clone(), rx).spawn();

    let sync = SettingsSync::new(store, tx, options).with_webview(host.clone());
    let sync = SettingsEventLoop::new(host, sync, config.host.event_buffer)
        .run()
        .await?;

    // 동기화기를 버려야 아웃박스가 닫히고 디스패처가 남은 메시지를 비운다
    drop(sync);
    let stats = dispatcher.await.context("디스패처 태스크 실패")?;
    info!("종료: 워치 전송 성공 {}건, 실패 {}건", stats.sent, stats.failed);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let config = load_config(&args)?;
    let store = wiring::open_store(&config.storage, args.data_dir.as_deref())?;
    let options = SyncOptions::from(&config.sync);

    match args.command.clone().unwrap_or(Command::Run) {
        Command::Run => run_host(&config, store, options).await?,
        Command::Show => {
            let record = SettingsSync::load(store.as_ref(), &options.storage_key);
            print_settings(&record)?;
        }
        Command::ConfigUrl => {
            let (tx, _rx) = outbox();
            let sync = SettingsSync::new(store, tx, options);
            println!("{}", sync.build_config_url());
        }
        Command::ApplyWebview { response } => {
            let (tx, mut rx) = outbox();
            let mut sync = SettingsSync::new(store, tx, options);
            if !sync.apply_webview_result(Some(&response)) {
                eprintln!("⚠️  응답을 반영하지 못했습니다 (로그 참조)");
            }
            print_settings(sync.settings())?;
            print_outbox(&mut rx)?;
        }
        Command::ApplyMessage { payload } => {
            let payload: AppMessage =
                serde_json::from_str(&payload).context("워치 메시지 JSON 파싱 실패")?;
            let (tx, mut rx) = outbox();
            let mut sync = SettingsSync::new(store, tx, options);
            if !sync.apply_device_message(&payload) {
                println!("변경 없음");
            }
            print_settings(sync.settings())?;
            print_outbox(&mut rx)?;
        }
        Command::Reset => {
            let record = SettingsRecord::default();
            store.set_item(&options.storage_key, &record.to_json())?;
            println!("✅ 기본 설정으로 초기화되었습니다.");
            print_settings(&record)?;
        }
    }

    Ok(())
}
