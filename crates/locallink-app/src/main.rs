//! # locallink-app
//!
//! LocalLink 바이너리 진입점.
//! DI 역할, 라이프사이클 관리, 감지 폴러와 콘솔 셸 오케스트레이션.

mod console;
mod custom_ports;
mod lifecycle;
mod poller;
mod projector;
mod share;

use anyhow::Result;
use clap::Parser;
use directories::ProjectDirs;
use locallink_core::config::AppConfig;
use locallink_core::config_manager::{ConfigManager, CONFIG_FILE_NAME};
use locallink_core::ports::storage::KeyValueStore;
use locallink_network::TcpProbeDetector;
use locallink_storage::{MemoryKvStore, SqliteKvStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::console::Console;
use crate::custom_ports::CustomPortStore;
use crate::lifecycle::LifecycleManager;
use crate::poller::{NetworkInfoPoller, PollerConfig};
use crate::projector::{render, UiStateProjector};
use crate::share::CommandClipboard;

/// LocalLink
///
/// 로컬 개발 서버를 감지하고 같은 네트워크의 기기에서 열 수 있는 URL을 보여준다.
#[derive(Parser, Debug)]
#[command(name = "locallink")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,

    /// 설정 파일 경로 (기본: 플랫폼 설정 디렉토리)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// 데이터 저장 경로 (기본: 플랫폼 데이터 디렉토리)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// 정상 상태 폴링 주기 (밀리초, 설정 파일 값 대체)
    #[arg(long)]
    poll_interval: Option<u64>,

    /// 한 번 감지하고 결과를 출력한 뒤 종료
    #[arg(long)]
    once: bool,
}

/// 종료 시 stdin 읽기 스레드를 기다리는 최대 시간
const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(200);

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "locallink", "LocalLink")
}

/// 설정 파일 경로 결정 (CLI 인자 또는 플랫폼별 기본 경로)
fn resolve_config_path(config: Option<&Path>) -> PathBuf {
    config
        .map(Path::to_path_buf)
        .or_else(|| project_dirs().map(|p| p.config_dir().join(CONFIG_FILE_NAME)))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
}

/// 데이터베이스 경로 결정 (CLI 인자, 설정, 플랫폼별 기본 경로 순)
///
/// # 플랫폼별 기본 경로:
/// - macOS: `~/Library/Application Support/com.locallink.LocalLink/locallink.db`
/// - Windows: `%APPDATA%\locallink\LocalLink\data\locallink.db`
/// - Linux: `~/.local/share/locallink/locallink.db`
fn resolve_db_path(data_dir: Option<&Path>, config: &AppConfig) -> PathBuf {
    data_dir
        .map(|d| d.join("locallink.db"))
        .or_else(|| config.storage.db_path.clone())
        .or_else(|| project_dirs().map(|p| p.data_dir().join("locallink.db")))
        .unwrap_or_else(|| PathBuf::from("./locallink.db"))
}

/// 설정 로드. 실패하면 기본 설정으로 계속한다.
fn load_config(path: PathBuf) -> ConfigManager {
    match ConfigManager::with_path(path.clone()) {
        Ok(manager) => manager,
        Err(e) => {
            warn!("설정 로드 실패, 기본 설정 사용: {e}");
            ConfigManager::detached(path)
        }
    }
}

/// 저장소 열기. 실패하면 인메모리 저장소로 대체한다.
fn open_storage(path: &Path) -> Arc<dyn KeyValueStore> {
    match SqliteKvStore::open(path) {
        Ok(store) => {
            info!("저장소: {}", path.display());
            Arc::new(store)
        }
        Err(e) => {
            warn!("저장소 열기 실패, 인메모리 저장소 사용 (커스텀 포트가 유지되지 않음): {e}");
            Arc::new(MemoryKvStore::new())
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // tracing 초기화
    let log_filter = format!(
        "locallink={},locallink_app={},locallink_core={},locallink_network={},locallink_storage={}",
        args.log_level, args.log_level, args.log_level, args.log_level, args.log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run(args));
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);
    result
}

async fn run(args: Args) -> Result<()> {
    info!("LocalLink 시작");

    // 설정 로드 + CLI 오버라이드
    let config_manager = load_config(resolve_config_path(args.config.as_deref()));
    let mut config = config_manager.get().clone();
    if let Some(interval) = args.poll_interval {
        config.poller.poll_interval_ms = interval;
    }
    info!("설정: {}", config_manager.config_path().display());

    // 어댑터 생성
    let storage = open_storage(&resolve_db_path(args.data_dir.as_deref(), &config));
    let detector = Arc::new(TcpProbeDetector::from_config(&config.detection));
    let store = CustomPortStore::load(storage).await;

    let lifecycle = LifecycleManager::new();
    let poller = NetworkInfoPoller::start(
        detector,
        store.subscribe(),
        PollerConfig::from(&config.poller),
        lifecycle.token(),
    );

    if args.once {
        let outcome = poller.handle().refresh().await;
        let mut projector = UiStateProjector::new(config.detection.common_ports.clone());
        projector.observe_poll(poller.handle().state());
        if let Err(e) = &outcome {
            warn!("감지 실패: {e}");
        }
        print!(
            "{}",
            render(&projector.state(store.ports(), tokio::time::Instant::now()))
        );
        poller.shutdown().await;
        return Ok(());
    }

    let clipboard = CommandClipboard::detect();
    info!("클립보드 명령: {}", clipboard.program());
    let console = Console::new(
        store,
        poller.handle(),
        Arc::new(clipboard),
        config.detection.common_ports.clone(),
        config.notice_ttl(),
    );
    let input = BufReader::new(tokio::io::stdin());

    tokio::select! {
        result = console.run(input, tokio::io::stdout(), lifecycle.token()) => {
            if let Err(e) = result {
                warn!("콘솔 에러: {e}");
            }
        }
        result = lifecycle.wait_for_signal() => {
            if let Err(e) = result {
                warn!("시그널 대기 실패: {e}");
            }
        }
    }

    lifecycle.shutdown();
    poller.shutdown().await;
    info!("LocalLink 종료");
    Ok(())
}
