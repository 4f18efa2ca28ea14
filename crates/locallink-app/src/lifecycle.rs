//! 라이프사이클 관리.
//!
//! 시작/종료, 시그널 핸들링. 루트 취소 토큰을 소유하고
//! 각 백그라운드 작업에는 자식 토큰을 나눠준다.

use tokio_util::sync::CancellationToken;
use tracing::info;

/// 라이프사이클 관리자
pub struct LifecycleManager {
    root: CancellationToken,
}

impl LifecycleManager {
    /// 새 라이프사이클 관리자 생성
    pub fn new() -> Self {
        Self {
            root: CancellationToken::new(),
        }
    }

    /// 작업용 자식 토큰 (루트 종료 시 함께 취소)
    pub fn token(&self) -> CancellationToken {
        self.root.child_token()
    }

    /// 종료 신호 발송
    pub fn shutdown(&self) {
        if !self.root.is_cancelled() {
            info!("종료 신호 발송");
        }
        self.root.cancel();
    }

    /// OS 시그널 대기 (SIGINT, SIGTERM) 후 종료 신호 발송
    pub async fn wait_for_signal(&self) -> std::io::Result<()> {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigint = signal(SignalKind::interrupt())?;
            let mut sigterm = signal(SignalKind::terminate())?;

            tokio::select! {
                _ = sigint.recv() => {
                    info!("SIGINT 수신");
                }
                _ = sigterm.recv() => {
                    info!("SIGTERM 수신");
                }
            }
        }

        #[cfg(not(unix))]
        {
            tokio::signal::ctrl_c().await?;
            info!("Ctrl+C 수신");
        }

        self.shutdown();
        Ok(())
    }
}

impl Default for LifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}
