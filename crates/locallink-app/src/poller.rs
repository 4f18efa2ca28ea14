//! 네트워크 정보 폴러.
//!
//! 감지 백엔드(`LocalInfoSource`)를 반복 호출하는 단일 액터 태스크.
//!
//! - 시작 단계: 실패 시 exponential backoff 재시도 (100ms → 5s 상한, 최대 30회).
//!   재시도 예산을 넘기면 종단 `Failed` 상태에서 수동 새로고침을 기다린다.
//! - 정상 단계: 첫 성공 이후 호출 완료 시점부터 3초마다 재호출.
//! - 수동 새로고침은 즉시 호출하며, 호출이 진행 중이면 그 결과에 합류한다.
//! - 호출은 항상 순차적이다. 동시에 둘 이상 진행되지 않는다.

use locallink_core::config::PollerSettings;
use locallink_core::error::CoreError;
use locallink_core::models::local_info::LocalInfo;
use locallink_core::models::poll_state::{PollState, BACKEND_UNREACHABLE_MESSAGE};
use locallink_core::ports::detector::LocalInfoSource;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// 폴러 설정
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollerConfig {
    /// 첫 재시도 대기
    pub initial_backoff: Duration,
    /// 재시도 대기 상한
    pub max_backoff: Duration,
    /// 시작 단계 최대 재시도 횟수
    pub max_retries: u32,
    /// 정상 상태 폴링 주기
    pub poll_interval: Duration,
}

impl PollerConfig {
    /// `attempt`번째 실패 후 대기 시간: `min(initial * 2^attempt, max)`
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

impl From<&PollerSettings> for PollerConfig {
    fn from(settings: &PollerSettings) -> Self {
        Self {
            initial_backoff: Duration::from_millis(settings.initial_backoff_ms),
            max_backoff: Duration::from_millis(settings.max_backoff_ms),
            max_retries: settings.max_retries,
            poll_interval: Duration::from_millis(settings.poll_interval_ms),
        }
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self::from(&PollerSettings::default())
    }
}

/// 수동 새로고침 실패
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshError {
    /// 감지 호출 실패 (백엔드 에러 메시지)
    #[error("{0}")]
    Detection(String),
    /// 폴러가 종료됨
    #[error("폴러가 종료됨")]
    Stopped,
}

/// 수동 새로고침 결과
pub type RefreshOutcome = Result<LocalInfo, RefreshError>;

/// 폴러 액터 명령
enum PollerCommand {
    /// 즉시 호출 요청 (응답 채널이 없으면 fire-and-forget)
    Refresh(Option<oneshot::Sender<RefreshOutcome>>),
}

/// 폴러 핸들: 복제 가능, 상태 구독과 새로고침 요청용
#[derive(Clone)]
pub struct PollerHandle {
    cmd_tx: mpsc::UnboundedSender<PollerCommand>,
    state_rx: watch::Receiver<PollState>,
}

impl PollerHandle {
    /// 즉시 감지 호출 후 결과 대기
    ///
    /// 호출이 이미 진행 중이면 새 호출 없이 그 결과를 받는다.
    pub async fn refresh(&self) -> RefreshOutcome {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(PollerCommand::Refresh(Some(reply_tx)))
            .map_err(|_| RefreshError::Stopped)?;
        reply_rx.await.map_err(|_| RefreshError::Stopped)?
    }

    /// 결과를 기다리지 않는 새로고침 요청 (폴러가 종료됐으면 false)
    pub fn request_refresh(&self) -> bool {
        self.cmd_tx.send(PollerCommand::Refresh(None)).is_ok()
    }

    /// 현재 상태
    pub fn state(&self) -> PollState {
        self.state_rx.borrow().clone()
    }

    /// 상태 변경 수신기 생성
    pub fn subscribe(&self) -> watch::Receiver<PollState> {
        self.state_rx.clone()
    }
}

/// 네트워크 정보 폴러: 액터 태스크의 소유자
///
/// 드롭하거나 `shutdown()`하면 대기 중인 타이머와 진행 중인 호출이 취소된다.
pub struct NetworkInfoPoller {
    handle: PollerHandle,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl NetworkInfoPoller {
    /// 폴러 시작 (첫 호출은 즉시)
    ///
    /// `ports`: 커스텀 포트 목록. 변경되면 다음 호출에 반영되고 재폴링을 유발한다.
    pub fn start(
        source: Arc<dyn LocalInfoSource>,
        ports: watch::Receiver<Vec<u16>>,
        config: PollerConfig,
        cancel: CancellationToken,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(PollState::Idle);

        info!(
            "폴러 시작: 재시도={}ms→{}ms (최대 {}회), 주기={}ms",
            config.initial_backoff.as_millis(),
            config.max_backoff.as_millis(),
            config.max_retries,
            config.poll_interval.as_millis(),
        );

        let actor = PollerActor {
            source,
            ports,
            config,
            state_tx,
            cmd_rx,
            cancel: cancel.clone(),
            phase: Phase::Startup,
            failures: 0,
            waiters: Vec::new(),
            commands_open: true,
            ports_open: true,
        };
        let task = tokio::spawn(actor.run());

        Self {
            handle: PollerHandle { cmd_tx, state_rx },
            cancel,
            task: Some(task),
        }
    }

    /// 핸들 복제
    pub fn handle(&self) -> PollerHandle {
        self.handle.clone()
    }

    /// 취소 후 액터 종료까지 대기
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("폴러 태스크 종료 실패: {e}");
            }
        }
    }
}

impl Drop for NetworkInfoPoller {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// 폴링 단계
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// 첫 성공 전: 실패 시 backoff 재시도
    Startup,
    /// 첫 성공 이후: 고정 주기
    Steady,
    /// 재시도 예산 소진: 수동 새로고침만 대기
    Exhausted,
}

/// 다음 호출을 깨운 원인
#[derive(Debug, Clone, Copy)]
enum Wake {
    Scheduled,
    Requested,
    PortsChanged,
}

struct PollerActor {
    source: Arc<dyn LocalInfoSource>,
    ports: watch::Receiver<Vec<u16>>,
    config: PollerConfig,
    state_tx: watch::Sender<PollState>,
    cmd_rx: mpsc::UnboundedReceiver<PollerCommand>,
    cancel: CancellationToken,
    phase: Phase,
    /// 시작 단계 연속 실패 횟수
    failures: u32,
    /// 진행 중(또는 곧 시작할) 호출 결과를 기다리는 새로고침 요청
    waiters: Vec<oneshot::Sender<RefreshOutcome>>,
    commands_open: bool,
    ports_open: bool,
}

impl PollerActor {
    async fn run(mut self) {
        let mut next_call = Some(Instant::now());

        loop {
            let Some(wake) = self.wait(next_call).await else {
                break;
            };
            debug!("감지 호출: {wake:?}, 단계={:?}", self.phase);

            let Some(result) = self.call().await else {
                break;
            };
            next_call = self.settle(result);
        }

        // 남은 대기자는 채널 드롭으로 Stopped를 받는다
        self.waiters.clear();
        info!("폴러 종료");
    }

    /// 다음 호출 시점까지 대기. 취소되면 None.
    async fn wait(&mut self, deadline: Option<Instant>) -> Option<Wake> {
        loop {
            let timer = async {
                match deadline {
                    Some(deadline) => tokio::time::sleep_until(deadline).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return None,
                cmd = self.cmd_rx.recv(), if self.commands_open => match cmd {
                    Some(PollerCommand::Refresh(reply)) => {
                        self.waiters.extend(reply);
                        return Some(Wake::Requested);
                    }
                    None => self.commands_open = false,
                },
                changed = self.ports.changed(), if self.ports_open => match changed {
                    Ok(()) => return Some(Wake::PortsChanged),
                    Err(_) => self.ports_open = false,
                },
                _ = timer => return Some(Wake::Scheduled),
            }
        }
    }

    /// 감지 호출 한 번. 진행 중 들어온 새로고침은 이 호출에 합류한다.
    async fn call(&mut self) -> Option<Result<LocalInfo, CoreError>> {
        if self.phase == Phase::Exhausted {
            info!("수동 새로고침, 시작 재시도 재개");
            self.phase = Phase::Startup;
            self.failures = 0;
        }

        let extra_ports = self.ports.borrow_and_update().clone();
        self.publish(PollState::Polling);

        let source = Arc::clone(&self.source);
        let call = source.get_local_info(&extra_ports);
        tokio::pin!(call);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return None,
                result = &mut call => return Some(result),
                cmd = self.cmd_rx.recv(), if self.commands_open => match cmd {
                    Some(PollerCommand::Refresh(reply)) => {
                        debug!("진행 중인 호출에 새로고침 합류");
                        self.waiters.extend(reply);
                    }
                    None => self.commands_open = false,
                },
            }
        }
    }

    /// 호출 결과 반영 후 다음 호출 시점 반환 (None이면 요청이 올 때까지 대기)
    fn settle(&mut self, result: Result<LocalInfo, CoreError>) -> Option<Instant> {
        match result {
            Ok(info) => {
                if self.phase != Phase::Steady {
                    info!(
                        "감지 성공, 정상 폴링 전환 ({}ms 주기)",
                        self.config.poll_interval.as_millis()
                    );
                }
                self.phase = Phase::Steady;
                self.failures = 0;
                self.publish(PollState::Succeeded(info.clone()));
                self.resolve(Ok(info));
                Some(Instant::now() + self.config.poll_interval)
            }
            Err(e) => {
                let message = e.to_string();
                let next = match self.phase {
                    Phase::Steady => {
                        warn!("감지 실패 (주기 유지): {message}");
                        self.publish(PollState::Failed(message.clone()));
                        Some(Instant::now() + self.config.poll_interval)
                    }
                    Phase::Startup | Phase::Exhausted => self.schedule_retry(&message),
                };
                self.resolve(Err(RefreshError::Detection(message)));
                next
            }
        }
    }

    fn schedule_retry(&mut self, message: &str) -> Option<Instant> {
        self.failures = self.failures.saturating_add(1);

        if self.failures > self.config.max_retries {
            warn!(
                "연속 {}회 감지 실패, 자동 재시도 중단: {message}",
                self.failures
            );
            self.phase = Phase::Exhausted;
            self.publish(PollState::Failed(BACKEND_UNREACHABLE_MESSAGE.to_string()));
            return None;
        }

        let attempt = self.failures - 1;
        let delay = self.config.backoff_delay(attempt);
        debug!(
            "감지 실패 (attempt={attempt}): {message}, {}ms 후 재시도",
            delay.as_millis()
        );
        self.publish(PollState::Backoff { attempt });
        Some(Instant::now() + delay)
    }

    fn publish(&self, state: PollState) {
        self.state_tx.send_replace(state);
    }

    fn resolve(&mut self, outcome: RefreshOutcome) {
        for waiter in self.waiters.drain(..) {
            let _ = waiter.send(outcome.clone());
        }
    }
}
