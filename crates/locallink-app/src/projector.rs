//! UI 상태 투영.
//!
//! 폴러 상태, 커스텀 포트 목록, 마지막 입력 검증 결과, 클립보드 알림을
//! 화면에 그릴 `UiState` 하나로 합친다. 자체 로직은 조합뿐이다.

use locallink_core::models::local_info::{service_url, LocalInfo};
use locallink_core::models::poll_state::PollState;
use locallink_core::validation::ValidationError;
use std::fmt::Write as _;
use std::time::Duration;
use tokio::time::Instant;

/// 알림 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// 일시 알림 (만료 시각이 지나면 사라진다)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub kind: NoticeKind,
    pub expires_at: Instant,
}

impl Notice {
    /// 안내 알림
    pub fn info(message: impl Into<String>, ttl: Duration) -> Self {
        Self::new(message, NoticeKind::Info, ttl)
    }

    /// 에러 알림
    pub fn error(message: impl Into<String>, ttl: Duration) -> Self {
        Self::new(message, NoticeKind::Error, ttl)
    }

    fn new(message: impl Into<String>, kind: NoticeKind, ttl: Duration) -> Self {
        Self {
            message: message.into(),
            kind,
            expires_at: Instant::now() + ttl,
        }
    }

    /// 만료 여부
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// 상단 상태 표시
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// 아직 IP를 모름
    Detecting,
    /// IP 확인됨
    Ready,
    /// 감지 실패 메시지
    Error(String),
}

/// 감지된 서비스 한 줄
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEntry {
    pub port: u16,
    pub url: String,
}

/// 화면 상태
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiState {
    pub status: Status,
    pub ip: Option<String>,
    pub services: Vec<ServiceEntry>,
    /// IP는 있으나 활성 포트가 없을 때의 안내
    pub empty_hint: Option<String>,
    pub custom_ports: Vec<u16>,
    pub input_error: Option<String>,
    pub notice: Option<Notice>,
}

/// 입력들을 `UiState`로 합친다
///
/// `last_info`는 마지막 성공 결과다. 실패 중에도 직전 서비스 목록은 유지된다.
/// `error`는 다음 성공(또는 사용자 해제) 전까지 남아 있는 마지막 감지 실패 메시지다.
pub fn project(
    error: Option<&str>,
    last_info: &LocalInfo,
    custom_ports: &[u16],
    validation: Option<ValidationError>,
    notice: Option<&Notice>,
    common_ports: &[u16],
) -> UiState {
    let ip = last_info.ip.clone();

    let status = match (error, ip.is_some()) {
        (Some(message), _) => Status::Error(message.to_string()),
        (None, true) => Status::Ready,
        (None, false) => Status::Detecting,
    };

    let services = match ip.as_deref() {
        Some(ip) => last_info
            .active_ports
            .iter()
            .map(|&port| ServiceEntry {
                port,
                url: service_url(ip, port),
            })
            .collect(),
        None => Vec::new(),
    };

    let empty_hint = (ip.is_some() && services.is_empty()).then(|| empty_hint_text(common_ports));

    UiState {
        status,
        ip,
        services,
        empty_hint,
        custom_ports: custom_ports.to_vec(),
        input_error: validation.map(|e| e.to_string()),
        notice: notice.cloned(),
    }
}

fn empty_hint_text(common_ports: &[u16]) -> String {
    let ports = common_ports
        .iter()
        .map(u16::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!("No dev servers detected on common ports ({ports}).")
}

/// 포트 사용 안내
pub const HOST_TIP: &str = "Tip: Start your app with --host to enable mobile access.";

/// 투영 입력 보관자
///
/// 마지막 성공 결과, 마지막 감지 에러, 마지막 검증 결과, 현재 알림을 기억한다.
#[derive(Debug, Default)]
pub struct UiStateProjector {
    last_info: LocalInfo,
    last_error: Option<String>,
    validation: Option<ValidationError>,
    notice: Option<Notice>,
    common_ports: Vec<u16>,
}

impl UiStateProjector {
    pub fn new(common_ports: Vec<u16>) -> Self {
        Self {
            common_ports,
            ..Self::default()
        }
    }

    /// 폴러 상태 반영
    ///
    /// 성공 결과는 통째로 교체하고 에러를 지운다. 실패 메시지는 다음 성공까지 유지되며
    /// `Polling`, `Backoff` 같은 중간 상태는 에러를 건드리지 않는다.
    pub fn observe_poll(&mut self, state: PollState) {
        match state {
            PollState::Succeeded(info) => {
                self.last_info = info;
                self.last_error = None;
            }
            PollState::Failed(message) => self.last_error = Some(message),
            PollState::Idle | PollState::Polling | PollState::Backoff { .. } => {}
        }
    }

    /// 감지 에러 표시 해제 (해제할 에러가 있었으면 true)
    ///
    /// 다음 실패가 관찰되면 다시 표시된다.
    pub fn dismiss_error(&mut self) -> bool {
        self.last_error.take().is_some()
    }

    pub fn set_validation(&mut self, validation: Option<ValidationError>) {
        self.validation = validation;
    }

    pub fn set_notice(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    /// 마지막 성공 결과
    pub fn last_info(&self) -> &LocalInfo {
        &self.last_info
    }

    /// 현재 알림의 만료 시각
    pub fn notice_deadline(&self) -> Option<Instant> {
        self.notice.as_ref().map(|n| n.expires_at)
    }

    /// 만료된 알림 제거 (제거했으면 true)
    pub fn clear_expired(&mut self, now: Instant) -> bool {
        if self.notice.as_ref().is_some_and(|n| n.is_expired(now)) {
            self.notice = None;
            return true;
        }
        false
    }

    /// 현재 화면 상태
    pub fn state(&self, custom_ports: &[u16], now: Instant) -> UiState {
        let notice = self.notice.as_ref().filter(|n| !n.is_expired(now));
        project(
            self.last_error.as_deref(),
            &self.last_info,
            custom_ports,
            self.validation,
            notice,
            &self.common_ports,
        )
    }
}

/// 콘솔 출력용 텍스트
pub fn render(state: &UiState) -> String {
    let mut out = String::from("LocalLink\n");

    match &state.status {
        Status::Detecting => out.push_str("Detecting network...\n"),
        Status::Error(message) => {
            let _ = writeln!(out, "Error: {message}");
        }
        Status::Ready => {}
    }

    if let Some(ip) = &state.ip {
        let _ = writeln!(out, "IP: {ip}");
    }

    if let Some(hint) = &state.empty_hint {
        let _ = writeln!(out, "{hint}");
        let _ = writeln!(out, "{HOST_TIP}");
    }

    for service in &state.services {
        let _ = writeln!(out, "  Port {:<5}  {}", service.port, service.url);
    }

    if !state.custom_ports.is_empty() {
        let ports = state
            .custom_ports
            .iter()
            .map(u16::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(out, "Custom ports: {ports}");
    }

    if let Some(error) = &state.input_error {
        let _ = writeln!(out, "! {error}");
    }

    if let Some(notice) = &state.notice {
        let prefix = match notice.kind {
            NoticeKind::Info => "*",
            NoticeKind::Error => "!",
        };
        let _ = writeln!(out, "{prefix} {}", notice.message);
    }

    out
}
