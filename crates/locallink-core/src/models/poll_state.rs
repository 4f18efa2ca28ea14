//! 폴링 상태 모델.

use std::fmt;

use super::local_info::LocalInfo;

/// 재시도 예산 소진 시 표시되는 메시지
pub const BACKEND_UNREACHABLE_MESSAGE: &str =
    "Could not connect to backend. Please restart LocalLink.";

/// 감지 폴러 상태
///
/// 한 시점에 정확히 하나의 상태만 유지된다. 영속화하지 않는다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PollState {
    /// 아직 시작 전
    #[default]
    Idle,
    /// 감지 호출 진행 중
    Polling,
    /// 시작 재시도 대기 중 (attempt는 0부터)
    Backoff {
        /// 실패한 시도 번호
        attempt: u32,
    },
    /// 감지 실패
    Failed(String),
    /// 감지 성공
    Succeeded(LocalInfo),
}

impl PollState {
    /// 성공 상태이면 감지 결과 반환
    pub fn local_info(&self) -> Option<&LocalInfo> {
        match self {
            PollState::Succeeded(info) => Some(info),
            _ => None,
        }
    }

    /// 실패 메시지 반환
    pub fn failure(&self) -> Option<&str> {
        match self {
            PollState::Failed(message) => Some(message),
            _ => None,
        }
    }
}

impl fmt::Display for PollState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollState::Idle => write!(f, "Idle"),
            PollState::Polling => write!(f, "Polling"),
            PollState::Backoff { attempt } => write!(f, "Backoff({attempt})"),
            PollState::Failed(message) => write!(f, "Failed({message})"),
            PollState::Succeeded(info) => {
                write!(f, "Succeeded({} ports)", info.active_ports.len())
            }
        }
    }
}
