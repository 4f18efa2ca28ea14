//! URL 공유: 클립보드 복사.
//!
//! `ClipboardWriter` 포트 구현은 플랫폼 클립보드 유틸리티를 자식 프로세스로 실행한다
//! (macOS `pbcopy`, Windows `clip`, Linux `wl-copy` 또는 `xclip`).

use async_trait::async_trait;
use locallink_core::error::CoreError;
use locallink_core::ports::clipboard::ClipboardWriter;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::projector::Notice;

/// 외부 명령 기반 클립보드
#[derive(Debug, Clone)]
pub struct CommandClipboard {
    program: String,
    args: Vec<String>,
}

impl CommandClipboard {
    /// 지정 명령 사용
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// 현재 플랫폼의 기본 클립보드 명령
    pub fn detect() -> Self {
        if cfg!(target_os = "macos") {
            Self::new("pbcopy", Vec::new())
        } else if cfg!(target_os = "windows") {
            Self::new("clip", Vec::new())
        } else if std::env::var_os("WAYLAND_DISPLAY").is_some() {
            Self::new("wl-copy", Vec::new())
        } else {
            Self::new(
                "xclip",
                vec!["-selection".to_string(), "clipboard".to_string()],
            )
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl ClipboardWriter for CommandClipboard {
    async fn write_text(&self, text: &str) -> Result<(), CoreError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CoreError::Clipboard(format!("{} 실행 실패: {e}", self.program)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| CoreError::Clipboard("stdin 파이프 없음".to_string()))?;
        stdin
            .write_all(text.as_bytes())
            .await
            .map_err(|e| CoreError::Clipboard(format!("클립보드 쓰기 실패: {e}")))?;
        drop(stdin);

        let status = child
            .wait()
            .await
            .map_err(|e| CoreError::Clipboard(format!("{} 대기 실패: {e}", self.program)))?;
        if !status.success() {
            return Err(CoreError::Clipboard(format!(
                "{} 종료 코드: {status}",
                self.program
            )));
        }

        debug!("클립보드 복사 완료 ({} bytes)", text.len());
        Ok(())
    }
}

/// URL을 클립보드에 복사하고 결과 알림 반환
///
/// 실패해도 에러를 올리지 않는다. 알림만 에러 종류로 바뀐다.
pub async fn copy_url(clipboard: &dyn ClipboardWriter, url: &str, ttl: Duration) -> Notice {
    match clipboard.write_text(url).await {
        Ok(()) => Notice::info(format!("Copied {url}"), ttl),
        Err(e) => {
            warn!("URL 복사 실패: {e}");
            Notice::error("Copy failed", ttl)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projector::NoticeKind;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingClipboard {
        written: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ClipboardWriter for RecordingClipboard {
        async fn write_text(&self, text: &str) -> Result<(), CoreError> {
            self.written.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    struct BrokenClipboard;

    #[async_trait]
    impl ClipboardWriter for BrokenClipboard {
        async fn write_text(&self, _text: &str) -> Result<(), CoreError> {
            Err(CoreError::Clipboard("no display".to_string()))
        }
    }

    #[tokio::test]
    async fn copy_writes_url_and_reports_success() {
        let clipboard = RecordingClipboard::default();
        let notice = copy_url(
            &clipboard,
            "http://192.168.0.4:5173",
            Duration::from_secs(2),
        )
        .await;

        assert_eq!(notice.kind, NoticeKind::Info);
        assert_eq!(notice.message, "Copied http://192.168.0.4:5173");
        assert_eq!(
            *clipboard.written.lock().unwrap(),
            vec!["http://192.168.0.4:5173".to_string()]
        );
    }

    #[tokio::test]
    async fn copy_failure_becomes_error_notice() {
        let notice = copy_url(&BrokenClipboard, "http://x:1", Duration::from_secs(2)).await;
        assert_eq!(notice.kind, NoticeKind::Error);
        assert_eq!(notice.message, "Copy failed");
    }

    #[tokio::test]
    async fn missing_program_is_clipboard_error() {
        let clipboard = CommandClipboard::new("locallink-no-such-clipboard-tool", Vec::new());
        let err = clipboard.write_text("hello").await.unwrap_err();
        assert!(matches!(err, CoreError::Clipboard(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn successful_program_accepts_text() {
        // `cat`은 stdin을 모두 읽고 0으로 종료한다
        let clipboard = CommandClipboard::new("cat", Vec::new());
        clipboard.write_text("http://10.0.0.1:3000").await.unwrap();
    }

    #[test]
    fn detect_picks_a_program() {
        assert!(!CommandClipboard::detect().program().is_empty());
    }
}
