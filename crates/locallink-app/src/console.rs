//! 콘솔 셸.
//!
//! 줄 단위 명령으로 커스텀 포트를 관리하고, 폴러 상태가 바뀔 때마다
//! 투영된 화면을 다시 출력한다. `CustomPortStore`는 이 루프가 단독 소유한다.

use locallink_core::ports::clipboard::ClipboardWriter;
use locallink_core::validation::ValidationError;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::custom_ports::CustomPortStore;
use crate::poller::PollerHandle;
use crate::projector::{render, Notice, UiState, UiStateProjector};
use crate::share::copy_url;

const HELP: &str = "\
Commands:
  add <port>      add a custom port to check
  remove <port>   remove a custom port (rm)
  refresh         detect now (r)
  dismiss         hide the detection error until it happens again (d)
  copy <port>     copy the service URL to the clipboard
  list            show the current view (ls)
  help            show this help
  quit            exit (q, exit)
";

/// 콘솔 명령
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Add(String),
    Remove(String),
    Refresh,
    Dismiss,
    Copy(String),
    List,
    Help,
    Quit,
    Unknown(String),
    Empty,
}

impl ConsoleCommand {
    /// 입력 한 줄 해석 (명령어는 대소문자 무시)
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match word.to_ascii_lowercase().as_str() {
            "" => Self::Empty,
            "add" => Self::Add(rest.to_string()),
            "remove" | "rm" => Self::Remove(rest.to_string()),
            "refresh" | "r" => Self::Refresh,
            "dismiss" | "d" => Self::Dismiss,
            "copy" => Self::Copy(rest.to_string()),
            "list" | "ls" => Self::List,
            "help" | "?" => Self::Help,
            "quit" | "q" | "exit" => Self::Quit,
            _ => Self::Unknown(word.to_string()),
        }
    }
}

/// 명령 처리 후 흐름
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// 콘솔 셸 상태
pub struct Console {
    store: CustomPortStore,
    poller: PollerHandle,
    projector: UiStateProjector,
    clipboard: Arc<dyn ClipboardWriter>,
    notice_ttl: Duration,
    last_rendered: Option<UiState>,
}

impl Console {
    pub fn new(
        store: CustomPortStore,
        poller: PollerHandle,
        clipboard: Arc<dyn ClipboardWriter>,
        common_ports: Vec<u16>,
        notice_ttl: Duration,
    ) -> Self {
        Self {
            store,
            poller,
            projector: UiStateProjector::new(common_ports),
            clipboard,
            notice_ttl,
            last_rendered: None,
        }
    }

    /// 현재 화면 상태
    pub fn ui_state(&self) -> UiState {
        self.projector.state(self.store.ports(), Instant::now())
    }

    /// 입력이 끝나거나 `quit`, 취소될 때까지 실행
    ///
    /// 입력이 닫혀도 취소 전까지는 상태 변화를 계속 출력한다.
    pub async fn run<R, W>(
        mut self,
        input: R,
        mut out: W,
        cancel: CancellationToken,
    ) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut state_rx = self.poller.subscribe();
        let initial = state_rx.borrow_and_update().clone();
        self.projector.observe_poll(initial);
        self.redraw(&mut out, true).await?;

        let mut lines = input.lines();
        let mut input_open = true;

        loop {
            let notice_deadline = self.projector.notice_deadline();
            let notice_timer = async {
                match notice_deadline {
                    Some(deadline) => tokio::time::sleep_until(deadline).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                line = lines.next_line(), if input_open => match line? {
                    Some(line) => {
                        let command = ConsoleCommand::parse(&line);
                        debug!("콘솔 명령: {command:?}");
                        if self.execute(command, &mut out).await? == Flow::Quit {
                            break;
                        }
                    }
                    None => {
                        debug!("콘솔 입력 종료");
                        input_open = false;
                    }
                },
                changed = state_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let state = state_rx.borrow_and_update().clone();
                    self.projector.observe_poll(state);
                    self.redraw(&mut out, false).await?;
                }
                _ = notice_timer => {
                    if self.projector.clear_expired(Instant::now()) {
                        self.redraw(&mut out, false).await?;
                    }
                }
            }
        }

        info!("콘솔 종료");
        Ok(())
    }

    /// 명령 하나 실행
    pub async fn execute<W>(&mut self, command: ConsoleCommand, out: &mut W) -> anyhow::Result<Flow>
    where
        W: AsyncWrite + Unpin,
    {
        match command {
            ConsoleCommand::Add(raw) => {
                match self.store.add(&raw).await {
                    Ok(port) => {
                        info!("커스텀 포트 추가: {port}");
                        self.projector.set_validation(None);
                    }
                    Err(e) => self.projector.set_validation(Some(e)),
                }
                self.redraw(out, false).await?;
            }
            ConsoleCommand::Remove(raw) => {
                match parse_port_arg(&raw) {
                    Ok(port) => {
                        self.projector.set_validation(None);
                        if self.store.remove(port).await {
                            info!("커스텀 포트 제거: {port}");
                        } else {
                            write_line(out, &format!("Port {port} is not a custom port.")).await?;
                        }
                    }
                    Err(e) => self.projector.set_validation(Some(e)),
                }
                self.redraw(out, false).await?;
            }
            // 결과는 상태 구독으로 들어온다. 호출을 기다리면 입력 처리가 멈춘다.
            ConsoleCommand::Refresh => {
                if !self.poller.request_refresh() {
                    warn!("폴러가 종료되어 새로고침 불가");
                    return Ok(Flow::Quit);
                }
                debug!("새로고침 요청");
            }
            ConsoleCommand::Dismiss => {
                if self.projector.dismiss_error() {
                    debug!("감지 에러 표시 해제");
                }
                self.redraw(out, false).await?;
            }
            ConsoleCommand::Copy(raw) => {
                let notice = match parse_port_arg(&raw) {
                    Ok(port) => match self.projector.last_info().url_for(port) {
                        Some(url) => copy_url(self.clipboard.as_ref(), &url, self.notice_ttl).await,
                        None => Notice::error(format!("Port {port} is not active."), self.notice_ttl),
                    },
                    Err(e) => Notice::error(e.to_string(), self.notice_ttl),
                };
                self.projector.set_notice(notice);
                self.redraw(out, false).await?;
            }
            ConsoleCommand::List => self.redraw(out, true).await?,
            ConsoleCommand::Help => write_line(out, HELP).await?,
            ConsoleCommand::Unknown(word) => {
                write_line(out, &format!("Unknown command: {word}\n{HELP}")).await?;
            }
            ConsoleCommand::Quit => return Ok(Flow::Quit),
            ConsoleCommand::Empty => {}
        }
        Ok(Flow::Continue)
    }

    /// 화면 상태가 바뀌었거나 `force`면 출력
    async fn redraw<W>(&mut self, out: &mut W, force: bool) -> anyhow::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let state = self.ui_state();
        if !force && self.last_rendered.as_ref() == Some(&state) {
            return Ok(());
        }
        write_line(out, &render(&state)).await?;
        self.last_rendered = Some(state);
        Ok(())
    }
}

fn parse_port_arg(raw: &str) -> Result<u16, ValidationError> {
    match raw.trim().parse::<u16>() {
        Ok(0) | Err(_) => Err(ValidationError::InvalidFormat),
        Ok(port) => Ok(port),
    }
}

async fn write_line<W>(out: &mut W, text: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    out.write_all(text.as_bytes()).await?;
    if !text.ends_with('\n') {
        out.write_all(b"\n").await?;
    }
    out.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poller::{NetworkInfoPoller, PollerConfig};
    use crate::projector::Status;
    use async_trait::async_trait;
    use locallink_core::error::CoreError;
    use locallink_core::models::local_info::LocalInfo;
    use locallink_core::models::poll_state::PollState;
    use locallink_core::ports::detector::LocalInfoSource;
    use locallink_storage::MemoryKvStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FixedSource {
        seen: Mutex<Vec<Vec<u16>>>,
    }

    #[async_trait]
    impl LocalInfoSource for FixedSource {
        async fn get_local_info(&self, extra_ports: &[u16]) -> Result<LocalInfo, CoreError> {
            self.seen.lock().unwrap().push(extra_ports.to_vec());
            let mut active_ports = vec![3000];
            active_ports.extend_from_slice(extra_ports);
            Ok(LocalInfo {
                ip: Some("192.168.0.10".to_string()),
                active_ports,
            })
        }
    }

    /// 호출이 끝나지 않는 감지 소스
    #[derive(Default)]
    struct HangingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LocalInfoSource for HangingSource {
        async fn get_local_info(&self, _extra_ports: &[u16]) -> Result<LocalInfo, CoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::future::pending().await
        }
    }

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

    struct Harness {
        console: Console,
        poller: NetworkInfoPoller,
        source: Arc<FixedSource>,
        clipboard: Arc<RecordingClipboard>,
    }

    async fn harness() -> Harness {
        let source = Arc::new(FixedSource {
            seen: Mutex::new(Vec::new()),
        });
        let store = CustomPortStore::load(Arc::new(MemoryKvStore::new())).await;
        let poller = NetworkInfoPoller::start(
            source.clone(),
            store.subscribe(),
            PollerConfig::default(),
            CancellationToken::new(),
        );
        let clipboard = Arc::new(RecordingClipboard::default());
        let console = Console::new(
            store,
            poller.handle(),
            clipboard.clone(),
            vec![3000, 5173],
            Duration::from_secs(2),
        );
        Harness {
            console,
            poller,
            source,
            clipboard,
        }
    }

    async fn hanging_console() -> (Console, NetworkInfoPoller, Arc<HangingSource>) {
        let source = Arc::new(HangingSource::default());
        let store = CustomPortStore::load(Arc::new(MemoryKvStore::new())).await;
        let poller = NetworkInfoPoller::start(
            source.clone(),
            store.subscribe(),
            PollerConfig::default(),
            CancellationToken::new(),
        );
        let console = Console::new(
            store,
            poller.handle(),
            Arc::new(RecordingClipboard::default()),
            vec![3000, 5173],
            Duration::from_secs(2),
        );
        (console, poller, source)
    }

    #[test]
    fn parses_commands_and_aliases() {
        assert_eq!(
            ConsoleCommand::parse("add 8080"),
            ConsoleCommand::Add("8080".to_string())
        );
        assert_eq!(
            ConsoleCommand::parse("  RM   3000 "),
            ConsoleCommand::Remove("3000".to_string())
        );
        assert_eq!(ConsoleCommand::parse("r"), ConsoleCommand::Refresh);
        assert_eq!(ConsoleCommand::parse("Dismiss"), ConsoleCommand::Dismiss);
        assert_eq!(ConsoleCommand::parse("d"), ConsoleCommand::Dismiss);
        assert_eq!(ConsoleCommand::parse("ls"), ConsoleCommand::List);
        assert_eq!(ConsoleCommand::parse("exit"), ConsoleCommand::Quit);
        assert_eq!(ConsoleCommand::parse("   "), ConsoleCommand::Empty);
        assert_eq!(
            ConsoleCommand::parse("launch"),
            ConsoleCommand::Unknown("launch".to_string())
        );
        assert_eq!(ConsoleCommand::parse("add"), ConsoleCommand::Add(String::new()));
    }

    #[test]
    fn port_argument_must_be_in_range() {
        assert_eq!(parse_port_arg(" 8080"), Ok(8080));
        assert_eq!(parse_port_arg("0"), Err(ValidationError::InvalidFormat));
        assert_eq!(parse_port_arg("70000"), Err(ValidationError::InvalidFormat));
        assert_eq!(parse_port_arg(""), Err(ValidationError::InvalidFormat));
    }

    #[tokio::test(start_paused = true)]
    async fn add_shows_inline_errors() {
        let mut h = harness().await;
        let mut out = Vec::new();

        h.console
            .execute(ConsoleCommand::Add("70000".to_string()), &mut out)
            .await
            .unwrap();
        assert_eq!(
            h.console.ui_state().input_error.as_deref(),
            Some("Enter a valid port (1–65535).")
        );

        h.console
            .execute(ConsoleCommand::Add("8080".to_string()), &mut out)
            .await
            .unwrap();
        assert!(h.console.ui_state().input_error.is_none());
        assert_eq!(h.console.store.ports(), &[8080]);

        h.console
            .execute(ConsoleCommand::Add("8080".to_string()), &mut out)
            .await
            .unwrap();
        assert_eq!(
            h.console.ui_state().input_error.as_deref(),
            Some("Port already added.")
        );
        h.poller.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn added_port_reaches_next_detection_call() {
        let mut h = harness().await;
        let mut out = Vec::new();

        h.poller.handle().refresh().await.unwrap();
        h.console
            .execute(ConsoleCommand::Add("9100".to_string()), &mut out)
            .await
            .unwrap();
        let flow = h
            .console
            .execute(ConsoleCommand::Refresh, &mut out)
            .await
            .unwrap();
        assert_eq!(flow, Flow::Continue);

        let source = h.source.clone();
        tokio::time::timeout(Duration::from_secs(1), async move {
            while source.seen.lock().unwrap().last() != Some(&vec![9100]) {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
        h.poller.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn copy_uses_last_detected_url() {
        let mut h = harness().await;
        let mut out = Vec::new();

        // 감지 결과를 투영기에 반영하기 위해 run 루프 대신 직접 관찰
        let info = h.poller.handle().refresh().await.unwrap();
        h.console
            .projector
            .observe_poll(PollState::Succeeded(info));

        h.console
            .execute(ConsoleCommand::Copy("3000".to_string()), &mut out)
            .await
            .unwrap();
        assert_eq!(
            *h.clipboard.written.lock().unwrap(),
            vec!["http://192.168.0.10:3000".to_string()]
        );
        let notice = h.console.ui_state().notice.unwrap();
        assert_eq!(notice.message, "Copied http://192.168.0.10:3000");

        h.console
            .execute(ConsoleCommand::Copy("4444".to_string()), &mut out)
            .await
            .unwrap();
        assert_eq!(
            h.console.ui_state().notice.unwrap().message,
            "Port 4444 is not active."
        );
        assert_eq!(h.clipboard.written.lock().unwrap().len(), 1);
        h.poller.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn run_renders_and_quits() {
        let h = harness().await;
        let mut out = Vec::new();
        let input: &[u8] = b"help\nadd 8080\nbogus\nquit\n";

        h.console
            .run(input, &mut out, CancellationToken::new())
            .await
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("LocalLink\n"));
        assert!(text.contains("Commands:"));
        assert!(text.contains("Custom ports: 8080"));
        assert!(text.contains("Unknown command: bogus"));
        h.poller.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn run_stops_on_cancel_after_input_closes() {
        let Harness {
            console, poller, ..
        } = harness().await;
        let cancel = CancellationToken::new();
        let input: &[u8] = b"";

        let task = tokio::spawn({
            let cancel = cancel.clone();
            async move { console.run(input, Vec::new(), cancel).await }
        });
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(!task.is_finished());

        cancel.cancel();
        task.await.unwrap().unwrap();
        poller.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_after_shutdown_quits() {
        let mut h = harness().await;
        h.poller.shutdown().await;

        let flow = h
            .console
            .execute(ConsoleCommand::Refresh, &mut Vec::new())
            .await
            .unwrap();
        assert_eq!(flow, Flow::Quit);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_returns_while_detection_is_in_flight() {
        let (mut console, poller, source) = hanging_console().await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        let flow = tokio::time::timeout(
            Duration::from_millis(50),
            console.execute(ConsoleCommand::Refresh, &mut Vec::new()),
        )
        .await
        .expect("새로고침이 감지 호출을 기다림")
        .unwrap();
        assert_eq!(flow, Flow::Continue);

        // 진행 중인 호출에 합류하므로 새 호출은 없다
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        poller.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn commands_keep_working_while_detection_hangs() {
        let (console, poller, _source) = hanging_console().await;
        let input: &[u8] = b"refresh\nadd 8080\nrefresh\nadd 9100\nquit\n";
        let mut out = Vec::new();

        tokio::time::timeout(
            Duration::from_secs(5),
            console.run(input, &mut out, CancellationToken::new()),
        )
        .await
        .expect("감지 호출 때문에 콘솔이 멈춤")
        .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Custom ports: 8080, 9100"));
        poller.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn dismiss_hides_detection_error() {
        let mut h = harness().await;
        let mut out = Vec::new();

        let info = h.poller.handle().refresh().await.unwrap();
        h.console.projector.observe_poll(PollState::Succeeded(info));
        h.console
            .projector
            .observe_poll(PollState::Failed("boom".to_string()));
        h.console.projector.observe_poll(PollState::Polling);
        assert_eq!(
            h.console.ui_state().status,
            Status::Error("boom".to_string())
        );

        h.console
            .execute(ConsoleCommand::Dismiss, &mut out)
            .await
            .unwrap();
        assert_eq!(h.console.ui_state().status, Status::Ready);
        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains("Error: boom"));
        h.poller.shutdown().await;
    }
}
