//! 키워드 스캐너 (수신 스레드)
//!
//! - 수신 바이트를 하나씩 두 매처에 입력
//! - 핸드셰이크 키워드: 전송 허용
//! - 종료 키워드: 전체 실행 중지

use std::io::Write;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::link::LinkReader;
use crate::matcher::KeywordMatcher;
use crate::state::{SharedState, StopReason};
use crate::{Config, Error, Result};

/// 바이트 하나를 처리한 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanEvent {
    pub handshake: bool,
    pub terminate: bool,
}

/// 수신 에코 싱크
pub type EchoSink = Box<dyn Write + Send>;

/// 키워드 스캐너
pub struct KeywordScanner {
    handshake: KeywordMatcher,
    terminate: KeywordMatcher,
    state: Arc<SharedState>,
    poll_interval: Duration,
    echo: Option<EchoSink>,
    /// 수신 바이트 수
    bytes_seen: u64,
}

impl KeywordScanner {
    pub fn new(config: &Config, state: Arc<SharedState>) -> Self {
        Self {
            handshake: KeywordMatcher::new(config.handshake_word.as_bytes()),
            terminate: KeywordMatcher::new(config.terminate_word.as_bytes()),
            state,
            poll_interval: config.scan_poll_interval,
            echo: None,
            bytes_seen: 0,
        }
    }

    /// 수신 문자 에코 출력 설정
    pub fn with_echo(mut self, echo: EchoSink) -> Self {
        self.echo = Some(echo);
        self
    }

    /// 수신 바이트 하나 처리
    ///
    /// ASCII가 아닌 바이트는 치명적 에러.
    pub fn feed(&mut self, byte: u8) -> Result<ScanEvent> {
        if !byte.is_ascii() {
            return Err(Error::NonAsciiByte { byte });
        }
        self.bytes_seen += 1;

        if let Some(echo) = self.echo.as_mut() {
            let _ = echo.write_all(&[byte]);
            let _ = echo.flush();
        }

        let mut event = ScanEvent::default();

        if self.handshake.feed(byte) {
            event.handshake = true;
            if self.state.enable_transfer() {
                info!(
                    "'{}' detected, transfer enabled",
                    String::from_utf8_lossy(self.handshake.keyword())
                );
            } else {
                debug!("handshake repeated");
            }
        }

        if self.terminate.feed(byte) {
            event.terminate = true;
            info!(
                "'{}' detected, stopping",
                String::from_utf8_lossy(self.terminate.keyword())
            );
            self.state.stop(StopReason::Terminated);
        }

        Ok(event)
    }

    /// 수신 루프. `running` 이 내려가거나 치명적 에러가 날 때까지 돈다.
    ///
    /// 에러로 끝나면 실행 전체를 `Failed` 로 중지시킨다.
    pub fn run<R: LinkReader>(&mut self, reader: &mut R) -> Result<()> {
        let result = self.scan_loop(reader);
        if let Err(e) = &result {
            error!("scanner failed: {}", e);
            self.state.stop(StopReason::Failed);
        }
        debug!("scanner stopped after {} bytes", self.bytes_seen);
        result
    }

    fn scan_loop<R: LinkReader>(&mut self, reader: &mut R) -> Result<()> {
        while self.state.is_running() {
            if reader.bytes_waiting()? > 0 {
                // 읽기 타임아웃이면 다음 반복에서 다시 확인
                if let Some(byte) = reader.read_byte()? {
                    self.feed(byte)?;
                }
            }
            thread::sleep(self.poll_interval);
        }
        Ok(())
    }

    /// 수신 바이트 수
    pub fn bytes_seen(&self) -> u64 {
        self.bytes_seen
    }
}
