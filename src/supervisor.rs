//! 수퍼바이저
//!
//! 스캐너/라이터 스레드를 띄우고, 종료 키워드나 외부 중단을 기다렸다가
//! 두 스레드를 한 번씩 join 한 뒤 링크를 닫는다.

use std::future::Future;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::input::InputCursor;
use crate::link::{LinkReader, LinkWriter};
use crate::scanner::{EchoSink, KeywordScanner};
use crate::state::{SharedState, StopReason};
use crate::stats::TransferStats;
use crate::writer::RateLimitedWriter;
use crate::{Config, Error, Result};

type ScanHandle<R> = JoinHandle<(R, Result<()>)>;
type WriteHandle<W> = JoinHandle<(W, TransferStats, Result<()>)>;

/// 실행 결과
#[derive(Debug)]
pub struct TransferReport {
    /// 종료 사유
    pub stop_reason: StopReason,

    /// 핸드셰이크 수신 여부
    pub handshake_seen: bool,

    /// 송신 통계
    pub stats: TransferStats,

    /// 워커의 치명적 에러
    pub errors: Vec<Error>,
}

impl TransferReport {
    /// 에러 없이 종료 키워드 또는 운영자 중단으로 끝났는지
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.stop_reason != StopReason::Failed
    }
}

/// 송신 세션 수퍼바이저
///
/// `run` 또는 `shutdown` 은 `self` 를 소비하므로 join 과 링크 닫기는
/// 한 번만 일어난다. 실행 없이 drop 하면 `running` 만 내린다.
pub struct Supervisor<R, W> {
    state: Arc<SharedState>,
    poll_interval: Duration,
    scan_handle: Option<ScanHandle<R>>,
    write_handle: Option<WriteHandle<W>>,
}

impl<R, W> Supervisor<R, W>
where
    R: LinkReader + 'static,
    W: LinkWriter + 'static,
{
    /// 스캐너/라이터 스레드 시작
    pub fn spawn(
        config: &Config,
        mut reader: R,
        mut writer: W,
        input: InputCursor,
        echo: Option<EchoSink>,
    ) -> Result<Self> {
        let state = Arc::new(SharedState::new());

        let mut scanner = KeywordScanner::new(config, state.clone());
        if let Some(echo) = echo {
            scanner = scanner.with_echo(echo);
        }
        let mut rate_writer = RateLimitedWriter::new(config, input, state.clone());

        info!(
            "target rate: {} bps ({:.1} ms/byte), waiting for '{}'",
            config.target_bps,
            config.target_interval().as_secs_f64() * 1000.0,
            config.handshake_word
        );

        debug!("spawning scanner thread");
        let scan_handle = thread::Builder::new()
            .name("rlsend-scan".into())
            .spawn(move || {
                debug!("scanner thread started");
                let result = scanner.run(&mut reader);
                debug!("scanner thread exiting");
                (reader, result)
            })?;

        debug!("spawning writer thread");
        let write_handle = thread::Builder::new()
            .name("rlsend-write".into())
            .spawn(move || {
                debug!("writer thread started");
                let result = rate_writer.run(&mut writer);
                debug!("writer thread exiting");
                (writer, rate_writer.into_stats(), result)
            });

        let write_handle = match write_handle {
            Ok(handle) => handle,
            Err(e) => {
                state.stop(StopReason::Failed);
                let _ = join_worker(scan_handle, "scanner");
                return Err(e.into());
            }
        };

        Ok(Self {
            state,
            poll_interval: config.supervisor_poll_interval,
            scan_handle: Some(scan_handle),
            write_handle: Some(write_handle),
        })
    }

    /// 공유 상태 (외부 시그널 처리용)
    pub fn state(&self) -> Arc<SharedState> {
        self.state.clone()
    }

    /// `running` 이 내려가거나 `interrupt` 가 끝날 때까지 기다린 뒤 종료
    pub async fn run<F>(self, interrupt: F) -> Result<TransferReport>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(interrupt);

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while self.state.is_running() {
            tokio::select! {
                _ = &mut interrupt => {
                    if self.state.stop(StopReason::Interrupted) {
                        info!("interrupted, shutting down");
                    }
                    break;
                }
                _ = ticker.tick() => {}
            }
        }

        self.shutdown().await
    }

    /// 두 스레드 정지 및 join, 링크 닫기
    pub async fn shutdown(mut self) -> Result<TransferReport> {
        self.state.stop(StopReason::Interrupted);

        info!("waiting for thread join ...");
        let scan_handle = self.scan_handle.take();
        let write_handle = self.write_handle.take();

        let (scan, write) = tokio::task::spawn_blocking(move || {
            (
                scan_handle.map(|h| join_worker(h, "scanner")),
                write_handle.map(|h| join_worker(h, "writer")),
            )
        })
        .await
        .map_err(|_| Error::WorkerPanicked { worker: "join" })?;

        let mut errors = Vec::new();
        let mut stats = TransferStats::new();
        let mut reader = None;
        let mut writer = None;

        match scan {
            Some(Ok((half, result))) => {
                reader = Some(half);
                if let Err(e) = result {
                    errors.push(e);
                }
            }
            Some(Err(e)) => errors.push(e),
            None => {}
        }

        match write {
            Some(Ok((half, writer_stats, result))) => {
                writer = Some(half);
                stats = writer_stats;
                if let Err(e) = result {
                    errors.push(e);
                }
            }
            Some(Err(e)) => errors.push(e),
            None => {}
        }

        // 링크 닫기
        drop(reader);
        drop(writer);
        info!("done. {}", stats.summary());

        Ok(TransferReport {
            stop_reason: self.state.stop_reason().unwrap_or(StopReason::Interrupted),
            handshake_seen: self.state.is_transfer_enabled(),
            stats,
            errors,
        })
    }
}

/// 워커 스레드 join. 패닉은 로그를 남기고 `WorkerPanicked` 로 바꾼다.
fn join_worker<T>(handle: JoinHandle<T>, worker: &'static str) -> Result<T> {
    handle.join().map_err(|_| {
        error!("{} thread panicked", worker);
        Error::WorkerPanicked { worker }
    })
}

impl<R, W> Drop for Supervisor<R, W> {
    fn drop(&mut self) {
        // 스레드는 스스로 빠져나간다
        self.state.stop(StopReason::Interrupted);
    }
}
