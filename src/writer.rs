//! 속도 제한 라이터 (송신 스레드)
//!
//! - 핸드셰이크 전에는 전송하지 않고 크레딧도 쌓지 않음
//! - 허용 후 [`Pacer`] 가 허락할 때마다 정확히 한 바이트 전송
//! - 입력이 끝나도 루프는 계속 (종료는 스캐너의 종료 키워드로)

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use crate::input::InputCursor;
use crate::link::LinkWriter;
use crate::pacer::Pacer;
use crate::state::{SharedState, StopReason};
use crate::stats::TransferStats;
use crate::{Config, Result};

/// 속도 제한 라이터
pub struct RateLimitedWriter {
    pacer: Pacer,
    input: InputCursor,
    state: Arc<SharedState>,
    poll_interval: Duration,
    progress_every: u64,
    stats: TransferStats,
}

impl RateLimitedWriter {
    pub fn new(config: &Config, input: InputCursor, state: Arc<SharedState>) -> Self {
        Self {
            pacer: Pacer::new(config.target_bps, Instant::now()),
            input,
            state,
            poll_interval: config.write_poll_interval,
            progress_every: config.progress_every.max(1),
            stats: TransferStats::new(),
        }
    }

    /// 루프 한 번. 바이트를 보냈으면 그 바이트 반환
    pub fn step<W: LinkWriter>(&mut self, writer: &mut W, now: Instant) -> Result<Option<u8>> {
        if !self.state.is_transfer_enabled() {
            self.pacer.hold(now);
            return Ok(None);
        }

        if !self.pacer.poll(now) {
            return Ok(None);
        }

        let Some(byte) = self.input.next_byte() else {
            if !self.stats.input_exhausted {
                self.stats.input_exhausted = true;
                info!("input exhausted after {} bytes", self.stats.bytes_sent);
            }
            return Ok(None);
        };

        writer.write_bytes(&[byte])?;
        self.stats.record_sent(&[byte], now);

        if self.stats.bytes_sent % self.progress_every == 0 {
            info!("sender : {} bytes sent", self.stats.bytes_sent);
        }

        Ok(Some(byte))
    }

    /// 송신 루프. `running` 이 내려가거나 쓰기 에러가 날 때까지 돈다.
    ///
    /// 에러로 끝나면 실행 전체를 `Failed` 로 중지시킨다.
    pub fn run<W: LinkWriter>(&mut self, writer: &mut W) -> Result<()> {
        let result = self.write_loop(writer);
        if let Err(e) = &result {
            error!("writer failed: {}", e);
            self.state.stop(StopReason::Failed);
        }
        debug!("writer stopped: {}", self.stats.summary());
        result
    }

    fn write_loop<W: LinkWriter>(&mut self, writer: &mut W) -> Result<()> {
        while self.state.is_running() {
            self.step(writer, Instant::now())?;
            thread::sleep(self.poll_interval);
        }
        Ok(())
    }

    pub fn stats(&self) -> &TransferStats {
        &self.stats
    }

    pub fn into_stats(self) -> TransferStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loopback;
    use bytes::Bytes;
    use std::io;

    #[derive(Default)]
    struct Recorder {
        sent: Vec<u8>,
    }

    impl LinkWriter for Recorder {
        fn write_bytes(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.sent.extend_from_slice(buf);
            Ok(buf.len())
        }
    }

    fn config(bps: u32) -> Config {
        Config {
            target_bps: bps,
            ..Config::default()
        }
    }

    fn writer(bps: u32, data: &'static [u8], state: Arc<SharedState>) -> RateLimitedWriter {
        RateLimitedWriter::new(
            &config(bps),
            InputCursor::from_bytes(Bytes::from_static(data)),
            state,
        )
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_gated_until_enabled() {
        let state = Arc::new(SharedState::new());
        let mut w = writer(320, b"abcdef", state.clone());
        let mut link = Recorder::default();
        let t0 = Instant::now();

        // 비허용 상태에서는 시간이 얼마나 지나도 0바이트
        for i in 0..=100 {
            assert_eq!(w.step(&mut link, t0 + ms(i * 10)).unwrap(), None);
        }
        assert!(link.sent.is_empty());

        // 허용 직후 버스트 없이 한 간격 뒤 첫 바이트
        state.enable_transfer();
        let t1 = t0 + ms(1000);
        assert_eq!(w.step(&mut link, t1 + ms(1)).unwrap(), None);
        assert_eq!(w.step(&mut link, t1 + ms(20)).unwrap(), None);
        assert_eq!(w.step(&mut link, t1 + ms(26)).unwrap(), Some(b'a'));
        assert_eq!(w.step(&mut link, t1 + ms(30)).unwrap(), None);
        assert_eq!(w.step(&mut link, t1 + ms(52)).unwrap(), Some(b'b'));
        assert_eq!(link.sent, b"ab");
    }

    #[test]
    fn test_exhausted_input_sends_nothing_more() {
        let state = Arc::new(SharedState::new());
        state.enable_transfer();
        let mut w = writer(8000, b"xy", state);
        let mut link = Recorder::default();
        let t0 = Instant::now();

        for i in 1..=50 {
            w.step(&mut link, t0 + ms(i * 2)).unwrap();
        }

        assert_eq!(link.sent, b"xy");
        assert!(w.stats().input_exhausted);
        assert_eq!(w.stats().bytes_sent, 2);
    }

    #[test]
    fn test_progress_counter() {
        let state = Arc::new(SharedState::new());
        state.enable_transfer();
        let mut w = RateLimitedWriter::new(
            &Config {
                target_bps: 8000,
                progress_every: 4,
                ..Config::default()
            },
            InputCursor::from_bytes(Bytes::from(vec![0u8; 10])),
            state,
        );
        let mut link = Recorder::default();
        let t0 = Instant::now();

        for i in 1..=30 {
            w.step(&mut link, t0 + ms(i * 2)).unwrap();
        }
        assert_eq!(w.into_stats().bytes_sent, 10);
    }

    /// 실제 시간으로 N 바이트를 보내고 첫~마지막 전송 간격을 측정
    fn measure(bps: u32, n: usize) -> Duration {
        let state = Arc::new(SharedState::new());
        state.enable_transfer();
        let config = config(bps);
        let (_reader, mut link, mut remote) = loopback::link(config.read_timeout);
        let mut w = RateLimitedWriter::new(
            &config,
            InputCursor::from_bytes(Bytes::from(vec![0x55u8; n])),
            state.clone(),
        );

        let handle = thread::spawn(move || {
            w.run(&mut link).unwrap();
            w.into_stats()
        });

        let deadline = Instant::now() + Duration::from_secs(30);
        while remote.received_len() < n && Instant::now() < deadline {
            thread::sleep(ms(1));
        }
        state.stop(StopReason::Interrupted);

        let stats = handle.join().unwrap();
        assert_eq!(stats.bytes_sent, n as u64);
        stats.send_window()
    }

    #[test]
    fn test_rate_bound() {
        let n = 100;
        for &bps in &[300u32, 1200, 9600] {
            let window = measure(bps, n).as_secs_f64();
            let expected = (n - 1) as f64 * 8.0 / bps as f64;
            let error = (window - expected).abs() / expected;
            assert!(error < 0.10, "bps {}: {:.4}s vs {:.4}s", bps, window, expected);
        }
    }

    #[test]
    fn test_stops_when_run_cleared() {
        let state = Arc::new(SharedState::new());
        state.enable_transfer();
        let mut w = writer(300, b"0123456789", state.clone());
        let (_reader, mut link, _remote) = loopback::link(ms(10));

        let handle = thread::spawn(move || w.run(&mut link));
        thread::sleep(ms(50));
        state.stop(StopReason::Terminated);

        let started = Instant::now();
        handle.join().unwrap().unwrap();
        assert!(started.elapsed() < ms(500));
    }

    #[test]
    fn test_at_most_one_byte_after_stop() {
        for _ in 0..10 {
            let state = Arc::new(SharedState::new());
            state.enable_transfer();
            let config = config(80_000);
            let (_reader, mut link, mut remote) = loopback::link(config.read_timeout);
            let mut w = RateLimitedWriter::new(
                &config,
                InputCursor::from_bytes(Bytes::from(vec![0xAAu8; 100_000])),
                state.clone(),
            );

            let handle = thread::spawn(move || w.run(&mut link));
            thread::sleep(ms(30));

            let before = remote.received_len();
            state.stop(StopReason::Terminated);
            handle.join().unwrap().unwrap();
            let after = remote.received_len();

            assert!(before > 0);
            assert!(after - before <= 1, "before {} after {}", before, after);
        }
    }

    #[test]
    fn test_write_failure_fails_run() {
        let state = Arc::new(SharedState::new());
        state.enable_transfer();
        let mut w = writer(8000, b"abc", state.clone());
        let (_reader, mut link, remote) = loopback::link(ms(10));
        remote.hang_up();

        assert!(w.run(&mut link).is_err());
        assert!(!state.is_running());
        assert_eq!(state.stop_reason(), Some(StopReason::Failed));
    }
}
