//! 전송 통계

use std::time::{Duration, Instant};

use crc32fast::Hasher;

/// 전송 통계
#[derive(Debug, Clone)]
pub struct TransferStats {
    /// 시작 시간
    pub start_time: Instant,

    /// 첫 바이트 전송 시간
    pub first_send: Option<Instant>,

    /// 마지막 바이트 전송 시간
    pub last_send: Option<Instant>,

    /// 총 전송 바이트
    pub bytes_sent: u64,

    /// 입력 소진 여부
    pub input_exhausted: bool,

    /// 전송한 바이트의 CRC32 (수신측 대조용)
    crc: u32,
}

impl TransferStats {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            first_send: None,
            last_send: None,
            bytes_sent: 0,
            input_exhausted: false,
            crc: 0,
        }
    }

    /// 바이트 전송 기록
    pub fn record_sent(&mut self, data: &[u8], at: Instant) {
        if self.first_send.is_none() {
            self.first_send = Some(at);
        }
        self.last_send = Some(at);
        self.bytes_sent += data.len() as u64;
        let mut hasher = Hasher::new_with_initial(self.crc);
        hasher.update(data);
        self.crc = hasher.finalize();
    }

    /// 경과 시간
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// 첫 전송부터 마지막 전송까지
    pub fn send_window(&self) -> Duration {
        match (self.first_send, self.last_send) {
            (Some(first), Some(last)) => last.duration_since(first),
            _ => Duration::ZERO,
        }
    }

    /// 실효 전송률 (bits/sec)
    ///
    /// n 바이트는 n-1 개의 간격을 가진다.
    pub fn effective_bps(&self) -> f64 {
        let window = self.send_window().as_secs_f64();
        if self.bytes_sent < 2 || window == 0.0 {
            return 0.0;
        }
        (self.bytes_sent - 1) as f64 * 8.0 / window
    }

    /// 전송 데이터 CRC32
    pub fn crc32(&self) -> u32 {
        self.crc
    }

    /// 통계 요약 문자열
    pub fn summary(&self) -> String {
        format!(
            "Elapsed: {:.2}s | Sent: {} bytes | Rate: {:.1} bps | CRC32: {:08X} | Input: {}",
            self.elapsed().as_secs_f64(),
            self.bytes_sent,
            self.effective_bps(),
            self.crc32(),
            if self.input_exhausted { "done" } else { "remaining" },
        )
    }
}

impl Default for TransferStats {
    fn default() -> Self {
        Self::new()
    }
}
