//! 스캐너/라이터/수퍼바이저 공유 상태
//!
//! 두 플래그 모두 단방향으로만 바뀐다.
//! - `running`: true -> false (한 번)
//! - `transfer_enabled`: false -> true (한 번)

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

/// 실행 종료 사유
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// 수신측이 종료 키워드를 보냄
    Terminated,
    /// 운영자 중단 (Ctrl+C 등)
    Interrupted,
    /// 워커의 치명적 I/O 에러
    Failed,
}

/// 공유 실행 상태
#[derive(Debug)]
pub struct SharedState {
    running: AtomicBool,
    transfer_enabled: AtomicBool,
    /// 처음 `running`을 내린 쪽의 사유
    stop_reason: Mutex<Option<StopReason>>,
}

impl SharedState {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            transfer_enabled: AtomicBool::new(false),
            stop_reason: Mutex::new(None),
        }
    }

    /// 실행 중 여부
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// 전송 허용 여부
    pub fn is_transfer_enabled(&self) -> bool {
        self.transfer_enabled.load(Ordering::SeqCst)
    }

    /// 전송 허용. 이번 호출로 처음 허용됐으면 true
    pub fn enable_transfer(&self) -> bool {
        !self.transfer_enabled.swap(true, Ordering::SeqCst)
    }

    /// 실행 중지 요청. 이번 호출이 `running`을 내렸으면 true
    ///
    /// 사유는 처음 중지시킨 호출의 것만 남는다.
    pub fn stop(&self, reason: StopReason) -> bool {
        let mut slot = self.stop_reason.lock();
        let first = self.running.swap(false, Ordering::SeqCst);
        if first {
            *slot = Some(reason);
        }
        first
    }

    /// 중지 사유 (실행 중이면 None)
    pub fn stop_reason(&self) -> Option<StopReason> {
        *self.stop_reason.lock()
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
