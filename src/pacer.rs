//! 바이트 단위 pacing (크레딧 버킷)
//!
//! 목표 bps 에서 바이트 하나당 간격(`interval = 8 / bps` 초)을 구하고,
//! 폴링 지터로 생긴 여유 시간을 버킷에 모아 다음 전송에 사용한다.
//! 버킷은 `[0, interval]` 로 제한되므로 균일 간격 대비 최대 1바이트까지만
//! 앞당겨 보낼 수 있다.

use std::time::{Duration, Instant};

/// 바이트당 비트 수
pub const BITS_PER_BYTE: f64 = 8.0;

/// pacing 상태
#[derive(Debug, Clone)]
pub struct Pacer {
    /// 바이트당 목표 간격 (초)
    interval: f64,
    /// 마지막 전송 (또는 대기 중 기준) 시각
    prev_tick: Instant,
    /// 누적 크레딧 (초), `[0, interval]`
    bucket: f64,
}

impl Pacer {
    /// `target_bps` 는 0보다 커야 한다.
    pub fn new(target_bps: u32, now: Instant) -> Self {
        Self {
            interval: BITS_PER_BYTE / target_bps.max(1) as f64,
            prev_tick: now,
            bucket: 0.0,
        }
    }

    /// 전송 비허용 상태에서 호출. 기준 시각만 앞으로 당기고 크레딧은 쌓지 않는다.
    pub fn hold(&mut self, now: Instant) {
        self.prev_tick = now;
    }

    /// 지금 한 바이트를 보내도 되는지 확인
    ///
    /// true 를 반환하면 크레딧을 소비한 것이므로 호출자는 한 바이트를
    /// 보내야 한다 (입력이 끝났으면 보낼 것이 없어도 소비된다).
    pub fn poll(&mut self, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.prev_tick).as_secs_f64();

        if elapsed + self.bucket < self.interval {
            return false;
        }

        self.bucket = (self.bucket + elapsed - self.interval).clamp(0.0, self.interval);
        self.prev_tick = now;
        true
    }

    /// 바이트당 목표 간격
    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(self.interval)
    }

    /// 현재 크레딧 (초)
    pub fn bucket(&self) -> f64 {
        self.bucket
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn ms(v: f64) -> Duration {
        Duration::from_secs_f64(v / 1000.0)
    }

    #[test]
    fn test_interval_from_bps() {
        let t0 = Instant::now();
        assert!((Pacer::new(8, t0).interval().as_secs_f64() - 1.0).abs() < 1e-9);
        assert!((Pacer::new(320, t0).interval().as_secs_f64() - 0.025).abs() < 1e-9);
    }

    #[test]
    fn test_not_eligible_before_interval() {
        let t0 = Instant::now();
        let mut pacer = Pacer::new(320, t0);

        assert!(!pacer.poll(t0 + ms(10.0)));
        assert!(!pacer.poll(t0 + ms(24.0)));
        assert!(pacer.poll(t0 + ms(25.5)));
        assert!(!pacer.poll(t0 + ms(26.5)));
    }

    #[test]
    fn test_bucket_clamped_to_one_interval() {
        let t0 = Instant::now();
        let mut pacer = Pacer::new(320, t0);

        // 오래 쉬어도 크레딧은 한 간격까지만
        assert!(pacer.poll(t0 + Duration::from_secs(10)));
        assert!((pacer.bucket() - 0.025).abs() < 1e-9);

        // 버킷으로 즉시 한 바이트, 그다음은 다시 간격 대기
        let t1 = t0 + Duration::from_secs(10);
        assert!(pacer.poll(t1));
        assert_eq!(pacer.bucket(), 0.0);
        assert!(!pacer.poll(t1 + ms(20.0)));
        assert!(pacer.poll(t1 + ms(25.5)));
    }

    #[test]
    fn test_hold_discards_idle_time() {
        let t0 = Instant::now();
        let mut pacer = Pacer::new(320, t0);

        // 비허용 상태로 1초 대기
        let mut t = t0;
        for _ in 0..100 {
            t += ms(10.0);
            pacer.hold(t);
        }

        // 허용 직후에는 버스트 없음
        assert!(!pacer.poll(t + ms(1.0)));
        assert!(!pacer.poll(t + ms(24.0)));
        assert!(pacer.poll(t + ms(25.5)));
    }

    #[test]
    fn test_long_run_rate_converges() {
        let t0 = Instant::now();
        let mut pacer = Pacer::new(1200, t0);
        let mut sent = 0u32;
        let mut t = t0;

        // 1ms 간격으로 10초 폴링
        for _ in 0..10_000 {
            t += ms(1.0);
            if pacer.poll(t) {
                sent += 1;
            }
        }

        // 1200bps = 150 B/s
        assert!((1450..=1510).contains(&sent), "sent {}", sent);
    }

    #[test]
    fn test_spacing_never_below_interval_with_jittered_polls() {
        let mut rng = rand::thread_rng();

        for &bps in &[300u32, 1200, 9600] {
            let t0 = Instant::now();
            let mut pacer = Pacer::new(bps, t0);
            let interval = pacer.interval().as_secs_f64();
            let max_step = interval / 10.0;

            let mut t = t0;
            let mut last_send: Option<Instant> = None;
            let mut sends = 0;

            while sends < 500 {
                t += Duration::from_secs_f64(rng.gen_range(0.0..max_step));
                if pacer.poll(t) {
                    if let Some(prev) = last_send {
                        let gap = t.duration_since(prev).as_secs_f64();
                        assert!(gap >= interval * 0.9, "bps {} gap {} < {}", bps, gap, interval);
                    }
                    last_send = Some(t);
                    sends += 1;
                }
            }
        }
    }
}
