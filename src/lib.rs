//! # rlsend (Rate-Limited Sender)
//!
//! 시리얼 링크로 파일을 정해진 bps 이하로 흘려보내는 송신기
//!
//! ## 핵심 특징
//! - **키워드 게이트**: 수신측이 `writer_ready` 를 보내야 전송 시작
//! - **종료 키워드**: 수신측이 `writer_end` 를 보내면 전체 종료
//! - **크레딧 버킷 pacing**: 장기 평균은 목표 bps, 버스트는 최대 1바이트
//! - **스레드 2개 + 수퍼바이저**: 수신 스캔과 송신 pacing 이 서로 독립

pub mod config;
pub mod error;
pub mod input;
pub mod link;
pub mod loopback;
pub mod matcher;
pub mod pacer;
pub mod scanner;
pub mod state;
pub mod stats;
pub mod supervisor;
pub mod writer;

pub use config::Config;
pub use error::{Error, Result};
pub use input::InputCursor;
pub use link::{LinkReader, LinkWriter, SerialLink};
pub use matcher::KeywordMatcher;
pub use pacer::Pacer;
pub use scanner::KeywordScanner;
pub use state::{SharedState, StopReason};
pub use stats::TransferStats;
pub use supervisor::{Supervisor, TransferReport};
pub use writer::RateLimitedWriter;

/// 전송 시작 키워드
pub const HANDSHAKE_WORD: &str = "writer_ready";

/// 종료 키워드
pub const TERMINATE_WORD: &str = "writer_end";

/// 기본 목표 전송률 (bits/sec)
pub const DEFAULT_TARGET_BPS: u32 = 300;

/// 링크 보드레이트
pub const DEFAULT_BAUD_RATE: u32 = 9600;
