//! 에러 타입 정의

use std::path::PathBuf;

use thiserror::Error;

/// rlsend 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO 에러: {0}")]
    Io(#[from] std::io::Error),

    #[error("시리얼 포트 에러: {0}")]
    Serial(#[from] serialport::Error),

    #[error("ASCII가 아닌 바이트 수신: 0x{byte:02X}")]
    NonAsciiByte { byte: u8 },

    #[error("입력 파일 없음: {path:?}")]
    InputNotFound { path: PathBuf },

    #[error("유효하지 않은 전송 속도: {value}")]
    InvalidRate { value: String },

    #[error("잘못된 사용법: {0}")]
    Usage(String),

    #[error("워커 스레드 패닉: {worker}")]
    WorkerPanicked { worker: &'static str },
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, Error>;
