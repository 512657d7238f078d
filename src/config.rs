//! 송신 설정

use std::path::PathBuf;
use std::time::Duration;

use crate::{Error, Result};
use crate::{DEFAULT_BAUD_RATE, DEFAULT_TARGET_BPS, HANDSHAKE_WORD, TERMINATE_WORD};

/// 사용법 문자열
pub const USAGE: &str =
    "usage : rlsend {port_name (e.g. /dev/ttyACM0)} {filename to send} ( {target_bps (default: 300)} ) [-q] [-v]";

/// rlsend 설정
#[derive(Debug, Clone)]
pub struct Config {
    /// 시리얼 포트 이름
    pub port: String,

    /// 전송할 파일 경로
    pub file_path: PathBuf,

    /// 목표 전송률 (bits/sec, 애플리케이션 바이트 기준)
    pub target_bps: u32,

    /// 링크 보드레이트. 목표 전송률과는 무관
    pub baud_rate: u32,

    /// 링크 읽기 타임아웃
    pub read_timeout: Duration,

    /// 전송 시작 키워드
    pub handshake_word: String,

    /// 종료 키워드
    pub terminate_word: String,

    /// 스캐너 폴링 간격
    pub scan_poll_interval: Duration,

    /// 라이터 루프 간격
    pub write_poll_interval: Duration,

    /// 수퍼바이저 종료 확인 간격
    pub supervisor_poll_interval: Duration,

    /// 진행 로그 주기 (바이트)
    pub progress_every: u64,

    /// 수신 문자를 콘솔에 에코
    pub echo: bool,

    /// 로그 상세도 (0: info, 1: debug, 2+: trace)
    pub verbosity: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: String::new(),
            file_path: PathBuf::new(),
            target_bps: DEFAULT_TARGET_BPS,
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: Duration::from_millis(100),
            handshake_word: HANDSHAKE_WORD.to_string(),
            terminate_word: TERMINATE_WORD.to_string(),
            scan_poll_interval: Duration::from_micros(100),
            write_poll_interval: Duration::from_micros(100),
            supervisor_poll_interval: Duration::from_secs(1),
            progress_every: 400,
            echo: true,
            verbosity: 0,
        }
    }
}

impl Config {
    /// 새 설정 생성
    pub fn new(port: impl Into<String>, file_path: impl Into<PathBuf>) -> Self {
        Self {
            port: port.into(),
            file_path: file_path.into(),
            ..Self::default()
        }
    }

    /// 바이트당 목표 간격
    pub fn target_interval(&self) -> Duration {
        Duration::from_secs_f64(8.0 / self.target_bps.max(1) as f64)
    }

    /// 명령행 인자 파싱 (프로그램 이름 제외)
    ///
    /// `<port> <file> [<target_bps>]` 와 `-q`, `-v` 플래그.
    /// 입력 파일이 없으면 `InputNotFound`.
    pub fn from_args<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut positional = Vec::new();
        let mut config = Config::default();

        for arg in args {
            match arg.as_ref() {
                "--quiet" | "-q" => config.echo = false,
                "--verbose" | "-v" => config.verbosity = config.verbosity.saturating_add(1),
                "-vv" => config.verbosity = config.verbosity.saturating_add(2),
                other if other.starts_with('-') && other.len() > 1 => {
                    return Err(Error::Usage(format!("unknown option '{}'", other)));
                }
                other => positional.push(other.to_string()),
            }
        }

        let mut positional = positional.into_iter();
        let (port, file) = match (positional.next(), positional.next()) {
            (Some(port), Some(file)) => (port, file),
            _ => return Err(Error::Usage("port and file are required".into())),
        };

        config.port = port;
        config.file_path = PathBuf::from(file);

        if let Some(rate) = positional.next() {
            config.target_bps = match rate.parse::<u32>() {
                Ok(bps) if bps > 0 => bps,
                _ => return Err(Error::InvalidRate { value: rate }),
            };
        }

        if let Some(extra) = positional.next() {
            return Err(Error::Usage(format!("unexpected argument '{}'", extra)));
        }

        if !config.file_path.is_file() {
            return Err(Error::InputNotFound {
                path: config.file_path,
            });
        }

        Ok(config)
    }
}
