//! rlsend - 키워드 게이트 속도 제한 송신기
//!
//! 수신 장치가 `writer_ready` 를 보내면 파일을 목표 bps 로 흘려보내고,
//! `writer_end` 를 보내면 종료한다.
//!
//! 사용법:
//!   rlsend <port> <file> [<target_bps>] [-q] [-v]
//!
//! 예시:
//!   # 기본 300bps
//!   rlsend /dev/ttyACM0 firmware.hex
//!
//!   # 1200bps, 수신 에코 끔
//!   rlsend COM3 data.txt 1200 -q

use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use rlsend::config::USAGE;
use rlsend::scanner::EchoSink;
use rlsend::{Config, Error, InputCursor, SerialLink, Supervisor, TransferReport};

const HELP: &str = r#"rlsend - keyword-gated, rate-limited serial file sender

Waits for the receiver to send 'writer_ready', then streams the file at the
target rate. Stops when the receiver sends 'writer_end' (or on Ctrl+C).

usage:
  rlsend <port> <file> [<target_bps>] [OPTIONS]

arguments:
  <port>          serial port (e.g. /dev/ttyACM0, COM3), opened at 9600 8N1
  <file>          file to send
  <target_bps>    target rate in bits/sec (default: 300)

options:
  -q, --quiet     do not echo received characters
  -v, --verbose   more logging (repeat for trace); RUST_LOG overrides
  -h, --help      print this help
"#;

fn init_logging(verbosity: u8) -> Result<(), Box<dyn std::error::Error>> {
    let default_level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

async fn interrupted() {
    // 시그널 등록에 실패하면 중단 없이 종료 키워드만 기다린다
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

async fn run(config: Config) -> rlsend::Result<TransferReport> {
    info!("input: {:?}", config.file_path);
    let input = InputCursor::open(&config.file_path)?;

    let link = SerialLink::open(&config.port, config.baud_rate, config.read_timeout)?;
    let (reader, writer) = link.split()?;

    let echo = config
        .echo
        .then(|| Box::new(std::io::stdout()) as EchoSink);

    let supervisor = Supervisor::spawn(&config, reader, writer, input, echo)?;
    supervisor.run(interrupted()).await
}

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.iter().any(|a| a == "-h" || a == "--help") {
        println!("{}", HELP);
        return ExitCode::SUCCESS;
    }

    let config = match Config::from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("{}", USAGE);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(config.verbosity) {
        eprintln!("logging init failed: {}", e);
    }

    match run(config).await {
        Ok(report) if report.is_clean() => {
            info!("finished: {:?}", report.stop_reason);
            ExitCode::SUCCESS
        }
        Ok(report) => {
            for e in &report.errors {
                error!("{}", e);
            }
            ExitCode::FAILURE
        }
        Err(e @ Error::Serial(_)) => {
            error!("{}", e);
            eprintln!("{}", USAGE);
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
