//! 링크(채널) 추상화 및 시리얼 포트 구현
//!
//! 스캐너는 읽기 쪽만, 라이터는 쓰기 쪽만 사용하므로 채널을 두 반쪽으로
//! 나눠 각 스레드가 소유한다. 채널 자체에는 락이 없다.

use std::io::{self, Read, Write};
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::info;

use crate::Result;

/// 링크 수신 쪽
pub trait LinkReader: Send {
    /// 지금 바로 읽을 수 있는 바이트 수
    fn bytes_waiting(&mut self) -> io::Result<usize>;

    /// 한 바이트 읽기. 읽기 타임아웃이면 `Ok(None)`
    fn read_byte(&mut self) -> io::Result<Option<u8>>;
}

/// 링크 송신 쪽
pub trait LinkWriter: Send {
    /// 버퍼 전체 쓰기. 쓴 바이트 수 반환
    fn write_bytes(&mut self, buf: &[u8]) -> io::Result<usize>;
}

/// 열린 시리얼 포트
pub struct SerialLink {
    port: Box<dyn SerialPort>,
}

impl SerialLink {
    /// 포트 열기 (8N1, 흐름 제어 없음)
    pub fn open(name: &str, baud_rate: u32, read_timeout: Duration) -> Result<Self> {
        info!("open '{}' at {} baud ...", name, baud_rate);

        let port = serialport::new(name, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(read_timeout)
            .open()?;

        info!("'{}' opened", name);

        Ok(Self { port })
    }

    /// 읽기/쓰기 반쪽으로 분리
    pub fn split(self) -> Result<(SerialReader, SerialWriter)> {
        let write_port = self.port.try_clone()?;
        Ok((
            SerialReader { port: self.port },
            SerialWriter { port: write_port },
        ))
    }
}

/// 시리얼 포트 수신 반쪽
pub struct SerialReader {
    port: Box<dyn SerialPort>,
}

impl LinkReader for SerialReader {
    fn bytes_waiting(&mut self) -> io::Result<usize> {
        Ok(self.port.bytes_to_read()? as usize)
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut buf = [0u8; 1];
        match self.port.read(&mut buf) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(buf[0])),
            Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::Interrupted) => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

/// 시리얼 포트 송신 반쪽
pub struct SerialWriter {
    port: Box<dyn SerialPort>,
}

impl LinkWriter for SerialWriter {
    fn write_bytes(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.port.write_all(buf)?;
        Ok(buf.len())
    }
}
