//! 전송할 입력 소스
//!
//! 한 바이트씩 앞으로만 읽는다. 읽기 실패는 에러가 아니라 입력의 끝으로 본다.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use bytes::{Buf, Bytes};
use tracing::{debug, warn};

use crate::{Error, Result};

/// 입력 커서
pub struct InputCursor {
    source: Box<dyn Read + Send>,
    /// 지금까지 꺼낸 바이트 수
    position: u64,
    exhausted: bool,
}

impl InputCursor {
    /// 파일 열기. 일반 파일이 아니면 `InputNotFound`
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::InputNotFound {
                path: path.to_path_buf(),
            });
        }
        let file = File::open(path)?;
        debug!("input opened: {:?}", path);
        Ok(Self::from_reader(BufReader::new(file)))
    }

    /// 메모리 데이터에서 생성
    pub fn from_bytes(data: Bytes) -> Self {
        Self::from_reader(data.reader())
    }

    pub fn from_reader(reader: impl Read + Send + 'static) -> Self {
        Self {
            source: Box::new(reader),
            position: 0,
            exhausted: false,
        }
    }

    /// 다음 바이트. 끝났으면 None
    pub fn next_byte(&mut self) -> Option<u8> {
        if self.exhausted {
            return None;
        }

        let mut buf = [0u8; 1];
        loop {
            match self.source.read(&mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    self.position += 1;
                    return Some(buf[0]);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!("input read failed at byte {}, treating as end: {}", self.position, e);
                    break;
                }
            }
        }

        self.exhausted = true;
        None
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}
