//! 프로세스 내 가상 링크
//!
//! 실제 시리얼 포트 없이 송신자를 구동하기 위한 링크. 한쪽은
//! [`LoopbackReader`]/[`LoopbackWriter`] 로 송신자에게 넘기고, 다른 쪽
//! [`RemoteEnd`] 로 수신 장치 역할(키워드 주입, 수신 데이터 확인)을 한다.

use std::io;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender, TryRecvError};

use crate::link::{LinkReader, LinkWriter};

/// 가상 링크 생성
pub fn link(read_timeout: Duration) -> (LoopbackReader, LoopbackWriter, RemoteEnd) {
    let (to_local_tx, to_local_rx) = unbounded::<u8>();
    let (from_local_tx, from_local_rx) = unbounded::<Bytes>();

    (
        LoopbackReader {
            rx: to_local_rx,
            pending: None,
            read_timeout,
        },
        LoopbackWriter { tx: from_local_tx },
        RemoteEnd {
            tx: to_local_tx,
            rx: from_local_rx,
            received: BytesMut::new(),
        },
    )
}

/// 송신자 쪽 수신 반쪽
pub struct LoopbackReader {
    rx: Receiver<u8>,
    /// 끊김 확인 중에 꺼낸 바이트
    pending: Option<u8>,
    read_timeout: Duration,
}

impl LinkReader for LoopbackReader {
    /// 원격이 끊기고 큐가 비었으면 시리얼 포트처럼 에러
    fn bytes_waiting(&mut self) -> io::Result<usize> {
        let queued = self.rx.len() + self.pending.is_some() as usize;
        if queued > 0 {
            return Ok(queued);
        }
        match self.rx.try_recv() {
            Ok(b) => {
                self.pending = Some(b);
                Ok(1)
            }
            Err(TryRecvError::Empty) => Ok(0),
            Err(TryRecvError::Disconnected) => Err(io::ErrorKind::BrokenPipe.into()),
        }
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        if let Some(b) = self.pending.take() {
            return Ok(Some(b));
        }
        match self.rx.recv_timeout(self.read_timeout) {
            Ok(b) => Ok(Some(b)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(io::ErrorKind::BrokenPipe.into()),
        }
    }
}

/// 송신자 쪽 송신 반쪽
pub struct LoopbackWriter {
    tx: Sender<Bytes>,
}

impl LinkWriter for LoopbackWriter {
    fn write_bytes(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.tx
            .send(Bytes::copy_from_slice(buf))
            .map_err(|_| io::Error::from(io::ErrorKind::BrokenPipe))?;
        Ok(buf.len())
    }
}

/// 수신 장치 쪽
pub struct RemoteEnd {
    tx: Sender<u8>,
    rx: Receiver<Bytes>,
    received: BytesMut,
}

impl RemoteEnd {
    /// 송신자에게 바이트 주입 (예: 키워드)
    pub fn inject(&self, data: &[u8]) {
        for &b in data {
            // 송신자 쪽이 이미 닫혔으면 버린다
            let _ = self.tx.send(b);
        }
    }

    /// 지금까지 수신한 데이터
    pub fn received(&mut self) -> Bytes {
        while let Ok(chunk) = self.rx.try_recv() {
            self.received.extend_from_slice(&chunk);
        }
        self.received.clone().freeze()
    }

    /// 지금까지 수신한 바이트 수
    pub fn received_len(&mut self) -> usize {
        self.received().len()
    }

    /// 연결 끊기. 이후 송신자의 쓰기는 실패한다.
    pub fn hang_up(self) {}
}
