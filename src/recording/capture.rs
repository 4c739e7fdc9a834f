//! Response capture wrapper

use std::io;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use hyper::StatusCode;
use parking_lot::Mutex;

use crate::context::ResponseWriter;

#[derive(Debug, Default)]
struct Captured {
    status: Option<StatusCode>,
    body: BytesMut,
}

/// Read side of a [`CaptureWriter`]
#[derive(Debug, Clone, Default)]
pub struct Tap(Arc<Mutex<Captured>>);

impl Tap {
    /// Create an empty tap
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// First status written through the wrapper
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.0.lock().status
    }

    /// Bytes written through the wrapper so far
    #[must_use]
    pub fn body(&self) -> Bytes {
        Bytes::copy_from_slice(&self.0.lock().body)
    }
}

/// Writer that tees everything into a [`Tap`] while forwarding to the
/// original sink
pub struct CaptureWriter {
    inner: Box<dyn ResponseWriter>,
    tap: Tap,
    wrote_header: bool,
}

impl CaptureWriter {
    /// Wrap `inner`, recording into `tap`
    #[must_use]
    pub fn new(inner: Box<dyn ResponseWriter>, tap: Tap) -> Self {
        Self {
            inner,
            tap,
            wrote_header: false,
        }
    }
}

impl ResponseWriter for CaptureWriter {
    fn write_header(&mut self, status: StatusCode) {
        self.inner.write_header(status);
        if self.wrote_header {
            return;
        }
        self.wrote_header = true;
        self.tap.0.lock().status = Some(status);
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.wrote_header {
            self.write_header(StatusCode::OK);
        }
        self.tap.0.lock().body.extend_from_slice(buf);
        self.inner.write(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::SharedBuffer;

    /// Sink that counts status lines and can fail writes
    struct FakeSink {
        statuses: Arc<Mutex<Vec<StatusCode>>>,
        fail: bool,
    }

    impl ResponseWriter for FakeSink {
        fn write_header(&mut self, status: StatusCode) {
            self.statuses.lock().push(status);
        }

        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.fail {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
            }
            Ok(buf.len())
        }
    }

    #[test]
    fn test_write_without_status_records_ok() {
        let tap = Tap::new();
        let sink = SharedBuffer::new();
        let mut writer = CaptureWriter::new(Box::new(sink.clone()), tap.clone());

        writer.write(b"hello ").unwrap();
        writer.write(b"world").unwrap();

        assert_eq!(tap.status(), Some(StatusCode::OK));
        assert_eq!(tap.body(), Bytes::from_static(b"hello world"));
        assert_eq!(sink.bytes(), Bytes::from_static(b"hello world"));
    }

    #[test]
    fn test_first_status_wins_but_all_forwarded() {
        let statuses = Arc::new(Mutex::new(Vec::new()));
        let sink = FakeSink {
            statuses: Arc::clone(&statuses),
            fail: false,
        };
        let tap = Tap::new();
        let mut writer = CaptureWriter::new(Box::new(sink), tap.clone());

        writer.write_header(StatusCode::CREATED);
        writer.write_header(StatusCode::CONFLICT);
        writer.write(b"x").unwrap();

        assert_eq!(tap.status(), Some(StatusCode::CREATED));
        assert_eq!(
            *statuses.lock(),
            vec![StatusCode::CREATED, StatusCode::CONFLICT]
        );
    }

    #[test]
    fn test_write_error_propagates_and_bytes_kept() {
        let sink = FakeSink {
            statuses: Arc::new(Mutex::new(Vec::new())),
            fail: true,
        };
        let tap = Tap::new();
        let mut writer = CaptureWriter::new(Box::new(sink), tap.clone());

        let err = writer.write(b"partial").unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(tap.body(), Bytes::from_static(b"partial"));
    }

    #[test]
    fn test_nothing_written() {
        let tap = Tap::new();
        let _writer = CaptureWriter::new(Box::new(SharedBuffer::new()), tap.clone());

        assert_eq!(tap.status(), None);
        assert!(tap.body().is_empty());
    }
}
