//! Shared test fixtures for this crate.

use std::io::Write;
use std::sync::{Arc, Mutex};

/// Clone-able byte sink shared between a test and the renderer it feeds.
#[derive(Clone, Default)]
pub(crate) struct CaptureSink(Arc<Mutex<Vec<u8>>>);

impl CaptureSink {
    pub(crate) fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for CaptureSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
