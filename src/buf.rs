use std::mem::take;

use anyhow::{bail, ensure};

/// Growable byte buffer backing the output sink.
///
/// Unlike a plain `Vec<u8>`, the buffer latches failures: once an error has
/// occurred every further operation is refused, so a partially written
/// buffer is never silently extended.
#[derive(Debug, Clone, Default)]
pub(crate) struct XmlBuf {
    content: Vec<u8>,
    failed: bool,
}

impl XmlBuf {
    pub(crate) fn len(&self) -> usize {
        self.content.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub(crate) fn push_bytes(&mut self, bytes: &[u8]) -> Result<(), anyhow::Error> {
        ensure!(
            !self.failed,
            "Failed to push: some errors have already occured."
        );

        if bytes.len() >= usize::MAX - self.len() {
            self.failed = true;
            bail!("growing buffer past SIZE_MAX");
        }
        self.content.extend_from_slice(bytes);
        Ok(())
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.content
    }

    /// Take the accumulated bytes out of the buffer, leaving it empty.
    pub(crate) fn detach(&mut self) -> Vec<u8> {
        take(&mut self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_detach() {
        let mut buf = XmlBuf::default();
        buf.push_bytes(b"<a>").unwrap();
        buf.push_bytes(b"text").unwrap();
        assert_eq!(buf.as_bytes(), b"<a>text");
        assert_eq!(buf.len(), 7);
        assert_eq!(buf.detach(), b"<a>text");
        assert!(buf.is_empty());
        buf.push_bytes(b"more").unwrap();
        assert_eq!(buf.as_bytes(), b"more");
    }
}
