use std::{
    fs::File,
    io::{self, Write},
    str::from_utf8,
};

use crate::{buf::XmlBuf, encoding::XmlCharEncodingHandler, error::XmlWriterError};

use super::{MINLEN, resolve_output_path};

/// Byte destination of a writer.
///
/// Three kinds of destination share this one type: a growable in-memory
/// buffer (no context), an owned file handle, and a borrowed stream. Bytes
/// are accumulated in UTF-8 and drained to the context on flush, close, or
/// once enough data is pending; a declared-encoding handler converts the
/// bytes on the way out.
///
/// A borrowed stream is released, never closed: dropping the boxed `&mut W`
/// only ends the borrow, so other holders of the stream keep using it after
/// [`close`](Self::close).
#[doc(alias = "xmlOutputBuffer")]
#[derive(Default)]
pub struct XmlOutputBuffer<'a> {
    context: Option<Box<dyn Write + 'a>>,
    encoder: Option<XmlCharEncodingHandler>,
    buffer: XmlBuf,
    // total number of bytes handed to the context
    written: usize,
    error: Option<io::ErrorKind>,
    closed: bool,
}

impl<'a> XmlOutputBuffer<'a> {
    /// Create an output buffer accumulating in memory.
    ///
    /// The accumulated text is read back with [`extract`](Self::extract).
    #[doc(alias = "xmlAllocOutputBuffer")]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an output buffer writing to a local file.
    ///
    /// `uri` may be a plain path, `file:///...` or `file://localhost/...`;
    /// other schemes are invalid destinations. The parent directory must
    /// exist. The file is created or truncated immediately, so construction
    /// failures surface here and never produce a half-open buffer.
    #[doc(alias = "xmlOutputBufferCreateFilename")]
    pub fn from_uri(uri: &str) -> Result<Self, XmlWriterError> {
        let path = resolve_output_path(uri)?;
        let file = File::options()
            .write(true)
            .truncate(true)
            .create(true)
            .open(&path)
            .map_err(|err| {
                XmlWriterError::Construction(format!(
                    "cannot open \"{}\": {err}",
                    path.display()
                ))
            })?;
        Ok(Self {
            context: Some(Box::new(file)),
            encoder: None,
            buffer: XmlBuf::default(),
            written: 0,
            error: None,
            closed: false,
        })
    }

    /// Create an output buffer on an already-open stream.
    ///
    /// The buffer does not take ownership of the stream's resource: closing
    /// the buffer flushes pending bytes and releases the reference, nothing
    /// more. Pass `&mut stream` to keep using the stream afterwards.
    #[doc(alias = "xmlOutputBufferCreateIO")]
    pub fn from_writer(writer: impl Write + 'a) -> Self {
        Self {
            context: Some(Box::new(writer)),
            encoder: None,
            buffer: XmlBuf::default(),
            written: 0,
            error: None,
            closed: false,
        }
    }

    /// `true` for the memory variant.
    pub fn is_memory(&self) -> bool {
        self.context.is_none() && !self.closed
    }

    /// Total number of bytes handed to the underlying context so far.
    pub fn written(&self) -> usize {
        self.written
    }

    pub(crate) fn set_encoder(&mut self, encoder: Option<XmlCharEncodingHandler>) {
        self.encoder = encoder.filter(|e| !e.is_utf8());
    }

    fn check_usable(&self) -> io::Result<()> {
        if self.closed {
            return Err(io::Error::other("output buffer is closed"));
        }
        if let Some(kind) = self.error {
            return Err(io::Error::new(kind, "output buffer already failed"));
        }
        Ok(())
    }

    /// Append raw bytes to the output.
    ///
    /// Returns the number of bytes accepted. Once a write to the context
    /// has failed, every further call fails without touching the context.
    #[doc(alias = "xmlOutputBufferWrite")]
    pub fn write_bytes(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.check_usable()?;

        self.buffer
            .push_bytes(buf)
            .map_err(|err| io::Error::other(err.to_string()))?;
        if self.context.is_some() && self.buffer.len() >= MINLEN {
            self.drain_to_context()?;
        }
        Ok(buf.len())
    }

    /// Append a string to the output.
    #[doc(alias = "xmlOutputBufferWriteString")]
    pub fn write_str(&mut self, s: &str) -> io::Result<usize> {
        self.write_bytes(s.as_bytes())
    }

    /// Append a string, passing it through `escaping` first.
    #[doc(alias = "xmlOutputBufferWriteEscape")]
    pub(crate) fn write_str_with_escape(
        &mut self,
        s: &str,
        escaping: fn(&str, &mut String),
    ) -> io::Result<usize> {
        let mut escaped = String::with_capacity(s.len());
        escaping(s, &mut escaped);
        self.write_str(&escaped)
    }

    /// Push everything pending through the encoder into the context.
    fn drain_to_context(&mut self) -> io::Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let Some(context) = self.context.as_mut() else {
            return Ok(());
        };

        let pending = self.buffer.detach();
        let res = match self.encoder.as_ref() {
            Some(encoder) => match from_utf8(&pending) {
                Ok(utf8) => {
                    let converted = encoder.encode(utf8);
                    context.write_all(&converted).map(|_| converted.len())
                }
                Err(_) => Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "cannot convert non-UTF-8 output",
                )),
            },
            None => context.write_all(&pending).map(|_| pending.len()),
        };
        match res {
            Ok(len) => {
                self.written += len;
                Ok(())
            }
            Err(err) => {
                self.error = Some(err.kind());
                Err(err)
            }
        }
    }

    /// Flush pending bytes to the I/O channel.
    ///
    /// Returns the number of bytes handed to the context by this call; the
    /// memory variant has no channel to flush to and reports `0`.
    #[doc(alias = "xmlOutputBufferFlush")]
    pub fn flush(&mut self) -> io::Result<usize> {
        self.check_usable()?;

        let before = self.written;
        self.drain_to_context()?;
        if let Some(context) = self.context.as_mut() {
            if let Err(err) = context.flush() {
                self.error = Some(err.kind());
                return Err(err);
            }
        }
        Ok(self.written - before)
    }

    /// Flush and release the output channel. Repeated calls are no-ops.
    ///
    /// The file variant closes its handle here; the stream variant only
    /// drops its reference to the shared stream.
    pub fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        let res = if self.error.is_none() {
            self.flush().map(|_| ())
        } else {
            Ok(())
        };
        self.context = None;
        self.closed = true;
        res
    }

    /// Read the text accumulated by the memory variant.
    ///
    /// With `reset` the buffer is drained, so a later call returns only
    /// what was written in between; without it the content is copied and
    /// kept. Non-memory variants hold their bytes in the context and
    /// return an empty string.
    #[doc(alias = "xmlOutputBufferGetContent")]
    pub fn extract(&mut self, reset: bool) -> String {
        if self.context.is_some() {
            return String::new();
        }
        if reset {
            String::from_utf8_lossy(&self.buffer.detach()).into_owned()
        } else {
            String::from_utf8_lossy(self.buffer.as_bytes()).into_owned()
        }
    }
}

impl Drop for XmlOutputBuffer<'_> {
    fn drop(&mut self) {
        self.close().ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_extract_with_and_without_reset() {
        let mut out = XmlOutputBuffer::new();
        out.write_str("<a/>").unwrap();
        assert_eq!(out.extract(false), "<a/>");
        assert_eq!(out.extract(true), "<a/>");
        assert_eq!(out.extract(true), "");
        out.write_str("<b/>").unwrap();
        assert_eq!(out.extract(true), "<b/>");
    }

    #[test]
    fn close_is_idempotent_and_stops_writes() {
        let mut sink = Vec::new();
        let mut out = XmlOutputBuffer::from_writer(&mut sink);
        out.write_str("data").unwrap();
        out.close().unwrap();
        out.close().unwrap();
        assert!(out.write_str("more").is_err());
        drop(out);
        assert_eq!(sink, b"data");
    }

    #[test]
    fn declared_encoding_converts_on_drain() {
        let mut sink = Vec::new();
        {
            let mut out = XmlOutputBuffer::from_writer(&mut sink);
            out.set_encoder(crate::encoding::find_encoding_handler("latin1"));
            out.write_str("caf\u{e9}").unwrap();
            out.close().unwrap();
        }
        assert_eq!(sink, b"caf\xe9");
    }
}
