//! Resolution of declared output encodings.
//!
//! The writer emits UTF-8 internally; when a document declares another
//! encoding, a handler found here converts the bytes on their way to the
//! output channel. Handlers are backed by `encoding_rs`, so every label of
//! the WHATWG encoding registry is accepted.

use std::borrow::Cow;

use encoding_rs::Encoding;

/// Converter from the writer's internal UTF-8 to one declared encoding.
#[derive(Debug, Clone)]
pub struct XmlCharEncodingHandler {
    encoding: &'static Encoding,
}

impl XmlCharEncodingHandler {
    /// The canonical name of the target encoding, as it appears in the
    /// XML declaration.
    pub fn name(&self) -> &'static str {
        self.encoding.name()
    }

    /// `true` if the conversion is the identity.
    pub fn is_utf8(&self) -> bool {
        self.encoding == encoding_rs::UTF_8
    }

    /// Convert a UTF-8 chunk to the target encoding.
    ///
    /// Characters with no mapping in the target encoding are written as
    /// numeric character references, which keeps the produced XML
    /// equivalent after re-parsing.
    pub fn encode<'a>(&self, content: &'a str) -> Cow<'a, [u8]> {
        let (bytes, _, _) = self.encoding.encode(content);
        bytes
    }
}

/// Look up the handler for an encoding label.
///
/// Returns `None` if the label names no known encoding. UTF-16 labels
/// resolve to their output encoding (UTF-8), since a byte-oriented sink
/// cannot carry an unmarked UTF-16 stream.
#[doc(alias = "xmlFindCharEncodingHandler")]
pub fn find_encoding_handler(name: &str) -> Option<XmlCharEncodingHandler> {
    let encoding = Encoding::for_label(name.trim().as_bytes())?;
    Some(XmlCharEncodingHandler {
        encoding: encoding.output_encoding(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_common_labels() {
        assert_eq!(find_encoding_handler("UTF-8").unwrap().name(), "UTF-8");
        assert_eq!(find_encoding_handler("utf8").unwrap().name(), "UTF-8");
        assert_eq!(
            find_encoding_handler("ISO-8859-1").unwrap().name(),
            "windows-1252"
        );
        assert!(find_encoding_handler("no-such-charset").is_none());
    }

    #[test]
    fn encodes_unmappable_as_charref() {
        let handler = find_encoding_handler("ascii").unwrap();
        assert_eq!(handler.encode("a\u{3042}b").as_ref(), b"a&#12354;b");
    }
}
