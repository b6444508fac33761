//! Provide methods and data structures for text writing APIs.
//!
//! This module is based on `libxml/xmlwriter.h` and `xmlwriter.c` in
//! `libxml2-v2.11.8`.
//! Please refer to original libxml2 documents also.
//!
//! The original API has functions that support the format, but not here.
//! It is simpler and more natural to limit the API to writing a single
//! string, since it is easy to write the format to a single String using
//! `format!`.

// Copyright of the original code is the following.
// --------
// Summary: text writing API for XML
// Description: text writing API for XML
//
// Copy: See Copyright for the status of this software.
//
// Author: Alfred Mickautsch <alfred@mickautsch.de>
// --------
// xmlwriter.c: XML text writer implementation
//
// For license and disclaimer see the license and disclaimer of libxml2.
//
// alfred@mickautsch.de

use std::{borrow::Cow, cell::Cell, collections::VecDeque, io::Write, rc::Rc};

use crate::{
    encoding::find_encoding_handler,
    error::XmlWriterError,
    io::{XmlOutputBuffer, xml_escape_attribute, xml_escape_content},
    name::{validate_name, validate_ncname},
};

const XML_DEFAULT_VERSION: &str = "1.0";

// Types are kept private
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum XmlTextWriterState {
    None,
    Name,
    Attribute,
    Text,
    PI,
    PIText,
    CDATA,
    Comment,
    DTD,
    DTDText,
    DTDElem,
    DTDElemText,
    DTDAttl,
    DTDAttlText,
    DTDEntity,
    DTDEntityText,
    DTDPEntity,
}

struct XmlTextWriterStackEntry {
    name: Option<String>,
    state: Cell<XmlTextWriterState>,
}

struct XmlTextWriterNsStackEntry {
    prefix: String,
    uri: String,
    elem: Option<Rc<XmlTextWriterStackEntry>>,
}

/// Streaming XML writer.
///
/// The writer owns one [`XmlOutputBuffer`] and a stack of open node frames
/// (innermost frame at the front). Structural validity is enforced before
/// any byte is emitted: an operation that is invalid in the current nesting
/// state, or that receives a malformed name, fails without touching the
/// output.
///
/// Once [`close`](Self::close) has been called the writer is finished for
/// good; every further operation reports a state error. Construct a new
/// writer to produce another document.
pub struct XmlTextWriter<'a> {
    // output buffer
    out: XmlOutputBuffer<'a>,
    // element name stack
    nodes: VecDeque<Rc<XmlTextWriterStackEntry>>,
    // namespace declarations pending on the open start tag
    nsstack: Vec<XmlTextWriterNsStackEntry>,
    // enable indent
    indent: bool,
    // internal indent flag
    doindent: bool,
    // indent character
    ichar: Cow<'static, str>,
    // character used for quoting attribute values
    qchar: u8,
    // document declaration has been written
    started: bool,
    closed: bool,
}

impl<'a> XmlTextWriter<'a> {
    /// Create a new writer on an existing output buffer.
    ///
    /// The buffer is owned by the writer and released when the writer is
    /// closed or dropped.
    #[doc(alias = "xmlNewTextWriter")]
    pub fn new(out: XmlOutputBuffer<'a>) -> Self {
        Self {
            out,
            nodes: VecDeque::new(),
            nsstack: Vec::new(),
            indent: false,
            doindent: true,
            ichar: Cow::Borrowed(" "),
            qchar: b'"',
            started: false,
            closed: false,
        }
    }

    /// Create a new writer accumulating in memory.
    ///
    /// Read the produced text back with [`output_memory`](Self::output_memory).
    #[doc(alias = "xmlNewTextWriterMemory")]
    pub fn from_memory() -> Self {
        Self::new(XmlOutputBuffer::new())
    }

    /// Create a new writer with `uri` as output.
    ///
    /// `uri` may be a plain path, `file:///...` or `file://localhost/...`;
    /// any other scheme is rejected, and so is a path whose parent
    /// directory does not exist.
    #[doc(alias = "xmlNewTextWriterFilename")]
    pub fn from_filename(uri: &str) -> Result<Self, XmlWriterError> {
        Ok(Self::new(XmlOutputBuffer::from_uri(uri)?))
    }

    /// Create a new writer on an already-open stream.
    ///
    /// The stream stays owned by the caller; closing the writer flushes and
    /// releases the reference without closing the stream itself.
    pub fn from_writer(writer: impl Write + 'a) -> Self {
        Self::new(XmlOutputBuffer::from_writer(writer))
    }

    fn check_open(&self) -> Result<(), XmlWriterError> {
        if self.closed {
            return Err(XmlWriterError::state("invalid or uninitialized writer"));
        }
        Ok(())
    }

    fn check_name(param: &'static str, value: &str) -> Result<(), XmlWriterError> {
        validate_name(value).map_err(|_| XmlWriterError::invalid_name(param, value))
    }

    fn check_prefix(value: Option<&str>) -> Result<(), XmlWriterError> {
        if let Some(prefix) = value {
            validate_ncname(prefix)
                .map_err(|_| XmlWriterError::invalid_name("prefix", prefix))?;
        }
        Ok(())
    }

    /// Write state dependent strings.
    ///
    /// Returns the number of bytes written.
    #[doc(alias = "xmlTextWriterHandleStateDependencies")]
    fn handle_state_dependencies(
        &mut self,
        p: &Rc<XmlTextWriterStackEntry>,
    ) -> Result<usize, XmlWriterError> {
        let mut sum = 0;
        match p.state.get() {
            XmlTextWriterState::Name => {
                // Output namespace declarations
                sum += self.output_nsdecl()?;
                sum += self.out.write_str(">")?;
                p.state.set(XmlTextWriterState::Text);
            }
            XmlTextWriterState::PI => {
                sum += self.out.write_str(" ")?;
                p.state.set(XmlTextWriterState::PIText);
            }
            XmlTextWriterState::DTD => {
                sum += self.out.write_str(" [")?;
                p.state.set(XmlTextWriterState::DTDText);
            }
            XmlTextWriterState::DTDElem => {
                sum += self.out.write_str(" ")?;
                p.state.set(XmlTextWriterState::DTDElemText);
            }
            XmlTextWriterState::DTDAttl => {
                sum += self.out.write_str(" ")?;
                p.state.set(XmlTextWriterState::DTDAttlText);
            }
            XmlTextWriterState::DTDEntity | XmlTextWriterState::DTDPEntity => {
                sum += self.out.write_bytes(&[b' ', self.qchar])?;
                p.state.set(XmlTextWriterState::DTDEntityText);
            }
            _ => {}
        }

        Ok(sum)
    }

    /// Enable or disable pretty-printing.
    ///
    /// Applies to output produced after the call; already-emitted bytes are
    /// not reformatted.
    #[doc(alias = "xmlTextWriterSetIndent")]
    pub fn set_indent(&mut self, indent: bool) {
        self.indent = indent;
        self.doindent = true;
    }

    /// Set the string one nesting level is indented by.
    #[doc(alias = "xmlTextWriterSetIndentString")]
    pub fn set_indent_string(&mut self, indent: &str) {
        self.ichar = Cow::Owned(indent.to_owned());
    }

    /// Set the character used for quoting attribute values.
    #[doc(alias = "xmlTextWriterSetQuoteChar")]
    pub fn set_quote_char(&mut self, quotechar: u8) -> Result<(), XmlWriterError> {
        if quotechar != b'\'' && quotechar != b'"' {
            return Err(XmlWriterError::InvalidArgument {
                param: "quotechar",
                expected: "a single or double quote",
                given: (quotechar as char).to_string(),
            });
        }
        self.qchar = quotechar;
        Ok(())
    }

    /// Flush the output buffer.
    ///
    /// Returns the number of bytes handed to the underlying channel.
    #[doc(alias = "xmlTextWriterFlush")]
    pub fn flush(&mut self) -> Result<usize, XmlWriterError> {
        self.check_open()?;
        Ok(self.out.flush()?)
    }

    /// Read back the text accumulated by a memory writer.
    ///
    /// With `reset` the internal buffer is drained; without it the content
    /// is copied and kept, so a later call returns it again. Writers bound
    /// to a file or stream return an empty string.
    #[doc(alias = "xmlTextWriterOutputMemory")]
    pub fn output_memory(&mut self, reset: bool) -> Result<String, XmlWriterError> {
        self.check_open()?;
        self.out.flush()?;
        Ok(self.out.extract(reset))
    }

    /// Flush pending bytes and release the sink. Repeated calls succeed
    /// without further effect.
    pub fn close(&mut self) -> Result<(), XmlWriterError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        Ok(self.out.close()?)
    }

    fn write_raw_inner(&mut self, content: &str) -> Result<usize, XmlWriterError> {
        let mut sum = 0;
        if let Some(lk) = self.nodes.front().cloned() {
            sum += self.handle_state_dependencies(&lk)?;
        }

        if self.indent {
            self.doindent = false;
        }

        sum += self.out.write_str(content)?;
        Ok(sum)
    }

    /// Write a raw, unescaped string into the output.
    #[doc(alias = "xmlTextWriterWriteRaw")]
    pub fn write_raw(&mut self, content: &str) -> Result<usize, XmlWriterError> {
        self.check_open()?;
        self.write_raw_inner(content)
    }

    /// Write character data into the current node.
    ///
    /// The escaping applied depends on the innermost frame: text escaping
    /// inside elements, attribute-value escaping inside attributes, and a
    /// `]]>`-splitting passthrough inside CDATA sections. Fails with a
    /// state error when no node is open.
    #[doc(alias = "xmlTextWriterWriteString")]
    pub fn write_string(&mut self, content: &str) -> Result<usize, XmlWriterError> {
        self.check_open()?;

        let Some(lk) = self.nodes.front().cloned() else {
            return Err(XmlWriterError::state("no open node to write text into"));
        };

        let mut sum = 0;
        match lk.state.get() {
            XmlTextWriterState::Name | XmlTextWriterState::Text => {
                let mut buf = String::with_capacity(content.len());
                xml_escape_content(content, &mut buf);
                sum += self.write_raw_inner(&buf)?;
            }
            XmlTextWriterState::Attribute => {
                sum += self
                    .out
                    .write_str_with_escape(content, xml_escape_attribute)?;
            }
            XmlTextWriterState::CDATA => {
                // Keep the section well-formed for arbitrary payloads:
                // a literal terminator is split across two sections.
                if content.contains("]]>") {
                    let buf = content.replace("]]>", "]]]]><![CDATA[>");
                    sum += self.write_raw_inner(&buf)?;
                } else {
                    sum += self.write_raw_inner(content)?;
                }
            }
            _ => {
                sum += self.write_raw_inner(content)?;
            }
        }

        Ok(sum)
    }

    /// Write base64 encoded data into the output, wrapped at 72 columns.
    #[doc(alias = "xmlTextWriterWriteBase64")]
    pub fn write_base64(&mut self, data: &[u8]) -> Result<usize, XmlWriterError> {
        self.check_open()?;

        let mut sum = 0;
        if let Some(lk) = self.nodes.front().cloned() {
            sum += self.handle_state_dependencies(&lk)?;
        }

        if self.indent {
            self.doindent = false;
        }

        sum += self.write_base64_groups(data)?;
        Ok(sum)
    }

    /// Adapted from John Walker's base64.c (http://www.fourmilab.ch/).
    #[doc(alias = "xmlOutputBufferWriteBase64")]
    fn write_base64_groups(&mut self, data: &[u8]) -> Result<usize, XmlWriterError> {
        const DTABLE: &[u8; 64] =
            b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
        const B64LINELEN: usize = 72;
        const B64CRLF: &str = "\r\n";

        let mut linelen = 0;
        let mut sum = 0;
        for igroup in data.chunks(3) {
            let mut ogroup: [u8; 4] = [b'=', b'=', b'=', b'='];
            match *igroup {
                [i0, i1, i2] => {
                    ogroup[0] = DTABLE[i0 as usize >> 2];
                    ogroup[1] = DTABLE[((i0 as usize & 3) << 4) | (i1 as usize >> 4)];
                    ogroup[2] = DTABLE[((i1 as usize & 0xF) << 2) | (i2 as usize >> 6)];
                    ogroup[3] = DTABLE[i2 as usize & 0x3F];
                }
                [i0, i1] => {
                    ogroup[0] = DTABLE[i0 as usize >> 2];
                    ogroup[1] = DTABLE[((i0 as usize & 3) << 4) | (i1 as usize >> 4)];
                    ogroup[2] = DTABLE[(i1 as usize & 0xF) << 2];
                }
                [i0] => {
                    ogroup[0] = DTABLE[i0 as usize >> 2];
                    ogroup[1] = DTABLE[(i0 as usize & 3) << 4];
                }
                _ => {}
            }
            if linelen >= B64LINELEN {
                sum += self.out.write_str(B64CRLF)?;
                linelen = 0;
            }
            sum += self.out.write_bytes(&ogroup)?;
            linelen += 4;
        }

        Ok(sum)
    }

    /// Write indent string.
    #[doc(alias = "xmlTextWriterWriteIndent")]
    fn write_indent(&mut self) -> Result<usize, XmlWriterError> {
        let lksize = self.nodes.len();
        let mut sum = 0;
        for _ in 0..lksize.saturating_sub(1) {
            sum += self.out.write_str(&self.ichar)?;
        }
        Ok(sum)
    }

    /// Start a new xml document.
    ///
    /// Must be the first operation on the writer; a second call without
    /// constructing a new writer fails. An unknown `encoding` label is
    /// rejected before anything is written.
    #[doc(alias = "xmlTextWriterStartDocument")]
    pub fn start_document(
        &mut self,
        version: Option<&str>,
        encoding: Option<&str>,
        standalone: Option<&str>,
    ) -> Result<usize, XmlWriterError> {
        self.check_open()?;

        if self.started || self.nodes.front().is_some() {
            return Err(XmlWriterError::state(
                "starting the document is not allowed in this context",
            ));
        }

        let handler = match encoding {
            Some(label) => Some(
                find_encoding_handler(label)
                    .ok_or_else(|| XmlWriterError::UnsupportedEncoding(label.to_owned()))?,
            ),
            None => None,
        };

        self.started = true;

        let mut sum = self.out.write_str("<?xml version=")?;
        sum += self.out.write_bytes(&[self.qchar])?;
        sum += self.out.write_str(version.unwrap_or(XML_DEFAULT_VERSION))?;
        sum += self.out.write_bytes(&[self.qchar])?;
        if let Some(handler) = handler.as_ref() {
            sum += self.out.write_str(" encoding=")?;
            sum += self.out.write_bytes(&[self.qchar])?;
            sum += self.out.write_str(handler.name())?;
            sum += self.out.write_bytes(&[self.qchar])?;
        }
        if let Some(standalone) = standalone {
            sum += self.out.write_str(" standalone=")?;
            sum += self.out.write_bytes(&[self.qchar])?;
            sum += self.out.write_str(standalone)?;
            sum += self.out.write_bytes(&[self.qchar])?;
        }
        sum += self.out.write_str("?>\n")?;

        self.out.set_encoder(handler);
        Ok(sum)
    }

    /// End the xml document. All open nodes are closed, innermost first,
    /// and the content is flushed to the output.
    #[doc(alias = "xmlTextWriterEndDocument")]
    pub fn end_document(&mut self) -> Result<usize, XmlWriterError> {
        self.check_open()?;

        let mut sum = 0;
        while let Some(lk) = self.nodes.front() {
            match lk.state.get() {
                XmlTextWriterState::Name
                | XmlTextWriterState::Attribute
                | XmlTextWriterState::Text => {
                    sum += self.end_element()?;
                }
                XmlTextWriterState::PI | XmlTextWriterState::PIText => {
                    sum += self.end_pi()?;
                }
                XmlTextWriterState::CDATA => {
                    sum += self.end_cdata()?;
                }
                XmlTextWriterState::DTD
                | XmlTextWriterState::DTDText
                | XmlTextWriterState::DTDElem
                | XmlTextWriterState::DTDElemText
                | XmlTextWriterState::DTDAttl
                | XmlTextWriterState::DTDAttlText
                | XmlTextWriterState::DTDEntity
                | XmlTextWriterState::DTDEntityText
                | XmlTextWriterState::DTDPEntity => {
                    sum += self.end_dtd()?;
                }
                XmlTextWriterState::Comment => {
                    sum += self.end_comment()?;
                }
                _ => {
                    self.nodes.pop_front();
                }
            }
        }

        if !self.indent {
            sum += self.out.write_str("\n")?;
        }

        sum += self.flush()?;
        Ok(sum)
    }

    /// Start an xml element.
    ///
    /// The closing `>` of the start tag is deferred until a child is
    /// written or the element ends, so attributes can still be added.
    #[doc(alias = "xmlTextWriterStartElement")]
    pub fn start_element(&mut self, name: &str) -> Result<usize, XmlWriterError> {
        self.check_open()?;
        Self::check_name("element name", name)?;

        let mut sum = 0;
        if let Some(lk) = self.nodes.front().cloned() {
            match lk.state.get() {
                XmlTextWriterState::PI | XmlTextWriterState::PIText => {
                    return Err(XmlWriterError::state(
                        "cannot start an element inside a processing instruction",
                    ));
                }
                ty @ (XmlTextWriterState::Attribute | XmlTextWriterState::Name) => {
                    if ty == XmlTextWriterState::Attribute {
                        sum += self.end_attribute()?;
                    }

                    // Output namespace declarations
                    sum += self.output_nsdecl()?;
                    sum += self.out.write_str(">")?;
                    if self.indent {
                        sum += self.out.write_str("\n")?;
                    }
                    lk.state.set(XmlTextWriterState::Text);
                }
                _ => {}
            }
        }

        let p = XmlTextWriterStackEntry {
            name: Some(name.to_owned()),
            state: Cell::new(XmlTextWriterState::Name),
        };
        self.nodes.push_front(p.into());

        if self.indent {
            sum += self.write_indent()?;
        }

        sum += self.out.write_str("<")?;
        sum += self.out.write_str(name)?;
        Ok(sum)
    }

    /// Write an xml element with optional text content.
    #[doc(alias = "xmlTextWriterWriteElement")]
    pub fn write_element(
        &mut self,
        name: &str,
        content: Option<&str>,
    ) -> Result<usize, XmlWriterError> {
        let mut sum = self.start_element(name)?;
        if let Some(content) = content {
            sum += self.write_string(content)?;
        }
        sum += self.end_element()?;
        Ok(sum)
    }

    /// End the current xml element.
    ///
    /// An element without children is closed with the short `/>` form; use
    /// [`full_end_element`](Self::full_end_element) to force a full end tag.
    #[doc(alias = "xmlTextWriterEndElement")]
    pub fn end_element(&mut self) -> Result<usize, XmlWriterError> {
        self.check_open()?;

        let Some(lk) = self.nodes.front().cloned() else {
            self.nsstack.clear();
            return Err(XmlWriterError::state("no open element to end"));
        };

        let mut sum = 0;
        match lk.state.get() {
            ty @ (XmlTextWriterState::Attribute | XmlTextWriterState::Name) => {
                if ty == XmlTextWriterState::Attribute {
                    match self.end_attribute() {
                        Ok(count) => sum += count,
                        Err(err) => {
                            self.nsstack.clear();
                            return Err(err);
                        }
                    }
                }

                // Output namespace declarations
                sum += self.output_nsdecl()?;

                // next element needs indent
                if self.indent {
                    self.doindent = true;
                }
                sum += self.out.write_str("/>")?;
            }
            XmlTextWriterState::Text => {
                if self.indent && self.doindent {
                    sum += self.write_indent()?;
                }
                self.doindent = true;
                sum += self.out.write_str("</")?;
                sum += self.out.write_str(lk.name.as_deref().unwrap_or_default())?;
                sum += self.out.write_str(">")?;
            }
            _ => {
                return Err(XmlWriterError::state("current node is not an element"));
            }
        }

        if self.indent {
            sum += self.out.write_str("\n")?;
        }

        self.nodes.pop_front();
        Ok(sum)
    }

    /// End the current xml element, writing an end tag even if the element
    /// is empty.
    #[doc(alias = "xmlTextWriterFullEndElement")]
    pub fn full_end_element(&mut self) -> Result<usize, XmlWriterError> {
        self.check_open()?;

        let Some(lk) = self.nodes.front().cloned() else {
            return Err(XmlWriterError::state("no open element to end"));
        };

        let mut sum = 0;
        match lk.state.get() {
            ty @ (XmlTextWriterState::Attribute
            | XmlTextWriterState::Name
            | XmlTextWriterState::Text) => {
                if ty == XmlTextWriterState::Attribute {
                    sum += self.end_attribute()?;
                }

                if matches!(
                    ty,
                    XmlTextWriterState::Attribute | XmlTextWriterState::Name
                ) {
                    // Output namespace declarations
                    sum += self.output_nsdecl()?;
                    sum += self.out.write_str(">")?;
                    if self.indent {
                        self.doindent = false;
                    }
                }

                if self.indent && self.doindent {
                    sum += self.write_indent()?;
                }
                self.doindent = true;
                sum += self.out.write_str("</")?;
                sum += self.out.write_str(lk.name.as_deref().unwrap_or_default())?;
                sum += self.out.write_str(">")?;
            }
            _ => {
                return Err(XmlWriterError::state("current node is not an element"));
            }
        }

        if self.indent {
            sum += self.out.write_str("\n")?;
        }

        self.nodes.pop_front();
        Ok(sum)
    }

    /// Start an xml element with namespace support.
    ///
    /// With a `namespace_uri` the matching `xmlns` declaration is recorded
    /// and emitted when the start tag closes.
    #[doc(alias = "xmlTextWriterStartElementNS")]
    pub fn start_element_ns(
        &mut self,
        prefix: Option<&str>,
        name: &str,
        namespace_uri: Option<&str>,
    ) -> Result<usize, XmlWriterError> {
        self.check_open()?;
        Self::check_name("element name", name)?;
        Self::check_prefix(prefix)?;

        let mut buf = String::new();
        if let Some(prefix) = prefix {
            buf.push_str(prefix);
            buf.push(':');
        }
        buf.push_str(name);

        let sum = self.start_element(&buf)?;

        if let Some(namespace_uri) = namespace_uri {
            let mut buf = "xmlns".to_owned();
            if let Some(prefix) = prefix {
                buf.push(':');
                buf.push_str(prefix);
            }

            self.nsstack.push(XmlTextWriterNsStackEntry {
                prefix: buf,
                uri: namespace_uri.to_owned(),
                elem: self.nodes.front().cloned(),
            });
        }

        Ok(sum)
    }

    /// Write an xml element with namespace support.
    #[doc(alias = "xmlTextWriterWriteElementNS")]
    pub fn write_element_ns(
        &mut self,
        prefix: Option<&str>,
        name: &str,
        namespace_uri: Option<&str>,
        content: &str,
    ) -> Result<usize, XmlWriterError> {
        let mut sum = self.start_element_ns(prefix, name, namespace_uri)?;
        sum += self.write_string(content)?;
        sum += self.end_element()?;
        Ok(sum)
    }

    /// Start an xml attribute.
    ///
    /// Only valid while the innermost frame is an element whose start tag
    /// has not been closed yet.
    #[doc(alias = "xmlTextWriterStartAttribute")]
    pub fn start_attribute(&mut self, name: &str) -> Result<usize, XmlWriterError> {
        self.check_open()?;
        Self::check_name("attribute name", name)?;

        let Some(lk) = self.nodes.front().cloned() else {
            return Err(XmlWriterError::state("no open element to attach to"));
        };

        let mut sum = 0;
        match lk.state.get() {
            ty @ (XmlTextWriterState::Attribute | XmlTextWriterState::Name) => {
                if ty == XmlTextWriterState::Attribute {
                    sum += self.end_attribute()?;
                }

                sum += self.out.write_str(" ")?;
                sum += self.out.write_str(name)?;
                sum += self.out.write_str("=")?;
                sum += self.out.write_bytes(&[self.qchar])?;
                lk.state.set(XmlTextWriterState::Attribute);
            }
            _ => {
                return Err(XmlWriterError::state(
                    "the start tag of the current element is already closed",
                ));
            }
        }

        Ok(sum)
    }

    /// Write a whole xml attribute.
    #[doc(alias = "xmlTextWriterWriteAttribute")]
    pub fn write_attribute(&mut self, name: &str, content: &str) -> Result<usize, XmlWriterError> {
        let mut sum = self.start_attribute(name)?;
        sum += self.write_string(content)?;
        sum += self.end_attribute()?;
        Ok(sum)
    }

    /// End the current xml attribute.
    #[doc(alias = "xmlTextWriterEndAttribute")]
    pub fn end_attribute(&mut self) -> Result<usize, XmlWriterError> {
        self.check_open()?;

        let Some(lk) = self.nodes.front() else {
            return Err(XmlWriterError::state("no open attribute to end"));
        };

        let mut sum = 0;
        match lk.state.get() {
            XmlTextWriterState::Attribute => {
                lk.state.set(XmlTextWriterState::Name);
                sum += self.out.write_bytes(&[self.qchar])?;
            }
            _ => {
                return Err(XmlWriterError::state("current node is not an attribute"));
            }
        }

        Ok(sum)
    }

    /// Start an xml attribute with namespace support.
    ///
    /// Rebinding a prefix already declared on this element to a different
    /// URI is rejected.
    #[doc(alias = "xmlTextWriterStartAttributeNS")]
    pub fn start_attribute_ns(
        &mut self,
        prefix: Option<&str>,
        name: &str,
        namespace_uri: Option<&str>,
    ) -> Result<usize, XmlWriterError> {
        self.check_open()?;
        Self::check_name("attribute name", name)?;
        Self::check_prefix(prefix)?;

        // Handle namespace first in case of error
        if let Some(namespace_uri) = namespace_uri {
            let mut buf = "xmlns".to_owned();
            if let Some(prefix) = prefix {
                buf.push(':');
                buf.push_str(prefix);
            }

            let elem = self.nodes.front();
            let mut decl_needed = true;
            if let Some(curns) = self.nsstack.iter().find(|ns| {
                ns.prefix == buf
                    && match (ns.elem.as_ref(), elem) {
                        (Some(a), Some(b)) => Rc::ptr_eq(a, b),
                        (None, None) => true,
                        _ => false,
                    }
            }) {
                if curns.uri == namespace_uri {
                    // Namespace already defined on element skip
                    decl_needed = false;
                } else {
                    // Prefix mismatch so error out
                    return Err(XmlWriterError::InvalidArgument {
                        param: "namespace_uri",
                        expected: "the URI already bound to this prefix on the element",
                        given: namespace_uri.to_owned(),
                    });
                }
            }

            if decl_needed {
                self.nsstack.push(XmlTextWriterNsStackEntry {
                    prefix: buf,
                    uri: namespace_uri.to_owned(),
                    elem: self.nodes.front().cloned(),
                });
            }
        }

        let mut buf = String::new();
        if let Some(prefix) = prefix {
            buf.push_str(prefix);
            buf.push(':');
        }
        buf.push_str(name);

        self.start_attribute(&buf)
    }

    /// Write a whole xml attribute with namespace support.
    #[doc(alias = "xmlTextWriterWriteAttributeNS")]
    pub fn write_attribute_ns(
        &mut self,
        prefix: Option<&str>,
        name: &str,
        namespace_uri: Option<&str>,
        content: &str,
    ) -> Result<usize, XmlWriterError> {
        let mut sum = self.start_attribute_ns(prefix, name, namespace_uri)?;
        sum += self.write_string(content)?;
        sum += self.end_attribute()?;
        Ok(sum)
    }

    /// Output the namespace declarations pending on the open start tag.
    #[doc(alias = "xmlTextWriterOutputNSDecl")]
    fn output_nsdecl(&mut self) -> Result<usize, XmlWriterError> {
        let mut sum = 0;
        while !self.nsstack.is_empty() {
            let lk = self.nsstack.remove(0);
            match self.write_attribute(&lk.prefix, &lk.uri) {
                Ok(count) => sum += count,
                Err(err) => {
                    self.nsstack.clear();
                    return Err(err);
                }
            }
        }
        Ok(sum)
    }

    /// Start an xml processing instruction.
    ///
    /// The target must be a valid name other than the reserved token `xml`
    /// (in any capitalization).
    #[doc(alias = "xmlTextWriterStartPI")]
    pub fn start_pi(&mut self, target: &str) -> Result<usize, XmlWriterError> {
        self.check_open()?;
        Self::check_name("target", target)?;

        if target.eq_ignore_ascii_case("xml") {
            return Err(XmlWriterError::InvalidArgument {
                param: "target",
                expected: "a target other than \"xml\", which is reserved for XML standardization",
                given: target.to_owned(),
            });
        }

        let mut sum = 0;
        if let Some(lk) = self.nodes.front().cloned() {
            match lk.state.get() {
                ty @ (XmlTextWriterState::Attribute | XmlTextWriterState::Name) => {
                    if ty == XmlTextWriterState::Attribute {
                        sum += self.end_attribute()?;
                    }
                    // Output namespace declarations
                    sum += self.output_nsdecl()?;
                    sum += self.out.write_str(">")?;
                    lk.state.set(XmlTextWriterState::Text);
                }
                XmlTextWriterState::None
                | XmlTextWriterState::Text
                | XmlTextWriterState::DTD => {}
                XmlTextWriterState::PI | XmlTextWriterState::PIText => {
                    return Err(XmlWriterError::state(
                        "processing instructions cannot nest",
                    ));
                }
                _ => {
                    return Err(XmlWriterError::state(
                        "a processing instruction is not allowed in this context",
                    ));
                }
            }
        }

        let p = XmlTextWriterStackEntry {
            name: Some(target.to_owned()),
            state: Cell::new(XmlTextWriterState::PI),
        };
        self.nodes.push_front(p.into());

        sum += self.out.write_str("<?")?;
        sum += self.out.write_str(target)?;
        Ok(sum)
    }

    /// Write a whole xml processing instruction.
    #[doc(alias = "xmlTextWriterWritePI")]
    pub fn write_pi(
        &mut self,
        target: &str,
        content: Option<&str>,
    ) -> Result<usize, XmlWriterError> {
        let mut sum = self.start_pi(target)?;
        if let Some(content) = content {
            sum += self.write_string(content)?;
        }
        sum += self.end_pi()?;
        Ok(sum)
    }

    /// End the current xml processing instruction.
    #[doc(alias = "xmlTextWriterEndPI")]
    pub fn end_pi(&mut self) -> Result<usize, XmlWriterError> {
        self.check_open()?;

        let Some(lk) = self.nodes.front() else {
            return Err(XmlWriterError::state("no open processing instruction to end"));
        };

        let mut sum = 0;
        match lk.state.get() {
            XmlTextWriterState::PI | XmlTextWriterState::PIText => {
                sum += self.out.write_str("?>")?;
            }
            _ => {
                return Err(XmlWriterError::state(
                    "current node is not a processing instruction",
                ));
            }
        }

        if self.indent {
            sum += self.out.write_str("\n")?;
        }

        self.nodes.pop_front();
        Ok(sum)
    }

    /// Start an xml CDATA section.
    #[doc(alias = "xmlTextWriterStartCDATA")]
    pub fn start_cdata(&mut self) -> Result<usize, XmlWriterError> {
        self.check_open()?;

        let mut sum = 0;
        if let Some(lk) = self.nodes.front().cloned() {
            match lk.state.get() {
                XmlTextWriterState::None
                | XmlTextWriterState::Text
                | XmlTextWriterState::PI
                | XmlTextWriterState::PIText => {}
                ty @ (XmlTextWriterState::Attribute | XmlTextWriterState::Name) => {
                    if ty == XmlTextWriterState::Attribute {
                        sum += self.end_attribute()?;
                    }

                    // Output namespace declarations
                    sum += self.output_nsdecl()?;
                    sum += self.out.write_str(">")?;
                    lk.state.set(XmlTextWriterState::Text);
                }
                XmlTextWriterState::CDATA => {
                    return Err(XmlWriterError::state("CDATA sections cannot nest"));
                }
                _ => {
                    return Err(XmlWriterError::state(
                        "a CDATA section is not allowed in this context",
                    ));
                }
            }
        }

        self.nodes.push_front(
            XmlTextWriterStackEntry {
                name: None,
                state: Cell::new(XmlTextWriterState::CDATA),
            }
            .into(),
        );

        sum += self.out.write_str("<![CDATA[")?;
        Ok(sum)
    }

    /// Write a whole xml CDATA section.
    ///
    /// Content containing the literal `]]>` terminator is split across
    /// adjacent sections; re-parsing yields the original character data.
    #[doc(alias = "xmlTextWriterWriteCDATA")]
    pub fn write_cdata(&mut self, content: Option<&str>) -> Result<usize, XmlWriterError> {
        let mut sum = self.start_cdata()?;
        if let Some(content) = content {
            sum += self.write_string(content)?;
        }
        sum += self.end_cdata()?;
        Ok(sum)
    }

    /// End the current xml CDATA section.
    #[doc(alias = "xmlTextWriterEndCDATA")]
    pub fn end_cdata(&mut self) -> Result<usize, XmlWriterError> {
        self.check_open()?;

        let Some(lk) = self.nodes.front() else {
            return Err(XmlWriterError::state("no open CDATA section to end"));
        };

        let mut sum = 0;
        match lk.state.get() {
            XmlTextWriterState::CDATA => {
                sum += self.out.write_str("]]>")?;
            }
            _ => {
                return Err(XmlWriterError::state("current node is not a CDATA section"));
            }
        }

        self.nodes.pop_front();
        Ok(sum)
    }

    /// Start an xml comment.
    #[doc(alias = "xmlTextWriterStartComment")]
    pub fn start_comment(&mut self) -> Result<usize, XmlWriterError> {
        self.check_open()?;

        let mut sum = 0;
        if let Some(lk) = self.nodes.front().cloned() {
            match lk.state.get() {
                XmlTextWriterState::Text | XmlTextWriterState::None => {}
                XmlTextWriterState::Name => {
                    // Output namespace declarations
                    sum += self.output_nsdecl()?;
                    sum += self.out.write_str(">")?;
                    if self.indent {
                        sum += self.out.write_str("\n")?;
                    }
                    lk.state.set(XmlTextWriterState::Text);
                }
                _ => {
                    return Err(XmlWriterError::state(
                        "a comment is not allowed in this context",
                    ));
                }
            }
        }

        self.nodes.push_front(
            XmlTextWriterStackEntry {
                name: None,
                state: Cell::new(XmlTextWriterState::Comment),
            }
            .into(),
        );

        if self.indent {
            sum += self.write_indent()?;
        }

        sum += self.out.write_str("<!--")?;
        Ok(sum)
    }

    /// Write a whole xml comment.
    ///
    /// `--` never occurs in a well-formed comment and there is no escape
    /// for it, so content containing it (or ending with `-`) is rejected.
    #[doc(alias = "xmlTextWriterWriteComment")]
    pub fn write_comment(&mut self, content: &str) -> Result<usize, XmlWriterError> {
        self.check_open()?;

        if content.contains("--") || content.ends_with('-') {
            return Err(XmlWriterError::InvalidArgument {
                param: "content",
                expected: "comment text without \"--\" or a trailing \"-\"",
                given: content.to_owned(),
            });
        }

        let mut sum = self.start_comment()?;
        sum += self.write_string(content)?;
        sum += self.end_comment()?;
        Ok(sum)
    }

    /// End the current xml comment.
    #[doc(alias = "xmlTextWriterEndComment")]
    pub fn end_comment(&mut self) -> Result<usize, XmlWriterError> {
        self.check_open()?;

        let Some(lk) = self.nodes.front() else {
            return Err(XmlWriterError::state("no open comment to end"));
        };

        let mut sum = 0;
        match lk.state.get() {
            XmlTextWriterState::Comment => {
                sum += self.out.write_str("-->")?;
            }
            _ => {
                return Err(XmlWriterError::state("current node is not a comment"));
            }
        }

        if self.indent {
            sum += self.out.write_str("\n")?;
        }

        self.nodes.pop_front();
        Ok(sum)
    }

    /// Start a DTD declaration.
    ///
    /// Only allowed in the document prolog. A public identifier requires a
    /// system identifier.
    #[doc(alias = "xmlTextWriterStartDTD")]
    pub fn start_dtd(
        &mut self,
        name: &str,
        pubid: Option<&str>,
        sysid: Option<&str>,
    ) -> Result<usize, XmlWriterError> {
        self.check_open()?;
        Self::check_name("document type name", name)?;

        if self.nodes.front().is_some() {
            return Err(XmlWriterError::state("DTD allowed only in prolog"));
        }
        if pubid.is_some() && sysid.is_none() {
            return Err(XmlWriterError::InvalidArgument {
                param: "sysid",
                expected: "a system identifier when a public identifier is given",
                given: String::new(),
            });
        }

        let p = XmlTextWriterStackEntry {
            name: Some(name.to_owned()),
            state: Cell::new(XmlTextWriterState::DTD),
        };
        self.nodes.push_front(p.into());

        let mut sum = self.out.write_str("<!DOCTYPE ")?;
        sum += self.out.write_str(name)?;

        if let Some(pubid) = pubid {
            if self.indent {
                sum += self.out.write_str("\n")?;
            } else {
                sum += self.out.write_str(" ")?;
            }
            sum += self.out.write_str("PUBLIC ")?;
            sum += self.out.write_bytes(&[self.qchar])?;
            sum += self.out.write_str(pubid)?;
            sum += self.out.write_bytes(&[self.qchar])?;
        }

        if let Some(sysid) = sysid {
            if pubid.is_some() {
                if self.indent {
                    sum += self.out.write_str("\n       ")?;
                } else {
                    sum += self.out.write_str(" ")?;
                }
            } else {
                if self.indent {
                    sum += self.out.write_str("\n")?;
                } else {
                    sum += self.out.write_str(" ")?;
                }
                sum += self.out.write_str("SYSTEM ")?;
            }
            sum += self.out.write_bytes(&[self.qchar])?;
            sum += self.out.write_str(sysid)?;
            sum += self.out.write_bytes(&[self.qchar])?;
        }

        Ok(sum)
    }

    /// Write a whole DTD, optionally with an internal subset.
    #[doc(alias = "xmlTextWriterWriteDTD")]
    pub fn write_dtd(
        &mut self,
        name: &str,
        pubid: Option<&str>,
        sysid: Option<&str>,
        subset: Option<&str>,
    ) -> Result<usize, XmlWriterError> {
        let mut sum = self.start_dtd(name, pubid, sysid)?;
        if let Some(subset) = subset {
            sum += self.write_string(subset)?;
        }
        sum += self.end_dtd()?;
        Ok(sum)
    }

    /// End the DTD, closing any open declaration inside it first.
    #[doc(alias = "xmlTextWriterEndDTD")]
    pub fn end_dtd(&mut self) -> Result<usize, XmlWriterError> {
        self.check_open()?;

        if self.nodes.front().is_none() {
            return Err(XmlWriterError::state("no open DTD to end"));
        }

        let mut sum = 0;
        while let Some(lk) = self.nodes.front() {
            match lk.state.get() {
                ty @ (XmlTextWriterState::DTDText | XmlTextWriterState::DTD) => {
                    if ty == XmlTextWriterState::DTDText {
                        sum += self.out.write_str("]")?;
                    }
                    sum += self.out.write_str(">")?;

                    if self.indent {
                        sum += self.out.write_str("\n")?;
                    }

                    self.nodes.pop_front();
                }
                XmlTextWriterState::DTDElem | XmlTextWriterState::DTDElemText => {
                    sum += self.end_dtd_element()?;
                }
                XmlTextWriterState::DTDAttl | XmlTextWriterState::DTDAttlText => {
                    sum += self.end_dtd_attlist()?;
                }
                XmlTextWriterState::DTDEntity
                | XmlTextWriterState::DTDPEntity
                | XmlTextWriterState::DTDEntityText => {
                    sum += self.end_dtd_entity()?;
                }
                XmlTextWriterState::Comment => {
                    sum += self.end_comment()?;
                }
                _ => {
                    break;
                }
            }
        }

        Ok(sum)
    }

    /// Start a DTD element declaration.
    #[doc(alias = "xmlTextWriterStartDTDElement")]
    pub fn start_dtd_element(&mut self, name: &str) -> Result<usize, XmlWriterError> {
        self.check_open()?;
        Self::check_name("element name", name)?;

        let Some(lk) = self.nodes.front() else {
            return Err(XmlWriterError::state("no open DTD to declare in"));
        };

        let mut sum = 0;
        match lk.state.get() {
            XmlTextWriterState::DTD => {
                sum += self.out.write_str(" [")?;
                if self.indent {
                    sum += self.out.write_str("\n")?;
                }
                lk.state.set(XmlTextWriterState::DTDText);
            }
            XmlTextWriterState::DTDText | XmlTextWriterState::None => {}
            _ => {
                return Err(XmlWriterError::state(
                    "an element declaration is not allowed in this context",
                ));
            }
        }

        let p = XmlTextWriterStackEntry {
            name: Some(name.to_owned()),
            state: Cell::new(XmlTextWriterState::DTDElem),
        };
        self.nodes.push_front(p.into());

        if self.indent {
            sum += self.write_indent()?;
        }

        sum += self.out.write_str("<!ELEMENT ")?;
        sum += self.out.write_str(name)?;
        Ok(sum)
    }

    /// Write a whole DTD element declaration.
    #[doc(alias = "xmlTextWriterWriteDTDElement")]
    pub fn write_dtd_element(
        &mut self,
        name: &str,
        content: &str,
    ) -> Result<usize, XmlWriterError> {
        let mut sum = self.start_dtd_element(name)?;
        sum += self.write_string(content)?;
        sum += self.end_dtd_element()?;
        Ok(sum)
    }

    /// End the current DTD element declaration.
    #[doc(alias = "xmlTextWriterEndDTDElement")]
    pub fn end_dtd_element(&mut self) -> Result<usize, XmlWriterError> {
        self.check_open()?;

        let Some(lk) = self.nodes.front() else {
            return Err(XmlWriterError::state("no open element declaration to end"));
        };

        let mut sum = 0;
        match lk.state.get() {
            XmlTextWriterState::DTDElem | XmlTextWriterState::DTDElemText => {
                sum += self.out.write_str(">")?;
            }
            _ => {
                return Err(XmlWriterError::state(
                    "current node is not an element declaration",
                ));
            }
        }

        if self.indent {
            sum += self.out.write_str("\n")?;
        }

        self.nodes.pop_front();
        Ok(sum)
    }

    /// Start a DTD attribute list declaration.
    #[doc(alias = "xmlTextWriterStartDTDAttlist")]
    pub fn start_dtd_attlist(&mut self, name: &str) -> Result<usize, XmlWriterError> {
        self.check_open()?;
        Self::check_name("element name", name)?;

        let Some(lk) = self.nodes.front() else {
            return Err(XmlWriterError::state("no open DTD to declare in"));
        };

        let mut sum = 0;
        match lk.state.get() {
            XmlTextWriterState::DTD => {
                sum += self.out.write_str(" [")?;
                if self.indent {
                    sum += self.out.write_str("\n")?;
                }
                lk.state.set(XmlTextWriterState::DTDText);
            }
            XmlTextWriterState::DTDText | XmlTextWriterState::None => {}
            _ => {
                return Err(XmlWriterError::state(
                    "an attribute list declaration is not allowed in this context",
                ));
            }
        }

        let p = XmlTextWriterStackEntry {
            name: Some(name.to_owned()),
            state: Cell::new(XmlTextWriterState::DTDAttl),
        };
        self.nodes.push_front(p.into());

        if self.indent {
            sum += self.write_indent()?;
        }

        sum += self.out.write_str("<!ATTLIST ")?;
        sum += self.out.write_str(name)?;
        Ok(sum)
    }

    /// Write a whole DTD attribute list declaration.
    #[doc(alias = "xmlTextWriterWriteDTDAttlist")]
    pub fn write_dtd_attlist(
        &mut self,
        name: &str,
        content: &str,
    ) -> Result<usize, XmlWriterError> {
        let mut sum = self.start_dtd_attlist(name)?;
        sum += self.write_string(content)?;
        sum += self.end_dtd_attlist()?;
        Ok(sum)
    }

    /// End the current DTD attribute list declaration.
    #[doc(alias = "xmlTextWriterEndDTDAttlist")]
    pub fn end_dtd_attlist(&mut self) -> Result<usize, XmlWriterError> {
        self.check_open()?;

        let Some(lk) = self.nodes.front() else {
            return Err(XmlWriterError::state(
                "no open attribute list declaration to end",
            ));
        };

        let mut sum = 0;
        match lk.state.get() {
            XmlTextWriterState::DTDAttl | XmlTextWriterState::DTDAttlText => {
                sum += self.out.write_str(">")?;
            }
            _ => {
                return Err(XmlWriterError::state(
                    "current node is not an attribute list declaration",
                ));
            }
        }

        if self.indent {
            sum += self.out.write_str("\n")?;
        }

        self.nodes.pop_front();
        Ok(sum)
    }

    /// Start a DTD entity declaration.
    ///
    /// With `pe` the declaration is for a parameter entity.
    #[doc(alias = "xmlTextWriterStartDTDEntity")]
    pub fn start_dtd_entity(&mut self, pe: bool, name: &str) -> Result<usize, XmlWriterError> {
        self.check_open()?;
        Self::check_name("entity name", name)?;

        let mut sum = 0;
        if let Some(lk) = self.nodes.front() {
            match lk.state.get() {
                XmlTextWriterState::DTD => {
                    sum += self.out.write_str(" [")?;
                    if self.indent {
                        sum += self.out.write_str("\n")?;
                    }
                    lk.state.set(XmlTextWriterState::DTDText);
                }
                XmlTextWriterState::DTDText | XmlTextWriterState::None => {}
                _ => {
                    return Err(XmlWriterError::state(
                        "an entity declaration is not allowed in this context",
                    ));
                }
            }
        }

        let p = XmlTextWriterStackEntry {
            name: Some(name.to_owned()),
            state: if pe {
                Cell::new(XmlTextWriterState::DTDPEntity)
            } else {
                Cell::new(XmlTextWriterState::DTDEntity)
            },
        };
        self.nodes.push_front(p.into());

        if self.indent {
            sum += self.write_indent()?;
        }
        sum += self.out.write_str("<!ENTITY ")?;
        if pe {
            sum += self.out.write_str("% ")?;
        }
        sum += self.out.write_str(name)?;
        Ok(sum)
    }

    /// Write a whole DTD entity declaration, internal or external.
    #[doc(alias = "xmlTextWriterWriteDTDEntity")]
    pub fn write_dtd_entity(
        &mut self,
        pe: bool,
        name: &str,
        pubid: Option<&str>,
        sysid: Option<&str>,
        ndataid: Option<&str>,
        content: Option<&str>,
    ) -> Result<usize, XmlWriterError> {
        if content.is_none() && pubid.is_none() && sysid.is_none() {
            return Err(XmlWriterError::InvalidArgument {
                param: "content",
                expected: "either replacement text or an external identifier",
                given: String::new(),
            });
        }
        if pe && ndataid.is_some() {
            return Err(XmlWriterError::InvalidArgument {
                param: "ndataid",
                expected: "no notation on a parameter entity",
                given: ndataid.unwrap_or_default().to_owned(),
            });
        }

        if pubid.is_none() && sysid.is_none() {
            return self.write_dtd_internal_entity(pe, name, content.unwrap_or_default());
        }

        self.write_dtd_external_entity(pe, name, pubid, sysid, ndataid)
    }

    /// Write an internal DTD entity declaration.
    #[doc(alias = "xmlTextWriterWriteDTDInternalEntity")]
    pub fn write_dtd_internal_entity(
        &mut self,
        pe: bool,
        name: &str,
        content: &str,
    ) -> Result<usize, XmlWriterError> {
        let mut sum = self.start_dtd_entity(pe, name)?;
        sum += self.write_string(content)?;
        sum += self.end_dtd_entity()?;
        Ok(sum)
    }

    /// Write an external DTD entity declaration.
    ///
    /// A parameter entity cannot carry a notation (`ndataid`).
    #[doc(alias = "xmlTextWriterWriteDTDExternalEntity")]
    pub fn write_dtd_external_entity(
        &mut self,
        pe: bool,
        name: &str,
        pubid: Option<&str>,
        sysid: Option<&str>,
        ndataid: Option<&str>,
    ) -> Result<usize, XmlWriterError> {
        if pubid.is_none() && sysid.is_none() {
            return Err(XmlWriterError::InvalidArgument {
                param: "sysid",
                expected: "a public or system identifier",
                given: String::new(),
            });
        }
        if pe && ndataid.is_some() {
            return Err(XmlWriterError::InvalidArgument {
                param: "ndataid",
                expected: "no notation on a parameter entity",
                given: ndataid.unwrap_or_default().to_owned(),
            });
        }

        let mut sum = self.start_dtd_entity(pe, name)?;
        sum += self.write_dtd_external_entity_contents(pubid, sysid, ndataid)?;
        sum += self.end_dtd_entity()?;
        Ok(sum)
    }

    /// Write the identifiers of an external entity started with
    /// [`start_dtd_entity`](Self::start_dtd_entity).
    #[doc(alias = "xmlTextWriterWriteDTDExternalEntityContents")]
    pub fn write_dtd_external_entity_contents(
        &mut self,
        pubid: Option<&str>,
        sysid: Option<&str>,
        ndataid: Option<&str>,
    ) -> Result<usize, XmlWriterError> {
        self.check_open()?;

        let Some(lk) = self.nodes.front() else {
            return Err(XmlWriterError::state(
                "an entity declaration must be started first",
            ));
        };

        match lk.state.get() {
            XmlTextWriterState::DTDEntity => {}
            XmlTextWriterState::DTDPEntity => {
                if ndataid.is_some() {
                    return Err(XmlWriterError::InvalidArgument {
                        param: "ndataid",
                        expected: "no notation on a parameter entity",
                        given: ndataid.unwrap_or_default().to_owned(),
                    });
                }
            }
            _ => {
                return Err(XmlWriterError::state(
                    "an entity declaration must be started first",
                ));
            }
        }

        if pubid.is_some() && sysid.is_none() {
            return Err(XmlWriterError::InvalidArgument {
                param: "sysid",
                expected: "a system identifier when a public identifier is given",
                given: String::new(),
            });
        }

        let mut sum = 0;
        if let Some(pubid) = pubid {
            sum += self.out.write_str(" PUBLIC ")?;
            sum += self.out.write_bytes(&[self.qchar])?;
            sum += self.out.write_str(pubid)?;
            sum += self.out.write_bytes(&[self.qchar])?;
        }

        if let Some(sysid) = sysid {
            if pubid.is_none() {
                sum += self.out.write_str(" SYSTEM")?;
            }
            sum += self.out.write_str(" ")?;
            sum += self.out.write_bytes(&[self.qchar])?;
            sum += self.out.write_str(sysid)?;
            sum += self.out.write_bytes(&[self.qchar])?;
        }

        if let Some(ndataid) = ndataid {
            sum += self.out.write_str(" NDATA ")?;
            sum += self.out.write_str(ndataid)?;
        }
        Ok(sum)
    }

    /// End the current DTD entity declaration.
    #[doc(alias = "xmlTextWriterEndDTDEntity")]
    pub fn end_dtd_entity(&mut self) -> Result<usize, XmlWriterError> {
        self.check_open()?;

        let Some(lk) = self.nodes.front() else {
            return Err(XmlWriterError::state("no open entity declaration to end"));
        };

        let mut sum = 0;
        match lk.state.get() {
            ty @ (XmlTextWriterState::DTDEntityText
            | XmlTextWriterState::DTDEntity
            | XmlTextWriterState::DTDPEntity) => {
                if ty == XmlTextWriterState::DTDEntityText {
                    sum += self.out.write_bytes(&[self.qchar])?;
                }
                sum += self.out.write_str(">")?;
            }
            _ => {
                return Err(XmlWriterError::state(
                    "current node is not an entity declaration",
                ));
            }
        }

        if self.indent {
            sum += self.out.write_str("\n")?;
        }

        self.nodes.pop_front();
        Ok(sum)
    }

    /// Write a DTD notation declaration.
    #[doc(alias = "xmlTextWriterWriteDTDNotation")]
    pub fn write_dtd_notation(
        &mut self,
        name: &str,
        pubid: Option<&str>,
        sysid: Option<&str>,
    ) -> Result<usize, XmlWriterError> {
        self.check_open()?;
        Self::check_name("notation name", name)?;

        let Some(lk) = self.nodes.front() else {
            return Err(XmlWriterError::state("no open DTD to declare in"));
        };

        let mut sum = 0;
        match lk.state.get() {
            XmlTextWriterState::DTD => {
                sum += self.out.write_str(" [")?;
                if self.indent {
                    sum += self.out.write_str("\n")?;
                }
                lk.state.set(XmlTextWriterState::DTDText);
            }
            XmlTextWriterState::DTDText => {}
            _ => {
                return Err(XmlWriterError::state(
                    "a notation declaration is not allowed in this context",
                ));
            }
        }

        if self.indent {
            sum += self.write_indent()?;
        }

        sum += self.out.write_str("<!NOTATION ")?;
        sum += self.out.write_str(name)?;

        if let Some(pubid) = pubid {
            sum += self.out.write_str(" PUBLIC ")?;
            sum += self.out.write_bytes(&[self.qchar])?;
            sum += self.out.write_str(pubid)?;
            sum += self.out.write_bytes(&[self.qchar])?;
        }

        if let Some(sysid) = sysid {
            if pubid.is_none() {
                sum += self.out.write_str(" SYSTEM")?;
            }
            sum += self.out.write_str(" ")?;
            sum += self.out.write_bytes(&[self.qchar])?;
            sum += self.out.write_str(sysid)?;
            sum += self.out.write_bytes(&[self.qchar])?;
        }

        sum += self.out.write_str(">")?;
        Ok(sum)
    }
}

impl Drop for XmlTextWriter<'_> {
    /// Release all the resources associated to the writer.
    #[doc(alias = "xmlFreeTextWriter")]
    fn drop(&mut self) {
        self.close().ok();
    }
}
