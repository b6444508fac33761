//! Provide methods and data structures for the writer's output channels.
//!
//! This module is based on the output half of `libxml/xmlIO.h` and `xmlIO.c`
//! in `libxml2-v2.11.8`.
//! Please refer to original libxml2 documents also.

// Copyright of the original code is the following.
// --------
// Summary: interface for the I/O interfaces used by the parser
// Description: interface for the I/O interfaces used by the parser
//
// Copy: See Copyright for the status of this software.
//
// Author: Daniel Veillard
// --------
// xmlIO.c : implementation of the I/O interfaces used by the parser
//
// See Copyright for the status of this software.
//
// daniel@veillard.com

mod output;

use std::path::PathBuf;

use url::Url;

use crate::error::XmlWriterError;

pub use output::XmlOutputBuffer;

/// Do not flush the buffered bytes to the I/O channel below this size,
/// except on an explicit flush or close.
const MINLEN: usize = 4000;

/// Escape character data for element content.
///
/// `<`, `>` and `&` become entity references; a carriage return becomes a
/// character reference so it survives attribute-value normalization on
/// re-parse.
#[doc(alias = "xmlEscapeContent")]
pub(crate) fn xml_escape_content(input: &str, output: &mut String) {
    for input in input.chars() {
        match input {
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '&' => output.push_str("&amp;"),
            '\r' => output.push_str("&#13;"),
            c => output.push(c),
        }
    }
}

/// Escape character data for an attribute value.
///
/// Besides the element-content set, the double quote and the whitespace
/// characters subject to attribute-value normalization are written as
/// references.
#[doc(alias = "xmlAttrSerializeTxtContent")]
pub(crate) fn xml_escape_attribute(input: &str, output: &mut String) {
    for input in input.chars() {
        match input {
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '&' => output.push_str("&amp;"),
            '"' => output.push_str("&quot;"),
            '\n' => output.push_str("&#10;"),
            '\t' => output.push_str("&#9;"),
            '\r' => output.push_str("&#13;"),
            c => output.push(c),
        }
    }
}

/// Resolve an output destination to a local file path.
///
/// Accepts a plain filesystem path, `file:///...` or `file://localhost/...`.
/// Any other URI scheme or `file` host is rejected as an invalid
/// destination, and so is a URI that names no file at all. The parent
/// directory must already exist, so a bad destination fails here with a
/// descriptive error instead of surfacing later as a bare I/O error.
pub(crate) fn resolve_output_path(uri: &str) -> Result<PathBuf, XmlWriterError> {
    if uri.is_empty() {
        return Err(XmlWriterError::Construction(
            "output destination must not be empty".into(),
        ));
    }

    let path = match Url::parse(uri) {
        Ok(url) => {
            if url.scheme() != "file" {
                return Err(XmlWriterError::Construction(format!(
                    "scheme \"{}\" is not a valid output destination",
                    url.scheme()
                )));
            }
            let path = url.to_file_path().map_err(|_| {
                XmlWriterError::Construction(format!("unable to resolve file URI \"{uri}\""))
            })?;
            if path.file_name().is_none() {
                return Err(XmlWriterError::Construction(format!(
                    "file URI \"{uri}\" names no file"
                )));
            }
            path
        }
        // not a URI, treat as a plain path
        Err(_) => PathBuf::from(uri),
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            return Err(XmlWriterError::Construction(format!(
                "unable to resolve file path \"{uri}\": directory \"{}\" does not exist",
                parent.display()
            )));
        }
    }

    Ok(path)
}
