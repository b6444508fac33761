//! Pure Rust streaming XML text writer based on libxml2's xmlwriter.
//!
//! The writer streams a document to an output sink construct by construct,
//! enforcing structural validity as it goes: names are checked against the
//! XML `Name` grammar, operations invalid in the current nesting state fail
//! before anything is written, and start tags stay open for attributes
//! until the first child arrives.
//!
//! Output can go to an in-memory buffer, a local file (plain path or
//! `file://` URI) or any already-open [`std::io::Write`] stream.
//!
//! # Examples
//!
//! ```
//! use xwriter::writer::XmlTextWriter;
//!
//! let mut writer = XmlTextWriter::from_memory();
//! writer.start_document(Some("1.0"), Some("UTF-8"), None).unwrap();
//! writer.start_element("root").unwrap();
//! writer.write_attribute("id", "1").unwrap();
//! writer.write_string("hello").unwrap();
//! writer.end_document().unwrap();
//!
//! assert_eq!(
//!     writer.output_memory(true).unwrap(),
//!     "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<root id=\"1\">hello</root>\n"
//! );
//! ```

mod buf;

pub mod encoding;
pub mod error;
pub mod io;
pub mod name;
pub mod writer;
