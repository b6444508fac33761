//! Integration tests for the streaming writer: produced bytes, nesting
//! discipline, sink behavior and re-parse checks.

use quick_xml::Reader;
use quick_xml::events::Event;

use xwriter::error::XmlWriterError;
use xwriter::writer::XmlTextWriter;

#[test]
fn document_with_attribute_and_text() {
    let mut writer = XmlTextWriter::from_memory();
    writer
        .start_document(Some("1.0"), Some("UTF-8"), None)
        .unwrap();
    writer.start_element("root").unwrap();
    writer.write_attribute("id", "1").unwrap();
    writer.write_string("hello").unwrap();
    writer.end_element().unwrap();
    writer.end_document().unwrap();

    assert_eq!(
        writer.output_memory(true).unwrap(),
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<root id=\"1\">hello</root>\n"
    );
}

#[test]
fn end_document_auto_closes_open_elements() {
    let mut writer = XmlTextWriter::from_memory();
    writer.start_element("a").unwrap();
    writer.start_element("b").unwrap();
    writer.end_document().unwrap();

    assert_eq!(writer.output_memory(true).unwrap(), "<a><b/></a>\n");
}

#[test]
fn full_end_element_writes_end_tag_for_empty_element() {
    let mut writer = XmlTextWriter::from_memory();
    writer.start_element("a").unwrap();
    writer.full_end_element().unwrap();
    assert_eq!(writer.output_memory(true).unwrap(), "<a></a>");
}

#[test]
fn text_and_attribute_escaping() {
    let mut writer = XmlTextWriter::from_memory();
    writer.start_element("e").unwrap();
    writer
        .write_attribute("v", "\"quoted\" & <tag>")
        .unwrap();
    writer.write_string("<a & b>").unwrap();
    writer.end_element().unwrap();

    assert_eq!(
        writer.output_memory(true).unwrap(),
        "<e v=\"&quot;quoted&quot; &amp; &lt;tag&gt;\">&lt;a &amp; b&gt;</e>"
    );
}

#[test]
fn invalid_names_fail_without_output() {
    let mut writer = XmlTextWriter::from_memory();

    for name in ["", "1st", "-x", "has space", "<tag>"] {
        assert!(matches!(
            writer.start_element(name),
            Err(XmlWriterError::InvalidArgument { .. })
        ));
    }
    assert!(matches!(
        writer.start_pi("1pi"),
        Err(XmlWriterError::InvalidArgument { .. })
    ));
    assert!(matches!(
        writer.start_dtd("2doc", None, None),
        Err(XmlWriterError::InvalidArgument { .. })
    ));

    assert_eq!(writer.output_memory(true).unwrap(), "");
}

#[test]
fn nesting_discipline() {
    let mut writer = XmlTextWriter::from_memory();
    assert!(matches!(
        writer.end_element(),
        Err(XmlWriterError::State(_))
    ));
    assert!(matches!(
        writer.end_attribute(),
        Err(XmlWriterError::State(_))
    ));
    assert!(matches!(
        writer.write_string("text with no element"),
        Err(XmlWriterError::State(_))
    ));

    writer.start_element("a").unwrap();
    writer.write_string("child").unwrap();
    // the start tag is closed once a child is written
    assert!(matches!(
        writer.start_attribute("late"),
        Err(XmlWriterError::State(_))
    ));
}

#[test]
fn start_document_twice_fails() {
    let mut writer = XmlTextWriter::from_memory();
    writer.start_document(None, None, None).unwrap();
    assert!(matches!(
        writer.start_document(None, None, None),
        Err(XmlWriterError::State(_))
    ));
}

#[test]
fn unsupported_encoding_is_rejected_before_output() {
    let mut writer = XmlTextWriter::from_memory();
    assert!(matches!(
        writer.start_document(None, Some("klingon"), None),
        Err(XmlWriterError::UnsupportedEncoding(_))
    ));
    assert_eq!(writer.output_memory(true).unwrap(), "");
}

#[test]
fn close_is_idempotent_and_finishes_the_writer() {
    let mut writer = XmlTextWriter::from_memory();
    writer.start_element("a").unwrap();
    writer.end_element().unwrap();
    writer.close().unwrap();
    writer.close().unwrap();

    assert!(matches!(
        writer.start_element("b"),
        Err(XmlWriterError::State(_))
    ));
    assert!(matches!(writer.flush(), Err(XmlWriterError::State(_))));
}

#[test]
fn output_memory_copy_then_drain() {
    let mut writer = XmlTextWriter::from_memory();
    writer.start_element("x").unwrap();
    writer.end_element().unwrap();

    assert_eq!(writer.output_memory(false).unwrap(), "<x/>");
    assert_eq!(writer.output_memory(false).unwrap(), "<x/>");
    assert_eq!(writer.output_memory(true).unwrap(), "<x/>");
    assert_eq!(writer.output_memory(true).unwrap(), "");
}

#[test]
fn namespaced_element_and_attribute() {
    let mut writer = XmlTextWriter::from_memory();
    writer
        .start_element_ns(Some("x"), "root", Some("urn:a"))
        .unwrap();
    writer.end_element().unwrap();
    assert_eq!(
        writer.output_memory(true).unwrap(),
        "<x:root xmlns:x=\"urn:a\"/>"
    );

    let mut writer = XmlTextWriter::from_memory();
    writer.start_element("doc").unwrap();
    writer
        .write_attribute_ns(Some("x"), "a", Some("urn:a"), "v")
        .unwrap();
    // same prefix, same URI: no duplicate declaration
    writer
        .write_attribute_ns(Some("x"), "b", Some("urn:a"), "w")
        .unwrap();
    // same prefix, different URI on the same element: rejected
    assert!(matches!(
        writer.write_attribute_ns(Some("x"), "c", Some("urn:b"), "z"),
        Err(XmlWriterError::InvalidArgument { .. })
    ));
    writer.end_element().unwrap();
    assert_eq!(
        writer.output_memory(true).unwrap(),
        "<doc x:a=\"v\" x:b=\"w\" xmlns:x=\"urn:a\"/>"
    );
}

#[test]
fn streamed_attribute_value() {
    let mut writer = XmlTextWriter::from_memory();
    writer.start_element("a").unwrap();
    writer.start_attribute("href").unwrap();
    writer.write_string("https://example.com/?q=").unwrap();
    writer.write_string("x&y").unwrap();
    writer.end_attribute().unwrap();
    writer.end_element().unwrap();

    assert_eq!(
        writer.output_memory(true).unwrap(),
        "<a href=\"https://example.com/?q=x&amp;y\"/>"
    );
}

#[test]
fn cdata_with_terminator_is_split() {
    let mut writer = XmlTextWriter::from_memory();
    writer.start_element("c").unwrap();
    writer.write_cdata(Some("a]]>b")).unwrap();
    writer.end_element().unwrap();

    assert_eq!(
        writer.output_memory(true).unwrap(),
        "<c><![CDATA[a]]]]><![CDATA[>b]]></c>"
    );
}

#[test]
fn comment_rejects_double_hyphen() {
    let mut writer = XmlTextWriter::from_memory();
    assert!(matches!(
        writer.write_comment("not -- allowed"),
        Err(XmlWriterError::InvalidArgument { .. })
    ));
    assert!(matches!(
        writer.write_comment("trailing-"),
        Err(XmlWriterError::InvalidArgument { .. })
    ));
    writer.write_comment("fine - comment").unwrap();
    assert_eq!(writer.output_memory(true).unwrap(), "<!--fine - comment-->");
}

#[test]
fn pi_target_checks() {
    let mut writer = XmlTextWriter::from_memory();
    for target in ["xml", "XML", "xMl"] {
        assert!(matches!(
            writer.write_pi(target, None),
            Err(XmlWriterError::InvalidArgument { .. })
        ));
    }
    writer.write_pi("php", Some("echo 1;")).unwrap();
    writer.start_pi("x").unwrap();
    assert!(matches!(
        writer.start_pi("y"),
        Err(XmlWriterError::State(_))
    ));
    writer.end_pi().unwrap();
    assert_eq!(writer.output_memory(true).unwrap(), "<?php echo 1;?><?x?>");
}

#[test]
fn dtd_with_external_identifiers() {
    let mut writer = XmlTextWriter::from_memory();
    writer
        .start_dtd(
            "html",
            Some("-//W3C//DTD XHTML 1.0 Strict//EN"),
            Some("http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd"),
        )
        .unwrap();
    writer.end_dtd().unwrap();

    assert_eq!(
        writer.output_memory(true).unwrap(),
        "<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.0 Strict//EN\" \
         \"http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd\">"
    );

    // a public identifier alone is not enough
    let mut writer = XmlTextWriter::from_memory();
    assert!(matches!(
        writer.start_dtd("html", Some("-//W3C//EN"), None),
        Err(XmlWriterError::InvalidArgument { .. })
    ));
}

#[test]
fn dtd_internal_subset() {
    let mut writer = XmlTextWriter::from_memory();
    writer.start_dtd("doc", None, None).unwrap();
    writer.write_dtd_element("doc", "(#PCDATA)").unwrap();
    writer.write_dtd_attlist("doc", "id CDATA #IMPLIED").unwrap();
    writer
        .write_dtd_internal_entity(false, "nbsp", "&#160;")
        .unwrap();
    writer
        .write_dtd_entity(false, "chap", None, Some("chap.xml"), None, None)
        .unwrap();
    writer
        .write_dtd_notation("gif", None, Some("viewer"))
        .unwrap();
    writer.end_dtd().unwrap();

    assert_eq!(
        writer.output_memory(true).unwrap(),
        "<!DOCTYPE doc [<!ELEMENT doc (#PCDATA)>\
         <!ATTLIST doc id CDATA #IMPLIED>\
         <!ENTITY nbsp \"&#160;\">\
         <!ENTITY chap SYSTEM \"chap.xml\">\
         <!NOTATION gif SYSTEM \"viewer\">]>"
    );
}

#[test]
fn dtd_entity_argument_checks() {
    let mut writer = XmlTextWriter::from_memory();
    // neither content nor identifiers
    assert!(matches!(
        writer.write_dtd_entity(false, "e", None, None, None, None),
        Err(XmlWriterError::InvalidArgument { .. })
    ));
    // a parameter entity cannot carry a notation
    assert!(matches!(
        writer.write_dtd_entity(true, "e", None, Some("s"), Some("n"), None),
        Err(XmlWriterError::InvalidArgument { .. })
    ));
    // DTD declarations are rejected once the root element is open
    writer.start_element("root").unwrap();
    assert!(matches!(
        writer.start_dtd("doc", None, None),
        Err(XmlWriterError::State(_))
    ));
}

#[test]
fn parameter_entity_uses_percent_marker() {
    let mut writer = XmlTextWriter::from_memory();
    writer
        .write_dtd_internal_entity(true, "fields", "name | address")
        .unwrap();
    assert_eq!(
        writer.output_memory(true).unwrap(),
        "<!ENTITY % fields \"name | address\">"
    );
}

#[test]
fn indentation() {
    let mut writer = XmlTextWriter::from_memory();
    writer.set_indent(true);
    writer.set_indent_string("  ");
    writer.start_document(None, None, None).unwrap();
    writer.start_element("a").unwrap();
    writer.start_element("b").unwrap();
    writer.write_string("t").unwrap();
    writer.end_element().unwrap();
    writer.start_element("c").unwrap();
    writer.end_element().unwrap();
    writer.end_document().unwrap();

    assert_eq!(
        writer.output_memory(true).unwrap(),
        "<?xml version=\"1.0\"?>\n<a>\n  <b>t</b>\n  <c/>\n</a>\n"
    );
}

#[test]
fn quote_char() {
    let mut writer = XmlTextWriter::from_memory();
    assert!(matches!(
        writer.set_quote_char(b'x'),
        Err(XmlWriterError::InvalidArgument { .. })
    ));
    writer.set_quote_char(b'\'').unwrap();
    writer.start_element("q").unwrap();
    writer.write_attribute("a", "v").unwrap();
    writer.end_element().unwrap();
    assert_eq!(writer.output_memory(true).unwrap(), "<q a='v'/>");
}

#[test]
fn base64_content() {
    let mut writer = XmlTextWriter::from_memory();
    writer.start_element("bin").unwrap();
    writer.write_base64(b"Man").unwrap();
    writer.end_element().unwrap();
    assert_eq!(writer.output_memory(true).unwrap(), "<bin>TWFu</bin>");

    let mut writer = XmlTextWriter::from_memory();
    writer.start_element("bin").unwrap();
    writer.write_base64(b"M").unwrap();
    writer.end_element().unwrap();
    assert_eq!(writer.output_memory(true).unwrap(), "<bin>TQ==</bin>");
}

#[test]
fn raw_passthrough_is_not_escaped() {
    let mut writer = XmlTextWriter::from_memory();
    writer.start_element("r").unwrap();
    writer.write_raw("<already-markup/>").unwrap();
    writer.end_element().unwrap();
    assert_eq!(
        writer.output_memory(true).unwrap(),
        "<r><already-markup/></r>"
    );
}

#[test]
fn file_sink_plain_path_and_uri() {
    let dir = tempfile::tempdir().unwrap();

    let path = dir.path().join("plain.xml");
    let mut writer = XmlTextWriter::from_filename(path.to_str().unwrap()).unwrap();
    writer.start_element("doc").unwrap();
    writer.end_document().unwrap();
    writer.close().unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "<doc/>\n");

    let path = dir.path().join("uri.xml");
    let uri = format!("file://{}", path.display());
    let mut writer = XmlTextWriter::from_filename(&uri).unwrap();
    writer.write_element("doc", Some("x")).unwrap();
    writer.close().unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "<doc>x</doc>");
}

#[test]
fn file_sink_construction_failures() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("no-such-dir").join("out.xml");

    assert!(matches!(
        XmlTextWriter::from_filename(missing.to_str().unwrap()),
        Err(XmlWriterError::Construction(_))
    ));
    assert!(matches!(
        XmlTextWriter::from_filename("http://example.com/out.xml"),
        Err(XmlWriterError::Construction(_))
    ));
    assert!(matches!(
        XmlTextWriter::from_filename(""),
        Err(XmlWriterError::Construction(_))
    ));
}

#[test]
fn stream_sink_is_released_not_closed() {
    let mut sink = Vec::new();
    {
        let mut writer = XmlTextWriter::from_writer(&mut sink);
        writer.start_element("s").unwrap();
        writer.end_document().unwrap();
        writer.close().unwrap();
    }
    // the stream is still ours to use
    sink.extend_from_slice(b"tail");
    assert_eq!(sink, b"<s/>\ntail");
}

#[test]
fn declared_encoding_converts_stream_bytes() {
    let mut sink = Vec::new();
    {
        let mut writer = XmlTextWriter::from_writer(&mut sink);
        writer
            .start_document(None, Some("latin1"), None)
            .unwrap();
        writer.write_element("p", Some("caf\u{e9}")).unwrap();
        writer.end_document().unwrap();
        writer.close().unwrap();
    }
    assert_eq!(
        sink,
        b"<?xml version=\"1.0\" encoding=\"windows-1252\"?>\n<p>caf\xe9</p>\n"
    );
}

#[test]
fn memory_round_trip_reparses() {
    let mut writer = XmlTextWriter::from_memory();
    writer
        .start_document(Some("1.0"), Some("UTF-8"), None)
        .unwrap();
    writer.start_element("library").unwrap();
    writer.write_attribute("size", "2").unwrap();
    writer.start_element("book").unwrap();
    writer.write_attribute("title", "Tom & Jerry").unwrap();
    writer.write_string("a <classic>").unwrap();
    writer.end_element().unwrap();
    writer.write_element("empty", None).unwrap();
    writer.end_document().unwrap();
    let xml = writer.output_memory(true).unwrap();

    let mut names = Vec::new();
    let mut attrs = Vec::new();
    let mut texts = Vec::new();
    let mut reader = Reader::from_str(&xml);
    loop {
        match reader.read_event().unwrap() {
            Event::Start(e) | Event::Empty(e) => {
                names.push(String::from_utf8(e.name().as_ref().to_vec()).unwrap());
                for attr in e.attributes() {
                    let attr = attr.unwrap();
                    attrs.push((
                        String::from_utf8(attr.key.as_ref().to_vec()).unwrap(),
                        attr.unescape_value().unwrap().into_owned(),
                    ));
                }
            }
            Event::Text(t) => {
                let text = t.unescape().unwrap().into_owned();
                if !text.trim().is_empty() {
                    texts.push(text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    assert_eq!(names, ["library", "book", "empty"]);
    assert_eq!(
        attrs,
        [
            ("size".to_owned(), "2".to_owned()),
            ("title".to_owned(), "Tom & Jerry".to_owned()),
        ]
    );
    assert_eq!(texts, ["a <classic>"]);
}
