//! XML output for structural and descriptive records.
//!
//! # Structural
//!
//! ```xml
//! <record>
//!   <identifier>ark:/12345/abc</identifier>
//!   <pages>
//!     <page number="1" seq="1" image.defaultscale="3" side="recto" image="0001" visiblepage="1r" display="true">
//!       <tocentry name="toc">Chapter 1</tocentry>
//!       <tocentry name="ill">Frontispiece</tocentry>
//!     </page>
//!   </pages>
//! </record>
//! ```
//!
//! # Descriptive
//!
//! ```xml
//! <records>
//!   <record>
//!     <identifier>ark:/12345/abc</identifier>
//!     <title><value>A</value></title>
//!   </record>
//! </records>
//! ```

use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::XmlResult;
use crate::logs::log_warning;
use crate::models::{ElementMap, Page};

/// Default image scale written on every page.
pub const DEFAULT_SCALE: &str = "3";

/// Element carrying the package identifier in structural XML.
pub const STRUCTURAL_IDENTIFIER: &str = "identifier";

fn new_writer<W: Write>(inner: W) -> XmlResult<Writer<W>> {
    let mut xml = Writer::new_with_indent(inner, b' ', 2);
    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    Ok(xml)
}

/// Write `<name>text</name>`.
pub fn write_text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> XmlResult<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

// =============================================================================
// Structural
// =============================================================================

/// Write a structural record for one package.
pub fn write_structural<W: Write>(out: W, identifier: &str, pages: &[Page]) -> XmlResult<()> {
    let mut xml = new_writer(out)?;

    xml.write_event(Event::Start(BytesStart::new("record")))?;
    write_text_element(&mut xml, STRUCTURAL_IDENTIFIER, identifier)?;
    xml.write_event(Event::Start(BytesStart::new("pages")))?;

    for (index, page) in pages.iter().enumerate() {
        write_page(&mut xml, index + 1, page)?;
    }

    xml.write_event(Event::End(BytesEnd::new("pages")))?;
    xml.write_event(Event::End(BytesEnd::new("record")))?;
    xml.into_inner().flush()?;
    Ok(())
}

/// Structural record as a string.
pub fn structural_to_string(identifier: &str, pages: &[Page]) -> XmlResult<String> {
    let mut buffer = Vec::new();
    write_structural(&mut buffer, identifier, pages)?;
    Ok(String::from_utf8(buffer)?)
}

fn write_page<W: Write>(xml: &mut Writer<W>, number: usize, page: &Page) -> XmlResult<()> {
    let number = number.to_string();
    let sequence = page.sequence.to_string();

    let mut node = BytesStart::new("page");
    node.push_attribute(("number", number.as_str()));
    node.push_attribute(("seq", sequence.as_str()));
    node.push_attribute(("image.defaultscale", DEFAULT_SCALE));
    node.push_attribute(("side", page.side.as_str()));
    node.push_attribute(("image", page.image.as_str()));
    if let Some(visible) = &page.visible_page {
        node.push_attribute(("visiblepage", visible.as_str()));
    }
    node.push_attribute(("display", if page.display { "true" } else { "false" }));

    if page.toc.is_empty() && page.illustrations.is_empty() {
        xml.write_event(Event::Empty(node))?;
        return Ok(());
    }

    xml.write_event(Event::Start(node))?;
    for (name, entries) in [("toc", &page.toc), ("ill", &page.illustrations)] {
        for entry in entries {
            let mut toc = BytesStart::new("tocentry");
            toc.push_attribute(("name", name));
            xml.write_event(Event::Start(toc))?;
            xml.write_event(Event::Text(BytesText::new(entry)))?;
            xml.write_event(Event::End(BytesEnd::new("tocentry")))?;
        }
    }
    xml.write_event(Event::End(BytesEnd::new("page")))?;
    Ok(())
}

// =============================================================================
// Descriptive
// =============================================================================

/// Write descriptive records.
///
/// When `identifier_element` is set, that element is written once per record
/// as plain text (its first value) ahead of the others; further values are
/// dropped with a warning. Every other element wraps each value in `<value>`.
pub fn write_descriptive<W: Write>(
    out: W,
    records: &[ElementMap],
    identifier_element: Option<&str>,
) -> XmlResult<()> {
    let mut xml = new_writer(out)?;
    xml.write_event(Event::Start(BytesStart::new("records")))?;

    for record in records {
        xml.write_event(Event::Start(BytesStart::new("record")))?;

        if let Some(name) = identifier_element {
            if let Some((id, rest)) = record.get(name).and_then(|values| values.split_first()) {
                if !rest.is_empty() {
                    log_warning(format!(
                        "Record {} has {} extra <{}> value(s), dropped: {}",
                        id,
                        rest.len(),
                        name,
                        rest.join(", ")
                    ));
                }
                write_text_element(&mut xml, name, id)?;
            }
        }

        for (element, values) in record.iter() {
            if Some(element) == identifier_element {
                continue;
            }
            xml.write_event(Event::Start(BytesStart::new(element)))?;
            for value in values {
                write_text_element(&mut xml, "value", value)?;
            }
            xml.write_event(Event::End(BytesEnd::new(element)))?;
        }

        xml.write_event(Event::End(BytesEnd::new("record")))?;
    }

    xml.write_event(Event::End(BytesEnd::new("records")))?;
    xml.into_inner().flush()?;
    Ok(())
}

/// Descriptive records as a string.
pub fn descriptive_to_string(records: &[ElementMap], identifier_element: Option<&str>) -> XmlResult<String> {
    let mut buffer = Vec::new();
    write_descriptive(&mut buffer, records, identifier_element)?;
    Ok(String::from_utf8(buffer)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logs::{LogLevel, LOG_BROADCASTER};
    use tokio::sync::broadcast::error::TryRecvError;

    #[test]
    fn test_structural_xml() {
        let mut first = Page::listed(1, "0001");
        first.visible_page = Some("1r".into());
        first.toc = vec!["Chapter 1".into()];
        first.illustrations = vec!["Frontispiece".into()];
        let hidden = Page::unlisted(2, "0002");

        let xml = structural_to_string("ark:/12345/abc", &[first, hidden]).unwrap();

        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains("<identifier>ark:/12345/abc</identifier>"));
        assert!(xml.contains(
            r#"<page number="1" seq="1" image.defaultscale="3" side="recto" image="0001" visiblepage="1r" display="true">"#
        ));
        assert!(xml.contains(r#"<tocentry name="toc">Chapter 1</tocentry>"#));
        assert!(xml.contains(r#"<tocentry name="ill">Frontispiece</tocentry>"#));
        assert!(xml.contains(
            r#"<page number="2" seq="2" image.defaultscale="3" side="verso" image="0002" display="false"/>"#
        ));
    }

    #[test]
    fn test_number_is_output_position() {
        let pages = vec![Page::listed(5, "0005"), Page::listed(4, "0004")];
        let xml = structural_to_string("ark:/1/a", &pages).unwrap();
        assert!(xml.contains(r#"number="1" seq="5""#));
        assert!(xml.contains(r#"number="2" seq="4""#));
    }

    #[test]
    fn test_text_is_escaped() {
        let mut page = Page::listed(1, "0001");
        page.toc = vec!["Tom & Jerry <1>".into()];
        let xml = structural_to_string("ark:/1/a", &[page]).unwrap();
        assert!(xml.contains("Tom &amp; Jerry &lt;1&gt;"));
    }

    #[test]
    fn test_descriptive_xml() {
        let mut map = ElementMap::new();
        map.push("identifier", vec!["ark:/12345/abc".to_string()]);
        map.push("title", vec!["A".to_string(), "B".to_string()]);

        let xml = descriptive_to_string(&[map], Some("identifier")).unwrap();

        assert!(xml.contains("<records>"));
        assert!(xml.contains("<identifier>ark:/12345/abc</identifier>"));
        assert!(!xml.contains("<identifier>\n"));
        assert!(xml.contains("<value>A</value>"));
        assert!(xml.contains("<value>B</value>"));
        let a = xml.find("<value>A</value>").unwrap();
        let b = xml.find("<value>B</value>").unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_extra_identifier_values_warned() {
        let mut rx = LOG_BROADCASTER.subscribe();
        let mut map = ElementMap::new();
        map.push("identifier", vec!["ark:/1/first".to_string(), "ark:/1/second".to_string()]);

        let xml = descriptive_to_string(&[map], Some("identifier")).unwrap();
        assert!(xml.contains("<identifier>ark:/1/first</identifier>"));
        assert!(!xml.contains("ark:/1/second"));

        let mut warned = false;
        loop {
            match rx.try_recv() {
                Ok(entry) if entry.level == LogLevel::Warning && entry.message.contains("ark:/1/second") => {
                    warned = true;
                    break;
                }
                Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
        assert!(warned);
    }

    #[test]
    fn test_descriptive_without_identifier() {
        let mut map = ElementMap::new();
        map.push("identifier", vec!["x".to_string()]);

        let xml = descriptive_to_string(&[map], None).unwrap();
        assert!(xml.contains("<value>x</value>"));
    }

    #[test]
    fn test_write_to_any_writer() {
        let mut out: Vec<u8> = Vec::new();
        write_descriptive(&mut out, &[], None).unwrap();
        let xml = String::from_utf8(out).unwrap();
        assert!(xml.contains("<records>"));
        assert!(xml.contains("</records>"));
    }
}
