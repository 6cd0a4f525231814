use std::io::Cursor;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use super::WriteOptions;
use crate::core::{CfdiError, Element, XmlNode};

fn xml_io(e: std::io::Error) -> CfdiError {
    CfdiError::Xml(format!("XML write error: {e}"))
}

/// Serialize an element tree. Attributes are written in stored order and
/// values are escaped; elements without children are self-closed.
pub fn write(root: &Element, options: &WriteOptions) -> Result<String, CfdiError> {
    let cursor = Cursor::new(Vec::new());
    let mut writer = match options.indent {
        Some(width) => Writer::new_with_indent(cursor, b' ', width),
        None => Writer::new(cursor),
    };
    if options.declaration {
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_io)?;
    }
    write_element(&mut writer, root)?;

    let buf = writer.into_inner().into_inner();
    String::from_utf8(buf).map_err(|e| CfdiError::Xml(format!("XML UTF-8 error: {e}")))
}

fn write_element(writer: &mut Writer<Cursor<Vec<u8>>>, el: &Element) -> Result<(), CfdiError> {
    let mut start = BytesStart::new(el.name.as_str());
    for (key, value) in &el.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }
    if el.children.is_empty() {
        return writer.write_event(Event::Empty(start)).map_err(xml_io);
    }

    writer.write_event(Event::Start(start)).map_err(xml_io)?;
    for child in &el.children {
        match child {
            XmlNode::Element(e) => write_element(writer, e)?,
            XmlNode::Text(t) => writer
                .write_event(Event::Text(BytesText::new(t)))
                .map_err(xml_io)?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(el.name.as_str())))
        .map_err(xml_io)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_output_with_declaration() {
        let mut root = Element::new("cfdi:Emisor");
        root.set_attribute("Nombre", "A & B");
        let xml = write(&root, &WriteOptions::default()).unwrap();
        assert_eq!(
            xml,
            r#"<?xml version="1.0" encoding="UTF-8"?><cfdi:Emisor Nombre="A &amp; B"/>"#
        );
    }

    #[test]
    fn text_children_are_escaped() {
        let mut root = Element::new("Nota");
        root.children.push(XmlNode::Text("1 < 2".into()));
        let options = WriteOptions {
            declaration: false,
            ..Default::default()
        };
        assert_eq!(write(&root, &options).unwrap(), "<Nota>1 &lt; 2</Nota>");
    }
}
