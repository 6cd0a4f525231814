use quick_xml::NsReader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;

use crate::core::{CfdiError, Element, XmlNode};

fn xml_err(e: impl std::fmt::Display) -> CfdiError {
    CfdiError::Xml(format!("XML parse error: {e}"))
}

/// Parse an XML string into an element tree, resolving namespaces.
///
/// Whitespace-only text between elements is dropped; other text and CDATA
/// are kept as [`XmlNode::Text`]. Declarations, comments and processing
/// instructions are ignored.
pub fn parse(xml: &str) -> Result<Element, CfdiError> {
    let mut reader = NsReader::from_str(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let (resolved, event) = reader.read_resolved_event().map_err(xml_err)?;
        let namespace = match resolved {
            ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.as_ref()).into_owned()),
            _ => None,
        };
        match event {
            Event::Start(ref e) => stack.push(element(e, namespace)?),
            Event::Empty(ref e) => attach(&mut stack, &mut root, element(e, namespace)?)?,
            Event::End(_) => {
                let done = stack
                    .pop()
                    .ok_or_else(|| xml_err("closing tag without opening tag"))?;
                attach(&mut stack, &mut root, done)?;
            }
            Event::Text(ref e) => {
                let text = e.unescape().map_err(xml_err)?;
                if !text.trim().is_empty() {
                    push_text(&mut stack, text.into_owned())?;
                }
            }
            Event::CData(e) => {
                let text = String::from_utf8(e.into_inner().into_owned()).map_err(xml_err)?;
                push_text(&mut stack, text)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(xml_err("unexpected end of document"));
    }
    root.ok_or_else(|| xml_err("document has no root element"))
}

fn element(start: &BytesStart<'_>, namespace: Option<String>) -> Result<Element, CfdiError> {
    let name = String::from_utf8(start.name().as_ref().to_vec()).map_err(xml_err)?;
    let mut el = Element::new(name);
    el.namespace = namespace;
    for attr in start.attributes() {
        let attr = attr.map_err(xml_err)?;
        let key = String::from_utf8(attr.key.as_ref().to_vec()).map_err(xml_err)?;
        let value = attr.unescape_value().map_err(xml_err)?.into_owned();
        el.attributes.push((key, value));
    }
    Ok(el)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, el: Element) -> Result<(), CfdiError> {
    match stack.last_mut() {
        Some(parent) => parent.push_child(el),
        None if root.is_none() => *root = Some(el),
        None => return Err(xml_err("more than one root element")),
    }
    Ok(())
}

fn push_text(stack: &mut [Element], text: String) -> Result<(), CfdiError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(XmlNode::Text(text));
            Ok(())
        }
        None => Err(xml_err("text outside the root element")),
    }
}
