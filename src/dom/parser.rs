//! quick-xml event stream to arena [`Document`].

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::arena::{Attribute, Document, NodeData, NodeId, QName};
use crate::error::{Error, Result};

/// Deepest element nesting accepted, counting the root element as 1.
///
/// Same default as libxml2. Cloning and writing walk the tree recursively.
pub const MAX_DEPTH: usize = 256;

/// Parse a complete XML document.
///
/// Whitespace, comments and processing instructions inside the root element
/// are preserved so that extracted subtrees keep their original layout.
/// Elements nested deeper than [`MAX_DEPTH`] are rejected.
pub fn parse_str(content: &str) -> Result<Document> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(false);

    let mut doc = Document::new();
    let mut stack: Vec<NodeId> = vec![doc.document()];

    loop {
        let top = *stack.last().unwrap_or(&NodeId::NONE);
        let at_top_level = stack.len() == 1;

        match reader.read_event()? {
            Event::Start(e) => {
                if at_top_level && doc.root_element().is_some() {
                    return Err(Error::Malformed("multiple root elements".into()));
                }
                check_depth(stack.len())?;
                let id = create_element(&mut doc, &e)?;
                doc.append(top, id);
                stack.push(id);
            }
            Event::Empty(e) => {
                if at_top_level && doc.root_element().is_some() {
                    return Err(Error::Malformed("multiple root elements".into()));
                }
                check_depth(stack.len())?;
                let id = create_element(&mut doc, &e)?;
                doc.append(top, id);
            }
            Event::End(_) => {
                if at_top_level {
                    return Err(Error::Malformed("unexpected closing tag".into()));
                }
                stack.pop();
            }
            Event::Text(e) => {
                let text = String::from_utf8_lossy(&e);
                if at_top_level {
                    if !text.trim().is_empty() {
                        return Err(Error::Malformed("text outside of root element".into()));
                    }
                } else {
                    doc.append_text(top, &text);
                }
            }
            Event::GeneralRef(e) => {
                if at_top_level {
                    return Err(Error::Malformed("entity outside of root element".into()));
                }
                // Kept escaped; the writer emits text verbatim.
                doc.append_text(top, &format!("&{};", String::from_utf8_lossy(&e)));
            }
            Event::CData(e) => {
                let node = doc.create_node(NodeData::CData(String::from_utf8_lossy(&e).into_owned()));
                doc.append(top, node);
            }
            Event::Comment(e) => {
                let node =
                    doc.create_node(NodeData::Comment(String::from_utf8_lossy(&e).into_owned()));
                doc.append(top, node);
            }
            Event::PI(e) => {
                let node = doc.create_node(NodeData::ProcessingInstruction(
                    String::from_utf8_lossy(&e).into_owned(),
                ));
                doc.append(top, node);
            }
            Event::DocType(e) => {
                let node =
                    doc.create_node(NodeData::Doctype(String::from_utf8_lossy(&e).into_owned()));
                doc.append(top, node);
            }
            Event::Decl(_) => {}
            Event::Eof => break,
        }
    }

    if stack.len() != 1 {
        return Err(Error::Malformed("unclosed element at end of input".into()));
    }
    if doc.root_element().is_none() {
        return Err(Error::Malformed("no root element".into()));
    }

    Ok(doc)
}

fn check_depth(depth: usize) -> Result<()> {
    if depth > MAX_DEPTH {
        return Err(Error::Malformed(format!(
            "elements nested deeper than {MAX_DEPTH} levels"
        )));
    }
    Ok(())
}

fn create_element(doc: &mut Document, start: &BytesStart<'_>) -> Result<NodeId> {
    let name = QName::parse(utf8(start.name().as_ref())?);

    let mut attrs = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = QName::parse(utf8(attr.key.as_ref())?);
        let raw = utf8(&attr.value)?;
        let value = quick_xml::escape::unescape(raw).map_err(quick_xml::Error::from)?;
        attrs.push(Attribute::new(key, value.into_owned()));
    }

    Ok(doc.create_element(name, attrs))
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| Error::Malformed(format!("invalid UTF-8 in name: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_elements() {
        let doc = parse_str(
            r#"<?xml version="1.0"?>
<ds:data-stream-collection xmlns:ds="urn:ds">
  <ds:data-stream id="a"/>
  <!-- note -->
  <ds:component id="c">text &amp; more</ds:component>
</ds:data-stream-collection>"#,
        )
        .unwrap();

        let root = doc.root_element().unwrap();
        assert_eq!(doc.local_name(root), Some("data-stream-collection"));
        assert_eq!(doc.name(root).unwrap().prefix.as_deref(), Some("ds"));

        let elements: Vec<_> = doc.element_children(root).collect();
        assert_eq!(elements.len(), 2);
        assert_eq!(doc.attr(elements[0], "id"), Some("a"));

        let text = doc.children(elements[1]).next().unwrap();
        assert_eq!(
            doc.get(text).map(|n| &n.data),
            Some(&NodeData::Text("text &amp; more".to_string()))
        );
    }

    #[test]
    fn test_attribute_values_are_unescaped() {
        let doc = parse_str(r##"<uri name="a&amp;b.xml" uri="#x"/>"##).unwrap();
        let root = doc.root_element().unwrap();
        assert_eq!(doc.attr(root, "name"), Some("a&b.xml"));
    }

    fn nested(depth: usize) -> String {
        format!("{}{}", "<n>".repeat(depth), "</n>".repeat(depth))
    }

    #[test]
    fn test_nesting_depth_limit() {
        assert!(parse_str(&nested(MAX_DEPTH)).is_ok());

        let err = parse_str(&nested(MAX_DEPTH + 1)).unwrap_err();
        assert!(matches!(err, Error::Malformed(_)));
        assert!(err.is_fatal());

        let deep_empty = format!("{}<leaf/>{}", "<n>".repeat(MAX_DEPTH), "</n>".repeat(MAX_DEPTH));
        assert!(parse_str(&deep_empty).is_err());

        // Far too deep to clone or write recursively; must fail cleanly.
        assert!(parse_str(&nested(200_000)).is_err());
    }

    #[test]
    fn test_rejects_malformed_input() {
        assert!(parse_str("").is_err());
        assert!(parse_str("<a><b></a>").is_err());
        assert!(parse_str("<a>").is_err());
        assert!(parse_str("<a/><b/>").is_err());
        assert!(parse_str("stray <a/>").is_err());
    }
}
