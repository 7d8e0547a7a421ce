//! Arena [`Document`] to UTF-8 XML bytes.

use std::path::Path;

use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event};

use super::arena::{Document, NodeData, NodeId};
use crate::error::{Error, Result};

impl Document {
    /// Serialize to UTF-8 bytes, starting with an XML declaration.
    pub fn to_xml_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        writer.write_event(Event::Text(BytesText::from_escaped("\n")))?;
        for child in self.children(self.document()) {
            write_node(self, child, &mut writer)?;
        }
        writer.write_event(Event::Text(BytesText::from_escaped("\n")))?;
        Ok(writer.into_inner())
    }

    pub fn to_xml_string(&self) -> Result<String> {
        let bytes = self.to_xml_bytes()?;
        String::from_utf8(bytes).map_err(|e| Error::Malformed(e.to_string()))
    }

    /// Write the document to `path`, UTF-8 encoded.
    pub fn write_to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_xml_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

fn write_node(doc: &Document, id: NodeId, writer: &mut Writer<Vec<u8>>) -> Result<()> {
    let Some(node) = doc.get(id) else {
        return Ok(());
    };

    match &node.data {
        NodeData::Document => {
            for child in doc.children(id) {
                write_node(doc, child, writer)?;
            }
        }
        NodeData::Element { name, attrs } => {
            let qname = name.to_string();
            let mut start = BytesStart::new(qname.as_str());
            for attr in attrs {
                let key = attr.name.to_string();
                start.push_attribute((key.as_str(), attr.value.as_str()));
            }

            if node.first_child.is_none() {
                writer.write_event(Event::Empty(start))?;
            } else {
                writer.write_event(Event::Start(start))?;
                for child in doc.children(id) {
                    write_node(doc, child, writer)?;
                }
                writer.write_event(Event::End(BytesEnd::new(qname.as_str())))?;
            }
        }
        NodeData::Text(text) => {
            writer.write_event(Event::Text(BytesText::from_escaped(text.as_str())))?;
        }
        NodeData::CData(text) => {
            writer.write_event(Event::CData(BytesCData::new(text.as_str())))?;
        }
        NodeData::Comment(text) => {
            writer.write_event(Event::Comment(BytesText::from_escaped(text.as_str())))?;
        }
        NodeData::ProcessingInstruction(content) => {
            writer.write_event(Event::PI(BytesPI::new(content.as_str())))?;
        }
        NodeData::Doctype(content) => {
            writer.write_event(Event::DocType(BytesText::from_escaped(content.as_str())))?;
            writer.write_event(Event::Text(BytesText::from_escaped("\n")))?;
        }
    }

    Ok(())
}
