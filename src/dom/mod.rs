//! Minimal XML document engine: parse, clone-subtree and write.

mod arena;
mod namespace;
mod parser;
mod writer;

pub use arena::{Attribute, Children, Document, Node, NodeData, NodeId, QName};
pub use parser::{MAX_DEPTH, parse_str};

use crate::error::Result;
use crate::util::decode_document;

/// Namespace permanently bound to the `xml` prefix.
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Parse raw bytes, honouring a BOM or the encoding named in the XML
/// declaration.
pub fn parse_bytes(bytes: &[u8]) -> Result<Document> {
    parse_str(&decode_document(bytes))
}
