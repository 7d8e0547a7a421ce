//! Arena-based XML document tree.
//!
//! All nodes live in a contiguous vector and refer to each other by index,
//! so a parsed collection can be traversed and cross-referenced without
//! shared pointers.

use std::fmt;

/// Unique identifier for a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Sentinel value for no node.
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check if this is a valid node ID.
    pub fn is_some(&self) -> bool {
        self.0 != u32::MAX
    }

    /// Check if this is the sentinel value.
    pub fn is_none(&self) -> bool {
        self.0 == u32::MAX
    }
}

/// A qualified XML name as written in the source (`prefix:local`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    pub prefix: Option<String>,
    pub local: String,
}

impl QName {
    pub fn new(local: impl Into<String>) -> Self {
        Self {
            prefix: None,
            local: local.into(),
        }
    }

    pub fn prefixed(prefix: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            local: local.into(),
        }
    }

    /// Split a raw `prefix:local` name.
    pub fn parse(raw: &str) -> Self {
        match raw.split_once(':') {
            Some((prefix, local)) => Self::prefixed(prefix, local),
            None => Self::new(raw),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{}:{}", prefix, self.local),
            None => f.write_str(&self.local),
        }
    }
}

/// XML attribute. The value is stored unescaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: QName,
    pub value: String,
}

impl Attribute {
    pub fn new(name: QName, value: impl Into<String>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }

    /// If this attribute is a namespace declaration, return the declared
    /// prefix (`None` for the default namespace) and URI.
    pub fn namespace_decl(&self) -> Option<(Option<&str>, &str)> {
        match (&self.name.prefix, self.name.local.as_str()) {
            (None, "xmlns") => Some((None, self.value.as_str())),
            (Some(p), local) if p == "xmlns" => Some((Some(local), self.value.as_str())),
            _ => None,
        }
    }
}

/// Node type in the arena document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    /// Document root.
    Document,
    /// Element with name and attributes (namespace declarations included).
    Element { name: QName, attrs: Vec<Attribute> },
    /// Character data, kept escaped exactly as it appeared in the source.
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
    Doctype(String),
}

/// A node in the arena.
#[derive(Debug, Clone)]
pub struct Node {
    pub data: NodeData,
    pub parent: NodeId,
    pub first_child: NodeId,
    pub last_child: NodeId,
    pub prev_sibling: NodeId,
    pub next_sibling: NodeId,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
        }
    }
}

/// Arena-based XML document.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    document: NodeId,
}

impl Document {
    /// Create a new empty document with only a document node.
    pub fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            document: NodeId::NONE,
        };
        doc.document = doc.alloc(Node::new(NodeData::Document));
        doc
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Get the document node ID.
    pub fn document(&self) -> NodeId {
        self.document
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if id.is_none() {
            return None;
        }
        self.nodes.get_mut(id.0 as usize)
    }

    pub fn create_element(&mut self, name: QName, attrs: Vec<Attribute>) -> NodeId {
        self.alloc(Node::new(NodeData::Element { name, attrs }))
    }

    pub fn create_node(&mut self, data: NodeData) -> NodeId {
        self.alloc(Node::new(data))
    }

    /// Append a child to a parent node.
    pub fn append(&mut self, parent: NodeId, child: NodeId) {
        let last_child = self
            .get(parent)
            .map(|n| n.last_child)
            .unwrap_or(NodeId::NONE);

        if let Some(child_node) = self.get_mut(child) {
            child_node.parent = parent;
            child_node.prev_sibling = last_child;
        }

        if let Some(last_node) = self.get_mut(last_child) {
            last_node.next_sibling = child;
        }

        if let Some(parent_node) = self.get_mut(parent) {
            if parent_node.first_child.is_none() {
                parent_node.first_child = child;
            }
            parent_node.last_child = child;
        }
    }

    /// Insert a node before a sibling.
    pub fn insert_before(&mut self, sibling: NodeId, new_node: NodeId) {
        let parent = self.parent(sibling);
        let prev = self
            .get(sibling)
            .map(|n| n.prev_sibling)
            .unwrap_or(NodeId::NONE);

        if let Some(new) = self.get_mut(new_node) {
            new.parent = parent;
            new.prev_sibling = prev;
            new.next_sibling = sibling;
        }

        if let Some(sib) = self.get_mut(sibling) {
            sib.prev_sibling = new_node;
        }

        if prev.is_some() {
            if let Some(p) = self.get_mut(prev) {
                p.next_sibling = new_node;
            }
        } else if let Some(par) = self.get_mut(parent) {
            par.first_child = new_node;
        }
    }

    /// Append raw (already escaped) text, merging with a trailing text node.
    pub fn append_text(&mut self, parent: NodeId, text: &str) {
        let last_child = self
            .get(parent)
            .map(|n| n.last_child)
            .unwrap_or(NodeId::NONE);

        if let Some(last) = self.get_mut(last_child)
            && let NodeData::Text(ref mut existing) = last.data
        {
            existing.push_str(text);
            return;
        }

        let text_node = self.create_node(NodeData::Text(text.to_string()));
        self.append(parent, text_node);
    }

    /// Number of nodes, including the document node.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// The single top-level element, if any.
    pub fn root_element(&self) -> Option<NodeId> {
        self.element_children(self.document).next()
    }

    pub fn parent(&self, id: NodeId) -> NodeId {
        self.get(id).map(|n| n.parent).unwrap_or(NodeId::NONE)
    }

    /// Iterate over children of a node.
    pub fn children(&self, parent: NodeId) -> Children<'_> {
        let first = self
            .get(parent)
            .map(|n| n.first_child)
            .unwrap_or(NodeId::NONE);
        Children {
            doc: self,
            current: first,
        }
    }

    /// Iterate over element children, skipping text, comments and the like.
    pub fn element_children(&self, parent: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(parent).filter(move |&c| self.is_element(c))
    }

    /// First element child with the given local name.
    pub fn child_element(&self, parent: NodeId, local: &str) -> Option<NodeId> {
        self.element_children(parent)
            .find(|&c| self.local_name(c) == Some(local))
    }

    pub fn name(&self, id: NodeId) -> Option<&QName> {
        self.get(id).and_then(|n| match &n.data {
            NodeData::Element { name, .. } => Some(name),
            _ => None,
        })
    }

    pub fn local_name(&self, id: NodeId) -> Option<&str> {
        self.name(id).map(|n| n.local.as_str())
    }

    pub fn attrs(&self, id: NodeId) -> &[Attribute] {
        static EMPTY: &[Attribute] = &[];
        self.get(id)
            .and_then(|n| match &n.data {
                NodeData::Element { attrs, .. } => Some(attrs.as_slice()),
                _ => None,
            })
            .unwrap_or(EMPTY)
    }

    /// Get an attribute value by local name, ignoring its namespace.
    /// Namespace declarations never match.
    pub fn attr(&self, id: NodeId, local: &str) -> Option<&str> {
        self.attrs(id)
            .iter()
            .find(|a| a.name.local == local && a.namespace_decl().is_none())
            .map(|a| a.value.as_str())
    }

    /// Set an attribute, replacing an existing one with the same qualified name.
    pub fn set_attr(&mut self, id: NodeId, name: QName, value: impl Into<String>) {
        let value = value.into();
        if let Some(Node {
            data: NodeData::Element { attrs, .. },
            ..
        }) = self.get_mut(id)
        {
            match attrs.iter_mut().find(|a| a.name == name) {
                Some(existing) => existing.value = value,
                None => attrs.push(Attribute::new(name, value)),
            }
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.get(id)
            .is_some_and(|n| matches!(n.data, NodeData::Element { .. }))
    }

    /// Resolve a namespace prefix in scope at `id`, walking up the ancestors.
    pub fn lookup_namespace(&self, id: NodeId, prefix: Option<&str>) -> Option<&str> {
        if prefix == Some("xml") {
            return Some(super::XML_NS);
        }
        let mut current = id;
        while let Some(node) = self.get(current) {
            if let NodeData::Element { attrs, .. } = &node.data
                && let Some(uri) = attrs
                    .iter()
                    .filter_map(Attribute::namespace_decl)
                    .find(|(p, _)| *p == prefix)
                    .map(|(_, uri)| uri)
            {
                return Some(uri);
            }
            current = node.parent;
        }
        None
    }

    /// Copy the subtree rooted at `src` in `self` into `dst`, appending it
    /// under `dst_parent`. Returns the new node in `dst`.
    pub fn copy_subtree_into(&self, src: NodeId, dst: &mut Document, dst_parent: NodeId) -> NodeId {
        let Some(node) = self.get(src) else {
            return NodeId::NONE;
        };
        let copy = dst.create_node(node.data.clone());
        dst.append(dst_parent, copy);
        for child in self.children(src) {
            self.copy_subtree_into(child, dst, copy);
        }
        copy
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over children of a node.
pub struct Children<'a> {
    doc: &'a Document,
    current: NodeId,
}

impl<'a> Iterator for Children<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current.is_none() {
            return None;
        }
        let id = self.current;
        self.current = self
            .doc
            .get(id)
            .map(|n| n.next_sibling)
            .unwrap_or(NodeId::NONE);
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_children() {
        let mut doc = Document::new();

        let parent = doc.create_element(QName::new("checklists"), vec![]);
        let child1 = doc.create_element(QName::new("component-ref"), vec![]);
        let child2 = doc.create_element(QName::new("component-ref"), vec![]);

        doc.append(doc.document(), parent);
        doc.append(parent, child1);
        doc.append(parent, child2);

        let children: Vec<_> = doc.children(parent).collect();
        assert_eq!(children, vec![child1, child2]);
        assert_eq!(doc.parent(child2), parent);
        assert_eq!(doc.root_element(), Some(parent));

        let first = doc.create_element(QName::new("component-ref"), vec![]);
        doc.insert_before(child1, first);
        let children: Vec<_> = doc.children(parent).collect();
        assert_eq!(children, vec![first, child1, child2]);
    }

    #[test]
    fn test_text_merging() {
        let mut doc = Document::new();

        let p = doc.create_element(QName::new("title"), vec![]);
        doc.append(doc.document(), p);

        doc.append_text(p, "Hello, ");
        doc.append_text(p, "&amp; World");

        let children: Vec<_> = doc.children(p).collect();
        assert_eq!(children.len(), 1);
        assert_eq!(
            doc.get(children[0]).map(|n| &n.data),
            Some(&NodeData::Text("Hello, &amp; World".to_string()))
        );
    }

    #[test]
    fn test_attr_matches_local_name() {
        let mut doc = Document::new();
        let cref = doc.create_element(
            QName::prefixed("ds", "component-ref"),
            vec![
                Attribute::new(QName::prefixed("xmlns", "href"), "urn:decoy"),
                Attribute::new(QName::prefixed("xlink", "href"), "#comp"),
            ],
        );

        assert_eq!(doc.attr(cref, "href"), Some("#comp"));
        assert_eq!(doc.attr(cref, "id"), None);

        doc.set_attr(cref, QName::new("id"), "ref-1");
        doc.set_attr(cref, QName::new("id"), "ref-2");
        assert_eq!(doc.attr(cref, "id"), Some("ref-2"));
        assert_eq!(doc.attrs(cref).len(), 3);
    }

    #[test]
    fn test_lookup_namespace_walks_ancestors() {
        let mut doc = Document::new();
        let root = doc.create_element(
            QName::prefixed("ds", "data-stream-collection"),
            vec![
                Attribute::new(QName::prefixed("xmlns", "ds"), "urn:ds"),
                Attribute::new(QName::new("xmlns"), "urn:default"),
            ],
        );
        let inner = doc.create_element(QName::new("Benchmark"), vec![]);
        doc.append(doc.document(), root);
        doc.append(root, inner);

        assert_eq!(doc.lookup_namespace(inner, Some("ds")), Some("urn:ds"));
        assert_eq!(doc.lookup_namespace(inner, None), Some("urn:default"));
        assert_eq!(doc.lookup_namespace(inner, Some("missing")), None);
        assert!(doc.lookup_namespace(inner, Some("xml")).is_some());
    }
}
