use std::collections::HashMap;
use std::path::Path;

use super::{
    CATALOG_NS, Component, ComponentRef, ContainerKind, DS_NS, DataStream, Reference, XLINK_NS,
};
use crate::dom::{self, Attribute, Document, NodeId, QName};
use crate::error::{Error, Result};

/// A parsed or freshly built data-stream collection.
#[derive(Debug, Clone)]
pub struct Collection {
    doc: Document,
    root: NodeId,
    datastreams: Vec<DataStream>,
    components: Vec<Component>,
    component_index: HashMap<String, usize>,
}

impl Collection {
    /// Read and index a collection file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_document(dom::parse_bytes(bytes)?)
    }

    pub fn parse_str(content: &str) -> Result<Self> {
        Self::from_document(dom::parse_str(content)?)
    }

    /// Index an already parsed document.
    pub fn from_document(doc: Document) -> Result<Self> {
        let root = doc
            .root_element()
            .ok_or_else(|| Error::Malformed("no root element".into()))?;
        let mut collection = Self {
            doc,
            root,
            datastreams: Vec::new(),
            components: Vec::new(),
            component_index: HashMap::new(),
        };
        collection.reindex();
        Ok(collection)
    }

    /// An empty `ds:data-stream-collection` declaring the `ds`, `xlink` and
    /// `cat` namespaces.
    pub fn new() -> Self {
        let mut doc = Document::new();
        let root = doc.create_element(
            QName::prefixed("ds", "data-stream-collection"),
            vec![
                Attribute::new(QName::prefixed("xmlns", "ds"), DS_NS),
                Attribute::new(QName::prefixed("xmlns", "xlink"), XLINK_NS),
                Attribute::new(QName::prefixed("xmlns", "cat"), CATALOG_NS),
            ],
        );
        doc.append(doc.document(), root);

        Self {
            doc,
            root,
            datastreams: Vec::new(),
            components: Vec::new(),
            component_index: HashMap::new(),
        }
    }

    fn reindex(&mut self) {
        let doc = &self.doc;
        let mut datastreams = Vec::new();
        let mut components = Vec::new();
        let mut component_index = HashMap::new();

        for child in doc.element_children(self.root) {
            match doc.local_name(child) {
                Some("data-stream") => datastreams.push(DataStream::index(doc, child)),
                Some("component") | Some("extended-component") => {
                    let id = doc.attr(child, "id").map(str::to_string);
                    if let Some(id) = &id {
                        component_index.entry(id.clone()).or_insert(components.len());
                    }
                    components.push(Component { node: child, id });
                }
                _ => {}
            }
        }

        self.datastreams = datastreams;
        self.components = components;
        self.component_index = component_index;
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Data-streams in document order.
    pub fn datastreams(&self) -> &[DataStream] {
        &self.datastreams
    }

    /// Components in document order.
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub(crate) fn component_by_id(&self, id: &str) -> Option<&Component> {
        self.component_index
            .get(id)
            .and_then(|&i| self.components.get(i))
    }

    /// The first data-stream whose `id` matches, or the first data-stream
    /// at all when no id is requested.
    pub fn select_datastream(&self, id: Option<&str>) -> Result<&DataStream> {
        match id {
            Some(id) => self
                .datastreams
                .iter()
                .find(|ds| ds.id() == Some(id))
                .ok_or_else(|| Error::DataStreamNotFound(id.to_string())),
            None => self.datastreams.first().ok_or(Error::NoDataStream),
        }
    }

    /// The single semantic element inside a component, skipping whitespace
    /// and comments.
    pub fn inner_root(&self, component: &Component) -> Option<NodeId> {
        self.doc.element_children(component.node()).next()
    }

    /// Clone a component's content into a standalone document.
    pub fn extract(&self, component: &Component) -> Option<Document> {
        self.inner_root(component)
            .map(|inner| self.doc.clone_subtree(inner))
    }

    pub fn to_xml_string(&self) -> Result<String> {
        self.doc.to_xml_string()
    }

    /// Write the whole collection to `path`, UTF-8 encoded.
    pub fn write_to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.doc.write_to_path(path)
    }

    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    fn ds_name(&self, local: &str) -> QName {
        let prefix = self
            .doc
            .name(self.root)
            .and_then(|n| n.prefix.clone());
        match prefix {
            Some(p) => QName::prefixed(p, local),
            None => QName::new(local),
        }
    }

    /// Append a data-stream skeleton with the four containers, empty and in
    /// schema order. Returns its index in [`Collection::datastreams`].
    pub fn add_datastream(&mut self, id: Option<&str>) -> usize {
        let attrs = match id {
            Some(id) => vec![Attribute::new(QName::new("id"), id)],
            None => Vec::new(),
        };
        let name = self.ds_name("data-stream");
        let ds = self.doc.create_element(name, attrs);

        for kind in ContainerKind::ALL {
            let name = self.ds_name(kind.element_name());
            let container = self.doc.create_element(name, vec![]);
            self.doc.append(ds, container);
        }

        // Data-streams precede components.
        let before = self.components.first().map(Component::node);
        self.insert_root_child(ds, before);
        self.reindex();

        self.datastreams
            .iter()
            .position(|d| d.node() == ds)
            .unwrap_or(self.datastreams.len().saturating_sub(1))
    }

    /// Append a component-ref with an empty catalog to the `kind` container
    /// of data-stream `datastream`, creating the container if needed.
    pub fn append_component_ref(
        &mut self,
        datastream: usize,
        kind: ContainerKind,
        id: &str,
        href: &Reference,
    ) -> Result<NodeId> {
        let ds = self
            .datastreams
            .get(datastream)
            .ok_or(Error::NoDataStream)?;
        let ds_node = ds.node();
        let existing = ds.container(kind).map(|c| c.node());
        let container = match existing {
            Some(c) => c,
            None => {
                let name = self.ds_name(kind.element_name());
                let c = self.doc.create_element(name, vec![]);
                self.doc.append(ds_node, c);
                c
            }
        };

        let xlink = self.namespace_prefix(container, "xlink", XLINK_NS);
        let cat = self.namespace_prefix(container, "cat", CATALOG_NS);
        let name = self.ds_name("component-ref");
        let cref = self.doc.create_element(
            name,
            vec![
                Attribute::new(QName::new("id"), id),
                Attribute::new(QName::prefixed(xlink, "href"), href.to_string()),
            ],
        );
        let catalog = self
            .doc
            .create_element(QName::prefixed(cat, "catalog"), vec![]);
        self.doc.append(cref, catalog);
        self.doc.append(container, cref);

        self.reindex();
        Ok(cref)
    }

    /// Append a `cat:uri` entry to the catalog of the component-ref `cref`.
    pub fn append_catalog_entry(&mut self, cref: NodeId, name: &str, uri: &Reference) -> Result<()> {
        if self.doc.local_name(cref) != Some("component-ref") {
            return Err(Error::Malformed("catalog entries belong to component-refs".into()));
        }
        let catalog = match self.doc.child_element(cref, "catalog") {
            Some(c) => c,
            None => {
                let cat = self.namespace_prefix(cref, "cat", CATALOG_NS);
                let c = self
                    .doc
                    .create_element(QName::prefixed(cat, "catalog"), vec![]);
                self.doc.append(cref, c);
                c
            }
        };

        let cat = self.namespace_prefix(catalog, "cat", CATALOG_NS);
        let entry = self.doc.create_element(
            QName::prefixed(cat, "uri"),
            vec![
                Attribute::new(QName::new("name"), name),
                Attribute::new(QName::new("uri"), uri.to_string()),
            ],
        );
        self.doc.append(catalog, entry);

        self.reindex();
        Ok(())
    }

    /// Embed a copy of `content`'s root element as a root-level component.
    pub fn append_component(&mut self, id: &str, content: &Document) -> Result<NodeId> {
        let inner = content
            .root_element()
            .ok_or_else(|| Error::Malformed("component content has no root element".into()))?;

        let name = self.ds_name("component");
        let component = self.doc.create_element(
            name,
            vec![Attribute::new(QName::new("id"), id)],
        );
        content.copy_subtree_into(inner, &mut self.doc, component);
        self.doc.append(self.root, component);

        self.reindex();
        Ok(component)
    }

    /// A prefix bound to `uri` for elements created under `scope`.
    ///
    /// Uses `preferred` or any root-level prefix already bound to `uri`.
    /// Otherwise declares `preferred` on the root, numbered (`cat1`, `cat2`,
    /// ...) when that name is taken by another namespace.
    fn namespace_prefix(&mut self, scope: NodeId, preferred: &str, uri: &str) -> String {
        if self.doc.lookup_namespace(scope, Some(preferred)) == Some(uri) {
            return preferred.to_string();
        }

        let existing = self
            .doc
            .attrs(self.root)
            .iter()
            .filter_map(Attribute::namespace_decl)
            .filter_map(|(prefix, bound)| prefix.filter(|_| bound == uri))
            .find(|&prefix| self.doc.lookup_namespace(scope, Some(prefix)) == Some(uri))
            .map(str::to_string);
        if let Some(prefix) = existing {
            return prefix;
        }

        let mut prefix = preferred.to_string();
        let mut n = 1;
        while self.doc.lookup_namespace(scope, Some(&prefix)).is_some() {
            prefix = format!("{preferred}{n}");
            n += 1;
        }
        self.doc
            .set_attr(self.root, QName::prefixed("xmlns", prefix.as_str()), uri);
        prefix
    }

    fn insert_root_child(&mut self, node: NodeId, before: Option<NodeId>) {
        match before {
            Some(sibling) => self.doc.insert_before(sibling, node),
            None => self.doc.append(self.root, node),
        }
    }

    /// Look up a component-ref of data-stream `datastream` by node.
    pub fn component_ref_at(&self, datastream: usize, node: NodeId) -> Option<&ComponentRef> {
        self.datastreams
            .get(datastream)?
            .component_refs()
            .iter()
            .find(|r| r.node() == node)
    }
}

impl Default for Collection {
    fn default() -> Self {
        Self::new()
    }
}
