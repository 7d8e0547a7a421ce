//! Typed view of a SCAP source data-stream collection.
//!
//! A [`Collection`] owns the parsed [`Document`](crate::dom::Document) and a set
//! of lookup tables built once at load time:
//!
//! ```text
//! data-stream-collection
//! ├── data-stream*          → DataStream
//! │   ├── dictionaries      ┐
//! │   ├── checklists        │ containers → ComponentRef*
//! │   ├── checks            │              └── catalog? → CatalogEntry*
//! │   └── extended-components┘
//! └── component*            → Component
//! ```
//!
//! Elements and attributes are matched by local name, so prefixed forms such
//! as `xlink:href` or `cat:uri` are recognised.

mod collection;
mod reference;

use std::collections::HashMap;

pub use collection::Collection;
pub use reference::{Reference, ReferenceKind};

use crate::dom::{Document, NodeId};
use crate::error::AttributeError;

/// Namespace of the data-stream collection elements.
pub const DS_NS: &str = "http://scap.nist.gov/schema/scap/source/1.2";
/// Namespace of the `href` attribute on component-refs.
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";
/// Namespace of catalog elements (OASIS XML catalogs).
pub const CATALOG_NS: &str = "urn:oasis:names:tc:entity:xmlns:xml:catalog";

/// The four functional containers of a data-stream, in schema order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Dictionaries,
    Checklists,
    Checks,
    ExtendedComponents,
}

impl ContainerKind {
    pub const ALL: [ContainerKind; 4] = [
        ContainerKind::Dictionaries,
        ContainerKind::Checklists,
        ContainerKind::Checks,
        ContainerKind::ExtendedComponents,
    ];

    pub fn element_name(self) -> &'static str {
        match self {
            ContainerKind::Dictionaries => "dictionaries",
            ContainerKind::Checklists => "checklists",
            ContainerKind::Checks => "checks",
            ContainerKind::ExtendedComponents => "extended-components",
        }
    }

    pub fn from_element_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.element_name() == name)
    }
}

/// A root-level `component` (or `extended-component`).
#[derive(Debug, Clone)]
pub struct Component {
    node: NodeId,
    id: Option<String>,
}

impl Component {
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn node(&self) -> NodeId {
        self.node
    }
}

/// One `uri` entry of a catalog.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    node: NodeId,
    name: Option<String>,
    uri: Result<Reference, AttributeError>,
}

impl CatalogEntry {
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Output filename, relative to the owning component's directory.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The referenced component-ref, or why the `uri` attribute is unusable.
    pub fn uri(&self) -> Result<&Reference, &AttributeError> {
        self.uri.as_ref()
    }
}

/// The catalog owned by a component-ref.
#[derive(Debug, Clone)]
pub struct Catalog {
    node: NodeId,
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }
}

/// A `component-ref` inside one of a data-stream's containers.
#[derive(Debug, Clone)]
pub struct ComponentRef {
    node: NodeId,
    id: Option<String>,
    href: Result<Reference, AttributeError>,
    catalog: Option<Catalog>,
    container: Option<ContainerKind>,
}

impl ComponentRef {
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// The referenced component, or why the `href` attribute is unusable.
    pub fn href(&self) -> Result<&Reference, &AttributeError> {
        self.href.as_ref()
    }

    pub fn catalog(&self) -> Option<&Catalog> {
        self.catalog.as_ref()
    }

    /// The container this ref sits in; `None` for an unrecognised container.
    pub fn container(&self) -> Option<ContainerKind> {
        self.container
    }
}

/// A child element of a data-stream holding component-refs.
#[derive(Debug, Clone)]
pub struct Container {
    node: NodeId,
    kind: Option<ContainerKind>,
    /// Indices into [`DataStream::component_refs`].
    refs: Vec<usize>,
}

impl Container {
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn kind(&self) -> Option<ContainerKind> {
        self.kind
    }
}

/// A `data-stream` and its component-refs.
#[derive(Debug, Clone)]
pub struct DataStream {
    node: NodeId,
    id: Option<String>,
    containers: Vec<Container>,
    refs: Vec<ComponentRef>,
    ref_index: HashMap<String, usize>,
}

impl DataStream {
    /// Index the data-stream element `node`.
    fn index(doc: &Document, node: NodeId) -> Self {
        let mut containers = Vec::new();
        let mut refs = Vec::new();
        let mut ref_index = HashMap::new();

        for container_node in doc.element_children(node) {
            let kind = doc
                .local_name(container_node)
                .and_then(ContainerKind::from_element_name);
            let mut container = Container {
                node: container_node,
                kind,
                refs: Vec::new(),
            };

            for cref_node in doc.element_children(container_node) {
                if doc.local_name(cref_node) != Some("component-ref") {
                    continue;
                }
                let cref = index_component_ref(doc, cref_node, kind);
                if let Some(id) = &cref.id {
                    // First match in document order wins.
                    ref_index.entry(id.clone()).or_insert(refs.len());
                }
                container.refs.push(refs.len());
                refs.push(cref);
            }

            containers.push(container);
        }

        Self {
            node,
            id: doc.attr(node, "id").map(str::to_string),
            containers,
            refs,
            ref_index,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    /// The `id` attribute; `None` for an unnamed data-stream.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn containers(&self) -> &[Container] {
        &self.containers
    }

    /// First container of the given kind.
    pub fn container(&self, kind: ContainerKind) -> Option<&Container> {
        self.containers.iter().find(|c| c.kind == Some(kind))
    }

    /// Component-refs directly under `container`, in document order.
    pub fn refs_in<'a>(&'a self, container: &'a Container) -> impl Iterator<Item = &'a ComponentRef> {
        container.refs.iter().filter_map(|&i| self.refs.get(i))
    }

    /// All component-refs of every container, in document order.
    pub fn component_refs(&self) -> &[ComponentRef] {
        &self.refs
    }

    pub(crate) fn ref_by_id(&self, id: &str) -> Option<&ComponentRef> {
        self.ref_index.get(id).and_then(|&i| self.refs.get(i))
    }
}

fn index_component_ref(
    doc: &Document,
    node: NodeId,
    container: Option<ContainerKind>,
) -> ComponentRef {
    let href = match doc.attr(node, "href") {
        None => Err(AttributeError::missing("component-ref", "href")),
        Some(raw) => Reference::parse(ReferenceKind::Component, raw)
            .ok_or_else(|| AttributeError::invalid("component-ref", "href", raw)),
    };

    let catalog = doc.child_element(node, "catalog").map(|catalog_node| Catalog {
        node: catalog_node,
        entries: doc
            .element_children(catalog_node)
            .filter(|&n| doc.local_name(n) == Some("uri"))
            .map(|n| index_catalog_entry(doc, n))
            .collect(),
    });

    ComponentRef {
        node,
        id: doc.attr(node, "id").map(str::to_string),
        href,
        catalog,
        container,
    }
}

fn index_catalog_entry(doc: &Document, node: NodeId) -> CatalogEntry {
    let uri = match doc.attr(node, "uri") {
        None => Err(AttributeError::missing("uri", "uri")),
        Some(raw) => Reference::parse(ReferenceKind::ComponentRef, raw)
            .ok_or_else(|| AttributeError::invalid("uri", "uri", raw)),
    };

    CatalogEntry {
        node,
        name: doc.attr(node, "name").map(str::to_string),
        uri,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_names_round_trip() {
        for kind in ContainerKind::ALL {
            assert_eq!(ContainerKind::from_element_name(kind.element_name()), Some(kind));
        }
        assert_eq!(ContainerKind::from_element_name("component"), None);
    }
}
