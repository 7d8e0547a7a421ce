//! Standalone subtree extraction with namespace reconciliation.
//!
//! An element embedded deep inside a collection usually relies on namespace
//! declarations made by its ancestors. When the element is lifted into its
//! own document those bindings have to move along with it.

use std::collections::{BTreeSet, HashSet};

use super::arena::{Attribute, Document, NodeData, NodeId, QName};

impl Document {
    /// Clone the element `node` into a new single-root document.
    ///
    /// Every namespace prefix used inside the clone but bound outside of it
    /// is declared on the new root element.
    pub fn clone_subtree(&self, node: NodeId) -> Document {
        let mut out = Document::new();
        let out_doc = out.document();
        let root = self.copy_subtree_into(node, &mut out, out_doc);

        let outer = self.parent(node);
        for prefix in unbound_prefixes(&out, root) {
            let Some(uri) = self.lookup_namespace(outer, prefix.as_deref()) else {
                continue;
            };
            // An empty default namespace is the same as no declaration.
            if prefix.is_none() && uri.is_empty() {
                continue;
            }
            let name = match &prefix {
                Some(p) => QName::prefixed("xmlns", p.as_str()),
                None => QName::new("xmlns"),
            };
            let uri = uri.to_string();
            out.set_attr(root, name, uri);
        }

        out
    }
}

/// Prefixes used within the subtree at `root` that no element of the
/// subtree declares at the point of use. `None` stands for the default
/// namespace.
fn unbound_prefixes(doc: &Document, root: NodeId) -> BTreeSet<Option<String>> {
    let mut unbound = BTreeSet::new();
    let mut scopes: Vec<HashSet<Option<String>>> = Vec::new();
    collect_unbound(doc, root, &mut scopes, &mut unbound);
    unbound
}

fn collect_unbound(
    doc: &Document,
    id: NodeId,
    scopes: &mut Vec<HashSet<Option<String>>>,
    unbound: &mut BTreeSet<Option<String>>,
) {
    let Some(NodeData::Element { name, attrs }) = doc.get(id).map(|n| &n.data) else {
        return;
    };

    let declared: HashSet<Option<String>> = attrs
        .iter()
        .filter_map(Attribute::namespace_decl)
        .map(|(p, _)| p.map(str::to_string))
        .collect();
    scopes.push(declared);

    let is_bound = |prefix: &Option<String>, scopes: &[HashSet<Option<String>>]| {
        prefix.as_deref() == Some("xml") || scopes.iter().any(|s| s.contains(prefix))
    };

    if !is_bound(&name.prefix, scopes.as_slice()) {
        unbound.insert(name.prefix.clone());
    }
    for attr in attrs {
        // Unprefixed attributes are in no namespace.
        if attr.namespace_decl().is_some() || attr.name.prefix.is_none() {
            continue;
        }
        if !is_bound(&attr.name.prefix, scopes.as_slice()) {
            unbound.insert(attr.name.prefix.clone());
        }
    }

    let children: Vec<NodeId> = doc.element_children(id).collect();
    for child in children {
        collect_unbound(doc, child, scopes, unbound);
    }

    scopes.pop();
}

#[cfg(test)]
mod tests {
    use super::super::parse_str;
    use super::*;

    const COLLECTION: &str = r#"<ds:data-stream-collection xmlns:ds="urn:ds" xmlns:xlink="urn:xlink" xmlns:oval="urn:oval" xmlns="urn:outer-default">
  <ds:component id="c">
    <oval:oval_definitions xlink:type="simple" xml:lang="en">
      <oval:definitions>
        <local:definition xmlns:local="urn:local" id="d"/>
      </oval:definitions>
      <plain/>
    </oval:oval_definitions>
  </ds:component>
</ds:data-stream-collection>"#;

    fn inner_root(doc: &Document) -> NodeId {
        let root = doc.root_element().unwrap();
        let component = doc.child_element(root, "component").unwrap();
        doc.element_children(component).next().unwrap()
    }

    #[test]
    fn test_clone_declares_inherited_namespaces() {
        let doc = parse_str(COLLECTION).unwrap();
        let clone = doc.clone_subtree(inner_root(&doc));
        let root = clone.root_element().unwrap();

        assert_eq!(clone.lookup_namespace(root, Some("oval")), Some("urn:oval"));
        assert_eq!(clone.lookup_namespace(root, Some("xlink")), Some("urn:xlink"));
        assert_eq!(clone.lookup_namespace(root, None), Some("urn:outer-default"));
        // Not used inside the subtree.
        assert_eq!(clone.lookup_namespace(root, Some("ds")), None);
        // Declared inside the subtree already, so not hoisted.
        let decls: Vec<_> = clone
            .attrs(root)
            .iter()
            .filter_map(Attribute::namespace_decl)
            .collect();
        assert!(!decls.iter().any(|(p, _)| *p == Some("local")));
        assert!(!decls.iter().any(|(p, _)| *p == Some("xml")));
    }

    #[test]
    fn test_clone_is_structurally_identical() {
        let doc = parse_str(COLLECTION).unwrap();
        let source = inner_root(&doc);
        let clone = doc.clone_subtree(source);
        let root = clone.root_element().unwrap();

        assert_eq!(clone.name(root), doc.name(source));
        assert_eq!(clone.attr(root, "type"), Some("simple"));
        let definitions = clone.child_element(root, "definitions").unwrap();
        let definition = clone.child_element(definitions, "definition").unwrap();
        assert_eq!(clone.attr(definition, "id"), Some("d"));
    }

    #[test]
    fn test_clone_keeps_own_declarations() {
        let doc = parse_str(
            r#"<root xmlns:a="urn:outer"><wrap><a:x xmlns:a="urn:inner"/></wrap></root>"#,
        )
        .unwrap();
        let root = doc.root_element().unwrap();
        let wrap = doc.child_element(root, "wrap").unwrap();
        let x = doc.child_element(wrap, "x").unwrap();

        let clone = doc.clone_subtree(x);
        let cloned_root = clone.root_element().unwrap();
        assert_eq!(clone.lookup_namespace(cloned_root, Some("a")), Some("urn:inner"));
        assert_eq!(clone.attrs(cloned_root).len(), 1);
    }
}
