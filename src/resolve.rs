//! Identifier lookups within a collection.
//!
//! Both lookups return the first match in document order, so a collection
//! that (incorrectly) reuses an id still resolves deterministically.
//! Elements with a missing `id` never match and do not stop the search.

use crate::error::{Error, Result};
use crate::model::{CatalogEntry, Collection, Component, ComponentRef, DataStream, ReferenceKind};

/// Find the root-level component with the given `id`.
pub fn find_component<'a>(collection: &'a Collection, id: &str) -> Result<&'a Component> {
    collection
        .component_by_id(id)
        .ok_or_else(|| Error::ComponentNotFound(id.to_string()))
}

/// Find the component-ref with the given `id` in any container of
/// `datastream`.
pub fn find_component_ref<'a>(datastream: &'a DataStream, id: &str) -> Result<&'a ComponentRef> {
    datastream
        .ref_by_id(id)
        .ok_or_else(|| Error::ComponentRefNotFound(id.to_string()))
}

/// Follow a component-ref's `href` to its component.
pub fn resolve_href<'a>(collection: &'a Collection, cref: &ComponentRef) -> Result<&'a Component> {
    let href = cref.href().map_err(|e| Error::Attribute(e.clone()))?;
    debug_assert_eq!(href.kind(), ReferenceKind::Component);
    find_component(collection, href.id())
}

/// Follow a catalog entry's `uri` to a component-ref of the same data-stream.
pub fn resolve_catalog_entry<'a>(
    datastream: &'a DataStream,
    entry: &CatalogEntry,
) -> Result<&'a ComponentRef> {
    let uri = entry.uri().map_err(|e| Error::Attribute(e.clone()))?;
    debug_assert_eq!(uri.kind(), ReferenceKind::ComponentRef);
    find_component_ref(datastream, uri.id())
}
