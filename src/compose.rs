//! Build a data-stream collection from component files.
//!
//! Files are classified into containers by filename suffix only; their
//! contents are not read unless explicitly embedded with
//! [`Composer::embed_component`]. Catalogs are created empty: which
//! dependencies an entry point should list is not decided here.

use tracing::debug;

use crate::dom::{Document, NodeId};
use crate::error::Result;
use crate::model::{Collection, ContainerKind, Reference};

/// Pick the container a component file belongs in.
///
/// | suffix                                    | container             |
/// |-------------------------------------------|-----------------------|
/// | `-xccdf.xml`                              | `checklists`          |
/// | `cpe-oval.xml`, `cpe-dictionary.xml`      | `dictionaries`        |
/// | `-oval.xml`                               | `checks`              |
/// | anything else                             | `extended-components` |
///
/// The CPE suffixes match after either `-` or `_`, as in
/// `scap_org.open-scap_cpe-dictionary.xml`.
pub fn classify(filepath: &str) -> ContainerKind {
    if filepath.ends_with("-xccdf.xml") {
        ContainerKind::Checklists
    } else if is_cpe_file(filepath) {
        ContainerKind::Dictionaries
    } else if filepath.ends_with("-oval.xml") {
        ContainerKind::Checks
    } else {
        ContainerKind::ExtendedComponents
    }
}

fn is_cpe_file(filepath: &str) -> bool {
    ["cpe-oval.xml", "cpe-dictionary.xml"].iter().any(|suffix| {
        filepath
            .strip_suffix(suffix)
            .is_some_and(|stem| stem.ends_with(['-', '_']))
    })
}

/// Incrementally builds a collection with a single data-stream.
pub struct Composer {
    collection: Collection,
    datastream: usize,
}

impl Composer {
    /// Start a collection holding one data-stream named `datastream_id`,
    /// with its four containers empty.
    pub fn new(datastream_id: &str) -> Self {
        let mut collection = Collection::new();
        let datastream = collection.add_datastream(Some(datastream_id));
        Self {
            collection,
            datastream,
        }
    }

    /// Register `filepath` under the component-ref `ref_id`, with
    /// `href="#<filepath>"` and an empty catalog. Returns the container the
    /// ref was placed in.
    pub fn add_component_with_ref(&mut self, filepath: &str, ref_id: &str) -> Result<ContainerKind> {
        let kind = classify(filepath);
        self.collection.append_component_ref(
            self.datastream,
            kind,
            ref_id,
            &Reference::component(filepath),
        )?;
        debug!(filepath, ref_id, container = kind.element_name(), "added component-ref");
        Ok(kind)
    }

    /// Embed `content` as the component `id`, so that refs to `#<id>` resolve.
    pub fn embed_component(&mut self, id: &str, content: &Document) -> Result<NodeId> {
        let node = self.collection.append_component(id, content)?;
        debug!(id, "embedded component");
        Ok(node)
    }

    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    pub fn finish(self) -> Collection {
        self.collection
    }
}

/// Build a collection whose data-stream `target_datastream_name` references
/// `entry_component_file` as its only component.
///
/// The component-ref id is the file path itself.
pub fn compose(entry_component_file: &str, target_datastream_name: &str) -> Result<Collection> {
    let mut composer = Composer::new(target_datastream_name);
    composer.add_component_with_ref(entry_component_file, entry_component_file)?;
    Ok(composer.finish())
}
