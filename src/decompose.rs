//! Split a data-stream collection into standalone component files.
//!
//! Every component-ref under the selected data-stream's `checklists` is an
//! entry point. Its component is written to the path named by its `href`,
//! then each entry of its catalog is followed to another component-ref and
//! written, recursively, relative to the directory of the current file.
//!
//! Problems with a single reference are recorded in the returned
//! [`DecomposeReport`] and never stop sibling references from being
//! extracted. Only an unreadable source, a missing data-stream or a
//! data-stream without checklists abort the operation.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::dom::NodeId;
use crate::error::{AttributeError, Error, Result};
use crate::model::{CatalogEntry, Collection, ComponentRef, ContainerKind, DataStream};
use crate::path;
use crate::resolve;

/// Outcome of a decomposition that was not aborted.
#[derive(Debug, Default)]
pub struct DecomposeReport {
    /// Written files, in write order.
    pub written: Vec<PathBuf>,
    /// Recoverable errors, in the order they were encountered.
    pub errors: Vec<Error>,
}

impl DecomposeReport {
    /// True if every reachable reference was extracted.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Read `source` and decompose it into `target_dir`.
///
/// With no `datastream_id`, the first data-stream in the document is used.
/// An empty `target_dir` means the current directory.
///
/// # Example
///
/// ```no_run
/// let report = scap_ds::decompose("ssg-rhel7-ds.xml", None, "out")?;
/// for path in &report.written {
///     println!("{}", path.display());
/// }
/// # Ok::<(), scap_ds::Error>(())
/// ```
pub fn decompose<P: AsRef<Path>, Q: AsRef<Path>>(
    source: P,
    datastream_id: Option<&str>,
    target_dir: Q,
) -> Result<DecomposeReport> {
    let source = source.as_ref();
    let collection = Collection::open(source).map_err(|e| Error::Source {
        path: source.to_path_buf(),
        source: Box::new(e),
    })?;
    decompose_collection(&collection, datastream_id, target_dir)
}

/// Decompose an already loaded collection into `target_dir`.
pub fn decompose_collection<Q: AsRef<Path>>(
    collection: &Collection,
    datastream_id: Option<&str>,
    target_dir: Q,
) -> Result<DecomposeReport> {
    let datastream = collection.select_datastream(datastream_id)?;
    let checklists = datastream
        .container(ContainerKind::Checklists)
        .ok_or(Error::NoChecklists)?;

    let target_dir = target_dir.as_ref();
    let target_dir = if target_dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        target_dir
    };

    info!(
        datastream = datastream.id().unwrap_or("<unnamed>"),
        target = %target_dir.display(),
        "decomposing data-stream"
    );

    let mut decomposer = Decomposer {
        collection,
        datastream,
        expanding: Vec::new(),
        report: DecomposeReport::default(),
    };
    for cref in datastream.refs_in(checklists) {
        decomposer.dump_component_ref(cref, target_dir);
    }

    let report = decomposer.report;
    info!(
        written = report.written.len(),
        errors = report.errors.len(),
        "decomposition finished"
    );
    Ok(report)
}

struct Decomposer<'a> {
    collection: &'a Collection,
    datastream: &'a DataStream,
    /// Component-refs whose catalogs are being expanded on the current path.
    expanding: Vec<NodeId>,
    report: DecomposeReport,
}

impl<'a> Decomposer<'a> {
    fn record(&mut self, error: Error) {
        warn!(%error, "skipping reference");
        self.report.errors.push(error);
    }

    /// Extract an entry point under the name given by its own `href`.
    fn dump_component_ref(&mut self, cref: &'a ComponentRef, target_dir: &Path) {
        match cref.href() {
            Ok(href) => self.dump_component_ref_as(cref, target_dir, href.id()),
            Err(e) => self.record(e.clone().into()),
        }
    }

    fn dump_component_ref_as(&mut self, cref: &'a ComponentRef, target_dir: &Path, output_name: &str) {
        if let Err(e) = self.try_dump_component_ref_as(cref, target_dir, output_name) {
            self.record(e);
        }
    }

    fn try_dump_component_ref_as(
        &mut self,
        cref: &'a ComponentRef,
        target_dir: &Path,
        output_name: &str,
    ) -> Result<()> {
        let id = cref
            .id()
            .ok_or_else(|| AttributeError::missing("component-ref", "id"))?;
        let href = cref.href().map_err(|e| e.clone())?;

        if self.expanding.contains(&cref.node()) {
            return Err(Error::CyclicReference(id.to_string()));
        }

        let out = path::resolve_output_path(target_dir, output_name)?;

        let component = resolve::find_component(self.collection, href.id())?;
        let extracted = self
            .collection
            .extract(component)
            .ok_or_else(|| Error::EmptyComponent(href.id().to_string()))?;

        extracted
            .write_to_path(&out.file)
            .map_err(|e| Error::Write {
                path: out.file.clone(),
                source: Box::new(e),
            })?;
        debug!(component_ref = id, file = %out.file.display(), "wrote component");
        self.report.written.push(out.file);

        if let Some(catalog) = cref.catalog() {
            self.expanding.push(cref.node());
            for entry in catalog.entries() {
                if let Err(e) = self.dump_catalog_entry(entry, &out.dir) {
                    self.record(e);
                }
            }
            self.expanding.pop();
        }

        Ok(())
    }

    fn dump_catalog_entry(&mut self, entry: &'a CatalogEntry, dir: &Path) -> Result<()> {
        let name = entry
            .name()
            .ok_or_else(|| AttributeError::missing("uri", "name"))?;
        let target = resolve::resolve_catalog_entry(self.datastream, entry)?;

        debug!(name, dir = %dir.display(), "following catalog entry");
        self.dump_component_ref_as(target, dir, name);
        Ok(())
    }
}
