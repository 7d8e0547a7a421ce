//! # scap-ds
//!
//! Split SCAP source data-stream collections into standalone component files,
//! and build collections that reference component files.
//!
//! A collection bundles several documents (XCCDF checklists, OVAL checks, CPE
//! dictionaries, ...) as `component` elements under one root. Data-streams
//! point at those components through `component-ref`s, and a component-ref
//! can carry a catalog naming further component-refs it depends on.
//!
//! ## Decompose
//!
//! ```no_run
//! use scap_ds::decompose;
//!
//! // First data-stream in the file, written below ./out
//! let report = decompose("ssg-rhel7-ds.xml", None, "out")?;
//! for error in &report.errors {
//!     eprintln!("skipped: {error}");
//! }
//! # Ok::<(), scap_ds::Error>(())
//! ```
//!
//! ## Compose
//!
//! ```
//! use scap_ds::{compose, ContainerKind};
//!
//! let collection = compose("ssg-rhel7-xccdf.xml", "scap_org.open-scap_datastream_1")?;
//! let ds = &collection.datastreams()[0];
//! let checklists = ds.container(ContainerKind::Checklists).unwrap();
//! assert_eq!(ds.refs_in(checklists).count(), 1);
//! # Ok::<(), scap_ds::Error>(())
//! ```

pub mod compose;
pub mod decompose;
pub mod dom;
pub mod error;
pub mod model;
pub mod path;
pub mod resolve;
pub(crate) mod util;

pub use compose::{Composer, classify, compose};
pub use decompose::{DecomposeReport, decompose, decompose_collection};
pub use error::{AttributeError, Error, Result, Severity};
pub use model::{
    Catalog, CatalogEntry, Collection, Component, ComponentRef, Container, ContainerKind,
    DataStream, Reference, ReferenceKind,
};
pub use resolve::{find_component, find_component_ref};
