//! Error types for scap-ds operations.

use std::path::PathBuf;

use thiserror::Error;

/// How an error affects the operation that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The whole operation is aborted. Files already written stay on disk.
    Fatal,
    /// Only the offending reference is abandoned; siblings are still processed.
    Recoverable,
}

/// Errors that can occur while reading, decomposing or composing a collection.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Could not read/parse XML of given input file at path '{}': {source}", path.display())]
    Source {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    #[error("Malformed document: {0}")]
    Malformed(String),

    #[error("Could not find any datastream of id '{0}'")]
    DataStreamNotFound(String),

    #[error("Could not find any datastream inside the collection")]
    NoDataStream,

    #[error("No checklists element found in the matching datastream")]
    NoChecklists,

    #[error("{0}")]
    Attribute(#[from] AttributeError),

    #[error("Component of given id '{0}' was not found in the document")]
    ComponentNotFound(String),

    #[error("component-ref with given id '{0}' wasn't found in the datastream")]
    ComponentRefNotFound(String),

    #[error("Found component (id='{0}') but it has no element contents, nothing to dump")]
    EmptyComponent(String),

    #[error("Path '{}' exceeds the maximum length of {max} bytes", path.display())]
    PathTooLong { path: PathBuf, max: usize },

    #[error("Invalid output name '{0}'")]
    InvalidOutputName(String),

    #[error("Cyclic reference: component-ref '{0}' is already being expanded")]
    CyclicReference(String),

    #[error("Failed to write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Classify this error as fatal or recoverable.
    pub fn severity(&self) -> Severity {
        match self {
            Error::Io(_)
            | Error::Xml(_)
            | Error::Source { .. }
            | Error::Malformed(_)
            | Error::DataStreamNotFound(_)
            | Error::NoDataStream
            | Error::NoChecklists => Severity::Fatal,
            Error::Attribute(_)
            | Error::ComponentNotFound(_)
            | Error::ComponentRefNotFound(_)
            | Error::EmptyComponent(_)
            | Error::PathTooLong { .. }
            | Error::InvalidOutputName(_)
            | Error::CyclicReference(_)
            | Error::Write { .. } => Severity::Recoverable,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

/// A missing or malformed attribute on a structural element.
///
/// These are recorded while indexing a collection and only reported once
/// the decomposer actually needs the attribute.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("No or invalid {attribute} attribute on {element}{}", describe_value(.value))]
pub struct AttributeError {
    pub element: &'static str,
    pub attribute: &'static str,
    /// The offending value, `None` if the attribute is absent.
    pub value: Option<String>,
}

impl AttributeError {
    pub fn missing(element: &'static str, attribute: &'static str) -> Self {
        Self {
            element,
            attribute,
            value: None,
        }
    }

    pub fn invalid(element: &'static str, attribute: &'static str, value: &str) -> Self {
        Self {
            element,
            attribute,
            value: Some(value.to_string()),
        }
    }
}

fn describe_value(value: &Option<String>) -> String {
    match value {
        Some(v) => format!(" ('{v}')"),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, Error>;
