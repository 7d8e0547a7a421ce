//! Typed `#fragment` references.
//!
//! Inside a collection, a component-ref's `href` points at a component and a
//! catalog `uri` points at another component-ref of the same data-stream.
//! Both are written as a local fragment, `#<id>`.

use std::fmt;

/// What a [`Reference`] points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    /// A root-level `component` (from a component-ref's `href`).
    Component,
    /// A `component-ref` in the same data-stream (from a catalog `uri`).
    ComponentRef,
}

/// A validated local fragment reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    kind: ReferenceKind,
    id: String,
}

impl Reference {
    /// Parse `#<id>`. Returns `None` unless the string starts with `#`
    /// followed by at least one character.
    pub fn parse(kind: ReferenceKind, raw: &str) -> Option<Self> {
        let id = raw.strip_prefix('#')?;
        if id.is_empty() {
            return None;
        }
        Some(Self {
            kind,
            id: id.to_string(),
        })
    }

    pub fn component(id: impl Into<String>) -> Self {
        Self {
            kind: ReferenceKind::Component,
            id: id.into(),
        }
    }

    pub fn component_ref(id: impl Into<String>) -> Self {
        Self {
            kind: ReferenceKind::ComponentRef,
            id: id.into(),
        }
    }

    pub fn kind(&self) -> ReferenceKind {
        self.kind
    }

    /// The bare identifier, without the leading `#`.
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.id)
    }
}
