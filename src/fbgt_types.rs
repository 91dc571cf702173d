// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Scale Invariant

/// Form Builder Shared Types
///
/// Property descriptors handed to the edit collaborator, node addressing,
/// change notifications, and the error taxonomy shared by the tree model and
/// the session layer.

use std::collections::HashMap;

// ============================================================================
// Editable property descriptors
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Text,
    List,
    Bool,
    Number,
}

/// Current or submitted value of one property. Number properties travel as
/// decimal text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Text(String),
    List(Vec<String>),
    Bool(bool),
}

impl PropertyValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            PropertyValue::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// One editable attribute, built on demand for the edit form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDescriptor {
    pub name: &'static str,
    pub kind: PropertyKind,
    pub label: &'static str,
    pub value: PropertyValue,
}

impl PropertyDescriptor {
    pub fn text(name: &'static str, label: &'static str, value: &str) -> Self {
        Self { name, kind: PropertyKind::Text, label, value: PropertyValue::Text(value.to_string()) }
    }

    pub fn list(name: &'static str, label: &'static str, value: &[String]) -> Self {
        Self { name, kind: PropertyKind::List, label, value: PropertyValue::List(value.to_vec()) }
    }

    pub fn boolean(name: &'static str, label: &'static str, value: bool) -> Self {
        Self { name, kind: PropertyKind::Bool, label, value: PropertyValue::Bool(value) }
    }

    pub fn number(name: &'static str, label: &'static str, value: u8) -> Self {
        Self { name, kind: PropertyKind::Number, label, value: PropertyValue::Text(value.to_string()) }
    }
}

/// Submitted edit form: property name → value
pub type EditValues = HashMap<String, PropertyValue>;

// ============================================================================
// Node addressing
// ============================================================================

/// Position of a node in the tree, by index at each level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRef {
    Application,
    Page(usize),
    /// Direct child of a page (control or section)
    Entry { page: usize, entry: usize },
    /// Control held by a section that is itself a page entry
    SectionControl { page: usize, section: usize, control: usize },
}

/// A node able to hold controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerRef {
    Page(usize),
    Section { page: usize, entry: usize },
}

impl From<ContainerRef> for NodeRef {
    fn from(c: ContainerRef) -> Self {
        match c {
            ContainerRef::Page(page) => NodeRef::Page(page),
            ContainerRef::Section { page, entry } => NodeRef::Entry { page, entry },
        }
    }
}

// ============================================================================
// Change notification
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Removed,
    Swapped,
    Edited,
    /// Whole document replaced (import)
    Replaced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Change {
    pub kind: ChangeKind,
    pub node: NodeRef,
}

// ============================================================================
// Errors
// ============================================================================

/// Rejected tree mutation. The tree is left unmodified.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MutationError {
    #[error("another object is being edited; finish that edit first")]
    Busy,

    #[error("index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("object cannot be placed in this container")]
    InvalidControl,

    #[error("'{0}' is not a valid attribute name")]
    InvalidAttribute(String),

    #[error("no node at {0:?}")]
    NoSuchNode(NodeRef),
}

/// Document-level failure (parsing, writing, files)
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error("XML error: {0}")]
    Xml(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Mutation(#[from] MutationError),
}
