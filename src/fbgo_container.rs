// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Scale Invariant

/// Ordered Containers
/// One generic index-maintaining list shared by sections, pages and the
/// application's page list
///
/// Invariant: for every attached child, `child.index() == Some(position)`.
/// Children never point at their parent; removing a node means asking its
/// container to remove the entry at the node's index. Only this crate can
/// stamp an index, and mutable access from outside goes through `ChildMut`.

use std::ops::{Deref, DerefMut};

use crate::fbgc_core::ExtraAttributes;
use crate::fbgcl_control::Control;
use crate::fbgt_types::{EditValues, MutationError, PropertyDescriptor};
use crate::fbgx_xml::XmlElement;

// ============================================================================
// SECTION 1: Indexed trait and generic container
// ============================================================================

mod sealed {
    pub trait Stamp {
        fn set_index(&mut self, index: Option<usize>);
    }
}

use sealed::Stamp;

/// A node that records its own position in the owning container
pub trait Indexed: sealed::Stamp {
    fn index(&self) -> Option<usize>;
}

impl Indexed for Control {
    fn index(&self) -> Option<usize> {
        Control::index(self)
    }
}

impl Stamp for Control {
    fn set_index(&mut self, index: Option<usize>) {
        Control::set_index(self, index)
    }
}

/// Mutable handle to an attached child. The child may be edited or replaced
/// outright; its index is stamped back when the handle drops.
pub struct ChildMut<'a, T: Indexed> {
    item: &'a mut T,
    index: usize,
}

impl<'a, T: Indexed> ChildMut<'a, T> {
    fn new(item: &'a mut T, index: usize) -> Self {
        ChildMut { item, index }
    }
}

impl<T: Indexed> Deref for ChildMut<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.item
    }
}

impl<T: Indexed> DerefMut for ChildMut<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.item
    }
}

impl<T: Indexed> Drop for ChildMut<'_, T> {
    fn drop(&mut self) {
        self.item.set_index(Some(self.index));
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container<T: Indexed> {
    items: Vec<T>,
}

impl<T: Indexed> Default for Container<T> {
    fn default() -> Self {
        Container { items: Vec::new() }
    }
}

impl<T: Indexed> Container<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<ChildMut<'_, T>> {
        self.items.get_mut(index).map(|item| ChildMut::new(item, index))
    }

    /// In-crate access for edits that never replace the child
    pub(crate) fn slot_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    /// Append, stamping the next index; returns that index
    pub fn push(&mut self, mut item: T) -> usize {
        let index = self.items.len();
        item.set_index(Some(index));
        self.items.push(item);
        index
    }

    /// Remove and return the child at `index`, renumbering its followers
    pub fn remove(&mut self, index: usize) -> Result<T, MutationError> {
        self.check(index)?;
        let mut removed = self.items.remove(index);
        removed.set_index(None);
        for (i, item) in self.items.iter_mut().enumerate().skip(index) {
            item.set_index(Some(i));
        }
        Ok(removed)
    }

    /// Exchange two children. Both indices must be in range.
    pub fn swap(&mut self, a: usize, b: usize) -> Result<(), MutationError> {
        self.check(a)?;
        self.check(b)?;
        self.items.swap(a, b);
        self.items[a].set_index(Some(a));
        self.items[b].set_index(Some(b));
        Ok(())
    }

    /// Drop every child, detaching them
    pub fn clear(&mut self) -> Vec<T> {
        let mut drained: Vec<T> = self.items.drain(..).collect();
        for item in &mut drained {
            item.set_index(None);
        }
        drained
    }

    fn check(&self, index: usize) -> Result<(), MutationError> {
        if index < self.items.len() {
            Ok(())
        } else {
            Err(MutationError::IndexOutOfRange { index, len: self.items.len() })
        }
    }
}

impl<'a, T: Indexed> IntoIterator for &'a Container<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

// ============================================================================
// SECTION 2: Section
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub label: String,
    pub attributes: ExtraAttributes,
    pub controls: Container<Control>,
    index: Option<usize>,
}

impl Default for Section {
    fn default() -> Self {
        Section {
            label: "My Page".to_string(),
            attributes: ExtraAttributes::new(),
            controls: Container::new(),
            index: None,
        }
    }
}

impl Indexed for Section {
    fn index(&self) -> Option<usize> {
        self.index
    }
}

impl Stamp for Section {
    fn set_index(&mut self, index: Option<usize>) {
        self.index = index;
    }
}

impl Section {
    pub fn new(label: &str) -> Self {
        Section { label: label.to_string(), ..Self::default() }
    }

    pub fn add_control(&mut self, control: Control) -> usize {
        self.controls.push(control)
    }

    pub fn remove_control(&mut self, index: usize) -> Result<Control, MutationError> {
        self.controls.remove(index)
    }

    pub fn swap_controls(&mut self, a: usize, b: usize) -> Result<(), MutationError> {
        self.controls.swap(a, b)
    }

    pub fn describe_editable_properties(&self) -> Vec<PropertyDescriptor> {
        vec![PropertyDescriptor::text("label", "Name:", &self.label)]
    }

    pub fn apply_edits(&mut self, values: &EditValues) {
        if let Some(label) = values.get("label").and_then(|v| v.as_text()) {
            self.label = label.to_string();
        }
    }

    pub fn to_xml(&self) -> XmlElement {
        let mut el = XmlElement::new("section");
        el.set_attr("label", &self.label);
        for (k, v) in self.attributes.emittable(&["label"]) {
            el.set_attr(k, v);
        }
        for control in &self.controls {
            el.push_child(control.to_xml());
        }
        el
    }
}

// ============================================================================
// SECTION 3: Page entries and Page
// ============================================================================

/// Anything a page can hold directly
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Control(Control),
    Section(Section),
}

impl Indexed for Entry {
    fn index(&self) -> Option<usize> {
        match self {
            Entry::Control(c) => c.index(),
            Entry::Section(s) => s.index(),
        }
    }
}

impl Stamp for Entry {
    fn set_index(&mut self, index: Option<usize>) {
        match self {
            Entry::Control(c) => c.set_index(index),
            Entry::Section(s) => s.set_index(index),
        }
    }
}

impl From<Control> for Entry {
    fn from(c: Control) -> Self {
        Entry::Control(c)
    }
}

impl From<Section> for Entry {
    fn from(s: Section) -> Self {
        Entry::Section(s)
    }
}

impl Entry {
    pub fn label(&self) -> &str {
        match self {
            Entry::Control(c) => &c.label,
            Entry::Section(s) => &s.label,
        }
    }

    pub fn describe_editable_properties(&self) -> Vec<PropertyDescriptor> {
        match self {
            Entry::Control(c) => c.describe_editable_properties(),
            Entry::Section(s) => s.describe_editable_properties(),
        }
    }

    pub fn apply_edits(&mut self, values: &EditValues) {
        match self {
            Entry::Control(c) => c.apply_edits(values),
            Entry::Section(s) => s.apply_edits(values),
        }
    }

    pub fn attributes_mut(&mut self) -> &mut ExtraAttributes {
        match self {
            Entry::Control(c) => &mut c.attributes,
            Entry::Section(s) => &mut s.attributes,
        }
    }

    pub fn to_xml(&self) -> XmlElement {
        match self {
            Entry::Control(c) => c.to_xml(),
            Entry::Section(s) => s.to_xml(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub label: String,
    pub entries: Container<Entry>,
    index: Option<usize>,
}

impl Default for Page {
    fn default() -> Self {
        Page {
            label: "My Page".to_string(),
            entries: Container::new(),
            index: None,
        }
    }
}

impl Indexed for Page {
    fn index(&self) -> Option<usize> {
        self.index
    }
}

impl Stamp for Page {
    fn set_index(&mut self, index: Option<usize>) {
        self.index = index;
    }
}

impl Page {
    pub fn new(label: &str) -> Self {
        Page { label: label.to_string(), ..Self::default() }
    }

    pub fn add_entry(&mut self, entry: impl Into<Entry>) -> usize {
        self.entries.push(entry.into())
    }

    pub fn remove_entry(&mut self, index: usize) -> Result<Entry, MutationError> {
        self.entries.remove(index)
    }

    pub fn swap_entries(&mut self, a: usize, b: usize) -> Result<(), MutationError> {
        self.entries.swap(a, b)
    }

    pub fn section(&self, index: usize) -> Option<&Section> {
        match self.entries.get(index)? {
            Entry::Section(s) => Some(s),
            Entry::Control(_) => None,
        }
    }

    pub fn section_mut(&mut self, index: usize) -> Option<ChildMut<'_, Section>> {
        self.section_slot(index).map(|s| ChildMut::new(s, index))
    }

    pub(crate) fn section_slot(&mut self, index: usize) -> Option<&mut Section> {
        match self.entries.slot_mut(index)? {
            Entry::Section(s) => Some(s),
            Entry::Control(_) => None,
        }
    }

    pub fn describe_editable_properties(&self) -> Vec<PropertyDescriptor> {
        vec![PropertyDescriptor::text("label", "Name:", &self.label)]
    }

    pub fn apply_edits(&mut self, values: &EditValues) {
        if let Some(label) = values.get("label").and_then(|v| v.as_text()) {
            self.label = label.to_string();
        }
    }

    pub fn to_xml(&self) -> XmlElement {
        let mut el = XmlElement::new("page");
        el.set_attr("label", &self.label);
        for entry in &self.entries {
            el.push_child(entry.to_xml());
        }
        el
    }
}
