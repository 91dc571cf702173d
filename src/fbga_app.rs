// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Scale Invariant

/// Application Document
/// Root of the form tree; owns whole-document XML export and import
///
/// Import builds a complete page list first and swaps it in only on success,
/// so a malformed document never leaves a half-replaced tree behind.

use std::collections::HashMap;

use lazy_static::lazy_static;
use tracing::debug;

use crate::fbgcl_control::{Control, ControlKind};
use crate::fbgo_container::{ChildMut, Container, Page, Section};
use crate::fbgt_types::{EditValues, FormError, MutationError, PropertyDescriptor};
use crate::fbgx_xml::{XmlDocument, XmlElement};

// ============================================================================
// SECTION 1: Import dispatch table
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeTag {
    Control(ControlKind),
    Section,
}

lazy_static! {
    // Lower-cased tag → node constructor selector
    static ref NODE_TAGS: HashMap<&'static str, NodeTag> = {
        let mut m = HashMap::new();
        for kind in ControlKind::ALL {
            m.insert(kind.tag(), NodeTag::Control(kind));
        }
        // Older documents name the rich text control after its editor
        m.insert("ckeditor", NodeTag::Control(ControlKind::RichText));
        m.insert("section", NodeTag::Section);
        m
    };
}

fn lookup_tag(el: &XmlElement) -> Option<NodeTag> {
    NODE_TAGS.get(el.name().to_ascii_lowercase().as_str()).copied()
}

// ============================================================================
// SECTION 2: Application
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    pub name: String,
    pub pages: Container<Page>,
}

impl Default for Application {
    fn default() -> Self {
        Application {
            name: "My Application".to_string(),
            pages: Container::new(),
        }
    }
}

impl Application {
    pub fn new(name: &str) -> Self {
        Application { name: name.to_string(), pages: Container::new() }
    }

    /// Append an empty page; returns its index
    pub fn add_page(&mut self) -> usize {
        self.pages.push(Page::default())
    }

    pub fn push_page(&mut self, page: Page) -> usize {
        self.pages.push(page)
    }

    pub fn remove_page(&mut self, index: usize) -> Result<Page, MutationError> {
        self.pages.remove(index)
    }

    pub fn swap_pages(&mut self, a: usize, b: usize) -> Result<(), MutationError> {
        self.pages.swap(a, b)
    }

    pub fn clear_pages(&mut self) {
        self.pages.clear();
    }

    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    pub fn page_mut(&mut self, index: usize) -> Option<ChildMut<'_, Page>> {
        self.pages.get_mut(index)
    }

    pub(crate) fn page_slot(&mut self, index: usize) -> Option<&mut Page> {
        self.pages.slot_mut(index)
    }

    pub fn describe_editable_properties(&self) -> Vec<PropertyDescriptor> {
        vec![PropertyDescriptor::text("name", "Name:", &self.name)]
    }

    pub fn apply_edits(&mut self, values: &EditValues) {
        if let Some(name) = values.get("name").and_then(|v| v.as_text()) {
            self.name = name.to_string();
        }
    }

    // ========================================================================
    // Export
    // ========================================================================

    pub fn export_xml(&self) -> XmlDocument {
        let mut root = XmlElement::new("application");
        root.set_attr("name", &self.name);
        for page in &self.pages {
            root.push_child(page.to_xml());
        }
        debug!("EXPORT: application '{}' with {} pages", self.name, self.pages.len());
        XmlDocument::new(root)
    }

    pub fn export_xml_string(&self) -> Result<String, FormError> {
        self.export_xml().to_xml_string()
    }

    // ========================================================================
    // Import
    // ========================================================================

    /// Replace every page with those described by `xml`
    pub fn import_xml(&mut self, xml: &str) -> Result<(), FormError> {
        let doc = XmlDocument::parse(xml)?;
        self.import_document(&doc);
        Ok(())
    }

    pub fn import_document(&mut self, doc: &XmlDocument) {
        let mut pages = Container::new();
        let mut skipped = 0;

        for el in doc.root.elements() {
            if !el.is("page") {
                debug!("IMPORT: skipping <{}> outside any page", el.name());
                skipped += 1;
                continue;
            }

            let mut page = Page::new(el.attr("label").unwrap_or_default());
            for child in el.elements() {
                match lookup_tag(child) {
                    Some(NodeTag::Control(kind)) => {
                        page.add_entry(Control::from_xml(kind, child));
                    }
                    Some(NodeTag::Section) => {
                        page.add_entry(read_section(child, &mut skipped));
                    }
                    None => {
                        debug!("IMPORT: skipping unknown tag <{}>", child.name());
                        skipped += 1;
                    }
                }
            }
            pages.push(page);
        }

        if doc.root.is("application") {
            if let Some(name) = doc.root.attr("name") {
                self.name = name.to_string();
            }
        }
        self.pages = pages;

        debug!("IMPORT: {} pages loaded, {} elements skipped", self.pages.len(), skipped);
    }
}

fn read_section(el: &XmlElement, skipped: &mut usize) -> Section {
    let mut section = Section::new(el.attr("label").unwrap_or_default());
    for (k, v) in el.attributes() {
        if k != "label" && section.attributes.set(k, v).is_err() {
            debug!("IMPORT: dropping attribute '{}' on section '{}'", k, section.label);
        }
    }

    for child in el.elements() {
        match lookup_tag(child) {
            Some(NodeTag::Control(kind)) => {
                section.add_control(Control::from_xml(kind, child));
            }
            Some(NodeTag::Section) => {
                debug!("IMPORT: skipping section nested in section '{}'", section.label);
                *skipped += 1;
            }
            None => {
                debug!("IMPORT: skipping unknown tag <{}>", child.name());
                *skipped += 1;
            }
        }
    }
    section
}
