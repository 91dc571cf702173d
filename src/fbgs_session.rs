// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Scale Invariant

/// Form Builder Session
/// The collaborator-facing mutation API around one Application
///
/// Responsibilities:
/// - Owns the edit mode; at most one edit or add form is open at a time
/// - Rejects every mutation with `Busy` while a form is open
/// - Resolves `NodeRef`/`ContainerRef` addresses to tree nodes
/// - Calls the change listener after each structural mutation or applied edit

use tracing::{debug, warn};

use crate::fbga_app::Application;
use crate::fbgcl_control::{Control, ControlKind};
use crate::fbgo_container::{Entry, Section};
use crate::fbgt_types::{
    Change, ChangeKind, ContainerRef, EditValues, FormError, MutationError, NodeRef, PropertyDescriptor,
};
use crate::fbgx_xml::XmlDocument;

// ============================================================================
// Edit mode
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditMode {
    #[default]
    Idle,
    /// Property form open for a node
    Editing(NodeRef),
    /// Control-kind picker open for a container
    Adding(ContainerRef),
}

type Listener = Box<dyn FnMut(&Change)>;

pub struct FormBuilder {
    app: Application,
    mode: EditMode,
    listener: Option<Listener>,
}

impl FormBuilder {
    pub fn new(app: Application) -> Self {
        FormBuilder { app, mode: EditMode::Idle, listener: None }
    }

    /// Register the "data changed" callback, replacing any previous one
    pub fn on_change(&mut self, listener: impl FnMut(&Change) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    pub fn application(&self) -> &Application {
        &self.app
    }

    pub fn into_application(self) -> Application {
        self.app
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn is_editing(&self) -> bool {
        self.mode != EditMode::Idle
    }

    fn ensure_idle(&self) -> Result<(), MutationError> {
        if self.is_editing() {
            warn!("SESSION: rejected while {:?} is open", self.mode);
            return Err(MutationError::Busy);
        }
        Ok(())
    }

    fn notify(&mut self, kind: ChangeKind, node: NodeRef) {
        debug!("SESSION: {:?} {:?}", kind, node);
        if let Some(listener) = self.listener.as_mut() {
            listener(&Change { kind, node });
        }
    }

    // ========================================================================
    // Pages
    // ========================================================================

    pub fn add_page(&mut self) -> Result<usize, MutationError> {
        self.ensure_idle()?;
        let index = self.app.add_page();
        self.notify(ChangeKind::Added, NodeRef::Page(index));
        Ok(index)
    }

    pub fn remove_page(&mut self, index: usize) -> Result<(), MutationError> {
        self.ensure_idle()?;
        self.app.remove_page(index)?;
        self.notify(ChangeKind::Removed, NodeRef::Page(index));
        Ok(())
    }

    pub fn swap_pages(&mut self, a: usize, b: usize) -> Result<(), MutationError> {
        self.ensure_idle()?;
        self.app.swap_pages(a, b)?;
        self.notify(ChangeKind::Swapped, NodeRef::Application);
        Ok(())
    }

    // ========================================================================
    // Entries
    // ========================================================================

    /// Attach a node to a page or section. Sections only hold controls.
    pub fn add_entry(&mut self, target: ContainerRef, entry: Entry) -> Result<usize, MutationError> {
        self.ensure_idle()?;
        self.attach(target, entry)
    }

    pub fn add_section(&mut self, page: usize) -> Result<usize, MutationError> {
        self.add_entry(ContainerRef::Page(page), Entry::Section(Section::default()))
    }

    fn attach(&mut self, target: ContainerRef, entry: Entry) -> Result<usize, MutationError> {
        let (node, index) = match target {
            ContainerRef::Page(p) => {
                let page = self.app.page_slot(p).ok_or(MutationError::NoSuchNode(target.into()))?;
                let entry = page.add_entry(entry);
                (NodeRef::Entry { page: p, entry }, entry)
            }
            ContainerRef::Section { page, entry: s } => {
                let control = match entry {
                    Entry::Control(c) => c,
                    Entry::Section(_) => return Err(MutationError::InvalidControl),
                };
                let section = self.app.page_slot(page)
                    .and_then(|pg| pg.section_slot(s))
                    .ok_or(MutationError::NoSuchNode(target.into()))?;
                let control = section.add_control(control);
                (NodeRef::SectionControl { page, section: s, control }, control)
            }
        };

        self.notify(ChangeKind::Added, node);
        Ok(index)
    }

    /// Remove a page, page entry, or section control by its address
    pub fn remove(&mut self, node: NodeRef) -> Result<(), MutationError> {
        self.ensure_idle()?;
        match node {
            NodeRef::Application => return Err(MutationError::InvalidControl),
            NodeRef::Page(p) => {
                self.app.remove_page(p)?;
            }
            NodeRef::Entry { page, entry } => {
                self.app.page_slot(page)
                    .ok_or(MutationError::NoSuchNode(node))?
                    .remove_entry(entry)?;
            }
            NodeRef::SectionControl { page, section, control } => {
                self.app.page_slot(page)
                    .and_then(|pg| pg.section_slot(section))
                    .ok_or(MutationError::NoSuchNode(node))?
                    .remove_control(control)?;
            }
        }
        self.notify(ChangeKind::Removed, node);
        Ok(())
    }

    pub fn swap(&mut self, container: ContainerRef, a: usize, b: usize) -> Result<(), MutationError> {
        self.ensure_idle()?;
        match container {
            ContainerRef::Page(p) => {
                self.app.page_slot(p)
                    .ok_or(MutationError::NoSuchNode(container.into()))?
                    .swap_entries(a, b)?;
            }
            ContainerRef::Section { page, entry } => {
                self.app.page_slot(page)
                    .and_then(|pg| pg.section_slot(entry))
                    .ok_or(MutationError::NoSuchNode(container.into()))?
                    .swap_controls(a, b)?;
            }
        }
        self.notify(ChangeKind::Swapped, container.into());
        Ok(())
    }

    // ========================================================================
    // Extra attributes
    // ========================================================================

    pub fn set_attribute(&mut self, node: NodeRef, key: &str, value: &str) -> Result<(), MutationError> {
        self.ensure_idle()?;
        match node {
            NodeRef::Entry { page, entry } => {
                self.app.page_slot(page)
                    .and_then(|pg| pg.entries.slot_mut(entry))
                    .ok_or(MutationError::NoSuchNode(node))?
                    .attributes_mut()
                    .set(key, value)?;
            }
            NodeRef::SectionControl { .. } => {
                self.section_control_mut(node)?.attributes.set(key, value)?;
            }
            NodeRef::Application | NodeRef::Page(_) => return Err(MutationError::InvalidControl),
        }
        self.notify(ChangeKind::Edited, node);
        Ok(())
    }

    pub fn remove_attribute(&mut self, node: NodeRef, key: &str) -> Result<Option<String>, MutationError> {
        self.ensure_idle()?;
        let previous = match node {
            NodeRef::Entry { page, entry } => self.app.page_slot(page)
                .and_then(|pg| pg.entries.slot_mut(entry))
                .ok_or(MutationError::NoSuchNode(node))?
                .attributes_mut()
                .remove(key),
            NodeRef::SectionControl { .. } => self.section_control_mut(node)?.attributes.remove(key),
            NodeRef::Application | NodeRef::Page(_) => return Err(MutationError::InvalidControl),
        };
        if previous.is_some() {
            self.notify(ChangeKind::Edited, node);
        }
        Ok(previous)
    }

    fn section_control_mut(&mut self, node: NodeRef) -> Result<&mut Control, MutationError> {
        if let NodeRef::SectionControl { page, section, control } = node {
            self.app.page_slot(page)
                .and_then(|pg| pg.section_slot(section))
                .and_then(|s| s.controls.slot_mut(control))
                .ok_or(MutationError::NoSuchNode(node))
        } else {
            Err(MutationError::NoSuchNode(node))
        }
    }

    // ========================================================================
    // Property editing
    // ========================================================================

    /// Descriptors for a node without opening a form
    pub fn describe(&self, node: NodeRef) -> Result<Vec<PropertyDescriptor>, MutationError> {
        let missing = MutationError::NoSuchNode(node);
        Ok(match node {
            NodeRef::Application => self.app.describe_editable_properties(),
            NodeRef::Page(p) => self.app.page(p).ok_or(missing)?.describe_editable_properties(),
            NodeRef::Entry { page, entry } => self.app.page(page)
                .and_then(|pg| pg.entries.get(entry))
                .ok_or(missing)?
                .describe_editable_properties(),
            NodeRef::SectionControl { page, section, control } => self.app.page(page)
                .and_then(|pg| pg.section(section))
                .and_then(|s| s.controls.get(control))
                .ok_or(missing)?
                .describe_editable_properties(),
        })
    }

    /// Open the property form for `node`
    pub fn begin_edit(&mut self, node: NodeRef) -> Result<Vec<PropertyDescriptor>, MutationError> {
        self.ensure_idle()?;
        let props = self.describe(node)?;
        self.mode = EditMode::Editing(node);
        debug!("SESSION: editing {:?}", node);
        Ok(props)
    }

    /// Apply the submitted form and close it
    pub fn submit_edit(&mut self, values: &EditValues) -> Result<(), MutationError> {
        let node = match self.mode {
            EditMode::Editing(node) => node,
            _ => return Err(MutationError::InvalidControl),
        };
        self.mode = EditMode::Idle;

        let missing = MutationError::NoSuchNode(node);
        match node {
            NodeRef::Application => self.app.apply_edits(values),
            NodeRef::Page(p) => self.app.page_slot(p).ok_or(missing)?.apply_edits(values),
            NodeRef::Entry { page, entry } => self.app.page_slot(page)
                .and_then(|pg| pg.entries.slot_mut(entry))
                .ok_or(missing)?
                .apply_edits(values),
            NodeRef::SectionControl { .. } => self.section_control_mut(node)?.apply_edits(values),
        }
        self.notify(ChangeKind::Edited, node);
        Ok(())
    }

    /// Close whichever form is open without applying anything
    pub fn cancel_edit(&mut self) {
        if self.is_editing() {
            debug!("SESSION: cancelled {:?}", self.mode);
        }
        self.mode = EditMode::Idle;
    }

    /// Open the control-kind picker for a container
    pub fn begin_add_control(&mut self, target: ContainerRef) -> Result<&'static [ControlKind], MutationError> {
        self.ensure_idle()?;
        let exists = match target {
            ContainerRef::Page(p) => self.app.page(p).is_some(),
            ContainerRef::Section { page, entry } => self.app.page(page).and_then(|pg| pg.section(entry)).is_some(),
        };
        if !exists {
            return Err(MutationError::NoSuchNode(target.into()));
        }
        self.mode = EditMode::Adding(target);
        Ok(&ControlKind::ALL)
    }

    /// Create the default control for a picker code and attach it
    pub fn submit_add_control(&mut self, code: usize) -> Result<usize, MutationError> {
        let target = match self.mode {
            EditMode::Adding(target) => target,
            _ => return Err(MutationError::InvalidControl),
        };
        self.mode = EditMode::Idle;

        let kind = ControlKind::from_code(code).ok_or(MutationError::InvalidControl)?;
        self.attach(target, Entry::Control(Control::new(kind)))
    }

    // ========================================================================
    // Whole document
    // ========================================================================

    pub fn export_xml(&self) -> XmlDocument {
        self.app.export_xml()
    }

    pub fn import_xml(&mut self, xml: &str) -> Result<(), FormError> {
        self.ensure_idle()?;
        self.app.import_xml(xml)?;
        self.notify(ChangeKind::Replaced, NodeRef::Application);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fbgt_types::PropertyValue;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn builder_with_page() -> FormBuilder {
        let mut b = FormBuilder::new(Application::default());
        b.add_page().unwrap();
        b
    }

    #[test]
    fn add_page_blocked_while_editing() {
        let mut b = builder_with_page();
        b.begin_edit(NodeRef::Page(0)).unwrap();

        assert_eq!(b.add_page(), Err(MutationError::Busy));
        assert_eq!(b.application().pages.len(), 1);

        b.cancel_edit();
        assert_eq!(b.add_page(), Ok(1));
        assert_eq!(b.application().pages.len(), 2);
    }

    #[test]
    fn every_mutation_respects_edit_mode() {
        let mut b = builder_with_page();
        b.add_section(0).unwrap();
        b.begin_add_control(ContainerRef::Page(0)).unwrap();

        assert_eq!(b.remove_page(0), Err(MutationError::Busy));
        assert_eq!(b.swap_pages(0, 0), Err(MutationError::Busy));
        assert_eq!(b.add_section(0), Err(MutationError::Busy));
        assert_eq!(b.remove(NodeRef::Entry { page: 0, entry: 0 }), Err(MutationError::Busy));
        assert_eq!(b.begin_edit(NodeRef::Application).unwrap_err(), MutationError::Busy);
        assert!(matches!(b.import_xml("<application/>"), Err(FormError::Mutation(MutationError::Busy))));
        assert_eq!(b.application().page(0).unwrap().entries.len(), 1);
    }

    #[test]
    fn listener_sees_every_applied_change() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();

        let mut b = FormBuilder::new(Application::default());
        b.on_change(move |c| sink.borrow_mut().push(*c));
        b.add_page().unwrap();
        b.add_page().unwrap();
        b.add_section(0).unwrap();
        b.add_entry(ContainerRef::Page(0), Entry::Control(Control::new(ControlKind::Text))).unwrap();
        b.swap(ContainerRef::Page(0), 0, 1).unwrap();
        b.swap_pages(0, 1).unwrap();

        let text = NodeRef::Entry { page: 1, entry: 0 };
        b.set_attribute(text, "size", "20").unwrap();
        b.begin_edit(text).unwrap();
        b.submit_edit(&EditValues::new()).unwrap();
        b.remove(NodeRef::Entry { page: 1, entry: 1 }).unwrap();
        b.import_xml("<application><page label='A'/></application>").unwrap();

        let expected = [
            Change { kind: ChangeKind::Added, node: NodeRef::Page(0) },
            Change { kind: ChangeKind::Added, node: NodeRef::Page(1) },
            Change { kind: ChangeKind::Added, node: NodeRef::Entry { page: 0, entry: 0 } },
            Change { kind: ChangeKind::Added, node: NodeRef::Entry { page: 0, entry: 1 } },
            Change { kind: ChangeKind::Swapped, node: NodeRef::Page(0) },
            Change { kind: ChangeKind::Swapped, node: NodeRef::Application },
            Change { kind: ChangeKind::Edited, node: text },
            Change { kind: ChangeKind::Edited, node: text },
            Change { kind: ChangeKind::Removed, node: NodeRef::Entry { page: 1, entry: 1 } },
            Change { kind: ChangeKind::Replaced, node: NodeRef::Application },
        ];
        assert_eq!(*seen.borrow(), expected);
    }

    #[test]
    fn listener_silent_on_rejected_mutations() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();

        let mut b = builder_with_page();
        b.add_section(0).unwrap();
        b.on_change(move |c| sink.borrow_mut().push(*c));

        assert!(b.remove_page(4).is_err());
        assert!(b.swap_pages(0, 3).is_err());
        assert!(b.swap(ContainerRef::Page(0), 0, 2).is_err());
        assert!(b.set_attribute(NodeRef::Entry { page: 0, entry: 0 }, "bad key", "x").is_err());
        assert_eq!(b.remove_attribute(NodeRef::Entry { page: 0, entry: 0 }, "absent"), Ok(None));
        assert!(b.import_xml("<application><page>").is_err());

        b.begin_edit(NodeRef::Page(0)).unwrap();
        assert_eq!(b.add_page(), Err(MutationError::Busy));
        assert_eq!(b.swap_pages(0, 0), Err(MutationError::Busy));
        assert_eq!(b.set_attribute(NodeRef::Entry { page: 0, entry: 0 }, "size", "1"), Err(MutationError::Busy));
        b.cancel_edit();

        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn unwritable_attribute_key_is_refused() {
        let mut b = builder_with_page();
        b.add_entry(ContainerRef::Page(0), Entry::Control(Control::new(ControlKind::Text))).unwrap();
        let node = NodeRef::Entry { page: 0, entry: 0 };

        assert_eq!(
            b.set_attribute(node, "data x", "1"),
            Err(MutationError::InvalidAttribute("data x".to_string()))
        );
        assert!(b.set_attribute(node, "", "1").is_err());
        b.set_attribute(node, "data-x", "1").unwrap();

        let xml = b.export_xml().to_xml_string().unwrap();
        let mut back = Application::default();
        back.import_xml(&xml).unwrap();
        assert_eq!(&back, b.application());
    }

    #[test]
    fn section_refuses_sections() {
        let mut b = builder_with_page();
        b.add_section(0).unwrap();
        let target = ContainerRef::Section { page: 0, entry: 0 };

        assert_eq!(
            b.add_entry(target, Entry::Section(Section::default())),
            Err(MutationError::InvalidControl)
        );
        assert_eq!(b.application().page(0).unwrap().section(0).unwrap().controls.len(), 0);

        assert_eq!(b.add_entry(target, Entry::Control(Control::new(ControlKind::File))), Ok(0));
    }

    #[test]
    fn add_control_by_code() {
        let mut b = builder_with_page();
        let kinds = b.begin_add_control(ContainerRef::Page(0)).unwrap();
        assert_eq!(kinds.len(), 7);
        assert_eq!(b.submit_add_control(5), Ok(0));
        assert!(!b.is_editing());

        b.begin_add_control(ContainerRef::Page(0)).unwrap();
        assert_eq!(b.submit_add_control(42), Err(MutationError::InvalidControl));
        assert!(!b.is_editing());
        assert_eq!(b.application().page(0).unwrap().entries.len(), 1);
    }

    #[test]
    fn edit_round() {
        let mut b = builder_with_page();
        b.add_entry(ContainerRef::Page(0), Entry::Control(Control::new(ControlKind::Radio))).unwrap();
        let node = NodeRef::Entry { page: 0, entry: 0 };

        let props = b.begin_edit(node).unwrap();
        assert_eq!(props.len(), 3);
        assert_eq!(b.mode(), EditMode::Editing(node));

        let mut values = EditValues::new();
        values.insert("label".to_string(), PropertyValue::Text("Size".to_string()));
        values.insert("choices".to_string(), PropertyValue::List(vec!["S".to_string()]));
        b.submit_edit(&values).unwrap();

        assert_eq!(b.mode(), EditMode::Idle);
        let described = b.describe(node).unwrap();
        assert_eq!(described[0].value, PropertyValue::Text("Size".to_string()));
        assert_eq!(described[2].value, PropertyValue::List(vec!["S".to_string()]));
    }

    #[test]
    fn submit_without_open_form_fails() {
        let mut b = builder_with_page();
        assert_eq!(b.submit_edit(&EditValues::new()), Err(MutationError::InvalidControl));
    }

    #[test]
    fn section_control_addressing() {
        let mut b = builder_with_page();
        b.add_section(0).unwrap();
        let target = ContainerRef::Section { page: 0, entry: 0 };
        for k in [ControlKind::Text, ControlKind::File, ControlKind::RichText] {
            b.add_entry(target, Entry::Control(Control::new(k))).unwrap();
        }

        b.swap(target, 0, 2).unwrap();
        b.remove(NodeRef::SectionControl { page: 0, section: 0, control: 1 }).unwrap();
        b.set_attribute(NodeRef::SectionControl { page: 0, section: 0, control: 0 }, "Rows", "4").unwrap();

        let section = b.application().page(0).unwrap().section(0).unwrap();
        let kinds: Vec<ControlKind> = section.controls.iter().map(|c| c.kind()).collect();
        assert_eq!(kinds, [ControlKind::RichText, ControlKind::Text]);
        assert_eq!(section.controls.get(0).unwrap().attributes.get("rows"), Some("4"));
        assert_eq!(
            b.remove(NodeRef::SectionControl { page: 0, section: 0, control: 2 }),
            Err(MutationError::IndexOutOfRange { index: 2, len: 2 })
        );
    }

    #[test]
    fn missing_nodes_are_reported() {
        let mut b = builder_with_page();
        let node = NodeRef::Entry { page: 3, entry: 0 };
        assert_eq!(b.begin_edit(node).unwrap_err(), MutationError::NoSuchNode(node));
        assert!(!b.is_editing());
        assert!(b.add_section(9).is_err());
    }
}
