// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Scale Invariant

/// Form Controls
/// The seven leaf input kinds, their editable properties, and their XML form
///
/// Every per-kind behaviour is a single match over `ControlVariant`, so adding
/// a kind is a compile error everywhere it needs handling.

use tracing::debug;

use crate::fbgc_core::{namesafe, parse_hour, parse_yes, yes_no, ExtraAttributes, HOUR_MAX, HOUR_MIN};
use crate::fbgt_types::{EditValues, PropertyDescriptor};
use crate::fbgx_xml::XmlElement;

// ============================================================================
// SECTION 1: Kinds
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlKind {
    Text,
    Radio,
    DropDown,
    CheckBox,
    File,
    TimeChart,
    RichText,
}

impl ControlKind {
    /// Kinds in picker order; a kind's position is its code
    pub const ALL: [ControlKind; 7] = [
        ControlKind::Text,
        ControlKind::Radio,
        ControlKind::DropDown,
        ControlKind::CheckBox,
        ControlKind::File,
        ControlKind::TimeChart,
        ControlKind::RichText,
    ];

    pub fn from_code(code: usize) -> Option<Self> {
        Self::ALL.get(code).copied()
    }

    pub fn code(self) -> usize {
        Self::ALL.iter().position(|k| *k == self).unwrap_or(0)
    }

    /// Human name shown in the "add control" picker
    pub fn display_name(self) -> &'static str {
        match self {
            ControlKind::Text => "Text",
            ControlKind::Radio => "Radio",
            ControlKind::DropDown => "Drop-Down",
            ControlKind::CheckBox => "Checkbox",
            ControlKind::File => "File",
            ControlKind::TimeChart => "Time Chart",
            ControlKind::RichText => "Rich Text",
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            ControlKind::Text => "text",
            ControlKind::Radio => "radio",
            ControlKind::DropDown => "dropdown",
            ControlKind::CheckBox => "checkbox",
            ControlKind::File => "file",
            ControlKind::TimeChart => "time-chart",
            ControlKind::RichText => "richtext",
        }
    }

    fn default_label(self) -> &'static str {
        match self {
            ControlKind::Text => "Text Box",
            ControlKind::Radio => "Radio Buttons",
            ControlKind::DropDown => "Drop Down",
            ControlKind::CheckBox => "Check Box",
            ControlKind::File => "File",
            ControlKind::TimeChart => "Time Chart",
            ControlKind::RichText => "Rich Text",
        }
    }
}

// ============================================================================
// SECTION 2: Control data
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlVariant {
    Text,
    Radio { choices: Vec<String> },
    DropDown { choices: Vec<String>, allow_multiple: bool },
    CheckBox { choices: Vec<String> },
    File,
    TimeChart { start_hour: u8, end_hour: u8, value: String },
    RichText,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    pub label: String,
    pub required: bool,
    pub attributes: ExtraAttributes,
    pub variant: ControlVariant,
    index: Option<usize>,
}

fn default_choices() -> Vec<String> {
    vec!["Choice A".to_string(), "Choice B".to_string(), "Choice C".to_string()]
}

impl Control {
    /// Fresh, detached control with the kind's default label and data
    pub fn new(kind: ControlKind) -> Self {
        let variant = match kind {
            ControlKind::Text => ControlVariant::Text,
            ControlKind::Radio => ControlVariant::Radio { choices: default_choices() },
            ControlKind::DropDown => ControlVariant::DropDown { choices: default_choices(), allow_multiple: false },
            ControlKind::CheckBox => ControlVariant::CheckBox { choices: default_choices() },
            ControlKind::File => ControlVariant::File,
            ControlKind::TimeChart => ControlVariant::TimeChart {
                start_hour: HOUR_MIN,
                end_hour: HOUR_MAX,
                value: String::new(),
            },
            ControlKind::RichText => ControlVariant::RichText,
        };

        Control {
            label: kind.default_label().to_string(),
            required: false,
            attributes: ExtraAttributes::new(),
            variant,
            index: None,
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Replace the choice list; no effect on kinds without choices
    pub fn with_choices<S: AsRef<str>>(mut self, items: &[S]) -> Self {
        if let Some(choices) = self.choices_mut() {
            *choices = items.iter().map(|s| s.as_ref().to_string()).collect();
        }
        self
    }

    pub fn kind(&self) -> ControlKind {
        match self.variant {
            ControlVariant::Text => ControlKind::Text,
            ControlVariant::Radio { .. } => ControlKind::Radio,
            ControlVariant::DropDown { .. } => ControlKind::DropDown,
            ControlVariant::CheckBox { .. } => ControlKind::CheckBox,
            ControlVariant::File => ControlKind::File,
            ControlVariant::TimeChart { .. } => ControlKind::TimeChart,
            ControlVariant::RichText => ControlKind::RichText,
        }
    }

    /// Position in the owning container, None while detached
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub(crate) fn set_index(&mut self, index: Option<usize>) {
        self.index = index;
    }

    pub fn choices(&self) -> Option<&[String]> {
        match &self.variant {
            ControlVariant::Radio { choices }
            | ControlVariant::DropDown { choices, .. }
            | ControlVariant::CheckBox { choices } => Some(choices),
            _ => None,
        }
    }

    fn choices_mut(&mut self) -> Option<&mut Vec<String>> {
        match &mut self.variant {
            ControlVariant::Radio { choices }
            | ControlVariant::DropDown { choices, .. }
            | ControlVariant::CheckBox { choices } => Some(choices),
            _ => None,
        }
    }

    /// Field name used by the submitted form; multi-value kinds get `[]`
    pub fn field_name(&self) -> String {
        let base = namesafe(&self.label);
        if self.choices().is_some() {
            format!("{}[]", base)
        } else {
            base
        }
    }

    // ========================================================================
    // Editing
    // ========================================================================

    pub fn describe_editable_properties(&self) -> Vec<PropertyDescriptor> {
        let mut props = vec![
            PropertyDescriptor::text("label", "Instructions:", &self.label),
            PropertyDescriptor::boolean("required", "Required:", self.required),
        ];

        match &self.variant {
            ControlVariant::Radio { choices } | ControlVariant::CheckBox { choices } => {
                props.push(PropertyDescriptor::list("choices", "Options:", choices));
            }
            ControlVariant::DropDown { choices, allow_multiple } => {
                props.push(PropertyDescriptor::list("choices", "Options:", choices));
                props.push(PropertyDescriptor::boolean("multiple", "Allow multiple select?", *allow_multiple));
            }
            ControlVariant::TimeChart { start_hour, end_hour, .. } => {
                props.push(PropertyDescriptor::number("startHour", "Earliest Start Time:", *start_hour));
                props.push(PropertyDescriptor::number("endHour", "Latest End Time:", *end_hour));
            }
            ControlVariant::Text | ControlVariant::File | ControlVariant::RichText => {}
        }

        props
    }

    /// Copy recognised properties; unknown names and mismatched value shapes are ignored
    pub fn apply_edits(&mut self, values: &EditValues) {
        if let Some(label) = values.get("label").and_then(|v| v.as_text()) {
            self.label = label.to_string();
        }
        if let Some(required) = values.get("required").and_then(|v| v.as_bool()) {
            self.required = required;
        }

        let new_choices = values.get("choices").and_then(|v| v.as_list());

        match &mut self.variant {
            ControlVariant::Radio { choices } | ControlVariant::CheckBox { choices } => {
                if let Some(list) = new_choices {
                    *choices = list.to_vec();
                }
            }
            ControlVariant::DropDown { choices, allow_multiple } => {
                if let Some(list) = new_choices {
                    *choices = list.to_vec();
                }
                if let Some(multiple) = values.get("multiple").and_then(|v| v.as_bool()) {
                    *allow_multiple = multiple;
                }
            }
            ControlVariant::TimeChart { start_hour, end_hour, .. } => {
                if let Some(h) = values.get("startHour").and_then(|v| v.as_text()).and_then(parse_hour) {
                    *start_hour = h;
                }
                if let Some(h) = values.get("endHour").and_then(|v| v.as_text()).and_then(parse_hour) {
                    *end_hour = h;
                }
            }
            ControlVariant::Text | ControlVariant::File | ControlVariant::RichText => {}
        }
    }

    // ========================================================================
    // XML
    // ========================================================================

    /// Attributes this kind writes itself; user attributes never override them
    fn structural_attributes(&self) -> &'static [&'static str] {
        match self.variant {
            ControlVariant::TimeChart { .. } => &["start", "end", "value", "label", "required"],
            _ => &["label", "required"],
        }
    }

    pub fn to_xml(&self) -> XmlElement {
        let mut el = XmlElement::new(self.kind().tag());

        if let ControlVariant::TimeChart { start_hour, end_hour, value } = &self.variant {
            el.set_attr("start", &start_hour.to_string());
            el.set_attr("end", &end_hour.to_string());
            el.set_attr("name", &self.field_name());
            el.set_attr("value", value);
        } else {
            el.set_attr("name", &self.field_name());
        }
        el.set_attr("label", &self.label);
        el.set_attr("required", yes_no(self.required));

        if let ControlVariant::DropDown { allow_multiple, .. } = &self.variant {
            el.set_attr("multiple", if *allow_multiple { "true" } else { "false" });
        }

        for (k, v) in self.attributes.emittable(self.structural_attributes()) {
            el.set_attr(k, v);
        }

        if let Some(choices) = self.choices() {
            for choice in choices {
                let mut c = XmlElement::new("choice");
                c.push_text(choice);
                el.push_child(c);
            }
        }

        el
    }

    /// Build a detached control of `kind` from its element
    pub fn from_xml(kind: ControlKind, el: &XmlElement) -> Self {
        let mut control = Control::new(kind);
        control.label = el.attr("label").unwrap_or_default().to_string();
        control.required = parse_yes(el.attr("required"));

        match &mut control.variant {
            ControlVariant::Radio { choices } | ControlVariant::CheckBox { choices } => {
                *choices = read_choices(el);
            }
            ControlVariant::DropDown { choices, allow_multiple } => {
                *choices = read_choices(el);
                *allow_multiple = matches!(el.attr("multiple"), Some(m) if m == "true" || m == "multiple");
            }
            ControlVariant::TimeChart { start_hour, end_hour, value } => {
                *start_hour = el.attr("start").and_then(parse_hour).unwrap_or(HOUR_MIN);
                *end_hour = el.attr("end").and_then(parse_hour).unwrap_or(HOUR_MAX);
                *value = el.attr("value").unwrap_or_default().to_string();
            }
            ControlVariant::Text | ControlVariant::File | ControlVariant::RichText => {}
        }

        let structural = control.structural_attributes();
        for (k, v) in el.attributes() {
            if k != "name" && k != "multiple" && !structural.contains(&k)
                && control.attributes.set(k, v).is_err()
            {
                debug!("IMPORT: dropping attribute '{}' on <{}>", k, el.name());
            }
        }

        control
    }
}

fn read_choices(el: &XmlElement) -> Vec<String> {
    el.elements()
        .filter(|c| c.is("choice"))
        .map(|c| c.text())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fbgt_types::{PropertyKind, PropertyValue};

    fn edits(pairs: &[(&str, PropertyValue)]) -> EditValues {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn codes_follow_picker_order() {
        assert_eq!(ControlKind::from_code(2), Some(ControlKind::DropDown));
        assert_eq!(ControlKind::from_code(7), None);
        assert_eq!(ControlKind::RichText.code(), 6);
    }

    #[test]
    fn new_controls_are_detached() {
        let c = Control::new(ControlKind::Radio);
        assert_eq!(c.index(), None);
        assert_eq!(c.label, "Radio Buttons");
        assert_eq!(c.choices().map(|c| c.len()), Some(3));
    }

    #[test]
    fn editable_properties_per_kind() {
        let names = |k: ControlKind| -> Vec<&str> {
            Control::new(k).describe_editable_properties().iter().map(|p| p.name).collect()
        };
        assert_eq!(names(ControlKind::Text), ["label", "required"]);
        assert_eq!(names(ControlKind::Radio), ["label", "required", "choices"]);
        assert_eq!(names(ControlKind::DropDown), ["label", "required", "choices", "multiple"]);
        assert_eq!(names(ControlKind::TimeChart), ["label", "required", "startHour", "endHour"]);

        let tc = Control::new(ControlKind::TimeChart).describe_editable_properties();
        assert_eq!(tc[2].kind, PropertyKind::Number);
        assert_eq!(tc[3].value, PropertyValue::Text("23".to_string()));
    }

    #[test]
    fn apply_edits_copies_known_and_ignores_rest() {
        let mut c = Control::new(ControlKind::DropDown);
        c.attributes.set("size", "3").unwrap();
        c.apply_edits(&edits(&[
            ("label", PropertyValue::Text("Size".to_string())),
            ("required", PropertyValue::Bool(true)),
            ("choices", PropertyValue::List(vec!["S".to_string(), "M".to_string()])),
            ("multiple", PropertyValue::Bool(true)),
            ("bogus", PropertyValue::Bool(true)),
            ("index", PropertyValue::Text("4".to_string())),
        ]));

        assert_eq!(c.label, "Size");
        assert!(c.required);
        assert_eq!(c.variant, ControlVariant::DropDown {
            choices: vec!["S".to_string(), "M".to_string()],
            allow_multiple: true,
        });
        assert_eq!(c.index(), None);
        assert_eq!(c.attributes.get("size"), Some("3"));
    }

    #[test]
    fn apply_edits_ignores_wrong_shapes() {
        let mut c = Control::new(ControlKind::Text);
        c.apply_edits(&edits(&[
            ("label", PropertyValue::Bool(true)),
            ("required", PropertyValue::Text("yes".to_string())),
        ]));
        assert_eq!(c.label, "Text Box");
        assert!(!c.required);
    }

    #[test]
    fn time_chart_hours_from_edits() {
        let mut c = Control::new(ControlKind::TimeChart);
        c.apply_edits(&edits(&[
            ("startHour", PropertyValue::Text("8".to_string())),
            ("endHour", PropertyValue::Text("40".to_string())),
        ]));
        assert!(matches!(c.variant, ControlVariant::TimeChart { start_hour: 8, end_hour: 23, .. }));

        c.apply_edits(&edits(&[("startHour", PropertyValue::Text("x".to_string()))]));
        assert!(matches!(c.variant, ControlVariant::TimeChart { start_hour: 8, .. }));
    }

    #[test]
    fn radio_xml_shape() {
        let c = Control::new(ControlKind::Radio)
            .with_label("Favourite Color")
            .with_required(true)
            .with_choices(&["Red", "Blue", "Red"]);
        let el = c.to_xml();

        assert_eq!(el.name(), "radio");
        assert_eq!(el.attr("name"), Some("favourite_color[]"));
        assert_eq!(el.attr("label"), Some("Favourite Color"));
        assert_eq!(el.attr("required"), Some("yes"));
        let choices: Vec<String> = el.elements().map(|c| c.text()).collect();
        assert_eq!(choices, ["Red", "Blue", "Red"]);
    }

    #[test]
    fn time_chart_attribute_order() {
        let c = Control::new(ControlKind::TimeChart).with_label("Hours");
        let el = c.to_xml();
        let keys: Vec<&str> = el.attributes().map(|(k, _)| k).collect();
        assert_eq!(keys, ["start", "end", "name", "value", "label", "required"]);
        assert_eq!(el.attr("name"), Some("hours"));
    }

    #[test]
    fn restricted_attributes_never_emitted() {
        let mut c = Control::new(ControlKind::Text);
        c.attributes.set("type", "password").unwrap();
        c.attributes.set("Multiple", "x").unwrap();
        c.attributes.set("placeholder", "Your name").unwrap();
        let el = c.to_xml();

        assert_eq!(el.attr("type"), None);
        assert_eq!(el.attr("multiple"), None);
        assert_eq!(el.attr("placeholder"), Some("Your name"));
        assert_eq!(c.attributes.get("type"), Some("password"));
    }

    #[test]
    fn dropdown_multiple_attribute() {
        let mut c = Control::new(ControlKind::DropDown);
        assert_eq!(c.to_xml().attr("multiple"), Some("false"));
        c.attributes.set("multiple", "true").unwrap();
        assert_eq!(c.to_xml().attr("multiple"), Some("false"));
    }

    #[test]
    fn from_xml_reads_back() {
        let mut el = XmlElement::new("dropdown");
        el.set_attr("name", "ignored[]");
        el.set_attr("label", "Pick");
        el.set_attr("required", "yes");
        el.set_attr("multiple", "multiple");
        el.set_attr("data-x", "1");
        for t in ["One", "Two"] {
            let mut c = XmlElement::new("choice");
            c.push_text(t);
            el.push_child(c);
        }

        let c = Control::from_xml(ControlKind::DropDown, &el);
        assert_eq!(c.label, "Pick");
        assert!(c.required);
        assert_eq!(c.variant, ControlVariant::DropDown {
            choices: vec!["One".to_string(), "Two".to_string()],
            allow_multiple: true,
        });
        assert_eq!(c.attributes.get("data-x"), Some("1"));
        assert_eq!(c.attributes.get("name"), None);
        assert_eq!(c.attributes.len(), 1);
    }

    #[test]
    fn time_chart_from_xml_defaults_and_clamps() {
        let mut el = XmlElement::new("time-chart");
        el.set_attr("label", "Shift");
        el.set_attr("end", "30");
        el.set_attr("value", "9-17");

        let c = Control::from_xml(ControlKind::TimeChart, &el);
        assert_eq!(c.variant, ControlVariant::TimeChart {
            start_hour: 0,
            end_hour: 23,
            value: "9-17".to_string(),
        });
        assert!(!c.required);
        assert!(c.attributes.is_empty());
    }
}
