// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Scale Invariant

// Shared helpers and types
pub mod fbgc_core;
pub mod fbgt_types;
pub mod fbgx_xml;

// Form tree
pub mod fbgcl_control;
pub mod fbgo_container;
pub mod fbga_app;

// Session and document files
pub mod fbgs_session;
pub mod fbgfc_config;

pub use fbga_app::Application;
pub use fbgc_core::namesafe;
pub use fbgcl_control::{Control, ControlKind, ControlVariant};
pub use fbgo_container::{ChildMut, Container, Entry, Indexed, Page, Section};
pub use fbgs_session::{EditMode, FormBuilder};
pub use fbgt_types::{
    Change, ChangeKind, ContainerRef, EditValues, FormError, MutationError, NodeRef,
    PropertyDescriptor, PropertyKind, PropertyValue,
};
pub use fbgx_xml::{XmlDocument, XmlElement, XmlNode};
