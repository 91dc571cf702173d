// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Scale Invariant

/// Form Document I/O
/// Handles working-document management, archiving, and path resolution
///
/// Responsibilities:
/// - Document directory and file path resolution (~/.config/formninja/application.xml)
/// - Archiving of replaced documents (application.xml.NNNNN)
/// - Deployment of the embedded default document
/// - File I/O for loading and saving documents

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::fbgt_types::FormError;

// ============================================================================
// SECTION 1: Embedded default document
// ============================================================================

const DEFAULT_DOCUMENT_XML: &str = include_str!("../application.default.xml");

const DOCUMENT_FILE: &str = "application.xml";
const ARCHIVE_FIRST_SUFFIX: u32 = 10000;

// ============================================================================
// SECTION 2: Path resolution
// ============================================================================

/// Directory holding the working document
pub fn config_dir() -> PathBuf {
    let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(".config");
    path.push("formninja");
    path
}

/// Resolve the standard working document path
pub fn config_path() -> PathBuf {
    document_path_in(&config_dir())
}

pub fn document_path_in(dir: &Path) -> PathBuf {
    dir.join(DOCUMENT_FILE)
}

// ============================================================================
// SECTION 3: Deployment and archiving
// ============================================================================

/// Move an existing file aside to `<name>.NNNNN`, first free suffix from 10000.
/// Returns the archive path, or None when there was nothing to archive.
pub fn archive_existing(path: &Path) -> Result<Option<PathBuf>, FormError> {
    if !path.exists() {
        return Ok(None);
    }

    let file_name = path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| DOCUMENT_FILE.to_string());

    let mut suffix = ARCHIVE_FIRST_SUFFIX;
    let mut archive_path;
    loop {
        archive_path = path.with_file_name(format!("{}.{}", file_name, suffix));
        if !archive_path.exists() {
            break;
        }
        suffix += 1;
    }

    fs::rename(path, &archive_path)?;
    info!("CONFIG: archived {} -> {}", file_name, archive_path.display());
    Ok(Some(archive_path))
}

/// Make sure `dir` holds a working document.
/// With `fresh`, any existing document is archived and replaced by the default.
pub fn ensure_default_document(dir: &Path, fresh: bool) -> Result<PathBuf, FormError> {
    fs::create_dir_all(dir).map_err(|e| {
        warn!("CONFIG: ERROR failed to create {}: {}", dir.display(), e);
        e
    })?;

    let path = document_path_in(dir);
    if fresh {
        archive_existing(&path)?;
    }

    if !path.exists() {
        fs::write(&path, DEFAULT_DOCUMENT_XML)?;
        info!("CONFIG: deployed embedded default to {}", path.display());
    }

    Ok(path)
}

// ============================================================================
// SECTION 4: Document file I/O
// ============================================================================

pub fn load_document_file(path: &Path) -> Result<String, FormError> {
    fs::read_to_string(path).map_err(|e| {
        warn!("CONFIG: ERROR failed to read {}: {}", path.display(), e);
        FormError::Io(e)
    })
}

/// Write `xml` to `path`, archiving the file it replaces
pub fn save_document_file(path: &Path, xml: &str) -> Result<(), FormError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    archive_existing(path)?;
    fs::write(path, xml)?;
    info!("CONFIG: saved {}", path.display());
    Ok(())
}

/// Embedded default document content
pub fn get_default_document() -> &'static str {
    DEFAULT_DOCUMENT_XML
}
