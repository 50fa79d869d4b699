// crates/datashed-store/src/sandbox.rs
// ============================================================================
// Module: Directory Sandbox
// Description: Root-confined mapping from database names to store paths.
// Purpose: Keep path construction out of the engine and inside one boundary.
// Dependencies: datashed-core
// ============================================================================

//! ## Overview
//! [`DirSandbox`] implements [`PathSandbox`] over one approved root
//! directory: every logical database maps to `<root>/<name>.db`. Database
//! names are already shape-validated by [`DatabaseName`], so no separator or
//! traversal component can reach this module; the sandbox still re-checks
//! the resolved path stays under the root and fails closed if it does not.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use datashed_core::DatabaseName;
use datashed_core::PathSandbox;
use datashed_core::SandboxError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// File extension applied to every store file.
const STORE_EXTENSION: &str = "db";

// ============================================================================
// SECTION: Sandbox
// ============================================================================

/// Path sandbox confined to one root directory.
///
/// # Invariants
/// - All resolved paths are direct children of the root.
/// - The root directory is created on first use.
#[derive(Debug, Clone)]
pub struct DirSandbox {
    /// Approved root directory.
    root: PathBuf,
}

impl DirSandbox {
    /// Creates a sandbox over the given root directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the sandbox root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Ensures the root directory exists.
    fn ensure_root(&self) -> Result<(), SandboxError> {
        fs::create_dir_all(&self.root)
            .map_err(|err| SandboxError::Root(format!("{}: {err}", self.root.display())))
    }
}

impl PathSandbox for DirSandbox {
    fn store_path(&self, name: &DatabaseName) -> Result<PathBuf, SandboxError> {
        self.ensure_root()?;
        let mut path = self.root.join(name.as_str());
        path.set_extension(STORE_EXTENSION);
        // DatabaseName's charset makes escapes unrepresentable; verify anyway.
        if path.parent() != Some(self.root.as_path()) {
            return Err(SandboxError::Escape(name.as_str().to_string()));
        }
        Ok(path)
    }

    fn list_store_files(&self) -> Result<Vec<PathBuf>, SandboxError> {
        self.ensure_root()?;
        let entries = fs::read_dir(&self.root)
            .map_err(|err| SandboxError::Root(format!("{}: {err}", self.root.display())))?;
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry
                .map_err(|err| SandboxError::Root(format!("{}: {err}", self.root.display())))?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some(STORE_EXTENSION)
                && path.is_file()
            {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
