//! Locating external converter executables.
//!
//! A tool is searched for in this order:
//! 1. an explicitly configured path (file, or directory holding the tool)
//! 2. well-known installation directories
//! 3. the system `PATH`

use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors from tool discovery.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The tool was not found anywhere.
    #[error("{tool} not found in configured path, common locations, or PATH")]
    NotFound {
        /// Tool name.
        tool: String,
    },

    /// A configured path exists but does not contain the tool.
    #[error("{tool} not found under configured path {path}")]
    InvalidExplicitPath {
        /// Tool name.
        tool: String,
        /// The configured path.
        path: PathBuf,
    },
}

/// How a tool was located.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryMethod {
    /// Explicitly configured.
    ExplicitConfig,
    /// Found in a common installation directory.
    CommonPath,
    /// Found via the `PATH` environment variable.
    SystemPath,
}

/// A located executable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolLocation {
    /// Full path to the executable.
    pub path: PathBuf,
    /// How it was found.
    pub method: DiscoveryMethod,
}

/// Search rules for one external tool.
#[derive(Debug, Clone)]
pub struct ToolDiscovery {
    tool: String,
    executables: Vec<String>,
    common_dirs: Vec<PathBuf>,
}

impl ToolDiscovery {
    /// Rules for the ODA File Converter used for DWG input.
    pub fn oda_file_converter() -> Self {
        let mut common_dirs = Vec::new();
        for var in ["ProgramFiles", "ProgramFiles(x86)"] {
            if let Some(pf) = std::env::var_os(var) {
                common_dirs.push(PathBuf::from(pf).join("ODA"));
            }
        }
        common_dirs.push(PathBuf::from("C:/Program Files/ODA"));
        common_dirs.push(PathBuf::from("/usr/bin"));
        common_dirs.push(PathBuf::from("/opt/ODAFileConverter"));
        common_dirs.push(PathBuf::from("/Applications/ODAFileConverter.app/Contents/MacOS"));

        Self {
            tool: "ODA File Converter".to_string(),
            executables: vec![
                "ODAFileConverter".to_string(),
                "ODAFileConverter.exe".to_string(),
            ],
            common_dirs,
        }
    }

    /// Rules for a plain command name, searched only on `PATH`.
    pub fn command(command: &str) -> Self {
        let mut executables = vec![command.to_string()];
        if cfg!(windows) && Path::new(command).extension().is_none() {
            executables.push(format!("{command}.exe"));
        }
        Self {
            tool: command.to_string(),
            executables,
            common_dirs: Vec::new(),
        }
    }

    /// Locate the tool.
    ///
    /// An empty `explicit` path skips straight to discovery. A non-empty
    /// one that does not hold the tool is an error; it is never silently
    /// replaced by a different installation.
    pub fn locate(&self, explicit: &Path) -> Result<ToolLocation, DiscoveryError> {
        if !explicit.as_os_str().is_empty() {
            return self.from_explicit_path(explicit);
        }

        if let Some(path) = self.search_common_dirs() {
            return Ok(ToolLocation {
                path,
                method: DiscoveryMethod::CommonPath,
            });
        }

        let path_var = std::env::var_os("PATH").unwrap_or_default();
        self.search_path_var(&path_var)
            .map(|path| ToolLocation {
                path,
                method: DiscoveryMethod::SystemPath,
            })
            .ok_or_else(|| DiscoveryError::NotFound {
                tool: self.tool.clone(),
            })
    }

    /// Validate an explicitly configured file or directory.
    pub fn from_explicit_path(&self, path: &Path) -> Result<ToolLocation, DiscoveryError> {
        let found = if path.is_file() {
            Some(path.to_path_buf())
        } else if path.is_dir() {
            self.find_in_dir(path, 1)
        } else {
            None
        };

        found
            .map(|path| ToolLocation {
                path,
                method: DiscoveryMethod::ExplicitConfig,
            })
            .ok_or_else(|| DiscoveryError::InvalidExplicitPath {
                tool: self.tool.clone(),
                path: path.to_path_buf(),
            })
    }

    fn search_common_dirs(&self) -> Option<PathBuf> {
        self.common_dirs
            .iter()
            .filter(|dir| dir.is_dir())
            // installers put the tool in a versioned sub-folder
            .find_map(|dir| self.find_in_dir(dir, 1))
    }

    /// Search the directories of a `PATH`-style variable.
    pub fn search_path_var(&self, path_var: &OsStr) -> Option<PathBuf> {
        std::env::split_paths(path_var).find_map(|dir| self.find_in_dir(&dir, 0))
    }

    fn find_in_dir(&self, dir: &Path, max_depth: usize) -> Option<PathBuf> {
        for exe in &self.executables {
            let candidate = dir.join(exe);
            if candidate.is_file() {
                debug!(tool = %self.tool, path = %candidate.display(), "Found executable");
                return Some(candidate);
            }
        }
        if max_depth == 0 {
            return None;
        }

        let mut subdirs: Vec<PathBuf> = std::fs::read_dir(dir)
            .ok()?
            .flatten()
            .map(|entry| entry.path())
            .filter(|p| p.is_dir())
            .collect();
        // newest version folder first
        subdirs.sort();
        subdirs.reverse();
        subdirs
            .iter()
            .find_map(|sub| self.find_in_dir(sub, max_depth - 1))
    }
}
