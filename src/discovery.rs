//! Enumeration of openable serial devices.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::port::PortOpener;
use crate::reader::SharedReader;

/// Upper bound on generated plus extra candidate names.
pub const MAX_CANDIDATES: usize = 1024;

/// The bounded set of device names probed by [`PortDiscovery`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateNamespace {
    /// Each prefix is combined with `first_index..first_index + count`.
    pub prefixes: Vec<String>,
    pub first_index: u32,
    pub count: u32,
    /// Names probed in addition to the generated ones.
    pub extra: Vec<String>,
    /// Also probe whatever the operating system reports.
    pub include_system_ports: bool,
}

impl Default for CandidateNamespace {
    #[cfg(target_os = "windows")]
    fn default() -> Self {
        Self {
            prefixes: vec!["COM".to_string()],
            first_index: 1,
            count: 256,
            extra: Vec::new(),
            include_system_ports: false,
        }
    }

    #[cfg(not(target_os = "windows"))]
    fn default() -> Self {
        Self {
            prefixes: vec!["/dev/ttyUSB".to_string(), "/dev/ttyACM".to_string()],
            first_index: 0,
            count: 16,
            extra: Vec::new(),
            include_system_ports: false,
        }
    }
}

impl CandidateNamespace {
    /// Number of configured names before deduplication, system ports excluded.
    pub fn configured_len(&self) -> usize {
        self.prefixes
            .len()
            .saturating_mul(self.count as usize)
            .saturating_add(self.extra.len())
    }

    /// Candidate names in probe order, without duplicates.
    ///
    /// Generated and extra names are capped at [`MAX_CANDIDATES`] even when
    /// the namespace was never validated.
    pub fn candidates(&self) -> impl Iterator<Item = String> + '_ {
        let generated = self.prefixes.iter().flat_map(move |prefix| {
            (0..self.count).map(move |i| format!("{prefix}{}", self.first_index.saturating_add(i)))
        });
        let system = if self.include_system_ports {
            system_port_names()
        } else {
            Vec::new()
        };

        let mut seen = HashSet::new();
        generated
            .chain(self.extra.iter().cloned())
            .take(MAX_CANDIDATES)
            .chain(system)
            .filter(move |name| seen.insert(name.clone()))
    }

    pub fn names(&self) -> Vec<String> {
        self.candidates().collect()
    }

    pub fn validate(&self) -> Result<(), String> {
        let generates = self.count > 0 && !self.prefixes.is_empty();
        if !generates && self.extra.is_empty() && !self.include_system_ports {
            return Err("candidate namespace is empty".to_string());
        }
        if self.configured_len() > MAX_CANDIDATES {
            return Err(format!(
                "candidate namespace names {} devices, at most {MAX_CANDIDATES} allowed",
                self.configured_len()
            ));
        }
        if self.prefixes.iter().any(|p| p.trim().is_empty()) {
            return Err("candidate prefixes must not be blank".to_string());
        }
        Ok(())
    }
}

fn system_port_names() -> Vec<String> {
    match serialport::available_ports() {
        Ok(ports) => ports.into_iter().map(|p| p.port_name).collect(),
        Err(e) => {
            warn!(error = %e, "Failed to enumerate system serial ports");
            Vec::new()
        }
    }
}

/// One openable device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortEntry {
    pub name: String,
    /// Held open by this process as the active device.
    pub active: bool,
}

/// Result of a discovery pass, in candidate order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PortListing {
    entries: Vec<PortEntry>,
}

impl PortListing {
    pub fn entries(&self) -> &[PortEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &PortEntry> {
        self.entries.iter()
    }

    /// `Some(active)` if `name` was listed.
    pub fn get(&self, name: &str) -> Option<bool> {
        self.entries.iter().find(|e| e.name == name).map(|e| e.active)
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn active(&self) -> Option<&str> {
        self.entries.iter().find(|e| e.active).map(|e| e.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for PortListing {
    type Item = PortEntry;
    type IntoIter = std::vec::IntoIter<PortEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Probes the candidate namespace for devices that can be opened.
#[derive(Clone)]
pub struct PortDiscovery {
    shared: SharedReader,
    opener: Arc<dyn PortOpener>,
    namespace: CandidateNamespace,
}

impl PortDiscovery {
    pub fn new(shared: SharedReader, opener: Arc<dyn PortOpener>, namespace: CandidateNamespace) -> Self {
        Self {
            shared,
            opener,
            namespace,
        }
    }

    pub fn namespace(&self) -> &CandidateNamespace {
        &self.namespace
    }

    /// List every openable candidate plus the active device.
    ///
    /// The active device is never probed; it is reported as active even when
    /// it falls outside the namespace, in which case it comes last. A switch
    /// that lands while probing is reflected in the returned flags.
    pub fn list_ports(&self) -> PortListing {
        let active = self.shared.active_port();
        let mut entries = Vec::new();

        for name in self.namespace.candidates() {
            if active.as_deref() == Some(name.as_str()) {
                entries.push(PortEntry { name, active: true });
            } else if self.opener.probe(&name) {
                entries.push(PortEntry { name, active: false });
            }
        }

        let final_active = self.shared.active_port();
        if final_active != active {
            debug!(
                before = ?active,
                after = ?final_active,
                "Active port changed during discovery"
            );
            for entry in &mut entries {
                entry.active = final_active.as_deref() == Some(entry.name.as_str());
            }
        }

        if let Some(name) = final_active {
            if !entries.iter().any(|e| e.name == name) {
                entries.push(PortEntry { name, active: true });
            }
        }

        debug!(found = entries.len(), "Serial port discovery finished");
        PortListing { entries }
    }
}

impl std::fmt::Debug for PortDiscovery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortDiscovery")
            .field("namespace", &self.namespace)
            .finish()
    }
}
