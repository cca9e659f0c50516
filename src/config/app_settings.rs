// Copyright © 2024 Pathway

use std::collections::HashMap;
use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;

use log::{debug, warn};
use sysinfo::System;

use crate::error::Result;

use super::ConfigurationReader;

/// Setting that maps machine names to key prefixes:
/// `machine1/prefix1;machine2/prefix2`.
pub const MACHINE_PREFIXES_KEY: &str = "MachinePrefixes";

/// Facts about the machine the process runs on.
pub trait EnvironmentProvider: Send + Sync + Debug {
    fn machine_name(&self) -> Option<String>;
}

/// The real host, as reported by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnvironment;

impl EnvironmentProvider for SystemEnvironment {
    fn machine_name(&self) -> Option<String> {
        System::host_name()
    }
}

/// Reads `category.key` settings from a flat table of application settings.
///
/// When the `MachinePrefixes` setting names the current host, its prefix is
/// put in front of every looked up key, so one settings file can carry
/// per-machine sections: with `MachinePrefixes` set to `devbox/Dev.`, the
/// host `devbox` reads `Storage.Root` from the key `Dev.Storage.Root`.
#[derive(Debug, Clone)]
pub struct AppSettingsReader {
    settings: HashMap<String, String>,
    environment: Arc<dyn EnvironmentProvider>,
    machine_prefixes: Option<HashMap<String, String>>,
    current_prefix: Option<String>,
}

impl AppSettingsReader {
    pub fn new(settings: HashMap<String, String>) -> Self {
        Self::with_environment(settings, Arc::new(SystemEnvironment))
    }

    /// Takes the machine name from `environment` instead of the real host.
    pub fn with_environment(
        settings: HashMap<String, String>,
        environment: Arc<dyn EnvironmentProvider>,
    ) -> Self {
        let mut reader = Self {
            settings,
            environment,
            machine_prefixes: None,
            current_prefix: None,
        };
        reader.reset();
        reader
    }

    /// Parses a JSON object whose values are all strings.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: HashMap<String, String> = serde_json::from_str(json)?;
        Ok(Self::new(settings))
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        debug!("Loaded application settings from {}", path.display());
        Self::from_json_str(&json)
    }

    /// Re-reads the machine prefixes and selects the one of this host.
    pub fn reset(&mut self) {
        self.machine_prefixes = self
            .settings
            .get(MACHINE_PREFIXES_KEY)
            .map(|prefixes| parse_machine_prefixes(prefixes));
        self.current_prefix = self
            .environment
            .machine_name()
            .and_then(|machine| self.prefix_of(&machine));
    }

    /// Looks keys up without any machine prefix.
    pub fn ignore_machine_sections(&mut self) {
        self.machine_prefixes = None;
        self.current_prefix = None;
    }

    /// Uses the prefix of `machine` as if the process ran there.
    pub fn pretend_machine(&mut self, machine: &str) {
        self.current_prefix = self.prefix_of(machine);
    }

    pub fn current_prefix(&self) -> Option<&str> {
        self.current_prefix.as_deref()
    }

    pub fn machine_prefixes(&self) -> Option<&HashMap<String, String>> {
        self.machine_prefixes.as_ref()
    }

    fn prefix_of(&self, machine: &str) -> Option<String> {
        self.machine_prefixes
            .as_ref()?
            .get(&machine.to_lowercase())
            .cloned()
    }
}

fn parse_machine_prefixes(prefixes: &str) -> HashMap<String, String> {
    let mut result = HashMap::new();
    for section in prefixes.split(';') {
        let mut parts = section.split('/');
        match (parts.next(), parts.next()) {
            (Some(machine), Some(prefix))
                if !machine.trim().is_empty() && !prefix.trim().is_empty() =>
            {
                result.insert(machine.trim().to_lowercase(), prefix.trim().to_string());
            }
            _ if section.trim().is_empty() => {}
            _ => warn!("Ignoring malformed machine prefix section {section:?}"),
        }
    }
    result
}

impl ConfigurationReader for AppSettingsReader {
    fn get_configuration_value(&self, category: &str, key: &str) -> Option<String> {
        let prefix = self.current_prefix.as_deref().unwrap_or_default();
        self.settings
            .get(&format!("{prefix}{category}.{key}"))
            .cloned()
    }
}
