//! Function registry: the durable id -> descriptor table of one baseline.
//!
//! Ids are assigned during instrumentation and are what the trace runtime
//! reports. Persisted as `functionsMap.json`, a JSON object keyed by the
//! decimal id.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::elements::FunctionDescriptor;
use crate::error::{Result, RtsError};

pub const FUNCTIONS_MAP_FILE: &str = "functionsMap.json";

/// Numeric id emitted by instrumented code
pub type FunctionId = u64;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FunctionRegistry {
    entries: BTreeMap<FunctionId, FunctionDescriptor>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: FunctionId, descriptor: FunctionDescriptor) {
        self.entries.insert(id, descriptor);
    }

    pub fn get(&self, id: FunctionId) -> Option<&FunctionDescriptor> {
        self.entries.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FunctionId, &FunctionDescriptor)> {
        self.entries.iter().map(|(id, d)| (*id, d))
    }

    /// Every id registered for a structurally equal descriptor.
    ///
    /// More than one id can match when a file declares two functions with the
    /// same name and arity (e.g. in sibling scopes).
    pub fn resolve(&self, descriptor: &FunctionDescriptor) -> Vec<FunctionId> {
        self.entries
            .iter()
            .filter(|(_, d)| *d == descriptor)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        fs::write(
            dir.join(FUNCTIONS_MAP_FILE),
            serde_json::to_string_pretty(self)?,
        )?;
        Ok(())
    }

    /// Load `functionsMap.json` from `dir`; absent is a precondition failure.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(FUNCTIONS_MAP_FILE);
        if !path.exists() {
            return Err(RtsError::missing_artifact(
                &path,
                "run `semfora-rts baseline` first",
            ));
        }
        Ok(serde_json::from_str(&fs::read_to_string(&path)?)?)
    }
}

impl FromIterator<(FunctionId, FunctionDescriptor)> for FunctionRegistry {
    fn from_iter<T: IntoIterator<Item = (FunctionId, FunctionDescriptor)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
