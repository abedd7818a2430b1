use std::collections::{BTreeMap, HashMap};

use crate::error::{KmcError, Result};

/// Label that matches any site type in a process and leaves it unchanged on update.
pub const WILDCARD_LABEL: &str = "*";
/// Id reserved for [`WILDCARD_LABEL`].
pub const WILDCARD_TYPE: u32 = 0;

/// Bidirectional map between type labels and the integer ids the engine uses.
#[derive(Debug, Clone, PartialEq)]
pub struct PossibleTypes {
    ids: HashMap<String, u32>,
    labels: BTreeMap<u32, String>,
}

impl PossibleTypes {
    /// Assign ids `1..` to the sorted unique labels. The wildcard always maps to 0.
    pub fn from_labels<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        let mut unique: Vec<&str> = labels
            .into_iter()
            .filter(|l| *l != WILDCARD_LABEL)
            .collect();
        unique.sort_unstable();
        unique.dedup();

        let mut ids = HashMap::with_capacity(unique.len() + 1);
        let mut by_id = BTreeMap::new();
        ids.insert(WILDCARD_LABEL.to_string(), WILDCARD_TYPE);
        by_id.insert(WILDCARD_TYPE, WILDCARD_LABEL.to_string());
        for (i, label) in unique.into_iter().enumerate() {
            let id = i as u32 + 1;
            ids.insert(label.to_string(), id);
            by_id.insert(id, label.to_string());
        }
        Self { ids, labels: by_id }
    }

    /// Take a user-supplied map. Ids must be unique and only the wildcard may use 0.
    pub fn from_map(map: HashMap<String, u32>) -> Result<Self> {
        let mut labels = BTreeMap::new();
        for (label, &id) in &map {
            if label.trim().is_empty() {
                return Err(KmcError::InvalidLabel(label.clone()));
            }
            if id == WILDCARD_TYPE && label != WILDCARD_LABEL {
                return Err(KmcError::InvalidTypeMap(format!(
                    "id {WILDCARD_TYPE} is reserved for the wildcard, got label {label:?}"
                )));
            }
            if let Some(prev) = labels.insert(id, label.clone()) {
                return Err(KmcError::InvalidTypeMap(format!(
                    "labels {prev:?} and {label:?} share id {id}"
                )));
            }
        }
        let mut ids = map;
        ids.entry(WILDCARD_LABEL.to_string()).or_insert(WILDCARD_TYPE);
        if ids[WILDCARD_LABEL] != WILDCARD_TYPE {
            return Err(KmcError::InvalidTypeMap(format!(
                "the wildcard must map to {WILDCARD_TYPE}"
            )));
        }
        labels.insert(WILDCARD_TYPE, WILDCARD_LABEL.to_string());
        Ok(Self { ids, labels })
    }

    pub fn id(&self, label: &str) -> Result<u32> {
        self.ids
            .get(label)
            .copied()
            .ok_or_else(|| KmcError::UnknownType(label.to_string()))
    }

    pub fn label(&self, id: u32) -> Option<&str> {
        self.labels.get(&id).map(String::as_str)
    }

    /// Ids of all concrete (non-wildcard) types, ascending.
    pub fn type_ids(&self) -> Vec<u32> {
        self.labels
            .keys()
            .copied()
            .filter(|&id| id != WILDCARD_TYPE)
            .collect()
    }

    pub fn as_map(&self) -> &HashMap<String, u32> {
        &self.ids
    }
}
