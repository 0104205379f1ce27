use crate::domain::model::Contact;
use std::collections::{BTreeMap, HashSet};

/// Fields a title grants. `None` leaves the contact's field as it was.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotation {
    pub powers: Option<Vec<String>>,
    pub abilities: Option<Vec<String>>,
}

impl Annotation {
    pub fn powers(powers: &[&str]) -> Self {
        Self {
            powers: Some(to_owned(powers)),
            abilities: None,
        }
    }

    pub fn with_abilities(mut self, abilities: &[&str]) -> Self {
        self.abilities = Some(to_owned(abilities));
        self
    }

    /// Overwrites rather than appends, so applying twice equals applying once.
    pub fn apply(&self, mut contact: Contact) -> Contact {
        if let Some(powers) = &self.powers {
            contact.powers = Some(powers.clone());
        }
        if let Some(abilities) = &self.abilities {
            contact.abilities = Some(abilities.clone());
        }
        contact
    }
}

fn to_owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Title → annotation lookup used by the `powers` operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerTable {
    entries: BTreeMap<String, Annotation>,
}

impl PowerTable {
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn with_entry(mut self, title: &str, annotation: Annotation) -> Self {
        self.entries.insert(title.to_string(), annotation);
        self
    }

    pub fn annotation_for(&self, title: &str) -> Option<&Annotation> {
        self.entries.get(title)
    }

    pub fn titles(&self) -> HashSet<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for PowerTable {
    fn default() -> Self {
        PowerTable::empty()
            .with_entry("Superman", Annotation::powers(&["Laser Eyes", "X-Ray Vision"]))
            .with_entry(
                "Scarecrow",
                Annotation::powers(&["Toxic Immunity"]).with_abilities(&["Pedagogy"]),
            )
    }
}
