use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use super::dataset::Dataset;

/// Shown in place of the checklist when a provider raised no flags.
pub const NO_FLAGS_MESSAGE: &str = "No automated flags produced.";

/// Ordered red-flag assessments, label -> raised.
///
/// Labels are unique; insertion order is kept through JSON round trips.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flags {
    entries: Vec<(String, bool)>,
}

impl Flags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a flag. Re-inserting a label updates it in place.
    pub fn insert(&mut self, label: impl Into<String>, raised: bool) {
        let label = label.into();
        match self.entries.iter_mut().find(|(l, _)| *l == label) {
            Some(entry) => entry.1 = raised,
            None => self.entries.push((label, raised)),
        }
    }

    pub fn get(&self, label: &str) -> Option<bool> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, raised)| *raised)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.entries.iter().map(|(l, r)| (l.as_str(), *r))
    }

    /// One `- ✅ label` / `- ❌ label` line per flag.
    pub fn render_checklist(&self) -> String {
        if self.is_empty() {
            return NO_FLAGS_MESSAGE.to_string();
        }

        self.iter()
            .map(|(label, raised)| {
                let mark = if raised { "✅" } else { "❌" };
                format!("- {} {}", mark, label)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl<S: Into<String>> FromIterator<(S, bool)> for Flags {
    fn from_iter<T: IntoIterator<Item = (S, bool)>>(iter: T) -> Self {
        let mut flags = Flags::new();
        for (label, raised) in iter {
            flags.insert(label, raised);
        }
        flags
    }
}

impl Serialize for Flags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, raised) in &self.entries {
            map.serialize_entry(label, raised)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Flags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FlagsVisitor;

        impl<'de> Visitor<'de> for FlagsVisitor {
            type Value = Flags;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of flag labels to booleans")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Flags, A::Error> {
                let mut flags = Flags::new();
                while let Some((label, raised)) = access.next_entry::<String, bool>()? {
                    flags.insert(label, raised);
                }
                Ok(flags)
            }
        }

        deserializer.deserialize_map(FlagsVisitor)
    }
}

/// Narrative, flags and exportable report produced for one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub narrative: String,
    pub flags: Flags,
    pub report: Dataset,
}

impl AnalysisResult {
    pub fn new(narrative: impl Into<String>, flags: Flags, report: Dataset) -> Self {
        Self {
            narrative: narrative.into(),
            flags,
            report,
        }
    }

    /// A result may only leave a provider with a non-blank narrative.
    pub fn has_narrative(&self) -> bool {
        !self.narrative.trim().is_empty()
    }
}
