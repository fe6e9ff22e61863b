//! # Channel Mapping Table
//!
//! Static table mapping host attribute names to engine channel names.
//!
//! The mapping is many-to-one: two host spellings may alias the same engine
//! channel (`Eccentricity` / `PhaseEccentricity`). The process-wide table is
//! built exactly once, on first use, and is read-only afterwards.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Host attribute name → engine channel name, in table order.
const DEFAULT_ENTRIES: &[(&str, &str)] = &[
    ("PointPosition", "Position"),
    ("Color", "Color"),
    ("Density", "Density"),
    ("Lighting", "Lighting"),
    ("MBlurTime", "MBlurTime"),
    ("Absorption", "Absorption"),
    ("Emission", "Emission"),
    ("PointNormal", "Normal"),
    ("Tangent", "Tangent"),
    ("PointVelocity", "Velocity"),
    // shader channels
    ("Eccentricity", "Eccentricity"),
    ("PhaseEccentricity", "Eccentricity"),
    ("SpecularPower", "SpecularPower"),
    ("SpecularLevel", "SpecularLevel"),
    ("DiffuseLevel", "DiffuseLevel"),
    ("GlintGlossiness", "GlintGlossiness"),
    ("GlintLevel", "GlintLevel"),
    ("GlintSize", "GlintSize"),
    ("Specular2Glossiness", "Specular2Glossiness"),
    ("Specular2Level", "Specular2Level"),
    ("Specular2Shift", "Specular2Shift"),
    ("SpecularGlossiness", "SpecularGlossiness"),
    ("SpecularShift", "SpecularShift"),
];

static GLOBAL: OnceLock<ChannelMappingTable> = OnceLock::new();

/// Immutable host → engine channel name table.
#[derive(Debug, Clone)]
pub struct ChannelMappingTable {
    entries: HashMap<&'static str, &'static str>,
}

impl ChannelMappingTable {
    /// Returns the process-wide table, building it on first call.
    #[must_use]
    pub fn global() -> &'static Self {
        GLOBAL.get_or_init(|| {
            tracing::debug!(entries = DEFAULT_ENTRIES.len(), "building channel mapping table");
            Self::from_entries(DEFAULT_ENTRIES)
        })
    }

    /// Builds a table from explicit `(host, engine)` pairs.
    ///
    /// Later pairs with the same host name replace earlier ones.
    #[must_use]
    pub fn from_entries(entries: &[(&'static str, &'static str)]) -> Self {
        Self {
            entries: entries.iter().copied().collect(),
        }
    }

    /// Resolves a host attribute name to its engine channel name.
    #[inline]
    #[must_use]
    pub fn resolve(&self, host_name: &str) -> Option<&'static str> {
        self.entries.get(host_name).copied()
    }

    /// Number of host names in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ChannelMappingTable {
    fn default() -> Self {
        Self::from_entries(DEFAULT_ENTRIES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renames() {
        let table = ChannelMappingTable::global();
        assert_eq!(table.resolve("PointPosition"), Some("Position"));
        assert_eq!(table.resolve("PointNormal"), Some("Normal"));
        assert_eq!(table.resolve("PointVelocity"), Some("Velocity"));
    }

    #[test]
    fn test_eccentricity_aliases() {
        let table = ChannelMappingTable::global();
        assert_eq!(table.resolve("Eccentricity"), Some("Eccentricity"));
        assert_eq!(table.resolve("PhaseEccentricity"), Some("Eccentricity"));
    }

    #[test]
    fn test_unknown_name() {
        assert_eq!(ChannelMappingTable::global().resolve("Orientation"), None);
        assert_eq!(ChannelMappingTable::global().resolve(""), None);
    }

    #[test]
    fn test_global_is_shared() {
        let a: *const ChannelMappingTable = ChannelMappingTable::global();
        let b: *const ChannelMappingTable = ChannelMappingTable::global();
        assert_eq!(a, b);
        assert_eq!(ChannelMappingTable::global().len(), DEFAULT_ENTRIES.len());
    }

    #[test]
    fn test_global_from_many_threads() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| ChannelMappingTable::global().resolve("Density")))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), Some("Density"));
        }
    }
}
