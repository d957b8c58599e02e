//! Unified planner configuration.
//!
//! Aggregates the per-module sections into one serde-friendly document
//! so callers can load everything from a single file.

use serde::{Deserialize, Serialize};

use crate::action::ActionSetConfig;
use crate::collision::CheckConfig;
use crate::grid::GridConfig;
use crate::lattice::LatticeConfig;
use crate::postprocess::ShortcutConfig;
use crate::search::SearchConfig;

/// All planner settings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PlanningConfig {
    /// Workspace grid section
    #[serde(default)]
    pub grid: GridConfig,
    /// Collision checking section
    #[serde(default)]
    pub check: CheckConfig,
    /// Lattice section
    #[serde(default)]
    pub lattice: LatticeConfig,
    /// Action set section
    #[serde(default)]
    pub actions: ActionSetConfig,
    /// Search schedule section
    #[serde(default)]
    pub search: SearchConfig,
    /// Path shortcutting section
    #[serde(default)]
    pub shortcut: ShortcutConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sections_agree() {
        let config = PlanningConfig::default();
        assert!(config.search.epsilon_start >= 1.0);
        assert!(config.lattice.discretization <= config.actions.short_delta);
        assert!(config.grid.validate().is_ok());
    }

    #[test]
    fn test_roundtrips_through_serde() {
        let config = PlanningConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: PlanningConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.search.epsilon_start, config.search.epsilon_start);
        assert_eq!(back.grid.resolution, config.grid.resolution);
    }
}
