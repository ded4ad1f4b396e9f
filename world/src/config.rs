//! Tunable parameters of the world model.

use serde::{Deserialize, Serialize};

const DEFAULT_GRID_COLUMNS: u32 = 10;
const DEFAULT_GRID_ROWS: u32 = 10;
const DEFAULT_PATH_BUDGET: usize = 8;

/// Largest column or row count a persisted layout may declare.
pub const MAX_GRID_DIMENSION: u32 = 1024;

/// Configuration applied when a world is created.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldConfig {
    /// Number of tile columns laid out in the grid.
    pub columns: u32,
    /// Number of tile rows laid out in the grid.
    pub rows: u32,
    /// Maximum number of grid searches resolved per tick.
    ///
    /// Requests rejected without searching do not count. Zero is treated as
    /// one so queued requests always make progress.
    pub path_budget_per_tick: usize,
}

impl WorldConfig {
    /// Returns a copy of the configuration with different grid dimensions.
    #[must_use]
    pub const fn with_dimensions(mut self, columns: u32, rows: u32) -> Self {
        self.columns = columns;
        self.rows = rows;
        self
    }

    pub(crate) fn search_budget(&self) -> usize {
        self.path_budget_per_tick.max(1)
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            columns: DEFAULT_GRID_COLUMNS,
            rows: DEFAULT_GRID_ROWS,
            path_budget_per_tick: DEFAULT_PATH_BUDGET,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_budget_still_allows_one_search() {
        let config = WorldConfig {
            path_budget_per_tick: 0,
            ..WorldConfig::default()
        };
        assert_eq!(config.search_budget(), 1);
    }

    #[test]
    fn with_dimensions_keeps_budget() {
        let config = WorldConfig::default().with_dimensions(3, 4);
        assert_eq!((config.columns, config.rows), (3, 4));
        assert_eq!(config.path_budget_per_tick, DEFAULT_PATH_BUDGET);
    }
}
