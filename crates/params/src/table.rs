//! The ordered parameter table and its two-phase resolver.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{ParameterSet, ParamsError};

/// On-disk shape of the parameter document.
#[derive(Debug, Serialize, Deserialize)]
struct ParamsDocument {
    versions: Vec<ParameterSet>,
}

/// Validated rows, ordered by activation height.
#[derive(Debug, Clone)]
pub struct ParamsTable {
    rows: Vec<ParameterSet>,
}

impl ParamsTable {
    /// Builds a table, checking every row and that windows of one version do not overlap.
    pub fn new(mut rows: Vec<ParameterSet>) -> Result<Self, ParamsError> {
        if rows.is_empty() {
            return Err(ParamsError::Empty);
        }

        for row in &rows {
            if let Some(cap) = row.cap_height {
                if cap < row.activation_height {
                    return Err(ParamsError::InvalidWindow {
                        version: row.version,
                        activation: row.activation_height,
                        cap,
                    });
                }
            }
            if row.min_stake_amount > row.max_stake_amount {
                return Err(ParamsError::InvalidAmountRange {
                    version: row.version,
                });
            }
            if row.min_staking_duration > row.max_staking_duration {
                return Err(ParamsError::InvalidDurationRange {
                    version: row.version,
                });
            }
        }

        // Stable, so rows sharing an activation height keep document order.
        rows.sort_by_key(|row| row.activation_height);

        for (i, a) in rows.iter().enumerate() {
            let overlapping = rows[i + 1..].iter().find(|b| {
                b.version == a.version && b.activation_height <= a.window_end()
            });
            if let Some(b) = overlapping {
                return Err(ParamsError::OverlappingWindows {
                    version: a.version,
                    first: a.activation_height,
                    second: b.activation_height,
                });
            }
        }

        Ok(Self { rows })
    }

    pub fn from_json_str(s: &str) -> Result<Self, ParamsError> {
        let doc: ParamsDocument = serde_json::from_str(s)?;
        Self::new(doc.versions)
    }

    /// Loads a `global-params.json` style document.
    pub fn load(path: &Path) -> Result<Self, ParamsError> {
        let raw = fs::read_to_string(path).map_err(|source| ParamsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn rows(&self) -> &[ParameterSet] {
        &self.rows
    }

    /// Picks the row governing a payload of `version` seen at `height`.
    ///
    /// A row of the same version whose window contains the height wins.
    /// Otherwise the most recently activated row containing the height is
    /// returned whatever its version, so callers must compare
    /// [`ParameterSet::version`] against the payload themselves.
    pub fn resolve(&self, height: u64, version: u8) -> Option<&ParameterSet> {
        self.rows
            .iter()
            .find(|row| row.version == version && row.contains_height(height))
            .or_else(|| self.rows.iter().rev().find(|row| row.contains_height(height)))
    }
}

#[cfg(test)]
mod tests {
    use bitcoin::Amount;
    use proptest::prelude::*;

    use super::*;

    fn row(version: u8, activation: u64, cap: Option<u64>) -> ParameterSet {
        ParameterSet {
            version,
            activation_height: activation,
            cap_height: cap,
            min_stake_amount: Amount::from_sat(1_000),
            max_stake_amount: Amount::from_sat(10_000_000),
            min_staking_duration: 100,
            max_staking_duration: 100_000,
        }
    }

    fn sample_table() -> ParamsTable {
        ParamsTable::new(vec![
            row(0, 100, Some(199)),
            row(1, 200, Some(299)),
            row(2, 300, None),
        ])
        .unwrap()
    }

    #[test]
    fn test_exact_version_match() {
        let table = sample_table();
        assert_eq!(table.resolve(150, 0).unwrap().version, 0);
        assert_eq!(table.resolve(250, 1).unwrap().version, 1);
        assert_eq!(table.resolve(1_000_000, 2).unwrap().version, 2);
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let table = sample_table();
        assert_eq!(table.resolve(100, 0).unwrap().version, 0);
        assert_eq!(table.resolve(199, 0).unwrap().version, 0);
        assert_eq!(table.resolve(200, 1).unwrap().version, 1);
    }

    #[test]
    fn test_fallback_to_latest_containing_row() {
        let table = sample_table();
        // Version 0 at a height only version 1 covers.
        let resolved = table.resolve(250, 0).unwrap();
        assert_eq!(resolved.version, 1);
    }

    #[test]
    fn test_fallback_prefers_most_recent_activation() {
        let table = ParamsTable::new(vec![row(0, 100, None), row(1, 200, None)]).unwrap();
        assert_eq!(table.resolve(500, 7).unwrap().version, 1);
        assert_eq!(table.resolve(150, 7).unwrap().version, 0);
    }

    #[test]
    fn test_not_found_before_activation() {
        let table = sample_table();
        assert!(table.resolve(99, 0).is_none());
    }

    #[test]
    fn test_overlap_rejected() {
        let err = ParamsTable::new(vec![row(0, 100, Some(250)), row(0, 200, None)]).unwrap_err();
        assert!(matches!(
            err,
            ParamsError::OverlappingWindows {
                version: 0,
                first: 100,
                second: 200
            }
        ));
    }

    #[test]
    fn test_overlap_between_versions_allowed() {
        assert!(ParamsTable::new(vec![row(0, 100, None), row(1, 150, None)]).is_ok());
    }

    #[test]
    fn test_invalid_rows_rejected() {
        assert!(matches!(
            ParamsTable::new(vec![row(0, 100, Some(50))]),
            Err(ParamsError::InvalidWindow { .. })
        ));

        let mut bad_amount = row(0, 100, None);
        bad_amount.min_stake_amount = Amount::from_sat(20_000_000);
        assert!(matches!(
            ParamsTable::new(vec![bad_amount]),
            Err(ParamsError::InvalidAmountRange { version: 0 })
        ));

        assert!(matches!(ParamsTable::new(vec![]), Err(ParamsError::Empty)));
    }

    #[test]
    fn test_parse_global_params_document() {
        let doc = r#"{
            "versions": [
                {
                    "version": 0,
                    "activation_height": 857910,
                    "cap_height": 864789,
                    "tag": "62626e31",
                    "covenant_quorum": 6,
                    "unbonding_time": 1008,
                    "max_staking_amount": 50000000000,
                    "min_staking_amount": 500000,
                    "max_staking_time": 64000,
                    "min_staking_time": 64000,
                    "confirmation_depth": 10
                },
                {
                    "version": 1,
                    "activation_height": 864790,
                    "max_staking_amount": 500000000000,
                    "min_staking_amount": 500000,
                    "max_staking_time": 64000,
                    "min_staking_time": 64000
                }
            ]
        }"#;

        let table = ParamsTable::from_json_str(doc).unwrap();
        assert_eq!(table.rows().len(), 2);

        let v0 = table.resolve(860_000, 0).unwrap();
        assert_eq!(v0.cap_height, Some(864789));
        assert_eq!(v0.min_stake_amount, Amount::from_sat(500_000));
        assert_eq!(v0.max_staking_duration, 64000);

        assert!(table.resolve(900_000, 1).unwrap().cap_height.is_none());
    }

    proptest! {
        #[test]
        fn heights_in_one_window_resolve_to_same_row(
            a in 100u64..=199,
            b in 100u64..=199,
            version in 0u8..4,
        ) {
            let table = sample_table();
            prop_assert_eq!(table.resolve(a, version), table.resolve(b, version));
        }
    }
}
