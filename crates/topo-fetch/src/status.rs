//! User-facing feature status.

use std::fmt;

use topo_core::features::FeatureCounts;

pub const FEATURES_FAILED_TEXT: &str =
    "Roads, rivers or areas could not be loaded. Please try a smaller area or retry.";

/// Outcome of a feature fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureStatus {
    Loaded {
        counts: FeatureCounts,
        /// Number of requests the data was assembled from (1 or 4).
        tiles: usize,
    },
    Failed {
        message: String,
        /// The caller chose to continue without map data.
        ignored: bool,
    },
}

impl FeatureStatus {
    pub fn failed() -> Self {
        FeatureStatus::Failed {
            message: FEATURES_FAILED_TEXT.to_string(),
            ignored: false,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, FeatureStatus::Loaded { .. })
    }

    /// Mark a failure as acknowledged; no effect on a loaded status.
    pub fn ignore(&mut self) {
        if let FeatureStatus::Failed { ignored, .. } = self {
            *ignored = true;
        }
    }
}

impl fmt::Display for FeatureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureStatus::Loaded { counts, tiles } => {
                write!(
                    f,
                    "Map data loaded: Water {}, Rivers {}, Roads {}, Green {}, Labels {}",
                    counts.water, counts.rivers, counts.roads, counts.green, counts.labels
                )?;
                if *tiles > 1 {
                    write!(f, " | {tiles} tiles")?;
                }
                Ok(())
            }
            FeatureStatus::Failed { message, ignored } => {
                let suffix = if *ignored { " (ignored)" } else { "" };
                write!(f, "Map data missing{suffix}: {message}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let loaded = FeatureStatus::Loaded {
            counts: FeatureCounts {
                water: 1,
                rivers: 2,
                roads: 3,
                green: 4,
                labels: 5,
            },
            tiles: 4,
        };
        assert_eq!(
            loaded.to_string(),
            "Map data loaded: Water 1, Rivers 2, Roads 3, Green 4, Labels 5 | 4 tiles"
        );

        let mut failed = FeatureStatus::failed();
        assert!(!failed.is_loaded());
        failed.ignore();
        assert_eq!(
            failed.to_string(),
            format!("Map data missing (ignored): {FEATURES_FAILED_TEXT}")
        );
    }
}
