//! Union consensus across detectors.

use std::collections::{BTreeMap, BTreeSet};

use anomaly_spi::{AnomalyError, AnomalyReport, AnomalyScoreSeries, ConsensusMerger, Result};
use tracing::debug;

/// A point flagged by any method enters the consensus. No voting and no
/// weighting.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnionConsensus;

impl ConsensusMerger for UnionConsensus {
    fn merge(&self, series: Vec<AnomalyScoreSeries>) -> Result<AnomalyReport> {
        let len = series
            .first()
            .map(AnomalyScoreSeries::len)
            .ok_or_else(|| AnomalyError::DetectionError("no detector produced scores".into()))?;
        if let Some(bad) = series.iter().find(|s| s.len() != len) {
            return Err(AnomalyError::invalid(
                "series",
                format!("{} covers {} points, expected {}", bad.method, bad.len(), len),
            ));
        }

        let mut consensus = BTreeSet::new();
        let mut method_confidence = BTreeMap::new();
        let mut per_method = BTreeMap::new();
        for s in series {
            if per_method.contains_key(&s.method) {
                return Err(AnomalyError::invalid(
                    "methods",
                    format!("method '{}' appears more than once", s.method),
                ));
            }
            consensus.extend(s.anomaly_indices());
            method_confidence.insert(s.method, s.confidence());
            per_method.insert(s.method, s);
        }
        debug!(
            methods = per_method.len(),
            consensus = consensus.len(),
            "Anomaly consensus merged"
        );

        Ok(AnomalyReport {
            per_method,
            consensus_indices: consensus.into_iter().collect(),
            method_confidence,
            failures: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anomaly_spi::DetectorKind;

    fn series(method: DetectorKind, flags: &[bool]) -> AnomalyScoreSeries {
        let scores = flags.iter().map(|&f| if f { 1.0 } else { 0.0 }).collect();
        AnomalyScoreSeries::new(method, scores, flags.to_vec(), 0.5)
    }

    #[test]
    fn test_union_and_confidence() {
        let hmm = series(DetectorKind::StateTransition, &[false, true, false, false]);
        let trend = series(DetectorKind::TrendDecomposition, &[false, true, false, true]);
        let report = UnionConsensus.merge(vec![hmm, trend]).unwrap();
        assert_eq!(report.consensus_indices, vec![1, 3]);
        assert_eq!(report.method_confidence[&DetectorKind::StateTransition], 0.25);
        assert_eq!(report.method_confidence[&DetectorKind::TrendDecomposition], 0.5);
    }

    #[test]
    fn test_consensus_is_superset_of_each_method() {
        let a = series(DetectorKind::StateTransition, &[true, false, true, false, false]);
        let b = series(DetectorKind::TrendDecomposition, &[false, false, true, false, true]);
        let report = UnionConsensus.merge(vec![a.clone(), b.clone()]).unwrap();
        for s in [a, b] {
            for i in s.anomaly_indices() {
                assert!(report.is_anomaly(i));
            }
        }
    }

    #[test]
    fn test_empty_input_fails() {
        assert!(matches!(
            UnionConsensus.merge(Vec::new()),
            Err(AnomalyError::DetectionError(_))
        ));
    }

    #[test]
    fn test_length_mismatch_fails() {
        let a = series(DetectorKind::StateTransition, &[true, false]);
        let b = series(DetectorKind::TrendDecomposition, &[true]);
        assert!(UnionConsensus.merge(vec![a, b]).is_err());
    }

    #[test]
    fn test_duplicate_method_fails() {
        let a = series(DetectorKind::StateTransition, &[true, false]);
        assert!(UnionConsensus.merge(vec![a.clone(), a]).is_err());
    }
}
