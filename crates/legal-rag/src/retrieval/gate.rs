//! Relevance gate deciding whether retrieved context is trustworthy

use crate::types::RetrievalHit;

/// Default minimum similarity of the best hit
pub const DEFAULT_MIN_SIMILARITY: f32 = 0.78;

/// Accepts a hit list only when its best similarity clears the threshold
#[derive(Debug, Clone, Copy)]
pub struct RelevanceGate {
    min_similarity: f32,
}

impl RelevanceGate {
    pub fn new(min_similarity: f32) -> Self {
        Self { min_similarity }
    }

    pub fn min_similarity(&self) -> f32 {
        self.min_similarity
    }

    /// Best similarity among `hits`, if any
    pub fn best_similarity(hits: &[RetrievalHit]) -> Option<f32> {
        hits.iter().map(|h| h.similarity).reduce(f32::max)
    }

    /// False for no hits; otherwise `max(similarity) >= min_similarity`
    pub fn is_relevant(&self, hits: &[RetrievalHit]) -> bool {
        match Self::best_similarity(hits) {
            Some(best) => best >= self.min_similarity,
            None => false,
        }
    }
}

impl Default for RelevanceGate {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_SIMILARITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(similarity: f32) -> RetrievalHit {
        RetrievalHit::new("text".into(), Some("s".into()), Some("f".into()), 1.0 - similarity)
    }

    #[test]
    fn test_no_hits_is_not_relevant() {
        assert!(!RelevanceGate::default().is_relevant(&[]));
    }

    #[test]
    fn test_best_hit_decides() {
        let gate = RelevanceGate::default();
        assert!(gate.is_relevant(&[hit(0.4), hit(0.9)]));
        assert!(!gate.is_relevant(&[hit(0.4), hit(0.7)]));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let gate = RelevanceGate::new(0.5);
        assert!(gate.is_relevant(&[hit(0.5)]));
        assert!(RelevanceGate::new(0.0).is_relevant(&[hit(0.0)]));
    }
}
