use serde::{Deserialize, Serialize};

use crate::candidate::CandidateResult;

/// Output of the explainable reranking stage: a bounded, justified top-K
/// plus the named rejections. Every retained result carries a non-empty
/// justification; explainability is part of the contract, not logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurationOutput {
	pub top_results: Vec<CuratedResult>,
	pub rejected: Vec<RejectedResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CuratedResult {
	pub result: CandidateResult,
	pub score: f32,
	pub reasoning: String,
	pub why_relevant: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectedResult {
	pub name: String,
	pub reasoning: String,
}

impl CurationOutput {
	pub fn empty() -> Self {
		Self { top_results: Vec::new(), rejected: Vec::new() }
	}

	/// Degraded mode when the reasoning model is unavailable: the top-K by
	/// raw similarity, with fixed justification strings so the
	/// explainability invariant still holds.
	pub fn fallback_by_similarity(candidates: &[CandidateResult], max_results: u32) -> Self {
		let top_results = candidates
			.iter()
			.take(max_results as usize)
			.map(|candidate| CuratedResult {
				result: candidate.clone(),
				score: candidate.similarity,
				reasoning: "Ranked by vector similarity after a curation failure.".to_string(),
				why_relevant: "Closest match to the question by embedding distance.".to_string(),
			})
			.collect();

		Self { top_results, rejected: Vec::new() }
	}
}
