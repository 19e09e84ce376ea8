use futures::future::join_all;
use tracing::{debug, warn};

use concierge_domain::{
	CandidateResult, DomainId, MultiQuery, QueryIntent, TierPlan, apply_metadata_filters,
	dedup_by_identity, domain_config, sort_candidates,
};

use crate::ConciergeService;

impl ConciergeService {
	/// Fan-out/fan-in over (domain, query) pairs. Embeddings are generated
	/// per domain at that domain's dimensionality; a failing domain
	/// degrades to an empty contribution and never fails the request. The
	/// merged order is deterministic regardless of completion order.
	pub(crate) async fn retrieve_candidates(
		&self,
		plan: &TierPlan,
		multi: &MultiQuery,
		intent: &QueryIntent,
	) -> Vec<CandidateResult> {
		let domain_futures = plan
			.domains
			.iter()
			.map(|domain| self.retrieve_domain(*domain, plan, multi, intent));
		let per_domain = join_all(domain_futures).await;

		let mut merged: Vec<CandidateResult> = per_domain.into_iter().flatten().collect();
		sort_candidates(&mut merged);
		merged.truncate(self.cfg.retrieval.max_candidates as usize);

		debug!(candidates = merged.len(), domains = plan.domains.len(), "Retrieval merged.");

		merged
	}

	async fn retrieve_domain(
		&self,
		domain: DomainId,
		plan: &TierPlan,
		multi: &MultiQuery,
		intent: &QueryIntent,
	) -> Vec<CandidateResult> {
		let domain_cfg = domain_config(&self.cfg.retrieval, domain);
		let dimensions =
			plan.dimensions_by_domain.get(&domain).copied().unwrap_or(domain_cfg.dimensions);
		let count = plan.counts_by_domain.get(&domain).copied().unwrap_or(0);
		if count == 0 {
			return Vec::new();
		}

		let embeddings = match self
			.providers
			.embedding
			.embed(&self.cfg.providers.embedding, &multi.queries, dimensions)
			.await
		{
			Ok(embeddings) if embeddings.len() == multi.queries.len() => embeddings,
			Ok(_) => {
				warn!(%domain, "Embedding provider returned mismatched vector count.");
				return Vec::new();
			},
			Err(err) => {
				warn!(%domain, error = %err, "Embedding failed; treating domain as empty.");
				return Vec::new();
			},
		};

		let searches = embeddings.iter().map(|embedding| {
			self.search.search(domain, embedding, domain_cfg.match_threshold, count)
		});
		let results = join_all(searches).await;

		let mut collected = Vec::new();
		for (idx, result) in results.into_iter().enumerate() {
			match result {
				Ok(candidates) => collected.extend(candidates),
				Err(err) => {
					warn!(
						%domain,
						query_index = idx,
						error = %err,
						"Domain search failed; dropping this call's results."
					);
				},
			}
		}

		let deduped = dedup_by_identity(collected);
		let filtered = apply_metadata_filters(
			deduped,
			&intent.metadata_filters,
			&domain_cfg.filter_fields,
		);

		debug!(%domain, kept = filtered.len(), "Domain retrieval complete.");

		filtered
	}
}
