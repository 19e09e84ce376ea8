use std::collections::BTreeMap;

use concierge_config::{DomainConfig, Retrieval};

use crate::{
	candidate::DomainId,
	intent::{IntentKind, QueryIntent},
};

/// Which domains to query, at which embedding fidelity, and how many
/// results each may contribute. Domains are ordered primary first.
#[derive(Debug, Clone)]
pub struct TierPlan {
	pub domains: Vec<DomainId>,
	pub dimensions_by_domain: BTreeMap<DomainId, u32>,
	pub counts_by_domain: BTreeMap<DomainId, u32>,
}

impl TierPlan {
	pub fn total_count(&self) -> u32 {
		self.counts_by_domain.values().sum()
	}
}

pub fn domain_config(retrieval: &Retrieval, id: DomainId) -> &DomainConfig {
	match id {
		DomainId::Accommodation => &retrieval.domains.accommodation,
		DomainId::Tourism => &retrieval.domains.tourism,
		DomainId::Regulatory => &retrieval.domains.regulatory,
	}
}

/// Pure decision step: no I/O. Accommodation-flavored intents search the
/// structurally uniform inventory at the fast tier and keep most of the
/// budget; tourism intents mirror that; unclassified intents split the
/// budget across both so the pipeline always searches something.
pub fn build_tier_plan(
	retrieval: &Retrieval,
	intent: &QueryIntent,
	max_context_chunks: u32,
) -> TierPlan {
	let budget = max_context_chunks.max(1);
	let (primary, primary_ratio) = match intent.kind {
		IntentKind::InventoryComplete
		| IntentKind::SpecificUnit
		| IntentKind::FeatureInquiry
		| IntentKind::PricingInquiry => (DomainId::Accommodation, 0.9_f32),
		IntentKind::Tourism => (DomainId::Tourism, 0.9),
		IntentKind::General => (DomainId::Accommodation, 0.5),
	};
	let secondary = match primary {
		DomainId::Tourism => DomainId::Accommodation,
		_ => DomainId::Tourism,
	};

	let mut fallbacks = Vec::new();
	if intent.kind == IntentKind::General
		|| entities_overlap_vocabulary(
			&intent.expected_entities,
			&domain_config(retrieval, secondary).vocabulary,
		) {
		fallbacks.push(secondary);
	}
	if primary != DomainId::Regulatory
		&& secondary != DomainId::Regulatory
		&& entities_overlap_vocabulary(
			&intent.expected_entities,
			&domain_config(retrieval, DomainId::Regulatory).vocabulary,
		) {
		fallbacks.push(DomainId::Regulatory);
	}

	let mut primary_count =
		(((budget as f32) * primary_ratio).ceil() as u32).clamp(1, budget);
	let mut remaining = budget - primary_count;

	if remaining == 0 && !fallbacks.is_empty() && retrieval.always_include_secondary {
		// Short-circuit override: carve room for the fallback domains out of
		// the primary share, never past the budget.
		let carve = (fallbacks.len() as u32).min(primary_count.saturating_sub(1));
		primary_count -= carve;
		remaining = carve;
	}

	let mut counts = BTreeMap::new();
	let mut ordered = vec![primary];
	counts.insert(primary, primary_count);

	let mut open = fallbacks.len() as u32;
	for domain in fallbacks {
		if remaining == 0 {
			break;
		}
		let share = remaining.div_ceil(open.max(1));
		counts.insert(domain, share);
		ordered.push(domain);
		remaining -= share;
		open = open.saturating_sub(1);
	}

	let dimensions = ordered
		.iter()
		.map(|domain| (*domain, domain_config(retrieval, *domain).dimensions))
		.collect();

	TierPlan { domains: ordered, dimensions_by_domain: dimensions, counts_by_domain: counts }
}

fn entities_overlap_vocabulary(entities: &[String], vocabulary: &[String]) -> bool {
	entities.iter().any(|entity| {
		let entity = entity.trim().to_lowercase();
		if entity.is_empty() {
			return false;
		}
		vocabulary
			.iter()
			.any(|word| !word.is_empty() && (entity.contains(word) || word.contains(&entity)))
	})
}
