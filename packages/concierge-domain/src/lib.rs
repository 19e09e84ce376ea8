pub mod candidate;
pub mod curation;
pub mod intent;
pub mod normalize;
pub mod plan;
pub mod query;
pub mod session;

pub use candidate::{
	CandidateResult, DomainId, apply_metadata_filters, dedup_by_identity, sort_candidates,
};
pub use curation::{CuratedResult, CurationOutput, RejectedResult};
pub use intent::{IntentKind, QueryIntent};
pub use normalize::normalize_question;
pub use plan::{TierPlan, build_tier_plan, domain_config};
pub use query::{MultiQuery, normalize_rewrites};
pub use session::{ConversationSession, Role, Turn, bounded_history};
