use std::{collections::HashMap, sync::Arc};

use serde_json::json;
use uuid::Uuid;

use concierge_domain::{DomainId, IntentKind};
use concierge_service::{
	AnswerRequest, ConciergeService, Providers, SearchGateway, SemanticCache, SessionStore,
};
use concierge_testkit::{
	FailingSearchGateway, FailingSessionStore, FixedEmbedding, MemorySessionStore, ScriptedChat,
	StaticSearchGateway, candidate, test_config,
};

fn service(
	chat: Arc<ScriptedChat>,
	search: Arc<dyn SearchGateway>,
	sessions: Arc<dyn SessionStore>,
) -> ConciergeService {
	let cfg = test_config();
	let cache = Arc::new(SemanticCache::new(&cfg.cache));
	let providers = Providers::new(Arc::new(FixedEmbedding), chat);

	ConciergeService::with_components(cfg, providers, search, sessions, cache)
}

fn request(question: &str, max_context_chunks: u32) -> AnswerRequest {
	AnswerRequest { question: question.to_string(), session_id: None, max_context_chunks }
}

fn feature_intent_reply() -> serde_json::Value {
	json!({
		"kind": "feature_inquiry",
		"confidence": 0.95,
		"reasoning": "Asks about the room's WiFi.",
		"expected_entities": ["unit manual", "wifi details"],
		"avoid_entities": ["tourism"],
		"metadata_filters": {}
	})
}

fn expansion_reply() -> serde_json::Value {
	json!({
		"queries": ["wifi network access details", "room internet credentials"],
		"strategy": "literal+experiential"
	})
}

#[tokio::test]
async fn wifi_question_routes_to_accommodation_and_returns_the_manual() {
	let chat = Arc::new(ScriptedChat::new(vec![
		feature_intent_reply(),
		expansion_reply(),
		json!({
			"top_results": [
				{
					"index": 1,
					"score": 0.97,
					"reasoning": "Contains the WiFi credentials.",
					"why_relevant": "The unit manual lists the network name and password."
				}
			],
			"rejected": []
		}),
	]));
	let mut results = HashMap::new();
	results.insert(
		DomainId::Accommodation,
		vec![candidate(DomainId::Accommodation, "Room 326 Manual", 0.82)],
	);
	results.insert(DomainId::Tourism, vec![candidate(DomainId::Tourism, "Blue Reef Dive", 0.7)]);
	let gateway = Arc::new(StaticSearchGateway::new(results));
	let service =
		service(chat.clone(), gateway.clone(), Arc::new(MemorySessionStore::new()));

	let response =
		service.answer(request("What is the WiFi password?", 4)).await.expect("answer failed");

	assert_eq!(response.intent.kind, IntentKind::FeatureInquiry);
	assert_eq!(response.curation.top_results.len(), 1);
	let top = &response.curation.top_results[0];
	assert_eq!(top.result.identity, "Room 326 Manual");
	assert_eq!(top.result.domain, DomainId::Accommodation);
	assert!(!top.reasoning.is_empty());
	assert!(!top.why_relevant.is_empty());
	// Three queries against the accommodation domain only; the tourism
	// procedure is never invoked for this plan.
	assert_eq!(gateway.calls(), 3);
	assert_eq!(chat.calls(), 3);
}

#[tokio::test]
async fn all_domain_failures_still_produce_a_well_formed_answer() {
	let chat = Arc::new(ScriptedChat::new(vec![
		json!({
			"kind": "tourism",
			"confidence": 0.9,
			"reasoning": "Asks about beaches.",
			"expected_entities": ["beach"],
			"avoid_entities": [],
			"metadata_filters": {}
		}),
		json!({ "queries": ["sandy beaches nearby"], "strategy": "literal" }),
	]));
	let service = service(
		chat.clone(),
		Arc::new(FailingSearchGateway),
		Arc::new(MemorySessionStore::new()),
	);

	let response =
		service.answer(request("best beaches nearby", 4)).await.expect("answer failed");

	assert!(response.curation.top_results.is_empty());
	assert!(response.curation.rejected.is_empty());
	// Curation short-circuits on the empty candidate list: two model calls
	// (intent + expansion), not three.
	assert_eq!(chat.calls(), 2);
	assert_eq!(response.performance_metrics["candidate_count"], 0);
	assert_eq!(response.performance_metrics["curation_fallback"], 0);
}

#[tokio::test]
async fn unknown_session_id_mints_a_fresh_session() {
	let chat = Arc::new(ScriptedChat::new(vec![
		feature_intent_reply(),
		expansion_reply(),
		json!({ "top_results": [], "rejected": [] }),
	]));
	let sessions = Arc::new(MemorySessionStore::new());
	let service = service(
		chat,
		Arc::new(StaticSearchGateway::new(HashMap::new())),
		sessions.clone(),
	);
	let supplied = Uuid::new_v4();

	let response = service
		.answer(AnswerRequest {
			question: "Does the room have a safe?".to_string(),
			session_id: Some(supplied),
			max_context_chunks: 4,
		})
		.await
		.expect("answer failed");

	assert_ne!(response.session_id, supplied);
	let minted = sessions.get(response.session_id).expect("session was not persisted");
	assert!(minted.history.is_empty());
}

#[tokio::test]
async fn overlapping_rewrites_dedup_to_max_similarity() {
	let chat = Arc::new(ScriptedChat::new(vec![
		feature_intent_reply(),
		expansion_reply(),
		json!({
			"top_results": [
				{ "index": 1, "score": 0.9, "reasoning": "Best fit.", "why_relevant": "Matches." },
				{ "index": 2, "score": 0.6, "reasoning": "Weaker fit.", "why_relevant": "Related." }
			],
			"rejected": []
		}),
	]));
	let mut results = HashMap::new();
	results.insert(
		DomainId::Accommodation,
		vec![
			candidate(DomainId::Accommodation, "Ocean Loft", 0.61),
			candidate(DomainId::Accommodation, "Ocean Loft", 0.83),
			candidate(DomainId::Accommodation, "Garden Studio", 0.5),
		],
	);
	let service = service(
		chat,
		Arc::new(StaticSearchGateway::new(results)),
		Arc::new(MemorySessionStore::new()),
	);

	let response =
		service.answer(request("Which unit has the best wifi setup?", 4)).await.expect("answer failed");

	// Three rewrites each returned the same identities; one entry per
	// identity survives, carrying the max similarity observed.
	assert_eq!(response.performance_metrics["candidate_count"], 2);
	let top = &response.curation.top_results[0];
	assert_eq!(top.result.identity, "Ocean Loft");
	assert_eq!(top.result.similarity, 0.83);
}

#[tokio::test]
async fn curation_output_is_bounded_by_the_chunk_budget() {
	let chat = Arc::new(ScriptedChat::new(vec![
		feature_intent_reply(),
		expansion_reply(),
		json!({
			"top_results": [
				{ "index": 1, "score": 0.9, "reasoning": "r", "why_relevant": "w" },
				{ "index": 2, "score": 0.8, "reasoning": "r", "why_relevant": "w" },
				{ "index": 3, "score": 0.7, "reasoning": "r", "why_relevant": "w" },
				{ "index": 4, "score": 0.6, "reasoning": "r", "why_relevant": "w" }
			],
			"rejected": []
		}),
	]));
	let mut results = HashMap::new();
	results.insert(
		DomainId::Accommodation,
		(1..=4)
			.map(|i| candidate(DomainId::Accommodation, &format!("Unit {i}"), 0.9 - i as f32 * 0.1))
			.collect(),
	);
	let service = service(
		chat,
		Arc::new(StaticSearchGateway::new(results)),
		Arc::new(MemorySessionStore::new()),
	);

	let response =
		service.answer(request("show me your wifi ready units", 2)).await.expect("answer failed");

	assert!(response.curation.top_results.len() <= 2);
	assert!(response.curation.top_results.iter().all(|r| !r.reasoning.is_empty()));
	assert!(response.curation.top_results.iter().all(|r| !r.why_relevant.is_empty()));
}

#[tokio::test]
async fn curation_provider_failure_degrades_to_similarity_order() {
	// Only two replies queued: the third (curation) call hits an exhausted
	// queue and behaves like a provider outage.
	let chat = Arc::new(ScriptedChat::new(vec![feature_intent_reply(), expansion_reply()]));
	let mut results = HashMap::new();
	results.insert(
		DomainId::Accommodation,
		vec![
			candidate(DomainId::Accommodation, "Sunset Suite", 0.9),
			candidate(DomainId::Accommodation, "Garden Studio", 0.6),
		],
	);
	let service = service(
		chat,
		Arc::new(StaticSearchGateway::new(results)),
		Arc::new(MemorySessionStore::new()),
	);

	let response =
		service.answer(request("rooms with fast wifi", 1)).await.expect("answer failed");

	assert_eq!(response.performance_metrics["curation_fallback"], 1);
	assert_eq!(response.curation.top_results.len(), 1);
	let top = &response.curation.top_results[0];
	assert_eq!(top.result.identity, "Sunset Suite");
	assert!(!top.reasoning.is_empty());
}

#[tokio::test]
async fn tourism_metadata_filters_drop_wrong_categories() {
	let chat = Arc::new(ScriptedChat::new(vec![
		json!({
			"kind": "tourism",
			"confidence": 0.95,
			"reasoning": "Asks for diving activities.",
			"expected_entities": ["diving centers", "activity"],
			"avoid_entities": ["accommodation"],
			"metadata_filters": { "category": ["Activity"] }
		}),
		json!({ "queries": ["scuba diving schools"], "strategy": "literal" }),
		json!({
			"top_results": [
				{ "index": 1, "score": 0.9, "reasoning": "A dive school.", "why_relevant": "Certified courses." }
			],
			"rejected": []
		}),
	]));
	let mut results = HashMap::new();
	let mut dive = candidate(DomainId::Tourism, "Blue Reef Dive", 0.8);
	dive.metadata = json!({ "category": "Activity" });
	let mut restaurant = candidate(DomainId::Tourism, "La Regatta", 0.85);
	restaurant.metadata = json!({ "category": "Restaurant" });
	results.insert(DomainId::Tourism, vec![dive, restaurant]);
	let service = service(
		chat,
		Arc::new(StaticSearchGateway::new(results)),
		Arc::new(MemorySessionStore::new()),
	);

	let response = service.answer(request("where can I go diving", 4)).await.expect("answer failed");

	// The higher-similarity restaurant was filtered out before curation.
	assert_eq!(response.performance_metrics["candidate_count"], 1);
	assert_eq!(response.curation.top_results[0].result.identity, "Blue Reef Dive");
}

#[tokio::test]
async fn repeated_paraphrase_is_served_from_the_semantic_cache() {
	let chat = Arc::new(ScriptedChat::new(vec![
		feature_intent_reply(),
		expansion_reply(),
		json!({
			"top_results": [
				{ "index": 1, "score": 0.97, "reasoning": "Has it.", "why_relevant": "The manual." }
			],
			"rejected": []
		}),
	]));
	let mut results = HashMap::new();
	results.insert(
		DomainId::Accommodation,
		vec![candidate(DomainId::Accommodation, "Room 326 Manual", 0.82)],
	);
	let service = service(
		chat.clone(),
		Arc::new(StaticSearchGateway::new(results)),
		Arc::new(MemorySessionStore::new()),
	);

	let first =
		service.answer(request("What is the WiFi password?", 4)).await.expect("answer failed");
	assert_eq!(first.performance_metrics["cache_hit"], 0);
	assert_eq!(chat.calls(), 3);

	let second =
		service.answer(request("Please share the wifi key", 4)).await.expect("answer failed");

	// Both questions contain phrases from the wifi_access group, so the
	// second bypasses classification, retrieval, and curation entirely.
	assert_eq!(chat.calls(), 3);
	assert_eq!(second.performance_metrics["cache_hit"], 1);
	assert_eq!(
		second.curation.top_results[0].result.identity,
		first.curation.top_results[0].result.identity
	);
}

#[tokio::test]
async fn record_exchange_appends_exactly_one_pair() {
	let chat = Arc::new(ScriptedChat::new(Vec::new()));
	let sessions = Arc::new(MemorySessionStore::new());
	let service = service(
		chat,
		Arc::new(StaticSearchGateway::new(HashMap::new())),
		sessions.clone(),
	);

	let session = service.resolve_session(None).await;
	service
		.record_exchange(session.session_id, "what's the wifi password", "It's seabreeze-326.")
		.await;

	let stored = sessions.get(session.session_id).expect("session missing");
	assert_eq!(stored.history.len(), 2);

	service.record_exchange(session.session_id, "and the safe code?", "Check the welcome letter.").await;
	let stored = sessions.get(session.session_id).expect("session missing");
	assert_eq!(stored.history.len(), 4);

	let window = service.history_window(&stored);
	assert_eq!(window.len(), 4);
	assert_eq!(window[0].content, "what's the wifi password");
}

#[tokio::test]
async fn session_store_outage_does_not_block_the_pipeline() {
	let chat = Arc::new(ScriptedChat::new(vec![
		feature_intent_reply(),
		expansion_reply(),
		json!({ "top_results": [], "rejected": [] }),
	]));
	let service = service(
		chat,
		Arc::new(StaticSearchGateway::new(HashMap::new())),
		Arc::new(FailingSessionStore),
	);

	let response =
		service.answer(request("Is there a hair dryer?", 4)).await.expect("answer failed");

	// A fresh unsaved session id is still handed back to the caller.
	assert!(!response.session_id.is_nil());
}

#[tokio::test]
async fn blank_question_is_rejected() {
	let chat = Arc::new(ScriptedChat::new(Vec::new()));
	let service = service(
		chat,
		Arc::new(StaticSearchGateway::new(HashMap::new())),
		Arc::new(MemorySessionStore::new()),
	);

	assert!(service.answer(request("   ", 4)).await.is_err());
	assert!(service.answer(request("valid question", 0)).await.is_err());
}
