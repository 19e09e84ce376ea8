use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// What the question is really asking for. Drives every downstream
/// retrieval decision; produced once per question and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryIntent {
	pub kind: IntentKind,
	pub confidence: f32,
	pub reasoning: String,
	pub expected_entities: Vec<String>,
	pub avoid_entities: Vec<String>,
	pub metadata_filters: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
	InventoryComplete,
	SpecificUnit,
	FeatureInquiry,
	PricingInquiry,
	Tourism,
	General,
}

impl IntentKind {
	pub fn parse(raw: &str) -> Option<Self> {
		match raw {
			"inventory_complete" => Some(Self::InventoryComplete),
			"specific_unit" => Some(Self::SpecificUnit),
			"feature_inquiry" => Some(Self::FeatureInquiry),
			"pricing_inquiry" => Some(Self::PricingInquiry),
			"tourism" => Some(Self::Tourism),
			"general" => Some(Self::General),
			_ => None,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::InventoryComplete => "inventory_complete",
			Self::SpecificUnit => "specific_unit",
			Self::FeatureInquiry => "feature_inquiry",
			Self::PricingInquiry => "pricing_inquiry",
			Self::Tourism => "tourism",
			Self::General => "general",
		}
	}
}

impl QueryIntent {
	/// Safe default when classification fails or returns garbage. The
	/// pipeline proceeds with a broad search instead of erroring.
	pub fn fallback() -> Self {
		Self {
			kind: IntentKind::General,
			confidence: 0.0,
			reasoning: "Fallback after classification failure.".to_string(),
			expected_entities: Vec::new(),
			avoid_entities: Vec::new(),
			metadata_filters: BTreeMap::new(),
		}
	}

	/// Low-confidence classifications degrade to the general kind so a shaky
	/// guess never narrows the search.
	pub fn apply_confidence_floor(mut self, floor: f32) -> Self {
		if self.confidence < floor {
			self.kind = IntentKind::General;
		}
		self
	}
}
