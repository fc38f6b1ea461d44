use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Settlement details extracted from a single claim page.
///
/// Built fresh for every request. String fields are either unset or hold
/// non-empty trimmed text; `tier_descriptions` is always present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct ClaimRecord {
    /// Total settlement fund, e.g. `$1,200,000`
    pub lawsuit_amount: Option<String>,
    /// Per-claimant cap, e.g. `$450`
    pub max_claim_amount: Option<String>,
    /// Line describing what proof a claimant must submit
    pub proof_requirement: Option<String>,
    /// Lines hinting at tiered payouts, in page order
    pub tier_descriptions: Vec<String>,
    /// Filing deadline; only populated when summarization is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_deadline: Option<String>,
}

impl ClaimRecord {
    /// Number of fields that carry a value
    pub fn populated_fields(&self) -> usize {
        [
            self.lawsuit_amount.is_some(),
            self.max_claim_amount.is_some(),
            self.proof_requirement.is_some(),
            !self.tier_descriptions.is_empty(),
            self.claim_deadline.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
    }
}

/// Body of `POST /scrape`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ScrapeRequest {
    /// Page describing the settlement
    #[schema(example = "https://www.example-settlement.com/")]
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_pascal_case_keys() {
        let record = ClaimRecord {
            lawsuit_amount: Some("$1,200,000".to_string()),
            ..Default::default()
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["LawsuitAmount"], "$1,200,000");
        assert!(json["MaxClaimAmount"].is_null());
        assert!(json["ProofRequirement"].is_null());
        assert_eq!(json["TierDescriptions"], serde_json::json!([]));
        // Deadline only appears once it has a value
        assert!(json.get("ClaimDeadline").is_none());
    }

    #[test]
    fn test_deadline_serialized_when_set() {
        let record = ClaimRecord {
            claim_deadline: Some("The deadline to file is March 3, 2025".to_string()),
            ..Default::default()
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["ClaimDeadline"], "The deadline to file is March 3, 2025");
    }

    #[test]
    fn test_populated_fields() {
        let mut record = ClaimRecord::default();
        assert_eq!(record.populated_fields(), 0);

        record.max_claim_amount = Some("$450".to_string());
        record.tier_descriptions.push("Tier 1: up to $50".to_string());
        assert_eq!(record.populated_fields(), 2);
    }
}
