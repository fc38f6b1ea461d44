//! Heuristic extraction of settlement details from page text

pub mod rules;

use crate::model::{ClaimRecord, ExtractorConfig};

pub use rules::{Field, Rule, RuleTable, Scope, Selection, ValuePattern};

/// Applies a [`RuleTable`] to page text.
///
/// Extraction is a pure function of the input text: unmatched fields stay
/// unset, which is a normal outcome rather than an error.
#[derive(Debug, Clone)]
pub struct ClaimExtractor {
    table: RuleTable,
}

impl ClaimExtractor {
    pub fn new(table: RuleTable) -> Self {
        Self { table }
    }

    pub fn from_config(config: &ExtractorConfig, with_deadline: bool) -> Self {
        let table = RuleTable::from_config(config, with_deadline);
        if table.is_empty() {
            tracing::warn!("All extraction keyword sets are empty, every record will be blank");
        }
        tracing::debug!(rules = table.len(), with_deadline, "Extraction rule table built");
        Self::new(table)
    }

    pub fn extract(&self, text: &str) -> ClaimRecord {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        let lowered: Vec<String> = lines.iter().map(|line| line.to_lowercase()).collect();
        let blob = lowered.join(" ");

        let mut record = ClaimRecord::default();

        for rule in self.table.rules() {
            if rule.selection == Selection::FirstMatch && is_filled(&record, rule.field) {
                continue;
            }

            match (rule.scope, rule.selection) {
                (Scope::Blob, _) => {
                    if let Some(value) = rule.match_blob(&blob) {
                        assign(&mut record, rule.field, value);
                    }
                }
                (Scope::Lines, Selection::FirstMatch) => {
                    let first = lines
                        .iter()
                        .zip(&lowered)
                        .find_map(|(line, lower)| rule.match_line(line, lower));
                    if let Some(value) = first {
                        assign(&mut record, rule.field, value);
                    }
                }
                (Scope::Lines, Selection::CollectAll) => {
                    for (line, lower) in lines.iter().zip(&lowered) {
                        if let Some(value) = rule.match_line(line, lower) {
                            assign(&mut record, rule.field, value);
                        }
                    }
                }
            }
        }

        tracing::debug!(
            lines = lines.len(),
            populated_fields = record.populated_fields(),
            tier_descriptions = record.tier_descriptions.len(),
            "Extraction complete"
        );

        record
    }
}

fn is_filled(record: &ClaimRecord, field: Field) -> bool {
    match field {
        Field::LawsuitAmount => record.lawsuit_amount.is_some(),
        Field::MaxClaimAmount => record.max_claim_amount.is_some(),
        Field::ProofRequirement => record.proof_requirement.is_some(),
        Field::TierDescriptions => false,
        Field::ClaimDeadline => record.claim_deadline.is_some(),
    }
}

/// Store a value; scalar fields keep the first value they receive
fn assign(record: &mut ClaimRecord, field: Field, value: String) {
    let slot = match field {
        Field::TierDescriptions => {
            record.tier_descriptions.push(value);
            return;
        }
        Field::LawsuitAmount => &mut record.lawsuit_amount,
        Field::MaxClaimAmount => &mut record.max_claim_amount,
        Field::ProofRequirement => &mut record.proof_requirement,
        Field::ClaimDeadline => &mut record.claim_deadline,
    };

    if slot.is_none() {
        *slot = Some(value);
    }
}
