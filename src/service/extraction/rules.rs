//! Ordered keyword/pattern rules that populate a [`ClaimRecord`](crate::model::ClaimRecord)

use std::sync::LazyLock;

use regex::Regex;

use crate::model::ExtractorConfig;

/// `$` then either a separated digit group (`1,200,000`) or a plain digit run (`450`)
static CURRENCY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\s?(\d{1,3}(?:[,.]\d{3})+|\d+)").expect("currency pattern is valid")
});

static YEAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{4}\b").expect("year pattern is valid"));

/// Record field a rule writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    LawsuitAmount,
    MaxClaimAmount,
    ProofRequirement,
    TierDescriptions,
    ClaimDeadline,
}

/// How many matches a rule keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    FirstMatch,
    CollectAll,
}

/// What text a rule's keywords are matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Each trimmed, non-empty line on its own
    Lines,
    /// All lines lowercased and joined with spaces
    Blob,
}

/// How the value is taken once the keywords matched
#[derive(Debug, Clone)]
pub enum ValuePattern {
    /// First currency token on the line, normalized to `$<digits>`
    Currency,
    /// The line itself
    WholeLine,
    /// Span from a keyword match to the first four-digit year in the same sentence
    Span(Regex),
    /// A fixed sentence
    Canned(String),
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub field: Field,
    /// Lowercased trigger keywords; any one of them must occur
    pub keywords: Vec<String>,
    pub value: ValuePattern,
    pub selection: Selection,
    pub scope: Scope,
}

impl Rule {
    pub fn new(
        field: Field,
        keywords: &[String],
        value: ValuePattern,
        selection: Selection,
        scope: Scope,
    ) -> Self {
        let keywords = keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        Self {
            field,
            keywords,
            value,
            selection,
            scope,
        }
    }

    /// Check whether any keyword occurs in already-lowercased text
    pub fn triggers(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }

    /// Apply the rule to one line; `lowered` is the lowercased line
    pub fn match_line(&self, line: &str, lowered: &str) -> Option<String> {
        if !self.triggers(lowered) {
            return None;
        }

        match &self.value {
            ValuePattern::Currency => find_currency(line),
            ValuePattern::WholeLine => Some(line.to_string()),
            ValuePattern::Span(keyword) => span_to_year(keyword, line),
            ValuePattern::Canned(text) => Some(text.clone()),
        }
    }

    /// Apply the rule to the flattened page text
    pub fn match_blob(&self, blob: &str) -> Option<String> {
        if !self.triggers(blob) {
            return None;
        }

        match &self.value {
            ValuePattern::Canned(text) => Some(text.clone()),
            ValuePattern::Currency => find_currency(blob),
            ValuePattern::Span(keyword) => span_to_year(keyword, blob),
            // A whole blob is not a meaningful field value
            ValuePattern::WholeLine => None,
        }
    }
}

/// First currency token in `text`, normalized to `$` followed by the digits
pub fn find_currency(text: &str) -> Option<String> {
    CURRENCY_PATTERN
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| format!("${}", m.as_str()))
}

/// Build the case-insensitive matcher for a deadline keyword
fn deadline_pattern(keyword: &str) -> Option<Regex> {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return None;
    }

    let pattern = format!(r"(?i){}", regex::escape(keyword));
    match Regex::new(&pattern) {
        Ok(regex) => Some(regex),
        Err(e) => {
            tracing::warn!(keyword = %keyword, error = %e, "Invalid deadline keyword, rule disabled");
            None
        }
    }
}

/// Text from the first usable keyword match through the first year after it,
/// without crossing a sentence end
fn span_to_year(keyword: &Regex, text: &str) -> Option<String> {
    keyword.find_iter(text).find_map(|m| {
        let sentence = &text[m.start()..sentence_end(text, m.start())];
        let year = YEAR_PATTERN.find(sentence)?;
        let span = sentence[..year.end()].trim();
        (!span.is_empty()).then(|| span.to_string())
    })
}

/// Byte offset where the sentence containing `from` ends.
///
/// `.`, `!` and `?` end a sentence only at the end of the text or when
/// whitespace and then an uppercase letter follow, so `Jan. 5, 2025` and
/// `12.31.2025` stay in one sentence.
fn sentence_end(text: &str, from: usize) -> usize {
    for (idx, ch) in text[from..].char_indices() {
        if !matches!(ch, '.' | '!' | '?') {
            continue;
        }

        let end = from + idx;
        let rest = &text[end + ch.len_utf8()..];
        let next = rest.trim_start().chars().next();
        let spaced = rest.starts_with(char::is_whitespace);
        match next {
            None => return end,
            Some(c) if spaced && c.is_uppercase() => return end,
            _ => {}
        }
    }
    text.len()
}

/// Ordered rule table; rules for the same field are tried in order
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Build the table from configured keyword sets.
    ///
    /// The deadline rule is only included when `with_deadline` is set, which
    /// is the case when pages are condensed by the summarizer first.
    pub fn from_config(config: &ExtractorConfig, with_deadline: bool) -> Self {
        let mut rules = vec![
            Rule::new(
                Field::LawsuitAmount,
                &config.fund_keywords,
                ValuePattern::Currency,
                Selection::FirstMatch,
                Scope::Lines,
            ),
            Rule::new(
                Field::MaxClaimAmount,
                &config.max_claim_keywords,
                ValuePattern::Currency,
                Selection::FirstMatch,
                Scope::Lines,
            ),
        ];

        if let Some(canned) = &config.canned_proof {
            let text = canned.text.trim();
            if text.is_empty() {
                tracing::warn!("Canned proof text is empty, rule disabled");
            } else {
                rules.push(Rule::new(
                    Field::ProofRequirement,
                    &canned.keywords,
                    ValuePattern::Canned(text.to_string()),
                    Selection::FirstMatch,
                    Scope::Blob,
                ));
            }
        }

        rules.push(Rule::new(
            Field::ProofRequirement,
            &config.proof_keywords,
            ValuePattern::WholeLine,
            Selection::FirstMatch,
            Scope::Lines,
        ));

        rules.push(Rule::new(
            Field::TierDescriptions,
            &config.tier_keywords,
            ValuePattern::WholeLine,
            Selection::CollectAll,
            Scope::Lines,
        ));

        if with_deadline && let Some(pattern) = deadline_pattern(&config.deadline_keyword) {
            rules.push(Rule::new(
                Field::ClaimDeadline,
                std::slice::from_ref(&config.deadline_keyword),
                ValuePattern::Span(pattern),
                Selection::FirstMatch,
                Scope::Lines,
            ));
        }

        // A rule without keywords can never trigger
        rules.retain(|rule| !rule.keywords.is_empty());

        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CannedProofConfig;

    #[test]
    fn test_find_currency_with_separators() {
        assert_eq!(find_currency("Fund: $1,200,000 total"), Some("$1,200,000".to_string()));
        assert_eq!(find_currency("Fund: $ 3.500.000"), Some("$3.500.000".to_string()));
    }

    #[test]
    fn test_find_currency_plain_digits() {
        assert_eq!(find_currency("up to $450 each"), Some("$450".to_string()));
        assert_eq!(find_currency("$12.50 per claim"), Some("$12".to_string()));
    }

    #[test]
    fn test_find_currency_none() {
        assert_eq!(find_currency("no money mentioned, 1,000 people"), None);
        assert_eq!(find_currency("just a $ sign"), None);
    }

    #[test]
    fn test_default_table_order() {
        let table = RuleTable::from_config(&ExtractorConfig::default(), false);
        let fields: Vec<Field> = table.rules().iter().map(|r| r.field).collect();
        assert_eq!(
            fields,
            vec![
                Field::LawsuitAmount,
                Field::MaxClaimAmount,
                Field::ProofRequirement,
                Field::TierDescriptions,
            ]
        );
    }

    #[test]
    fn test_deadline_rule_only_when_requested() {
        let table = RuleTable::from_config(&ExtractorConfig::default(), true);
        let last = table.rules().last().unwrap();
        assert_eq!(last.field, Field::ClaimDeadline);
        assert_eq!(table.len(), 5);
    }

    #[test]
    fn test_canned_proof_precedes_line_rule() {
        let config = ExtractorConfig {
            canned_proof: Some(CannedProofConfig::default()),
            ..Default::default()
        };
        let table = RuleTable::from_config(&config, false);
        let proof_rules: Vec<&Rule> = table
            .rules()
            .iter()
            .filter(|r| r.field == Field::ProofRequirement)
            .collect();

        assert_eq!(proof_rules.len(), 2);
        assert_eq!(proof_rules[0].scope, Scope::Blob);
        assert!(matches!(proof_rules[0].value, ValuePattern::Canned(_)));
        assert_eq!(proof_rules[1].scope, Scope::Lines);
    }

    #[test]
    fn test_empty_keyword_sets_drop_rules() {
        let config = ExtractorConfig {
            max_claim_keywords: vec!["   ".to_string()],
            tier_keywords: vec![],
            ..Default::default()
        };
        let table = RuleTable::from_config(&config, false);
        assert!(table.rules().iter().all(|r| r.field != Field::MaxClaimAmount));
        assert!(table.rules().iter().all(|r| r.field != Field::TierDescriptions));
    }

    #[test]
    fn test_table_without_keywords_is_empty() {
        let config = ExtractorConfig {
            fund_keywords: vec![],
            max_claim_keywords: vec![],
            proof_keywords: vec![],
            tier_keywords: vec![],
            deadline_keyword: String::new(),
            canned_proof: None,
        };
        let table = RuleTable::from_config(&config, true);
        assert!(table.is_empty());
        assert!(!RuleTable::from_config(&ExtractorConfig::default(), false).is_empty());
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        let rule = Rule::new(
            Field::ProofRequirement,
            &["Proof of Purchase".to_string()],
            ValuePattern::WholeLine,
            Selection::FirstMatch,
            Scope::Lines,
        );
        let line = "PROOF OF PURCHASE is required";
        assert_eq!(
            rule.match_line(line, &line.to_lowercase()),
            Some(line.to_string())
        );
    }

    fn deadline(text: &str) -> Option<String> {
        let keyword = deadline_pattern("deadline").unwrap();
        span_to_year(&keyword, text)
    }

    #[test]
    fn test_deadline_span_stops_at_sentence_end() {
        assert_eq!(
            deadline("The deadline to submit a claim is June 30, 2025. Questions? Call us.").as_deref(),
            Some("deadline to submit a claim is June 30, 2025")
        );
        assert_eq!(deadline("The deadline is soon. Claims close in 2025"), None);
        assert_eq!(deadline("Deadline passed! Next round opens 2025"), None);
    }

    #[test]
    fn test_deadline_span_keeps_abbreviated_and_dotted_dates() {
        assert_eq!(
            deadline("Claim deadline: Jan. 5, 2025").as_deref(),
            Some("deadline: Jan. 5, 2025")
        );
        assert_eq!(
            deadline("Deadline: 12.31.2025").as_deref(),
            Some("Deadline: 12.31.2025")
        );
    }

    #[test]
    fn test_deadline_span_accepts_any_four_digit_year() {
        assert_eq!(
            deadline("Filing deadline is June 30, 1899").as_deref(),
            Some("deadline is June 30, 1899")
        );
    }

    #[test]
    fn test_deadline_span_tries_later_keyword_matches() {
        assert_eq!(
            deadline("Deadline TBD. The new deadline is March 1, 2026.").as_deref(),
            Some("deadline is March 1, 2026")
        );
    }
}
