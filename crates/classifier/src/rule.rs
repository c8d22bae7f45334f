// Rust guideline compliant 2026-10-18

//! Rules, conditions and the validated, read-only [`RuleCatalogue`].
//!
//! Rules are authored as plain data ([`Rule`], [`Condition`]) and compiled
//! once by [`RuleCatalogueBuilder::build`]: paths are parsed into
//! [`FieldPath`] accessors, operators into [`Operator`], and `regex`
//! patterns are compiled. In the default lenient mode a malformed condition
//! is kept and logged; in strict mode it fails the build.

use std::cmp::Ordering;
use std::fmt;

use domain::{Case, TransactionSnapshot};
use regex::Regex;

use crate::{ClassifierError, FieldPath, Value, catalogue};

// ---------------------------------------------------------------------------
// Operator
// ---------------------------------------------------------------------------

/// Comparison applied by a [`Condition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Lt,
    Gt,
    In,
    NotIn,
    Regex,
    Contains,
}

impl Operator {
    /// Parse an operator name such as `eq` or `not_in`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "eq" => Operator::Eq,
            "ne" => Operator::Ne,
            "lt" => Operator::Lt,
            "gt" => Operator::Gt,
            "in" => Operator::In,
            "not_in" => Operator::NotIn,
            "regex" => Operator::Regex,
            "contains" => Operator::Contains,
            _ => return None,
        })
    }
}

// ---------------------------------------------------------------------------
// Authoring types
// ---------------------------------------------------------------------------

/// One `{field_path, operator, expected_value}` test, as authored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub field_path: String,
    pub operator: String,
    pub expected: Value,
}

impl Condition {
    #[must_use]
    pub fn new(
        field_path: impl Into<String>,
        operator: impl Into<String>,
        expected: impl Into<Value>,
    ) -> Self {
        Self {
            field_path: field_path.into(),
            operator: operator.into(),
            expected: expected.into(),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {:?}", self.field_path, self.operator, self.expected.to_string())
    }
}

/// An AND of conditions mapped to a [`Case`], optionally restricted to one region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub case: Case,
    pub description: String,
    /// Region code the rule is limited to. `None` applies everywhere.
    pub country: Option<String>,
    pub conditions: Vec<Condition>,
}

impl Rule {
    #[must_use]
    pub fn new(case: Case, description: impl Into<String>) -> Self {
        Self { case, description: description.into(), country: None, conditions: Vec::new() }
    }

    /// Restrict the rule to `code`.
    #[must_use]
    pub fn country(mut self, code: impl Into<String>) -> Self {
        self.country = Some(code.into());
        self
    }

    /// Append a condition.
    #[must_use]
    pub fn when(
        mut self,
        field_path: &str,
        operator: &str,
        expected: impl Into<Value>,
    ) -> Self {
        self.conditions.push(Condition::new(field_path, operator, expected));
        self
    }

    /// Append an `eq` condition.
    #[must_use]
    pub fn eq(self, field_path: &str, expected: impl Into<Value>) -> Self {
        self.when(field_path, "eq", expected)
    }

    /// Append a `ne` condition.
    #[must_use]
    pub fn ne(self, field_path: &str, expected: impl Into<Value>) -> Self {
        self.when(field_path, "ne", expected)
    }

    /// Append an `in` condition.
    #[must_use]
    pub fn one_of<const N: usize>(self, field_path: &str, expected: [&str; N]) -> Self {
        self.when(field_path, "in", expected)
    }

    fn applies_to(&self, region: &str) -> bool {
        self.country.as_deref().is_none_or(|code| code == region)
    }
}

// ---------------------------------------------------------------------------
// Compiled forms
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct CompiledCondition {
    path: Option<FieldPath>,
    operator: Option<Operator>,
    expected: Value,
    pattern: Option<Regex>,
}

impl CompiledCondition {
    /// Compile `condition`, collecting every problem found.
    fn compile(condition: &Condition) -> (Self, Vec<String>) {
        let mut flaws = Vec::new();
        let path = FieldPath::parse(&condition.field_path);
        if path.is_none() {
            flaws.push("unknown field path".to_owned());
        }
        let operator = Operator::parse(&condition.operator);
        if operator.is_none() {
            flaws.push(format!("unknown operator {:?}", condition.operator));
        }

        let mut pattern = None;
        match operator {
            Some(Operator::Regex) => match Regex::new(&condition.expected.to_string()) {
                Ok(re) => pattern = Some(re),
                Err(e) => flaws.push(format!("invalid pattern: {e}")),
            },
            Some(Operator::In | Operator::NotIn) if !matches!(condition.expected, Value::List(_)) => {
                flaws.push("membership test needs a list of values".to_owned());
            }
            _ => {}
        }

        if path.is_some_and(|p| p.is_state()) && !state_codes_parse(&condition.expected) {
            flaws.push(format!("state code {} is not an integer", condition.expected));
        }

        let compiled = Self { path, operator, expected: condition.expected.clone(), pattern };
        (compiled, flaws)
    }

    fn evaluate(&self, snapshot: &TransactionSnapshot) -> bool {
        let Some(operator) = self.operator else {
            return false;
        };
        let Some(value) = self.path.and_then(|p| p.resolve(snapshot)) else {
            // Unreachable field: only `eq ""` holds.
            return operator == Operator::Eq && self.expected.is_empty_text();
        };
        let Some(value) = value else {
            // Unset optional field: equal to nothing, not even "".
            return matches!(operator, Operator::Ne | Operator::NotIn);
        };
        match value {
            Value::List(items) if items.is_empty() => match operator {
                Operator::Eq => self.expected.is_empty_text(),
                Operator::Ne => !self.expected.to_string().is_empty(),
                _ => false,
            },
            Value::List(items) => items.iter().any(|item| self.test(operator, item)),
            scalar => self.test(operator, &scalar),
        }
    }

    fn test(&self, operator: Operator, actual: &Value) -> bool {
        match operator {
            Operator::Eq => actual.loosely_equals(&self.expected),
            Operator::Ne => !actual.loosely_equals(&self.expected),
            Operator::Lt => actual.compare(&self.expected) == Some(Ordering::Less),
            Operator::Gt => actual.compare(&self.expected) == Some(Ordering::Greater),
            Operator::In => match &self.expected {
                Value::List(options) => options.iter().any(|o| actual.loosely_equals(o)),
                _ => false,
            },
            Operator::NotIn => match &self.expected {
                Value::List(options) => !options.iter().any(|o| actual.loosely_equals(o)),
                _ => true,
            },
            Operator::Regex => {
                self.pattern.as_ref().is_some_and(|re| re.is_match(&actual.to_string()))
            }
            Operator::Contains => actual.to_string().contains(&self.expected.to_string()),
        }
    }
}

fn state_codes_parse(expected: &Value) -> bool {
    match expected {
        Value::List(items) => items.iter().all(|v| v.as_int().is_some()),
        // `eq ""` on a state is the absence check.
        other => other.is_empty_text() || other.as_int().is_some(),
    }
}

#[derive(Debug)]
struct CompiledRule {
    rule: Rule,
    conditions: Vec<CompiledCondition>,
}

impl CompiledRule {
    fn matches(&self, snapshot: &TransactionSnapshot) -> bool {
        self.conditions.iter().all(|c| c.evaluate(snapshot))
    }
}

// ---------------------------------------------------------------------------
// RuleCatalogue + builder
// ---------------------------------------------------------------------------

/// Ordered, read-only set of compiled rules.
///
/// Construct via [`RuleCatalogue::builder`] or [`RuleCatalogue::standard`].
/// Shareable across threads once built.
#[derive(Debug)]
pub struct RuleCatalogue {
    rules: Vec<CompiledRule>,
}

/// Builder for [`RuleCatalogue`].
#[derive(Debug, Default)]
pub struct RuleCatalogueBuilder {
    rules: Vec<Rule>,
    strict: bool,
}

impl RuleCatalogue {
    /// Create an empty, lenient builder.
    #[must_use]
    pub fn builder() -> RuleCatalogueBuilder {
        RuleCatalogueBuilder::default()
    }

    /// The production catalogue in lenient mode.
    ///
    /// # Errors
    ///
    /// Never fails in lenient mode; the `Result` mirrors [`RuleCatalogueBuilder::build`].
    pub fn standard() -> Result<Self, ClassifierError> {
        Self::builder().default_rules().build()
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// `true` when the catalogue holds no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First rule, in declaration order, that applies to `region` and whose
    /// conditions all hold.
    pub(crate) fn first_match(
        &self,
        snapshot: &TransactionSnapshot,
        region: &str,
    ) -> Option<&Rule> {
        self.rules
            .iter()
            .filter(|r| r.rule.applies_to(region))
            .find(|r| r.matches(snapshot))
            .map(|r| &r.rule)
    }
}

impl RuleCatalogueBuilder {
    /// Fail the build on malformed conditions instead of logging them.
    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Append one rule after those already added.
    #[must_use]
    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Append the production rule set.
    #[must_use]
    pub fn default_rules(mut self) -> Self {
        self.rules.extend(catalogue::default_rules());
        self
    }

    /// Compile and validate every rule.
    ///
    /// Malformed conditions (unknown path or operator, bad pattern,
    /// non-integer state code) are logged with `tracing::warn!` in lenient
    /// mode and evaluated with fail-closed semantics. Rules that can never
    /// match because an earlier rule covers them are always logged.
    ///
    /// # Errors
    ///
    /// In strict mode, returns [`ClassifierError::InvalidRule`] for the first
    /// malformed condition or for a rule without conditions.
    #[must_use = "the Result must be checked; use ? or unwrap"]
    pub fn build(self) -> Result<RuleCatalogue, ClassifierError> {
        let mut compiled = Vec::with_capacity(self.rules.len());
        for rule in self.rules {
            if rule.conditions.is_empty() {
                if self.strict {
                    return Err(ClassifierError::InvalidRule {
                        case: rule.case,
                        condition: String::new(),
                        reason: "rule has no conditions".to_owned(),
                    });
                }
                tracing::warn!("classifier.rule.unconditional: case={}", rule.case);
            }

            let mut conditions = Vec::with_capacity(rule.conditions.len());
            for condition in &rule.conditions {
                let (c, flaws) = CompiledCondition::compile(condition);
                if let Some(reason) = flaws.first() {
                    if self.strict {
                        return Err(ClassifierError::InvalidRule {
                            case: rule.case,
                            condition: condition.to_string(),
                            reason: reason.clone(),
                        });
                    }
                    for reason in &flaws {
                        tracing::warn!(
                            "classifier.rule.malformed: case={} condition={condition} reason={reason}",
                            rule.case
                        );
                    }
                }
                conditions.push(c);
            }
            compiled.push(CompiledRule { rule, conditions });
        }

        for (i, later) in compiled.iter().enumerate() {
            if let Some(earlier) = compiled[..i].iter().find(|e| shadows(&e.rule, &later.rule)) {
                tracing::warn!(
                    "classifier.rule.unreachable: case={} shadowed_by={}",
                    later.rule.case,
                    earlier.rule.case
                );
            }
        }

        tracing::debug!("classifier.catalogue.built: rules={}", compiled.len());
        Ok(RuleCatalogue { rules: compiled })
    }
}

/// `true` when `earlier` matches every snapshot `later` matches.
fn shadows(earlier: &Rule, later: &Rule) -> bool {
    let region_covers = match (&earlier.country, &later.country) {
        (None, _) => true,
        (Some(a), Some(b)) => a == b,
        (Some(_), None) => false,
    };
    region_covers && earlier.conditions.iter().all(|c| later.conditions.contains(c))
}

#[cfg(test)]
mod tests {
    use super::{Condition, CompiledCondition, Rule, RuleCatalogue};
    use crate::{ClassifierError, Value};
    use domain::{
        Case, FastAdapterInfo, PaymentEngineInfo, RppAdapterInfo, TransactionSnapshot,
        WorkflowSnapshot,
    };

    fn wf(workflow_id: &str, state: &str, attempt: i64) -> WorkflowSnapshot {
        WorkflowSnapshot {
            workflow_id: workflow_id.to_owned(),
            state: state.to_owned(),
            attempt,
            run_id: format!("{workflow_id}-{state}"),
            ..WorkflowSnapshot::default()
        }
    }

    fn rpp(workflows: Vec<WorkflowSnapshot>) -> TransactionSnapshot {
        TransactionSnapshot::new("tx")
            .with_rpp_adapter(RppAdapterInfo {
                status: "PROCESSING".to_owned(),
                workflow: workflows,
                ..RppAdapterInfo::default()
            })
    }

    fn pe(state: &str) -> TransactionSnapshot {
        TransactionSnapshot::new("tx")
            .with_payment_engine(PaymentEngineInfo {
                workflow: wf("workflow_transfer_payment", state, 0),
                ..PaymentEngineInfo::default()
            })
    }

    fn holds(path: &str, op: &str, expected: impl Into<Value>, snap: &TransactionSnapshot) -> bool {
        let (c, _) = CompiledCondition::compile(&Condition::new(path, op, expected));
        c.evaluate(snap)
    }

    // CO-T01: unreachable fields

    #[test]
    fn absent_record_matches_only_eq_empty() {
        let snap = TransactionSnapshot::new("tx");
        let path = "PaymentCore.InternalCapture.Workflow.WorkflowID";
        assert!(holds(path, "eq", "", &snap));
        assert!(!holds(path, "eq", "internal_payment_flow", &snap));
        assert!(!holds(path, "ne", "internal_payment_flow", &snap));
        assert!(!holds(path, "not_in", ["x"], &snap));
    }

    #[test]
    fn unknown_path_behaves_as_unreachable() {
        let snap = pe("210");
        assert!(holds("PaymentEngine.Workflow.Colour", "eq", "", &snap));
        assert!(!holds("PaymentEngine.Workflow.Colour", "ne", "red", &snap));
    }

    #[test]
    fn unset_optional_field_equals_nothing() {
        let snap = pe("210");
        let path = "PaymentEngine.Workflow.PrevTransID";
        assert!(!holds(path, "eq", "", &snap));
        assert!(!holds(path, "eq", "prev-1", &snap));
        assert!(holds(path, "ne", "", &snap));
        assert!(holds(path, "not_in", ["prev-1"], &snap));
        assert!(!holds(path, "in", ["prev-1"], &snap));

        let mut snap = snap;
        if let Some(pe) = snap.payment_engine.as_mut() {
            pe.workflow.prev_trans_id = Some(String::new());
        }
        assert!(holds(path, "eq", "", &snap));
    }

    // CO-T02: existential match over RPP workflows

    #[test]
    fn any_element_satisfies_sequence_condition() {
        let snap = rpp(vec![wf("wf_ct_cashout", "210", 0), wf("other", "999", 5)]);
        assert!(holds("RPPAdapter.Workflow.State", "eq", "210", &snap));
        assert!(holds("RPPAdapter.Workflow.State", "eq", 999, &snap));
        assert!(holds("RPPAdapter.Workflow.Attempt", "gt", 0, &snap));
        assert!(!holds("RPPAdapter.Workflow.State", "eq", "101", &snap));
        // Each element differs from "210" or not; one does, so `ne` holds.
        assert!(holds("RPPAdapter.Workflow.State", "ne", "210", &snap));
    }

    #[test]
    fn empty_sequence_matches_absence_checks() {
        let snap = rpp(vec![]);
        assert!(holds("RPPAdapter.Workflow.WorkflowID", "eq", "", &snap));
        assert!(holds("RPPAdapter.Workflow.WorkflowID", "ne", "wf_ct_cashout", &snap));
        assert!(!holds("RPPAdapter.Workflow.WorkflowID", "eq", "wf_ct_cashout", &snap));
        assert!(!holds("RPPAdapter.Workflow.WorkflowID", "in", ["wf_ct_cashout"], &snap));
    }

    // CO-T03: operators

    #[test]
    fn eq_compares_numeric_strings_numerically() {
        let snap = pe("0210");
        assert!(holds("PaymentEngine.Workflow.State", "eq", "210", &snap));
        assert!(holds("PaymentEngine.Workflow.State", "eq", 210, &snap));
        assert!(holds("PaymentEngine.Workflow.Attempt", "eq", "0", &snap));
    }

    #[test]
    fn lt_gt() {
        let snap = pe("210");
        assert!(holds("PaymentEngine.Workflow.State", "gt", "99", &snap));
        assert!(holds("PaymentEngine.Workflow.State", "lt", 300, &snap));
        assert!(!holds("PaymentEngine.Workflow.State", "lt", "210", &snap));
        assert!(holds("PaymentEngine.Workflow.WorkflowID", "gt", "workflow_a", &snap));
    }

    #[test]
    fn membership() {
        let snap = pe("220");
        assert!(holds("PaymentEngine.Workflow.State", "in", ["210", "220"], &snap));
        assert!(!holds("PaymentEngine.Workflow.State", "not_in", ["210", "220"], &snap));
        // Scalar expected value: `in` never holds, `not_in` always does.
        assert!(!holds("PaymentEngine.Workflow.State", "in", "220", &snap));
        assert!(holds("PaymentEngine.Workflow.State", "not_in", "220", &snap));
    }

    #[test]
    fn regex_and_contains_use_rendered_value() {
        let snap = TransactionSnapshot::new("tx")
            .with_fast_adapter(FastAdapterInfo {
                status: "FAILED_TIMEOUT".to_owned(),
                status_code: 504,
                ..FastAdapterInfo::default()
            });
        assert!(holds("FastAdapter.Status", "regex", "^FAILED", &snap));
        assert!(holds("FastAdapter.StatusCode", "regex", r"^5\d\d$", &snap));
        assert!(holds("FastAdapter.Status", "contains", "TIME", &snap));
        assert!(!holds("FastAdapter.Status", "contains", "time", &snap));
    }

    #[test]
    fn malformed_conditions_fail_closed() {
        let snap = pe("210");
        assert!(!holds("PaymentEngine.Workflow.State", "approx", "210", &snap));
        assert!(!holds("PaymentEngine.Workflow.WorkflowID", "regex", "([", &snap));
    }

    // CO-T04: catalogue validation

    #[test]
    fn lenient_build_keeps_malformed_rules() {
        let catalogue = RuleCatalogue::builder()
            .rule(Rule::new(Case::PeTransferPayment210_0, "typo").when(
                "PaymentEngine.Workflow.State",
                "equals",
                "210",
            ))
            .build()
            .unwrap();
        assert_eq!(catalogue.len(), 1);
        assert!(catalogue.first_match(&pe("210"), "").is_none());
    }

    #[test]
    fn strict_build_rejects_unknown_operator() {
        let result = RuleCatalogue::builder()
            .strict(true)
            .rule(Rule::new(Case::PeTransferPayment210_0, "typo").when(
                "PaymentEngine.Workflow.State",
                "equals",
                "210",
            ))
            .build();
        assert!(matches!(
            result,
            Err(ClassifierError::InvalidRule { case: Case::PeTransferPayment210_0, .. })
        ));
    }

    #[test]
    fn strict_build_rejects_non_numeric_state() {
        let result = RuleCatalogue::builder()
            .strict(true)
            .rule(Rule::new(Case::PeTransferPayment210_0, "bad").eq("PaymentEngine.Workflow.State", "2l0"))
            .build();
        assert!(matches!(result, Err(ClassifierError::InvalidRule { .. })));
    }

    #[test]
    fn strict_build_rejects_unknown_path_and_empty_rule() {
        let unknown = RuleCatalogue::builder()
            .strict(true)
            .rule(Rule::new(Case::PeTransferPayment210_0, "bad").eq("PaymentEngine.State", "210"))
            .build();
        assert!(matches!(unknown, Err(ClassifierError::InvalidRule { .. })));

        let empty = RuleCatalogue::builder()
            .strict(true)
            .rule(Rule::new(Case::PeTransferPayment210_0, "empty"))
            .build();
        assert!(matches!(empty, Err(ClassifierError::InvalidRule { .. })));
    }

    #[test]
    fn standard_catalogue_is_valid_in_strict_mode() {
        let catalogue = RuleCatalogue::builder().strict(true).default_rules().build().unwrap();
        assert!(!catalogue.is_empty());
    }

    // CO-T05: ordering and region filter

    #[test]
    fn first_rule_in_declaration_order_wins() {
        let catalogue = RuleCatalogue::builder()
            .rule(Rule::new(Case::PeTransferPayment210_0, "a").eq("PaymentEngine.Workflow.State", "210"))
            .rule(Rule::new(Case::PeStuckAtLimitCheck102_4, "b").ne("PaymentEngine.Workflow.State", ""))
            .build()
            .unwrap();
        let hit = catalogue.first_match(&pe("210"), "").map(|r| r.case);
        assert_eq!(hit, Some(Case::PeTransferPayment210_0));
        let hit = catalogue.first_match(&pe("102"), "").map(|r| r.case);
        assert_eq!(hit, Some(Case::PeStuckAtLimitCheck102_4));
    }

    #[test]
    fn country_rules_only_apply_to_their_region() {
        let catalogue = RuleCatalogue::builder()
            .rule(
                Rule::new(Case::PeTransferPayment210_0, "my only")
                    .country("my")
                    .eq("PaymentEngine.Workflow.State", "210"),
            )
            .build()
            .unwrap();
        assert!(catalogue.first_match(&pe("210"), "my").is_some());
        assert!(catalogue.first_match(&pe("210"), "sg").is_none());
        assert!(catalogue.first_match(&pe("210"), "").is_none());
    }

    #[test]
    fn shadowing_detection() {
        let broad = Rule::new(Case::RppNoResponseResume, "broad").eq("RPPAdapter.Workflow.State", "210");
        let narrow = Rule::new(Case::RppQrPaymentReject210_0, "narrow")
            .eq("RPPAdapter.Workflow.State", "210")
            .eq("RPPAdapter.Workflow.WorkflowID", "wf_ct_qr_payment");
        assert!(super::shadows(&broad, &narrow));
        assert!(!super::shadows(&narrow, &broad));
        assert!(!super::shadows(&broad.clone().country("sg"), &narrow.clone().country("my")));
    }
}
