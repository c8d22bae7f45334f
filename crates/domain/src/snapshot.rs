// Rust guideline compliant 2026-10-18

//! Transaction snapshot: the aggregate read across every backing store.
//!
//! Each sub-record is optional. `None` means "not fetched or fetch failed",
//! which the classifier treats differently from a present record whose
//! fields are all empty.

use serde::{Deserialize, Serialize};

use crate::Case;

/// Point-in-time read of one state-machine execution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowSnapshot {
    /// State machine type, e.g. `workflow_transfer_payment`.
    pub workflow_id: String,
    /// String-encoded numeric state code.
    pub state: String,
    /// Retry counter.
    pub attempt: i64,
    /// Unique execution identifier.
    pub run_id: String,
    /// Back-link restored by some rollback templates.
    pub prev_trans_id: Option<String>,
    /// Raw JSON payload of the execution.
    pub data: String,
}

impl WorkflowSnapshot {
    /// Parse [`data`](Self::data) and walk `path` through nested objects.
    ///
    /// Returns `None` when the payload is empty, is not JSON, or does not
    /// contain the path.
    #[must_use]
    pub fn data_field(&self, path: &[&str]) -> Option<serde_json::Value> {
        if self.data.trim().is_empty() {
            return None;
        }
        let mut value: serde_json::Value = serde_json::from_str(&self.data).ok()?;
        for key in path {
            value = value.get_mut(*key)?.take();
        }
        Some(value)
    }

    /// `true` when `workflow_id`, `state` and `attempt` satisfy `criteria`.
    #[must_use]
    pub fn matches(&self, criteria: &WorkflowCriteria<'_>) -> bool {
        criteria.workflow_id.is_none_or(|id| self.workflow_id == id)
            && criteria.state.is_none_or(|state| self.state == state)
            && criteria.attempt.is_none_or(|attempt| self.attempt == attempt)
    }
}

/// Criteria triple for picking one workflow out of a sequence.
///
/// `None` in any position accepts every value for that criterion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkflowCriteria<'a> {
    /// Required workflow id, or any.
    pub workflow_id: Option<&'a str>,
    /// Required state code, or any.
    pub state: Option<&'a str>,
    /// Required attempt, or any.
    pub attempt: Option<i64>,
}

impl<'a> WorkflowCriteria<'a> {
    /// Criteria that accept every workflow.
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// Require this workflow id.
    #[must_use]
    pub fn workflow(mut self, workflow_id: &'a str) -> Self {
        self.workflow_id = Some(workflow_id);
        self
    }

    /// Require this state code.
    #[must_use]
    pub fn state(mut self, state: &'a str) -> Self {
        self.state = Some(state);
        self
    }

    /// Require this attempt counter.
    #[must_use]
    pub fn attempt(mut self, attempt: i64) -> Self {
        self.attempt = Some(attempt);
        self
    }
}

/// Transfer row held by the payment engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferInfo {
    #[serde(rename = "type")]
    pub transfer_type: String,
    pub txn_subtype: String,
    pub txn_domain: String,
    pub transaction_id: String,
    pub reference_id: String,
    pub status: String,
    pub external_id: String,
    pub source_account_id: String,
    pub destination_account_id: String,
    pub amount: f64,
    pub created_at: String,
    pub updated_at: String,
    pub properties: String,
}

/// Payment engine view: one transfer and its workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentEngineInfo {
    pub transfers: TransferInfo,
    pub workflow: WorkflowSnapshot,
}

/// Internal auth or capture transaction in payment core.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InternalTxInfo {
    pub tx_id: String,
    pub group_id: String,
    pub tx_type: String,
    pub tx_status: String,
    pub error_code: String,
    pub error_msg: String,
    pub created_at: String,
    pub workflow: WorkflowSnapshot,
}

/// External transfer transaction in payment core.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalTxInfo {
    pub ref_id: String,
    pub group_id: String,
    pub tx_type: String,
    pub tx_status: String,
    pub created_at: String,
    pub workflow: WorkflowSnapshot,
}

/// Payment core view: the three transaction roles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentCoreInfo {
    pub internal_auth: InternalTxInfo,
    pub internal_capture: InternalTxInfo,
    pub external_transfer: ExternalTxInfo,
}

/// Fast adapter instruction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FastAdapterInfo {
    pub instruction_id: String,
    #[serde(rename = "type")]
    pub instruction_type: String,
    pub status: String,
    pub status_code: i64,
    pub cancel_reason_code: String,
    pub reject_reason_code: String,
    pub created_at: String,
}

/// RPP adapter view. A single transfer may own several workflow executions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RppAdapterInfo {
    pub req_biz_msg_id: String,
    pub partner_msg_id: String,
    pub partner_tx_id: String,
    pub end_to_end_id: String,
    pub status: String,
    pub created_at: String,
    pub info: String,
    /// `updated_at` of the credit transfer row, in UTC.
    pub credit_transfer_updated_at: Option<String>,
    pub workflow: Vec<WorkflowSnapshot>,
}

impl RppAdapterInfo {
    /// First workflow satisfying `criteria`, in fetch order.
    #[must_use]
    pub fn find_workflow(&self, criteria: &WorkflowCriteria<'_>) -> Option<&WorkflowSnapshot> {
        self.workflow.iter().find(|wf| wf.matches(criteria))
    }
}

/// Partnerpay charge row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChargeInfo {
    pub transaction_id: String,
    pub status: String,
    pub status_reason: String,
    pub status_reason_description: String,
    pub created_at: String,
    pub updated_at: String,
    pub error_code: String,
    pub error_msg: String,
}

/// Partnerpay engine view: one charge and its workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartnerpayEngineInfo {
    pub charge: ChargeInfo,
    pub workflow: WorkflowSnapshot,
}

// ---------------------------------------------------------------------------
// TransactionSnapshot
// ---------------------------------------------------------------------------

/// Aggregate handed to the classifier for one operator-supplied identifier.
///
/// `case` is write-once: see [`assign_case`](Self::assign_case).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionSnapshot {
    /// Identifier as typed by the operator.
    pub input_id: String,
    /// Resolved transaction identifier.
    pub transaction_id: String,
    pub payment_engine: Option<PaymentEngineInfo>,
    pub payment_core: Option<PaymentCoreInfo>,
    pub rpp_adapter: Option<RppAdapterInfo>,
    pub fast_adapter: Option<FastAdapterInfo>,
    pub partnerpay_engine: Option<PartnerpayEngineInfo>,
    #[serde(skip)]
    case: Case,
    #[serde(skip)]
    error: Option<String>,
}

impl TransactionSnapshot {
    /// Create an empty snapshot for `input_id` with every sub-record absent.
    #[must_use]
    pub fn new(input_id: impl Into<String>) -> Self {
        Self { input_id: input_id.into(), ..Self::default() }
    }

    /// Attach a payment-engine record.
    #[must_use]
    pub fn with_payment_engine(mut self, info: PaymentEngineInfo) -> Self {
        self.payment_engine = Some(info);
        self
    }

    /// Attach a payment-core record.
    #[must_use]
    pub fn with_payment_core(mut self, info: PaymentCoreInfo) -> Self {
        self.payment_core = Some(info);
        self
    }

    /// Attach an RPP adapter record.
    #[must_use]
    pub fn with_rpp_adapter(mut self, info: RppAdapterInfo) -> Self {
        self.rpp_adapter = Some(info);
        self
    }

    /// Attach a FAST adapter record.
    #[must_use]
    pub fn with_fast_adapter(mut self, info: FastAdapterInfo) -> Self {
        self.fast_adapter = Some(info);
        self
    }

    /// Attach a partnerpay-engine record.
    #[must_use]
    pub fn with_partnerpay_engine(mut self, info: PartnerpayEngineInfo) -> Self {
        self.partnerpay_engine = Some(info);
        self
    }

    /// Current classification.
    #[must_use]
    pub fn case(&self) -> Case {
        self.case
    }

    /// Record `case` unless a classification is already stored.
    ///
    /// Only an [`Case::Unclassified`] snapshot accepts a write. Returns the
    /// case held after the call.
    pub fn assign_case(&mut self, case: Case) -> Case {
        if self.case == Case::Unclassified {
            self.case = case;
        }
        self.case
    }

    /// Population failure recorded for this snapshot, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Record a population failure. The snapshot is excluded from SQL generation.
    pub fn record_error(&mut self, reason: impl Into<String>) {
        self.error = Some(reason.into());
    }
}

#[cfg(test)]
mod tests {
    use super::{RppAdapterInfo, TransactionSnapshot, WorkflowCriteria, WorkflowSnapshot};
    use crate::Case;

    fn wf(workflow_id: &str, state: &str, attempt: i64, run_id: &str) -> WorkflowSnapshot {
        WorkflowSnapshot {
            workflow_id: workflow_id.to_owned(),
            state: state.to_owned(),
            attempt,
            run_id: run_id.to_owned(),
            ..WorkflowSnapshot::default()
        }
    }

    // SN-T01: write-once case

    #[test]
    fn assign_case_writes_once() {
        let mut snap = TransactionSnapshot::new("tx-1");
        assert_eq!(snap.assign_case(Case::RppNoResponseResume), Case::RppNoResponseResume);
        assert_eq!(snap.assign_case(Case::PeTransferPayment210_0), Case::RppNoResponseResume);
        assert_eq!(snap.case(), Case::RppNoResponseResume);
    }

    #[test]
    fn not_found_is_also_final() {
        let mut snap = TransactionSnapshot::new("tx-1");
        snap.assign_case(Case::NotFound);
        assert_eq!(snap.assign_case(Case::RppNoResponseResume), Case::NotFound);
    }

    #[test]
    fn with_builders_keep_case_unclassified() {
        let snap = TransactionSnapshot::new("tx-1")
            .with_rpp_adapter(RppAdapterInfo::default())
            .with_payment_engine(super::PaymentEngineInfo::default());
        assert!(snap.rpp_adapter.is_some());
        assert!(snap.payment_engine.is_some());
        assert!(snap.payment_core.is_none());
        assert_eq!(snap.case(), Case::Unclassified);
        assert!(snap.error().is_none());
    }

    // SN-T02: criteria search

    #[test]
    fn find_workflow_returns_first_match() {
        let rpp = RppAdapterInfo {
            workflow: vec![
                wf("wf_ct_cashout", "900", 0, "a"),
                wf("wf_ct_qr_payment", "210", 0, "b"),
                wf("wf_ct_cashout", "210", 0, "c"),
            ],
            ..RppAdapterInfo::default()
        };
        let hit = rpp.find_workflow(&WorkflowCriteria::any().state("210").attempt(0));
        assert_eq!(hit.map(|w| w.run_id.as_str()), Some("b"));

        let hit = rpp.find_workflow(&WorkflowCriteria::any().workflow("wf_ct_cashout").state("210"));
        assert_eq!(hit.map(|w| w.run_id.as_str()), Some("c"));

        assert!(rpp.find_workflow(&WorkflowCriteria::any().state("101")).is_none());
    }

    #[test]
    fn wildcard_criteria_accept_any_attempt() {
        let rpp = RppAdapterInfo {
            workflow: vec![wf("wf_process_registry", "0", 7, "r")],
            ..RppAdapterInfo::default()
        };
        let hit = rpp.find_workflow(&WorkflowCriteria::any().workflow("wf_process_registry").state("0"));
        assert_eq!(hit.map(|w| w.run_id.as_str()), Some("r"));
    }

    // SN-T03: payload access

    #[test]
    fn data_field_walks_nested_objects() {
        let w = WorkflowSnapshot {
            data: r#"{"CreditTransfer":{"UpdatedAt":"2026-01-02 10:00:00"}}"#.to_owned(),
            ..WorkflowSnapshot::default()
        };
        assert_eq!(
            w.data_field(&["CreditTransfer", "UpdatedAt"]),
            Some(serde_json::Value::from("2026-01-02 10:00:00"))
        );
        assert_eq!(w.data_field(&["CreditTransfer", "Missing"]), None);
    }

    #[test]
    fn data_field_tolerates_garbage() {
        let w = WorkflowSnapshot { data: "not json".to_owned(), ..WorkflowSnapshot::default() };
        assert_eq!(w.data_field(&["State"]), None);
        assert_eq!(WorkflowSnapshot::default().data_field(&["State"]), None);
    }

    #[test]
    fn snapshot_deserializes_with_missing_sub_records() {
        let snap: TransactionSnapshot = serde_json::from_str(
            r#"{"input_id":"abc","rpp_adapter":{"workflow":[{"workflow_id":"wf_ct_cashout","state":"210","attempt":0,"run_id":"r1"}]}}"#,
        )
        .unwrap();
        assert!(snap.payment_core.is_none());
        assert_eq!(snap.rpp_adapter.unwrap().workflow[0].run_id, "r1");
        assert_eq!(snap.case, Case::Unclassified);
    }
}
