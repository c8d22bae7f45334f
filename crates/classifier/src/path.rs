// Rust guideline compliant 2026-10-18

//! Closed set of snapshot field paths.
//!
//! A dotted path such as `PaymentCore.InternalCapture.Workflow.State` is
//! parsed once, when a rule is registered, into a [`FieldPath`] accessor.
//! Resolution yields `Option<Option<Value>>`: the outer `None` means the
//! owning sub-record is absent, the inner `None` means the record is present
//! but the field holds no value.

use domain::{
    ChargeInfo, ExternalTxInfo, FastAdapterInfo, InternalTxInfo, PaymentCoreInfo, RppAdapterInfo,
    TransactionSnapshot, TransferInfo, WorkflowCriteria, WorkflowSnapshot, clock,
};

use crate::Value;

/// Cash-in workflow whose embedded timestamp is checked against the
/// credit transfer row.
const CASHIN_WORKFLOW: &str = "wf_ct_cashin";
const CASHIN_RETRY_STATE: &str = "100";

fn text(s: &str) -> Option<Value> {
    Some(Value::Text(s.to_owned()))
}

// ---------------------------------------------------------------------------
// Workflow fields
// ---------------------------------------------------------------------------

/// Field of a [`WorkflowSnapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkflowField {
    WorkflowId,
    State,
    Attempt,
    RunId,
    PrevTransId,
}

impl WorkflowField {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "WorkflowID" => WorkflowField::WorkflowId,
            "State" => WorkflowField::State,
            "Attempt" => WorkflowField::Attempt,
            "RunID" => WorkflowField::RunId,
            "PrevTransID" => WorkflowField::PrevTransId,
            _ => return None,
        })
    }

    fn read(self, wf: &WorkflowSnapshot) -> Option<Value> {
        match self {
            WorkflowField::WorkflowId => text(&wf.workflow_id),
            WorkflowField::State => text(&wf.state),
            WorkflowField::Attempt => Some(Value::Int(wf.attempt)),
            WorkflowField::RunId => text(&wf.run_id),
            WorkflowField::PrevTransId => wf.prev_trans_id.as_deref().and_then(text),
        }
    }
}

/// Which sub-record owns a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkflowOwner {
    PaymentEngine,
    InternalAuth,
    InternalCapture,
    ExternalTransfer,
    Rpp,
    Partnerpay,
}

// ---------------------------------------------------------------------------
// FieldPath
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum Accessor {
    Transfer(fn(&TransferInfo) -> Option<Value>),
    Internal(fn(&PaymentCoreInfo) -> &InternalTxInfo, fn(&InternalTxInfo) -> Option<Value>),
    External(fn(&ExternalTxInfo) -> Option<Value>),
    Fast(fn(&FastAdapterInfo) -> Option<Value>),
    Rpp(fn(&RppAdapterInfo) -> Option<Value>),
    Charge(fn(&ChargeInfo) -> Option<Value>),
    Workflow(WorkflowOwner, WorkflowField),
}

/// A validated path into a [`TransactionSnapshot`].
#[derive(Debug, Clone, Copy)]
pub struct FieldPath {
    accessor: Accessor,
}

impl FieldPath {
    /// Parse a dotted path. Returns `None` for a path outside the known set.
    #[must_use]
    pub fn parse(path: &str) -> Option<Self> {
        let segments: Vec<&str> = path.split('.').collect();
        let accessor = match segments.as_slice() {
            ["PaymentEngine", "Workflow", field] => {
                Accessor::Workflow(WorkflowOwner::PaymentEngine, WorkflowField::parse(field)?)
            }
            ["PaymentEngine", "Transfers", field] => Accessor::Transfer(transfer_field(field)?),
            ["PaymentCore", role, "Workflow", field] => {
                let owner = match *role {
                    "InternalAuth" => WorkflowOwner::InternalAuth,
                    "InternalCapture" => WorkflowOwner::InternalCapture,
                    "ExternalTransfer" => WorkflowOwner::ExternalTransfer,
                    _ => return None,
                };
                Accessor::Workflow(owner, WorkflowField::parse(field)?)
            }
            ["PaymentCore", "InternalAuth", field] => {
                Accessor::Internal(internal_auth, internal_field(field)?)
            }
            ["PaymentCore", "InternalCapture", field] => {
                Accessor::Internal(internal_capture, internal_field(field)?)
            }
            ["PaymentCore", "ExternalTransfer", field] => Accessor::External(external_field(field)?),
            ["FastAdapter", field] => Accessor::Fast(fast_field(field)?),
            ["RPPAdapter", "Workflow", field] => {
                Accessor::Workflow(WorkflowOwner::Rpp, WorkflowField::parse(field)?)
            }
            ["RPPAdapter", field] => Accessor::Rpp(rpp_field(field)?),
            ["PartnerpayEngine", "Workflow", field] => {
                Accessor::Workflow(WorkflowOwner::Partnerpay, WorkflowField::parse(field)?)
            }
            ["PartnerpayEngine", "Charge", field] => Accessor::Charge(charge_field(field)?),
            _ => return None,
        };
        Some(Self { accessor })
    }

    /// `true` when the path reads a workflow state code.
    #[must_use]
    pub fn is_state(&self) -> bool {
        matches!(self.accessor, Accessor::Workflow(_, WorkflowField::State))
    }

    /// Read the field from `snapshot`.
    ///
    /// RPP workflow fields resolve to a [`Value::List`] with one element per
    /// workflow, in fetch order.
    #[must_use]
    pub fn resolve(&self, snapshot: &TransactionSnapshot) -> Option<Option<Value>> {
        match self.accessor {
            Accessor::Transfer(read) => snapshot.payment_engine.as_ref().map(|pe| read(&pe.transfers)),
            Accessor::Internal(role, read) => snapshot.payment_core.as_ref().map(|pc| read(role(pc))),
            Accessor::External(read) => {
                snapshot.payment_core.as_ref().map(|pc| read(&pc.external_transfer))
            }
            Accessor::Fast(read) => snapshot.fast_adapter.as_ref().map(read),
            Accessor::Rpp(read) => snapshot.rpp_adapter.as_ref().map(read),
            Accessor::Charge(read) => snapshot.partnerpay_engine.as_ref().map(|pp| read(&pp.charge)),
            Accessor::Workflow(owner, field) => resolve_workflow(snapshot, owner, field),
        }
    }
}

fn resolve_workflow(
    snapshot: &TransactionSnapshot,
    owner: WorkflowOwner,
    field: WorkflowField,
) -> Option<Option<Value>> {
    let single = |wf: &WorkflowSnapshot| field.read(wf);
    match owner {
        WorkflowOwner::PaymentEngine => {
            snapshot.payment_engine.as_ref().map(|pe| single(&pe.workflow))
        }
        WorkflowOwner::InternalAuth => {
            snapshot.payment_core.as_ref().map(|pc| single(&pc.internal_auth.workflow))
        }
        WorkflowOwner::InternalCapture => {
            snapshot.payment_core.as_ref().map(|pc| single(&pc.internal_capture.workflow))
        }
        WorkflowOwner::ExternalTransfer => {
            snapshot.payment_core.as_ref().map(|pc| single(&pc.external_transfer.workflow))
        }
        WorkflowOwner::Partnerpay => {
            snapshot.partnerpay_engine.as_ref().map(|pp| single(&pp.workflow))
        }
        WorkflowOwner::Rpp => snapshot.rpp_adapter.as_ref().map(|rpp| {
            Some(Value::List(
                rpp.workflow.iter().map(|wf| field.read(wf).unwrap_or_else(Value::empty)).collect(),
            ))
        }),
    }
}

// ---------------------------------------------------------------------------
// Per-record field tables
// ---------------------------------------------------------------------------

fn internal_auth(pc: &PaymentCoreInfo) -> &InternalTxInfo {
    &pc.internal_auth
}

fn internal_capture(pc: &PaymentCoreInfo) -> &InternalTxInfo {
    &pc.internal_capture
}

fn transfer_field(name: &str) -> Option<fn(&TransferInfo) -> Option<Value>> {
    let read: fn(&TransferInfo) -> Option<Value> = match name {
        "Type" => |t| text(&t.transfer_type),
        "TxnSubtype" => |t| text(&t.txn_subtype),
        "TxnDomain" => |t| text(&t.txn_domain),
        "TransactionID" => |t| text(&t.transaction_id),
        "ReferenceID" => |t| text(&t.reference_id),
        "Status" => |t| text(&t.status),
        "ExternalID" => |t| text(&t.external_id),
        "SourceAccountID" => |t| text(&t.source_account_id),
        "DestinationAccountID" => |t| text(&t.destination_account_id),
        "Amount" => |t| Some(Value::Text(t.amount.to_string())),
        "CreatedAt" => |t| text(&t.created_at),
        "UpdatedAt" => |t| text(&t.updated_at),
        "Properties" => |t| text(&t.properties),
        _ => return None,
    };
    Some(read)
}

fn internal_field(name: &str) -> Option<fn(&InternalTxInfo) -> Option<Value>> {
    let read: fn(&InternalTxInfo) -> Option<Value> = match name {
        "TxID" => |t| text(&t.tx_id),
        "GroupID" => |t| text(&t.group_id),
        "TxType" => |t| text(&t.tx_type),
        "TxStatus" => |t| text(&t.tx_status),
        "ErrorCode" => |t| text(&t.error_code),
        "ErrorMsg" => |t| text(&t.error_msg),
        "CreatedAt" => |t| text(&t.created_at),
        _ => return None,
    };
    Some(read)
}

fn external_field(name: &str) -> Option<fn(&ExternalTxInfo) -> Option<Value>> {
    let read: fn(&ExternalTxInfo) -> Option<Value> = match name {
        "RefID" => |t| text(&t.ref_id),
        "GroupID" => |t| text(&t.group_id),
        "TxType" => |t| text(&t.tx_type),
        "TxStatus" => |t| text(&t.tx_status),
        "CreatedAt" => |t| text(&t.created_at),
        _ => return None,
    };
    Some(read)
}

fn fast_field(name: &str) -> Option<fn(&FastAdapterInfo) -> Option<Value>> {
    let read: fn(&FastAdapterInfo) -> Option<Value> = match name {
        "InstructionID" => |f| text(&f.instruction_id),
        "Type" => |f| text(&f.instruction_type),
        "Status" => |f| text(&f.status),
        "StatusCode" => |f| Some(Value::Int(f.status_code)),
        "CancelReasonCode" => |f| text(&f.cancel_reason_code),
        "RejectReasonCode" => |f| text(&f.reject_reason_code),
        "CreatedAt" => |f| text(&f.created_at),
        _ => return None,
    };
    Some(read)
}

fn rpp_field(name: &str) -> Option<fn(&RppAdapterInfo) -> Option<Value>> {
    let read: fn(&RppAdapterInfo) -> Option<Value> = match name {
        "ReqBizMsgID" => |r| text(&r.req_biz_msg_id),
        "PartnerMsgID" => |r| text(&r.partner_msg_id),
        "PartnerTxID" => |r| text(&r.partner_tx_id),
        "EndToEndID" => |r| text(&r.end_to_end_id),
        "Status" => |r| text(&r.status),
        "CreatedAt" => |r| text(&r.created_at),
        "Info" => |r| text(&r.info),
        "CreditTransferUpdatedAt" => |r| r.credit_transfer_updated_at.as_deref().and_then(text),
        "CashinWorkflowUpdatedAt" => |r| cashin_workflow_updated_at(r).map(Value::Text),
        "CashinRetryEligible" => |r| cashin_retry_eligible(r).map(|ok| Value::Text(ok.to_string())),
        "CreditTransferTimestampsMatch" => |r| {
            credit_transfer_timestamps_match(r).map(|same| Value::Text(same.to_string()))
        },
        _ => return None,
    };
    Some(read)
}

fn charge_field(name: &str) -> Option<fn(&ChargeInfo) -> Option<Value>> {
    let read: fn(&ChargeInfo) -> Option<Value> = match name {
        "TransactionID" => |c| text(&c.transaction_id),
        "Status" => |c| text(&c.status),
        "StatusReason" => |c| text(&c.status_reason),
        "StatusReasonDescription" => |c| text(&c.status_reason_description),
        "CreatedAt" => |c| text(&c.created_at),
        "UpdatedAt" => |c| text(&c.updated_at),
        "ErrorCode" => |c| text(&c.error_code),
        "ErrorMsg" => |c| text(&c.error_msg),
        _ => return None,
    };
    Some(read)
}

// ---------------------------------------------------------------------------
// Derived cash-in fields
// ---------------------------------------------------------------------------

/// First cash-in workflow stuck at state 100 with retries.
fn retried_cashin(rpp: &RppAdapterInfo) -> Option<&WorkflowSnapshot> {
    let criteria = WorkflowCriteria::any().workflow(CASHIN_WORKFLOW).state(CASHIN_RETRY_STATE);
    rpp.workflow.iter().find(|wf| wf.matches(&criteria) && wf.attempt > 0)
}

/// `CreditTransfer.UpdatedAt` (GMT+8) embedded in the retried cash-in workflow.
fn cashin_workflow_updated_at(rpp: &RppAdapterInfo) -> Option<String> {
    updated_at(retried_cashin(rpp)?)
}

fn updated_at(wf: &WorkflowSnapshot) -> Option<String> {
    let updated_at = wf.data_field(&["CreditTransfer", "UpdatedAt"])?;
    let updated_at = updated_at.as_str()?.trim();
    (!updated_at.is_empty()).then(|| updated_at.to_owned())
}

/// Whether the retried cash-in workflow can simply be retried.
///
/// A payload that is not JSON cannot be compared against the credit
/// transfer, so it is retried as is. An empty payload or one without
/// `CreditTransfer.UpdatedAt` is not eligible. `None` without a retried
/// cash-in workflow.
fn cashin_retry_eligible(rpp: &RppAdapterInfo) -> Option<bool> {
    let wf = retried_cashin(rpp)?;
    if wf.data.trim().is_empty() {
        return Some(false);
    }
    if wf.data_field(&[]).is_none() {
        return Some(true);
    }
    Some(updated_at(wf).is_some())
}

/// Whether the credit transfer row (UTC) and the workflow payload (GMT+8)
/// agree once converted. `None` when either side is missing or unparseable.
fn credit_transfer_timestamps_match(rpp: &RppAdapterInfo) -> Option<bool> {
    let workflow_side = cashin_workflow_updated_at(rpp)?;
    let row_side = clock::utc_to_gmt8(rpp.credit_transfer_updated_at.as_deref()?).ok()?;
    Some(workflow_side == row_side)
}

#[cfg(test)]
mod tests {
    use super::FieldPath;
    use crate::Value;
    use domain::{
        PaymentCoreInfo, PaymentEngineInfo, RppAdapterInfo, TransactionSnapshot, WorkflowSnapshot,
    };

    fn rpp_snapshot(workflows: Vec<WorkflowSnapshot>) -> TransactionSnapshot {
        TransactionSnapshot::new("tx")
            .with_rpp_adapter(RppAdapterInfo { workflow: workflows, ..RppAdapterInfo::default() })
    }

    fn cashin(attempt: i64, updated_at: &str) -> WorkflowSnapshot {
        WorkflowSnapshot {
            workflow_id: "wf_ct_cashin".to_owned(),
            state: "100".to_owned(),
            attempt,
            run_id: "c1".to_owned(),
            data: format!(r#"{{"CreditTransfer":{{"UpdatedAt":"{updated_at}"}}}}"#),
            ..WorkflowSnapshot::default()
        }
    }

    // FP-T01: parsing

    #[test]
    fn known_paths_parse() {
        for path in [
            "PaymentEngine.Workflow.State",
            "PaymentEngine.Transfers.ExternalID",
            "PaymentCore.InternalCapture.Workflow.WorkflowID",
            "PaymentCore.InternalCapture.TxStatus",
            "PaymentCore.ExternalTransfer.Workflow.Attempt",
            "RPPAdapter.Workflow.State",
            "RPPAdapter.Status",
            "FastAdapter.Status",
            "PartnerpayEngine.Charge.StatusReasonDescription",
            "PartnerpayEngine.Workflow.State",
        ] {
            assert!(FieldPath::parse(path).is_some(), "{path} should parse");
        }
    }

    #[test]
    fn unknown_paths_are_rejected() {
        for path in [
            "PaymentEngine.Workflow.Status",
            "PaymentCore.ExternalTransfer.TxID",
            "PaymentCore.Refund.Workflow.State",
            "RPPAdapter",
            "",
        ] {
            assert!(FieldPath::parse(path).is_none(), "{path} should not parse");
        }
    }

    #[test]
    fn state_paths_are_flagged() {
        assert!(FieldPath::parse("RPPAdapter.Workflow.State").unwrap().is_state());
        assert!(!FieldPath::parse("RPPAdapter.Status").unwrap().is_state());
    }

    // FP-T02: resolution

    #[test]
    fn absent_sub_record_is_unreachable() {
        let snap = TransactionSnapshot::new("tx");
        let path = FieldPath::parse("PaymentCore.InternalCapture.Workflow.WorkflowID").unwrap();
        assert_eq!(path.resolve(&snap), None);
    }

    #[test]
    fn present_empty_record_resolves_to_empty_text() {
        let snap = TransactionSnapshot::new("tx")
            .with_payment_core(PaymentCoreInfo::default());
        let path = FieldPath::parse("PaymentCore.InternalCapture.Workflow.WorkflowID").unwrap();
        assert_eq!(path.resolve(&snap), Some(Some(Value::empty())));
    }

    #[test]
    fn unset_optional_field_resolves_inner_none() {
        let snap = TransactionSnapshot::new("tx")
            .with_payment_engine(PaymentEngineInfo::default());
        let path = FieldPath::parse("PaymentEngine.Workflow.PrevTransID").unwrap();
        assert_eq!(path.resolve(&snap), Some(None));
    }

    #[test]
    fn rpp_workflow_fields_resolve_to_lists() {
        let snap = rpp_snapshot(vec![cashin(1, "x"), WorkflowSnapshot::default()]);
        let path = FieldPath::parse("RPPAdapter.Workflow.Attempt").unwrap();
        assert_eq!(path.resolve(&snap), Some(Some(Value::List(vec![Value::Int(1), Value::Int(0)]))));
    }

    // FP-T03: derived cash-in timestamps

    #[test]
    fn timestamps_match_after_conversion() {
        let mut snap = rpp_snapshot(vec![cashin(2, "2026-01-02 11:00:00")]);
        snap.rpp_adapter.as_mut().unwrap().credit_transfer_updated_at =
            Some("2026-01-02 03:00:00".to_owned());
        let path = FieldPath::parse("RPPAdapter.CreditTransferTimestampsMatch").unwrap();
        assert_eq!(path.resolve(&snap), Some(Some(Value::from("true"))));
    }

    #[test]
    fn timestamps_mismatch() {
        let mut snap = rpp_snapshot(vec![cashin(2, "2026-01-02 11:00:05")]);
        snap.rpp_adapter.as_mut().unwrap().credit_transfer_updated_at =
            Some("2026-01-02 03:00:00".to_owned());
        let path = FieldPath::parse("RPPAdapter.CreditTransferTimestampsMatch").unwrap();
        assert_eq!(path.resolve(&snap), Some(Some(Value::from("false"))));
    }

    #[test]
    fn timestamp_check_needs_retried_workflow() {
        let mut snap = rpp_snapshot(vec![cashin(0, "2026-01-02 11:00:05")]);
        snap.rpp_adapter.as_mut().unwrap().credit_transfer_updated_at =
            Some("2026-01-02 03:00:00".to_owned());
        let path = FieldPath::parse("RPPAdapter.CreditTransferTimestampsMatch").unwrap();
        assert_eq!(path.resolve(&snap), Some(None));
        let path = FieldPath::parse("RPPAdapter.CashinWorkflowUpdatedAt").unwrap();
        assert_eq!(path.resolve(&snap), Some(None));
        let path = FieldPath::parse("RPPAdapter.CashinRetryEligible").unwrap();
        assert_eq!(path.resolve(&snap), Some(None));
    }

    #[test]
    fn retry_eligibility_follows_payload() {
        let path = FieldPath::parse("RPPAdapter.CashinRetryEligible").unwrap();
        let eligible = |data: &str| {
            let mut wf = cashin(2, "");
            wf.data = data.to_owned();
            path.resolve(&rpp_snapshot(vec![wf]))
        };
        assert_eq!(eligible("not json"), Some(Some(Value::from("true"))));
        assert_eq!(
            eligible(r#"{"CreditTransfer":{"UpdatedAt":"2026-01-02 11:00:00"}}"#),
            Some(Some(Value::from("true")))
        );
        assert_eq!(eligible(r#"{"CreditTransfer":{"UpdatedAt":"  "}}"#), Some(Some(Value::from("false"))));
        assert_eq!(eligible(r#"{"State":100}"#), Some(Some(Value::from("false"))));
        assert_eq!(eligible(""), Some(Some(Value::from("false"))));
    }
}
