// Rust guideline compliant 2026-10-18

//! RPP adapter tickets.
//!
//! The RPP adapter may hold several workflow executions per transfer; each
//! generator picks the first one matching its criteria.

use domain::{
    Case, DmlTicket, ParamInfo, TargetStore, TemplateInfo, TransactionSnapshot, WorkflowCriteria,
    WorkflowSnapshot, clock,
};

use super::{rpp_run_id, run_id_of};

const CASHOUT: &str = "wf_ct_cashout";
const QR_PAYMENT: &str = "wf_ct_qr_payment";
const CASHIN: &str = "wf_ct_cashin";
const PROCESS_REGISTRY: &str = "wf_process_registry";

const CASHOUT_REJECT_101_DEPLOY: &str = "-- rpp_cashout_reject_101_19, manual reject
UPDATE workflow_execution
SET state = 221,
    attempt = 1,
    data = JSON_SET(data, '$.State', 221)
WHERE run_id = {run_id}
AND state = 101
AND workflow_id = 'wf_ct_cashout';";

const CASHOUT_REJECT_101_ROLLBACK: &str = "-- rpp_cashout_reject_101_19_rollback
UPDATE workflow_execution
SET state = 101,
    attempt = 0,
    data = JSON_SET(data, '$.State', 101)
WHERE run_id = {run_id}
AND workflow_id = 'wf_ct_cashout';";

const QR_REJECT_210_DEPLOY: &str = "-- rpp_qr_payment_reject_210_0, manual reject
UPDATE workflow_execution
SET state = 221,
    attempt = 1,
    data = JSON_SET(data, '$.State', 221)
WHERE run_id = {run_id}
AND state = 210
AND workflow_id = 'wf_ct_qr_payment';";

const QR_REJECT_210_ROLLBACK: &str = "-- rpp_qr_payment_reject_210_0_rollback
UPDATE workflow_execution
SET state = 210,
    attempt = 0,
    data = JSON_SET(data, '$.State', 210)
WHERE run_id = {run_id}
AND workflow_id = 'wf_ct_qr_payment';";

const NOT_FOUND_REJECT_DEPLOY: &str = "-- rpp_no_response_reject_not_found, manual reject for stuck initialization
UPDATE workflow_execution
SET state = 221,
    attempt = 1,
    data = JSON_SET(data, '$.State', 221)
WHERE run_id = {run_id}
AND state = 0
AND workflow_id = 'wf_ct_qr_payment';";

const NOT_FOUND_REJECT_ROLLBACK: &str = "-- rpp_no_response_reject_not_found_rollback
UPDATE workflow_execution
SET state = 0,
    attempt = 0,
    data = JSON_SET(data, '$.State', 0)
WHERE run_id = {run_id}
AND workflow_id = 'wf_ct_qr_payment';";

const RESUME_DEPLOY: &str = "-- rpp_no_response_resume_acsp
-- RPP did not respond in time, but status at Paynet is ACSP (Accepted Settlement in Process) or ACTC (Accepted Technical Validation)
UPDATE workflow_execution
SET state = 222,
    attempt = 1,
    data = JSON_SET(data, '$.State', 222)
WHERE run_id = {run_id}
AND state = 210
AND workflow_id IN ('wf_ct_cashout', 'wf_ct_qr_payment');";

const RESUME_ROLLBACK: &str = "-- rpp_no_response_resume_rollback
UPDATE workflow_execution
SET state = 210,
    attempt = 0,
    data = JSON_SET(data, '$.State', 210)
WHERE run_id = {run_id}
AND workflow_id IN ('wf_ct_cashout', 'wf_ct_qr_payment');";

const CASHIN_122_DEPLOY: &str = "-- rpp_cashin_validation_failed_122_0, retry validation
UPDATE workflow_execution
SET state = 100,
    attempt = 1,
    data = JSON_SET(data, '$.State', 100)
WHERE run_id = {run_id}
AND workflow_id = 'wf_ct_cashin'
AND state = 122;";

const CASHIN_122_ROLLBACK: &str = "-- rpp_cashin_validation_failed_122_0_rollback
UPDATE workflow_execution
SET state = 122,
    attempt = 0,
    data = JSON_SET(data, '$.State', 122)
WHERE run_id = {run_id}
AND workflow_id = 'wf_ct_cashin';";

const REGISTRY_INIT_DEPLOY: &str = "-- rpp_process_registry_stuck_init, set attempt=1 to retry initialization
UPDATE workflow_execution
SET attempt = 1
WHERE run_id = {run_id}
AND workflow_id = 'wf_process_registry'
AND state = 0;";

const REGISTRY_INIT_ROLLBACK: &str = "-- rpp_process_registry_stuck_init_rollback, reset attempt back to 0
UPDATE workflow_execution
SET attempt = 0
WHERE run_id = {run_id}
AND workflow_id = 'wf_process_registry'
AND state = 0;";

const CASHIN_RETRY_DEPLOY: &str = "-- cash_in_stuck_100_retry, timestamps match after timezone conversion
UPDATE workflow_execution
SET attempt = 1
WHERE run_id = {run_id}
AND workflow_id = 'wf_ct_cashin'
AND state = 100;";

const CASHIN_RETRY_ROLLBACK: &str = "-- cash_in_stuck_100_retry_rollback
UPDATE workflow_execution
SET attempt = 0
WHERE run_id = {run_id}
AND workflow_id = 'wf_ct_cashin'
AND state = 100;";

const CASHIN_MISMATCH_DEPLOY: &str = "-- cash_in_stuck_100_update_mismatch, sync timestamp and retry
UPDATE workflow_execution
SET attempt = 1,
    `data` = JSON_SET(`data`, '$.CreditTransfer.UpdatedAt', {converted_timestamp})
WHERE run_id = {run_id}
AND workflow_id = 'wf_ct_cashin'
AND state = 100;";

const CASHIN_MISMATCH_ROLLBACK: &str = "-- cash_in_stuck_100_update_mismatch_rollback
UPDATE workflow_execution
SET attempt = 0,
    `data` = JSON_SET(`data`, '$.CreditTransfer.UpdatedAt', {original_timestamp})
WHERE run_id = {run_id}
AND workflow_id = 'wf_ct_cashin'
AND state = 100;";

const PC201_RPP210_DEPLOY: &str = "-- RPP 210, PE 220, PC 201. No response from RPP. Move to 222 to resume. ACSP
UPDATE workflow_execution
SET state = 222,
    attempt = 1,
    data = JSON_SET(data, '$.State', 222)
WHERE run_id = {run_id}
AND state = 210;";

const PC201_RPP210_ROLLBACK: &str = "UPDATE workflow_execution
SET state = 210,
    attempt = 0,
    data = JSON_SET(data, '$.State', 210)
WHERE run_id = {run_id};";

const PC201_RPP900_DEPLOY: &str = "-- RPP 900, PE 220, PC 201. Republish from RPP to resume. ACSP
UPDATE workflow_execution
SET state = 301,
    attempt = 1,
    data = JSON_SET(data, '$.State', 301)
WHERE run_id = {run_id}
AND state = 900;";

const PC201_RPP900_ROLLBACK: &str = "UPDATE workflow_execution
SET state = 900,
    attempt = 0,
    data = JSON_SET(data, '$.State', 900)
WHERE run_id = {run_id};";

const ACCEPT_DEPLOY: &str = "-- rpp210_pe220_pc201_accept - RPP did not respond in time, ACSP status at Paynet. Move to 222 to resume.
UPDATE workflow_execution
SET state = 222,
    attempt = 1,
    data = JSON_SET(data, '$.State', 222)
WHERE run_id = {run_id}
AND state = 210
AND workflow_id IN ('wf_ct_cashout', 'wf_ct_qr_payment');";

const ACCEPT_ROLLBACK: &str = "UPDATE workflow_execution
SET state = 210,
    attempt = 0,
    data = JSON_SET(data, '$.State', 210)
WHERE run_id = {run_id}
AND workflow_id IN ('wf_ct_cashout', 'wf_ct_qr_payment');";

/// Single RPP deploy/rollback pair on the first workflow matching `criteria`.
fn single(
    snapshot: &TransactionSnapshot,
    case: Case,
    criteria: WorkflowCriteria<'_>,
    deploy: &str,
    rollback: &str,
) -> Option<DmlTicket> {
    let run_id = rpp_run_id(snapshot, &criteria)?;
    Some(DmlTicket::new(case).pair(
        TemplateInfo::for_run(TargetStore::Rpp, deploy, run_id),
        TemplateInfo::for_run(TargetStore::Rpp, rollback, run_id),
    ))
}

pub(super) fn cashout_reject_101_19(snapshot: &TransactionSnapshot) -> Option<DmlTicket> {
    let criteria = WorkflowCriteria::any().workflow(CASHOUT).state("101").attempt(19);
    single(snapshot, Case::RppCashoutReject101_19, criteria, CASHOUT_REJECT_101_DEPLOY, CASHOUT_REJECT_101_ROLLBACK)
}

pub(super) fn qr_payment_reject_210_0(snapshot: &TransactionSnapshot) -> Option<DmlTicket> {
    let criteria = WorkflowCriteria::any().workflow(QR_PAYMENT).state("210").attempt(0);
    single(snapshot, Case::RppQrPaymentReject210_0, criteria, QR_REJECT_210_DEPLOY, QR_REJECT_210_ROLLBACK)
}

/// QR payment that never left initialization.
pub(super) fn no_response_reject_not_found(snapshot: &TransactionSnapshot) -> Option<DmlTicket> {
    let criteria = WorkflowCriteria::any().workflow(QR_PAYMENT).state("0");
    single(
        snapshot,
        Case::RppNoResponseRejectNotFound,
        criteria,
        NOT_FOUND_REJECT_DEPLOY,
        NOT_FOUND_REJECT_ROLLBACK,
    )
}

/// Resume a transfer Paynet accepted but RPP never heard back about.
pub(super) fn no_response_resume(snapshot: &TransactionSnapshot) -> Option<DmlTicket> {
    let criteria = WorkflowCriteria::any().state("210").attempt(0);
    single(snapshot, Case::RppNoResponseResume, criteria, RESUME_DEPLOY, RESUME_ROLLBACK)
}

pub(super) fn cashin_validation_failed_122_0(snapshot: &TransactionSnapshot) -> Option<DmlTicket> {
    let criteria = WorkflowCriteria::any().workflow(CASHIN).state("122").attempt(0);
    single(snapshot, Case::RppCashinValidationFailed122_0, criteria, CASHIN_122_DEPLOY, CASHIN_122_ROLLBACK)
}

pub(super) fn process_registry_stuck_init(snapshot: &TransactionSnapshot) -> Option<DmlTicket> {
    let criteria = WorkflowCriteria::any().workflow(PROCESS_REGISTRY).state("0");
    single(
        snapshot,
        Case::RppProcessRegistryStuckInit,
        criteria,
        REGISTRY_INIT_DEPLOY,
        REGISTRY_INIT_ROLLBACK,
    )
}

pub(super) fn pc_external_201_rpp_210(snapshot: &TransactionSnapshot) -> Option<DmlTicket> {
    let criteria = WorkflowCriteria::any().state("210").attempt(0);
    single(
        snapshot,
        Case::PcExternalPaymentFlow201_0Rpp210,
        criteria,
        PC201_RPP210_DEPLOY,
        PC201_RPP210_ROLLBACK,
    )
}

pub(super) fn pc_external_201_rpp_900(snapshot: &TransactionSnapshot) -> Option<DmlTicket> {
    let criteria = WorkflowCriteria::any().state("900");
    single(
        snapshot,
        Case::PcExternalPaymentFlow201_0Rpp900,
        criteria,
        PC201_RPP900_DEPLOY,
        PC201_RPP900_ROLLBACK,
    )
}

pub(super) fn rpp210_pe220_pc201_accept(snapshot: &TransactionSnapshot) -> Option<DmlTicket> {
    let criteria = WorkflowCriteria::any().state("210").attempt(0);
    single(snapshot, Case::Rpp210Pe220Pc201Accept, criteria, ACCEPT_DEPLOY, ACCEPT_ROLLBACK)
}

// ---------------------------------------------------------------------------
// Cash-in stuck at 100
// ---------------------------------------------------------------------------

/// First cash-in workflow stuck at 100 that has been retried at least once.
fn retried_cashin(snapshot: &TransactionSnapshot) -> Option<&WorkflowSnapshot> {
    let criteria = WorkflowCriteria::any().workflow(CASHIN).state("100");
    snapshot
        .rpp_adapter
        .as_ref()?
        .workflow
        .iter()
        .find(|wf| wf.matches(&criteria) && wf.attempt > 0)
}

pub(super) fn cash_in_stuck_100_retry(snapshot: &TransactionSnapshot) -> Option<DmlTicket> {
    let run_id = run_id_of(retried_cashin(snapshot)?)?;
    Some(DmlTicket::new(Case::CashInStuck100Retry).pair(
        TemplateInfo::for_run(TargetStore::Rpp, CASHIN_RETRY_DEPLOY, run_id),
        TemplateInfo::for_run(TargetStore::Rpp, CASHIN_RETRY_ROLLBACK, run_id),
    ))
}

/// Retry after realigning the payload timestamp with the credit transfer
/// row (converted from UTC to GMT+8). The rollback puts the payload's own
/// value back.
pub(super) fn cash_in_stuck_100_update_mismatch(snapshot: &TransactionSnapshot) -> Option<DmlTicket> {
    let wf = retried_cashin(snapshot)?;
    let run_id = run_id_of(wf)?;
    let row_updated_at = snapshot.rpp_adapter.as_ref()?.credit_transfer_updated_at.as_deref()?;
    let converted = match clock::utc_to_gmt8(row_updated_at) {
        Ok(converted) => converted,
        Err(e) => {
            tracing::debug!("registry.cash_in_mismatch: input_id={} error={e}", snapshot.input_id);
            return None;
        }
    };
    let original = wf.data_field(&["CreditTransfer", "UpdatedAt"])?;
    let original = original.as_str().map(str::trim).filter(|s| !s.is_empty())?;

    Some(DmlTicket::new(Case::CashInStuck100UpdateMismatch).pair(
        TemplateInfo::for_run(TargetStore::Rpp, CASHIN_MISMATCH_DEPLOY, run_id)
            .param(ParamInfo::text("converted_timestamp", converted)),
        TemplateInfo::for_run(TargetStore::Rpp, CASHIN_MISMATCH_ROLLBACK, run_id)
            .param(ParamInfo::text("original_timestamp", original)),
    ))
}
