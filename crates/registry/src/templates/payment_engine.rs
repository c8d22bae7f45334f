// Rust guideline compliant 2026-10-18

//! Payment engine tickets.

use domain::{Case, DmlTicket, ParamInfo, TargetStore, TemplateInfo, TransactionSnapshot};

use super::{pe_run_id, pe_workflow};
use crate::mysql_json::rollback_stream_message;

const REJECT_210_DEPLOY: &str = "-- Reject PE stuck 210. Reject transactions since it hasn't reached Paynet yet
UPDATE workflow_execution
SET state = 221,
    attempt = 1,
    data = JSON_SET(
      data,
      '$.StreamMessage', JSON_OBJECT(
        'Status', 'FAILED',
        'ErrorCode', 'ADAPTER_ERROR',
        'ErrorMessage', 'Manual Rejected'),
      '$.State', 221)
WHERE run_id = {run_id}
AND workflow_id = 'workflow_transfer_payment'
AND state = 210;";

const REJECT_210_ROLLBACK: &str = "UPDATE workflow_execution
SET state = 210,
    attempt = 0,
    data = JSON_SET(
      data,
      '$.StreamMessage', NULL,
      '$.State', 210)
WHERE run_id = {run_id}
AND workflow_id = 'workflow_transfer_payment';";

const LIMIT_CHECK_DEPLOY: &str = "-- Reject/Reset the Workflow Execution (cashout_pe102_reject)
UPDATE workflow_execution
SET state = 221,
    attempt = 1,
    `data` = JSON_SET(
      `data`,
      '$.StreamMessage', JSON_OBJECT(
        'Status', 'FAILED',
        'ErrorCode', 'ADAPTER_ERROR',
        'ErrorMessage', 'Manual Rejected'),
      '$.State', 221,
      '$.Properties.AuthorisationID', {authorisation_id})
WHERE run_id IN ({run_id})
AND state = 102
AND workflow_id = 'workflow_transfer_payment';";

const LIMIT_CHECK_ROLLBACK: &str = "-- cashout_pe102_reject_rollback
UPDATE workflow_execution
SET state = 102,
    attempt = 4,
    `data` = JSON_SET(
      `data`,
      '$.StreamMessage', JSON_OBJECT(),
      '$.State', 102,
      '$.Properties.AuthorisationID', NULL)
WHERE run_id IN ({run_id});";

const LIMIT_CHECK_TRANSFER_DEPLOY: &str = "-- Update transfer table with AuthorisationID from payment-core internal_auth
UPDATE transfer
SET properties = JSON_SET(properties, '$.AuthorisationID', {authorisation_id}),
    updated_at = {updated_at}
WHERE transaction_id = {transaction_id};";

const LIMIT_CHECK_TRANSFER_ROLLBACK: &str = "-- Rollback transfer table AuthorisationID injection
UPDATE transfer
SET properties = JSON_REMOVE(properties, '$.AuthorisationID'),
    updated_at = {updated_at}
WHERE transaction_id = {transaction_id};";

const FAST_CASHIN_DEPLOY: &str = "-- pe_220_0_fast_cashin_failed
UPDATE workflow_execution
SET attempt = 1,
    state = 221,
    data = JSON_SET(
      data,
      '$.State', 221,
      '$.StreamMessage.Status', 'FAILED',
      '$.StreamMessage.ErrorMessage', 'MANUAL REJECT')
WHERE run_id = {run_id}
AND workflow_id = 'workflow_transfer_collection'
AND state = 220
AND attempt = 0;";

const FAST_CASHIN_ROLLBACK: &str = "UPDATE workflow_execution
SET attempt = 0,
    state = 220,
    data = JSON_SET(
      data,
      '$.State', 220,
      '$.StreamMessage', JSON_OBJECT())
WHERE run_id = {run_id}
AND workflow_id = 'workflow_transfer_collection';";

const STUCK_300_DEPLOY: &str = "-- pe_stuck_300_rpp_not_found
UPDATE workflow_execution
SET state = 221,
    attempt = 1,
    data = JSON_SET(
      data,
      '$.StreamMessage', JSON_OBJECT(
        'Status', 'FAILED',
        'ErrorCode', 'ADAPTER_ERROR',
        'ErrorMessage', 'Manual Rejected'),
      '$.State', 221)
WHERE run_id = {run_id}
AND workflow_id = 'workflow_transfer_payment'
AND state = 300
AND attempt = 0;";

const STUCK_300_ROLLBACK: &str = "-- pe_stuck_300_rpp_not_found rollback
UPDATE workflow_execution
SET state = 300,
    attempt = 0,
    data = JSON_SET(
      data,
      '$.StreamMessage', {stream_message},
      '$.State', 300)
WHERE run_id = {run_id}
AND workflow_id = 'workflow_transfer_payment';";

/// Body shared by every manual rejection of a PE payment stuck at 220.
pub(super) const REJECT_220_BODY: &str = "UPDATE workflow_execution
SET state = 221, attempt = 1, `data` = JSON_SET(
      `data`, '$.StreamMessage',
      JSON_OBJECT(
         'Status', 'FAILED',
         'ErrorCode', 'ADAPTER_ERROR',
         'ErrorMessage', 'Manual Rejected'
      ),
   '$.State', 221)
WHERE run_id IN ({run_id}) AND state = 220 AND workflow_id = 'workflow_transfer_payment';";

const REJECT_220_ROLLBACK: &str = "UPDATE workflow_execution
SET state = 220, attempt = 1, `data` = JSON_SET(
      `data`, '$.StreamMessage',
      JSON_OBJECT(),
   '$.State', 220)
WHERE run_id IN ({run_id});";

/// Manual rejection of a PE payment stuck at 220, headed by `comment`.
pub(super) fn reject_220(comment: &str, run_id: &str) -> TemplateInfo {
    TemplateInfo::for_run(TargetStore::Pe, format!("-- {comment}\n{REJECT_220_BODY}"), run_id)
}

pub(super) fn pe_transfer_payment_210_0(snapshot: &TransactionSnapshot) -> Option<DmlTicket> {
    let run_id = pe_run_id(snapshot)?;
    Some(DmlTicket::new(Case::PeTransferPayment210_0).pair(
        TemplateInfo::for_run(TargetStore::Pe, REJECT_210_DEPLOY, run_id),
        TemplateInfo::for_run(TargetStore::Pe, REJECT_210_ROLLBACK, run_id),
    ))
}

/// Reject at the limit check, injecting the payment core authorisation id
/// into both the workflow and the transfer row. The transfer row keeps its
/// `updated_at`.
pub(super) fn pe_stuck_at_limit_check_102_4(snapshot: &TransactionSnapshot) -> Option<DmlTicket> {
    let pc = snapshot.payment_core.as_ref()?;
    let pe = snapshot.payment_engine.as_ref()?;
    let authorisation_id = non_empty(&pc.internal_auth.tx_id)?;
    let run_id = non_empty(&pe.workflow.run_id)?;
    let transaction_id = non_empty(&pe.transfers.transaction_id)?;
    let updated_at = non_empty(&pe.transfers.updated_at)?;

    let transfer = |sql: &str| {
        TemplateInfo::new(TargetStore::Pe, sql)
            .keyed_by("transaction_id")
            .param(ParamInfo::text("transaction_id", transaction_id))
            .param(ParamInfo::text("updated_at", updated_at))
    };

    Some(
        DmlTicket::new(Case::PeStuckAtLimitCheck102_4)
            .pair(
                TemplateInfo::for_run(TargetStore::Pe, LIMIT_CHECK_DEPLOY, run_id)
                    .param(ParamInfo::text("authorisation_id", authorisation_id)),
                TemplateInfo::for_run(TargetStore::Pe, LIMIT_CHECK_ROLLBACK, run_id),
            )
            .pair(
                transfer(LIMIT_CHECK_TRANSFER_DEPLOY)
                    .param(ParamInfo::text("authorisation_id", authorisation_id)),
                transfer(LIMIT_CHECK_TRANSFER_ROLLBACK),
            ),
    )
}

pub(super) fn pe_220_0_fast_cashin_failed(snapshot: &TransactionSnapshot) -> Option<DmlTicket> {
    let run_id = pe_run_id(snapshot)?;
    Some(DmlTicket::new(Case::Pe220_0FastCashinFailed).pair(
        TemplateInfo::for_run(TargetStore::Pe, FAST_CASHIN_DEPLOY, run_id),
        TemplateInfo::for_run(TargetStore::Pe, FAST_CASHIN_ROLLBACK, run_id),
    ))
}

/// Reject a PE payment stuck at 300; the rollback restores the stream
/// message recovered from the workflow payload.
pub(super) fn pe_stuck_300_rpp_not_found(snapshot: &TransactionSnapshot) -> Option<DmlTicket> {
    let run_id = pe_run_id(snapshot)?;
    let stream_message = rollback_stream_message(&pe_workflow(snapshot)?.data);
    Some(DmlTicket::new(Case::PeStuck300RppNotFound).pair(
        TemplateInfo::for_run(TargetStore::Pe, STUCK_300_DEPLOY, run_id),
        TemplateInfo::for_run(TargetStore::Pe, STUCK_300_ROLLBACK, run_id)
            .param(ParamInfo::expr("stream_message", stream_message)),
    ))
}

pub(super) fn cashout_pe220_pc201_reject(snapshot: &TransactionSnapshot) -> Option<DmlTicket> {
    let run_id = pe_run_id(snapshot)?;
    Some(DmlTicket::new(Case::CashoutPe220Pc201Reject).pair(
        reject_220("cashout_pe220_pc201_reject", run_id),
        TemplateInfo::for_run(TargetStore::Pe, REJECT_220_ROLLBACK, run_id),
    ))
}

pub(super) fn rpp210_pe220_pc201_reject(snapshot: &TransactionSnapshot) -> Option<DmlTicket> {
    let run_id = pe_run_id(snapshot)?;
    Some(DmlTicket::new(Case::Rpp210Pe220Pc201Reject).pair(
        reject_220("rpp210_pe220_pc201_reject", run_id),
        TemplateInfo::for_run(TargetStore::Pe, REJECT_220_ROLLBACK, run_id),
    ))
}

fn non_empty(s: &str) -> Option<&str> {
    Some(s).filter(|s| !s.is_empty())
}
