// Rust guideline compliant 2026-10-18

//! Tickets that touch more than one store.

use domain::{
    Case, DmlTicket, ParamInfo, TargetStore, TemplateInfo, TransactionSnapshot, WorkflowCriteria,
};

use super::payment_engine::reject_220;
use super::{pc_capture_run_id, pc_external_run_id, pe_run_id, pe_workflow, rpp_run_id};

const TM_PE_DEPLOY: &str = "-- thought_machine_false_negative - PE Deploy
UPDATE workflow_execution
SET state = 230,
    prev_trans_id = data->>'$.StreamMessage.ReferenceID',
    data = JSON_SET(data, '$.State', 230)
WHERE run_id = {run_id}
AND state = 701;";

const TM_PE_ROLLBACK: &str = "-- thought_machine_false_negative - PE Rollback
UPDATE workflow_execution
SET state = 701,
    attempt = 0,
    prev_trans_id = {prev_trans_id},
    data = JSON_SET(data, '$.State', 701)
WHERE run_id = {run_id}
AND state = 230;";

/// Restart of a PC capture flow failed at 500, headed by `comment`.
const CAPTURE_RESTART_BODY: &str = "UPDATE workflow_execution
SET state = 0,
    attempt = 1,
    data = JSON_SET(data, '$.State', 0)
WHERE run_id = {run_id}
AND workflow_id = 'internal_payment_flow'
AND state = 500;";

const CAPTURE_RESTART_ROLLBACK: &str = "UPDATE workflow_execution
SET state = 500,
    attempt = 0,
    data = JSON_SET(data, '$.State', 500)
WHERE run_id = {run_id}
AND workflow_id = 'internal_payment_flow';";

const INIT_PE_ROLLBACK: &str = "UPDATE workflow_execution
SET state = 220, attempt = 0, `data` = JSON_SET(
      `data`, '$.StreamMessage', null,
   '$.State', 220)
WHERE run_id IN ({run_id}) AND workflow_id = 'workflow_transfer_payment';";

const INIT_PC_DEPLOY: &str = "-- pc_external_payment_flow_201_0, manual PC rejection
UPDATE workflow_execution
SET state = 202, attempt = 1,
    `data` = JSON_SET(`data`,
      '$.StreamResp', JSON_OBJECT(
        'TxID', '',
        'Status', 'FAILED',
        'ErrorCode', 'ADAPTER_ERROR',
        'ExternalID', '',
        'ErrorMessage', 'Reject from adapter'
      ),
      '$.State', 202)
WHERE run_id IN ({run_id}) AND state = 201 AND attempt = 0;";

const INIT_PC_ROLLBACK: &str = "UPDATE workflow_execution
SET state = 201, attempt = 0,
    `data` = JSON_SET(`data`, '$.State', 201)
WHERE run_id IN ({run_id});";

const INIT_RPP_DEPLOY: &str = "-- rpp_stuck_init_move_to_700
UPDATE workflow_execution
SET state = 700,
    `data` = JSON_SET(`data`, '$.State', 700)
WHERE run_id IN ({run_id}) AND state = 0;";

const INIT_RPP_ROLLBACK: &str = "UPDATE workflow_execution
SET state = 0,
    `data` = JSON_SET(`data`, '$.State', 0)
WHERE run_id IN ({run_id});";

const RTP_INTENT_DEPLOY: &str = "-- rpp_rtp_cashin_stuck_200_0
UPDATE intent SET status = 'UPDATED'
WHERE intent_id = {intent_id}
AND status = 'CONFIRMED';";

const RTP_INTENT_ROLLBACK: &str = "-- rpp_rtp_cashin_stuck_200_0 Rollback
UPDATE intent SET status = 'CONFIRMED'
WHERE intent_id = {intent_id};";

const RTP_WORKFLOW_DEPLOY: &str = "-- rpp_rtp_cashin_stuck_200_0
UPDATE workflow_execution
SET state = 110,
    attempt = 1,
    data = JSON_SET(data, '$.State', 110)
WHERE run_id = {run_id}
AND state = 200
AND workflow_id = 'wf_ct_rtp_cashin';";

const RTP_WORKFLOW_ROLLBACK: &str = "-- rpp_rtp_cashin_stuck_200_0 Rollback
UPDATE workflow_execution
SET state = 200,
    attempt = 0,
    data = JSON_SET(data, '$.State', 200)
WHERE run_id = {run_id}
AND workflow_id = 'wf_ct_rtp_cashin';";

fn capture_restart(comment: &str, run_id: &str) -> (TemplateInfo, TemplateInfo) {
    (
        TemplateInfo::for_run(TargetStore::Pc, format!("-- {comment}\n{CAPTURE_RESTART_BODY}"), run_id),
        TemplateInfo::for_run(
            TargetStore::Pc,
            format!("-- {comment} - PC Rollback\n{CAPTURE_RESTART_ROLLBACK}"),
            run_id,
        ),
    )
}

/// Core banking reported a failure that actually succeeded: move PE on to
/// 230 and restart the PC capture. The PE rollback needs the original
/// `prev_trans_id`.
pub(super) fn thought_machine_false_negative(snapshot: &TransactionSnapshot) -> Option<DmlTicket> {
    let pe_run = pe_run_id(snapshot)?;
    let pc_run = pc_capture_run_id(snapshot)?;
    let prev_trans_id = pe_workflow(snapshot)?.prev_trans_id.as_deref().filter(|s| !s.is_empty())?;

    let (capture, capture_rollback) =
        capture_restart("thought_machine_false_negative (restart PC capture flow from 0)", pc_run);
    Some(
        DmlTicket::new(Case::ThoughtMachineFalseNegative)
            .pair(
                TemplateInfo::for_run(TargetStore::Pe, TM_PE_DEPLOY, pe_run),
                TemplateInfo::for_run(TargetStore::Pe, TM_PE_ROLLBACK, pe_run)
                    .param(ParamInfo::text("prev_trans_id", prev_trans_id)),
            )
            .pair(capture, capture_rollback),
    )
}

/// Restart a failed PC capture once an RPP workflow confirms success.
pub(super) fn pe_capture_processing_rpp_success(snapshot: &TransactionSnapshot) -> Option<DmlTicket> {
    let pc_run = pc_capture_run_id(snapshot)?;
    rpp_run_id(snapshot, &WorkflowCriteria::any().state("900").attempt(0))?;

    let (capture, capture_rollback) = capture_restart(
        "pe_capture_processing_pc_capture_failed_rpp_success (restart PC capture flow from 0)",
        pc_run,
    );
    Some(DmlTicket::new(Case::PeCaptureProcessingPcCaptureFailedRppSuccess).pair(capture, capture_rollback))
}

/// Reject every leg of a transfer whose RPP workflow never left init.
///
/// The PE rejection is required. The PC and RPP legs are added only when
/// their run ids resolve.
pub(super) fn pe220_pc201_rpp0_stuck_init(snapshot: &TransactionSnapshot) -> Option<DmlTicket> {
    let pe_run = pe_run_id(snapshot)?;
    let mut ticket = DmlTicket::new(Case::Pe220Pc201Rpp0StuckInit).pair(
        reject_220("pe220_pc201_rpp0_stuck_init, manual PE rejection", pe_run),
        TemplateInfo::for_run(TargetStore::Pe, INIT_PE_ROLLBACK, pe_run),
    );

    if let Some(pc_run) = pc_external_run_id(snapshot) {
        ticket = ticket.pair(
            TemplateInfo::for_run(TargetStore::Pc, INIT_PC_DEPLOY, pc_run),
            TemplateInfo::for_run(TargetStore::Pc, INIT_PC_ROLLBACK, pc_run),
        );
    }
    if let Some(rpp_run) = rpp_run_id(snapshot, &WorkflowCriteria::any().state("0")) {
        ticket = ticket.pair(
            TemplateInfo::for_run(TargetStore::Rpp, INIT_RPP_DEPLOY, rpp_run),
            TemplateInfo::for_run(TargetStore::Rpp, INIT_RPP_ROLLBACK, rpp_run),
        );
    }
    Some(ticket)
}

/// Release an RTP cash-in stuck at 200: mark the partnerpay intent updated
/// and move the RPP workflow on.
pub(super) fn rtp_cashin_stuck_200_0(snapshot: &TransactionSnapshot) -> Option<DmlTicket> {
    let criteria = WorkflowCriteria::any().workflow("wf_ct_rtp_cashin").state("200").attempt(0);
    let run_id = rpp_run_id(snapshot, &criteria)?;
    let intent_id =
        snapshot.rpp_adapter.as_ref().map(|rpp| rpp.partner_tx_id.as_str()).filter(|s| !s.is_empty())?;

    let intent = |sql: &str| {
        TemplateInfo::new(TargetStore::Ppe, sql)
            .keyed_by("intent_id")
            .param(ParamInfo::text("intent_id", intent_id))
    };
    Some(
        DmlTicket::new(Case::RppRtpCashinStuck200_0)
            .pair(intent(RTP_INTENT_DEPLOY), intent(RTP_INTENT_ROLLBACK))
            .pair(
                TemplateInfo::for_run(TargetStore::Rpp, RTP_WORKFLOW_DEPLOY, run_id),
                TemplateInfo::for_run(TargetStore::Rpp, RTP_WORKFLOW_ROLLBACK, run_id),
            ),
    )
}
