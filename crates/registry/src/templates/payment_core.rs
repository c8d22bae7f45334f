// Rust guideline compliant 2026-10-18

//! Payment core tickets.

use domain::{Case, DmlTicket, TargetStore, TemplateInfo, TransactionSnapshot};

use super::{internal_payment_flow_run_id, pc_external_run_id};

const EXTERNAL_200_11_DEPLOY: &str = "-- pc_external_payment_flow_200_11
UPDATE workflow_execution
SET state = 202,
    attempt = 1,
    data = JSON_SET(
      data,
      '$.StreamResp', JSON_OBJECT(
        'TxID', '',
        'Status', 'FAILED',
        'ErrorCode', 'ADAPTER_ERROR',
        'ExternalID', '',
        'ErrorMessage', 'Reject from adapter'),
      '$.State', 202)
WHERE run_id = {run_id}
AND state = 200
AND attempt = 11;";

const EXTERNAL_200_11_ROLLBACK: &str = "UPDATE workflow_execution
SET state = 200,
    attempt = 11,
    data = JSON_SET(data, '$.State', 200)
WHERE run_id = {run_id};";

const REPUBLISH_230_DEPLOY: &str = "-- pe_stuck_230_republish_pc
UPDATE workflow_execution
SET state = 902,
    attempt = 1,
    data = JSON_SET(data, '$.State', 902)
WHERE run_id = {run_id}
AND workflow_id = 'internal_payment_flow'
AND state = 900;";

const REPUBLISH_230_ROLLBACK: &str = "UPDATE workflow_execution
SET state = 900,
    attempt = 1,
    data = JSON_SET(data, '$.State', 900)
WHERE run_id = {run_id}
AND workflow_id = 'internal_payment_flow'
AND state = 902;";

/// External transfer exhausted its retries at 200: fail it as an adapter reject.
pub(super) fn pc_external_payment_flow_200_11(snapshot: &TransactionSnapshot) -> Option<DmlTicket> {
    let run_id = pc_external_run_id(snapshot)?;
    Some(DmlTicket::new(Case::PcExternalPaymentFlow200_11).pair(
        TemplateInfo::for_run(TargetStore::Pc, EXTERNAL_200_11_DEPLOY, run_id),
        TemplateInfo::for_run(TargetStore::Pc, EXTERNAL_200_11_ROLLBACK, run_id),
    ))
}

/// PE waits at 230 on a completed internal payment flow: republish it.
pub(super) fn pe_stuck_230_republish_pc(snapshot: &TransactionSnapshot) -> Option<DmlTicket> {
    let run_id = internal_payment_flow_run_id(snapshot)?;
    Some(DmlTicket::new(Case::PeStuck230RepublishPc).pair(
        TemplateInfo::for_run(TargetStore::Pc, REPUBLISH_230_DEPLOY, run_id),
        TemplateInfo::for_run(TargetStore::Pc, REPUBLISH_230_ROLLBACK, run_id),
    ))
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{payment_core, wf};
    use super::{pc_external_payment_flow_200_11, pe_stuck_230_republish_pc};
    use domain::{TargetStore, TransactionSnapshot};

    #[test]
    fn external_200_11_targets_external_transfer_run() {
        let snap = TransactionSnapshot::new("tx")
            .with_payment_core(payment_core(Some(wf("external_payment_flow", "200", 11, "ext-1")), None));
        let ticket = pc_external_payment_flow_200_11(&snap).unwrap();
        assert_eq!(ticket.stores(), [TargetStore::Pc]);
        assert_eq!(ticket.deploy[0].key_value(), Some("ext-1"));
        assert!(ticket.deploy[0].sql_template.contains("SET state = 202"));
        assert!(ticket.rollback[0].sql_template.contains("attempt = 11"));
    }

    #[test]
    fn missing_payment_core_gives_no_ticket() {
        assert!(pc_external_payment_flow_200_11(&TransactionSnapshot::new("tx")).is_none());
        assert!(pe_stuck_230_republish_pc(&TransactionSnapshot::new("tx")).is_none());
    }

    #[test]
    fn republish_uses_internal_payment_flow() {
        let snap = TransactionSnapshot::new("tx")
            .with_payment_core(payment_core(None, Some(wf("internal_payment_flow", "900", 0, "cap-1"))));
        let ticket = pe_stuck_230_republish_pc(&snap).unwrap();
        assert_eq!(ticket.deploy[0].key_value(), Some("cap-1"));
        assert!(ticket.deploy[0].sql_template.contains("state = 902"));
    }
}
