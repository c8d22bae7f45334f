// Rust guideline compliant 2026-10-18

//! Partnerpay engine tickets.

use domain::{Case, DmlTicket, ParamInfo, TargetStore, TemplateInfo, TransactionSnapshot};

use super::run_id_of;

const CHARGE_DEPLOY: &str = "-- ecotxn_ChargeFailed_CaptureFailed_TMError
-- Move to AuthCompleted and wait for cron to cancel the transaction
UPDATE charge SET
status = 'PROCESSING',
updated_at = {updated_at}
WHERE transaction_id = {transaction_id};";

const CHARGE_ROLLBACK: &str = "-- ecotxn_ChargeFailed_CaptureFailed_TMError Rollback
UPDATE charge SET
status = 'FAILED',
updated_at = {updated_at}
WHERE transaction_id = {transaction_id};";

const WORKFLOW_DEPLOY: &str = "UPDATE workflow_execution
SET state = 300, data = JSON_SET(data, '$.State', 300,
'$.ChargeStorage.Status', 'PROCESSING')
WHERE run_id = {run_id}
AND workflow_id = 'workflow_charge'
AND state = 502
AND attempt = 0;";

const WORKFLOW_ROLLBACK: &str = "UPDATE workflow_execution
SET state = 502, data = JSON_SET(data, '$.State', 502,
'$.ChargeStorage.Status', 'FAILED')
WHERE run_id = {run_id}
AND workflow_id = 'workflow_charge';";

/// Charge failed on a core banking error after the capture failed: move it
/// back to processing so the cancellation cron picks it up.
///
/// The charge row is keyed by the charge workflow's run id, which is the
/// partnerpay transaction id, and keeps its original `updated_at`.
pub(super) fn ecotxn_charge_failed(snapshot: &TransactionSnapshot) -> Option<DmlTicket> {
    let ppe = snapshot.partnerpay_engine.as_ref()?;
    let run_id = run_id_of(&ppe.workflow)?;
    let updated_at = Some(ppe.charge.updated_at.as_str()).filter(|s| !s.is_empty())?;

    let charge = |sql: &str| {
        TemplateInfo::new(TargetStore::Ppe, sql)
            .keyed_by("transaction_id")
            .param(ParamInfo::text("transaction_id", run_id))
            .param(ParamInfo::text("updated_at", updated_at))
    };

    Some(
        DmlTicket::new(Case::EcotxnChargeFailedCaptureFailedTmError)
            .pair(charge(CHARGE_DEPLOY), charge(CHARGE_ROLLBACK))
            .pair(
                TemplateInfo::for_run(TargetStore::Ppe, WORKFLOW_DEPLOY, run_id),
                TemplateInfo::for_run(TargetStore::Ppe, WORKFLOW_ROLLBACK, run_id),
            ),
    )
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::wf;
    use super::ecotxn_charge_failed;
    use domain::{ChargeInfo, PartnerpayEngineInfo, TargetStore, TransactionSnapshot};

    #[test]
    fn charge_and_workflow_are_paired() {
        let snap = TransactionSnapshot::new("tx")
            .with_partnerpay_engine(PartnerpayEngineInfo {
                charge: ChargeInfo {
                    updated_at: "2026-02-02 02:02:02".to_owned(),
                    ..ChargeInfo::default()
                },
                workflow: wf("workflow_charge", "502", 0, "ppe-1"),
            });
        let ticket = ecotxn_charge_failed(&snap).unwrap();
        assert_eq!(ticket.stores(), [TargetStore::Ppe]);
        assert_eq!(ticket.deploy[0].key, "transaction_id");
        assert_eq!(ticket.deploy[0].key_value(), Some("ppe-1"));
        assert_eq!(ticket.deploy[1].key_value(), Some("ppe-1"));
        let updated_at: Vec<&str> =
            ticket.rollback[0].positional_params().map(|p| p.value.as_str()).collect();
        assert_eq!(updated_at, ["2026-02-02 02:02:02"]);
    }

    #[test]
    fn missing_partnerpay_or_timestamp_gives_no_ticket() {
        assert!(ecotxn_charge_failed(&TransactionSnapshot::new("tx")).is_none());
        let snap = TransactionSnapshot::new("tx")
            .with_partnerpay_engine(PartnerpayEngineInfo {
                workflow: wf("workflow_charge", "502", 0, "ppe-1"),
                ..PartnerpayEngineInfo::default()
            });
        assert!(ecotxn_charge_failed(&snap).is_none());
    }
}
