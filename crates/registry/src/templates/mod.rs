// Rust guideline compliant 2026-10-18

//! Per-case ticket generators, grouped by the store they mainly touch.
//!
//! Every generator re-derives the identifiers it needs from the snapshot
//! and returns `None` when one is missing. A ticket is either complete or
//! not produced at all.

mod cross_domain;
mod partnerpay;
mod payment_core;
mod payment_engine;
mod rpp;

use domain::{Case, DmlTicket, TransactionSnapshot, WorkflowCriteria, WorkflowSnapshot};

use crate::find_workflow_run_id;

/// Builds the ticket for one case.
pub(crate) type Generator = fn(&TransactionSnapshot) -> Option<DmlTicket>;

/// Generator registered for `case`.
///
/// `None` for the sentinels, for cases remediated without DML, and for the
/// cashout case that needs an operator decision (see
/// [`crate::RegistryConfig`]).
pub(crate) fn generator_for(case: Case) -> Option<Generator> {
    let generate: Generator = match case {
        Case::PcExternalPaymentFlow200_11 => payment_core::pc_external_payment_flow_200_11,
        Case::PeStuck230RepublishPc => payment_core::pe_stuck_230_republish_pc,
        Case::PeTransferPayment210_0 => payment_engine::pe_transfer_payment_210_0,
        Case::PeStuckAtLimitCheck102_4 => payment_engine::pe_stuck_at_limit_check_102_4,
        Case::Pe220_0FastCashinFailed => payment_engine::pe_220_0_fast_cashin_failed,
        Case::PeStuck300RppNotFound => payment_engine::pe_stuck_300_rpp_not_found,
        Case::CashoutPe220Pc201Reject => payment_engine::cashout_pe220_pc201_reject,
        Case::Rpp210Pe220Pc201Reject => payment_engine::rpp210_pe220_pc201_reject,
        Case::EcotxnChargeFailedCaptureFailedTmError => partnerpay::ecotxn_charge_failed,
        Case::RppCashoutReject101_19 => rpp::cashout_reject_101_19,
        Case::RppQrPaymentReject210_0 => rpp::qr_payment_reject_210_0,
        Case::RppNoResponseRejectNotFound => rpp::no_response_reject_not_found,
        Case::RppNoResponseResume => rpp::no_response_resume,
        Case::RppCashinValidationFailed122_0 => rpp::cashin_validation_failed_122_0,
        Case::RppProcessRegistryStuckInit => rpp::process_registry_stuck_init,
        Case::CashInStuck100Retry => rpp::cash_in_stuck_100_retry,
        Case::CashInStuck100UpdateMismatch => rpp::cash_in_stuck_100_update_mismatch,
        Case::PcExternalPaymentFlow201_0Rpp210 => rpp::pc_external_201_rpp_210,
        Case::PcExternalPaymentFlow201_0Rpp900 => rpp::pc_external_201_rpp_900,
        Case::Rpp210Pe220Pc201Accept => rpp::rpp210_pe220_pc201_accept,
        Case::ThoughtMachineFalseNegative => cross_domain::thought_machine_false_negative,
        Case::PeCaptureProcessingPcCaptureFailedRppSuccess => {
            cross_domain::pe_capture_processing_rpp_success
        }
        Case::Pe220Pc201Rpp0StuckInit => cross_domain::pe220_pc201_rpp0_stuck_init,
        Case::RppRtpCashinStuck200_0 => cross_domain::rtp_cashin_stuck_200_0,
        Case::CashoutRpp210Pe220Pc201
        | Case::PcStuck201WaitingRppRepublishFromRpp
        | Case::Unclassified
        | Case::NotFound => return None,
    };
    Some(generate)
}

// ---------------------------------------------------------------------------
// Identifier lookups
// ---------------------------------------------------------------------------

fn run_id_of(wf: &WorkflowSnapshot) -> Option<&str> {
    Some(wf.run_id.as_str()).filter(|id| !id.is_empty())
}

fn pe_workflow(snapshot: &TransactionSnapshot) -> Option<&WorkflowSnapshot> {
    snapshot.payment_engine.as_ref().map(|pe| &pe.workflow)
}

fn pe_run_id(snapshot: &TransactionSnapshot) -> Option<&str> {
    pe_workflow(snapshot).and_then(run_id_of)
}

fn pc_external_run_id(snapshot: &TransactionSnapshot) -> Option<&str> {
    snapshot.payment_core.as_ref().and_then(|pc| run_id_of(&pc.external_transfer.workflow))
}

fn pc_capture_run_id(snapshot: &TransactionSnapshot) -> Option<&str> {
    snapshot.payment_core.as_ref().and_then(|pc| run_id_of(&pc.internal_capture.workflow))
}

/// Run id of the PC `internal_payment_flow`: the capture leg when present,
/// the auth leg otherwise.
fn internal_payment_flow_run_id(snapshot: &TransactionSnapshot) -> Option<&str> {
    let pc = snapshot.payment_core.as_ref()?;
    [&pc.internal_capture.workflow, &pc.internal_auth.workflow]
        .into_iter()
        .filter(|wf| wf.workflow_id == "internal_payment_flow")
        .find_map(run_id_of)
}

fn rpp_run_id<'a>(snapshot: &'a TransactionSnapshot, criteria: &WorkflowCriteria<'_>) -> Option<&'a str> {
    find_workflow_run_id(&snapshot.rpp_adapter.as_ref()?.workflow, criteria)
}


#[cfg(test)]
mod tests {
    use super::fixtures::{payment_core, wf};
    use super::{generator_for, internal_payment_flow_run_id};
    use domain::{Case, InternalTxInfo, TransactionSnapshot};

    #[test]
    fn every_catalogue_case_but_two_has_a_generator() {
        let missing: Vec<Case> =
            Case::CATALOGUE.into_iter().filter(|c| generator_for(*c).is_none()).collect();
        assert_eq!(
            missing,
            [Case::CashoutRpp210Pe220Pc201, Case::PcStuck201WaitingRppRepublishFromRpp]
        );
    }

    #[test]
    fn internal_payment_flow_prefers_capture() {
        let mut pc = payment_core(None, Some(wf("internal_payment_flow", "900", 0, "cap-1")));
        pc.internal_auth =
            InternalTxInfo { workflow: wf("internal_payment_flow", "900", 0, "auth-1"), ..InternalTxInfo::default() };
        let mut snap = TransactionSnapshot::new("tx").with_payment_core(pc);
        assert_eq!(internal_payment_flow_run_id(&snap), Some("cap-1"));

        if let Some(pc) = snap.payment_core.as_mut() {
            pc.internal_capture.workflow = wf("", "", 0, "");
        }
        assert_eq!(internal_payment_flow_run_id(&snap), Some("auth-1"));
    }
}
