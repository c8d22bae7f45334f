// Rust guideline compliant 2026-10-18

//! The production rule set, in evaluation order.
//!
//! Order matters: the first matching rule wins, so the more specific
//! multi-store rules come before the single-store fallbacks.

use domain::Case;

use crate::Rule;

// Field paths.
const PE_WORKFLOW_ID: &str = "PaymentEngine.Workflow.WorkflowID";
const PE_STATE: &str = "PaymentEngine.Workflow.State";
const PE_ATTEMPT: &str = "PaymentEngine.Workflow.Attempt";
const PE_EXTERNAL_ID: &str = "PaymentEngine.Transfers.ExternalID";
const PC_AUTH_STATE: &str = "PaymentCore.InternalAuth.Workflow.State";
const PC_CAPTURE_WORKFLOW_ID: &str = "PaymentCore.InternalCapture.Workflow.WorkflowID";
const PC_CAPTURE_STATE: &str = "PaymentCore.InternalCapture.Workflow.State";
const PC_CAPTURE_ATTEMPT: &str = "PaymentCore.InternalCapture.Workflow.Attempt";
const PC_CAPTURE_TX_TYPE: &str = "PaymentCore.InternalCapture.TxType";
const PC_CAPTURE_TX_STATUS: &str = "PaymentCore.InternalCapture.TxStatus";
const PC_EXT_WORKFLOW_ID: &str = "PaymentCore.ExternalTransfer.Workflow.WorkflowID";
const PC_EXT_STATE: &str = "PaymentCore.ExternalTransfer.Workflow.State";
const PC_EXT_ATTEMPT: &str = "PaymentCore.ExternalTransfer.Workflow.Attempt";
const RPP_STATUS: &str = "RPPAdapter.Status";
const RPP_WORKFLOW_ID: &str = "RPPAdapter.Workflow.WorkflowID";
const RPP_STATE: &str = "RPPAdapter.Workflow.State";
const RPP_ATTEMPT: &str = "RPPAdapter.Workflow.Attempt";
const RPP_TIMESTAMPS_MATCH: &str = "RPPAdapter.CreditTransferTimestampsMatch";
const RPP_CASHIN_RETRY_ELIGIBLE: &str = "RPPAdapter.CashinRetryEligible";
const FAST_STATUS: &str = "FastAdapter.Status";
const PPE_WORKFLOW_ID: &str = "PartnerpayEngine.Workflow.WorkflowID";
const PPE_STATE: &str = "PartnerpayEngine.Workflow.State";
const PPE_ATTEMPT: &str = "PartnerpayEngine.Workflow.Attempt";
const CHARGE_STATUS_REASON: &str = "PartnerpayEngine.Charge.StatusReason";
const CHARGE_STATUS_REASON_DESCRIPTION: &str = "PartnerpayEngine.Charge.StatusReasonDescription";

// Workflow ids.
const TRANSFER_PAYMENT: &str = "workflow_transfer_payment";
const TRANSFER_COLLECTION: &str = "workflow_transfer_collection";
const EXTERNAL_PAYMENT_FLOW: &str = "external_payment_flow";
const INTERNAL_PAYMENT_FLOW: &str = "internal_payment_flow";
const CHARGE: &str = "workflow_charge";
const CASHOUT: &str = "wf_ct_cashout";
const QR_PAYMENT: &str = "wf_ct_qr_payment";
const CASHIN: &str = "wf_ct_cashin";
const RTP_CASHIN: &str = "wf_ct_rtp_cashin";
const PROCESS_REGISTRY: &str = "wf_process_registry";

const MY: &str = "my";
const SG: &str = "sg";

/// PE transfer payment workflow stuck at `state`, first attempt.
fn pe_payment(rule: Rule, state: &str) -> Rule {
    rule.eq(PE_WORKFLOW_ID, TRANSFER_PAYMENT).eq(PE_STATE, state).eq(PE_ATTEMPT, 0)
}

/// PC external transfer stuck at 201, first attempt.
fn pc_external_201(rule: Rule) -> Rule {
    rule.eq(PC_EXT_WORKFLOW_ID, EXTERNAL_PAYMENT_FLOW).eq(PC_EXT_STATE, "201").eq(PC_EXT_ATTEMPT, 0)
}

/// PC capture stuck at `state`, first attempt.
fn pc_capture(rule: Rule, state: &str) -> Rule {
    rule.eq(PC_CAPTURE_WORKFLOW_ID, INTERNAL_PAYMENT_FLOW)
        .eq(PC_CAPTURE_STATE, state)
        .eq(PC_CAPTURE_ATTEMPT, 0)
}

/// RPP cash-in workflow stuck at 100 after at least one retry.
fn cashin_retried(rule: Rule) -> Rule {
    rule.eq(RPP_WORKFLOW_ID, CASHIN).eq(RPP_STATE, "100").when(RPP_ATTEMPT, "gt", 0)
}

/// The production catalogue.
#[must_use]
pub fn default_rules() -> Vec<Rule> {
    vec![
        cashin_retried(
            Rule::new(
                Case::CashInStuck100UpdateMismatch,
                "RPP cash-in stuck at 100 with retries, payload timestamp differs from credit transfer",
            )
            .country(MY),
        )
        .eq(RPP_TIMESTAMPS_MATCH, "false"),
        cashin_retried(
            Rule::new(Case::CashInStuck100Retry, "RPP cash-in stuck at 100 with retries")
                .country(MY),
        )
        .eq(RPP_CASHIN_RETRY_ELIGIBLE, "true"),
        pc_external_201(pe_payment(
            Rule::new(
                Case::PcStuck201WaitingRppRepublishFromRpp,
                "PE 220, PC 201 waiting on an RPP cashout already at 900",
            )
            .country(MY),
            "220",
        ))
        .eq(RPP_WORKFLOW_ID, CASHOUT)
        .eq(RPP_STATE, "900")
        .eq(RPP_ATTEMPT, 0),
        Rule::new(Case::PcExternalPaymentFlow201_0Rpp900, "PE 220, PC 201, RPP reported 900")
            .country(MY)
            .eq(PE_STATE, "220")
            .eq(PE_ATTEMPT, 0)
            .ne(PE_EXTERNAL_ID, "")
            .eq(PC_EXT_STATE, "201")
            .eq(PC_EXT_ATTEMPT, 0)
            .eq(RPP_STATUS, "900"),
        Rule::new(Case::PcExternalPaymentFlow201_0Rpp210, "PE 220, PC 201, RPP not yet at 900")
            .country(MY)
            .eq(PE_STATE, "220")
            .eq(PE_ATTEMPT, 0)
            .ne(PE_EXTERNAL_ID, "")
            .eq(PC_EXT_STATE, "201")
            .eq(PC_EXT_ATTEMPT, 0)
            .ne(RPP_STATUS, "900"),
        pe_payment(
            Rule::new(
                Case::PeCaptureProcessingPcCaptureFailedRppSuccess,
                "PE 230, PC capture failed at 500, RPP succeeded",
            )
            .country(MY),
            "230",
        )
        .eq(PC_CAPTURE_WORKFLOW_ID, INTERNAL_PAYMENT_FLOW)
        .eq(PC_CAPTURE_STATE, "500")
        .eq(PC_CAPTURE_ATTEMPT, 0)
        .eq(PC_CAPTURE_TX_TYPE, "CAPTURE")
        .eq(PC_CAPTURE_TX_STATUS, "FAILED")
        .one_of(RPP_WORKFLOW_ID, [QR_PAYMENT, CASHOUT])
        .eq(RPP_STATE, "900")
        .eq(RPP_ATTEMPT, 0),
        pe_payment(
            Rule::new(Case::PeStuck300RppNotFound, "PE 300 after auth, no capture and no RPP workflow"),
            "300",
        )
        .eq(PC_AUTH_STATE, "900")
        .eq(PC_CAPTURE_WORKFLOW_ID, "")
        .eq(RPP_WORKFLOW_ID, ""),
        pc_external_201(pe_payment(
            Rule::new(Case::CashoutPe220Pc201Reject, "PE 220, PC 201, RPP still processing")
                .country(SG),
            "220",
        ))
        .eq(RPP_STATUS, "PROCESSING"),
        pc_external_201(pe_payment(
            Rule::new(Case::CashoutRpp210Pe220Pc201, "PE 220, PC 201, RPP stuck at 0 or 210")
                .country(MY),
            "220",
        ))
        .one_of(RPP_WORKFLOW_ID, [PROCESS_REGISTRY, CASHOUT, QR_PAYMENT])
        .one_of(RPP_STATE, ["0", "210"])
        .eq(RPP_ATTEMPT, 0),
        Rule::new(Case::Rpp210Pe220Pc201Accept, "RPP 210 with PE 220 and PC 201, accept")
            .country(MY)
            .eq(PE_STATE, "220")
            .eq(PC_EXT_STATE, "201")
            .eq(RPP_STATE, "210")
            .one_of(RPP_WORKFLOW_ID, [CASHOUT, QR_PAYMENT]),
        // Same conditions as the accept rule; only reachable through
        // the cashout resolution in the registry.
        Rule::new(Case::Rpp210Pe220Pc201Reject, "RPP 210 with PE 220 and PC 201, reject")
            .country(MY)
            .eq(PE_STATE, "220")
            .eq(PC_EXT_STATE, "201")
            .eq(RPP_STATE, "210")
            .one_of(RPP_WORKFLOW_ID, [CASHOUT, QR_PAYMENT]),
        pc_external_201(pe_payment(
            Rule::new(Case::Pe220Pc201Rpp0StuckInit, "PE 220, PC 201, RPP QR payment stuck at 0")
                .country(MY),
            "220",
        ))
        .eq(RPP_WORKFLOW_ID, QR_PAYMENT)
        .eq(RPP_STATE, "0"),
        pc_capture(
            pe_payment(
                Rule::new(
                    Case::ThoughtMachineFalseNegative,
                    "PE 701 while PC capture failed at 500",
                )
                .country(MY),
                "701",
            ),
            "500",
        ),
        pc_capture(
            Rule::new(
                Case::EcotxnChargeFailedCaptureFailedTmError,
                "Partnerpay charge failed on a core banking error, capture failed",
            )
            .eq(PPE_WORKFLOW_ID, CHARGE)
            .eq(PPE_STATE, "502")
            .eq(PPE_ATTEMPT, 0)
            .eq(CHARGE_STATUS_REASON, "SYSTEM_ERROR")
            .eq(CHARGE_STATUS_REASON_DESCRIPTION, "error occurred in Thought Machine."),
            "500",
        ),
        pe_payment(
            Rule::new(Case::PeStuck230RepublishPc, "PE 230 while PC capture completed at 900")
                .country(MY),
            "230",
        )
        .eq(PC_CAPTURE_STATE, "900")
        .eq(PC_CAPTURE_ATTEMPT, 0),
        Rule::new(Case::Pe220_0FastCashinFailed, "PE collection 220 after FAST cash-in failed")
            .eq(PE_WORKFLOW_ID, TRANSFER_COLLECTION)
            .eq(PE_STATE, "220")
            .eq(PE_ATTEMPT, 0)
            .eq(FAST_STATUS, "FAILED"),
        pe_payment(
            Rule::new(Case::PeTransferPayment210_0, "PE transfer payment stuck at 210"),
            "210",
        ),
        Rule::new(Case::PcExternalPaymentFlow200_11, "PC external transfer exhausted retries at 200")
            .eq(PC_EXT_STATE, "200")
            .eq(PC_EXT_ATTEMPT, 11),
        Rule::new(Case::PeStuckAtLimitCheck102_4, "PE transfer payment stuck at limit check")
            .eq(PE_STATE, "102")
            .eq(PE_WORKFLOW_ID, TRANSFER_PAYMENT),
        Rule::new(Case::RppNoResponseResume, "RPP cashout or QR payment waiting on a response")
            .country(MY)
            .eq(RPP_STATE, "210")
            .eq(RPP_ATTEMPT, 0)
            .one_of(RPP_WORKFLOW_ID, [CASHOUT, QR_PAYMENT]),
        Rule::new(Case::RppCashoutReject101_19, "RPP cashout exhausted retries at 101")
            .country(MY)
            .eq(RPP_WORKFLOW_ID, CASHOUT)
            .eq(RPP_STATE, "101")
            .eq(RPP_ATTEMPT, 19),
        Rule::new(Case::RppRtpCashinStuck200_0, "RPP RTP cash-in stuck at 200")
            .country(MY)
            .eq(RPP_WORKFLOW_ID, RTP_CASHIN)
            .eq(RPP_STATE, "200")
            .eq(RPP_ATTEMPT, 0),
        Rule::new(Case::RppCashinValidationFailed122_0, "RPP cash-in failed validation at 122")
            .country(MY)
            .eq(RPP_WORKFLOW_ID, CASHIN)
            .eq(RPP_STATE, "122")
            .eq(RPP_ATTEMPT, 0),
        Rule::new(Case::RppProcessRegistryStuckInit, "RPP process registry stuck at init")
            .country(MY)
            .eq(RPP_WORKFLOW_ID, PROCESS_REGISTRY)
            .eq(RPP_STATE, "0"),
    ]
}
