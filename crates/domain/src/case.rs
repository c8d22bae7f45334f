// Rust guideline compliant 2026-10-18

//! The closed catalogue of stuck-workflow cases.

use std::fmt;
use std::str::FromStr;

/// Classification label for one known stuck pattern and its remediation.
///
/// Two sentinels sit outside the catalogue: [`Case::Unclassified`] (the
/// classifier has not run yet) and [`Case::NotFound`] (it ran and no rule
/// matched).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Case {
    /// Classification has not been attempted.
    #[default]
    Unclassified,
    /// Classification ran and no rule matched.
    NotFound,
    PcExternalPaymentFlow200_11,
    PcExternalPaymentFlow201_0Rpp210,
    PcExternalPaymentFlow201_0Rpp900,
    PeTransferPayment210_0,
    PeStuckAtLimitCheck102_4,
    PeStuck230RepublishPc,
    ThoughtMachineFalseNegative,
    PeCaptureProcessingPcCaptureFailedRppSuccess,
    Pe220_0FastCashinFailed,
    RppCashoutReject101_19,
    RppQrPaymentReject210_0,
    RppNoResponseRejectNotFound,
    RppNoResponseResume,
    RppCashinValidationFailed122_0,
    RppRtpCashinStuck200_0,
    EcotxnChargeFailedCaptureFailedTmError,
    PeStuck300RppNotFound,
    CashoutPe220Pc201Reject,
    CashoutRpp210Pe220Pc201,
    Rpp210Pe220Pc201Accept,
    Rpp210Pe220Pc201Reject,
    Pe220Pc201Rpp0StuckInit,
    RppProcessRegistryStuckInit,
    CashInStuck100Retry,
    CashInStuck100UpdateMismatch,
    PcStuck201WaitingRppRepublishFromRpp,
}

/// Error returned when parsing an unknown case identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown case identifier: {0}")]
pub struct UnknownCase(pub String);

impl Case {
    /// Every non-sentinel case, in summary display order.
    pub const CATALOGUE: [Case; 26] = [
        Case::PcExternalPaymentFlow200_11,
        Case::PcExternalPaymentFlow201_0Rpp210,
        Case::PcExternalPaymentFlow201_0Rpp900,
        Case::PeTransferPayment210_0,
        Case::PeStuckAtLimitCheck102_4,
        Case::PeStuck230RepublishPc,
        Case::ThoughtMachineFalseNegative,
        Case::PeCaptureProcessingPcCaptureFailedRppSuccess,
        Case::Pe220_0FastCashinFailed,
        Case::RppCashoutReject101_19,
        Case::RppQrPaymentReject210_0,
        Case::RppNoResponseRejectNotFound,
        Case::RppNoResponseResume,
        Case::RppCashinValidationFailed122_0,
        Case::RppRtpCashinStuck200_0,
        Case::EcotxnChargeFailedCaptureFailedTmError,
        Case::PeStuck300RppNotFound,
        Case::CashoutPe220Pc201Reject,
        Case::CashoutRpp210Pe220Pc201,
        Case::Rpp210Pe220Pc201Accept,
        Case::Rpp210Pe220Pc201Reject,
        Case::Pe220Pc201Rpp0StuckInit,
        Case::RppProcessRegistryStuckInit,
        Case::CashInStuck100Retry,
        Case::CashInStuck100UpdateMismatch,
        Case::PcStuck201WaitingRppRepublishFromRpp,
    ];

    /// Stable string identifier, as used in reports and SQL comments.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Case::Unclassified => "",
            Case::NotFound => "NOT_FOUND",
            Case::PcExternalPaymentFlow200_11 => "pc_external_payment_flow_200_11",
            Case::PcExternalPaymentFlow201_0Rpp210 => "pc_external_payment_flow_201_0_RPP_210",
            Case::PcExternalPaymentFlow201_0Rpp900 => "pc_external_payment_flow_201_0_RPP_900",
            Case::PeTransferPayment210_0 => "pe_transfer_payment_210_0",
            Case::PeStuckAtLimitCheck102_4 => "pe_stuck_at_limit_check_102_4",
            Case::PeStuck230RepublishPc => "pe_stuck_230_republish_pc",
            Case::ThoughtMachineFalseNegative => "thought_machine_false_negative",
            Case::PeCaptureProcessingPcCaptureFailedRppSuccess => {
                "pe_capture_processing_pc_capture_failed_rpp_success"
            }
            Case::Pe220_0FastCashinFailed => "pe_220_0_fast_cashin_failed",
            Case::RppCashoutReject101_19 => "rpp_cashout_reject_101_19",
            Case::RppQrPaymentReject210_0 => "rpp_qr_payment_reject_210_0",
            Case::RppNoResponseRejectNotFound => "rpp_no_response_reject_not_found",
            Case::RppNoResponseResume => "rpp_no_response_resume",
            Case::RppCashinValidationFailed122_0 => "rpp_cashin_validation_failed_122_0",
            Case::RppRtpCashinStuck200_0 => "rpp_rtp_cashin_stuck_200_0",
            Case::EcotxnChargeFailedCaptureFailedTmError => {
                "ecotxn_ChargeFailed_CaptureFailed_TMError"
            }
            Case::PeStuck300RppNotFound => "pe_stuck_300_rpp_not_found",
            Case::CashoutPe220Pc201Reject => "cashout_pe220_pc201_reject",
            Case::CashoutRpp210Pe220Pc201 => "cashout_rpp210_pe220_pc201",
            Case::Rpp210Pe220Pc201Accept => "rpp210_pe220_pc201_accept",
            Case::Rpp210Pe220Pc201Reject => "rpp210_pe220_pc201_reject",
            Case::Pe220Pc201Rpp0StuckInit => "pe220_pc201_rpp0_stuck_init",
            Case::RppProcessRegistryStuckInit => "rpp_process_registry_stuck_init",
            Case::CashInStuck100Retry => "cash_in_stuck_100_retry",
            Case::CashInStuck100UpdateMismatch => "cash_in_stuck_100_update_mismatch",
            Case::PcStuck201WaitingRppRepublishFromRpp => {
                "pc_stuck_201_waiting_rpp_republish_from_rpp"
            }
        }
    }

    /// `true` for [`Case::Unclassified`] and [`Case::NotFound`].
    #[must_use]
    pub fn is_sentinel(self) -> bool {
        matches!(self, Case::Unclassified | Case::NotFound)
    }
}

impl fmt::Display for Case {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Case::Unclassified => f.write_str("UNCLASSIFIED"),
            other => f.write_str(other.as_str()),
        }
    }
}

impl FromStr for Case {
    type Err = UnknownCase;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == Case::NotFound.as_str() {
            return Ok(Case::NotFound);
        }
        Case::CATALOGUE
            .into_iter()
            .find(|case| case.as_str() == s)
            .ok_or_else(|| UnknownCase(s.to_owned()))
    }
}
