// Rust guideline compliant 2026-10-18

//! Case classifier for stuck payment workflows.
//!
//! [`Classifier`] evaluates an ordered [`RuleCatalogue`] against a
//! [`TransactionSnapshot`] and assigns the first matching [`Case`]. It does
//! no I/O, holds no mutable state and always returns a case, falling back to
//! [`Case::NotFound`].

mod catalogue;
mod path;
mod rule;
mod value;

use domain::{Case, TransactionSnapshot};

pub use catalogue::default_rules;
pub use path::FieldPath;
pub use rule::{Condition, Operator, Rule, RuleCatalogue, RuleCatalogueBuilder};
pub use value::Value;

// ---------------------------------------------------------------------------
// ClassifierError
// ---------------------------------------------------------------------------

/// Errors raised while building a [`RuleCatalogue`].
///
/// Classification itself never fails.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClassifierError {
    /// A rule was rejected in strict mode.
    #[error("invalid rule for {case}: {condition}: {reason}")]
    InvalidRule {
        /// Case the rule assigns.
        case: Case,
        /// Offending condition, empty when the rule itself is at fault.
        condition: String,
        /// Human-readable description.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// Assigns a [`Case`] to snapshots using a fixed [`RuleCatalogue`].
///
/// Shareable across worker tasks behind an `Arc`.
#[derive(Debug)]
pub struct Classifier {
    catalogue: RuleCatalogue,
}

impl Classifier {
    /// Create a classifier that owns `catalogue`.
    #[must_use]
    pub fn new(catalogue: RuleCatalogue) -> Self {
        Self { catalogue }
    }

    /// The catalogue in use.
    #[must_use]
    pub fn catalogue(&self) -> &RuleCatalogue {
        &self.catalogue
    }

    /// Case the catalogue assigns to `snapshot` for `region`, without
    /// touching the snapshot.
    ///
    /// Returns [`Case::NotFound`] when no rule matches.
    #[must_use]
    pub fn evaluate(&self, snapshot: &TransactionSnapshot, region: &str) -> Case {
        match self.catalogue.first_match(snapshot, region) {
            Some(rule) => {
                tracing::debug!(
                    "classifier.match: input_id={} case={} rule={:?}",
                    snapshot.input_id,
                    rule.case,
                    rule.description
                );
                rule.case
            }
            None => Case::NotFound,
        }
    }

    /// Classify `snapshot` and record the result on it.
    ///
    /// A snapshot that already carries a case keeps it; the catalogue is not
    /// consulted again.
    pub fn classify(&self, snapshot: &mut TransactionSnapshot, region: &str) -> Case {
        if !snapshot.case().is_sentinel() {
            return snapshot.case();
        }
        let case = self.evaluate(snapshot, region);
        let case = snapshot.assign_case(case);
        tracing::info!("classifier.classify: input_id={} case={case}", snapshot.input_id);
        case
    }
}

#[cfg(test)]
mod tests {
    use super::{Classifier, Rule, RuleCatalogue};
    use domain::{
        Case, ChargeInfo, ExternalTxInfo, InternalTxInfo, PartnerpayEngineInfo, PaymentCoreInfo,
        PaymentEngineInfo, RppAdapterInfo, TransactionSnapshot, TransferInfo, WorkflowSnapshot,
    };

    fn wf(workflow_id: &str, state: &str, attempt: i64, run_id: &str) -> WorkflowSnapshot {
        WorkflowSnapshot {
            workflow_id: workflow_id.to_owned(),
            state: state.to_owned(),
            attempt,
            run_id: run_id.to_owned(),
            ..WorkflowSnapshot::default()
        }
    }

    fn standard() -> Classifier {
        Classifier::new(RuleCatalogue::standard().unwrap())
    }

    fn with_rpp(workflows: Vec<WorkflowSnapshot>) -> TransactionSnapshot {
        TransactionSnapshot::new("tx-1")
            .with_rpp_adapter(RppAdapterInfo { workflow: workflows, ..RppAdapterInfo::default() })
    }

    fn pe_pc_stuck(rpp_status: &str) -> TransactionSnapshot {
        TransactionSnapshot::new("tx-1")
            .with_payment_engine(PaymentEngineInfo {
                transfers: TransferInfo { external_id: "EXT-1".to_owned(), ..TransferInfo::default() },
                workflow: wf("workflow_transfer_payment", "220", 0, "pe-1"),
            })
            .with_payment_core(PaymentCoreInfo {
                external_transfer: ExternalTxInfo {
                    workflow: wf("external_payment_flow", "201", 0, "pc-1"),
                    ..ExternalTxInfo::default()
                },
                ..PaymentCoreInfo::default()
            })
            .with_rpp_adapter(RppAdapterInfo {
                status: rpp_status.to_owned(),
                workflow: vec![wf("wf_ct_cashout", "210", 0, "r1")],
                ..RppAdapterInfo::default()
            })
    }

    // CL-T01: idempotence

    #[test]
    fn classification_is_write_once() {
        let classifier = standard();
        let mut snap = with_rpp(vec![wf("wf_ct_cashout", "210", 0, "r1")]);
        let first = classifier.classify(&mut snap, "my");
        assert_eq!(first, Case::RppNoResponseResume);

        // Different region would no longer match, but the case is kept.
        assert_eq!(classifier.classify(&mut snap, "sg"), first);
        assert_eq!(snap.case(), first);
    }

    #[test]
    fn preassigned_case_is_never_overwritten() {
        let classifier = standard();
        let mut snap = with_rpp(vec![wf("wf_ct_cashout", "210", 0, "r1")]);
        snap.assign_case(Case::PeTransferPayment210_0);
        assert_eq!(classifier.classify(&mut snap, "my"), Case::PeTransferPayment210_0);
    }

    #[test]
    fn no_match_records_not_found() {
        let classifier = standard();
        let mut snap = TransactionSnapshot::new("tx-1");
        assert_eq!(classifier.classify(&mut snap, "my"), Case::NotFound);
        assert_eq!(snap.case(), Case::NotFound);
        assert_eq!(snap.case().to_string(), "NOT_FOUND");
    }

    #[test]
    fn evaluate_leaves_snapshot_untouched() {
        let classifier = standard();
        let snap = with_rpp(vec![wf("wf_ct_cashout", "210", 0, "r1")]);
        assert_eq!(classifier.evaluate(&snap, "my"), Case::RppNoResponseResume);
        assert_eq!(snap.case(), Case::Unclassified);
    }

    // CL-T02: existential match and absent sub-records

    #[test]
    fn no_response_resume_matches_on_any_rpp_workflow() {
        let classifier = standard();
        let mut snap = with_rpp(vec![
            wf("wf_process_registry", "900", 0, "r0"),
            wf("wf_ct_cashout", "210", 0, "r1"),
        ]);
        assert_eq!(classifier.classify(&mut snap, "my"), Case::RppNoResponseResume);
    }

    #[test]
    fn region_gates_country_rules() {
        let classifier = standard();
        let mut snap = with_rpp(vec![wf("wf_ct_cashout", "210", 0, "r1")]);
        assert_eq!(classifier.classify(&mut snap, "sg"), Case::NotFound);
    }

    #[test]
    fn pe_stuck_300_requires_absent_capture_and_rpp() {
        let classifier = standard();
        let mut snap = TransactionSnapshot::new("tx-1")
            .with_payment_engine(PaymentEngineInfo {
                workflow: wf("workflow_transfer_payment", "300", 0, "pe-1"),
                ..PaymentEngineInfo::default()
            })
            .with_payment_core(PaymentCoreInfo {
                internal_auth: InternalTxInfo {
                    workflow: wf("internal_payment_flow", "900", 0, "auth-1"),
                    ..InternalTxInfo::default()
                },
                ..PaymentCoreInfo::default()
            });
        assert_eq!(classifier.classify(&mut snap, ""), Case::PeStuck300RppNotFound);

        let mut with_rpp_row = snap.clone();
        with_rpp_row.rpp_adapter = Some(RppAdapterInfo {
            workflow: vec![wf("wf_ct_cashout", "900", 0, "r1")],
            ..RppAdapterInfo::default()
        });
        assert_eq!(classifier.evaluate(&with_rpp_row, ""), Case::NotFound);
    }

    // CL-T03: catalogue order

    #[test]
    fn rpp_status_splits_pc_external_201_cases() {
        let classifier = standard();
        assert_eq!(classifier.evaluate(&pe_pc_stuck("900"), "my"), Case::PcExternalPaymentFlow201_0Rpp900);
        assert_eq!(
            classifier.evaluate(&pe_pc_stuck("PROCESSING"), "my"),
            Case::PcExternalPaymentFlow201_0Rpp210
        );
    }

    #[test]
    fn cashout_rule_applies_without_external_id() {
        let classifier = standard();
        let mut snap = pe_pc_stuck("PROCESSING");
        if let Some(pe) = snap.payment_engine.as_mut() {
            pe.transfers.external_id.clear();
        }
        assert_eq!(classifier.evaluate(&snap, "my"), Case::CashoutRpp210Pe220Pc201);
        assert_eq!(classifier.evaluate(&snap, "sg"), Case::CashoutPe220Pc201Reject);
    }

    #[test]
    fn ecotxn_rule_is_universal() {
        let classifier = standard();
        let snap = TransactionSnapshot::new("tx-1")
            .with_payment_core(PaymentCoreInfo {
                internal_capture: InternalTxInfo {
                    workflow: wf("internal_payment_flow", "500", 0, "cap-1"),
                    ..InternalTxInfo::default()
                },
                ..PaymentCoreInfo::default()
            })
            .with_partnerpay_engine(PartnerpayEngineInfo {
                charge: ChargeInfo {
                    status_reason: "SYSTEM_ERROR".to_owned(),
                    status_reason_description: "error occurred in Thought Machine.".to_owned(),
                    ..ChargeInfo::default()
                },
                workflow: wf("workflow_charge", "502", 0, "ch-1"),
            });
        assert_eq!(classifier.evaluate(&snap, "sg"), Case::EcotxnChargeFailedCaptureFailedTmError);
    }

    #[test]
    fn cash_in_mismatch_precedes_retry() {
        let classifier = standard();
        let mut cashin = wf("wf_ct_cashin", "100", 3, "c1");
        cashin.data = r#"{"CreditTransfer":{"UpdatedAt":"2026-01-02 11:00:05"}}"#.to_owned();
        let mut snap = with_rpp(vec![cashin]);
        if let Some(rpp) = snap.rpp_adapter.as_mut() {
            rpp.credit_transfer_updated_at = Some("2026-01-02 03:00:00".to_owned());
        }
        assert_eq!(classifier.evaluate(&snap, "my"), Case::CashInStuck100UpdateMismatch);

        if let Some(rpp) = snap.rpp_adapter.as_mut() {
            rpp.credit_transfer_updated_at = Some("2026-01-02 03:00:05".to_owned());
        }
        assert_eq!(classifier.evaluate(&snap, "my"), Case::CashInStuck100Retry);
    }

    #[test]
    fn cash_in_with_empty_payload_is_not_retried() {
        let classifier = standard();
        let snap = with_rpp(vec![wf("wf_ct_cashin", "100", 3, "c1")]);
        assert_eq!(classifier.evaluate(&snap, "my"), Case::NotFound);
    }

    #[test]
    fn cash_in_with_malformed_payload_is_retried() {
        let classifier = standard();
        let mut cashin = wf("wf_ct_cashin", "100", 2, "c1");
        cashin.data = "not json".to_owned();
        let mut snap = with_rpp(vec![cashin]);
        if let Some(rpp) = snap.rpp_adapter.as_mut() {
            rpp.credit_transfer_updated_at = Some("2026-01-02 03:00:00".to_owned());
        }
        assert_eq!(classifier.evaluate(&snap, "my"), Case::CashInStuck100Retry);
    }

    #[test]
    fn custom_catalogue() {
        let catalogue = RuleCatalogue::builder()
            .rule(Rule::new(Case::PeTransferPayment210_0, "custom").eq("PaymentEngine.Workflow.State", "210"))
            .build()
            .unwrap();
        let classifier = Classifier::new(catalogue);
        let snap = TransactionSnapshot::new("tx-1")
            .with_payment_engine(PaymentEngineInfo {
                workflow: wf("anything", "210", 9, "pe-1"),
                ..PaymentEngineInfo::default()
            });
        assert_eq!(classifier.evaluate(&snap, "sg"), Case::PeTransferPayment210_0);
        assert_eq!(classifier.catalogue().len(), 1);
    }
}
