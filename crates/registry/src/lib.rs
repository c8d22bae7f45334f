// Rust guideline compliant 2026-10-18

//! Case to template registry.
//!
//! [`TemplateRegistry`] maps a classified [`TransactionSnapshot`] to the
//! [`DmlTicket`] that remediates it: one deploy fragment and its rollback
//! per change, each targeting a single store. Generators are hand-written
//! per case and never produce a partial ticket.

pub mod mysql_json;
mod templates;

use domain::{Case, DmlTicket, TransactionSnapshot, WorkflowCriteria, WorkflowSnapshot};

/// Run id of the first workflow in `workflows` satisfying `criteria`.
///
/// Returns `None` when nothing matches or the match has an empty run id.
#[must_use]
pub fn find_workflow_run_id<'a>(
    workflows: &'a [WorkflowSnapshot],
    criteria: &WorkflowCriteria<'_>,
) -> Option<&'a str> {
    workflows
        .iter()
        .find(|wf| wf.matches(criteria))
        .map(|wf| wf.run_id.as_str())
        .filter(|id| !id.is_empty())
}

// ---------------------------------------------------------------------------
// RegistryError
// ---------------------------------------------------------------------------

/// Errors raised while configuring a [`TemplateRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A configuration value is out of range.
    #[error("invalid registry config: {reason}")]
    InvalidConfig {
        /// Human-readable description of the problem.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// RegistryConfig
// ---------------------------------------------------------------------------

/// Operator decision for a cashout stuck with RPP at 210 and PE/PC waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Resume the RPP workflow.
    Accept,
    /// Reject the PE payment.
    Reject,
}

impl Resolution {
    /// Case whose generator applies this decision.
    #[must_use]
    pub fn remediation(self) -> Case {
        match self {
            Resolution::Accept => Case::Rpp210Pe220Pc201Accept,
            Resolution::Reject => Case::Rpp210Pe220Pc201Reject,
        }
    }
}

/// Validated registry configuration.
#[derive(Debug, Clone, Default)]
pub struct RegistryConfig {
    /// Decision for [`Case::CashoutRpp210Pe220Pc201`]. Unset skips the case.
    pub cashout_rpp210_resolution: Option<Resolution>,
    /// Cases for which no ticket is generated.
    pub disabled: Vec<Case>,
}

/// Builder for [`RegistryConfig`].
///
/// Obtain via [`RegistryConfig::builder`]; finalize with [`build`](Self::build).
#[derive(Debug, Default)]
pub struct RegistryConfigBuilder {
    cashout_rpp210_resolution: Option<Resolution>,
    disabled: Vec<Case>,
}

impl RegistryConfig {
    /// Start a builder with no cashout decision and nothing disabled.
    #[must_use]
    pub fn builder() -> RegistryConfigBuilder {
        RegistryConfigBuilder::default()
    }
}

impl RegistryConfigBuilder {
    /// Decide how [`Case::CashoutRpp210Pe220Pc201`] is remediated.
    #[must_use]
    pub fn cashout_rpp210_resolution(mut self, resolution: Resolution) -> Self {
        self.cashout_rpp210_resolution = Some(resolution);
        self
    }

    /// Never generate a ticket for `case`.
    #[must_use]
    pub fn disable(mut self, case: Case) -> Self {
        if !self.disabled.contains(&case) {
            self.disabled.push(case);
        }
        self
    }

    /// Validate and build the [`RegistryConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidConfig`] when a sentinel case is
    /// disabled; sentinels never have a ticket to begin with.
    #[must_use = "the Result must be checked; use ? or unwrap"]
    pub fn build(self) -> Result<RegistryConfig, RegistryError> {
        if let Some(case) = self.disabled.iter().find(|c| c.is_sentinel()) {
            return Err(RegistryError::InvalidConfig {
                reason: format!("{case} is not a catalogue case"),
            });
        }
        Ok(RegistryConfig {
            cashout_rpp210_resolution: self.cashout_rpp210_resolution,
            disabled: self.disabled,
        })
    }
}

// ---------------------------------------------------------------------------
// TemplateRegistry
// ---------------------------------------------------------------------------

/// Looks up and runs the ticket generator for a snapshot's case.
///
/// Stateless apart from its configuration; shareable behind an `Arc`.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    config: RegistryConfig,
}

impl TemplateRegistry {
    #[must_use]
    pub fn new(config: RegistryConfig) -> Self {
        Self { config }
    }

    /// Case whose generator remediates `case`, after applying the
    /// configuration. `None` when `case` gets no ticket.
    fn remediation(&self, case: Case) -> Option<Case> {
        if self.config.disabled.contains(&case) {
            return None;
        }
        match case {
            Case::CashoutRpp210Pe220Pc201 => {
                self.config.cashout_rpp210_resolution.map(Resolution::remediation)
            }
            other => Some(other),
        }
    }

    /// `true` when a ticket can be generated for `case` under this
    /// configuration.
    #[must_use]
    pub fn has_generator(&self, case: Case) -> bool {
        self.remediation(case).and_then(templates::generator_for).is_some()
    }

    /// Ticket remediating `snapshot`, or `None`.
    ///
    /// Snapshots with a population error or a sentinel case are skipped.
    /// A resolved cashout ticket carries the case of the remediation
    /// applied.
    #[must_use]
    pub fn generate(&self, snapshot: &TransactionSnapshot) -> Option<DmlTicket> {
        if let Some(reason) = snapshot.error() {
            tracing::debug!(
                "registry.skip: input_id={} reason={reason:?}",
                snapshot.input_id
            );
            return None;
        }
        let case = snapshot.case();
        if case.is_sentinel() {
            return None;
        }
        if case == Case::CashoutRpp210Pe220Pc201 && self.config.cashout_rpp210_resolution.is_none() {
            tracing::warn!(
                "registry.unresolved: input_id={} case={case} needs --cashout-rpp210 accept|reject",
                snapshot.input_id
            );
            return None;
        }
        let Some(generate) = self.remediation(case).and_then(templates::generator_for) else {
            tracing::debug!("registry.no_generator: input_id={} case={case}", snapshot.input_id);
            return None;
        };
        let ticket = generate(snapshot);
        if ticket.is_none() {
            tracing::debug!(
                "registry.no_ticket: input_id={} case={case} reason=missing identifier",
                snapshot.input_id
            );
        }
        ticket
    }
}
