// Rust guideline compliant 2026-10-18

//! Ticket consolidation and SQL generation.
//!
//! A batch yields many [`DmlTicket`]s that share template text and differ
//! only by key value. [`Consolidator`] groups deploy/rollback pairs of
//! identical shape, accumulates their key values in first-seen order and
//! renders one statement per group with a multi-value `IN` clause.
//!
//! Rendering happens completely before anything is written: a failing group
//! fails the whole [`render`](Consolidator::render).

mod render;

use std::collections::HashMap;

use domain::{ArtifactBlock, Case, Direction, DmlTicket, ParamKind, TargetStore, TemplateInfo};

use render::{Fragment, Patterns, RenderFault, split_comment};

// ---------------------------------------------------------------------------
// ConsolidationError
// ---------------------------------------------------------------------------

/// Errors from ticket consolidation.
///
/// Every variant names the case(s) and, where relevant, the store at fault.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConsolidationError {
    /// A configuration value is out of range.
    #[error("invalid consolidator config: {reason}")]
    InvalidConfig {
        /// Human-readable description of the problem.
        reason: String,
    },
    /// The ticket carries no fragment.
    #[error("{case}: ticket has no fragments")]
    EmptyTicket { case: Case },
    /// Deploy and rollback fragment counts differ.
    #[error("{case}: {deploy} deploy fragment(s) but {rollback} rollback fragment(s)")]
    UnpairedTicket { case: Case, deploy: usize, rollback: usize },
    /// A fragment targets a store outside the configured set.
    #[error("{case}: store {store} is not configured")]
    UnknownStore { case: Case, store: TargetStore },
    /// A deploy fragment and its rollback disagree on the key.
    #[error("{case}: {store} key mismatch: {reason}")]
    KeyMismatch { case: Case, store: TargetStore, reason: String },
    /// The template has no key predicate to widen.
    #[error("{cases}: {store} template: {reason}")]
    KeyPredicate { cases: String, store: TargetStore, reason: String },
    /// Placeholders and declared parameters do not line up.
    #[error("{cases}: {store} placeholder mismatch: {reason}")]
    PlaceholderMismatch { cases: String, store: TargetStore, reason: String },
    /// A marker survived substitution.
    #[error("{cases}: {store} statement still contains {placeholder}")]
    LeftoverPlaceholder { cases: String, store: TargetStore, placeholder: String },
}

impl ConsolidationError {
    fn from_fault(fault: RenderFault, cases: &[Case], store: TargetStore) -> Self {
        let cases = case_list(cases);
        match fault {
            RenderFault::KeyPredicate(reason) => Self::KeyPredicate { cases, store, reason },
            RenderFault::Placeholder(reason) => Self::PlaceholderMismatch { cases, store, reason },
            RenderFault::Leftover(placeholder) => {
                Self::LeftoverPlaceholder { cases, store, placeholder }
            }
        }
    }
}

fn case_list(cases: &[Case]) -> String {
    cases.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

// ---------------------------------------------------------------------------
// ConsolidatorConfig
// ---------------------------------------------------------------------------

/// Validated consolidator configuration.
#[derive(Debug, Clone)]
pub struct ConsolidatorConfig {
    stores: Vec<TargetStore>,
    patterns: Patterns,
}

/// Builder for [`ConsolidatorConfig`].
///
/// Obtain via [`ConsolidatorConfig::builder`]; finalize with [`build`](Self::build).
#[derive(Debug)]
pub struct ConsolidatorConfigBuilder {
    stores: Vec<TargetStore>,
}

impl ConsolidatorConfig {
    /// Start a builder accepting every [`TargetStore`].
    #[must_use]
    pub fn builder() -> ConsolidatorConfigBuilder {
        ConsolidatorConfigBuilder { stores: TargetStore::ALL.to_vec() }
    }

    /// Stores accepted by this configuration.
    #[must_use]
    pub fn stores(&self) -> &[TargetStore] {
        &self.stores
    }
}

impl ConsolidatorConfigBuilder {
    /// Restrict the accepted stores.
    #[must_use]
    pub fn stores(mut self, stores: impl IntoIterator<Item = TargetStore>) -> Self {
        self.stores = stores.into_iter().collect();
        self
    }

    /// Validate and build the [`ConsolidatorConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConsolidationError::InvalidConfig`] when no store is
    /// accepted.
    #[must_use = "the Result must be checked; use ? or unwrap"]
    pub fn build(mut self) -> Result<ConsolidatorConfig, ConsolidationError> {
        self.stores.sort_unstable();
        self.stores.dedup();
        if self.stores.is_empty() {
            return Err(ConsolidationError::InvalidConfig {
                reason: "at least one store must be accepted".to_owned(),
            });
        }
        let patterns = Patterns::compile()
            .map_err(|e| ConsolidationError::InvalidConfig { reason: e.to_string() })?;
        Ok(ConsolidatorConfig { stores: self.stores, patterns })
    }
}

// ---------------------------------------------------------------------------
// SqlPlan
// ---------------------------------------------------------------------------

/// One rendered statement pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedGroup {
    /// Cases whose tickets were merged, in first-seen order.
    pub cases: Vec<Case>,
    /// Key values covered by both statements, in first-seen order.
    pub keys: Vec<String>,
    pub deploy_store: TargetStore,
    pub deploy: String,
    pub rollback_store: TargetStore,
    pub rollback: String,
}

/// Every rendered statement of a batch, in first-seen group order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SqlPlan {
    pub groups: Vec<RenderedGroup>,
}

impl SqlPlan {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Statements for `store` in `direction`.
    #[must_use]
    pub fn statements(&self, store: TargetStore, direction: Direction) -> Vec<&str> {
        self.groups
            .iter()
            .filter_map(|g| match direction {
                Direction::Deploy => (g.deploy_store == store).then_some(g.deploy.as_str()),
                Direction::Rollback => (g.rollback_store == store).then_some(g.rollback.as_str()),
            })
            .collect()
    }

    /// One [`ArtifactBlock`] per store and direction with statements, each
    /// headed by `header`. Stores follow [`TargetStore::ALL`].
    #[must_use]
    pub fn blocks(&self, header: &str) -> Vec<ArtifactBlock> {
        let mut blocks = Vec::new();
        for store in TargetStore::ALL {
            for direction in [Direction::Deploy, Direction::Rollback] {
                let statements = self.statements(store, direction);
                if statements.is_empty() {
                    continue;
                }
                blocks.push(ArtifactBlock {
                    store,
                    direction,
                    header: header.to_owned(),
                    statements: statements.into_iter().map(str::to_owned).collect(),
                });
            }
        }
        blocks
    }
}

// ---------------------------------------------------------------------------
// Consolidator
// ---------------------------------------------------------------------------

/// Grouping key: the shapes of a deploy fragment and its rollback.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct GroupKey {
    deploy: Fragment,
    rollback: Fragment,
}

#[derive(Debug)]
struct Group {
    key: GroupKey,
    cases: Vec<Case>,
    deploy_comment: String,
    rollback_comment: String,
    keys: Vec<String>,
}

/// Split fragment plus its key value, ready for grouping.
struct Prepared {
    comment: String,
    fragment: Fragment,
    key_value: Option<String>,
}

fn prepare(template: &TemplateInfo) -> Prepared {
    let (comment, body) = split_comment(&template.sql_template);
    let key_kind = template
        .params
        .iter()
        .find(|p| p.name == template.key)
        .map_or(ParamKind::Text, |p| p.kind);
    Prepared {
        comment,
        fragment: Fragment {
            store: template.target_store,
            body,
            key: template.key.clone(),
            key_kind,
            params: template.positional_params().cloned().collect(),
        },
        key_value: template.key_value().filter(|v| !v.is_empty()).map(str::to_owned),
    }
}

/// Accumulates tickets and renders them into a [`SqlPlan`].
///
/// # Examples
///
/// ```
/// use consolidator::{Consolidator, ConsolidatorConfig};
/// use domain::{Case, DmlTicket, TargetStore, TemplateInfo};
///
/// let ticket = |run_id: &str| {
///     DmlTicket::new(Case::RppNoResponseResume).pair(
///         TemplateInfo::for_run(TargetStore::Rpp, "UPDATE t SET s = 1 WHERE run_id = {run_id};", run_id),
///         TemplateInfo::for_run(TargetStore::Rpp, "UPDATE t SET s = 0 WHERE run_id = {run_id};", run_id),
///     )
/// };
/// let mut consolidator = Consolidator::new(ConsolidatorConfig::builder().build()?);
/// consolidator.add(&ticket("A"))?;
/// consolidator.add(&ticket("B"))?;
/// let plan = consolidator.render()?;
/// assert_eq!(plan.groups[0].deploy, "UPDATE t SET s = 1 WHERE run_id IN ('A', 'B');");
/// # Ok::<(), consolidator::ConsolidationError>(())
/// ```
#[derive(Debug)]
pub struct Consolidator {
    config: ConsolidatorConfig,
    groups: Vec<Group>,
    index: HashMap<GroupKey, usize>,
    tickets: usize,
}

impl Consolidator {
    #[must_use]
    pub fn new(config: ConsolidatorConfig) -> Self {
        Self { config, groups: Vec::new(), index: HashMap::new(), tickets: 0 }
    }

    /// Number of tickets accepted so far.
    #[must_use]
    pub fn tickets(&self) -> usize {
        self.tickets
    }

    /// Accept every fragment pair of `ticket`, or none of them.
    ///
    /// # Errors
    ///
    /// Returns [`ConsolidationError::EmptyTicket`],
    /// [`ConsolidationError::UnpairedTicket`],
    /// [`ConsolidationError::UnknownStore`] or
    /// [`ConsolidationError::KeyMismatch`]; the consolidator is left
    /// unchanged.
    pub fn add(&mut self, ticket: &DmlTicket) -> Result<(), ConsolidationError> {
        let case = ticket.case;
        if ticket.deploy.is_empty() && ticket.rollback.is_empty() {
            return Err(ConsolidationError::EmptyTicket { case });
        }
        if ticket.deploy.len() != ticket.rollback.len() {
            return Err(ConsolidationError::UnpairedTicket {
                case,
                deploy: ticket.deploy.len(),
                rollback: ticket.rollback.len(),
            });
        }

        let mut pairs = Vec::with_capacity(ticket.deploy.len());
        for (deploy, rollback) in ticket.deploy.iter().zip(&ticket.rollback) {
            for store in [deploy.target_store, rollback.target_store] {
                if !self.config.stores.contains(&store) {
                    return Err(ConsolidationError::UnknownStore { case, store });
                }
            }
            let deploy = prepare(deploy);
            let rollback = prepare(rollback);
            let store = deploy.fragment.store;
            let key_value = match (&deploy.key_value, &rollback.key_value) {
                (Some(d), Some(r)) if d == r => d.clone(),
                (Some(d), Some(r)) => {
                    return Err(ConsolidationError::KeyMismatch {
                        case,
                        store,
                        reason: format!("deploy {d:?} vs rollback {r:?}"),
                    });
                }
                (d, _) => {
                    let side = if d.is_none() { "deploy" } else { "rollback" };
                    return Err(ConsolidationError::KeyMismatch {
                        case,
                        store,
                        reason: format!("{side} has no value for {}", deploy.fragment.key),
                    });
                }
            };
            pairs.push((deploy, rollback, key_value));
        }

        for (deploy, rollback, key_value) in pairs {
            let key = GroupKey { deploy: deploy.fragment, rollback: rollback.fragment };
            let slot = match self.index.get(&key) {
                Some(&slot) => slot,
                None => {
                    self.groups.push(Group {
                        key: key.clone(),
                        cases: Vec::new(),
                        deploy_comment: deploy.comment,
                        rollback_comment: rollback.comment,
                        keys: Vec::new(),
                    });
                    self.index.insert(key, self.groups.len() - 1);
                    self.groups.len() - 1
                }
            };
            let group = &mut self.groups[slot];
            if !group.cases.contains(&case) {
                group.cases.push(case);
            }
            if !group.keys.contains(&key_value) {
                group.keys.push(key_value);
            }
        }
        self.tickets += 1;
        tracing::debug!(
            "consolidator.add: case={case} fragments={} groups={}",
            ticket.deploy.len(),
            self.groups.len()
        );
        Ok(())
    }

    /// Render every group.
    ///
    /// An empty consolidator renders an empty plan.
    ///
    /// # Errors
    ///
    /// Returns [`ConsolidationError::KeyPredicate`],
    /// [`ConsolidationError::PlaceholderMismatch`] or
    /// [`ConsolidationError::LeftoverPlaceholder`] for the first group that
    /// fails; nothing is rendered in that case.
    pub fn render(&self) -> Result<SqlPlan, ConsolidationError> {
        let patterns = &self.config.patterns;
        let mut groups = Vec::with_capacity(self.groups.len());
        for group in &self.groups {
            let GroupKey { deploy, rollback } = &group.key;
            let deploy_sql = deploy
                .render(&group.deploy_comment, &group.keys, patterns)
                .map_err(|f| ConsolidationError::from_fault(f, &group.cases, deploy.store))?;
            let rollback_sql = rollback
                .render(&group.rollback_comment, &group.keys, patterns)
                .map_err(|f| ConsolidationError::from_fault(f, &group.cases, rollback.store))?;
            groups.push(RenderedGroup {
                cases: group.cases.clone(),
                keys: group.keys.clone(),
                deploy_store: deploy.store,
                deploy: deploy_sql,
                rollback_store: rollback.store,
                rollback: rollback_sql,
            });
        }
        tracing::info!(
            "consolidator.render: tickets={} statements={}",
            self.tickets,
            groups.len()
        );
        Ok(SqlPlan { groups })
    }
}

/// One-shot consolidation of `tickets`.
///
/// # Errors
///
/// Any error of [`Consolidator::add`] or [`Consolidator::render`].
pub fn consolidate<'a>(
    config: ConsolidatorConfig,
    tickets: impl IntoIterator<Item = &'a DmlTicket>,
) -> Result<SqlPlan, ConsolidationError> {
    let mut consolidator = Consolidator::new(config);
    for ticket in tickets {
        consolidator.add(ticket)?;
    }
    consolidator.render()
}

#[cfg(test)]
mod tests {
    use super::{ConsolidationError, Consolidator, ConsolidatorConfig, consolidate};
    use domain::{Case, Direction, DmlTicket, ParamInfo, TargetStore, TemplateInfo};

    const DEPLOY: &str = "-- resume
UPDATE workflow_execution SET state = 222 WHERE run_id = {run_id};";
    const ROLLBACK: &str = "UPDATE workflow_execution SET state = 210 WHERE run_id = {run_id};";

    fn config() -> ConsolidatorConfig {
        ConsolidatorConfig::builder().build().unwrap()
    }

    fn resume(run_id: &str) -> DmlTicket {
        DmlTicket::new(Case::RppNoResponseResume).pair(
            TemplateInfo::for_run(TargetStore::Rpp, DEPLOY, run_id),
            TemplateInfo::for_run(TargetStore::Rpp, ROLLBACK, run_id),
        )
    }

    // CS-T01: merge by shape

    #[test]
    fn identical_shapes_merge_into_one_statement() {
        let plan = consolidate(config(), &[resume("A"), resume("B"), resume("A")]).unwrap();
        assert_eq!(plan.groups.len(), 1);
        let group = &plan.groups[0];
        assert_eq!(group.keys, ["A", "B"]);
        assert_eq!(
            group.deploy,
            "-- resume\nUPDATE workflow_execution SET state = 222 WHERE run_id IN ('A', 'B');"
        );
        assert_eq!(
            group.rollback,
            "UPDATE workflow_execution SET state = 210 WHERE run_id IN ('A', 'B');"
        );
    }

    #[test]
    fn different_params_stay_apart() {
        let ticket = |run_id: &str, prev: &str| {
            DmlTicket::new(Case::ThoughtMachineFalseNegative).pair(
                TemplateInfo::for_run(TargetStore::Pe, "UPDATE w SET s = 230 WHERE run_id = {run_id};", run_id),
                TemplateInfo::for_run(
                    TargetStore::Pe,
                    "UPDATE w SET p = {prev_trans_id} WHERE run_id = {run_id};",
                    run_id,
                )
                .param(ParamInfo::text("prev_trans_id", prev)),
            )
        };
        let plan = consolidate(config(), &[ticket("A", "p1"), ticket("B", "p2"), ticket("C", "p1")])
            .unwrap();
        assert_eq!(plan.groups.len(), 2);
        assert_eq!(plan.groups[0].keys, ["A", "C"]);
        assert_eq!(plan.groups[0].rollback, "UPDATE w SET p = 'p1' WHERE run_id IN ('A', 'C');");
        assert_eq!(plan.groups[1].keys, ["B"]);
    }

    #[test]
    fn comment_differences_do_not_split_groups() {
        let other = DmlTicket::new(Case::Rpp210Pe220Pc201Accept).pair(
            TemplateInfo::for_run(
                TargetStore::Rpp,
                DEPLOY.replace("-- resume", "-- accept"),
                "B",
            ),
            TemplateInfo::for_run(TargetStore::Rpp, ROLLBACK, "B"),
        );
        let plan = consolidate(config(), &[resume("A"), other]).unwrap();
        assert_eq!(plan.groups.len(), 1);
        assert_eq!(plan.groups[0].cases, [Case::RppNoResponseResume, Case::Rpp210Pe220Pc201Accept]);
        assert!(plan.groups[0].deploy.starts_with("-- resume\n"));
    }

    // CS-T02: parity and placement

    #[test]
    fn rollback_keys_equal_deploy_keys() {
        let plan = consolidate(config(), &[resume("A"), resume("B")]).unwrap();
        for group in &plan.groups {
            assert!(group.deploy.contains("('A', 'B')"));
            assert!(group.rollback.contains("('A', 'B')"));
        }
    }

    #[test]
    fn blocks_follow_store_order() {
        let pe = DmlTicket::new(Case::PeTransferPayment210_0).pair(
            TemplateInfo::for_run(TargetStore::Pe, "UPDATE w SET s = 221 WHERE run_id = {run_id};", "P"),
            TemplateInfo::for_run(TargetStore::Pe, "UPDATE w SET s = 210 WHERE run_id = {run_id};", "P"),
        );
        let plan = consolidate(config(), &[resume("A"), pe]).unwrap();
        assert_eq!(plan.statements(TargetStore::Rpp, Direction::Deploy).len(), 1);
        assert!(plan.statements(TargetStore::Pc, Direction::Deploy).is_empty());

        let blocks = plan.blocks("-- txn_doctor batch x");
        let order: Vec<(TargetStore, Direction)> = blocks.iter().map(|b| (b.store, b.direction)).collect();
        assert_eq!(
            order,
            [
                (TargetStore::Pe, Direction::Deploy),
                (TargetStore::Pe, Direction::Rollback),
                (TargetStore::Rpp, Direction::Deploy),
                (TargetStore::Rpp, Direction::Rollback),
            ]
        );
        assert_eq!(blocks[0].header, "-- txn_doctor batch x");
    }

    #[test]
    fn empty_input_renders_empty_plan() {
        let plan = consolidate(config(), &[]).unwrap();
        assert!(plan.is_empty());
        assert!(plan.blocks("-- h").is_empty());
    }

    // CS-T03: rejected tickets

    #[test]
    fn empty_ticket_is_rejected() {
        let mut c = Consolidator::new(config());
        let result = c.add(&DmlTicket::new(Case::RppNoResponseResume));
        assert!(matches!(result, Err(ConsolidationError::EmptyTicket { .. })));
    }

    #[test]
    fn unpaired_ticket_is_rejected() {
        let mut ticket = resume("A");
        ticket.rollback.clear();
        let result = Consolidator::new(config()).add(&ticket);
        assert!(matches!(
            result,
            Err(ConsolidationError::UnpairedTicket { deploy: 1, rollback: 0, .. })
        ));
    }

    #[test]
    fn unconfigured_store_is_rejected_atomically() {
        let config = ConsolidatorConfig::builder().stores([TargetStore::Rpp]).build().unwrap();
        let mut c = Consolidator::new(config);
        let ticket = resume("A").pair(
            TemplateInfo::for_run(TargetStore::Pe, "UPDATE w SET s = 1 WHERE run_id = {run_id};", "P"),
            TemplateInfo::for_run(TargetStore::Pe, "UPDATE w SET s = 0 WHERE run_id = {run_id};", "P"),
        );
        let result = c.add(&ticket);
        assert!(matches!(
            result,
            Err(ConsolidationError::UnknownStore { store: TargetStore::Pe, .. })
        ));
        assert_eq!(c.tickets(), 0);
        assert!(c.render().unwrap().is_empty());
    }

    #[test]
    fn key_mismatch_is_rejected() {
        let ticket = DmlTicket::new(Case::RppNoResponseResume).pair(
            TemplateInfo::for_run(TargetStore::Rpp, DEPLOY, "A"),
            TemplateInfo::for_run(TargetStore::Rpp, ROLLBACK, "B"),
        );
        let result = Consolidator::new(config()).add(&ticket);
        assert!(matches!(result, Err(ConsolidationError::KeyMismatch { .. })));

        let ticket = DmlTicket::new(Case::RppNoResponseResume).pair(
            TemplateInfo::new(TargetStore::Rpp, DEPLOY),
            TemplateInfo::for_run(TargetStore::Rpp, ROLLBACK, "B"),
        );
        let result = Consolidator::new(config()).add(&ticket);
        assert!(matches!(result, Err(ConsolidationError::KeyMismatch { .. })));
    }

    #[test]
    fn render_errors_name_case_and_store() {
        let ticket = DmlTicket::new(Case::PeTransferPayment210_0).pair(
            TemplateInfo::for_run(TargetStore::Pe, "UPDATE w SET p = {missing} WHERE run_id = {run_id};", "P"),
            TemplateInfo::for_run(TargetStore::Pe, "UPDATE w SET s = 0 WHERE run_id = {run_id};", "P"),
        );
        let err = consolidate(config(), [&ticket]).unwrap_err();
        assert!(matches!(err, ConsolidationError::PlaceholderMismatch { store: TargetStore::Pe, .. }));
        assert!(err.to_string().starts_with("pe_transfer_payment_210_0: PE"));
    }

    #[test]
    fn empty_store_set_is_rejected() {
        let result = ConsolidatorConfig::builder().stores([]).build();
        assert!(matches!(result, Err(ConsolidationError::InvalidConfig { .. })));
    }
}
