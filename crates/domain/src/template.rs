// Rust guideline compliant 2026-10-18

//! SQL template fragments and the per-snapshot ticket that bundles them.

use std::fmt;
use std::str::FromStr;

use crate::Case;

/// Name of the default key parameter of a workflow template.
pub const RUN_ID: &str = "run_id";

/// Destination database of a SQL fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TargetStore {
    /// Payment core.
    Pc,
    /// Payment engine.
    Pe,
    /// Partnerpay engine.
    Ppe,
    /// RPP adapter.
    Rpp,
}

impl TargetStore {
    /// Every store, in artifact order.
    pub const ALL: [TargetStore; 4] =
        [TargetStore::Pc, TargetStore::Pe, TargetStore::Ppe, TargetStore::Rpp];

    /// Store code used in artifact file names.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            TargetStore::Pc => "PC",
            TargetStore::Pe => "PE",
            TargetStore::Ppe => "PPE",
            TargetStore::Rpp => "RPP",
        }
    }
}

impl fmt::Display for TargetStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error returned when parsing an unknown store code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown target store: {0}")]
pub struct UnknownStore(pub String);

impl FromStr for TargetStore {
    type Err = UnknownStore;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TargetStore::ALL
            .into_iter()
            .find(|store| store.code().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownStore(s.to_owned()))
    }
}

/// Deploy or rollback side of a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Deploy,
    Rollback,
}

impl Direction {
    /// Suffix used in artifact file names.
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            Direction::Deploy => "Deploy",
            Direction::Rollback => "Rollback",
        }
    }
}

/// How a parameter value is rendered into SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// Single-quoted, escaped string literal.
    Text,
    /// Bare integer numeral.
    Int,
    /// Raw SQL expression built by the registry itself.
    Expr,
}

impl ParamKind {
    /// Map a declared type name. Unknown names fall back to [`ParamKind::Text`].
    #[must_use]
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "int" => ParamKind::Int,
            "expr" => ParamKind::Expr,
            _ => ParamKind::Text,
        }
    }
}

/// One named substitution value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParamInfo {
    pub name: String,
    pub value: String,
    pub kind: ParamKind,
}

impl ParamInfo {
    #[must_use]
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into(), kind: ParamKind::Text }
    }

    #[must_use]
    pub fn int(name: impl Into<String>, value: i64) -> Self {
        Self { name: name.into(), value: value.to_string(), kind: ParamKind::Int }
    }

    #[must_use]
    pub fn expr(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into(), kind: ParamKind::Expr }
    }
}

// ---------------------------------------------------------------------------
// TemplateInfo
// ---------------------------------------------------------------------------

/// A SQL template for one store plus the parameters that fill it.
///
/// Placeholders are written `{name}`. The key predicate
/// (`run_id = {run_id}` or `run_id IN ({run_id})` by default) is the point
/// that consolidation widens into a multi-value `IN` clause; every other
/// placeholder is filled positionally from the remaining parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateInfo {
    pub target_store: TargetStore,
    pub sql_template: String,
    /// Name of the key parameter (and column) batched by consolidation.
    pub key: String,
    pub params: Vec<ParamInfo>,
}

impl TemplateInfo {
    /// Template keyed by `run_id`, with no parameters yet.
    #[must_use]
    pub fn new(target_store: TargetStore, sql_template: impl Into<String>) -> Self {
        Self {
            target_store,
            sql_template: sql_template.into(),
            key: RUN_ID.to_owned(),
            params: Vec::new(),
        }
    }

    /// Template keyed by `run_id = run_id`.
    #[must_use]
    pub fn for_run(
        target_store: TargetStore,
        sql_template: impl Into<String>,
        run_id: impl Into<String>,
    ) -> Self {
        Self::new(target_store, sql_template).param(ParamInfo::text(RUN_ID, run_id))
    }

    /// Batch on another identifier column, e.g. `intent_id`.
    #[must_use]
    pub fn keyed_by(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Append a parameter.
    #[must_use]
    pub fn param(mut self, param: ParamInfo) -> Self {
        self.params.push(param);
        self
    }

    /// Value of the key parameter, if declared.
    #[must_use]
    pub fn key_value(&self) -> Option<&str> {
        self.params.iter().find(|p| p.name == self.key).map(|p| p.value.as_str())
    }

    /// Parameters other than the key, in declaration order.
    pub fn positional_params(&self) -> impl Iterator<Item = &ParamInfo> {
        self.params.iter().filter(|p| p.name != self.key)
    }
}

// ---------------------------------------------------------------------------
// DmlTicket
// ---------------------------------------------------------------------------

/// Deploy and rollback fragments generated for one classified snapshot.
///
/// `deploy[i]` is reverted by `rollback[i]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DmlTicket {
    pub case: Case,
    pub deploy: Vec<TemplateInfo>,
    pub rollback: Vec<TemplateInfo>,
}

impl DmlTicket {
    /// Empty ticket for `case`.
    #[must_use]
    pub fn new(case: Case) -> Self {
        Self { case, deploy: Vec::new(), rollback: Vec::new() }
    }

    /// Add a deploy fragment together with the rollback that reverts it.
    #[must_use]
    pub fn pair(mut self, deploy: TemplateInfo, rollback: TemplateInfo) -> Self {
        self.deploy.push(deploy);
        self.rollback.push(rollback);
        self
    }

    /// Stores touched by this ticket, deduplicated, in first-seen order.
    #[must_use]
    pub fn stores(&self) -> Vec<TargetStore> {
        let mut stores = Vec::new();
        for t in &self.deploy {
            if !stores.contains(&t.target_store) {
                stores.push(t.target_store);
            }
        }
        stores
    }
}
