// Rust guideline compliant 2026-10-18

//! Text rendering of one consolidated fragment.
//!
//! A fragment is a template with its leading `--` comment block split off.
//! Rendering fills every non-key `{name}` placeholder from the declared
//! parameters, widens the key predicate into a multi-value `IN` list, then
//! re-prepends the comment block.

use domain::{ParamInfo, ParamKind, TargetStore};
use regex::{NoExpand, Regex};

/// Patterns shared by every render, compiled once per configuration.
#[derive(Debug, Clone)]
pub(crate) struct Patterns {
    placeholder: Regex,
    quoted: Regex,
}

impl Patterns {
    pub(crate) fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            placeholder: Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}")?,
            quoted: Regex::new(r"'(?:[^'\\]|\\.|'')*'")?,
        })
    }
}

/// Why a fragment failed to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RenderFault {
    KeyPredicate(String),
    Placeholder(String),
    Leftover(String),
}

/// Split `text` into its leading comment block and the SQL body.
pub(crate) fn split_comment(text: &str) -> (String, String) {
    let mut lines = text.trim().lines().peekable();
    let mut comment = Vec::new();
    while let Some(line) = lines.next_if(|l| l.trim_start().starts_with("--")) {
        comment.push(line.trim_end());
    }
    let body: Vec<&str> = lines.collect();
    (comment.join("\n"), body.join("\n").trim().to_owned())
}

/// `value` as a SQL literal of `kind`.
///
/// Text doubles single quotes and escapes backslashes. Int must parse.
pub(crate) fn literal(value: &str, kind: ParamKind) -> Result<String, String> {
    match kind {
        ParamKind::Text => Ok(format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))),
        ParamKind::Int => value
            .trim()
            .parse::<i64>()
            .map(|n| n.to_string())
            .map_err(|e| format!("{value:?} is not an integer: {e}")),
        ParamKind::Expr => Ok(value.to_owned()),
    }
}

// ---------------------------------------------------------------------------
// Fragment
// ---------------------------------------------------------------------------

/// Shape of one template: everything but its comment and key value.
///
/// Two fragments with equal shapes differ only by key value and are
/// rendered as one statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct Fragment {
    pub store: TargetStore,
    pub body: String,
    pub key: String,
    pub key_kind: ParamKind,
    /// Non-key parameters, in declaration order.
    pub params: Vec<ParamInfo>,
}

impl Fragment {
    /// Render with the key predicate widened to `keys`, headed by `comment`.
    ///
    /// Parameters are substituted before the key is widened, so a key value
    /// is never read as a placeholder.
    pub(crate) fn render(
        &self,
        comment: &str,
        keys: &[String],
        patterns: &Patterns,
    ) -> Result<String, RenderFault> {
        let list = keys
            .iter()
            .map(|k| literal(k, self.key_kind))
            .collect::<Result<Vec<_>, _>>()
            .map_err(RenderFault::Placeholder)?
            .join(", ");
        let body = self.substitute(patterns)?;
        let body = self.widen_key(&body, &list)?;

        let unquoted = patterns.quoted.replace_all(&body, "''");
        if let Some(left) = patterns.placeholder.find(&unquoted) {
            return Err(RenderFault::Leftover(left.as_str().to_owned()));
        }

        if comment.is_empty() { Ok(body) } else { Ok(format!("{comment}\n{body}")) }
    }

    /// Replace `key = {key}` and `key IN ({key})` with `key IN (<list>)`.
    fn widen_key(&self, body: &str, list: &str) -> Result<String, RenderFault> {
        let name = regex::escape(&self.key);
        let predicate =
            Regex::new(&format!(r"(?i)\b{name}\s*(?:=\s*\{{{name}\}}|IN\s*\(\s*\{{{name}\}}\s*\))"))
                .map_err(|e| RenderFault::KeyPredicate(e.to_string()))?;
        if !predicate.is_match(body) {
            return Err(RenderFault::KeyPredicate(format!(
                "no `{0} = {{{0}}}` or `{0} IN ({{{0}}})` predicate",
                self.key
            )));
        }
        let replacement = format!("{} IN ({list})", self.key);
        Ok(predicate.replace_all(body, NoExpand(&replacement)).into_owned())
    }

    /// Fill each non-key placeholder from [`params`](Self::params) by name.
    ///
    /// Every placeholder needs a parameter and every parameter must be used.
    /// Key placeholders are left for [`widen_key`](Self::widen_key).
    fn substitute(&self, patterns: &Patterns) -> Result<String, RenderFault> {
        let body = self.body.as_str();
        let mut out = String::with_capacity(body.len());
        let mut used = vec![false; self.params.len()];
        let mut last = 0;
        for caps in patterns.placeholder.captures_iter(body) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if name.as_str() == self.key {
                continue;
            }
            let Some(i) = self.params.iter().position(|p| p.name == name.as_str()) else {
                return Err(RenderFault::Placeholder(format!("no value for {}", whole.as_str())));
            };
            let param = &self.params[i];
            out.push_str(&body[last..whole.start()]);
            out.push_str(
                &literal(&param.value, param.kind)
                    .map_err(|e| RenderFault::Placeholder(format!("{}: {e}", param.name)))?,
            );
            used[i] = true;
            last = whole.end();
        }
        out.push_str(&body[last..]);

        if let Some((param, _)) = self.params.iter().zip(&used).find(|(_, used)| !**used) {
            return Err(RenderFault::Placeholder(format!(
                "parameter {} has no placeholder",
                param.name
            )));
        }
        Ok(out)
    }
}
