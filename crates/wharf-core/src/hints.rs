//! Classification of raw chain errors into actionable hints.

use anyhow::Context;
use regex::Regex;

/// How a rule recognizes an error message.
#[derive(Debug, Clone)]
pub enum HintMatcher {
    /// Case-insensitive substring match.
    Substring(String),
    /// Regex match (use `(?i)` inside the pattern for case-insensitivity).
    Pattern(Regex),
}

impl HintMatcher {
    fn matches(&self, message: &str) -> bool {
        match self {
            HintMatcher::Substring(needle) => {
                message.to_lowercase().contains(&needle.to_lowercase())
            }
            HintMatcher::Pattern(re) => re.is_match(message),
        }
    }
}

#[derive(Debug, Clone)]
struct HintRule {
    matcher: HintMatcher,
    hint: String,
}

/// Ordered catalog of error-to-hint rules.
///
/// Rules are checked top to bottom and the first match wins, so more specific
/// entries must be pushed before more general ones where they overlap.
/// Classification never fails; an unmatched message yields no hint.
#[derive(Debug, Clone, Default)]
pub struct HintCatalog {
    rules: Vec<HintRule>,
}

impl HintCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_substring(&mut self, needle: &str, hint: &str) {
        self.rules.push(HintRule {
            matcher: HintMatcher::Substring(needle.to_string()),
            hint: hint.to_string(),
        });
    }

    /// Push a regex rule; fails on an invalid pattern.
    pub fn push_pattern(&mut self, pattern: &str, hint: &str) -> anyhow::Result<()> {
        let re = Regex::new(pattern)
            .with_context(|| format!("Invalid hint pattern: {pattern}"))?;
        self.rules.push(HintRule {
            matcher: HintMatcher::Pattern(re),
            hint: hint.to_string(),
        });
        Ok(())
    }

    /// Return the hint of the first rule matching `message`, if any.
    pub fn classify(&self, message: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|rule| rule.matcher.matches(message))
            .map(|rule| rule.hint.as_str())
    }

    /// Built-in catalog for common chain submission failures.
    pub fn chain_defaults() -> anyhow::Result<Self> {
        let mut catalog = Self::new();
        catalog.push_substring(
            "already running this version of code",
            "the bytecode is identical to what is deployed; nothing to update",
        );
        catalog.push_pattern(
            r"(?i)(insufficient\s+ram|ram\s+quota|needs\s+\d+\s+bytes)",
            "the account is out of storage; buy more resource allocation before redeploying",
        )?;
        catalog.push_pattern(
            r"(?i)(missing required authority|unsatisfied_authorization|signatures do not satisfy)",
            "the signing key lacks authority for this account; check the active permission",
        )?;
        catalog.push_pattern(
            r"(?i)wasm.*(validat|constraint|malformed)",
            "the bytecode failed chain validation; rebuild with a supported toolchain version",
        )?;
        catalog.push_substring(
            "abi_serialization",
            "the interface schema could not be deserialized by the chain; check the schema file",
        );
        catalog.push_pattern(
            r"(?i)(unknown account|account does not exist)",
            "the target account does not exist on this chain; create it first",
        )?;
        catalog.push_substring(
            "expired",
            "the transaction expired before inclusion; the node may be lagging, retry",
        );
        Ok(catalog)
    }
}
