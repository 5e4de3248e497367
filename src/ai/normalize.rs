//! Identifier normalization - rewrites generated SQL to the quoted camelCase schema.

use crate::schema::{IDENTIFIER_MAP, KNOWN_COLUMNS};
use regex::Regex;

/// Rewrites column identifiers in model-generated SQL so they resolve against
/// the Prisma-created schema, where every camelCase column is case-sensitive
/// and must be double-quoted.
///
/// Two passes over the statement text:
/// 1. snake_case aliases are renamed to their camelCase column (case-insensitive,
///    whole words only),
/// 2. every known column is wrapped in double quotes, keeping any `alias.`
///    qualifier outside the quotes and leaving already-quoted occurrences alone.
///
/// Running the normalizer on its own output changes nothing.
pub struct IdentifierNormalizer {
    renames: Vec<(Regex, &'static str)>,
    quoters: Vec<Regex>,
}

impl IdentifierNormalizer {
    pub fn new() -> Self {
        let renames = IDENTIFIER_MAP
            .iter()
            .map(|(snake, camel)| (Regex::new(&format!(r"(?i)\b{snake}\b")).unwrap(), *camel))
            .collect();

        // No lookaround in the regex crate, so the guards are captured and
        // re-emitted: `pre` keeps the pattern from starting mid-word, `qual`
        // preserves a table or alias prefix, and the optional quote captures
        // tell the closure when an occurrence is already quoted.
        let quoters = KNOWN_COLUMNS
            .iter()
            .map(|col| {
                Regex::new(&format!(
                    r#"(?P<pre>^|[^\w"])(?P<qual>(?:\w+\.)?)(?P<oq>"?)(?P<id>{col})\b(?P<cq>"?)"#
                ))
                .unwrap()
            })
            .collect();

        Self { renames, quoters }
    }

    pub fn normalize(&self, sql: &str) -> String {
        let mut out = sql.to_string();

        for (re, camel) in &self.renames {
            out = re.replace_all(&out, *camel).to_string();
        }

        for re in &self.quoters {
            out = re
                .replace_all(&out, |caps: &regex::Captures| {
                    if !caps["oq"].is_empty() || !caps["cq"].is_empty() {
                        caps[0].to_string()
                    } else {
                        format!("{}{}\"{}\"", &caps["pre"], &caps["qual"], &caps["id"])
                    }
                })
                .to_string();
        }

        out
    }
}

impl Default for IdentifierNormalizer {
    fn default() -> Self {
        Self::new()
    }
}
