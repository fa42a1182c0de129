//! SQL safety classification.
//!
//! Decides whether machine-generated SQL is safe to run. Classification is a
//! blocklist, not an allowlist: a deterministic pure function over the
//! normalized statement text and a frozen keyword set. Rejection is a normal
//! outcome the caller surfaces as a client-facing refusal, never an
//! exception and never a server error.

mod scan;

pub use scan::{scan, Lexeme, LexemeKind};

use std::fmt;

/// Mutation/DDL/DCL keywords that must never appear in a statement.
pub const FORBIDDEN_KEYWORDS: &[&str] = &[
    "INSERT", "UPDATE", "DELETE", "MERGE", "DROP", "ALTER", "CREATE", "EXEC", "EXECUTE",
    "TRUNCATE", "GRANT", "REVOKE",
];

/// How forbidden keywords are matched against the statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeywordMatch {
    /// Match bare word tokens only, skipping string literals, quoted
    /// identifiers, and comments. Avoids false rejections of literals like
    /// `'CREATEd'`. Default.
    #[default]
    Token,
    /// Case-insensitive whole-string containment. Coarser than `Token`:
    /// `SELECT 'CREATEd'` rejects in this mode. Legacy compatibility mode;
    /// catches a keyword no matter where it appears in the text.
    Substring,
}

/// Why a statement was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// A forbidden keyword was found; carries the keyword.
    ForbiddenKeyword(String),
    /// A statement separator (`;`) was found and the policy requires a
    /// single statement.
    MultipleStatements,
    /// The statement does not begin with `SELECT` or `WITH ... SELECT`.
    NotSelect,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ForbiddenKeyword(kw) => {
                write!(f, "statement contains forbidden keyword {}", kw)
            }
            Self::MultipleStatements => {
                write!(f, "multiple statements are not allowed")
            }
            Self::NotSelect => write!(f, "only SELECT statements are allowed"),
        }
    }
}

/// Verdict of classifying a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Reject(RejectReason),
}

impl Verdict {
    /// Returns true if the statement may proceed to the limit enforcer.
    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Configurable safety policy.
///
/// Both gate variants (advisory and execute) share this one policy object
/// so the safety contract stays centrally testable. Checks run in order:
/// separator, statement shape, forbidden keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafetyPolicy {
    /// Whether statement separators (`;`) are tolerated.
    pub allow_multi_statement: bool,
    /// Whether the statement must begin with `SELECT` or `WITH ... SELECT`.
    pub require_select_start: bool,
    /// Keyword matching mode.
    pub keyword_match: KeywordMatch,
}

impl SafetyPolicy {
    /// Advisory-path policy: the forbidden-keyword check only.
    pub fn forbidden_keywords_only() -> Self {
        Self {
            allow_multi_statement: true,
            require_select_start: false,
            keyword_match: KeywordMatch::default(),
        }
    }

    /// Execute-path policy: single statement, SELECT-shaped, no forbidden
    /// keywords.
    pub fn single_select() -> Self {
        Self {
            allow_multi_statement: false,
            require_select_start: true,
            keyword_match: KeywordMatch::default(),
        }
    }

    /// Overrides the keyword matching mode.
    pub fn with_keyword_match(mut self, mode: KeywordMatch) -> Self {
        self.keyword_match = mode;
        self
    }

    /// Classifies a normalized statement. Deterministic and total: every
    /// input yields exactly one verdict.
    pub fn classify(&self, sql: &str) -> Verdict {
        let lexemes = scan(sql);

        if !self.allow_multi_statement {
            let has_separator = match self.keyword_match {
                // Legacy mode: any ';' character counts, even in literals.
                KeywordMatch::Substring => sql.contains(';'),
                KeywordMatch::Token => lexemes.iter().any(|l| l.is_punct(';')),
            };
            if has_separator {
                return Verdict::Reject(RejectReason::MultipleStatements);
            }
        }

        if self.require_select_start && !starts_with_select(&lexemes) {
            return Verdict::Reject(RejectReason::NotSelect);
        }

        if let Some(keyword) = self.find_forbidden_keyword(sql, &lexemes) {
            return Verdict::Reject(RejectReason::ForbiddenKeyword(keyword));
        }

        Verdict::Allow
    }

    fn find_forbidden_keyword(&self, sql: &str, lexemes: &[Lexeme<'_>]) -> Option<String> {
        match self.keyword_match {
            KeywordMatch::Substring => {
                let upper = sql.to_uppercase();
                FORBIDDEN_KEYWORDS
                    .iter()
                    .find(|kw| upper.contains(*kw))
                    .map(|kw| kw.to_string())
            }
            KeywordMatch::Token => lexemes
                .iter()
                .filter(|l| l.kind == LexemeKind::Word)
                .find_map(|l| {
                    FORBIDDEN_KEYWORDS
                        .iter()
                        .find(|kw| l.text.eq_ignore_ascii_case(kw))
                        .map(|kw| kw.to_string())
                }),
        }
    }
}

/// True if the first word token is `SELECT`, or `WITH` introducing a CTE
/// that reaches a top-level `SELECT`.
fn starts_with_select(lexemes: &[Lexeme<'_>]) -> bool {
    let Some(first) = lexemes.iter().find(|l| l.kind == LexemeKind::Word) else {
        return false;
    };

    if first.is_word("SELECT") {
        return true;
    }

    if first.is_word("WITH") {
        // The CTE prologue is parenthesized, so the outer query's SELECT is
        // the first one back at depth 0.
        return lexemes
            .iter()
            .any(|l| l.depth == 0 && l.is_word("SELECT"));
    }

    false
}

/// Convenience wrapper: classifies with the given policy.
pub fn classify_sql(sql: &str, policy: &SafetyPolicy) -> Verdict {
    policy.classify(sql)
}
