//! Row-limit enforcement.
//!
//! Rewrites an allowed statement so that an explicit row-limit clause is
//! present in the statement itself. This is defense in depth: the bounded
//! executor additionally caps the number of rows it reads, but a statement
//! carrying its own limit bounds the work on the engine side too.
//!
//! The insertion point is found with the lexer from [`crate::safety`], not a
//! pattern match, so `WITH ... SELECT` statements get the clause on the
//! outer query (the first `SELECT` at paren depth 0) rather than on a CTE
//! body.

use crate::safety::{scan, Lexeme, LexemeKind};

/// Which limit clause the target engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LimitSyntax {
    /// T-SQL `SELECT TOP (n) ...`.
    #[default]
    Top,
    /// PostgreSQL `... LIMIT n`.
    Limit,
}

/// Ensures the statement carries an explicit row-limit clause.
///
/// Idempotent for a fixed ceiling; a statement that already declares a
/// limit is returned unchanged (an existing limit is never reduced and a
/// second clause is never added). Statements that do not start with a
/// recognizable `SELECT` or `WITH ... SELECT` are returned unchanged; the
/// classifier is expected to have rejected those upstream.
pub fn ensure_row_limit(sql: &str, ceiling: u32, syntax: LimitSyntax) -> String {
    match syntax {
        LimitSyntax::Top => ensure_top(sql, ceiling),
        LimitSyntax::Limit => ensure_limit(sql, ceiling),
    }
}

fn ensure_top(sql: &str, ceiling: u32) -> String {
    let lexemes = scan(sql);

    if has_top_clause(&lexemes) {
        return sql.to_string();
    }

    let Some(select_idx) = outer_select_index(&lexemes) else {
        return sql.to_string();
    };

    // Skip an optional DISTINCT modifier; TOP goes after it.
    let mut anchor = lexemes[select_idx];
    if let Some(next) = lexemes.get(select_idx + 1) {
        if next.is_word("DISTINCT") {
            anchor = *next;
        }
    }

    // Anchor the clause to the end of the SELECT/DISTINCT token itself,
    // past any whitespace. The lexer emits nothing for literals and quoted
    // identifiers, so jumping to the next lexeme instead would drag a
    // leading 'literal' select-list item in front of the clause.
    let after = &sql[anchor.end..];
    let insert_at = anchor.end + (after.len() - after.trim_start().len());

    // A bare "SELECT" with nothing after it is left alone.
    if insert_at >= sql.trim_end().len() {
        return sql.to_string();
    }

    format!(
        "{}TOP ({}) {}",
        &sql[..insert_at],
        ceiling,
        &sql[insert_at..]
    )
}

fn ensure_limit(sql: &str, ceiling: u32) -> String {
    let lexemes = scan(sql);

    if has_limit_clause(&lexemes) {
        return sql.to_string();
    }

    if outer_select_index(&lexemes).is_none() {
        return sql.to_string();
    }

    format!("{} LIMIT {}", sql.trim_end(), ceiling)
}

/// True if a `TOP` token immediately followed by `(` exists anywhere in the
/// statement.
fn has_top_clause(lexemes: &[Lexeme<'_>]) -> bool {
    lexemes
        .windows(2)
        .any(|pair| pair[0].is_word("TOP") && pair[1].is_punct('('))
}

/// True if a `LIMIT` word token exists at paren depth 0.
fn has_limit_clause(lexemes: &[Lexeme<'_>]) -> bool {
    lexemes
        .iter()
        .any(|l| l.depth == 0 && l.is_word("LIMIT"))
}

/// Index of the outer query's `SELECT` token.
///
/// For a plain `SELECT ...` that is the first token. For `WITH ... SELECT`
/// the CTE bodies are parenthesized, so the first depth-0 `SELECT` is the
/// final top-level one. Returns `None` when the statement starts with
/// anything else.
fn outer_select_index(lexemes: &[Lexeme<'_>]) -> Option<usize> {
    let first = lexemes.iter().find(|l| l.kind == LexemeKind::Word)?;

    if !first.is_word("SELECT") && !first.is_word("WITH") {
        return None;
    }

    lexemes
        .iter()
        .position(|l| l.depth == 0 && l.is_word("SELECT"))
}
