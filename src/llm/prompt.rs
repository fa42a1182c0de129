//! Prompt construction for SQL generation.
//!
//! Two variants: an advisory prompt that only states the safety rules, and a
//! schema-aware prompt for the execute path that pins the model to the
//! tables it is allowed to query. The dialect and default row ceiling are
//! spliced into the rule text so the model is told to emit SQL the
//! executing backend actually accepts.

use crate::limit::LimitSyntax;
use crate::llm::types::Message;

fn dialect_name(dialect: LimitSyntax) -> &'static str {
    match dialect {
        LimitSyntax::Top => "Microsoft SQL Server T-SQL",
        LimitSyntax::Limit => "PostgreSQL SQL",
    }
}

fn limit_rule(dialect: LimitSyntax, ceiling: u32) -> String {
    match dialect {
        LimitSyntax::Top => format!(
            "Use TOP ({ceiling}) by default unless the user asks for a different limit."
        ),
        LimitSyntax::Limit => format!(
            "End the query with LIMIT {ceiling} by default unless the user asks for a different limit."
        ),
    }
}

/// System prompt for the advisory (generate-only) path.
fn advisory_system_prompt(dialect: LimitSyntax, ceiling: u32) -> String {
    format!(
        "\
You generate ONLY {dialect}.
Return ONLY the SQL query text (no markdown, no backticks, no explanation).
Rules:
- SELECT statements only. No INSERT/UPDATE/DELETE/MERGE/DROP/ALTER/CREATE/EXEC.
- {limit_rule}
- If the request is ambiguous, make a reasonable assumption and still return a SELECT query.",
        dialect = dialect_name(dialect),
        limit_rule = limit_rule(dialect, ceiling),
    )
}

/// System prompt for the execute path. The schema itself travels in the
/// user message, built by [`execute_messages`].
fn execute_system_prompt(dialect: LimitSyntax, ceiling: u32) -> String {
    format!(
        "\
You generate ONLY {dialect}.
Return ONLY the SQL query text (no markdown, no backticks, no explanation).
Rules:
- Use only the tables and columns listed in the schema.
- SELECT statements only. No INSERT/UPDATE/DELETE/MERGE/DROP/ALTER/CREATE/EXEC.
- Single statement only (no semicolons).
- {limit_rule}",
        dialect = dialect_name(dialect),
        limit_rule = limit_rule(dialect, ceiling),
    )
}

/// Builds the message list for the advisory path.
pub fn advisory_messages(prompt: &str, dialect: LimitSyntax, ceiling: u32) -> Vec<Message> {
    vec![
        Message::system(advisory_system_prompt(dialect, ceiling)),
        Message::user(prompt),
    ]
}

/// Builds the message list for the execute path, embedding the schema.
pub fn execute_messages(
    prompt: &str,
    schema: &str,
    dialect: LimitSyntax,
    ceiling: u32,
) -> Vec<Message> {
    vec![
        Message::system(execute_system_prompt(dialect, ceiling)),
        Message::user(format!("User request:\n{prompt}\n\nSchema:\n{schema}")),
    ]
}
