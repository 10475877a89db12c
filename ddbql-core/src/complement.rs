//! Rewrites terse DML statements into fully quoted PartiQL.
//!
//! Table names are wrapped in double quotes, string literals written with
//! double quotes become single-quoted literals, `VALUES` becomes `VALUE`, and a
//! `LIMIT n` clause on SELECT is lifted out of the statement text because the
//! service takes the limit as a request parameter.

use crate::error::{CommandKind, Error, Result};
use crate::lex::{is_space_token, Lexer};

/// A statement ready to be sent to the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Complement {
    /// Final statement text
    pub statement: String,
    /// Value captured from a `LIMIT` clause, if any
    pub limit: Option<i32>,
}

impl Complement {
    /// The limit to forward, treating zero and negative values as "no limit".
    pub fn effective_limit(&self) -> Option<i32> {
        self.limit.filter(|limit| *limit > 0)
    }
}

/// Complement a SELECT/INSERT/UPDATE/DELETE statement.
pub fn complement(sql: &str) -> Result<Complement> {
    let mut lex = Lexer::new(sql);
    lex.set_include_space(true);

    let verb = lex
        .by_ref()
        .find(|token| !is_space_token(token))
        .ok_or_else(|| Error::UnsupportedStatement(sql.trim().to_string()))?;

    match verb.to_uppercase().as_str() {
        "SELECT" => complement_select(&mut lex, sql),
        "INSERT" => complement_insert(&mut lex, sql),
        "UPDATE" => complement_update(&mut lex, sql),
        "DELETE" => complement_delete(&mut lex, sql),
        _ => Err(Error::UnsupportedStatement(sql.trim().to_string())),
    }
}

fn verb_text(lex: &Lexer<'_>) -> String {
    lex.current_text().unwrap_or_default().to_string()
}

fn push_quoted_name(out: &mut String, name: &str) {
    out.push('"');
    out.push_str(name);
    out.push('"');
}

fn expect_space(lex: &mut Lexer<'_>, kind: CommandKind, sql: &str, out: &mut String) -> Result<()> {
    match lex.next() {
        Some(token) if is_space_token(&token) => {
            out.push_str(&token);
            Ok(())
        }
        Some(token) => Err(Error::syntax(
            kind,
            sql,
            format!("expected a space before '{}'", token),
        )),
        None => Err(Error::syntax(kind, sql, "unexpected end of statement")),
    }
}

fn expect_token(lex: &mut Lexer<'_>, kind: CommandKind, sql: &str, what: &str) -> Result<String> {
    lex.next()
        .ok_or_else(|| Error::syntax(kind, sql, format!("{} not found", what)))
}

/// Copy everything left, turning double quotes into single quotes.
fn copy_value_area(lex: &mut Lexer<'_>, out: &mut String) {
    lex.set_include_enclose(true);
    for token in lex.by_ref() {
        out.push_str(&token.replace('"', "'"));
    }
}

fn complement_select(lex: &mut Lexer<'_>, sql: &str) -> Result<Complement> {
    let kind = CommandKind::Select;
    let mut out = verb_text(lex);

    loop {
        let token = expect_token(lex, kind, sql, "FROM")?;
        out.push_str(&token);
        if token.eq_ignore_ascii_case("FROM") {
            break;
        }
    }

    expect_space(lex, kind, sql, &mut out)?;

    let mut target = expect_token(lex, kind, sql, "table name")?;
    let mut token = lex.next();
    while token.as_deref() == Some(".") {
        let segment = expect_token(lex, kind, sql, "index name")?;
        target.push('.');
        target.push_str(&segment);
        token = lex.next();
    }
    push_quoted_name(&mut out, &target);

    lex.set_include_enclose(true);
    let mut token = token.filter(|t| !is_space_token(t)).or_else(|| lex.next());
    if token.is_none() {
        return Err(Error::syntax(kind, sql, "unexpected end after table name"));
    }
    out.push(' ');

    let mut limit = None;
    while let Some(current) = token {
        if current.eq_ignore_ascii_case("LIMIT") {
            lex.next();
            let value = expect_token(lex, kind, sql, "LIMIT value")?;
            let parsed = value.parse::<i32>().map_err(|_| {
                Error::validation(kind, sql, format!("not integer value in LIMIT ({})", value))
            })?;
            limit = Some(parsed);
        } else {
            out.push_str(&current.replace('"', "'"));
        }
        token = lex.next();
    }

    Ok(Complement {
        statement: out,
        limit,
    })
}

fn complement_insert(lex: &mut Lexer<'_>, sql: &str) -> Result<Complement> {
    let kind = CommandKind::Insert;
    let mut out = verb_text(lex);

    loop {
        let token = expect_token(lex, kind, sql, "INTO")?;
        out.push_str(&token);
        if token == "into" || token == "INTO" {
            break;
        }
    }

    expect_space(lex, kind, sql, &mut out)?;
    let table = expect_token(lex, kind, sql, "table name")?;
    push_quoted_name(&mut out, &table);
    expect_space(lex, kind, sql, &mut out)?;

    let keyword = expect_token(lex, kind, sql, "VALUE")?;
    match keyword.as_str() {
        "value" | "VALUE" => out.push_str(&keyword),
        "values" | "VALUES" => out.push_str("VALUE"),
        other => {
            return Err(Error::syntax(
                kind,
                sql,
                format!("expected VALUE but found '{}'", other),
            ))
        }
    }

    copy_value_area(lex, &mut out);
    Ok(Complement {
        statement: out,
        limit: None,
    })
}

fn complement_update(lex: &mut Lexer<'_>, sql: &str) -> Result<Complement> {
    let kind = CommandKind::Update;
    let mut out = verb_text(lex);

    expect_space(lex, kind, sql, &mut out)?;
    let table = expect_token(lex, kind, sql, "table name")?;
    push_quoted_name(&mut out, &table);

    copy_value_area(lex, &mut out);
    Ok(Complement {
        statement: out,
        limit: None,
    })
}

fn complement_delete(lex: &mut Lexer<'_>, sql: &str) -> Result<Complement> {
    let kind = CommandKind::Delete;
    let mut out = verb_text(lex);

    expect_space(lex, kind, sql, &mut out)?;
    let from = expect_token(lex, kind, sql, "FROM")?;
    if from != "from" && from != "FROM" {
        return Err(Error::syntax(
            kind,
            sql,
            format!("expected FROM but found '{}'", from),
        ));
    }
    out.push_str(&from);

    expect_space(lex, kind, sql, &mut out)?;
    let table = expect_token(lex, kind, sql, "table name")?;
    push_quoted_name(&mut out, &table);

    copy_value_area(lex, &mut out);
    Ok(Complement {
        statement: out,
        limit: None,
    })
}
