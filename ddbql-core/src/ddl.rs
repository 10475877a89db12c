//! Parsers for table DDL and shell meta statements.
//!
//! Each parser consumes the whole command and fails on the first structural
//! violation; nothing is partially applied.

use crate::error::{CommandKind, Error, Result};
use crate::lex::Lexer;
use crate::storage::{
    AttributeDefinition, AttributeType, CreateTableRequest, IndexScope, KeyRole, SecondaryIndex,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescTable {
    pub table_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropTable {
    pub table_name: String,
    /// Set by `IF EXISTS`: a missing table is not an error
    pub if_exists: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruncateTable {
    pub table_name: String,
}

/// `@name = value;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub name: String,
    pub value: String,
}

struct TokenReader<'a> {
    lex: Lexer<'a>,
    kind: CommandKind,
    command: &'a str,
}

impl<'a> TokenReader<'a> {
    fn new(kind: CommandKind, command: &'a str) -> Self {
        Self {
            lex: Lexer::new(command),
            kind,
            command,
        }
    }

    fn syntax(&self, reason: impl Into<String>) -> Error {
        Error::syntax(self.kind, self.command, reason)
    }

    fn invalid(&self, reason: impl Into<String>) -> Error {
        Error::validation(self.kind, self.command, reason)
    }

    fn next(&mut self, what: &str) -> Result<String> {
        match self.lex.next() {
            Some(token) => Ok(token),
            None => Err(self.syntax(format!("undefined {}", what))),
        }
    }

    fn name(&mut self, what: &str) -> Result<String> {
        let token = self.next(what)?;
        if matches!(token.as_str(), "(" | ")" | "," | ";" | "=") {
            return Err(self.syntax(format!("undefined {}", what)));
        }
        Ok(token)
    }

    fn keyword(&mut self, keyword: &str) -> Result<()> {
        let token = self.next(keyword)?;
        if token.eq_ignore_ascii_case(keyword) {
            Ok(())
        } else {
            Err(self.syntax(format!("expected {} but found '{}'", keyword, token)))
        }
    }

    fn punct(&mut self, punct: &str) -> Result<()> {
        let token = self.next(&format!("'{}'", punct))?;
        if token == punct {
            Ok(())
        } else {
            Err(self.syntax(format!("expected '{}' but found '{}'", punct, token)))
        }
    }

    fn attribute_type(&mut self) -> Result<AttributeType> {
        let token = self.next("attribute type")?;
        token.parse().map_err(|reason: String| self.invalid(reason))
    }

    /// Consume `)` (returns true) or `,` (returns false).
    fn list_separator(&mut self, token: &str) -> Result<bool> {
        match token {
            ")" => Ok(true),
            "," => Ok(false),
            other => Err(self.syntax(format!("expected ',' or ')' but found '{}'", other))),
        }
    }

    /// Anything after the statement other than a single `;` is an error.
    fn end(&mut self) -> Result<()> {
        match self.lex.next().as_deref() {
            None | Some(";") => {}
            Some(other) => return Err(self.syntax(format!("unexpected '{}'", other))),
        }
        match self.lex.next() {
            None => Ok(()),
            Some(other) => Err(self.syntax(format!("unexpected '{}'", other))),
        }
    }
}

/// `DESC <table> ;`
pub fn parse_desc(command: &str) -> Result<DescTable> {
    let mut reader = TokenReader::new(CommandKind::Desc, command);
    reader.keyword("DESC")?;
    let table_name = reader.name("table name")?;
    reader.punct(";")?;
    Ok(DescTable { table_name })
}

/// `SHOW TABLES ;`
pub fn parse_show_tables(command: &str) -> Result<()> {
    let mut reader = TokenReader::new(CommandKind::ShowTables, command);
    reader.keyword("SHOW")?;
    reader.keyword("TABLES")?;
    reader.punct(";")
}

/// `DROP TABLE [IF EXISTS] <table> ;`
pub fn parse_drop_table(command: &str) -> Result<DropTable> {
    let mut reader = TokenReader::new(CommandKind::DropTable, command);
    reader.keyword("DROP")?;
    reader.keyword("TABLE")?;

    let mut if_exists = false;
    let mut table_name = reader.name("table name")?;
    if table_name.eq_ignore_ascii_case("IF") {
        reader.keyword("EXISTS")?;
        if_exists = true;
        table_name = reader.name("table name")?;
    }
    reader.punct(";")?;

    Ok(DropTable {
        table_name,
        if_exists,
    })
}

/// `TRUNCATE TABLE <table> ;`
pub fn parse_truncate_table(command: &str) -> Result<TruncateTable> {
    let mut reader = TokenReader::new(CommandKind::TruncateTable, command);
    reader.keyword("TRUNCATE")?;
    reader.keyword("TABLE")?;
    let table_name = reader.name("table name")?;
    reader.punct(";")?;
    Ok(TruncateTable { table_name })
}

/// `@<name> = <value> ;`
pub fn parse_assignment(command: &str) -> Result<Assignment> {
    let mut reader = TokenReader::new(CommandKind::Variable, command);
    reader.punct("@")?;
    let name = reader.name("variable name")?;
    reader.punct("=")?;
    let value = reader.next("variable value")?;
    reader.punct(";")?;
    Ok(Assignment { name, value })
}

/// `CREATE TABLE <table> ( <entry> [, <entry>]* ) [;]`
///
/// An entry is either `name type [HASH|RANGE]` or
/// `INDEX {LOCAL|GLOBAL} name ( name type {HASH|RANGE} [, ...] )`.
pub fn parse_create_table(command: &str) -> Result<CreateTableRequest> {
    let mut reader = TokenReader::new(CommandKind::CreateTable, command);
    reader.keyword("CREATE")?;
    reader.keyword("TABLE")?;
    let table_name = reader.name("table name")?;
    reader.punct("(")?;

    let mut attributes = Vec::new();
    let mut indexes = Vec::new();
    loop {
        let head = reader.name("attribute name")?;
        let separator = if head.eq_ignore_ascii_case("INDEX") {
            indexes.push(parse_index(&mut reader)?);
            reader.next("',' or ')'")?
        } else {
            let attribute_type = reader.attribute_type()?;
            let mut token = reader.next("',' or ')'")?;
            let key_role = match token.parse::<KeyRole>() {
                Ok(role) => {
                    token = reader.next("',' or ')'")?;
                    Some(role)
                }
                Err(_) => None,
            };
            attributes.push(AttributeDefinition {
                name: head,
                attribute_type,
                key_role,
            });
            token
        };
        if reader.list_separator(&separator)? {
            break;
        }
    }
    reader.end()?;

    Ok(CreateTableRequest {
        table_name,
        attributes,
        indexes,
    })
}

fn parse_index(reader: &mut TokenReader<'_>) -> Result<SecondaryIndex> {
    let scope_token = reader.next("index type")?;
    let scope: IndexScope = scope_token
        .parse()
        .map_err(|reason: String| reader.invalid(reason))?;
    let name = reader.name("index name")?;
    reader.punct("(")?;

    let mut attributes = Vec::new();
    loop {
        let attr_name = reader.name("index attribute name")?;
        let attribute_type = reader.attribute_type()?;
        let role_token = reader.next("index key type")?;
        let key_role: KeyRole = role_token
            .parse()
            .map_err(|reason: String| reader.invalid(reason))?;
        attributes.push(AttributeDefinition {
            name: attr_name,
            attribute_type,
            key_role: Some(key_role),
        });

        let separator = reader.next("',' or ')'")?;
        if reader.list_separator(&separator)? {
            break;
        }
    }

    Ok(SecondaryIndex {
        name,
        scope,
        attributes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_desc() {
        assert_eq!(
            parse_desc("DESC users ;").unwrap(),
            DescTable {
                table_name: "users".into()
            }
        );
        assert_eq!(parse_desc("desc 'my table';").unwrap().table_name, "my table");
        assert!(parse_desc("DESC users").is_err());
        assert!(parse_desc("DESC ;").is_err());
        assert!(parse_desc("DESCRIBE users;").is_err());
    }

    #[test]
    fn test_show_tables() {
        assert!(parse_show_tables("SHOW TABLES;").is_ok());
        assert!(parse_show_tables("show tables ;").is_ok());
        assert!(parse_show_tables("SHOW TABLE;").is_err());
        assert!(parse_show_tables("SHOW TABLES").is_err());
    }

    #[test]
    fn test_drop_table() {
        assert_eq!(
            parse_drop_table("DROP TABLE t;").unwrap(),
            DropTable {
                table_name: "t".into(),
                if_exists: false
            }
        );
        assert_eq!(
            parse_drop_table("drop table if exists t ;").unwrap(),
            DropTable {
                table_name: "t".into(),
                if_exists: true
            }
        );
        assert!(parse_drop_table("DROP t;").is_err());
        assert!(parse_drop_table("DROP TABLE IF t;").is_err());
        assert!(parse_drop_table("DROP TABLE t").is_err());
    }

    #[test]
    fn test_truncate_table() {
        assert_eq!(parse_truncate_table("TRUNCATE TABLE t;").unwrap().table_name, "t");
        assert!(parse_truncate_table("TRUNCATE t;").is_err());
        assert!(parse_truncate_table("TRUNCATE TABLE t").is_err());
    }

    #[test]
    fn test_assignment() {
        assert_eq!(
            parse_assignment("@name = 'hello world';").unwrap(),
            Assignment {
                name: "name".into(),
                value: "hello world".into()
            }
        );
        assert_eq!(parse_assignment("@n=5;").unwrap().value, "5");
        assert!(parse_assignment("@n 5;").is_err());
        assert!(parse_assignment("@n = 5").is_err());
        assert!(parse_assignment("@ = 5;").is_err());
        assert!(parse_assignment("@n =").is_err());
    }

    #[test]
    fn test_create_table_with_global_index() {
        let request =
            parse_create_table("CREATE TABLE t (id S HASH, INDEX GLOBAL gi (id S HASH));").unwrap();
        assert_eq!(request.table_name, "t");
        assert_eq!(
            request.attributes,
            vec![AttributeDefinition {
                name: "id".into(),
                attribute_type: AttributeType::String,
                key_role: Some(KeyRole::Hash),
            }]
        );
        assert_eq!(request.indexes.len(), 1);
        let index = &request.indexes[0];
        assert_eq!(index.name, "gi");
        assert_eq!(index.scope, IndexScope::Global);
        assert_eq!(index.attributes.len(), 1);
        assert_eq!(index.attributes[0].key_role, Some(KeyRole::Hash));
    }

    #[test]
    fn test_create_table_mixed_entries() {
        let request = parse_create_table(
            "create table orders (pk S hash, sk N range, status s, \
             INDEX local by_status (pk S HASH, status S RANGE), \
             index GLOBAL by_date (date S HASH, sk N RANGE))",
        )
        .unwrap();
        assert_eq!(request.attributes.len(), 3);
        assert_eq!(request.attributes[2].key_role, None);
        assert_eq!(request.attributes[1].attribute_type, AttributeType::Number);
        assert_eq!(request.indexes[0].scope, IndexScope::Local);
        assert_eq!(request.indexes[1].attributes[0].name, "date");
    }

    #[test]
    fn test_create_table_index_requires_key_role() {
        let err =
            parse_create_table("CREATE TABLE t (id S HASH, INDEX GLOBAL gi (id S));").unwrap_err();
        assert!(matches!(
            err,
            Error::Validation {
                kind: CommandKind::CreateTable,
                ..
            }
        ));
    }

    #[test]
    fn test_create_table_errors() {
        // missing TABLE
        assert!(parse_create_table("CREATE t (id S HASH);").is_err());
        // missing (
        assert!(parse_create_table("CREATE TABLE t id S HASH;").is_err());
        // missing type
        assert!(parse_create_table("CREATE TABLE t (id);").is_err());
        // illegal type
        assert!(matches!(
            parse_create_table("CREATE TABLE t (id X HASH);").unwrap_err(),
            Error::Validation { .. }
        ));
        // missing comma
        assert!(parse_create_table("CREATE TABLE t (id S HASH name S);").is_err());
        // missing closing paren
        assert!(parse_create_table("CREATE TABLE t (id S HASH").is_err());
        // illegal index scope
        assert!(parse_create_table("CREATE TABLE t (id S HASH, INDEX SHARED gi (id S HASH));").is_err());
        // trailing garbage
        assert!(parse_create_table("CREATE TABLE t (id S HASH) extra;").is_err());
    }
}
