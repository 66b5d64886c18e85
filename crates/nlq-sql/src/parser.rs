use crate::error::{SqlError, SqlResult};
use sqlparser::ast::Statement;
use sqlparser::dialect::{Dialect, PostgreSqlDialect};
use sqlparser::parser::Parser;

/// Thin wrapper over `sqlparser`, fixed to the single dialect this
/// orchestrator targets. Kept as its own type (rather than calling
/// `sqlparser` directly from every crate) so the dialect choice lives in one
/// place.
pub struct SqlParser {
    dialect: Box<dyn Dialect>,
}

impl Default for SqlParser {
    fn default() -> Self {
        Self::postgres()
    }
}

impl SqlParser {
    pub fn postgres() -> Self {
        Self {
            dialect: Box::new(PostgreSqlDialect {}),
        }
    }

    pub fn parse(&self, sql: &str) -> SqlResult<Vec<Statement>> {
        Parser::parse_sql(self.dialect.as_ref(), sql).map_err(|e| SqlError::Parse(e.to_string()))
    }

    /// Parses `sql` and requires it to contain exactly one statement.
    pub fn parse_single(&self, sql: &str) -> SqlResult<Statement> {
        let mut statements = self.parse(sql)?;
        if statements.len() != 1 {
            return Err(SqlError::NotSingleSelect(format!(
                "expected 1 statement, found {}",
                statements.len()
            )));
        }
        Ok(statements.remove(0))
    }

    pub fn dialect_name(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_select() {
        let parser = SqlParser::postgres();
        let statements = parser.parse("SELECT id FROM orders").unwrap();
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn parse_single_rejects_multiple_statements() {
        let parser = SqlParser::postgres();
        let result = parser.parse_single("SELECT 1; SELECT 2");
        assert!(result.is_err());
    }

    #[test]
    fn parses_cte_and_window_function() {
        let parser = SqlParser::postgres();
        let sql = "WITH recent AS (SELECT id, created_at FROM orders) \
                   SELECT id, ROW_NUMBER() OVER (ORDER BY created_at) FROM recent";
        let statements = parser.parse(sql).unwrap();
        assert_eq!(statements.len(), 1);
    }
}
