//! SQLite Wrapper
//!
//! The bundled wrapper for `rusqlite` connections. Statements are prepared
//! and run as given; statements without result columns (DDL, DML) produce no
//! output, everything else produces one table. Text holding more than one
//! statement is rejected before anything runs.
use super::{ConnectionWrapper, RawConnection, WrapperKind};
use crate::commands::{wrong_arguments, CommandOutcome, CommandSpec};
use crate::core::{DbreakError, Output, Result, TableOutput, Value};
use crate::session::DebugSession;
use rusqlite::{types::ValueRef, Batch, Connection};
use std::any::{self, Any};
use tracing::debug;

const LIST_TABLES_SQL: &str =
    "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name";

/// Drives a `rusqlite::Connection`.
#[derive(Debug)]
pub struct SqliteWrapper {
    connection: Connection,
}

impl SqliteWrapper {
    pub fn new(connection: Connection) -> Self {
        SqliteWrapper { connection }
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }
}

impl WrapperKind for SqliteWrapper {
    const NAME: &'static str = "SqliteWrapper";

    fn handles(raw: &RawConnection) -> bool {
        raw.is::<Connection>()
    }

    fn wrap(raw: RawConnection) -> Result<Self> {
        raw.downcast::<Connection>()
            .map(SqliteWrapper::new)
            .map_err(|raw| DbreakError::UnsupportedConnection(raw.type_name()))
    }
}

impl ConnectionWrapper for SqliteWrapper {
    fn wrapper_name(&self) -> &'static str {
        Self::NAME
    }

    fn raw_connection(&self) -> &dyn Any {
        &self.connection
    }

    fn driver_type_name(&self) -> &'static str {
        any::type_name::<Connection>()
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn execute_statement(&mut self, statement: &str) -> Result<Vec<Output>> {
        let mut batch = Batch::new(&self.connection, statement);
        // Blank or comment-only text compiles to nothing.
        let Some(mut stmt) = batch.next()? else {
            return Ok(Vec::new());
        };
        // Anything left after the first statement is another statement, even
        // one that fails to compile on its own.
        if !matches!(batch.next(), Ok(None)) {
            return Err(DbreakError::MultipleStatements);
        }

        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        if columns.is_empty() {
            let changed = stmt.execute([])?;
            debug!(changed, "statement returned no columns");
            return Ok(Vec::new());
        }

        let column_count = columns.len();
        let rows = stmt
            .query_map([], |row| {
                (0..column_count)
                    .map(|i| row.get_ref(i).map(Value::from))
                    .collect::<rusqlite::Result<Vec<_>>>()
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        debug!(rows = rows.len(), "statement returned rows");
        Ok(vec![Output::Table(TableOutput::new(columns, rows))])
    }

    fn custom_commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec {
                name: "tables",
                handler: list_tables,
                description: "List the tables of the current SQLite database",
                arguments: &[],
                verbose_final_argument: false,
            },
            CommandSpec {
                name: "schema",
                handler: describe_table,
                description: "Show the columns of a table in the current SQLite database",
                arguments: &["table"],
                verbose_final_argument: false,
            },
        ]
    }
}

impl From<ValueRef<'_>> for Value {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(f) => Value::Real(f),
            ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Value::Blob(b.to_vec()),
        }
    }
}

fn list_tables(session: &mut DebugSession, _arguments: &[String]) -> Result<CommandOutcome> {
    let outputs = session.current_connection_mut().execute_statement(LIST_TABLES_SQL)?;
    Ok(CommandOutcome::Continue(outputs))
}

fn describe_table(session: &mut DebugSession, arguments: &[String]) -> Result<CommandOutcome> {
    let [table] = arguments else {
        return Err(wrong_arguments("schema", 1, arguments));
    };
    let statement = format!("PRAGMA table_info('{}')", table.replace('\'', "''"));
    let outputs = session.current_connection_mut().execute_statement(&statement)?;
    Ok(CommandOutcome::Continue(outputs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::execute_command;
    use crate::test_utils::{basic_debug_session, memory_connection};

    fn wrapper_with_table() -> SqliteWrapper {
        let connection = memory_connection();
        connection
            .execute_batch(
                "
                CREATE TABLE foobar (i int, a varchar(255));
                INSERT INTO foobar SELECT 100, 'sample-record';
            ",
            )
            .unwrap();
        SqliteWrapper::new(connection)
    }

    fn table(outputs: &[Output]) -> &TableOutput {
        match outputs.first() {
            Some(Output::Table(table)) => table,
            other => panic!("Expected a table output, got {other:?}"),
        }
    }

    #[test]
    fn test_create_table() {
        let mut wrapper = SqliteWrapper::new(memory_connection());
        let outputs = wrapper
            .execute_statement("create table foobar (i int, a varchar(255));")
            .unwrap();
        assert!(outputs.is_empty());
    }

    #[test]
    fn test_select() {
        let mut wrapper = SqliteWrapper::new(memory_connection());
        let outputs = wrapper.execute_statement("select 1 as foo, '100' as bar;").unwrap();

        assert_eq!(outputs.len(), 1);
        let table = table(&outputs);
        assert_eq!(table.columns, vec!["foo", "bar"]);
        assert_eq!(table.rows, vec![vec![Value::Integer(1), Value::from("100")]]);
    }

    #[test]
    fn test_select_datetime() {
        let mut wrapper = SqliteWrapper::new(memory_connection());
        let outputs = wrapper
            .execute_statement("select datetime('2000-01-01 00:00:00') as the_datetime;")
            .unwrap();

        let table = table(&outputs);
        assert_eq!(table.columns, vec!["the_datetime"]);
        assert_eq!(table.rows, vec![vec![Value::from("2000-01-01 00:00:00")]]);
    }

    #[test]
    fn test_null_real_and_blob_values() {
        let mut wrapper = SqliteWrapper::new(memory_connection());
        let outputs = wrapper
            .execute_statement("select null as n, 1.5 as r, X'48656C6C6F' as b")
            .unwrap();
        assert_eq!(
            table(&outputs).rows,
            vec![vec![Value::Null, Value::Real(1.5), Value::Blob(b"Hello".to_vec())]]
        );
    }

    #[test]
    fn test_dml_returns_nothing() {
        let mut wrapper = wrapper_with_table();
        assert!(wrapper.execute_statement("insert into foobar select 1, 'hello'").unwrap().is_empty());
        assert!(wrapper.execute_statement("update foobar set i = 7").unwrap().is_empty());
        assert!(wrapper.execute_statement("delete from foobar").unwrap().is_empty());
    }

    #[test]
    fn test_driver_error_propagates() {
        let mut wrapper = SqliteWrapper::new(memory_connection());
        match wrapper.execute_statement("SELECT * FROM nonexistent_table") {
            Err(DbreakError::Database(e)) => assert!(e.to_string().contains("no such table")),
            other => panic!("Expected Database error, got {other:?}"),
        }
    }

    #[test]
    fn test_multiple_statements_are_rejected() {
        let mut wrapper = SqliteWrapper::new(memory_connection());
        assert!(matches!(
            wrapper.execute_statement("create table a (x int); create table b (y int)"),
            Err(DbreakError::MultipleStatements)
        ));
        assert!(matches!(
            wrapper.execute_statement("select 1 as one; select 2 as two"),
            Err(DbreakError::MultipleStatements)
        ));

        let outputs = wrapper.execute_statement(LIST_TABLES_SQL).unwrap();
        assert!(table(&outputs).rows.is_empty());
    }

    #[test]
    fn test_trailing_semicolon_and_comments_are_one_statement() {
        let mut wrapper = SqliteWrapper::new(memory_connection());
        let outputs = wrapper
            .execute_statement("select 1 as one;  -- trailing comment\n")
            .unwrap();
        assert_eq!(table(&outputs).rows, vec![vec![Value::Integer(1)]]);
        assert!(wrapper.execute_statement("   ").unwrap().is_empty());
        assert!(wrapper.execute_statement("-- nothing to run").unwrap().is_empty());
    }

    #[test]
    fn test_tables_and_schema_commands() {
        let mut session = basic_debug_session();
        execute_command("create table people (id integer primary key, name text)", &mut session).unwrap();

        let outputs = match execute_command("!tables", &mut session).unwrap() {
            CommandOutcome::Continue(outputs) => outputs,
            CommandOutcome::Exit => panic!("!tables ended the session"),
        };
        assert_eq!(table(&outputs).rows, vec![vec![Value::from("people")]]);

        let outputs = match execute_command("!schema people", &mut session).unwrap() {
            CommandOutcome::Continue(outputs) => outputs,
            CommandOutcome::Exit => panic!("!schema ended the session"),
        };
        let names: Vec<&Value> = table(&outputs).rows.iter().map(|row| &row[1]).collect();
        assert_eq!(names, vec![&Value::from("id"), &Value::from("name")]);
    }
}
