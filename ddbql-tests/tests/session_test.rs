use ddbql_core::storage::ExecuteOutput;
use ddbql_core::{Error, Flow, Line, ShellConfig, Value, CONTINUATION_PROMPT, PROMPT};
use ddbql_test_utils::{item, session, session_with, CapturedReporter, MemoryStorage, ScriptedPrompt};
use serde_json::json;

#[test]
fn test_select_is_complemented_and_reported() {
    let storage = MemoryStorage::new();
    let reporter = CapturedReporter::new();
    let mut session = session(&storage, &reporter);

    storage.push_execute_page(ExecuteOutput {
        items: vec![item(&[("id", Value::string("u1")), ("age", Value::number(30))])],
        next_token: Some("page-2".to_string()),
        last_evaluated_key: Some(item(&[("id", Value::string("u1"))])),
    });

    session.feed(r#"SELECT * FROM users WHERE id = "u1";"#).unwrap();

    let executed = storage.executed();
    assert_eq!(executed.len(), 1);
    assert_eq!(executed[0].statement, r#"SELECT * FROM "users" WHERE id = 'u1';"#);
    assert_eq!(executed[0].limit, None);
    assert_eq!(executed[0].next_token, None);

    let captured = reporter.snapshot();
    assert_eq!(captured.items.len(), 1);
    assert_eq!(captured.items[0].len(), 1);
    assert_eq!(captured.documents, vec![json!({"id": "u1"})]);
    assert!(captured.messages.contains(&"NextToken: page-2".to_string()));
    assert_eq!(session.next_token(), Some("page-2"));
}

#[test]
fn test_run_forwards_remembered_token() {
    let storage = MemoryStorage::new();
    let reporter = CapturedReporter::new();
    let mut session = session(&storage, &reporter);

    storage.push_execute_page(ExecuteOutput {
        next_token: Some("t1".to_string()),
        ..Default::default()
    });
    session.feed("SELECT * FROM orders LIMIT 10;").unwrap();
    session.feed("run;").unwrap();

    let executed = storage.executed();
    assert_eq!(executed.len(), 2);
    assert_eq!(executed[1].statement, executed[0].statement);
    assert_eq!(executed[1].limit, Some(10));
    assert_eq!(executed[1].next_token.as_deref(), Some("t1"));

    // the second page carried no token, so nothing is remembered
    assert_eq!(session.next_token(), None);
    assert_eq!(session.history().latest(), Some("SELECT * FROM orders LIMIT 10;"));
}

#[test]
fn test_run_without_history() {
    let storage = MemoryStorage::new();
    let reporter = CapturedReporter::new();
    let mut session = session(&storage, &reporter);

    let err = session.feed("run;").unwrap_err();
    assert!(matches!(err, Error::NoHistory));
    assert!(storage.executed().is_empty());
}

#[test]
fn test_variables_are_substituted_before_complement() {
    let storage = MemoryStorage::new();
    let reporter = CapturedReporter::new();
    let mut session = session(&storage, &reporter);

    session.feed("@table = users;").unwrap();
    session.feed("@page = 'LIMIT 5';").unwrap();
    session.feed("SELECT * FROM ${table} ${page};").unwrap();

    let executed = storage.executed();
    assert_eq!(executed[0].statement, r#"SELECT * FROM "users" ;"#);
    assert_eq!(executed[0].limit, Some(5));
    assert_eq!(session.variables().get("table"), Some("users"));

    // history keeps the text as typed
    assert_eq!(session.history().latest(), Some("SELECT * FROM ${table} ${page};"));

    session.feed("!v").unwrap();
    let messages = reporter.messages();
    assert_eq!(
        &messages[messages.len() - 2..],
        &["[page] = LIMIT 5".to_string(), "[table] = users".to_string()]
    );
}

#[test]
fn test_echo_substitutes_joined_text() {
    let storage = MemoryStorage::new();
    let reporter = CapturedReporter::new();
    let mut session = session(&storage, &reporter);

    session.feed("@name = world;").unwrap();
    session.feed("echo hello ${name}").unwrap();
    session.feed("echo ${UUID}").unwrap();

    let messages = reporter.messages();
    assert_eq!(messages[0], "hello world");
    assert_eq!(messages[1].len(), 36);
    assert_eq!(messages[1].matches('-').count(), 4);
}

#[test]
fn test_history_is_bounded() {
    let storage = MemoryStorage::new();
    let reporter = CapturedReporter::new();
    let mut session =
        session_with(&storage, &reporter, ShellConfig::new().with_history_capacity(3));

    for i in 0..5 {
        session.feed(&format!("SELECT * FROM t{};", i)).unwrap();
    }
    assert_eq!(session.history().len(), 3);

    session.feed("!h").unwrap();
    assert_eq!(
        reporter.messages(),
        vec![
            "[0]: SELECT * FROM t2;",
            "[1]: SELECT * FROM t3;",
            "[2]: SELECT * FROM t4;",
        ]
    );
}

#[test]
fn test_failed_statement_is_not_recorded() {
    let storage = MemoryStorage::new();
    let reporter = CapturedReporter::new();
    let mut session = session(&storage, &reporter);

    storage.push_execute_error(Error::storage("execute statement", "throttled"));
    let err = session.feed("SELECT * FROM t;").unwrap_err();
    assert_eq!(err.code(), "STORAGE_ERROR");
    assert!(session.history().is_empty());

    let err = session.feed("MERGE INTO t;").unwrap_err();
    assert!(matches!(err, Error::UnsupportedStatement(_)));
    assert_eq!(session.pending(), "");
}

#[test]
fn test_connect_rebuilds_storage_and_forgets_token() {
    let storage = MemoryStorage::new();
    let reporter = CapturedReporter::new();
    let mut session = session(&storage, &reporter);

    storage.push_execute_page(ExecuteOutput {
        next_token: Some("t1".to_string()),
        ..Default::default()
    });
    session.feed("SELECT * FROM t;").unwrap();
    assert_eq!(session.next_token(), Some("t1"));

    session.feed("connect").unwrap();
    assert_eq!(storage.connections().len(), 1);
    assert_eq!(session.next_token(), Some("t1"));

    session
        .feed("connect -r eu-west-1 -E http://localhost:8000")
        .unwrap();
    let connections = storage.connections();
    assert_eq!(connections.len(), 2);
    assert_eq!(connections[1].region.as_deref(), Some("eu-west-1"));
    assert_eq!(connections[1].endpoint.as_deref(), Some("http://localhost:8000"));
    assert_eq!(session.next_token(), None);

    session.feed("connect -r us-west-2;").unwrap();
    assert_eq!(storage.connections()[2].region.as_deref(), Some("us-west-2"));

    let err = session.feed("connect --bogus").unwrap_err();
    assert!(matches!(err, Error::ConnectArguments(_)));
}

#[test]
fn test_builtins() {
    let storage = MemoryStorage::new();
    let reporter = CapturedReporter::new();
    let mut session = session(&storage, &reporter);

    session.feed("SELECT *").unwrap();
    session.feed("clear").unwrap();
    assert_eq!(session.pending(), "");
    assert_eq!(reporter.snapshot().clears, 1);

    session.feed("!x").unwrap();
    assert_eq!(reporter.warnings().len(), 1);

    session.feed("sleep 1 extra").unwrap();
    assert_eq!(reporter.warnings().len(), 2);
    session.feed("sleep 1;").unwrap();
    assert_eq!(reporter.warnings().len(), 2);

    session.feed("!?").unwrap();
    assert!(reporter.messages().last().unwrap().contains("run;"));

    assert_eq!(session.feed("exit").unwrap(), Flow::Exit);
}

#[test]
fn test_interactive_prompts_follow_buffer_state() {
    let storage = MemoryStorage::new();
    let reporter = CapturedReporter::new();
    let mut session = session(&storage, &reporter);

    let mut prompt = ScriptedPrompt::new(["SELECT *", "FROM users;", "exit", "SELECT * FROM t;"]);
    session.run(Some(&mut prompt)).unwrap();

    assert_eq!(prompt.prompts(), &[PROMPT, CONTINUATION_PROMPT, PROMPT]);
    assert_eq!(storage.executed().len(), 1);
}

#[test]
fn test_interrupt_discards_pending_buffer() {
    let storage = MemoryStorage::new();
    let reporter = CapturedReporter::new();
    let mut session = session(&storage, &reporter);

    let mut prompt = ScriptedPrompt::with_reads(vec![
        Line::Text("SELECT *".to_string()),
        Line::Interrupted,
        Line::Text("FROM users;".to_string()),
    ]);
    session.run(Some(&mut prompt)).unwrap();

    // "FROM users;" alone is not a statement the shell knows
    assert!(storage.executed().is_empty());
    assert_eq!(reporter.errors().len(), 1);
}

#[test]
fn test_interactive_errors_do_not_stop_the_loop() {
    let storage = MemoryStorage::new();
    let reporter = CapturedReporter::new();
    let mut session = session(&storage, &reporter);

    let mut prompt = ScriptedPrompt::new(["DESC missing;", "SELECT * FROM t;"]);
    session.run(Some(&mut prompt)).unwrap();

    assert_eq!(reporter.errors(), vec!["table [missing] not found"]);
    assert_eq!(storage.executed().len(), 1);
}
