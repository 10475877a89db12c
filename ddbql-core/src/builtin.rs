//! Built-in shell verbs recognized before any statement parsing.

/// Verbs matched by exact prefix of the trimmed input line, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Sleep,
    Clear,
    Exit,
    Introspect,
    Connect,
    LoadScript,
    Echo,
}

const PREFIXES: [(&str, Builtin); 7] = [
    ("sleep", Builtin::Sleep),
    ("clear", Builtin::Clear),
    ("exit", Builtin::Exit),
    ("!", Builtin::Introspect),
    ("connect", Builtin::Connect),
    (".", Builtin::LoadScript),
    ("echo", Builtin::Echo),
];

impl Builtin {
    pub fn detect(line: &str) -> Option<Builtin> {
        PREFIXES
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix))
            .map(|(_, builtin)| *builtin)
    }
}

/// `!x` introspection commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Introspection {
    History,
    CurrentBuffer,
    Variables,
    Help,
}

impl Introspection {
    pub fn detect(line: &str) -> Option<Introspection> {
        match line.chars().nth(1) {
            Some('h') => Some(Introspection::History),
            Some('c') => Some(Introspection::CurrentBuffer),
            Some('v') => Some(Introspection::Variables),
            Some('?') => Some(Introspection::Help),
            _ => None,
        }
    }
}

/// Text printed by `!?`
pub const HELP_TEXT: &str = "
  !?             show help message
  !h             show execute query history
  !c             show the command being entered
  !v             show variables and values
  @name = value; set a variable, referenced as ${name}
  . <file>       run a script file
  echo <text>    print text after variable substitution
  sleep <ms>     wait for the given milliseconds
  connect [-p profile] [-r region] [-E endpoint] [--access_key key] [--secret_access_key secret]
                 reconnect with new settings
  run;           fetch the next page of the last query
  clear          clear console
  exit           exit ddbql cli
";
