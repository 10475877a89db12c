use clap::{Args, Parser};

use crate::error::{Error, Result};
use crate::history::HISTORY_CAPACITY;

/// Connection flags shared by the command line and the `connect` built-in
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionArgs {
    /// AWS profile name
    #[arg(short = 'p', long = "profile", value_name = "PROFILE")]
    pub profile: Option<String>,

    /// AWS region name
    #[arg(short = 'r', long = "region", value_name = "REGION")]
    pub region: Option<String>,

    /// Endpoint URL
    #[arg(short = 'E', long = "endpoint", value_name = "URL")]
    pub endpoint: Option<String>,

    /// AWS credential access key id
    #[arg(long = "access_key", value_name = "VALUE")]
    pub access_key: Option<String>,

    /// AWS credential secret access key
    #[arg(long = "secret_access_key", value_name = "VALUE")]
    pub secret_access_key: Option<String>,
}

/// `connect [flags]` as typed inside the shell
#[derive(Parser, Debug)]
#[command(name = "connect", disable_help_flag = true)]
struct ConnectCommand {
    #[command(flatten)]
    args: ConnectionArgs,

    #[arg(hide = true)]
    positionals: Vec<String>,
}

impl ConnectionArgs {
    /// Parse the flags of a `connect ...` command line.
    pub fn parse_connect(command: &str) -> Result<Self> {
        let words = command.trim().trim_end_matches(';').split_whitespace();
        ConnectCommand::try_parse_from(words)
            .map(|parsed| parsed.args)
            .map_err(|e| Error::ConnectArguments(format!("{} [{}]", e.kind(), command.trim())))
    }
}

/// Static access key pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Parameters used to build the storage client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub profile: Option<String>,
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_access_key: Option<String>,
}

impl ConnectionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_credentials(
        mut self,
        access_key: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.access_key = Some(access_key.into());
        self.secret_access_key = Some(secret_access_key.into());
        self
    }

    /// Static credentials, only when both halves are present
    pub fn credentials(&self) -> Option<StaticCredentials> {
        match (&self.access_key, &self.secret_access_key) {
            (Some(id), Some(secret)) => Some(StaticCredentials {
                access_key_id: id.clone(),
                secret_access_key: secret.clone(),
            }),
            _ => None,
        }
    }

    /// Overlay the flags that were given. Returns true when anything changed.
    pub fn apply(&mut self, args: &ConnectionArgs) -> bool {
        let mut changed = false;
        for (slot, value) in [
            (&mut self.profile, &args.profile),
            (&mut self.region, &args.region),
            (&mut self.endpoint, &args.endpoint),
            (&mut self.access_key, &args.access_key),
            (&mut self.secret_access_key, &args.secret_access_key),
        ] {
            if let Some(value) = value {
                *slot = Some(value.clone());
                changed = true;
            }
        }
        changed
    }
}

impl From<&ConnectionArgs> for ConnectionConfig {
    fn from(args: &ConnectionArgs) -> Self {
        let mut config = ConnectionConfig::default();
        config.apply(args);
        config
    }
}

/// Session-wide settings
#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// Storage connection parameters
    pub connection: ConnectionConfig,

    /// Keep running a batch script after a failed command
    pub no_stop: bool,

    /// Number of commands kept in the history ring
    pub history_capacity: usize,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig::default(),
            no_stop: false,
            history_capacity: HISTORY_CAPACITY,
        }
    }
}

impl ShellConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_connection(mut self, connection: ConnectionConfig) -> Self {
        self.connection = connection;
        self
    }

    pub fn with_no_stop(mut self, no_stop: bool) -> Self {
        self.no_stop = no_stop;
        self
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.history_capacity == 0 {
            return Err("history_capacity must be greater than 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_connect_flags() {
        let args = ConnectionArgs::parse_connect("connect -r ap-northeast-1 -E http://localhost:8000")
            .unwrap();
        assert_eq!(args.region.as_deref(), Some("ap-northeast-1"));
        assert_eq!(args.endpoint.as_deref(), Some("http://localhost:8000"));
        assert_eq!(args.profile, None);

        let args = ConnectionArgs::parse_connect(
            "connect --profile dev --access_key AK --secret_access_key SK",
        )
        .unwrap();
        assert_eq!(args.profile.as_deref(), Some("dev"));
        assert_eq!(args.access_key.as_deref(), Some("AK"));
        assert_eq!(args.secret_access_key.as_deref(), Some("SK"));
    }

    #[test]
    fn test_parse_connect_ignores_terminator() {
        let args = ConnectionArgs::parse_connect("connect -r us-east-1;").unwrap();
        assert_eq!(args.region.as_deref(), Some("us-east-1"));

        let args = ConnectionArgs::parse_connect("connect -E http://localhost:8000 ;").unwrap();
        assert_eq!(args.endpoint.as_deref(), Some("http://localhost:8000"));
    }

    #[test]
    fn test_parse_connect_tolerates_positionals() {
        let args = ConnectionArgs::parse_connect("connect somewhere").unwrap();
        assert_eq!(args, ConnectionArgs::default());
    }

    #[test]
    fn test_parse_connect_rejects_unknown_flag() {
        let err = ConnectionArgs::parse_connect("connect --bogus x").unwrap_err();
        assert_eq!(err.code(), "CONNECT_ARGUMENTS");
    }

    #[test]
    fn test_apply_reports_changes() {
        let mut config = ConnectionConfig::new().with_region("us-east-1");
        assert!(!config.apply(&ConnectionArgs::default()));

        let args = ConnectionArgs {
            region: Some("eu-west-1".into()),
            ..Default::default()
        };
        assert!(config.apply(&args));
        assert_eq!(config.region.as_deref(), Some("eu-west-1"));
    }

    #[test]
    fn test_credentials_need_both_halves() {
        let mut config = ConnectionConfig::new();
        config.access_key = Some("AK".into());
        assert!(config.credentials().is_none());

        let config = config.with_credentials("AK", "SK");
        let creds = config.credentials().unwrap();
        assert_eq!(creds.access_key_id, "AK");
        assert_eq!(creds.secret_access_key, "SK");
    }

    #[test]
    fn test_shell_config_validate() {
        assert!(ShellConfig::default().validate().is_ok());
        assert!(ShellConfig::new().with_history_capacity(0).validate().is_err());
        assert_eq!(ShellConfig::default().history_capacity, HISTORY_CAPACITY);
    }
}
