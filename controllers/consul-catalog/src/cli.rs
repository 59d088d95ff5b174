//! Command line interface.
//!
//! Parameters come either from a YAML/JSON args file (what an automation
//! host writes for a module call) or from flags with `CONSUL_*` env fallbacks.

use crate::error::ControllerError;
use crate::params::ModuleParams;
use crate::target::DesiredState;
use anyhow::Context;
use clap::Parser;
use consul_client::Scheme;
use std::path::{Path, PathBuf};

/// Key the host framework wraps module arguments in
const WRAPPED_ARGS_KEY: &str = "ANSIBLE_MODULE_ARGS";

/// Register or deregister a node and its service in the Consul catalog
#[derive(Debug, Parser)]
#[command(name = "consul-catalog")]
#[command(version)]
pub struct Cli {
    /// Parameter file (YAML or JSON); when given, the parameter flags are ignored
    pub args_file: Option<PathBuf>,

    /// Consul agent host
    #[arg(long, env = "CONSUL_HOST", default_value = "localhost")]
    pub consul_host: String,

    /// Consul agent HTTP port
    #[arg(long, env = "CONSUL_PORT", default_value_t = 8500)]
    pub consul_port: i64,

    /// ACL token
    #[arg(long, env = "CONSUL_HTTP_TOKEN", default_value = "", hide_env_values = true)]
    pub token: String,

    /// Catalog node to add or remove
    #[arg(long)]
    pub node: Option<String>,

    /// Datacenter to work with
    #[arg(long, env = "CONSUL_DATACENTER", default_value = "")]
    pub dc: String,

    /// Network address of the node
    #[arg(long)]
    pub address: Option<String>,

    /// Scheme used to reach the agent (http or https)
    #[arg(long, env = "CONSUL_SCHEME", default_value = "http")]
    pub scheme: Scheme,

    /// Verify the agent's TLS certificate
    #[arg(long)]
    pub verify: bool,

    /// Add (present) or remove (absent) the node
    #[arg(long, default_value = "present")]
    pub state: DesiredState,

    #[arg(long, default_value = "")]
    pub service_name: String,

    #[arg(long, default_value = "")]
    pub service_id: String,

    #[arg(long, default_value_t = 0)]
    pub service_port: i64,

    /// Service tag; repeat or separate with commas
    #[arg(long = "service-tag", value_delimiter = ',')]
    pub service_tags: Vec<String>,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: i64,

    /// Read the node first and report no change when it already matches
    #[arg(long)]
    pub detect_changes: bool,

    /// Log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Resolve the parameter record from the args file or the flags
    ///
    /// # Errors
    /// Returns `ControllerError::Validation` when the args file cannot be read or parsed.
    pub fn load_params(&self) -> Result<ModuleParams, ControllerError> {
        match &self.args_file {
            Some(path) => load_args_file(path).map_err(|e| ControllerError::Validation(format!("{e:#}"))),
            None => Ok(self.flag_params()),
        }
    }

    fn flag_params(&self) -> ModuleParams {
        ModuleParams {
            consul_host: Some(self.consul_host.clone()),
            consul_port: Some(self.consul_port),
            token: self.token.clone(),
            node: self.node.clone(),
            dc: self.dc.clone(),
            address: self.address.clone(),
            scheme: Some(self.scheme),
            verify: self.verify,
            state: Some(self.state),
            service_name: self.service_name.clone(),
            service_id: self.service_id.clone(),
            service_port: self.service_port,
            service_tags: self.service_tags.clone(),
            timeout: Some(self.timeout),
            detect_changes: self.detect_changes,
            check_mode: false,
            extra: Default::default(),
        }
    }
}

/// Read a YAML or JSON parameter file, optionally wrapped in `ANSIBLE_MODULE_ARGS`
pub fn load_args_file(path: &Path) -> anyhow::Result<ModuleParams> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read parameter file {}", path.display()))?;
    parse_args(&raw).with_context(|| format!("Invalid parameter file {}", path.display()))
}

fn parse_args(raw: &str) -> anyhow::Result<ModuleParams> {
    let document: serde_yaml::Value = serde_yaml::from_str(raw).context("not valid YAML or JSON")?;
    let document = match document.get(WRAPPED_ARGS_KEY) {
        Some(inner) => inner.clone(),
        None => document,
    };
    serde_yaml::from_value(document).context("parameters do not match the expected record")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;
    use std::io::Write;

    #[test]
    fn test_flags_map_to_params() {
        let cli = Cli::parse_from([
            "consul-catalog",
            "--node",
            "db1.example.net",
            "--state",
            "absent",
            "--service-id",
            "db1_postgres",
            "--service-tag",
            "master,v1",
            "--scheme",
            "https",
        ]);
        let params = cli.load_params().unwrap();

        assert_eq!(params.node.as_deref(), Some("db1.example.net"));
        assert_eq!(params.state, Some(DesiredState::Absent));
        assert_eq!(params.scheme, Some(Scheme::Https));
        assert_eq!(params.service_tags, vec!["master", "v1"]);
        assert_eq!(params.consul_port, Some(8500));
    }

    #[test]
    fn test_invalid_state_flag_is_rejected() {
        let result = Cli::try_parse_from(["consul-catalog", "--node", "db1", "--state", "gone"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_wrapped_json_args() {
        let params = parse_args(
            r#"{"ANSIBLE_MODULE_ARGS": {"node": "db1.example.net", "state": "absent", "_ansible_verbosity": 0}}"#,
        )
        .unwrap();
        assert_eq!(params.node.as_deref(), Some("db1.example.net"));
        assert_eq!(params.state, Some(DesiredState::Absent));
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_wrapped_templated_scalars() {
        let params = parse_args(
            r#"{"ANSIBLE_MODULE_ARGS": {"node": "db1", "consul_port": "8500", "service_port": "5432", "verify": "yes", "_ansible_check_mode": "True"}}"#,
        )
        .unwrap();
        let invocation = params.validate().unwrap();
        assert_eq!(invocation.connection.port, 8500);
        assert_eq!(invocation.target.service.port, 5432);
        assert!(invocation.connection.verify_tls);
        assert!(invocation.check_mode);
    }

    #[test]
    fn test_flat_yaml_args() {
        let params = parse_args(
            "node: db1.example.net\nservice_name: postgres\nservice_port: 5432\nservice_tags:\n  - master\n  - v1\n",
        )
        .unwrap();
        assert_eq!(params.service_port, 5432);
        assert_eq!(params.service_tags, vec!["master", "v1"]);
    }

    #[test]
    fn test_bad_enum_in_args_file() {
        assert!(parse_args(r#"{"node": "db1", "scheme": "ftp"}"#).is_err());
    }

    #[test]
    fn test_args_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"node": "db1.example.net", "dc": "dc1"}}"#).unwrap();

        let cli = Cli::parse_from([OsStr::new("consul-catalog"), file.path().as_os_str()]);
        let params = cli.load_params().unwrap();
        assert_eq!(params.dc, "dc1");
    }

    #[test]
    fn test_missing_args_file_is_validation_error() {
        let cli = Cli::parse_from(["consul-catalog", "/nonexistent/args.json"]);
        let err = cli.load_params().unwrap_err();
        assert!(matches!(err, ControllerError::Validation(ref m) if m.contains("Failed to read")));
    }
}
