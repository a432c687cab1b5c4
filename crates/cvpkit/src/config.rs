//! CLI configuration: thin wrapper around `cvpkit_config` shared types.
//!
//! Merges the selected profile with command-line overrides (`--host`,
//! `--user`, `--port`, `--ssl`, `--cluster-config`) and resolves the
//! password, prompting on a terminal as a last resort.

use std::io::IsTerminal;

use secrecy::SecretString;
use tracing::debug;

use cvpkit_config::{ClusterConfig, Config, ConfigError, Profile, config_path};
use cvpkit_core::ControllerConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use cvpkit_config::load_config_or_default;

/// A controller connection ready to use, plus the host it was built for.
#[derive(Debug)]
pub struct Resolved {
    pub host: String,
    pub controller: ControllerConfig,
}

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build the effective profile: the configured one (if any) overridden by
/// flags. An explicitly requested profile must exist.
pub fn effective_profile(global: &GlobalOpts, config: &Config) -> Result<Profile, CliError> {
    let name = active_profile_name(global, config);
    let base = match config.profiles.get(&name) {
        Some(profile) => Some(profile.clone()),
        None if global.profile.is_some() => {
            let mut available: Vec<&str> = config.profiles.keys().map(String::as_str).collect();
            available.sort_unstable();
            return Err(CliError::ProfileNotFound {
                name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
            });
        }
        None => None,
    };

    let host = match (&global.host, &global.cluster_config) {
        (Some(host), _) => Some(host.clone()),
        (None, Some(path)) => Some(primary_host(path)?),
        (None, None) => base.as_ref().map(|p| p.host.clone()),
    };
    let Some(host) = host.filter(|h| !h.is_empty()) else {
        return Err(CliError::NoHost {
            path: config_path().display().to_string(),
        });
    };

    let mut profile = base.unwrap_or_else(|| Profile::new(host.clone()));
    profile.host = host;
    if let Some(user) = &global.user {
        profile.username = Some(user.clone());
    }
    if let Some(port) = global.port {
        profile.port = port;
    }
    if let Some(ssl) = global.ssl {
        profile.ssl = ssl;
    }
    Ok(profile)
}

/// Management address of the cluster's primary node.
fn primary_host(path: &std::path::Path) -> Result<String, CliError> {
    let cluster = ClusterConfig::load(path)?;
    let host = cluster
        .primary()
        .and_then(|node| node.mgmt_ip())
        .ok_or_else(|| CliError::Validation {
            field: "cluster-config".into(),
            reason: format!("{} has no address for the primary node", path.display()),
        })?;
    debug!(host, mode = %cluster.mode(), "controller host from cluster file");
    Ok(host)
}

/// Resolve everything needed to talk to the controller.
pub fn resolve(global: &GlobalOpts, config: &Config) -> Result<Resolved, CliError> {
    let name = active_profile_name(global, config);
    let profile = effective_profile(global, config)?;
    let user = profile
        .username
        .clone()
        .ok_or_else(|| CliError::usage("user", "--user is required when no profile sets it"))?;

    let password = match cvpkit_config::resolve_password(
        global.password.as_deref(),
        Some(&profile),
        &name,
    ) {
        Ok(pw) => pw,
        Err(ConfigError::NoCredentials { .. }) if std::io::stdin().is_terminal() => {
            prompt_password(&user, &profile.host)?
        }
        Err(e) => return Err(e.into()),
    };

    let controller = cvpkit_config::profile_to_controller_config(&profile, password, &config.defaults)?;
    Ok(Resolved {
        host: profile.host,
        controller,
    })
}

fn prompt_password(user: &str, host: &str) -> Result<SecretString, CliError> {
    let pw = rpassword::prompt_password(format!("Password for user {user} on host {host}: "))?;
    Ok(SecretString::from(pw))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["cvptool"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap().global
    }

    fn config_with_lab() -> Config {
        let mut config = Config::default();
        let mut lab = Profile::new("cvp.lab");
        lab.username = Some("cvpadmin".into());
        config.profiles.insert("lab".into(), lab);
        config
    }

    #[test]
    fn flags_override_profile() {
        let config = config_with_lab();
        let opts = global(&["--profile", "lab", "--port", "443", "--ssl", "true"]);
        let profile = effective_profile(&opts, &config).unwrap();
        assert_eq!(profile.host, "cvp.lab");
        assert_eq!(profile.port, 443);
        assert!(profile.ssl);
        assert_eq!(profile.username.as_deref(), Some("cvpadmin"));
    }

    #[test]
    fn unknown_profile_lists_available() {
        let config = config_with_lab();
        let opts = global(&["--profile", "prod", "--host", "x"]);
        let err = effective_profile(&opts, &config).unwrap_err();
        assert!(matches!(err, CliError::ProfileNotFound { ref available, .. } if available == "lab"));
    }

    #[test]
    fn host_comes_from_cluster_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cvp-config.yaml");
        std::fs::write(
            &path,
            "version: 2\ncommon: {}\nnode1:\n  interfaces:\n    eth0: {ip_address: 10.0.0.11}\n",
        )
        .unwrap();
        let opts = global(&["--cluster-config", path.to_str().unwrap(), "--user", "cvpadmin"]);
        let profile = effective_profile(&opts, &Config::default()).unwrap();
        assert_eq!(profile.host, "10.0.0.11");
        assert_eq!(profile.port, 80);
    }

    #[test]
    fn no_host_is_a_usage_error() {
        let opts = global(&["--user", "cvpadmin"]);
        let err = effective_profile(&opts, &Config::default()).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::exit_code::USAGE);
    }

    #[test]
    fn password_flag_builds_controller_config() {
        let opts = global(&["--host", "cvp.lab", "--user", "cvpadmin", "--password", "pw"]);
        let resolved = resolve(&opts, &Config::default()).unwrap();
        assert_eq!(resolved.host, "cvp.lab");
        assert_eq!(resolved.controller.url.as_str(), "http://cvp.lab/");
        assert_eq!(resolved.controller.username, "cvpadmin");
    }
}
