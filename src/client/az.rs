//! `DirectoryClient` backed by the Azure CLI.
//!
//! Each operation is one `az keyvault ...` process invocation with
//! tab-separated output. Authentication is whatever `az login` left behind.

use std::io::ErrorKind;
use std::process::Command;

use tracing::debug;

use super::DirectoryClient;
use crate::config::Settings;
use crate::errors::{AkvError, Result};

/// stderr fragments that mean the service was never reached.
const CONNECTIVITY_MARKERS: &[&str] = &[
    "Failed to establish a new connection",
    "Name or service not known",
    "Temporary failure in name resolution",
    "nodename nor servname provided",
    "getaddrinfo failed",
    "Max retries exceeded",
    "Connection refused",
    "Connection reset",
    "timed out",
];

/// stderr fragments that mean the named vault does not exist.
const VAULT_MISSING_MARKERS: &[&str] = &["VaultNotFound", "could not be found"];

/// Azure CLI client.
pub struct AzCliClient {
    binary: String,
    subscription: Option<String>,
}

impl AzCliClient {
    pub fn new(binary: impl Into<String>, subscription: Option<String>) -> Self {
        Self {
            binary: binary.into(),
            subscription,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.az_binary.clone(), settings.subscription.clone())
    }

    /// Run `az <args>` and return its stdout.
    ///
    /// `vault` is only used to attribute a "vault not found" failure.
    fn run(&self, args: &[&str], vault: Option<&str>) -> Result<String> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(args);
        if let Some(sub) = &self.subscription {
            cmd.args(["--subscription", sub.as_str()]);
        }

        debug!(binary = %self.binary, ?args, "invoking azure cli");

        let output = cmd.output().map_err(|e| match e.kind() {
            ErrorKind::NotFound => AkvError::Connectivity(format!(
                "'{}' not found on PATH — install the Azure CLI and run `az login`",
                self.binary
            )),
            _ => AkvError::Connectivity(format!("failed to launch '{}': {e}", self.binary)),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_failure(&stderr, vault));
        }

        String::from_utf8(output.stdout)
            .map_err(|_| AkvError::SerializationError("az output is not valid UTF-8".into()))
    }
}

impl DirectoryClient for AzCliClient {
    fn name(&self) -> &str {
        "az"
    }

    fn list_vaults(&self) -> Result<Vec<String>> {
        let out = self.run(
            &["keyvault", "list", "--query", "[].name", "-o", "tsv"],
            None,
        )?;
        Ok(parse_tsv_names(&out))
    }

    fn list_secrets(&self, vault: &str) -> Result<Vec<String>> {
        let out = self.run(
            &[
                "keyvault",
                "secret",
                "list",
                "--vault-name",
                vault,
                "--query",
                "[].name",
                "-o",
                "tsv",
            ],
            Some(vault),
        )?;
        Ok(parse_tsv_names(&out))
    }

    fn get_secret_value(&self, vault: &str, secret: &str) -> Result<String> {
        let out = self.run(
            &[
                "keyvault",
                "secret",
                "show",
                "--vault-name",
                vault,
                "--name",
                secret,
                "--query",
                "value",
                "-o",
                "tsv",
            ],
            Some(vault),
        )?;
        Ok(strip_trailing_newline(out))
    }

    fn set_secret_value(&self, vault: &str, secret: &str, value: &str) -> Result<()> {
        self.run(
            &[
                "keyvault",
                "secret",
                "set",
                "--vault-name",
                vault,
                "--name",
                secret,
                "--value",
                value,
                "--output",
                "none",
            ],
            Some(vault),
        )?;
        Ok(())
    }
}

/// Split `-o tsv` output into names, skipping blank lines.
fn parse_tsv_names(out: &str) -> Vec<String> {
    out.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

fn strip_trailing_newline(mut s: String) -> String {
    if s.ends_with('\n') {
        s.pop();
        if s.ends_with('\r') {
            s.pop();
        }
    }
    s
}

/// Map a failed `az` invocation onto the error taxonomy.
fn classify_failure(stderr: &str, vault: Option<&str>) -> AkvError {
    let message = stderr
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(|l| l.trim_start_matches("ERROR:").trim())
        .unwrap_or("az exited with an error")
        .to_string();

    if let Some(v) = vault {
        if VAULT_MISSING_MARKERS.iter().any(|m| stderr.contains(m)) {
            return AkvError::VaultNotFound(v.to_string());
        }
    }

    if CONNECTIVITY_MARKERS.iter().any(|m| stderr.contains(m)) {
        return AkvError::Connectivity(message);
    }

    AkvError::Service(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tsv_names_skip_blank_lines() {
        let names = parse_tsv_names("alpha\n\n beta \r\ngamma\n");
        assert_eq!(names, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn empty_output_yields_no_names() {
        assert!(parse_tsv_names("").is_empty());
        assert!(parse_tsv_names("\n").is_empty());
    }

    #[test]
    fn secret_value_keeps_inner_whitespace() {
        assert_eq!(strip_trailing_newline("a b \n".into()), "a b ");
        assert_eq!(strip_trailing_newline("line1\nline2\r\n".into()), "line1\nline2");
        assert_eq!(strip_trailing_newline("raw".into()), "raw");
    }

    #[test]
    fn classify_missing_vault() {
        let err = classify_failure(
            "ERROR: The specified vault: kv-gone could not be found.\n",
            Some("kv-gone"),
        );
        assert!(matches!(err, AkvError::VaultNotFound(ref v) if v == "kv-gone"));
    }

    #[test]
    fn classify_connectivity() {
        let err = classify_failure(
            "ERROR: HTTPSConnectionPool: Max retries exceeded with url: /\n",
            None,
        );
        assert!(matches!(err, AkvError::Connectivity(_)));
    }

    #[test]
    fn classify_service_error_uses_first_line() {
        let err = classify_failure(
            "ERROR: Forbidden: caller lacks secrets/list permission\nmore detail\n",
            Some("kv-a"),
        );
        match err {
            AkvError::Service(msg) => {
                assert_eq!(msg, "Forbidden: caller lacks secrets/list permission")
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn missing_binary_is_connectivity_error() {
        let client = AzCliClient::new("akv-test-no-such-binary", None);
        assert!(matches!(
            client.list_vaults(),
            Err(AkvError::Connectivity(_))
        ));
    }
}
