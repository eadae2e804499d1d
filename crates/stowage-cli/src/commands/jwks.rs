//! JSON Web Key Set generation.

use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};

use stowage_auth::Jwks;
use stowage_core::error::AppError;

use crate::output;

/// Arguments for JWKS commands
#[derive(Debug, Args)]
pub struct JwksArgs {
    /// JWKS subcommand
    #[command(subcommand)]
    pub command: JwksCommand,
}

/// JWKS subcommands
#[derive(Debug, Subcommand)]
pub enum JwksCommand {
    /// Build a JWKS document from an Ed25519 public key
    Generate {
        /// PEM-encoded Ed25519 public key
        #[arg(long)]
        public_key: PathBuf,
        /// Where to write the document; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Execute JWKS commands
pub fn execute(args: &JwksArgs) -> Result<(), AppError> {
    match &args.command {
        JwksCommand::Generate {
            public_key,
            output: destination,
        } => {
            let document = generate(public_key)?;
            match destination {
                Some(path) => {
                    std::fs::write(path, format!("{document}\n"))?;
                    output::print_success(&format!("JWKS written to {}", path.display()));
                }
                None => println!("{document}"),
            }
        }
    }
    Ok(())
}

/// Pretty-printed JWKS for the key at `public_key`.
fn generate(public_key: &Path) -> Result<String, AppError> {
    let pem = std::fs::read_to_string(public_key).map_err(|e| {
        AppError::configuration(format!(
            "Failed to read public key {}: {e}",
            public_key.display()
        ))
    })?;
    let jwks = Jwks::from_public_key_pem(&pem)?;
    Ok(serde_json::to_string_pretty(&jwks)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// RFC 8037 appendix A.2 public key.
    const PUBLIC_PEM: &str = "-----BEGIN PUBLIC KEY-----\n\
MCowBQYDK2VwAyEA11qYAYKxCrfVS/7TyWQHOg7hcvPapiMlrwIaaPcHURo=\n\
-----END PUBLIC KEY-----\n";

    #[test]
    fn test_generate_from_pem_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("public.pem");
        std::fs::write(&path, PUBLIC_PEM).unwrap();

        let document: serde_json::Value =
            serde_json::from_str(&generate(&path).unwrap()).unwrap();
        let key = &document["keys"][0];
        assert_eq!(key["kty"], "OKP");
        assert_eq!(key["crv"], "Ed25519");
        assert_eq!(key["x"], "11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo");
        assert_eq!(key["kid"], "kPrK_qmxVWaYVA9wwBF6Iuo3vVzz7TxHCTwXBygrS4k");
    }

    #[test]
    fn test_missing_file_is_configuration_error() {
        let err = generate(Path::new("/nonexistent/key.pem")).unwrap_err();
        assert_eq!(err.kind, stowage_core::error::ErrorKind::Configuration);
    }
}
