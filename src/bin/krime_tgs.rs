use clap::{Parser, Subcommand};
use libkrime_tgs::config::{ClientConfig, RealmHierarchy};
use libkrime_tgs::error::KrbError;
use libkrime_tgs::proto::{ErrorReply, MethodDataPolicy, PreauthHints};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, warn};

#[derive(Debug, clap::Parser)]
#[clap(about = "Kerberos service ticket tools - A Krime, If You Please")]
struct OptParser {
    #[clap(subcommand)]
    command: Opt,
}

#[derive(Debug, Subcommand)]
enum Opt {
    /// Decode a hex encoded KRB-ERROR and show the pre-authentication hints it carries.
    InspectError {
        error: String,
        #[clap(short, long, env = "KRIME_TGS_CONFIG")]
        config: Option<PathBuf>,
    },
    /// Show the realms walked from the local realm to a service realm.
    RealmPath {
        #[clap(short, long, env = "KRIME_TGS_CONFIG")]
        config: PathBuf,
        /// Defaults to `default_realm` of the configuration.
        #[clap(short, long)]
        local: Option<String>,
        service: String,
    },
}

fn inspect_error(hex_error: &str, config: Option<PathBuf>) -> Result<(), KrbError> {
    let policy = match config {
        Some(path) => ClientConfig::parse(path)?.method_data_policy(),
        None => MethodDataPolicy::default(),
    };

    let der_bytes = hex::decode(hex_error.trim()).map_err(|err| {
        error!(?err, "KRB-ERROR is not valid hex");
        KrbError::MalformedEncoding
    })?;

    let err = ErrorReply::from_der(&der_bytes)?;

    println!("code:        {:?} ({})", err.code(), i32::from(err.code()));
    println!("service:     {}", err.service());
    println!("server time: {:?}", err.server_time().to_system_time());
    if let Some(client) = err.client() {
        println!("client:      {}", client);
    }
    if let Some(text) = err.text() {
        println!("text:        {}", text);
    }

    // The code is already reported, unreadable METHOD-DATA is not fatal here.
    let hints = PreauthHints::interpret_lossy(&err, &policy);
    if hints.is_empty() && err.error_data().is_some_and(|data| !data.is_empty()) {
        warn!("no pre-authentication hints in the e-data");
    }
    if let Some(etype) = hints.preferred_etype() {
        println!("preferred etype: {}", etype);
    }
    for entry in hints.salts() {
        let salt = entry
            .salt
            .as_deref()
            .map(String::from_utf8_lossy)
            .unwrap_or_default();
        let s2kparams = entry.s2kparams.as_deref().map(hex::encode).unwrap_or_default();
        println!("etype {:>3}  salt {:?}  s2kparams {}", entry.etype, salt, s2kparams);
    }

    Ok(())
}

fn realm_path(config: PathBuf, local: Option<&str>, service: &str) -> Result<(), KrbError> {
    let config = ClientConfig::parse(config)?;

    let local = match local.or(config.default_realm()) {
        Some(local) => local.to_string(),
        None => {
            error!("no local realm given and no default_realm configured");
            return Err(KrbError::MissingRealm);
        }
    };

    for realm in config.realms_list(&local, service) {
        println!("{}", realm);
    }

    Ok(())
}

fn main() -> ExitCode {
    let opt = OptParser::parse();

    tracing_subscriber::fmt::init();

    let result = match opt.command {
        Opt::InspectError { error, config } => inspect_error(&error, config),
        Opt::RealmPath {
            config,
            local,
            service,
        } => realm_path(config, local.as_deref(), &service),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(?err, "krime-tgs failed");
            ExitCode::FAILURE
        }
    }
}
