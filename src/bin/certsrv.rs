// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 U.S. Federal Government (in countries where recognized)
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! ADCS Web Enrollment Command-Line Tool
//!
//! # Usage
//!
//! ```text
//! certsrv [OPTIONS] <COMMAND>
//!
//! Commands:
//!   request   Submit a CSR and download the issued certificate
//!   fetch     Download an issued certificate by request ID
//!   ca-cert   Download the latest CA certificate
//!   ca-chain  Download the CA certificate chain (PKCS#7)
//! ```
//!
//! # Examples
//!
//! ```bash
//! # Request a certificate with NTLM authentication
//! CERTSRV_PASSWORD=secret certsrv -s ca.example.com -u 'CORP\svc' --auth ntlm \
//!     request --csr server.csr --template WebServer -o server.pem
//!
//! # Pick up a certificate after approval
//! certsrv -c /etc/certsrv.toml fetch 5678 -o server.pem
//! ```
//!
//! Exits with status 2 when a request is pending approval.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use certsrv_client::blocking::CertsrvClient;
use certsrv_client::config_file::ConfigFile;
use certsrv_client::{
    AuthMethod, CertificateData, CertificateRequest, CertsrvError, Encoding, RequestOutcome,
};

/// Exit status for a request waiting for approval.
const EXIT_PENDING: u8 = 2;

/// ADCS Web Enrollment Command-Line Tool
#[derive(Parser)]
#[command(name = "certsrv")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Certificate enrollment against ADCS Web Enrollment", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// ADCS server host name or URL
    #[arg(short, long, global = true, value_name = "SERVER")]
    server: Option<String>,

    /// Username, optionally as DOMAIN\user
    #[arg(short, long, global = true)]
    username: Option<String>,

    /// Password
    #[arg(long, global = true, env = "CERTSRV_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Authentication method (basic, ntlm)
    #[arg(long, global = true, value_name = "METHOD")]
    auth: Option<AuthMethod>,

    /// PEM bundle of trusted CA certificates
    #[arg(long, global = true, value_name = "PATH")]
    ca_file: Option<PathBuf>,

    /// Skip server certificate verification
    #[arg(long, global = true)]
    insecure: bool,

    /// Request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    timeout: Option<u64>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a CSR and download the issued certificate
    Request {
        /// CSR file (PEM or DER)
        #[arg(long, value_name = "PATH")]
        csr: PathBuf,

        /// Certificate template name
        #[arg(short, long)]
        template: String,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Download an issued certificate by request ID
    Fetch {
        /// Request ID
        request_id: u64,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Download the latest CA certificate
    CaCert {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Download the CA certificate chain (PKCS#7)
    CaChain {
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(clap::Args)]
struct OutputArgs {
    /// Certificate encoding (b64, bin)
    #[arg(short, long, default_value = "b64")]
    encoding: Encoding,

    /// Output file (stdout if omitted)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.quiet {
        tracing::Level::ERROR
    } else if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_pending() => {
            eprintln!("{}", e);
            ExitCode::from(EXIT_PENDING)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_command(cli: Cli) -> Result<(), CertsrvError> {
    let client = CertsrvClient::new(load_config(&cli)?.to_client_config()?)?;

    match cli.command {
        Commands::Request {
            csr,
            template,
            output,
        } => {
            let csr_data = std::fs::read(&csr)?;
            tracing::info!("submitting {} with template {}", csr.display(), template);

            let request = CertificateRequest::new(csr_data, template).encoding(output.encoding);
            let outcome = client.submit(&request)?;
            if let RequestOutcome::Pending { request_id } = outcome {
                tracing::info!("request {} is pending approval", request_id);
            }
            write_certificate(outcome.into_certificate()?, output.output.as_deref())
        }
        Commands::Fetch { request_id, output } => {
            let cert = client.get_existing_cert(request_id, output.encoding)?;
            write_certificate(cert, output.output.as_deref())
        }
        Commands::CaCert { output } => {
            let cert = client.get_ca_cert(output.encoding)?;
            write_certificate(cert, output.output.as_deref())
        }
        Commands::CaChain { output } => {
            let chain = client.get_ca_chain(output.encoding)?;
            write_certificate(chain, output.output.as_deref())
        }
    }
}

/// Merge the configuration file (if any) with command-line overrides.
fn load_config(cli: &Cli) -> Result<ConfigFile, CertsrvError> {
    let mut file = match cli.config {
        Some(ref path) => ConfigFile::from_file(path)?,
        None => ConfigFile::default(),
    };

    if let Some(ref server) = cli.server {
        file.server.url = server.clone();
    }
    if let Some(ref ca_file) = cli.ca_file {
        file.server.ca_file = Some(ca_file.clone());
    }
    if cli.insecure {
        tracing::warn!("server certificate verification is disabled");
        file.server.insecure = true;
        file.server.ca_file = None;
    }
    if let Some(timeout) = cli.timeout {
        file.server.timeout_secs = Some(timeout);
    }
    if let Some(ref username) = cli.username {
        file.authentication.username = Some(username.clone());
    }
    if let Some(ref password) = cli.password {
        file.authentication.password = Some(password.clone());
    }
    if let Some(method) = cli.auth {
        file.authentication.method = method;
    }

    Ok(file)
}

fn write_certificate(cert: CertificateData, path: Option<&Path>) -> Result<(), CertsrvError> {
    match path {
        Some(path) => {
            std::fs::write(path, cert.as_bytes())?;
            tracing::info!("wrote {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(cert.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}
