use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use zeroize::Zeroizing;

use crate::cli::passphrase;
use crate::config::Settings;
use crate::controllers::{
    DecryptController, EncryptController, GenerateController, InspectController, SignController,
    VerifyController,
};
use crate::core::error::PgpError;
use crate::core::flow::FlowState;
use crate::crypto::pgp::{CipherChoice, KeyAlgorithm};
use crate::types::{KeyInfo, OperationResult, SignMode};

#[derive(Parser)]
#[command(name = "pgpdesk")]
#[command(about = "pgpdesk - encrypt, decrypt, sign, verify and inspect OpenPGP material")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Settings file (JSON)
    #[arg(short, long, global = true, env = "PGPDESK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print the operation result as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Encrypt a message to one or more public keys
    Encrypt {
        /// Recipient public key file (repeat for several recipients)
        #[arg(short, long = "recipient", required = true)]
        recipients: Vec<PathBuf>,
        /// Message file (stdin if omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Symmetric cipher: aes128 or aes256
        #[arg(long, value_parser = parse_cipher)]
        cipher: Option<CipherChoice>,
    },
    /// Decrypt a message with a private key
    Decrypt {
        /// Private key file
        #[arg(short, long)]
        key: PathBuf,
        /// Encrypted message file (stdin if omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Sign a message with a private key
    Sign {
        /// Private key file
        #[arg(short, long)]
        key: PathBuf,
        /// Message file (stdin if omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Produce a detached signature instead of a clear-signed message
        #[arg(long)]
        detached: bool,
    },
    /// Verify a clear-signed message or a detached signature
    Verify {
        /// Signer's public key file
        #[arg(short, long)]
        key: PathBuf,
        /// Signed message, or the original message when --signature is given (stdin if omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Detached signature file
        #[arg(short, long)]
        signature: Option<PathBuf>,
    },
    /// Show details of a public or private key
    Inspect {
        /// Key file (stdin if omitted)
        file: Option<PathBuf>,
    },
    /// Generate a new keypair
    Generate {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        comment: Option<String>,
        /// ed25519, rsa3072 or rsa4096
        #[arg(long, value_parser = parse_algorithm)]
        algorithm: Option<KeyAlgorithm>,
        /// Write <keyid>.pub.asc and <keyid>.sec.asc here instead of printing
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
}

/// How a command ended, mapped to the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliOutcome {
    Success,
    Failed,
    InvalidSignature,
}

impl CliOutcome {
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Failed => 1,
            Self::InvalidSignature => 2,
        }
    }
}

fn parse_cipher(value: &str) -> Result<CipherChoice, String> {
    CipherChoice::parse(value).ok_or_else(|| format!("unknown cipher '{}'", value))
}

fn parse_algorithm(value: &str) -> Result<KeyAlgorithm, String> {
    KeyAlgorithm::parse(value).ok_or_else(|| format!("unknown key algorithm '{}'", value))
}

pub async fn run_cli(cli: Cli, settings: &Settings) -> Result<CliOutcome> {
    let json = cli.json;
    match cli.command {
        Commands::Encrypt {
            recipients,
            input,
            cipher,
        } => encrypt(settings, &recipients, input.as_deref(), cipher, json).await,
        Commands::Decrypt { key, input } => decrypt(settings, &key, input.as_deref(), json).await,
        Commands::Sign {
            key,
            input,
            detached,
        } => sign(settings, &key, input.as_deref(), detached, json).await,
        Commands::Verify {
            key,
            input,
            signature,
        } => verify(settings, &key, input.as_deref(), signature.as_deref(), json).await,
        Commands::Inspect { file } => inspect(settings, file.as_deref(), json).await,
        Commands::Generate {
            name,
            email,
            comment,
            algorithm,
            out_dir,
        } => {
            let request = GenerateRequest {
                name,
                email,
                comment,
                algorithm,
                out_dir,
            };
            generate(settings, request, json).await
        }
    }
}

async fn encrypt(
    settings: &Settings,
    recipients: &[PathBuf],
    input: Option<&Path>,
    cipher: Option<CipherChoice>,
    json: bool,
) -> Result<CliOutcome> {
    let mut controller = EncryptController::new(settings);
    if let Some(cipher) = cipher {
        controller.set_cipher(cipher);
    }

    for (index, path) in recipients.iter().enumerate() {
        let id = match index {
            0 => controller.recipients().entries()[0].id,
            _ => controller.recipients_mut().add(),
        };
        controller.recipients_mut().update(id, read_file(path)?)?;
    }
    controller.set_message(read_input(input)?.as_str());

    let outcome = controller.encrypt().await;
    emit(json, &outcome, |payload| payload.armored.clone())
}

async fn decrypt(
    settings: &Settings,
    key: &Path,
    input: Option<&Path>,
    json: bool,
) -> Result<CliOutcome> {
    let mut controller = DecryptController::new(settings);
    controller.set_private_key(read_file(key)?);
    controller.set_message(read_input(input)?.as_str());

    let mut outcome = controller.decrypt().await;
    if controller.state() == FlowState::NeedsPassphrase {
        controller.set_passphrase(passphrase::read_passphrase()?.as_str());
        outcome = controller.decrypt().await;
    }

    if let Ok(payload) = &outcome {
        if payload.is_binary && !json {
            tracing::warn!("Decrypted content is not UTF-8 text; printing a lossy view");
        }
    }
    emit(json, &outcome, |payload| payload.text.as_str().to_owned())
}

async fn sign(
    settings: &Settings,
    key: &Path,
    input: Option<&Path>,
    detached: bool,
    json: bool,
) -> Result<CliOutcome> {
    let mut controller = SignController::new(settings);
    controller.set_private_key(read_file(key)?);
    controller.set_message(read_input(input)?.as_str());
    if detached {
        controller.set_mode(SignMode::Detached);
    }

    let mut outcome = controller.sign().await;
    if controller.state() == FlowState::NeedsPassphrase {
        controller.set_passphrase(passphrase::read_passphrase()?.as_str());
        outcome = controller.sign().await;
    }
    emit(json, &outcome, |payload| payload.armored.clone())
}

async fn verify(
    settings: &Settings,
    key: &Path,
    input: Option<&Path>,
    signature: Option<&Path>,
    json: bool,
) -> Result<CliOutcome> {
    let mut controller = VerifyController::new(settings);
    controller.set_public_key(read_file(key)?);

    let content = read_input(input)?;
    match signature {
        Some(path) => {
            controller.set_message(content.as_str());
            controller.set_signature(read_file(path)?);
        }
        None => controller.set_signed_message(content.as_str()),
    }

    let outcome = controller.verify().await;
    let status = emit(json, &outcome, |report| {
        let signer = report
            .signer_user_id
            .clone()
            .unwrap_or_else(|| report.signer_fingerprint.clone());
        if report.valid {
            format!("Good signature from {}", signer)
        } else {
            format!("BAD signature (checked against {})", signer)
        }
    })?;

    match outcome {
        Ok(report) if !report.valid => Ok(CliOutcome::InvalidSignature),
        _ => Ok(status),
    }
}

async fn inspect(settings: &Settings, file: Option<&Path>, json: bool) -> Result<CliOutcome> {
    let mut controller = InspectController::new(settings);
    controller.set_key(read_input(file)?.as_str());

    let outcome = controller.inspect().await;
    emit(json, &outcome, describe_key)
}

struct GenerateRequest {
    name: String,
    email: String,
    comment: Option<String>,
    algorithm: Option<KeyAlgorithm>,
    out_dir: Option<PathBuf>,
}

async fn generate(settings: &Settings, request: GenerateRequest, json: bool) -> Result<CliOutcome> {
    let mut controller = GenerateController::new(settings);
    controller.set_name(request.name);
    controller.set_email(request.email);
    if let Some(comment) = request.comment {
        controller.set_comment(comment);
    }
    if let Some(algorithm) = request.algorithm {
        controller.set_algorithm(algorithm);
    }

    let passphrase = passphrase::read_new_passphrase(settings.min_passphrase_length)?;
    controller.set_passphrase(passphrase.as_str());
    controller.set_passphrase_confirmation(passphrase.as_str());
    drop(passphrase);

    let outcome = controller.generate().await;

    if let (Ok(pair), Some(dir)) = (&outcome, request.out_dir.as_deref()) {
        let stem = pair.key_info.key_id.to_lowercase();
        let public_path = dir.join(format!("{}.pub.asc", stem));
        let secret_path = dir.join(format!("{}.sec.asc", stem));
        std::fs::write(&public_path, &pair.public_key_armored)
            .with_context(|| format!("Failed to write {}", public_path.display()))?;
        write_private(&secret_path, &pair.private_key_armored)?;
        tracing::info!("Wrote {} and {}", public_path.display(), secret_path.display());

        return emit(json, &outcome, |pair| {
            format!(
                "{}\nPublic key:  {}\nPrivate key: {}",
                describe_key(&pair.key_info),
                public_path.display(),
                secret_path.display()
            )
        });
    }

    emit(json, &outcome, |pair| {
        format!("{}\n{}", pair.public_key_armored, pair.private_key_armored.as_str())
    })
}

/// Print the result and turn it into an outcome. Failures only ever show
/// the user-facing message.
fn emit<T, F>(json: bool, outcome: &Result<T, PgpError>, render: F) -> Result<CliOutcome>
where
    T: Serialize + Clone,
    F: FnOnce(&T) -> String,
{
    if json {
        let result = OperationResult::from_result(outcome);
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        match outcome {
            Ok(data) => println!("{}", render(data)),
            Err(err) => eprintln!("Error: {}", err.user_message()),
        }
    }

    Ok(match outcome {
        Ok(_) => CliOutcome::Success,
        Err(_) => CliOutcome::Failed,
    })
}

fn describe_key(info: &KeyInfo) -> String {
    let mut lines = vec![
        format!("Fingerprint: {}", info.formatted_fingerprint()),
        format!("Key ID:      {}", info.key_id),
        format!("Algorithm:   {}", info.algorithm),
        format!("Created:     {}", info.created_at.format("%Y-%m-%d %H:%M:%S UTC")),
    ];
    match info.expires_at {
        Some(expiry) => lines.push(format!("Expires:     {}", expiry.format("%Y-%m-%d"))),
        None => lines.push("Expires:     never".to_string()),
    }
    let kind = match (info.is_private, info.is_encrypted) {
        (true, true) => "private (passphrase protected)",
        (true, false) => "private (unprotected)",
        _ => "public",
    };
    lines.push(format!("Type:        {}", kind));
    lines.push(format!("Subkeys:     {}", info.subkey_count));
    for uid in &info.user_ids {
        lines.push(format!("User ID:     {}", uid));
    }
    lines.join("\n")
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn read_input(path: Option<&Path>) -> Result<Zeroizing<String>> {
    match path {
        Some(path) => read_file(path).map(Zeroizing::new),
        None => {
            let mut buf = Zeroizing::new(String::new());
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

#[cfg(unix)]
fn write_private(path: &Path, contents: &str) -> Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(contents.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}
