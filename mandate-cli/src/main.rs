//! `mandate` — build, narrow, validate, and revoke token delegations from the command line.

use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
    time::{SystemTime, UNIX_EPOCH},
};

use alloy_primitives::{hex, Address, U256};
use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use mandate_delegation::{
    AmountLimitTerms, CaveatKind, ChildScope, Delegation, DelegationChain, DelegationDocument,
    Redemption, ScopeValidator, SignedDelegation, TimeWindowTerms, Timestamp, TransferIntent,
    TransferValidator, ValueCeilingTerms,
};
use mandate_ledger::{LedgerClient, MemoryLedger, SimulationOutcome};
use mandate_signer::{Secp256k1Signer, SignerAddress};

use crate::config::CliConfig;

mod config;
mod styles;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Build, narrow, validate, and revoke token delegations.
#[derive(Debug, Parser)]
#[command(name = "mandate", version, styles = styles::styles())]
struct Cli {
    /// Path to a JSON config with the verifying domain and enforcer registry.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build and sign a root delegation over the signer's own holdings.
    Delegate {
        /// The delegate receiving the capability.
        #[arg(long)]
        delegate: Address,

        /// The token the amount limit applies to.
        #[arg(long)]
        token: Address,

        /// Maximum cumulative amount, in the token's minor unit.
        #[arg(long)]
        amount: U256,

        /// Seconds from now until the delegation expires; omit for no expiry.
        #[arg(long)]
        expiry_secs: Option<u64>,

        /// The delegator's private key, hex encoded.
        #[arg(long)]
        key: String,

        /// Where to write the delegation document.
        #[arg(long, short)]
        out: PathBuf,
    },

    /// Narrow an existing delegation into a sub-delegation, after a scope check.
    Subdelegate {
        /// The parent delegation document.
        #[arg(long)]
        parent: PathBuf,

        /// The sub-delegate receiving the narrowed capability.
        #[arg(long)]
        subdelegate: Address,

        /// Maximum cumulative amount of the narrowed capability.
        #[arg(long)]
        amount: U256,

        /// Seconds from now until the sub-delegation expires; omit for no expiry.
        #[arg(long)]
        expiry_secs: Option<u64>,

        /// Token override when the parent carries no amount caveat.
        #[arg(long)]
        token: Option<Address>,

        /// The sub-delegating party's private key (must be the parent's delegate).
        #[arg(long)]
        key: String,

        /// Where to write the sub-delegation document.
        #[arg(long, short)]
        out: PathBuf,
    },

    /// Check whether a proposed transfer is admissible under a delegation.
    Validate {
        /// The delegation document being redeemed.
        #[arg(long)]
        delegation: PathBuf,

        /// Recipient of the transfer.
        #[arg(long)]
        to: Address,

        /// Amount to transfer, in the token's minor unit.
        #[arg(long)]
        amount: U256,

        /// Ancestor delegation documents, leafward to rootward, for chain checks.
        #[arg(long)]
        parent: Vec<PathBuf>,

        /// Also dry-run the redemption against the ledger. Never submits.
        #[arg(long)]
        simulate: bool,
    },

    /// Decode a delegation document and print a human-readable scope summary.
    Inspect {
        /// The delegation document.
        file: PathBuf,
    },

    /// Request revocation of a delegation by its hash.
    Revoke {
        /// The delegation document to revoke.
        #[arg(long)]
        delegation: PathBuf,

        /// The delegator's private key; only the delegator may revoke.
        #[arg(long)]
        key: String,
    },
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.as_deref())?;
    tracing::debug!(chain_id = config.domain.chain_id, "loaded configuration");

    match cli.command {
        Command::Delegate {
            delegate,
            token,
            amount,
            expiry_secs,
            key,
            out,
        } => run_delegate(&config, delegate, token, amount, expiry_secs, &key, &out),
        Command::Subdelegate {
            parent,
            subdelegate,
            amount,
            expiry_secs,
            token,
            key,
            out,
        } => run_subdelegate(
            &config,
            &parent,
            subdelegate,
            amount,
            expiry_secs,
            token,
            &key,
            &out,
        ),
        Command::Validate {
            delegation,
            to,
            amount,
            parent,
            simulate,
        } => run_validate(&config, &delegation, to, amount, &parent, simulate).await,
        Command::Inspect { file } => run_inspect(&config, &file),
        Command::Revoke { delegation, key } => run_revoke(&config, &delegation, &key).await,
    }
}

fn run_delegate(
    config: &CliConfig,
    delegate: Address,
    token: Address,
    amount: U256,
    expiry_secs: Option<u64>,
    key: &str,
    out: &Path,
) -> anyhow::Result<ExitCode> {
    let signer = parse_key(key)?;
    let expiry = expiry_secs.map(|secs| unix_now() + secs);

    let delegation = Delegation::builder()
        .delegator(signer.address())
        .delegate(delegate)
        .amount(token, amount)
        .expiry(expiry)
        .sign(&config.registry, &signer, &config.domain)?;

    write_document(&delegation, out)?;
    println!("delegation {} written to {}", delegation.hash(), out.display());

    Ok(ExitCode::SUCCESS)
}

#[allow(clippy::too_many_arguments)]
fn run_subdelegate(
    config: &CliConfig,
    parent_path: &Path,
    subdelegate: Address,
    amount: U256,
    expiry_secs: Option<u64>,
    token: Option<Address>,
    key: &str,
    out: &Path,
) -> anyhow::Result<ExitCode> {
    let signer = parse_key(key)?;
    let parent = load_signed(parent_path)?;
    parent.verify_signature(&config.domain)?;

    if signer.address() != *parent.delegate() {
        bail!(
            "identity mismatch: only the parent's delegate {} may sub-delegate, got {}",
            parent.delegate(),
            signer.address()
        );
    }

    let token = match parent.find_caveat(CaveatKind::AmountLimit, &config.registry) {
        Some(caveat) => AmountLimitTerms::decode(&caveat.terms)?.token,
        None => token.context(
            "parent carries no amount caveat; pass --token to name the token explicitly",
        )?,
    };

    let expiry = expiry_secs.map(|secs| unix_now() + secs);
    let mut scope = ChildScope::new().with_amount(token, amount);
    if let Some(expiry) = expiry {
        scope = scope.with_expiry(expiry);
    }

    let validity = ScopeValidator::new(&config.registry).check(&parent, &scope)?;
    if !validity.is_valid() {
        eprintln!("scope check failed, {validity}");
        return Ok(ExitCode::FAILURE);
    }

    let child = Delegation::builder()
        .delegator(signer.address())
        .delegate(subdelegate)
        .authority(parent.hash())
        .amount(token, amount)
        .expiry(expiry)
        .sign(&config.registry, &signer, &config.domain)?;

    write_document(&child, out)?;
    println!(
        "sub-delegation {} (narrowing {}) written to {}",
        child.hash(),
        parent.hash(),
        out.display()
    );

    Ok(ExitCode::SUCCESS)
}

async fn run_validate(
    config: &CliConfig,
    delegation_path: &Path,
    to: Address,
    amount: U256,
    parent_paths: &[PathBuf],
    simulate: bool,
) -> anyhow::Result<ExitCode> {
    let leaf = load_signed(delegation_path)?;

    let token = match leaf.find_caveat(CaveatKind::AmountLimit, &config.registry) {
        Some(caveat) => AmountLimitTerms::decode(&caveat.terms)?.token,
        None => bail!("delegation carries no amount caveat; nothing names the token to transfer"),
    };

    let intent = TransferIntent::new(token, to, amount);
    let validator = TransferValidator::new(&config.registry);
    let validity = validator.check(&leaf, &intent, unix_now())?;

    if validity.is_unchecked() {
        eprintln!("warning: no checkable caveats; the transfer passes only by absence of information");
    }

    if !validity.is_valid() {
        eprintln!("transfer rejected, {validity}");
        return Ok(ExitCode::FAILURE);
    }

    println!("transfer admissible under the delegation's caveats");

    if simulate {
        let pool = parent_paths
            .iter()
            .map(|path| load_signed(path))
            .collect::<anyhow::Result<Vec<_>>>()?;

        let chain = DelegationChain::assemble(leaf, &pool)?;
        chain.verify_signatures(&config.domain)?;

        let ledger = MemoryLedger::new(config.registry.clone(), config.domain.clone());
        let redemption = Redemption::for_transfer(chain, &intent);

        // Dry-run only: the submit path is never taken from here.
        match ledger.simulate(&redemption).await? {
            SimulationOutcome::Success => println!("simulation: success"),
            SimulationOutcome::Revert(reason) => {
                eprintln!("simulation: revert: {reason}");
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn run_inspect(config: &CliConfig, path: &Path) -> anyhow::Result<ExitCode> {
    let document = load_document(path)?;
    let delegation = document.to_unsigned()?;

    println!("delegation   {}", delegation.hash());
    println!("delegator    {}", delegation.delegator());
    println!("delegate     {}", delegation.delegate());

    if delegation.is_root() {
        println!("authority    ROOT (delegator's own holdings)");
    } else {
        println!("authority    {} (narrows a parent)", delegation.authority());
    }

    println!("salt         {}", delegation.salt());
    println!(
        "signature    {}",
        if document.signature.is_some() {
            "present"
        } else {
            "absent (unsigned)"
        }
    );

    println!("caveats      {}", delegation.caveats().len());
    for caveat in delegation.caveats() {
        match config.registry.kind_of(caveat.enforcer) {
            Some(CaveatKind::AmountLimit) => {
                let terms = AmountLimitTerms::decode(&caveat.terms)?;
                println!(
                    "  - amount-limit: at most {} minor units of {}",
                    terms.max_amount, terms.token
                );
            }
            Some(CaveatKind::TimeWindow) => {
                let terms = TimeWindowTerms::decode(&caveat.terms)?;
                let not_before = match terms.not_before {
                    0 => "any time".to_string(),
                    t => format!("t >= {t}"),
                };
                let not_after = match terms.not_after {
                    0 => "no expiry".to_string(),
                    t => format!("t < {t}"),
                };
                println!("  - time-window: {not_before}, {not_after}");
            }
            Some(CaveatKind::ValueCeiling) => {
                let terms = ValueCeilingTerms::decode(&caveat.terms)?;
                if terms.max_value == U256::ZERO {
                    println!("  - value-ceiling: native value forbidden (token-only)");
                } else {
                    println!("  - value-ceiling: at most {} native units", terms.max_value);
                }
            }
            None => {
                println!(
                    "  - unrecognized enforcer {} ({} term bytes; enforced on-ledger only)",
                    caveat.enforcer,
                    caveat.terms.len()
                );
            }
        }
    }

    match document.verify_meta() {
        Ok(()) => println!("metadata     consistent with recomputed hash"),
        Err(source) => {
            eprintln!("metadata     INCONSISTENT: {source}");
            return Ok(ExitCode::FAILURE);
        }
    }

    Ok(ExitCode::SUCCESS)
}

async fn run_revoke(config: &CliConfig, path: &Path, key: &str) -> anyhow::Result<ExitCode> {
    let signer = parse_key(key)?;
    let delegation = load_signed(path)?;

    if signer.address() != *delegation.delegator() {
        bail!(
            "identity mismatch: only the delegator {} may revoke, got {}",
            delegation.delegator(),
            signer.address()
        );
    }

    let hash = delegation.hash();
    let ledger = MemoryLedger::new(config.registry.clone(), config.domain.clone());
    ledger.revoke(hash).await?;

    println!("revocation requested for {hash}");
    println!("descendants of this delegation are refused by the verifier from now on");

    Ok(ExitCode::SUCCESS)
}

fn parse_key(key: &str) -> anyhow::Result<Secp256k1Signer> {
    let bytes = hex::decode(key).context("private key must be hex")?;
    Ok(Secp256k1Signer::from_private_key(&bytes)?)
}

fn load_document(path: &Path) -> anyhow::Result<DelegationDocument> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading delegation document {}", path.display()))?;
    let document = DelegationDocument::from_json(&raw)?;
    document.verify_meta()?;
    Ok(document)
}

fn load_signed(path: &Path) -> anyhow::Result<SignedDelegation> {
    Ok(load_document(path)?.to_signed()?)
}

fn write_document(delegation: &SignedDelegation, out: &Path) -> anyhow::Result<()> {
    let document = DelegationDocument::from_signed(delegation);
    fs::write(out, document.to_json()?)
        .with_context(|| format!("writing delegation document {}", out.display()))?;
    Ok(())
}

fn unix_now() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}
