use std::sync::Arc;

use anyhow::{bail, Context};
use certchain_crypto::block_digest;
use certchain_ledger::{consistency_report, seed_genesis, ChainValidator};
use certchain_server::{CertchainServer, ServerConfig};
use certchain_store::ReplicaStore;
use certchain_types::Block;
use colored::Colorize;
use serde_json::{json, Value};
use tracing::info;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = ServerConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    let format = cli.format;
    match cli.command {
        Command::Init(args) => cmd_init(&config, args, format),
        Command::Log(args) => cmd_log(&config, args, format),
        Command::Show(args) => cmd_show(&config, args, format),
        Command::Validate => cmd_validate(&config, format),
        Command::Consistency => cmd_consistency(&config, format),
        Command::Serve(args) => cmd_serve(config, args),
    }
}

fn replica(config: &ServerConfig, label: &str) -> anyhow::Result<Arc<dyn ReplicaStore>> {
    let label = label.to_uppercase();
    config
        .ledger
        .open_replicas()
        .into_iter()
        .find(|r| r.id().as_str() == label)
        .with_context(|| {
            format!(
                "no replica {label} (configured: N1..N{})",
                config.ledger.replica_count
            )
        })
}

/// Digest, student and institution carried by a certificate block.
fn block_subject(block: &Block) -> Option<(String, String, String)> {
    let record: Value = serde_json::from_str(&block.data).ok()?;
    let field = |name: &str| record.get(name)?.as_str().map(str::to_string);
    Some((field("digest")?, field("student_id")?, field("institution_id")?))
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_init(config: &ServerConfig, args: InitArgs, format: OutputFormat) -> anyhow::Result<()> {
    let replicas = config.ledger.open_replicas();
    let report = seed_genesis(&replicas, args.force)?;
    std::fs::create_dir_all(&config.qr_dir)
        .with_context(|| format!("creating {}", config.qr_dir.display()))?;
    info!(
        seeded = report.seeded.len(),
        overwritten = report.overwritten.len(),
        untouched = report.untouched.len(),
        "ledger initialized"
    );

    if format == OutputFormat::Json {
        return print_json(&report);
    }
    for id in &report.seeded {
        println!("{} {} seeded with genesis", "✓".green().bold(), id.to_string().bold());
    }
    for id in &report.overwritten {
        println!("{} {} overwritten with genesis", "!".yellow().bold(), id.to_string().bold());
    }
    for id in &report.untouched {
        println!("  {} already initialized", id.to_string().dimmed());
    }
    println!(
        "Ledger at {} ({} replicas)",
        config.ledger.replica_root.display().to_string().bold(),
        replicas.len()
    );
    Ok(())
}

fn cmd_log(config: &ServerConfig, args: LogArgs, format: OutputFormat) -> anyhow::Result<()> {
    let chain = replica(config, &args.replica)?.read_replica();
    let recent: Vec<&Block> = chain.iter().rev().take(args.limit).collect();

    if format == OutputFormat::Json {
        return print_json(&recent);
    }
    if recent.is_empty() {
        println!("Replica {} holds no blocks. Run {}.", args.replica.bold(), "certchain init".cyan());
        return Ok(());
    }
    for block in recent {
        let hash = block_digest(block)?;
        println!(
            "{}  {}  proof {}  {}",
            format!("#{}", block.index).yellow().bold(),
            hash.short_hex().dimmed(),
            block.proof,
            block.timestamp
        );
        match block_subject(block) {
            Some((digest, student, institution)) => {
                println!("  Certificate: {}", digest.cyan());
                println!("  Student: {}  Institution: {}", student, institution);
            }
            None => println!("  {}", block.data),
        }
    }
    Ok(())
}

fn cmd_show(config: &ServerConfig, args: ShowArgs, format: OutputFormat) -> anyhow::Result<()> {
    let chain = replica(config, &args.replica)?.read_replica();
    let Some(block) = chain.iter().find(|b| b.index == args.index) else {
        bail!("no block {} in replica {}", args.index, args.replica);
    };
    let hash = block_digest(block)?;

    if format == OutputFormat::Json {
        return print_json(&json!({ "hash": hash, "block": block }));
    }
    println!("Block {}", format!("#{}", block.index).yellow().bold());
    println!("  Hash: {}", hash.to_string().cyan());
    println!("  Previous: {}", block.previous_hash);
    println!("  Proof: {}", block.proof);
    println!("  Timestamp: {}", block.timestamp);
    match block_subject(block) {
        Some((digest, student, institution)) => {
            println!("  Certificate: {}", digest.cyan());
            println!("  Student: {}", student);
            println!("  Institution: {}", institution);
        }
        None => println!("  Data: {}", block.data),
    }
    Ok(())
}

fn cmd_validate(config: &ServerConfig, format: OutputFormat) -> anyhow::Result<()> {
    let replicas = config.ledger.open_replicas();
    let reports = ChainValidator::validate_replicas(&replicas, config.ledger.difficulty);
    let invalid = reports.iter().filter(|r| !r.is_valid()).count();

    if format == OutputFormat::Json {
        print_json(&reports)?;
    } else {
        for report in &reports {
            let label = report
                .replica
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default();
            if report.is_valid() {
                println!(
                    "{} {}: {} blocks, chain valid",
                    "✓".green().bold(),
                    label.bold(),
                    report.block_count
                );
            } else {
                println!("{} {}:", "✗".red().bold(), label.bold());
                for v in &report.violations {
                    println!("  #{} {:?}: {}", v.index, v.kind, v.description);
                }
            }
        }
    }

    if invalid > 0 {
        bail!("{invalid} replica(s) failed validation");
    }
    Ok(())
}

fn cmd_consistency(config: &ServerConfig, format: OutputFormat) -> anyhow::Result<()> {
    let report = consistency_report(&config.ledger.open_replicas());

    if format == OutputFormat::Json {
        print_json(&report)?;
    } else {
        for status in &report.replicas {
            match (&status.digest, &status.problem) {
                (Some(digest), _) => println!(
                    "  {}  {} blocks  {}",
                    status.replica.to_string().bold(),
                    status.block_count,
                    digest.short_hex().dimmed()
                ),
                (None, Some(problem)) => println!(
                    "  {}  {}",
                    status.replica.to_string().bold(),
                    problem.red()
                ),
                (None, None) => {}
            }
        }
        if report.is_consistent() {
            println!("{} Replicas consistent", "✓".green().bold());
        } else {
            println!("{} Replicas diverge", "✗".red().bold());
        }
    }

    if !report.is_consistent() {
        bail!("ledger replicas are inconsistent");
    }
    Ok(())
}

fn cmd_serve(mut config: ServerConfig, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    let server = CertchainServer::new(config)?;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(server.serve())?;
    Ok(())
}
