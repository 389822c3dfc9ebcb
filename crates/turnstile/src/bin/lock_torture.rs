//! # Lock Torture
//!
//! Stress-tests the writer-priority lock and fails loudly on any overlap.
//!
//! ## Usage
//!
//! ```bash
//! lock_torture --config torture.toml --threads 16 --write-percent 25
//! RUST_LOG=turnstile=debug lock_torture --ops 100000
//! ```

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;
use turnstile::{torture, TortureConfig, TortureError, TortureResult};

/// What the command line asked for.
struct Cli {
    config: TortureConfig,
    print_config: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = match parse_args(std::env::args().skip(1)) {
        Ok(Some(cli)) => cli,
        Ok(None) => return ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if cli.print_config {
        match toml::to_string(&cli.config) {
            Ok(text) => print!("{text}"),
            Err(e) => {
                tracing::error!("failed to render config: {e}");
                return ExitCode::FAILURE;
            }
        }
        return ExitCode::SUCCESS;
    }

    let config = &cli.config;
    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║         TURNSTILE LOCK TORTURE                                   ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();
    println!("┌─ CONFIGURATION ─────────────────────────────────────────────────┐");
    println!("│ Threads:            {}", config.threads);
    println!("│ Write Percent:      {}%", config.write_percent);
    println!("│ Ops per Thread:     {}", config.operations_per_thread);
    println!("│ Hold:               {} µs", config.hold_micros);
    println!("│ Seed:               {}", config.seed);
    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();

    match torture::run(config) {
        Ok(report) => {
            println!("┌─ RESULT ────────────────────────────────────────────────────────┐");
            println!("│ Reads:              {}", report.reads);
            println!("│ Writes:             {}", report.writes);
            println!("│ Max Readers Inside: {}", report.max_concurrent_readers);
            println!("│ Elapsed:            {:.2?}", report.elapsed);
            println!("│ Throughput:         {:.0} ops/s", report.ops_per_sec());
            println!("└──────────────────────────────────────────────────────────────────┘");
            println!();
            println!("✓ MUTUAL EXCLUSION HELD");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{e}");
            println!("✗ TORTURE FAILED: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Parses flags. `Ok(None)` means help was printed.
fn parse_args(args: impl Iterator<Item = String>) -> TortureResult<Option<Cli>> {
    let args: Vec<String> = args.collect();

    // The config file is the base layer, so find it before applying flags.
    let mut config = match args.iter().position(|a| a == "--config" || a == "-c") {
        Some(i) => {
            let path = args.get(i + 1).ok_or_else(|| missing_value("--config"))?;
            TortureConfig::load(path)?
        }
        None => TortureConfig::default(),
    };
    let mut print_config = false;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => i += 1,
            "--threads" | "-t" => {
                config.threads = parse_value(&args, i)?;
                i += 1;
            }
            "--write-percent" | "-w" => {
                config.write_percent = parse_value(&args, i)?;
                i += 1;
            }
            "--ops" | "-n" => {
                config.operations_per_thread = parse_value(&args, i)?;
                i += 1;
            }
            "--hold-micros" => {
                config.hold_micros = parse_value(&args, i)?;
                i += 1;
            }
            "--seed" | "-s" => {
                config.seed = parse_value(&args, i)?;
                i += 1;
            }
            "--print-config" => print_config = true,
            "--help" | "-h" => {
                println!("Usage: lock_torture [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <FILE>          TOML config (flags override it)");
                println!("  -t, --threads <N>            Worker threads (default: 8)");
                println!("  -w, --write-percent <P>      Share of writes, 0-100 (default: 10)");
                println!("  -n, --ops <N>                Acquisitions per thread (default: 10000)");
                println!("      --hold-micros <N>        Time inside each section (default: 0)");
                println!("  -s, --seed <N>               Base RNG seed");
                println!("      --print-config           Print effective config as TOML and exit");
                println!("  -h, --help                   Show this help");
                return Ok(None);
            }
            other => {
                return Err(TortureError::InvalidConfig(format!("unknown argument: {other}")));
            }
        }
        i += 1;
    }

    config.validate()?;
    Ok(Some(Cli { config, print_config }))
}

fn parse_value<T: std::str::FromStr>(args: &[String], flag_index: usize) -> TortureResult<T> {
    let flag = &args[flag_index];
    let raw = args.get(flag_index + 1).ok_or_else(|| missing_value(flag))?;
    raw.parse()
        .map_err(|_| TortureError::InvalidConfig(format!("bad value for {flag}: {raw}")))
}

fn missing_value(flag: &str) -> TortureError {
    TortureError::InvalidConfig(format!("missing value for {flag}"))
}
