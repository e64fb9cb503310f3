//! Vanity OpenPGP Key ID Generator CLI
//!
//! Usage:
//!   vanityid -n "Alice" -e alice@example.org -p '^dead'           # run until Ctrl+C
//!   vanityid -n "Alice" -e alice@example.org -p 'beef$,cafe' -k 1  # stop after one key

use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, warn};

use vanityid::{search, Config, Exporter, IdentityGenerator, SearchEvent, SearchMode, SearchOptions, WorkerPool};

fn main() {
    vanityid::init_logging();
    let config = Config::parse();

    if let Err(e) = config.validate() {
        eprintln!("Configuration error: {}", e);
        process::exit(1);
    }

    let (patterns, diagnostics) = config.patterns();
    for diagnostic in &diagnostics {
        warn!("{}", diagnostic);
    }

    let created_at = match config.holder.creation_time() {
        Ok(created_at) => created_at,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            process::exit(1);
        }
    };
    let holder = Arc::new(config.holder.holder());
    let mode = SearchMode::from_count(config.count);

    println!("Vanity OpenPGP Key ID Generator");
    println!("===============================");
    println!("User ID:    {}", holder.user_id());
    println!("Created:    {}", created_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("Key size:   {} bits", config.bits);
    for pattern in patterns.iter() {
        println!("Pattern:    {}", pattern.rule());
    }
    println!("Difficulty: {}", patterns.difficulty_description());
    println!("Workers:    {}", config.worker_count());
    match mode {
        SearchMode::Count(n) => println!("Target:     {} key(s)", n),
        SearchMode::Continuous => println!("Target:     unlimited"),
    }
    println!("Output:     {}", config.out.display());
    println!();

    let bits = config.bits;
    let pool = match WorkerPool::new(config.worker_count(), Arc::new(patterns), |_| {
        IdentityGenerator::new(holder.clone(), created_at, bits)
    }) {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Failed to start workers: {}", e);
            process::exit(1);
        }
    };

    ctrlc_handler(&pool);

    println!("Searching... (Press Ctrl+C to stop)\n");

    let exporter = Exporter::new(&config.out);
    let options = SearchOptions {
        mode,
        report_interval: Duration::from_secs(config.report_interval.max(1)),
    };

    let summary = match search::run(pool, &exporter, &options, print_event) {
        Ok(summary) => summary,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    if summary.interrupted {
        println!("\nStopped by user.");
    } else {
        println!("\nTarget reached! Exported {} key(s).", summary.exported.len());
    }

    println!("\n--- Final Statistics ---");
    println!("Total keys generated: {}", format_number(summary.attempts));
    println!("Total matches found:  {}", summary.matches);
    println!("Keys exported:        {}", summary.exported.len());
    println!("Time elapsed:         {:.2}s", summary.elapsed.as_secs_f64());
    println!("Average speed:        {:.2}/s", summary.rate);
}

fn print_event(event: SearchEvent<'_>) {
    match event {
        SearchEvent::Exported {
            index,
            fingerprint,
            worker_id,
            files,
        } => {
            println!("=== Match #{} ===", index);
            println!("Key ID:  {}", fingerprint);
            println!("Files:   {}", files.asc.display());
            println!("         {}", files.pem.display());
            println!("Worker:  {}", worker_id);
            println!();
        }
        SearchEvent::Progress {
            attempts,
            matches,
            elapsed,
            rate,
        } => {
            println!(
                "[{:>4}s] Generated {} keys ({:.2}/s), {} match(es)",
                elapsed.as_secs(),
                format_number(attempts),
                rate,
                matches
            );
        }
    }
}

fn format_number(n: u64) -> String {
    if n >= 1_000_000_000 {
        format!("{:.2}B", n as f64 / 1_000_000_000.0)
    } else if n >= 1_000_000 {
        format!("{:.2}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.2}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

fn ctrlc_handler<T>(pool: &WorkerPool<T>) {
    let stop_flag = pool.stop_flag_clone();
    if let Err(e) = ctrlc::set_handler(move || {
        stop_flag.store(true, std::sync::atomic::Ordering::Relaxed);
    }) {
        warn!("Ctrl-C handler unavailable: {}", e);
    }
}
