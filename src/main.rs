use nandlogic::*;
use clap::Parser;
use anyhow::Context;
use log::*;
use std::io::Write;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON netlist document to load.
    filename: String,

    /// Only run the test with this name.
    #[arg(long)]
    test: Option<String>,

    /// Give up on a netlist that has not settled after this many passes.
    #[arg(long, conflicts_with = "no_pass_limit")]
    max_passes: Option<usize>,

    /// Settle for as long as it takes. An oscillating netlist will hang.
    #[arg(long, default_value_t = false)]
    no_pass_limit: bool,

    /// Print the flattened component of each test before running it.
    #[arg(long, default_value_t = false)]
    dump: bool,

    #[arg(short, long, default_value_t = false)]
    debug: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.debug)?;

    let system = load_system_from_file(&args.filename)
        .with_context(|| format!("Error loading netlist: {}", args.filename))?;

    let pass_limit = if args.no_pass_limit {
        PassLimit::Unbounded
    } else if let Some(max_passes) = args.max_passes {
        PassLimit::Fixed(max_passes)
    } else {
        PassLimit::Auto
    };
    let config = SimConfig::with_pass_limit(pass_limit);

    let tests: Vec<_> = system
        .tests()
        .filter(|test| args.test.as_deref().map_or(true, |name| test.name() == name))
        .cloned()
        .collect();
    if let Some(name) = &args.test {
        if tests.is_empty() {
            anyhow::bail!("No such test: {name}");
        }
    }

    let mut failures = 0;
    for test in &tests {
        if args.dump {
            let flat = test.component().flatten()?;
            println!("{flat}");
        }
        print!("test {:<20} ", test.name());
        std::io::stdout().flush()?;
        let report = run_test(test, &config)
            .with_context(|| format!("Internal error while running test {}", test.name()))?;
        if report.passed() {
            println!("PASS");
        } else {
            println!("FAIL");
            failures += 1;
            for diagnostic in &report.diagnostics {
                eprintln!("{diagnostic}");
            }
        }
    }

    if failures > 0 {
        eprintln!("{failures} of {} tests failed.", tests.len());
        std::process::exit(1);
    }
    Ok(())
}

fn init_logging(debug: bool) -> anyhow::Result<()> {
    use chrono::{DateTime, Utc};

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            let now: DateTime<Utc> = Utc::now();
            out.finish(format_args!(
                "[{} {} {}] {}",
                now.format("%Y-%m-%dT%H:%M:%S%.fZ"),
                record.level(),
                record.target(),
                message
            ))
        })
        .chain(std::io::stderr());

    let level = std::env::var("LEVEL").unwrap_or_default().to_string();

    if debug || level == "DEBUG" {
        dispatch = dispatch.level(log::LevelFilter::Debug);
    } else if level == "TRACE" {
        dispatch = dispatch.level(log::LevelFilter::Trace);
    } else if level == "INFO" {
        dispatch = dispatch.level(log::LevelFilter::Info);
    } else {
        dispatch = dispatch.level(log::LevelFilter::Warn);
    }

    dispatch.apply()?;
    debug!("Logging initialized");
    Ok(())
}
