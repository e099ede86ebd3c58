//! Demo runner: drives the built-in sleep kind until a termination signal.
//!
//! ```text
//! pickvisor 2 8 --concurrent 6 --delay 200-700 --count 1+2
//! pickvisor --config engine.toml --fail-above 6 --hold
//! ```

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use pickvisor::{
    BackpressurePolicy, ConfigError, CountSpread, EchoBuffer, Engine, EngineConfig, LogWriter,
    SleepKind, Spread, Subscribe, logging,
};

#[derive(Parser, Debug)]
#[command(name = "pickvisor", version, about = "Admission-controlled sleep-task runner")]
struct Cli {
    /// Shortest sleep, in seconds.
    #[arg(value_name = "MIN", default_value_t = 5)]
    min: u64,

    /// Longest sleep (exclusive), in seconds.
    #[arg(value_name = "MAX", default_value_t = 20)]
    max: u64,

    /// Live-task ceiling.
    #[arg(short, long, value_name = "N")]
    concurrent: Option<usize>,

    /// Wait between pickup cycles in ms: `500` or `500-2000`.
    #[arg(short, long, value_name = "MIN[-MAX]", value_parser = parse_delay)]
    delay: Option<Spread>,

    /// Admissions per cycle: `2` or `1+3` (1 plus random 0..3).
    #[arg(short = 'n', long, value_name = "BASE[+PLUS]", value_parser = parse_count)]
    count: Option<CountSpread>,

    /// TOML file overriding the sleep defaults; flags override both.
    #[arg(long, value_name = "FILE")]
    config: Option<std::path::PathBuf>,

    /// Sleeps longer than this many seconds end as errors.
    #[arg(long, value_name = "SECS")]
    fail_above: Option<u64>,

    /// Hold admission after negative health scores (1s per unit, at most 30s).
    #[arg(long)]
    hold: bool,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, value_name = "FILTER", default_value = "pickvisor=info")]
    log: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(&cli.log);

    let cfg = engine_config(&cli)?;
    let mut kind = SleepKind::new(Duration::from_secs(cli.min), Duration::from_secs(cli.max))
        .with_config(cfg);
    if let Some(secs) = cli.fail_above {
        kind = kind.fail_above(Duration::from_secs(secs));
    }

    let echo = Arc::new(EchoBuffer::default());
    let subscribers: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new()), echo.clone()];
    let engine = Engine::builder(Arc::new(kind))
        .with_subscribers(subscribers)
        .build()?;

    let outcome = engine.run_until_signal().await;

    let s = engine.stats();
    tracing::info!(
        total = s.total,
        ok = s.ok,
        fail = s.fail,
        err = s.err,
        alive = s.alive,
        success_rate = s.success_rate(),
        "final stats"
    );
    for line in echo.lines() {
        tracing::info!("echo {line}");
    }
    outcome?;
    Ok(())
}

/// Sleep defaults, then `--config`, then the individual flags.
fn engine_config(cli: &Cli) -> Result<EngineConfig, ConfigError> {
    let mut cfg = match &cli.config {
        Some(path) => SleepKind::default_config().overlay_file(path)?,
        None => SleepKind::default_config(),
    };
    if let Some(n) = cli.concurrent {
        cfg.max_concurrent = n;
    }
    if let Some(delay) = cli.delay {
        cfg.delay = delay;
    }
    if let Some(count) = cli.count {
        cfg.pickup_count = count;
    }
    if cli.hold {
        cfg.backpressure = BackpressurePolicy::HoldOnNegative {
            unit: Duration::from_secs(1),
            max: Duration::from_secs(30),
        };
    }
    Ok(cfg)
}

fn parse_delay(s: &str) -> Result<Spread, String> {
    let (lo, hi) = match s.split_once('-') {
        Some((lo, hi)) => (parse_ms(lo)?, parse_ms(hi)?),
        None => {
            let ms = parse_ms(s)?;
            (ms, ms)
        }
    };
    if hi < lo {
        return Err(format!("max {hi} is below min {lo}"));
    }
    Ok(Spread::new(
        Duration::from_millis(lo),
        Duration::from_millis(hi - lo),
    ))
}

fn parse_ms(s: &str) -> Result<u64, String> {
    s.trim()
        .parse::<u64>()
        .map_err(|e| format!("invalid milliseconds {s:?}: {e}"))
}

fn parse_count(s: &str) -> Result<CountSpread, String> {
    let (base, plus) = s.split_once('+').unwrap_or((s, "0"));
    let parse = |v: &str| {
        v.trim()
            .parse::<u32>()
            .map_err(|e| format!("invalid count {v:?}: {e}"))
    };
    Ok(CountSpread {
        base: f64::from(parse(base)?),
        variance: f64::from(parse(plus)?),
    })
}
