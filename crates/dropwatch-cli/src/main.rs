mod config;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use config::DropwatchConfig;
use dropwatch_classify::{activity_code, classify_with_hint};
use dropwatch_core::domain::validate_domain;
use dropwatch_core::timeparse::{format_epoch, now_epoch, parse_when, TimeMode};
use dropwatch_core::{ActivityCode, WatchError, WatchResult};
use dropwatch_notify::Notifier;
use dropwatch_watch::{
    determine_phase, AutoContinue, GracePrompt, Renderer, Scheduler, StdinPrompt, WatchOptions,
};
use dropwatch_whois::{TldRegistry, WhoisClient, WhoisLookup};

#[derive(Parser)]
#[command(name = "dropwatch")]
#[command(about = "Watch a domain's WHOIS record and catch lifecycle transitions")]
struct Cli {
    #[arg(
        short = 'f',
        long,
        default_value = "dropwatch.toml",
        global = true,
        help = "Path to config file"
    )]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// One-shot WHOIS classification, no loop
    Query {
        domain: String,
    },
    /// Poll a domain until it matches, a limit is hit, or ^C
    Watch {
        domain: String,
        #[arg(short, long, default_value = "60", help = "Base poll interval in seconds")]
        interval: u64,
        #[arg(short, long, help = "Match this pattern instead of availability")]
        expect: Option<String>,
        #[arg(short = 'n', long = "max-checks", default_value = "0", help = "0 = unlimited")]
        max_checks: u32,
        #[arg(long, help = "Target time: epoch or e.g. '2025-12-25 18:00:00 UTC'")]
        until: Option<String>,
        #[arg(long, conflicts_with = "local")]
        utc: bool,
        #[arg(long)]
        local: bool,
        #[arg(short = 'y', long = "yes", help = "Auto-continue past the grace window")]
        auto_continue: bool,
    },
    /// Countdown to a target time, no WHOIS
    Time {
        when: String,
        #[arg(long, conflicts_with = "local")]
        utc: bool,
        #[arg(long)]
        local: bool,
    },
}

fn time_mode(utc: bool) -> TimeMode {
    if utc {
        TimeMode::Utc
    } else {
        TimeMode::Local
    }
}

/// 0 matched, 1 no match, 2 bad arguments/config, 3 transport/dependency,
/// 4 date parse.
fn exit_code_for(e: &WatchError) -> i32 {
    match e {
        WatchError::Validation(_) | WatchError::Config(_) => 2,
        WatchError::DateParse(_) => 4,
        WatchError::Transport(_)
        | WatchError::RateLimited(_)
        | WatchError::Notify(_)
        | WatchError::Network(_)
        | WatchError::Io(_)
        | WatchError::Json(_) => 3,
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dropwatch=warn".into()),
        )
        .init();

    let cli = Cli::parse();

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            exit_code_for(&e)
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> WatchResult<i32> {
    let cfg = DropwatchConfig::load(&cli.config)?;

    match cli.command {
        Commands::Query { domain } => run_query(domain, &cfg).await,
        Commands::Watch {
            domain,
            interval,
            expect,
            max_checks,
            until,
            utc,
            local: _,
            auto_continue,
        } => {
            let mode = time_mode(utc);
            run_watch(
                domain,
                interval,
                expect,
                max_checks,
                until,
                mode,
                auto_continue,
                &cfg,
            )
            .await
        }
        Commands::Time { when, utc, local: _ } => run_time(when, time_mode(utc)).await,
    }
}

async fn run_query(domain: String, cfg: &DropwatchConfig) -> WatchResult<i32> {
    validate_domain(&domain)?;
    let registry = TldRegistry::builtin().merge_config(cfg.tld_overrides());
    let resolved = registry.resolve(&domain)?;

    let client = WhoisClient::new(Duration::from_secs(cfg.whois.timeout_secs));
    let raw = client.query(&domain, &resolved.server).await?;
    let (status, registrar) = classify_with_hint(&raw, Some(&resolved.available_pattern));
    let activity = activity_code(&raw, None);

    println!("--- whois query: {domain} ---");
    println!("server:    {}", resolved.server);
    println!("status:    {status}");
    println!("registrar: {registrar}");
    println!("activity:  {activity}");
    Ok(0)
}

#[allow(clippy::too_many_arguments)]
async fn run_watch(
    domain: String,
    interval: u64,
    expect: Option<String>,
    max_checks: u32,
    until: Option<String>,
    mode: TimeMode,
    auto_continue: bool,
    cfg: &DropwatchConfig,
) -> WatchResult<i32> {
    let target_epoch = match until {
        Some(when) => parse_when(&when, mode)?,
        None => 0,
    };

    let registry = TldRegistry::builtin().merge_config(cfg.tld_overrides());
    let resolved = registry.resolve(&domain)?;

    let notifier = Arc::new(match &cfg.notify {
        Some(nc) => Notifier::new(
            nc.webhook_urls.clone(),
            nc.ntfy_topic.clone(),
            nc.ntfy_server.clone(),
        ),
        None => Notifier::noop(),
    });

    let opts = WatchOptions {
        domain,
        base_interval_secs: interval,
        max_checks,
        expect_pattern: expect,
        target_epoch,
        mode,
        auto_continue,
        state_dir: cfg.output.as_ref().map(|o| PathBuf::from(&o.state_dir)),
    };

    let client: Box<dyn WhoisLookup> =
        Box::new(WhoisClient::new(Duration::from_secs(cfg.whois.timeout_secs)));
    let prompt: Box<dyn GracePrompt> = if auto_continue {
        Box::new(AutoContinue)
    } else {
        Box::new(StdinPrompt)
    };

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_cancel.cancel();
        }
    });

    let scheduler = Scheduler::new(
        opts,
        resolved,
        client,
        notifier,
        Renderer::new(mode),
        prompt,
        cancel,
    )?;
    let outcome = scheduler.run().await?;
    Ok(if outcome.matched() { 0 } else { 1 })
}

async fn run_time(when: String, mode: TimeMode) -> WatchResult<i32> {
    let target = parse_when(&when, mode)?;
    let renderer = Renderer::new(mode);
    let label = format_epoch(target, mode);

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_cancel.cancel();
        }
    });

    loop {
        let now = now_epoch();
        if now >= target {
            renderer.target_passed(&label, target);
            return Ok(0);
        }
        let phase = determine_phase(target, now);
        renderer.live_line(
            phase,
            ActivityCode::Poll,
            (target - now) as u64,
            now,
            target,
            &label,
        );
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(1)) => {}
            _ = cancel.cancelled() => {
                println!();
                return Ok(1);
            }
        }
    }
}
