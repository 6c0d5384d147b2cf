#![deny(warnings)]

//! Headless CLI: found a company, let the quarters run, print where it
//! stands. Saves and loads go through `persistence`.

use anyhow::{anyhow, bail, Context, Result};
use sim_ai::PolicyTable;
use sim_core::format_money;
use sim_runtime::{Game, GameSnapshot, SimConfig};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    policies: Option<PathBuf>,
    seed: Option<u64>,
    quarters: Option<u32>,
    found: Option<String>,
    save: Option<PathBuf>,
    load: Option<PathBuf>,
    version: bool,
}

fn parse_args() -> Result<Args> {
    let mut args = Args::default();
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--config" => args.config = it.next().map(PathBuf::from),
            "--policies" => args.policies = it.next().map(PathBuf::from),
            "--seed" => {
                let raw = it.next().context("--seed needs a value")?;
                args.seed = Some(raw.parse().with_context(|| format!("bad seed {raw:?}"))?);
            }
            "--quarters" => {
                let raw = it.next().context("--quarters needs a value")?;
                let quarters = raw.parse().with_context(|| format!("bad quarter count {raw:?}"))?;
                args.quarters = Some(quarters);
            }
            "--found" => args.found = it.next(),
            "--save" => args.save = it.next().map(PathBuf::from),
            "--load" => args.load = it.next().map(PathBuf::from),
            "--version" => args.version = true,
            other => warn!(arg = other, "ignoring unknown argument"),
        }
    }
    Ok(args)
}

fn load_config(args: &Args) -> Result<SimConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            SimConfig::from_yaml(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => SimConfig::default(),
    };
    if let Some(path) = &args.policies {
        let text =
            std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        config.policies = PolicyTable::from_yaml(&text)?;
    }
    if let Some(seed) = args.seed {
        config = config.with_seed(seed);
    }
    Ok(config)
}

/// `--found "Name:Market:Product"`
fn found(game: &mut Game, spec: &str) -> Result<()> {
    let mut parts = spec.splitn(3, ':');
    let (Some(name), Some(market), Some(product)) = (parts.next(), parts.next(), parts.next())
    else {
        bail!("--found expects NAME:MARKET:PRODUCT, got {spec:?}");
    };
    game.found_company(name, market, product)
        .map_err(|e| anyhow!("cannot found {name}: {e}"))
}

fn report(game: &Game) {
    let p = game.player();
    println!(
        "{} | turn {} | {} | cash: {} | cap: {} | employees: {} | products: {} | share: {:.1}%",
        game.date(),
        game.turn(),
        p.name,
        format_money(p.cash),
        format_money(p.market_cap),
        p.employees,
        p.products.len(),
        game.player_market_share() * 100.0,
    );
    println!(
        "Competitors: {} | markets: {} | pending acquisitions: {}",
        game.ai_companies().len(),
        game.markets().len(),
        game.pending_acquisitions().len()
    );
    for line in game.event_feed().iter().take(3) {
        println!("  event: {line}");
    }
    for line in game.news().iter().rev().take(5) {
        println!("  news: {line}");
    }
    for line in game.competitor_news().iter().rev().take(5) {
        println!("  rivals: {line}");
    }
    if let Some(outcome) = game.outcome() {
        println!("{}", outcome.message());
    }
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = parse_args()?;
    if args.version {
        println!(
            "technopoly {} ({} built {})",
            env!("CARGO_PKG_VERSION"),
            env!("GIT_SHA"),
            env!("BUILD_DATE")
        );
        return Ok(());
    }
    let config = load_config(&args)?;
    info!(seed = config.rng_seed, quarters = ?args.quarters, "starting CLI");

    let mut game = match &args.load {
        Some(path) => {
            let snap: GameSnapshot = persistence::load(path)?;
            Game::restore(config, snap).with_context(|| format!("restoring {}", path.display()))?
        }
        None => Game::new(config),
    };
    if let Some(spec) = &args.found {
        found(&mut game, spec)?;
    }

    for summary in game.run(args.quarters.unwrap_or(4)) {
        info!(
            turn = summary.turn,
            event = ?summary.event,
            acquisitions = summary.acquisitions,
            bankruptcies = summary.bankruptcies,
            "quarter played"
        );
    }
    report(&game);

    if let Some(path) = &args.save {
        persistence::save(path, &game.snapshot())?;
        info!(path = %path.display(), "game saved");
    }
    Ok(())
}
