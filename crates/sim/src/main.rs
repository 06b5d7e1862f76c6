//! Runs the automation against the in-memory duel and prints what happens.
//!
//! Configuration comes from `AUTOCRYSTAL_*` environment variables (a `.env`
//! file is honored). `CRYSTAL_SIM_SECONDS` bounds the run.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crystal_core::HoleMode;
use crystal_runtime::{AutoCrystal, AutoCrystalConfig, Event, Topic};
use crystal_sim::arena::{self, TARGET_ID};
use tokio::sync::broadcast::error::TryRecvError;

const DEFAULT_RUN_SECONDS: u64 = 5;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = AutoCrystalConfig::from_env().context("loading AUTOCRYSTAL_* configuration")?;
    let seconds = std::env::var("CRYSTAL_SIM_SECONDS")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(DEFAULT_RUN_SECONDS);

    let session = Arc::new(arena::duel(Some(200.0))?);
    let ticker = session.start_ticker(config.tick_duration());

    let automation = AutoCrystal::builder(Arc::clone(&session)).config(config).build()?;
    let mut receivers =
        automation.subscribe_multiple(&[Topic::Lifecycle, Topic::Action, Topic::Telemetry, Topic::Error]);

    tracing::info!(
        holes = automation.holes(None, HoleMode::Defensive).len(),
        candidates = ?automation.possible_positions(Some(TARGET_ID), false),
        "arena ready"
    );

    automation.enable();
    if let Err(err) = automation.start() {
        tracing::warn!(error = %err, "automation did not start");
    }

    let printer = tokio::spawn(async move {
        let mut streams: Vec<_> = receivers.drain().map(|(_, rx)| rx).collect();
        loop {
            let mut progressed = false;
            for rx in &mut streams {
                match rx.try_recv() {
                    Ok(event) => {
                        print_event(&event);
                        progressed = true;
                    }
                    Err(TryRecvError::Closed) => return,
                    Err(_) => {}
                }
            }
            if !progressed {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        }
    });

    let mut state = automation.watch_state();
    let deadline = tokio::time::sleep(Duration::from_secs(seconds));
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            _ = &mut deadline => break,
            changed = state.changed() => {
                if changed.is_err() || !state.borrow().running {
                    break;
                }
            }
        }
    }

    let counters = automation.counters();
    automation.shutdown().await?;
    printer.abort();
    ticker.abort();

    println!(
        "wanted {} placed {} broke {} | opponent health {:?} | agent damage taken {:.1}",
        counters.wanted_placed,
        counters.num_placed,
        counters.num_broke,
        session.health(TARGET_ID),
        session.agent_damage_taken()
    );
    Ok(())
}

fn print_event(event: &Event) {
    match event {
        Event::Lifecycle(event) => println!("[lifecycle] {event:?}"),
        Event::Action(event) => println!("[action] {event:?}"),
        Event::Telemetry(event) => println!("[telemetry] {event:?}"),
        Event::Error(event) => println!("[error] {}", event.message),
    }
}

