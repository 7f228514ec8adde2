//! `benchsim console`: live bench on the wall clock, driven from stdin.

use std::io::BufRead;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;

use benchsim_runtime::input::Channel;
use benchsim_runtime::panel::{Color, IndicatorId, Indicators};
use benchsim_runtime::scheduler::{BenchRunner, StdClock};
use benchsim_runtime::Bench;

use crate::style;

const POLL: Duration = Duration::from_millis(20);

struct TraceSink;

impl Indicators for TraceSink {
    fn set_color(&mut self, id: IndicatorId, color: Color) {
        println!("{:>10} {}", id.to_string(), style::lamp(color));
    }
}

pub fn run_console(config: Option<&Path>) -> anyhow::Result<()> {
    let config = crate::load_config(config)?;
    let mut bench = Bench::new(config);
    bench.attach(Box::new(TraceSink));
    let mut handle = BenchRunner::new(bench, StdClock::new(), POLL)
        .spawn("benchsim-bench")
        .context("failed to start bench thread")?;
    let control = handle.control();

    println!(
        "{}",
        style::accent("keys: power, a, b, c, d (start), e (reset), status, quit")
    );
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("failed to read stdin")?;
        let command = line.trim();
        match command {
            "" => continue,
            "quit" | "exit" | "q" => break,
            "status" => {
                let snapshot = control.snapshot()?;
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            }
            other => match other.parse::<Channel>() {
                Ok(channel) => control.press(channel)?,
                Err(err) => println!("{}", style::error(err.to_string())),
            },
        }
        for event in control.drain_events()? {
            println!("{}", style::accent(serde_json::to_string(&event)?));
        }
    }

    handle.stop();
    handle
        .join()
        .map_err(|_| anyhow::anyhow!("bench thread panicked"))?;
    Ok(())
}
