// boxlog demo - a short tour of tree composition, dumping, and wrapping

use anyhow::Result;
use clap::Parser;
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

use boxlog::{DumpValue, FixedWidth, LogBox, Terminal};

#[derive(Parser, Debug)]
#[command(name = "boxlog", version, about = "Hierarchical box-drawing log output")]
struct Cli {
    /// Override the detected terminal width
    #[arg(long)]
    width: Option<usize>,

    /// Dump this JSON value as nested tables instead of running the tour
    #[arg(long)]
    json: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let log = match cli.width {
        Some(w) => boxlog::root_with(Rc::new(RefCell::new(Terminal)), Rc::new(FixedWidth(w))),
        None => boxlog::root(),
    };

    if let Some(raw) = cli.json {
        let value: serde_json::Value = serde_json::from_str(&raw)?;
        log.object(DumpValue::from(&value));
        log.out();
        return Ok(());
    }

    tour(&log)?;
    Ok(())
}

fn tour(log: &LogBox) -> Result<()> {
    log.title("boxlog tour")?;
    log.line("plain lines stack under one margin");
    log.line_styled("a trailing color token styles the line", "cyan");

    let task = log.child_box_with("a child box groups related lines");
    task.line("it renders once marked ready");
    let nested = task.child_box_with("magenta");
    nested.line("boxes nest arbitrarily deep").mark_ready();
    task.mark_ready_with("and closes its own margin");

    log.line("---");
    log.linef(&[json!("formatted: %s took %d ms"), json!("startup"), json!(42)]);
    log.line("structured values become nested tables...");
    #[derive(serde::Serialize)]
    struct Status {
        service: &'static str,
        retries: u32,
        endpoints: Vec<&'static str>,
    }
    log.object(DumpValue::from_serialize(&Status {
        service: "demo",
        retries: 3,
        endpoints: vec!["a.example", "b.example"],
    })?);

    log.info("tour complete");
    log.spacer();
    Ok(())
}
