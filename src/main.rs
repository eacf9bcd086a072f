use std::cell::RefCell;
use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::rc::Rc;

use clap::{Parser, Subcommand, ValueEnum};
use grid_reconcile::apply::apply;
use grid_reconcile::config::GridConfig;
use grid_reconcile::grid::{Direction, Grid};
use grid_reconcile::ids::{IdSource, SequentialIds, UuidIds};
use grid_reconcile::listener::KeyDispatcher;
use grid_reconcile::reconcile::{Reconciler, Reconciliation};
use grid_reconcile::widget::ReconcilingGrid;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "gridrec",
    version,
    about = "Find and apply 2048-style merges on a grid of integers"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one reconciliation pass and print its events
    Reconcile {
        /// Rows separated by '/', cells by ',', e.g. "2,0,2,0/0,4,4,0"
        #[arg(long, value_name = "ROWS")]
        grid: String,
        /// Motion: up, down, left or right
        #[arg(long, value_name = "DIR")]
        direction: Direction,
        /// How two cells combine
        #[arg(long, value_enum, default_value_t = MergeRule::Sum)]
        merge: MergeRule,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
        /// Cell value treated as empty (never merged)
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        vacant: i64,
        /// Number events evt-0, evt-1, ... instead of random uuids
        #[arg(long)]
        sequential_ids: bool,
    },
    /// Read key names from stdin (one per line); reconcile, apply and print after each
    Play {
        /// Starting grid, same syntax as `reconcile --grid`
        #[arg(long, value_name = "ROWS")]
        grid: String,
        /// TOML file with key bindings and key phase
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
        /// How two cells combine; an overflowing merge saturates with a warning
        #[arg(long, value_enum, default_value_t = MergeRule::Sum)]
        merge: MergeRule,
        /// Cell value treated as empty
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        vacant: i64,
    },
    /// Print the effective key configuration as TOML
    Keys {
        /// TOML file with key bindings and key phase
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum MergeRule {
    Sum,
    Product,
    Max,
}

#[derive(thiserror::Error, Debug)]
#[error("{rule:?} of {a} and {b} overflows i64")]
struct MergeOverflow {
    rule: MergeRule,
    a: i64,
    b: i64,
}

impl MergeRule {
    fn checked(self, a: i64, b: i64) -> Result<i64, MergeOverflow> {
        let out = match self {
            MergeRule::Sum => a.checked_add(b),
            MergeRule::Product => a.checked_mul(b),
            MergeRule::Max => Some(a.max(b)),
        };
        out.ok_or(MergeOverflow { rule: self, a, b })
    }

    fn saturating(self, a: i64, b: i64) -> i64 {
        match self {
            MergeRule::Sum => a.saturating_add(b),
            MergeRule::Product => a.saturating_mul(b),
            MergeRule::Max => a.max(b),
        }
    }

    /// Checked merge for callers that cannot fail: overflow is logged and the
    /// result saturates.
    fn or_saturate(self, a: i64, b: i64) -> i64 {
        self.checked(a, b).unwrap_or_else(|e| {
            warn!(error = %e, "merge overflow; saturating");
            self.saturating(a, b)
        })
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Reconcile { grid, direction, merge, format, vacant, sequential_ids } => {
            let grid = parse_grid(&grid)?;
            let ids: Box<dyn IdSource> =
                if sequential_ids { Box::new(SequentialIds::default()) } else { Box::new(UuidIds) };
            let events = Reconciler::with_ids(ids).try_reconcile(
                &grid,
                direction,
                |v| Ok(*v != vacant),
                |a, b| merge.checked(a, b),
            )?;
            print_events(&events, format)?;
        }
        Command::Play { grid, config, merge, vacant } => {
            let config = load_config(config)?;
            play(parse_grid(&grid)?, config, merge, vacant)?;
        }
        Command::Keys { config } => {
            let config = load_config(config)?;
            print!("{}", config.to_toml_string()?);
        }
    }
    Ok(())
}

fn load_config(path: Option<PathBuf>) -> Result<GridConfig, Box<dyn Error>> {
    match path {
        Some(path) => {
            let config = GridConfig::load(&path)?;
            info!(path = %path.display(), "loaded config");
            Ok(config)
        }
        None => Ok(GridConfig::default()),
    }
}

/// Parse `"2,0/0,2"` into rows; an empty string is an empty grid.
fn parse_grid(s: &str) -> Result<Grid<i64>, Box<dyn Error>> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(Grid::empty());
    }
    let mut rows = Vec::new();
    for row in s.split(['/', ';']) {
        let row = row.trim();
        if row.is_empty() {
            rows.push(Vec::new());
            continue;
        }
        let cells = row
            .split(',')
            .map(|c| c.trim().parse::<i64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("bad cell in row {row:?}: {e}"))?;
        rows.push(cells);
    }
    Ok(Grid::from_rows(rows)?)
}

fn print_events(events: &[Reconciliation<i64>], format: Format) -> Result<(), Box<dyn Error>> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for e in events {
        match format {
            Format::Json => {
                serde_json::to_writer(&mut out, e)?;
                writeln!(out)?;
            }
            Format::Text => writeln!(
                out,
                "{} {} {} -> {} ({}, {}) => {}",
                e.id, e.direction, e.source, e.destination, e.operands.0, e.operands.1, e.result
            )?,
        }
    }
    if matches!(format, Format::Text) {
        writeln!(out, "{} reconciliation(s)", events.len())?;
    }
    Ok(())
}

fn play(grid: Grid<i64>, config: GridConfig, merge: MergeRule, vacant: i64) -> Result<(), Box<dyn Error>> {
    let pending: Rc<RefCell<Option<Vec<Reconciliation<i64>>>>> = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&pending);
    let widget = ReconcilingGrid::new(
        grid,
        config.clone(),
        move |v: &i64| *v != vacant,
        move |a, b| merge.or_saturate(a, b),
        move |events| *sink.borrow_mut() = Some(events.to_vec()),
    )
    .with_ids(SequentialIds::default());
    let widget = Rc::new(RefCell::new(widget));

    let dispatcher = KeyDispatcher::new();
    let _subscription = ReconcilingGrid::attach(&widget, &dispatcher);

    print!("{}", widget.borrow().data());
    io::stdout().flush()?;
    for line in io::stdin().lock().lines() {
        let line = line?;
        let key = line.trim();
        if key.is_empty() {
            continue;
        }
        let Some(direction) = config.keys.direction_for(key) else {
            eprintln!("unbound key: {key}");
            continue;
        };
        dispatcher.dispatch(config.key_event, key);
        let Some(batch) = pending.borrow_mut().take() else {
            continue;
        };
        let next = apply(widget.borrow().data(), direction, &batch, vacant)?;
        widget.borrow_mut().set_data(next);
        println!("{direction}: {} merge(s)", batch.len());
        print!("{}", widget.borrow().data());
        io::stdout().flush()?;
    }
    Ok(())
}
