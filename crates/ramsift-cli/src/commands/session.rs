//! Interactive narrowing over a snapshot file that another process keeps updating.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use ramsift_core::{FilterStep, SearchFilter, SearchResults};
use tracing::debug;

use super::hex_utils::{format_hex_address, format_value, parse_hex_address};
use super::{ScanRange, apply_step, load_snapshot};
use crate::config::CliConfig;

const HELP: &str = "\
Commands:
  filter <op>[value|+n|-n|init]
                            narrow the candidates (e.g. =171, !=, >+1, =init)
  list [n]                  show the first n candidates with their current value
  exclude <address>         remove every candidate at a hex address
  drop <index>              remove the candidate at a list index
  undo                      return to the previous generation
  reset                     rescan the snapshot
  help                      show this message
  quit                      leave the session";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Session {
    snapshot: PathBuf,
    range: ScanRange,
    config: CliConfig,
    current: SearchResults,
    history: Vec<SearchResults>,
}

impl Session {
    /// Scan the snapshot to build the baseline generation
    pub fn start(snapshot: PathBuf, range: ScanRange, config: CliConfig) -> Result<Self> {
        let mut session = Self {
            snapshot,
            range,
            config,
            current: SearchResults::default(),
            history: Vec::new(),
        };
        session.current = session.scan()?;
        Ok(session)
    }

    pub fn current(&self) -> &SearchResults {
        &self.current
    }

    fn scan(&self) -> Result<SearchResults> {
        let memory = load_snapshot(&self.snapshot)?;
        Ok(SearchResults::initialize_with_config(
            &memory,
            self.range.start,
            self.range.length(),
            self.range.size,
            &self.config.search,
        )?)
    }

    /// Execute one command line, writing its output to `out`
    pub fn execute<W: Write>(&mut self, line: &str, out: &mut W) -> Result<Flow> {
        let line = line.trim();
        let (command, args) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let args = args.trim();
        debug!("Session command {:?} {:?}", command, args);

        match command {
            "" => {}
            "filter" | "f" => {
                let step: FilterStep = args.parse()?;
                let memory = load_snapshot(&self.snapshot)?;
                let next = apply_step(
                    &memory,
                    self.baseline(),
                    &self.current,
                    step,
                    &self.config.search,
                )?;
                self.history.push(std::mem::replace(&mut self.current, next));
                writeln!(out, "{}", self.current.summary())?;
                self.write_count(out)?;
            }
            "list" | "l" => {
                let limit = if args.is_empty() {
                    self.config.display.list_limit
                } else {
                    args.parse().context("Invalid list count")?
                };
                self.list(limit, out)?;
            }
            "exclude" | "x" => {
                let address = parse_hex_address(args)?;
                self.ensure_filtered()?;
                self.current.exclude_address(address);
                self.write_count(out)?;
            }
            "drop" | "d" => {
                let index: usize = args.parse().context("Invalid candidate index")?;
                self.ensure_filtered()?;
                if index >= self.current.matching_address_count() {
                    bail!("No candidate at index {}", index);
                }
                self.current.exclude_matching_address(index);
                self.write_count(out)?;
            }
            "undo" | "u" => match self.history.pop() {
                Some(previous) => {
                    self.current = previous;
                    writeln!(out, "{}", self.current.summary())?;
                    self.write_count(out)?;
                }
                None => writeln!(out, "Nothing to undo")?,
            },
            "reset" => {
                self.current = self.scan()?;
                self.history.clear();
                writeln!(out, "{}", self.current.summary())?;
            }
            "help" | "?" => writeln!(out, "{HELP}")?,
            "quit" | "q" | "exit" => return Ok(Flow::Quit),
            other => bail!("Unknown command {:?}, type 'help' for a list", other),
        }

        Ok(Flow::Continue)
    }

    fn baseline(&self) -> &SearchResults {
        self.history.first().unwrap_or(&self.current)
    }

    fn ensure_filtered(&self) -> Result<()> {
        if !self.current.is_filtered() {
            bail!("Candidates can only be removed after the first filter");
        }
        Ok(())
    }

    fn write_count<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(
            out,
            "{} candidates",
            self.current.matching_address_count()
        )?;
        Ok(())
    }

    fn list<W: Write>(&self, limit: usize, out: &mut W) -> Result<()> {
        let memory = load_snapshot(&self.snapshot)?;
        let prior = match self.current.filter_step().map(|step| step.filter) {
            Some(SearchFilter::InitialValue) => self.history.first(),
            _ => self.history.last(),
        };

        for (index, captured) in self.current.iter().take(limit).enumerate() {
            let mut live = captured;
            let changed = self.current.update_value(&memory, &mut live)?;
            let passes = prior.is_none_or(|prior| self.current.matches_filter(prior, &live));
            writeln!(
                out,
                "[{}] {} {:<9} {} -> {}{}",
                index,
                format_hex_address(captured.address),
                captured.size.label(),
                format_value(captured.value, captured.size),
                format_value(live.value, live.size),
                match (changed, passes) {
                    (_, false) => "  (no longer matches)",
                    (true, true) => "  (changed)",
                    (false, true) => "",
                }
            )?;
        }

        let total = self.current.matching_address_count();
        if total > limit {
            writeln!(out, "... and {} more", total - limit)?;
        }
        Ok(())
    }
}

/// Run the session command
pub fn run(snapshot: PathBuf, range: ScanRange, config: CliConfig) -> Result<()> {
    let mut session = Session::start(snapshot, range, config)?;
    println!("{}", session.current().summary());
    println!("Type 'help' for a list of commands");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("ramsift> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        match session.execute(&line, &mut stdout) {
            Ok(Flow::Quit) => break,
            Ok(Flow::Continue) => {}
            Err(e) => eprintln!("Error: {:#}", e),
        }
    }

    Ok(())
}
