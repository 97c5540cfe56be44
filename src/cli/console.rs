//! `console` command: line-oriented engine control over stdin

use std::io::Write;

use anyhow::{anyhow, bail, Context, Result};
use loadknob_core::{ConfigUpdate, Engine};
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
Commands:
  start           start issuing requests
  stop            stop after in-flight requests complete
  reset           stop, restore default configuration
                  (1000ms, 4 workers, http://127.0.0.1:8080/ok.json) and clear stats
  report          print the report with the last 10 responses
  report all      print the report with every response
  status          print a one-line status
  delay <ms>      set the per-worker delay (100-10000)
  workers <n>     set the worker count (1-20, stopped only)
  uri <uri>       set the target endpoint (stopped only)
  help            show this help
  quit            stop and exit";

/// A parsed console line
#[derive(Debug, Clone, PartialEq, Eq)]
enum ConsoleCommand {
    Start,
    Stop,
    Reset,
    Report,
    ReportAll,
    Status,
    Set(ConfigUpdate),
    Help,
    Quit,
}

impl ConsoleCommand {
    /// Parse one input line; blank lines yield `None`
    fn parse(line: &str) -> Result<Option<Self>> {
        let mut parts = line.split_whitespace();
        let Some(verb) = parts.next() else {
            return Ok(None);
        };
        let arg = parts.next();
        if parts.next().is_some() {
            bail!("too many arguments for '{verb}'");
        }

        let command = match (verb.to_ascii_lowercase().as_str(), arg) {
            ("start", None) => Self::Start,
            ("stop", None) => Self::Stop,
            ("reset", None) => Self::Reset,
            ("report", None) => Self::Report,
            ("report", Some(scope)) if scope.eq_ignore_ascii_case("all") => Self::ReportAll,
            ("status", None) => Self::Status,
            ("help", None) => Self::Help,
            ("quit" | "exit", None) => Self::Quit,
            ("delay", Some(ms)) => Self::Set(ConfigUpdate::DelayMillis(
                ms.parse().with_context(|| format!("invalid delay '{ms}'"))?,
            )),
            ("workers", Some(n)) => Self::Set(ConfigUpdate::WorkerCount(
                n.parse().with_context(|| format!("invalid worker count '{n}'"))?,
            )),
            ("uri", Some(uri)) => Self::Set(ConfigUpdate::TargetUri(uri.to_string())),
            ("delay" | "workers" | "uri", None) => bail!("'{verb}' needs a value"),
            (_, Some(_)) if is_bare(verb) => bail!("'{verb}' takes no arguments"),
            _ => return Err(anyhow!("unknown command '{verb}', try 'help'")),
        };

        Ok(Some(command))
    }
}

fn is_bare(verb: &str) -> bool {
    matches!(
        verb.to_ascii_lowercase().as_str(),
        "start" | "stop" | "reset" | "report" | "status" | "help" | "quit" | "exit"
    )
}

pub async fn execute(engine: Engine) -> Result<()> {
    println!("{HELP}");
    println!("{}", engine.snapshot());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush().context("Failed to flush stdout")?;

        let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
            break;
        };

        match ConsoleCommand::parse(&line) {
            Ok(None) => {}
            Ok(Some(ConsoleCommand::Quit)) => break,
            Ok(Some(command)) => dispatch(&engine, command),
            Err(e) => println!("error: {e:#}"),
        }
    }

    engine.stop();
    engine.drain().await;
    println!("{}", engine.snapshot());
    Ok(())
}

fn dispatch(engine: &Engine, command: ConsoleCommand) {
    match command {
        ConsoleCommand::Start => {
            engine.start();
            println!("{}", engine.snapshot());
        }
        ConsoleCommand::Stop => {
            engine.stop();
            println!("{}", engine.snapshot());
        }
        ConsoleCommand::Reset => {
            engine.reset();
            println!("{}", engine.snapshot());
        }
        ConsoleCommand::Report => println!("{}", engine.report()),
        ConsoleCommand::ReportAll => {
            // emits the full state to the log as well
            engine.report();
            println!("{}", engine.full_report());
        }
        ConsoleCommand::Status => println!("{}", engine.snapshot()),
        ConsoleCommand::Set(update) => match engine.set_config(update) {
            Ok(()) => println!("{}", engine.snapshot()),
            Err(e) => println!("error: {e}"),
        },
        ConsoleCommand::Help => println!("{HELP}"),
        ConsoleCommand::Quit => {}
    }
}
