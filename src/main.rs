use std::io::Write;

use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use oizys::{
    interpreter::Interpreter,
    lines::{opens_block, LineQueue},
};

#[derive(Debug, Parser)]
#[command(version, about = "Interpreter for the Oizys scripting language")]
struct Cli {
    /// Log to stderr; repeat for more detail
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn command(&self) -> &Command {
        self.command.as_ref().unwrap_or(&Command::Repl)
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a script file
    Run(RunArgs),
    /// Start an interactive session (the default)
    Repl,
}

#[derive(Debug, Args)]
struct RunArgs {
    file: String,
}

struct StderrLogger;

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{} {}] {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

fn main() {
    let args = Cli::parse();
    init_logging(args.verbose);

    match args.command() {
        Command::Repl => {
            repl_command();
        }
        Command::Run(args) => {
            run_command(args);
        }
    }
}

fn read_line(prompt: &str) -> Option<String> {
    let mut input = String::new();

    print!("{}", prompt);
    std::io::stdout()
        .flush()
        .expect("should be able to flush stdout");

    let read = std::io::stdin()
        .read_line(&mut input)
        .expect("should be able to read line from stdin");

    if read == 0 {
        None
    } else {
        Some(input.trim_end_matches(&['\r', '\n'][..]).to_string())
    }
}

/// Reads the rest of a block opened by the first line in `queue`. Returns the line read
/// after an `if` block to check for an `else:`, when it turned out not to be one.
fn read_continuation(queue: &mut LineQueue, is_if: bool) -> Option<String> {
    let mut depth = 1usize;
    loop {
        while depth > 0 {
            let line = read_line("... ")?;
            let trimmed = line.trim();
            if opens_block(trimmed) {
                depth += 1;
            } else if trimmed == "done" {
                depth -= 1;
            }
            queue.push_back(line);
        }

        if !is_if {
            return None;
        }

        let next = read_line("... ")?;
        if next.trim() != "else:" {
            return Some(next);
        }
        queue.push_back(next);
        depth = 1;
    }
}

fn repl_command() {
    println!("Welcome to the Oizys REPL!");
    println!("Type 'help' for help. 'exit' or EOF to quit. (Ctrl+D on *nix, Ctrl+Z on Windows)");
    println!("After an if block, enter 'else:' or an empty line.");

    let mut interpreter = Interpreter::default();
    let mut pending = None;

    loop {
        let Some(line) = pending.take().or_else(|| read_line("> ")) else {
            break;
        };

        let trimmed = line.trim().to_string();
        if trimmed == "exit" {
            break;
        }

        let mut queue = LineQueue::new();
        queue.push_back(line);
        if opens_block(&trimmed) {
            pending = read_continuation(&mut queue, trimmed.starts_with("if "));
        }

        if let Err(e) = interpreter.run(&mut queue) {
            println!("Error: {}", e.kind());
        }
    }
}

fn run_command(args: &RunArgs) {
    let source = match std::fs::read_to_string(&args.file) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Failed to read {}: {}", args.file, e);
            std::process::exit(1);
        }
    };

    let mut interpreter = Interpreter::default();
    if let Err(e) = interpreter.interpret(&source) {
        println!("{e}");
        std::process::exit(1);
    }
}
