//! Command-line tool that parses OSQL commands and dumps their syntax tree.

mod logger;

use clap::{Parser as _, ValueEnum};
use log::{debug, error};
use osql_syntax::source::SourceFile;
use osql_syntax::Parser;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
enum Format {
    /// Rust debug representation.
    Debug,

    /// Rusty Object Notation.
    Ron,

    /// Canonical command text.
    Text,
}

#[derive(Debug, clap::Parser)]
#[command(name = "osql", version, about = "Parse an OSQL command and dump its syntax tree")]
struct Options {
    /// File to read the command from. Reads from stdin when omitted.
    file: Option<PathBuf>,

    /// Parse a single expression instead of a command.
    #[arg(short, long)]
    expression: bool,

    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Debug)]
    format: Format,

    /// Maximum expression nesting depth.
    #[arg(long)]
    max_depth: Option<usize>,

    /// Increase logging verbosity. Can be given more than once.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let options = Options::parse();

    if logger::init(logger::level_from_verbosity(options.verbose)).is_err() {
        eprintln!("warn: logger already initialized");
    }

    process::exit(run(&options));
}

fn run(options: &Options) -> i32 {
    let file = match read_source(options.file.as_ref()) {
        Ok(file) => file,
        Err(e) => {
            error!("cannot read input: {}", e);
            return exitcode::NOINPUT;
        },
    };

    let mut parser = Parser::new();
    if let Some(max_depth) = options.max_depth {
        parser = parser.max_depth(max_depth);
    }

    debug!("parsing {} as {}", file.name(), if options.expression { "expression" } else { "command" });

    let output = if options.expression {
        parser.parse_expression(file).map(|value| render(&value, options.format))
    } else {
        parser.parse(file).map(|command| render(&command, options.format))
    };

    match output {
        Ok(Ok(text)) => {
            println!("{}", text);
            exitcode::OK
        },
        Ok(Err(e)) => {
            error!("cannot serialize syntax tree: {}", e);
            exitcode::SOFTWARE
        },
        Err(e) => {
            eprintln!("{}", e);
            exitcode::DATAERR
        },
    }
}

fn read_source(path: Option<&PathBuf>) -> io::Result<SourceFile> {
    match path {
        Some(path) => SourceFile::open(path),
        None => {
            let mut source = String::new();
            io::stdin().read_to_string(&mut source)?;

            Ok(SourceFile::named("<stdin>", source))
        },
    }
}

fn render<T>(value: &T, format: Format) -> Result<String, ron::Error>
where
    T: std::fmt::Debug + std::fmt::Display + serde::Serialize,
{
    match format {
        Format::Debug => Ok(format!("{:#?}", value)),
        Format::Ron => ron::ser::to_string_pretty(value, ron::ser::PrettyConfig::default()),
        Format::Text => Ok(value.to_string()),
    }
}
