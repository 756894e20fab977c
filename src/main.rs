use clap::{Arg, ArgAction, Command};
use owo_colors::OwoColorize;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use tracing::{debug, Level};

use structogram::error::SourceError;
use structogram::execution;
use structogram::language::{Function, Node};
use structogram::output;
use structogram::parsing;
use structogram::rendering;

fn main() {
    const VERSION: &str = concat!("v", env!("CARGO_PKG_VERSION"));

    let matches = Command::new("structogram")
        .version(VERSION)
        .propagate_version(true)
        .about("Draw struktex structograms from Python functions.")
        .disable_help_subcommand(true)
        .arg(
            Arg::new("debug")
                .long("debug")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Enable debug logging on standard error."),
        )
        .subcommand(
            Command::new("render")
                .about("Write the structogram of a function to a .tex file")
                .arg(
                    Arg::new("function")
                        .short('f')
                        .long("function")
                        .help("Name of the function to draw. Defaults to the first function in the file."),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help("File to write. Names not ending in .tex are replaced by structogram_NAME.tex"),
                )
                .arg(
                    Arg::new("no-dry-run")
                        .long("no-dry-run")
                        .action(ArgAction::SetTrue)
                        .help("Do not execute the function to record what it prints."),
                )
                .arg(
                    Arg::new("input")
                        .short('i')
                        .long("input")
                        .help("File supplying the lines read by input() during the dry run. Defaults to standard input."),
                )
                .arg(
                    Arg::new("quiet")
                        .short('q')
                        .long("quiet")
                        .action(ArgAction::SetTrue)
                        .help("Do not echo the markup and captured output."),
                )
                .arg(
                    Arg::new("filename")
                        .required(true)
                        .help("The Python file containing the function to draw."),
                ),
        )
        .subcommand(
            Command::new("check")
                .about("Parse the given file and report anything that would not be drawn")
                .arg(
                    Arg::new("filename")
                        .required(true)
                        .help("The Python file to check."),
                ),
        )
        .get_matches();

    let level = if matches.get_flag("debug") {
        Level::DEBUG
    } else {
        Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match matches.subcommand() {
        Some(("render", submatches)) => {
            let filename = submatches
                .get_one::<String>("filename")
                .map(PathBuf::from)
                .unwrap_or_default();
            let options = Options {
                function: submatches
                    .get_one::<String>("function")
                    .cloned(),
                output: submatches
                    .get_one::<String>("output")
                    .map(PathBuf::from),
                dry_run: !submatches.get_flag("no-dry-run"),
                input: submatches
                    .get_one::<String>("input")
                    .map(PathBuf::from),
                quiet: submatches.get_flag("quiet"),
            };
            render(&filename, &options);
        }
        Some(("check", submatches)) => {
            let filename = submatches
                .get_one::<String>("filename")
                .map(PathBuf::from)
                .unwrap_or_default();
            check(&filename);
        }
        Some(_) => {
            println!("No valid subcommand was used")
        }
        None => {
            println!("usage: structogram [COMMAND] ...");
            println!("Try '--help' for more information.");
        }
    }
}

struct Options {
    function: Option<String>,
    output: Option<PathBuf>,
    dry_run: bool,
    input: Option<PathBuf>,
    quiet: bool,
}

fn fail(message: &str) -> ! {
    eprintln!("{}: {}", "error".bright_red(), message);
    std::process::exit(1);
}

fn load(filename: &Path) -> String {
    match parsing::load(filename) {
        Ok(content) => content,
        Err(error) => fail(&error.to_string()),
    }
}

fn choose<'a, 'i>(
    module: &'a structogram::language::Module<'i>,
    name: Option<&str>,
) -> &'a Function<'i> {
    let found = match name {
        Some(name) => module.function(name),
        None => module
            .functions()
            .next(),
    };

    match (found, name) {
        (Some(function), _) => function,
        (None, Some(name)) => fail(&format!("no function named '{}'", name)),
        (None, None) => fail("no function definitions found"),
    }
}

fn render(filename: &Path, options: &Options) {
    let content = load(filename);

    let module = match parsing::parse(&content) {
        Ok(module) => module,
        Err(error) => {
            let error = SourceError::from_parsing(&error, filename, &content);
            eprintln!("{}", error.full_details());
            std::process::exit(1);
        }
    };

    let function = choose(&module, options.function.as_deref());
    let name = function.name.0;

    let fragment = match rendering::structogram(Node::Function(function), &content) {
        Ok(fragment) => fragment,
        Err(error) => fail(&error.to_string()),
    };

    for problem in &fragment.problems {
        let error = SourceError::from_problem(problem, filename, &content);
        eprintln!("{}", error.full_details());
    }

    let capture = if options.dry_run {
        let mut reader: Box<dyn BufRead> = match &options.input {
            Some(path) => match std::fs::File::open(path) {
                Ok(file) => Box::new(std::io::BufReader::new(file)),
                Err(error) => fail(&format!("{}: {}", path.display(), error)),
            },
            None => Box::new(
                std::io::stdin()
                    .lock(),
            ),
        };

        match execution::capture(function, &mut reader) {
            Ok(lines) => Some(lines),
            Err(error) => {
                let error = SourceError::from_execution(&error, filename, &content);
                eprintln!("{}", error.full_details());
                std::process::exit(1);
            }
        }
    } else {
        debug!("Dry run disabled");
        None
    };

    let source = function
        .span
        .text(&content);

    let document = match output::document(name, source, &fragment.markup, capture.as_deref()) {
        Ok(document) => document,
        Err(error) => fail(&error.to_string()),
    };

    let target = output::target_filename(
        options
            .output
            .as_deref(),
        name,
    );
    if let Err(error) = output::write(&target, &document) {
        fail(&format!("{}: {}", target.display(), error));
    }

    if !options.quiet {
        print!(
            "{}",
            output::summary(name, &fragment.markup, capture.as_deref())
        );
    }
}

fn check(filename: &Path) {
    let content = load(filename);

    let module = match parsing::parse(&content) {
        Ok(module) => module,
        Err(error) => {
            let error = SourceError::from_parsing(&error, filename, &content);
            eprintln!("{}", error);
            std::process::exit(1);
        }
    };

    let mut count = 0;
    for function in module.functions() {
        match rendering::structogram(Node::Function(function), &content) {
            Ok(fragment) => {
                for problem in &fragment.problems {
                    let error = SourceError::from_problem(problem, filename, &content);
                    eprintln!("{}", error);
                    count += 1;
                }
            }
            Err(error) => fail(&error.to_string()),
        }
    }

    if count > 0 {
        std::process::exit(1);
    }
}
