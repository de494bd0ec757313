use std::{fs, io};

use anyhow::Context;
use clap::{crate_version, App, Arg};
use kaleidoscope::{
    codegen::SourceGenerator,
    driver::{Driver, Summary, DEFAULT_PROMPT},
    eval::Evaluator,
    lexer::{Lexer, ReadChars, ReadError},
};
use log::info;

type Source = Box<dyn Iterator<Item = char>>;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let matches = App::new("kaleidoscope")
        .version(crate_version!())
        .about("read-parse loop for the kaleidoscope language")
        .arg(
            Arg::with_name("FILE")
                .help("source file to read instead of stdin")
                .index(1),
        )
        .arg(
            Arg::with_name("emit")
                .long("emit")
                .takes_value(true)
                .possible_values(&["eval", "source"])
                .default_value("eval")
                .help("what to produce for each parsed unit"),
        )
        .arg(
            Arg::with_name("no-prompt")
                .long("no-prompt")
                .help("don't write a prompt before each unit"),
        )
        .get_matches();

    let mut read_error: Option<ReadError> = None;
    let source: Source = match matches.value_of("FILE") {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read source file {}", path))?;
            Box::new(text.chars().collect::<Vec<_>>().into_iter())
        }
        None => {
            let chars = ReadChars::new(io::BufReader::new(io::stdin()));
            read_error = Some(chars.error());
            Box::new(chars)
        }
    };
    let lexer = Lexer::new(source);
    let prompt = if matches.is_present("no-prompt") {
        None
    } else {
        Some(DEFAULT_PROMPT)
    };

    let summary: Summary = match matches.value_of("emit") {
        Some("source") => {
            Driver::new(lexer, SourceGenerator::default(), io::stderr(), io::stdout())
                .with_prompt(prompt)
                .run()
        }
        _ => Driver::new(lexer, Evaluator::new(), io::stderr(), io::stdout())
            .with_prompt(prompt)
            .run(),
    }
    .context("failed to write session output")?;

    if let Some(err) = read_error.as_ref().and_then(|slot| slot.borrow_mut().take()) {
        return Err(err).context("failed to read stdin");
    }

    info!(
        "{} units, {} parse failures, {} generation failures",
        summary.units, summary.parse_failures, summary.generate_failures
    );

    Ok(())
}
