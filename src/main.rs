//! Tsar CLI - write Python with dialect keywords, run it in a sandbox

use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use clap::Parser;
use tsar::cli::{Args, Backend, EchoSink, SubCommand};
use tsar::sandbox::{
    CancelToken, DockerBoundary, ExecutionRequest, Executor, HostBoundary, IsolationBoundary,
    NullSink,
};
use tsar::{format_report, format_words, KeywordMap, OutputFormat, Report, Translator};

fn main() {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Err(e) = run(args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn run(args: Args) -> anyhow::Result<()> {
    let format = if args.json { OutputFormat::Json } else { OutputFormat::Human };

    let keywords = KeywordMap::load_or_builtin(&args.dictionary)?;
    let self_referential = keywords.self_referential();
    if !self_referential.is_empty() {
        log::warn!(
            "Replacements that are themselves keywords (translation is not idempotent): {}",
            self_referential.join(", ")
        );
    }
    let translator = Translator::new(keywords);

    match args.command {
        SubCommand::Run { ref code } => execute(&args, &translator, code.clone(), &format),

        SubCommand::File { ref path } => {
            let code = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            execute(&args, &translator, code, &format)
        }

        SubCommand::Translate { ref input } => {
            // A .tsar path is read, anything else is treated as code
            let path = Path::new(input);
            let source = if path.is_file() && path.extension().is_some_and(|e| e == "tsar") {
                fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?
            } else {
                input.clone()
            };
            let translated = translator.translate(&source);
            let report = Report {
                source,
                translated,
                result: None,
            };
            println!("{}", format_report(&report, &format));
            Ok(())
        }

        SubCommand::Words => {
            println!("{}", format_words(translator.keywords(), &format));
            Ok(())
        }
    }
}

fn execute(
    args: &Args,
    translator: &Translator,
    source: String,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    let translated = translator.translate(&source);

    let stdin = match args.stdin {
        Some(ref path) => Some(
            fs::read_to_string(path)
                .with_context(|| format!("Failed to read stdin file {}", path.display()))?,
        ),
        None => None,
    };

    let boundary: Box<dyn IsolationBoundary> = match args.backend {
        Backend::Docker => Box::new(DockerBoundary::new().with_image(&args.image)),
        Backend::Host => Box::new(HostBoundary::new(&args.interpreter).with_args(["-u"])),
    };
    boundary.probe()?;
    log::debug!("{} boundary ready", boundary.name());

    let cancel = CancelToken::new();
    let trigger = cancel.clone();
    ctrlc::set_handler(move || trigger.cancel()).context("Failed to set Ctrl+C handler")?;

    let mut request = ExecutionRequest::new(translated.clone())
        .with_timeout(args.timeout)
        .with_limits(args.limits());
    if let Some(data) = stdin {
        request = request.with_stdin(data);
    }

    let executor = Executor::new(boundary);
    let result = if args.verbose {
        executor.run_with(&request, &mut EchoSink, &cancel)
    } else {
        executor.run_with(&request, &mut NullSink, &cancel)
    };

    let infrastructure_error = result
        .status
        .is_infrastructure_failure()
        .then(|| result.error.clone().unwrap_or_default());

    let report = Report {
        source,
        translated,
        result: Some(result),
    };
    println!("{}", format_report(&report, format));

    if let Some(error) = infrastructure_error {
        bail!("{}", error);
    }
    Ok(())
}
