//! Two-phase command dispatch.
//!
//! The first two command words pick a row of the action table; everything
//! after them is parsed by that action's own grammar. Anything short of a
//! unique `(subject, verb)` match prints a listing and fails.

use crate::cli::Cli;
use crate::commands::ACTIONS;
use crate::commands::Action;
use apkanalyzer_core::ApkAnalyzer;
use apkanalyzer_core::ArchiveManager;
use clap::error::ContextKind;
use clap::error::ContextValue;
use clap::error::ErrorKind;
use std::io;
use std::io::Write;
use tracing::debug;

/// Process exit status for success.
pub const SUCCESS: u8 = 0;
/// Process exit status for any failure.
pub const FAILURE: u8 = 1;

/// First lines of the global usage banner.
pub const BANNER_USAGE: &str =
    "Usage:\napkanalyzer [global options] <subject> <verb> [options] <apk> [<apk2>]\n";

const SEPARATOR: &str = "==============================";

/// Resolves and runs the command described by `cli`, returning the exit
/// status.
///
/// Command output goes to `out`, listings and diagnostics to `err`.
pub fn run(
    cli: &Cli,
    manager: &ArchiveManager,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> io::Result<u8> {
    if cli.help {
        write_catalogue(out)?;
        write_banner(out)?;
        return Ok(SUCCESS);
    }

    match cli.command_words() {
        [] => write_catalogue(err)?,
        [subject] => write_subject(subject, err)?,
        [subject, verb, rest @ ..] => {
            if let Some(action) = Action::find(subject, verb) {
                return execute(action, rest, manager, out, err);
            }
            debug!(%subject, %verb, "no such action");
            write_subject(subject, err)?;
        }
    }
    write_banner(err)?;
    Ok(FAILURE)
}

/// Reports a failure of the global option parse.
pub fn report_parse_error(
    error: &clap::Error,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> io::Result<u8> {
    if !error.use_stderr() {
        write!(out, "{error}")?;
        return Ok(SUCCESS);
    }
    writeln!(err)?;
    writeln!(err, "ERROR: {}", parse_error_message(error))?;
    write_banner(err)?;
    Ok(FAILURE)
}

fn execute(
    action: &Action,
    rest: &[String],
    manager: &ArchiveManager,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> io::Result<u8> {
    let args = match action.parse(rest) {
        Ok(args) => args,
        Err(e) if e.kind() == ErrorKind::DisplayHelp => {
            write!(out, "{}", action.help())?;
            return Ok(SUCCESS);
        }
        Err(e) => {
            write!(err, "{}", action.help())?;
            writeln!(err)?;
            writeln!(err, "ERROR: {}", parse_error_message(&e))?;
            write_banner(err)?;
            return Ok(FAILURE);
        }
    };

    let mut analyzer = ApkAnalyzer::new(manager, out);
    match action.execute(&args, &mut analyzer) {
        Ok(()) => Ok(SUCCESS),
        Err(e) => {
            writeln!(err)?;
            writeln!(err, "ERROR: {e:#}")?;
            Ok(FAILURE)
        }
    }
}

fn parse_error_message(error: &clap::Error) -> String {
    if error.kind() == ErrorKind::MissingRequiredArgument
        && let Some(ContextValue::Strings(missing)) = error.get(ContextKind::InvalidArg)
    {
        if missing.iter().any(|arg| arg == "<apk>") {
            return "You must specify an apk file.".to_string();
        }
        if !missing.is_empty() {
            return format!("Missing required argument(s): {}", missing.join(", "));
        }
    }
    let rendered = error.to_string();
    let first = rendered.lines().next().unwrap_or_default();
    first.strip_prefix("error: ").unwrap_or(first).to_string()
}

fn write_catalogue(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "Subject must be one of: {}", Action::subjects().join(", "))?;
    writeln!(w)?;
    let width = ACTIONS
        .iter()
        .map(|action| action.name().len())
        .max()
        .unwrap_or_default()
        + 2;
    for action in ACTIONS {
        writeln!(w, "{:<width$}{}", action.name(), action.description)?;
    }
    writeln!(w)
}

fn write_subject(subject: &str, w: &mut dyn Write) -> io::Result<()> {
    let actions = Action::for_subject(subject);
    if actions.is_empty() {
        return write_catalogue(w);
    }
    let verbs: Vec<&str> = actions.iter().map(|action| action.verb).collect();
    writeln!(w, "Verb must be one of: {}", verbs.join(", "))?;
    writeln!(w)?;
    for action in actions {
        writeln!(w, "{SEPARATOR}")?;
        writeln!(w, "{}:", action.name())?;
        writeln!(w, "{}", action.description)?;
        writeln!(w)?;
        write!(w, "{}", action.help())?;
        writeln!(w)?;
    }
    Ok(())
}

fn write_banner(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{BANNER_USAGE}")?;
    write!(w, "{}", Cli::global_options_help())
}
