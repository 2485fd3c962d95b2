//! Global argument parsing using clap.
//!
//! Only global options are declared here. Everything from the first
//! non-option token on (subject, verb and the action's own arguments) is
//! captured verbatim and resolved by [`crate::dispatch`].

use clap::ArgAction;
use clap::CommandFactory;
use clap::Parser;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(name = "apkanalyzer")]
#[command(author, version, about, long_about = None)]
#[command(disable_help_flag = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Print the list of subjects and verbs
    #[arg(short, long)]
    pub help: bool,

    /// <subject> <verb> [options] <apk>
    #[arg(
        value_name = "ARGS",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub words: Vec<String>,
}

impl Cli {
    /// Log level selected by `-q` / `-v`.
    pub const fn log_level(&self) -> Level {
        if self.quiet {
            return Level::ERROR;
        }
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }

    /// Subject, verb and action arguments, with unrecognized leading flags
    /// skipped.
    pub fn command_words(&self) -> &[String] {
        let start = self
            .words
            .iter()
            .position(|word| !word.starts_with('-'))
            .unwrap_or(self.words.len());
        &self.words[start..]
    }

    /// Help text for the global options alone.
    pub fn global_options_help() -> String {
        Self::command()
            .help_template("Global options:\n{options}")
            .render_help()
            .to_string()
    }
}
