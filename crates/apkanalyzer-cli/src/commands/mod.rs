//! Action table.
//!
//! Every `(subject, verb)` pair the CLI understands is one row of
//! [`ACTIONS`]. A row carries its grammar (extra flags on top of the
//! trailing `<apk>` argument) and the handler invoked once that grammar
//! has been satisfied.

pub mod apk;
pub mod files;
pub mod manifest;
pub mod resources;

use anyhow::Result;
use apkanalyzer_core::ApkAnalyzer;
use clap::Arg;
use clap::ArgMatches;
use clap::Command;
use clap::value_parser;
use std::io::Write;
use std::path::PathBuf;

/// Analyzer writing to whatever stream the dispatcher was given.
pub type Analyzer<'m, 'o> = ApkAnalyzer<'m, &'o mut dyn Write>;

/// Handler invoked with validated arguments.
pub type Handler = fn(&ActionArgs, &mut Analyzer<'_, '_>) -> Result<()>;

const APK_ARG: &str = "apk";

/// A value-taking flag in an action's grammar.
#[derive(Debug)]
pub struct Flag {
    pub name: &'static str,
    pub value_name: &'static str,
    pub help: &'static str,
}

/// `--file <path>`, required by actions that address a single entry.
pub const FILE_FLAG: Flag = Flag {
    name: "file",
    value_name: "path",
    help: "Path inside the archive",
};

/// One row of the action table.
#[derive(Debug)]
pub struct Action {
    pub subject: &'static str,
    pub verb: &'static str,
    pub description: &'static str,
    pub flags: &'static [Flag],
    pub handler: Handler,
}

/// Arguments produced by a successful action parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionArgs {
    pub apk: PathBuf,
    pub file: Option<String>,
}

impl ActionArgs {
    /// Value of `--file`, which the grammar has already made mandatory for
    /// the actions that read it.
    pub fn file(&self) -> Result<&str> {
        self.file
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("Missing required argument: --file"))
    }
}

pub static ACTIONS: &[Action] = &[
    Action {
        subject: "apk",
        verb: "summary",
        description: "Prints the application Id, version code and version name.",
        flags: &[],
        handler: apk::summary,
    },
    Action {
        subject: "manifest",
        verb: "print",
        description: "Prints the manifest in XML format",
        flags: &[],
        handler: manifest::print,
    },
    Action {
        subject: "manifest",
        verb: "application-id",
        description: "Prints the application id.",
        flags: &[],
        handler: manifest::application_id,
    },
    Action {
        subject: "manifest",
        verb: "version-name",
        description: "Prints the version name.",
        flags: &[],
        handler: manifest::version_name,
    },
    Action {
        subject: "manifest",
        verb: "version-code",
        description: "Prints the version code.",
        flags: &[],
        handler: manifest::version_code,
    },
    Action {
        subject: "manifest",
        verb: "min-sdk",
        description: "Prints the minimum sdk.",
        flags: &[],
        handler: manifest::min_sdk,
    },
    Action {
        subject: "manifest",
        verb: "target-sdk",
        description: "Prints the target sdk",
        flags: &[],
        handler: manifest::target_sdk,
    },
    Action {
        subject: "manifest",
        verb: "debuggable",
        description: "Prints if the app is debuggable",
        flags: &[],
        handler: manifest::debuggable,
    },
    Action {
        subject: "resources",
        verb: "xml",
        description: "Prints the human readable form of a binary XML",
        flags: &[FILE_FLAG],
        handler: resources::xml,
    },
    Action {
        subject: "files",
        verb: "list",
        description: "Lists all files in the archive",
        flags: &[],
        handler: files::list,
    },
    Action {
        subject: "files",
        verb: "cat",
        description: "Prints the given file contents to stdout",
        flags: &[FILE_FLAG],
        handler: files::cat,
    },
];

impl Action {
    /// Exact, case-sensitive lookup.
    pub fn find(subject: &str, verb: &str) -> Option<&'static Self> {
        ACTIONS
            .iter()
            .find(|action| action.subject == subject && action.verb == verb)
    }

    /// All actions of one subject, in table order.
    pub fn for_subject(subject: &str) -> Vec<&'static Self> {
        ACTIONS
            .iter()
            .filter(|action| action.subject == subject)
            .collect()
    }

    /// Distinct subjects, in table order.
    pub fn subjects() -> Vec<&'static str> {
        let mut subjects: Vec<&'static str> = Vec::new();
        for action in ACTIONS {
            if !subjects.contains(&action.subject) {
                subjects.push(action.subject);
            }
        }
        subjects
    }

    /// `"<subject> <verb>"`.
    pub fn name(&self) -> String {
        format!("{} {}", self.subject, self.verb)
    }

    /// Grammar of this action as a clap command parsing the tokens after
    /// the verb.
    pub fn command(&self) -> Command {
        let mut usage = format!("apkanalyzer {} {}", self.subject, self.verb);
        for flag in self.flags {
            usage.push_str(&format!(" --{} <{}>", flag.name, flag.value_name));
        }
        usage.push_str(" <apk>");

        let mut command = Command::new(self.verb)
            .no_binary_name(true)
            .override_usage(usage)
            .help_template("Usage: {usage}\n\n{all-args}");
        for flag in self.flags {
            command = command.arg(
                Arg::new(flag.name)
                    .long(flag.name)
                    .value_name(flag.value_name)
                    .help(flag.help)
                    .required(true),
            );
        }
        command.arg(
            Arg::new(APK_ARG)
                .value_name(APK_ARG)
                .help("Path to the APK or zip file")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
    }

    /// Rendered help for this action's grammar.
    pub fn help(&self) -> String {
        let mut help = self.command().render_help().to_string();
        if !help.ends_with('\n') {
            help.push('\n');
        }
        help
    }

    /// Parses the tokens after the verb.
    pub fn parse(&self, rest: &[String]) -> Result<ActionArgs, clap::Error> {
        let matches = self.command().try_get_matches_from(rest)?;
        Ok(Self::args_from(&matches))
    }

    fn args_from(matches: &ArgMatches) -> ActionArgs {
        let apk = matches
            .get_one::<PathBuf>(APK_ARG)
            .cloned()
            .unwrap_or_default();
        let file = matches
            .try_get_one::<String>(FILE_FLAG.name)
            .ok()
            .flatten()
            .cloned();
        ActionArgs { apk, file }
    }

    /// Runs the handler.
    pub fn execute(&self, args: &ActionArgs, analyzer: &mut Analyzer<'_, '_>) -> Result<()> {
        tracing::debug!(action = %self.name(), apk = %args.apk.display(), "executing action");
        (self.handler)(args, analyzer)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn words(args: &[&str]) -> Vec<String> {
        args.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_actions_unique() {
        for (i, a) in ACTIONS.iter().enumerate() {
            for b in &ACTIONS[i + 1..] {
                assert!(
                    a.subject != b.subject || a.verb != b.verb,
                    "duplicate {}",
                    a.name()
                );
            }
        }
    }

    #[test]
    fn test_grammars_valid() {
        for action in ACTIONS {
            action.command().debug_assert();
        }
    }

    #[test]
    fn test_find_exact_only() {
        assert_eq!(Action::find("manifest", "print").unwrap().verb, "print");
        assert!(Action::find("manifest", "Print").is_none());
        assert!(Action::find("manifest", "pri").is_none());
        assert!(Action::find("Manifest", "print").is_none());
    }

    #[test]
    fn test_subjects_in_table_order() {
        assert_eq!(
            Action::subjects(),
            ["apk", "manifest", "resources", "files"]
        );
        assert_eq!(Action::for_subject("manifest").len(), 7);
        assert!(Action::for_subject("nope").is_empty());
    }

    #[test]
    fn test_parse_apk_only() {
        let action = Action::find("apk", "summary").unwrap();
        let args = action.parse(&words(&["app.apk"])).unwrap();
        assert_eq!(args.apk, PathBuf::from("app.apk"));
        assert_eq!(args.file, None);
    }

    #[test]
    fn test_parse_file_flag() {
        let action = Action::find("files", "cat").unwrap();
        let args = action
            .parse(&words(&["--file", "assets/readme.txt", "app.apk"]))
            .unwrap();
        assert_eq!(args.file().unwrap(), "assets/readme.txt");
        assert_eq!(args.apk, PathBuf::from("app.apk"));
    }

    #[test]
    fn test_parse_missing_apk() {
        let action = Action::find("manifest", "print").unwrap();
        let err = action.parse(&[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_parse_missing_file_flag() {
        let action = Action::find("resources", "xml").unwrap();
        let err = action.parse(&words(&["app.apk"])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_parse_rejects_extra_flag() {
        let action = Action::find("apk", "summary").unwrap();
        let err = action
            .parse(&words(&["--file", "x", "app.apk"]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_help_mentions_usage() {
        let help = Action::find("resources", "xml").unwrap().help();
        assert!(help.contains("apkanalyzer resources xml --file <path> <apk>"));
        assert!(help.contains("--file"));
    }
}
