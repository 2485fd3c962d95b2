//! `files` subject: raw archive contents.

use super::ActionArgs;
use super::Analyzer;
use crate::error::add_archive_context;
use anyhow::Result;

pub fn list(args: &ActionArgs, analyzer: &mut Analyzer<'_, '_>) -> Result<()> {
    add_archive_context(analyzer.files_list(&args.apk), &args.apk)
}

pub fn cat(args: &ActionArgs, analyzer: &mut Analyzer<'_, '_>) -> Result<()> {
    let file = args.file()?;
    add_archive_context(analyzer.files_cat(&args.apk, file), &args.apk)
}
