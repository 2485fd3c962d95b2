//! `apk` subject.

use super::ActionArgs;
use super::Analyzer;
use crate::error::add_archive_context;
use anyhow::Result;

/// `apk summary`
pub fn summary(args: &ActionArgs, analyzer: &mut Analyzer<'_, '_>) -> Result<()> {
    add_archive_context(analyzer.apk_summary(&args.apk), &args.apk)
}
