//! `resources` subject.

use super::ActionArgs;
use super::Analyzer;
use crate::error::add_archive_context;
use anyhow::Result;

/// `resources xml --file <path>`: decodes one compiled XML resource.
pub fn xml(args: &ActionArgs, analyzer: &mut Analyzer<'_, '_>) -> Result<()> {
    let file = args.file()?;
    add_archive_context(analyzer.res_xml(&args.apk, file), &args.apk)
}
