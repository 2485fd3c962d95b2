//! `manifest` subject: fields of the decoded `AndroidManifest.xml`.

use super::ActionArgs;
use super::Analyzer;
use crate::error::add_archive_context;
use anyhow::Result;

pub fn print(args: &ActionArgs, analyzer: &mut Analyzer<'_, '_>) -> Result<()> {
    add_archive_context(analyzer.manifest_print(&args.apk), &args.apk)
}

pub fn application_id(args: &ActionArgs, analyzer: &mut Analyzer<'_, '_>) -> Result<()> {
    add_archive_context(analyzer.manifest_app_id(&args.apk), &args.apk)
}

pub fn version_name(args: &ActionArgs, analyzer: &mut Analyzer<'_, '_>) -> Result<()> {
    add_archive_context(analyzer.manifest_version_name(&args.apk), &args.apk)
}

pub fn version_code(args: &ActionArgs, analyzer: &mut Analyzer<'_, '_>) -> Result<()> {
    add_archive_context(analyzer.manifest_version_code(&args.apk), &args.apk)
}

pub fn min_sdk(args: &ActionArgs, analyzer: &mut Analyzer<'_, '_>) -> Result<()> {
    add_archive_context(analyzer.manifest_min_sdk(&args.apk), &args.apk)
}

pub fn target_sdk(args: &ActionArgs, analyzer: &mut Analyzer<'_, '_>) -> Result<()> {
    add_archive_context(analyzer.manifest_target_sdk(&args.apk), &args.apk)
}

pub fn debuggable(args: &ActionArgs, analyzer: &mut Analyzer<'_, '_>) -> Result<()> {
    add_archive_context(analyzer.manifest_debuggable(&args.apk), &args.apk)
}
