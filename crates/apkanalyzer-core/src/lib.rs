//! Archive inspection library for Android application packages.
//!
//! `apkanalyzer-core` mounts APKs and other zip-compatible containers as
//! read-only trees, caches open archives per canonical path, decodes
//! Android binary XML and extracts the well-known manifest fields.
//!
//! # Examples
//!
//! ```no_run
//! use apkanalyzer_core::ApkAnalyzer;
//! use apkanalyzer_core::ArchiveManager;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut manager = ArchiveManager::new();
//! ApkAnalyzer::new(&manager, std::io::stdout()).apk_summary(Path::new("app.apk"))?;
//! let report = manager.close();
//! println!("Closed {} archives", report.archives_closed);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod analyzer;
pub mod archive;
pub mod config;
pub mod error;
pub mod manager;
pub mod manifest;
pub mod xml;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export main API types
pub use analyzer::ApkAnalyzer;
pub use archive::Archive;
pub use archive::ArchiveKind;
pub use archive::EntryPath;
pub use config::ManagerConfig;
pub use error::ApkError;
pub use error::Result;
pub use manager::ArchiveContext;
pub use manager::ArchiveManager;
pub use manager::CloseReport;
pub use manifest::ManifestData;
pub use xml::decode_xml;
