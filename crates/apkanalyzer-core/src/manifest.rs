//! Extraction of well-known fields from a decoded `AndroidManifest.xml`.

use std::fmt;

use quick_xml::Reader;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;

use crate::ApkError;
use crate::Result;

/// API level assumed when `minSdkVersion` is not declared.
pub const DEFAULT_MIN_SDK: u32 = 1;

/// An SDK version as declared in `<uses-sdk>`.
///
/// Preview platforms are declared by codename instead of API level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SdkVersion {
    /// Numeric API level.
    Level(u32),
    /// Preview codename, e.g. `"VanillaIceCream"`.
    Codename(String),
}

impl SdkVersion {
    fn parse(value: &str) -> Self {
        value
            .trim()
            .parse()
            .map_or_else(|_| Self::Codename(value.to_string()), Self::Level)
    }
}

impl fmt::Display for SdkVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Level(level) => write!(f, "{level}"),
            Self::Codename(name) => f.write_str(name),
        }
    }
}

/// Fields read from `<manifest>`, `<uses-sdk>` and `<application>`.
///
/// Absent attributes stay `None`; callers choose the fallback.
///
/// # Examples
///
/// ```
/// use apkanalyzer_core::ManifestData;
/// use apkanalyzer_core::manifest::SdkVersion;
///
/// let xml = br#"<manifest xmlns:android="http://schemas.android.com/apk/res/android"
///     package="com.example" android:versionCode="7" android:versionName="1.0">
///     <uses-sdk android:minSdkVersion="21"/>
/// </manifest>"#;
///
/// let manifest = ManifestData::parse(xml).unwrap();
/// assert_eq!(manifest.package.as_deref(), Some("com.example"));
/// assert_eq!(manifest.min_sdk_version(), SdkVersion::Level(21));
/// assert_eq!(manifest.target_sdk_version(), SdkVersion::Level(21));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestData {
    /// `package` attribute of the root element.
    pub package: Option<String>,
    /// `android:versionCode`.
    pub version_code: Option<i64>,
    /// `android:versionName`.
    pub version_name: Option<String>,
    /// `android:minSdkVersion`.
    pub min_sdk: Option<SdkVersion>,
    /// `android:targetSdkVersion`.
    pub target_sdk: Option<SdkVersion>,
    /// `android:debuggable` on `<application>`.
    pub debuggable: Option<bool>,
}

impl ManifestData {
    /// Parses textual manifest XML.
    ///
    /// # Errors
    ///
    /// Returns [`ApkError::Manifest`] if the document is not well-formed,
    /// its root element is not `<manifest>`, or `versionCode` is not a number.
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut data = Self::default();
        let mut depth = 0usize;
        let mut seen_root = false;

        loop {
            let (element, opens) = match reader.read_event()? {
                Event::Start(e) => (e, true),
                Event::Empty(e) => (e, false),
                Event::End(_) => {
                    depth = depth.saturating_sub(1);
                    continue;
                }
                Event::Eof => break,
                _ => continue,
            };

            let local = element.local_name();
            match (depth, local.as_ref()) {
                (0, b"manifest") => {
                    seen_root = true;
                    data.read_manifest(&element)?;
                }
                (0, other) => {
                    return Err(ApkError::Manifest(format!(
                        "root element is <{}>, expected <manifest>",
                        String::from_utf8_lossy(other)
                    )));
                }
                (1, b"uses-sdk") => data.read_uses_sdk(&element)?,
                (1, b"application") => data.read_application(&element)?,
                _ => {}
            }

            if opens {
                depth += 1;
            }
        }

        if !seen_root {
            return Err(ApkError::Manifest(
                "missing <manifest> root element".to_string(),
            ));
        }
        Ok(data)
    }

    /// `minSdkVersion`, or API level 1 when undeclared.
    pub fn min_sdk_version(&self) -> SdkVersion {
        self.min_sdk
            .clone()
            .unwrap_or(SdkVersion::Level(DEFAULT_MIN_SDK))
    }

    /// `targetSdkVersion`, falling back to [`min_sdk_version`](Self::min_sdk_version).
    pub fn target_sdk_version(&self) -> SdkVersion {
        self.target_sdk
            .clone()
            .unwrap_or_else(|| self.min_sdk_version())
    }

    /// `android:debuggable`, `false` when undeclared.
    pub fn is_debuggable(&self) -> bool {
        self.debuggable.unwrap_or(false)
    }

    fn read_manifest(&mut self, element: &BytesStart<'_>) -> Result<()> {
        for (name, value) in attributes(element)? {
            match name.as_str() {
                "package" => self.package = Some(value),
                "versionCode" => {
                    let code = value.trim().parse().map_err(|_| {
                        ApkError::Manifest(format!("versionCode is not a number: {value}"))
                    })?;
                    self.version_code = Some(code);
                }
                "versionName" => self.version_name = Some(value),
                _ => {}
            }
        }
        Ok(())
    }

    fn read_uses_sdk(&mut self, element: &BytesStart<'_>) -> Result<()> {
        for (name, value) in attributes(element)? {
            match name.as_str() {
                "minSdkVersion" => self.min_sdk = Some(SdkVersion::parse(&value)),
                "targetSdkVersion" => self.target_sdk = Some(SdkVersion::parse(&value)),
                _ => {}
            }
        }
        Ok(())
    }

    fn read_application(&mut self, element: &BytesStart<'_>) -> Result<()> {
        for (name, value) in attributes(element)? {
            if name == "debuggable" {
                self.debuggable = Some(value.trim() == "true");
            }
        }
        Ok(())
    }
}

/// Attributes of `element` as (local name, unescaped value) pairs.
fn attributes(element: &BytesStart<'_>) -> Result<Vec<(String, String)>> {
    let mut out = Vec::new();
    for attr in element.attributes() {
        let attr = attr?;
        let key = attr.key.local_name();
        let name = String::from_utf8_lossy(key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        out.push((name, value));
    }
    Ok(out)
}
