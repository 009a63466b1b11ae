//! Source file sets and language detection.
//!
//! Aliasing a module is only meaningful when every source of the target is
//! compiled by the same frontend, so targets carry enough information to
//! answer "is this set homogeneous in language X".

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Language of a single source file, detected from its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceLanguage {
    TypeScript,
    JavaScript,
    C,
    Cxx,
    Rust,
    Wasm,
    Other,
}

/// The source files of a target
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceSet {
    files: Vec<Utf8PathBuf>,
}

impl SourceLanguage {
    /// Detect the language of a path from its extension
    pub fn from_path(path: &Utf8Path) -> Self {
        match path.extension() {
            Some("ts" | "tsx" | "mts" | "cts") => SourceLanguage::TypeScript,
            Some("js" | "jsx" | "mjs" | "cjs") => SourceLanguage::JavaScript,
            Some("c" | "h") => SourceLanguage::C,
            Some("cc" | "cpp" | "cxx" | "hpp" | "hh") => SourceLanguage::Cxx,
            Some("rs") => SourceLanguage::Rust,
            Some("wasm") => SourceLanguage::Wasm,
            _ => SourceLanguage::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceLanguage::TypeScript => "typescript",
            SourceLanguage::JavaScript => "javascript",
            SourceLanguage::C => "c",
            SourceLanguage::Cxx => "cxx",
            SourceLanguage::Rust => "rust",
            SourceLanguage::Wasm => "wasm",
            SourceLanguage::Other => "other",
        }
    }
}

impl Default for SourceLanguage {
    fn default() -> Self {
        SourceLanguage::TypeScript
    }
}

impl fmt::Display for SourceLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "typescript" | "ts" => Ok(SourceLanguage::TypeScript),
            "javascript" | "js" => Ok(SourceLanguage::JavaScript),
            "c" => Ok(SourceLanguage::C),
            "cxx" | "c++" | "cpp" => Ok(SourceLanguage::Cxx),
            "rust" | "rs" => Ok(SourceLanguage::Rust),
            "wasm" => Ok(SourceLanguage::Wasm),
            other => Err(format!("unknown source language '{}'", other)),
        }
    }
}

impl SourceSet {
    pub fn new(files: Vec<Utf8PathBuf>) -> Self {
        Self { files }
    }

    pub fn files(&self) -> &[Utf8PathBuf] {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// True when every file is written in `language` (vacuously true when empty)
    pub fn is_homogeneous(&self, language: SourceLanguage) -> bool {
        self.files
            .iter()
            .all(|file| SourceLanguage::from_path(file) == language)
    }
}

impl<P: Into<Utf8PathBuf>> FromIterator<P> for SourceSet {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_detection() {
        assert_eq!(SourceLanguage::from_path(Utf8Path::new("src/a.ts")), SourceLanguage::TypeScript);
        assert_eq!(SourceLanguage::from_path(Utf8Path::new("src/a.mjs")), SourceLanguage::JavaScript);
        assert_eq!(SourceLanguage::from_path(Utf8Path::new("native/shim.c")), SourceLanguage::C);
        assert_eq!(SourceLanguage::from_path(Utf8Path::new("native/shim.hpp")), SourceLanguage::Cxx);
        assert_eq!(SourceLanguage::from_path(Utf8Path::new("README")), SourceLanguage::Other);
    }

    #[test]
    fn test_homogeneous_sources() {
        let pure: SourceSet = ["src/index.ts", "src/util.tsx"].into_iter().collect();
        assert!(pure.is_homogeneous(SourceLanguage::TypeScript));

        let mixed: SourceSet = ["src/index.ts", "native/shim.c"].into_iter().collect();
        assert!(!mixed.is_homogeneous(SourceLanguage::TypeScript));

        assert!(SourceSet::default().is_homogeneous(SourceLanguage::TypeScript));
    }

    #[test]
    fn test_language_from_str() {
        assert_eq!("TypeScript".parse::<SourceLanguage>().unwrap(), SourceLanguage::TypeScript);
        assert_eq!("c++".parse::<SourceLanguage>().unwrap(), SourceLanguage::Cxx);
        assert!("cobol".parse::<SourceLanguage>().is_err());
    }
}

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn known_language() -> impl Strategy<Value = SourceLanguage> {
        prop_oneof![
            Just(SourceLanguage::TypeScript),
            Just(SourceLanguage::JavaScript),
            Just(SourceLanguage::C),
            Just(SourceLanguage::Cxx),
            Just(SourceLanguage::Rust),
            Just(SourceLanguage::Wasm),
        ]
    }

    proptest! {
        #[test]
        fn known_languages_parse_from_their_name(language in known_language()) {
            prop_assert_eq!(language.as_str().parse::<SourceLanguage>(), Ok(language));
            prop_assert_eq!(language.as_str().to_uppercase().parse::<SourceLanguage>(), Ok(language));
        }

        #[test]
        fn typescript_sets_are_homogeneous(stems in prop::collection::vec("[a-z][a-z0-9_]{0,8}", 0..8)) {
            let sources: SourceSet = stems.iter().map(|stem| format!("src/{}.ts", stem)).collect();
            prop_assert!(sources.is_homogeneous(SourceLanguage::TypeScript));
            prop_assert_eq!(sources.is_homogeneous(SourceLanguage::JavaScript), sources.is_empty());
        }
    }
}
