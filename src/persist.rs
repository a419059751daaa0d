//! Rule-set persistence: a versioned JSON document.
//!
//! The on-disk form is `{ "version": 1, "settings": …, "rules": […] }`.
//! Settings travel with the rules because they are part of what produced
//! them (and generation needs the same seed and budgets to reproduce a
//! run). Loading validates the version and every rule's structural
//! validity before anything is handed back, so a failed load never leaves
//! partial state with the caller.
//!
//! JSON rather than a binary format: a rule file is a user-inspectable
//! grammar asset, not a cache.

use crate::grammar::GrammarSettings;
use crate::rule::DPORule;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Current rule-file schema version.
pub const RULE_FILE_VERSION: u32 = 1;

/// The on-disk document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSetFile {
    pub version: u32,
    pub settings: GrammarSettings,
    pub rules: Vec<DPORule>,
}

/// Error loading or saving a rule file.
#[derive(Debug)]
pub enum PersistError {
    Io(std::io::Error),
    Json(serde_json::Error),
    /// The file declares a schema version this build does not read.
    UnsupportedVersion(u32),
    /// A rule failed its structural validity check (index into the file's
    /// rule list).
    InvalidRule(usize),
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistError::Io(e) => write!(f, "io error: {}", e),
            PersistError::Json(e) => write!(f, "malformed rule file: {}", e),
            PersistError::UnsupportedVersion(v) => {
                write!(f, "unsupported rule file version {}", v)
            }
            PersistError::InvalidRule(i) => write!(f, "rule {} in file is invalid", i),
        }
    }
}

impl std::error::Error for PersistError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PersistError::Io(e) => Some(e),
            PersistError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PersistError {
    fn from(e: std::io::Error) -> Self {
        PersistError::Io(e)
    }
}

impl From<serde_json::Error> for PersistError {
    fn from(e: serde_json::Error) -> Self {
        PersistError::Json(e)
    }
}

/// Writes `rules` and `settings` to `path` as pretty-printed JSON.
pub fn save_rules(
    path: &Path,
    settings: &GrammarSettings,
    rules: &[DPORule],
) -> Result<(), PersistError> {
    let doc = RuleSetFile {
        version: RULE_FILE_VERSION,
        settings: settings.clone(),
        rules: rules.to_vec(),
    };
    let file = File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), &doc)?;
    Ok(())
}

/// Reads and validates a rule file.
pub fn load_rules(path: &Path) -> Result<RuleSetFile, PersistError> {
    let file = File::open(path)?;
    let doc: RuleSetFile = serde_json::from_reader(BufReader::new(file))?;
    if doc.version != RULE_FILE_VERSION {
        return Err(PersistError::UnsupportedVersion(doc.version));
    }
    for (i, rule) in doc.rules.iter().enumerate() {
        if !rule.is_valid() {
            return Err(PersistError::InvalidRule(i));
        }
    }
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::MerrellGraph;
    use crate::morphism::GraphMorphism;
    use crate::rule::RuleKind;
    use glam::Vec2;

    fn tmp(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("tessella_{}_{}.json", name, std::process::id()))
    }

    fn starter_rule() -> DPORule {
        let mut lhs = MerrellGraph::new();
        lhs.add_vertex(Vec2::ZERO);
        DPORule {
            id: 0,
            name: "starter_x".into(),
            kind: RuleKind::Starter,
            lhs,
            rhs: MerrellGraph::new(),
            interface: MerrellGraph::new(),
            phi_l: GraphMorphism::new(),
            phi_r: GraphMorphism::new(),
            boundary_l: Default::default(),
            boundary_r: Default::default(),
            extracted_at_generation: 0,
            is_starter_rule: true,
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let path = tmp("roundtrip");
        let settings = GrammarSettings::default();
        let rules = vec![starter_rule()];
        save_rules(&path, &settings, &rules).unwrap();

        let doc = load_rules(&path).unwrap();
        assert_eq!(doc.version, RULE_FILE_VERSION);
        assert_eq!(doc.settings, settings);
        assert_eq!(doc.rules, rules);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn version_mismatch_is_rejected() {
        let path = tmp("version");
        let mut doc = RuleSetFile {
            version: RULE_FILE_VERSION,
            settings: GrammarSettings::default(),
            rules: vec![],
        };
        doc.version = 99;
        std::fs::write(&path, serde_json::to_string(&doc).unwrap()).unwrap();

        match load_rules(&path) {
            Err(PersistError::UnsupportedVersion(99)) => {}
            other => panic!("expected version error, got {:?}", other.map(|_| ())),
        }
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn invalid_rules_are_rejected_by_index() {
        let path = tmp("invalid");
        let mut bad = starter_rule();
        bad.lhs = MerrellGraph::new(); // empty L is invalid
        let doc = RuleSetFile {
            version: RULE_FILE_VERSION,
            settings: GrammarSettings::default(),
            rules: vec![starter_rule(), bad],
        };
        std::fs::write(&path, serde_json::to_string(&doc).unwrap()).unwrap();

        match load_rules(&path) {
            Err(PersistError::InvalidRule(1)) => {}
            other => panic!("expected invalid-rule error, got {:?}", other.map(|_| ())),
        }
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn malformed_json_is_an_error() {
        let path = tmp("malformed");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_rules(&path), Err(PersistError::Json(_))));
        std::fs::remove_file(&path).ok();
    }
}
