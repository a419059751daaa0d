//! Top-level grammar controller: the three-phase pipeline.
//!
//! Usage sequence:
//!
//! ```text
//! let mut g = MerrellGrammar::new();
//! g.load_from_tiles(&socket_defs, &tiles)?;   // disassembly
//! g.extract_grammar(None)?;                   // hierarchy + Algorithm 1
//! g.generate(None)?;                          // Algorithm 3
//! ```
//!
//! Every phase is a synchronous batch computation on the calling thread.
//! The optional progress callback is invoked at coarse checkpoints (once
//! per hierarchy generation, once per generation iteration), purely for UI
//! responsiveness; it must not mutate grammar state and is never required
//! for correctness. `begin_generate` + `step_generate` expose the same
//! generation loop one unit of work at a time for animated callers;
//! cancellation is ceasing to call `step_generate`.
//!
//! Error taxonomy: configuration errors (empty vocabulary, phases called
//! out of order) surface as an `Err` and a `last_error` string with no
//! partial state; structural impossibilities during search are skipped,
//! never fatal; generation exhaustion is a named failure inside the result
//! object.
//!
//! The controller owns the primitives, hierarchy, rule list and result;
//! accessors hand out shared references only, so no caller can hold an
//! element handle that dangles after a later phase.
//!
//! # Citations
//! - Merrell, "Example-Based Procedural Modeling Using Graph Grammars",
//!   ACM Trans. Graph. 42(4) (2023)

use crate::extract::extract_rules;
use crate::generate::{GenerateError, GenerationDriver, GenerationResult};
use crate::graph::MerrellGraph;
use crate::hierarchy::{build_hierarchy, HierarchyNode};
use crate::persist;
use crate::rule::DPORule;
use crate::tiles::{tile_primitive, TileInput, TileSocketDef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::info;

/// Progress callback: `(current, total)`, called zero or more times,
/// synchronously, on the calling thread. No ordering or cancellation
/// guarantees beyond that.
pub type ProgressFn<'a> = Option<&'a mut dyn FnMut(usize, usize)>;

fn reborrow<'a>(p: &'a mut ProgressFn<'_>) -> ProgressFn<'a> {
    match p {
        Some(cb) => Some(&mut **cb),
        None => None,
    }
}

/// Bounds for the pipeline. Each setting caps exactly one loop and has no
/// other side effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrammarSettings {
    /// Seed for generation's random choices.
    pub seed: u64,
    /// Iteration budget for one generation run.
    pub max_iterations: usize,
    /// Lower edge-length bound for position solving (external step).
    pub min_edge_length: f32,
    /// Upper edge-length bound for position solving (external step).
    pub max_edge_length: f32,
    /// Deepest hierarchy generation to build.
    pub max_hierarchy_gen: u32,
    /// Safety cap on new hierarchy nodes per generation.
    pub max_rules: usize,
}

impl Default for GrammarSettings {
    fn default() -> Self {
        Self {
            seed: 42,
            max_iterations: 4000,
            min_edge_length: 0.5,
            max_edge_length: 2.0,
            max_hierarchy_gen: 6,
            max_rules: 200,
        }
    }
}

/// Configuration-class errors from the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarError {
    /// `load_from_tiles` was given an empty vocabulary.
    NoTileVocabulary,
    /// `extract_grammar` called before `load_from_tiles`.
    NoPrimitives,
    /// `generate` called before `extract_grammar`.
    NoRules,
    /// The extracted rule set has no starter rule to seed from.
    NoStarterRule,
    /// Rule-file persistence failed.
    Persist(String),
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GrammarError::NoTileVocabulary => write!(f, "no socket definitions provided"),
            GrammarError::NoPrimitives => {
                write!(f, "no primitives; call load_from_tiles first")
            }
            GrammarError::NoRules => write!(f, "no rules; call extract_grammar first"),
            GrammarError::NoStarterRule => write!(f, "rule set contains no starter rule"),
            GrammarError::Persist(msg) => write!(f, "rule file error: {}", msg),
        }
    }
}

impl std::error::Error for GrammarError {}

impl From<GenerateError> for GrammarError {
    fn from(e: GenerateError) -> Self {
        match e {
            GenerateError::NoRules => GrammarError::NoRules,
            GenerateError::NoStarterRule => GrammarError::NoStarterRule,
        }
    }
}

/// The grammar pipeline controller.
#[derive(Debug, Default)]
pub struct MerrellGrammar {
    settings: GrammarSettings,
    primitives: Vec<MerrellGraph>,
    /// Placed-instance list; reserved spatial context, unused by grid-phase
    /// disassembly.
    tiles: Vec<TileInput>,
    hierarchy: Vec<HierarchyNode>,
    rules: Vec<DPORule>,
    result: GenerationResult,
    last_error: String,
    driver: Option<GenerationDriver>,
}

impl MerrellGrammar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: GrammarSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    // ---- Phase 1: disassembly ----------------------------------------------

    /// Builds one canonical primitive graph per tile type.
    ///
    /// `tiles` (the placed instances) are retained for later spatial
    /// extensions; only the socket definitions feed grid-phase
    /// disassembly.
    pub fn load_from_tiles(
        &mut self,
        socket_defs: &[TileSocketDef],
        tiles: &[TileInput],
    ) -> Result<(), GrammarError> {
        self.primitives.clear();
        self.last_error.clear();

        if socket_defs.is_empty() {
            return Err(self.fail(GrammarError::NoTileVocabulary));
        }

        for def in socket_defs {
            self.primitives.push(tile_primitive(def));
        }
        self.tiles = tiles.to_vec();
        info!(primitives = self.primitives.len(), "disassembly complete");
        Ok(())
    }

    // ---- Phase 2: grammar extraction ---------------------------------------

    /// Builds the gluing hierarchy and extracts the rule set.
    pub fn extract_grammar(&mut self, mut progress: ProgressFn<'_>) -> Result<(), GrammarError> {
        self.rules.clear();
        self.last_error.clear();

        if self.primitives.is_empty() {
            return Err(self.fail(GrammarError::NoPrimitives));
        }

        self.hierarchy = build_hierarchy(&self.primitives, &self.settings, reborrow(&mut progress));
        self.rules = extract_rules(&mut self.hierarchy, reborrow(&mut progress));
        info!(
            hierarchy = self.hierarchy.len(),
            depth = self.hierarchy_depth(),
            rules = self.rules.len(),
            "grammar extracted"
        );
        Ok(())
    }

    // ---- Phase 3: generation -----------------------------------------------

    /// Runs a full generation with the configured seed and iteration
    /// budget. A run that exhausts its budget or its rules reports a named
    /// failure in [`MerrellGrammar::result`]; only configuration errors
    /// return `Err`.
    pub fn generate(&mut self, mut progress: ProgressFn<'_>) -> Result<(), GrammarError> {
        self.begin_generate()?;
        for i in 0..self.settings.max_iterations {
            if let Some(cb) = progress.as_mut() {
                cb(i, self.settings.max_iterations);
            }
            if self.step_generate() {
                break;
            }
        }
        Ok(())
    }

    /// Seeds a step-driven generation run.
    pub fn begin_generate(&mut self) -> Result<(), GrammarError> {
        self.result = GenerationResult::default();
        self.last_error.clear();

        if self.rules.is_empty() {
            return Err(self.fail(GrammarError::NoRules));
        }
        match GenerationDriver::new(&self.rules, self.settings.seed) {
            Ok(driver) => {
                self.driver = Some(driver);
                Ok(())
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    /// Runs one unit of generation work; returns true once finished. Call
    /// from a single site per tick; cooperative, not preemptive.
    pub fn step_generate(&mut self) -> bool {
        let Some(driver) = self.driver.as_mut() else {
            return true;
        };
        let done = driver.step(&self.rules, self.settings.max_iterations);
        if done {
            self.result = driver.result().clone();
            if self.result.success {
                info!(
                    faces = self.result.placed.len(),
                    "generation complete"
                );
            } else {
                info!(error = %self.result.error_msg, "generation failed");
            }
        }
        done
    }

    // ---- Rule persistence --------------------------------------------------

    /// Writes the rule set (and the settings that produced it) to `path`.
    pub fn save_rules(&self, path: impl AsRef<Path>) -> Result<(), GrammarError> {
        persist::save_rules(path.as_ref(), &self.settings, &self.rules)
            .map_err(|e| GrammarError::Persist(e.to_string()))
    }

    /// Replaces the rule set (and settings) from a rule file written by
    /// [`MerrellGrammar::save_rules`]. On failure nothing is replaced.
    pub fn load_rules(&mut self, path: impl AsRef<Path>) -> Result<(), GrammarError> {
        match persist::load_rules(path.as_ref()) {
            Ok(file) => {
                self.settings = file.settings;
                self.rules = file.rules;
                self.last_error.clear();
                Ok(())
            }
            Err(e) => Err(self.fail(GrammarError::Persist(e.to_string()))),
        }
    }

    // ---- Results & accessors -----------------------------------------------

    pub fn settings(&self) -> &GrammarSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut GrammarSettings {
        &mut self.settings
    }

    pub fn primitives(&self) -> &[MerrellGraph] {
        &self.primitives
    }

    pub fn hierarchy(&self) -> &[HierarchyNode] {
        &self.hierarchy
    }

    pub fn rules(&self) -> &[DPORule] {
        &self.rules
    }

    pub fn result(&self) -> &GenerationResult {
        &self.result
    }

    pub fn last_error(&self) -> &str {
        &self.last_error
    }

    pub fn has_rules(&self) -> bool {
        !self.rules.is_empty()
    }

    pub fn has_result(&self) -> bool {
        self.result.success
    }

    pub fn primitive_count(&self) -> usize {
        self.primitives.len()
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Deepest generation present in the hierarchy.
    pub fn hierarchy_depth(&self) -> u32 {
        self.hierarchy
            .iter()
            .map(|n| n.generation)
            .max()
            .unwrap_or(0)
    }

    fn fail(&mut self, e: GrammarError) -> GrammarError {
        self.last_error = e.to_string();
        e
    }
}
