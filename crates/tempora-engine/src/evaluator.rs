//! Pattern evaluator - compiles definitions into actions and runs them

use crate::actions::{
    ContextCombinerAction, LowLevelAbstractionAction, SequentialPatternAction, SliceAction,
};
use crate::algorithm::AlgorithmSource;
use crate::definitions::{DefinitionCache, PatternDefinition};
use crate::error::EngineError;
use crate::fact_store::WorkingMemory;
use tempora_domain::KindId;
use tracing::{debug, info};

/// A compiled pattern definition, tagged by the action it triggers.
pub enum Action {
    /// Sliding-window abstraction.
    LowLevelAbstraction(LowLevelAbstractionAction),
    /// Adjacent-context combination.
    ContextCombine(ContextCombinerAction),
    /// Index-window extraction.
    Slice(SliceAction),
    /// Ordered-chain matching.
    SequentialPattern(SequentialPatternAction),
}

impl Action {
    /// The kind this action derives or governs.
    pub fn id(&self) -> &KindId {
        match self {
            Action::LowLevelAbstraction(a) => &a.definition().id,
            Action::ContextCombine(a) => &a.definition().id,
            Action::Slice(a) => &a.definition().id,
            Action::SequentialPattern(a) => &a.definition().id,
        }
    }

    fn fire(&self, wm: &mut WorkingMemory) -> Result<usize, EngineError> {
        match self {
            Action::LowLevelAbstraction(a) => a.fire(wm),
            Action::ContextCombine(a) => a.fire(wm),
            Action::Slice(a) => a.fire(wm),
            Action::SequentialPattern(a) => a.fire(wm),
        }
    }
}

/// Evaluates a compiled set of pattern definitions against one key's
/// working memory.
///
/// Compilation resolves every referenced algorithm up front; an
/// unresolvable algorithm or malformed definition is fatal to the whole
/// query before any key is processed.
pub struct PatternEvaluator {
    actions: Vec<Action>,
}

impl PatternEvaluator {
    /// Compile a definition cache, resolving algorithms against the
    /// algorithm source.
    pub fn compile<A: AlgorithmSource>(
        cache: &DefinitionCache,
        algorithms: &A,
    ) -> Result<Self, EngineError> {
        let mut actions = Vec::with_capacity(cache.len());
        for definition in cache.definitions() {
            let action = match definition {
                PatternDefinition::LowLevelAbstraction(def) => {
                    let algorithm = algorithms
                        .read_algorithm(&def.algorithm_id)
                        .map_err(|e| EngineError::AlgorithmSource(e.to_string()))?
                        .ok_or_else(|| {
                            EngineError::UnknownAlgorithm(def.algorithm_id.clone())
                        })?;
                    Action::LowLevelAbstraction(LowLevelAbstractionAction::new(
                        def.clone(),
                        algorithm,
                    ))
                }
                PatternDefinition::Context(def) => {
                    Action::ContextCombine(ContextCombinerAction::new(def.clone()))
                }
                PatternDefinition::Slice(def) => Action::Slice(SliceAction::new(def.clone())),
                PatternDefinition::SequentialPattern(def) => {
                    Action::SequentialPattern(SequentialPatternAction::new(def.clone()))
                }
            };
            actions.push(action);
        }
        info!(actions = actions.len(), "compiled pattern evaluator");
        Ok(Self { actions })
    }

    /// Number of compiled actions.
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether no actions were compiled.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Run evaluation passes until a pass derives nothing new.
    ///
    /// Derived propositions can feed later definitions, so passes repeat
    /// to a fixpoint; `max_passes` guards against a definition set that
    /// never converges.
    pub fn evaluate(
        &self,
        wm: &mut WorkingMemory,
        max_passes: usize,
    ) -> Result<(), EngineError> {
        for pass in 1..=max_passes {
            let mut derived = 0;
            for action in &self.actions {
                derived += action.fire(wm)?;
            }
            debug!(pass, derived, "evaluation pass complete");
            if derived == 0 {
                return Ok(());
            }
        }
        Err(EngineError::NonConvergent(max_passes))
    }
}
