// Derivation step history for replaying a parse

use crate::parser::grammar::Symbol;
use crate::parser::parser::{DerivationNode, StepAction};
use thiserror::Error;

/// Snapshot of parser state after one transition
///
/// Every field is an owned copy; later parser transitions never reach back
/// into a recorded step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivationStep {
    pub action: StepAction,
    /// Deep copy of the derivation tree
    pub tree: DerivationNode,
    /// Symbol stack, bottom first
    pub stack: Vec<Symbol>,
    /// Input cursor (index into the `$`-terminated token stream)
    pub position: usize,
}

impl DerivationStep {
    /// Estimate the memory usage of this step in bytes
    pub fn estimated_size(&self) -> usize {
        // This is a rough estimate
        // Tree: assume 64 bytes per node including its child vector
        let tree_size = self.tree.size() * 64;

        // Stack: one fat pointer per symbol
        let stack_size = self.stack.len() * std::mem::size_of::<Symbol>();

        // Action: tokens and productions are small
        let action_size = 128;

        tree_size + stack_size + action_size
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("derivation history limit exceeded: {current} + {requested} > {limit} bytes")]
    LimitExceeded {
        current: usize,
        requested: usize,
        limit: usize,
    },
}

/// Ordered record of derivation steps with a memory budget
#[derive(Debug)]
pub struct StepHistory {
    steps: Vec<DerivationStep>,
    max_memory: usize,
    current_memory: usize,
}

impl StepHistory {
    pub fn new(max_memory: usize) -> Self {
        StepHistory {
            steps: Vec::new(),
            max_memory,
            current_memory: 0,
        }
    }

    /// Add a step to history
    pub fn push(&mut self, step: DerivationStep) -> Result<(), HistoryError> {
        let step_size = step.estimated_size();

        if self.current_memory + step_size > self.max_memory {
            return Err(HistoryError::LimitExceeded {
                current: self.current_memory,
                requested: step_size,
                limit: self.max_memory,
            });
        }

        self.current_memory += step_size;
        self.steps.push(step);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Get current memory usage
    pub fn memory_usage(&self) -> usize {
        self.current_memory
    }

    /// Get max memory limit
    pub fn memory_limit(&self) -> usize {
        self.max_memory
    }

    pub fn into_steps(self) -> Vec<DerivationStep> {
        self.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(nodes: usize) -> DerivationStep {
        let children = (1..nodes)
            .map(|id| DerivationNode {
                id,
                symbol: "id",
                children: Vec::new(),
                expanded: false,
            })
            .collect();
        DerivationStep {
            action: StepAction::Start,
            tree: DerivationNode {
                id: 0,
                symbol: "Prog",
                children,
                expanded: true,
            },
            stack: vec!["$", "Prog"],
            position: 0,
        }
    }

    #[test]
    fn test_push_within_limit() {
        let mut history = StepHistory::new(10_000);
        history.push(step(3)).unwrap();
        history.push(step(5)).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(
            history.memory_usage(),
            step(3).estimated_size() + step(5).estimated_size()
        );
        let sizes: Vec<usize> = history.into_steps().iter().map(|s| s.tree.size()).collect();
        assert_eq!(sizes, vec![3, 5]);
    }

    #[test]
    fn test_push_over_limit_is_rejected() {
        let size = step(4).estimated_size();
        let mut history = StepHistory::new(size);
        history.push(step(4)).unwrap();

        let err = history.push(step(4)).unwrap_err();
        assert_eq!(
            err,
            HistoryError::LimitExceeded {
                current: size,
                requested: size,
                limit: size,
            }
        );
        assert_eq!(history.len(), 1);
        assert_eq!(history.memory_limit(), size);
    }
}
