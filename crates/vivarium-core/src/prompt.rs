//! Evolution confirmation.
//!
//! A touch on a mature, happy child may offer evolution. The offer is only
//! accepted after the observer confirms it. The [`EvolutionPrompt`] trait
//! abstracts how the confirmation is obtained: a console question, a UI
//! dialog, or a scripted answer in tests.

/// A source of yes/no answers to an evolution offer.
pub trait EvolutionPrompt: Send {
    /// Ask whether the pet should evolve now.
    fn confirm(&mut self, message: &str) -> bool;
}

/// A prompt that always gives the same answer.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm(pub bool);

impl AutoConfirm {
    /// Create a prompt that always answers `answer`.
    pub const fn new(answer: bool) -> Self {
        Self(answer)
    }
}

impl EvolutionPrompt for AutoConfirm {
    fn confirm(&mut self, message: &str) -> bool {
        tracing::debug!(message, answer = self.0, "Evolution prompt auto-answered");
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_confirm_repeats_its_answer() {
        let mut yes = AutoConfirm::new(true);
        let mut no = AutoConfirm::default();
        assert!(yes.confirm("evolve?"));
        assert!(!no.confirm("evolve?"));
    }
}
