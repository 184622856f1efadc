//! Splicing embed output into the parent token list.

use quire_renderer::lexer::Token;

/// Replacement tokens per original token index.
///
/// Indices always refer to the un-spliced list, so the order in which
/// entries are added does not matter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsertionPlan {
    entries: Vec<(usize, Vec<Token>)>,
}

impl InsertionPlan {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the token at `index` with `tokens`. Several entries for the
    /// same index are concatenated in the order they are added.
    pub fn push(&mut self, index: usize, tokens: Vec<Token>) {
        match self.entries.iter_mut().find(|(i, _)| *i == index) {
            Some((_, existing)) => existing.extend(tokens),
            None => self.entries.push((index, tokens)),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build the spliced list in one pass.
    #[must_use]
    pub fn apply(mut self, tokens: Vec<Token>) -> Vec<Token> {
        self.entries.sort_by_key(|(index, _)| *index);
        let extra: usize = self.entries.iter().map(|(_, t)| t.len()).sum();
        let mut out = Vec::with_capacity(tokens.len() + extra);
        let mut entries = self.entries.into_iter().peekable();

        for (index, token) in tokens.into_iter().enumerate() {
            match entries.next_if(|(i, _)| *i == index) {
                Some((_, replacement)) => out.extend(replacement),
                None => out.push(token),
            }
        }
        out
    }
}
