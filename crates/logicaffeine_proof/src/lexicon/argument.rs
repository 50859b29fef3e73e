//! Arguments: a conclusion plus zero or more premises.

use crate::lexicon::sentence::Sentence;

/// An argument to be tested for validity. `sentences()[0]` is always the
/// conclusion; the rest are the premises, in order.
///
/// A `title` is carried for diagnostics only — two arguments with the same
/// sentences but different titles are still equal.
#[derive(Clone, Debug)]
pub struct Argument {
    title: Option<String>,
    conclusion: Sentence,
    premises: Vec<Sentence>,
}

impl Argument {
    pub fn new(conclusion: Sentence, premises: Vec<Sentence>) -> Self {
        Self { title: None, conclusion, premises }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn conclusion(&self) -> &Sentence {
        &self.conclusion
    }

    pub fn premises(&self) -> &[Sentence] {
        &self.premises
    }

    /// All sentences, conclusion first: `sentences()[0] == conclusion()` and
    /// `sentences()[1..] == premises()`.
    pub fn sentences(&self) -> Vec<Sentence> {
        std::iter::once(self.conclusion.clone()).chain(self.premises.iter().cloned()).collect()
    }
}

impl PartialEq for Argument {
    fn eq(&self, other: &Self) -> bool {
        self.conclusion == other.conclusion && self.premises == other.premises
    }
}
impl Eq for Argument {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::coords::BiCoords;
    use crate::lexicon::sentence::Lexicon;

    #[test]
    fn equality_ignores_title() {
        let mut lex = Lexicon::new();
        let a = lex.atomic(BiCoords::first());
        let b = lex.atomic(BiCoords::first().next());
        let arg1 = Argument::new(a.clone(), vec![b.clone()]).with_title("modus ponens");
        let arg2 = Argument::new(a, vec![b]);
        assert_eq!(arg1, arg2);
    }

    #[test]
    fn sentences_puts_conclusion_first() {
        let mut lex = Lexicon::new();
        let a = lex.atomic(BiCoords::first());
        let b = lex.atomic(BiCoords::first().next());
        let arg = Argument::new(a.clone(), vec![b.clone()]);
        assert_eq!(arg.sentences(), vec![a, b]);
    }
}
