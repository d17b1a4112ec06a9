//! Side panel of words waiting to be placed on the canvas.

use slint::{Model, SharedString, VecModel};

use crate::error::{ExperimentError, Result};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct WordStack {
    words: Vec<String>,
}

impl WordStack {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            words: words.into_iter().map(Into::into).collect(),
        }
    }

    /// Replace the contents with the words of a new trial.
    pub fn refill<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.words = words.into_iter().map(Into::into).collect();
    }

    /// Remove and return the word at `index`.
    pub fn take(&mut self, index: usize) -> Option<String> {
        (index < self.words.len()).then(|| self.words.remove(index))
    }

    /// Remove and return the first occurrence of `word`.
    pub fn take_word(&mut self, word: &str) -> Option<String> {
        let index = self.words.iter().position(|w| w == word)?;
        self.take(index)
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// A trial may only end once every word has been placed.
    pub fn ensure_empty(&self) -> Result<()> {
        if self.words.is_empty() {
            Ok(())
        } else {
            Err(ExperimentError::IncompleteTrialWords {
                remaining: self.words.len(),
            })
        }
    }

    /// Mirror the stack into a Slint model.
    pub fn sync_to_model(&self, model: &VecModel<SharedString>) {
        while model.row_count() > 0 {
            model.remove(0);
        }
        for word in &self.words {
            model.push(word.as_str().into());
        }
    }
}
