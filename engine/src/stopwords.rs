//! Case-insensitive stopword set.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::EngineError;
use crate::Result;

/// Stopwords loaded from a newline-separated file, matched
/// case-insensitively. Immutable for the duration of one run.
#[derive(Debug, Default, Clone)]
pub struct Stopwords {
    words: HashSet<String>,
}

impl Stopwords {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|_| {
            EngineError::Config(format!("unable to read stopwords file {}", path.display()))
        })?;
        let words = text
            .lines()
            .map(|line| line.trim().to_lowercase())
            .filter(|line| !line.is_empty())
            .collect();
        Ok(Self { words })
    }

    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(&token.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl FromIterator<String> for Stopwords {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            words: iter.into_iter().map(|w| w.to_lowercase()).collect(),
        }
    }
}
