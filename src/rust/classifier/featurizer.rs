use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref WORD: Regex = Regex::new(r"[\p{L}\p{N}_]+").expect("word pattern is valid");
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("whitespace pattern is valid");
}

const TEXT_START: char = '\u{2}';
const TEXT_END: char = '\u{3}';

/// Settings for turning one free-text column into a bag of n-grams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeaturizerOptions {
    /// Longest word n-gram; all shorter lengths are included too
    pub word_ngram_length: usize,
    /// Exact character n-gram length (0 disables character n-grams)
    pub char_ngram_length: usize,
    /// Upper bound on the vocabulary size of a single column
    pub max_ngrams: usize,
}

impl Default for FeaturizerOptions {
    fn default() -> Self {
        Self {
            word_ngram_length: 1,
            char_ngram_length: 3,
            max_ngrams: 100_000,
        }
    }
}

/// A sparse feature vector with strictly increasing indices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    pub(crate) indices: Vec<usize>,
    pub(crate) values: Vec<f32>,
}

impl SparseVector {
    fn from_counts(counts: HashMap<usize, f32>) -> Self {
        let mut entries: Vec<(usize, f32)> = counts.into_iter().collect();
        entries.sort_unstable_by_key(|&(idx, _)| idx);
        let (indices, values) = entries.into_iter().unzip();
        Self { indices, values }
    }

    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    pub fn norm_squared(&self) -> f32 {
        self.values.iter().map(|v| v * v).sum()
    }

    /// Scales the vector to unit L2 norm; the zero vector is left alone.
    pub(crate) fn normalize(&mut self) {
        let norm = self.norm_squared().sqrt();
        if norm > 1e-10 {
            self.values.iter_mut().for_each(|v| *v /= norm);
        }
    }

    /// Appends `other` after this vector, shifting its indices by `offset`.
    pub(crate) fn concat(mut self, other: &SparseVector, offset: usize) -> Self {
        self.indices.extend(other.indices.iter().map(|idx| idx + offset));
        self.values.extend_from_slice(&other.values);
        self
    }
}

/// Word and character n-gram featurizer for a single text column.
///
/// Text is lowercased before both word and character n-grams are taken.
/// Counts are looked up against a vocabulary frozen at fit time, so n-grams
/// never seen in training contribute nothing. The output is L2-normalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextFeaturizer {
    options: FeaturizerOptions,
    vocabulary: HashMap<String, usize>,
}

impl TextFeaturizer {
    /// Builds the vocabulary from the training texts, in first-seen order.
    pub fn fit<'a, I>(options: FeaturizerOptions, texts: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut featurizer = Self {
            options,
            vocabulary: HashMap::new(),
        };

        'texts: for text in texts {
            for ngram in featurizer.extract_ngrams(text) {
                if featurizer.vocabulary.len() >= featurizer.options.max_ngrams {
                    break 'texts;
                }
                let next = featurizer.vocabulary.len();
                featurizer.vocabulary.entry(ngram).or_insert(next);
            }
        }

        featurizer
    }

    /// Number of distinct n-grams, which is also the output dimension
    pub fn dimension(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn options(&self) -> &FeaturizerOptions {
        &self.options
    }

    pub fn transform(&self, text: &str) -> SparseVector {
        let mut counts: HashMap<usize, f32> = HashMap::new();
        for ngram in self.extract_ngrams(text) {
            if let Some(&idx) = self.vocabulary.get(&ngram) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let mut features = SparseVector::from_counts(counts);
        features.normalize();
        features
    }

    fn extract_ngrams(&self, text: &str) -> Vec<String> {
        let normalized = WHITESPACE.replace_all(text.trim(), " ").to_lowercase();
        if normalized.is_empty() {
            return Vec::new();
        }

        let mut ngrams = Vec::new();

        let words: Vec<&str> = WORD.find_iter(&normalized).map(|m| m.as_str()).collect();
        for n in 1..=self.options.word_ngram_length {
            for window in words.windows(n) {
                ngrams.push(format!("w|{}", window.join(" ")));
            }
        }

        let n = self.options.char_ngram_length;
        if n > 0 {
            let chars: Vec<char> = std::iter::once(TEXT_START)
                .chain(normalized.chars())
                .chain(std::iter::once(TEXT_END))
                .collect();
            for window in chars.windows(n) {
                let gram: String = window.iter().collect();
                ngrams.push(format!("c|{}", gram));
            }
        }

        ngrams
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn featurizer(texts: &[&str]) -> TextFeaturizer {
        TextFeaturizer::fit(FeaturizerOptions::default(), texts.iter().copied())
    }

    #[test]
    fn test_ngram_extraction() {
        let options = FeaturizerOptions {
            word_ngram_length: 2,
            char_ngram_length: 3,
            ..Default::default()
        };
        let f = TextFeaturizer::fit(options, std::iter::empty());
        let grams = f.extract_ngrams("Stream  Read");

        assert!(grams.contains(&"w|stream".to_string()));
        assert!(grams.contains(&"w|read".to_string()));
        assert!(grams.contains(&"w|stream read".to_string()));
        assert!(grams.contains(&format!("c|{}st", TEXT_START)));
        assert!(grams.contains(&"c|m r".to_string()));
        assert!(grams.contains(&format!("c|ad{}", TEXT_END)));
    }

    #[test]
    fn test_transform_is_unit_length() {
        let f = featurizer(&["HttpClient timeout", "File not found"]);
        let v = f.transform("HttpClient timeout again");
        assert!(!v.is_empty());
        assert!((v.norm_squared() - 1.0).abs() < 1e-5);
        assert!(v.indices.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_unknown_text_yields_empty_vector() {
        let f = featurizer(&["abc"]);
        assert!(f.transform("").is_empty());
        assert!(f.transform("xyz").is_empty());
    }

    #[test]
    fn test_vocabulary_is_capped() {
        let options = FeaturizerOptions {
            max_ngrams: 5,
            ..Default::default()
        };
        let f = TextFeaturizer::fit(options, ["a fairly long sentence with many ngrams"]);
        assert_eq!(f.dimension(), 5);
    }

    #[test]
    fn test_concat_offsets_indices() {
        let f = featurizer(&["one two"]);
        let a = f.transform("one");
        let b = f.transform("two");
        let joined = a.clone().concat(&b, f.dimension());
        assert_eq!(joined.nnz(), a.nnz() + b.nnz());
        assert!(joined.indices[a.nnz()..].iter().all(|&idx| idx >= f.dimension()));
    }
}
