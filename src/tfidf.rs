//! TF-IDF vectorization of short texts into a sparse CSR matrix.
//!
//! 1. **Tokenization**: lowercase, split on anything that is not a word
//!    character, keep tokens of two or more characters
//! 2. **Stopwords**: tokens found in the configured set are dropped
//! 3. **Vocabulary**: sorted term → column index over the whole corpus
//! 4. **Weighting**: raw term count × smoothed idf,
//!    `idf(t) = ln((1 + n) / (1 + df(t))) + 1`
//! 5. **Normalisation**: each document row scaled to unit L2 norm, so the dot
//!    product of two rows is their cosine similarity
//!
//! Documents that keep no token after steps 1–2 become empty rows.

use std::collections::BTreeMap;

use log::{debug, info};
use sprs::{CsMat, TriMat};

use crate::stopwords::StopWords;

/// Lowercased word tokens of at least two characters.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| t.chars().count() >= 2)
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone)]
pub struct TfIdfVectorizer {
    stopwords: StopWords,
}

/// Fitted output: one L2-normalised row per input document.
#[derive(Debug, Clone)]
pub struct TfIdfMatrix {
    pub matrix: CsMat<f64>,
    pub vocabulary: BTreeMap<String, usize>,
    pub idf: Vec<f64>,
}

impl TfIdfMatrix {
    #[inline]
    pub fn ndocs(&self) -> usize {
        self.matrix.rows()
    }

    #[inline]
    pub fn nterms(&self) -> usize {
        self.matrix.cols()
    }

    /// Sorted term indices and weights of document `doc`.
    pub fn row(&self, doc: usize) -> (&[usize], &[f64]) {
        match self.matrix.outer_view(doc) {
            Some(view) => view.into_raw_storage(),
            None => (&[], &[]),
        }
    }

    /// True if the document kept at least one term.
    pub fn has_terms(&self, doc: usize) -> bool {
        !self.row(doc).0.is_empty()
    }
}

impl TfIdfVectorizer {
    pub fn new(stopwords: StopWords) -> Self {
        Self { stopwords }
    }

    fn analyze(&self, text: &str) -> Vec<String> {
        tokenize(text)
            .into_iter()
            .filter(|t| !self.stopwords.contains(t))
            .collect()
    }

    pub fn fit_transform<S: AsRef<str>>(&self, docs: &[S]) -> TfIdfMatrix {
        let n = docs.len();
        info!("Vectorizing {} documents", n);

        // per-document term counts
        let counted: Vec<BTreeMap<String, usize>> = docs
            .iter()
            .map(|d| {
                let mut counts = BTreeMap::new();
                for t in self.analyze(d.as_ref()) {
                    *counts.entry(t).or_insert(0) += 1;
                }
                counts
            })
            .collect();

        let mut df: BTreeMap<&str, usize> = BTreeMap::new();
        for counts in &counted {
            for term in counts.keys() {
                *df.entry(term.as_str()).or_insert(0) += 1;
            }
        }
        let vocabulary: BTreeMap<String, usize> = df
            .keys()
            .enumerate()
            .map(|(i, t)| (t.to_string(), i))
            .collect();
        let idf: Vec<f64> = df
            .values()
            .map(|&d| ((1.0 + n as f64) / (1.0 + d as f64)).ln() + 1.0)
            .collect();
        debug!("Vocabulary size: {}", vocabulary.len());

        let mut triplets = TriMat::new((n, vocabulary.len()));
        for (doc, counts) in counted.iter().enumerate() {
            let weighted: Vec<(usize, f64)> = counts
                .iter()
                .map(|(term, &c)| {
                    let col = vocabulary[term];
                    (col, c as f64 * idf[col])
                })
                .collect();
            let row_norm = weighted.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
            if row_norm == 0.0 {
                continue;
            }
            for (col, w) in weighted {
                triplets.add_triplet(doc, col, w / row_norm);
            }
        }
        let matrix: CsMat<f64> = triplets.to_csr();
        debug!("TF-IDF matrix {:?} with {} non-zeros", matrix.shape(), matrix.nnz());

        TfIdfMatrix {
            matrix,
            vocabulary,
            idf,
        }
    }
}
