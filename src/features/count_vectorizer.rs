use std::collections::{BTreeMap, HashMap};

use sprs::CsMat;
use tracing::debug;

use super::{
    VectorizerError,
    params::VectorizerParams,
    tokenizer::{count_ngrams, tokenize},
};

/// Raw term-count vectorizer with a vocabulary frozen at fit time.
#[derive(Clone, Debug)]
pub struct CountVectorizer {
    params: VectorizerParams,
    /// Term to feature index; indices follow alphabetical term order.
    vocab: HashMap<String, usize>,
}

#[derive(Default)]
struct TermStats {
    doc_freq: usize,
    corpus_freq: usize,
}

impl CountVectorizer {
    pub fn fit<T: AsRef<str>>(
        texts: &[T],
        params: VectorizerParams,
    ) -> Result<Self, VectorizerError> {
        Self::fit_transform(texts, params).map(|(vectorizer, _)| vectorizer)
    }

    /// Fit the vocabulary and return the training count matrix, counting
    /// n-grams once.
    pub fn fit_transform<T: AsRef<str>>(
        texts: &[T],
        params: VectorizerParams,
    ) -> Result<(Self, CsMat<f64>), VectorizerError> {
        params.validate()?;
        debug!(num_texts = texts.len(), "Fitting CountVectorizer");

        let ngram_maps = texts
            .iter()
            .map(|text| {
                count_ngrams(
                    &tokenize(text.as_ref(), params.lowercase),
                    params.ngram_range(),
                )
            })
            .collect::<Vec<_>>();

        let mut stats: BTreeMap<&str, TermStats> = BTreeMap::new();
        for ngrams in &ngram_maps {
            for (term, &count) in ngrams {
                let entry = stats.entry(term.as_str()).or_default();
                entry.doc_freq += 1;
                entry.corpus_freq += count;
            }
        }
        let seen = stats.len();

        let mut kept = stats
            .into_iter()
            .filter(|(_, stat)| stat.doc_freq >= params.min_df)
            .collect::<Vec<_>>();
        if let Some(limit) = params.max_features {
            // Stable sort keeps alphabetical order among equal frequencies.
            kept.sort_by(|a, b| b.1.corpus_freq.cmp(&a.1.corpus_freq));
            kept.truncate(limit);
            kept.sort_by(|a, b| a.0.cmp(b.0));
        }
        debug!(
            seen,
            kept = kept.len(),
            min_df = params.min_df,
            "Vocabulary filtered"
        );
        if kept.is_empty() {
            return Err(VectorizerError::EmptyVocabulary);
        }

        let vocab = kept
            .into_iter()
            .enumerate()
            .map(|(idx, (term, _))| (term.to_string(), idx))
            .collect::<HashMap<_, _>>();
        let vectorizer = Self { params, vocab };
        let matrix = vectorizer.matrix_from_ngrams(&ngram_maps);
        Ok((vectorizer, matrix))
    }

    /// Count vocabulary terms in each text. Unknown terms are ignored.
    pub fn transform<T: AsRef<str>>(&self, texts: &[T]) -> CsMat<f64> {
        debug!(
            num_texts = texts.len(),
            "Transforming texts using CountVectorizer"
        );
        let ngram_maps = texts
            .iter()
            .map(|text| {
                count_ngrams(
                    &tokenize(text.as_ref(), self.params.lowercase),
                    self.params.ngram_range(),
                )
            })
            .collect::<Vec<_>>();
        self.matrix_from_ngrams(&ngram_maps)
    }

    fn matrix_from_ngrams(&self, ngram_maps: &[HashMap<String, usize>]) -> CsMat<f64> {
        let mut indptr = Vec::with_capacity(ngram_maps.len() + 1);
        let mut indices = Vec::new();
        let mut data = Vec::new();
        indptr.push(0);

        for ngrams in ngram_maps {
            let mut row_entries = ngrams
                .iter()
                .filter_map(|(term, &count)| {
                    self.vocab.get(term).map(|&col_idx| (col_idx, count as f64))
                })
                .collect::<Vec<_>>();
            row_entries.sort_by_key(|(col_idx, _)| *col_idx);
            for (col_idx, count) in row_entries {
                indices.push(col_idx);
                data.push(count);
            }
            indptr.push(indices.len());
        }

        CsMat::new(
            (ngram_maps.len(), self.num_features()),
            indptr,
            indices,
            data,
        )
    }

    pub fn num_features(&self) -> usize {
        self.vocab.len()
    }

    /// Terms ordered by feature index.
    pub fn vocabulary(&self) -> Vec<&str> {
        let mut terms = vec![""; self.vocab.len()];
        for (term, &idx) in &self.vocab {
            terms[idx] = term.as_str();
        }
        terms
    }

    pub fn params(&self) -> &VectorizerParams {
        &self.params
    }
}
