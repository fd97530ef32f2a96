use sprs::CsMat;
use tracing::debug;

use super::{VectorizerError, count_vectorizer::CountVectorizer, params::VectorizerParams};

/// TF-IDF vectorizer: term counts weighted by smooth IDF, rows L2-normalized.
#[derive(Clone, Debug)]
pub struct TfidfVectorizer {
    count_vectorizer: CountVectorizer,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    pub fn fit<T: AsRef<str>>(
        texts: &[T],
        params: VectorizerParams,
    ) -> Result<Self, VectorizerError> {
        debug!(num_texts = texts.len(), "Fitting TfidfVectorizer");
        let (count_vectorizer, tf_matrix) = CountVectorizer::fit_transform(texts, params)?;

        let mut df = vec![0usize; count_vectorizer.num_features()];
        for row_vec in tf_matrix.outer_iterator() {
            for (col_idx, _) in row_vec.iter() {
                df[col_idx] += 1;
            }
        }

        // ln((n_docs + 1) / (df + 1)) + 1
        let n_docs = texts.len() as f64;
        let idf = df
            .iter()
            .map(|&doc_freq| ((n_docs + 1.0) / (doc_freq as f64 + 1.0)).ln() + 1.0)
            .collect();
        debug!("IDF calculation complete");

        Ok(Self {
            count_vectorizer,
            idf,
        })
    }

    pub fn transform<T: AsRef<str>>(&self, texts: &[T]) -> CsMat<f64> {
        debug!(
            num_texts = texts.len(),
            "Transforming texts using TfidfVectorizer"
        );
        let mut matrix = self.count_vectorizer.transform(texts);
        for mut row_vec in matrix.outer_iterator_mut() {
            for (col_idx, val) in row_vec.iter_mut() {
                *val *= self.idf[col_idx];
            }
            let norm = row_vec.iter().map(|(_, &v)| v * v).sum::<f64>().sqrt();
            if norm > 0.0 {
                for (_, val) in row_vec.iter_mut() {
                    *val /= norm;
                }
            }
        }
        matrix
    }

    pub fn num_features(&self) -> usize {
        self.count_vectorizer.num_features()
    }

    pub fn vocabulary(&self) -> Vec<&str> {
        self.count_vectorizer.vocabulary()
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }
}
