//! Classifier input export
//!
//! Flattens chunk features into the fixed-width vectors, labels and sample
//! weights used to train and evaluate an interruption classifier. Training
//! itself happens elsewhere.

use crate::types::Chunk;
use serde::{Deserialize, Serialize};

/// Values per feature vector
pub const FEATURE_COUNT: usize = 13;

/// Column names of a feature vector, in order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "fixations.count",
    "fixations.duration.avg",
    "fixations.duration.med",
    "fixations.duration.var",
    "saccades.duration.avg",
    "saccades.duration.med",
    "saccades.duration.var",
    "saccades.length.avg",
    "saccades.length.med",
    "saccades.length.var",
    "saccades.angle.avg",
    "saccades.angle.med",
    "saccades.angle.var",
];

/// Feature vector of one chunk
pub fn feature_vector(chunk: &Chunk) -> [f64; FEATURE_COUNT] {
    let fixations = &chunk.fixations;
    let saccades = &chunk.saccades;
    [
        fixations.count as f64,
        fixations.duration.avg,
        fixations.duration.med,
        fixations.duration.var,
        saccades.duration.avg,
        saccades.duration.med,
        saccades.duration.var,
        saccades.length.avg,
        saccades.length.med,
        saccades.length.var,
        saccades.angle.avg,
        saccades.angle.med,
        saccades.angle.var,
    ]
}

/// Training samples of one or more sessions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub features: Vec<[f64; FEATURE_COUNT]>,
    /// 1 for chunks ending at an interruption, else 0
    pub labels: Vec<u8>,
    /// Class-balancing sample weights
    pub weights: Vec<usize>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Append all samples of `other`, keeping its weights.
    pub fn extend(&mut self, other: Dataset) {
        self.features.extend(other.features);
        self.labels.extend(other.labels);
        self.weights.extend(other.weights);
    }
}

/// Samples of one session.
///
/// Each positive sample is weighted by the number of negatives in the session
/// and each negative by the number of positives, so both classes carry the
/// same total weight.
pub fn session_samples(chunks: &[Chunk]) -> Dataset {
    let labels: Vec<u8> = chunks
        .iter()
        .map(|chunk| u8::from(chunk.interruption))
        .collect();
    let positives = labels.iter().filter(|&&label| label == 1).count();
    let negatives = labels.len() - positives;

    Dataset {
        features: chunks.iter().map(feature_vector).collect(),
        weights: labels
            .iter()
            .map(|&label| if label == 1 { negatives } else { positives })
            .collect(),
        labels,
    }
}

/// Pool the samples of every session except `excluded`, for
/// leave-one-session-out evaluation.
///
/// Sessions are pooled in the order given. Weights stay per session.
pub fn pool_excluding<'a, I>(sessions: I, excluded: &str) -> Dataset
where
    I: IntoIterator<Item = (&'a str, &'a [Chunk])>,
{
    let mut pooled = Dataset::default();
    for (name, chunks) in sessions {
        if name != excluded {
            pooled.extend(session_samples(chunks));
        }
    }
    tracing::debug!(samples = pooled.len(), excluded, "pooled training samples");
    pooled
}
