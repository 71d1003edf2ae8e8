//! Request chunking
//!
//! A bulk render repeats `&target=<path>` once per metric, and hosts (or the
//! proxies in front of them) cap the URL length. [`chunk_targets`] splits a
//! target list into batches that stay under a byte budget.

/// Bytes added per target by the `&target=` framing.
pub const TARGET_OVERHEAD: usize = 8;

/// Default budget for the encoded target parameters of one request.
pub const DEFAULT_URL_LENGTH: usize = 8000;

/// Encoded length of one target inside a request.
pub fn encoded_len(target: &str) -> usize {
    target.len() + TARGET_OVERHEAD
}

/// Split `targets` into order-preserving batches whose encoded length fits `budget`
///
/// A target that is larger than the budget on its own still gets its own
/// batch. An empty input yields exactly one empty batch.
///
/// # Example
///
/// ```
/// use cadent_finder::chunker::chunk_targets;
///
/// let targets: Vec<String> = vec!["a".repeat(100), "b".repeat(100), "c".repeat(100)];
/// let chunks: Vec<&[String]> = chunk_targets(&targets, 250).collect();
/// assert_eq!(chunks.len(), 2);
/// assert_eq!(chunks[0].len(), 2);
/// ```
pub fn chunk_targets<S: AsRef<str>>(targets: &[S], budget: usize) -> Chunks<'_, S> {
    Chunks {
        targets,
        budget,
        pos: 0,
        emitted: false,
    }
}

/// Lazy iterator returned by [`chunk_targets`]
#[derive(Debug, Clone)]
pub struct Chunks<'a, S> {
    targets: &'a [S],
    budget: usize,
    pos: usize,
    emitted: bool,
}

impl<'a, S: AsRef<str>> Iterator for Chunks<'a, S> {
    type Item = &'a [S];

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.targets.len() {
            if self.emitted {
                return None;
            }
            // empty input still produces one (empty) batch
            self.emitted = true;
            return Some(&self.targets[self.pos..]);
        }

        let start = self.pos;
        let mut used = 0;
        while self.pos < self.targets.len() {
            let len = encoded_len(self.targets[self.pos].as_ref());
            if self.pos > start && used + len > self.budget {
                break;
            }
            used += len;
            self.pos += 1;
        }

        self.emitted = true;
        Some(&self.targets[start..self.pos])
    }
}
