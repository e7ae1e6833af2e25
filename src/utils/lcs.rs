// Longest common subsequence via Dynamic Programming
//
// Reference: <https://github.com/TheAlgorithms/Rust/blob/master/src/dynamic_programming/longest_common_subsequence.rs>

use thiserror::Error as ThisError;

/// Largest table `lcs` will allocate, in bytes. Same as the default `proto-max-bulk-len`.
pub const MAX_TABLE_BYTES: usize = 512 * 1024 * 1024;

#[derive(Debug, ThisError, PartialEq)]
pub enum LcsError {
    #[error("ERR Insufficient memory, transient memory for LCS exceeds proto-max-bulk-len")]
    TooLarge,
}

/// A run of consecutive matching bytes: inclusive start and end offsets in each input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub a: (usize, usize),
    pub b: (usize, usize),
}

impl Match {
    pub fn len(&self) -> usize {
        self.a.1 - self.a.0 + 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lcs {
    pub sequence: Vec<u8>,
    /// Matching runs, from the end of the inputs towards their start.
    pub matches: Vec<Match>,
}

/// `lcs(a, b)` returns the longest common subsequence between `a` and `b`, together with the
/// runs of `a` and `b` it was built from.
///
/// Fails without allocating when the table would need more than `max_table_bytes`.
pub fn lcs(a: &[u8], b: &[u8], max_table_bytes: usize) -> Result<Lcs, LcsError> {
    let (na, nb) = (a.len(), b.len());

    let cells = (na + 1)
        .checked_mul(nb + 1)
        .filter(|&cells| cells < u32::MAX as usize)
        .ok_or(LcsError::TooLarge)?;
    let bytes = cells
        .checked_mul(std::mem::size_of::<u32>())
        .filter(|&bytes| bytes <= max_table_bytes)
        .ok_or(LcsError::TooLarge)?;
    let width = nb + 1;

    // solutions[i * width + j] is the length of the longest common subsequence
    // between a[0..i-1] and b[0..j-1]
    let mut solutions = vec![0_u32; bytes / std::mem::size_of::<u32>()];
    let at = |i: usize, j: usize| i * width + j;

    for (i, ci) in a.iter().enumerate() {
        for (j, cj) in b.iter().enumerate() {
            // if ci == cj, there is a new common byte;
            // otherwise, take the best of the two solutions
            // at (i-1,j) and (i,j-1)
            solutions[at(i + 1, j + 1)] = if ci == cj {
                solutions[at(i, j)] + 1
            } else {
                solutions[at(i, j + 1)].max(solutions[at(i + 1, j)])
            }
        }
    }

    // reconstitute the solution from the lengths, collecting the matching runs on the way
    let mut sequence = Vec::with_capacity(solutions[at(na, nb)] as usize);
    let mut matches = Vec::new();
    let mut current: Option<Match> = None;
    let (mut i, mut j) = (na, nb);

    while i > 0 && j > 0 {
        let mut emit = false;

        if a[i - 1] == b[j - 1] {
            sequence.push(a[i - 1]);

            match current {
                None => {
                    current = Some(Match {
                        a: (i - 1, i - 1),
                        b: (j - 1, j - 1),
                    })
                }
                Some(ref mut run) if run.a.0 == i && run.b.0 == j => {
                    run.a.0 -= 1;
                    run.b.0 -= 1;
                }
                Some(_) => emit = true,
            }

            // A run touching the start of either input cannot grow any further.
            if current.is_some_and(|run| run.a.0 == 0 || run.b.0 == 0) {
                emit = true;
            }

            i -= 1;
            j -= 1;
        } else {
            if solutions[at(i - 1, j)] > solutions[at(i, j - 1)] {
                i -= 1;
            } else {
                j -= 1;
            }
            emit = current.is_some();
        }

        if emit {
            matches.extend(current.take());
        }
    }

    sequence.reverse();

    Ok(Lcs { sequence, matches })
}
