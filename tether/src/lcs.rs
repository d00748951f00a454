//! Longest common subsequence over index pairs.

/// Compute a longest common subsequence between an old sequence of length `n`
/// and a new sequence of length `m`, where `eq(i, j)` tells whether old element
/// `i` may be paired with new element `j`.
///
/// Returns the paired indices in increasing order on both sides. Among
/// equally long solutions, old elements are paired as early as possible, so the
/// result is deterministic.
pub fn longest_common_subsequence(
    n: usize,
    m: usize,
    mut eq: impl FnMut(usize, usize) -> bool,
) -> Vec<(usize, usize)> {
    if n == 0 || m == 0 {
        return Vec::new();
    }

    // table[i][j] = LCS length of old[i..] and new[j..], row-major, (n+1)x(m+1)
    let width = m + 1;
    let mut table = vec![0u32; (n + 1) * width];
    let mut equal = vec![false; n * m];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            let same = eq(i, j);
            equal[i * m + j] = same;
            table[i * width + j] = if same {
                table[(i + 1) * width + j + 1] + 1
            } else {
                table[(i + 1) * width + j].max(table[i * width + j + 1])
            };
        }
    }

    let mut pairs = Vec::with_capacity(table[0] as usize);
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if equal[i * m + j] && table[i * width + j] == table[(i + 1) * width + j + 1] + 1 {
            pairs.push((i, j));
            i += 1;
            j += 1;
        } else if table[i * width + j + 1] >= table[(i + 1) * width + j] {
            j += 1;
        } else {
            i += 1;
        }
    }
    pairs
}
