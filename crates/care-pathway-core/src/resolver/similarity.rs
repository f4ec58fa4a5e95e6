//! String similarity for fuzzy condition matching.

use std::collections::HashMap;

const WORD_BITS: usize = u64::BITS as usize;

/// Best similarity (0 - 100) of the shorter string against any equally long
/// window of the longer one.
///
/// A window scores `2 * M / T`, with `M` the longest common subsequence and
/// `T` the combined length of both sides, so an adjacent swap loses a single
/// matched character. Windows are taken over characters, not bytes. A string
/// contained in the other scores 100. An empty side scores 0.
pub fn partial_ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let (short, long) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };
    if short.is_empty() {
        return 0;
    }

    let matched = if short.len() <= WORD_BITS {
        best_window_bit_parallel(short, long)
    } else {
        best_window_table(short, long)
    };

    // Both sides of a window have `short.len()` characters.
    let ratio = (2 * matched) as f64 / (2 * short.len()) as f64;
    (ratio * 100.0).round().clamp(0.0, 100.0) as u8
}

/// Longest common subsequence of `short` with the best window of `long`,
/// one machine word per window (`short` fits in 64 characters).
fn best_window_bit_parallel(short: &[char], long: &[char]) -> usize {
    let mut positions: HashMap<char, u64> = HashMap::new();
    for (i, c) in short.iter().enumerate() {
        *positions.entry(*c).or_insert(0) |= 1u64 << i;
    }
    let masks: Vec<u64> = long
        .iter()
        .map(|c| positions.get(c).copied().unwrap_or(0))
        .collect();
    let keep = if short.len() == WORD_BITS {
        u64::MAX
    } else {
        (1u64 << short.len()) - 1
    };

    let mut best = 0;
    for window in masks.windows(short.len()) {
        let mut state = u64::MAX;
        for &mask in window {
            let matched = state & mask;
            state = state.wrapping_add(matched) | (state - matched);
        }
        best = best.max((!state & keep).count_ones() as usize);
        if best == short.len() {
            break;
        }
    }
    best
}

/// Same as [`best_window_bit_parallel`] for strings longer than a word.
fn best_window_table(short: &[char], long: &[char]) -> usize {
    let mut row = vec![0usize; short.len() + 1];
    let mut best = 0;

    for window in long.windows(short.len()) {
        row.iter_mut().for_each(|cell| *cell = 0);
        for &c in window {
            let mut diagonal = 0;
            for (j, &s) in short.iter().enumerate() {
                let above = row[j + 1];
                row[j + 1] = if c == s {
                    diagonal + 1
                } else {
                    above.max(row[j])
                };
                diagonal = above;
            }
        }
        best = best.max(row[short.len()]);
        if best == short.len() {
            break;
        }
    }
    best
}
