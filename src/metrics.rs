/// Characters per "word" in the standard WPM convention.
const CHARS_PER_WORD: f64 = 5.0;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Characters typed across `typed`, counting one separator between adjacent words.
pub fn total_typed_chars<S: AsRef<str>>(typed: &[S]) -> usize {
    let letters: usize = typed.iter().map(|w| w.as_ref().chars().count()).sum();
    letters + typed.len().saturating_sub(1)
}

/// Character positions that differ between each typed word and its target.
///
/// Positions past the end of the shorter string count as mismatches, so a
/// missing or extra character is one error each.
pub fn uncorrected_errors<S: AsRef<str>, T: AsRef<str>>(typed: &[S], target: &[T]) -> usize {
    typed
        .iter()
        .zip(target.iter())
        .map(|(typed, target)| {
            let typed: Vec<char> = typed.as_ref().chars().collect();
            let target: Vec<char> = target.as_ref().chars().collect();
            (0..typed.len().max(target.len()))
                .filter(|&i| typed.get(i) != target.get(i))
                .count()
        })
        .sum()
}

/// Net words per minute: `(typed chars - uncorrected errors) / 5 / minutes`.
///
/// Floored at zero and rounded to two decimals. Zero elapsed time yields 0.
pub fn compute_wpm<S: AsRef<str>, T: AsRef<str>>(
    typed: &[S],
    target: &[T],
    elapsed_secs: f64,
) -> f64 {
    if elapsed_secs <= 0.0 || !elapsed_secs.is_finite() {
        return 0.0;
    }

    let total = total_typed_chars(typed) as f64;
    let errors = uncorrected_errors(typed, target) as f64;
    let minutes = elapsed_secs / 60.0;
    let net = ((total - errors) / CHARS_PER_WORD) / minutes;

    round2(net.max(0.0))
}

/// Percentage of typed characters not covered by `typo_count`, rounded to two decimals.
pub fn compute_accuracy<S: AsRef<str>, T: AsRef<str>>(
    typed: &[S],
    target: &[T],
    typo_count: usize,
) -> f64 {
    if typed.is_empty() || target.is_empty() {
        return 0.0;
    }

    let typed_chars: usize = typed.iter().map(|w| w.as_ref().chars().count()).sum();
    if typed_chars == 0 {
        return 0.0;
    }

    let effective_typos = typo_count.min(typed_chars);
    round2((typed_chars - effective_typos) as f64 / typed_chars as f64 * 100.0)
}
