use termtypr::result::GameResult;

/// Points for the WPM trend chart: x is the 1-based test number.
pub fn trend_points(results: &[GameResult], last: usize) -> Vec<(f64, f64)> {
    let skip = results.len().saturating_sub(last);
    results
        .iter()
        .enumerate()
        .skip(skip)
        .map(|(i, r)| ((i + 1) as f64, r.wpm))
        .collect()
}

/// X bounds and rounded top WPM for the trend chart.
pub fn chart_bounds(points: &[(f64, f64)]) -> ([f64; 2], f64) {
    let highest_wpm = points.iter().map(|&(_, wpm)| wpm).fold(0.0, f64::max);

    let first = points.first().map_or(1.0, |p| p.0);
    let mut last = points.last().map_or(1.0, |p| p.0);
    if last <= first {
        last = first + 1.0;
    }

    ([first, last], highest_wpm.ceil().max(1.0))
}

pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.1}")
    }
}
