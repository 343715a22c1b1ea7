use crate::types::TractRecord;

/// Means over tracts that pass the sample-size check; `total_tracts`
/// counts every tract on the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryStats {
    pub mean_white_rate: f64,
    pub mean_black_rate: f64,
    pub mean_gap: f64,
    pub total_tracts: usize,
}

impl SummaryStats {
    pub fn lines(&self) -> [String; 4] {
        [
            format!("Average White Rate: {}", percent(self.mean_white_rate)),
            format!("Average Black Rate: {}", percent(self.mean_black_rate)),
            format!("Average Gap: {}", percent(self.mean_gap)),
            format!("Total Tracts: {}", self.total_tracts),
        ]
    }
}

/// Returns `None` when no tract has enough applications to average.
pub fn summarize(tracts: &[TractRecord]) -> Option<SummaryStats> {
    let valid: Vec<&TractRecord> = tracts.iter().filter(|t| t.has_sufficient_data()).collect();
    if valid.is_empty() {
        return None;
    }

    let n = valid.len() as f64;
    let mean = |f: fn(&TractRecord) -> f64| valid.iter().map(|t| f(t)).sum::<f64>() / n;

    Some(SummaryStats {
        mean_white_rate: mean(|t| t.white_rate),
        mean_black_rate: mean(|t| t.black_rate),
        mean_gap: mean(|t| t.gap),
        total_tracts: tracts.len(),
    })
}

fn percent(fraction: f64) -> String {
    format!("{:.1}%", fraction * 100.0)
}
