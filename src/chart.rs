//! Terminal histograms for analysis results.

use colored::Colorize;

const BAR_WIDTH: usize = 40;

/// Distribution of one derived column, binned for display.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// Chart title.
    pub title: String,
    /// Label for the binned axis.
    pub x_label: String,
    /// Label for the count axis.
    pub y_label: String,
    /// Number of equal-width bins.
    pub bins: usize,
    /// Raw values.
    pub values: Vec<f64>,
}

/// One bin: `[start, end)`, with the last bin closed on the right.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    /// Inclusive lower edge.
    pub start: f64,
    /// Upper edge.
    pub end: f64,
    /// Values that fell into the bin.
    pub count: usize,
}

impl Histogram {
    /// Creates a histogram over `values`.
    pub fn new(
        title: impl Into<String>,
        x_label: impl Into<String>,
        y_label: impl Into<String>,
        bins: usize,
        values: Vec<f64>,
    ) -> Self {
        Self {
            title: title.into(),
            x_label: x_label.into(),
            y_label: y_label.into(),
            bins: bins.max(1),
            values,
        }
    }

    /// Splits the value range into equal-width bins and counts values per bin.
    ///
    /// A range collapsed to a single value `v` spans `[v - 0.5, v + 0.5]`.
    pub fn binned(&self) -> Vec<Bin> {
        let Some((min, max)) = self.range() else {
            return Vec::new();
        };
        let (lo, hi) = if min == max {
            (min - 0.5, max + 0.5)
        } else {
            (min, max)
        };
        let width = (hi - lo) / self.bins as f64;
        let mut bins: Vec<Bin> = (0..self.bins)
            .map(|i| Bin {
                start: lo + width * i as f64,
                end: if i + 1 == self.bins {
                    hi
                } else {
                    lo + width * (i + 1) as f64
                },
                count: 0,
            })
            .collect();
        for value in &self.values {
            let idx = (((value - lo) / width).floor() as usize).min(self.bins - 1);
            bins[idx].count += 1;
        }
        bins
    }

    fn range(&self) -> Option<(f64, f64)> {
        let mut iter = self.values.iter().copied().filter(|v| v.is_finite());
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }

    /// Renders the chart as plain lines (no trailing newline).
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("{}\n", self.title.bold()));
        let bins = self.binned();
        if bins.is_empty() {
            out.push_str("  (no data)");
            return out;
        }
        let peak = bins.iter().map(|b| b.count).max().unwrap_or(0).max(1);
        let labels: Vec<String> = bins
            .iter()
            .map(|b| format!("{:>8.1} - {:<8.1}", b.start, b.end))
            .collect();
        let label_width = labels.iter().map(String::len).max().unwrap_or(0);
        out.push_str(&format!(
            "{:<label_width$} | {}\n",
            self.x_label, self.y_label
        ));
        for (bin, label) in bins.iter().zip(&labels) {
            let len = bin.count * BAR_WIDTH / peak;
            let bar = "█".repeat(len);
            out.push_str(&format!(
                "{:<label_width$} | {} {}\n",
                label,
                bar.blue(),
                bin.count
            ));
        }
        out.push_str(&format!(
            "{:<label_width$} +-{}\n{:<label_width$}   0{:>width$}",
            "",
            "-".repeat(BAR_WIDTH),
            "",
            peak,
            width = BAR_WIDTH
        ));
        out
    }
}
