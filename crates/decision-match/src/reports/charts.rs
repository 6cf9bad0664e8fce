//! Self-contained SVG charts for the generated reports.

use std::fmt::Write as _;

const WIDTH: f64 = 640.0;
const HEIGHT: f64 = 400.0;
const MARGIN_LEFT: f64 = 60.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 90.0;
const BAR_COLOR: &str = "#4c72b0";

pub(crate) fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn plot_width() -> f64 {
    WIDTH - MARGIN_LEFT - MARGIN_RIGHT
}

fn plot_height() -> f64 {
    HEIGHT - MARGIN_TOP - MARGIN_BOTTOM
}

fn open_svg(svg: &mut String, title: &str, x_label: &str, y_label: &str, y_max: f64) {
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}" font-family="sans-serif">"#
    );
    let _ = write!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);
    let _ = write!(
        svg,
        r#"<text x="{}" y="24" font-size="16" text-anchor="middle">{}</text>"#,
        WIDTH / 2.0,
        escape(title)
    );

    let bottom = MARGIN_TOP + plot_height();
    let _ = write!(
        svg,
        r##"<line x1="{MARGIN_LEFT}" y1="{MARGIN_TOP}" x2="{MARGIN_LEFT}" y2="{bottom}" stroke="#333"/><line x1="{MARGIN_LEFT}" y1="{bottom}" x2="{}" y2="{bottom}" stroke="#333"/>"##,
        MARGIN_LEFT + plot_width()
    );
    for tick in 0..=4 {
        let value = y_max * f64::from(tick) / 4.0;
        let y = bottom - plot_height() * f64::from(tick) / 4.0;
        let _ = write!(
            svg,
            r#"<text x="{}" y="{y:.1}" font-size="10" text-anchor="end">{}</text>"#,
            MARGIN_LEFT - 6.0,
            format_tick(value)
        );
    }
    let _ = write!(
        svg,
        r#"<text x="{}" y="{}" font-size="12" text-anchor="middle">{}</text>"#,
        MARGIN_LEFT + plot_width() / 2.0,
        HEIGHT - 10.0,
        escape(x_label)
    );
    let _ = write!(
        svg,
        r#"<text x="16" y="{}" font-size="12" text-anchor="middle" transform="rotate(-90 16 {})">{}</text>"#,
        MARGIN_TOP + plot_height() / 2.0,
        MARGIN_TOP + plot_height() / 2.0,
        escape(y_label)
    );
}

fn format_tick(value: f64) -> String {
    if value >= 10.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

fn axis_max(values: impl Iterator<Item = f64>) -> f64 {
    let max = values.filter(|v| v.is_finite()).fold(0.0, f64::max);
    if max > 0.0 {
        max
    } else {
        1.0
    }
}

/// Vertical bar chart, one bar per label in the given order.
#[derive(Debug, Clone, PartialEq)]
pub struct BarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub bars: Vec<(String, f64)>,
}

impl BarChart {
    pub fn to_svg(&self) -> String {
        let y_max = axis_max(self.bars.iter().map(|(_, value)| *value));
        let mut svg = String::new();
        open_svg(&mut svg, &self.title, &self.x_label, &self.y_label, y_max);

        let bottom = MARGIN_TOP + plot_height();
        let slot = plot_width() / self.bars.len().max(1) as f64;
        for (index, (label, value)) in self.bars.iter().enumerate() {
            let height = plot_height() * value.max(0.0) / y_max;
            let x = MARGIN_LEFT + slot * index as f64 + slot * 0.1;
            let center = x + slot * 0.4;
            let _ = write!(
                svg,
                r#"<rect x="{x:.1}" y="{:.1}" width="{:.1}" height="{height:.1}" fill="{BAR_COLOR}"><title>{}: {value}</title></rect>"#,
                bottom - height,
                slot * 0.8,
                escape(label)
            );
            let _ = write!(
                svg,
                r#"<text x="{center:.1}" y="{:.1}" font-size="10" text-anchor="end" transform="rotate(-45 {center:.1} {:.1})">{}</text>"#,
                bottom + 14.0,
                bottom + 14.0,
                escape(label)
            );
        }
        svg.push_str("</svg>\n");
        svg
    }
}

/// One distribution drawn in an overlaid histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct Series<'a> {
    pub name: &'a str,
    pub values: &'a [f64],
    pub color: &'a str,
}

/// Relative frequency of `values` in `bins` equal-width bins over `[min, max]`.
/// The last bin is closed.
pub fn relative_frequencies(values: &[f64], min: f64, max: f64, bins: usize) -> Vec<f64> {
    let mut counts = vec![0usize; bins];
    let width = (max - min) / bins as f64;
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    for value in &finite {
        let index = if width > 0.0 {
            (((value - min) / width) as usize).min(bins - 1)
        } else {
            0
        };
        counts[index] += 1;
    }
    let total = finite.len().max(1) as f64;
    counts.into_iter().map(|count| count as f64 / total).collect()
}

/// Overlaid semi-transparent histograms sharing the same bins.
pub fn histogram_svg(title: &str, x_label: &str, series: &[Series<'_>], bins: usize) -> String {
    let bins = bins.max(1);
    let all = series.iter().flat_map(|s| s.values.iter().copied()).filter(|v| v.is_finite());
    let (min, max) = all.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    let (min, max) = if min.is_finite() { (min, max) } else { (0.0, 1.0) };

    let frequencies: Vec<Vec<f64>> = series
        .iter()
        .map(|s| relative_frequencies(s.values, min, max, bins))
        .collect();
    let y_max = axis_max(frequencies.iter().flatten().copied());

    let mut svg = String::new();
    open_svg(&mut svg, title, x_label, "relative frequency", y_max);
    let bottom = MARGIN_TOP + plot_height();
    let slot = plot_width() / bins as f64;
    for (s, values) in series.iter().zip(&frequencies) {
        for (index, frequency) in values.iter().enumerate() {
            let height = plot_height() * frequency / y_max;
            if height <= 0.0 {
                continue;
            }
            let _ = write!(
                svg,
                r#"<rect x="{:.1}" y="{:.1}" width="{slot:.1}" height="{height:.1}" fill="{}" fill-opacity="0.6"/>"#,
                MARGIN_LEFT + slot * index as f64,
                bottom - height,
                escape(s.color)
            );
        }
    }

    let _ = write!(
        svg,
        r#"<text x="{MARGIN_LEFT}" y="{}" font-size="10">{}</text><text x="{}" y="{}" font-size="10" text-anchor="end">{}</text>"#,
        bottom + 14.0,
        format_tick(min),
        MARGIN_LEFT + plot_width(),
        bottom + 14.0,
        format_tick(max)
    );
    for (index, s) in series.iter().enumerate() {
        let y = bottom + 40.0 + 16.0 * index as f64;
        let _ = write!(
            svg,
            r#"<rect x="{MARGIN_LEFT}" y="{:.1}" width="10" height="10" fill="{}" fill-opacity="0.6"/><text x="{}" y="{y:.1}" font-size="11">{}</text>"#,
            y - 9.0,
            escape(s.color),
            MARGIN_LEFT + 16.0,
            escape(s.name)
        );
    }
    svg.push_str("</svg>\n");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_chart_escapes_labels_and_draws_every_bar() {
        let chart = BarChart {
            title: "Média de palavras".to_string(),
            x_label: "Vaga".to_string(),
            y_label: "Palavras".to_string(),
            bars: vec![("dados & bi".to_string(), 12.0), ("<dev>".to_string(), 6.0)],
        };
        let svg = chart.to_svg();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("dados &amp; bi"));
        assert!(svg.contains("&lt;dev&gt;"));
        assert_eq!(svg.matches("<rect x=").count(), 2);
    }

    #[test]
    fn frequencies_sum_to_one_with_closed_last_bin() {
        let frequencies = relative_frequencies(&[0.0, 0.5, 1.0, 1.0], 0.0, 1.0, 4);
        assert_eq!(frequencies, vec![0.25, 0.0, 0.25, 0.5]);
        assert_eq!(relative_frequencies(&[], 0.0, 1.0, 2), vec![0.0, 0.0]);
    }

    #[test]
    fn histogram_lists_every_series_in_the_legend() {
        let reference = [0.1, 0.2, 0.2];
        let current = [0.3];
        let svg = histogram_svg(
            "drift",
            "score_tecnico",
            &[
                Series { name: "reference", values: &reference, color: "#4c72b0" },
                Series { name: "current", values: &current, color: "#dd8452" },
            ],
            10,
        );
        assert!(svg.contains(">reference</text>"));
        assert!(svg.contains(">current</text>"));
    }
}
