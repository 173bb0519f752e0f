//! Terminal charts.
//!
//! A [`Figure`] is plain data (panels of line series or matrices) and renders
//! to a `String`. Confusion matrices are drawn as shaded tables placed side by
//! side; training history is drawn as one line chart per metric family, stacked.
//!
//! Line panels are rasterized with `trueno_viz` and encoded for the terminal;
//! matrix panels are drawn directly as text.
//!
//! The data model is independent of the renderer, so a figure can also be
//! exported (feature `serde`) and drawn by an external tool.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use trueno_viz::output::{TerminalEncoder, TerminalMode};
use trueno_viz::plots::{LossCurve, MetricSeries};
use trueno_viz::prelude::{Rgba, WithDimensions};

use crate::{ConfusionMatrix, History, NormalizedConfusionMatrix};

const PANEL_GAP: &str = "    ";

/// Shading for matrix cells. Also picks the line chart encoding: half blocks
/// for [`Shading::Blocks`], ASCII otherwise.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Shading {
    /// Unicode blocks, light to dark.
    #[default]
    Blocks,
    /// Plain ASCII ramp.
    Ascii,
    /// Numbers only.
    None,
}

impl Shading {
    fn ramp(self) -> &'static [char] {
        match self {
            Shading::Blocks => &[' ', '░', '▒', '▓', '█'],
            Shading::Ascii => &[' ', '.', ':', '+', '#'],
            Shading::None => &[],
        }
    }
}

/// Cosmetic rendering options.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Line chart width, in terminal columns.
    pub width: usize,
    /// Line chart height, in pixel rows (two per terminal line).
    pub height: usize,
    pub shading: Shading,
    /// Decimals for normalized matrix cells.
    pub digits: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 80,
            height: 20,
            shading: Shading::Blocks,
            digits: 2,
        }
    }
}

/// One curve: a label and `(x, y)` points.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    /// Epoch index of every point.
    pub x: Vec<usize>,
    pub y: Vec<f32>,
}

impl Series {
    /// A series over epochs `0..values.len()`.
    pub fn over_epochs(label: impl Into<String>, values: &[f32]) -> Self {
        Self {
            label: label.into(),
            x: (0..values.len()).collect(),
            y: values.to_vec(),
        }
    }
}

/// A line chart of one or more series.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct LinePanel {
    pub title: String,
    pub series: Vec<Series>,
}

/// A square matrix with row and column labels.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixPanel {
    pub title: String,
    pub labels: Vec<String>,
    /// Row-major `(labels.len(), labels.len())`.
    pub cells: Vec<f64>,
    /// Draw cells as integers rather than fractions.
    pub counts: bool,
}

impl MatrixPanel {
    pub fn from_counts(title: impl Into<String>, cm: &ConfusionMatrix) -> Self {
        let n = cm.num_classes();
        let mut cells = Vec::with_capacity(n * n);
        for t in 0..n {
            cells.extend(cm.row(t).iter().map(|&c| c as f64));
        }
        Self {
            title: title.into(),
            labels: cm.classes().names().to_vec(),
            cells,
            counts: true,
        }
    }

    pub fn from_normalized(title: impl Into<String>, cm: &NormalizedConfusionMatrix) -> Self {
        let n = cm.num_classes();
        let mut cells = Vec::with_capacity(n * n);
        for t in 0..n {
            cells.extend_from_slice(cm.row(t));
        }
        Self {
            title: title.into(),
            labels: cm.classes().names().to_vec(),
            cells,
            counts: cm.mode() == crate::Normalize::None,
        }
    }
}

/// One chart within a [`Figure`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq)]
pub enum Panel {
    Lines(LinePanel),
    Matrix(MatrixPanel),
}

impl Panel {
    pub fn title(&self) -> &str {
        match self {
            Panel::Lines(p) => &p.title,
            Panel::Matrix(p) => &p.title,
        }
    }
}

/// How panels are arranged.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// Left to right.
    #[default]
    Row,
    /// Top to bottom.
    Column,
}

/// Titled panels and how to arrange them.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Figure {
    pub title: Option<String>,
    pub layout: Layout,
    pub panels: Vec<Panel>,
}

/// One line chart per metric family; validation curves are overlaid when present.
pub fn history_figure(history: &History) -> Figure {
    let panels = history
        .families()
        .into_iter()
        .map(|family| {
            let mut series = vec![Series::over_epochs(family.name, family.train)];
            if let Some(val) = family.validation {
                series.push(Series::over_epochs(
                    format!("{}{}", crate::history::VALIDATION_PREFIX, family.name),
                    val,
                ));
            }
            Panel::Lines(LinePanel {
                title: family.name.to_owned(),
                series,
            })
        })
        .collect();

    Figure {
        title: Some("Training history".to_owned()),
        layout: Layout::Column,
        panels,
    }
}

/// Raw and normalized confusion matrices, side by side.
pub fn confusion_figure(
    title: impl Into<String>,
    raw: &ConfusionMatrix,
    normalized: &NormalizedConfusionMatrix,
) -> Figure {
    Figure {
        title: Some(title.into()),
        layout: Layout::Row,
        panels: vec![
            Panel::Matrix(MatrixPanel::from_counts("Confusion matrix", raw)),
            Panel::Matrix(MatrixPanel::from_normalized(
                format!("Normalized ({})", normalized.mode()),
                normalized,
            )),
        ],
    }
}

impl Figure {
    /// Render the figure as text.
    pub fn render(&self, opts: &RenderOptions) -> String {
        let blocks: Vec<Vec<String>> = self
            .panels
            .iter()
            .map(|p| match p {
                Panel::Lines(lines) => render_lines(lines, opts),
                Panel::Matrix(matrix) => render_matrix(matrix, opts),
            })
            .collect();

        let mut out = String::new();
        if let Some(title) = &self.title {
            out.push_str(title);
            out.push('\n');
            out.push_str(&"=".repeat(title.chars().count()));
            out.push('\n');
        }

        match self.layout {
            Layout::Row => {
                for line in side_by_side(&blocks) {
                    out.push_str(&line);
                    out.push('\n');
                }
            }
            Layout::Column => {
                for (i, block) in blocks.iter().enumerate() {
                    if i > 0 {
                        out.push('\n');
                    }
                    for line in block {
                        out.push_str(line.trim_end());
                        out.push('\n');
                    }
                }
            }
        }
        out
    }
}

impl fmt::Display for Figure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(&RenderOptions::default()))
    }
}

fn width_of(line: &str) -> usize {
    line.chars().count()
}

fn side_by_side(blocks: &[Vec<String>]) -> Vec<String> {
    let widths: Vec<usize> = blocks
        .iter()
        .map(|b| b.iter().map(|l| width_of(l)).max().unwrap_or(0))
        .collect();
    let height = blocks.iter().map(Vec::len).max().unwrap_or(0);

    (0..height)
        .map(|r| {
            let mut line = String::new();
            for (i, block) in blocks.iter().enumerate() {
                if i > 0 {
                    line.push_str(PANEL_GAP);
                }
                let cell = block.get(r).map_or("", String::as_str);
                line.push_str(&format!("{cell:<w$}", w = widths[i]));
            }
            line.trim_end().to_owned()
        })
        .collect()
}

fn render_matrix(panel: &MatrixPanel, opts: &RenderOptions) -> Vec<String> {
    let n = panel.labels.len();
    let ramp = opts.shading.ramp();
    let max = panel.cells.iter().copied().fold(0.0_f64, f64::max);

    let cell_text = |v: f64| -> String {
        let value = if panel.counts {
            format!("{}", v.round() as u64)
        } else {
            format!("{v:.d$}", d = opts.digits)
        };
        if ramp.is_empty() {
            return value;
        }
        let level = if max > 0.0 {
            ((v / max) * (ramp.len() - 1) as f64).round() as usize
        } else {
            0
        };
        format!("{}{value}", ramp[level.min(ramp.len() - 1)])
    };

    let texts: Vec<String> = panel.cells.iter().map(|&v| cell_text(v)).collect();
    let cw = texts
        .iter()
        .map(|t| width_of(t))
        .chain(panel.labels.iter().map(|l| width_of(l)))
        .max()
        .unwrap_or(1);
    let lw = panel.labels.iter().map(|l| width_of(l)).max().unwrap_or(1);

    let mut lines = Vec::with_capacity(n + 4);
    lines.push(panel.title.clone());

    let header: Vec<String> = panel.labels.iter().map(|l| format!("{l:>cw$}")).collect();
    lines.push(format!("{:>lw$} │ {}", "", header.join(" ")));
    lines.push(format!(
        "{}─┼─{}",
        "─".repeat(lw),
        "─".repeat((n * (cw + 1)).saturating_sub(1))
    ));

    for t in 0..n {
        let row: Vec<String> = texts[t * n..(t + 1) * n]
            .iter()
            .map(|c| format!("{c:>cw$}"))
            .collect();
        lines.push(format!("{:>lw$} │ {}", panel.labels[t], row.join(" ")));
    }
    lines.push("rows: true, columns: predicted".to_owned());
    lines
}

/// Line colors, cycled per series. Only visible with a color terminal mode.
const PALETTE: [(u8, u8, u8, &str); 4] = [
    (66, 133, 244, "blue"),
    (255, 128, 0, "orange"),
    (52, 168, 83, "green"),
    (219, 68, 55, "red"),
];

/// Metrics where a smaller value is better; drives the best-value markers.
fn lower_is_better(title: &str) -> bool {
    ["loss", "error", "mse", "mae"]
        .iter()
        .any(|k| title.to_ascii_lowercase().contains(k))
}

fn render_lines(panel: &LinePanel, opts: &RenderOptions) -> Vec<String> {
    let mut lines = vec![panel.title.clone()];
    let epochs = panel.series.iter().map(|s| s.y.len()).max().unwrap_or(0);
    if epochs < 2 {
        lines.push("(need at least two epochs)".to_owned());
        return lines;
    }

    let width = u32::try_from(opts.width).unwrap_or(u32::MAX);
    let height = u32::try_from(opts.height).unwrap_or(u32::MAX);

    let mut builder = LossCurve::new();
    for (i, series) in panel.series.iter().enumerate() {
        let (r, g, b, _) = PALETTE[i % PALETTE.len()];
        builder = builder.add_series(MetricSeries::new(series.label.as_str(), Rgba::rgb(r, g, b)));
    }
    let mut curve = match builder
        .dimensions(width, height)
        .margin(2)
        .best_markers(true)
        .lower_is_better(lower_is_better(&panel.title))
        .build()
    {
        Ok(curve) => curve,
        Err(err) => {
            tracing::warn!(panel = %panel.title, error = ?err, "failed to build line chart");
            lines.push("(render error)".to_owned());
            return lines;
        }
    };

    for (i, series) in panel.series.iter().enumerate() {
        // Diverged epochs (NaN/inf) are dropped from the curve.
        for &v in series.y.iter().filter(|v| v.is_finite()) {
            curve.push(i, v);
        }
    }

    let fb = match curve.to_framebuffer() {
        Ok(fb) => fb,
        Err(_) => {
            tracing::warn!(panel = %panel.title, "failed to rasterize line chart");
            lines.push("(render error)".to_owned());
            return lines;
        }
    };

    let mode = match opts.shading {
        Shading::Blocks => TerminalMode::UnicodeHalfBlock,
        Shading::Ascii | Shading::None => TerminalMode::Ascii,
    };
    // Terminal cells are roughly twice as tall as they are wide.
    let text = TerminalEncoder::new()
        .mode(mode)
        .width(width)
        .height((height / 2).max(1))
        .render(&fb);
    lines.extend(text.lines().map(str::to_owned));

    lines.push(format!("epochs 0..{}", epochs - 1));
    let legend: Vec<String> = panel
        .series
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{} ({})", s.label, PALETTE[i % PALETTE.len()].3))
        .collect();
    lines.push(legend.join("   "));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClassSet;

    #[test]
    fn history_figure_has_one_panel_per_family() {
        let history = History::new()
            .with("accuracy", vec![0.5, 0.6])
            .with("val_accuracy", vec![0.4, 0.55]);
        let fig = history_figure(&history);

        assert_eq!(fig.panels.len(), 1);
        let Panel::Lines(panel) = &fig.panels[0] else {
            panic!("expected a line panel");
        };
        assert_eq!(panel.title, "accuracy");
        assert_eq!(panel.series.len(), 2);
        assert_eq!(panel.series[0].x, vec![0, 1]);
        assert_eq!(panel.series[0].x, panel.series[1].x);
        assert_eq!(panel.series[1].label, "val_accuracy");
    }

    #[test]
    fn line_chart_renders_curve_and_legend() {
        let history = History::new()
            .with("loss", vec![1.0, 0.8, 0.6, 0.5, 0.4, 0.35, 0.3, 0.28, 0.26, 0.25])
            .with("val_loss", vec![1.1, 0.9, 0.8, 0.7, 0.65, 0.62, 0.6, 0.6, 0.61, 0.6]);
        let text = history_figure(&history).render(&RenderOptions::default());

        assert!(text.starts_with("Training history\n"));
        assert!(!text.contains("render error"));
        assert!(text.contains("epochs 0..9"));
        assert!(text.contains("loss (blue)   val_loss (orange)"));
        // title + encoded chart + axis note + legend
        assert!(text.lines().count() > 5);
    }

    #[test]
    fn ascii_shading_renders_line_chart() {
        let panel = LinePanel {
            title: "accuracy".to_owned(),
            series: vec![Series::over_epochs(
                "accuracy",
                &[0.1, 0.3, 0.5, 0.6, 0.7, 0.75, 0.8, 0.82, 0.84, 0.85],
            )],
        };
        let lines = render_lines(
            &panel,
            &RenderOptions {
                shading: Shading::Ascii,
                ..RenderOptions::default()
            },
        );
        assert_eq!(lines[0], "accuracy");
        assert!(lines.len() > 3);
        assert_eq!(lines.last().unwrap(), "accuracy (blue)");
    }

    #[test]
    fn non_finite_points_are_dropped() {
        let panel = LinePanel {
            title: "loss".to_owned(),
            series: vec![Series::over_epochs(
                "loss",
                &[1.0, 0.8, f32::NAN, 0.6, f32::INFINITY, 0.5, 0.45, 0.4],
            )],
        };
        let lines = render_lines(&panel, &RenderOptions::default());
        assert!(lines.len() > 3);
        assert_eq!(lines[lines.len() - 2], "epochs 0..7");
    }

    #[test]
    fn single_epoch_is_not_drawn() {
        let panel = LinePanel {
            title: "acc".to_owned(),
            series: vec![Series::over_epochs("acc", &[0.5])],
        };
        assert_eq!(
            render_lines(&panel, &RenderOptions::default())[1],
            "(need at least two epochs)"
        );

        let empty = LinePanel {
            title: "acc".to_owned(),
            series: vec![],
        };
        assert_eq!(render_lines(&empty, &RenderOptions::default()).len(), 2);
    }

    #[test]
    fn lower_is_better_follows_metric_name() {
        assert!(lower_is_better("loss"));
        assert!(lower_is_better("val_MSE"));
        assert!(!lower_is_better("accuracy"));
    }

    #[test]
    fn confusion_figure_places_matrices_side_by_side() {
        let y_true = [0, 0, 1, 1];
        let y_pred = [0, 1, 1, 1];
        let names = vec!["muffin".to_owned(), "dog".to_owned()];
        let classes = ClassSet::resolve(&y_true, &y_pred, Some(&names[..])).unwrap();
        let raw = ConfusionMatrix::from_indices(&y_true, &y_pred, &classes).unwrap();
        let norm = raw.normalize(crate::Normalize::True);

        let fig = confusion_figure("test", &raw, &norm);
        let text = fig.render(&RenderOptions {
            shading: Shading::None,
            ..RenderOptions::default()
        });

        let title_line = text
            .lines()
            .find(|l| l.contains("Confusion matrix"))
            .unwrap();
        assert!(title_line.contains("Normalized (true)"));

        let dog_row = text.lines().find(|l| l.trim_start().starts_with("dog")).unwrap();
        assert!(dog_row.contains('2'));
        assert!(dog_row.contains("1.00"));
    }

    #[test]
    fn shading_marks_the_largest_cell_darkest() {
        let panel = MatrixPanel {
            title: "m".to_owned(),
            labels: vec!["a".to_owned(), "b".to_owned()],
            cells: vec![4.0, 0.0, 1.0, 3.0],
            counts: true,
        };
        let lines = render_matrix(&panel, &RenderOptions::default());
        assert!(lines[3].contains("█4"));
        assert!(lines[4].contains("▓3"));
    }
}
