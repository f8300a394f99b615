//! Chart rendering of summary tables using Plotters

use crate::aggregate::{GroupKey, SummaryTable};
use crate::error::{ExplorerError, Result};
use crate::schema::Response;
use crate::session::{Report, ViewOutcome};
use crate::summary::HistogramBin;
use plotters::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info};

const BLUE_DARK: RGBColor = RGBColor(0x22, 0x4E, 0x7F);
const EDGE: RGBColor = RGBColor(0x38, 0x5E, 0x88);
const PLUM: RGBColor = RGBColor(0x9A, 0x18, 0x7D);

/// Color palette for items in stacked and grouped charts
const ITEM_COLORS: [RGBColor; 6] = [
    RGBColor(0x22, 0x4E, 0x7F),
    RGBColor(0xEC, 0x00, 0x8C),
    RGBColor(0x58, 0x21, 0x56),
    RGBColor(0x9A, 0x18, 0x7D),
    RGBColor(0x38, 0x5E, 0x88),
    RGBColor(0x3E, 0x1D, 0x3D),
];

fn response_color(response: Response) -> RGBColor {
    match response {
        Response::Declined => BLUE_DARK,
        Response::Accepted => PLUM,
    }
}

fn group_label(key: &GroupKey) -> String {
    match &key.segment {
        Some(segment) => format!("{} | {}", key.response.code(), segment),
        None => key.response.to_string(),
    }
}

/// One chart file written by [`render_report`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedChart {
    pub view: String,
    pub path: PathBuf,
    /// The view had no data or failed and a placeholder was drawn
    pub placeholder: bool,
    /// Set when the chart itself could not be drawn
    pub error: Option<String>,
}

/// Grouped bar chart of mean values, one bar per response within each item
pub fn create_grouped_bar_chart(
    table: &SummaryTable,
    title: &str,
    output_path: &Path,
) -> Result<()> {
    draw_grouped_bars(table, title, output_path).map_err(render_error)
}

fn draw_grouped_bars(table: &SummaryTable, title: &str, output_path: &Path) -> anyhow::Result<()> {
    let labels = table.items.labels();
    let max_value = table.rows.iter().map(|r| r.value).fold(0.0, f64::max).max(1e-9);
    let n_items = labels.len();

    let root = BitMapBackend::new(output_path, (800, 500)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5f64..(n_items as f64 - 0.5), 0f64..(max_value * 1.1))?;

    chart
        .configure_mesh()
        .x_labels(n_items)
        .x_label_formatter(&|x| {
            let index = x.round();
            if index >= 0.0 && (index as usize) < labels.len() && (x - index).abs() < 1e-6 {
                labels[index as usize].to_string()
            } else {
                String::new()
            }
        })
        .y_desc("Mean")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    for (offset, response) in [(-0.2, Response::Declined), (0.2, Response::Accepted)] {
        let color = response_color(response);
        let bars: Vec<Rectangle<(f64, f64)>> = labels
            .iter()
            .enumerate()
            .filter_map(|(i, item)| {
                let value = table.value(response, None, item)?;
                let x = i as f64 + offset;
                Some(Rectangle::new([(x - 0.18, 0.0), (x + 0.18, value)], color.filled()))
            })
            .collect();

        chart
            .draw_series(bars)?
            .label(response.to_string())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .border_style(&BLACK)
        .background_style(&WHITE.mix(0.8))
        .draw()?;

    root.present()?;
    Ok(())
}

/// Stacked bar chart of mean shares, one bar per group
pub fn create_stacked_share_chart(
    table: &SummaryTable,
    title: &str,
    output_path: &Path,
) -> Result<()> {
    draw_stacked_shares(table, title, output_path).map_err(render_error)
}

fn draw_stacked_shares(
    table: &SummaryTable,
    title: &str,
    output_path: &Path,
) -> anyhow::Result<()> {
    let labels = table.items.labels();
    let groups: Vec<String> = table.groups.iter().map(|g| group_label(&g.key)).collect();
    let n_groups = groups.len();

    let root = BitMapBackend::new(output_path, (900, 500)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5f64..(n_groups as f64 - 0.5), 0f64..1.0f64)?;

    chart
        .configure_mesh()
        .x_labels(n_groups)
        .x_label_formatter(&|x| {
            let index = x.round();
            if index >= 0.0 && (index as usize) < groups.len() && (x - index).abs() < 1e-6 {
                groups[index as usize].clone()
            } else {
                String::new()
            }
        })
        .y_label_formatter(&|y| format!("{:.0}%", y * 100.0))
        .y_desc("Share")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    let mut base = vec![0.0f64; n_groups];
    for (item_index, item) in labels.iter().enumerate() {
        let color = ITEM_COLORS[item_index % ITEM_COLORS.len()];
        let mut bars = Vec::with_capacity(n_groups);
        for (group_index, group) in table.groups.iter().enumerate() {
            let value = table
                .group_rows(&group.key)
                .find(|r| r.item == *item)
                .map(|r| r.value)
                .unwrap_or(0.0);
            let x = group_index as f64;
            let bottom = base[group_index];
            bars.push(Rectangle::new(
                [(x - 0.35, bottom), (x + 0.35, bottom + value)],
                color.filled(),
            ));
            base[group_index] += value;
        }

        chart
            .draw_series(bars)?
            .label(*item)
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .border_style(&BLACK)
        .background_style(&WHITE.mix(0.8))
        .draw()?;

    root.present()?;
    Ok(())
}

/// Heatmap of mean values, items across and groups down
pub fn create_heatmap(table: &SummaryTable, title: &str, output_path: &Path) -> Result<()> {
    draw_heatmap(table, title, output_path).map_err(render_error)
}

fn draw_heatmap(table: &SummaryTable, title: &str, output_path: &Path) -> anyhow::Result<()> {
    let labels = table.items.labels();
    let groups: Vec<String> = table.groups.iter().map(|g| group_label(&g.key)).collect();
    let max_value = table.rows.iter().map(|r| r.value).fold(0.0, f64::max).max(1e-9);

    let height = 120 + 60 * groups.len() as u32;
    let root = BitMapBackend::new(output_path, (800, height)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(140)
        .build_cartesian_2d(0f64..labels.len() as f64, 0f64..groups.len() as f64)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(labels.len() * 2 + 1)
        .y_labels(groups.len() * 2 + 1)
        .x_label_formatter(&|x| centered_label(*x, &labels))
        .y_label_formatter(&|y| centered_label(*y, &groups))
        .draw()?;

    for (row, group) in table.groups.iter().enumerate() {
        let cells: Vec<Rectangle<(f64, f64)>> = table
            .group_rows(&group.key)
            .enumerate()
            .map(|(col, r)| {
                let color = PLUM.mix(0.1 + 0.9 * r.value / max_value);
                Rectangle::new(
                    [(col as f64, row as f64), (col as f64 + 1.0, row as f64 + 1.0)],
                    color.filled(),
                )
            })
            .collect();
        chart.draw_series(cells)?;
    }

    root.present()?;
    Ok(())
}

fn centered_label<S: AsRef<str>>(position: f64, labels: &[S]) -> String {
    let index = position - 0.5;
    if index >= 0.0 && (index - index.round()).abs() < 1e-6 {
        labels
            .get(index.round() as usize)
            .map(|s| s.as_ref().to_string())
            .unwrap_or_default()
    } else {
        String::new()
    }
}

/// Histogram of known incomes
pub fn create_histogram(bins: &[HistogramBin], title: &str, output_path: &Path) -> Result<()> {
    draw_histogram(bins, title, output_path).map_err(render_error)
}

fn draw_histogram(bins: &[HistogramBin], title: &str, output_path: &Path) -> anyhow::Result<()> {
    let (Some(first), Some(last)) = (bins.first(), bins.last()) else {
        anyhow::bail!("histogram has no bins");
    };
    let max_count = bins.iter().map(|b| b.count).max().unwrap_or(1).max(1) as f64;
    let x_max = if last.hi > first.lo { last.hi } else { first.lo + 1.0 };

    let root = BitMapBackend::new(output_path, (800, 500)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(first.lo..x_max, 0f64..(max_count * 1.1))?;

    chart
        .configure_mesh()
        .x_desc("Income")
        .y_desc("Customers")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    chart.draw_series(bins.iter().map(|b| {
        let hi = if b.hi > b.lo { b.hi } else { b.lo + 1.0 };
        Rectangle::new([(b.lo, 0.0), (hi, b.count as f64)], BLUE_DARK.filled())
    }))?;
    chart.draw_series(bins.iter().map(|b| {
        let hi = if b.hi > b.lo { b.hi } else { b.lo + 1.0 };
        Rectangle::new([(b.lo, 0.0), (hi, b.count as f64)], EDGE.stroke_width(1))
    }))?;

    root.present()?;
    Ok(())
}

/// Captioned empty image shown in place of a chart
pub fn create_placeholder(message: &str, output_path: &Path) -> Result<()> {
    draw_placeholder(message, output_path).map_err(render_error)
}

fn draw_placeholder(message: &str, output_path: &Path) -> anyhow::Result<()> {
    let root = BitMapBackend::new(output_path, (600, 200)).into_drawing_area();
    root.fill(&WHITE)?;
    root.draw(&Text::new(
        message.to_string(),
        (20, 90),
        ("sans-serif", 20).into_font().color(&BLACK),
    ))?;
    root.present()?;
    Ok(())
}

fn render_error<E: std::fmt::Display>(e: E) -> ExplorerError {
    ExplorerError::Render(e.to_string())
}

enum ChartKind {
    Grouped,
    Stacked,
    Heatmap,
}

fn render_table_view(
    view: &str,
    title: &str,
    kind: ChartKind,
    outcome: &ViewOutcome<SummaryTable>,
    path: PathBuf,
) -> RenderedChart {
    let (result, placeholder) = match outcome {
        ViewOutcome::Ready(table) => {
            let result = match kind {
                ChartKind::Grouped => create_grouped_bar_chart(table, title, &path),
                ChartKind::Stacked => create_stacked_share_chart(table, title, &path),
                ChartKind::Heatmap => create_heatmap(table, title, &path),
            };
            (result, false)
        }
        ViewOutcome::NoData(message) | ViewOutcome::Failed(message) => {
            (create_placeholder(message, &path), true)
        }
    };
    finish(view, path, placeholder, result)
}

fn finish(view: &str, path: PathBuf, placeholder: bool, result: Result<()>) -> RenderedChart {
    let error = match result {
        Ok(()) => {
            info!(view, path = %path.display(), "chart saved");
            None
        }
        Err(e) => {
            error!(view, error = %e, "chart rendering failed");
            Some(e.to_string())
        }
    };
    RenderedChart {
        view: view.to_string(),
        path,
        placeholder,
        error,
    }
}

/// Render every chart view of a report into `output_dir`
///
/// A chart that fails to draw is reported in its entry; the others are
/// still written.
pub fn render_report(report: &Report, output_dir: &Path) -> Result<Vec<RenderedChart>> {
    std::fs::create_dir_all(output_dir)?;
    let seg_suffix = match report.segmentation.column() {
        Some(column) => format!(" by {}", column),
        None => String::new(),
    };

    let mut charts = Vec::new();

    let income_path = output_dir.join("income_histogram.png");
    let (result, placeholder) = match &report.income_histogram {
        ViewOutcome::Ready(bins) => (
            create_histogram(bins, "Income distribution", &income_path),
            false,
        ),
        ViewOutcome::NoData(_) => (
            create_placeholder("No income values for the current filters", &income_path),
            true,
        ),
        ViewOutcome::Failed(message) => (create_placeholder(message, &income_path), true),
    };
    charts.push(finish("income_histogram", income_path, placeholder, result));

    charts.push(render_table_view(
        "channel_means",
        "Mean purchases by channel and response",
        ChartKind::Grouped,
        &report.channel_means,
        output_dir.join("channel_means.png"),
    ));
    charts.push(render_table_view(
        "category_means",
        "Mean spend by category and response",
        ChartKind::Grouped,
        &report.category_means,
        output_dir.join("category_means.png"),
    ));
    charts.push(render_table_view(
        "channel_mix",
        &format!("Channel mix (mean share){}", seg_suffix),
        ChartKind::Stacked,
        &report.channel_mix,
        output_dir.join("channel_mix.png"),
    ));
    charts.push(render_table_view(
        "spend_mix",
        &format!("Spend composition (mean share){}", seg_suffix),
        ChartKind::Stacked,
        &report.spend_mix,
        output_dir.join("spend_mix.png"),
    ));
    charts.push(render_table_view(
        "channel_intensity",
        &format!("Purchase intensity by channel (mean){}", seg_suffix),
        ChartKind::Heatmap,
        &report.channel_intensity,
        output_dir.join("channel_intensity.png"),
    ));

    Ok(charts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{channel_means, channel_mix, Segmentation};
    use crate::features::{derive_customer, tests::raw_customer, Customer};
    use tempfile::tempdir;

    fn customers() -> Vec<Customer> {
        (0..6)
            .map(|i| {
                let mut raw = raw_customer(i);
                raw.response = i % 2 == 0;
                raw.purchases.web = i as u32;
                derive_customer(&raw)
            })
            .collect()
    }

    #[test]
    fn test_create_grouped_bar_chart() {
        let customers = customers();
        let subset: Vec<&Customer> = customers.iter().collect();
        let table = channel_means(&subset).unwrap().summary().cloned().unwrap();
        let temp_dir = tempdir().unwrap();
        let output_path = temp_dir.path().join("means.png");

        create_grouped_bar_chart(&table, "Means", &output_path).unwrap();
        assert!(output_path.exists());
    }

    #[test]
    fn test_create_stacked_share_chart() {
        let customers = customers();
        let subset: Vec<&Customer> = customers.iter().collect();
        let table = channel_mix(&subset, Segmentation::Education)
            .unwrap()
            .summary()
            .cloned()
            .unwrap();
        let temp_dir = tempdir().unwrap();
        let output_path = temp_dir.path().join("mix.png");

        create_stacked_share_chart(&table, "Mix", &output_path).unwrap();
        assert!(output_path.exists());
    }

    #[test]
    fn test_create_placeholder() {
        let temp_dir = tempdir().unwrap();
        let output_path = temp_dir.path().join("empty.png");

        create_placeholder("No data for the current filters", &output_path).unwrap();
        assert!(output_path.exists());
    }

    #[test]
    fn test_centered_label() {
        let labels = ["Web", "Catalog"];
        assert_eq!(centered_label(0.5, &labels), "Web");
        assert_eq!(centered_label(1.5, &labels), "Catalog");
        assert_eq!(centered_label(1.0, &labels), "");
        assert_eq!(centered_label(2.5, &labels), "");
    }
}
