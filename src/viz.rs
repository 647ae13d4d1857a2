//! Segment charts rendered with Plotters to SVG

use std::path::Path;

use plotters::coord::ranged1d::SegmentValue;
use plotters::prelude::*;

use crate::model::RfmTable;
use crate::segment::Segment;

/// One colour per segment, in `Segment::ALL` order
const SEGMENT_COLORS: [RGBColor; 10] = [
    RGBColor(120, 120, 120),
    RGBColor(230, 126, 34),
    RGBColor(192, 57, 43),
    RGBColor(241, 196, 15),
    RGBColor(155, 89, 182),
    RGBColor(41, 128, 185),
    RGBColor(26, 188, 156),
    RGBColor(46, 204, 113),
    RGBColor(52, 73, 94),
    RGBColor(211, 84, 0),
];

fn segment_color(segment: Segment) -> RGBColor {
    let index = Segment::ALL
        .iter()
        .position(|s| *s == segment)
        .unwrap_or(0);
    SEGMENT_COLORS[index]
}

/// Bar chart of customers per segment.
pub fn create_segment_size_chart(table: &RfmTable, output_path: &Path) -> crate::Result<()> {
    let counts = table.segment_counts();
    let sizes: Vec<(u32, u32, Segment)> = Segment::ALL
        .iter()
        .enumerate()
        .map(|(i, segment)| (i as u32, counts.get(segment).copied().unwrap_or(0) as u32, *segment))
        .collect();
    let max_size = sizes.iter().map(|(_, size, _)| *size).max().unwrap_or(0).max(1);

    let root = SVGBackend::new(output_path, (1000, 500)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Customers per Segment", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(
            (0u32..Segment::ALL.len() as u32).into_segmented(),
            0u32..(max_size + max_size / 10 + 1),
        )?;

    let label_of = |value: &SegmentValue<u32>| match value {
        SegmentValue::Exact(i) | SegmentValue::CenterOf(i) => Segment::ALL
            .get(*i as usize)
            .map(|s| s.label().to_string())
            .unwrap_or_default(),
        SegmentValue::Last => String::new(),
    };

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(Segment::ALL.len())
        .x_label_formatter(&label_of)
        .x_desc("Segment")
        .y_desc("Number of Customers")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    for (index, size, segment) in sizes {
        let color = segment_color(segment);
        chart.draw_series(
            Histogram::vertical(&chart)
                .style(color.filled())
                .margin(8)
                .data(std::iter::once((index, size))),
        )?;
    }

    root.present()?;
    Ok(())
}

/// Scatter plot of frequency against monetary value, coloured by segment.
///
/// # Arguments
/// * `table` - Scored and classified customers
/// * `output_path` - Path to save the SVG plot
pub fn create_segment_scatter(table: &RfmTable, output_path: &Path) -> crate::Result<()> {
    let max_frequency = table.iter().map(|r| f64::from(r.frequency)).fold(0.0, f64::max);
    let max_monetary = table.iter().map(|r| r.monetary).fold(0.0, f64::max);

    let root = SVGBackend::new(output_path, (900, 650)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Frequency vs Monetary by Segment", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(0f64..(max_frequency * 1.05 + 1.0), 0f64..(max_monetary * 1.05 + 1.0))?;

    chart
        .configure_mesh()
        .x_desc("Frequency (orders)")
        .y_desc("Monetary (total spend)")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    for segment in Segment::ALL {
        let color = segment_color(segment);
        let points: Vec<(f64, f64)> = table
            .iter()
            .filter(|r| r.segment == segment)
            .map(|r| (f64::from(r.frequency), r.monetary))
            .collect();
        if points.is_empty() {
            continue;
        }

        chart
            .draw_series(
                points
                    .into_iter()
                    .map(move |point| Circle::new(point, 3, color.filled())),
            )?
            .label(segment.label())
            .legend(move |(x, y)| Circle::new((x + 5, y), 4, color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Generate the full set of segment charts.
///
/// # Arguments
/// * `table` - Scored and classified customers
/// * `base_output_path` - Output path whose extension is dropped to form the
///   chart stem
///
/// # Returns
/// * `Ok` once `<stem>_sizes.svg` and `<stem>_scatter.svg` are written
pub fn generate_segment_charts(table: &RfmTable, base_output_path: &Path) -> crate::Result<()> {
    let stem = base_output_path.with_extension("");
    let stem = stem.to_string_lossy();

    let sizes_path = format!("{}_sizes.svg", stem);
    create_segment_size_chart(table, Path::new(&sizes_path))?;
    tracing::info!(path = %sizes_path, "segment size chart saved");

    let scatter_path = format!("{}_scatter.svg", stem);
    create_segment_scatter(table, Path::new(&scatter_path))?;
    tracing::info!(path = %scatter_path, "segment scatter chart saved");

    Ok(())
}
