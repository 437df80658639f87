//! Plotters-powered time-series chart widget for Ratatui.
//!
//! Plotters output is rendered into the Ratatui buffer using
//! `plotters-ratatui-backend`.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::domain::Party;

/// A render-only chart description. Series and bounds are computed by the
/// caller; x is a day number.
pub struct TimeSeriesChart<'a> {
    /// Per-poll margin, drawn as dots.
    pub points: &'a [(f64, f64)],
    /// Rolling 7-poll margin, drawn as a line.
    pub rolling: &'a [(f64, f64)],
    /// Model prediction, when the dataset carries one.
    pub predicted: Option<&'a [(f64, f64)]>,
    /// Rolling support lines, one per party.
    pub parties: &'a [(Party, Vec<(f64, f64)>)],
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    pub x_label: &'a str,
    pub y_label: &'a str,
    pub fmt_x: fn(f64) -> String,
    pub fmt_y: fn(f64) -> String,
}

impl<'a> Widget for TimeSeriesChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters may fail to lay out a chart in a tiny area.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;

        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc(self.x_label)
                .y_desc(self.y_label)
                .x_labels(4)
                .y_labels(5)
                .x_label_formatter(&|v| (self.fmt_x)(*v))
                .y_label_formatter(&|v| (self.fmt_y)(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            let zero_color = RGBColor(128, 128, 128);
            let points_color = WHITE;
            let rolling_color = RGBColor(0, 255, 255); // cyan
            let predicted_color = RGBColor(255, 255, 0); // yellow

            if y0 < 0.0 && y1 > 0.0 {
                chart.draw_series(LineSeries::new([(x0, 0.0), (x1, 0.0)], &zero_color))?;
            }

            // Circle radii map badly through the ratatui canvas; use pixels.
            chart.draw_series(
                self.points
                    .iter()
                    .map(|&(x, y)| Pixel::new((x, y), points_color)),
            )?;

            chart.draw_series(LineSeries::new(self.rolling.iter().copied(), &rolling_color))?;

            if let Some(predicted) = self.predicted {
                chart.draw_series(LineSeries::new(predicted.iter().copied(), &predicted_color))?;
            }

            for (party, line) in self.parties {
                let color = match party {
                    Party::Dem => RGBColor(80, 140, 255),
                    Party::Rep => RGBColor(255, 80, 80),
                };
                chart.draw_series(LineSeries::new(line.iter().copied(), &color))?;
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}
