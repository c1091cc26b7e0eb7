use super::{
    format_count,
    Presenter,
};
use crate::MetricsTable;
use plotters::{
    prelude::*,
    style::text_anchor::{
        HPos,
        Pos,
        VPos,
    },
};
use std::error::Error;

const WIDTH: u32 = 860;
const HEIGHT: u32 = 320;
const MAX_X_LABELS: usize = 10;
const NO_DATA: RGBColor = RGBColor(0x77, 0x77, 0x77);

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: &'static str,
    pub color: RGBColor,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scale {
    /// Zero up to a little above the largest value.
    Count,
    /// Fixed 0-100.
    Percent,
}

/// A multi-series line chart over the table's buckets, drawn with plotters into a standalone SVG document.
#[derive(Debug, Clone, PartialEq)]
pub struct LineChart {
    pub title: &'static str,
    pub labels: Vec<String>,
    pub series: Vec<Series>,
    pub scale: Scale,
}

impl LineChart {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty() || self.series.iter().all(|s| s.values.is_empty())
    }

    fn y_max(&self) -> f64 {
        match self.scale {
            Scale::Percent => 100.0,
            Scale::Count => {
                let max = self
                    .series
                    .iter()
                    .flat_map(|s| s.values.iter().copied())
                    .fold(0.0_f64, f64::max);
                (max * 1.1).max(1.0)
            }
        }
    }

    fn x_label(&self, index: i32) -> String {
        usize::try_from(index)
            .ok()
            .and_then(|index| self.labels.get(index))
            .cloned()
            .unwrap_or_default()
    }

    fn y_label(&self, value: f64) -> String {
        match self.scale {
            Scale::Percent => format!("{value:.0}%"),
            Scale::Count if value >= 0.0 && value.fract() == 0.0 => format_count(value as u64),
            Scale::Count => format!("{value:.1}"),
        }
    }

    pub fn to_svg(&self) -> String {
        let mut svg = String::new();
        if let Err(err) = self.draw(&mut svg) {
            warn!(title = self.title, %err, "could not draw chart");
            return format!("<p class=\"no-data\">{} chart unavailable</p>", self.title);
        }
        svg
    }

    fn draw(&self, svg: &mut String) -> Result<(), Box<dyn Error>> {
        let root = SVGBackend::with_string(svg, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE)?;

        if self.is_empty() {
            let area = root.titled(self.title, ("sans-serif", 18))?;
            let (width, height) = area.dim_in_pixel();
            let style = ("sans-serif", 16)
                .into_font()
                .color(&NO_DATA)
                .pos(Pos::new(HPos::Center, VPos::Center));
            area.draw_text("No data", &style, (width as i32 / 2, height as i32 / 2))?;
            root.present()?;
            return Ok(());
        }

        let last = i32::try_from(self.labels.len() - 1).unwrap_or(i32::MAX).max(1);
        let mut chart = ChartBuilder::on(&root)
            .caption(self.title, ("sans-serif", 18))
            .margin(12)
            .x_label_area_size(36)
            .y_label_area_size(72)
            .build_cartesian_2d(0..last, 0f64..self.y_max())?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(self.labels.len().min(MAX_X_LABELS))
            .y_labels(6)
            .x_label_formatter(&|index| self.x_label(*index))
            .y_label_formatter(&|value| self.y_label(*value))
            .draw()?;

        for series in &self.series {
            let color = series.color;
            let points = series
                .values
                .iter()
                .enumerate()
                .map(|(index, value)| (index as i32, *value))
                .collect::<Vec<_>>();
            chart
                .draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))?
                .label(series.name)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
            chart.draw_series(points.into_iter().map(|point| Circle::new(point, 3, color.filled())))?;
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
        root.present()?;
        Ok(())
    }
}

impl Presenter {
    /// Visits, pages served, hits and misses per bucket.
    pub fn traffic_chart(&self, table: &MetricsTable) -> LineChart {
        let rows = table.rows();
        let mut series = vec![Series {
            name: "Visits",
            color: RGBColor(0x1f, 0x77, 0xb4),
            values: rows.iter().map(|row| row.visits as f64).collect(),
        }];
        if table.has_pages_served() {
            series.push(Series {
                name: "Pages Served",
                color: RGBColor(0x94, 0x67, 0xbd),
                values: rows.iter().map(|row| row.pages_served.unwrap_or_default() as f64).collect(),
            });
        }
        series.push(Series {
            name: "Cache Hits",
            color: RGBColor(0x2c, 0xa0, 0x2c),
            values: rows.iter().map(|row| row.cache_hits as f64).collect(),
        });
        series.push(Series {
            name: "Cache Misses",
            color: RGBColor(0xd6, 0x27, 0x28),
            values: rows.iter().map(|row| row.cache_misses as f64).collect(),
        });
        LineChart {
            title: "Traffic",
            labels: rows.iter().map(|row| self.label(row)).collect(),
            series,
            scale: Scale::Count,
        }
    }

    /// Derived cache hit ratio per bucket; buckets without cacheable requests are skipped.
    pub fn ratio_chart(&self, table: &MetricsTable) -> LineChart {
        let (labels, values) = table
            .rows()
            .iter()
            .filter_map(|row| row.hit_ratio().map(|ratio| (self.label(row), ratio * 100.0)))
            .unzip();
        LineChart {
            title: "Cache Hit Ratio",
            labels,
            series: vec![Series {
                name: "Cache Hit Ratio",
                color: RGBColor(0xff, 0x7f, 0x0e),
                values,
            }],
            scale: Scale::Percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_metrics;
    use pretty_assertions::assert_eq;

    fn presenter() -> Presenter {
        Presenter::new(&terminus_metrics_config::Config::default().dashboard)
    }

    #[test]
    fn traffic_chart_for_two_days() {
        let table = parse_metrics(
            "Period,Visits,Pages Served,Cache Hits,Cache Misses\n2024-01-01,10,10,8,2\n2024-01-02,5,5,4,1\n",
        )
        .unwrap();
        let chart = presenter().traffic_chart(&table);
        assert_eq!(chart.labels, vec!["01-01-2024", "01-02-2024"]);
        let names = chart.series.iter().map(|s| s.name).collect::<Vec<_>>();
        assert_eq!(names, vec!["Visits", "Pages Served", "Cache Hits", "Cache Misses"]);
        assert_eq!(chart.series[0].values, vec![10.0, 5.0]);
        assert!(chart.y_max() > 10.0);

        let svg = chart.to_svg();
        assert!(svg.contains("<svg"), "{svg}");
        assert_eq!(svg.matches("<circle").count(), 8);
        assert!(svg.contains("Cache Misses"));
        assert!(svg.contains("01-02-2024"));
    }

    #[test]
    fn ratio_chart_skips_undefined_buckets() {
        let table =
            parse_metrics("Period,Visits,Cache Hits,Cache Misses\n2024-01-01,10,8,2\n2024-01-02,1,0,0\n").unwrap();
        let chart = presenter().ratio_chart(&table);
        assert_eq!(chart.labels, vec!["01-01-2024"]);
        assert_eq!(chart.series[0].values, vec![80.0]);
        assert_eq!(chart.y_max(), 100.0);
        assert_eq!(chart.to_svg().matches("<circle").count(), 1);
    }

    #[test]
    fn axis_labels() {
        let chart = presenter().traffic_chart(&MetricsTable::default());
        assert_eq!(chart.y_label(1234.0), "1,234");
        assert_eq!(chart.x_label(-1), "");
        let ratio = presenter().ratio_chart(&MetricsTable::default());
        assert_eq!(ratio.y_label(40.0), "40%");
    }

    #[test]
    fn empty_chart_says_no_data() {
        let chart = presenter().traffic_chart(&MetricsTable::default());
        assert!(chart.is_empty());
        let svg = chart.to_svg();
        assert!(svg.contains("No data"));
        assert!(!svg.contains("<circle"));
    }
}
