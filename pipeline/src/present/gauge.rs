use plotters::prelude::*;
use serde::Serialize;
use std::error::Error;
use strum::Display;
use terminus_metrics_config::BandThresholds;

/// Qualitative cache efficiency, used for colour coding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Band {
    Low,
    Medium,
    High,
    /// No cacheable requests, the ratio is undefined.
    Unknown,
}

impl Band {
    pub fn classify(percent: Option<f64>, thresholds: &BandThresholds) -> Self {
        match percent {
            None => Band::Unknown,
            Some(p) if p < thresholds.medium => Band::Low,
            Some(p) if p < thresholds.high => Band::Medium,
            Some(_) => Band::High,
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Band::Low => "#d62728",
            Band::Medium => "#ff7f0e",
            Band::High => "#2ca02c",
            Band::Unknown => "#9e9e9e",
        }
    }

    pub fn rgb(self) -> RGBColor {
        match self {
            Band::Low => RGBColor(0xd6, 0x27, 0x28),
            Band::Medium => RGBColor(0xff, 0x7f, 0x0e),
            Band::High => RGBColor(0x2c, 0xa0, 0x2c),
            Band::Unknown => RGBColor(0x9e, 0x9e, 0x9e),
        }
    }
}

/// The cache-hit ratio as a 0-100 bar over the coloured bands.
#[derive(Debug, Clone, PartialEq)]
pub struct Gauge {
    pub percent: Option<f64>,
    pub band: Band,
    thresholds: BandThresholds,
}

const WIDTH: u32 = 420;
const HEIGHT: u32 = 140;
const MARKER: RGBColor = RGBColor(0x1f, 0x3b, 0x73);

impl Gauge {
    /// `ratio` is a fraction; it is clamped into `[0, 1]`.
    pub fn new(ratio: Option<f64>, thresholds: BandThresholds) -> Self {
        let percent = ratio.map(|r| (r * 100.0).clamp(0.0, 100.0));
        Self {
            percent,
            band: Band::classify(percent, &thresholds),
            thresholds,
        }
    }

    pub fn label(&self) -> String {
        match self.percent {
            Some(p) => format!("{p:.1}%"),
            None => "n/a".to_string(),
        }
    }

    /// `(from, to, band)` spans covering 0-100, empty spans left out.
    pub fn sections(&self) -> Vec<(f64, f64, Band)> {
        let medium = self.thresholds.medium.clamp(0.0, 100.0);
        let high = self.thresholds.high.clamp(medium, 100.0);
        [
            (0.0, medium, Band::Low),
            (medium, high, Band::Medium),
            (high, 100.0, Band::High),
        ]
        .into_iter()
        .filter(|(from, to, _)| to > from)
        .collect()
    }

    pub fn to_svg(&self) -> String {
        let mut svg = String::new();
        if let Err(err) = self.draw(&mut svg) {
            warn!(%err, "could not draw gauge");
            return format!("<p>Cache hit ratio: {}</p>", self.label());
        }
        svg
    }

    fn draw(&self, svg: &mut String) -> Result<(), Box<dyn Error>> {
        let root = SVGBackend::with_string(svg, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE)?;

        let caption = ("sans-serif", 22).into_font().color(&self.band.rgb());
        let mut chart = ChartBuilder::on(&root)
            .caption(format!("Cache Hit Ratio {}", self.label()), caption)
            .margin(12)
            .x_label_area_size(28)
            .build_cartesian_2d(0f64..100f64, 0f64..1f64)?;
        chart
            .configure_mesh()
            .disable_mesh()
            .disable_y_axis()
            .x_labels(11)
            .x_label_formatter(&|value| format!("{value:.0}"))
            .draw()?;

        chart.draw_series(
            self.sections()
                .into_iter()
                .map(|(from, to, band)| Rectangle::new([(from, 0.0), (to, 1.0)], band.rgb().filled())),
        )?;
        if let Some(percent) = self.percent {
            chart.draw_series(std::iter::once(Rectangle::new(
                [(0.0, 0.35), (percent, 0.65)],
                MARKER.filled(),
            )))?;
        }
        root.present()?;
        Ok(())
    }
}
