use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Duration;
use ndarray::prelude::*;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use plotters::style::colors::colormaps::ViridisRGB;

use crate::config::Polarity;
use crate::spectrogram::SpectrogramFrame;
use crate::summary::MatchRecord;
use crate::utils::seconds_between;

// Log10 flux color scale, clamped like the event catalog's source data.
const LOG_FLUX_MIN: f64 = 3.0;
const LOG_FLUX_MAX: f64 = 8.0;
// Fixed y-range of the integrand panel, decades/s.
const INTEGRAND_YLIM: f64 = 0.25;

const WIDTH: u32 = 1800;
const HEIGHT: u32 = 600;

/// Renders one event as a two-panel diagnostic PNG: the energy-time flux
/// spectrogram with the characteristic-energy overlay on top, the integrand
/// below, sharing the time axis. The window is widened by 50% of the event
/// length on each side, clamped to the file. Returns the written path.
pub fn plot_event(
    frame: &SpectrogramFrame,
    integrand: &Array1<f64>,
    record: &MatchRecord,
    polarity: Polarity,
    max_energy_ev: f64,
    out_dir: &Path,
) -> Result<PathBuf, Box<dyn Error>> {
    let n = frame.len();
    let i = frame.times.partition_point(|t| *t < record.start_time);
    let j = frame.times.partition_point(|t| *t < record.end_time);
    let delta = (j - i) / 2;
    let lo = i.saturating_sub(delta);
    let hi = (j + delta).min(n.saturating_sub(1));
    if hi <= lo + 1 {
        return Err("event window too narrow to plot".into());
    }

    let basename = frame
        .source
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "spectrogram".to_string());
    let out_name = format!(
        "{}_{}_{}.png",
        basename,
        record.start_time.format("%Y-%m-%dT%H:%M:%S"),
        record.end_time.format("%Y-%m-%dT%H:%M:%S")
    );
    fs::create_dir_all(out_dir)?;
    let out_path = out_dir.join(out_name);

    let t_lo = frame.times[lo];
    let x_max = seconds_between(t_lo, frame.times[hi]);

    // Channel bin edges in log10(eV), extrapolated half a step at the ends.
    let log_e: Vec<f64> = frame.ch_energy.iter().map(|e| e.log10()).collect();
    let nc = log_e.len();
    let mut edges = Vec::with_capacity(nc + 1);
    if nc >= 2 {
        edges.push(log_e[0] - 0.5 * (log_e[1] - log_e[0]));
        for c in 1..nc {
            edges.push(0.5 * (log_e[c - 1] + log_e[c]));
        }
        edges.push(log_e[nc - 1] + 0.5 * (log_e[nc - 1] - log_e[nc - 2]));
    } else {
        edges.push(log_e[0] - 0.5);
        edges.push(log_e[0] + 0.5);
    }

    let title = format!(
        "{} - {} ({:.1} minutes), {}, MLAT = ({:.1} deg to {:.1} deg), B = ({:.2}, {:.2}, {:.2}) nT",
        record.start_time.format("%Y-%m-%dT%H:%M:%S"),
        record.end_time.format("%Y-%m-%dT%H:%M:%S"),
        record.duration_minutes(),
        polarity.label(),
        frame.mlat[lo],
        frame.mlat[hi],
        record.bx_mean,
        record.by_mean,
        record.bz_mean
    );

    let backend_path = out_path.clone();
    let root = BitMapBackend::new(&backend_path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;
    let (upper, lower) = root.split_vertically(HEIGHT * 3 / 5);
    let (spec_area, colorbar_area) = upper.split_horizontally(WIDTH - 120);
    // Pad the lower panel by the same amount so the time axes line up.
    let (integrand_area, _) = lower.split_horizontally(WIDTH - 120);

    let time_formatter = |v: &f64| {
        (t_lo + Duration::milliseconds((*v * 1000.0) as i64))
            .format("%H:%M")
            .to_string()
    };

    // The energy axis is inverted by plotting -log10(E) and negating labels.
    let mut spec_chart = ChartBuilder::on(&spec_area)
        .caption(title.as_str(), ("sans-serif", 22))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(70)
        .build_cartesian_2d(0.0..x_max, -edges[edges.len() - 1]..-edges[0])?;

    spec_chart
        .configure_mesh()
        .y_desc("Log Energy [eV] - Ions")
        .x_labels(8)
        .x_max_light_lines(0)
        .y_max_light_lines(0)
        .x_label_formatter(&time_formatter)
        .y_label_formatter(&|v| format!("{:.1}", -v))
        .label_style(("sans-serif", 18))
        .draw()?;

    spec_chart.draw_series(
        (lo..hi)
            .flat_map(|k| (0..nc).map(move |c| (k, c)))
            .filter_map(|(k, c)| {
                let flux = frame.flux[[c, k]];
                if !(flux > 0.0) {
                    return None;
                }
                let norm = ((flux.log10() - LOG_FLUX_MIN) / (LOG_FLUX_MAX - LOG_FLUX_MIN))
                    .clamp(0.0, 1.0);
                let x0 = seconds_between(t_lo, frame.times[k]);
                let x1 = seconds_between(t_lo, frame.times[k + 1]);
                Some(Rectangle::new(
                    [(x0, -edges[c + 1]), (x1, -edges[c])],
                    ViridisRGB.get_color(norm).filled(),
                ))
            }),
    )?;

    // Characteristic-energy overlay, broken at gaps.
    let mut run: Vec<(f64, f64)> = Vec::new();
    for k in lo..=hi {
        let e = frame.eic[k];
        if e > 0.0 && e.is_finite() {
            run.push((seconds_between(t_lo, frame.times[k]), -e.log10()));
        } else if !run.is_empty() {
            spec_chart.draw_series(LineSeries::new(run.drain(..), BLUE.stroke_width(2)))?;
        }
    }
    if !run.is_empty() {
        spec_chart.draw_series(LineSeries::new(run.drain(..), BLUE.stroke_width(2)))?;
    }

    let ceiling = -max_energy_ev.log10();
    spec_chart.draw_series(DashedLineSeries::new(
        [(0.0, ceiling), (x_max, ceiling)],
        8,
        6,
        BLACK.stroke_width(1),
    ))?;

    let mut colorbar = ChartBuilder::on(&colorbar_area)
        .margin(10)
        .margin_top(40)
        .set_label_area_size(LabelAreaPosition::Right, 55)
        .build_cartesian_2d(0.0..1.0, LOG_FLUX_MIN..LOG_FLUX_MAX)?;
    colorbar
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .disable_x_axis()
        .y_labels(6)
        .y_label_formatter(&|v| format!("1e{:.0}", v))
        .y_label_style(("sans-serif", 16))
        .draw()?;
    colorbar.draw_series((0..100).map(|s| {
        let frac = s as f64 / 99.0;
        let y = LOG_FLUX_MIN + frac * (LOG_FLUX_MAX - LOG_FLUX_MIN);
        let step = (LOG_FLUX_MAX - LOG_FLUX_MIN) / 99.0;
        Rectangle::new(
            [(0.0, y), (1.0, y + step)],
            ViridisRGB.get_color(frac).filled(),
        )
    }))?;

    let mut integrand_chart = ChartBuilder::on(&integrand_area)
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(70)
        .build_cartesian_2d(0.0..x_max, -INTEGRAND_YLIM..INTEGRAND_YLIM)?;

    integrand_chart
        .configure_mesh()
        .y_desc("D(t) [decades/s]")
        .x_labels(8)
        .x_max_light_lines(0)
        .y_max_light_lines(0)
        .x_label_formatter(&time_formatter)
        .y_label_formatter(&|v| format!("{:.2}", v))
        .label_style(("sans-serif", 18))
        .draw()?;

    integrand_chart.draw_series(
        AreaSeries::new(
            (lo..=hi).map(|k| {
                (
                    seconds_between(t_lo, frame.times[k]),
                    integrand.get(k).copied().unwrap_or(0.0),
                )
            }),
            0.0,
            BLUE.mix(0.4),
        )
        .border_style(BLUE.stroke_width(1)),
    )?;
    integrand_chart.draw_series(DashedLineSeries::new(
        [(0.0, 0.0), (x_max, 0.0)],
        8,
        6,
        BLACK.stroke_width(1),
    ))?;

    root.present()?;
    Ok(out_path)
}
