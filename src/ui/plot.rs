use std::ops::RangeInclusive;

use chrono::{Datelike, NaiveDate};
use eframe::egui::{CollapsingHeader, RichText, ScrollArea, Stroke, Ui};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Bar, BarChart, GridMark, HPlacement, Line, Plot, PlotPoints, Points};

use crate::color::{darken, BarPalette};
use crate::data::aggregate::{self, MonthlySummary, StationMean};
use crate::data::model::Pollutant;
use crate::data::report::DashboardReport;
use crate::state::AppState;

const CHART_HEIGHT: f32 = 260.0;

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Render the metrics and charts for the current report.
pub fn dashboard(ui: &mut Ui, state: &AppState) {
    ui.heading("Air Quality Filter");

    if state.table.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to view readings  (File → Open…)");
        });
        return;
    }

    let Some(report) = &state.report else {
        ui.label("Pick a start date on or before the end date.");
        return;
    };

    if report.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No data in the selected range");
        });
        return;
    }

    let palette = BarPalette::default();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.add_space(6.0);
            ui.label(RichText::new("Parameter Contains").size(18.0).strong());
            metrics_row(ui, report);

            co_trend(ui, &report.monthly, &palette);

            ui.separator();
            ui.label(
                RichText::new("The Highest and The Lowest SO2 Contains")
                    .size(18.0)
                    .strong(),
            );
            ranking_pair(
                ui,
                report,
                Pollutant::So2,
                ["Lowest SO2 Contains", "Highest SO2 Contains"],
                &palette,
            );

            ui.separator();
            ui.label(
                RichText::new("Best and Worst Air Quality Based on PM10 Indicator")
                    .size(18.0)
                    .strong(),
            );
            ranking_pair(
                ui,
                report,
                Pollutant::Pm10,
                ["Best Air Quality", "Worst Air Quality"],
                &palette,
            );
            CollapsingHeader::new("All stations by PM10 (lowest first)")
                .id_salt("pm10_table")
                .default_open(false)
                .show(ui, |ui: &mut Ui| ranking_table(ui, &report.pm10));
        });
}

// ---------------------------------------------------------------------------
// Metric cards
// ---------------------------------------------------------------------------

fn metrics_row(ui: &mut Ui, report: &DashboardReport) {
    let mean_co = report
        .mean_monthly_co
        .map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"));

    ui.columns(2, |cols| {
        metric(&mut cols[0], "CO Contains Mean  µg/m³", &mean_co);
        metric(&mut cols[1], "Total Daily Input", &report.total_entries.to_string());
    });
}

fn metric(ui: &mut Ui, label: &str, value: &str) {
    ui.group(|ui: &mut Ui| {
        ui.set_width(ui.available_width());
        ui.label(RichText::new(label).weak());
        ui.label(RichText::new(value).size(28.0).strong());
    });
}

// ---------------------------------------------------------------------------
// Monthly CO trend
// ---------------------------------------------------------------------------

/// Plot x coordinate for a date: days since 0001-01-01.
fn date_to_x(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

fn x_to_label(x: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
        .map(|d| d.format("%Y-%m").to_string())
        .unwrap_or_default()
}

/// `[x, y]` points of the months that have a CO mean.
fn trend_points(monthly: &[MonthlySummary]) -> Vec<[f64; 2]> {
    monthly
        .iter()
        .filter_map(|m| m.mean_co.map(|co| [date_to_x(m.month_end), co]))
        .collect()
}

fn co_trend(ui: &mut Ui, monthly: &[MonthlySummary], palette: &BarPalette) {
    let points = trend_points(monthly);

    Plot::new("co_trend")
        .height(CHART_HEIGHT)
        .x_axis_label("Month")
        .y_axis_label(Pollutant::Co.label())
        .x_axis_formatter(|mark: GridMark, _range: &RangeInclusive<f64>| x_to_label(mark.value))
        .label_formatter(|_name, value| format!("{}\n{:.2}", x_to_label(value.x), value.y))
        .allow_drag(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.line(
                Line::new("CO", PlotPoints::from(points.clone()))
                    .name("CO")
                    .color(palette.highlight)
                    .width(2.0),
            );
            plot_ui.points(
                Points::new("", PlotPoints::from(points))
                    .color(palette.highlight)
                    .radius(4.0),
            );
        });
}

// ---------------------------------------------------------------------------
// Station rankings
// ---------------------------------------------------------------------------

/// Lowest-`n` chart on the left, highest-`n` chart on the right.
fn ranking_pair(
    ui: &mut Ui,
    report: &DashboardReport,
    pollutant: Pollutant,
    titles: [&str; 2],
    palette: &BarPalette,
) {
    let (lowest, highest) = report.extremes(pollutant);
    ui.columns(2, |cols| {
        ranking_chart(&mut cols[0], titles[0], pollutant, &lowest, HPlacement::Left, palette);
        ranking_chart(&mut cols[1], titles[1], pollutant, &highest, HPlacement::Right, palette);
    });
}

/// Horizontal bars, first entry on top.
fn ranking_chart(
    ui: &mut Ui,
    title: &str,
    pollutant: Pollutant,
    stations: &[StationMean],
    axis: HPlacement,
    palette: &BarPalette,
) {
    ui.vertical_centered(|ui: &mut Ui| ui.label(RichText::new(title).size(15.0)));

    if stations.is_empty() {
        ui.label(format!("No {pollutant} readings in range"));
        return;
    }

    let n = stations.len();
    let bars: Vec<Bar> = stations
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let fill = palette.fill(i);
            Bar::new((n - 1 - i) as f64, s.mean)
                .name(&s.station)
                .fill(fill)
                .stroke(Stroke::new(1.0, darken(fill, 0.2)))
                .width(0.7)
        })
        .collect();

    let labels: Vec<String> = stations.iter().rev().map(|s| s.station.clone()).collect();

    Plot::new(("ranking", title))
        .height(CHART_HEIGHT)
        .x_axis_label(pollutant.label())
        .y_axis_position(axis)
        .y_axis_formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| {
            station_label(&labels, mark.value)
        })
        .show_grid([true, false])
        .include_x(0.0)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new("", bars).horizontal());
        });
}

/// `[rank, station, mean]` cells of every station, lowest mean first.
fn ranking_rows(ranking: &[StationMean]) -> Vec<[String; 3]> {
    aggregate::lowest(ranking, ranking.len())
        .iter()
        .enumerate()
        .map(|(i, s)| [(i + 1).to_string(), s.station.clone(), format!("{:.2}", s.mean)])
        .collect()
}

fn ranking_table(ui: &mut Ui, ranking: &[StationMean]) {
    let rows = ranking_rows(ranking);
    if rows.is_empty() {
        ui.label("No PM10 readings in range");
        return;
    }

    TableBuilder::new(ui)
        .striped(true)
        .vscroll(false)
        .column(Column::auto().at_least(40.0))
        .column(Column::auto().at_least(140.0))
        .column(Column::remainder())
        .header(22.0, |mut header| {
            for title in ["#", "Station", Pollutant::Pm10.label()] {
                header.col(|ui| {
                    ui.strong(title);
                });
            }
        })
        .body(|mut body| {
            for cells in &rows {
                body.row(20.0, |mut row| {
                    for cell in cells {
                        row.col(|ui| {
                            ui.label(cell);
                        });
                    }
                });
            }
        });
}

/// Axis label for a bar position; blank between bars.
fn station_label(labels: &[String], y: f64) -> String {
    let rounded = y.round();
    if (y - rounded).abs() > 1e-6 || rounded < 0.0 {
        return String::new();
    }
    labels.get(rounded as usize).cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_date_axis_round_trip() {
        assert_eq!(x_to_label(date_to_x(date("2016-02-29"))), "2016-02");
        assert_eq!(x_to_label(-1e12), "");
    }

    #[test]
    fn test_trend_points_skip_months_without_co() {
        let monthly = vec![
            MonthlySummary {
                month_end: date("2024-01-31"),
                distinct_entry_count: 3,
                mean_co: Some(1.0),
            },
            MonthlySummary {
                month_end: date("2024-02-29"),
                distinct_entry_count: 1,
                mean_co: None,
            },
        ];
        let points = trend_points(&monthly);
        assert_eq!(points, vec![[date_to_x(date("2024-01-31")), 1.0]]);
    }

    #[test]
    fn test_ranking_rows_ascending_with_two_decimals() {
        let ranking = vec![
            StationMean { station: "Dongsi".to_string(), mean: 120.456 },
            StationMean { station: "Wanliu".to_string(), mean: 98.0 },
            StationMean { station: "Dingling".to_string(), mean: 61.004 },
        ];
        let rows = ranking_rows(&ranking);
        assert_eq!(
            rows,
            vec![
                ["1".to_string(), "Dingling".to_string(), "61.00".to_string()],
                ["2".to_string(), "Wanliu".to_string(), "98.00".to_string()],
                ["3".to_string(), "Dongsi".to_string(), "120.46".to_string()],
            ]
        );
        assert!(ranking_rows(&[]).is_empty());
    }

    #[test]
    fn test_station_label() {
        let labels = vec!["Low".to_string(), "High".to_string()];
        assert_eq!(station_label(&labels, 0.0), "Low");
        assert_eq!(station_label(&labels, 1.0), "High");
        assert_eq!(station_label(&labels, 0.5), "");
        assert_eq!(station_label(&labels, 2.0), "");
        assert_eq!(station_label(&labels, -1.0), "");
    }
}
