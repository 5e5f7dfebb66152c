use chrono::Datelike;
use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::DatePickerButton;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – date range widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    if let Some(logo) = &state.logo {
        let uri = format!("file://{}", logo.display());
        ui.vertical_centered(|ui: &mut Ui| {
            ui.add(
                egui::Image::new(uri)
                    .max_width(ui.available_width() * 0.8)
                    .max_height(120.0)
                    .rounding(4.0),
            );
        });
        ui.add_space(4.0);
    }

    ui.heading("Range Time");
    ui.separator();

    let Some((lo, hi)) = state.bounds() else {
        ui.label("No dataset loaded.");
        return;
    };
    let years = lo.year()..=hi.year();

    ui.strong("From");
    let mut start = state.start;
    if ui
        .add(
            DatePickerButton::new(&mut start)
                .id_salt("range_start")
                .calendar_week(false)
                .start_end_years(years.clone()),
        )
        .changed()
    {
        state.set_start(start.clamp(lo, hi));
    }

    ui.strong("To");
    let mut end = state.end;
    if ui
        .add(
            DatePickerButton::new(&mut end)
                .id_salt("range_end")
                .calendar_week(false)
                .start_end_years(years),
        )
        .changed()
    {
        state.set_end(end.clamp(lo, hi));
    }

    ui.add_space(4.0);
    if ui.button("Full range").clicked() {
        state.reset_range();
    }

    ui.separator();
    ui.label(format!("Data spans {lo} – {hi}"));
    if let Some(report) = &state.report {
        ui.label(format!("{} of {} readings selected", report.rows, state.total_rows()));
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(table) = &state.table {
            ui.label(format!(
                "{} readings from {} stations",
                table.len(),
                table.stations().len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open air quality readings")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        state.open(&path);
    }
}
