use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let (locations, years) = match &state.dataset {
        Some(ds) => (ds.locations.clone(), ds.years.clone()),
        None => {
            ui.label("No dataset loaded.");
            return;
        }
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Locations ----
            let header = format!(
                "Locations  ({}/{})",
                state.selection.locations.len(),
                locations.len()
            );
            egui::CollapsingHeader::new(RichText::new(header).strong())
                .id_salt("locations")
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    ui.horizontal(|ui: &mut Ui| {
                        if ui.small_button("All").clicked() {
                            state.select_all_locations();
                        }
                        if ui.small_button("None").clicked() {
                            state.select_no_locations();
                        }
                    });

                    for location in &locations {
                        let mut checked = state.selection.locations.contains(location);
                        let mut text = RichText::new(location);
                        if let Some(cm) = &state.color_map {
                            text = text.color(cm.color_for(location));
                        }
                        if ui.checkbox(&mut checked, text).changed() {
                            state.toggle_location(location);
                        }
                    }
                });

            // ---- Years ----
            egui::CollapsingHeader::new(RichText::new("Years").strong())
                .id_salt("years")
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    for &year in &years {
                        let mut checked = state.selection.years.contains(&year);
                        if ui.checkbox(&mut checked, year.to_string()).changed() {
                            state.toggle_year(year);
                        }
                    }
                    if state.selection.years.is_empty() {
                        ui.label(
                            RichText::new("Select at least one year").color(Color32::YELLOW),
                        );
                    }
                });

            // ---- Weeks ----
            ui.separator();
            ui.strong("Weeks");
            match state.week_bounds {
                Some(bounds) => {
                    let mut start = state.selection.weeks.start;
                    let mut end = state.selection.weeks.end;
                    let changed = ui
                        .add(egui::Slider::new(&mut start, bounds.start..=bounds.end).text("from"))
                        .changed()
                        | ui.add(egui::Slider::new(&mut end, bounds.start..=bounds.end).text("to"))
                            .changed();
                    if changed {
                        state.set_week_range(start, end);
                    }
                }
                None => {
                    ui.label("No weeks for the selected years.");
                }
            }
        });
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

        if let Some(ds) = &state.dataset {
            let visible = match &state.snapshot {
                Some(Ok(snap)) => snap.row_count,
                _ => 0,
            };
            ui.label(format!("{} rows loaded, {} in view", ds.len(), visible));
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
        .set_title("Open sales data")
        .add_filter("Supported files", &["csv", "parquet", "pq", "json"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        if let Err(e) = state.load_path(&path) {
            log::error!("Failed to load {}: {e}", path.display());
            state.status_message = Some(format!("Error: {e}"));
        }
    }
}
