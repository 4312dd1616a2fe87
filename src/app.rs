use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::filter::FilterError;
use crate::report::DashboardSnapshot;
use crate::state::AppState;
use crate::ui::{charts, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct DashboardApp {
    pub state: AppState,
}

impl DashboardApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(230.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: report ----
        egui::CentralPanel::default().show(ctx, |ui| {
            ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui: &mut Ui| report(ui, &mut self.state));
        });
    }
}

fn report(ui: &mut Ui, state: &mut AppState) {
    let snapshot = match &state.snapshot {
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Open a sales file to build the report  (File → Open…)");
            });
            return;
        }
        Some(Err(FilterError::NoYearSelected)) => {
            ui.add_space(24.0);
            ui.label(
                RichText::new("⚠ Select at least one year in the filters to see the report.")
                    .size(18.0)
                    .color(Color32::YELLOW),
            );
            return;
        }
        // Cloned so the product widgets below can mutate state.
        Some(Ok(snapshot)) => snapshot.clone(),
    };

    sales_section(ui, state, &snapshot);
    time_section(ui, state, &snapshot);
    product_section(ui, state, &snapshot);

    ui.separator();
    ui.heading("Data summary");
    charts::preview_table(ui, &snapshot.preview);
}

fn sales_section(ui: &mut Ui, state: &AppState, snapshot: &DashboardSnapshot) {
    let colors = state.color_map.as_ref();
    ui.heading("💶 Revenue and sales");
    charts::kpi_strip(ui, &snapshot.kpis);
    ui.add_space(12.0);
    charts::stacked_bar_chart(
        ui,
        "revenue_by_week",
        "Revenue by week and location",
        &snapshot.revenue_by_week,
        colors,
    );
    charts::stacked_bar_chart(
        ui,
        "services_by_week",
        "Services by week and location",
        &snapshot.services_by_week,
        colors,
    );
}

fn time_section(ui: &mut Ui, state: &AppState, snapshot: &DashboardSnapshot) {
    let colors = state.color_map.as_ref();
    ui.separator();
    ui.heading("🕒 Time detail");
    charts::stacked_bar_chart(
        ui,
        "services_by_hour",
        "Services by hour",
        &snapshot.services_by_hour,
        colors,
    );
    charts::stacked_bar_chart(
        ui,
        "revenue_by_weekday",
        "Revenue by day of the week",
        &snapshot.revenue_by_weekday,
        colors,
    );
    charts::stacked_bar_chart(
        ui,
        "services_by_weekday",
        "Services by day of the week",
        &snapshot.services_by_weekday,
        colors,
    );
    charts::stacked_bar_chart(
        ui,
        "revenue_by_month",
        "Revenue by month",
        &snapshot.revenue_by_month,
        colors,
    );
}

fn product_section(ui: &mut Ui, state: &mut AppState, snapshot: &DashboardSnapshot) {
    let Some(ds) = &state.dataset else {
        return;
    };
    let families = ds.families.clone();
    let products = ds.products.clone();

    ui.separator();
    ui.heading("🍜 Product detail");

    // ---- Family selector (local to the product chart) ----
    ui.horizontal_wrapped(|ui: &mut Ui| {
        ui.label("Families:");
        for family in &families {
            let mut checked = state.products.families.contains(family);
            if ui.checkbox(&mut checked, family.as_str()).changed() {
                state.toggle_family(family);
            }
        }
    });
    charts::stacked_bar_chart(
        ui,
        "top_products",
        &format!("Quantity sold per product (top {})", state.config.top_products),
        &snapshot.top_products,
        state.color_map.as_ref(),
    );

    // ---- Price lookups ----
    ui.add_space(12.0);
    ui.heading("How much is a…?");
    ui.horizontal_wrapped(|ui: &mut Ui| {
        for product in state.products.products.clone() {
            if ui.small_button(format!("{product}  ✕")).clicked() {
                state.remove_price_product(&product);
            }
        }
        egui::ComboBox::from_id_salt("price_product")
            .selected_text(format!(
                "Add a product (max {})",
                state.config.max_price_lookups
            ))
            .show_ui(ui, |ui: &mut Ui| {
                for product in &products {
                    let chosen = state.products.products.contains(product);
                    if ui.selectable_label(chosen, product.as_str()).clicked() && !chosen {
                        state.add_price_product(product);
                    }
                }
            });
    });
    charts::price_cards(ui, &snapshot.prices);
}
