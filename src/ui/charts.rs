use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::{Column as TableColumn, TableBuilder};
use egui_plot::{Bar, BarChart, GridMark, Legend, Plot};

use crate::color::ColorMap;
use crate::data::aggregate::{ChartTable, DimValue, Kpis, Measure};
use crate::data::model::TransactionRow;
use crate::report::{PriceLookup, PricePanel};

const CHART_HEIGHT: f32 = 260.0;

// ---------------------------------------------------------------------------
// KPI strip
// ---------------------------------------------------------------------------

/// `1234567.891` → `1,234,567.89`.
pub fn format_amount(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}

pub fn kpi_strip(ui: &mut Ui, kpis: &Kpis) {
    ui.horizontal(|ui: &mut Ui| {
        metric(ui, "Revenue (€)", format_amount(kpis.total_revenue));
        ui.add_space(32.0);
        metric(ui, "Number of services", kpis.service_count.to_string());
        ui.add_space(32.0);
        metric(ui, "Average ticket (€)", format_amount(kpis.average_ticket));
    });
}

fn metric(ui: &mut Ui, label: &str, value: String) {
    ui.vertical(|ui: &mut Ui| {
        ui.label(label);
        ui.label(RichText::new(value).size(26.0).strong());
    });
}

// ---------------------------------------------------------------------------
// Stacked bar charts
// ---------------------------------------------------------------------------

/// X position of every key.  Numeric keys (weeks, hours) sit on their own
/// value; categorical keys get consecutive slots in table order.
fn key_positions(keys: &[&DimValue]) -> Vec<f64> {
    let numeric = keys.iter().all(|k| matches!(k, DimValue::Number(_)));
    keys.iter()
        .enumerate()
        .map(|(i, k)| match k {
            DimValue::Number(n) if numeric => *n as f64,
            _ => i as f64,
        })
        .collect()
}

/// Chart-wide total in the unit of the table's measure.
pub fn total_caption(table: &ChartTable) -> String {
    let total = table.total();
    match table.measure {
        Measure::Revenue => format!("total {} €", format_amount(total)),
        Measure::Services => format!("total {total:.0} services"),
        Measure::Quantity => format!("total {total:.0} units"),
    }
}

/// Render a chart table as bars stacked per series, coloured by location.
pub fn stacked_bar_chart(
    ui: &mut Ui,
    id: &str,
    title: &str,
    table: &ChartTable,
    colors: Option<&ColorMap>,
) {
    ui.horizontal(|ui: &mut Ui| {
        ui.strong(title);
        if !table.is_empty() {
            ui.weak(total_caption(table));
        }
    });
    if table.is_empty() {
        ui.label("No data for the current filters.");
        return;
    }

    let keys = table.keys();
    let positions = key_positions(&keys);
    let categorical = keys.iter().any(|k| !matches!(k, DimValue::Number(_)));
    let labels: Vec<String> = keys.iter().map(|k| k.to_string()).collect();

    // Every series carries one bar per key (zero where absent) so stacking
    // lines up bar-for-bar.
    let mut charts: Vec<BarChart> = Vec::new();
    for series in table.series() {
        let name = series.to_string();
        let color = colors
            .map(|cm| cm.color_for(&name))
            .unwrap_or(Color32::LIGHT_BLUE);
        let bars: Vec<Bar> = keys
            .iter()
            .zip(&positions)
            .map(|(key, &x)| {
                let value = table.value(key, series).unwrap_or(0.0);
                Bar::new(x, value)
                    .width(0.8)
                    .name(format!("{key} · {name}"))
            })
            .collect();

        let below: Vec<&BarChart> = charts.iter().collect();
        let chart = BarChart::new(bars).name(&name).color(color).stack_on(&below);
        charts.push(chart);
    }

    let mut plot = Plot::new(id)
        .legend(Legend::default())
        .height(CHART_HEIGHT)
        .x_axis_label(table.key_dim.label())
        .y_axis_label(table.measure.label())
        .allow_scroll(false)
        .allow_drag(true)
        .allow_zoom(true)
        .allow_boxed_zoom(true);

    if categorical {
        plot = plot.x_axis_formatter(move |mark: GridMark, _range| {
            let slot = mark.value.round();
            if (mark.value - slot).abs() > 1e-6 || slot < 0.0 {
                return String::new();
            }
            labels.get(slot as usize).cloned().unwrap_or_default()
        });
    }

    plot.show(ui, |plot_ui| {
        for chart in charts {
            plot_ui.bar_chart(chart);
        }
    });
}

// ---------------------------------------------------------------------------
// Price cards
// ---------------------------------------------------------------------------

pub fn price_cards(ui: &mut Ui, panel: &PricePanel) {
    match panel {
        PricePanel::SelectProduct => {
            ui.label(RichText::new("Select at least one product.").color(Color32::YELLOW));
        }
        PricePanel::Prices(lookups) => {
            for lookup in lookups {
                price_card(ui, lookup);
            }
        }
    }
}

fn price_card(ui: &mut Ui, lookup: &PriceLookup) {
    egui::Frame::group(ui.style()).show(ui, |ui: &mut Ui| {
        ui.set_width(ui.available_width());
        ui.strong(lookup.product.as_str());
        match lookup.average_price {
            Some(price) => {
                ui.label(format!("Average price: {price:.2} €"));
            }
            None => {
                ui.label("Average price: no data for the current filters");
            }
        }
    });
}

// ---------------------------------------------------------------------------
// Data preview
// ---------------------------------------------------------------------------

const PREVIEW_HEADERS: [&str; 12] = [
    "Location",
    "Year",
    "Week",
    "Weekday",
    "Month",
    "Hour",
    "Product",
    "Family",
    "Quantity",
    "Unit price",
    "Total",
    "Service",
];

fn preview_cells(row: &TransactionRow) -> [String; 12] {
    [
        row.location.clone(),
        row.year.to_string(),
        row.week.to_string(),
        row.weekday.to_string(),
        row.month.to_string(),
        row.hour.to_string(),
        row.product.clone(),
        row.family.clone(),
        row.quantity.to_string(),
        format!("{:.2}", row.unit_price),
        format!("{:.2}", row.total),
        row.service_id.clone(),
    ]
}

pub fn preview_table(ui: &mut Ui, rows: &[TransactionRow]) {
    if rows.is_empty() {
        ui.label("No rows match the current filters.");
        return;
    }

    egui::ScrollArea::horizontal()
        .id_salt("preview_scroll")
        .show(ui, |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .vscroll(false)
                .columns(TableColumn::auto().at_least(60.0), PREVIEW_HEADERS.len())
                .header(20.0, |mut header| {
                    for title in PREVIEW_HEADERS {
                        header.col(|ui: &mut Ui| {
                            ui.strong(title);
                        });
                    }
                })
                .body(|mut body| {
                    for row in rows {
                        body.row(18.0, |mut table_row| {
                            for cell in preview_cells(row) {
                                table_row.col(|ui: &mut Ui| {
                                    ui.label(cell);
                                });
                            }
                        });
                    }
                });
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_use_thousand_separators() {
        assert_eq!(format_amount(0.0), "0.00");
        assert_eq!(format_amount(869_123.456), "869,123.46");
        assert_eq!(format_amount(1_234_567.0), "1,234,567.00");
        assert_eq!(format_amount(999.999), "1,000.00");
        assert_eq!(format_amount(-1500.5), "-1,500.50");
    }

    #[test]
    fn numeric_keys_keep_their_value() {
        let keys = [DimValue::Number(22), DimValue::Number(44)];
        let refs: Vec<&DimValue> = keys.iter().collect();
        assert_eq!(key_positions(&refs), vec![22.0, 44.0]);
    }

    #[test]
    fn categorical_keys_get_slots() {
        let keys = [DimValue::Text("Pad Thai".into()), DimValue::Text("Ramen".into())];
        let refs: Vec<&DimValue> = keys.iter().collect();
        assert_eq!(key_positions(&refs), vec![0.0, 1.0]);
    }

    #[test]
    fn caption_sums_every_bar_in_the_measure_unit() {
        use crate::data::aggregate::{ChartRow, Dimension};

        let bar = |week: i64, location: &str, value: f64| ChartRow {
            key: DimValue::Number(week),
            series: DimValue::Text(location.into()),
            value,
        };
        let mut table = ChartTable {
            key_dim: Dimension::Week,
            series_dim: Dimension::Location,
            measure: Measure::Revenue,
            rows: vec![bar(1, "Valencia", 1200.5), bar(1, "Pozuelo", 300.0), bar(2, "Valencia", 0.25)],
        };
        assert_eq!(total_caption(&table), "total 1,500.75 €");

        table.measure = Measure::Services;
        table.rows = vec![bar(1, "Valencia", 3.0), bar(2, "Pozuelo", 4.0)];
        assert_eq!(total_caption(&table), "total 7 services");
    }
}
