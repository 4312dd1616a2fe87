use std::collections::BTreeSet;

use crate::config::DashboardConfig;
use crate::data::aggregate::{
    average_price, kpis, preview, revenue_by, service_count_by, top_products, ChartTable,
    Dimension, Kpis,
};
use crate::data::filter::{resolve, FilterError, FilterSelection};
use crate::data::model::{SalesDataset, TransactionRow};

// ---------------------------------------------------------------------------
// Product panel selections
// ---------------------------------------------------------------------------

/// Selections local to the product section: which families feed the product
/// chart, and which products get a price card.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProductQuery {
    pub families: BTreeSet<String>,
    /// In selection order, at most `max_price_lookups` entries.
    pub products: Vec<String>,
}

impl ProductQuery {
    /// Configured defaults that actually occur in `dataset`.
    pub fn defaults(dataset: &SalesDataset, config: &DashboardConfig) -> Self {
        let families = config
            .default_families
            .iter()
            .filter(|f| dataset.families.contains(f))
            .cloned()
            .collect();
        let products = config
            .default_products
            .iter()
            .filter(|p| dataset.products.contains(p))
            .take(config.max_price_lookups)
            .cloned()
            .collect();
        ProductQuery { families, products }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceLookup {
    pub product: String,
    /// `None` when the product has no line in the filtered view.
    pub average_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PricePanel {
    /// No product picked: prompt instead of cards.
    SelectProduct,
    Prices(Vec<PriceLookup>),
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Everything the dashboard shows for one filter state, computed in a single
/// synchronous pass over one filtered view.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSnapshot {
    pub row_count: usize,
    pub kpis: Kpis,
    pub revenue_by_week: ChartTable,
    pub services_by_week: ChartTable,
    pub services_by_hour: ChartTable,
    pub revenue_by_weekday: ChartTable,
    pub services_by_weekday: ChartTable,
    pub revenue_by_month: ChartTable,
    pub top_products: ChartTable,
    pub prices: PricePanel,
    pub preview: Vec<TransactionRow>,
}

impl DashboardSnapshot {
    pub fn build(
        dataset: &SalesDataset,
        selection: &FilterSelection,
        query: &ProductQuery,
        config: &DashboardConfig,
    ) -> Result<Self, FilterError> {
        let view = resolve(dataset, selection)?;
        use Dimension::{Hour, Location, Month, Week, Weekday};

        let prices = if query.products.is_empty() {
            PricePanel::SelectProduct
        } else {
            PricePanel::Prices(
                query
                    .products
                    .iter()
                    .take(config.max_price_lookups)
                    .map(|product| PriceLookup {
                        product: product.clone(),
                        average_price: average_price(&view, product),
                    })
                    .collect(),
            )
        };

        Ok(DashboardSnapshot {
            row_count: view.len(),
            kpis: kpis(&view),
            revenue_by_week: revenue_by(&view, Week, Location),
            services_by_week: service_count_by(&view, Week, Location),
            services_by_hour: service_count_by(&view, Hour, Location),
            revenue_by_weekday: revenue_by(&view, Weekday, Location),
            services_by_weekday: service_count_by(&view, Weekday, Location),
            revenue_by_month: revenue_by(&view, Month, Location),
            top_products: top_products(&view, &query.families, config.top_products),
            prices,
            preview: preview(&view, config.preview_rows)
                .into_iter()
                .cloned()
                .collect(),
        })
    }
}
