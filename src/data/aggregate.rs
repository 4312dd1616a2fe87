use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;

use super::filter::FilteredView;
use super::model::{Month, TransactionRow, Weekday};

// ---------------------------------------------------------------------------
// Grouping dimensions
// ---------------------------------------------------------------------------

/// A categorical column a chart can group by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Location,
    Week,
    Weekday,
    Month,
    Hour,
    Product,
}

impl Dimension {
    pub fn label(self) -> &'static str {
        match self {
            Dimension::Location => "Location",
            Dimension::Week => "Week",
            Dimension::Weekday => "Weekday",
            Dimension::Month => "Month",
            Dimension::Hour => "Hour",
            Dimension::Product => "Product",
        }
    }

    /// The grouping key of `row` along this dimension.
    pub fn value(self, row: &TransactionRow) -> DimValue {
        match self {
            Dimension::Location => DimValue::Text(row.location.clone()),
            Dimension::Week => DimValue::Number(row.week as i64),
            Dimension::Weekday => DimValue::Weekday(row.weekday),
            Dimension::Month => DimValue::Month(row.month),
            Dimension::Hour => DimValue::Number(row.hour as i64),
            Dimension::Product => DimValue::Text(row.product.clone()),
        }
    }
}

/// A grouping key.  The derived `Ord` compares numbers numerically, text
/// lexicographically, and weekdays / months in calendar order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DimValue {
    Number(i64),
    Weekday(Weekday),
    Month(Month),
    Text(String),
}

impl fmt::Display for DimValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DimValue::Number(n) => write!(f, "{n}"),
            DimValue::Weekday(d) => write!(f, "{d}"),
            DimValue::Month(m) => write!(f, "{m}"),
            DimValue::Text(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    /// Sum of line totals.
    Revenue,
    /// Distinct service identifiers.
    Services,
    /// Sum of quantities.
    Quantity,
}

impl Measure {
    pub fn label(self) -> &'static str {
        match self {
            Measure::Revenue => "Revenue (€)",
            Measure::Services => "Number of services",
            Measure::Quantity => "Quantity sold",
        }
    }
}

// ---------------------------------------------------------------------------
// Tidy chart table
// ---------------------------------------------------------------------------

/// One group-by key combination and its measure.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartRow {
    /// Value along the primary (x axis) dimension.
    pub key: DimValue,
    /// Value along the secondary (colour) dimension.
    pub series: DimValue,
    pub value: f64,
}

/// The tidy table handed to the presentation layer for one chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartTable {
    pub key_dim: Dimension,
    pub series_dim: Dimension,
    pub measure: Measure,
    pub rows: Vec<ChartRow>,
}

impl ChartTable {
    /// Distinct keys in row order.
    pub fn keys(&self) -> Vec<&DimValue> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .map(|r| &r.key)
            .filter(|k| seen.insert(*k))
            .collect()
    }

    /// Distinct series values, sorted.
    pub fn series(&self) -> Vec<&DimValue> {
        self.rows
            .iter()
            .map(|r| &r.series)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn value(&self, key: &DimValue, series: &DimValue) -> Option<f64> {
        self.rows
            .iter()
            .find(|r| &r.key == key && &r.series == series)
            .map(|r| r.value)
    }

    pub fn total(&self) -> f64 {
        self.rows.iter().map(|r| r.value).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Aggregations
// ---------------------------------------------------------------------------

/// Group by (`key_dim`, `series_dim`) and sum `total`.
pub fn revenue_by(view: &FilteredView<'_>, key_dim: Dimension, series_dim: Dimension) -> ChartTable {
    let mut groups: BTreeMap<(DimValue, DimValue), f64> = BTreeMap::new();
    for row in view.iter() {
        *groups
            .entry((key_dim.value(row), series_dim.value(row)))
            .or_insert(0.0) += row.total;
    }
    table(key_dim, series_dim, Measure::Revenue, groups)
}

/// Group by (`key_dim`, `series_dim`) and count distinct `service_id`.
pub fn service_count_by(
    view: &FilteredView<'_>,
    key_dim: Dimension,
    series_dim: Dimension,
) -> ChartTable {
    let mut groups: BTreeMap<(DimValue, DimValue), HashSet<&str>> = BTreeMap::new();
    for row in view.iter() {
        groups
            .entry((key_dim.value(row), series_dim.value(row)))
            .or_default()
            .insert(row.service_id.as_str());
    }
    let counts = groups
        .into_iter()
        .map(|(k, services)| (k, services.len() as f64))
        .collect();
    table(key_dim, series_dim, Measure::Services, counts)
}

fn table(
    key_dim: Dimension,
    series_dim: Dimension,
    measure: Measure,
    groups: BTreeMap<(DimValue, DimValue), f64>,
) -> ChartTable {
    ChartTable {
        key_dim,
        series_dim,
        measure,
        rows: groups
            .into_iter()
            .map(|((key, series), value)| ChartRow { key, series, value })
            .collect(),
    }
}

/// Quantity sold per (product, location) for the `limit` best-selling
/// products of the selected families.
///
/// Products are ranked by quantity summed across every location; ties go to
/// the alphabetically first product.  Rows come out in rank order, then by
/// location.  A location that never sold a top product has no row for it.
pub fn top_products(
    view: &FilteredView<'_>,
    families: &BTreeSet<String>,
    limit: usize,
) -> ChartTable {
    let mut per_location: HashMap<(&str, &str), f64> = HashMap::new();
    let mut per_product: HashMap<&str, f64> = HashMap::new();

    for row in view.iter().filter(|r| families.contains(&r.family)) {
        *per_location
            .entry((row.product.as_str(), row.location.as_str()))
            .or_insert(0.0) += row.quantity;
        *per_product.entry(row.product.as_str()).or_insert(0.0) += row.quantity;
    }

    let mut ranked: Vec<(&str, f64)> = per_product.into_iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    let rank: HashMap<&str, usize> = ranked
        .iter()
        .take(limit)
        .enumerate()
        .map(|(i, (product, _))| (*product, i))
        .collect();

    let mut kept: Vec<(usize, &str, &str, f64)> = per_location
        .into_iter()
        .filter_map(|((product, location), qty)| {
            rank.get(product).map(|&r| (r, product, location, qty))
        })
        .collect();
    kept.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.2.cmp(b.2)));

    ChartTable {
        key_dim: Dimension::Product,
        series_dim: Dimension::Location,
        measure: Measure::Quantity,
        rows: kept
            .into_iter()
            .map(|(_, product, location, qty)| ChartRow {
                key: DimValue::Text(product.to_string()),
                series: DimValue::Text(location.to_string()),
                value: qty,
            })
            .collect(),
    }
}

/// Mean unit price of `product` within the view, or `None` when the view
/// holds no line of that product.
pub fn average_price(view: &FilteredView<'_>, product: &str) -> Option<f64> {
    let (sum, count) = view
        .iter()
        .filter(|r| r.product == product)
        .fold((0.0, 0usize), |(sum, count), r| (sum + r.unit_price, count + 1));
    (count > 0).then(|| sum / count as f64)
}

// ---------------------------------------------------------------------------
// Headline figures
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Kpis {
    pub total_revenue: f64,
    pub service_count: usize,
    /// Revenue per service; 0 when there are no services.
    pub average_ticket: f64,
}

pub fn kpis(view: &FilteredView<'_>) -> Kpis {
    if view.is_empty() {
        return Kpis::default();
    }
    let total_revenue: f64 = view.iter().map(|r| r.total).sum();
    let service_count = view
        .iter()
        .map(|r| r.service_id.as_str())
        .collect::<HashSet<_>>()
        .len();
    let average_ticket = if service_count > 0 {
        total_revenue / service_count as f64
    } else {
        0.0
    };
    Kpis {
        total_revenue,
        service_count,
        average_ticket,
    }
}

/// First `n` rows of the view in source order.
pub fn preview<'a>(view: &FilteredView<'a>, n: usize) -> Vec<&'a TransactionRow> {
    view.iter().take(n).collect()
}
