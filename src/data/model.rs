use std::collections::{BTreeSet, HashSet};
use std::fmt;

// ---------------------------------------------------------------------------
// Calendar categoricals
// ---------------------------------------------------------------------------

/// Day of the week.  Variant order is calendar order, so the derived `Ord`
/// sorts Monday first regardless of the order rows were read in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }

    /// Parse an English day name, ignoring case and surrounding whitespace.
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|day| day.name().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Month of the year, declared in calendar order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Month::January => "January",
            Month::February => "February",
            Month::March => "March",
            Month::April => "April",
            Month::May => "May",
            Month::June => "June",
            Month::July => "July",
            Month::August => "August",
            Month::September => "September",
            Month::October => "October",
            Month::November => "November",
            Month::December => "December",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|month| month.name().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// CellValue – a single raw cell before typing
// ---------------------------------------------------------------------------

/// A dynamically-typed cell as read from CSV, JSON or Parquet.  Every loader
/// produces these so the typing rules live in one place.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Integer view of the cell.  Floats are accepted only when they carry no
    /// fractional part (pandas writes `2019.0` for nullable int columns).
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Integer(i) => Some(*i),
            CellValue::Float(v) if v.fract() == 0.0 && v.is_finite() => Some(*v as i64),
            CellValue::String(s) => {
                let s = s.trim();
                s.parse::<i64>().ok().or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|v| v.fract() == 0.0 && v.is_finite())
                        .map(|v| v as i64)
                })
            }
            _ => None,
        }
    }

    /// Text view of the cell; `None` for nulls and empty strings.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::String(s) if s.trim().is_empty() => None,
            CellValue::String(s) => Some(s.trim().to_string()),
            CellValue::Float(v) if v.fract() == 0.0 && v.is_finite() => {
                Some(format!("{}", *v as i64))
            }
            other => Some(other.to_string()),
        }
    }

    /// Text view for identifier columns.  Integral numbers render without a
    /// decimal part whether they arrive typed or as text, so `1001`,
    /// `1001.0` and `"1001.0"` are the same id.
    pub fn as_identifier(&self) -> Option<String> {
        match self {
            CellValue::String(s) => {
                let s = s.trim();
                match s.parse::<f64>() {
                    Ok(v) if v.fract() == 0.0 && v.is_finite() && !s.contains(['e', 'E']) => {
                        Some(format!("{}", v as i64))
                    }
                    _ => self.as_text(),
                }
            }
            _ => self.as_text(),
        }
    }
}

// ---------------------------------------------------------------------------
// TransactionRow – one line item of a sale
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRow {
    pub location: String,
    pub year: i32,
    /// ISO-style week number, 1..=53.
    pub week: u8,
    pub weekday: Weekday,
    pub month: Month,
    /// Hour of day, 0..=23.
    pub hour: u8,
    pub product: String,
    pub family: String,
    pub quantity: f64,
    pub unit_price: f64,
    /// Line total as recorded at the till.  Revenue always sums this column.
    pub total: f64,
    /// Shared by every line item of one customer visit.
    pub service_id: String,
}

// ---------------------------------------------------------------------------
// SalesDataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full dataset with pre-computed filter domains.  Immutable after load.
#[derive(Debug, Clone, Default)]
pub struct SalesDataset {
    pub rows: Vec<TransactionRow>,
    /// Locations in first-appearance order.
    pub locations: Vec<String>,
    /// Years, ascending.
    pub years: Vec<i32>,
    /// Product families in first-appearance order.
    pub families: Vec<String>,
    /// Products in first-appearance order.
    pub products: Vec<String>,
}

impl SalesDataset {
    /// Build the filter domains from the loaded rows.
    pub fn from_rows(rows: Vec<TransactionRow>) -> Self {
        let mut locations = FirstSeen::default();
        let mut families = FirstSeen::default();
        let mut products = FirstSeen::default();
        let mut years = BTreeSet::new();

        for row in &rows {
            locations.push(&row.location);
            families.push(&row.family);
            products.push(&row.product);
            years.insert(row.year);
        }

        SalesDataset {
            rows,
            locations: locations.values,
            years: years.into_iter().collect(),
            families: families.values,
            products: products.values,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Unique values in first-appearance order.
#[derive(Default)]
struct FirstSeen {
    seen: HashSet<String>,
    values: Vec<String>,
}

impl FirstSeen {
    fn push(&mut self, value: &str) {
        if !self.seen.contains(value) {
            self.seen.insert(value.to_string());
            self.values.push(value.to_string());
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Minimal row builder shared by the data-layer tests.
    pub(crate) fn row(location: &str, year: i32, week: u8, total: f64) -> TransactionRow {
        TransactionRow {
            location: location.to_string(),
            year,
            week,
            weekday: Weekday::Monday,
            month: Month::January,
            hour: 13,
            product: "Pad Thai".to_string(),
            family: "NOODLES".to_string(),
            quantity: 1.0,
            unit_price: total,
            total,
            service_id: format!("{location}-{year}-{week}"),
        }
    }

    #[test]
    fn weekday_parse_is_case_insensitive() {
        assert_eq!(Weekday::parse("monday"), Some(Weekday::Monday));
        assert_eq!(Weekday::parse(" SUNDAY "), Some(Weekday::Sunday));
        assert_eq!(Weekday::parse("Lunes"), None);
    }

    #[test]
    fn calendar_order_is_not_lexicographic() {
        assert!(Weekday::Tuesday < Weekday::Saturday);
        assert!("Tuesday" > "Saturday");
        assert!(Month::April < Month::August);
        assert!("April" < "August");
        assert!(Month::December > Month::February);
        assert_eq!(Month::ALL[2], Month::March);
        assert_eq!(Weekday::ALL[6], Weekday::Sunday);
    }

    #[test]
    fn cell_text_drops_float_suffix() {
        assert_eq!(CellValue::Float(1042.0).as_text().as_deref(), Some("1042"));
        assert_eq!(CellValue::Integer(7).as_text().as_deref(), Some("7"));
        assert_eq!(CellValue::String("  ".into()).as_text(), None);
        assert_eq!(CellValue::Null.as_text(), None);
    }

    #[test]
    fn identifiers_agree_across_encodings() {
        assert_eq!(CellValue::String("1001.0".into()).as_identifier().as_deref(), Some("1001"));
        assert_eq!(CellValue::String(" 1001 ".into()).as_identifier().as_deref(), Some("1001"));
        assert_eq!(CellValue::Float(1001.0).as_identifier().as_deref(), Some("1001"));
        assert_eq!(CellValue::Integer(1001).as_identifier().as_deref(), Some("1001"));
        assert_eq!(CellValue::String("S-9".into()).as_identifier().as_deref(), Some("S-9"));
        assert_eq!(CellValue::String("1001.5".into()).as_identifier().as_deref(), Some("1001.5"));
        assert_eq!(CellValue::String("".into()).as_identifier(), None);
    }

    #[test]
    fn cell_integer_rejects_fractions() {
        assert_eq!(CellValue::Float(2019.0).as_i64(), Some(2019));
        assert_eq!(CellValue::Float(2019.5).as_i64(), None);
        assert_eq!(CellValue::String("44".into()).as_i64(), Some(44));
        assert_eq!(CellValue::String("44.0".into()).as_i64(), Some(44));
    }

    #[test]
    fn domains_keep_first_appearance_and_sorted_years() {
        let ds = SalesDataset::from_rows(vec![
            row("Valencia", 2020, 3, 10.0),
            row("Barcelona", 2019, 1, 5.0),
            row("Valencia", 2019, 2, 7.0),
        ]);
        assert_eq!(ds.locations, vec!["Valencia", "Barcelona"]);
        assert_eq!(ds.years, vec![2019, 2020]);
        assert_eq!(ds.len(), 3);
        assert!(!ds.is_empty());
    }
}
