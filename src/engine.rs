// 📊 Ledger Engine - aggregates and views over a ledger snapshot
// Every function here is a pure fold over the records; no hidden state.

use crate::record::{Ledger, MovementKind, MovementRecord};
use crate::registry::{normalize, ProductName};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Literal that selects every product
pub const ALL_PRODUCTS: &str = "ALL";

// ============================================================================
// FILTER
// ============================================================================

/// Product selector for totals and views
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProductFilter {
    #[default]
    All,
    Product(ProductName),
}

impl ProductFilter {
    /// `"ALL"` (any case) or a blank string selects everything
    pub fn parse(raw: &str) -> ProductFilter {
        match ProductName::parse(raw) {
            None => ProductFilter::All,
            Some(name) if name.as_str() == ALL_PRODUCTS => ProductFilter::All,
            Some(name) => ProductFilter::Product(name),
        }
    }

    pub fn matches(&self, record: &MovementRecord) -> bool {
        match self {
            ProductFilter::All => true,
            ProductFilter::Product(name) => name.matches(&record.product),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            ProductFilter::All => ALL_PRODUCTS,
            ProductFilter::Product(name) => name.as_str(),
        }
    }
}

impl From<ProductName> for ProductFilter {
    fn from(name: ProductName) -> Self {
        ProductFilter::Product(name)
    }
}

// ============================================================================
// TOTALS
// ============================================================================

/// Inflow, outflow and signed net stock
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals {
    pub inflow: f64,
    pub outflow: f64,
    /// inflow - outflow; negative means oversold, never clamped
    pub net: f64,
}

impl Totals {
    pub fn from_flows(inflow: f64, outflow: f64) -> Self {
        Totals {
            inflow,
            outflow,
            net: inflow - outflow,
        }
    }
}

/// Sum inflow/outflow over the records matching `filter`.
///
/// Registration rows never count, whatever quantity they carry.
pub fn totals(ledger: &Ledger, filter: &ProductFilter) -> Totals {
    let (inflow, outflow) = ledger
        .iter()
        .filter(|record| filter.matches(record))
        .fold((0.0, 0.0), |(inflow, outflow), record| match record.kind {
            MovementKind::Entry => (inflow + record.quantity, outflow),
            MovementKind::Exit => (inflow, outflow + record.quantity),
            MovementKind::Registration => (inflow, outflow),
        });

    Totals::from_flows(inflow, outflow)
}

// ============================================================================
// VIEWS
// ============================================================================

/// Records matching `filter`, most recent first
pub fn filtered_view<'a>(ledger: &'a Ledger, filter: &ProductFilter) -> Vec<&'a MovementRecord> {
    ledger
        .iter()
        .rev()
        .filter(|record| filter.matches(record))
        .collect()
}

/// Like `filtered_view`, paired with each record's ledger position
pub fn indexed_view<'a>(
    ledger: &'a Ledger,
    filter: &ProductFilter,
) -> Vec<(usize, &'a MovementRecord)> {
    ledger
        .iter()
        .enumerate()
        .rev()
        .filter(|(_, record)| filter.matches(record))
        .collect()
}

/// Number of distinct registered products
pub fn registered_product_count(products: &BTreeSet<ProductName>) -> usize {
    products.len()
}

/// Stock position of one product
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductStock {
    pub product: ProductName,
    pub totals: Totals,
}

impl ProductStock {
    /// More went out than came in
    pub fn is_negative(&self) -> bool {
        self.totals.net < 0.0
    }
}

/// Totals for every product, sorted by name.
///
/// Registered products without movements report zeros; products that only
/// appear in movements are included too.
pub fn stock_by_product(ledger: &Ledger, products: &BTreeSet<ProductName>) -> Vec<ProductStock> {
    let mut flows: BTreeMap<String, (f64, f64)> = products
        .iter()
        .map(|p| (p.as_str().to_string(), (0.0, 0.0)))
        .collect();

    for record in ledger {
        let key = normalize(&record.product);
        if key.is_empty() {
            continue;
        }
        let entry = flows.entry(key).or_insert((0.0, 0.0));
        match record.kind {
            MovementKind::Entry => entry.0 += record.quantity,
            MovementKind::Exit => entry.1 += record.quantity,
            MovementKind::Registration => {}
        }
    }

    flows
        .into_iter()
        .filter_map(|(name, (inflow, outflow))| {
            ProductName::parse(&name).map(|product| ProductStock {
                product,
                totals: Totals::from_flows(inflow, outflow),
            })
        })
        .collect()
}

// ============================================================================
// INVENTORY VIEW
// ============================================================================

/// Everything the presentation needs after one refresh
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryView {
    pub ledger: Ledger,
    pub products: BTreeSet<ProductName>,
    /// Totals across all products
    pub totals: Totals,
    pub stock: Vec<ProductStock>,
}

impl InventoryView {
    pub fn compute(ledger: Ledger, products: BTreeSet<ProductName>) -> Self {
        let totals = totals(&ledger, &ProductFilter::All);
        let stock = stock_by_product(&ledger, &products);

        InventoryView {
            ledger,
            products,
            totals,
            stock,
        }
    }

    pub fn product_count(&self) -> usize {
        registered_product_count(&self.products)
    }

    pub fn totals_for(&self, filter: &ProductFilter) -> Totals {
        totals(&self.ledger, filter)
    }

    pub fn filtered(&self, filter: &ProductFilter) -> Vec<&MovementRecord> {
        filtered_view(&self.ledger, filter)
    }

    /// Products whose net stock is below zero
    pub fn negative_stock(&self) -> Vec<&ProductStock> {
        self.stock.iter().filter(|s| s.is_negative()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 2, 10)
            .unwrap()
            .and_hms_opt(8, minute, 0)
            .unwrap()
    }

    fn sample_ledger() -> Ledger {
        Ledger::from_records(vec![
            MovementRecord::registration("PARAFUSO M8", at(0)),
            MovementRecord::new(at(1), "PARAFUSO M8", MovementKind::Entry, 100.0, ""),
            MovementRecord::registration("PORCA", at(2)),
            MovementRecord::new(at(3), "PORCA", MovementKind::Entry, 10.0, ""),
            MovementRecord::new(at(4), "PARAFUSO M8", MovementKind::Exit, 30.0, "obra"),
            MovementRecord::new(at(5), "PORCA", MovementKind::Exit, 12.0, "venda"),
        ])
    }

    fn product(name: &str) -> ProductFilter {
        ProductFilter::parse(name)
    }

    #[test]
    fn test_filter_parse() {
        assert_eq!(ProductFilter::parse("ALL"), ProductFilter::All);
        assert_eq!(ProductFilter::parse(" all "), ProductFilter::All);
        assert_eq!(ProductFilter::parse(""), ProductFilter::All);
        assert_eq!(
            ProductFilter::parse("porca"),
            ProductFilter::Product(ProductName::parse("PORCA").unwrap())
        );
    }

    #[test]
    fn test_totals_per_product() {
        let ledger = sample_ledger();

        assert_eq!(
            totals(&ledger, &product("PARAFUSO M8")),
            Totals { inflow: 100.0, outflow: 30.0, net: 70.0 }
        );
        assert_eq!(
            totals(&ledger, &product("porca")),
            Totals { inflow: 10.0, outflow: 12.0, net: -2.0 }
        );
    }

    #[test]
    fn test_totals_all_products() {
        let all = totals(&sample_ledger(), &ProductFilter::All);
        assert_eq!(all, Totals { inflow: 110.0, outflow: 42.0, net: 68.0 });
    }

    #[test]
    fn test_totals_empty_ledger() {
        assert_eq!(totals(&Ledger::new(), &ProductFilter::All), Totals::default());
    }

    #[test]
    fn test_registration_never_counts() {
        // A hand-edited registration row carrying a quantity
        let mut odd = MovementRecord::registration("PORCA", at(0));
        odd.quantity = 40.0;
        let ledger = Ledger::from_records(vec![odd]);

        assert_eq!(totals(&ledger, &ProductFilter::All), Totals::default());
    }

    #[test]
    fn test_filtered_view_is_most_recent_first() {
        let ledger = sample_ledger();

        let porca = filtered_view(&ledger, &product("PORCA"));
        let minutes: Vec<_> = porca.iter().map(|r| r.timestamp).collect();
        assert_eq!(minutes, vec![at(5), at(3), at(2)]);

        let all = filtered_view(&ledger, &ProductFilter::All);
        assert_eq!(all.len(), ledger.len());
        assert_eq!(all[0].timestamp, at(5));
    }

    #[test]
    fn test_indexed_view_keeps_ledger_positions() {
        let ledger = sample_ledger();
        let positions: Vec<usize> = indexed_view(&ledger, &product("PARAFUSO M8"))
            .into_iter()
            .map(|(i, _)| i)
            .collect();
        assert_eq!(positions, vec![4, 1, 0]);
    }

    #[test]
    fn test_filter_matches_unnormalized_rows() {
        let ledger = Ledger::from_records(vec![MovementRecord::new(
            at(0),
            " porca ",
            MovementKind::Entry,
            3.0,
            "",
        )]);
        assert_eq!(totals(&ledger, &product("PORCA")).inflow, 3.0);
    }

    #[test]
    fn test_stock_by_product_includes_idle_products() {
        let ledger = sample_ledger();
        let products: BTreeSet<ProductName> = ["PORCA", "PARAFUSO M8", "ARRUELA"]
            .iter()
            .filter_map(|n| ProductName::parse(n))
            .collect();

        let stock = stock_by_product(&ledger, &products);
        let names: Vec<_> = stock.iter().map(|s| s.product.as_str()).collect();
        assert_eq!(names, vec!["ARRUELA", "PARAFUSO M8", "PORCA"]);

        assert_eq!(stock[0].totals, Totals::default());
        assert_eq!(stock[1].totals.net, 70.0);
        assert!(stock[2].is_negative());
    }

    #[test]
    fn test_inventory_view_counts_products_not_rows() {
        let ledger = sample_ledger();
        let products: BTreeSet<ProductName> = ledger
            .iter()
            .filter_map(|r| ProductName::parse(&r.product))
            .collect();

        let view = InventoryView::compute(ledger, products);
        assert_eq!(view.product_count(), 2);
        assert_eq!(view.totals.net, 68.0);
        assert_eq!(view.negative_stock().len(), 1);
        assert_eq!(view.filtered(&product("PORCA")).len(), 3);
    }
}
