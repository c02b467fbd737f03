// In-memory narrowing of a catalog listing: range checks, de-duplication by
// (name, brand), and a stable sort by (price, engine_cc). No I/O happens here.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::model::CatalogItem;

/// Inclusive price and displacement bounds. Unset bounds don't filter.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CatalogFilter {
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_engine_cc: Option<i64>,
    pub max_engine_cc: Option<i64>,
}

impl CatalogFilter {
    pub fn has_cc_bound(&self) -> bool {
        self.min_engine_cc.is_some() || self.max_engine_cc.is_some()
    }

    /// Whether `item` falls inside every bound. A bike with no displacement
    /// (electric, or simply unknown) never passes a CC-bounded filter.
    pub fn admits(&self, item: &CatalogItem) -> bool {
        let price = item.price_key();
        if self.min_price.is_some_and(|min| price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| price > max) {
            return false;
        }

        if self.has_cc_bound() && item.engine_cc.is_none() {
            return false;
        }
        let cc = item.cc_key();
        if self.min_engine_cc.is_some_and(|min| cc < min) {
            return false;
        }
        if self.max_engine_cc.is_some_and(|max| cc > max) {
            return false;
        }
        true
    }

    /// Filter, de-duplicate, then sort. The first occurrence of a
    /// (name, brand) pair wins; equal sort keys keep their input order.
    pub fn apply(&self, items: Vec<CatalogItem>) -> Vec<CatalogItem> {
        let mut seen = HashSet::new();
        let mut kept: Vec<CatalogItem> = items
            .into_iter()
            .filter(|item| self.admits(item))
            .filter(|item| seen.insert(identity_key(item)))
            .collect();
        kept.sort_by(compare);
        kept
    }
}

/// Case- and whitespace-insensitive (name, brand).
pub fn identity_key(item: &CatalogItem) -> (String, String) {
    (
        item.name.trim().to_lowercase(),
        item.brand.trim().to_lowercase(),
    )
}

/// Ascending by price, then by displacement; missing values sort as 0.
pub fn compare(a: &CatalogItem, b: &CatalogItem) -> Ordering {
    a.price_key()
        .total_cmp(&b.price_key())
        .then_with(|| a.cc_key().cmp(&b.cc_key()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bike(name: &str, brand: &str, price: Option<f64>, cc: Option<i64>) -> CatalogItem {
        CatalogItem {
            name: name.into(),
            brand: brand.into(),
            price,
            engine_cc: cc,
            ..Default::default()
        }
    }

    #[test]
    fn duplicate_name_brand_keeps_first() {
        let items = vec![
            bike("A", "X", Some(100.0), Some(150)),
            bike(" a ", "x", Some(200.0), Some(150)),
        ];
        let out = CatalogFilter::default().apply(items);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].price, Some(100.0));
    }

    #[test]
    fn missing_price_counts_as_zero() {
        let items = vec![
            bike("One", "B", Some(50000.0), Some(100)),
            bike("Two", "B", None, Some(100)),
            bike("Three", "B", Some(80000.0), Some(100)),
        ];
        let filter = CatalogFilter {
            min_price: Some(60000.0),
            max_price: Some(90000.0),
            ..Default::default()
        };
        let out = filter.apply(items);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "Three");
    }

    #[test]
    fn cc_bound_drops_bikes_without_displacement() {
        let mut ev = bike("iQube", "TVS", Some(120000.0), None);
        ev.is_electric = true;
        let items = vec![ev, bike("Raider", "TVS", Some(95000.0), Some(125))];
        let filter = CatalogFilter {
            max_engine_cc: Some(10_000),
            ..Default::default()
        };
        let out = filter.apply(items);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].name, "Raider");
    }

    #[test]
    fn without_cc_bound_electric_bikes_stay() {
        let items = vec![bike("iQube", "TVS", Some(120000.0), None)];
        assert_eq!(CatalogFilter::default().apply(items).len(), 1);
    }

    #[test]
    fn bounds_are_inclusive() {
        let filter = CatalogFilter {
            min_price: Some(100.0),
            max_price: Some(100.0),
            min_engine_cc: Some(150),
            max_engine_cc: Some(150),
        };
        assert!(filter.admits(&bike("A", "X", Some(100.0), Some(150))));
        assert!(!filter.admits(&bike("A", "X", Some(100.5), Some(150))));
        assert!(!filter.admits(&bike("A", "X", Some(100.0), Some(149))));
    }

    #[test]
    fn sorts_by_price_then_cc_keeping_ties_stable() {
        let items = vec![
            bike("C", "X", Some(200.0), Some(150)),
            bike("B", "X", Some(100.0), Some(350)),
            bike("A", "X", Some(100.0), Some(125)),
            bike("D", "X", Some(100.0), Some(125)),
            bike("E", "X", None, None),
        ];
        let names: Vec<_> = CatalogFilter::default()
            .apply(items)
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(names, ["E", "A", "D", "B", "C"]);
    }

    #[test]
    fn display_values_are_untouched() {
        let out = CatalogFilter::default().apply(vec![bike("E", "X", None, None)]);
        assert_eq!(out[0].price, None);
        assert_eq!(out[0].engine_cc, None);
    }
}
