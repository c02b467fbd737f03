// Catalog use cases: listing bikes against shopper criteria, saving catalog
// entries, logging suggestions per customer and the inventory report.

use chrono::Utc;
use tracing::{debug, info};

use crate::api::RestClient;
use crate::error::Result;
use crate::filter::CatalogFilter;
use crate::gateway::{FilterValue, Gateway};
use crate::model::{CatalogItem, InventoryReport, Record, SuggestionRecord};

/// Only the first few matches of a suggestion call are logged.
pub const MAX_RECORDED: usize = 5;

const CUSTOMERS_TABLE: &str = "customers";
const CUSTOMERS_ID: &str = "cust_id";

/// What a shopper asked for. Categorical fields are matched by the backend,
/// numeric ranges in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuggestionCriteria {
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_engine_cc: Option<i64>,
    pub max_engine_cc: Option<i64>,
    pub brand: Option<String>,
    pub category_id: Option<String>,
    pub is_electric: Option<bool>,
    /// Free-text preference. The catalog has no location column, so it is
    /// recorded in logs but never matched.
    pub location: Option<String>,
}

impl SuggestionCriteria {
    /// Equality filters sent to the backend. Blank strings are skipped.
    pub fn pushdown(&self) -> Vec<(&'static str, FilterValue)> {
        let mut filters = Vec::new();
        if let Some(category) = non_blank(&self.category_id) {
            filters.push(("category_id", category.into()));
        }
        if let Some(brand) = non_blank(&self.brand) {
            filters.push(("brand", brand.into()));
        }
        if let Some(electric) = self.is_electric {
            filters.push(("is_electric", electric.into()));
        }
        filters
    }

    pub fn range(&self) -> CatalogFilter {
        CatalogFilter {
            min_price: self.min_price,
            max_price: self.max_price,
            min_engine_cc: self.min_engine_cc,
            max_engine_cc: self.max_engine_cc,
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Catalog reads and writes for the store manager.
#[derive(Debug, Clone)]
pub struct CatalogService {
    products: Gateway<CatalogItem>,
}

impl CatalogService {
    pub fn new(client: &RestClient) -> Self {
        Self {
            products: Gateway::new(client.clone()),
        }
    }

    /// Update the bike when it carries an identity, create it otherwise.
    /// The identity is not checked first; an unknown one yields `None`.
    pub fn add_or_update_bike(&self, item: &CatalogItem) -> Result<Option<CatalogItem>> {
        let mut body = item.clone();
        let id = body.prod_id.take();
        match non_blank(&id) {
            Some(id) => {
                let saved = self.products.update(id, &body)?;
                info!(prod_id = id, updated = saved.is_some(), "catalog item updated");
                Ok(saved)
            }
            None => {
                let saved = self.products.create(&body)?;
                info!(
                    prod_id = saved.as_ref().and_then(|s| s.prod_id.as_deref()),
                    "catalog item created"
                );
                Ok(saved)
            }
        }
    }

    /// Bikes matching `criteria`, de-duplicated and ordered by price then
    /// displacement.
    pub fn list_bikes(&self, criteria: &SuggestionCriteria) -> Result<Vec<CatalogItem>> {
        if let Some(location) = non_blank(&criteria.location) {
            debug!(location, "location preference is not matched against the catalog");
        }
        let rows = self.products.list(&criteria.pushdown())?;
        let fetched = rows.len();
        let bikes = criteria.range().apply(rows);
        debug!(fetched, matched = bikes.len(), "catalog filtered");
        Ok(bikes)
    }
}

/// Answers "what should we suggest" and keeps the audit trail.
#[derive(Debug, Clone)]
pub struct SuggestionRecorder {
    client: RestClient,
    catalog: CatalogService,
    suggestions: Gateway<SuggestionRecord>,
}

impl SuggestionRecorder {
    pub fn new(client: &RestClient) -> Self {
        Self {
            client: client.clone(),
            catalog: CatalogService::new(client),
            suggestions: Gateway::new(client.clone()),
        }
    }

    /// Matching bikes for `criteria`. With a customer, the first
    /// [`MAX_RECORDED`] matches are logged one request at a time, all
    /// stamped with the moment the call started. A failed write stops the
    /// batch; earlier records stay.
    pub fn suggest_bikes(
        &self,
        criteria: &SuggestionCriteria,
        cust_id: Option<&str>,
    ) -> Result<Vec<CatalogItem>> {
        let started = Utc::now();
        let bikes = self.catalog.list_bikes(criteria)?;

        if let Some(cust_id) = cust_id.map(str::trim).filter(|s| !s.is_empty()) {
            for bike in bikes.iter().take(MAX_RECORDED) {
                let record = SuggestionRecord::new(cust_id, bike.prod_id.clone(), started);
                self.suggestions.insert(&record)?;
            }
            info!(
                cust_id,
                recorded = bikes.len().min(MAX_RECORDED),
                "suggestions recorded"
            );
        }
        Ok(bikes)
    }

    /// Row counts of the products, customers and suggestions tables. The
    /// three reads are independent and may observe different instants.
    pub fn generate_report(&self) -> Result<InventoryReport> {
        Ok(InventoryReport {
            products: self.count(CatalogItem::TABLE, CatalogItem::ID_COLUMN)?,
            customers: self.count(CUSTOMERS_TABLE, CUSTOMERS_ID)?,
            suggestions: self.count(SuggestionRecord::TABLE, SuggestionRecord::ID_COLUMN)?,
        })
    }

    fn count(&self, table: &str, id_column: &str) -> Result<usize> {
        Ok(self.client.table(table).select(id_column).execute()?.len())
    }
}
