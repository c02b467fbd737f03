// Per-table CRUD on top of the query builder. One gateway per record type;
// rows are decoded into the typed record and nothing is validated locally.

use std::fmt;
use std::marker::PhantomData;

use serde::Serialize;
use serde_json::Value;

use crate::api::{RestClient, Row};
use crate::error::{Error, Result};
use crate::model::Record;

/// A value to match with `column=eq.value`.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Bool(bool),
    Int(i64),
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Text(s) => f.write_str(s),
            FilterValue::Bool(b) => write!(f, "{b}"),
            FilterValue::Int(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::Text(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        FilterValue::Text(s)
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        FilterValue::Bool(b)
    }
}

impl From<i64> for FilterValue {
    fn from(i: i64) -> Self {
        FilterValue::Int(i)
    }
}

pub struct Gateway<T: Record> {
    client: RestClient,
    _record: PhantomData<T>,
}

impl<T: Record> Clone for Gateway<T> {
    fn clone(&self) -> Self {
        Self::new(self.client.clone())
    }
}

impl<T: Record> fmt::Debug for Gateway<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gateway").field("table", &T::TABLE).finish()
    }
}

impl<T: Record> Gateway<T> {
    pub fn new(client: RestClient) -> Self {
        Self {
            client,
            _record: PhantomData,
        }
    }

    /// Insert one row; returns it as stored, or `None` if the backend sent
    /// nothing back.
    pub fn create(&self, row: &T) -> Result<Option<T>> {
        let rows = self
            .client
            .table(T::TABLE)
            .insert(serde_json::to_value(row)?)
            .execute()?;
        first(rows)
    }

    /// Insert one row without reading back what the backend stored.
    pub fn insert(&self, row: &T) -> Result<()> {
        self.client
            .table(T::TABLE)
            .insert(serde_json::to_value(row)?)
            .execute()?;
        Ok(())
    }

    pub fn get_by_id(&self, id: &str) -> Result<Option<T>> {
        let rows = self
            .client
            .table(T::TABLE)
            .select("*")
            .eq(T::ID_COLUMN, id)
            .limit(1)
            .execute()?;
        first(rows)
    }

    /// Patch the row with identity `id`. `None` means nothing matched.
    pub fn update(&self, id: &str, patch: &impl Serialize) -> Result<Option<T>> {
        let rows = self
            .client
            .table(T::TABLE)
            .update(serde_json::to_value(patch)?)
            .eq(T::ID_COLUMN, id)
            .execute()?;
        first(rows)
    }

    /// Number of rows removed.
    pub fn delete(&self, id: &str) -> Result<usize> {
        let rows = self
            .client
            .table(T::TABLE)
            .delete()
            .eq(T::ID_COLUMN, id)
            .execute()?;
        Ok(rows.len())
    }

    /// Every row matching all equality `filters`.
    pub fn list(&self, filters: &[(&str, FilterValue)]) -> Result<Vec<T>> {
        let query = filters
            .iter()
            .fold(self.client.table(T::TABLE).select("*"), |q, (column, value)| {
                q.eq(column, value)
            });
        query.execute()?.into_iter().map(decode).collect()
    }

    /// Insert or merge `rows` on `conflict_columns`.
    pub fn upsert(&self, rows: &[T], conflict_columns: &str) -> Result<Vec<T>> {
        let payload = rows
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<Value>, _>>()?;
        self.client
            .table(T::TABLE)
            .upsert(payload, conflict_columns)
            .execute()?
            .into_iter()
            .map(decode)
            .collect()
    }
}

fn first<T: Record>(rows: Vec<Row>) -> Result<Option<T>> {
    rows.into_iter().next().map(decode).transpose()
}

fn decode<T: Record>(row: Row) -> Result<T> {
    serde_json::from_value(Value::Object(row))
        .map_err(|e| Error::Validation(format!("{} row: {e}", T::TABLE)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CatalogItem;
    use crate::testing::FakeTransport;
    use reqwest::Method;
    use serde_json::json;

    fn products(fake: &FakeTransport) -> Gateway<CatalogItem> {
        Gateway::new(fake.client())
    }

    #[test]
    fn create_returns_first_row_or_none() {
        let fake = FakeTransport::default();
        fake.push_json(json!([{"prod_id": "p-9", "name": "Pulsar", "brand": "Bajaj"}]));
        fake.push_json(json!([]));
        let gw = products(&fake);

        let item = CatalogItem {
            name: "Pulsar".into(),
            brand: "Bajaj".into(),
            ..Default::default()
        };
        let created = gw.create(&item).unwrap().unwrap();
        assert_eq!(created.prod_id.as_deref(), Some("p-9"));
        assert!(gw.create(&item).unwrap().is_none());

        let posts = fake.requests_with(Method::POST);
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].body.as_ref().unwrap()["name"], json!("Pulsar"));
    }

    #[test]
    fn insert_ignores_the_echoed_row() {
        let fake = FakeTransport::default();
        fake.push_json(json!([{"name": "X", "price": "not a price"}]));
        let item = CatalogItem {
            name: "X".into(),
            ..Default::default()
        };
        products(&fake).insert(&item).unwrap();
        assert_eq!(fake.requests_with(Method::POST).len(), 1);
    }

    #[test]
    fn get_by_id_limits_to_one_row() {
        let fake = FakeTransport::default();
        let gw = products(&fake);
        assert!(gw.get_by_id("missing").unwrap().is_none());

        let req = &fake.requests()[0];
        assert_eq!(req.query_param("prod_id").as_deref(), Some("eq.missing"));
        assert_eq!(req.query_param("limit").as_deref(), Some("1"));
        assert_eq!(req.query_param("select").as_deref(), Some("*"));
    }

    #[test]
    fn update_targets_identity() {
        let fake = FakeTransport::default();
        fake.push_json(json!([{"prod_id": "p-1", "name": "Duke", "price": 300000}]));
        let gw = products(&fake);

        let updated = gw.update("p-1", &json!({"price": 300000})).unwrap().unwrap();
        assert_eq!(updated.price, Some(300000.0));

        let req = &fake.requests_with(Method::PATCH)[0];
        assert_eq!(req.query_param("prod_id").as_deref(), Some("eq.p-1"));
    }

    #[test]
    fn delete_counts_returned_rows() {
        let fake = FakeTransport::default();
        fake.push_json(json!([{"prod_id": "p-1"}]));
        let gw = products(&fake);
        assert_eq!(gw.delete("p-1").unwrap(), 1);
        assert_eq!(gw.delete("p-1").unwrap(), 0);
    }

    #[test]
    fn list_pushes_each_filter() {
        let fake = FakeTransport::default();
        fake.push_json(json!([{"name": "Ather 450X", "brand": "Ather", "is_electric": true}]));
        let gw = products(&fake);

        let rows = gw
            .list(&[("brand", "Ather".into()), ("is_electric", true.into())])
            .unwrap();
        assert_eq!(rows.len(), 1);

        let req = &fake.requests()[0];
        assert_eq!(req.query_param("brand").as_deref(), Some("eq.Ather"));
        assert_eq!(req.query_param("is_electric").as_deref(), Some("eq.true"));
    }

    #[test]
    fn malformed_row_is_validation_error() {
        let fake = FakeTransport::default();
        fake.push_json(json!([{"name": "X", "engine_cc": "big"}]));
        let err = products(&fake).list(&[]).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn upsert_sends_all_rows() {
        let fake = FakeTransport::default();
        fake.push_json(json!([{"prod_id": "a"}, {"prod_id": "b"}]));
        let rows = vec![
            CatalogItem { prod_id: Some("a".into()), ..Default::default() },
            CatalogItem { prod_id: Some("b".into()), ..Default::default() },
        ];
        let stored = products(&fake).upsert(&rows, "prod_id").unwrap();
        assert_eq!(stored.len(), 2);
        let req = &fake.requests()[0];
        assert_eq!(req.query_param("on_conflict").as_deref(), Some("prod_id"));
    }
}
