// Typed rows for the tables the app reads and writes.
//
// Numeric columns arrive as JSON numbers or numeric strings depending on the
// column type; both are accepted. Anything else in a numeric column is a
// decode error rather than a silent default.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A table with a single identity column.
pub trait Record: Serialize + DeserializeOwned {
    const TABLE: &'static str;
    const ID_COLUMN: &'static str;
}

/// A motorbike in the `products` table, combustion or electric.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    #[serde(default, deserialize_with = "lenient::opt_text", skip_serializing_if = "Option::is_none")]
    pub prod_id: Option<String>,

    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub name: String,

    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub brand: String,

    #[serde(default, deserialize_with = "lenient::opt_f64", skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,

    #[serde(default, deserialize_with = "lenient::i64_or_zero")]
    pub stock: i64,

    #[serde(default, deserialize_with = "lenient::opt_text", skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,

    /// Displacement; only set for combustion bikes.
    #[serde(default, deserialize_with = "lenient::opt_i64", skip_serializing_if = "Option::is_none")]
    pub engine_cc: Option<i64>,

    /// Motor output; only set for electric bikes.
    #[serde(default, deserialize_with = "lenient::opt_f64", skip_serializing_if = "Option::is_none")]
    pub power_kw: Option<f64>,

    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub is_electric: bool,

    #[serde(default, deserialize_with = "lenient::opt_f64", skip_serializing_if = "Option::is_none")]
    pub mileage_kmpl: Option<f64>,

    #[serde(default, deserialize_with = "lenient::opt_f64", skip_serializing_if = "Option::is_none")]
    pub bhp: Option<f64>,

    #[serde(default, deserialize_with = "lenient::opt_f64", skip_serializing_if = "Option::is_none")]
    pub torque_nm: Option<f64>,
}

impl CatalogItem {
    /// Price used for range checks and ordering; a missing price counts as 0.
    pub fn price_key(&self) -> f64 {
        self.price.unwrap_or(0.0)
    }

    /// Displacement used for range checks and ordering; missing counts as 0.
    pub fn cc_key(&self) -> i64 {
        self.engine_cc.unwrap_or(0)
    }
}

impl Record for CatalogItem {
    const TABLE: &'static str = "products";
    const ID_COLUMN: &'static str = "prod_id";
}

/// Audit entry: which bike was suggested to which customer, and when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionRecord {
    #[serde(default, deserialize_with = "lenient::opt_text", skip_serializing_if = "Option::is_none")]
    pub suggestion_id: Option<String>,

    #[serde(deserialize_with = "lenient::text")]
    pub cust_id: String,

    #[serde(default, deserialize_with = "lenient::opt_text")]
    pub prod_id: Option<String>,

    #[serde(with = "timestamp")]
    pub date_requested: DateTime<Utc>,
}

impl SuggestionRecord {
    pub fn new(cust_id: &str, prod_id: Option<String>, date_requested: DateTime<Utc>) -> Self {
        Self {
            suggestion_id: None,
            cust_id: cust_id.to_string(),
            prod_id,
            date_requested,
        }
    }
}

impl Record for SuggestionRecord {
    const TABLE: &'static str = "suggestions";
    const ID_COLUMN: &'static str = "suggestion_id";
}

/// Row counts per table, as reported by the inventory report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InventoryReport {
    pub products: usize,
    pub customers: usize,
    pub suggestions: usize,
}

mod lenient {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
    }

    pub fn opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        match Option::<Value>::deserialize(d)? {
            None | Some(Value::Null) => Ok(None),
            Some(v) => to_f64(&v).map(Some).map_err(D::Error::custom),
        }
    }

    pub fn opt_i64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        match Option::<Value>::deserialize(d)? {
            None | Some(Value::Null) => Ok(None),
            Some(v) => to_i64(&v).map(Some).map_err(D::Error::custom),
        }
    }

    pub fn i64_or_zero<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        Ok(opt_i64(d)?.unwrap_or(0))
    }

    pub fn opt_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        match Option::<Value>::deserialize(d)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(other) => Err(D::Error::custom(format!("expected an identifier, got {other}"))),
        }
    }

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        opt_text(d)?.ok_or_else(|| D::Error::custom("identifier is null"))
    }

    fn to_f64(v: &Value) -> Result<f64, String> {
        match v {
            Value::Number(n) => n.as_f64().ok_or_else(|| format!("{n} is out of range")),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .ok_or_else(|| format!("{s:?} is not a number")),
            other => Err(format!("{other} is not a number")),
        }
    }

    fn to_i64(v: &Value) -> Result<i64, String> {
        match v {
            Value::Number(n) => match (n.as_i64(), n.as_f64()) {
                (Some(i), _) => Ok(i),
                (None, Some(f)) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
                _ => Err(format!("{n} is not a whole number")),
            },
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| format!("{s:?} is not a whole number")),
            other => Err(format!("{other} is not a whole number")),
        }
    }
}

/// ISO-8601 in UTC on the way out; on the way in, also accepts the
/// offset-less form a `timestamp` column produces.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Micros, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        if let Ok(at) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(at.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(|e| D::Error::custom(format!("bad timestamp {raw:?}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn decodes_numeric_strings_and_nulls() {
        let item: CatalogItem = serde_json::from_value(json!({
            "prod_id": "p-1",
            "name": "Apache RTR 160",
            "brand": "TVS",
            "price": "124990.50",
            "stock": null,
            "engine_cc": 159,
            "power_kw": null,
            "is_electric": null,
            "bhp": 15.8
        }))
        .unwrap();

        assert_eq!(item.price, Some(124990.5));
        assert_eq!(item.stock, 0);
        assert_eq!(item.engine_cc, Some(159));
        assert_eq!(item.power_kw, None);
        assert!(!item.is_electric);
        assert_eq!(item.bhp, Some(15.8));
    }

    #[test]
    fn malformed_price_is_rejected() {
        let err = serde_json::from_value::<CatalogItem>(json!({"name": "X", "price": "cheap"}))
            .unwrap_err();
        assert!(err.to_string().contains("not a number"));
    }

    #[test]
    fn non_finite_price_strings_are_rejected() {
        for raw in ["NaN", "inf", "-Infinity"] {
            let err = serde_json::from_value::<CatalogItem>(json!({"name": "Odd", "price": raw}))
                .unwrap_err();
            assert!(err.to_string().contains("not a number"), "{raw}: {err}");
        }
    }

    #[test]
    fn fractional_cc_is_rejected_but_whole_float_is_not() {
        assert!(serde_json::from_value::<CatalogItem>(json!({"engine_cc": 149.5})).is_err());
        let item: CatalogItem = serde_json::from_value(json!({"engine_cc": 150.0})).unwrap();
        assert_eq!(item.engine_cc, Some(150));
    }

    #[test]
    fn numeric_identity_is_read_as_text() {
        let item: CatalogItem = serde_json::from_value(json!({"prod_id": 42})).unwrap();
        assert_eq!(item.prod_id.as_deref(), Some("42"));
    }

    #[test]
    fn missing_values_are_not_serialized() {
        let item = CatalogItem {
            name: "Chetak".into(),
            brand: "Bajaj".into(),
            power_kw: Some(4.2),
            is_electric: true,
            ..Default::default()
        };
        let value = serde_json::to_value(&item).unwrap();
        let obj = value.as_object().unwrap();
        assert!(!obj.contains_key("prod_id"));
        assert!(!obj.contains_key("engine_cc"));
        assert_eq!(obj["power_kw"], json!(4.2));
        assert_eq!(obj["stock"], json!(0));
    }

    #[test]
    fn suggestion_timestamp_round_trips_both_forms() {
        let at = Utc.with_ymd_and_hms(2026, 10, 17, 9, 30, 0).unwrap();
        let record = SuggestionRecord::new("c-1", Some("p-1".into()), at);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["date_requested"], json!("2026-10-17T09:30:00.000000Z"));
        assert!(value.get("suggestion_id").is_none());

        let stored: SuggestionRecord = serde_json::from_value(json!({
            "suggestion_id": 7,
            "cust_id": "c-1",
            "prod_id": "p-1",
            "date_requested": "2026-10-17T09:30:00"
        }))
        .unwrap();
        assert_eq!(stored.date_requested, at);
        assert_eq!(stored.suggestion_id.as_deref(), Some("7"));
    }
}
