use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::error::SettleError;
use crate::finalize::QUANTITY;
use crate::model::Domain;
use crate::table::{Cell, Table};

/// Category assigned when neither the channel nor `default` is in the map.
pub const FALLBACK_CATEGORY: &str = "기타";

/// Filter keys with this suffix mean "not equal" against the bare column.
const EXCLUDE_SUFFIX: &str = "_exclude";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct SettlementConfig {
    pub general: GeneralConfig,
    pub file_identifiers: FileIdentifiers,
    pub rules: Rules,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeneralConfig {
    /// Normalized brand names dropped from every domain.
    #[serde(default)]
    pub excluded_brands: BTreeSet<String>,
}

/// Marker column per domain. A table containing the column belongs to it.
#[derive(Debug, Clone, Deserialize)]
pub struct FileIdentifiers {
    pub shipping: String,
    #[serde(rename = "return")]
    pub returns: String,
    pub receiving: String,
}

impl FileIdentifiers {
    pub fn marker(&self, domain: Domain) -> &str {
        match domain {
            Domain::Shipping => &self.shipping,
            Domain::Return => &self.returns,
            Domain::Receiving => &self.receiving,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Rules {
    pub shipping: ShippingRules,
    #[serde(rename = "return")]
    pub returns: ReturnRules,
    pub receiving: ReceivingRules,
}

// ---------------------------------------------------------------------------
// Shipping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ShippingRules {
    pub date_col: String,
    #[serde(default = "default_brand_col")]
    pub brand_col: String,
    /// Sales channel (mall) column.
    #[serde(default = "default_channel_col")]
    pub channel_col: String,
    /// Shipment type (carrier) column.
    #[serde(default = "default_shipment_type_col")]
    pub type_col: String,
    /// Quantity column. Defaults to the source of `수량` in `final_columns`.
    #[serde(default)]
    pub qty_col: Option<String>,
    #[serde(default, deserialize_with = "keep_filters")]
    pub filters: Vec<RowFilter>,
    pub type_conditions: TypeConditions,
    #[serde(default)]
    pub mall_list: BTreeSet<String>,
    #[serde(default)]
    pub category_map: CategoryMap,
    #[serde(default)]
    pub seeding_map: Option<SeedingOverride>,
    pub final_columns: ColumnMap,
    #[serde(default = "default_shipping_label")]
    pub source_label: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TypeConditions {
    /// Normal shipment types. The first entry is the primary type.
    #[serde(default)]
    pub normal_type: Vec<String>,
    /// Channel substrings that qualify a primary-type row as normal. An empty
    /// string matches every channel; an empty list matches none.
    #[serde(default)]
    pub normal_mall_keywords: Vec<String>,
}

impl ShippingRules {
    /// Configured quantity column, else the source mapped onto `수량`.
    pub fn quantity_column(&self) -> Option<&str> {
        self.qty_col
            .as_deref()
            .or_else(|| self.final_columns.source_for(QUANTITY))
    }
}

impl TypeConditions {
    pub fn primary_type(&self) -> Option<&str> {
        self.normal_type.first().map(String::as_str)
    }

    /// Type in the normal set, or primary type shipped through a keyword channel.
    pub fn is_normal(&self, shipment_type: &str, channel: &str) -> bool {
        let listed = self.normal_type.iter().any(|t| t == shipment_type);
        let keyword_bypass = self.primary_type() == Some(shipment_type)
            && self
                .normal_mall_keywords
                .iter()
                .any(|k| channel.contains(k.as_str()));
        keyword_bypass || listed
    }
}

/// Channel → category, with an optional `default` entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct CategoryMap(BTreeMap<String, String>);

impl CategoryMap {
    pub fn category_for(&self, channel: &str) -> &str {
        self.0
            .get(channel)
            .or_else(|| self.0.get("default"))
            .map_or(FALLBACK_CATEGORY, String::as_str)
    }
}

/// Hard (brand, mall) → category exception applied after the map lookup.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedingOverride {
    pub brand: String,
    pub mall: String,
    pub category: String,
}

impl SeedingOverride {
    pub fn matches(&self, brand: &str, channel: &str) -> bool {
        self.brand == brand && self.mall == channel
    }
}

// ---------------------------------------------------------------------------
// Return
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ReturnRules {
    pub date_col: String,
    pub brand_col: String,
    pub qty_col: String,
    pub status_col: String,
    /// Status value → category for rows that also get a relabeled copy.
    #[serde(default, alias = "bad_pason_map")]
    pub status_category_map: BTreeMap<String, String>,
    pub final_columns: ColumnMap,
    #[serde(default = "default_return_label")]
    pub source_label: String,
}

// ---------------------------------------------------------------------------
// Receiving
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ReceivingRules {
    pub date_col: String,
    #[serde(default = "default_brand_col")]
    pub brand_col: String,
    pub type_col: String,
    pub qty_col: String,
    #[serde(default)]
    pub free_types: BTreeSet<String>,
    #[serde(default, deserialize_with = "exclude_filters")]
    pub peculiar_filters: Vec<RowFilter>,
    pub final_columns_peculiar: ColumnMap,
    pub final_columns_free: ColumnMap,
    #[serde(default = "default_receiving_label")]
    pub source_label: String,
}

fn default_brand_col() -> String {
    "[브랜드]".into()
}

fn default_channel_col() -> String {
    "[매출처]".into()
}

fn default_shipment_type_col() -> String {
    "[택배사]".into()
}

fn default_shipping_label() -> String {
    "삼일 출고데이터".into()
}

fn default_return_label() -> String {
    "삼일 반품데이터".into()
}

fn default_receiving_label() -> String {
    "삼일 입고데이터".into()
}

// ---------------------------------------------------------------------------
// Column map
// ---------------------------------------------------------------------------

/// Canonical output name → source column name, in the order written in the
/// config. `_`-prefixed keys are dropped.
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    entries: Vec<(String, String)>,
}

impl ColumnMap {
    pub fn new<K: Into<String>, V: Into<String>>(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .filter(|(k, _)| !k.starts_with('_'))
                .collect(),
        }
    }

    /// Canonical name a source column is renamed to. When several canonical
    /// names map to the same source, the one written last wins.
    pub fn canonical_for(&self, source: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(_, s)| s == source)
            .map(|(c, _)| c.as_str())
    }

    /// Source column for a canonical name.
    pub fn source_for(&self, canonical: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(c, _)| c == canonical)
            .map(|(_, s)| s.as_str())
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(c, s)| (c.as_str(), s.as_str()))
    }
}

impl<'de> Deserialize<'de> for ColumnMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ColumnMapVisitor)
    }
}

/// Collects map entries in document order.
struct ColumnMapVisitor;

impl<'de> Visitor<'de> for ColumnMapVisitor {
    type Value = ColumnMap;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a table of canonical column name to source column name")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<ColumnMap, A::Error> {
        let mut entries = Vec::new();
        while let Some((canonical, source)) = map.next_entry::<String, String>()? {
            entries.push((canonical, source));
        }
        Ok(ColumnMap::new(entries))
    }
}

// ---------------------------------------------------------------------------
// Row filters
// ---------------------------------------------------------------------------

/// A keep-predicate over one column.
#[derive(Debug, Clone, PartialEq)]
pub enum RowFilter {
    Equals { column: String, value: String },
    NotEquals { column: String, value: String },
    NotIn { column: String, values: BTreeSet<String> },
}

impl RowFilter {
    pub fn column(&self) -> &str {
        match self {
            Self::Equals { column, .. } | Self::NotEquals { column, .. } | Self::NotIn { column, .. } => column,
        }
    }

    pub fn keeps(&self, cell: &Cell) -> bool {
        match self {
            Self::Equals { value, .. } => cell.text_eq(value),
            Self::NotEquals { value, .. } => !cell.text_eq(value),
            Self::NotIn { values, .. } => !values.contains(&cell.as_text()),
        }
    }

    /// Drop rows this filter rejects. The column must exist.
    pub fn apply(&self, table: &mut Table, domain: Domain) -> Result<(), SettleError> {
        let idx = table.require_column(domain, self.column())?;
        table.retain_rows(|row| self.keeps(&row[idx]));
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum FilterValue {
    One(Scalar),
    Many(Vec<Scalar>),
}

/// A filter operand. Compared against cells by text rendering, so `3` in the
/// config matches both a numeric `3` and the text `"3"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    fn into_text(self) -> String {
        let cell = match self {
            Self::Text(s) => return s,
            Self::Int(n) => Cell::from(n),
            Self::Float(n) => Cell::Number(n),
            Self::Bool(b) => Cell::Bool(b),
        };
        cell.as_text()
    }
}

fn texts(values: Vec<Scalar>) -> BTreeSet<String> {
    values.into_iter().map(Scalar::into_text).collect()
}

/// Shipping filters: scalar keeps equal rows, list excludes members,
/// `<col>_exclude` keeps rows not equal to the value.
fn keep_filters<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<RowFilter>, D::Error> {
    let raw = BTreeMap::<String, FilterValue>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter(|(key, _)| !key.starts_with('_'))
        .map(|(key, value)| match key.strip_suffix(EXCLUDE_SUFFIX) {
            Some(column) => exclusion(column.to_string(), value),
            None => match value {
                FilterValue::One(value) => RowFilter::Equals {
                    column: key,
                    value: value.into_text(),
                },
                FilterValue::Many(values) => RowFilter::NotIn {
                    column: key,
                    values: texts(values),
                },
            },
        })
        .collect())
}

/// Receiving peculiar filters: scalar excludes the value, list excludes members.
fn exclude_filters<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<RowFilter>, D::Error> {
    let raw = BTreeMap::<String, FilterValue>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter(|(key, _)| !key.starts_with('_'))
        .map(|(column, value)| exclusion(column, value))
        .collect())
}

fn exclusion(column: String, value: FilterValue) -> RowFilter {
    match value {
        FilterValue::One(value) => RowFilter::NotEquals {
            column,
            value: value.into_text(),
        },
        FilterValue::Many(values) => RowFilter::NotIn {
            column,
            values: texts(values),
        },
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl SettlementConfig {
    pub fn from_toml(input: &str) -> Result<Self, SettleError> {
        let config: SettlementConfig =
            toml::from_str(input).map_err(|e| SettleError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Same schema in JSON, the format of older `config.json` files.
    pub fn from_json(input: &str) -> Result<Self, SettleError> {
        let config: SettlementConfig =
            serde_json::from_str(input).map_err(|e| SettleError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SettleError> {
        // Marker columns must be present and tell the domains apart
        let mut seen = BTreeSet::new();
        for domain in Domain::ALL {
            let marker = self.file_identifiers.marker(domain);
            require_name(&format!("file_identifiers.{domain}"), marker)?;
            if !seen.insert(marker) {
                return Err(SettleError::ConfigValidation(format!(
                    "file_identifiers: marker column '{marker}' is used by more than one domain"
                )));
            }
        }

        let s = &self.rules.shipping;
        require_name("rules.shipping.date_col", &s.date_col)?;
        require_name("rules.shipping.brand_col", &s.brand_col)?;
        require_name("rules.shipping.channel_col", &s.channel_col)?;
        require_name("rules.shipping.type_col", &s.type_col)?;
        if let Some(qty_col) = &s.qty_col {
            require_name("rules.shipping.qty_col", qty_col)?;
        }
        if let Some(seed) = &s.seeding_map {
            if seed.brand.is_empty() || seed.mall.is_empty() || seed.category.is_empty() {
                return Err(SettleError::ConfigValidation(
                    "rules.shipping.seeding_map: brand, mall and category are required".into(),
                ));
            }
        }

        let r = &self.rules.returns;
        require_name("rules.return.date_col", &r.date_col)?;
        require_name("rules.return.brand_col", &r.brand_col)?;
        require_name("rules.return.qty_col", &r.qty_col)?;
        require_name("rules.return.status_col", &r.status_col)?;

        let v = &self.rules.receiving;
        require_name("rules.receiving.date_col", &v.date_col)?;
        require_name("rules.receiving.brand_col", &v.brand_col)?;
        require_name("rules.receiving.type_col", &v.type_col)?;
        require_name("rules.receiving.qty_col", &v.qty_col)?;

        Ok(())
    }
}

fn require_name(field: &str, value: &str) -> Result<(), SettleError> {
    if value.trim().is_empty() {
        return Err(SettleError::ConfigValidation(format!("{field} must not be empty")));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
