//! Static region catalog and license-plate prefix table.

use std::collections::HashMap;
use std::hash::BuildHasher;

use crate::model::{MapValue, RegionEntry};

/// First-level regions of China with their division codes, in code order.
const CHINA_REGIONS: [(&str, &str); 34] = [
    ("北京市", "110000"),
    ("天津市", "120000"),
    ("河北省", "130000"),
    ("山西省", "140000"),
    ("内蒙古自治区", "150000"),
    ("辽宁省", "210000"),
    ("吉林省", "220000"),
    ("黑龙江省", "230000"),
    ("上海市", "310000"),
    ("江苏省", "320000"),
    ("浙江省", "330000"),
    ("安徽省", "340000"),
    ("福建省", "350000"),
    ("江西省", "360000"),
    ("山东省", "370000"),
    ("河南省", "410000"),
    ("湖北省", "420000"),
    ("湖南省", "430000"),
    ("广东省", "440000"),
    ("广西壮族自治区", "450000"),
    ("海南省", "460000"),
    ("重庆市", "500000"),
    ("四川省", "510000"),
    ("贵州省", "520000"),
    ("云南省", "530000"),
    ("西藏自治区", "540000"),
    ("陕西省", "610000"),
    ("甘肃省", "620000"),
    ("青海省", "630000"),
    ("宁夏回族自治区", "640000"),
    ("新疆维吾尔自治区", "650000"),
    ("台湾省", "710000"),
    ("香港特别行政区", "810000"),
    ("澳门特别行政区", "820000"),
];

/// Plate prefixes keyed by short region name.
const CHINA_PLATES: [(&str, &str); 34] = [
    ("北京", "京"),
    ("天津", "津"),
    ("河北", "冀"),
    ("山西", "晋"),
    ("内蒙古", "蒙"),
    ("辽宁", "辽"),
    ("吉林", "吉"),
    ("黑龙江", "黑"),
    ("上海", "沪"),
    ("江苏", "苏"),
    ("浙江", "浙"),
    ("安徽", "皖"),
    ("福建", "闽"),
    ("江西", "赣"),
    ("山东", "鲁"),
    ("河南", "豫"),
    ("湖北", "鄂"),
    ("湖南", "湘"),
    ("广东", "粤"),
    ("广西", "桂"),
    ("海南", "琼"),
    ("重庆", "渝"),
    ("四川", "川"),
    ("贵州", "贵"),
    ("云南", "云"),
    ("西藏", "藏"),
    ("陕西", "陕"),
    ("甘肃", "甘"),
    ("青海", "青"),
    ("宁夏", "宁"),
    ("新疆", "新"),
    ("台湾", "台"),
    ("香港", "港"),
    ("澳门", "澳"),
];

/// Lowest colour-scale value handed out by [`PlateTable::map_values`].
const VALUE_FLOOR: f64 = 50.0;
/// Width of the colour-scale range.
const VALUE_SPAN: f64 = 100.0;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
/// Errors raised while building a catalog or table.
pub enum CatalogError {
    /// Two entries share a display name.
    #[error("Duplicate region name: {0}")]
    DuplicateName(String),
}

/// Name-keyed table the matcher can query.
pub trait NameLookup {
    /// Value stored under each name.
    type Value;

    /// Exact lookup returning the stored key and its value.
    fn lookup(&self, name: &str) -> Option<(&str, &Self::Value)>;
}

impl<V, S: BuildHasher> NameLookup for HashMap<String, V, S> {
    type Value = V;

    fn lookup(&self, name: &str) -> Option<(&str, &V)> {
        self.get_key_value(name)
            .map(|(key, value)| (key.as_str(), value))
    }
}

/// Ordered, read-only list of regions with unique names.
#[derive(Debug, Clone)]
pub struct RegionCatalog {
    entries: Vec<RegionEntry>,
    index: HashMap<String, usize>,
}

impl RegionCatalog {
    /// Build a catalog, keeping the given order.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateName`] when two entries share a name.
    pub fn new(entries: Vec<RegionEntry>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            if index.insert(entry.name.clone(), position).is_some() {
                return Err(CatalogError::DuplicateName(entry.name.clone()));
            }
        }
        Ok(Self { entries, index })
    }

    /// The 34 first-level regions of China.
    #[must_use]
    pub fn china() -> Self {
        let entries: Vec<RegionEntry> = CHINA_REGIONS
            .iter()
            .map(|(name, code)| RegionEntry::new(*name, *code))
            .collect();
        let index = entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (entry.name.clone(), position))
            .collect();
        Self { entries, index }
    }

    /// Entries in catalog order.
    #[must_use]
    pub fn entries(&self) -> &[RegionEntry] {
        &self.entries
    }

    /// Iterator over entries in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &RegionEntry> {
        self.entries.iter()
    }

    /// Number of regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog holds no region.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl NameLookup for RegionCatalog {
    type Value = RegionEntry;

    fn lookup(&self, name: &str) -> Option<(&str, &RegionEntry)> {
        let entry = self.entries.get(*self.index.get(name)?)?;
        Some((entry.name.as_str(), entry))
    }
}

/// Ordered `name -> plate prefix` table.
#[derive(Debug, Clone)]
pub struct PlateTable {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl PlateTable {
    /// Build a table, keeping the given order.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateName`] when a name appears twice.
    pub fn new<I, N, P>(entries: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = (N, P)>,
        N: Into<String>,
        P: Into<String>,
    {
        let mut table = Self {
            entries: Vec::new(),
            index: HashMap::new(),
        };
        for (name, plate) in entries {
            let name = name.into();
            if table.index.contains_key(&name) {
                return Err(CatalogError::DuplicateName(name));
            }
            table.index.insert(name.clone(), table.entries.len());
            table.entries.push((name, plate.into()));
        }
        Ok(table)
    }

    /// Plate prefixes for every region of [`RegionCatalog::china`].
    #[must_use]
    pub fn china() -> Self {
        let entries: Vec<(String, String)> = CHINA_PLATES
            .iter()
            .map(|(name, plate)| ((*name).to_owned(), (*plate).to_owned()))
            .collect();
        let index = entries
            .iter()
            .enumerate()
            .map(|(position, (name, _))| (name.clone(), position))
            .collect();
        Self { entries, index }
    }

    /// Plate prefix stored under exactly `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.lookup(name).map(|(_, plate)| plate.as_str())
    }

    /// `(name, plate)` pairs in table order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, plate)| (name.as_str(), plate.as_str()))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render records, one per entry, with values spread evenly over the colour scale.
    #[must_use]
    pub fn map_values(&self) -> Vec<MapValue> {
        #[expect(
            clippy::cast_precision_loss,
            reason = "table sizes are far below f64 precision limits"
        )]
        let count = self.entries.len().max(1) as f64;

        self.entries
            .iter()
            .enumerate()
            .map(|(position, (name, plate))| {
                #[expect(
                    clippy::cast_precision_loss,
                    reason = "table sizes are far below f64 precision limits"
                )]
                let step = position as f64;
                MapValue {
                    name: name.clone(),
                    value: VALUE_FLOOR + VALUE_SPAN * step / count,
                    plate: plate.clone(),
                }
            })
            .collect()
    }
}

impl NameLookup for PlateTable {
    type Value = String;

    fn lookup(&self, name: &str) -> Option<(&str, &String)> {
        let (key, plate) = self.entries.get(*self.index.get(name)?)?;
        Some((key.as_str(), plate))
    }
}
