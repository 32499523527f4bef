//! Suffix-tolerant lookup of region display names.
//!
//! Boundary sources label regions with their official names (“北京市”,
//! “广西壮族自治区”), while value tables are usually keyed by short names
//! (“北京”, “广西”). The matcher bridges the two with one rule: try the name
//! as-is, then strip at most one known administrative suffix and try again.

use crate::catalog::NameLookup;

/// Administrative suffixes stripped by [`NameMatcher::default`].
///
/// Ethnic autonomous-region suffixes come first so they win over the plain
/// “自治区” suffix.
pub const ADMINISTRATIVE_SUFFIXES: [&str; 10] = [
    "特别行政区",
    "维吾尔自治区",
    "壮族自治区",
    "回族自治区",
    "自治区",
    "自治州",
    "地区",
    "市",
    "省",
    "盟",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// A successful lookup.
pub struct Resolved<'table, V> {
    /// Key under which the value was found.
    pub name: &'table str,
    /// Stored value.
    pub value: &'table V,
}

/// Resolves display names against name-keyed tables.
#[derive(Debug, Clone)]
pub struct NameMatcher {
    suffixes: Vec<String>,
}

impl NameMatcher {
    /// Matcher with a custom suffix list.
    ///
    /// Suffixes are tried longest first regardless of the given order.
    #[must_use]
    pub fn with_suffixes<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut suffixes: Vec<String> = suffixes
            .into_iter()
            .map(Into::into)
            .filter(|suffix| !suffix.is_empty())
            .collect();
        suffixes.sort_by_key(|suffix| std::cmp::Reverse(suffix.chars().count()));
        Self { suffixes }
    }

    /// Suffixes in the order they are tried.
    #[must_use]
    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }

    /// `name` without its first matching suffix, if any suffix matches.
    ///
    /// A name that consists only of a suffix is left alone.
    #[must_use]
    pub fn strip_suffix<'name>(&self, name: &'name str) -> Option<&'name str> {
        self.suffixes
            .iter()
            .find_map(|suffix| name.strip_suffix(suffix.as_str()))
            .filter(|stem| !stem.is_empty())
    }

    /// Look `name` up in `table`, retrying once without a suffix.
    pub fn resolve<'table, T>(
        &self,
        name: &str,
        table: &'table T,
    ) -> Option<Resolved<'table, T::Value>>
    where
        T: NameLookup + ?Sized,
    {
        let (key, value) = table
            .lookup(name)
            .or_else(|| table.lookup(self.strip_suffix(name)?))?;
        Some(Resolved { name: key, value })
    }
}

impl Default for NameMatcher {
    fn default() -> Self {
        Self::with_suffixes(ADMINISTRATIVE_SUFFIXES)
    }
}
