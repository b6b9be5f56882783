use std::collections::BTreeMap;

/// Street name to price per minute, in minor currency units.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PricingTable {
    prices: BTreeMap<String, u32>,
}

impl PricingTable {
    /// Price per minute for `street_name`, matched exactly.
    pub fn lookup(&self, street_name: &str) -> Option<u32> {
        self.prices.get(street_name).copied()
    }

    pub fn contains(&self, street_name: &str) -> bool {
        self.prices.contains_key(street_name)
    }

    /// Priced streets in name order.
    pub fn streets(&self) -> impl Iterator<Item = (&str, u32)> {
        self.prices.iter().map(|(name, price)| (name.as_str(), *price))
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl FromIterator<(String, u32)> for PricingTable {
    fn from_iter<I: IntoIterator<Item = (String, u32)>>(iter: I) -> Self {
        Self {
            prices: iter.into_iter().collect(),
        }
    }
}
