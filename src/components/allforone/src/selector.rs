//!
//! Weighted random selection of the payout recipient.
//!
//! Every payer holds as many "tickets" as the base units it paid,
//! and one ticket is drawn uniformly.
//!

use {
    crate::ledger::PaymentEvent,
    rand::Rng,
    ruc::*,
    std::collections::{btree_map, BTreeMap},
};

/// Payer => accumulated amount.
///
/// Ordered, so that a given seed always walks the entries the same way.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeightTable<K: Ord = u64> {
    weights: BTreeMap<K, u64>,
    total: u64,
}

impl<K: Ord> Default for WeightTable<K> {
    fn default() -> Self {
        WeightTable {
            weights: BTreeMap::new(),
            total: 0,
        }
    }
}

impl<K: Ord> WeightTable<K> {
    #[allow(missing_docs)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` to `who`, on top of what it already has.
    pub fn add(&mut self, who: K, amount: u64) -> Result<()> {
        let total = self
            .total
            .checked_add(amount)
            .c(d!("total of the weight table overflows"))?;
        let w = self.weights.entry(who).or_insert(0);
        *w += amount;
        self.total = total;
        Ok(())
    }

    #[inline(always)]
    #[allow(missing_docs)]
    pub fn total(&self) -> u64 {
        self.total
    }

    #[inline(always)]
    #[allow(missing_docs)]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    #[inline(always)]
    #[allow(missing_docs)]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    #[allow(missing_docs)]
    pub fn get(&self, who: &K) -> Option<u64> {
        self.weights.get(who).copied()
    }

    #[allow(missing_docs)]
    pub fn iter(&self) -> btree_map::Iter<'_, K, u64> {
        self.weights.iter()
    }
}

impl WeightTable<u64> {
    /// sender => sum of the amounts it sent
    pub fn from_payments(payments: &[PaymentEvent]) -> Result<Self> {
        let mut table = Self::new();
        for p in payments {
            table.add(p.sender, p.amount).c(d!())?;
        }
        Ok(table)
    }
}

/// Draw one key of `table`, each with probability `weight / total`.
///
/// Zero-weight keys are never returned. An empty table, or one whose
/// total is zero, is an error.
pub fn select<'a, K, R>(table: &'a WeightTable<K>, rng: &mut R) -> Result<&'a K>
where
    K: Ord,
    R: Rng + ?Sized,
{
    if 0 == table.total {
        return Err(eg!("nothing to select from"));
    }

    let ticket = rng.gen_range(0..table.total);
    let mut running = 0u64;
    for (who, w) in table.weights.iter() {
        running += *w;
        if ticket < running {
            return Ok(who);
        }
    }

    // `running` ends at `total > ticket`, so this is only reached
    // if the table was tampered with
    table
        .weights
        .keys()
        .next_back()
        .c(d!("nothing to select from"))
}
