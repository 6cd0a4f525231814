//! Tax aggregation.
//!
//! Line-item taxes are grouped into document-level entries: transfers by
//! `(tax, factor type, rate)`, retentions by tax. Sums run at full
//! precision; amounts are rounded to 2 decimals and rates to 6 only when
//! written back. Groups summing to zero are kept.

mod invoice;
mod payments;

pub use invoice::calculate_totals;
pub use payments::calculate_payment_totals;

use rust_decimal::Decimal;

use crate::core::decimal::checked_add;
use crate::core::{CfdiError, FactorType, TaxKind};

/// Grouping key of a transferred tax. The rate is absent for exempt entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferKey {
    pub tax: TaxKind,
    pub factor: FactorType,
    pub rate: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaxSum {
    pub base: Decimal,
    pub amount: Decimal,
}

/// Accumulated tax groups in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct TaxGroups {
    pub transfers: Vec<(TransferKey, TaxSum)>,
    pub retentions: Vec<(TaxKind, Decimal)>,
}

impl TaxGroups {
    pub fn add_transfer(
        &mut self,
        key: TransferKey,
        base: Decimal,
        amount: Decimal,
    ) -> Result<(), CfdiError> {
        let idx = match self.transfers.iter().position(|(k, _)| *k == key) {
            Some(idx) => idx,
            None => {
                self.transfers.push((key, TaxSum::default()));
                self.transfers.len() - 1
            }
        };
        let sum = &mut self.transfers[idx].1;
        sum.base = checked_add(sum.base, base)?;
        sum.amount = checked_add(sum.amount, amount)?;
        Ok(())
    }

    pub fn add_retention(&mut self, tax: TaxKind, amount: Decimal) -> Result<(), CfdiError> {
        match self.retentions.iter_mut().find(|(k, _)| *k == tax) {
            Some((_, sum)) => *sum = checked_add(*sum, amount)?,
            None => self.retentions.push((tax, amount)),
        }
        Ok(())
    }

    pub fn transferred_total(&self) -> Result<Decimal, CfdiError> {
        self.transfers
            .iter()
            .try_fold(Decimal::ZERO, |acc, (_, sum)| checked_add(acc, sum.amount))
    }

    pub fn retained_total(&self) -> Result<Decimal, CfdiError> {
        self.retentions
            .iter()
            .try_fold(Decimal::ZERO, |acc, (_, amount)| checked_add(acc, *amount))
    }

    /// True when at least one transfer group is not exempt.
    pub fn has_taxable_transfers(&self) -> bool {
        self.transfers
            .iter()
            .any(|(k, _)| k.factor != FactorType::Exempt)
    }

    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty() && self.retentions.is_empty()
    }
}

/// Value of a required grouping attribute.
fn key_part<T: Copy>(value: Option<T>, node: &'static str, attribute: &'static str) -> Result<T, CfdiError> {
    value.ok_or(CfdiError::MissingAttribute { node, attribute })
}
