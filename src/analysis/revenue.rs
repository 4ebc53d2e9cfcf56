use crate::analysis::descriptive::{percent, ratio};
use crate::domain::model::{FareComponents, PaymentRecord};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentShare {
    pub name: &'static str,
    pub total: f64,
    /// Share of the component sum, so the shares add up to 100.
    pub share_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenueBreakdown {
    pub transactions: usize,
    pub fare_total: f64,
    pub component_total: f64,
    /// fare_total - component_total
    pub unattributed: f64,
    pub components: Vec<ComponentShare>,
}

pub fn revenue_breakdown(payments: &[&PaymentRecord]) -> RevenueBreakdown {
    let mut sums = [0.0; 5];
    let mut fare_total = 0.0;
    for p in payments {
        fare_total += p.fare_total;
        for (sum, value) in sums.iter_mut().zip(p.components.values()) {
            *sum += value;
        }
    }
    let component_total: f64 = sums.iter().sum();

    let components = FareComponents::NAMES
        .into_iter()
        .zip(sums)
        .map(|(name, total)| ComponentShare {
            name,
            total,
            share_pct: percent(total, component_total),
        })
        .collect();

    RevenueBreakdown {
        transactions: payments.len(),
        fare_total,
        component_total,
        unattributed: fare_total - component_total,
        components,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodShare {
    pub method: String,
    pub count: usize,
    pub share_pct: Option<f64>,
    pub total_amount: f64,
    pub mean_fare: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentMethodSplit {
    pub transactions: usize,
    /// Share of transactions paid in cash.
    pub cash_share_pct: Option<f64>,
    pub methods: Vec<MethodShare>,
}

pub fn payment_method_split(payments: &[&PaymentRecord]) -> PaymentMethodSplit {
    let mut by_method: BTreeMap<&str, (usize, f64)> = BTreeMap::new();
    for p in payments {
        let entry = by_method.entry(p.payment_method.as_str()).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += p.fare_total;
    }

    let total = payments.len() as f64;
    let mut methods: Vec<MethodShare> = by_method
        .into_iter()
        .map(|(method, (count, amount))| MethodShare {
            method: method.to_string(),
            count,
            share_pct: percent(count as f64, total),
            total_amount: amount,
            mean_fare: ratio(amount, count as f64),
        })
        .collect();
    methods.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.method.cmp(&b.method)));

    let cash = payments.iter().filter(|p| p.is_cash()).count();

    PaymentMethodSplit {
        transactions: payments.len(),
        cash_share_pct: percent(cash as f64, total),
        methods,
    }
}
