use std::collections::BTreeMap;

use crate::components::profile::Balances;

/// True iff every cost entry is covered by the current balances.
pub fn can_afford(balances: &Balances, cost: &BTreeMap<String, i64>) -> bool {
    cost.iter().all(|(code, need)| balances.get(code) >= *need)
}

/// First cost entry the balances fall short on, in code order.
pub fn first_shortfall<'a>(
    balances: &Balances,
    cost: &'a BTreeMap<String, i64>,
) -> Option<(&'a str, i64, i64)> {
    cost.iter().find_map(|(code, need)| {
        let have = balances.get(code);
        if have < *need {
            Some((code.as_str(), have, *need))
        } else {
            None
        }
    })
}

/// Total magnitude of a cost across all emblem kinds; the shop's cost sort key.
pub fn cost_total(cost: &BTreeMap<String, i64>) -> i64 {
    cost.values().sum()
}
