use std::collections::BTreeMap;

use crate::components::profile::Ledger;
use crate::data::battle_pass::{BattlePassCatalog, PassTier};
use crate::data::rewards::Reward;
use crate::data::tasks::Task;
use crate::rules::affordability::first_shortfall;
use crate::rules::progression::{ProgressSummary, ProgressionConfig};

/// Why an economy operation was refused. Refusal never mutates the ledger.
#[derive(Debug, Clone, PartialEq)]
pub enum EconomyError {
    UnknownTask(String),
    UnknownReward(String),
    InsufficientFunds { emblem: String, have: i64, need: i64 },
}

impl std::fmt::Display for EconomyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EconomyError::UnknownTask(id) => write!(f, "unknown task {}", id),
            EconomyError::UnknownReward(id) => write!(f, "unknown reward {}", id),
            EconomyError::InsufficientFunds { emblem, have, need } => {
                write!(f, "not enough {}: have {}, need {}", emblem, have, need)
            }
        }
    }
}

impl std::error::Error for EconomyError {}

/// One battle-pass level crossed during an experience award, paired with the
/// tier that paid out. Levels without a tier are crossed silently.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelUp {
    pub level: u32,
    pub tier: PassTier,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskCompletion {
    pub task_id: String,
    pub emblems: BTreeMap<String, i64>,
    pub experience: i64,
    pub level_ups: Vec<LevelUp>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Redemption {
    pub reward_id: String,
    pub name: String,
    pub tangible: bool,
    pub debited: BTreeMap<String, i64>,
}

/// Add experience and cascade level-ups, one level per iteration, collecting
/// the tier payout of every crossed level in ascending order.
///
/// Emblem tiers credit the ledger immediately; tangible tiers only appear in
/// the returned events, for the notification channel to deliver. Past the
/// season cap experience keeps accumulating but nothing further is paid.
pub fn award_experience(
    ledger: &mut Ledger,
    amount: i64,
    pass: &BattlePassCatalog,
    config: &ProgressionConfig,
) -> Vec<LevelUp> {
    ledger.experience += amount.max(0);

    let mut level_ups = Vec::new();
    while ledger.level < config.max_level
        && ledger.experience >= config.curve.threshold_for_level(ledger.level + 1)
    {
        ledger.level += 1;
        if let Some(tier) = pass.tier_for_level(ledger.level) {
            if !tier.tangible {
                for (code, credit) in &tier.emblems {
                    ledger.balances.credit(code, *credit);
                }
            }
            level_ups.push(LevelUp {
                level: ledger.level,
                tier: tier.clone(),
            });
        }
    }
    level_ups
}

/// Credit a task's emblem payout and award its experience. Completion has no
/// failure mode and is freely repeatable; completed-task bookkeeping is a
/// collaborator concern.
pub fn complete_task(
    ledger: &mut Ledger,
    task: &Task,
    pass: &BattlePassCatalog,
    config: &ProgressionConfig,
) -> TaskCompletion {
    for (code, credit) in &task.emblems {
        ledger.balances.credit(code, *credit);
    }
    let level_ups = award_experience(ledger, task.experience, pass, config);
    TaskCompletion {
        task_id: task.id.clone(),
        emblems: task.emblems.clone(),
        experience: task.experience,
        level_ups,
    }
}

/// Debit a reward's full cost, all or nothing. On `InsufficientFunds` the
/// ledger is untouched.
pub fn redeem_reward(ledger: &mut Ledger, reward: &Reward) -> Result<Redemption, EconomyError> {
    if let Some((code, have, need)) = first_shortfall(&ledger.balances, &reward.cost) {
        return Err(EconomyError::InsufficientFunds {
            emblem: code.to_string(),
            have,
            need,
        });
    }
    for (code, debit) in &reward.cost {
        ledger.balances.debit(code, *debit);
    }
    Ok(Redemption {
        reward_id: reward.id.clone(),
        name: reward.name.clone(),
        tangible: reward.tangible,
        debited: reward.cost.clone(),
    })
}

/// Where the ledger sits inside its current level. Pure.
pub fn progress_summary(ledger: &Ledger, config: &ProgressionConfig) -> ProgressSummary {
    ProgressSummary::compute(ledger.experience, ledger.level, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::tasks::Difficulty;
    use crate::rules::progression::LevelCurve;

    fn geometric() -> ProgressionConfig {
        ProgressionConfig::default()
    }

    fn linear(rp: i64) -> ProgressionConfig {
        ProgressionConfig {
            curve: LevelCurve::Linear { rp_per_level: rp },
            max_level: 50,
        }
    }

    fn emblem_tier(level: u32, code: &str, amount: i64) -> PassTier {
        PassTier {
            level,
            name: format!("Tier {}", level),
            description: String::new(),
            emblems: BTreeMap::from([(code.to_string(), amount)]),
            tangible: false,
        }
    }

    fn tangible_tier(level: u32, name: &str) -> PassTier {
        PassTier {
            level,
            name: name.to_string(),
            description: String::new(),
            emblems: BTreeMap::new(),
            tangible: true,
        }
    }

    fn pass(tiers: Vec<PassTier>) -> BattlePassCatalog {
        BattlePassCatalog {
            schema_version: 1,
            tiers,
        }
    }

    fn ledger(config: &ProgressionConfig) -> Ledger {
        Ledger::new(["FIN", "HEART", "SPARK"], config.curve.starting_level())
    }

    fn task(id: &str, code: &str, amount: i64, experience: i64) -> Task {
        Task {
            id: id.to_string(),
            name: format!("Task {}", id),
            description: String::new(),
            category: "home".to_string(),
            difficulty: Difficulty::Normal,
            emblems: BTreeMap::from([(code.to_string(), amount)]),
            experience,
        }
    }

    fn reward(id: &str, cost: &[(&str, i64)], tangible: bool) -> Reward {
        Reward {
            id: id.to_string(),
            name: format!("Reward {}", id),
            description: String::new(),
            category: "medium".to_string(),
            cost: cost
                .iter()
                .map(|(code, amount)| (code.to_string(), *amount))
                .collect(),
            tangible,
        }
    }

    #[test]
    fn geometric_cascade_crosses_three_levels_in_one_call() {
        let config = geometric();
        let pass = pass(vec![
            emblem_tier(2, "SPARK", 1),
            emblem_tier(3, "SPARK", 1),
            emblem_tier(4, "SPARK", 2),
        ]);
        let mut ledger = ledger(&config);

        // Thresholds: level 2 at 50, level 3 at 101, level 4 at 154.
        let level_ups = award_experience(&mut ledger, 154, &pass, &config);

        assert_eq!(ledger.level, 4);
        let levels: Vec<u32> = level_ups.iter().map(|lu| lu.level).collect();
        assert_eq!(levels, vec![2, 3, 4]);
        assert_eq!(ledger.balances.get("SPARK"), 4);
    }

    #[test]
    fn linear_cascade_pays_tiers_in_order() {
        let config = linear(5);
        let pass = pass(vec![emblem_tier(1, "FIN", 1), emblem_tier(2, "HEART", 2)]);
        let mut ledger = ledger(&config);
        assert_eq!(ledger.level, 0);

        let level_ups = award_experience(&mut ledger, 12, &pass, &config);

        assert_eq!(ledger.level, 2);
        assert_eq!(level_ups.len(), 2);
        assert_eq!(level_ups[0].level, 1);
        assert_eq!(level_ups[1].level, 2);
        assert_eq!(ledger.balances.get("FIN"), 1);
        assert_eq!(ledger.balances.get("HEART"), 2);
    }

    #[test]
    fn levels_without_tiers_are_crossed_silently() {
        let config = linear(5);
        let pass = pass(vec![emblem_tier(3, "FIN", 1)]);
        let mut ledger = ledger(&config);

        let level_ups = award_experience(&mut ledger, 15, &pass, &config);

        assert_eq!(ledger.level, 3);
        assert_eq!(level_ups.len(), 1);
        assert_eq!(level_ups[0].level, 3);
    }

    #[test]
    fn tangible_tier_notifies_without_crediting() {
        let config = linear(5);
        let pass = pass(vec![tangible_tier(1, "Cinema night")]);
        let mut ledger = ledger(&config);

        let level_ups = award_experience(&mut ledger, 5, &pass, &config);

        assert_eq!(level_ups.len(), 1);
        assert!(level_ups[0].tier.tangible);
        assert!(ledger.balances.iter().all(|(_, amount)| amount == 0));
    }

    #[test]
    fn at_max_level_experience_accumulates_without_events() {
        let config = ProgressionConfig {
            curve: LevelCurve::Linear { rp_per_level: 5 },
            max_level: 2,
        };
        let pass = pass(vec![emblem_tier(1, "FIN", 1), emblem_tier(2, "FIN", 1)]);
        let mut ledger = ledger(&config);

        award_experience(&mut ledger, 10, &pass, &config);
        assert_eq!(ledger.level, 2);
        let balance_before = ledger.balances.clone();

        let level_ups = award_experience(&mut ledger, 100, &pass, &config);
        assert!(level_ups.is_empty());
        assert_eq!(ledger.level, 2);
        assert_eq!(ledger.experience, 110);
        assert_eq!(ledger.balances, balance_before);
    }

    #[test]
    fn award_never_decreases_anything() {
        let config = geometric();
        let pass = pass(Vec::new());
        let mut ledger = ledger(&config);
        for amount in [0, 3, -7, 120, 0] {
            let experience_before = ledger.experience;
            let level_before = ledger.level;
            award_experience(&mut ledger, amount, &pass, &config);
            assert!(ledger.experience >= experience_before);
            assert!(ledger.level >= level_before);
            assert!(ledger.level <= config.max_level);
        }
    }

    #[test]
    fn complete_task_credits_then_levels() {
        let config = linear(5);
        let pass = pass(vec![emblem_tier(1, "SPARK", 3)]);
        let mut ledger = ledger(&config);

        let completion = complete_task(&mut ledger, &task("t1", "FIN", 2, 5), &pass, &config);

        assert_eq!(completion.emblems.get("FIN"), Some(&2));
        assert_eq!(completion.experience, 5);
        assert_eq!(completion.level_ups.len(), 1);
        assert_eq!(ledger.balances.get("FIN"), 2);
        assert_eq!(ledger.balances.get("SPARK"), 3);
    }

    #[test]
    fn redeem_is_all_or_nothing() {
        let config = geometric();
        let mut ledger = ledger(&config);
        ledger.balances.credit("FIN", 1);
        ledger.balances.credit("HEART", 5);
        let wanted = reward("r1", &[("FIN", 2), ("HEART", 1)], false);

        let err = redeem_reward(&mut ledger, &wanted).unwrap_err();
        assert_eq!(
            err,
            EconomyError::InsufficientFunds {
                emblem: "FIN".to_string(),
                have: 1,
                need: 2,
            }
        );
        assert_eq!(ledger.balances.get("FIN"), 1);
        assert_eq!(ledger.balances.get("HEART"), 5);

        ledger.balances.credit("FIN", 1);
        let redemption = redeem_reward(&mut ledger, &wanted).unwrap();
        assert_eq!(redemption.reward_id, "r1");
        assert_eq!(ledger.balances.get("FIN"), 0);
        assert_eq!(ledger.balances.get("HEART"), 4);
    }

    #[test]
    fn redeem_touches_only_cost_currencies() {
        let config = geometric();
        let mut ledger = ledger(&config);
        ledger.balances.credit("FIN", 4);
        ledger.balances.credit("SPARK", 7);

        redeem_reward(&mut ledger, &reward("r1", &[("FIN", 3)], true)).unwrap();

        assert_eq!(ledger.balances.get("FIN"), 1);
        assert_eq!(ledger.balances.get("SPARK"), 7);
        assert_eq!(ledger.balances.get("HEART"), 0);
    }

    #[test]
    fn redemption_reports_tangibility() {
        let config = geometric();
        let mut ledger = ledger(&config);
        ledger.balances.credit("FIN", 10);

        let redemption = redeem_reward(&mut ledger, &reward("r1", &[("FIN", 1)], true)).unwrap();
        assert!(redemption.tangible);
        let redemption = redeem_reward(&mut ledger, &reward("r2", &[("FIN", 1)], false)).unwrap();
        assert!(!redemption.tangible);
    }

    #[test]
    fn summary_reflects_ledger_position() {
        let config = geometric();
        let pass = pass(Vec::new());
        let mut ledger = ledger(&config);
        award_experience(&mut ledger, 60, &pass, &config);

        let summary = progress_summary(&ledger, &config);
        assert_eq!(summary.level, 2);
        assert_eq!(summary.in_level, 10);
        assert_eq!(summary.needed_in_level, 51);
    }
}
