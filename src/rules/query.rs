use serde::{Deserialize, Serialize};

use crate::components::profile::Balances;
use crate::data::rewards::Reward;
use crate::data::tasks::Task;
use crate::rules::affordability::{can_afford, cost_total};

/// Entries per list page. Out-of-range page requests clamp, never error.
pub const PAGE_SIZE: usize = 8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskSort {
    #[default]
    Id,
    Difficulty,
}

impl TaskSort {
    pub fn toggled(self) -> Self {
        match self {
            TaskSort::Id => TaskSort::Difficulty,
            TaskSort::Difficulty => TaskSort::Id,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardSort {
    #[default]
    Id,
    Cost,
}

impl RewardSort {
    pub fn toggled(self) -> Self {
        match self {
            RewardSort::Id => RewardSort::Cost,
            RewardSort::Cost => RewardSort::Id,
        }
    }
}

/// Stored task-list preferences. All filters compose conjunctively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFilters {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
    /// Keep only tasks whose payout includes this emblem code.
    #[serde(default)]
    pub emblem: Option<String>,
    #[serde(default)]
    pub sort: TaskSort,
    #[serde(default)]
    pub page: usize,
}

/// Stored shop preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardFilters {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub affordable_only: bool,
    #[serde(default)]
    pub sort: RewardSort,
    #[serde(default)]
    pub page: usize,
}

fn matches_query(query: &str, name: &str, description: &str) -> bool {
    let needle = query.to_lowercase();
    name.to_lowercase().contains(&needle) || description.to_lowercase().contains(&needle)
}

/// Apply filters and sort to the task catalog. Ties on difficulty fall back
/// to ascending id, so equal-difficulty tasks keep catalog order.
pub fn filter_tasks<'a>(tasks: &'a [Task], filters: &TaskFilters) -> Vec<&'a Task> {
    let mut out: Vec<&Task> = tasks
        .iter()
        .filter(|task| match &filters.category {
            Some(category) => task.category == *category,
            None => true,
        })
        .filter(|task| match &filters.query {
            Some(query) => matches_query(query, &task.name, &task.description),
            None => true,
        })
        .filter(|task| match &filters.emblem {
            Some(code) => task.emblems.contains_key(code),
            None => true,
        })
        .collect();
    match filters.sort {
        TaskSort::Id => out.sort_by(|a, b| a.id.cmp(&b.id)),
        TaskSort::Difficulty => {
            out.sort_by(|a, b| (a.difficulty, &a.id).cmp(&(b.difficulty, &b.id)))
        }
    }
    out
}

/// Apply filters and sort to the shop. Affordability delegates to the
/// caller's balances; cost sorting uses total magnitude across all emblems.
pub fn filter_rewards<'a>(
    rewards: &'a [Reward],
    filters: &RewardFilters,
    balances: &Balances,
) -> Vec<&'a Reward> {
    let mut out: Vec<&Reward> = rewards
        .iter()
        .filter(|reward| match &filters.category {
            Some(category) => reward.category == *category,
            None => true,
        })
        .filter(|reward| match &filters.query {
            Some(query) => matches_query(query, &reward.name, &reward.description),
            None => true,
        })
        .filter(|reward| !filters.affordable_only || can_afford(balances, &reward.cost))
        .collect();
    match filters.sort {
        RewardSort::Id => out.sort_by(|a, b| a.id.cmp(&b.id)),
        RewardSort::Cost => {
            out.sort_by(|a, b| (cost_total(&a.cost), &a.id).cmp(&(cost_total(&b.cost), &b.id)))
        }
    }
    out
}

/// One page of a filtered list.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub index: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub items: Vec<T>,
}

/// Slice a list into a fixed-size page, clamping the requested index into
/// range. An empty list yields a single empty page 0.
pub fn paginate<T: Clone>(items: &[T], page: usize) -> Page<T> {
    let total_items = items.len();
    let total_pages = ((total_items + PAGE_SIZE - 1) / PAGE_SIZE).max(1);
    let index = page.min(total_pages - 1);
    let start = index * PAGE_SIZE;
    let end = (start + PAGE_SIZE).min(total_items);
    Page {
        index,
        total_pages,
        total_items,
        items: items[start..end].to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::data::tasks::Difficulty;

    fn task(id: &str, category: &str, difficulty: Difficulty, emblem: &str) -> Task {
        Task {
            id: id.to_string(),
            name: format!("Walk {}", id),
            description: "around the block".to_string(),
            category: category.to_string(),
            difficulty,
            emblems: BTreeMap::from([(emblem.to_string(), 1)]),
            experience: 5,
        }
    }

    fn reward(id: &str, category: &str, fin_cost: i64) -> Reward {
        Reward {
            id: id.to_string(),
            name: format!("Treat {}", id),
            description: String::new(),
            category: category.to_string(),
            cost: BTreeMap::from([("FIN".to_string(), fin_cost)]),
            tangible: false,
        }
    }

    fn shop() -> Vec<Reward> {
        vec![
            reward("r1", "small", 1),
            reward("r2", "medium", 2),
            reward("r3", "medium", 9),
            reward("r4", "large", 20),
            reward("r5", "medium", 3),
        ]
    }

    #[test]
    fn category_and_affordability_compose() {
        let rewards = shop();
        let mut balances = Balances::default();
        balances.credit("FIN", 3);
        let filters = RewardFilters {
            category: Some("medium".to_string()),
            affordable_only: true,
            ..RewardFilters::default()
        };
        let hits = filter_rewards(&rewards, &filters, &balances);
        let ids: Vec<&str> = hits.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r2", "r5"]);
    }

    #[test]
    fn query_matches_name_and_description_case_insensitively() {
        let tasks = vec![
            task("t1", "dog", Difficulty::Easy, "PAW"),
            task("t2", "home", Difficulty::Easy, "FIN"),
        ];
        let filters = TaskFilters {
            query: Some("BLOCK".to_string()),
            ..TaskFilters::default()
        };
        assert_eq!(filter_tasks(&tasks, &filters).len(), 2);

        let filters = TaskFilters {
            query: Some("walk t1".to_string()),
            ..TaskFilters::default()
        };
        assert_eq!(filter_tasks(&tasks, &filters).len(), 1);
    }

    #[test]
    fn emblem_filter_keeps_matching_payouts() {
        let tasks = vec![
            task("t1", "dog", Difficulty::Easy, "PAW"),
            task("t2", "home", Difficulty::Easy, "FIN"),
        ];
        let filters = TaskFilters {
            emblem: Some("PAW".to_string()),
            ..TaskFilters::default()
        };
        let hits = filter_tasks(&tasks, &filters);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "t1");
    }

    #[test]
    fn difficulty_sort_breaks_ties_by_id() {
        let tasks = vec![
            task("t3", "home", Difficulty::Easy, "FIN"),
            task("t1", "home", Difficulty::Hard, "FIN"),
            task("t2", "home", Difficulty::Easy, "FIN"),
        ];
        let filters = TaskFilters {
            sort: TaskSort::Difficulty,
            ..TaskFilters::default()
        };
        let ids: Vec<&str> = filter_tasks(&tasks, &filters)
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(ids, vec!["t2", "t3", "t1"]);
    }

    #[test]
    fn cost_sort_uses_total_magnitude() {
        let mut rewards = shop();
        rewards[0].cost.insert("HEART".to_string(), 10); // r1: 1 FIN + 10 HEART = 11
        let filters = RewardFilters {
            sort: RewardSort::Cost,
            ..RewardFilters::default()
        };
        let ids: Vec<&str> = filter_rewards(&rewards, &filters, &Balances::default())
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, vec!["r2", "r5", "r3", "r1", "r4"]);
    }

    #[test]
    fn sort_toggles_flip_and_return() {
        assert_eq!(TaskSort::Id.toggled(), TaskSort::Difficulty);
        assert_eq!(TaskSort::Id.toggled().toggled(), TaskSort::Id);
        assert_eq!(RewardSort::Id.toggled(), RewardSort::Cost);
    }

    #[test]
    fn pagination_clamps_out_of_range_pages() {
        let items: Vec<u32> = (0..20).collect();
        let page = paginate(&items, 99);
        assert_eq!(page.index, 2);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items, vec![16, 17, 18, 19]);
    }

    #[test]
    fn empty_list_is_one_empty_page() {
        let items: Vec<u32> = Vec::new();
        let page = paginate(&items, 5);
        assert_eq!(page.index, 0);
        assert_eq!(page.total_pages, 1);
        assert!(page.items.is_empty());
    }
}
