use std::collections::BTreeMap;
use std::env;
use std::io::{self, Write};
use std::path::PathBuf;

use habit_quest::components::profile::Balances;
use habit_quest::core::serialization::SaveState;
use habit_quest::data::{
    load_battle_pass_catalog, load_reward_catalog, load_task_catalog,
};
use habit_quest::rules::progression::ProgressionConfig;
use habit_quest::rules::query::Page;
use habit_quest::simulation::catalog::Catalog;
use habit_quest::store::{LedgerDb, LedgerDbState, LedgerRepository};
use habit_quest::systems::economy::{Audience, EconomyEvent, NotificationKind};
use habit_quest::{ActionIntent, Engine, Snapshot};

const COMMANDS: &str = "Commands: user <id> | tasks | task <id> | done <id> | shop | reward <id> | buy <id> | bp | emblems | cat <tasks|shop> <name|all> | emblem <code|all> | sort <tasks|shop> | afford | page <tasks|shop> <n> | search <tasks|shop> <text> | reset <tasks|shop> | day | save <path> | load <path> | quit";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    println!("Initializing Habit Quest (Engine Debug)...");
    let (data_dir, db_path) = parse_paths(env::args().collect());

    let config = ProgressionConfig::default();
    let catalog = match load_catalog(&data_dir, config.max_level) {
        Ok(catalog) => catalog,
        Err(err) => {
            tracing::error!("failed to load catalog from {}: {}", data_dir.display(), err);
            std::process::exit(1);
        }
    };
    tracing::info!(
        "catalog loaded: {} tasks, {} rewards, {} tiers, emblems {:?}",
        catalog.tasks.len(),
        catalog.rewards.len(),
        catalog.pass.tiers.len(),
        catalog.currency_codes()
    );

    let mut engine = Engine::new(catalog, config);

    let mut store: Box<dyn LedgerRepository> = match LedgerDb::open(&db_path) {
        Ok(db) => Box::new(db),
        Err(err) => {
            tracing::error!("failed to open ledger db {}: {}", db_path.display(), err);
            std::process::exit(1);
        }
    };
    match store.load_or_init() {
        Ok(state) => engine.load_state(SaveState {
            version: 1,
            season: state.season,
            users: state.users,
        }),
        Err(err) => tracing::warn!("starting empty, could not load ledgers: {}", err),
    }

    let mut current_user: i64 = 1;
    println!("{}", engine.season().label());
    println!("{}", COMMANDS);

    loop {
        print!("> ");
        io::stdout().flush().unwrap();

        let mut input = String::new();
        if io::stdin().read_line(&mut input).is_err() {
            break;
        }
        let trimmed = input.trim();
        if trimmed.is_empty() {
            continue;
        }

        let mut parts = trimmed.split_whitespace();
        let cmd = parts.next().unwrap_or("").to_lowercase();

        match cmd.as_str() {
            "quit" | "exit" => break,
            "help" => println!("{}", COMMANDS),
            "user" => match parts.next().and_then(|raw| raw.parse::<i64>().ok()) {
                Some(id) => {
                    current_user = id;
                    engine.get_or_create(id);
                    println!("Acting as user {}", id);
                }
                None => println!("Usage: user <id>"),
            },
            "tasks" => print_task_page(&engine.browse_tasks(current_user)),
            "task" => match parts.next() {
                Some(id) => print_task_detail(&engine, id),
                None => println!("Usage: task <id>"),
            },
            "done" => match parts.next() {
                Some(id) => {
                    let snapshot = tick_and_persist(
                        &mut engine,
                        store.as_mut(),
                        vec![ActionIntent::CompleteTask {
                            user_id: current_user,
                            task_id: id.to_string(),
                        }],
                    );
                    print_events(&snapshot);
                }
                None => println!("Usage: done <task_id>"),
            },
            "shop" => print_reward_page(&engine.browse_rewards(current_user)),
            "reward" => match parts.next() {
                Some(id) => print_reward_detail(&mut engine, current_user, id),
                None => println!("Usage: reward <id>"),
            },
            "buy" => match parts.next() {
                Some(id) => {
                    let snapshot = tick_and_persist(
                        &mut engine,
                        store.as_mut(),
                        vec![ActionIntent::RedeemReward {
                            user_id: current_user,
                            reward_id: id.to_string(),
                        }],
                    );
                    print_events(&snapshot);
                }
                None => println!("Usage: buy <reward_id>"),
            },
            "bp" => print_battle_pass(&mut engine, current_user, &config),
            "emblems" => print_balances(&engine.balances(current_user)),
            "cat" => match (parts.next(), parts.next()) {
                (Some("tasks"), Some(name)) => {
                    let category = (name != "all").then(|| name.to_string());
                    tick_and_persist(
                        &mut engine,
                        store.as_mut(),
                        vec![ActionIntent::SetTaskCategory {
                            user_id: current_user,
                            category,
                        }],
                    );
                    print_task_page(&engine.browse_tasks(current_user));
                }
                (Some("shop"), Some(name)) => {
                    let category = (name != "all").then(|| name.to_string());
                    tick_and_persist(
                        &mut engine,
                        store.as_mut(),
                        vec![ActionIntent::SetRewardCategory {
                            user_id: current_user,
                            category,
                        }],
                    );
                    print_reward_page(&engine.browse_rewards(current_user));
                }
                _ => println!("Usage: cat <tasks|shop> <name|all>"),
            },
            "emblem" => match parts.next() {
                Some(code) => {
                    let emblem = (code != "all").then(|| code.to_string());
                    tick_and_persist(
                        &mut engine,
                        store.as_mut(),
                        vec![ActionIntent::SetTaskEmblem {
                            user_id: current_user,
                            emblem,
                        }],
                    );
                    print_task_page(&engine.browse_tasks(current_user));
                }
                None => println!("Usage: emblem <code|all>"),
            },
            "sort" => match parts.next() {
                Some("tasks") => {
                    tick_and_persist(
                        &mut engine,
                        store.as_mut(),
                        vec![ActionIntent::ToggleTaskSort {
                            user_id: current_user,
                        }],
                    );
                    print_task_page(&engine.browse_tasks(current_user));
                }
                Some("shop") => {
                    tick_and_persist(
                        &mut engine,
                        store.as_mut(),
                        vec![ActionIntent::ToggleRewardSort {
                            user_id: current_user,
                        }],
                    );
                    print_reward_page(&engine.browse_rewards(current_user));
                }
                _ => println!("Usage: sort <tasks|shop>"),
            },
            "afford" => {
                tick_and_persist(
                    &mut engine,
                    store.as_mut(),
                    vec![ActionIntent::ToggleAffordableOnly {
                        user_id: current_user,
                    }],
                );
                print_reward_page(&engine.browse_rewards(current_user));
            }
            "page" => match (parts.next(), parts.next().and_then(|raw| raw.parse().ok())) {
                (Some("tasks"), Some(page)) => {
                    tick_and_persist(
                        &mut engine,
                        store.as_mut(),
                        vec![ActionIntent::SetTaskPage {
                            user_id: current_user,
                            page,
                        }],
                    );
                    print_task_page(&engine.browse_tasks(current_user));
                }
                (Some("shop"), Some(page)) => {
                    tick_and_persist(
                        &mut engine,
                        store.as_mut(),
                        vec![ActionIntent::SetRewardPage {
                            user_id: current_user,
                            page,
                        }],
                    );
                    print_reward_page(&engine.browse_rewards(current_user));
                }
                _ => println!("Usage: page <tasks|shop> <n>"),
            },
            "search" => {
                let target = parts.next();
                let query: Vec<&str> = parts.collect();
                let begin = match target {
                    Some("tasks") => ActionIntent::BeginTaskSearch {
                        user_id: current_user,
                    },
                    Some("shop") => ActionIntent::BeginRewardSearch {
                        user_id: current_user,
                    },
                    _ => {
                        println!("Usage: search <tasks|shop> <text>");
                        continue;
                    }
                };
                tick_and_persist(
                    &mut engine,
                    store.as_mut(),
                    vec![
                        begin,
                        ActionIntent::SubmitSearch {
                            user_id: current_user,
                            query: query.join(" "),
                        },
                    ],
                );
                match target {
                    Some("tasks") => print_task_page(&engine.browse_tasks(current_user)),
                    _ => print_reward_page(&engine.browse_rewards(current_user)),
                }
            }
            "reset" => match parts.next() {
                Some("tasks") => {
                    tick_and_persist(
                        &mut engine,
                        store.as_mut(),
                        vec![ActionIntent::ResetTaskFilters {
                            user_id: current_user,
                        }],
                    );
                    println!("Task filters reset.");
                }
                Some("shop") => {
                    tick_and_persist(
                        &mut engine,
                        store.as_mut(),
                        vec![ActionIntent::ResetRewardFilters {
                            user_id: current_user,
                        }],
                    );
                    println!("Shop filters reset.");
                }
                _ => println!("Usage: reset <tasks|shop>"),
            },
            "day" => {
                tick_and_persist(&mut engine, store.as_mut(), vec![ActionIntent::AdvanceDay]);
                println!("{}", engine.season().label());
            }
            "save" => match parts.next() {
                Some(path) => match engine.save_to_path(path) {
                    Ok(()) => println!("Saved to {}", path),
                    Err(err) => println!("Save failed: {}", err),
                },
                None => println!("Usage: save <path>"),
            },
            "load" => match parts.next() {
                Some(path) => match engine.load_from_path(path) {
                    Ok(()) => println!("Loaded from {}", path),
                    Err(err) => println!("Load failed: {}", err),
                },
                None => println!("Usage: load <path>"),
            },
            other => println!("Unknown command {}. Try help.", other),
        }
    }
}

/// Run one tick and push the whole state to the ledger store. A store
/// failure is logged and ignored; the in-memory state stays authoritative.
fn tick_and_persist(
    engine: &mut Engine,
    store: &mut dyn LedgerRepository,
    intents: Vec<ActionIntent>,
) -> Snapshot {
    let snapshot = engine.tick(intents);
    let state = engine.save_state();
    if let Err(err) = store.save_state(&LedgerDbState {
        season: state.season,
        users: state.users,
    }) {
        tracing::warn!("persist failed, continuing in memory: {}", err);
    }
    snapshot
}

fn parse_paths(args: Vec<String>) -> (PathBuf, PathBuf) {
    let mut data_dir = PathBuf::from("./assets/data");
    let mut db_path = PathBuf::from("./ledgers.db");
    let mut iter = args.into_iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--data" => {
                if let Some(path) = iter.next() {
                    data_dir = PathBuf::from(path);
                }
            }
            "--db" => {
                if let Some(path) = iter.next() {
                    db_path = PathBuf::from(path);
                }
            }
            other => tracing::warn!("ignoring unknown argument {}", other),
        }
    }
    (data_dir, db_path)
}

fn load_catalog(
    data_dir: &PathBuf,
    max_level: u32,
) -> Result<Catalog, Box<dyn std::error::Error>> {
    let tasks = load_task_catalog(data_dir.join("tasks.json"))?;
    let rewards = load_reward_catalog(data_dir.join("rewards.json"))?;
    let pass = load_battle_pass_catalog(data_dir.join("battle_pass.json"))?;
    Ok(Catalog::assemble(
        tasks.tasks,
        rewards.rewards,
        pass,
        max_level,
    )?)
}

fn format_emblems(emblems: &BTreeMap<String, i64>) -> String {
    if emblems.is_empty() {
        return "-".to_string();
    }
    emblems
        .iter()
        .map(|(code, amount)| format!("{} x {}", code, amount))
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_task_page(page: &Page<habit_quest::data::Task>) {
    println!(
        "Tasks (page {}/{}, {} total):",
        page.index + 1,
        page.total_pages,
        page.total_items
    );
    for task in &page.items {
        println!(
            "  {:>4} [{}] {} — {} | +{} XP",
            task.id,
            task.difficulty.as_str(),
            task.name,
            format_emblems(&task.emblems),
            task.experience
        );
    }
}

fn print_reward_page(page: &Page<habit_quest::data::Reward>) {
    println!(
        "Shop (page {}/{}, {} total):",
        page.index + 1,
        page.total_pages,
        page.total_items
    );
    for reward in &page.items {
        let marker = if reward.tangible { "*" } else { " " };
        println!(
            "  {:>4}{} {} — {}",
            reward.id,
            marker,
            reward.name,
            format_emblems(&reward.cost)
        );
    }
}

fn print_task_detail(engine: &Engine, task_id: &str) {
    match engine.catalog().task(task_id) {
        Some(task) => {
            println!("{} [{} / {}]", task.name, task.category, task.difficulty.as_str());
            if !task.description.is_empty() {
                println!("  {}", task.description);
            }
            println!("  Pays: {} | +{} XP", format_emblems(&task.emblems), task.experience);
        }
        None => println!("Task not found."),
    }
}

fn print_reward_detail(engine: &mut Engine, user_id: i64, reward_id: &str) {
    let balances = engine.balances(user_id);
    match engine.catalog().reward(reward_id) {
        Some(reward) => {
            println!("{} [{}]", reward.name, reward.category);
            if !reward.description.is_empty() {
                println!("  {}", reward.description);
            }
            for (code, need) in &reward.cost {
                let have = balances.get(code);
                let mark = if have >= *need { "ok" } else { "--" };
                println!("  [{}] {} {}/{}", mark, code, have, need);
            }
            if reward.tangible {
                println!("  Fulfilled in the real world after redemption.");
            }
        }
        None => println!("Reward not found."),
    }
}

fn print_balances(balances: &Balances) {
    println!("Emblems:");
    for (code, amount) in balances.iter() {
        println!("  {} -> {}", code, amount);
    }
}

fn print_battle_pass(engine: &mut Engine, user_id: i64, config: &ProgressionConfig) {
    engine.get_or_create(user_id);
    let summary = engine.progress(user_id);
    println!("{}", engine.season().label());
    if summary.at_max {
        println!("Level {} (max).", summary.level);
    } else {
        println!(
            "Level {} — {}/{} XP, {} to go",
            summary.level, summary.in_level, summary.needed_in_level, summary.remaining
        );
        println!("[{}]", summary.bar());
    }

    let state = engine.save_state();
    let experience = state
        .users
        .iter()
        .find(|user| user.user_id == user_id)
        .map(|user| user.experience)
        .unwrap_or(0);

    println!("Tiers:");
    for tier in &engine.catalog().pass.tiers {
        let status = if tier.level <= summary.level {
            "done"
        } else if tier.level == summary.level + 1 {
            "next"
        } else {
            "    "
        };
        let mut line = format!("  [{}] {:>2} {}", status, tier.level, tier.name);
        if tier.level > summary.level {
            let needed = config.curve.threshold_for_level(tier.level) - experience;
            line.push_str(&format!(" — {} XP away", needed.max(0)));
        }
        if tier.tangible {
            line.push_str(" (tangible)");
        } else if !tier.emblems.is_empty() {
            line.push_str(&format!(" — {}", format_emblems(&tier.emblems)));
        }
        println!("{}", line);
    }
}

fn print_events(snapshot: &Snapshot) {
    for event in &snapshot.events {
        match event {
            EconomyEvent::TaskCompleted {
                user_id,
                completion,
            } => {
                println!(
                    "User {} completed {}: {} | +{} XP",
                    user_id,
                    completion.task_id,
                    format_emblems(&completion.emblems),
                    completion.experience
                );
                for level_up in &completion.level_ups {
                    let payout = if level_up.tier.tangible {
                        "tangible, see notifications".to_string()
                    } else {
                        format_emblems(&level_up.tier.emblems)
                    };
                    println!(
                        "  Level {} reached: {} ({})",
                        level_up.level, level_up.tier.name, payout
                    );
                }
            }
            EconomyEvent::RewardRedeemed { user_id, redemption } => {
                println!(
                    "User {} redeemed {} for {}",
                    user_id,
                    redemption.name,
                    format_emblems(&redemption.debited)
                );
            }
            EconomyEvent::Rejected { user_id, error } => {
                println!("User {}: {}", user_id, error);
            }
        }
    }
    for notification in &snapshot.notifications {
        let audience = match notification.audience {
            Audience::User(id) => format!("user {}", id),
            Audience::Overseer => "overseer".to_string(),
        };
        match &notification.kind {
            NotificationKind::TangibleTier { level, name, .. } => {
                println!("  notify {}: tier {} ({}) needs real-world delivery", audience, level, name);
            }
            NotificationKind::TangibleRedemption { name, .. } => {
                println!("  notify {}: fulfill {}", audience, name);
            }
        }
    }
}
