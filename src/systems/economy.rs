use bevy_ecs::prelude::*;

use crate::components::profile::{Ledger, TaskHistory, UserId};
use crate::core::world::{ActionIntent, ActionQueue};
use crate::rules::progression::ProgressionConfig;
use crate::simulation::catalog::Catalog;
use crate::simulation::economy::{
    complete_task, redeem_reward, EconomyError, LevelUp, Redemption, TaskCompletion,
};

/// Typed record of what the economy did this tick, for the presentation
/// layer to render. Cleared at the start of every tick.
#[derive(Resource, Debug, Default)]
pub struct EconomyEventLog(pub Vec<EconomyEvent>);

/// Tangible-fulfillment messages awaiting delivery by the notification sink.
/// Delivery failure is the sink's problem; the ledger mutation stands.
#[derive(Resource, Debug, Default)]
pub struct NotificationOutbox(pub Vec<Notification>);

#[derive(Debug, Clone, PartialEq)]
pub enum EconomyEvent {
    TaskCompleted {
        user_id: i64,
        completion: TaskCompletion,
    },
    RewardRedeemed {
        user_id: i64,
        redemption: Redemption,
    },
    Rejected {
        user_id: i64,
        error: EconomyError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    User(i64),
    Overseer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub audience: Audience,
    pub kind: NotificationKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NotificationKind {
    /// A tangible battle-pass tier was reached; someone has to hand it over.
    TangibleTier { user_id: i64, level: u32, name: String },
    /// A tangible shop reward was redeemed and must be fulfilled for real.
    TangibleRedemption {
        user_id: i64,
        reward_id: String,
        name: String,
    },
}

/// Resolve task/reward intents against the catalog and run the economy
/// operations on the addressed ledger. Unknown ids become `Rejected` events;
/// nothing is mutated for them.
pub fn economy_system(
    intents: Res<ActionQueue>,
    catalog: Res<Catalog>,
    config: Res<ProgressionConfig>,
    mut log: ResMut<EconomyEventLog>,
    mut outbox: ResMut<NotificationOutbox>,
    mut users: Query<(&UserId, &mut Ledger, &mut TaskHistory)>,
) {
    log.0.clear();
    outbox.0.clear();

    for intent in intents.0.iter() {
        match intent {
            ActionIntent::CompleteTask { user_id, task_id } => {
                let Some((_, mut ledger, mut history)) =
                    users.iter_mut().find(|(id, _, _)| id.0 == *user_id)
                else {
                    continue;
                };
                match catalog.task(task_id) {
                    Some(task) => {
                        let completion = complete_task(&mut ledger, task, &catalog.pass, &config);
                        history.record(&completion.task_id);
                        push_tier_notifications(&mut outbox, *user_id, &completion.level_ups);
                        log.0.push(EconomyEvent::TaskCompleted {
                            user_id: *user_id,
                            completion,
                        });
                    }
                    None => log.0.push(EconomyEvent::Rejected {
                        user_id: *user_id,
                        error: EconomyError::UnknownTask(task_id.clone()),
                    }),
                }
            }
            ActionIntent::RedeemReward { user_id, reward_id } => {
                let Some((_, mut ledger, _)) =
                    users.iter_mut().find(|(id, _, _)| id.0 == *user_id)
                else {
                    continue;
                };
                match catalog.reward(reward_id) {
                    Some(reward) => match redeem_reward(&mut ledger, reward) {
                        Ok(redemption) => {
                            if redemption.tangible {
                                push_fulfillment_notifications(&mut outbox, *user_id, &redemption);
                            }
                            log.0.push(EconomyEvent::RewardRedeemed {
                                user_id: *user_id,
                                redemption,
                            });
                        }
                        Err(error) => log.0.push(EconomyEvent::Rejected {
                            user_id: *user_id,
                            error,
                        }),
                    },
                    None => log.0.push(EconomyEvent::Rejected {
                        user_id: *user_id,
                        error: EconomyError::UnknownReward(reward_id.clone()),
                    }),
                }
            }
            _ => {}
        }
    }
}

fn push_tier_notifications(outbox: &mut NotificationOutbox, user_id: i64, level_ups: &[LevelUp]) {
    for level_up in level_ups {
        if !level_up.tier.tangible {
            continue;
        }
        let kind = NotificationKind::TangibleTier {
            user_id,
            level: level_up.level,
            name: level_up.tier.name.clone(),
        };
        outbox.0.push(Notification {
            audience: Audience::User(user_id),
            kind: kind.clone(),
        });
        outbox.0.push(Notification {
            audience: Audience::Overseer,
            kind,
        });
    }
}

fn push_fulfillment_notifications(
    outbox: &mut NotificationOutbox,
    user_id: i64,
    redemption: &Redemption,
) {
    let kind = NotificationKind::TangibleRedemption {
        user_id,
        reward_id: redemption.reward_id.clone(),
        name: redemption.name.clone(),
    };
    outbox.0.push(Notification {
        audience: Audience::User(user_id),
        kind: kind.clone(),
    });
    outbox.0.push(Notification {
        audience: Audience::Overseer,
        kind,
    });
}
