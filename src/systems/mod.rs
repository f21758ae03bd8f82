pub mod browse;
pub mod economy;
pub mod season;

pub use browse::browse_system;
pub use economy::{
    economy_system, Audience, EconomyEvent, EconomyEventLog, Notification, NotificationKind,
    NotificationOutbox,
};
pub use season::season_system;
