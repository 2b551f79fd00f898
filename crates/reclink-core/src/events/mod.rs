mod bus;
mod notification;

pub use {
    bus::{EventBus, SubscriptionId},
    notification::{Notification, NotificationKind},
};
