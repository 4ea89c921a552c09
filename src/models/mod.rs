pub mod notification;

pub use notification::{first_unread, unread_count, NotificationRecord};
