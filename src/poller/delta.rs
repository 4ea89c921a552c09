use crate::models::{unread_count, NotificationRecord};

/// Outcome of comparing one fetch with the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delta {
    pub is_new: bool,
    pub new_unread: usize,
}

/// Decides whether `records` contain newly-arrived unread notifications.
///
/// `previous_unread` is `None` until the first successful fetch of a session
/// has established a baseline. Without a baseline nothing counts as new, so a
/// session that opens with a backlog of unread items stays quiet.
///
/// An established baseline of zero is a real count, unlike a rule keyed on
/// `previous > 0`: the first arrival into an empty inbox is reported.
pub fn detect(previous_unread: Option<usize>, records: &[NotificationRecord]) -> Delta {
    let new_unread = unread_count(records);
    let is_new = match previous_unread {
        Some(previous) => new_unread > previous,
        None => false,
    };

    Delta { is_new, new_unread }
}
