use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-side notification as returned by `GET /notifications`.
///
/// Records are created by the server (booking status changes, new messages)
/// and only ever change through the `is_read: false -> true` transition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub id: i64,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Number of unread records in `records`. Always derived, never cached.
pub fn unread_count(records: &[NotificationRecord]) -> usize {
    records.iter().filter(|record| !record.is_read).count()
}

/// First unread record in server order; its message is the alert body.
pub fn first_unread(records: &[NotificationRecord]) -> Option<&NotificationRecord> {
    records.iter().find(|record| !record.is_read)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(id: i64, is_read: bool) -> NotificationRecord {
        NotificationRecord {
            id,
            message: format!("notification {id}"),
            is_read,
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn unread_count_matches_unread_records() {
        assert_eq!(unread_count(&[]), 0);

        let records = vec![record(1, false), record(2, true), record(3, false), record(4, true)];
        assert_eq!(unread_count(&records), 2);

        let all_read: Vec<_> = (1..=5).map(|id| record(id, true)).collect();
        assert_eq!(unread_count(&all_read), 0);
    }

    #[test]
    fn first_unread_skips_read_records() {
        let records = vec![record(1, true), record(2, false), record(3, false)];
        assert_eq!(first_unread(&records).map(|r| r.id), Some(2));
        assert!(first_unread(&[record(1, true)]).is_none());
    }

    #[test]
    fn deserializes_camel_case_payload() {
        let json = r#"[
            {"id": 7, "message": "Booking confirmed", "isRead": false, "createdAt": "2025-03-01T09:00:00.000Z"},
            {"id": 8, "message": "New message from Ana", "isRead": true, "createdAt": "2025-03-01T10:30:00Z"}
        ]"#;

        let records: Vec<NotificationRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, 7);
        assert!(!records[0].is_read);
        assert_eq!(records[0].created_at, Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap());
        assert!(records[1].is_read);
    }
}
