//! Inactivity alerts for administrators.

use crate::db::events::{fetch_unnotified_inactive, mark_notified};
use crate::db::log::oplog_best_effort;
use crate::db::users::list_admin_emails;
use crate::errors::AppResult;
use crate::models::PendingAlert;
use crate::transport::{BestEffort, Delivery, Notification, NotificationTransport};
use crate::utils::secs2readable;
use crate::utils::time::format_ts;
use rusqlite::Connection;
use serde::Serialize;

pub const DEFAULT_SUBJECT_PREFIX: &str = "[idletracker] ";

/// Outcome of one dispatch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub recipients: usize,
    pub pending: usize,
    pub sent: usize,
    pub send_failures: usize,
    pub marked: usize,
    pub mark_failures: usize,
}

pub struct Dispatcher<T> {
    transport: BestEffort<T>,
    subject_prefix: String,
}

impl<T: NotificationTransport> Dispatcher<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport: BestEffort::new(transport),
            subject_prefix: DEFAULT_SUBJECT_PREFIX.to_string(),
        }
    }

    pub fn with_subject_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.subject_prefix = prefix.into();
        self
    }

    pub fn transport(&self) -> &T {
        self.transport.inner()
    }

    /// Send one alert per unnotified inactivity event, then mark it notified.
    ///
    /// Without admin recipients nothing is sent and nothing is marked, so the
    /// events stay pending for a later run. A failed send still marks the
    /// event: delivery is best effort and is never retried.
    pub fn dispatch_pending_inactivity_alerts(&self, conn: &Connection) -> AppResult<DispatchReport> {
        let recipients = list_admin_emails(conn)?;
        let mut report = DispatchReport {
            recipients: recipients.len(),
            ..Default::default()
        };

        if recipients.is_empty() {
            tracing::info!("no admin recipients configured, inactivity alerts left pending");
            return Ok(report);
        }

        let pending = fetch_unnotified_inactive(conn)?;
        report.pending = pending.len();

        for alert in &pending {
            match self.transport.deliver(&self.compose(&recipients, alert)) {
                Delivery::Sent => report.sent += 1,
                Delivery::Failed => report.send_failures += 1,
            }

            match mark_notified(conn, alert.event_id) {
                Ok(true) => report.marked += 1,
                Ok(false) => {
                    tracing::debug!(event_id = alert.event_id, "event already notified");
                }
                Err(e) => {
                    report.mark_failures += 1;
                    tracing::warn!(error = %e, event_id = alert.event_id, "failed to mark event notified");
                }
            }
        }

        tracing::info!(
            recipients = report.recipients,
            pending = report.pending,
            sent = report.sent,
            send_failures = report.send_failures,
            marked = report.marked,
            mark_failures = report.mark_failures,
            "inactivity alerts dispatched"
        );

        oplog_best_effort(
            conn,
            "notify",
            "activity_events",
            &format!(
                "{} pending, {} sent, {} failed, {} marked",
                report.pending, report.sent, report.send_failures, report.marked
            ),
        );

        Ok(report)
    }

    fn compose(&self, recipients: &[String], alert: &PendingAlert) -> Notification {
        let subject = format!(
            "{}{} ({}) is inactive",
            self.subject_prefix, alert.name, alert.username
        );

        let mut body = format!(
            "User:       {} ({})\nDepartment: {}\nEmail:      {}\nInactive at: {} UTC\n",
            alert.name,
            alert.username,
            alert.department,
            alert.email,
            format_ts(alert.occurred_at)
        );
        if let Some(secs) = alert.active_duration_seconds {
            body.push_str(&format!("Active before: {}\n", secs2readable(secs)));
        }

        Notification {
            recipients: recipients.to_vec(),
            subject,
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::status::StatusTracker;
    use crate::core::test_support::{memory_db, seed_user};
    use crate::db::events::get_event;
    use crate::models::Role;
    use crate::transport::TransportError;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        sent: RefCell<Vec<Notification>>,
        fail: bool,
    }

    impl NotificationTransport for Recorder {
        fn send(&self, message: &Notification) -> Result<(), TransportError> {
            self.sent.borrow_mut().push(message.clone());
            if self.fail {
                Err(TransportError::Rejected("mailbox full".into()))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn one_message_per_event_and_never_twice() {
        let mut db = memory_db();
        seed_user(&db.conn, "root", Role::Admin);
        let a = seed_user(&db.conn, "alice", Role::User);
        let b = seed_user(&db.conn, "bob", Role::User);

        let ea = StatusTracker::set_status(&mut db.conn, a, "inactive", Some(600)).unwrap();
        let eb = StatusTracker::set_status(&mut db.conn, b, "inactive", None).unwrap();
        StatusTracker::set_status(&mut db.conn, b, "active", Some(30)).unwrap();

        let recorder = Recorder::default();
        let dispatcher = Dispatcher::new(&recorder).with_subject_prefix("[test] ");

        let report = dispatcher.dispatch_pending_inactivity_alerts(&db.conn).unwrap();
        assert_eq!(report.recipients, 1);
        assert_eq!(report.pending, 2);
        assert_eq!(report.sent, 2);
        assert_eq!(report.marked, 2);

        {
            let sent = recorder.sent.borrow();
            assert_eq!(sent.len(), 2);
            assert!(sent.iter().all(|m| m.recipients == vec!["root@example.com".to_string()]));
            assert!(sent.iter().any(|m| m.subject.starts_with("[test] ") && m.subject.contains("(alice)")));
        }

        assert!(get_event(&db.conn, ea.id).unwrap().unwrap().notified);
        assert!(get_event(&db.conn, eb.id).unwrap().unwrap().notified);

        let again = dispatcher.dispatch_pending_inactivity_alerts(&db.conn).unwrap();
        assert_eq!(again.pending, 0);
        assert_eq!(again.sent, 0);
        assert_eq!(recorder.sent.borrow().len(), 2);
    }

    #[test]
    fn no_recipients_leaves_events_pending() {
        let mut db = memory_db();
        let a = seed_user(&db.conn, "alice", Role::User);
        let ev = StatusTracker::set_status(&mut db.conn, a, "inactive", None).unwrap();

        let recorder = Recorder::default();
        let report = Dispatcher::new(&recorder)
            .dispatch_pending_inactivity_alerts(&db.conn)
            .unwrap();

        assert_eq!(report, DispatchReport::default());
        assert!(recorder.sent.borrow().is_empty());
        assert!(!get_event(&db.conn, ev.id).unwrap().unwrap().notified);
    }

    #[test]
    fn failed_mark_does_not_stop_the_batch() {
        let mut db = memory_db();
        seed_user(&db.conn, "root", Role::Admin);
        let a = seed_user(&db.conn, "alice", Role::User);
        let b = seed_user(&db.conn, "bob", Role::User);
        let ea = StatusTracker::set_status(&mut db.conn, a, "inactive", None).unwrap();
        let eb = StatusTracker::set_status(&mut db.conn, b, "inactive", None).unwrap();

        db.conn
            .execute_batch(&format!(
                "CREATE TRIGGER lock_event BEFORE UPDATE OF notified ON activity_events
                 WHEN OLD.id = {}
                 BEGIN SELECT RAISE(ABORT, 'event locked'); END;",
                ea.id
            ))
            .unwrap();

        let recorder = Recorder::default();
        let report = Dispatcher::new(&recorder)
            .dispatch_pending_inactivity_alerts(&db.conn)
            .unwrap();

        assert_eq!(report.pending, 2);
        assert_eq!(report.sent, 2);
        assert_eq!(report.marked, 1);
        assert_eq!(report.mark_failures, 1);
        assert!(!get_event(&db.conn, ea.id).unwrap().unwrap().notified);
        assert!(get_event(&db.conn, eb.id).unwrap().unwrap().notified);
    }

    #[test]
    fn failed_send_is_counted_and_still_marked() {
        let mut db = memory_db();
        seed_user(&db.conn, "root", Role::Admin);
        let a = seed_user(&db.conn, "alice", Role::User);
        let ev = StatusTracker::set_status(&mut db.conn, a, "inactive", None).unwrap();

        let recorder = Recorder {
            fail: true,
            ..Default::default()
        };
        let report = Dispatcher::new(&recorder)
            .dispatch_pending_inactivity_alerts(&db.conn)
            .unwrap();

        assert_eq!(report.sent, 0);
        assert_eq!(report.send_failures, 1);
        assert_eq!(report.marked, 1);
        assert!(get_event(&db.conn, ev.id).unwrap().unwrap().notified);
    }
}
