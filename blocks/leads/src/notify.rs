use std::collections::HashSet;

use homeward_atoms::messages::model::Message;
use homeward_atoms::users::model::{Role, User};

use crate::types::{Lead, STATUS_ASSIGNED};

/// Clients poll on this interval; the feed itself is clock-free and is
/// driven by `observe` calls.
pub const POLL_INTERVAL_SECS: u64 = 30;

/// Pure diffing primitive: items whose id is not in `seen`, in input order.
pub fn new_items<'a, T, F>(seen: &HashSet<String>, current: &'a [T], id_of: F) -> Vec<&'a T>
where
    F: Fn(&T) -> &str,
{
    current
        .iter()
        .filter(|item| !seen.contains(id_of(item)))
        .collect()
}

/// "New vs seen" state for one polled collection (leads or messages).
///
/// The badge freezes while the notification panel is open, but the
/// last-seen snapshot still advances on every observation. An item that
/// arrives exactly while the panel is open is therefore consumed without
/// ever being counted - a known quirk of the observed product behavior,
/// kept under test rather than silently changed.
#[derive(Debug, Default)]
pub struct NotificationFeed {
    seen: HashSet<String>,
    badge: usize,
    panel_open: bool,
    primed: bool,
}

impl NotificationFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one polling cycle's fetch into the feed. Returns how many
    /// ids were new relative to the last snapshot. The first observation
    /// primes the snapshot without counting.
    pub fn observe<I>(&mut self, current_ids: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let current: HashSet<String> = current_ids.into_iter().collect();
        let fresh = if self.primed {
            current.difference(&self.seen).count()
        } else {
            self.primed = true;
            0
        };

        if !self.panel_open {
            self.badge += fresh;
        }
        self.seen = current;
        fresh
    }

    /// Opening the panel shows the pending items and clears the badge.
    pub fn open_panel(&mut self) {
        self.panel_open = true;
        self.badge = 0;
    }

    pub fn close_panel(&mut self) {
        self.panel_open = false;
    }

    pub fn badge(&self) -> usize {
        self.badge
    }

    pub fn panel_open(&self) -> bool {
        self.panel_open
    }
}

/// Leads a role is notified about, applied before diffing.
///
/// Agents: leads assigned to them. Supervisors: their own assigned leads,
/// plus leads held by any supervisor-role user. Managers get no lead
/// notifications at all.
pub fn lead_feed_scope<'a>(viewer: &User, users: &[User], leads: &'a [Lead]) -> Vec<&'a Lead> {
    match viewer.role {
        Role::Manager => vec![],
        Role::Supervisor => leads
            .iter()
            .filter(|lead| match lead.assigned_to.as_deref() {
                Some(holder) => {
                    (holder == viewer.user_id && lead.status == STATUS_ASSIGNED)
                        || users
                            .iter()
                            .any(|u| u.user_id == holder && u.role == Role::Supervisor)
                }
                None => false,
            })
            .collect(),
        Role::SalesAgent => leads
            .iter()
            .filter(|lead| lead.assigned_to.as_deref() == Some(viewer.user_id.as_str()))
            .collect(),
    }
}

/// Messages a role is notified about: those addressed to the viewer.
pub fn message_feed_scope<'a>(viewer: &User, messages: &'a [Message]) -> Vec<&'a Message> {
    messages
        .iter()
        .filter(|m| m.recipient_id == viewer.user_id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::STATUS_NEW;

    fn user(id: &str, role: Role, supervisor: Option<&str>) -> User {
        User {
            user_id: id.to_string(),
            name: id.to_string(),
            email: format!("{}@homeward.estate", id),
            role,
            supervisor: supervisor.map(|s| s.to_string()),
            active: true,
            created_at: "2026-01-05T09:00:00+00:00".to_string(),
            last_login: None,
        }
    }

    fn lead(id: &str, status: &str, assigned_to: Option<&str>) -> Lead {
        Lead {
            id: id.to_string(),
            name: format!("lead {}", id),
            phone: "555-0100".to_string(),
            interest: "3BR".to_string(),
            status: status.to_string(),
            assigned_to: assigned_to.map(|s| s.to_string()),
            prospect_id: None,
            date_added: "2026-01-06T10:00:00+00:00".to_string(),
        }
    }

    fn ids(items: &[&Lead]) -> Vec<String> {
        items.iter().map(|l| l.id.clone()).collect()
    }

    #[test]
    fn new_items_is_a_set_difference_in_input_order() {
        let seen = HashSet::from(["L1".to_string(), "L3".to_string()]);
        let leads = vec![
            lead("L1", STATUS_NEW, None),
            lead("L2", STATUS_NEW, None),
            lead("L3", STATUS_NEW, None),
            lead("L4", STATUS_NEW, None),
        ];
        let fresh = new_items(&seen, &leads, |l| &l.id);
        assert_eq!(
            fresh.iter().map(|l| l.id.as_str()).collect::<Vec<_>>(),
            vec!["L2", "L4"]
        );
    }

    #[test]
    fn one_new_lead_in_cycle_two_bumps_badge_by_exactly_one() {
        let mut feed = NotificationFeed::new();

        // cycle 1: baseline
        feed.observe(vec!["L1".to_string(), "L2".to_string()]);
        assert_eq!(feed.badge(), 0);

        // cycle 2: one new lead arrives
        feed.observe(vec!["L1".to_string(), "L2".to_string(), "L3".to_string()]);
        assert_eq!(feed.badge(), 1);

        // cycle 3: nothing new - no cumulative re-count
        feed.observe(vec!["L1".to_string(), "L2".to_string(), "L3".to_string()]);
        assert_eq!(feed.badge(), 1);
    }

    #[test]
    fn refetch_without_mutation_is_idempotent() {
        let mut feed = NotificationFeed::new();
        feed.observe(vec!["L1".to_string()]);
        feed.observe(vec!["L1".to_string()]);
        feed.observe(vec!["L1".to_string()]);
        assert_eq!(feed.badge(), 0);
    }

    #[test]
    fn panel_open_freezes_badge_but_snapshot_advances() {
        let mut feed = NotificationFeed::new();
        feed.observe(vec!["L1".to_string()]);

        feed.open_panel();
        assert_eq!(feed.badge(), 0);

        // arrives while the panel is open: counted nowhere, but seen
        feed.observe(vec!["L1".to_string(), "L2".to_string()]);
        assert_eq!(feed.badge(), 0);

        feed.close_panel();
        feed.observe(vec!["L1".to_string(), "L2".to_string()]);
        assert_eq!(feed.badge(), 0, "L2 was swallowed by the open-panel window");
    }

    #[test]
    fn opening_the_panel_clears_a_pending_badge() {
        let mut feed = NotificationFeed::new();
        feed.observe(vec!["L1".to_string()]);
        feed.observe(vec!["L1".to_string(), "L2".to_string()]);
        assert_eq!(feed.badge(), 1);
        feed.open_panel();
        assert_eq!(feed.badge(), 0);
    }

    #[test]
    fn manager_gets_no_lead_notifications() {
        let users = vec![user("M1", Role::Manager, None)];
        let leads = vec![lead("L1", STATUS_NEW, None)];
        assert!(lead_feed_scope(&users[0], &users, &leads).is_empty());
    }

    #[test]
    fn supervisor_feed_covers_own_assigned_and_supervisor_held_leads() {
        let users = vec![
            user("S1", Role::Supervisor, None),
            user("S2", Role::Supervisor, None),
            user("A1", Role::SalesAgent, Some("S1")),
        ];
        let leads = vec![
            lead("L1", STATUS_ASSIGNED, Some("S1")),
            lead("L2", STATUS_ASSIGNED, Some("S2")),
            lead("L3", STATUS_ASSIGNED, Some("A1")),
            lead("L4", STATUS_NEW, None),
        ];
        let scoped = lead_feed_scope(&users[0], &users, &leads);
        assert_eq!(ids(&scoped), vec!["L1", "L2"]);
    }

    #[test]
    fn agent_feed_is_their_leads_only() {
        let users = vec![
            user("S1", Role::Supervisor, None),
            user("A1", Role::SalesAgent, Some("S1")),
        ];
        let leads = vec![
            lead("L1", STATUS_ASSIGNED, Some("A1")),
            lead("L2", STATUS_ASSIGNED, Some("S1")),
            lead("L3", STATUS_NEW, None),
        ];
        let scoped = lead_feed_scope(&users[1], &users, &leads);
        assert_eq!(ids(&scoped), vec!["L1"]);
    }

    #[test]
    fn message_feed_filters_on_recipient() {
        let a1 = user("A1", Role::SalesAgent, Some("S1"));
        let messages = vec![
            Message {
                message_id: "M1".to_string(),
                sender_id: "S1".to_string(),
                recipient_id: "A1".to_string(),
                subject: None,
                body: "call the Park Ave lead".to_string(),
                sent_at: "2026-01-06T10:00:00+00:00".to_string(),
            },
            Message {
                message_id: "M2".to_string(),
                sender_id: "A1".to_string(),
                recipient_id: "S1".to_string(),
                subject: None,
                body: "done".to_string(),
                sent_at: "2026-01-06T10:05:00+00:00".to_string(),
            },
        ];
        let scoped = message_feed_scope(&a1, &messages);
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].message_id, "M1");
    }
}
