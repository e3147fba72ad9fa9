use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Sales hierarchy role. The wire format still accepts the legacy
/// "Agent" spelling for sales agents from older imports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Manager,
    Supervisor,
    #[serde(rename = "Sales Agent", alias = "Agent")]
    SalesAgent,
}

impl Role {
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "Manager" => Some(Role::Manager),
            "Supervisor" => Some(Role::Supervisor),
            "Sales Agent" | "Agent" => Some(Role::SalesAgent),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Manager => "Manager",
            Role::Supervisor => "Supervisor",
            Role::SalesAgent => "Sales Agent",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// user_id of the supervising user; meaningful only for Sales Agent rows
    pub supervisor: Option<String>,
    pub active: bool,
    pub created_at: String,
    pub last_login: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserPayload {
    pub name: String,
    pub email: String,
    pub role: String,
    pub supervisor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserPayload {
    pub name: Option<String>,
    pub role: Option<String>,
    pub supervisor: Option<String>,
    pub active: Option<bool>,
}

/// True when `agent` reports to `supervisor_id`.
pub fn reports_to(agent: &User, supervisor_id: &str) -> bool {
    agent.role == Role::SalesAgent && agent.supervisor.as_deref() == Some(supervisor_id)
}

/// Identifiers whose owned rows (prospects, visits, messages) a viewer may
/// see. `None` means unrestricted (Manager).
pub fn visible_owner_ids(viewer: &User, users: &[User]) -> Option<HashSet<String>> {
    match viewer.role {
        Role::Manager => None,
        Role::Supervisor => {
            let mut ids: HashSet<String> = users
                .iter()
                .filter(|u| reports_to(u, &viewer.user_id))
                .map(|u| u.user_id.clone())
                .collect();
            ids.insert(viewer.user_id.clone());
            Some(ids)
        }
        Role::SalesAgent => Some(HashSet::from([viewer.user_id.clone()])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn role_parse_accepts_legacy_agent_spelling() {
        assert_eq!(Role::parse("Sales Agent"), Some(Role::SalesAgent));
        assert_eq!(Role::parse("Agent"), Some(Role::SalesAgent));
        assert_eq!(Role::parse("Manager"), Some(Role::Manager));
        assert_eq!(Role::parse("admin"), None);
    }

    #[test]
    fn role_round_trips_through_as_str() {
        for role in [Role::Manager, Role::Supervisor, Role::SalesAgent] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
    }

    #[test]
    fn supervisor_sees_self_and_own_agents_only() {
        let s1 = user("S1", Role::Supervisor, None);
        let users = vec![
            s1.clone(),
            user("A1", Role::SalesAgent, Some("S1")),
            user("A2", Role::SalesAgent, Some("S2")),
            user("M1", Role::Manager, None),
        ];
        let ids = visible_owner_ids(&s1, &users).expect("supervisor is scoped");
        assert!(ids.contains("S1"));
        assert!(ids.contains("A1"));
        assert!(!ids.contains("A2"));
        assert!(!ids.contains("M1"));
    }

    #[test]
    fn manager_is_unrestricted_and_agent_sees_only_self() {
        let m = user("M1", Role::Manager, None);
        let a = user("A1", Role::SalesAgent, Some("S1"));
        let users = vec![m.clone(), a.clone()];
        assert!(visible_owner_ids(&m, &users).is_none());
        let ids = visible_owner_ids(&a, &users).expect("agent is scoped");
        assert_eq!(ids, HashSet::from(["A1".to_string()]));
    }
}
