use std::collections::BTreeMap;

use aws_sdk_dynamodb::Client as DynamoClient;
use homeward_atoms::users::model::{visible_owner_ids, User};
use homeward_atoms::visits::model::Visit;
use homeward_atoms::visits::service::load_visits;
use lambda_http::{http::StatusCode, Body, Error, Response};
use serde::Serialize;

use crate::assign::lead_visible;
use crate::leads::load_leads;
use crate::types::{Lead, STATUS_ASSIGNED};

/// Role-scoped aggregate figures, recomputed on every request.
#[derive(Debug, Serialize, PartialEq)]
pub struct DashboardSummary {
    pub total_leads: usize,
    pub leads_by_status: BTreeMap<String, usize>,
    pub assigned_count: usize,
    pub unassigned_count: usize,
    pub assigned_pct: f64,
    pub unassigned_pct: f64,
    pub total_visits: usize,
    pub visits_by_type: BTreeMap<String, usize>,
    /// Lead counts keyed by the holder's display name
    pub leads_per_holder: BTreeMap<String, usize>,
}

/// Split leads into the (assigned, unassigned) filter views by status.
pub fn partition_by_assignment(leads: &[Lead]) -> (Vec<&Lead>, Vec<&Lead>) {
    leads.iter().partition(|lead| lead.status == STATUS_ASSIGNED)
}

fn pct(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

/// Compute the viewer's dashboard over already-fetched collections.
pub fn summarize(viewer: &User, users: &[User], leads: &[Lead], visits: &[Visit]) -> DashboardSummary {
    let visible: Vec<&Lead> = leads
        .iter()
        .filter(|lead| lead_visible(viewer, users, lead))
        .collect();

    let mut leads_by_status: BTreeMap<String, usize> = BTreeMap::new();
    for lead in &visible {
        *leads_by_status.entry(lead.status.clone()).or_default() += 1;
    }

    let assigned_count = visible.iter().filter(|l| l.status == STATUS_ASSIGNED).count();
    let unassigned_count = visible.len() - assigned_count;

    let mut leads_per_holder: BTreeMap<String, usize> = BTreeMap::new();
    for lead in &visible {
        if let Some(holder) = lead.assigned_to.as_deref() {
            let display = users
                .iter()
                .find(|u| u.user_id == holder)
                .map(|u| u.name.clone())
                .unwrap_or_else(|| holder.to_string());
            *leads_per_holder.entry(display).or_default() += 1;
        }
    }

    let visit_scope = visible_owner_ids(viewer, users);
    let scoped_visits: Vec<&Visit> = match &visit_scope {
        None => visits.iter().collect(),
        Some(ids) => visits.iter().filter(|v| ids.contains(&v.user_id)).collect(),
    };

    let mut visits_by_type: BTreeMap<String, usize> = BTreeMap::new();
    for visit in &scoped_visits {
        *visits_by_type.entry(visit.visit_type.clone()).or_default() += 1;
    }

    DashboardSummary {
        total_leads: visible.len(),
        assigned_pct: pct(assigned_count, visible.len()),
        unassigned_pct: pct(unassigned_count, visible.len()),
        assigned_count,
        unassigned_count,
        leads_by_status,
        total_visits: scoped_visits.len(),
        visits_by_type,
        leads_per_holder,
    }
}

/// GET /dashboard - fetch leads and visits in parallel and aggregate for
/// the caller's role
pub async fn get_dashboard(
    client: &DynamoClient,
    table_name: &str,
    viewer: &User,
    users: &[User],
) -> Result<Response<Body>, Error> {
    let (leads_result, visits_result) = tokio::join!(
        load_leads(client, table_name),
        load_visits(client, table_name)
    );

    let leads =
        leads_result.map_err(|e| Box::new(std::io::Error::new(std::io::ErrorKind::Other, e)))?;
    let visits =
        visits_result.map_err(|e| Box::new(std::io::Error::new(std::io::ErrorKind::Other, e)))?;

    let summary = summarize(viewer, users, &leads, &visits);

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(serde_json::to_string(&summary)?.into())
        .map_err(Box::new)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{STATUS_CONTACTED, STATUS_NEW};
    use homeward_atoms::users::model::Role;

    fn user(id: &str, role: Role, supervisor: Option<&str>) -> User {
        User {
            user_id: id.to_string(),
            name: format!("{} name", id),
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

    fn visit(id: &str, user_id: &str, visit_type: &str) -> Visit {
        Visit {
            id: id.to_string(),
            lead_id: None,
            user_id: user_id.to_string(),
            visit_type: visit_type.to_string(),
            visit_date: "2026-01-07".to_string(),
            outcome: None,
            created_at: "2026-01-07T09:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn non_assigned_leads_land_in_the_unassigned_view_only() {
        let leads = vec![
            lead("L1", STATUS_NEW, None),
            lead("L2", STATUS_ASSIGNED, Some("A1")),
            lead("L3", STATUS_CONTACTED, None),
        ];
        let (assigned, unassigned) = partition_by_assignment(&leads);

        for l in &leads {
            if l.status != STATUS_ASSIGNED {
                assert!(unassigned.iter().any(|u| u.id == l.id));
                assert!(!assigned.iter().any(|a| a.id == l.id));
            }
        }
        assert_eq!(assigned.len(), 1);
    }

    #[test]
    fn empty_collections_yield_zero_percentages_not_nan() {
        let m1 = user("M1", Role::Manager, None);
        let summary = summarize(&m1, &[m1.clone()], &[], &[]);
        assert_eq!(summary.total_leads, 0);
        assert_eq!(summary.assigned_pct, 0.0);
        assert_eq!(summary.unassigned_pct, 0.0);
    }

    #[test]
    fn manager_summary_counts_everything() {
        let users = vec![
            user("M1", Role::Manager, None),
            user("S1", Role::Supervisor, None),
            user("A1", Role::SalesAgent, Some("S1")),
        ];
        let leads = vec![
            lead("L1", STATUS_NEW, None),
            lead("L2", STATUS_ASSIGNED, Some("A1")),
            lead("L3", STATUS_ASSIGNED, Some("S1")),
            lead("L4", STATUS_CONTACTED, None),
        ];
        let visits = vec![
            visit("V1", "A1", "site"),
            visit("V2", "A1", "office"),
            visit("V3", "S1", "site"),
        ];
        let summary = summarize(&users[0], &users, &leads, &visits);

        assert_eq!(summary.total_leads, 4);
        assert_eq!(summary.assigned_count, 2);
        assert_eq!(summary.assigned_pct, 50.0);
        assert_eq!(summary.leads_by_status.get(STATUS_NEW), Some(&1));
        assert_eq!(summary.visits_by_type.get("site"), Some(&2));
        assert_eq!(summary.leads_per_holder.get("A1 name"), Some(&1));
    }

    #[test]
    fn agent_summary_is_scoped_to_their_leads_and_visits() {
        let users = vec![
            user("S1", Role::Supervisor, None),
            user("A1", Role::SalesAgent, Some("S1")),
            user("A2", Role::SalesAgent, Some("S1")),
        ];
        let leads = vec![
            lead("L1", STATUS_ASSIGNED, Some("A1")),
            lead("L2", STATUS_ASSIGNED, Some("A2")),
            lead("L3", STATUS_NEW, None),
        ];
        let visits = vec![visit("V1", "A1", "site"), visit("V2", "A2", "site")];
        let summary = summarize(&users[1], &users, &leads, &visits);

        assert_eq!(summary.total_leads, 1);
        assert_eq!(summary.assigned_pct, 100.0);
        assert_eq!(summary.total_visits, 1);
    }
}
