use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoClient;
use homeward_atoms::users::model::{reports_to, Role, User};
use homeward_atoms::users::service::load_users;
use lambda_http::{http::StatusCode, Body, Error, Response};

use crate::leads::load_leads;
use crate::types::{
    AssignLeadsPayload, AssignOutcome, AssignmentReport, Lead, LeadAssignment, STATUS_ASSIGNED,
};

/// Whether a lead is inside the viewer's scope.
///
/// Managers see everything. Supervisors see unassigned leads, their own
/// leads, and leads held by their agents. Sales agents see only leads
/// assigned to them.
pub fn lead_visible(viewer: &User, users: &[User], lead: &Lead) -> bool {
    match viewer.role {
        Role::Manager => true,
        Role::Supervisor => match lead.assigned_to.as_deref() {
            None => true,
            Some(holder) => {
                holder == viewer.user_id
                    || users
                        .iter()
                        .any(|u| u.user_id == holder && reports_to(u, &viewer.user_id))
            }
        },
        Role::SalesAgent => lead.assigned_to.as_deref() == Some(viewer.user_id.as_str()),
    }
}

/// Users offered in the viewer's assignment-target picker.
pub fn eligible_targets<'a>(viewer: &User, users: &'a [User]) -> Vec<&'a User> {
    match viewer.role {
        Role::Manager => users
            .iter()
            .filter(|u| u.active && matches!(u.role, Role::Supervisor | Role::SalesAgent))
            .collect(),
        Role::Supervisor => users
            .iter()
            .filter(|u| u.active && reports_to(u, &viewer.user_id))
            .collect(),
        Role::SalesAgent => vec![],
    }
}

/// Server-side check that `caller` may hand leads to `target`.
pub fn validate_target(caller: &User, target: &User) -> Result<(), String> {
    if !target.active {
        return Err("Assignment target is inactive".to_string());
    }
    match caller.role {
        Role::Manager => {
            if matches!(target.role, Role::Supervisor | Role::SalesAgent) {
                Ok(())
            } else {
                Err("Leads can only be assigned to supervisors or sales agents".to_string())
            }
        }
        Role::Supervisor => {
            if target.user_id == caller.user_id || reports_to(target, &caller.user_id) {
                Ok(())
            } else {
                Err("Assignment target is not on your team".to_string())
            }
        }
        Role::SalesAgent => Err("Sales agents cannot assign leads".to_string()),
    }
}

/// Decide the per-item outcome for every requested lead before touching
/// the store: requested ids that don't exist are not_found, ids outside
/// the caller's scope are forbidden, the rest will be updated.
pub fn plan_batch(
    caller: &User,
    users: &[User],
    leads: &[Lead],
    lead_ids: &[String],
) -> Vec<LeadAssignment> {
    let by_id: HashMap<&str, &Lead> = leads.iter().map(|l| (l.id.as_str(), l)).collect();

    lead_ids
        .iter()
        .map(|lead_id| {
            let outcome = match by_id.get(lead_id.as_str()) {
                None => AssignOutcome::NotFound,
                Some(lead) if !lead_visible(caller, users, lead) => AssignOutcome::Forbidden,
                Some(_) => AssignOutcome::Assigned,
            };
            LeadAssignment {
                lead_id: lead_id.clone(),
                outcome,
            }
        })
        .collect()
}

async fn apply_assignment(
    client: &DynamoClient,
    table_name: &str,
    lead_id: &str,
    target_id: &str,
) -> Result<(), String> {
    client
        .update_item()
        .table_name(table_name)
        .key("PK", AttributeValue::S("LEAD".to_string()))
        .key("SK", AttributeValue::S(format!("LEAD#{}", lead_id)))
        .update_expression("SET lead_status = :lead_status, assigned_to = :assigned_to")
        .expression_attribute_values(
            ":lead_status",
            AttributeValue::S(STATUS_ASSIGNED.to_string()),
        )
        .expression_attribute_values(":assigned_to", AttributeValue::S(target_id.to_string()))
        .send()
        .await
        .map_err(|e| format!("DynamoDB update_item error: {}", e))?;
    Ok(())
}

/// POST /leads/assign - move a batch of leads to
/// {status: "assigned", assigned_to: target} in one request, returning a
/// per-item result list so partial failure is visible to the operator.
pub async fn assign_leads(
    client: &DynamoClient,
    table_name: &str,
    caller_id: &str,
    body: &[u8],
) -> Result<Response<Body>, Error> {
    let payload: AssignLeadsPayload = serde_json::from_slice(body)?;

    if payload.lead_ids.is_empty() {
        return Ok(error_response(
            StatusCode::BAD_REQUEST,
            "No leads selected",
        )?);
    }

    let users = load_users(client, table_name).await?;

    let Some(caller) = users.iter().find(|u| u.user_id == caller_id) else {
        return Ok(error_response(
            StatusCode::FORBIDDEN,
            "Caller has no directory entry",
        )?);
    };

    if caller.role == Role::SalesAgent {
        return Ok(error_response(
            StatusCode::FORBIDDEN,
            "Sales agents cannot assign leads",
        )?);
    }

    let Some(target) = users.iter().find(|u| u.user_id == payload.assigned_to) else {
        return Ok(error_response(
            StatusCode::BAD_REQUEST,
            "Assignment target not found",
        )?);
    };

    if let Err(reason) = validate_target(caller, target) {
        let status = if caller.role == Role::Supervisor && target.user_id != caller.user_id {
            StatusCode::FORBIDDEN
        } else {
            StatusCode::BAD_REQUEST
        };
        return Ok(error_response(status, &reason)?);
    }

    let leads = load_leads(client, table_name).await?;
    let mut results = plan_batch(caller, &users, &leads, &payload.lead_ids);

    for item in &mut results {
        if item.outcome != AssignOutcome::Assigned {
            continue;
        }
        if let Err(e) = apply_assignment(client, table_name, &item.lead_id, &target.user_id).await
        {
            tracing::error!("Failed to assign lead {}: {}", item.lead_id, e);
            item.outcome = AssignOutcome::Error;
        }
    }

    let success = results.iter().all(|r| r.outcome == AssignOutcome::Assigned);
    let report = AssignmentReport {
        success,
        assigned_to: target.user_id.clone(),
        results,
    };

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(serde_json::to_string(&report)?.into())
        .map_err(Box::new)?)
}

fn error_response(status: StatusCode, message: &str) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(serde_json::json!({ "error": message }).to_string().into())
        .map_err(Box::new)?)
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

    fn directory() -> Vec<User> {
        vec![
            user("M1", Role::Manager, None),
            user("S1", Role::Supervisor, None),
            user("S2", Role::Supervisor, None),
            user("A1", Role::SalesAgent, Some("S1")),
            user("A2", Role::SalesAgent, Some("S2")),
        ]
    }

    #[test]
    fn agent_is_in_supervisor_picker_iff_they_report_to_them() {
        let users = directory();
        let s1 = &users[1];
        let targets: Vec<&str> = eligible_targets(s1, &users)
            .iter()
            .map(|u| u.user_id.as_str())
            .collect();
        assert_eq!(targets, vec!["A1"]);
    }

    #[test]
    fn inactive_users_never_appear_as_targets() {
        let mut users = directory();
        users[3].active = false;
        let s1 = users[1].clone();
        assert!(eligible_targets(&s1, &users).is_empty());

        let m1 = users[0].clone();
        let targets: Vec<&str> = eligible_targets(&m1, &users)
            .iter()
            .map(|u| u.user_id.as_str())
            .collect();
        assert_eq!(targets, vec!["S1", "S2", "A2"]);
    }

    #[test]
    fn manager_may_target_supervisors_and_agents_but_not_managers() {
        let users = directory();
        let m1 = &users[0];
        assert!(validate_target(m1, &users[1]).is_ok());
        assert!(validate_target(m1, &users[3]).is_ok());
        assert!(validate_target(m1, &user("M2", Role::Manager, None)).is_err());
    }

    #[test]
    fn supervisor_may_target_self_and_own_agents_only() {
        let users = directory();
        let s1 = &users[1];
        assert!(validate_target(s1, s1).is_ok());
        assert!(validate_target(s1, &users[3]).is_ok(), "own agent A1");
        assert!(validate_target(s1, &users[4]).is_err(), "A2 is on S2's team");
        assert!(validate_target(s1, &users[2]).is_err(), "peer supervisor");
    }

    #[test]
    fn agents_cannot_assign_at_all() {
        let users = directory();
        assert!(validate_target(&users[3], &users[3]).is_err());
    }

    #[test]
    fn cross_team_lead_is_invisible_to_supervisor() {
        let users = directory();
        let s1 = &users[1];
        assert!(lead_visible(s1, &users, &lead("L1", STATUS_NEW, None)));
        assert!(lead_visible(s1, &users, &lead("L2", STATUS_ASSIGNED, Some("S1"))));
        assert!(lead_visible(s1, &users, &lead("L3", STATUS_ASSIGNED, Some("A1"))));
        assert!(!lead_visible(s1, &users, &lead("L4", STATUS_ASSIGNED, Some("A2"))));
    }

    #[test]
    fn agent_sees_only_their_own_leads() {
        let users = directory();
        let a1 = &users[3];
        assert!(lead_visible(a1, &users, &lead("L1", STATUS_ASSIGNED, Some("A1"))));
        assert!(!lead_visible(a1, &users, &lead("L2", STATUS_NEW, None)));
        assert!(!lead_visible(a1, &users, &lead("L3", STATUS_ASSIGNED, Some("A2"))));
    }

    #[test]
    fn manager_batch_of_three_new_leads_plans_fully_assigned() {
        let users = directory();
        let leads = vec![
            lead("L1", STATUS_NEW, None),
            lead("L2", STATUS_NEW, None),
            lead("L3", STATUS_NEW, None),
        ];
        let ids = vec!["L1".to_string(), "L2".to_string(), "L3".to_string()];
        let plan = plan_batch(&users[0], &users, &leads, &ids);
        assert_eq!(plan.len(), 3);
        assert!(plan.iter().all(|p| p.outcome == AssignOutcome::Assigned));
    }

    #[tokio::test]
    async fn empty_batch_is_rejected_before_any_store_access() {
        // client is never used: the guard fires first
        let conf = aws_sdk_dynamodb::Config::builder()
            .behavior_version(aws_sdk_dynamodb::config::BehaviorVersion::latest())
            .build();
        let client = DynamoClient::from_conf(conf);

        let body = br#"{"lead_ids": [], "assigned_to": "S1"}"#;
        let resp = assign_leads(&client, "homeward-test", "M1", body)
            .await
            .expect("handler returns a response");
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn plan_reports_missing_and_foreign_leads_per_item() {
        let users = directory();
        let s1 = users[1].clone();
        let leads = vec![
            lead("L1", STATUS_NEW, None),
            lead("L2", STATUS_ASSIGNED, Some("A2")),
        ];
        let ids = vec!["L1".to_string(), "L2".to_string(), "L9".to_string()];
        let plan = plan_batch(&s1, &users, &leads, &ids);
        assert_eq!(plan[0].outcome, AssignOutcome::Assigned);
        assert_eq!(plan[1].outcome, AssignOutcome::Forbidden);
        assert_eq!(plan[2].outcome, AssignOutcome::NotFound);
    }
}
