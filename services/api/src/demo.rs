use crate::infra::{load_snapshot, seeded_snapshot, OutboxBridge};
use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use clap::Args;
use pg_coordinator::error::AppError;
use pg_coordinator::workflows::coordinator::{
    CoordinatorError, InMemoryDirectory, LinkCommand, LinkTarget, NotificationStatus, PgCoordinator,
    SnapshotProvider,
};
use pg_coordinator::workflows::directory::{same_label, Collaborator, Leader};
use pg_coordinator::workflows::membership::{
    LinkAction, MembershipEngine, Resolution, ResolutionDecision, RosterEntry,
};
use pg_coordinator::workflows::scheduling::{ScheduleProposal, SchedulingEngine};
use std::path::PathBuf;
use std::sync::Arc;

type DemoCoordinator = PgCoordinator<InMemoryDirectory, OutboxBridge>;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// JSON directory snapshot to run against. Defaults to a seeded hospital unit.
    #[arg(long)]
    pub(crate) snapshot: Option<PathBuf>,
    /// Meeting date to schedule (YYYY-MM-DDTHH:MM). Defaults to next Wednesday at 19:15.
    #[arg(long, value_parser = crate::infra::parse_date_time)]
    pub(crate) date: Option<NaiveDateTime>,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { snapshot, date } = args;

    let meeting_at = date.unwrap_or_else(|| {
        let evening = NaiveTime::from_hms_opt(19, 15, 0).unwrap_or(NaiveTime::MIN);
        next_wednesday(Local::now().date_naive()).and_time(evening)
    });
    let snapshot = match snapshot {
        Some(path) => load_snapshot(&path)?,
        None => seeded_snapshot(meeting_at.date()),
    };

    let directory = InMemoryDirectory::new(snapshot);
    let bridge = OutboxBridge::default();
    let scheduling = SchedulingEngine::default();
    let coordinator = PgCoordinator::new(
        Arc::new(directory.clone()),
        Arc::new(bridge.clone()),
        MembershipEngine::default(),
        scheduling,
    );

    println!("PG coordinator demo");
    println!(
        "Chaplain coordination enabled for unit {}",
        coordinator.scheduling().policy().enabled_unit()
    );

    let current = directory.snapshot().map_err(CoordinatorError::from)?;
    let Some(leader) = current
        .leaders
        .iter()
        .find(|leader| {
            coordinator
                .scheduling()
                .policy()
                .is_enabled_for(&leader.unit)
        })
        .or_else(|| current.leaders.first())
        .cloned()
    else {
        println!("Snapshot has no leaders; nothing to demonstrate");
        return Ok(());
    };
    println!(
        "Acting as {} ({}, sector {}, unit {})",
        leader.name, leader.group_name, leader.sector, leader.unit
    );

    let admin = current
        .leaders
        .iter()
        .find(|leader| leader.is_admin())
        .map(|leader| leader.id.to_string());

    println!("\nMembership workflow");
    demo_membership(&coordinator, &leader, &current.collaborators, admin.as_deref());

    println!("\nRoster of {}", leader.group_name);
    match coordinator.roster(&leader.group_name) {
        Ok(entries) => {
            for entry in entries {
                println!("  - {}", describe_entry(&entry));
            }
        }
        Err(err) => println!("  Roster unavailable: {}", err),
    }

    println!("\nMeeting scheduling for {}", meeting_at);
    demo_scheduling(&coordinator, &leader, meeting_at).await;

    let invites = bridge.invites();
    if invites.is_empty() {
        println!("  Chaplaincy outbox: empty");
    } else {
        println!("  Chaplaincy outbox:");
        for invite in invites {
            match serde_json::to_string(&invite) {
                Ok(json) => println!("    {}", json),
                Err(err) => println!("    invite unavailable: {}", err),
            }
        }
    }

    Ok(())
}

fn demo_membership(
    coordinator: &DemoCoordinator,
    leader: &Leader,
    members: &[Collaborator],
    admin: Option<&str>,
) {
    let unassigned = |same_sector: bool| {
        members.iter().find(|member| {
            !member.is_external()
                && member.active_group().is_none()
                && same_label(&member.sector, &leader.sector) == same_sector
        })
    };
    let command = |target: LinkTarget, justification: Option<&str>| LinkCommand {
        leader_id: leader.id.clone(),
        target,
        action: LinkAction {
            group_name: leader.group_name.clone(),
            reason: None,
            justification: justification.map(str::to_string),
            auto_seen: true,
        },
    };

    match unassigned(true) {
        Some(member) => report_link(
            coordinator,
            &format!("Same-sector link of {}", member.name),
            command(
                LinkTarget::Member {
                    id: member.id.clone(),
                },
                None,
            ),
        ),
        None => println!("- No unassigned member from {} to link", leader.sector),
    }

    match unassigned(false) {
        Some(member) => {
            let target = LinkTarget::Member {
                id: member.id.clone(),
            };
            report_link(
                coordinator,
                &format!("Cross-sector link of {} without justification", member.name),
                command(target.clone(), None),
            );
            report_link(
                coordinator,
                &format!("Cross-sector link of {} with justification", member.name),
                command(target, Some("requested transfer")),
            );
        }
        None => println!("- No unassigned member from another sector to link"),
    }

    report_link(
        coordinator,
        "External person link",
        command(
            LinkTarget::ExternalPerson {
                name: "Visitante Voluntária".to_string(),
            },
            None,
        ),
    );

    let pending = match coordinator.pending_requests() {
        Ok(pending) => pending,
        Err(err) => {
            println!("  Admin inbox unavailable: {}", err);
            return;
        }
    };
    println!("Admin inbox: {} pending request(s)", pending.len());
    for request in &pending {
        println!(
            "  - {} {} {} ({})",
            request.id,
            request.kind.label(),
            request.member_name,
            request.reason
        );
    }

    let Some(admin) = admin else {
        println!("- No administrator on record; pending requests stay open");
        return;
    };
    if let Some(request) = pending.first() {
        let resolution = Resolution {
            decision: ResolutionDecision::Approve,
            admin: admin.to_string(),
            note: Some("approved during demo".to_string()),
        };
        match coordinator.resolve_request(&request.id, resolution) {
            Ok(outcome) => println!(
                "- Admin approved {} -> {}",
                outcome.request.member_name,
                outcome.request.status.label()
            ),
            Err(err) => println!("- Admin approval failed: {}", err),
        }
    }
}

fn report_link(coordinator: &DemoCoordinator, label: &str, command: LinkCommand) {
    match coordinator.link_member(command) {
        Ok(decision) => {
            println!(
                "- {}: {} ({:?})",
                label,
                decision.request.status.label(),
                decision.routing
            );
            if let Some(transfer) = decision.transfer {
                println!(
                    "  Transfer warning: leaving {} for {}",
                    transfer.from_group, transfer.to_group
                );
            }
        }
        Err(err) => println!("- {}: rejected ({})", label, err),
    }
}

async fn demo_scheduling(coordinator: &DemoCoordinator, leader: &Leader, at: NaiveDateTime) {
    let assessment = match coordinator.assess_slot(&leader.id, at) {
        Ok(assessment) => assessment,
        Err(err) => {
            println!("  Assessment unavailable: {}", err);
            return;
        }
    };
    println!(
        "  weekend={} fully_booked={} chaplain_requests_allowed={}",
        assessment.weekend, assessment.fully_booked, assessment.chaplain_requests_allowed
    );
    for chaplain in &assessment.chaplains {
        match &chaplain.conflict {
            None => println!("  - {}: available", chaplain.name),
            Some(conflict) => println!(
                "  - {}: busy with {} at {} (next available {})",
                chaplain.name, conflict.group_name, conflict.scheduled_at, conflict.next_available
            ),
        }
    }

    let preferred = assessment
        .available_chaplains()
        .next()
        .map(|entry| entry.chaplain_id.clone());
    let proposal = ScheduleProposal {
        leader_id: leader.id.clone(),
        scheduled_at: at,
        request_chaplain: assessment.chaplain_requests_allowed,
        preferred_chaplain_id: preferred,
        notes: Some("Encontro semanal".to_string()),
    };

    match coordinator.submit_schedule(proposal).await {
        Ok(submission) => {
            println!(
                "  Schedule committed={} notified={} chaplain_status={}",
                submission.committed,
                submission.notified,
                submission.schedule.chaplain_status.label()
            );
            if let NotificationStatus::Failed { error } = &submission.notification {
                println!("  Chaplaincy notification failed: {}", error);
            }
        }
        Err(err) => println!("  Schedule rejected: {}", err),
    }
}

fn describe_entry(entry: &RosterEntry) -> String {
    let tags = match entry {
        RosterEntry::Leader { sector, .. } => vec!["leader", sector.as_str()],
        RosterEntry::Member {
            sector,
            divergent,
            external,
            ..
        } => {
            let mut tags = vec![sector.as_str()];
            if *divergent {
                tags.push("other sector");
            }
            if *external {
                tags.push("external");
            }
            tags
        }
        RosterEntry::PendingRequest { sector, .. } => vec!["awaiting approval", sector.as_str()],
    };
    format!("{} ({})", entry.name(), tags.join(", "))
}

fn next_wednesday(today: NaiveDate) -> NaiveDate {
    let offset = (9 - i64::from(today.weekday().num_days_from_monday())) % 7;
    today + Duration::days(offset)
}
