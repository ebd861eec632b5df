use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entities::{
    carton::{self, CartonStatus},
    external_move, external_partner, production_batch,
    production_batch::StageType,
    work_order,
};

/// Internal pipeline stages reported by the stage summary, in pipeline
/// order. External is reported separately, keyed by process and partner.
pub const INTERNAL_STAGES: [StageType; 5] = [
    StageType::Cutting,
    StageType::Production,
    StageType::Qc,
    StageType::Packing,
    StageType::Dispatched,
];

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StageWip {
    pub stage: StageType,
    pub batch_count: u64,
    pub total_quantity: i64,
    pub in_queue: u64,
    pub in_progress: u64,
    pub completed: u64,
    /// Mean of (now − stage_entered_at) over batches in this stage; absent
    /// when the stage is empty.
    pub avg_wait_minutes: Option<f64>,
    pub overdue_count: u64,
    /// Packed / dispatched piece counts from the carton ledger; zero for
    /// stages the ledger does not cover.
    pub carton_quantity: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ExternalProcessWip {
    pub process: String,
    pub batches_on_site: u64,
    pub batch_quantity: i64,
    pub open_moves: u64,
    pub wip_quantity: i64,
    pub overdue_moves: u64,
    pub avg_turnaround_days: Option<f64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PartnerWip {
    pub partner_id: Uuid,
    pub partner_name: Option<String>,
    pub batches_on_site: u64,
    pub batch_quantity: i64,
    pub open_moves: u64,
    pub wip_quantity: i64,
    pub overdue_moves: u64,
    pub avg_turnaround_days: Option<f64>,
}

/// Full read-side picture, recomputed from scratch on every relevant row
/// change. Derived purely from batch / movement / carton records; the
/// aggregation never consults any cached "current stage" hint on the work
/// order.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WipSnapshot {
    pub generated_at: DateTime<Utc>,
    pub stages: Vec<StageWip>,
    pub external_processes: Vec<ExternalProcessWip>,
    pub partners: Vec<PartnerWip>,
}

fn non_negative(value: i64) -> i64 {
    value.max(0)
}

/// Per-stage occupancy over the active batches (`ended_at` null).
pub fn aggregate_stages(
    now: DateTime<Utc>,
    batches: &[production_batch::Model],
    work_orders: &[work_order::Model],
    cartons: &[carton::Model],
) -> Vec<StageWip> {
    let due_dates: HashMap<Uuid, Option<DateTime<Utc>>> =
        work_orders.iter().map(|wo| (wo.id, wo.due_date)).collect();

    let packed_quantity: i64 = cartons
        .iter()
        .filter(|c| matches!(c.status, CartonStatus::Packed | CartonStatus::ReadyForDispatch))
        .map(|c| non_negative(i64::from(c.quantity) - i64::from(c.dispatched_qty)))
        .sum();
    let dispatched_quantity: i64 = cartons.iter().map(|c| i64::from(c.dispatched_qty)).sum();

    INTERNAL_STAGES
        .iter()
        .map(|&stage| {
            let mut summary = StageWip {
                stage,
                batch_count: 0,
                total_quantity: 0,
                in_queue: 0,
                in_progress: 0,
                completed: 0,
                avg_wait_minutes: None,
                overdue_count: 0,
                carton_quantity: match stage {
                    StageType::Packing => packed_quantity,
                    StageType::Dispatched => dispatched_quantity,
                    _ => 0,
                },
            };

            let mut wait_total_minutes = 0.0_f64;
            for batch in batches
                .iter()
                .filter(|b| b.ended_at.is_none() && b.stage_type == stage)
            {
                summary.batch_count += 1;
                summary.total_quantity += non_negative(i64::from(batch.batch_quantity));
                match batch.batch_status {
                    production_batch::BatchStatus::InQueue => summary.in_queue += 1,
                    production_batch::BatchStatus::InProgress => summary.in_progress += 1,
                    production_batch::BatchStatus::Completed => summary.completed += 1,
                }
                let waited = now.signed_duration_since(batch.stage_entered_at);
                wait_total_minutes += (waited.num_seconds().max(0) as f64) / 60.0;
                let overdue = due_dates
                    .get(&batch.work_order_id)
                    .copied()
                    .flatten()
                    .is_some_and(|due| due < now);
                if overdue {
                    summary.overdue_count += 1;
                }
            }

            if summary.batch_count > 0 {
                summary.avg_wait_minutes = Some(wait_total_minutes / summary.batch_count as f64);
            }
            summary
        })
        .collect()
}

#[derive(Default)]
struct ExternalAccumulator {
    batches_on_site: u64,
    batch_quantity: i64,
    open_moves: u64,
    wip_quantity: i64,
    overdue_moves: u64,
    turnaround_days_total: f64,
    turnaround_samples: u64,
}

impl ExternalAccumulator {
    fn add_batch(&mut self, batch: &production_batch::Model) {
        self.batches_on_site += 1;
        self.batch_quantity += non_negative(i64::from(batch.batch_quantity));
    }

    fn add_move(&mut self, now: DateTime<Utc>, mv: &external_move::Model) {
        if mv.status.is_open() {
            self.open_moves += 1;
            self.wip_quantity +=
                non_negative(i64::from(mv.quantity_sent) - i64::from(mv.quantity_returned));
            if mv.actual_return_date.is_none()
                && mv.expected_return_date.is_some_and(|expected| expected < now)
            {
                self.overdue_moves += 1;
            }
        }
        if let Some(returned) = mv.actual_return_date {
            let days = returned.signed_duration_since(mv.sent_date).num_seconds().max(0) as f64
                / 86_400.0;
            self.turnaround_days_total += days;
            self.turnaround_samples += 1;
        }
    }

    fn avg_turnaround_days(&self) -> Option<f64> {
        (self.turnaround_samples > 0)
            .then(|| self.turnaround_days_total / self.turnaround_samples as f64)
    }
}

/// Occupancy per external process type, from active batches sitting at
/// external plus the open movement records.
pub fn aggregate_external_processes(
    now: DateTime<Utc>,
    batches: &[production_batch::Model],
    moves: &[external_move::Model],
) -> Vec<ExternalProcessWip> {
    let mut by_process: BTreeMap<String, ExternalAccumulator> = BTreeMap::new();

    for batch in batches
        .iter()
        .filter(|b| b.ended_at.is_none() && b.stage_type == StageType::External)
    {
        if let Some(process) = &batch.external_process_type {
            by_process.entry(process.clone()).or_default().add_batch(batch);
        }
    }
    for mv in moves {
        by_process
            .entry(mv.process.clone())
            .or_default()
            .add_move(now, mv);
    }

    by_process
        .into_iter()
        .map(|(process, acc)| ExternalProcessWip {
            process,
            batches_on_site: acc.batches_on_site,
            batch_quantity: acc.batch_quantity,
            open_moves: acc.open_moves,
            wip_quantity: acc.wip_quantity,
            overdue_moves: acc.overdue_moves,
            avg_turnaround_days: acc.avg_turnaround_days(),
        })
        .collect()
}

/// Occupancy per external partner, enriched with the partner display name.
pub fn aggregate_partners(
    now: DateTime<Utc>,
    batches: &[production_batch::Model],
    moves: &[external_move::Model],
    partners: &[external_partner::Model],
) -> Vec<PartnerWip> {
    let names: HashMap<Uuid, &str> =
        partners.iter().map(|p| (p.id, p.name.as_str())).collect();
    let mut by_partner: BTreeMap<Uuid, ExternalAccumulator> = BTreeMap::new();

    for batch in batches
        .iter()
        .filter(|b| b.ended_at.is_none() && b.stage_type == StageType::External)
    {
        if let Some(partner_id) = batch.external_partner_id {
            by_partner.entry(partner_id).or_default().add_batch(batch);
        }
    }
    for mv in moves {
        if let Some(partner_id) = mv.partner_id {
            by_partner.entry(partner_id).or_default().add_move(now, mv);
        }
    }

    by_partner
        .into_iter()
        .map(|(partner_id, acc)| PartnerWip {
            partner_id,
            partner_name: names.get(&partner_id).map(|n| n.to_string()),
            batches_on_site: acc.batches_on_site,
            batch_quantity: acc.batch_quantity,
            open_moves: acc.open_moves,
            wip_quantity: acc.wip_quantity,
            overdue_moves: acc.overdue_moves,
            avg_turnaround_days: acc.avg_turnaround_days(),
        })
        .collect()
}

pub fn build_snapshot(
    now: DateTime<Utc>,
    batches: &[production_batch::Model],
    work_orders: &[work_order::Model],
    moves: &[external_move::Model],
    cartons: &[carton::Model],
    partners: &[external_partner::Model],
) -> WipSnapshot {
    WipSnapshot {
        generated_at: now,
        stages: aggregate_stages(now, batches, work_orders, cartons),
        external_processes: aggregate_external_processes(now, batches, moves),
        partners: aggregate_partners(now, batches, moves, partners),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::production_batch::{BatchStatus, QcGateStatus, TriggerReason};
    use chrono::Duration;

    fn batch(
        wo: Uuid,
        number: i32,
        stage: StageType,
        status: BatchStatus,
        quantity: i32,
        entered_minutes_ago: i64,
        now: DateTime<Utc>,
    ) -> production_batch::Model {
        production_batch::Model {
            id: Uuid::new_v4(),
            work_order_id: wo,
            batch_number: number,
            trigger_reason: TriggerReason::Initial,
            previous_batch_id: None,
            started_at: now - Duration::days(1),
            ended_at: None,
            stage_type: stage,
            batch_status: status,
            stage_entered_at: now - Duration::minutes(entered_minutes_ago),
            external_process_type: None,
            external_partner_id: None,
            external_sent_at: None,
            external_returned_at: None,
            requires_qc_on_return: false,
            post_external_qc_status: None,
            batch_quantity: quantity,
            produced_qty: 0,
            qc_rejected_qty: 0,
            qc_approved_qty: 0,
            qc_material_status: QcGateStatus::Pending,
            qc_material_approved_by: None,
            qc_material_approved_at: None,
            qc_first_piece_status: QcGateStatus::Pending,
            qc_first_piece_approved_by: None,
            qc_first_piece_approved_at: None,
            qc_final_status: QcGateStatus::Pending,
            qc_final_approved_by: None,
            qc_final_approved_at: None,
            production_allowed: false,
            dispatch_allowed: false,
            row_version: 1,
            created_at: now - Duration::days(1),
            updated_at: now,
        }
    }

    fn work_order_due(
        id: Uuid,
        due_date: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> work_order::Model {
        work_order::Model {
            id,
            order_number: "WO-1".into(),
            customer: None,
            item_code: None,
            quantity: 1000,
            due_date,
            gross_weight_per_pc: None,
            created_at: now - Duration::days(30),
            updated_at: now,
        }
    }

    fn mv(
        process: &str,
        partner: Option<Uuid>,
        sent: i32,
        returned: i32,
        status: external_move::ExternalMoveStatus,
        now: DateTime<Utc>,
        expected_days_ago: Option<i64>,
        returned_days_after: Option<i64>,
    ) -> external_move::Model {
        let sent_date = now - Duration::days(10);
        external_move::Model {
            id: Uuid::new_v4(),
            work_order_id: Uuid::new_v4(),
            partner_id: partner,
            process: process.into(),
            quantity_sent: sent,
            quantity_returned: returned,
            quantity_rejected: 0,
            sent_date,
            expected_return_date: expected_days_ago.map(|d| now - Duration::days(d)),
            actual_return_date: returned_days_after.map(|d| sent_date + Duration::days(d)),
            status,
            created_at: sent_date,
            updated_at: now,
        }
    }

    #[test]
    fn batches_are_counted_once_per_stage() {
        let now = Utc::now();
        let wo = Uuid::new_v4();
        let batches = vec![
            batch(wo, 1, StageType::Production, BatchStatus::InProgress, 500, 60, now),
            batch(wo, 2, StageType::Production, BatchStatus::InQueue, 300, 120, now),
            batch(wo, 3, StageType::Qc, BatchStatus::InQueue, 200, 30, now),
        ];
        let wos = vec![work_order_due(wo, None, now)];
        let stages = aggregate_stages(now, &batches, &wos, &[]);

        let total_batches: u64 = stages.iter().map(|s| s.batch_count).sum();
        assert_eq!(total_batches, 3);

        let production = stages
            .iter()
            .find(|s| s.stage == StageType::Production)
            .unwrap();
        assert_eq!(production.batch_count, 2);
        assert_eq!(production.total_quantity, 800);
        assert_eq!(production.in_queue, 1);
        assert_eq!(production.in_progress, 1);
        assert_eq!(production.completed, 0);
        let avg = production.avg_wait_minutes.unwrap();
        assert!((avg - 90.0).abs() < 0.1, "avg wait was {avg}");
    }

    #[test]
    fn closed_batches_do_not_appear() {
        let now = Utc::now();
        let wo = Uuid::new_v4();
        let mut closed = batch(wo, 1, StageType::Production, BatchStatus::Completed, 500, 10, now);
        closed.ended_at = Some(now);
        let stages = aggregate_stages(now, &[closed], &[work_order_due(wo, None, now)], &[]);
        assert!(stages.iter().all(|s| s.batch_count == 0));
    }

    #[test]
    fn overdue_counts_follow_work_order_due_date() {
        let now = Utc::now();
        let overdue_wo = Uuid::new_v4();
        let on_time_wo = Uuid::new_v4();
        let batches = vec![
            batch(overdue_wo, 1, StageType::Qc, BatchStatus::InQueue, 100, 5, now),
            batch(on_time_wo, 1, StageType::Qc, BatchStatus::InQueue, 100, 5, now),
        ];
        let wos = vec![
            work_order_due(overdue_wo, Some(now - Duration::days(2)), now),
            work_order_due(on_time_wo, Some(now + Duration::days(2)), now),
        ];
        let stages = aggregate_stages(now, &batches, &wos, &[]);
        let qc = stages.iter().find(|s| s.stage == StageType::Qc).unwrap();
        assert_eq!(qc.batch_count, 2);
        assert_eq!(qc.overdue_count, 1);
    }

    #[test]
    fn quantities_never_go_negative() {
        let now = Utc::now();
        let wo = Uuid::new_v4();
        // Out-of-order updates can leave returned > sent on a move and a
        // negative remainder on a carton; both must floor at zero.
        let moves = vec![mv(
            "Plating",
            None,
            100,
            250,
            external_move::ExternalMoveStatus::Partial,
            now,
            None,
            None,
        )];
        let processes = aggregate_external_processes(now, &[], &moves);
        assert_eq!(processes.len(), 1);
        assert_eq!(processes[0].wip_quantity, 0);

        let cartons = vec![carton::Model {
            id: Uuid::new_v4(),
            work_order_id: wo,
            quantity: 10,
            dispatched_qty: 25,
            status: CartonStatus::Packed,
            built_at: now,
            created_at: now,
            updated_at: now,
        }];
        let stages = aggregate_stages(now, &[], &[], &cartons);
        let packing = stages.iter().find(|s| s.stage == StageType::Packing).unwrap();
        assert_eq!(packing.carton_quantity, 0);
    }

    #[test]
    fn external_wip_sums_open_moves_only() {
        let now = Utc::now();
        let moves = vec![
            mv("Plating", None, 500, 100, external_move::ExternalMoveStatus::Partial, now, None, None),
            mv("Plating", None, 200, 0, external_move::ExternalMoveStatus::Sent, now, None, None),
            // Returned move: no longer WIP, but feeds turnaround.
            mv("Plating", None, 300, 300, external_move::ExternalMoveStatus::Returned, now, None, Some(6)),
        ];
        let processes = aggregate_external_processes(now, &[], &moves);
        assert_eq!(processes.len(), 1);
        let plating = &processes[0];
        assert_eq!(plating.open_moves, 2);
        assert_eq!(plating.wip_quantity, 600);
        let turnaround = plating.avg_turnaround_days.unwrap();
        assert!((turnaround - 6.0).abs() < 0.01);
    }

    #[test]
    fn overdue_moves_require_passed_expected_date_without_return() {
        let now = Utc::now();
        let moves = vec![
            mv("Plating", None, 100, 0, external_move::ExternalMoveStatus::Sent, now, Some(3), None),
            mv("Plating", None, 100, 0, external_move::ExternalMoveStatus::Sent, now, Some(-3), None),
        ];
        let processes = aggregate_external_processes(now, &[], &moves);
        assert_eq!(processes[0].overdue_moves, 1);
    }

    #[test]
    fn partner_views_pick_up_directory_names() {
        let now = Utc::now();
        let partner_id = Uuid::new_v4();
        let partners = vec![external_partner::Model {
            id: partner_id,
            name: "ABC Plating".into(),
            active: true,
            created_at: now,
            updated_at: now,
        }];
        let moves = vec![mv(
            "Plating",
            Some(partner_id),
            400,
            150,
            external_move::ExternalMoveStatus::Partial,
            now,
            None,
            None,
        )];
        let result = aggregate_partners(now, &[], &moves, &partners);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].partner_name.as_deref(), Some("ABC Plating"));
        assert_eq!(result[0].wip_quantity, 250);
    }

    #[test]
    fn batches_at_external_group_by_process_and_partner() {
        let now = Utc::now();
        let wo = Uuid::new_v4();
        let partner_id = Uuid::new_v4();
        let mut b = batch(wo, 1, StageType::External, BatchStatus::InProgress, 350, 60, now);
        b.external_process_type = Some("Plating".into());
        b.external_partner_id = Some(partner_id);

        let processes = aggregate_external_processes(now, std::slice::from_ref(&b), &[]);
        assert_eq!(processes.len(), 1);
        assert_eq!(processes[0].batches_on_site, 1);
        assert_eq!(processes[0].batch_quantity, 350);

        let partners = aggregate_partners(now, &[b], &[], &[]);
        assert_eq!(partners.len(), 1);
        assert_eq!(partners[0].partner_id, partner_id);
        assert_eq!(partners[0].batch_quantity, 350);
    }
}
