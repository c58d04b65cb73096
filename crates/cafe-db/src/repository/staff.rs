//! # Staff Repository
//!
//! Staff members, shift templates and the work schedule that payroll
//! estimates are computed from.

use chrono::{NaiveDate, NaiveTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use cafe_core::{Money, Shift, StaffMember, WorkScheduleEntry};

/// Repository for staffing database operations.
#[derive(Debug, Clone)]
pub struct StaffRepository {
    pool: SqlitePool,
}

impl StaffRepository {
    /// Creates a new StaffRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StaffRepository { pool }
    }

    pub async fn insert_member(&self, member: &StaffMember) -> DbResult<()> {
        debug!(id = %member.id, name = %member.name, "Inserting staff member");

        sqlx::query(
            r#"
            INSERT INTO staff (id, name, hourly_rate, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&member.id)
        .bind(&member.name)
        .bind(member.hourly_rate.minor())
        .bind(member.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_member(&self, id: &str) -> DbResult<Option<StaffMember>> {
        let record = sqlx::query_as::<_, StaffRecord>(
            "SELECT id, name, hourly_rate, is_active FROM staff WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(StaffMember::from))
    }

    /// All staff members, including inactive ones (past schedules still
    /// reference them).
    pub async fn list_members(&self) -> DbResult<Vec<StaffMember>> {
        let records = sqlx::query_as::<_, StaffRecord>(
            "SELECT id, name, hourly_rate, is_active FROM staff ORDER BY name, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(StaffMember::from).collect())
    }

    pub async fn insert_shift(&self, shift: &Shift) -> DbResult<()> {
        debug!(id = %shift.id, name = %shift.name, "Inserting shift");

        sqlx::query(
            "INSERT INTO shifts (id, name, start_time, end_time) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&shift.id)
        .bind(&shift.name)
        .bind(shift.start_time)
        .bind(shift.end_time)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_shifts(&self) -> DbResult<Vec<Shift>> {
        let records = sqlx::query_as::<_, ShiftRecord>(
            "SELECT id, name, start_time, end_time FROM shifts ORDER BY start_time, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(Shift::from).collect())
    }

    /// Schedules a staff member for a shift on a day.
    pub async fn schedule(&self, entry: &WorkScheduleEntry) -> DbResult<()> {
        debug!(
            staff_id = %entry.staff_id,
            shift_id = %entry.shift_id,
            work_date = %entry.work_date,
            "Scheduling shift"
        );

        sqlx::query(
            r#"
            INSERT INTO work_schedules (id, staff_id, work_date, shift_id)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.staff_id)
        .bind(entry.work_date)
        .bind(&entry.shift_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Schedule entries with `work_date` in `[from, to]`.
    pub async fn list_schedule(&self, from: NaiveDate, to: NaiveDate) -> DbResult<Vec<WorkScheduleEntry>> {
        let records = sqlx::query_as::<_, ScheduleRecord>(
            r#"
            SELECT id, staff_id, work_date, shift_id
            FROM work_schedules
            WHERE work_date BETWEEN ?1 AND ?2
            ORDER BY work_date, staff_id, shift_id
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(WorkScheduleEntry::from).collect())
    }
}

// =============================================================================
// Records
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct StaffRecord {
    id: String,
    name: String,
    hourly_rate: i64,
    is_active: bool,
}

impl From<StaffRecord> for StaffMember {
    fn from(r: StaffRecord) -> Self {
        StaffMember {
            id: r.id,
            name: r.name,
            hourly_rate: Money::from_minor(r.hourly_rate),
            is_active: r.is_active,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ShiftRecord {
    id: String,
    name: String,
    start_time: NaiveTime,
    end_time: NaiveTime,
}

impl From<ShiftRecord> for Shift {
    fn from(r: ShiftRecord) -> Self {
        Shift {
            id: r.id,
            name: r.name,
            start_time: r.start_time,
            end_time: r.end_time,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ScheduleRecord {
    id: String,
    staff_id: String,
    work_date: NaiveDate,
    shift_id: String,
}

impl From<ScheduleRecord> for WorkScheduleEntry {
    fn from(r: ScheduleRecord) -> Self {
        WorkScheduleEntry {
            id: r.id,
            staff_id: r.staff_id,
            work_date: r.work_date,
            shift_id: r.shift_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig, DbError};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[tokio::test]
    async fn test_members_shifts_and_schedule() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.staff();

        let lan = StaffMember {
            id: "lan".to_string(),
            name: "Lan".to_string(),
            hourly_rate: Money::from_minor(25_000),
            is_active: true,
        };
        repo.insert_member(&lan).await.unwrap();
        assert_eq!(repo.get_member("lan").await.unwrap(), Some(lan));

        let night = Shift {
            id: "night".to_string(),
            name: "Night".to_string(),
            start_time: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(2, 0, 0).unwrap(),
        };
        repo.insert_shift(&night).await.unwrap();
        let shifts = repo.list_shifts().await.unwrap();
        assert_eq!(shifts, vec![night]);
        assert_eq!(shifts[0].duration_minutes(), 240);

        for (id, d) in [("w1", 10), ("w2", 11), ("w3", 15)] {
            repo.schedule(&WorkScheduleEntry {
                id: id.to_string(),
                staff_id: "lan".to_string(),
                work_date: day(d),
                shift_id: "night".to_string(),
            })
            .await
            .unwrap();
        }

        let entries = repo.list_schedule(day(10), day(11)).await.unwrap();
        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["w1", "w2"]);
    }

    #[tokio::test]
    async fn test_double_booking_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.staff();

        let entry = WorkScheduleEntry {
            id: "w1".to_string(),
            staff_id: "lan".to_string(),
            work_date: day(10),
            shift_id: "morning".to_string(),
        };
        repo.schedule(&entry).await.unwrap();

        let err = repo
            .schedule(&WorkScheduleEntry {
                id: "w2".to_string(),
                ..entry
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }
}
