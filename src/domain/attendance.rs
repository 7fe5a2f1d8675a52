//! Daily check-in/check-out state machine.
//!
//! Per user and civil date the record moves `none -> checked in -> checked
//! out` and never back. The store's conditional writes decide races, so two
//! concurrent check-ins produce exactly one row.

use crate::analytics::round_to;
use crate::db::RecordStore;
use crate::domain::models::{AttendanceStatus, NewAttendance};
use crate::domain::similarity::{is_match, match_score};
use crate::error::{AppError, AppResult};
use crate::time_utils::CivilZone;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Latest civil time that still counts as on time.
pub fn late_cutoff() -> NaiveTime {
    NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default()
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckInRequest {
    pub user_id: Uuid,
    pub face_embedding: Vec<f64>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckInReceipt {
    pub attendance_id: Uuid,
    pub status: AttendanceStatus,
    pub date: NaiveDate,
    pub check_in_time: String,
    /// Similarity as a percentage, two decimals.
    pub similarity: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckOutReceipt {
    pub attendance_id: Uuid,
    pub date: NaiveDate,
    pub check_in_time: String,
    pub check_out_time: String,
    pub work_hours: f64,
}

pub fn classify(zone: &CivilZone, at: DateTime<Utc>) -> AttendanceStatus {
    if zone.time_of_day(at) > late_cutoff() {
        AttendanceStatus::Late
    } else {
        AttendanceStatus::OnTime
    }
}

/// Elapsed hours between two instants, two decimals.
pub fn work_hours_between(check_in: DateTime<Utc>, check_out: DateTime<Utc>) -> f64 {
    let seconds = (check_out - check_in).num_milliseconds() as f64 / 1000.0;
    round_to(seconds / 3600.0, 2)
}

#[tracing::instrument(skip(store, zone, req), fields(user_id = %req.user_id))]
pub async fn check_in(
    store: &dyn RecordStore,
    zone: &CivilZone,
    req: CheckInRequest,
    now: DateTime<Utc>,
) -> AppResult<CheckInReceipt> {
    let user = store
        .find_user(req.user_id)
        .await?
        .ok_or(AppError::NotFound("user"))?;

    let stored = match user.face_embedding.as_deref() {
        Some(raw) if user.is_enrolled() => raw,
        _ => return Err(AppError::Unenrolled),
    };

    let similarity = match_score(stored, &req.face_embedding);
    if !is_match(similarity) {
        tracing::warn!(
            "Face mismatch for user {}: similarity {:.4}",
            user.id,
            similarity
        );
        return Err(AppError::FaceMismatch { similarity });
    }

    let today = zone.today(now);
    if let Some(existing) = store.find_attendance(user.id, today).await? {
        return Err(AppError::AlreadyCheckedIn {
            checked_in_at: zone.format_datetime(existing.check_in_time),
        });
    }

    let status = classify(zone, now);
    let inserted = store
        .insert_attendance_if_absent(NewAttendance {
            user_id: user.id,
            date: today,
            check_in_time: now,
            status,
            location: req.location,
            notes: req.notes,
        })
        .await?;

    let row = match inserted {
        Some(row) => row,
        None => {
            // Lost a race with a concurrent check-in for the same day.
            let existing = store
                .find_attendance(user.id, today)
                .await?
                .map(|r| zone.format_datetime(r.check_in_time))
                .unwrap_or_default();
            return Err(AppError::AlreadyCheckedIn {
                checked_in_at: existing,
            });
        }
    };

    tracing::info!(
        "User {} checked in on {} as {}",
        user.id,
        today,
        status.as_str()
    );

    Ok(CheckInReceipt {
        attendance_id: row.id,
        status: row.status,
        date: row.date,
        check_in_time: zone.format_time(row.check_in_time),
        similarity: round_to(similarity * 100.0, 2),
    })
}

#[tracing::instrument(skip(store, zone))]
pub async fn check_out(
    store: &dyn RecordStore,
    zone: &CivilZone,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> AppResult<CheckOutReceipt> {
    let user = store
        .find_user(user_id)
        .await?
        .ok_or(AppError::NotFound("user"))?;

    let today = zone.today(now);
    let row = store
        .find_attendance(user.id, today)
        .await?
        .ok_or(AppError::NotCheckedIn)?;

    if let Some(out) = row.check_out_time {
        return Err(AppError::AlreadyCheckedOut {
            checked_out_at: zone.format_datetime(out),
        });
    }

    let hours = work_hours_between(row.check_in_time, now);
    let updated = match store.record_check_out(row.id, now, hours).await? {
        Some(updated) => updated,
        None => {
            let existing = store
                .find_attendance(user.id, today)
                .await?
                .and_then(|r| r.check_out_time)
                .map(|t| zone.format_datetime(t))
                .unwrap_or_default();
            return Err(AppError::AlreadyCheckedOut {
                checked_out_at: existing,
            });
        }
    };

    tracing::info!(
        "User {} checked out on {} after {:.2}h",
        user.id,
        today,
        hours
    );

    Ok(CheckOutReceipt {
        attendance_id: updated.id,
        date: updated.date,
        check_in_time: zone.format_time(updated.check_in_time),
        check_out_time: zone.format_time(now),
        work_hours: updated.work_hours.unwrap_or(hours),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::domain::models::{Gender, NewUser, User};
    use std::sync::Arc;
    use tokio::task::JoinSet;

    async fn enrolled(store: &MemoryStore, embedding: Option<&str>) -> User {
        store
            .insert_user(NewUser {
                name: "Budi Santoso".into(),
                email: format!("{}@example.com", Uuid::new_v4()),
                gender: Gender::Male,
                face_embedding: embedding.map(str::to_string),
            })
            .await
            .unwrap()
    }

    fn request(user_id: Uuid, embedding: Vec<f64>) -> CheckInRequest {
        CheckInRequest {
            user_id,
            face_embedding: embedding,
            location: Some("Head office".into()),
            notes: None,
        }
    }

    /// Civil UTC+7 wall-clock on 2024-03-04.
    fn wib(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        CivilZone::wib()
            .to_utc(
                NaiveDate::from_ymd_opt(2024, 3, 4)
                    .unwrap()
                    .and_hms_opt(h, m, s)
                    .unwrap(),
            )
            .unwrap()
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let store = MemoryStore::new();
        let err = check_in(&store, &CivilZone::wib(), request(Uuid::new_v4(), vec![1.0]), wib(7, 0, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound("user")));
    }

    #[tokio::test]
    async fn unenrolled_user_is_rejected() {
        let store = MemoryStore::new();
        let user = enrolled(&store, None).await;
        let err = check_in(&store, &CivilZone::wib(), request(user.id, vec![1.0, 0.0, 0.0]), wib(7, 0, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unenrolled));
        assert_eq!(err.status().as_u16(), 400);
    }

    #[tokio::test]
    async fn matching_face_before_eight_is_on_time() {
        let store = MemoryStore::new();
        let zone = CivilZone::wib();
        let user = enrolled(&store, Some("[1,0,0]")).await;

        let receipt = check_in(&store, &zone, request(user.id, vec![1.0, 0.0, 0.0]), wib(7, 30, 0))
            .await
            .unwrap();
        assert_eq!(receipt.status, AttendanceStatus::OnTime);
        assert_eq!(receipt.similarity, 100.0);
        assert_eq!(receipt.check_in_time, "07:30:00");
        assert_eq!(receipt.date, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
    }

    #[tokio::test]
    async fn second_check_in_reports_the_first() {
        let store = MemoryStore::new();
        let zone = CivilZone::wib();
        let user = enrolled(&store, Some("[1,0,0]")).await;

        check_in(&store, &zone, request(user.id, vec![1.0, 0.0, 0.0]), wib(7, 30, 0))
            .await
            .unwrap();
        let err = check_in(&store, &zone, request(user.id, vec![1.0, 0.0, 0.0]), wib(10, 0, 0))
            .await
            .unwrap_err();
        match err {
            AppError::AlreadyCheckedIn { checked_in_at } => {
                assert_eq!(checked_in_at, "2024-03-04 07:30:00")
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(store.attendance_count().await, 1);
    }

    #[tokio::test]
    async fn mismatch_never_writes() {
        let store = MemoryStore::new();
        let user = enrolled(&store, Some("[1,0,0]")).await;

        let err = check_in(&store, &CivilZone::wib(), request(user.id, vec![0.0, 1.0, 0.0]), wib(7, 0, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::FaceMismatch { .. }));
        assert_eq!(store.attendance_count().await, 0);

        // wrong dimensionality fails closed
        let err = check_in(&store, &CivilZone::wib(), request(user.id, vec![1.0, 0.0]), wib(7, 0, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::FaceMismatch { similarity } if similarity == 0.0));
        assert_eq!(store.attendance_count().await, 0);
    }

    #[test]
    fn eight_sharp_is_on_time_one_second_later_is_late() {
        let zone = CivilZone::wib();
        assert_eq!(classify(&zone, wib(8, 0, 0)), AttendanceStatus::OnTime);
        assert_eq!(classify(&zone, wib(8, 0, 1)), AttendanceStatus::Late);
        // sub-second precision is truncated
        let just_after = wib(8, 0, 0) + chrono::Duration::milliseconds(500);
        assert_eq!(classify(&zone, just_after), AttendanceStatus::OnTime);
    }

    #[tokio::test]
    async fn check_out_requires_check_in() {
        let store = MemoryStore::new();
        let user = enrolled(&store, Some("[1,0,0]")).await;
        let err = check_out(&store, &CivilZone::wib(), user.id, wib(17, 0, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotCheckedIn));
    }

    #[tokio::test]
    async fn double_check_out_keeps_first_hours() {
        let store = MemoryStore::new();
        let zone = CivilZone::wib();
        let user = enrolled(&store, Some("[1,0,0]")).await;

        check_in(&store, &zone, request(user.id, vec![1.0, 0.0, 0.0]), wib(7, 30, 0))
            .await
            .unwrap();
        let receipt = check_out(&store, &zone, user.id, wib(16, 15, 0)).await.unwrap();
        assert_eq!(receipt.work_hours, 8.75);
        assert_eq!(receipt.check_out_time, "16:15:00");

        let err = check_out(&store, &zone, user.id, wib(18, 0, 0)).await.unwrap_err();
        assert!(matches!(err, AppError::AlreadyCheckedOut { .. }));

        let row = store
            .find_attendance(user.id, receipt.date)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.work_hours, Some(8.75));
    }

    #[tokio::test]
    async fn stored_work_hours_match_stored_times() {
        let store = MemoryStore::new();
        let zone = CivilZone::wib();
        let user = enrolled(&store, Some("[1,0,0]")).await;

        check_in(&store, &zone, request(user.id, vec![1.0, 0.0, 0.0]), wib(7, 31, 0))
            .await
            .unwrap();
        let receipt = check_out(&store, &zone, user.id, wib(16, 2, 20)).await.unwrap();
        assert_eq!(receipt.work_hours, 8.52);

        let row = store
            .find_attendance(user.id, receipt.date)
            .await
            .unwrap()
            .unwrap();
        let out = row.check_out_time.unwrap();
        assert_eq!(
            work_hours_between(row.check_in_time, out),
            row.work_hours.unwrap()
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_check_ins_write_one_row() {
        let store = Arc::new(MemoryStore::new());
        let zone = CivilZone::wib();
        let user = enrolled(&store, Some("[1,0,0]")).await;

        let mut set = JoinSet::new();
        for minute in 0..8 {
            let store = store.clone();
            let req = request(user.id, vec![1.0, 0.0, 0.0]);
            set.spawn(async move { check_in(store.as_ref(), &zone, req, wib(7, minute, 0)).await });
        }

        let mut accepted = 0;
        while let Some(joined) = set.join_next().await {
            match joined.unwrap() {
                Ok(_) => accepted += 1,
                Err(AppError::AlreadyCheckedIn { checked_in_at }) => {
                    assert!(checked_in_at.starts_with("2024-03-04 07:0"))
                }
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }
        assert_eq!(accepted, 1);
        assert_eq!(store.attendance_count().await, 1);
    }

    #[tokio::test]
    async fn check_in_losing_the_insert_reports_the_winner() {
        let store = MemoryStore::new();
        let zone = CivilZone::wib();
        let user = enrolled(&store, Some("[1,0,0]")).await;

        // the second request read the table before the first one committed
        store.replay_attendance_reads(2).await;
        check_in(&store, &zone, request(user.id, vec![1.0, 0.0, 0.0]), wib(7, 10, 0))
            .await
            .unwrap();
        let err = check_in(&store, &zone, request(user.id, vec![1.0, 0.0, 0.0]), wib(7, 10, 5))
            .await
            .unwrap_err();
        match err {
            AppError::AlreadyCheckedIn { checked_in_at } => {
                assert_eq!(checked_in_at, "2024-03-04 07:10:00")
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(store.attendance_count().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_check_outs_record_hours_once() {
        let store = Arc::new(MemoryStore::new());
        let zone = CivilZone::wib();
        let user = enrolled(&store, Some("[1,0,0]")).await;
        check_in(store.as_ref(), &zone, request(user.id, vec![1.0, 0.0, 0.0]), wib(8, 0, 0))
            .await
            .unwrap();

        let mut set = JoinSet::new();
        for hour in 16..22 {
            let store = store.clone();
            let user_id = user.id;
            set.spawn(async move { check_out(store.as_ref(), &zone, user_id, wib(hour, 0, 0)).await });
        }

        let mut receipts = Vec::new();
        while let Some(joined) = set.join_next().await {
            match joined.unwrap() {
                Ok(receipt) => receipts.push(receipt),
                Err(AppError::AlreadyCheckedOut { checked_out_at }) => {
                    assert!(checked_out_at.starts_with("2024-03-04 "))
                }
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }
        assert_eq!(receipts.len(), 1);

        let row = store
            .find_attendance(user.id, receipts[0].date)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.work_hours, Some(receipts[0].work_hours));
    }

    #[tokio::test]
    async fn check_out_losing_the_update_keeps_first_hours() {
        let store = MemoryStore::new();
        let zone = CivilZone::wib();
        let user = enrolled(&store, Some("[1,0,0]")).await;
        check_in(&store, &zone, request(user.id, vec![1.0, 0.0, 0.0]), wib(8, 0, 0))
            .await
            .unwrap();

        // both requests see the row still open
        store.replay_attendance_reads(2).await;
        let first = check_out(&store, &zone, user.id, wib(17, 0, 0)).await.unwrap();
        assert_eq!(first.work_hours, 9.0);

        let err = check_out(&store, &zone, user.id, wib(19, 30, 0)).await.unwrap_err();
        match err {
            AppError::AlreadyCheckedOut { checked_out_at } => {
                assert_eq!(checked_out_at, "2024-03-04 17:00:00")
            }
            other => panic!("unexpected error: {other:?}"),
        }
        let row = store
            .find_attendance(user.id, first.date)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.work_hours, Some(9.0));
    }
}
