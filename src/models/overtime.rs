use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct OvertimeRecord {
    pub id: i64,
    pub user_id: i64,
    pub date: NaiveDate,
    pub overtime_seconds: i64,
}
