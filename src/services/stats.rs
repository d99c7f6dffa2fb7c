use serde::Serialize;
use sqlx::SqlitePool;

use crate::models::Link;

use super::ServiceError;

const TOP_LINKS: i64 = 5;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub sections_count: i64,
    pub links_count: i64,
    pub total_clicks: i64,
    pub top_links: Vec<Link>,
}

pub async fn dashboard(pool: &SqlitePool) -> Result<DashboardStats, ServiceError> {
    let map_db = || ServiceError::database("Failed to fetch stats");

    let (sections_count, links_count, total_clicks) = sqlx::query_as::<_, (i64, i64, i64)>(
        "SELECT
            (SELECT COUNT(*) FROM sections),
            (SELECT COUNT(*) FROM links),
            (SELECT COALESCE(SUM(clicks), 0) FROM links)",
    )
    .fetch_one(pool)
    .await
    .map_err(map_db())?;

    let top_links = sqlx::query_as::<_, Link>(
        "SELECT * FROM links ORDER BY clicks DESC, display_order ASC, id ASC LIMIT ?",
    )
    .bind(TOP_LINKS)
    .fetch_all(pool)
    .await
    .map_err(map_db())?;

    Ok(DashboardStats {
        sections_count,
        links_count,
        total_clicks,
        top_links,
    })
}
