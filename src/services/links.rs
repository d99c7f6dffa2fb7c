use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, error};

use crate::{
    db,
    models::{DEFAULT_ICON, Link},
    utils::validation::ValidationError,
};

use super::{
    Deleted, ServiceError, Updated,
    ordering::{Ordered, resolve_order_change},
    patch::FieldPatch,
};

impl Ordered for Link {
    const TABLE: &'static str = "links";

    fn id(&self) -> i64 {
        self.id
    }

    fn display_order(&self) -> i64 {
        self.display_order
    }

    fn order_scope(&self) -> Option<(&'static str, i64)> {
        Some(("section_id", self.section_id))
    }

    fn display_name(&self) -> &str {
        &self.label
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct LinkPatch {
    pub section_id: Option<i64>,
    pub label: Option<String>,
    pub url: Option<String>,
    pub icon_type: Option<String>,
    pub is_visible: Option<bool>,
    pub display_order: Option<i64>,
    pub group_title: Option<Option<String>>,
    pub group_order: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewLink {
    pub section_id: i64,
    pub label: String,
    pub url: String,
    pub icon_type: String,
    pub is_visible: bool,
    pub display_order: i64,
    pub group_title: Option<String>,
    pub group_order: i64,
}

impl TryFrom<LinkPatch> for NewLink {
    type Error = ValidationError;

    fn try_from(patch: LinkPatch) -> Result<Self, Self::Error> {
        let (Some(section_id), Some(label), Some(url)) = (
            patch.section_id.filter(|id| *id != 0),
            patch.label,
            patch.url,
        ) else {
            return Err(ValidationError("section_id, label, and url are required"));
        };

        Ok(Self {
            section_id,
            label,
            url,
            icon_type: patch.icon_type.unwrap_or_else(|| DEFAULT_ICON.to_string()),
            is_visible: patch.is_visible.unwrap_or(true),
            display_order: patch.display_order.unwrap_or(0),
            group_title: patch.group_title.flatten(),
            group_order: patch.group_order.unwrap_or(0),
        })
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LinkFilter {
    pub section_id: Option<i64>,
    pub visible_only: bool,
}

pub async fn find_all(pool: &SqlitePool, filter: LinkFilter) -> Result<Vec<Link>, ServiceError> {
    let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM links WHERE 1 = 1");
    if let Some(section_id) = filter.section_id {
        query.push(" AND section_id = ").push_bind(section_id);
    }
    if filter.visible_only {
        query.push(" AND is_visible = 1");
    }
    query.push(" ORDER BY display_order ASC, id ASC");

    query
        .build_query_as::<Link>()
        .fetch_all(pool)
        .await
        .map_err(ServiceError::database("Failed to fetch links"))
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Link, ServiceError> {
    let mut conn = pool
        .acquire()
        .await
        .map_err(ServiceError::database("Failed to fetch link"))?;
    fetch_by_id(&mut conn, id)
        .await
        .map_err(ServiceError::database("Failed to fetch link"))?
        .ok_or(ServiceError::NotFound("Link not found"))
}

/// Visible links of one section in page order; empty on storage failure.
pub async fn get_visible_by_section(pool: &SqlitePool, section_id: i64) -> Vec<Link> {
    sqlx::query_as::<_, Link>(
        "SELECT * FROM links WHERE section_id = ? AND is_visible = 1
         ORDER BY group_order ASC, display_order ASC, id ASC",
    )
    .bind(section_id)
    .fetch_all(pool)
    .await
    .unwrap_or_else(|err| {
        error!(?err, section_id, "failed to fetch visible links");
        Vec::new()
    })
}

pub async fn create(pool: &SqlitePool, data: NewLink) -> Result<Link, ServiceError> {
    let map_db = || ServiceError::database("Failed to create link");
    let mut tx = pool.begin().await.map_err(map_db())?;

    let insert = sqlx::query(
        "INSERT INTO links (section_id, label, url, icon_type, is_visible, display_order, group_title, group_order)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(data.section_id)
    .bind(&data.label)
    .bind(&data.url)
    .bind(&data.icon_type)
    .bind(data.is_visible)
    .bind(data.display_order)
    .bind(&data.group_title)
    .bind(data.group_order)
    .execute(&mut *tx)
    .await
    .map_err(|err| {
        if err
            .as_database_error()
            .is_some_and(|db_err| db_err.is_foreign_key_violation())
        {
            ServiceError::NotFound("Section not found")
        } else {
            map_db()(err)
        }
    })?;

    let created = fetch_by_id(&mut tx, insert.last_insert_rowid())
        .await
        .map_err(map_db())?
        .ok_or(ServiceError::NotFound("Link not found"))?;
    tx.commit().await.map_err(map_db())?;

    Ok(created)
}

/// Applies `patch` to the link. `section_id` is ignored: links do not move
/// between sections.
pub async fn update(
    pool: &SqlitePool,
    id: i64,
    patch: LinkPatch,
    confirm_swap: bool,
) -> Result<Updated<Link>, ServiceError> {
    let map_db = || ServiceError::database("Failed to update link");
    let mut tx = pool.begin().await.map_err(map_db())?;

    if !db::lock_row(&mut tx, Link::TABLE, id).await.map_err(map_db())? {
        return Err(ServiceError::NotFound("Link not found"));
    }
    let existing = fetch_by_id(&mut tx, id)
        .await
        .map_err(map_db())?
        .ok_or(ServiceError::NotFound("Link not found"))?;

    if let Some(new_order) = patch.display_order
        && let Some(warning) =
            resolve_order_change(&mut tx, &existing, new_order, confirm_swap)
                .await
                .map_err(map_db())?
    {
        return Ok(Updated::NeedsConfirmation(warning));
    }

    let written = FieldPatch::new("links")
        .text("label", patch.label)
        .text("url", patch.url)
        .text("icon_type", patch.icon_type)
        .flag("is_visible", patch.is_visible)
        .int("display_order", patch.display_order)
        .nullable_text("group_title", patch.group_title)
        .int("group_order", patch.group_order)
        .execute(&mut tx, id)
        .await
        .map_err(map_db())?;

    if written == 0 {
        return Err(ServiceError::BadRequest("No fields to update".to_string()));
    }

    let updated = fetch_by_id(&mut tx, id)
        .await
        .map_err(map_db())?
        .ok_or(ServiceError::NotFound("Link not found"))?;
    tx.commit().await.map_err(map_db())?;

    Ok(Updated::Applied(updated))
}

pub async fn delete(pool: &SqlitePool, id: i64) -> Result<Deleted, ServiceError> {
    let result = sqlx::query("DELETE FROM links WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .map_err(ServiceError::database("Failed to delete link"))?;

    if result.rows_affected() == 0 {
        return Err(ServiceError::NotFound("Link not found"));
    }

    Ok(Deleted { deleted: true })
}

pub async fn increment_clicks(pool: &SqlitePool, id: i64) -> sqlx::Result<bool> {
    let result = sqlx::query(
        "UPDATE links SET clicks = clicks + 1, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
    )
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Counts a click in a detached task. The caller never waits on it and
/// failures only reach the log.
pub fn track_click(pool: SqlitePool, id: i64) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        match increment_clicks(&pool, id).await {
            Ok(true) => debug!(id, "click recorded"),
            Ok(false) => debug!(id, "click for unknown link ignored"),
            Err(err) => error!(?err, id, "failed to record click"),
        }
    })
}

async fn fetch_by_id(conn: &mut SqliteConnection, id: i64) -> sqlx::Result<Option<Link>> {
    sqlx::query_as::<_, Link>("SELECT * FROM links WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::memory_pool,
        services::sections::{self, tests::new_section},
    };

    fn new_link(section_id: i64, label: &str, display_order: i64) -> NewLink {
        NewLink {
            section_id,
            label: label.to_string(),
            url: format!("https://example.com/{}", label.to_lowercase()),
            icon_type: DEFAULT_ICON.to_string(),
            is_visible: true,
            display_order,
            group_title: None,
            group_order: 0,
        }
    }

    async fn seeded() -> (SqlitePool, i64) {
        let pool = memory_pool().await;
        let section = sections::create(&pool, new_section("Main", "main", 0))
            .await
            .unwrap();
        (pool, section.id)
    }

    #[tokio::test]
    async fn create_with_defaults() {
        let (pool, section_id) = seeded().await;
        assert_eq!(section_id, 1);

        let patch = LinkPatch {
            section_id: Some(1),
            label: Some("Blog".to_string()),
            url: Some("https://example.com".to_string()),
            ..Default::default()
        };
        let link = create(&pool, NewLink::try_from(patch).unwrap()).await.unwrap();

        assert!(link.is_visible);
        assert_eq!(link.display_order, 0);
        assert_eq!(link.icon_type, "link");
        assert_eq!(link.clicks, 0);
        assert_eq!(link.group_title, None);
    }

    #[test]
    fn zero_section_id_counts_as_missing() {
        let patch = LinkPatch {
            section_id: Some(0),
            label: Some("Blog".to_string()),
            url: Some("https://example.com".to_string()),
            ..Default::default()
        };
        assert_eq!(
            NewLink::try_from(patch).unwrap_err(),
            ValidationError("section_id, label, and url are required")
        );
    }

    #[tokio::test]
    async fn create_requires_existing_section() {
        let pool = memory_pool().await;
        let err = create(&pool, new_link(42, "Orphan", 0)).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound("Section not found")));
    }

    #[tokio::test]
    async fn swap_is_scoped_to_the_section() {
        let (pool, first) = seeded().await;
        let second = sections::create(&pool, new_section("Other", "other", 1))
            .await
            .unwrap()
            .id;

        let a = create(&pool, new_link(first, "A", 0)).await.unwrap();
        let b = create(&pool, new_link(first, "B", 1)).await.unwrap();
        create(&pool, new_link(second, "Elsewhere", 5)).await.unwrap();

        let free = LinkPatch {
            display_order: Some(5),
            ..Default::default()
        };
        assert!(matches!(
            update(&pool, a.id, free, false).await.unwrap(),
            Updated::Applied(link) if link.display_order == 5
        ));

        let taken = LinkPatch {
            display_order: Some(1),
            ..Default::default()
        };
        let Updated::NeedsConfirmation(warning) =
            update(&pool, a.id, taken.clone(), false).await.unwrap()
        else {
            panic!("expected a swap warning");
        };
        assert_eq!(warning.conflict_with.id, b.id);
        assert_eq!(warning.current_order, 5);

        let Updated::Applied(a_after) = update(&pool, a.id, taken, true).await.unwrap() else {
            panic!("expected the swap to apply");
        };
        assert_eq!(a_after.display_order, 1);
        assert_eq!(find_by_id(&pool, b.id).await.unwrap().display_order, 5);
    }

    #[tokio::test]
    async fn update_ignores_section_moves() {
        let (pool, section_id) = seeded().await;
        let link = create(&pool, new_link(section_id, "A", 0)).await.unwrap();

        let only_section = LinkPatch {
            section_id: Some(99),
            ..Default::default()
        };
        let err = update(&pool, link.id, only_section, false)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::BadRequest(msg) if msg == "No fields to update"));

        let regroup = LinkPatch {
            group_title: Some(Some("Socials".to_string())),
            group_order: Some(2),
            is_visible: Some(false),
            ..Default::default()
        };
        let Updated::Applied(updated) = update(&pool, link.id, regroup, false).await.unwrap() else {
            panic!("expected the update to apply");
        };
        assert_eq!(updated.section_id, section_id);
        assert_eq!(updated.group_title.as_deref(), Some("Socials"));
        assert_eq!(updated.group_order, 2);
        assert!(!updated.is_visible);
    }

    #[tokio::test]
    async fn filters_and_cascade() {
        let (pool, section_id) = seeded().await;
        create(&pool, new_link(section_id, "B", 2)).await.unwrap();
        let mut hidden = new_link(section_id, "A", 1);
        hidden.is_visible = false;
        create(&pool, hidden).await.unwrap();

        let all = find_all(&pool, LinkFilter::default()).await.unwrap();
        assert_eq!(
            all.iter().map(|l| l.label.as_str()).collect::<Vec<_>>(),
            ["A", "B"]
        );

        let visible = find_all(
            &pool,
            LinkFilter {
                section_id: Some(section_id),
                visible_only: true,
            },
        )
        .await
        .unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(get_visible_by_section(&pool, section_id).await.len(), 1);

        sections::delete(&pool, section_id).await.unwrap();
        assert!(find_all(&pool, LinkFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn click_tracking_runs_detached() {
        let (pool, section_id) = seeded().await;
        let link = create(&pool, new_link(section_id, "A", 0)).await.unwrap();

        track_click(pool.clone(), link.id).await.unwrap();
        track_click(pool.clone(), 999).await.unwrap();

        assert_eq!(find_by_id(&pool, link.id).await.unwrap().clicks, 1);
    }
}
