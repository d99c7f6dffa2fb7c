use sqlx::{SqliteConnection, SqlitePool};
use tracing::error;

use crate::{db, models::Section, utils::validation::ValidationError};

use super::{
    Deleted, ServiceError, Updated,
    ordering::{Ordered, resolve_order_change},
    patch::FieldPatch,
};

const SLUG_TAKEN: &str = "A section with this slug already exists";

impl Ordered for Section {
    const TABLE: &'static str = "sections";

    fn id(&self) -> i64 {
        self.id
    }

    fn display_order(&self) -> i64 {
        self.display_order
    }

    fn order_scope(&self) -> Option<(&'static str, i64)> {
        None
    }

    fn display_name(&self) -> &str {
        &self.title
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SectionPatch {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub show_in_main: Option<bool>,
    pub display_order: Option<i64>,
    pub description: Option<Option<String>>,
    pub profile_initial: Option<Option<String>>,
    pub profile_image_url: Option<Option<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSection {
    pub title: String,
    pub slug: String,
    pub show_in_main: bool,
    pub display_order: i64,
    pub description: Option<String>,
    pub profile_initial: Option<String>,
    pub profile_image_url: Option<String>,
}

impl TryFrom<SectionPatch> for NewSection {
    type Error = ValidationError;

    fn try_from(patch: SectionPatch) -> Result<Self, Self::Error> {
        let (Some(title), Some(slug)) = (patch.title, patch.slug) else {
            return Err(ValidationError("Title and slug are required"));
        };

        Ok(Self {
            title,
            slug,
            show_in_main: patch.show_in_main.unwrap_or(true),
            display_order: patch.display_order.unwrap_or(0),
            description: patch.description.flatten(),
            profile_initial: patch.profile_initial.flatten(),
            profile_image_url: patch.profile_image_url.flatten(),
        })
    }
}

pub async fn find_all(pool: &SqlitePool, main_only: bool) -> Result<Vec<Section>, ServiceError> {
    let sql = if main_only {
        "SELECT * FROM sections WHERE show_in_main = 1 ORDER BY display_order ASC, id ASC"
    } else {
        "SELECT * FROM sections ORDER BY display_order ASC, id ASC"
    };

    sqlx::query_as::<_, Section>(sql)
        .fetch_all(pool)
        .await
        .map_err(ServiceError::database("Failed to fetch sections"))
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Section, ServiceError> {
    let mut conn = pool
        .acquire()
        .await
        .map_err(ServiceError::database("Failed to fetch section"))?;
    fetch_by_id(&mut conn, id)
        .await
        .map_err(ServiceError::database("Failed to fetch section"))?
        .ok_or(ServiceError::NotFound("Section not found"))
}

/// Public-page lookup: storage failures are logged and read as "not found".
pub async fn get_by_slug(pool: &SqlitePool, slug: &str) -> Option<Section> {
    sqlx::query_as::<_, Section>("SELECT * FROM sections WHERE slug = ?")
        .bind(slug)
        .fetch_optional(pool)
        .await
        .unwrap_or_else(|err| {
            error!(?err, slug, "failed to fetch section by slug");
            None
        })
}

/// Sections shown on the home page; empty on storage failure.
pub async fn get_visible(pool: &SqlitePool) -> Vec<Section> {
    find_all(pool, true).await.unwrap_or_else(|err| {
        error!(?err, "failed to fetch main sections");
        Vec::new()
    })
}

pub async fn create(pool: &SqlitePool, data: NewSection) -> Result<Section, ServiceError> {
    let map_db = || ServiceError::database("Failed to create section");
    let mut tx = pool.begin().await.map_err(map_db())?;

    let insert = sqlx::query(
        "INSERT INTO sections (title, slug, show_in_main, display_order, description, profile_initial, profile_image_url)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&data.title)
    .bind(&data.slug)
    .bind(data.show_in_main)
    .bind(data.display_order)
    .bind(&data.description)
    .bind(&data.profile_initial)
    .bind(&data.profile_image_url)
    .execute(&mut *tx)
    .await
    .map_err(|err| {
        if err
            .as_database_error()
            .is_some_and(|db_err| db_err.is_unique_violation())
        {
            ServiceError::BadRequest(SLUG_TAKEN.to_string())
        } else {
            map_db()(err)
        }
    })?;

    let created = fetch_by_id(&mut tx, insert.last_insert_rowid())
        .await
        .map_err(map_db())?
        .ok_or(ServiceError::NotFound("Section not found"))?;

    tx.commit().await.map_err(map_db())?;
    Ok(created)
}

pub async fn update(
    pool: &SqlitePool,
    id: i64,
    patch: SectionPatch,
    confirm_swap: bool,
) -> Result<Updated<Section>, ServiceError> {
    let map_db = || ServiceError::database("Failed to update section");
    let mut tx = pool.begin().await.map_err(map_db())?;

    if !db::lock_row(&mut tx, Section::TABLE, id).await.map_err(map_db())? {
        return Err(ServiceError::NotFound("Section not found"));
    }
    let existing = fetch_by_id(&mut tx, id)
        .await
        .map_err(map_db())?
        .ok_or(ServiceError::NotFound("Section not found"))?;

    if let Some(slug) = patch.slug.as_deref()
        && slug != existing.slug
        && slug_in_use(&mut tx, slug, Some(id)).await.map_err(map_db())?
    {
        return Err(ServiceError::BadRequest(SLUG_TAKEN.to_string()));
    }

    if let Some(new_order) = patch.display_order
        && let Some(warning) =
            resolve_order_change(&mut tx, &existing, new_order, confirm_swap)
                .await
                .map_err(map_db())?
    {
        return Ok(Updated::NeedsConfirmation(warning));
    }

    let written = FieldPatch::new("sections")
        .text("title", patch.title)
        .text("slug", patch.slug)
        .flag("show_in_main", patch.show_in_main)
        .int("display_order", patch.display_order)
        .nullable_text("description", patch.description)
        .nullable_text("profile_initial", patch.profile_initial)
        .nullable_text("profile_image_url", patch.profile_image_url)
        .execute(&mut tx, id)
        .await
        .map_err(map_db())?;

    if written == 0 {
        return Err(ServiceError::BadRequest("No fields to update".to_string()));
    }

    let updated = fetch_by_id(&mut tx, id)
        .await
        .map_err(map_db())?
        .ok_or(ServiceError::NotFound("Section not found"))?;
    tx.commit().await.map_err(map_db())?;

    Ok(Updated::Applied(updated))
}

/// Removes the section; its links go with it through the foreign key cascade.
pub async fn delete(pool: &SqlitePool, id: i64) -> Result<Deleted, ServiceError> {
    let result = sqlx::query("DELETE FROM sections WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .map_err(ServiceError::database("Failed to delete section"))?;

    if result.rows_affected() == 0 {
        return Err(ServiceError::NotFound("Section not found"));
    }

    Ok(Deleted { deleted: true })
}

async fn fetch_by_id(
    conn: &mut SqliteConnection,
    id: i64,
) -> sqlx::Result<Option<Section>> {
    sqlx::query_as::<_, Section>("SELECT * FROM sections WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
}

async fn slug_in_use(
    conn: &mut SqliteConnection,
    slug: &str,
    except_id: Option<i64>,
) -> sqlx::Result<bool> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM sections WHERE slug = ? AND id != ?)",
    )
    .bind(slug)
    .bind(except_id.unwrap_or(-1))
    .fetch_one(&mut *conn)
    .await
}
