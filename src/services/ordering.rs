//! Display-order conflict detection and two-phase swap.
//!
//! Sections share one global ordering; links are ordered within their section.
//! Moving an entity onto an occupied slot is refused with a [`SwapWarning`] unless
//! the caller confirms, in which case the occupant takes over the old slot.

use sqlx::{FromRow, SqliteConnection, sqlite::SqliteRow};
use tracing::info;

use super::SwapWarning;

pub trait Ordered: for<'r> FromRow<'r, SqliteRow> + Send + Unpin {
    const TABLE: &'static str;

    fn id(&self) -> i64;
    fn display_order(&self) -> i64;
    /// Column and value that partition the ordering, `None` when it is global.
    fn order_scope(&self) -> Option<(&'static str, i64)>;
    fn display_name(&self) -> &str;
}

/// Resolves a request to move `current` to `new_order`.
///
/// Returns a warning when the slot is taken and the swap was not confirmed; nothing
/// is written then. With confirmation the conflicting row is moved to `current`'s
/// old order and the caller still has to write the new order for `current` on the
/// same connection.
pub async fn resolve_order_change<T: Ordered>(
    conn: &mut SqliteConnection,
    current: &T,
    new_order: i64,
    confirm_swap: bool,
) -> sqlx::Result<Option<SwapWarning<T>>> {
    if new_order == current.display_order() {
        return Ok(None);
    }

    let Some(conflict) = find_conflict(conn, current, new_order).await? else {
        return Ok(None);
    };

    if !confirm_swap {
        return Ok(Some(SwapWarning {
            message: format!(
                "Display order {new_order} is already used by \"{}\". Confirm to swap orders.",
                conflict.display_name()
            ),
            current_order: current.display_order(),
            conflict_with: conflict,
        }));
    }

    let sql = format!(
        "UPDATE {} SET display_order = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
        T::TABLE
    );
    sqlx::query(&sql)
        .bind(current.display_order())
        .bind(conflict.id())
        .execute(&mut *conn)
        .await?;

    info!(
        table = T::TABLE,
        id = current.id(),
        with_id = conflict.id(),
        from = current.display_order(),
        to = new_order,
        "swapped display order"
    );

    Ok(None)
}

async fn find_conflict<T: Ordered>(
    conn: &mut SqliteConnection,
    current: &T,
    new_order: i64,
) -> sqlx::Result<Option<T>> {
    match current.order_scope() {
        Some((column, scope_id)) => {
            let sql = format!(
                "SELECT * FROM {} WHERE {column} = ? AND display_order = ? AND id != ? ORDER BY id LIMIT 1",
                T::TABLE
            );
            sqlx::query_as::<_, T>(&sql)
                .bind(scope_id)
                .bind(new_order)
                .bind(current.id())
                .fetch_optional(&mut *conn)
                .await
        }
        None => {
            let sql = format!(
                "SELECT * FROM {} WHERE display_order = ? AND id != ? ORDER BY id LIMIT 1",
                T::TABLE
            );
            sqlx::query_as::<_, T>(&sql)
                .bind(new_order)
                .bind(current.id())
                .fetch_optional(&mut *conn)
                .await
        }
    }
}
