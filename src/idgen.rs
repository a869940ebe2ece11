use rand::Rng;
use sea_orm::{ConnectionTrait, EntityTrait};

use crate::{
    entity::{customers, orders},
    error::{AppError, AppResult},
};

const MAX_ATTEMPTS: usize = 50;

/// Entity table a generated identifier is checked against.
#[derive(Debug, Clone, Copy)]
pub enum IdKind {
    Customer,
    Order,
}

/// Draw an 8-digit numeric candidate. The first digit is 1-9, so the
/// string never carries a leading zero.
pub fn candidate() -> String {
    let n: u32 = rand::thread_rng().gen_range(10_000_000..100_000_000);
    n.to_string()
}

/// Allocate an identifier that is free in the target table.
///
/// The existence check is a fast path only; the primary-key constraint
/// stays the authoritative guard, and callers retry their insert on a
/// uniqueness violation.
pub async fn allocate<C>(conn: &C, kind: IdKind) -> AppResult<String>
where
    C: ConnectionTrait,
{
    allocate_with(conn, kind, candidate).await
}

pub async fn allocate_with<C, F>(conn: &C, kind: IdKind, mut draw: F) -> AppResult<String>
where
    C: ConnectionTrait,
    F: FnMut() -> String,
{
    for _ in 0..MAX_ATTEMPTS {
        let id = draw();
        let taken = match kind {
            IdKind::Customer => customers::Entity::find_by_id(id.clone())
                .one(conn)
                .await?
                .is_some(),
            IdKind::Order => orders::Entity::find_by_id(id.clone())
                .one(conn)
                .await?
                .is_some(),
        };
        if !taken {
            return Ok(id);
        }
    }
    Err(AppError::IdentifierSpaceExhausted)
}
