use crate::application::ServiceDependencies;
use crate::domain::{
    patron::{Patron, PatronDetails},
    value_objects::PatronId,
};

use super::errors::{CatalogError, Result};

/// 全利用者を取得する
pub async fn list_patrons(deps: &ServiceDependencies) -> Result<Vec<Patron>> {
    deps.patron_repository
        .list()
        .await
        .map_err(CatalogError::PersistenceFailure)
}

/// IDで利用者を取得する
pub async fn get_patron(deps: &ServiceDependencies, patron_id: i64) -> Result<Patron> {
    let patron_id = PatronId::new(patron_id)?;

    deps.patron_repository
        .find_by_id(patron_id)
        .await
        .map_err(CatalogError::PersistenceFailure)?
        .ok_or(CatalogError::PatronNotFound)
}

pub async fn create_patron(deps: &ServiceDependencies, details: PatronDetails) -> Result<Patron> {
    let patron = deps
        .patron_repository
        .insert(details)
        .await
        .map_err(CatalogError::PersistenceFailure)?;

    tracing::info!(patron_id = %patron.id, "Patron created");
    Ok(patron)
}

pub async fn update_patron(
    deps: &ServiceDependencies,
    patron_id: i64,
    details: PatronDetails,
) -> Result<Patron> {
    let patron = Patron {
        id: PatronId::new(patron_id)?,
        details,
    };

    let updated = deps
        .patron_repository
        .update(&patron)
        .await
        .map_err(CatalogError::PersistenceFailure)?;

    if !updated {
        return Err(CatalogError::PatronNotFound);
    }

    tracing::info!(patron_id = %patron.id, "Patron updated");
    Ok(patron)
}

/// 利用者を削除する
///
/// 貸出記録から参照されている利用者は削除できない（`InUse`）。
pub async fn delete_patron(deps: &ServiceDependencies, patron_id: i64) -> Result<()> {
    let patron_id = PatronId::new(patron_id)?;

    let deleted = deps
        .patron_repository
        .delete(patron_id)
        .await
        .map_err(|e| {
            if e.is_foreign_key() {
                CatalogError::InUse("Patron has loan records and cannot be deleted".to_string())
            } else {
                CatalogError::PersistenceFailure(e)
            }
        })?;

    if !deleted {
        return Err(CatalogError::PatronNotFound);
    }

    tracing::info!(patron_id = %patron_id, "Patron deleted");
    Ok(())
}
