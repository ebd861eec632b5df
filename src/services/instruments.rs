use chrono::Utc;
use sea_orm::{DatabaseConnection, EntityTrait};
use uuid::Uuid;

use crate::{entities::instrument, errors::ServiceError};

/// Calibration verdict from the instrument registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationStatus {
    Valid,
    Overdue,
}

/// Looks up an instrument and reports whether its calibration is current.
/// An overdue instrument hard-blocks first-piece QC regardless of the
/// measurement values.
pub async fn calibration_status(
    db: &DatabaseConnection,
    instrument_id: Uuid,
) -> Result<CalibrationStatus, ServiceError> {
    let instrument = instrument::Entity::find_by_id(instrument_id)
        .one(db)
        .await
        .map_err(ServiceError::db_error)?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("Instrument {} not found", instrument_id))
        })?;

    if instrument.is_calibration_overdue(Utc::now().date_naive()) {
        Ok(CalibrationStatus::Overdue)
    } else {
        Ok(CalibrationStatus::Valid)
    }
}
