//! Villa entity - Entità villa persistita nella tabella `villas`

use crate::core::StoreError;
use crate::repositories::{Column, Entity, FieldValue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default, sqlx::FromRow)]
pub struct Villa {
    pub id: i32,
    pub name: String,
    pub detail: String,
    pub image_url: String,
    pub occupancy: i32,
    pub rate: f64,
    /// metri quadrati
    pub area: i32,
    pub amenities: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VillaColumn {
    Name,
    Detail,
    ImageUrl,
    Occupancy,
    Rate,
    Area,
    Amenities,
    CreatedAt,
    UpdatedAt,
}

impl Column for VillaColumn {
    fn name(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Detail => "detail",
            Self::ImageUrl => "image_url",
            Self::Occupancy => "occupancy",
            Self::Rate => "rate",
            Self::Area => "area",
            Self::Amenities => "amenities",
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
        }
    }
}

const ALL_COLUMNS: [VillaColumn; 9] = [
    VillaColumn::Name,
    VillaColumn::Detail,
    VillaColumn::ImageUrl,
    VillaColumn::Occupancy,
    VillaColumn::Rate,
    VillaColumn::Area,
    VillaColumn::Amenities,
    VillaColumn::CreatedAt,
    VillaColumn::UpdatedAt,
];

// created_at viene scritto solo in creazione
const UPDATABLE_COLUMNS: [VillaColumn; 8] = [
    VillaColumn::Name,
    VillaColumn::Detail,
    VillaColumn::ImageUrl,
    VillaColumn::Occupancy,
    VillaColumn::Rate,
    VillaColumn::Area,
    VillaColumn::Amenities,
    VillaColumn::UpdatedAt,
];

impl Entity for Villa {
    type Column = VillaColumn;

    const TABLE: &'static str = "villas";
    const ID_COLUMN: &'static str = "id";

    fn id(&self) -> i32 {
        self.id
    }

    fn set_id(&mut self, id: i32) {
        self.id = id;
    }

    fn columns() -> &'static [VillaColumn] {
        &ALL_COLUMNS
    }

    fn updatable_columns() -> &'static [VillaColumn] {
        &UPDATABLE_COLUMNS
    }

    // uq_villas_name nello schema MySQL
    fn unique_columns() -> &'static [VillaColumn] {
        &[VillaColumn::Name]
    }

    fn field(&self, column: VillaColumn) -> FieldValue {
        match column {
            VillaColumn::Name => FieldValue::Text(self.name.clone()),
            VillaColumn::Detail => FieldValue::Text(self.detail.clone()),
            VillaColumn::ImageUrl => FieldValue::Text(self.image_url.clone()),
            VillaColumn::Occupancy => FieldValue::Int(i64::from(self.occupancy)),
            VillaColumn::Rate => FieldValue::Float(self.rate),
            VillaColumn::Area => FieldValue::Int(i64::from(self.area)),
            VillaColumn::Amenities => FieldValue::Text(self.amenities.clone()),
            VillaColumn::CreatedAt => FieldValue::Timestamp(self.created_at),
            VillaColumn::UpdatedAt => FieldValue::Timestamp(self.updated_at),
        }
    }

    fn set_field(&mut self, column: VillaColumn, value: FieldValue) -> Result<(), StoreError> {
        match (column, value) {
            (VillaColumn::Name, FieldValue::Text(v)) => self.name = v,
            (VillaColumn::Detail, FieldValue::Text(v)) => self.detail = v,
            (VillaColumn::ImageUrl, FieldValue::Text(v)) => self.image_url = v,
            (VillaColumn::Amenities, FieldValue::Text(v)) => self.amenities = v,
            (VillaColumn::Occupancy, FieldValue::Int(v)) => self.occupancy = to_i32(column, v)?,
            (VillaColumn::Area, FieldValue::Int(v)) => self.area = to_i32(column, v)?,
            (VillaColumn::Rate, FieldValue::Float(v)) => self.rate = v,
            (VillaColumn::CreatedAt, FieldValue::Timestamp(v)) => self.created_at = v,
            (VillaColumn::UpdatedAt, FieldValue::Timestamp(v)) => self.updated_at = v,
            (column, value) => {
                return Err(StoreError::Constraint(format!(
                    "value {:?} does not fit column '{}'",
                    value,
                    column.name()
                )));
            }
        }
        Ok(())
    }
}

fn to_i32(column: VillaColumn, value: i64) -> Result<i32, StoreError> {
    i32::try_from(value).map_err(|_| {
        StoreError::Constraint(format!(
            "value {} out of range for column '{}'",
            value,
            column.name()
        ))
    })
}
