//! Villa DTOs - Data Transfer Objects per ville
//!
//! Il mapping con l'entity avviene solo qui: `From<Villa>` verso il client,
//! `into_entity` verso lo store.

use crate::entities::Villa;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Struct per gestire io col client
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VillaDTO {
    pub id: i32,
    pub name: String,
    pub detail: String,
    pub image_url: String,
    pub occupancy: i32,
    pub rate: f64,
    pub area: i32,
    pub amenities: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Villa> for VillaDTO {
    fn from(value: Villa) -> Self {
        Self {
            id: value.id,
            name: value.name,
            detail: value.detail,
            image_url: value.image_url,
            occupancy: value.occupancy,
            rate: value.rate,
            area: value.area,
            amenities: value.amenities,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

/// DTO per creare una nuova villa (senza id e timestamp, assegnati dal server)
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateVillaDTO {
    #[validate(length(min = 1, max = 30, message = "Name must be between 1 and 30 characters"))]
    pub name: String,

    #[serde(default)]
    #[validate(length(max = 500, message = "Detail must be at most 500 characters"))]
    pub detail: String,

    #[serde(default)]
    #[validate(length(max = 255, message = "Image URL must be at most 255 characters"))]
    pub image_url: String,

    #[serde(default)]
    #[validate(range(min = 0, message = "Occupancy cannot be negative"))]
    pub occupancy: i32,

    #[validate(range(min = 0.0, message = "Rate cannot be negative"))]
    pub rate: f64,

    #[serde(default)]
    #[validate(range(min = 0, message = "Area cannot be negative"))]
    pub area: i32,

    #[serde(default)]
    #[validate(length(max = 500, message = "Amenities must be at most 500 characters"))]
    pub amenities: String,
}

impl CreateVillaDTO {
    /// L'id resta 0 finché lo store non ne assegna uno
    pub fn into_entity(self, now: DateTime<Utc>) -> Villa {
        Villa {
            id: 0,
            name: self.name,
            detail: self.detail,
            image_url: self.image_url,
            occupancy: self.occupancy,
            rate: self.rate,
            area: self.area,
            amenities: self.amenities,
            created_at: now,
            updated_at: now,
        }
    }
}

/// DTO per aggiornare una villa: stato completo, id compreso.
/// È anche la forma su cui si applicano le patch.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVillaDTO {
    pub id: i32,

    #[validate(length(min = 1, max = 30, message = "Name must be between 1 and 30 characters"))]
    pub name: String,

    #[serde(default)]
    #[validate(length(max = 500, message = "Detail must be at most 500 characters"))]
    pub detail: String,

    #[serde(default)]
    #[validate(length(max = 255, message = "Image URL must be at most 255 characters"))]
    pub image_url: String,

    #[serde(default)]
    #[validate(range(min = 0, message = "Occupancy cannot be negative"))]
    pub occupancy: i32,

    #[validate(range(min = 0.0, message = "Rate cannot be negative"))]
    pub rate: f64,

    #[serde(default)]
    #[validate(range(min = 0, message = "Area cannot be negative"))]
    pub area: i32,

    #[serde(default)]
    #[validate(length(max = 500, message = "Amenities must be at most 500 characters"))]
    pub amenities: String,
}

impl From<Villa> for UpdateVillaDTO {
    fn from(value: Villa) -> Self {
        Self {
            id: value.id,
            name: value.name,
            detail: value.detail,
            image_url: value.image_url,
            occupancy: value.occupancy,
            rate: value.rate,
            area: value.area,
            amenities: value.amenities,
        }
    }
}

impl UpdateVillaDTO {
    /// Lo store non riscrive `created_at` in update: il valore passato qui
    /// conta solo per chi usa l'entity in memoria.
    pub fn into_entity(self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Villa {
        Villa {
            id: self.id,
            name: self.name,
            detail: self.detail,
            image_url: self.image_url,
            occupancy: self.occupancy,
            rate: self.rate,
            area: self.area,
            amenities: self.amenities,
            created_at,
            updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_dto_only_requires_name_and_rate() {
        let dto: CreateVillaDTO =
            serde_json::from_value(json!({ "name": "Sunset Villa", "rate": 150 })).unwrap();

        assert!(dto.validate().is_ok());
        assert_eq!(dto.rate, 150.0);
        assert_eq!(dto.occupancy, 0);
        assert_eq!(dto.image_url, "");
    }

    #[test]
    fn test_create_dto_missing_rate_fails_to_parse() {
        let parsed: Result<CreateVillaDTO, _> =
            serde_json::from_value(json!({ "name": "No Rate" }));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_create_dto_validation() {
        let dto = CreateVillaDTO {
            name: "x".repeat(31),
            detail: String::new(),
            image_url: String::new(),
            occupancy: -1,
            rate: 10.0,
            area: 0,
            amenities: String::new(),
        };

        let errors = dto.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("occupancy"));
        assert!(!fields.contains_key("rate"));
    }

    #[test]
    fn test_create_dto_into_entity_stamps_both_timestamps() {
        let now = Utc::now();
        let dto: CreateVillaDTO =
            serde_json::from_value(json!({ "name": "Stamp", "rate": 1 })).unwrap();

        let villa = dto.into_entity(now);
        assert_eq!(villa.id, 0);
        assert_eq!(villa.created_at, now);
        assert_eq!(villa.updated_at, now);
    }

    #[test]
    fn test_update_dto_round_trips_entity_fields() {
        let villa = Villa {
            id: 5,
            name: "Casa".into(),
            rate: 70.0,
            area: 40,
            created_at: Utc::now(),
            ..Villa::default()
        };

        let dto = UpdateVillaDTO::from(villa.clone());
        let back = dto.into_entity(villa.created_at, villa.updated_at);
        assert_eq!(back, villa);
    }

    #[test]
    fn test_villa_dto_uses_camel_case() {
        let value = serde_json::to_value(VillaDTO::from(Villa {
            image_url: "a.png".into(),
            ..Villa::default()
        }))
        .unwrap();

        assert_eq!(value["imageUrl"], "a.png");
        assert!(value.get("createdAt").is_some());
        assert!(value.get("image_url").is_none());
    }
}
