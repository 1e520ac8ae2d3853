use std::sync::Arc;

use bigdecimal::BigDecimal;

use crate::domain::catalog::{Component, District, EquipmentCatalog};
use crate::domain::errors::DomainError;
use crate::domain::ports::CatalogRepository;

use super::json_store::JsonDocument;
use super::models::DistrictsDocument;

pub struct JsonCatalogRepository {
    districts: Arc<JsonDocument<DistrictsDocument>>,
    equipment: Arc<JsonDocument<EquipmentCatalog>>,
}

impl JsonCatalogRepository {
    pub fn new(
        districts: Arc<JsonDocument<DistrictsDocument>>,
        equipment: Arc<JsonDocument<EquipmentCatalog>>,
    ) -> Self {
        Self {
            districts,
            equipment,
        }
    }
}

impl CatalogRepository for JsonCatalogRepository {
    fn districts(&self) -> Result<Vec<District>, DomainError> {
        Ok(self.districts.load()?.districts)
    }

    fn find_district(&self, id: u32) -> Result<Option<District>, DomainError> {
        Ok(self.districts()?.into_iter().find(|d| d.id == id))
    }

    fn equipment(&self) -> Result<EquipmentCatalog, DomainError> {
        self.equipment.load()
    }

    fn update_district_base_price(
        &self,
        id: u32,
        price: BigDecimal,
    ) -> Result<District, DomainError> {
        self.districts.update(|doc| {
            let district = doc
                .districts
                .iter_mut()
                .find(|d| d.id == id)
                .ok_or_else(|| DomainError::not_found(format!("District {}", id)))?;
            district.base_price = price;
            Ok(district.clone())
        })
    }

    fn update_component_price(
        &self,
        category_id: &str,
        component_id: &str,
        price: BigDecimal,
    ) -> Result<Component, DomainError> {
        self.equipment.update(|catalog| {
            let category = catalog
                .categories
                .iter_mut()
                .find(|c| c.id == category_id)
                .ok_or_else(|| {
                    DomainError::not_found(format!("Equipment category '{}'", category_id))
                })?;
            let component = category
                .components
                .iter_mut()
                .find(|c| c.id == component_id)
                .ok_or_else(|| {
                    DomainError::not_found(format!(
                        "Component '{}' in category '{}'",
                        component_id, category_id
                    ))
                })?;
            component.price = price;
            Ok(component.clone())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::infrastructure::models::DataStore;

    const DISTRICTS: &str = r#"{
        "districts": [
            {
                "id": 1,
                "name": "Север",
                "base_price": 500,
                "depths": [30, 50],
                "ground_bands": [
                    {"name": "Песок", "min_depth": 40, "max_depth": 60, "price_per_meter": 450}
                ]
            }
        ]
    }"#;

    const EQUIPMENT: &str = r#"{
        "categories": [
            {"id": "adapter", "name": "Адаптер", "components": [
                {"id": "pump", "name": "Насос", "price": 3000}
            ]}
        ]
    }"#;

    fn setup() -> (tempfile::TempDir, JsonCatalogRepository) {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("districts.json"), DISTRICTS).expect("seed districts");
        fs::write(dir.path().join("equipment.json"), EQUIPMENT).expect("seed equipment");
        let store = DataStore::open(dir.path());
        (dir, JsonCatalogRepository::new(store.districts, store.equipment))
    }

    #[test]
    fn reads_seeded_reference_data() {
        let (_dir, repo) = setup();

        let district = repo.find_district(1).expect("find").expect("district 1");
        assert_eq!(district.base_price, BigDecimal::from(500));
        assert_eq!(district.ground_bands.len(), 1);
        assert!(repo.find_district(99).expect("find").is_none());

        let catalog = repo.equipment().expect("equipment");
        assert_eq!(catalog.categories[0].components[0].name, "Насос");
    }

    #[test]
    fn missing_files_mean_empty_catalog() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DataStore::open(dir.path());
        let repo = JsonCatalogRepository::new(store.districts, store.equipment);

        assert!(repo.districts().expect("districts").is_empty());
        assert!(repo.equipment().expect("equipment").categories.is_empty());
    }

    #[test]
    fn base_price_update_is_persisted() {
        let (_dir, repo) = setup();

        let updated = repo
            .update_district_base_price(1, BigDecimal::from(550))
            .expect("update");

        assert_eq!(updated.base_price, BigDecimal::from(550));
        assert_eq!(
            repo.find_district(1).unwrap().unwrap().base_price,
            BigDecimal::from(550)
        );
    }

    #[test]
    fn unknown_district_is_not_found() {
        let (_dir, repo) = setup();

        let result = repo.update_district_base_price(99, BigDecimal::from(1));
        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }

    #[test]
    fn component_price_update_is_persisted() {
        let (_dir, repo) = setup();

        repo.update_component_price("adapter", "pump", BigDecimal::from(3200))
            .expect("update");

        let catalog = repo.equipment().unwrap();
        assert_eq!(
            catalog.category("adapter").unwrap().component("pump").unwrap().price,
            BigDecimal::from(3200)
        );
    }

    #[test]
    fn unknown_category_or_component_is_not_found() {
        let (_dir, repo) = setup();

        assert!(matches!(
            repo.update_component_price("caisson", "pump", BigDecimal::from(1)),
            Err(DomainError::NotFound(_))
        ));
        assert!(matches!(
            repo.update_component_price("adapter", "valve", BigDecimal::from(1)),
            Err(DomainError::NotFound(_))
        ));
    }
}
