use bigdecimal::{BigDecimal, Zero};

use crate::domain::catalog::{Component, District, EquipmentCatalog};
use crate::domain::errors::DomainError;
use crate::domain::ports::CatalogRepository;

/// Read and reprice the reference data behind the ordering flow.
pub struct CatalogService<C> {
    repo: C,
}

impl<C: CatalogRepository> CatalogService<C> {
    pub fn new(repo: C) -> Self {
        Self { repo }
    }

    pub fn districts(&self) -> Result<Vec<District>, DomainError> {
        self.repo.districts()
    }

    pub fn equipment(&self) -> Result<EquipmentCatalog, DomainError> {
        self.repo.equipment()
    }

    pub fn set_district_base_price(
        &self,
        id: u32,
        price: BigDecimal,
    ) -> Result<District, DomainError> {
        check_price(&price)?;
        let district = self.repo.update_district_base_price(id, price)?;
        log::info!("District {} base price set to {}", district.id, district.base_price);
        Ok(district)
    }

    pub fn set_component_price(
        &self,
        category_id: &str,
        component_id: &str,
        price: BigDecimal,
    ) -> Result<Component, DomainError> {
        check_price(&price)?;
        let component = self
            .repo
            .update_component_price(category_id, component_id, price)?;
        log::info!(
            "Component {}/{} price set to {}",
            category_id,
            component.id,
            component.price
        );
        Ok(component)
    }
}

fn check_price(price: &BigDecimal) -> Result<(), DomainError> {
    if *price < BigDecimal::zero() {
        return Err(DomainError::InvalidInput(format!(
            "price must not be negative, got {}",
            price
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct StubCatalog {
        base_price_updates: Mutex<Vec<(u32, BigDecimal)>>,
    }

    impl CatalogRepository for StubCatalog {
        fn districts(&self) -> Result<Vec<District>, DomainError> {
            Ok(vec![])
        }

        fn find_district(&self, _id: u32) -> Result<Option<District>, DomainError> {
            Ok(None)
        }

        fn equipment(&self) -> Result<EquipmentCatalog, DomainError> {
            Ok(EquipmentCatalog::default())
        }

        fn update_district_base_price(
            &self,
            id: u32,
            price: BigDecimal,
        ) -> Result<District, DomainError> {
            self.base_price_updates.lock().unwrap().push((id, price.clone()));
            Ok(District {
                id,
                name: "Север".to_string(),
                base_price: price,
                depths: vec![],
                ground_bands: vec![],
            })
        }

        fn update_component_price(
            &self,
            category_id: &str,
            _component_id: &str,
            _price: BigDecimal,
        ) -> Result<Component, DomainError> {
            Err(DomainError::not_found(category_id))
        }
    }

    fn service() -> CatalogService<StubCatalog> {
        CatalogService::new(StubCatalog {
            base_price_updates: Mutex::new(vec![]),
        })
    }

    #[test]
    fn negative_price_is_rejected_before_touching_the_store() {
        let service = service();

        let result = service.set_district_base_price(1, BigDecimal::from(-5));

        assert!(matches!(result, Err(DomainError::InvalidInput(_))));
        assert!(service.repo.base_price_updates.lock().unwrap().is_empty());
    }

    #[test]
    fn valid_price_is_forwarded() {
        let service = service();

        let district = service
            .set_district_base_price(3, BigDecimal::from(610))
            .expect("update");

        assert_eq!(district.base_price, BigDecimal::from(610));
        assert_eq!(service.repo.base_price_updates.lock().unwrap().len(), 1);
    }

    #[test]
    fn not_found_propagates() {
        let result = service().set_component_price("ghost", "pump", BigDecimal::from(1));
        assert!(matches!(result, Err(DomainError::NotFound(_))));
    }
}
