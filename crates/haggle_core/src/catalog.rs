//! Product and user records read by the negotiation engine
//!
//! These are the slices of the storefront's product and account documents
//! that negotiation needs: whether an item can be bargained over and at what
//! price, and whether the caller has an account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CoreError, Result};
use crate::id::{ProductId, UserId};

/// Catalog item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: ProductId,
    pub name: String,
    /// Current list price
    pub price: f64,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

impl Product {
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self {
            product_id: ProductId::generate(),
            name: name.into(),
            price,
            is_active: true,
            updated_at: Utc::now(),
        }
    }

    /// Change the list price. Sessions already open keep their own copy.
    pub fn reprice(&mut self, price: f64) {
        self.price = price;
        self.updated_at = Utc::now();
    }
}

/// Account holder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            user_id: UserId::generate(),
            name: name.into(),
            email: None,
            created_at: Utc::now(),
        }
    }
}

/// Products and users to load into a fresh store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub users: Vec<User>,
}

/// Load a catalog seed from a TOML file
pub async fn load_catalog(path: &Path) -> Result<CatalogSeed> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CoreError::Configuration {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

    toml::from_str(&content).map_err(|e| CoreError::Configuration {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[tokio::test]
    async fn test_load_catalog_from_toml() {
        let product = ProductId::generate();
        let user = UserId::generate();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[[products]]
product_id = "{product}"
name = "Walnut desk"
price = 100.0

[[products]]
product_id = "{other}"
name = "Retired lamp"
price = 40.0
is_active = false

[[users]]
user_id = "{user}"
name = "Sam"
"#,
            other = ProductId::generate(),
        )
        .unwrap();

        let seed = load_catalog(file.path()).await.unwrap();
        assert_eq!(seed.products.len(), 2);
        assert_eq!(seed.products[0].product_id, product);
        assert!(seed.products[0].is_active);
        assert!(!seed.products[1].is_active);
        assert_eq!(seed.users[0].user_id, user);
        assert_eq!(seed.users[0].email, None);
    }

    #[tokio::test]
    async fn test_missing_catalog_is_configuration_error() {
        let err = load_catalog(Path::new("/nonexistent/catalog.toml"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Configuration { .. }));
    }

    #[test]
    fn test_reprice_updates_timestamp() {
        let mut p = Product::new("Chair", 50.0);
        let before = p.updated_at;
        p.reprice(65.0);
        assert_eq!(p.price, 65.0);
        assert!(p.updated_at >= before);
    }
}
