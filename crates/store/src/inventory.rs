//! Inventory ledger trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use common::TenantId;
use domain::{Product, ProductId};
use tokio::sync::RwLock;

use crate::error::LedgerError;

/// Trait for per-product stock accounting.
///
/// `try_decrement` is the concurrency-critical primitive of the whole
/// saga: it must be exclusive per product so that concurrent contenders
/// on the same stock counter serialize, while checkouts naming disjoint
/// products proceed fully in parallel.
#[async_trait]
pub trait InventoryLedger: Send + Sync {
    /// Adds a product to the catalog.
    async fn insert_product(&self, product: Product) -> Result<Product, LedgerError>;

    /// Looks up a product by ID across tenants.
    ///
    /// Tenant ownership is checked by the caller so a cross-tenant
    /// reference can be reported distinctly from a missing product.
    async fn find_product(&self, product_id: ProductId) -> Result<Option<Product>, LedgerError>;

    /// Lists a tenant's products.
    async fn list_products(&self, tenant_id: &TenantId) -> Result<Vec<Product>, LedgerError>;

    /// Exclusive check-and-decrement on one product's stock.
    ///
    /// Commits only when pre-decrement stock >= `quantity`; otherwise
    /// fails with [`LedgerError::InsufficientStock`] and leaves the
    /// counter unchanged. Returns the remaining stock.
    async fn try_decrement(
        &self,
        product_id: ProductId,
        tenant_id: &TenantId,
        quantity: u32,
    ) -> Result<u32, LedgerError>;

    /// Returns previously decremented stock after an aborted commit.
    ///
    /// Returns the stock after the restock.
    async fn restock(
        &self,
        product_id: ProductId,
        tenant_id: &TenantId,
        quantity: u32,
    ) -> Result<u32, LedgerError>;
}

/// In-memory inventory ledger.
///
/// Per-product exclusivity comes from an arena of per-key mutexes: the
/// outer map is read-locked only long enough to clone the product's
/// `Arc<Mutex<_>>`, then the check-and-decrement runs under that
/// product's own lock. Locks are never held across an await point and
/// never two at a time, so contending sagas cannot deadlock.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInventoryLedger {
    products: Arc<RwLock<HashMap<ProductId, Arc<Mutex<Product>>>>>,
}

impl InMemoryInventoryLedger {
    /// Creates a new empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current stock of a product, for assertions in tests
    /// and reconciliation tooling.
    pub async fn stock_of(&self, product_id: ProductId) -> Option<u32> {
        let products = self.products.read().await;
        products
            .get(&product_id)
            .map(|entry| entry.lock().unwrap().stock)
    }

    async fn entry(
        &self,
        product_id: ProductId,
        tenant_id: &TenantId,
    ) -> Result<Arc<Mutex<Product>>, LedgerError> {
        let products = self.products.read().await;
        let entry = products
            .get(&product_id)
            .ok_or(LedgerError::ProductNotFound { product_id })?;
        // Tenant scoping on the mutating paths: a product in another
        // tenant's catalog is indistinguishable from a missing one.
        if entry.lock().unwrap().tenant_id != *tenant_id {
            return Err(LedgerError::ProductNotFound { product_id });
        }
        Ok(Arc::clone(entry))
    }
}

#[async_trait]
impl InventoryLedger for InMemoryInventoryLedger {
    async fn insert_product(&self, product: Product) -> Result<Product, LedgerError> {
        let mut products = self.products.write().await;
        products.insert(product.id, Arc::new(Mutex::new(product.clone())));
        Ok(product)
    }

    async fn find_product(&self, product_id: ProductId) -> Result<Option<Product>, LedgerError> {
        let products = self.products.read().await;
        Ok(products
            .get(&product_id)
            .map(|entry| entry.lock().unwrap().clone()))
    }

    async fn list_products(&self, tenant_id: &TenantId) -> Result<Vec<Product>, LedgerError> {
        let products = self.products.read().await;
        let mut listed: Vec<Product> = products
            .values()
            .map(|entry| entry.lock().unwrap().clone())
            .filter(|p| &p.tenant_id == tenant_id)
            .collect();
        listed.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(listed)
    }

    async fn try_decrement(
        &self,
        product_id: ProductId,
        tenant_id: &TenantId,
        quantity: u32,
    ) -> Result<u32, LedgerError> {
        let entry = self.entry(product_id, tenant_id).await?;
        let mut product = entry.lock().unwrap();

        if product.stock < quantity {
            return Err(LedgerError::InsufficientStock {
                product_id,
                requested: quantity,
                available: product.stock,
            });
        }

        product.stock -= quantity;
        Ok(product.stock)
    }

    async fn restock(
        &self,
        product_id: ProductId,
        tenant_id: &TenantId,
        quantity: u32,
    ) -> Result<u32, LedgerError> {
        let entry = self.entry(product_id, tenant_id).await?;
        let mut product = entry.lock().unwrap();
        product.stock += quantity;
        Ok(product.stock)
    }
}
