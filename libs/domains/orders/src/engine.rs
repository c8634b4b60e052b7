//! Order building and stock validation.
//!
//! Everything here is pure: repositories read the requested products (and
//! lock them), hand them to [`prepare`], and only write when it succeeds.

use axum_helpers::FieldErrors;
use domain_products::Product;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use crate::models::{OrderProduct, Placement, ProductOrderLine};

/// A validated line item, carrying the product as read in the transaction
#[derive(Debug, Clone, PartialEq)]
pub struct PendingPlacement {
    pub product: Product,
    pub quantity: i32,
}

/// Output of [`prepare`]: what to insert and how much stock to take
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedOrder {
    pub placements: Vec<PendingPlacement>,
    pub total: Decimal,
    /// Units to take per product, ordered by product id
    pub demand: BTreeMap<Uuid, i32>,
}

impl PreparedOrder {
    pub fn placements(&self) -> Vec<Placement> {
        self.placements
            .iter()
            .map(|p| Placement {
                product_id: p.product.id,
                quantity: p.quantity,
            })
            .collect()
    }

    /// Distinct products in request order, with stock after the decrement
    pub fn products_after_decrement(&self) -> Vec<OrderProduct> {
        let mut products: Vec<OrderProduct> = Vec::new();
        for placement in &self.placements {
            if products.iter().any(|p| p.id == placement.product.id) {
                continue;
            }
            let mut product = placement.product.clone();
            product.quantity -= self.demand.get(&product.id).copied().unwrap_or(0);
            products.push(product.into());
        }
        products
    }
}

/// Distinct parsable product ids of a request, sorted for lock ordering
pub fn requested_ids(lines: &[ProductOrderLine]) -> Vec<Uuid> {
    let mut ids: Vec<Uuid> = lines
        .iter()
        .filter_map(ProductOrderLine::parsed_product_id)
        .collect();
    ids.sort();
    ids.dedup();
    ids
}

/// Turn requested lines into placements, one per line.
pub fn build_placements(
    lines: &[ProductOrderLine],
    products: &HashMap<Uuid, Product>,
) -> Result<Vec<PendingPlacement>, FieldErrors> {
    let mut errors = FieldErrors::new();

    if lines.is_empty() {
        errors.add("product_orders", "can't be blank");
        return Err(errors);
    }

    let mut placements = Vec::with_capacity(lines.len());
    for line in lines {
        let product = line
            .parsed_product_id()
            .and_then(|id| products.get(&id));

        let Some(product) = product else {
            errors.add(
                "product_id",
                format!("Product {} not found", line.product_id.trim()),
            );
            continue;
        };

        if line.quantity <= 0 {
            errors.add("quantity", "must be greater than 0");
            continue;
        }

        placements.push(PendingPlacement {
            product: product.clone(),
            quantity: line.quantity,
        });
    }

    errors.into_result().map(|()| placements)
}

/// Units requested per product, with duplicate lines summed
pub fn aggregate_demand(placements: &[PendingPlacement]) -> BTreeMap<Uuid, i64> {
    let mut demand = BTreeMap::new();
    for placement in placements {
        *demand.entry(placement.product.id).or_insert(0) += i64::from(placement.quantity);
    }
    demand
}

/// Check aggregated demand against stock; every shortfall is reported
/// under the product's title.
pub fn validate_stock(placements: &[PendingPlacement]) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    for (id, wanted) in aggregate_demand(placements) {
        let Some(product) = placements.iter().map(|p| &p.product).find(|p| p.id == id) else {
            continue;
        };
        if wanted > i64::from(product.quantity) {
            errors.add(
                product.title.clone(),
                format!("Insufficient stock: {} remaining", product.quantity),
            );
        }
    }

    errors.into_result()
}

/// Σ quantity × price
pub fn compute_total(placements: &[PendingPlacement]) -> Decimal {
    placements
        .iter()
        .map(|p| Decimal::from(p.quantity) * p.product.price)
        .sum()
}

/// Build, validate and total an order against the products read for it.
pub fn prepare(
    lines: &[ProductOrderLine],
    products: &HashMap<Uuid, Product>,
) -> Result<PreparedOrder, FieldErrors> {
    let placements = build_placements(lines, products)?;
    validate_stock(&placements)?;

    // validate_stock bounds every sum by an i32 stock level
    let demand = aggregate_demand(&placements)
        .into_iter()
        .map(|(id, units)| (id, units as i32))
        .collect();

    Ok(PreparedOrder {
        total: compute_total(&placements),
        placements,
        demand,
    })
}
