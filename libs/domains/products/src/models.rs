use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use pagination::{ListMeta, Page, PageRequest};

/// A product listed by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub title: String,
    /// Unit price, serialized as a decimal string
    #[schema(value_type = String, example = "19.99")]
    pub price: Decimal,
    /// Units in stock
    pub quantity: i32,
    pub published: bool,
    /// Owner
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn new(owner: Uuid, input: NewProduct) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            title: input.title,
            price: input.price,
            quantity: input.quantity,
            published: input.published,
            user_id: owner,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_changes(&mut self, changes: ProductChanges) {
        if let Some(title) = changes.title {
            self.title = title;
        }
        if let Some(price) = changes.price {
            self.price = price;
        }
        if let Some(quantity) = changes.quantity {
            self.quantity = quantity;
        }
        if let Some(published) = changes.published {
            self.published = published;
        }
        self.updated_at = Utc::now();
    }
}

/// Price as sent by a client: a JSON number or a numeric string.
///
/// Anything else is kept as text so validation can report
/// "is not a number" instead of rejecting the whole body.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PriceInput {
    Number(Decimal),
    Text(String),
}

impl PriceInput {
    pub fn to_decimal(&self) -> Option<Decimal> {
        match self {
            PriceInput::Number(price) => Some(*price),
            PriceInput::Text(raw) => Decimal::from_str(raw.trim()).ok(),
        }
    }
}

impl From<Decimal> for PriceInput {
    fn from(price: Decimal) -> Self {
        PriceInput::Number(price)
    }
}

fn validate_price(price: &PriceInput) -> Result<(), ValidationError> {
    match price.to_decimal() {
        None => Err(ValidationError::new("not_a_number").with_message("is not a number".into())),
        Some(price) if price < Decimal::ZERO => Err(
            ValidationError::new("greater_than_or_equal_to")
                .with_message("must be greater than or equal to 0".into()),
        ),
        Some(_) => Ok(()),
    }
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("can't be blank".into()));
    }
    Ok(())
}

/// Request body for creating a product
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CreateProduct {
    #[validate(
        required(message = "can't be blank"),
        custom(function = "validate_not_blank")
    )]
    #[schema(example = "Bamboo cutting board")]
    pub title: Option<String>,
    #[validate(
        required(message = "can't be blank"),
        custom(function = "validate_price")
    )]
    #[schema(value_type = Option<String>, example = "19.99")]
    pub price: Option<PriceInput>,
    #[validate(range(min = 0, message = "must be greater than or equal to 0"))]
    pub quantity: Option<i32>,
    pub published: Option<bool>,
}

/// Request body for updating a product; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProduct {
    #[validate(custom(function = "validate_not_blank"))]
    pub title: Option<String>,
    #[validate(custom(function = "validate_price"))]
    #[schema(value_type = Option<String>, example = "19.99")]
    pub price: Option<PriceInput>,
    #[validate(range(min = 0, message = "must be greater than or equal to 0"))]
    pub quantity: Option<i32>,
    pub published: Option<bool>,
}

/// Validated attributes of a product about to be stored
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub title: String,
    pub price: Decimal,
    pub quantity: i32,
    pub published: bool,
}

/// Validated partial update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductChanges {
    pub title: Option<String>,
    pub price: Option<Decimal>,
    pub quantity: Option<i32>,
    pub published: Option<bool>,
}

impl From<UpdateProduct> for ProductChanges {
    fn from(input: UpdateProduct) -> Self {
        Self {
            title: input.title.map(|t| t.trim().to_string()),
            price: input.price.as_ref().and_then(PriceInput::to_decimal),
            quantity: input.quantity,
            published: input.published,
        }
    }
}

/// Query string of `GET /products`.
///
/// Every filter is optional; values that do not parse are ignored rather
/// than rejected.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductQuery {
    /// Case-insensitive substring of the title
    pub keyword: Option<String>,
    /// Inclusive lower price bound
    pub min_price: Option<String>,
    /// Inclusive upper price bound
    pub max_price: Option<String>,
    /// Restrict to these ids; repeat the key (`product_ids=..&product_ids=..`)
    #[serde(default, alias = "product_ids[]")]
    #[param(value_type = Vec<Uuid>)]
    pub product_ids: Vec<String>,
    /// Any value but `false`/`0` sorts by last update, newest first
    #[param(value_type = Option<bool>)]
    pub recent: Option<String>,
    #[param(value_type = Option<i64>)]
    pub page: Option<String>,
    #[param(value_type = Option<i64>)]
    pub per_page: Option<String>,
}

/// Parsed search criteria; `None` means "no constraint"
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductSearch {
    pub keyword: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    /// Exact id set; ids that do not parse match nothing
    pub product_ids: Option<Vec<Uuid>>,
    pub recent: bool,
}

impl ProductSearch {
    /// Whether a product satisfies every filter
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(ids) = &self.product_ids {
            if !ids.contains(&product.id) {
                return false;
            }
        }
        if let Some(keyword) = &self.keyword {
            if !product.title.to_lowercase().contains(&keyword.to_lowercase()) {
                return false;
            }
        }
        if let Some(min) = self.min_price {
            if product.price < min {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if product.price > max {
                return false;
            }
        }
        true
    }

    /// Sort products in result order
    pub fn sort(&self, products: &mut [Product]) {
        if self.recent {
            products.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));
        } else {
            products.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        }
    }
}

impl ProductQuery {
    pub fn search(&self) -> ProductSearch {
        let parse_price = |raw: &Option<String>| {
            raw.as_deref()
                .and_then(|value| Decimal::from_str(value.trim()).ok())
        };

        ProductSearch {
            keyword: self
                .keyword
                .as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string),
            min_price: parse_price(&self.min_price),
            max_price: parse_price(&self.max_price),
            product_ids: (!self.product_ids.is_empty()).then(|| {
                self.product_ids
                    .iter()
                    .filter_map(|id| Uuid::parse_str(id.trim()).ok())
                    .collect()
            }),
            recent: self
                .recent
                .as_deref()
                .is_some_and(|v| !matches!(v.trim(), "false" | "0")),
        }
    }

    pub fn page_request(&self) -> PageRequest {
        PageRequest::from_raw(self.page.as_deref(), self.per_page.as_deref())
    }
}

/// Body of `GET /products`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductList {
    pub products: Vec<Product>,
    pub meta: ListMeta,
}

impl From<Page<Product>> for ProductList {
    fn from(page: Page<Product>) -> Self {
        Self {
            products: page.items,
            meta: page.meta.into(),
        }
    }
}
