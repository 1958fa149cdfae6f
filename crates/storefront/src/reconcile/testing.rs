//! In-memory backend for reconciler tests.
//!
//! Behaves like the marketplace API, records every call, and lets tests fail
//! or hold individual operations.

#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use just_mart_core::{
    CartLineRef, Email, ListingDraft, Order, OrderDraft, OrderId, OrderStatus, Price, Product,
    ProductId, Profile, WishlistEntryRef,
};
use tokio::sync::Semaphore;

use crate::api::{ApiError, MarketApi};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Op {
    GetProduct,
    ListProducts,
    CreateProduct,
    DeleteProduct,
    UpdateProfile,
    ReadCart,
    AddCart,
    UpdateCart,
    RemoveCart,
    ClearCart,
    ReadWishlist,
    AddWishlist,
    RemoveWishlist,
    ListOrders,
    CreateOrder,
}

#[derive(Default)]
struct FakeState {
    products: HashMap<ProductId, Product>,
    carts: HashMap<Email, Vec<CartLineRef>>,
    wishlists: HashMap<Email, Vec<ProductId>>,
    orders: Vec<Order>,
    profiles: HashMap<Email, Profile>,
    failing: HashSet<Op>,
    failing_removals: HashSet<ProductId>,
    calls: Vec<Op>,
}

#[derive(Default)]
pub(crate) struct FakeMarket {
    state: Mutex<FakeState>,
    holds: Mutex<HashMap<Op, Arc<Semaphore>>>,
}

pub(crate) fn id(s: &str) -> ProductId {
    ProductId::parse(s).unwrap()
}

pub(crate) fn email(s: &str) -> Email {
    Email::parse(s).unwrap()
}

pub(crate) fn product(s: &str, price: u64) -> Product {
    Product::new(id(s), format!("Listing {s}"), Price::from_taka(price))
}

/// Yield until `condition` holds, failing the test after two seconds.
pub(crate) async fn eventually(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();
}

impl FakeMarket {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn with<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub(crate) fn add_product(&self, product: Product) {
        self.with(|s| {
            s.products.insert(product.product_id.clone(), product);
        });
    }

    pub(crate) fn set_cart(&self, owner: &Email, lines: &[(&str, u32)]) {
        self.with(|s| {
            s.carts.insert(
                owner.clone(),
                lines
                    .iter()
                    .map(|(p, quantity)| CartLineRef {
                        product_id: id(p),
                        quantity: *quantity,
                    })
                    .collect(),
            );
        });
    }

    pub(crate) fn set_wishlist(&self, owner: &Email, ids: &[&str]) {
        self.with(|s| {
            s.wishlists
                .insert(owner.clone(), ids.iter().map(|p| id(p)).collect());
        });
    }

    pub(crate) fn cart_of(&self, owner: &Email) -> Vec<(String, u32)> {
        self.with(|s| {
            s.carts
                .get(owner)
                .map(|lines| {
                    lines
                        .iter()
                        .map(|l| (l.product_id.to_string(), l.quantity))
                        .collect()
                })
                .unwrap_or_default()
        })
    }

    pub(crate) fn wishlist_of(&self, owner: &Email) -> Vec<String> {
        self.with(|s| {
            s.wishlists
                .get(owner)
                .map(|ids| ids.iter().map(ToString::to_string).collect())
                .unwrap_or_default()
        })
    }

    pub(crate) fn profile_of(&self, owner: &Email) -> Option<Profile> {
        self.with(|s| s.profiles.get(owner).cloned())
    }

    pub(crate) fn orders(&self) -> Vec<Order> {
        self.with(|s| s.orders.clone())
    }

    pub(crate) fn fail(&self, op: Op) {
        self.with(|s| {
            s.failing.insert(op);
        });
    }

    pub(crate) fn recover(&self, op: Op) {
        self.with(|s| {
            s.failing.remove(&op);
        });
    }

    /// Fail wishlist removals of one product only.
    pub(crate) fn fail_removal_of(&self, product: &str) {
        self.with(|s| {
            s.failing_removals.insert(id(product));
        });
    }

    pub(crate) fn calls(&self, op: Op) -> usize {
        self.with(|s| s.calls.iter().filter(|c| **c == op).count())
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.with(|s| s.calls.len())
    }

    /// Block `op` until `release` is called.
    pub(crate) fn hold(&self, op: Op) {
        self.holds
            .lock()
            .unwrap()
            .insert(op, Arc::new(Semaphore::new(0)));
    }

    /// Let `permits` held calls of `op` proceed.
    pub(crate) fn release(&self, op: Op, permits: usize) {
        if let Some(gate) = self.holds.lock().unwrap().get(&op) {
            gate.add_permits(permits);
        }
    }

    async fn checkpoint(&self, op: Op) -> Result<(), ApiError> {
        self.with(|s| s.calls.push(op));
        let gate = self.holds.lock().unwrap().get(&op).cloned();
        if let Some(gate) = gate {
            gate.acquire().await.unwrap().forget();
        }
        if self.with(|s| s.failing.contains(&op)) {
            return Err(ApiError::Status {
                status: 503,
                body: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

impl MarketApi for FakeMarket {
    async fn get_product(&self, product_id: &ProductId) -> Result<Product, ApiError> {
        self.checkpoint(Op::GetProduct).await?;
        self.with(|s| s.products.get(product_id).cloned())
            .ok_or_else(|| ApiError::NotFound(product_id.to_string()))
    }

    async fn list_products(&self) -> Result<Vec<Product>, ApiError> {
        self.checkpoint(Op::ListProducts).await?;
        Ok(self.with(|s| s.products.values().cloned().collect()))
    }

    async fn list_categories(&self) -> Result<Vec<String>, ApiError> {
        Ok(self.with(|s| {
            let mut categories: Vec<String> = s
                .products
                .values()
                .filter_map(|p| p.category.clone())
                .collect();
            categories.sort();
            categories.dedup();
            categories
        }))
    }

    async fn create_product(&self, draft: &ListingDraft) -> Result<ProductId, ApiError> {
        self.checkpoint(Op::CreateProduct).await?;
        Ok(self.with(|s| {
            let product_id = id(&format!("l-{}", s.products.len() + 1));
            let listing = &draft.listing;
            let mut product = Product::new(product_id.clone(), &listing.title, listing.price);
            product.category = Some(listing.category.clone());
            product.seller_email = Some(draft.seller_email.clone());
            product.seller_name = Some(draft.seller_name.clone());
            s.products.insert(product_id.clone(), product);
            product_id
        }))
    }

    async fn delete_product(&self, product_id: &ProductId) -> Result<(), ApiError> {
        self.checkpoint(Op::DeleteProduct).await?;
        self.with(|s| s.products.remove(product_id))
            .map(drop)
            .ok_or_else(|| ApiError::NotFound(product_id.to_string()))
    }

    async fn get_profile(&self, owner: &Email) -> Result<Option<Profile>, ApiError> {
        Ok(self.profile_of(owner))
    }

    async fn update_profile(&self, owner: &Email, profile: &Profile) -> Result<(), ApiError> {
        self.checkpoint(Op::UpdateProfile).await?;
        self.with(|s| {
            s.profiles.insert(owner.clone(), profile.clone());
        });
        Ok(())
    }

    async fn read_cart(&self, owner: &Email) -> Result<Vec<CartLineRef>, ApiError> {
        self.checkpoint(Op::ReadCart).await?;
        Ok(self.with(|s| s.carts.get(owner).cloned().unwrap_or_default()))
    }

    async fn add_cart_item(&self, owner: &Email, item: &CartLineRef) -> Result<(), ApiError> {
        self.checkpoint(Op::AddCart).await?;
        self.with(|s| {
            let lines = s.carts.entry(owner.clone()).or_default();
            match lines.iter_mut().find(|l| l.product_id == item.product_id) {
                Some(line) => line.quantity += item.quantity,
                None => lines.push(item.clone()),
            }
        });
        Ok(())
    }

    async fn update_cart_item(
        &self,
        owner: &Email,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        self.checkpoint(Op::UpdateCart).await?;
        self.with(|s| {
            s.carts
                .get_mut(owner)
                .and_then(|lines| lines.iter_mut().find(|l| &l.product_id == product_id))
                .map(|line| line.quantity = quantity)
        })
        .ok_or_else(|| ApiError::NotFound(product_id.to_string()))
    }

    async fn remove_cart_item(&self, owner: &Email, product_id: &ProductId) -> Result<(), ApiError> {
        self.checkpoint(Op::RemoveCart).await?;
        self.with(|s| {
            if let Some(lines) = s.carts.get_mut(owner) {
                lines.retain(|l| &l.product_id != product_id);
            }
        });
        Ok(())
    }

    async fn clear_cart(&self, owner: &Email) -> Result<(), ApiError> {
        self.checkpoint(Op::ClearCart).await?;
        self.with(|s| {
            s.carts.remove(owner);
        });
        Ok(())
    }

    async fn read_wishlist(&self, owner: &Email) -> Result<Vec<WishlistEntryRef>, ApiError> {
        self.checkpoint(Op::ReadWishlist).await?;
        Ok(self.with(|s| {
            s.wishlists
                .get(owner)
                .map(|ids| {
                    ids.iter()
                        .map(|p| WishlistEntryRef {
                            product_id: p.clone(),
                        })
                        .collect()
                })
                .unwrap_or_default()
        }))
    }

    async fn add_wishlist_item(&self, owner: &Email, product_id: &ProductId) -> Result<(), ApiError> {
        self.checkpoint(Op::AddWishlist).await?;
        self.with(|s| {
            let ids = s.wishlists.entry(owner.clone()).or_default();
            if !ids.contains(product_id) {
                ids.push(product_id.clone());
            }
        });
        Ok(())
    }

    async fn remove_wishlist_item(
        &self,
        owner: &Email,
        product_id: &ProductId,
    ) -> Result<(), ApiError> {
        self.checkpoint(Op::RemoveWishlist).await?;
        if self.with(|s| s.failing_removals.contains(product_id)) {
            return Err(ApiError::Status {
                status: 500,
                body: "injected failure".to_string(),
            });
        }
        self.with(|s| {
            if let Some(ids) = s.wishlists.get_mut(owner) {
                ids.retain(|p| p != product_id);
            }
        });
        Ok(())
    }

    async fn list_orders(&self, owner: &Email) -> Result<Vec<Order>, ApiError> {
        self.checkpoint(Op::ListOrders).await?;
        Ok(self.with(|s| {
            s.orders
                .iter()
                .filter(|o| &o.email == owner)
                .cloned()
                .collect()
        }))
    }

    async fn create_order(&self, draft: &OrderDraft) -> Result<Order, ApiError> {
        self.checkpoint(Op::CreateOrder).await?;
        Ok(self.with(|s| {
            let order = Order {
                order_id: OrderId::parse(&format!("o-{}", s.orders.len() + 1)).unwrap(),
                email: draft.email.clone(),
                items: draft.items.clone(),
                total: draft.total,
                status: OrderStatus::Processing,
                delivery_address: Some(draft.delivery_address.clone()),
                created_at: Some(draft.created_at),
            };
            s.orders.push(order.clone());
            order
        }))
    }
}
