use serde::{Deserialize, Serialize};

/// A single line in the shopping cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: u32,
    /// Unit price at the time the item was added.
    pub price: f64,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl CartItem {
    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

/// The user's shopping cart as returned by `GET /carts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: i64,
    pub user_id: i64,
    #[serde(default)]
    pub items: Vec<CartItem>,
    /// Server-computed total. The server owns pricing; `subtotal` is only
    /// a display-side recomputation over the lines it sent.
    pub total_amount: f64,
}

impl Cart {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Sum of line totals across the cart.
    pub fn subtotal(&self) -> f64 {
        self.items.iter().map(CartItem::line_total).sum()
    }
}
