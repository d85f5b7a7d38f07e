//! Message formatting.
//!
//! Converts a [`NotificationEvent`](crate::events::NotificationEvent)'s
//! entity snapshot into a [`MessagePayload`]: a plain-text fallback plus an
//! ordered sequence of typed Block Kit blocks. Formatting is deterministic
//! and side-effect free; all free-text fields pass through the sanitizer
//! before they are embedded in a block.

pub mod blocks;
pub mod sanitize;

pub use blocks::{Accessory, Block, Element, Text, TextKind};
pub use sanitize::sanitize_markdown;

use crate::events::{
    CustomerSnapshot, OrderSnapshot, PostSnapshot, ProductSnapshot, ReviewSnapshot,
};

/// A formatted message ready for delivery.
///
/// Produced fresh per send; never persisted. The thread handle is supplied
/// separately at delivery time.
#[derive(Debug, Clone)]
pub struct MessagePayload {
    /// Plain-text fallback (may be empty; the client substitutes a placeholder)
    pub text: String,
    /// Ordered block sequence (may be empty for text-only messages)
    pub blocks: Vec<Block>,
}

impl MessagePayload {
    fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            blocks: Vec::new(),
        }
    }
}

/// Decorative marker for an order total.
///
/// Ordered threshold ladder, highest first; each lower bound is exclusive,
/// so a total of exactly 500 falls into the next tier down.
pub fn order_value_emoji(total: f64) -> &'static str {
    if total > 500.0 {
        return "💎";
    }
    if total > 200.0 {
        return "🔥";
    }
    if total > 100.0 {
        return "💰";
    }
    "🛒"
}

/// Render a monetary amount with its currency symbol
pub fn money(currency: &str, amount: f64) -> String {
    let symbol = match currency {
        "USD" | "CAD" | "AUD" | "NZD" => "$",
        "EUR" => "€",
        "GBP" => "£",
        "JPY" => "¥",
        _ => return format!("{currency} {amount:.2}"),
    };
    format!("{symbol}{amount:.2}")
}

/// Build the new-order message: header, status/payment/customer summary,
/// address, coupons, line items, totals footer, admin link, and any
/// customer notes.
pub fn new_order(order: &OrderSnapshot) -> MessagePayload {
    let emoji = order_value_emoji(order.total);
    let number = if order.number.is_empty() {
        order.id.to_string()
    } else {
        order.number.clone()
    };

    let mut blocks = vec![
        Block::section(format!("{emoji} *New WooCommerce Order* #: *{number}*")),
        Block::section(format!(
            "*Status:* `{}`\n*Payment:* {}\n*Customer:* {} | {}",
            order.status, order.payment_method, order.email, order.phone
        )),
        address_block(order),
        Block::section(format!("*{}*", coupon_summary(&order.coupon_codes))),
        Block::section(format!("*Order Items:*\n{}", item_lines(order))),
        Block::context(format!(
            "{} | *Total:* {}",
            shipping_summary(order),
            money(&order.currency, order.total)
        )),
    ];

    if !order.admin_url.is_empty() {
        blocks.push(Block::button("View in WooCommerce", order.admin_url.clone()));
    }

    let notes: Vec<String> = order
        .customer_notes
        .iter()
        .map(|note| format!("• _{}_", sanitize_markdown(note)))
        .collect();
    if !notes.is_empty() {
        blocks.push(Block::section(format!(
            "*Customer Notes:*\n{}",
            notes.join("\n")
        )));
    }

    MessagePayload {
        text: String::new(),
        blocks,
    }
}

/// Shipping address when one is present, billing otherwise
fn address_block(order: &OrderSnapshot) -> Block {
    if !order.shipping_address.trim().is_empty() {
        Block::section(format!(
            "*Shipping:*\n{}",
            sanitize_markdown(&order.shipping_address)
        ))
    } else {
        Block::section(format!(
            "*Billing:*\n{}",
            sanitize_markdown(&order.billing_address)
        ))
    }
}

fn coupon_summary(coupons: &[String]) -> String {
    if coupons.is_empty() {
        "No Coupons".to_string()
    } else {
        format!("Coupons Used: {}", coupons.join(", "))
    }
}

fn item_lines(order: &OrderSnapshot) -> String {
    if order.items.is_empty() {
        return "No line items".to_string();
    }
    order
        .items
        .iter()
        .map(|item| {
            format!(
                "• *{}* — {} × {}",
                sanitize_markdown(&item.name),
                item.quantity,
                money(&order.currency, item.total)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn shipping_summary(order: &OrderSnapshot) -> String {
    if order.shipping_total > 0.0 {
        format!("Shipping: {}", money(&order.currency, order.shipping_total))
    } else {
        "Shipping: Free".to_string()
    }
}

/// Build the order-status-change message with a fields grid
pub fn order_status_changed(
    order: &OrderSnapshot,
    old_status: &str,
    new_status: &str,
) -> MessagePayload {
    let date = order
        .created_at
        .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "N/A".to_string());

    MessagePayload {
        text: format!(
            "Order #{} status changed from *{old_status}* to *{new_status}*.",
            order.id
        ),
        blocks: vec![
            Block::section(format!(
                "*Order Status Changed* :truck:\nOrder *#{}* changed from *{old_status}* to *{new_status}*",
                order.id
            )),
            Block::fields(vec![
                Text::mrkdwn(format!("*Total:* {}", money(&order.currency, order.total))),
                Text::mrkdwn(format!("*Payment:* {}", order.payment_method)),
                Text::mrkdwn(format!(
                    "*Customer:* {} {}",
                    order.first_name, order.last_name
                )),
                Text::mrkdwn(format!("*Email:* {}", order.email)),
                Text::mrkdwn(format!("*Date:* {date}")),
            ]),
        ],
    }
}

/// Build the low-stock alert with a fields grid
pub fn low_stock(product: &ProductSnapshot) -> MessagePayload {
    let quantity = product
        .stock_quantity
        .map(|q| q.to_string())
        .unwrap_or_else(|| "N/A".to_string());

    MessagePayload {
        text: format!(
            "⚠️ Low stock alert for *{}* (ID: {})",
            product.name, product.id
        ),
        blocks: vec![
            Block::section(format!(
                "*Low Stock Alert* :warning:\n*{}* (ID: {}) is running low.",
                product.name, product.id
            )),
            Block::fields(vec![
                Text::mrkdwn(format!("*Type:*\n{}", product.product_type)),
                Text::mrkdwn(format!("*Current Stock:*\n{quantity}")),
                Text::mrkdwn(format!("*Edit Product:*\n<{}|View Product>", product.edit_url)),
            ]),
        ],
    }
}

/// Build the out-of-stock alert, optionally prefixed with the inventory
/// notice block
pub fn no_stock(product: &ProductSnapshot, show_notice: bool) -> MessagePayload {
    let mut blocks = Vec::new();
    if show_notice {
        blocks.push(Block::section(":warning: *Inventory Alert!*"));
    }
    blocks.push(Block::section_with_accessory(
        format!(
            ":x: *Out of Stock:* `{}`\n• *SKU:* `{}`",
            product.name, product.sku
        ),
        Accessory::image(product.image_url.as_deref(), &product.name),
    ));

    MessagePayload {
        text: String::new(),
        blocks,
    }
}

/// Build the backorder alert
pub fn backorder(product: &ProductSnapshot) -> MessagePayload {
    MessagePayload {
        text: format!(
            ":repeat: *Backorder Alert* - `{}` (ID: {})",
            product.name, product.id
        ),
        blocks: vec![Block::section_with_accessory(
            format!(
                ":repeat: *Backorder Alert* - `{}` (ID: {})\n• *SKU:* `{}`",
                product.name, product.id, product.sku
            ),
            Accessory::image(product.image_url.as_deref(), &product.name),
        )],
    }
}

/// Build the product published/updated message, covering variations
pub fn product_changed(product: &ProductSnapshot, created: bool) -> MessagePayload {
    let emoji = if created { ":package:" } else { ":pencil2:" };
    let verb = if created { "Published" } else { "Updated" };
    let title = sanitize_markdown(&product.display_name());
    let price = product
        .price
        .map(|p| money(&product.currency, p))
        .unwrap_or_else(|| "N/A".to_string());

    MessagePayload {
        text: String::new(),
        blocks: vec![Block::section_with_accessory(
            format!(
                "{emoji} *Product {verb}:* <{}|{title}>\n• *SKU:* `{}`\n• *Price:* {price}",
                product.permalink, product.sku
            ),
            Accessory::image(product.image_url.as_deref(), &title),
        )],
    }
}

/// Build the missing-product-details notice (text-only)
pub fn missing_details(product: &ProductSnapshot, missing: &[String]) -> MessagePayload {
    MessagePayload::text_only(format!(
        ":mag: *Product missing details* - `{}` missing: {}",
        product.name,
        missing.join(", ")
    ))
}

/// Build the new-post announcement (text-only)
pub fn new_post(post: &PostSnapshot) -> MessagePayload {
    MessagePayload::text_only(format!(
        ":memo: *New Post Published*: <{}|{}>",
        post.permalink,
        sanitize_markdown(&post.title)
    ))
}

/// Build the new-customer announcement (text-only)
pub fn new_customer(customer: &CustomerSnapshot) -> MessagePayload {
    MessagePayload::text_only(format!(
        ":bust_in_silhouette: *New Customer Registered*: `{}` ({})",
        customer.username, customer.email
    ))
}

/// Build the new-review announcement (text-only)
pub fn new_review(review: &ReviewSnapshot) -> MessagePayload {
    MessagePayload::text_only(format!(
        ":star: *New Review on* <{}|{}>: \"{}\" by `{}`",
        review.product_permalink,
        review.product_name,
        sanitize_markdown(&review.content),
        review.author
    ))
}

/// Build the manual test message (text-only)
pub fn test_message() -> MessagePayload {
    MessagePayload::text_only(
        ":white_check_mark: *Test message sent from WooCommerce Slack Notifier!*",
    )
}
