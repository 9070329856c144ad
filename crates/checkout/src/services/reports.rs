//! Admin views over checkout orders.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use directpay_core::OrderId;

use crate::models::Order;
use crate::models::order::meta;

/// One order row in the admin listing.
#[derive(Debug, Clone, Serialize)]
pub struct OrderSummary {
    pub order_id: OrderId,
    pub date: DateTime<Utc>,
    pub total: String,
    pub status: &'static str,
    pub paid_shipping: bool,
}

/// Orders sharing a session, or a customer when no session was involved.
#[derive(Debug, Clone, Serialize)]
pub struct OrderGroup {
    pub session_id: Option<String>,
    pub customer_name: String,
    pub customer_email: String,
    pub session_active: bool,
    pub orders: Vec<OrderSummary>,
}

fn summarize(order: &Order) -> OrderSummary {
    OrderSummary {
        order_id: order.id,
        date: order.created_at,
        total: order.currency.format(order.total()),
        status: order.status.label(),
        paid_shipping: order.paid_shipping(),
    }
}

fn push_into(
    groups: &mut Vec<(String, OrderGroup)>,
    key: String,
    summary: OrderSummary,
    new_group: impl FnOnce() -> OrderGroup,
) {
    if let Some((_, group)) = groups.iter_mut().find(|(k, _)| *k == key) {
        group.orders.push(summary);
    } else {
        let mut group = new_group();
        group.orders.push(summary);
        groups.push((key, group));
    }
}

/// Group checkout orders by session, then by customer email.
///
/// Groups keep first-seen order, session groups before customer groups, and
/// list their orders oldest first. Orders not created by the checkout are
/// skipped.
#[must_use]
pub fn group_orders(orders: &[Order], active_sessions: &HashSet<String>) -> Vec<OrderGroup> {
    let mut by_session = Vec::new();
    let mut by_customer = Vec::new();

    for order in orders
        .iter()
        .filter(|o| o.meta(meta::DIRECTPAY_ORDER) == Some("yes"))
    {
        let customer_name = match order.billing.full_name() {
            n if n.is_empty() => "Guest".to_owned(),
            n => n,
        };
        let customer_email = order.billing.email.clone();
        let summary = summarize(order);

        if let Some(session_id) = order.session_id() {
            push_into(&mut by_session, session_id.to_owned(), summary, || OrderGroup {
                session_id: Some(session_id.to_owned()),
                customer_name,
                customer_email,
                session_active: active_sessions.contains(session_id),
                orders: Vec::new(),
            });
        } else {
            let key = if customer_email.is_empty() {
                format!("guest_{}", order.id)
            } else {
                customer_email.clone()
            };
            push_into(&mut by_customer, key, summary, || OrderGroup {
                session_id: None,
                customer_name,
                customer_email,
                session_active: false,
                orders: Vec::new(),
            });
        }
    }

    by_session
        .into_iter()
        .chain(by_customer)
        .map(|(_, mut group)| {
            group.orders.sort_by_key(|o| o.date);
            group
        })
        .collect()
}
