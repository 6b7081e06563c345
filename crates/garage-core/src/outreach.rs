//! # Outreach
//!
//! WhatsApp click-to-chat messages. Nothing is sent from here: each function
//! returns an [`OutboundMessage`] whose `link` the dashboard opens.
//!
//! ## Phone Numbers
//! ```text
//! "+91 98450-12345" ──strip non-digits──► "919845012345"   (12 digits, kept)
//! "98450 12345"     ──strip non-digits──► "9845012345"     (10 digits)
//!                                          └─► "91" + "9845012345"
//! ```
//!
//! Only an exactly-10-digit number gets the country code; anything else is
//! assumed to already carry one.

use serde::Serialize;
use ts_rs::TS;

use crate::types::{Customer, Invoice, Job, ShopConfig};

const WHATSAPP_BASE: &str = "https://wa.me/";

/// A message ready to open in WhatsApp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OutboundMessage {
    /// Destination in international format without `+`. `None` lets the
    /// user pick the chat.
    pub phone: Option<String>,
    pub text: String,
    /// `https://wa.me/{phone}?text={encoded text}`
    pub link: String,
}

impl OutboundMessage {
    fn new(phone: Option<String>, text: String) -> Self {
        let link = whatsapp_link(phone.as_deref(), &text);
        OutboundMessage { phone, text, link }
    }
}

/// Normalizes a mobile number for wa.me.
///
/// Returns `None` when the input holds no digits at all.
///
/// ## Example
/// ```rust
/// use garage_core::outreach::whatsapp_destination;
///
/// assert_eq!(whatsapp_destination("98450 12345", "91").as_deref(), Some("919845012345"));
/// assert_eq!(whatsapp_destination("+44 20 7946 0958", "91").as_deref(), Some("442079460958"));
/// ```
pub fn whatsapp_destination(mobile: &str, country_code: &str) -> Option<String> {
    let digits: String = mobile.chars().filter(|c| c.is_ascii_digit()).collect();
    match digits.len() {
        0 => None,
        10 => Some(format!("{}{}", country_code, digits)),
        _ => Some(digits),
    }
}

/// Builds a click-to-chat link, percent-encoding the text.
pub fn whatsapp_link(phone: Option<&str>, text: &str) -> String {
    format!(
        "{}{}?text={}",
        WHATSAPP_BASE,
        phone.unwrap_or(""),
        urlencoding::encode(text)
    )
}

// =============================================================================
// Templates
// =============================================================================

/// Sent when a job moves to `Completed`.
pub fn job_completed_message(job: &Job, shop: &ShopConfig, country_code: &str) -> OutboundMessage {
    let text = format!(
        "Hello {}, your vehicle ({}) work has been completed at {}. Please visit our shop to collect it. Thank you!",
        job.customer_name,
        job.vehicle_number,
        shop.display_name()
    );
    OutboundMessage::new(whatsapp_destination(&job.customer_mobile, country_code), text)
}

/// Welcome message after intake, inviting the customer to the shop's
/// WhatsApp group.
pub fn group_invite_message(
    name: &str,
    mobile: &str,
    shop: &ShopConfig,
    country_code: &str,
) -> OutboundMessage {
    let text = format!(
        "Welcome {}! Thank you for choosing {}. Please join our WhatsApp updates group for the latest offers: {}",
        name,
        shop.display_name(),
        shop.group_invite_link
    );
    OutboundMessage::new(whatsapp_destination(mobile, country_code), text)
}

/// Invoice summary. Addressed to nobody; the user chooses the chat.
pub fn invoice_share_message(invoice: &Invoice) -> OutboundMessage {
    let text = format!(
        "Hello {}, your invoice #{} for ₹{} is ready. Status: {}.",
        invoice.customer_name.as_deref().unwrap_or_default(),
        invoice.invoice_number.as_deref().unwrap_or_default(),
        invoice.grand_total,
        invoice.status
    );
    OutboundMessage::new(None, text)
}

/// One message per selected customer, in the given order.
///
/// Customers without a usable number are left out.
pub fn marketing_broadcast(
    customers: &[Customer],
    text: &str,
    country_code: &str,
) -> Vec<OutboundMessage> {
    customers
        .iter()
        .filter_map(|c| whatsapp_destination(&c.mobile, country_code))
        .map(|phone| OutboundMessage::new(Some(phone), text.to_string()))
        .collect()
}

/// Digits-only numbers joined by `", "`, for pasting into a broadcast list.
pub fn broadcast_numbers(customers: &[Customer]) -> String {
    customers
        .iter()
        .map(|c| c.mobile.chars().filter(|ch| ch.is_ascii_digit()).collect::<String>())
        .filter(|digits| !digits.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}
