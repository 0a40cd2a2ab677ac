//! Plain-text email bodies for every lifecycle event. Each function returns
//! `(subject, body)`.

use chrono::{DateTime, Utc};

use crate::models::{AgentSnapshot, Booking, PaymentIntent};

fn schedule(when: DateTime<Utc>) -> String {
    when.format("%d %b %Y, %H:%M UTC").to_string()
}

fn service_lines(booking: &Booking) -> String {
    booking
        .services
        .iter()
        .map(|item| format!("  - {} x{} ({:.2})", item.name, item.quantity, item.subtotal()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn payment_received(name: &str, intent: &PaymentIntent) -> (String, String) {
    (
        format!("Payment received for order {}", intent.order_id),
        format!(
            "Hi {},\n\nWe received your payment of {:.2} {} for order {}.\n\
             Your booking is being set up and you will hear from us shortly.\n",
            name, intent.amount, intent.currency, intent.order_id
        ),
    )
}

pub fn booking_created(name: &str, booking: &Booking) -> (String, String) {
    (
        "Your booking is confirmed as pending".to_string(),
        format!(
            "Hi {},\n\nYour booking has been created and is awaiting agent assignment.\n\n\
             Services:\n{}\n\nTotal: {:.2}\nScheduled for: {}\n",
            name,
            service_lines(booking),
            booking.total_amount,
            schedule(booking.scheduled_utc)
        ),
    )
}

pub fn booking_created_company(booking: &Booking) -> (String, String) {
    (
        format!("New booking {} awaiting assignment", booking.id),
        format!(
            "A new booking needs an agent.\n\nBooking: {}\nCustomer: {}\n\
             Services:\n{}\n\nTotal: {:.2}\nScheduled for: {}\n",
            booking.id,
            booking.user_id,
            service_lines(booking),
            booking.total_amount,
            schedule(booking.scheduled_utc)
        ),
    )
}

pub fn booking_confirmed(name: &str, booking: &Booking, agent: &AgentSnapshot) -> (String, String) {
    (
        "Your booking is confirmed".to_string(),
        format!(
            "Hi {},\n\n{} will handle your booking on {}.\n\
             You can reach them at {} or {}.\n",
            name,
            agent.name,
            schedule(booking.scheduled_utc),
            agent.phone,
            agent.email
        ),
    )
}

pub fn booking_confirmed_company(booking: &Booking, agent: &AgentSnapshot) -> (String, String) {
    (
        format!("Booking {} assigned to {}", booking.id, agent.name),
        format!(
            "Booking {} was confirmed and assigned to {} ({}).\nScheduled for: {}\n",
            booking.id,
            agent.name,
            agent.email,
            schedule(booking.scheduled_utc)
        ),
    )
}

pub fn agent_assignment(booking: &Booking, agent: &AgentSnapshot) -> (String, String) {
    (
        "New assignment".to_string(),
        format!(
            "Hi {},\n\nYou have been assigned booking {}.\n\n\
             Services:\n{}\n\nScheduled for: {}\nCustomer notes: {}\n",
            agent.name,
            booking.id,
            service_lines(booking),
            schedule(booking.scheduled_utc),
            if booking.notes.is_empty() {
                "(none)"
            } else {
                &booking.notes
            }
        ),
    )
}

pub fn booking_cancelled(name: &str, booking: &Booking) -> (String, String) {
    let reason = booking
        .cancellation_reason
        .as_deref()
        .unwrap_or("No reason given");
    (
        "Your booking was cancelled".to_string(),
        format!(
            "Hi {},\n\nBooking {} has been cancelled.\nReason: {}\n",
            name, booking.id, reason
        ),
    )
}

pub fn booking_cancelled_company(booking: &Booking) -> (String, String) {
    let reason = booking
        .cancellation_reason
        .as_deref()
        .unwrap_or("No reason given");
    (
        format!("Booking {} cancelled", booking.id),
        format!("Booking {} was cancelled.\nReason: {}\n", booking.id, reason),
    )
}

pub fn booking_completed(name: &str, booking: &Booking) -> (String, String) {
    (
        "Your booking is complete".to_string(),
        format!(
            "Hi {},\n\nBooking {} has been marked complete. Thank you for choosing us.\n",
            name, booking.id
        ),
    )
}

pub fn reset_code(name: &str, code: &str) -> (String, String) {
    (
        "Your password reset code".to_string(),
        format!(
            "Hi {},\n\nYour password reset code is {}. It expires in 15 minutes.\n\
             If you did not request this, you can ignore this email.\n",
            name, code
        ),
    )
}
