//! Pure transition guards for the payment and booking lifecycle. Guards
//! validate a snapshot and produce the user-facing rejection; the stores
//! re-check the same pre-state atomically when applying the write, so a
//! guard that passed here can still lose a race at the store.

use chrono::{DateTime, Utc};
use service_core::error::AppError;
use thiserror::Error;

use crate::models::{Booking, BookingStatus, LineItem, PaymentIntent, PaymentStatus};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("At least one service is required")]
    EmptyCart,
    #[error("Scheduled date must be in the future")]
    ScheduleInPast,
    #[error("Payment is already {0}")]
    PaymentNotPending(&'static str),
    #[error("Payment is already linked to a booking")]
    PaymentAlreadyBooked,
    #[error("Booking is already {0}")]
    BookingNotPending(&'static str),
    #[error("Booking is already {0} and cannot change")]
    BookingTerminal(&'static str),
    #[error("Only a confirmed booking can be completed")]
    BookingNotConfirmed,
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::EmptyCart | TransitionError::ScheduleInPast => {
                AppError::bad_request(err.to_string())
            }
            _ => AppError::StateConflict(err.to_string()),
        }
    }
}

/// Validates a new booking's cart and schedule; returns the order total.
pub fn guard_create(
    items: &[LineItem],
    scheduled_utc: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<f64, TransitionError> {
    if items.is_empty() {
        return Err(TransitionError::EmptyCart);
    }
    if scheduled_utc <= now {
        return Err(TransitionError::ScheduleInPast);
    }
    Ok(items.iter().map(LineItem::subtotal).sum())
}

/// A payment may back a booking only while pending and unlinked.
pub fn guard_verify(intent: &PaymentIntent) -> Result<(), TransitionError> {
    if intent.booking_id.is_some() {
        return Err(TransitionError::PaymentAlreadyBooked);
    }
    match intent.status {
        PaymentStatus::Pending => Ok(()),
        other => Err(TransitionError::PaymentNotPending(other.as_str())),
    }
}

pub fn guard_confirm(booking: &Booking) -> Result<(), TransitionError> {
    match booking.status {
        BookingStatus::Pending => Ok(()),
        other => Err(TransitionError::BookingNotPending(other.as_str())),
    }
}

pub fn guard_cancel(booking: &Booking) -> Result<(), TransitionError> {
    if booking.status.is_terminal() {
        return Err(TransitionError::BookingTerminal(booking.status.as_str()));
    }
    Ok(())
}

pub fn guard_reschedule(
    booking: &Booking,
    scheduled_utc: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<(), TransitionError> {
    if booking.status.is_terminal() {
        return Err(TransitionError::BookingTerminal(booking.status.as_str()));
    }
    if scheduled_utc <= now {
        return Err(TransitionError::ScheduleInPast);
    }
    Ok(())
}

pub fn guard_complete(booking: &Booking) -> Result<(), TransitionError> {
    match booking.status {
        BookingStatus::Confirmed => Ok(()),
        _ => Err(TransitionError::BookingNotConfirmed),
    }
}
