//! Third-party integrations behind traits, so handlers and tests can swap
//! the real clients for local stand-ins

pub mod calendar;
pub mod payments;

pub use calendar::{CalendarEvent, CalendarProvider, CreatedEvent, GoogleCalendarClient, LocalCalendar};
pub use payments::{
    DisabledPayments, NewPaymentCustomer, OffSessionCharge, PaymentCustomer, PaymentGateway, PaymentIntent, SavedCard,
    SetupIntent, StripeClient,
};
