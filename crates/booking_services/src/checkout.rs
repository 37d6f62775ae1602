use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::dates::DateRange;
use crate::pricing::{PriceQuote, PricingTable};
use crate::types::{
    BookingError, CreateBooking, CreateBookingRequest, CustomerData, PaymentMethod,
};

/// Calendar rules of the date picker. Advisory only: the server re-checks on submit.
#[derive(Debug, Clone)]
pub struct CalendarGuard {
    today: NaiveDate,
    blocked: BTreeSet<NaiveDate>,
}

impl CalendarGuard {
    /// Creates the guard for `today` with the locally known blocked days.
    pub fn new(today: NaiveDate, blocked: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            today,
            blocked: blocked.into_iter().collect(),
        }
    }

    /// Past days and blocked days cannot be picked.
    pub fn is_disabled(&self, date: NaiveDate) -> bool {
        date < self.today || self.blocked.contains(&date)
    }

    /// First day of `[start, end]` that cannot be picked, if any.
    pub fn first_disabled_in(&self, range: &DateRange) -> Option<NaiveDate> {
        range
            .start()
            .iter_days()
            .take_while(|day| *day <= range.end())
            .find(|day| self.is_disabled(*day))
    }
}

/// Wizard steps, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutStep {
    /// Pick check-in and check-out
    Dates,
    /// Enter customer details
    Details,
    /// Choose payment and submit
    Payment,
}

/// Events the wizard reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutEvent {
    /// Advance one step
    Next,
    /// Go back one step
    Back,
    /// Send the booking
    Submit,
}

/// Result of a successful event.
#[derive(Debug, Clone)]
pub enum CheckoutOutcome {
    /// The wizard is now on this step
    Moved(CheckoutStep),
    /// The booking command to send to the server
    Submitted(CreateBooking),
}

/// Reasons the wizard refuses an action.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    /// No stay selected yet
    #[error("Select your dates first")]
    NoDates,

    /// The selection contains a past or blocked day
    #[error("{0} is not available")]
    DateDisabled(NaiveDate),

    /// Customer details are incomplete or invalid
    #[error("Missing or invalid details: {}", .0.join(", "))]
    IncompleteDetails(Vec<String>),

    /// No payment method chosen
    #[error("Select a payment method")]
    NoPaymentMethod,

    /// The event does not apply to the current step
    #[error("{event:?} is not allowed on step {step:?}")]
    InvalidEvent {
        /// Current step
        step: CheckoutStep,
        /// Rejected event
        event: CheckoutEvent,
    },

    /// The collected data does not form a valid booking
    #[error(transparent)]
    Booking(#[from] BookingError),
}

/// Three-step checkout: dates, then customer details, then payment.
/// Moves one step at a time in either direction; steps cannot be skipped.
#[derive(Debug, Clone)]
pub struct CheckoutFlow {
    camper_id: Uuid,
    pricing: PricingTable,
    guard: CalendarGuard,
    step: CheckoutStep,
    range: Option<DateRange>,
    details: CustomerData,
    payment_method: Option<PaymentMethod>,
}

impl CheckoutFlow {
    /// Starts a checkout for a camper on the dates step.
    pub fn new(camper_id: Uuid, pricing: PricingTable, guard: CalendarGuard) -> Self {
        Self {
            camper_id,
            pricing,
            guard,
            step: CheckoutStep::Dates,
            range: None,
            details: CustomerData::default(),
            payment_method: None,
        }
    }

    /// Current step.
    pub fn step(&self) -> CheckoutStep {
        self.step
    }

    /// Selected stay.
    pub fn range(&self) -> Option<&DateRange> {
        self.range.as_ref()
    }

    /// Selects a stay and returns its estimated price.
    pub fn select_dates(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceQuote, CheckoutError> {
        self.require_step(CheckoutStep::Dates, CheckoutEvent::Next)?;

        let range = DateRange::new(start, end)?;
        if let Some(day) = self.guard.first_disabled_in(&range) {
            return Err(CheckoutError::DateDisabled(day));
        }

        let quote = self.pricing.quote(range.nights()).map_err(BookingError::from)?;
        self.range = Some(range);
        Ok(quote)
    }

    /// Clears the selected stay.
    pub fn clear_dates(&mut self) {
        self.range = None;
    }

    /// Stores the customer form.
    pub fn set_details(&mut self, details: CustomerData) {
        self.details = details;
    }

    /// Chooses the payment method.
    pub fn set_payment_method(&mut self, method: PaymentMethod) {
        self.payment_method = Some(method);
    }

    /// Price shown next to the calendar; same tiers the server charges.
    pub fn estimate(&self) -> Option<PriceQuote> {
        self.range
            .and_then(|range| self.pricing.quote(range.nights()).ok())
    }

    /// Applies an event to the wizard.
    pub fn apply(&mut self, event: CheckoutEvent) -> Result<CheckoutOutcome, CheckoutError> {
        use CheckoutEvent::*;
        use CheckoutStep::*;

        match (self.step, event) {
            (Dates, Next) => {
                let range = self.range.ok_or(CheckoutError::NoDates)?;
                if let Some(day) = self.guard.first_disabled_in(&range) {
                    return Err(CheckoutError::DateDisabled(day));
                }
                self.step = Details;
            }
            (Details, Next) => {
                let problems = self.detail_problems();
                if !problems.is_empty() {
                    return Err(CheckoutError::IncompleteDetails(problems));
                }
                self.step = Payment;
            }
            (Details, Back) => self.step = Dates,
            (Payment, Back) => self.step = Details,
            (Payment, Submit) => return self.submit().map(CheckoutOutcome::Submitted),
            (step, event) => return Err(CheckoutError::InvalidEvent { step, event }),
        }

        Ok(CheckoutOutcome::Moved(self.step))
    }

    fn require_step(&self, step: CheckoutStep, event: CheckoutEvent) -> Result<(), CheckoutError> {
        if self.step != step {
            return Err(CheckoutError::InvalidEvent {
                step: self.step,
                event,
            });
        }
        Ok(())
    }

    fn request(&self) -> CreateBookingRequest {
        CreateBookingRequest {
            camper_id: Some(self.camper_id.to_string()),
            start_date: self.range.map(|r| r.start().to_string()),
            end_date: self.range.map(|r| r.end().to_string()),
            customer_data: Some(self.details.clone()),
            payment_method: Some(
                self.payment_method
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default(),
            ),
        }
    }

    fn detail_problems(&self) -> Vec<String> {
        let mut request = self.request();
        request.payment_method = Some(PaymentMethod::Card.as_str().to_string());

        let missing: Vec<String> = request
            .missing_fields()
            .into_iter()
            .filter(|field| field.starts_with("customerData"))
            .collect();
        if !missing.is_empty() {
            return missing;
        }

        match request.into_command() {
            Err(BookingError::Validation(msg)) => vec![msg],
            _ => Vec::new(),
        }
    }

    fn submit(&self) -> Result<CreateBooking, CheckoutError> {
        if self.payment_method.is_none() {
            return Err(CheckoutError::NoPaymentMethod);
        }
        Ok(self.request().into_command()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn guard() -> CalendarGuard {
        CalendarGuard::new(
            day("2026-02-01"),
            [day("2026-02-20"), day("2026-02-21"), day("2026-02-22")],
        )
    }

    fn details() -> CustomerData {
        CustomerData {
            email: Some("ana@example.com".to_string()),
            name: Some("Ana".to_string()),
            phone: Some("600000000".to_string()),
            dni: Some("12345678Z".to_string()),
            license: Some("B-1".to_string()),
        }
    }

    fn flow() -> CheckoutFlow {
        CheckoutFlow::new(Uuid::new_v4(), PricingTable::default(), guard())
    }

    #[test]
    fn test_calendar_disables_past_and_blocked_days() {
        let guard = guard();
        assert!(guard.is_disabled(day("2026-01-31")));
        assert!(!guard.is_disabled(day("2026-02-01")));
        assert!(guard.is_disabled(day("2026-02-21")));
        assert!(!guard.is_disabled(day("2026-02-23")));

        let range = DateRange::new(day("2026-02-18"), day("2026-02-25")).unwrap();
        assert_eq!(guard.first_disabled_in(&range), Some(day("2026-02-20")));
    }

    #[test]
    fn test_selection_over_blocked_day_is_refused() {
        let mut flow = flow();
        let err = flow
            .select_dates(day("2026-02-19"), day("2026-02-24"))
            .unwrap_err();
        assert!(matches!(err, CheckoutError::DateDisabled(d) if d == day("2026-02-20")));
        assert!(flow.range().is_none());
    }

    #[test]
    fn test_estimate_matches_server_pricing() {
        let mut flow = flow();
        let quote = flow.select_dates(day("2026-03-01"), day("2026-03-30")).unwrap();

        let table = PricingTable::default();
        assert_eq!(quote, table.quote(29).unwrap());
        assert_eq!(quote.total_price, 4 * table.per_week + table.per_day);
        assert_eq!(flow.estimate(), Some(quote));
    }

    #[test]
    fn test_cannot_skip_or_go_back_from_start() {
        let mut flow = flow();
        assert!(matches!(flow.apply(CheckoutEvent::Next), Err(CheckoutError::NoDates)));
        assert!(matches!(
            flow.apply(CheckoutEvent::Back),
            Err(CheckoutError::InvalidEvent { step: CheckoutStep::Dates, .. })
        ));
        assert!(matches!(
            flow.apply(CheckoutEvent::Submit),
            Err(CheckoutError::InvalidEvent { .. })
        ));
        assert_eq!(flow.step(), CheckoutStep::Dates);
    }

    #[test]
    fn test_details_are_required_before_payment() {
        let mut flow = flow();
        flow.select_dates(day("2026-03-01"), day("2026-03-05")).unwrap();
        flow.apply(CheckoutEvent::Next).unwrap();

        let mut partial = details();
        partial.license = None;
        flow.set_details(partial);
        assert!(matches!(
            flow.apply(CheckoutEvent::Next),
            Err(CheckoutError::IncompleteDetails(fields)) if fields == vec!["customerData.license"]
        ));

        let mut bad_email = details();
        bad_email.email = Some("ana".to_string());
        flow.set_details(bad_email);
        assert!(matches!(
            flow.apply(CheckoutEvent::Next),
            Err(CheckoutError::IncompleteDetails(_))
        ));
        assert_eq!(flow.step(), CheckoutStep::Details);
    }

    #[test]
    fn test_full_walk_and_submit() {
        let mut flow = flow();
        flow.select_dates(day("2026-03-01"), day("2026-03-08")).unwrap();
        assert!(matches!(
            flow.apply(CheckoutEvent::Next).unwrap(),
            CheckoutOutcome::Moved(CheckoutStep::Details)
        ));

        flow.set_details(details());
        flow.apply(CheckoutEvent::Next).unwrap();
        assert_eq!(flow.step(), CheckoutStep::Payment);

        assert!(matches!(
            flow.apply(CheckoutEvent::Submit),
            Err(CheckoutError::NoPaymentMethod)
        ));

        flow.set_payment_method(PaymentMethod::Paypal);
        match flow.apply(CheckoutEvent::Submit).unwrap() {
            CheckoutOutcome::Submitted(command) => {
                assert_eq!(command.range.nights(), 7);
                assert_eq!(command.payment_method, PaymentMethod::Paypal);
                assert_eq!(command.customer.email, "ana@example.com");
            }
            other => panic!("expected submission, got {:?}", other),
        }
    }

    #[test]
    fn test_back_walks_one_step() {
        let mut flow = flow();
        flow.select_dates(day("2026-03-01"), day("2026-03-03")).unwrap();
        flow.apply(CheckoutEvent::Next).unwrap();
        flow.set_details(details());
        flow.apply(CheckoutEvent::Next).unwrap();

        flow.apply(CheckoutEvent::Back).unwrap();
        assert_eq!(flow.step(), CheckoutStep::Details);
        flow.apply(CheckoutEvent::Back).unwrap();
        assert_eq!(flow.step(), CheckoutStep::Dates);

        // Dates can only be changed on the first step
        flow.apply(CheckoutEvent::Next).unwrap();
        assert!(matches!(
            flow.select_dates(day("2026-04-01"), day("2026-04-03")),
            Err(CheckoutError::InvalidEvent { step: CheckoutStep::Details, .. })
        ));
    }
}
