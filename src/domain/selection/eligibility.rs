use crate::domain::order::OrderLink;

use super::aggregation::PriceField;

// ============================================================================
// Eligibility Filter
// ============================================================================

/// Predicate deciding whether a link may be selected
pub type EligibilityFn = fn(&OrderLink) -> bool;

/// A link is selectable until it reaches a terminal status.
///
/// Evaluated against every fresh snapshot; the server may move a link to a
/// terminal status between two fetches.
pub fn is_eligible(link: &OrderLink) -> bool {
    !link.status.is_terminal()
}

/// Per-workflow knobs injected into the selection machinery
#[derive(Debug, Clone, Copy)]
pub struct SelectionPolicy {
    pub eligible: EligibilityFn,
    pub price: PriceField,
}

impl SelectionPolicy {
    pub fn new(price: PriceField) -> Self {
        Self {
            eligible: is_eligible,
            price,
        }
    }

    pub fn with_eligibility(mut self, eligible: EligibilityFn) -> Self {
        self.eligible = eligible;
        self
    }

    pub fn is_eligible(&self, link: &OrderLink) -> bool {
        (self.eligible)(link)
    }
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self::new(PriceField::PriceWeb)
    }
}
