use chrono::Utc;
use rust_decimal::Decimal;

use crate::config::EngineConfig;
use crate::domain::console::{ConsoleAction, ConsoleStore};
use crate::domain::order::{LinkId, Order, OrderId};
use crate::services::{AuthToken, CreatePurchaseRequest, PurchasePayload, ShipmentTarget, ShipmentUpdate};

use super::commands::{MutationPayload, OptimisticPatch, PurchaseDraft, WorkflowIntent};
use super::errors::{ValidationError, WorkflowError};

// ============================================================================
// Submission Validation
// ============================================================================
//
// Rules run in a fixed order and the first failure wins:
//   (a) something to act on, and it still exists in the current snapshot
//   (b) payload fields present and well formed
//   (c) a credential is available when the workflow needs one
//
// ============================================================================

pub(crate) struct Validated {
    pub payload: MutationPayload,
    pub token: Option<AuthToken>,
    pub patch: Option<OptimisticPatch>,
}

pub(crate) fn validate(
    intent: &WorkflowIntent,
    store: &ConsoleStore,
    config: &EngineConfig,
    token: Option<AuthToken>,
) -> Result<Validated, WorkflowError> {
    let mut patch = None;

    let payload = match intent {
        WorkflowIntent::BatchPurchase { order_id, draft } => {
            if store.selection().count(*order_id) == 0 {
                return Err(ValidationError::EmptySelection.into());
            }
            let order = existing_order(store, *order_id)?;
            for link_id in store.selection().selected_ids(*order_id) {
                match order.link(link_id) {
                    Some(link) if store.policy().is_eligible(link) => {}
                    _ => return Err(stale_link(*order_id, link_id)),
                }
            }

            MutationPayload::Purchase(purchase_request(store, order, draft, config)?)
        }
        WorkflowIntent::CancelLink { order_id, link_id } => {
            actionable_link(store, *order_id, *link_id)?;
            MutationPayload::Cancel {
                order_id: *order_id,
                link_id: *link_id,
            }
        }
        WorkflowIntent::BuyLater { order_id, link_id } => {
            actionable_link(store, *order_id, *link_id)?;
            MutationPayload::BuyLater {
                order_id: *order_id,
                link_id: *link_id,
            }
        }
        WorkflowIntent::Pin { order_id, pinned } => {
            let order = existing_order(store, *order_id)?;
            patch = Some(OptimisticPatch {
                apply: ConsoleAction::SetPinned {
                    order_id: *order_id,
                    pinned_at: pinned.then(Utc::now),
                },
                rollback: ConsoleAction::SetPinned {
                    order_id: *order_id,
                    pinned_at: order.pinned_at,
                },
            });
            MutationPayload::Pin {
                order_id: *order_id,
                pinned: *pinned,
            }
        }
        WorkflowIntent::UpdateShipment { target, code, fee } => {
            if let ShipmentTarget::Link { order_id, link_id } = target {
                let order = existing_order(store, *order_id)?;
                if order.link(*link_id).is_none() {
                    return Err(stale_link(*order_id, *link_id));
                }
            }

            let code = code.trim();
            if code.is_empty() {
                return Err(ValidationError::BlankShipmentCode.into());
            }
            if let Some(fee) = fee {
                if *fee < Decimal::ZERO {
                    return Err(ValidationError::NegativeFee(*fee).into());
                }
            }

            MutationPayload::Shipment(ShipmentUpdate {
                target: *target,
                code: code.to_string(),
                fee: *fee,
            })
        }
    };

    if intent.kind().requires_credential() && token.is_none() {
        return Err(WorkflowError::MissingCredential);
    }

    Ok(Validated { payload, token, patch })
}

fn existing_order(store: &ConsoleStore, order_id: OrderId) -> Result<&Order, WorkflowError> {
    store
        .order(order_id)
        .ok_or_else(|| WorkflowError::StaleReference(format!("Order {}", order_id)))
}

fn stale_link(order_id: OrderId, link_id: LinkId) -> WorkflowError {
    WorkflowError::StaleReference(format!("Link {} of order {}", link_id, order_id))
}

fn actionable_link(store: &ConsoleStore, order_id: OrderId, link_id: LinkId) -> Result<(), WorkflowError> {
    let order = existing_order(store, order_id)?;
    let link = order.link(link_id).ok_or_else(|| stale_link(order_id, link_id))?;

    if link.status.is_terminal() {
        return Err(ValidationError::LinkNotActionable(link_id).into());
    }
    Ok(())
}

fn purchase_request(
    store: &ConsoleStore,
    order: &Order,
    draft: &PurchaseDraft,
    config: &EngineConfig,
) -> Result<CreatePurchaseRequest, WorkflowError> {
    let total = match draft.total.as_deref().map(str::trim).filter(|text| !text.is_empty()) {
        Some(text) => parse_amount(text)?,
        None => store.total(order.order_id),
    };
    if total <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveTotal(total).into());
    }

    if order.order_code.trim().is_empty() {
        return Err(ValidationError::BlankOrderCode.into());
    }

    let image = match draft.image.as_deref().map(str::trim) {
        None | Some("") => return Err(ValidationError::MissingImage.into()),
        Some(image) if config.is_placeholder_image(image) => {
            return Err(ValidationError::PlaceholderImage.into())
        }
        Some(image) => image.to_string(),
    };

    let mut tracking_codes = Vec::new();
    if let Some(entry) = store.selection().entry(order.order_id) {
        for (link_id, code) in entry {
            if code.trim().is_empty() {
                return Err(ValidationError::BlankTrackingCode(*link_id).into());
            }
            tracking_codes.push(code.trim().to_string());
        }
    }

    Ok(CreatePurchaseRequest {
        target_order_code: order.order_code.trim().to_string(),
        payload: PurchasePayload {
            total,
            image,
            note: non_blank(draft.note.as_deref()),
            shipment_code: non_blank(draft.shipment_code.as_deref()),
            tracking_codes,
        },
    })
}

/// Accepts "1,250.50" style input as typed into the total field
fn parse_amount(text: &str) -> Result<Decimal, WorkflowError> {
    let cleaned: String = text.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect();
    cleaned
        .parse::<Decimal>()
        .map_err(|_| ValidationError::InvalidAmount(text.to_string()).into())
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}
