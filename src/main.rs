use futures_util::future::join;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use purchase_console::domain::order::{
    LinkId, LinkStatus, Order, OrderId, OrderLink, OrderStatus, OrderType, PageQuery,
};
use purchase_console::domain::selection::SelectionPolicy;
use purchase_console::domain::workflow::{PurchaseDraft, SubmitOutcome, TargetKey, WorkflowKind};
use purchase_console::services::{AuthToken, InMemoryBackend, StaticCredentials};
use purchase_console::{ConsoleAction, ConsoleStore, EngineConfig, Metrics, WorkflowController, WorkflowIntent};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Default to INFO level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,purchase_console=debug")),
        )
        .init();

    tracing::info!("🚀 Starting purchase console demo");

    // === 1. Configuration and metrics ===
    let config = EngineConfig::from_env()?;
    tracing::info!(
        page_size = config.page_size,
        price_field = config.price_field.as_str(),
        success_delay_ms = config.success_display_delay.as_millis() as u64,
        "Configuration loaded"
    );

    let metrics = Arc::new(Metrics::new()?);
    tracing::info!("📊 Metrics registry created with {} metrics", metrics.registry().gather().len());

    // === 2. In-memory backend standing in for the order service ===
    let backend = Arc::new(
        InMemoryBackend::new(seed_orders())
            .with_accepted_token(AuthToken::new("demo-token"))
            .with_latency(Duration::from_millis(150)),
    );
    let credentials = Arc::new(StaticCredentials::new(Some(AuthToken::new("demo-token"))));

    // === 3. Console store and workflow controller ===
    let store = ConsoleStore::new(
        SelectionPolicy::new(config.price_field),
        PageQuery::new(config.page_size).with_order_type(OrderType::Auction),
    )
    .with_metrics(metrics.clone());

    let controller = WorkflowController::new(
        Arc::new(Mutex::new(store)),
        backend.clone(),
        backend.clone(),
        credentials,
        config,
        metrics.clone(),
    );

    let report = controller.refresh().await?;
    tracing::info!(pruned = report.pruned_link_count(), "📥 First page loaded");

    // === 4. Build a selection ===
    let order_id = OrderId(1);
    controller
        .dispatch(ConsoleAction::Toggle { order_id, link_id: LinkId(1) })
        .await?;

    if let Err(error) = controller
        .dispatch(ConsoleAction::Toggle { order_id, link_id: LinkId(3) })
        .await
    {
        tracing::info!(error = %error, "Purchased link refused as expected");
    }

    controller.dispatch(ConsoleAction::SelectAll { order_id, on: true }).await?;
    {
        let store = controller.store();
        let store = store.lock().await;
        if let Some(summary) = store.summary(order_id) {
            tracing::info!(
                selected = summary.selected,
                eligible = summary.eligible,
                total = %summary.total,
                all_selected = summary.all_selected,
                "🧾 Selection ready"
            );
        }
    }

    // === 5. Batch purchase: first without an image, then for real ===
    let mut draft = PurchaseDraft {
        note: Some("Won at closing bell".to_string()),
        ..PurchaseDraft::default()
    };

    if let Err(error) = controller
        .submit(WorkflowIntent::BatchPurchase { order_id, draft: draft.clone() })
        .await
    {
        tracing::info!(reason = error.reason(), error = %error, "Submit blocked");
    }

    draft.image = Some("receipts/ord-1.jpg".to_string());
    match controller.submit(WorkflowIntent::BatchPurchase { order_id, draft }).await? {
        SubmitOutcome::Completed(completed) => {
            if let Some(receipt) = completed.receipt {
                tracing::info!(
                    purchase_id = %receipt.purchase_id,
                    links = receipt.purchased_links,
                    total = %receipt.total,
                    "✅ Purchase recorded"
                );
            }
        }
        SubmitOutcome::AlreadyInFlight => tracing::warn!("Purchase was already in flight"),
    }

    let target = TargetKey::Order { order_id };
    tracing::info!(
        phase = ?controller.phase(WorkflowKind::BatchPurchase, target).await,
        "Purchase dialog state"
    );
    controller.acknowledge(WorkflowKind::BatchPurchase, target).await;

    // === 6. Double-click on the pin toggle: only one request goes out ===
    let pin = || controller.submit(WorkflowIntent::Pin { order_id: OrderId(2), pinned: true });
    let (first, second) = join(pin(), pin()).await;
    tracing::info!(
        first_completed = first?.is_completed(),
        second_completed = second?.is_completed(),
        server_calls = backend.mutation_calls(),
        "📌 Pin toggled"
    );

    // === 7. Dump metrics ===
    tracing::info!("Metrics snapshot:\n{}", metrics.encode()?);
    tracing::info!("🎉 Demo complete!");

    Ok(())
}

fn seed_orders() -> Vec<Order> {
    let link = |id: i64, name: &str, status: LinkStatus, price: i64| OrderLink {
        link_id: LinkId(id),
        tracking_code: format!("TRK-{}", id),
        product_name: name.to_string(),
        status,
        price_web: Some(Decimal::from(price)),
        ship_web: Some(Decimal::new(500, 2)),
        quantity: 1,
        final_price_vnd: None,
        shipment_code: None,
    };

    vec![
        Order {
            order_id: OrderId(1),
            order_code: "ORD-1".to_string(),
            order_type: OrderType::Auction,
            status: OrderStatus::WaitingPurchase,
            final_price_order: None,
            pinned_at: None,
            links: vec![
                link(1, "Film camera", LinkStatus::PendingPurchase, 100),
                link(2, "Lens hood", LinkStatus::PendingPurchase, 250),
                link(3, "Strap", LinkStatus::Purchased, 80),
            ],
        },
        Order {
            order_id: OrderId(2),
            order_code: "ORD-2".to_string(),
            order_type: OrderType::Auction,
            status: OrderStatus::Purchasing,
            final_price_order: None,
            pinned_at: None,
            links: vec![link(20, "Vinyl record", LinkStatus::BuyLater, 35)],
        },
    ]
}
