//! End-to-end walkthrough: two "requests" sharing one session.
//!
//! Run with:
//! ```sh
//! cargo run --example checkout
//! ```

use basket_session::{
    BasketConfig, BasketManager, BasketResult, Discount, MemoryHandler, MemoryStore, Money,
    ProductAction, RecordingDispatcher,
};

fn main() -> BasketResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .init();

    let handler = MemoryHandler::new();
    let events = RecordingDispatcher::new();
    let config = BasketConfig::from_env();

    // --- request 1: fill the basket ------------------------------------------
    let mut basket = BasketManager::from_config(
        &config,
        MemoryStore::new(handler.clone()),
        events.clone(),
    )?;

    basket.add_quick("COKE-330", "Cola 330ml", 149, &[])?;
    basket.add_quick(
        "TEE-BIO",
        "Organic Tea",
        499,
        &[ProductAction::Quantity(2), ProductAction::tag("organic")],
    )?;
    basket.increment("COKE-330")?;
    basket.discount(Discount::Percentage { bps: 1000 })?;
    basket.delivery_fee(Money::from_minor(390))?;

    println!("-- request 1 --");
    print_totals(&mut basket)?;

    // --- request 2: a fresh manager restores from the shared session ---------
    let mut basket =
        BasketManager::from_config(&config, MemoryStore::new(handler), events.clone())?;

    println!("-- request 2 --");
    print_totals(&mut basket)?;

    println!("events: {:?}", events.names());
    Ok(())
}

fn print_totals(
    basket: &mut BasketManager<MemoryStore, RecordingDispatcher>,
) -> BasketResult<()> {
    let order = basket.order()?.clone();
    println!(
        "{} lines, {} units, subtotal {} tax {} delivery {} => total {} {}",
        order.products.len(),
        order.products_count,
        order.subtotal,
        order.tax,
        order.delivery,
        order.total,
        order.currency,
    );
    Ok(())
}
