//! Integration tests for the order sync engine against in-memory ports

use std::sync::Arc;

use core_kernel::ContactId;
use domain_sync::ports::mock::{FixedResolver, MemorySettings, MockCrmPort, MockStorefront};
use domain_sync::ports::ContactResolver;
use domain_sync::{
    ContactAction, EngineConfig, NoopHooks, OrderSyncEngine, SyncError, SyncSettings,
    DEFAULT_CONTACT_SOURCE,
};
use rust_decimal_macros::dec;
use test_utils::{random_billing_address, AddressFixtures, ContactFixtures, OrderBuilder};

struct Harness {
    crm: Arc<MockCrmPort>,
    storefront: Arc<MockStorefront>,
    engine: OrderSyncEngine,
}

fn harness_with_resolver(resolver: Arc<dyn ContactResolver>) -> Harness {
    let crm = Arc::new(MockCrmPort::new());
    let storefront = Arc::new(MockStorefront::new());
    let settings = SyncSettings::new(Arc::new(MemorySettings::new()));
    settings
        .configure_financial_types(1.into(), 2.into())
        .unwrap();
    let engine = OrderSyncEngine::new(
        crm.clone(),
        storefront.clone(),
        resolver,
        settings,
        Arc::new(NoopHooks),
        EngineConfig {
            admin_url: "https://shop.example.org/wp-admin/".to_string(),
        },
    );
    Harness {
        crm,
        storefront,
        engine,
    }
}

fn harness() -> Harness {
    harness_with_resolver(Arc::new(FixedResolver::none()))
}

#[tokio::test]
async fn test_unknown_customer_creates_individual_contact() {
    let h = harness();
    let order = OrderBuilder::new().build();

    let outcome = h.engine.order_finalized(&order).await.unwrap();

    assert_eq!(outcome.contact_action, ContactAction::Created);
    let saves = h.crm.contact_saves.read().await;
    assert_eq!(saves.len(), 1);
    assert_eq!(saves[0].id, None);
    assert_eq!(saves[0].contact_type.as_deref(), Some("Individual"));
    assert_eq!(saves[0].display_name, "Jane Doe");
    assert_eq!(saves[0].source, DEFAULT_CONTACT_SOURCE);
}

#[tokio::test]
async fn test_last_name_only_billing_sends_untrimmed_display_name() {
    let h = harness();
    let mut billing = AddressFixtures::uk_billing();
    billing.first_name = String::new();
    let order = OrderBuilder::new().with_billing(billing).build();

    h.engine.order_finalized(&order).await.unwrap();

    let saves = h.crm.contact_saves.read().await;
    assert_eq!(saves[0].display_name, " Doe");
    // The note link label still uses the trimmed form.
    let notes = h.storefront.notes_for(order.id).await;
    assert!(notes[0].contains(">Doe</a>"), "note was: {}", notes[0]);
}

#[tokio::test]
async fn test_randomized_billing_block_files_all_sub_records() {
    let h = harness();
    let order = OrderBuilder::new()
        .with_billing(random_billing_address())
        .build();

    let outcome = h.engine.order_finalized(&order).await.unwrap();

    assert_eq!(outcome.contact_action, ContactAction::Created);
    // Address, phone, and email each come through exactly once.
    assert_eq!(h.crm.sub_record_creates().await, 3);
}

#[tokio::test]
async fn test_duplicate_match_updates_existing_contact() {
    let h = harness();
    let existing = h
        .crm
        .seed_contact(ContactFixtures::jane_doe(ContactId::new(901)))
        .await;
    let order = OrderBuilder::new().build();

    let outcome = h.engine.order_finalized(&order).await.unwrap();

    assert_eq!(outcome.contact_action, ContactAction::Updated);
    assert_eq!(outcome.contact_id, existing);
    let saves = h.crm.contact_saves.read().await;
    assert_eq!(saves[0].id, Some(existing));
    assert_eq!(saves[0].contact_type, None);
}

#[tokio::test]
async fn test_resolved_contact_contributes_only_its_source() {
    // The resolved contact has a different identity than the order's billing
    // block, so the duplicate rule finds nothing and a new contact is
    // created. The resolved contact's source string still carries over.
    let resolved = ContactId::new(333);
    let h = harness_with_resolver(Arc::new(FixedResolver::some(resolved)));
    let mut record = ContactFixtures::jane_doe(resolved);
    record.first_name = "Janet".to_string();
    record.email = Some("janet@example.org".to_string());
    h.crm.seed_contact(record).await;

    let order = OrderBuilder::new().build();
    let outcome = h.engine.order_finalized(&order).await.unwrap();

    assert_eq!(outcome.contact_action, ContactAction::Created);
    assert_ne!(outcome.contact_id, resolved);
    let saves = h.crm.contact_saves.read().await;
    assert_eq!(saves[0].source, "Imported 2019");
}

#[tokio::test]
async fn test_second_sync_creates_no_new_sub_records() {
    let h = harness();
    let order = OrderBuilder::new().build();

    h.engine.order_finalized(&order).await.unwrap();
    let creates_after_first = h.crm.sub_record_creates().await;
    assert!(creates_after_first > 0);

    h.engine.order_finalized(&order).await.unwrap();
    assert_eq!(h.crm.sub_record_creates().await, creates_after_first);
}

#[tokio::test]
async fn test_sub_records_filed_under_billing_location_type() {
    let h = harness();
    let order = OrderBuilder::new().build();

    h.engine.order_finalized(&order).await.unwrap();

    let addresses = h.crm.address_saves.read().await;
    assert_eq!(addresses.len(), 1);
    assert_eq!(addresses[0].location_type_id.as_u32(), 5);
    assert_eq!(addresses[0].street_address, "12 High Street");
    let phones = h.crm.phone_saves.read().await;
    assert_eq!(phones.len(), 1);
    assert_eq!(phones[0].phone, "020 7946 0000");
    let emails = h.crm.email_saves.read().await;
    assert_eq!(emails.len(), 1);
}

#[tokio::test]
async fn test_shipping_block_files_address_but_no_phone_or_email() {
    let h = harness();
    let order = OrderBuilder::new()
        .with_shipping(AddressFixtures::us_shipping())
        .build();

    h.engine.order_finalized(&order).await.unwrap();

    let addresses = h.crm.address_saves.read().await;
    assert_eq!(addresses.len(), 2);
    let shipping = addresses
        .iter()
        .find(|a| a.location_type_id.as_u32() == 6)
        .unwrap();
    assert_eq!(shipping.street_address, "500 Market Street");
    assert_eq!(shipping.name.as_deref(), Some("Acme Ltd"));
    // One phone and one email, both from the billing block.
    assert_eq!(h.crm.phone_saves.read().await.len(), 1);
    assert_eq!(h.crm.email_saves.read().await.len(), 1);
}

#[tokio::test]
async fn test_incomplete_address_block_is_skipped() {
    let h = harness();
    let mut billing = AddressFixtures::uk_billing();
    billing.postcode = String::new();
    let order = OrderBuilder::new().with_billing(billing).build();

    h.engine.order_finalized(&order).await.unwrap();

    assert!(h.crm.address_saves.read().await.is_empty());
    // Phone and email still sync; only the address needs street and postcode.
    assert_eq!(h.crm.phone_saves.read().await.len(), 1);
}

#[tokio::test]
async fn test_tax_free_order_files_full_total_under_standard_type() {
    let h = harness();
    let order = OrderBuilder::new()
        .with_total(dec!(45.00))
        .with_tax(dec!(0.00))
        .build();

    let outcome = h.engine.order_finalized(&order).await.unwrap();

    assert!(outcome.contribution_id.is_some());
    let saves = h.crm.contribution_saves.read().await;
    assert_eq!(saves[0].financial_type_id.as_u32(), 1);
    assert_eq!(saves[0].total_amount, dec!(45.00));
    assert_eq!(saves[0].invoice_id, "792_woocommerce");
    assert_eq!(saves[0].trxn_id, "Woocommerce Order - 792");
}

#[tokio::test]
async fn test_taxed_order_files_subtotal_under_vat_type() {
    let h = harness();
    let order = OrderBuilder::new()
        .with_total(dec!(45.00))
        .with_tax(dec!(5.00))
        .build();

    h.engine.order_finalized(&order).await.unwrap();

    let saves = h.crm.contribution_saves.read().await;
    assert_eq!(saves[0].financial_type_id.as_u32(), 2);
    assert_eq!(saves[0].total_amount, dec!(40.00));
    assert_eq!(saves[0].custom_values[0].value, "5.00");
}

#[tokio::test]
async fn test_contribution_source_itemizes_the_order() {
    let h = harness();
    let order = OrderBuilder::new().with_line_item("Gadget", 1).build();

    h.engine.order_finalized(&order).await.unwrap();

    let saves = h.crm.contribution_saves.read().await;
    assert_eq!(saves[0].source, "Widget x 2, Gadget x 1");
    assert_eq!(saves[0].note, saves[0].source);
}

#[tokio::test]
async fn test_contribution_failure_keeps_the_contact_sync() {
    let h = harness();
    h.crm.fail_op("save_contribution").await;
    let order = OrderBuilder::new().build();

    let outcome = h.engine.order_finalized(&order).await.unwrap();

    assert_eq!(outcome.contribution_id, None);
    assert_eq!(h.crm.contact_saves.read().await.len(), 1);
}

#[tokio::test]
async fn test_contact_write_failure_aborts_the_sync() {
    let h = harness();
    h.crm.fail_op("save_contact").await;
    let order = OrderBuilder::new().build();

    let err = h.engine.order_finalized(&order).await.unwrap_err();
    assert!(matches!(err, SyncError::ContactWrite { .. }));
    assert!(h.crm.contribution_saves.read().await.is_empty());
}

#[tokio::test]
async fn test_resolver_failure_aborts_the_sync() {
    let h = harness_with_resolver(Arc::new(FixedResolver::erroring("mapping store down")));
    let order = OrderBuilder::new().build();

    let err = h.engine.order_finalized(&order).await.unwrap_err();
    assert!(matches!(err, SyncError::ContactResolution { .. }));
}

#[tokio::test]
async fn test_sub_record_failure_keeps_contact_and_contribution() {
    let h = harness();
    h.crm.fail_op("save_address").await;
    let order = OrderBuilder::new().build();

    let outcome = h.engine.order_finalized(&order).await.unwrap();

    assert!(outcome.contribution_id.is_some());
    assert_eq!(h.crm.contact_saves.read().await.len(), 1);
}

#[tokio::test]
async fn test_notes_announce_contact_and_sub_record_creation() {
    let h = harness();
    let order = OrderBuilder::new().build();

    h.engine.order_finalized(&order).await.unwrap();

    let notes = h.storefront.notes_for(order.id).await;
    assert!(notes
        .iter()
        .any(|n| n.starts_with("Created new CRM contact")));
    assert!(notes
        .iter()
        .any(|n| n.contains("Created new CRM phone of type billing: 020 7946 0000")));
}

#[tokio::test]
async fn test_updates_do_not_add_creation_notes() {
    let h = harness();
    let order = OrderBuilder::new().build();

    h.engine.order_finalized(&order).await.unwrap();
    let first_run_notes = h.storefront.notes_for(order.id).await.len();

    // Change the phone so the second run updates the existing record.
    let mut order = order;
    order.billing.phone = Some("020 7946 0001".to_string());
    h.engine.order_finalized(&order).await.unwrap();

    let notes = h.storefront.notes_for(order.id).await;
    let new_notes = &notes[first_run_notes..];
    assert!(!new_notes
        .iter()
        .any(|n| n.contains("Created new CRM phone")));
}

#[tokio::test]
async fn test_note_failure_does_not_abort_the_sync() {
    let h = harness();
    h.storefront
        .fail_notes
        .store(true, std::sync::atomic::Ordering::Relaxed);
    let order = OrderBuilder::new().build();

    let outcome = h.engine.order_finalized(&order).await;
    assert!(outcome.is_ok());
}

#[tokio::test]
async fn test_status_change_updates_the_filed_contribution() {
    let h = harness();
    let order = OrderBuilder::new().build();
    let outcome = h.engine.order_finalized(&order).await.unwrap();

    h.engine.order_status_changed(order.id, "wc-refunded").await;

    let updates = h.crm.status_updates.read().await;
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].0, outcome.contribution_id.unwrap());
    assert_eq!(updates[0].1.as_u32(), 7);
}

#[tokio::test]
async fn test_status_change_without_contribution_is_a_no_op() {
    let h = harness();

    h.engine
        .order_status_changed(core_kernel::OrderId::new(9999), "completed")
        .await;

    assert!(h.crm.status_updates.read().await.is_empty());
}

#[tokio::test]
async fn test_status_change_skips_when_already_current() {
    let h = harness();
    let order = OrderBuilder::new().with_status("completed").build();
    h.engine.order_finalized(&order).await.unwrap();

    h.engine.order_status_changed(order.id, "completed").await;

    assert!(h.crm.status_updates.read().await.is_empty());
}

#[tokio::test]
async fn test_missing_financial_type_fails_contribution_only() {
    let crm = Arc::new(MockCrmPort::new());
    let storefront = Arc::new(MockStorefront::new());
    let engine = OrderSyncEngine::new(
        crm.clone(),
        storefront,
        Arc::new(FixedResolver::none()),
        SyncSettings::new(Arc::new(MemorySettings::new())),
        Arc::new(NoopHooks),
        EngineConfig {
            admin_url: "https://shop.example.org/wp-admin/".to_string(),
        },
    );
    let order = OrderBuilder::new().build();

    let outcome = engine.order_finalized(&order).await.unwrap();

    assert_eq!(outcome.contribution_id, None);
    assert_eq!(crm.contact_saves.read().await.len(), 1);
}
