use conform::relay::Relay;
use conform::session::{Session, SessionConfig};
use conform::store::StoreError;
use conform::surface::{HeadlessSurface, Severity};

use form_fixture_::{
	genesis_session, init_tracing, item_field, item_order, joining_session, party_field, settle,
};

#[test]
fn writes_propagate_to_every_open_session() {
	let relay = Relay::new();
	let mut alice = genesis_session(&relay, "f");
	let mut bob = joining_session(&relay, "f");

	let item = alice.add_item();
	let party = alice.add_party();
	settle(&mut alice, &mut bob);

	assert_eq!(item_order(&bob), [item.clone()]);
	assert_eq!(item_field(&bob, &item, "quantity"), "1");
	assert_eq!(party_field(&bob, &party, "name"), "enter party name");

	bob.edit_field(&item, "product", "widget");
	settle(&mut alice, &mut bob);
	assert_eq!(item_field(&alice, &item, "product"), "widget");
}

#[test]
fn a_late_joiner_revs_up_from_the_log() {
	let relay = Relay::new();
	let mut alice = genesis_session(&relay, "f");
	let first = alice.add_item();
	let second = alice.add_item();
	let party = alice.add_party();
	alice.pump();
	alice.edit_field(&first, "price", "9.99");
	alice.pump();

	let bob = joining_session(&relay, "f");
	assert_eq!(item_order(&bob), [first.clone(), second.clone()]);
	assert_eq!(item_field(&bob, &first, "price"), "9.99");
	assert_eq!(party_field(&bob, &party, "name"), "enter party name");
	assert!(bob.surface().notice.is_none());
	assert!(bob.surface().ready);
}

#[test]
fn moves_replicate_in_order() {
	let relay = Relay::new();
	let mut alice = genesis_session(&relay, "f");
	let mut bob = joining_session(&relay, "f");
	let a = alice.add_item();
	let b = alice.add_item();
	let c = alice.add_item();
	settle(&mut alice, &mut bob);

	bob.move_item_down(&a);
	settle(&mut alice, &mut bob);
	assert_eq!(item_order(&alice), [b.clone(), a.clone(), c.clone()]);
	assert_eq!(item_order(&bob), [b, a, c]);
}

#[test]
fn joining_an_empty_form_warns_but_continues() {
	init_tracing();
	let relay = Relay::new();
	let session = joining_session(&relay, "f");
	let notice = session.surface().notice.as_ref().expect("a notice");
	assert_eq!(notice.severity, Severity::Warning);
	assert_eq!(notice.text, StoreError::NoPeers.to_string());
	// Soft condition: the session still comes up and takes input.
	assert!(session.surface().ready);
}

#[test]
fn a_closed_relay_is_fatal_to_bootstrap() {
	init_tracing();
	let relay = Relay::new();
	relay.close();
	let result = Session::bootstrap(
		SessionConfig::new("f", true),
		&relay,
		HeadlessSurface::new(),
	);
	assert!(matches!(result, Err(StoreError::Offline)));
}

#[test]
fn silo_status_follows_the_peer_count() {
	let relay = Relay::new();
	let alice = genesis_session(&relay, "f");
	assert!(alice.is_silo());
	let bob = joining_session(&relay, "f");
	assert!(!alice.is_silo());
	assert!(!bob.is_silo());
	drop(bob);
	assert!(alice.is_silo());
}
