use conform::relay::Relay;
use conform::store::StateView;
use conform::subject::{SubjectId, Value, TYPE_FIELD};

use form_fixture_::{genesis_session, item_field, item_order, party_field};

#[test]
fn genesis_bootstrap_comes_up_empty_and_ready() {
	let relay = Relay::new();
	let session = genesis_session(&relay, "invoice-42");
	assert_eq!(session.surface().title, "invoice-42");
	assert!(session.surface().ready);
	assert!(session.surface().notice.is_none());
	assert!(session.items().is_empty());
	assert_eq!(session.parties().count(), 0);
	assert!(session.is_silo());
}

#[test]
fn added_item_appears_with_its_defaults() {
	let relay = Relay::new();
	let mut session = genesis_session(&relay, "f");
	let item = session.add_item();
	// Nothing is rendered until the store notifies the session of its own
	// write.
	assert!(session.items().is_empty());
	session.pump();
	assert_eq!(item_order(&session), [item.clone()]);
	assert_eq!(item_field(&session, &item, "quantity"), "1");
	assert_eq!(item_field(&session, &item, "product"), "");
	assert_eq!(
		session.store().field_values(&item, TYPE_FIELD),
		[Value::Text("item".to_owned())]
	);
}

#[test]
fn added_party_renders_from_the_inline_payload() {
	let relay = Relay::new();
	let mut session = genesis_session(&relay, "f");
	let party = session.add_party();
	session.pump();
	assert_eq!(party_field(&session, &party, "name"), "enter party name");
	assert!(session.surface().notice.is_none());
}

#[test]
fn removed_item_row_is_destroyed_not_cleared() {
	let relay = Relay::new();
	let mut session = genesis_session(&relay, "f");
	let first = session.add_item();
	let second = session.add_item();
	session.pump();
	let surviving_serial = session.items().row(&second).unwrap().serial;

	session.remove_item(&first);
	session.pump();
	assert_eq!(item_order(&session), [second.clone()]);
	assert!(session.items().row(&first).is_none());
	assert_eq!(session.items().row(&second).unwrap().serial, surviving_serial);
	assert!(session.store().describe(&first).is_none());
}

#[test]
fn removed_party_row_is_destroyed() {
	let relay = Relay::new();
	let mut session = genesis_session(&relay, "f");
	let party = session.add_party();
	session.pump();
	assert!(session.party_row(&party).is_some());

	session.remove_party(&party);
	session.pump();
	assert!(session.party_row(&party).is_none());
	assert_eq!(session.parties().count(), 0);
}

#[test]
fn moving_items_reorders_without_recreating_rows() {
	let relay = Relay::new();
	let mut session = genesis_session(&relay, "f");
	let a = session.add_item();
	let b = session.add_item();
	let c = session.add_item();
	session.pump();
	let serial_of = |session: &form_fixture_::HeadlessSession, id: &SubjectId| {
		session.items().row(id).unwrap().serial
	};
	let serials = [
		serial_of(&session, &a),
		serial_of(&session, &b),
		serial_of(&session, &c),
	];

	session.move_item_down(&a);
	session.pump();
	assert_eq!(item_order(&session), [b.clone(), a.clone(), c.clone()]);

	session.move_item_up(&c);
	session.pump();
	assert_eq!(item_order(&session), [b.clone(), c.clone(), a.clone()]);
	assert_eq!(
		serials,
		[
			serial_of(&session, &a),
			serial_of(&session, &b),
			serial_of(&session, &c),
		]
	);
}

#[test]
fn moves_at_the_edges_are_no_ops() {
	let relay = Relay::new();
	let mut session = genesis_session(&relay, "f");
	let a = session.add_item();
	let b = session.add_item();
	session.pump();

	session.move_item_up(&a);
	session.move_item_down(&b);
	session.move_item_up(&SubjectId::from("missing"));
	session.pump();
	assert_eq!(item_order(&session), [a, b]);
}
