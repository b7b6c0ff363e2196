use crate::binder::{self, FieldSpec, ITEM_FIELDS, PARTY_FIELDS};
use crate::dispatch::{self, Route};
use crate::load;
use crate::memory::MemoryStore;
use crate::projector::ListProjector;
use crate::relay::Relay;
use crate::store::{Assert, Retract, StateView, Store, StoreError, Transaction};
use crate::subject::{SubjectId, Value, ITEM_LIST, ITEM_TYPE, PARTY_TYPE, TYPE_FIELD};
use crate::surface::{Notice, RowKind, Severity, Surface, CONFLICT_NOTICE};
use hashbrown::HashMap;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Everything a session is told from outside before it starts.
#[derive(Clone, Debug)]
pub struct SessionConfig {
	/// The form identity, also shown as the page title.
	pub form_id: String,
	/// Handed out by the bootstrap server: whether this participant is the
	/// first for the form, i.e. whether to start fresh or join existing
	/// state.
	pub genesis: bool,
	/// Unique identity of this participant's store clone.
	pub clone_id: String,
}

impl SessionConfig {
	#[must_use]
	pub fn new(form_id: impl Into<String>, genesis: bool) -> Self {
		Self {
			form_id: form_id.into(),
			genesis,
			clone_id: Uuid::new_v4().to_string(),
		}
	}
}

/// One participant's live view of a shared form.
///
/// The session owns its store handle, surface, and row tables and is threaded
/// explicitly into every operation; there is no hidden global. Update
/// handling is single-threaded: [`Session::pump`] delivers queued updates one
/// at a time, and for the duration of each the store is a held-constant
/// snapshot, so multi-step read sequences inside a handler are safe from
/// interleaved remote mutation.
pub struct Session<S: Surface, St: Store = MemoryStore> {
	config: SessionConfig,
	store: St,
	surface: S,
	list: SubjectId,
	items: ListProjector<S::Row>,
	parties: HashMap<SubjectId, S::Row>,
}

impl<S: Surface> Session<S, MemoryStore> {
	/// Starts an in-memory store on `relay` and brings the form up on
	/// `surface`.
	///
	/// # Errors
	///
	/// Initialisation failure (a closed relay) is fatal to the session; the
	/// caller shows it as a persistent message.
	pub fn bootstrap(config: SessionConfig, relay: &Relay, surface: S) -> Result<Self, StoreError> {
		let store = MemoryStore::start(&config.clone_id, config.genesis, relay)?;
		Self::with_store(config, store, surface)
	}
}

impl<S: Surface, St: Store> Session<S, St> {
	/// Brings the form up on `surface` against an already-started store.
	///
	/// # Errors
	///
	/// As [`Session::bootstrap`].
	pub fn with_store(config: SessionConfig, store: St, mut surface: S) -> Result<Self, StoreError> {
		surface.set_ready(false);
		surface.set_title(&config.form_id);
		let mut session = Self {
			config,
			store,
			surface,
			list: SubjectId::from(ITEM_LIST),
			items: ListProjector::new(),
			parties: HashMap::new(),
		};
		if !session.config.genesis && session.store.status().silo {
			// The form was created earlier but nobody is here to replicate
			// it; not fatal, the session continues with whatever it has.
			session.report(&StoreError::NoPeers);
		}
		session.initial_state();
		session.surface.set_ready(true);
		info!(form = %session.config.form_id, "session ready");
		Ok(session)
	}

	/// Renders the whole current state: every party, then the item list in
	/// authoritative order.
	fn initial_state(&mut self) {
		let Self {
			store,
			surface,
			items,
			parties,
			list,
			..
		} = self;
		let mut conflicted = load::load_parties(&*store, surface, parties);
		conflicted |= load::load_items(&*store, surface, items, list);
		if conflicted {
			surface.show_notice(&conflict_notice());
		}
	}

	/// Pulls replicated transactions and drains queued updates (own writes
	/// and remote ones alike) through the dispatcher. Failures are funnelled
	/// to the notice sink; the pump itself never fails.
	pub fn pump(&mut self) {
		if let Err(err) = self.store.sync() {
			self.report(&err);
		}
		while let Some(update) = self.store.take_update() {
			self.incremental_change(&update);
		}
	}

	fn incremental_change(&mut self, update: &Transaction) {
		for delta in update.by_subject() {
			let route = dispatch::classify(
				&delta,
				self.parties.contains_key(delta.id),
				self.items.contains(delta.id),
				&self.list,
			);
			debug!(id = %delta.id, ?route, "update classified");
			if let Some(route) = route {
				self.run(route);
			}
		}
	}

	fn run(&mut self, route: Route) {
		match route {
			Route::RefreshParty(id) => match self.store.describe(&id) {
				Some(subject) => {
					let Self { surface, parties, .. } = self;
					if let Some(row) = parties.get_mut(&id) {
						if binder::render(surface, row, &subject, PARTY_FIELDS) {
							surface.show_notice(&conflict_notice());
						}
					}
				}
				None => {
					// Gone from authoritative state: the row is destroyed,
					// not merely cleared.
					if let Some(row) = self.parties.remove(&id) {
						self.surface.remove_row(row);
					}
				}
			},
			Route::NewParty(subject) => {
				let mut row = self.surface.create_row(&subject.id, RowKind::Party);
				if binder::render(&mut self.surface, &mut row, &subject, PARTY_FIELDS) {
					self.surface.show_notice(&conflict_notice());
				}
				self.parties.insert(subject.id.clone(), row);
			}
			Route::RefreshItem(id) => match self.store.describe(&id) {
				Some(subject) => {
					let Self { surface, items, .. } = self;
					if let Some(row) = items.row_mut(&id) {
						if binder::render(surface, row, &subject, ITEM_FIELDS) {
							surface.show_notice(&conflict_notice());
						}
					}
				}
				None => {
					if let Some(row) = self.items.remove(&id) {
						self.surface.remove_row(row);
					}
				}
			},
			Route::Reproject => {
				let Self {
					store,
					surface,
					items,
					list,
					..
				} = self;
				if load::load_items(&*store, surface, items, list) {
					surface.show_notice(&conflict_notice());
				}
			}
		}
	}

	/// Adds a new party with a placeholder name. The row appears when the
	/// store notifies the session of its own write, exactly as it would for a
	/// remote participant's.
	pub fn add_party(&mut self) -> SubjectId {
		let id = SubjectId::from(short_id());
		let tx = Transaction::default()
			.assert(field(&id, TYPE_FIELD, Value::Text(PARTY_TYPE.to_owned())))
			.assert(field(&id, "name", Value::Text("enter party name".to_owned())));
		self.write(tx);
		id
	}

	/// Appends a new item to the list at the current authoritative length.
	pub fn add_item(&mut self) -> SubjectId {
		let id = SubjectId::from(short_id());
		let end = self.store.list_order(&self.list).len();
		let tx = Transaction::default()
			.assert(field(&id, TYPE_FIELD, Value::Text(ITEM_TYPE.to_owned())))
			.assert(field(&id, "quantity", Value::Number(1.0)))
			.assert(Assert::Slot {
				list: self.list.clone(),
				index: end,
				subject: id.clone(),
			});
		self.write(tx);
		id
	}

	pub fn remove_party(&mut self, id: &SubjectId) {
		let tx = Transaction::default().retract(Retract::Subject { subject: id.clone() });
		self.write(tx);
	}

	pub fn remove_item(&mut self, id: &SubjectId) {
		let tx = Transaction::default()
			.retract(Retract::Subject { subject: id.clone() })
			.retract(Retract::Slots {
				list: self.list.clone(),
				subject: id.clone(),
			});
		self.write(tx);
	}

	/// Moves an item one position towards the front. No-op at the front edge
	/// or for an unknown item.
	pub fn move_item_up(&mut self, id: &SubjectId) {
		let Some(index) = self.items.position(id) else { return };
		if index == 0 {
			return;
		}
		self.move_item(id, index, index - 1);
	}

	/// Moves an item one position towards the back. The insert index is
	/// relative to the pre-move order, hence the offset of two.
	pub fn move_item_down(&mut self, id: &SubjectId) {
		let Some(index) = self.items.position(id) else { return };
		if index + 1 >= self.items.len() {
			return;
		}
		self.move_item(id, index, index + 2);
	}

	fn move_item(&mut self, id: &SubjectId, from: usize, to: usize) {
		let tx = Transaction::default()
			.retract(Retract::Slot {
				list: self.list.clone(),
				index: from,
			})
			.assert(Assert::Slot {
				list: self.list.clone(),
				index: to,
				subject: id.clone(),
			});
		self.write(tx);
	}

	/// One keystroke in one control: clears any visible notice, then commits
	/// the edit through the binder.
	pub fn edit_field(&mut self, id: &SubjectId, field: &str, raw: &str) {
		// The user acted, so whatever was on the message line is stale.
		self.surface.clear_notice();
		let specs = if self.parties.contains_key(id) {
			PARTY_FIELDS
		} else if self.items.contains(id) {
			ITEM_FIELDS
		} else {
			warn!(%id, "edit for a record with no row");
			return;
		};
		let Some(spec) = specs.iter().find(|spec| spec.name == field) else {
			warn!(%id, field, "edit for an unbound field");
			return;
		};
		if let Err(err) = binder::commit_edit(&mut self.store, id, spec, raw) {
			self.report(&err);
		}
	}

	fn write(&mut self, tx: Transaction) {
		if let Err(err) = self.store.write(tx) {
			self.report(&err);
		}
	}

	/// The single sink every failure funnels into.
	fn report(&mut self, err: &StoreError) {
		let notice = match err.severity() {
			Severity::Warning => {
				warn!(%err, "session warning");
				Notice::warning(err.to_string())
			}
			Severity::Error => {
				error!(%err, "session error");
				Notice::error(err.to_string())
			}
		};
		self.surface.show_notice(&notice);
	}

	/// Whether this participant is the last one holding the form, the cue
	/// for an "are you sure you want to leave" warning.
	#[must_use]
	pub fn is_silo(&self) -> bool {
		self.store.status().silo
	}

	#[must_use]
	pub fn config(&self) -> &SessionConfig {
		&self.config
	}

	#[must_use]
	pub fn surface(&self) -> &S {
		&self.surface
	}

	#[must_use]
	pub fn store(&self) -> &St {
		&self.store
	}

	#[must_use]
	pub fn items(&self) -> &ListProjector<S::Row> {
		&self.items
	}

	#[must_use]
	pub fn party_row(&self, id: &SubjectId) -> Option<&S::Row> {
		self.parties.get(id)
	}

	pub fn parties(&self) -> impl Iterator<Item = (&SubjectId, &S::Row)> {
		self.parties.iter()
	}
}

fn conflict_notice() -> Notice {
	Notice::warning(CONFLICT_NOTICE)
}

fn field(subject: &SubjectId, name: &str, value: Value) -> Assert {
	Assert::Field {
		subject: subject.clone(),
		field: name.to_owned(),
		value,
	}
}

fn short_id() -> String {
	let mut id = Uuid::new_v4().simple().to_string();
	id.truncate(8);
	id
}
