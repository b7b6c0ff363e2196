use crate::relay::{Relay, RelayHandle};
use crate::store::{Assert, Retract, StateView, Status, Store, StoreError, Transaction};
use crate::subject::{Subject, SubjectId, Value};
use hashbrown::HashMap;
use std::collections::VecDeque;
use tracing::{debug, trace, warn};

/// Reference [`Store`]: plain in-memory field and list tables replicated
/// through a [`Relay`].
///
/// Fields have set semantics (see [`Subject`]), which is what turns two
/// concurrent edits of one field into a visible conflict set rather than a
/// silent overwrite. Lists are kept as explicit orders; positional writes are
/// re-based against the pre-transaction order (see [`Assert::Slot`]).
pub struct MemoryStore {
	subjects: HashMap<SubjectId, Subject>,
	lists: HashMap<SubjectId, Vec<SubjectId>>,
	updates: VecDeque<Transaction>,
	relay: RelayHandle,
}

impl MemoryStore {
	/// Attaches to the relay and revs up: every transaction already in the
	/// log is replayed into local state *without* queueing update
	/// notifications, since nothing has been rendered yet.
	///
	/// # Errors
	///
	/// [`StoreError::Offline`] when the relay is closed: fatal to the
	/// session.
	pub fn start(clone_id: &str, genesis: bool, relay: &Relay) -> Result<Self, StoreError> {
		let mut relay = relay.attach(clone_id)?;
		if genesis && !relay.virgin() {
			warn!(clone_id, "starting as genesis over a non-empty relay log");
		}
		let backlog = relay.drain()?;
		let mut store = Self {
			subjects: HashMap::new(),
			lists: HashMap::new(),
			updates: VecDeque::new(),
			relay,
		};
		debug!(clone_id, genesis, replayed = backlog.len(), "store started");
		for tx in &backlog {
			store.apply(tx);
		}
		Ok(store)
	}

	fn apply(&mut self, tx: &Transaction) {
		// Positional deletes are resolved against the pre-transaction order,
		// then removed back-to-front; inserts are re-based afterwards.
		let mut unslotted: HashMap<SubjectId, Vec<usize>> = HashMap::new();
		for retract in &tx.deletes {
			match retract {
				Retract::Field {
					subject,
					field,
					value,
				} => {
					if let Some(record) = self.subjects.get_mut(subject) {
						record.remove(field, value);
						if record.is_empty() {
							self.subjects.remove(subject);
						}
					}
				}
				Retract::Subject { subject } => {
					self.subjects.remove(subject);
				}
				Retract::Slots { list, subject } => {
					let positions = unslotted.entry(list.clone()).or_default();
					for (at, member) in self.list(list).iter().enumerate() {
						if member == subject && !positions.contains(&at) {
							positions.push(at);
						}
					}
				}
				Retract::Slot { list, index } => {
					if *index < self.list(list).len() {
						let positions = unslotted.entry(list.clone()).or_default();
						if !positions.contains(index) {
							positions.push(*index);
						}
					} else {
						warn!(%list, index, "positional delete past end of list");
					}
				}
			}
		}
		for (list, positions) in &mut unslotted {
			positions.sort_unstable();
			if let Some(order) = self.lists.get_mut(list) {
				for at in positions.iter().rev() {
					let gone = order.remove(*at);
					trace!(%list, at, %gone, "slot removed");
				}
			}
		}
		for assert in &tx.inserts {
			match assert {
				Assert::Field {
					subject,
					field,
					value,
				} => {
					self.subjects
						.entry(subject.clone())
						.or_insert_with(|| Subject::new(subject.clone()))
						.insert(field.clone(), value.clone());
				}
				Assert::Slot {
					list,
					index,
					subject,
				} => {
					let removed_before = unslotted
						.get(list)
						.map_or(0, |positions| positions.iter().filter(|at| **at < *index).count());
					let order = self.lists.entry(list.clone()).or_default();
					let at = (index - removed_before).min(order.len());
					order.insert(at, subject.clone());
					trace!(%list, at, %subject, "slot inserted");
				}
			}
		}
	}

	fn list(&self, list: &SubjectId) -> &[SubjectId] {
		self.lists.get(list).map_or(&[], Vec::as_slice)
	}

	fn validate(tx: &Transaction) -> Result<(), StoreError> {
		for assert in &tx.inserts {
			if let Assert::Field {
				value: Value::Number(number),
				field,
				..
			} = assert
			{
				if !number.is_finite() {
					return Err(StoreError::Rejected(format!(
						"non-finite number for {:?}",
						field
					)));
				}
			}
		}
		Ok(())
	}
}

impl StateView for MemoryStore {
	fn describe(&self, id: &SubjectId) -> Option<Subject> {
		self.subjects.get(id).filter(|record| !record.is_empty()).cloned()
	}

	fn subjects_of_type(&self, ty: &str) -> Vec<Subject> {
		let mut records: Vec<Subject> = self
			.subjects
			.values()
			.filter(|record| record.type_tag() == Some(ty))
			.cloned()
			.collect();
		records.sort_by(|a, b| a.id.cmp(&b.id));
		records
	}

	fn list_order(&self, list: &SubjectId) -> Vec<SubjectId> {
		self.list(list).to_vec()
	}

	fn field_values(&self, id: &SubjectId, field: &str) -> Vec<Value> {
		self.subjects
			.get(id)
			.map_or_else(Vec::new, |record| record.values(field).to_vec())
	}
}

impl Store for MemoryStore {
	fn write(&mut self, tx: Transaction) -> Result<(), StoreError> {
		if tx.is_empty() {
			trace!("empty transaction ignored");
			return Ok(());
		}
		Self::validate(&tx)?;
		// Publish before applying: a vanished relay rejects the write with
		// local state untouched, so there is nothing to roll back.
		self.relay.publish(&tx)?;
		self.apply(&tx);
		self.updates.push_back(tx);
		Ok(())
	}

	fn sync(&mut self) -> Result<(), StoreError> {
		let incoming = self.relay.drain()?;
		for tx in incoming {
			debug!(
				deletes = tx.deletes.len(),
				inserts = tx.inserts.len(),
				"applying replicated transaction"
			);
			self.apply(&tx);
			self.updates.push_back(tx);
		}
		Ok(())
	}

	fn take_update(&mut self) -> Option<Transaction> {
		self.updates.pop_front()
	}

	fn status(&self) -> Status {
		Status {
			silo: self.relay.peers() <= 1,
		}
	}
}
