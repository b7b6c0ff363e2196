use crate::subject::{Subject, SubjectId, Value, TYPE_FIELD};
use crate::surface::Severity;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single fact added by a transaction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Assert {
	/// `subject` gains `value` for `field`.
	Field {
		subject: SubjectId,
		field: String,
		value: Value,
	},
	/// `subject` is placed into `list` at `index`.
	///
	/// The index refers to the list as it was *before* the transaction;
	/// indexes past the end append.
	Slot {
		list: SubjectId,
		index: usize,
		subject: SubjectId,
	},
}

/// A single fact removed by a transaction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Retract {
	/// `subject` loses `value` for `field`. Retracting an absent value is a
	/// no-op, which is what makes concurrent edits of one field converge to a
	/// conflict set instead of failing.
	Field {
		subject: SubjectId,
		field: String,
		value: Value,
	},
	/// Every assertion about `subject` is removed; the record ceases to exist.
	Subject { subject: SubjectId },
	/// Every slot of `list` holding `subject` is removed.
	Slots { list: SubjectId, subject: SubjectId },
	/// The slot of `list` at `index` (pre-transaction) is removed.
	Slot { list: SubjectId, index: usize },
}

/// An atomic delete-set/insert-set pair.
///
/// The same shape serves as the write request and as the incremental update
/// notification a store hands back for every applied transaction, local or
/// remote.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
	pub deletes: Vec<Retract>,
	pub inserts: Vec<Assert>,
}

impl Transaction {
	#[must_use]
	pub fn assert(mut self, assert: Assert) -> Self {
		self.inserts.push(assert);
		self
	}

	#[must_use]
	pub fn retract(mut self, retract: Retract) -> Self {
		self.deletes.push(retract);
		self
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.deletes.is_empty() && self.inserts.is_empty()
	}

	/// Regroups the transaction by touched record, preserving first-touch
	/// order. A slot assertion or retraction touches the owning *list*
	/// identity, not the member record.
	#[must_use]
	pub fn by_subject(&self) -> Vec<SubjectDelta<'_>> {
		fn slot<'a>(deltas: &mut Vec<SubjectDelta<'a>>, id: &'a SubjectId) -> usize {
			match deltas.iter().position(|delta| delta.id == id) {
				Some(at) => at,
				None => {
					deltas.push(SubjectDelta {
						id,
						inserts: Vec::new(),
						deletes: Vec::new(),
					});
					deltas.len() - 1
				}
			}
		}
		let mut deltas = Vec::new();
		for retract in &self.deletes {
			let id = match retract {
				Retract::Field { subject, .. } | Retract::Subject { subject } => subject,
				Retract::Slots { list, .. } | Retract::Slot { list, .. } => list,
			};
			let at = slot(&mut deltas, id);
			deltas[at].deletes.push(retract);
		}
		for assert in &self.inserts {
			let id = match assert {
				Assert::Field { subject, .. } => subject,
				Assert::Slot { list, .. } => list,
			};
			let at = slot(&mut deltas, id);
			deltas[at].inserts.push(assert);
		}
		deltas
	}
}

/// One record's slice of an incremental update.
#[derive(Debug)]
pub struct SubjectDelta<'a> {
	pub id: &'a SubjectId,
	pub inserts: Vec<&'a Assert>,
	pub deletes: Vec<&'a Retract>,
}

impl SubjectDelta<'_> {
	/// The type tag carried inline by this update's inserts, if any.
	#[must_use]
	pub fn inserted_type(&self) -> Option<&str> {
		self.inserts.iter().find_map(|assert| match assert {
			Assert::Field {
				field,
				value: Value::Text(text),
				..
			} if field == TYPE_FIELD => Some(text.as_str()),
			_ => None,
		})
	}

	/// Reconstructs the record from the inline insert payload alone. Complete
	/// only for brand-new records, where the insert *is* the whole state.
	#[must_use]
	pub fn inline_subject(&self) -> Subject {
		let mut subject = Subject::new(self.id.clone());
		for assert in &self.inserts {
			if let Assert::Field { field, value, .. } = assert {
				subject.insert(field.clone(), value.clone());
			}
		}
		subject
	}
}

/// Point-in-time reads against authoritative state.
///
/// Within one update handler the view is held constant; see [`Store`].
pub trait StateView {
	/// The whole record, or `None` once nothing is asserted about it.
	fn describe(&self, id: &SubjectId) -> Option<Subject>;

	/// Every record carrying the given type tag, ordered by identity.
	fn subjects_of_type(&self, ty: &str) -> Vec<Subject>;

	/// The authoritative member order of a list. Empty for an absent list.
	fn list_order(&self, list: &SubjectId) -> Vec<SubjectId>;

	/// Current values of one field. Reads the live state, not any cache; an
	/// edit transaction must be built from this, never from a rendered value.
	fn field_values(&self, id: &SubjectId, field: &str) -> Vec<Value>;
}

/// A replicated form store.
///
/// Updates are delivered strictly one at a time through [`Store::take_update`];
/// the store never invokes the application re-entrantly, so a handler may
/// perform multi-step reads against a snapshot that cannot change under it.
pub trait Store: StateView {
	/// Durably applies the transaction and replicates it to peers. The store
	/// queues an update notification for its own writes too; rendering happens
	/// on that notification, the same as for a remote write.
	///
	/// # Errors
	///
	/// Rejected transactions leave state untouched as of the last successful
	/// write; the caller surfaces the error and may simply retry by editing
	/// again.
	fn write(&mut self, tx: Transaction) -> Result<(), StoreError>;

	/// Pulls and applies any transactions replicated by peers since the last
	/// call, queueing one update notification per transaction.
	///
	/// # Errors
	///
	/// Fails on undecodable replicated entries or a vanished relay.
	fn sync(&mut self) -> Result<(), StoreError>;

	/// Drains one queued update notification.
	fn take_update(&mut self) -> Option<Transaction>;

	fn status(&self) -> Status;
}

/// Connectivity as visible to this layer. The transport itself is never
/// touched directly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
	/// Whether this clone is currently the only participant.
	pub silo: bool,
}

/// Everything that can go wrong at the store boundary.
#[derive(Debug, Error)]
pub enum StoreError {
	/// The relay is gone; a session cannot start (or keep replicating).
	#[error("the form relay is closed")]
	Offline,
	/// Joining a form no other participant is present to load it from.
	#[error("this form exists, but no-one is around to load it from")]
	NoPeers,
	/// The store refused the transaction.
	#[error("write rejected: {0}")]
	Rejected(String),
	/// A replicated entry could not be decoded.
	#[error("malformed relay entry: {0}")]
	Wire(#[from] serde_json::Error),
	/// Raw control text declared numeric did not parse as a finite number.
	#[error("{0:?} is not a number")]
	NotANumber(String),
}

impl StoreError {
	/// How a failure is shown: [`StoreError::NoPeers`] is a soft condition
	/// (the session carries on locally), everything else is an error.
	#[must_use]
	pub fn severity(&self) -> Severity {
		match self {
			Self::NoPeers => Severity::Warning,
			_ => Severity::Error,
		}
	}
}
