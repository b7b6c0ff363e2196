use crate::store::{StoreError, Transaction};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::trace;

/// In-process replication channel: a shared ordered log of JSON entries.
///
/// This is the message-passing service between clones, not a store: it holds
/// transactions in transit (and, because the log is retained, lets a late
/// joiner replay everything it missed). Each attached clone keeps a private
/// cursor; entries are only ever appended.
pub struct Relay {
	shared: Rc<RefCell<Shared>>,
}

#[derive(Default)]
struct Shared {
	log: Vec<String>,
	attached: usize,
	closed: bool,
}

#[derive(Serialize, Deserialize)]
struct Entry {
	origin: String,
	tx: Transaction,
}

impl Relay {
	#[must_use]
	pub fn new() -> Self {
		Self {
			shared: Rc::new(RefCell::new(Shared::default())),
		}
	}

	/// Registers a clone and hands it a cursor over the log.
	///
	/// # Errors
	///
	/// [`StoreError::Offline`] once the relay is closed.
	pub fn attach(&self, origin: &str) -> Result<RelayHandle, StoreError> {
		let mut shared = self.shared.borrow_mut();
		if shared.closed {
			return Err(StoreError::Offline);
		}
		shared.attached += 1;
		trace!(origin, attached = shared.attached, "clone attached");
		Ok(RelayHandle {
			shared: Rc::clone(&self.shared),
			origin: origin.to_owned(),
			cursor: 0,
		})
	}

	/// Shuts the relay down; attached handles keep their state but every
	/// further publish or drain fails.
	pub fn close(&self) {
		self.shared.borrow_mut().closed = true;
	}
}

impl Default for Relay {
	fn default() -> Self {
		Self::new()
	}
}

/// One clone's end of the relay.
pub struct RelayHandle {
	shared: Rc<RefCell<Shared>>,
	origin: String,
	cursor: usize,
}

impl RelayHandle {
	/// Appends a transaction to the log, tagged with this clone's identity.
	///
	/// # Errors
	///
	/// [`StoreError::Offline`] once the relay is closed.
	pub fn publish(&mut self, tx: &Transaction) -> Result<(), StoreError> {
		let entry = serde_json::to_string(&Entry {
			origin: self.origin.clone(),
			tx: tx.clone(),
		})?;
		let mut shared = self.shared.borrow_mut();
		if shared.closed {
			return Err(StoreError::Offline);
		}
		shared.log.push(entry);
		Ok(())
	}

	/// Entries published by *other* clones since the last drain, in log order.
	/// The cursor advances over this clone's own entries as well.
	///
	/// # Errors
	///
	/// [`StoreError::Offline`] once the relay is closed;
	/// [`StoreError::Wire`] for an undecodable entry.
	pub fn drain(&mut self) -> Result<Vec<Transaction>, StoreError> {
		let shared = self.shared.borrow();
		if shared.closed {
			return Err(StoreError::Offline);
		}
		let mut incoming = Vec::new();
		while self.cursor < shared.log.len() {
			let line = &shared.log[self.cursor];
			// Skip past the entry before propagating a decode failure, so one
			// poisoned entry cannot wedge the cursor.
			self.cursor += 1;
			let entry: Entry = serde_json::from_str(line)?;
			if entry.origin != self.origin {
				incoming.push(entry.tx);
			}
		}
		Ok(incoming)
	}

	/// How many clones are currently attached, this one included.
	#[must_use]
	pub fn peers(&self) -> usize {
		self.shared.borrow().attached
	}

	/// Whether the log holds any entries at all.
	#[must_use]
	pub fn virgin(&self) -> bool {
		self.shared.borrow().log.is_empty()
	}
}

impl Drop for RelayHandle {
	fn drop(&mut self) {
		let mut shared = self.shared.borrow_mut();
		shared.attached = shared.attached.saturating_sub(1);
		trace!(origin = %self.origin, attached = shared.attached, "clone detached");
	}
}
