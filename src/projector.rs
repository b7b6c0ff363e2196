use crate::subject::SubjectId;
use crate::temp_set::TempIdSet;
use tracing::{trace, trace_span, warn};

/// Reconciles an on-screen ordered row sequence against an authoritative
/// member order, owning the rows as a pure data structure.
///
/// Rows are opaque handles of type `R`: a widget reference, a table row, or
/// a plain struct in tests. The projector guarantees that a handle survives
/// every run in which its identifier is still a member: content state held in
/// the handle (focus, selection, half-typed input) is never lost to a
/// structural update.
#[derive(Debug)]
pub struct ListProjector<R> {
	rows: Vec<(SubjectId, R)>,
	seen: TempIdSet,
}

/// One structural mutation of the row sequence, in application order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RowOp {
	Insert { id: SubjectId, at: usize },
	Move { id: SubjectId, from: usize, to: usize },
	Remove { id: SubjectId },
}

/// The outcome of one projection run.
///
/// `created` identifiers have placeholder rows that still need their content
/// populated; population is deliberately left to the caller so a slow
/// per-record fetch never blocks the structural pass. `evicted` hands the
/// detached row handles back for destruction.
#[derive(Debug)]
pub struct Projection<R> {
	pub ops: Vec<RowOp>,
	pub created: Vec<SubjectId>,
	pub evicted: Vec<(SubjectId, R)>,
}

impl<R> Projection<R> {
	#[must_use]
	pub fn moves(&self) -> usize {
		self.ops.iter().filter(|op| matches!(op, RowOp::Move { .. })).count()
	}

	#[must_use]
	pub fn inserts(&self) -> usize {
		self.ops.iter().filter(|op| matches!(op, RowOp::Insert { .. })).count()
	}
}

impl<R> ListProjector<R> {
	#[must_use]
	pub fn new() -> Self {
		Self {
			rows: Vec::new(),
			seen: TempIdSet::new(),
		}
	}

	/// Makes the owned row sequence agree with `order`, index for index.
	///
	/// The walk keeps a moving insertion anchor: each identifier's row is
	/// resolved (existing, or a fresh placeholder from `create`) and moved up
	/// to the anchor only when it is not already there, so an unchanged order
	/// touches nothing. Rows left beyond the final anchor are stale and come
	/// back in [`Projection::evicted`].
	///
	/// `order` must not repeat an identifier; debug builds panic on a
	/// duplicate, release builds keep the first occurrence.
	pub fn project(&mut self, order: &[SubjectId], mut create: impl FnMut(&SubjectId) -> R) -> Projection<R> {
		let span = trace_span!("project", members = order.len(), rows = self.rows.len());
		let _enter = span.enter();

		let Self { rows, seen } = self;
		let seen = seen.temp();
		let mut ops = Vec::new();
		let mut created = Vec::new();
		let mut anchor = 0;
		for id in order {
			if !seen.insert(id.clone()) {
				debug_assert!(false, "duplicate identifier in authoritative order: {}", id);
				warn!(%id, "duplicate identifier in authoritative order");
				continue;
			}
			match rows[anchor..].iter().position(|(row_id, _)| row_id == id) {
				Some(0) => {}
				Some(offset) => {
					let from = anchor + offset;
					let row = rows.remove(from);
					rows.insert(anchor, row);
					trace!(%id, from, to = anchor, "row moved");
					ops.push(RowOp::Move {
						id: id.clone(),
						from,
						to: anchor,
					});
				}
				None => {
					rows.insert(anchor, (id.clone(), create(id)));
					trace!(%id, at = anchor, "row created");
					ops.push(RowOp::Insert {
						id: id.clone(),
						at: anchor,
					});
					created.push(id.clone());
				}
			}
			anchor += 1;
		}

		// Everything after the final anchor is no longer a member.
		let evicted = rows.split_off(anchor);
		for (id, _) in &evicted {
			trace!(%id, "row evicted");
			ops.push(RowOp::Remove { id: id.clone() });
		}
		trace!(scratch_capacity = self.seen.capacity(), "projection complete");
		Projection { ops, created, evicted }
	}

	/// Detaches one row out of band, preserving all other rows' order. Used
	/// when a record refresh finds the record gone before the list order
	/// itself has been re-read.
	pub fn remove(&mut self, id: &SubjectId) -> Option<R> {
		let at = self.rows.iter().position(|(row_id, _)| row_id == id)?;
		let (_, row) = self.rows.remove(at);
		Some(row)
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.rows.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}

	#[must_use]
	pub fn contains(&self, id: &SubjectId) -> bool {
		self.position(id).is_some()
	}

	#[must_use]
	pub fn position(&self, id: &SubjectId) -> Option<usize> {
		self.rows.iter().position(|(row_id, _)| row_id == id)
	}

	#[must_use]
	pub fn row(&self, id: &SubjectId) -> Option<&R> {
		self.rows.iter().find(|(row_id, _)| row_id == id).map(|(_, row)| row)
	}

	pub fn row_mut(&mut self, id: &SubjectId) -> Option<&mut R> {
		self.rows
			.iter_mut()
			.find(|(row_id, _)| row_id == id)
			.map(|(_, row)| row)
	}

	pub fn order(&self) -> impl Iterator<Item = &SubjectId> {
		self.rows.iter().map(|(id, _)| id)
	}
}

impl<R> Default for ListProjector<R> {
	fn default() -> Self {
		Self::new()
	}
}
