use crate::subject::SubjectId;
use hashbrown::HashSet;

/// A scratch identifier set whose allocation is reused across projection runs.
#[derive(Debug)]
pub struct TempIdSet(HashSet<SubjectId>);

impl TempIdSet {
	#[must_use]
	pub fn new() -> Self {
		Self(HashSet::new())
	}

	/// The set is cleared before each borrow, so no identifiers can leak
	/// between projection runs.
	pub fn temp(&mut self) -> &mut HashSet<SubjectId> {
		self.0.clear();
		&mut self.0
	}

	/// Retrieves the scratch set's capacity without clearing it first.
	#[must_use]
	pub fn capacity(&self) -> usize {
		self.0.capacity()
	}
}
