use crate::store::SubjectDelta;
use crate::subject::{Subject, SubjectId, PARTY_TYPE};

/// Where one record's slice of an incremental update gets routed.
#[derive(Debug, PartialEq)]
pub enum Route {
	/// A party already on screen changed: describe it in full and re-render,
	/// or destroy its row if it no longer exists.
	RefreshParty(SubjectId),
	/// A brand-new party: the insert payload is the whole record, no fetch
	/// needed.
	NewParty(Subject),
	/// An item already on screen changed: describe and re-render, or destroy
	/// its row if it no longer exists.
	RefreshItem(SubjectId),
	/// The list membership or order itself changed: re-project it.
	Reproject,
}

/// Classifies one touched record by identity lookup against what is already
/// rendered, plus the type tag of inline insert payloads. No separate index
/// is maintained. Records that match nothing are ignored.
#[must_use]
pub fn classify(
	delta: &SubjectDelta<'_>,
	has_party_row: bool,
	has_item_row: bool,
	list: &SubjectId,
) -> Option<Route> {
	if has_party_row {
		return Some(Route::RefreshParty(delta.id.clone()));
	}
	if delta.inserted_type() == Some(PARTY_TYPE) {
		return Some(Route::NewParty(delta.inline_subject()));
	}
	if has_item_row {
		return Some(Route::RefreshItem(delta.id.clone()));
	}
	if delta.id == list {
		return Some(Route::Reproject);
	}
	None
}
