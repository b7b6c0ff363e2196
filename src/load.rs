use crate::binder::{self, ITEM_FIELDS, PARTY_FIELDS};
use crate::projector::ListProjector;
use crate::store::StateView;
use crate::subject::{SubjectId, PARTY_TYPE};
use crate::surface::{RowKind, Surface};
use hashbrown::HashMap;

pub fn load_parties<S: Surface>(
	view: &impl StateView,
	surface: &mut S,
	parties: &mut HashMap<SubjectId, S::Row>,
) -> bool {
	let mut conflicted = false;
	for subject in view.subjects_of_type(PARTY_TYPE) {
		let mut row = surface.create_row(&subject.id, RowKind::Party);
		conflicted |= binder::render(surface, &mut row, &subject, PARTY_FIELDS);
		parties.insert(subject.id.clone(), row);
	}
	conflicted
}

/// Projects the list's authoritative order, then populates every row created
/// by the structural pass. Serves both the initial load and a later
/// re-projection; rows that fell out of membership are destroyed.
pub fn load_items<S: Surface>(
	view: &impl StateView,
	surface: &mut S,
	items: &mut ListProjector<S::Row>,
	list: &SubjectId,
) -> bool {
	let order = view.list_order(list);
	let projection = items.project(&order, |id| surface.create_row(id, RowKind::Item));
	for (_, row) in projection.evicted {
		surface.remove_row(row);
	}
	let mut conflicted = false;
	for id in &projection.created {
		if let Some(subject) = view.describe(id) {
			if let Some(row) = items.row_mut(id) {
				conflicted |= binder::render(surface, row, &subject, ITEM_FIELDS);
			}
		}
	}
	conflicted
}
