use conform::projector::{ListProjector, Projection, RowOp};
use conform::subject::SubjectId;

use form_fixture_::init_tracing;

/// A stand-in row: the serial tells a surviving handle from a recreated one.
struct Row(u64);

struct Bench {
	projector: ListProjector<Row>,
	born: u64,
}

impl Bench {
	fn new() -> Self {
		init_tracing();
		Self {
			projector: ListProjector::new(),
			born: 0,
		}
	}

	fn project(&mut self, order: &[&str]) -> Projection<Row> {
		let born = &mut self.born;
		self.projector.project(&ids(order), |_| {
			*born += 1;
			Row(*born)
		})
	}

	fn order(&self) -> Vec<String> {
		self.projector.order().map(ToString::to_string).collect()
	}

	fn serial(&self, id: &str) -> u64 {
		self.projector
			.row(&SubjectId::from(id))
			.unwrap_or_else(|| panic!("no row for {}", id))
			.0
	}
}

fn ids(raw: &[&str]) -> Vec<SubjectId> {
	raw.iter().copied().map(SubjectId::from).collect()
}

#[test]
fn projects_to_the_exact_authoritative_order() {
	let mut bench = Bench::new();
	bench.project(&["a", "b", "c", "d"]);
	let projection = bench.project(&["d", "b", "e"]);
	assert_eq!(bench.order(), ["d", "b", "e"]);
	assert_eq!(projection.created, ids(&["e"]));
	let evicted: Vec<&SubjectId> = projection.evicted.iter().map(|(id, _)| id).collect();
	assert_eq!(evicted, [&SubjectId::from("a"), &SubjectId::from("c")]);
}

#[test]
fn preserves_row_identity_across_reorders() {
	let mut bench = Bench::new();
	bench.project(&["a", "b", "c"]);
	let before = [bench.serial("a"), bench.serial("b"), bench.serial("c")];
	let projection = bench.project(&["c", "a", "b"]);
	assert!(projection.created.is_empty());
	assert!(projection.evicted.is_empty());
	assert_eq!(before, [bench.serial("a"), bench.serial("b"), bench.serial("c")]);
}

#[test]
fn single_relocation_is_exactly_one_move() {
	let mut bench = Bench::new();
	bench.project(&["a", "b", "c"]);
	let projection = bench.project(&["b", "a", "c"]);
	assert_eq!(
		projection.ops,
		[RowOp::Move {
			id: SubjectId::from("b"),
			from: 1,
			to: 0,
		}]
	);
	assert_eq!(bench.order(), ["b", "a", "c"]);
}

#[test]
fn removal_evicts_exactly_the_departed_row() {
	let mut bench = Bench::new();
	bench.project(&["a", "b", "c", "d"]);
	let keep = [bench.serial("a"), bench.serial("c"), bench.serial("d")];
	let projection = bench.project(&["a", "c", "d"]);
	assert_eq!(projection.evicted.len(), 1);
	assert_eq!(projection.evicted[0].0, SubjectId::from("b"));
	assert!(projection.created.is_empty());
	assert_eq!(bench.order(), ["a", "c", "d"]);
	assert_eq!(keep, [bench.serial("a"), bench.serial("c"), bench.serial("d")]);
}

#[test]
fn unchanged_order_touches_nothing() {
	let mut bench = Bench::new();
	bench.project(&["a", "b", "c"]);
	let projection = bench.project(&["a", "b", "c"]);
	assert!(projection.ops.is_empty());
}

#[test]
fn net_append_is_a_single_insert() {
	let mut bench = Bench::new();
	bench.project(&["a", "b"]);
	let projection = bench.project(&["a", "b", "c"]);
	assert_eq!(
		projection.ops,
		[RowOp::Insert {
			id: SubjectId::from("c"),
			at: 2,
		}]
	);
	assert_eq!(projection.moves(), 0);
}

#[test]
fn empty_order_evicts_every_row() {
	let mut bench = Bench::new();
	bench.project(&["a", "b", "c"]);
	let projection = bench.project(&[]);
	assert_eq!(projection.evicted.len(), 3);
	assert!(projection.ops.iter().all(|op| matches!(op, RowOp::Remove { .. })));
	assert!(bench.projector.is_empty());
}

#[test]
#[cfg_attr(debug_assertions, should_panic(expected = "duplicate identifier"))]
fn duplicate_identifiers_are_a_caller_error() {
	let mut bench = Bench::new();
	let projection = bench.project(&["a", "a"]);
	// Release builds keep the first occurrence instead of panicking.
	assert_eq!(projection.created, ids(&["a"]));
}

#[test]
fn out_of_band_removal_keeps_the_rest() {
	let mut bench = Bench::new();
	bench.project(&["a", "b", "c"]);
	assert!(bench.projector.remove(&SubjectId::from("b")).is_some());
	assert!(bench.projector.remove(&SubjectId::from("b")).is_none());
	assert_eq!(bench.order(), ["a", "c"]);
}
