use std::sync::Arc;

use super::*;

fn owned(key: u64) -> Ownership {
	Ownership::Owned(NativeKey(key))
}

#[test]
fn first_id_is_one() {
	let registry = Registry::new();
	let id = registry.create_with(owned(10), |_| "a");
	assert_eq!(id.as_u64(), 1);
	assert!(registry.is_alive(id));
	assert_eq!(*registry.get(id).unwrap(), "a");
}

#[test]
fn build_sees_its_own_id() {
	let registry = Registry::new();
	let id = registry.create_with(owned(1), |id| id);
	assert_eq!(*registry.get(id).unwrap(), id);
}

#[test]
fn destroy_is_idempotent() {
	let registry = Registry::new();
	let id = registry.create_with(owned(1), |_| ());
	assert!(registry.destroy(id).is_some());
	assert!(registry.destroy(id).is_none());
	assert!(!registry.is_alive(id));
	assert!(matches!(registry.lookup(id), Lookup::Destroyed));
	assert!(matches!(registry.get(id), Err(Error::InstanceDestroyed(dead)) if dead == id));
}

#[test]
fn recycled_slot_never_aliases_stale_id() {
	let registry = Registry::new();
	let first = registry.create_with(owned(1), |_| "first");
	registry.destroy(first);

	let second = registry.create_with(owned(2), |_| "second");
	assert_ne!(first, second);
	assert!(matches!(registry.lookup(first), Lookup::Destroyed));
	assert_eq!(*registry.get(second).unwrap(), "second");
}

#[test]
fn unknown_ids_are_not_found() {
	let registry: Registry<()> = Registry::new();
	assert!(matches!(registry.lookup(InstanceId::from_raw(0)), Lookup::NotFound));
	assert!(matches!(registry.lookup(InstanceId::from_raw(42)), Lookup::NotFound));
	assert!(matches!(registry.get(InstanceId::from_raw(42)), Err(Error::NotFound(_))));
}

#[test]
fn future_generation_is_not_found() {
	let registry = Registry::new();
	let id = registry.create_with(owned(1), |_| ());
	let future = InstanceId::from_raw(id.as_u64() + (1 << 32));
	assert!(matches!(registry.lookup(future), Lookup::NotFound));
}

#[test]
#[should_panic(expected = "already owned")]
fn second_owner_panics() {
	let registry = Registry::new();
	registry.create_with(owned(7), |_| ());
	registry.create_with(owned(7), |_| ());
}

#[test]
fn borrowed_claims_coexist_with_owner() {
	let registry = Registry::new();
	let owner = registry.create_with(owned(7), |_| ());
	let wrapper = registry.create_with(Ownership::Borrowed(NativeKey(7)), |_| ());

	assert_eq!(registry.find_native(NativeKey(7)), Some(owner));
	assert_eq!(registry.ownership(wrapper), Some(Ownership::Borrowed(NativeKey(7))));

	registry.destroy(owner);
	assert_eq!(registry.find_native(NativeKey(7)), Some(wrapper));
	registry.destroy(wrapper);
	assert_eq!(registry.find_native(NativeKey(7)), None);
}

#[test]
fn owner_can_be_replaced_after_destroy() {
	let registry = Registry::new();
	let id = registry.create_with(owned(3), |_| ());
	registry.destroy(id);
	let again = registry.create_with(owned(3), |_| ());
	assert!(registry.is_alive(again));
}

#[test]
fn alive_lists_live_instances() {
	let registry = Registry::new();
	let a = registry.create_with(owned(1), |_| 'a');
	let b = registry.create_with(owned(2), |_| 'b');
	let c = registry.create_with(owned(3), |_| 'c');
	registry.destroy(b);

	let ids: Vec<_> = registry.alive().into_iter().map(|(id, _)| id).collect();
	assert_eq!(ids, vec![a, c]);
	assert_eq!(registry.len(), 2);
}

#[test]
fn exhausted_slot_is_retired() {
	let registry = Registry::new();
	let id = registry.create_with(owned(1), |_| ());
	{
		let mut inner = registry.inner.write();
		inner.slots[0] = Slot::Occupied {
			generation: u32::MAX,
			ownership: owned(1),
			value: Arc::new(()),
		};
	}
	let last = InstanceId::from_parts(0, u32::MAX);
	assert!(registry.destroy(last).is_some());
	assert!(matches!(registry.lookup(last), Lookup::Destroyed));
	assert!(matches!(registry.lookup(id), Lookup::Destroyed));

	let fresh = registry.create_with(owned(2), |_| ());
	assert_eq!(fresh.slot(), Some(1));
}

#[test]
fn lookups_from_other_threads_see_complete_entries() {
	let registry = Arc::new(Registry::new());
	let handles: Vec<_> = (0..4)
		.map(|n| {
			let registry = Arc::clone(&registry);
			std::thread::spawn(move || {
				(0..50)
					.map(|i| {
						let id = registry.create_with(owned(n * 1000 + i), move |id| id);
						assert_eq!(*registry.get(id).unwrap(), id);
						id
					})
					.collect::<Vec<_>>()
			})
		})
		.collect();

	let mut ids: Vec<_> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
	ids.sort();
	ids.dedup();
	assert_eq!(ids.len(), 200);
	assert_eq!(registry.len(), 200);
}
