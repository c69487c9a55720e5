mod harness;

use harness::{engine, fixture};
use serde_json::json;
use tether::{ContentsOptions, Error, EventKind, Kind, NativeContents, NativeKey, Size, SizeParams};

#[test]
fn guest_is_tied_to_its_embedder() {
	let fx = fixture();
	let parent = fx.host.create(ContentsOptions::default()).unwrap();
	let guest = fx.host.create(ContentsOptions::guest_of(parent.id())).unwrap();

	assert!(guest.is_guest().unwrap());
	assert!(!parent.is_guest().unwrap());
	assert_eq!(guest.kind().unwrap(), Kind::GuestEmbedded);
	assert_eq!(guest.embedder().unwrap(), Some(parent.clone()));
	assert_eq!(parent.embedder().unwrap(), None);
	assert_eq!(fx.host.guests_of(parent.id()), vec![guest.id()]);
}

#[test]
fn guest_of_dead_embedder_is_rejected() {
	let fx = fixture();
	let parent = fx.host.create(ContentsOptions::default()).unwrap();
	parent.destroy();

	let err = fx.host.create(ContentsOptions::guest_of(parent.id())).unwrap_err();
	assert!(err.is_destroyed());
	assert_eq!(fx.factory.created().len(), 1);
}

#[test]
fn guest_operations_on_non_guest_fail() {
	let fx = fixture();
	let contents = fx.host.create(ContentsOptions::default()).unwrap();

	let err = contents.set_size(SizeParams::fixed(Size::new(640, 480))).unwrap_err();
	assert!(matches!(err, Error::NotAGuest(id) if id == contents.id()));
	assert!(matches!(contents.set_allow_transparency(true), Err(Error::NotAGuest(_))));
	assert!(engine(&contents).calls().iter().all(|call| call != "set_size"));
}

#[test]
fn guest_size_merges_and_reaches_engine() {
	let fx = fixture();
	let parent = fx.host.create(ContentsOptions::default()).unwrap();
	let guest = fx
		.host
		.create(ContentsOptions::guest_of(parent.id()).with_size(SizeParams::fixed(Size::new(800, 600))))
		.unwrap();
	assert_eq!(engine(&guest).size().normal_size, Some(Size::new(800, 600)));

	guest
		.set_size(SizeParams {
			min_size: Some(Size::new(100, 100)),
			max_size: Some(Size::new(1000, 1000)),
			..SizeParams::default()
		})
		.unwrap();

	let size = guest.guest_embedding().unwrap().unwrap().size;
	assert_eq!(size.normal_size, Some(Size::new(800, 600)));
	assert_eq!(size.min_size, Some(Size::new(100, 100)));
	assert_eq!(engine(&guest).size(), size);
	assert!(
		fx.log
			.events()
			.iter()
			.any(|event| event.id == guest.id() && event.kind == EventKind::GuestResized { params: size })
	);
}

#[test]
fn inverted_guest_bounds_are_rejected() {
	let fx = fixture();
	let parent = fx.host.create(ContentsOptions::default()).unwrap();
	let guest = fx.host.create(ContentsOptions::guest_of(parent.id())).unwrap();

	let err = guest
		.set_size(SizeParams {
			min_size: Some(Size::new(900, 900)),
			max_size: Some(Size::new(100, 100)),
			..SizeParams::default()
		})
		.unwrap_err();
	assert!(matches!(err, Error::InvalidArgument(_)));
	assert_eq!(guest.guest_embedding().unwrap().unwrap().size, SizeParams::default());
}

#[test]
fn transparency_is_forwarded() {
	let fx = fixture();
	let parent = fx.host.create(ContentsOptions::default()).unwrap();
	let guest = fx.host.create(ContentsOptions::guest_of(parent.id())).unwrap();
	assert!(!engine(&guest).allows_transparency());

	guest.set_allow_transparency(true).unwrap();
	assert!(engine(&guest).allows_transparency());
	assert!(guest.guest_embedding().unwrap().unwrap().allow_transparency);
}

#[test]
fn guests_are_released_before_their_embedder() {
	let fx = fixture();
	let parent = fx.host.create(ContentsOptions::default()).unwrap();
	let first = fx.host.create(ContentsOptions::guest_of(parent.id())).unwrap();
	let second = fx.host.create(ContentsOptions::guest_of(parent.id())).unwrap();
	let nested = fx.host.create(ContentsOptions::guest_of(first.id())).unwrap();
	let bystander = fx.host.create(ContentsOptions::default()).unwrap();
	let parent_key = engine(&parent).native_key();
	let first_key = engine(&first).native_key();
	let nested_key = engine(&nested).native_key();

	assert!(parent.destroy());

	for handle in [&parent, &first, &second, &nested] {
		assert!(!handle.is_alive());
	}
	assert!(bystander.is_alive());

	let order = fx.factory.release_order();
	assert_eq!(order.len(), 4);
	assert_eq!(order.last(), Some(&parent_key));
	let position = |key: NativeKey| order.iter().position(|released| *released == key).unwrap();
	assert!(position(nested_key) < position(first_key));

	let destroyed: Vec<_> = fx
		.log
		.events()
		.into_iter()
		.filter(|event| event.kind == EventKind::Destroyed)
		.map(|event| event.id)
		.collect();
	assert_eq!(destroyed.last(), Some(&parent.id()));
}

#[tokio::test]
async fn embedder_destroy_releases_guest_sync_sends() {
	let fx = fixture();
	fx.host.start();
	let parent = fx.host.create(ContentsOptions::default()).unwrap();
	let guest = fx.host.create(ContentsOptions::guest_of(parent.id())).unwrap();
	let mut endpoint = engine(&guest).take_endpoint().unwrap();

	let waiting = guest.clone();
	let pending = tokio::spawn(async move { waiting.send_sync("ping", vec![json!(1)]).await });
	endpoint.recv().await.unwrap();

	parent.destroy();
	let err = pending.await.unwrap().unwrap_err();
	assert!(matches!(err, Error::InstanceDestroyed(id) if id == guest.id()));
}
