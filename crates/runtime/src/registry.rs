//! Generation-checked registry of tracked instances.
//!
//! Ids pack a slot index and a generation. A destroyed slot is recycled with
//! a bumped generation, so a stale id resolves to [`Lookup::Destroyed`]
//! instead of aliasing whatever instance now lives in the slot. A slot whose
//! generation counter is exhausted is retired and never handed out again.
//!
//! All mutation happens under one [`RwLock`]. The value for a new instance is
//! built while the write lock is held, so concurrent lookups never observe a
//! partially constructed entry.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Stable identity of a tracked instance.
///
/// Encoded as `(generation << 32) | (slot + 1)`; zero is never issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(u64);

impl InstanceId {
	fn from_parts(slot: usize, generation: u32) -> Self {
		Self((u64::from(generation) << 32) | (slot as u64 + 1))
	}

	/// Rebuilds an id from its integer form.
	pub const fn from_raw(raw: u64) -> Self {
		Self(raw)
	}

	pub const fn as_u64(self) -> u64 {
		self.0
	}

	fn slot(self) -> Option<usize> {
		let low = (self.0 & u64::from(u32::MAX)) as usize;
		low.checked_sub(1)
	}

	fn generation(self) -> u32 {
		(self.0 >> 32) as u32
	}
}

impl fmt::Display for InstanceId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Identity of a native engine object, as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NativeKey(pub u64);

impl fmt::Display for NativeKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "native#{}", self.0)
	}
}

/// Whether an instance owns the native object it tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
	/// The instance releases the native object on destroy.
	Owned(NativeKey),
	/// The native object is owned elsewhere and must not be released.
	Borrowed(NativeKey),
}

impl Ownership {
	pub fn key(self) -> NativeKey {
		match self {
			Ownership::Owned(key) | Ownership::Borrowed(key) => key,
		}
	}

	pub fn is_owned(self) -> bool {
		matches!(self, Ownership::Owned(_))
	}
}

/// Result of resolving an id.
#[derive(Debug)]
pub enum Lookup<T> {
	Alive(Arc<T>),
	/// The id was issued and has since been destroyed.
	Destroyed,
	/// The id was never issued.
	NotFound,
}

impl<T> Lookup<T> {
	pub fn is_alive(&self) -> bool {
		matches!(self, Lookup::Alive(_))
	}

	/// Converts into a result carrying the matching error for dead ids.
	pub fn into_result(self, id: InstanceId) -> Result<Arc<T>> {
		match self {
			Lookup::Alive(value) => Ok(value),
			Lookup::Destroyed => Err(Error::InstanceDestroyed(id)),
			Lookup::NotFound => Err(Error::NotFound(id)),
		}
	}
}

enum Slot<T> {
	Occupied {
		generation: u32,
		ownership: Ownership,
		value: Arc<T>,
	},
	/// Free slot; `next` is the generation the next occupant receives.
	Vacant { next: u32 },
	/// Every generation of this slot has been used.
	Retired,
}

struct Inner<T> {
	slots: Vec<Slot<T>>,
	free: Vec<usize>,
	natives: HashMap<NativeKey, Vec<(InstanceId, Ownership)>>,
	live: usize,
}

/// Thread-safe registry of tracked instances keyed by [`InstanceId`].
pub struct Registry<T> {
	inner: RwLock<Inner<T>>,
}

impl<T> Default for Registry<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T> Registry<T> {
	pub fn new() -> Self {
		Self {
			inner: RwLock::new(Inner {
				slots: Vec::new(),
				free: Vec::new(),
				natives: HashMap::new(),
				live: 0,
			}),
		}
	}

	/// Registers a new instance and returns its id.
	///
	/// `build` receives the id and runs under the registry write lock; it must
	/// not call back into this registry.
	///
	/// # Panics
	///
	/// Panics if `ownership` is [`Ownership::Owned`] and another live instance
	/// already owns the same native object.
	pub fn create_with<F>(&self, ownership: Ownership, build: F) -> InstanceId
	where
		F: FnOnce(InstanceId) -> T,
	{
		let mut inner = self.inner.write();

		if let Ownership::Owned(key) = ownership {
			if let Some((owner, _)) = inner.natives.get(&key).and_then(|claims| claims.iter().find(|(_, o)| o.is_owned())) {
				panic!("{key} is already owned by instance {owner}");
			}
		}

		let (slot, generation) = match inner.free.pop() {
			Some(slot) => match inner.slots[slot] {
				Slot::Vacant { next } => (slot, next),
				_ => unreachable!("free list points at a non-vacant slot"),
			},
			None => {
				inner.slots.push(Slot::Vacant { next: 0 });
				(inner.slots.len() - 1, 0)
			}
		};

		let id = InstanceId::from_parts(slot, generation);
		let value = Arc::new(build(id));
		inner.slots[slot] = Slot::Occupied {
			generation,
			ownership,
			value,
		};
		inner.natives.entry(ownership.key()).or_default().push((id, ownership));
		inner.live += 1;

		tracing::debug!(%id, native = %ownership.key(), owned = ownership.is_owned(), "registered instance");
		id
	}

	/// Resolves an id.
	pub fn lookup(&self, id: InstanceId) -> Lookup<T> {
		let inner = self.inner.read();
		let Some(slot) = id.slot() else {
			return Lookup::NotFound;
		};
		let wanted = id.generation();
		match inner.slots.get(slot) {
			None => Lookup::NotFound,
			Some(Slot::Occupied { generation, value, .. }) => match wanted.cmp(generation) {
				std::cmp::Ordering::Equal => Lookup::Alive(Arc::clone(value)),
				std::cmp::Ordering::Less => Lookup::Destroyed,
				std::cmp::Ordering::Greater => Lookup::NotFound,
			},
			Some(Slot::Vacant { next }) if wanted < *next => Lookup::Destroyed,
			Some(Slot::Vacant { .. }) => Lookup::NotFound,
			Some(Slot::Retired) => Lookup::Destroyed,
		}
	}

	/// Resolves an id, failing with `InstanceDestroyed` or `NotFound`.
	pub fn get(&self, id: InstanceId) -> Result<Arc<T>> {
		self.lookup(id).into_result(id)
	}

	pub fn is_alive(&self, id: InstanceId) -> bool {
		self.lookup(id).is_alive()
	}

	/// Ownership recorded for a live instance.
	pub fn ownership(&self, id: InstanceId) -> Option<Ownership> {
		let inner = self.inner.read();
		match inner.slots.get(id.slot()?) {
			Some(Slot::Occupied { generation, ownership, .. }) if *generation == id.generation() => Some(*ownership),
			_ => None,
		}
	}

	/// Removes a live instance and returns its value.
	///
	/// Returns `None` when the id is already dead, which makes repeated and
	/// nested calls no-ops.
	pub fn destroy(&self, id: InstanceId) -> Option<Arc<T>> {
		let mut inner = self.inner.write();
		let slot = id.slot()?;
		let (ownership, generation) = match inner.slots.get(slot) {
			Some(Slot::Occupied { generation, ownership, .. }) if *generation == id.generation() => (*ownership, *generation),
			_ => return None,
		};

		let replacement = match generation.checked_add(1) {
			Some(next) => Slot::Vacant { next },
			None => Slot::Retired,
		};
		let recycle = matches!(replacement, Slot::Vacant { .. });
		let previous = std::mem::replace(&mut inner.slots[slot], replacement);
		if recycle {
			inner.free.push(slot);
		}

		let key = ownership.key();
		if let Some(claims) = inner.natives.get_mut(&key) {
			claims.retain(|(claimant, _)| *claimant != id);
			if claims.is_empty() {
				inner.natives.remove(&key);
			}
		}
		inner.live -= 1;

		tracing::debug!(%id, retired = !recycle, "removed instance");
		match previous {
			Slot::Occupied { value, .. } => Some(value),
			_ => None,
		}
	}

	/// Finds the live instance tracking a native object, preferring its owner.
	pub fn find_native(&self, key: NativeKey) -> Option<InstanceId> {
		let inner = self.inner.read();
		let claims = inner.natives.get(&key)?;
		claims
			.iter()
			.find(|(_, ownership)| ownership.is_owned())
			.or_else(|| claims.first())
			.map(|(id, _)| *id)
	}

	/// Snapshot of every live instance in slot order.
	pub fn alive(&self) -> Vec<(InstanceId, Arc<T>)> {
		let inner = self.inner.read();
		inner
			.slots
			.iter()
			.enumerate()
			.filter_map(|(slot, entry)| match entry {
				Slot::Occupied { generation, value, .. } => Some((InstanceId::from_parts(slot, *generation), Arc::clone(value))),
				_ => None,
			})
			.collect()
	}

	/// Number of live instances.
	pub fn len(&self) -> usize {
		self.inner.read().live
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

#[cfg(test)]
mod tests;
