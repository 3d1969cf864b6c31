//! Container contracts and capability checks
//!
//! [`ValueContainer`] and [`SyncContainer`] let generic code accept either
//! store type. [`Probe`] answers the same question at runtime by asking an
//! object which contract members it exposes, never by checking its concrete
//! type, so handles from different crate versions or behind trait objects
//! are still recognised.

use std::rc::Rc;

use bitflags::bitflags;

use crate::persistence::PersistentStore;
use crate::store::{Store, Subscription, UpdateCallback};

/// get / set / subscribe
pub trait ValueContainer<T> {
    fn get_value(&self) -> T;

    fn set_value(&self, next: T);

    fn subscribe(&self, callback: Rc<UpdateCallback<T>>) -> Subscription;
}

/// A [`ValueContainer`] that can be reconciled with storage
pub trait SyncContainer<T>: ValueContainer<T> {
    fn sync(&self);

    fn sync_once(&self);

    fn save(&self);
}

impl<T: Clone + 'static> ValueContainer<T> for Store<T> {
    fn get_value(&self) -> T {
        Store::get_value(self)
    }

    fn set_value(&self, next: T) {
        Store::set_value(self, next)
    }

    fn subscribe(&self, callback: Rc<UpdateCallback<T>>) -> Subscription {
        self.on_update_rc(callback)
    }
}

impl<T: Clone + 'static> ValueContainer<T> for PersistentStore<T> {
    fn get_value(&self) -> T {
        PersistentStore::get_value(self)
    }

    fn set_value(&self, next: T) {
        PersistentStore::set_value(self, next)
    }

    fn subscribe(&self, callback: Rc<UpdateCallback<T>>) -> Subscription {
        self.on_update_rc(callback)
    }
}

impl<T: Clone + 'static> SyncContainer<T> for PersistentStore<T> {
    fn sync(&self) {
        PersistentStore::sync(self)
    }

    fn sync_once(&self) {
        PersistentStore::sync_once(self)
    }

    fn save(&self) {
        PersistentStore::save(self)
    }
}

bitflags! {
    /// Contract members an object exposes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Members: u8 {
        const GET_VALUE = 1 << 0;
        const SET_VALUE = 1 << 1;
        const ON_UPDATE = 1 << 2;
        const SYNC = 1 << 3;
        /// Everything [`is_store`] requires.
        const STORE = Self::GET_VALUE.bits() | Self::SET_VALUE.bits() | Self::ON_UPDATE.bits();
    }
}

/// Reports the contract members an object exposes.
pub trait Probe {
    fn members(&self) -> Members;
}

/// True if `x` exposes `get_value`, `set_value` and `on_update`.
pub fn is_store(x: &dyn Probe) -> bool {
    x.members().contains(Members::STORE)
}

/// True if `x` is a store that also exposes `sync`.
pub fn is_persistent_store(x: &dyn Probe) -> bool {
    is_store(x) && x.members().contains(Members::SYNC)
}

impl<T> Probe for Store<T> {
    fn members(&self) -> Members {
        Members::STORE
    }
}

impl<T> Probe for PersistentStore<T> {
    fn members(&self) -> Members {
        Members::STORE | Members::SYNC
    }
}

impl<T> Probe for dyn ValueContainer<T> {
    fn members(&self) -> Members {
        Members::STORE
    }
}

impl<T> Probe for dyn SyncContainer<T> {
    fn members(&self) -> Members {
        Members::STORE | Members::SYNC
    }
}

impl Probe for () {
    fn members(&self) -> Members {
        Members::empty()
    }
}

impl<P: Probe> Probe for Option<P> {
    fn members(&self) -> Members {
        self.as_ref().map(Probe::members).unwrap_or_default()
    }
}

impl<P: Probe + ?Sized> Probe for &P {
    fn members(&self) -> Members {
        (**self).members()
    }
}

impl<P: Probe + ?Sized> Probe for Rc<P> {
    fn members(&self) -> Members {
        (**self).members()
    }
}

impl<P: Probe + ?Sized> Probe for Box<P> {
    fn members(&self) -> Members {
        (**self).members()
    }
}
