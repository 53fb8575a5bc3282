//! Local names taken under one parent.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use actor_core::ActorPath;

use crate::error::{ActorError, ActorResult};

#[derive(Debug, Default)]
struct Names {
    taken: BTreeSet<String>,
    /// Next candidate for a synthesized numeric name.
    next: u64,
}

/// The local names in use directly under one parent, either an actor or the
/// root of a system.
///
/// A name is held by a [`NameReservation`] for as long as its actor runs, so
/// no two live actors share a path.
#[derive(Debug, Default)]
pub(crate) struct NameTable {
    names: Mutex<Names>,
}

impl NameTable {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Reserve `name` under `parent`, failing if it is taken.
    pub(crate) fn reserve(
        self: &Arc<Self>,
        parent: &ActorPath,
        name: &str,
    ) -> ActorResult<NameReservation> {
        let path = parent.child(name)?;
        let mut names = self.lock();
        if !names.taken.insert(name.to_string()) {
            return Err(ActorError::DuplicateName(path.to_string()));
        }
        Ok(self.reservation(path, name))
    }

    /// Reserve the next synthesized number, skipping names taken explicitly.
    pub(crate) fn reserve_next(
        self: &Arc<Self>,
        parent: &ActorPath,
    ) -> ActorResult<NameReservation> {
        let mut names = self.lock();
        loop {
            let name = names.next.to_string();
            names.next += 1;
            if !names.taken.contains(&name) {
                let path = parent.child(&name)?;
                names.taken.insert(name.clone());
                return Ok(self.reservation(path, &name));
            }
        }
    }

    /// Reserve `base`, or `base-1`, `base-2`, ... if it is taken.
    pub(crate) fn reserve_unique(
        self: &Arc<Self>,
        parent: &ActorPath,
        base: &str,
    ) -> ActorResult<NameReservation> {
        let mut names = self.lock();
        let mut name = base.to_string();
        let mut suffix = 0u64;
        while names.taken.contains(&name) {
            suffix += 1;
            name = format!("{}-{}", base, suffix);
        }
        let path = parent.child(&name)?;
        names.taken.insert(name.clone());
        Ok(self.reservation(path, &name))
    }

    #[cfg(test)]
    pub(crate) fn is_taken(&self, name: &str) -> bool {
        self.lock().taken.contains(name)
    }

    fn release(&self, name: &str) {
        self.lock().taken.remove(name);
    }

    fn reservation(self: &Arc<Self>, path: ActorPath, name: &str) -> NameReservation {
        NameReservation {
            table: Arc::clone(self),
            path,
            name: Some(name.to_string()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Names> {
        // The set stays consistent even if a holder panicked.
        self.names.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A claimed path. The local name is freed on [`release`](Self::release) or
/// drop.
#[derive(Debug)]
pub(crate) struct NameReservation {
    table: Arc<NameTable>,
    path: ActorPath,
    name: Option<String>,
}

impl NameReservation {
    pub(crate) fn path(&self) -> &ActorPath {
        &self.path
    }

    pub(crate) fn release(&mut self) {
        if let Some(name) = self.name.take() {
            self.table.release(&name);
        }
    }
}

impl Drop for NameReservation {
    fn drop(&mut self) {
        self.release();
    }
}
