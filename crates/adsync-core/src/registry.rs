// ── Identity registry ──
//
// Per-graph uniqueness of directory-assigned numeric identifiers.
// Only container admission reserves and only container removal releases;
// constructors merely check availability.

use std::collections::HashSet;

use crate::error::CoreError;
use crate::model::{AccountId, GroupId, IdNamespace, RelativeId};

/// One identifier in its namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reservation {
    Relative(RelativeId),
    Account(AccountId),
    Group(GroupId),
}

impl Reservation {
    pub fn namespace(self) -> IdNamespace {
        match self {
            Self::Relative(_) => IdNamespace::RelativeId,
            Self::Account(_) => IdNamespace::AccountId,
            Self::Group(_) => IdNamespace::GroupId,
        }
    }

    pub fn value(self) -> u32 {
        match self {
            Self::Relative(id) => id.get(),
            Self::Account(id) => id.get(),
            Self::Group(id) => id.get(),
        }
    }

    fn duplicate(self) -> CoreError {
        CoreError::DuplicateIdentifier {
            namespace: self.namespace(),
            value: self.value(),
        }
    }
}

/// Reserved identifiers of one graph, one set per namespace.
#[derive(Debug, Clone, Default)]
pub struct IdentityRegistry {
    relative_ids: HashSet<u32>,
    account_ids: HashSet<u32>,
    group_ids: HashSet<u32>,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn set(&self, namespace: IdNamespace) -> &HashSet<u32> {
        match namespace {
            IdNamespace::RelativeId => &self.relative_ids,
            IdNamespace::AccountId => &self.account_ids,
            IdNamespace::GroupId => &self.group_ids,
        }
    }

    fn set_mut(&mut self, namespace: IdNamespace) -> &mut HashSet<u32> {
        match namespace {
            IdNamespace::RelativeId => &mut self.relative_ids,
            IdNamespace::AccountId => &mut self.account_ids,
            IdNamespace::GroupId => &mut self.group_ids,
        }
    }

    pub fn is_reserved(&self, reservation: Reservation) -> bool {
        self.set(reservation.namespace())
            .contains(&reservation.value())
    }

    /// Fail with `DuplicateIdentifier` if `reservation` is taken.
    pub fn check(&self, reservation: Reservation) -> Result<(), CoreError> {
        if self.is_reserved(reservation) {
            return Err(reservation.duplicate());
        }
        Ok(())
    }

    pub fn reserve(&mut self, reservation: Reservation) -> Result<(), CoreError> {
        if !self
            .set_mut(reservation.namespace())
            .insert(reservation.value())
        {
            return Err(reservation.duplicate());
        }
        Ok(())
    }

    /// Reserve every identifier in `batch` or none of them.
    pub fn reserve_all(&mut self, batch: &[Reservation]) -> Result<(), CoreError> {
        self.check_all(batch)?;
        for reservation in batch {
            self.set_mut(reservation.namespace())
                .insert(reservation.value());
        }
        Ok(())
    }

    /// Check a batch without reserving it, including collisions inside it.
    pub fn check_all(&self, batch: &[Reservation]) -> Result<(), CoreError> {
        let mut seen = HashSet::with_capacity(batch.len());
        for reservation in batch {
            if !seen.insert(*reservation) {
                return Err(reservation.duplicate());
            }
            self.check(*reservation)?;
        }
        Ok(())
    }

    /// Idempotent.
    pub fn release(&mut self, reservation: Reservation) {
        self.set_mut(reservation.namespace())
            .remove(&reservation.value());
    }

    pub fn release_all(&mut self, batch: &[Reservation]) {
        for reservation in batch {
            self.release(*reservation);
        }
    }

    pub fn len(&self, namespace: IdNamespace) -> usize {
        self.set(namespace).len()
    }

    pub fn is_empty(&self) -> bool {
        self.relative_ids.is_empty() && self.account_ids.is_empty() && self.group_ids.is_empty()
    }
}
