//! In-memory staging of inserts, updates and deletes for one entity type.

use std::sync::{Mutex, MutexGuard};

use trackmybudget_core::errors::{DatabaseError, Error, Result};
use trackmybudget_core::Entity;
use uuid::Uuid;

/// A staged change, as it will be flushed on commit.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityState<T> {
    Added(T),
    Modified(T),
    Deleted(T),
}

impl<T: Entity> EntityState<T> {
    pub fn entity(&self) -> &T {
        match self {
            EntityState::Added(e) | EntityState::Modified(e) | EntityState::Deleted(e) => e,
        }
    }

    fn key(&self) -> Uuid {
        self.entity().id()
    }
}

/// Staged changes for one entity type, at most one entry per id per layer,
/// kept in staging order.
///
/// While a commit is running its batch sits in `in_flight`; changes staged in
/// the meantime go to `pending` and are applied on top of it.
pub struct ChangeTracker<T> {
    entries: Mutex<Layers<T>>,
}

struct Layers<T> {
    in_flight: Vec<EntityState<T>>,
    pending: Vec<EntityState<T>>,
}

impl<T: Entity> Default for ChangeTracker<T> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(Layers {
                in_flight: Vec::new(),
                pending: Vec::new(),
            }),
        }
    }
}

impl<T: Entity> ChangeTracker<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Layers<T>>> {
        self.entries
            .lock()
            .map_err(|_| Error::Database(DatabaseError::Internal("Change tracker poisoned".into())))
    }

    /// Stages an insert. An id that is already tracked, or whose insert or
    /// update is being committed, cannot be added again.
    pub fn add(&self, entity: T) -> Result<()> {
        let mut layers = self.lock()?;
        let id = entity.id();
        let in_flight_row = matches!(
            position_of(&layers.in_flight, id).map(|i| &layers.in_flight[i]),
            Some(EntityState::Added(_)) | Some(EntityState::Modified(_))
        );
        if in_flight_row || position_of(&layers.pending, id).is_some() {
            return Err(Error::ConstraintViolation(format!(
                "An entity with id {} is already being tracked",
                id
            )));
        }
        layers.pending.push(EntityState::Added(entity));
        Ok(())
    }

    /// Stages an update. A still-pending insert absorbs the new values instead.
    pub fn update(&self, entity: T) -> Result<()> {
        stage_update(&mut self.lock()?.pending, entity);
        Ok(())
    }

    /// Stages a delete. Removing a still-pending insert simply forgets it.
    pub fn remove(&self, entity: T) -> Result<()> {
        stage_remove(&mut self.lock()?.pending, entity);
        Ok(())
    }

    /// The staged state for `id`, if any.
    pub fn find(&self, id: Uuid) -> Result<Option<EntityState<T>>> {
        let layers = self.lock()?;
        let found = [&layers.pending, &layers.in_flight]
            .into_iter()
            .find_map(|layer| layer.iter().find(|e| e.key() == id))
            .cloned();
        Ok(found)
    }

    /// Applies staged changes on top of rows read from the store: modified
    /// and added rows replace stored ones, deleted rows are dropped, and
    /// added rows missing from the store are appended.
    pub fn overlay(&self, stored: Vec<T>) -> Result<Vec<T>> {
        let layers = self.lock()?;
        let committed = apply_layer(stored, &layers.in_flight);
        Ok(apply_layer(committed, &layers.pending))
    }

    /// Moves every pending change into the in-flight batch and returns a copy
    /// of it, in staging order.
    pub fn begin_commit(&self) -> Result<Vec<EntityState<T>>> {
        let mut layers = self.lock()?;
        if !layers.in_flight.is_empty() {
            return Err(Error::Database(DatabaseError::TransactionFailed(
                "A commit is already in progress".into(),
            )));
        }
        layers.in_flight = std::mem::take(&mut layers.pending);
        Ok(layers.in_flight.clone())
    }

    /// Settles the in-flight batch. A written batch is forgotten; a failed one
    /// goes back under whatever was staged while it ran.
    pub fn finish_commit(&self, written: bool) -> Result<()> {
        let mut layers = self.lock()?;
        let in_flight = std::mem::take(&mut layers.in_flight);
        if written {
            return Ok(());
        }

        let staged_since = std::mem::replace(&mut layers.pending, in_flight);
        for change in staged_since {
            match change {
                EntityState::Added(entity) => {
                    match position_of(&layers.pending, entity.id()) {
                        // The failed delete left the row in place.
                        Some(index) => layers.pending[index] = EntityState::Modified(entity),
                        None => layers.pending.push(EntityState::Added(entity)),
                    }
                }
                EntityState::Modified(entity) => stage_update(&mut layers.pending, entity),
                EntityState::Deleted(entity) => stage_remove(&mut layers.pending, entity),
            }
        }
        Ok(())
    }

    pub fn pending_count(&self) -> usize {
        self.entries
            .lock()
            .map(|l| l.in_flight.len() + l.pending.len())
            .unwrap_or(0)
    }
}

fn position_of<T: Entity>(entries: &[EntityState<T>], id: Uuid) -> Option<usize> {
    entries.iter().position(|e| e.key() == id)
}

fn stage_update<T: Entity>(entries: &mut Vec<EntityState<T>>, entity: T) {
    match position_of(entries, entity.id()) {
        Some(index) if matches!(entries[index], EntityState::Added(_)) => {
            entries[index] = EntityState::Added(entity)
        }
        Some(index) => entries[index] = EntityState::Modified(entity),
        None => entries.push(EntityState::Modified(entity)),
    }
}

fn stage_remove<T: Entity>(entries: &mut Vec<EntityState<T>>, entity: T) {
    match position_of(entries, entity.id()) {
        Some(index) if matches!(entries[index], EntityState::Added(_)) => {
            entries.remove(index);
        }
        Some(index) => entries[index] = EntityState::Deleted(entity),
        None => entries.push(EntityState::Deleted(entity)),
    }
}

fn apply_layer<T: Entity>(rows: Vec<T>, layer: &[EntityState<T>]) -> Vec<T> {
    let mut merged: Vec<T> = rows
        .into_iter()
        .filter_map(|row| match layer.iter().find(|e| e.key() == row.id()) {
            Some(EntityState::Added(e)) | Some(EntityState::Modified(e)) => Some(e.clone()),
            Some(EntityState::Deleted(_)) => None,
            None => Some(row),
        })
        .collect();
    for change in layer {
        if let EntityState::Added(entity) = change {
            if !merged.iter().any(|row| row.id() == entity.id()) {
                merged.push(entity.clone());
            }
        }
    }
    merged
}
