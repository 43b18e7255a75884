//! Shared handle to the spec database.
//!
//! One SQLite connection behind a mutex. Pipeline workers run on the async
//! runtime and each call holds the lock only for a single short statement, so
//! the mutex is what serializes concurrent upserts.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use super::repository;
use super::sqlite::{open_database, open_memory_database};
use super::DatabaseError;
use crate::models::{Spec, SpecPage, SpecQuery};

pub struct SpecStore {
    conn: Mutex<Connection>,
}

impl SpecStore {
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        Ok(Self::from_connection(open_database(path)?))
    }

    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Ok(Self::from_connection(open_memory_database()?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, DatabaseError> {
        self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)
    }

    pub fn upsert(&self, spec: &Spec) -> Result<(), DatabaseError> {
        repository::upsert_spec(&*self.lock()?, spec)
    }

    pub fn get(&self, id: &str) -> Result<Option<Spec>, DatabaseError> {
        repository::get_spec(&*self.lock()?, id)
    }

    pub fn get_by_doc_id(&self, doc_id: &str) -> Result<Option<Spec>, DatabaseError> {
        repository::get_spec_by_doc_id(&*self.lock()?, doc_id)
    }

    pub fn doc_updated_at(&self, id: &str) -> Result<Option<DateTime<Utc>>, DatabaseError> {
        repository::get_doc_updated_at(&*self.lock()?, id)
    }

    pub fn touch_synced_at(&self, id: &str, at: DateTime<Utc>) -> Result<usize, DatabaseError> {
        repository::touch_synced_at(&*self.lock()?, id, at)
    }

    pub fn update_status(
        &self,
        id: &str,
        status: &str,
        now: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        repository::update_spec_status(&*self.lock()?, id, status, now)
    }

    pub fn delete_synced_before(&self, cutoff: DateTime<Utc>) -> Result<usize, DatabaseError> {
        repository::delete_specs_synced_before(&*self.lock()?, cutoff)
    }

    pub fn find_stale(
        &self,
        statuses: &[String],
        modified_before: DateTime<Utc>,
    ) -> Result<Vec<Spec>, DatabaseError> {
        repository::find_stale_specs(&*self.lock()?, statuses, modified_before)
    }

    pub fn list(&self, query: &SpecQuery) -> Result<SpecPage, DatabaseError> {
        repository::list_specs(&*self.lock()?, query)
    }

    pub fn authors(&self) -> Result<Vec<String>, DatabaseError> {
        repository::distinct_authors(&*self.lock()?)
    }

    pub fn teams(&self) -> Result<Vec<String>, DatabaseError> {
        repository::distinct_teams(&*self.lock()?)
    }
}
