//! The `TerritoryStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `terra-store-sqlite`).
//! The HTTP layer depends on this abstraction, not on any concrete backend.
//!
//! Backends own the transactional guarantees: [`TerritoryStore::assign`]
//! and [`TerritoryStore::return_territory`] each run their read-check-write
//! sequence inside one transaction, and a rejected call leaves every row
//! untouched.

use std::future::Future;

use chrono::NaiveDate;

use crate::{
  AsDomainError,
  model::{
    Assignment, Campaign, Group, GroupSummary, NewAssignment, NewCampaign, NewPerson,
    NewTerritory, Person, Territory, TerritoryUpdate,
  },
  report::{
    AssignmentSuggestion, CampaignProgress, ConsistencyIssue, OverdueTerritory, StatusCounts,
    TerritoryFilter, TerritoryHistory, TerritoryRow,
  },
};

/// Abstraction over the relational store.
///
/// Lookups by id return `Ok(None)` when the row is absent; mutations that
/// need the row report [`crate::Error::NotFound`] through `Self::Error`.
/// All methods return `Send` futures so the trait can be used behind axum.
pub trait TerritoryStore: Send + Sync {
  type Error: std::error::Error + AsDomainError + Send + Sync + 'static;

  // ── Assignment lifecycle ──────────────────────────────────────────────

  /// Check a territory out to a person.
  ///
  /// Atomically flips the territory from `Available` to `InField` and
  /// inserts the open assignment. Fails with `NotFound` if the territory,
  /// person or campaign does not exist and with `InvalidState` if the
  /// territory is already in the field.
  fn assign(
    &self,
    input: NewAssignment,
  ) -> impl Future<Output = Result<Assignment, Self::Error>> + Send + '_;

  /// Close the open assignment of a territory and make it available again.
  ///
  /// Fails with `NotFound` if the territory has no open assignment.
  fn return_territory(
    &self,
    territory_id: i64,
    return_date: NaiveDate,
  ) -> impl Future<Output = Result<Assignment, Self::Error>> + Send + '_;

  // ── Reporting ─────────────────────────────────────────────────────────

  fn list_territories<'a>(
    &'a self,
    filter: &'a TerritoryFilter,
  ) -> impl Future<Output = Result<Vec<TerritoryRow>, Self::Error>> + Send + 'a;

  /// Every territory with its assignments, newest checkout first.
  fn territory_history(
    &self,
  ) -> impl Future<Output = Result<Vec<TerritoryHistory>, Self::Error>> + Send + '_;

  fn status_counts(&self) -> impl Future<Output = Result<StatusCounts, Self::Error>> + Send + '_;

  /// In-field territories checked out on or before `threshold`, oldest
  /// first.
  fn overdue_territories(
    &self,
    threshold: NaiveDate,
  ) -> impl Future<Output = Result<Vec<OverdueTerritory>, Self::Error>> + Send + '_;

  /// Available territories that have waited longest, never-returned first.
  fn assignment_suggestions(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<AssignmentSuggestion>, Self::Error>> + Send + '_;

  /// Campaigns, newest start date first, with coverage counts.
  fn campaign_progress(
    &self,
  ) -> impl Future<Output = Result<Vec<CampaignProgress>, Self::Error>> + Send + '_;

  /// Recompute each territory's status from its assignment rows and report
  /// every disagreement with the cached value.
  fn check_consistency(
    &self,
  ) -> impl Future<Output = Result<Vec<ConsistencyIssue>, Self::Error>> + Send + '_;

  // ── People ────────────────────────────────────────────────────────────

  fn create_person(
    &self,
    input: NewPerson,
  ) -> impl Future<Output = Result<Person, Self::Error>> + Send + '_;

  /// All people ordered by name.
  fn list_people(&self) -> impl Future<Output = Result<Vec<Person>, Self::Error>> + Send + '_;

  fn update_person(
    &self,
    id: i64,
    input: NewPerson,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + '_;

  /// Refuses with `Conflict` while the person holds an open assignment.
  fn delete_person(&self, id: i64) -> impl Future<Output = Result<Person, Self::Error>> + Send + '_;

  // ── Territories ───────────────────────────────────────────────────────

  fn create_territory(
    &self,
    input: NewTerritory,
  ) -> impl Future<Output = Result<Territory, Self::Error>> + Send + '_;

  fn get_territory(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Territory>, Self::Error>> + Send + '_;

  fn update_territory(
    &self,
    id: i64,
    input: TerritoryUpdate,
  ) -> impl Future<Output = Result<Option<Territory>, Self::Error>> + Send + '_;

  /// Refuses with `Conflict` while the territory is in the field. Closed
  /// assignment history goes with it.
  fn delete_territory(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Territory, Self::Error>> + Send + '_;

  // ── Groups ────────────────────────────────────────────────────────────

  /// Fails with `Conflict` if the name is taken.
  fn create_group(&self, name: String) -> impl Future<Output = Result<Group, Self::Error>> + Send + '_;

  fn list_groups(&self) -> impl Future<Output = Result<Vec<GroupSummary>, Self::Error>> + Send + '_;

  fn rename_group(
    &self,
    id: i64,
    name: String,
  ) -> impl Future<Output = Result<Option<Group>, Self::Error>> + Send + '_;

  /// Detach member territories, then delete the group, atomically.
  fn delete_group(&self, id: i64) -> impl Future<Output = Result<Group, Self::Error>> + Send + '_;

  /// Replace the group's membership with exactly `territory_ids`.
  fn set_group_territories(
    &self,
    id: i64,
    territory_ids: Vec<i64>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Campaigns ─────────────────────────────────────────────────────────

  fn create_campaign(
    &self,
    input: NewCampaign,
  ) -> impl Future<Output = Result<Campaign, Self::Error>> + Send + '_;

  fn update_campaign(
    &self,
    id: i64,
    input: NewCampaign,
  ) -> impl Future<Output = Result<Option<Campaign>, Self::Error>> + Send + '_;

  /// Assignments made under the campaign keep their history.
  fn delete_campaign(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Campaign, Self::Error>> + Send + '_;
}
