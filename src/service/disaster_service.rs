//! Disaster service: the aggregate lifecycle with authorization, audit and
//! event emission.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tokio::sync::{Mutex, RwLock};
use utoipa::ToSchema;

use crate::domain::{
    AuditAction, AuditEntry, AuditTrail, Disaster, DisasterFilter, DisasterId, DisasterListing,
    DisasterPatch, EventSink, EventType, HubEvent, NewDisaster, User, normalize_tags,
};
use crate::error::HubError;
use crate::location::{GeocodeOutcome, LocationResolver};
use crate::persistence::{DisasterStorage, StorageError};

/// Result of [`DisasterService::create`].
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CreatedDisaster {
    /// The stored record.
    pub disaster: Disaster,
    /// Geocoding attempt for the resolved place name, if there was one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geocoding: Option<GeocodeOutcome>,
}

/// Orchestration layer for the disaster aggregate.
///
/// Every mutation follows the same shape: take the per-disaster lock →
/// validate and authorize → resolve location → append exactly one audit
/// entry → persist → release the lock → emit the domain event. A failed
/// mutation leaves no audit entry and emits nothing.
#[derive(Debug, Clone)]
pub struct DisasterService {
    storage: Arc<dyn DisasterStorage>,
    resolver: Arc<LocationResolver>,
    sink: Arc<dyn EventSink>,
    locks: Arc<RwLock<HashMap<DisasterId, Arc<Mutex<()>>>>>,
}

impl DisasterService {
    /// Creates a new `DisasterService`.
    #[must_use]
    pub fn new(
        storage: Arc<dyn DisasterStorage>,
        resolver: Arc<LocationResolver>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            storage,
            resolver,
            sink,
            locks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Returns the location resolver used for new and renamed locations.
    #[must_use]
    pub fn resolver(&self) -> &Arc<LocationResolver> {
        &self.resolver
    }

    async fn lock_for(&self, id: DisasterId) -> Arc<Mutex<()>> {
        if let Some(lock) = self.locks.read().await.get(&id) {
            return Arc::clone(lock);
        }
        let mut locks = self.locks.write().await;
        Arc::clone(locks.entry(id).or_default())
    }

    /// Drops the lock entry for `id` once no other caller holds or waits on
    /// it. Clones are only taken under the map lock, so a count of two (map
    /// plus `lock`) seen under the write lock means nobody else can reach it.
    async fn release_lock(&self, id: DisasterId, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.write().await;
        let idle = locks
            .get(&id)
            .is_some_and(|current| Arc::ptr_eq(current, &lock) && Arc::strong_count(&lock) == 2);
        if idle {
            locks.remove(&id);
        }
    }

    async fn load(&self, id: DisasterId) -> Result<Disaster, HubError> {
        self.storage.get(id).await?.ok_or(HubError::NotFound(id))
    }

    /// Creates a disaster owned by `actor`.
    ///
    /// Without an explicit `location_name` the place is extracted from the
    /// description. Extraction and geocoding failures only leave the
    /// corresponding fields empty.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] if the title or description is
    /// blank, or [`HubError::StorageUnavailable`] if persisting fails.
    pub async fn create(&self, actor: &User, input: NewDisaster) -> Result<CreatedDisaster, HubError> {
        let title = required("title", &input.title)?;
        let description = required("description", &input.description)?;

        let resolution = self
            .resolver
            .resolve(input.location_name.as_deref(), &description)
            .await;

        let mut details = BTreeMap::new();
        details.insert("location_extraction".to_string(), json!(resolution.extracted));
        details.insert("location_name".to_string(), json!(resolution.location_name));
        details.insert("geocoded".to_string(), json!(resolution.coordinates.is_some()));

        let mut disaster = Disaster {
            id: DisasterId::new(),
            title,
            description,
            location_name: resolution.location_name,
            resolved_coordinates: resolution.coordinates,
            tags: normalize_tags(&input.tags),
            owner_id: actor.id.clone(),
            created_at: Utc::now(),
            updated_at: None,
            audit_trail: AuditTrail::new(),
        };
        disaster
            .audit_trail
            .append(AuditEntry::new(AuditAction::Create, &actor.id, details));

        let stored = self.storage.insert(&disaster).await.map_err(storage_failure)?;

        let delivered = self
            .sink
            .emit(HubEvent::for_disaster(
                EventType::DisasterCreated,
                stored.id,
                json!({ "disaster": &stored }),
            ))
            .await;

        tracing::info!(
            disaster_id = %stored.id,
            user_id = %actor.id,
            location_extraction = resolution.extracted,
            geocoded = stored.resolved_coordinates.is_some(),
            delivered,
            "disaster created"
        );

        Ok(CreatedDisaster {
            disaster: stored,
            geocoding: resolution.geocoding,
        })
    }

    /// Returns one disaster.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotFound`] for an unknown id or
    /// [`HubError::StorageUnavailable`] on backend failure.
    pub async fn get(&self, id: DisasterId) -> Result<Disaster, HubError> {
        self.load(id).await
    }

    /// Lists disasters matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::StorageUnavailable`] on backend failure.
    pub async fn list(&self, filter: &DisasterFilter) -> Result<Vec<DisasterListing>, HubError> {
        self.storage.select(filter).await.map_err(storage_failure)
    }

    /// Returns the audit entries of one disaster, oldest first.
    ///
    /// # Errors
    ///
    /// Same as [`Self::get`].
    pub async fn audit_trail(&self, id: DisasterId) -> Result<Vec<AuditEntry>, HubError> {
        Ok(self.load(id).await?.audit_trail.entries().to_vec())
    }

    /// Applies `patch` on behalf of `actor`.
    ///
    /// Only fields present in the patch are touched. A changed
    /// `location_name` is geocoded again; extraction is not re-run. The
    /// audit entry lists changed field names, not values.
    ///
    /// Ownership is checked before the patch is validated, so a caller who
    /// may not modify the disaster always gets [`HubError::Forbidden`].
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotFound`] for an unknown id,
    /// [`HubError::Forbidden`] if `actor` is neither owner nor admin,
    /// [`HubError::Validation`] for an empty patch or blank
    /// title/description, or [`HubError::StorageUnavailable`] on backend
    /// failure.
    pub async fn update(
        &self,
        id: DisasterId,
        patch: DisasterPatch,
        actor: &User,
    ) -> Result<Disaster, HubError> {
        let lock = self.lock_for(id).await;
        let guard = lock.lock().await;
        let result = self.apply_update(id, patch, actor).await;
        drop(guard);
        self.release_lock(id, lock).await;
        let (stored, changes) = result?;

        let delivered = self
            .sink
            .emit(HubEvent::for_disaster(
                EventType::DisasterUpdated,
                id,
                json!({ "disaster": &stored, "changes": changes }),
            ))
            .await;

        tracing::info!(
            disaster_id = %id,
            user_id = %actor.id,
            changes = ?changes,
            delivered,
            "disaster updated"
        );
        Ok(stored)
    }

    /// Runs an update while the disaster's lock is held.
    async fn apply_update(
        &self,
        id: DisasterId,
        patch: DisasterPatch,
        actor: &User,
    ) -> Result<(Disaster, Vec<&'static str>), HubError> {
        let mut disaster = self.load(id).await?;
        authorize(actor, &disaster, "update")?;

        if patch.is_empty() {
            return Err(HubError::Validation("no fields to update".to_string()));
        }
        let title = patch.title.as_deref().map(|t| required("title", t)).transpose()?;
        let description = patch
            .description
            .as_deref()
            .map(|d| required("description", d))
            .transpose()?;

        let mut changes: Vec<&'static str> = Vec::new();
        if let Some(title) = title.filter(|t| *t != disaster.title) {
            disaster.title = title;
            changes.push("title");
        }
        if let Some(description) = description.filter(|d| *d != disaster.description) {
            disaster.description = description;
            changes.push("description");
        }
        if let Some(tags) = patch.tags.as_ref().map(normalize_tags) {
            if tags != disaster.tags {
                disaster.tags = tags;
                changes.push("tags");
            }
        }

        let mut geocoding = None;
        if let Some(raw) = patch.location_name.as_deref() {
            let location_name = Some(raw.trim()).filter(|s| !s.is_empty()).map(str::to_string);
            if location_name != disaster.location_name {
                let outcome = match location_name.as_deref() {
                    Some(name) => Some(self.resolver.geocode(name).await),
                    None => None,
                };
                disaster.resolved_coordinates = outcome.as_ref().and_then(|g| g.coordinates);
                disaster.location_name = location_name;
                geocoding = outcome;
                changes.push("location_name");
            }
        }

        let mut details = BTreeMap::new();
        details.insert("changes".to_string(), json!(changes));
        if let Some(outcome) = geocoding.as_ref() {
            details.insert("geocoded".to_string(), json!(outcome.success));
        }
        disaster.updated_at = Some(Utc::now());
        disaster
            .audit_trail
            .append(AuditEntry::new(AuditAction::Update, &actor.id, details));

        let stored = self.storage.update(&disaster).await.map_err(|e| match e {
            StorageError::Missing(missing) => HubError::NotFound(missing),
            other => storage_failure(other),
        })?;
        Ok((stored, changes))
    }

    /// Deletes a disaster on behalf of `actor`. Returns the final snapshot,
    /// whose audit trail ends with the `delete` entry.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotFound`], [`HubError::Forbidden`] or
    /// [`HubError::StorageUnavailable`] as for [`Self::update`].
    pub async fn delete(&self, id: DisasterId, actor: &User) -> Result<Disaster, HubError> {
        let lock = self.lock_for(id).await;
        let guard = lock.lock().await;
        let result = self.apply_delete(id, actor).await;
        drop(guard);
        self.release_lock(id, lock).await;
        let snapshot = result?;

        let delivered = self
            .sink
            .emit(HubEvent::for_disaster(
                EventType::DisasterDeleted,
                id,
                json!({ "disaster": &snapshot }),
            ))
            .await;

        tracing::info!(disaster_id = %id, user_id = %actor.id, delivered, "disaster deleted");
        Ok(snapshot)
    }

    /// Runs a delete while the disaster's lock is held.
    async fn apply_delete(&self, id: DisasterId, actor: &User) -> Result<Disaster, HubError> {
        let mut snapshot = self.load(id).await?;
        authorize(actor, &snapshot, "delete")?;

        let mut details = BTreeMap::new();
        details.insert("title".to_string(), json!(snapshot.title));
        snapshot
            .audit_trail
            .append(AuditEntry::new(AuditAction::Delete, &actor.id, details));

        if !self.storage.delete(id).await.map_err(storage_failure)? {
            return Err(HubError::NotFound(id));
        }
        Ok(snapshot)
    }
}

fn required(field: &str, value: &str) -> Result<String, HubError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(HubError::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn authorize(actor: &User, disaster: &Disaster, action: &str) -> Result<(), HubError> {
    if actor.can_modify(&disaster.owner_id) {
        return Ok(());
    }
    tracing::warn!(
        disaster_id = %disaster.id,
        user_id = %actor.id,
        owner_id = %disaster.owner_id,
        action,
        "forbidden mutation attempt"
    );
    Err(HubError::Forbidden(format!(
        "not authorized to {action} this disaster"
    )))
}

fn storage_failure(err: StorageError) -> HubError {
    tracing::error!(error = %err, "storage operation failed");
    err.into()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::domain::Role;
    use crate::location::{
        Coordinates, ExtractedPlace, ExtractionMethod, GeocodeHit, Geocoder, LocationExtractor,
        ProviderError,
    };
    use crate::persistence::InMemoryStorage;

    #[derive(Debug)]
    struct FixedExtractor(Option<&'static str>);

    #[async_trait]
    impl LocationExtractor for FixedExtractor {
        async fn extract(&self, _text: &str) -> Result<ExtractedPlace, ProviderError> {
            Ok(match self.0 {
                Some(place) => ExtractedPlace {
                    place_name: place.to_string(),
                    confidence: 0.8,
                    method: ExtractionMethod::Pattern,
                },
                None => ExtractedPlace::unknown(),
            })
        }
    }

    #[derive(Debug)]
    struct FixedGeocoder(bool);

    #[async_trait]
    impl Geocoder for FixedGeocoder {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn geocode(&self, place: &str) -> Result<GeocodeHit, ProviderError> {
            if self.0 {
                Ok(GeocodeHit {
                    coordinates: Coordinates::new(40.7128, -74.006),
                    formatted_name: place.to_string(),
                    provider: "fixed".to_string(),
                })
            } else {
                Err(ProviderError::Unavailable("provider down".to_string()))
            }
        }

        async fn reverse_geocode(&self, _coordinates: Coordinates) -> Result<String, ProviderError> {
            Err(ProviderError::Unavailable("provider down".to_string()))
        }
    }

    #[derive(Debug, Default)]
    struct RecordingSink {
        events: Mutex<Vec<HubEvent>>,
    }

    #[async_trait]
    impl EventSink for RecordingSink {
        async fn emit(&self, event: HubEvent) -> usize {
            self.events.lock().await.push(event);
            1
        }
    }

    #[derive(Debug)]
    struct BrokenStorage;

    #[async_trait]
    impl DisasterStorage for BrokenStorage {
        async fn select(&self, _filter: &DisasterFilter) -> Result<Vec<DisasterListing>, StorageError> {
            Err(StorageError::Backend("connection refused".to_string()))
        }
        async fn get(&self, _id: DisasterId) -> Result<Option<Disaster>, StorageError> {
            Err(StorageError::Backend("connection refused".to_string()))
        }
        async fn insert(&self, _disaster: &Disaster) -> Result<Disaster, StorageError> {
            Err(StorageError::Backend("connection refused".to_string()))
        }
        async fn update(&self, _disaster: &Disaster) -> Result<Disaster, StorageError> {
            Err(StorageError::Backend("connection refused".to_string()))
        }
        async fn delete(&self, _id: DisasterId) -> Result<bool, StorageError> {
            Err(StorageError::Backend("connection refused".to_string()))
        }
    }

    struct Fixture {
        service: DisasterService,
        sink: Arc<RecordingSink>,
    }

    fn fixture(extracted: Option<&'static str>, geocodes: bool) -> Fixture {
        let resolver = LocationResolver::new(
            Arc::new(FixedExtractor(extracted)),
            Arc::new(FixedGeocoder(geocodes)),
            0.5,
        );
        let sink = Arc::new(RecordingSink::default());
        let service = DisasterService::new(
            Arc::new(InMemoryStorage::new()),
            Arc::new(resolver),
            Arc::clone(&sink) as Arc<dyn EventSink>,
        );
        Fixture { service, sink }
    }

    fn owner() -> User {
        User::new("citizen1", Role::Contributor)
    }

    fn flood() -> NewDisaster {
        NewDisaster {
            title: "Flood".to_string(),
            description: "Water rising fast near Main St".to_string(),
            location_name: None,
            tags: vec!["flood".to_string()],
        }
    }

    #[tokio::test]
    async fn create_extracts_and_geocodes_location() {
        let fx = fixture(Some("Main St"), true);
        let Ok(created) = fx.service.create(&owner(), flood()).await else {
            panic!("create should succeed");
        };
        let disaster = created.disaster;
        assert_eq!(disaster.location_name.as_deref(), Some("Main St"));
        assert!(disaster.resolved_coordinates.is_some());
        assert_eq!(disaster.audit_trail.len(), 1);
        let Some(entry) = disaster.audit_trail.first() else {
            panic!("expected create entry");
        };
        assert_eq!(entry.action, AuditAction::Create);
        assert_eq!(entry.detail("location_extraction"), Some(&json!(true)));
        assert_eq!(fx.sink.events.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn explicit_location_is_not_marked_extracted() {
        let fx = fixture(Some("Main St"), true);
        let mut input = flood();
        input.location_name = Some("Brooklyn".to_string());
        let Ok(created) = fx.service.create(&owner(), input).await else {
            panic!("create should succeed");
        };
        assert_eq!(created.disaster.location_name.as_deref(), Some("Brooklyn"));
        let Some(entry) = created.disaster.audit_trail.first() else {
            panic!("expected create entry");
        };
        assert_eq!(entry.detail("location_extraction"), Some(&json!(false)));
    }

    #[tokio::test]
    async fn geocode_failure_does_not_block_create() {
        let fx = fixture(Some("Main St"), false);
        let Ok(created) = fx.service.create(&owner(), flood()).await else {
            panic!("create should succeed");
        };
        assert!(created.disaster.resolved_coordinates.is_none());
        assert_eq!(created.disaster.location_name.as_deref(), Some("Main St"));
        assert!(created.geocoding.is_some_and(|g| !g.success));
    }

    #[tokio::test]
    async fn unknown_extraction_leaves_location_empty() {
        let fx = fixture(None, true);
        let Ok(created) = fx.service.create(&owner(), flood()).await else {
            panic!("create should succeed");
        };
        assert!(created.disaster.location_name.is_none());
        assert!(created.disaster.resolved_coordinates.is_none());
        assert!(created.geocoding.is_none());
    }

    #[tokio::test]
    async fn blank_title_is_rejected() {
        let fx = fixture(None, true);
        let mut input = flood();
        input.title = "   ".to_string();
        let result = fx.service.create(&owner(), input).await;
        assert!(matches!(result, Err(HubError::Validation(_))));
        assert!(fx.sink.events.lock().await.is_empty());
    }

    #[tokio::test]
    async fn update_records_changed_field_names() {
        let fx = fixture(Some("Main St"), true);
        let Ok(created) = fx.service.create(&owner(), flood()).await else {
            panic!("create should succeed");
        };
        let patch = DisasterPatch {
            title: Some("Flood".to_string()),
            description: Some("Water now at second floor".to_string()),
            tags: Some(vec!["flood".to_string(), "urgent".to_string()]),
            ..DisasterPatch::default()
        };
        let Ok(updated) = fx.service.update(created.disaster.id, patch, &owner()).await else {
            panic!("update should succeed");
        };
        assert!(updated.updated_at.is_some());
        assert!(updated.has_tag("urgent"));
        let Some(entry) = updated.audit_trail.last() else {
            panic!("expected update entry");
        };
        assert_eq!(entry.action, AuditAction::Update);
        assert_eq!(entry.detail("changes"), Some(&json!(["description", "tags"])));

        let events = fx.sink.events.lock().await;
        let Some(last) = events.last() else {
            panic!("expected update event");
        };
        assert_eq!(last.event_type, EventType::DisasterUpdated);
    }

    #[tokio::test]
    async fn location_change_regeocodes_without_extraction() {
        let fx = fixture(None, false);
        let Ok(created) = fx.service.create(&owner(), flood()).await else {
            panic!("create should succeed");
        };
        let patch = DisasterPatch {
            location_name: Some("Queens".to_string()),
            ..DisasterPatch::default()
        };
        let Ok(updated) = fx.service.update(created.disaster.id, patch, &owner()).await else {
            panic!("update should succeed");
        };
        assert_eq!(updated.location_name.as_deref(), Some("Queens"));
        assert!(updated.resolved_coordinates.is_none());
        let Some(entry) = updated.audit_trail.last() else {
            panic!("expected update entry");
        };
        assert_eq!(entry.detail("changes"), Some(&json!(["location_name"])));
        assert_eq!(entry.detail("geocoded"), Some(&json!(false)));
    }

    #[tokio::test]
    async fn non_owner_update_is_forbidden_and_silent() {
        let fx = fixture(None, true);
        let Ok(created) = fx.service.create(&owner(), flood()).await else {
            panic!("create should succeed");
        };
        let stranger = User::new("firefighter_jane", Role::Contributor);
        let patch = DisasterPatch {
            title: Some("Hijacked".to_string()),
            ..DisasterPatch::default()
        };
        let result = fx.service.update(created.disaster.id, patch, &stranger).await;
        assert!(matches!(result, Err(HubError::Forbidden(_))));

        let delete = fx.service.delete(created.disaster.id, &stranger).await;
        assert!(matches!(delete, Err(HubError::Forbidden(_))));

        let Ok(trail) = fx.service.audit_trail(created.disaster.id).await else {
            panic!("record should still exist");
        };
        assert_eq!(trail.len(), 1);
        assert_eq!(fx.sink.events.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn stranger_is_forbidden_before_patch_is_validated() {
        let fx = fixture(None, true);
        let Ok(created) = fx.service.create(&owner(), flood()).await else {
            panic!("create should succeed");
        };
        let id = created.disaster.id;
        let stranger = User::new("firefighter_jane", Role::Contributor);

        let empty = fx.service.update(id, DisasterPatch::default(), &stranger).await;
        assert!(matches!(empty, Err(HubError::Forbidden(_))));

        let blank_title = DisasterPatch {
            title: Some("  ".to_string()),
            ..DisasterPatch::default()
        };
        let blank = fx.service.update(id, blank_title, &stranger).await;
        assert!(matches!(blank, Err(HubError::Forbidden(_))));

        let own_empty = fx.service.update(id, DisasterPatch::default(), &owner()).await;
        assert!(matches!(own_empty, Err(HubError::Validation(_))));
    }

    #[tokio::test]
    async fn lock_entries_do_not_outlive_the_call() {
        let fx = fixture(None, true);
        let patch = || DisasterPatch {
            title: Some("x".to_string()),
            ..DisasterPatch::default()
        };
        for _ in 0..100 {
            let missing = fx.service.update(DisasterId::new(), patch(), &owner()).await;
            assert!(matches!(missing, Err(HubError::NotFound(_))));
        }
        assert!(fx.service.locks.read().await.is_empty());

        let Ok(created) = fx.service.create(&owner(), flood()).await else {
            panic!("create should succeed");
        };
        let id = created.disaster.id;
        let stranger = User::new("firefighter_jane", Role::Contributor);
        assert!(fx.service.delete(id, &stranger).await.is_err());
        assert!(fx.service.update(id, patch(), &owner()).await.is_ok());
        assert!(fx.service.delete(id, &owner()).await.is_ok());
        assert!(fx.service.locks.read().await.is_empty());
    }

    #[tokio::test]
    async fn admin_may_update_any_disaster() {
        let fx = fixture(None, true);
        let Ok(created) = fx.service.create(&owner(), flood()).await else {
            panic!("create should succeed");
        };
        let admin = User::new("reliefAdmin", Role::Admin);
        let patch = DisasterPatch {
            title: Some("Flash flood".to_string()),
            ..DisasterPatch::default()
        };
        let Ok(updated) = fx.service.update(created.disaster.id, patch, &admin).await else {
            panic!("admin update should succeed");
        };
        assert_eq!(updated.title, "Flash flood");
        assert_eq!(updated.owner_id, "citizen1");
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let fx = fixture(None, true);
        let id = DisasterId::new();
        assert!(matches!(fx.service.get(id).await, Err(HubError::NotFound(_))));
        let patch = DisasterPatch {
            title: Some("x".to_string()),
            ..DisasterPatch::default()
        };
        assert!(matches!(
            fx.service.update(id, patch, &owner()).await,
            Err(HubError::NotFound(_))
        ));
        assert!(matches!(
            fx.service.delete(id, &owner()).await,
            Err(HubError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_returns_terminated_snapshot() {
        let fx = fixture(Some("Main St"), true);
        let Ok(created) = fx.service.create(&owner(), flood()).await else {
            panic!("create should succeed");
        };
        let id = created.disaster.id;
        let Ok(snapshot) = fx.service.delete(id, &owner()).await else {
            panic!("delete should succeed");
        };
        assert!(snapshot.audit_trail.is_terminated());
        assert_eq!(snapshot.audit_trail.len(), 2);
        assert!(matches!(fx.service.get(id).await, Err(HubError::NotFound(_))));

        let events = fx.sink.events.lock().await;
        let Some(last) = events.last() else {
            panic!("expected delete event");
        };
        assert_eq!(last.event_type, EventType::DisasterDeleted);
    }

    #[tokio::test]
    async fn storage_failure_surfaces_as_unavailable() {
        let service = DisasterService::new(
            Arc::new(BrokenStorage),
            Arc::new(LocationResolver::offline()),
            Arc::new(crate::domain::NullSink),
        );
        let created = service.create(&owner(), flood()).await;
        assert!(matches!(created, Err(HubError::StorageUnavailable(_))));
        let listed = service.list(&DisasterFilter::default()).await;
        assert!(matches!(listed, Err(HubError::StorageUnavailable(_))));
        let fetched = service.get(DisasterId::new()).await;
        assert!(matches!(fetched, Err(HubError::StorageUnavailable(_))));
    }
}
