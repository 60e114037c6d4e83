//! Registry and search integration tests
//!
//! City registry, connection registry and route search against a file-backed
//! SQLite database, with in-memory or failing fakes for the object store and
//! image generator.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use airfare::database::{establish_connection, get_database_url, setup_database};
use airfare::errors::AirfareError;
use airfare::imagegen::{DisabledImageGenerator, ImageGenError, ImageGenerator};
use airfare::services::{
    CityService, ConnectionService, CreateConnection, ImageUpload, SearchOutcome, SearchService,
    SortPreference, UpdateConnection, NO_CONNECTIONS_FOUND, NO_IMAGE_AVAILABLE,
};
use airfare::storage::{InMemoryObjectStore, ObjectStore, StorageError};
use anyhow::Result;
use async_trait::async_trait;
use tempfile::TempDir;

struct Registry {
    cities: CityService,
    connections: ConnectionService,
    search: SearchService,
    store: InMemoryObjectStore,
    _dir: TempDir,
}

async fn setup_registry(
    store: Option<Arc<dyn ObjectStore>>,
    generator: Arc<dyn ImageGenerator>,
) -> Result<Registry> {
    let dir = TempDir::new()?;
    let path = dir.path().join("airfare.db");
    let db = establish_connection(&get_database_url(path.to_str())).await?;
    setup_database(&db).await?;

    let memory = InMemoryObjectStore::default();
    let store = store.unwrap_or_else(|| Arc::new(memory.clone()));
    let cities = CityService::new(db.clone(), store, generator);
    let connections = ConnectionService::new(db.clone(), cities.clone());
    let search = SearchService::new(db);

    Ok(Registry {
        cities,
        connections,
        search,
        store: memory,
        _dir: dir,
    })
}

async fn default_registry() -> Result<Registry> {
    setup_registry(None, Arc::new(DisabledImageGenerator)).await
}

/// Store whose every call fails.
struct FailingStore;

#[async_trait]
impl ObjectStore for FailingStore {
    async fn upload(&self, _: Vec<u8>, _: &str, _: &str) -> Result<String, StorageError> {
        Err(StorageError::Backend("bucket unavailable".to_string()))
    }

    async fn delete(&self, _: &str) -> Result<(), StorageError> {
        Err(StorageError::Backend("bucket unavailable".to_string()))
    }
}

/// Generator returning a fixed URL per city and counting calls.
#[derive(Default)]
struct FixedGenerator {
    calls: AtomicUsize,
}

#[async_trait]
impl ImageGenerator for FixedGenerator {
    async fn generate(&self, city_name: &str, city_id: i32) -> Result<Option<String>, ImageGenError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Some(format!(
            "https://images.test/city-images/{city_id}-{city_name}.png"
        )))
    }
}

struct FailingGenerator;

#[async_trait]
impl ImageGenerator for FailingGenerator {
    async fn generate(&self, _: &str, _: i32) -> Result<Option<String>, ImageGenError> {
        Err(ImageGenError::Status {
            status: 503,
            body: "model overloaded".to_string(),
        })
    }
}

fn connection(from: &str, to: &str, airfare: f64, duration: f64) -> CreateConnection {
    CreateConnection {
        from_city: from.to_string(),
        to_city: to.to_string(),
        airfare,
        duration,
    }
}

fn png(name: &str) -> ImageUpload {
    ImageUpload {
        file_name: name.to_string(),
        content_type: "image/png".to_string(),
        bytes: vec![0x89, 0x50, 0x4e, 0x47],
    }
}

#[tokio::test]
async fn test_duplicate_city_conflicts_regardless_of_casing() -> Result<()> {
    let registry = default_registry().await?;

    let city = registry.cities.create_city("mumbai", None).await?;
    assert_eq!(city.name, "Mumbai");

    let err = registry.cities.create_city("MUMBAI", None).await.unwrap_err();
    assert!(matches!(&err, AirfareError::Conflict(msg) if msg == "City with this name already exists."));
    assert_eq!(err.http_status_code(), 409);

    assert_eq!(registry.cities.list_cities().await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_blank_city_name_rejected() -> Result<()> {
    let registry = default_registry().await?;

    let err = registry.cities.create_city("   ", None).await.unwrap_err();
    assert!(matches!(err, AirfareError::Validation(msg) if msg == "City name is required."));
    assert!(registry.cities.list_cities().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_unknown_ids_are_not_found() -> Result<()> {
    let registry = default_registry().await?;

    let err = registry.cities.get_city(7).await.unwrap_err();
    assert_eq!(err.to_string(), "City with ID 7 not found.");
    assert!(registry.cities.delete_city(7).await.unwrap_err().is_not_found());
    assert!(registry
        .cities
        .update_city(7, Some("Pune"), None)
        .await
        .unwrap_err()
        .is_not_found());

    let err = registry.connections.get_connection(3).await.unwrap_err();
    assert_eq!(err.to_string(), "Connection with ID 3 not found.");
    assert!(registry.connections.delete_connection(3).await.unwrap_err().is_not_found());
    Ok(())
}

#[tokio::test]
async fn test_connection_creates_missing_cities() -> Result<()> {
    let generator = Arc::new(FixedGenerator::default());
    let registry = setup_registry(None, generator.clone()).await?;

    let created = registry
        .connections
        .create_connection(connection(" pune", "DELHI ", 4500.0, 2.5))
        .await?;
    assert_eq!(created.from_city, "Pune");
    assert_eq!(created.to_city, "Delhi");

    let cities = registry.cities.list_cities().await?;
    let names: Vec<_> = cities.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Delhi", "Pune"]);
    assert!(cities.iter().all(|c| c.image_url.is_some()));
    assert_eq!(generator.calls.load(Ordering::SeqCst), 2);

    // Both endpoints now exist, so no further generation happens.
    registry
        .connections
        .create_connection(connection("Delhi", "pune", 4200.0, 2.4))
        .await?;
    assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
    assert_eq!(registry.cities.list_cities().await?.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_connection_reuses_explicitly_created_city() -> Result<()> {
    let registry = default_registry().await?;
    let goa = registry.cities.create_city("Goa", None).await?;

    registry
        .connections
        .create_connection(connection("goa", "Kochi", 3000.0, 1.5))
        .await?;

    let cities = registry.cities.list_cities().await?;
    assert_eq!(cities.len(), 2);
    assert_eq!(registry.cities.find_city_by_name("GOA").await?.map(|c| c.id), Some(goa.id));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_implicit_creates_leave_one_city() -> Result<()> {
    let registry = default_registry().await?;

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let cities = registry.cities.clone();
        tasks.push(tokio::spawn(async move {
            cities.ensure_city_exists("racecity").await
        }));
    }

    let mut created = 0;
    for task in tasks {
        match task.await? {
            Ok(city) => {
                assert_eq!(city.name, "Racecity");
                created += 1;
            }
            Err(AirfareError::Conflict(msg)) => {
                assert_eq!(msg, "City with this name already exists.");
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert!(created >= 1);
    let cities = registry.cities.list_cities().await?;
    assert_eq!(cities.len(), 1);
    assert_eq!(cities[0].name, "Racecity");
    Ok(())
}

#[tokio::test]
async fn test_generator_failure_fails_connection_create() -> Result<()> {
    let registry = setup_registry(None, Arc::new(FailingGenerator)).await?;

    let err = registry
        .connections
        .create_connection(connection("Surat", "Nagpur", 3100.0, 2.0))
        .await
        .unwrap_err();
    assert!(matches!(&err, AirfareError::ExternalService(msg) if msg.contains("Surat")));
    assert_eq!(err.http_status_code(), 502);
    assert!(registry.connections.list_connections().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_connection_validation() -> Result<()> {
    let registry = default_registry().await?;

    for (airfare, duration) in [(0.0, 2.0), (-10.0, 2.0), (100.0, 0.0), (12.345, 2.0), (100.0, 2.25)] {
        let err = registry
            .connections
            .create_connection(connection("Pune", "Goa", airfare, duration))
            .await
            .unwrap_err();
        assert!(matches!(err, AirfareError::Validation(_)), "{airfare} / {duration}");
    }

    let err = registry
        .connections
        .create_connection(connection("  ", "Goa", 100.0, 1.0))
        .await
        .unwrap_err();
    assert!(matches!(err, AirfareError::Validation(msg) if msg == "fromCity is required."));

    // Nothing was created along the way.
    assert!(registry.cities.list_cities().await?.is_empty());
    assert!(registry.connections.list_connections().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_update_connection_normalizes_and_validates() -> Result<()> {
    let registry = default_registry().await?;
    let created = registry
        .connections
        .create_connection(connection("Pune", "Delhi", 4500.0, 2.5))
        .await?;

    let updated = registry
        .connections
        .update_connection(
            created.id,
            UpdateConnection {
                to_city: Some("  jaipur ".to_string()),
                airfare: Some(3999.99),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(updated.from_city, "Pune");
    assert_eq!(updated.to_city, "Jaipur");
    assert_eq!(updated.airfare, 3999.99);
    assert_eq!(updated.duration, 2.5);
    assert!(registry.cities.find_city_by_name("Jaipur").await?.is_some());

    let err = registry
        .connections
        .update_connection(
            created.id,
            UpdateConnection {
                duration: Some(-1.0),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AirfareError::Validation(_)));

    let unchanged = registry
        .connections
        .update_connection(created.id, UpdateConnection::default())
        .await?;
    assert_eq!(unchanged, updated);
    Ok(())
}

#[tokio::test]
async fn test_delete_connection_returns_row() -> Result<()> {
    let registry = default_registry().await?;
    let created = registry
        .connections
        .create_connection(connection("Pune", "Delhi", 4500.0, 2.5))
        .await?;

    let deleted = registry.connections.delete_connection(created.id).await?;
    assert_eq!(deleted, created);
    assert!(registry.connections.list_connections().await?.is_empty());
    // Cities stay behind.
    assert_eq!(registry.cities.list_cities().await?.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_rename_cascades_to_connections() -> Result<()> {
    let registry = default_registry().await?;
    registry
        .connections
        .create_connection(connection("Pune", "Delhi", 4500.0, 2.5))
        .await?;
    registry
        .connections
        .create_connection(connection("Goa", "Pune", 3000.0, 1.5))
        .await?;
    let pune = registry.cities.find_city_by_name("Pune").await?.expect("Pune exists");

    let renamed = registry.cities.update_city(pune.id, Some("mumbai"), None).await?;
    assert_eq!(renamed.name, "Mumbai");
    assert_eq!(renamed.id, pune.id);

    let connections = registry.connections.list_connections().await?;
    assert!(connections.iter().all(|c| c.from_city != "Pune" && c.to_city != "Pune"));
    assert!(connections.iter().any(|c| c.from_city == "Mumbai" && c.to_city == "Delhi"));
    assert!(connections.iter().any(|c| c.from_city == "Goa" && c.to_city == "Mumbai"));

    let outcome = registry
        .search
        .search("mumbai", "delhi", SortPreference::Fastest)
        .await?;
    assert!(outcome.is_found());
    Ok(())
}

#[tokio::test]
async fn test_rename_to_taken_name_conflicts() -> Result<()> {
    let registry = default_registry().await?;
    registry.cities.create_city("Pune", None).await?;
    let delhi = registry.cities.create_city("Delhi", None).await?;

    let err = registry
        .cities
        .update_city(delhi.id, Some("PUNE"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AirfareError::Conflict(_)));

    let err = registry
        .cities
        .update_city(delhi.id, Some("  "), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AirfareError::Validation(msg) if msg == "City name cannot be empty."));

    // Renaming to its own name in another casing is allowed.
    let same = registry.cities.update_city(delhi.id, Some("dELHI"), None).await?;
    assert_eq!(same.name, "Delhi");
    Ok(())
}

#[tokio::test]
async fn test_delete_city_cascades() -> Result<()> {
    let registry = default_registry().await?;
    let pune = registry.cities.create_city("Pune", Some(png("pune.png"))).await?;
    assert_eq!(registry.store.keys().len(), 1);

    registry
        .connections
        .create_connection(connection("Pune", "Delhi", 4500.0, 2.5))
        .await?;
    registry
        .connections
        .create_connection(connection("Goa", "pune", 3000.0, 1.5))
        .await?;
    registry
        .connections
        .create_connection(connection("Goa", "Delhi", 5000.0, 2.0))
        .await?;

    let message = registry.cities.delete_city(pune.id).await?;
    assert_eq!(message, "City 'Pune' and all associated data deleted.");

    let remaining = registry.connections.list_connections().await?;
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].from_city, "Goa");
    assert_eq!(remaining[0].to_city, "Delhi");
    assert!(registry.store.keys().is_empty());
    assert!(registry.cities.find_city_by_name("Pune").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_image_failure_is_best_effort_on_create() -> Result<()> {
    let registry = setup_registry(Some(Arc::new(FailingStore)), Arc::new(DisabledImageGenerator)).await?;

    let city = registry.cities.create_city("Indore", Some(png("indore.png"))).await?;
    assert_eq!(city.name, "Indore");
    assert!(city.image_url.is_none());
    Ok(())
}

#[tokio::test]
async fn test_image_failure_fails_update() -> Result<()> {
    let registry = setup_registry(Some(Arc::new(FailingStore)), Arc::new(DisabledImageGenerator)).await?;
    let city = registry.cities.create_city("Indore", None).await?;

    let err = registry
        .cities
        .update_city(city.id, Some("Bhopal"), Some(png("bhopal.png")))
        .await
        .unwrap_err();
    assert!(matches!(err, AirfareError::Validation(msg) if msg == "Failed to update city image"));

    // The rename did not go through either.
    assert_eq!(registry.cities.get_city(city.id).await?.name, "Indore");
    Ok(())
}

#[tokio::test]
async fn test_image_delete_failure_does_not_block_city_delete() -> Result<()> {
    let registry = setup_registry(Some(Arc::new(FailingStore)), Arc::new(FixedGenerator::default())).await?;
    registry
        .connections
        .create_connection(connection("Pune", "Delhi", 4500.0, 2.5))
        .await?;
    let pune = registry.cities.find_city_by_name("Pune").await?.expect("Pune exists");
    assert!(pune.image_url.is_some());

    registry.cities.delete_city(pune.id).await?;
    assert!(registry.connections.list_connections().await?.is_empty());
    assert_eq!(registry.cities.list_cities().await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_search_orders_by_preference() -> Result<()> {
    let registry = default_registry().await?;
    registry
        .connections
        .create_connection(connection("Mumbai", "Delhi", 5000.0, 2.0))
        .await?;
    registry
        .connections
        .create_connection(connection("Mumbai", "Delhi", 3000.0, 3.5))
        .await?;
    registry
        .connections
        .create_connection(connection("Mumbai", "Delhi", 4000.0, 1.5))
        .await?;
    registry
        .connections
        .create_connection(connection("Delhi", "Mumbai", 1000.0, 1.0))
        .await?;

    let SearchOutcome::Found(cheapest) = registry
        .search
        .search("mumbai", "DELHI", SortPreference::from_keyword(Some("cheapest")))
        .await?
    else {
        panic!("expected connections");
    };
    let fares: Vec<f64> = cheapest.connections.iter().map(|c| c.airfare).collect();
    assert_eq!(fares, vec![3000.0, 4000.0, 5000.0]);

    let SearchOutcome::Found(fastest) = registry
        .search
        .search("Mumbai", "Delhi", SortPreference::from_keyword(Some("anything")))
        .await?
    else {
        panic!("expected connections");
    };
    let durations: Vec<f64> = fastest.connections.iter().map(|c| c.duration).collect();
    assert_eq!(durations, vec![1.5, 2.0, 3.5]);
    Ok(())
}

#[tokio::test]
async fn test_search_reports_city_images() -> Result<()> {
    let registry = default_registry().await?;
    registry.cities.create_city("Mumbai", Some(png("gateway.png"))).await?;
    registry
        .connections
        .create_connection(connection("Mumbai", "Delhi", 5000.0, 2.0))
        .await?;

    let SearchOutcome::Found(found) = registry
        .search
        .search("mumbai", "DELHI", SortPreference::Fastest)
        .await?
    else {
        panic!("expected connections");
    };
    assert_eq!(found.connections.len(), 1);
    assert!(found.from_city_image.starts_with("memory://objects/city-images/"));
    assert_eq!(found.to_city_image, NO_IMAGE_AVAILABLE);

    let value = serde_json::to_value(SearchOutcome::Found(found))?;
    assert!(value["connections"].is_array());
    assert!(value["fromCityImage"].is_string());
    assert!(value.get("message").is_none());
    Ok(())
}

#[tokio::test]
async fn test_search_without_matches_returns_message() -> Result<()> {
    let registry = default_registry().await?;
    registry
        .connections
        .create_connection(connection("Mumbai", "Delhi", 5000.0, 2.0))
        .await?;

    let outcome = registry
        .search
        .search("Delhi", "Mumbai", SortPreference::Cheapest)
        .await?;
    assert_eq!(
        outcome,
        SearchOutcome::NoConnections {
            message: NO_CONNECTIONS_FOUND.to_string()
        }
    );

    let outcome = registry
        .search
        .search("Atlantis", "Delhi", SortPreference::Fastest)
        .await?;
    assert!(!outcome.is_found());
    Ok(())
}
