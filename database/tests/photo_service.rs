use std::path::PathBuf;

use database::{
    consts::consts::EntityId,
    database::{database::Database, options::DatabaseOptions},
    persistence::storage::StorageEngine,
    service::{error::ServiceError, photo::PhotoService},
};

#[test]
fn photos_are_stored_beside_the_database() {
    let path = PathBuf::from(format!("/tmp/peopledb/{}", uuid::Uuid::new_v4()));
    let options = DatabaseOptions::default().set_storage_engine(StorageEngine::File(path));

    // Given a photo stored through the database's storage engine
    let database = Database::new(options.clone()).unwrap();
    let id = PhotoService::new(database.blob_storage())
        .store("portrait.jpg", vec![0xff, 0xd8, 0xff])
        .unwrap();

    // When the storage is opened again
    let reopened = Database::new(options).unwrap();
    let photo = PhotoService::new(reopened.blob_storage())
        .retrieve(&id)
        .unwrap();

    // Then the bytes and title are intact
    assert_eq!(photo.title, "portrait.jpg");
    assert_eq!(photo.data, vec![0xff, 0xd8, 0xff]);
}

#[test]
fn missing_photo_is_not_found() {
    let database = Database::new_test();
    let service = PhotoService::new(database.blob_storage());

    assert!(matches!(
        service.retrieve(&EntityId::new()),
        Err(ServiceError::NotFound(_))
    ));
}
