//! Shared mocks for unit tests

use async_trait::async_trait;
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::remote::{
    ChildQuery, ObjectField, ObjectKind, ObjectPage, RemoteObject, RemoteStore,
};
use mockall::mock;
use std::path::Path;

mock! {
    pub Store {}

    #[async_trait]
    impl RemoteStore for Store {
        async fn list_children(&self, query: &ChildQuery, page_token: Option<String>) -> BridgeResult<ObjectPage>;
        async fn get_object(&self, id: &str, fields: &[ObjectField]) -> BridgeResult<RemoteObject>;
        async fn create_object(&self, name: &str, kind: ObjectKind, parent_id: Option<String>) -> BridgeResult<String>;
        fn supports_create_with_parent(&self) -> bool;
        async fn update_parents(&self, id: &str, add_parent: &str, remove_parents: &[String]) -> BridgeResult<()>;
        async fn rename_object(&self, id: &str, new_name: &str) -> BridgeResult<()>;
        async fn delete_object(&self, id: &str) -> BridgeResult<()>;
        async fn upload_content(&self, local_path: &Path, name: &str, mime_type: &str, parent_id: Option<String>) -> BridgeResult<String>;
        async fn copy_object(&self, id: &str) -> BridgeResult<String>;
    }
}

pub fn page(objects: Vec<RemoteObject>, next: Option<&str>) -> BridgeResult<ObjectPage> {
    Ok(ObjectPage {
        objects,
        next_page_token: next.map(String::from),
    })
}

pub fn folder(id: &str, name: &str) -> RemoteObject {
    RemoteObject::new(id, name, ObjectKind::Folder)
}
