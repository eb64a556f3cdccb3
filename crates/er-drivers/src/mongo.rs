//! # MongoDB Store
//!
//! Reads events from the collection layout used by Eiffel event senders:
//! one collection per event type inside the database named by the
//! connection URL. Documents are returned as relaxed extended JSON.

use crate::document::{DocumentDatabase, DocumentStore};
use crate::plan::FilterPlan;
use er_core::{ConnectionUrl, Database, Driver, Error, Event, Result};
use futures_util::TryStreamExt;
use mongodb::bson::{self, doc, Bson, Document};
use mongodb::options::ClientOptions;
use mongodb::Client;
use serde_json::Value;

pub struct MongoDriver;

#[async_trait::async_trait]
impl Driver for MongoDriver {
    fn name(&self) -> &'static str {
        "mongodb"
    }

    fn supports_scheme(&self, scheme: &str) -> bool {
        matches!(scheme, "mongodb" | "mongodb+srv")
    }

    async fn get(&self, url: &ConnectionUrl, span: tracing::Span) -> Result<Box<dyn Database>> {
        let store = MongoStore::open(url).await?;
        Ok(Box::new(DocumentDatabase::connect(store, span).await?))
    }
}

pub struct MongoStore {
    client: Client,
    database: mongodb::Database,
}

impl MongoStore {
    pub async fn open(url: &ConnectionUrl) -> Result<Self> {
        let name = url.database()?;
        let options = ClientOptions::parse(url.as_str())
            .await
            .map_err(Error::connection)?;
        let client = Client::with_options(options).map_err(Error::connection)?;
        let database = client.database(name);
        Ok(Self { client, database })
    }
}

fn filter_document(plan: &FilterPlan) -> Result<Document> {
    bson::to_document(&plan.to_document()).map_err(Error::backend)
}

fn into_event(document: Document) -> Result<Event> {
    match Bson::Document(document).into_relaxed_extjson() {
        Value::Object(event) => Ok(event),
        other => Err(Error::backend(format!("expected a document, got {other}"))),
    }
}

#[async_trait::async_trait]
impl DocumentStore for MongoStore {
    async fn ping(&self) -> Result<()> {
        self.database
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map(|_| ())
            .map_err(Error::connection)
    }

    async fn list_collections(&self) -> Result<Vec<String>> {
        self.database
            .list_collection_names(None)
            .await
            .map_err(Error::backend)
    }

    async fn find(&self, collection: &str, filter: &FilterPlan) -> Result<Vec<Event>> {
        let cursor = self
            .database
            .collection::<Document>(collection)
            .find(filter_document(filter)?, None)
            .await
            .map_err(Error::backend)?;
        let documents: Vec<Document> = cursor.try_collect().await.map_err(Error::backend)?;
        documents.into_iter().map(into_event).collect()
    }

    async fn find_one(&self, collection: &str, filter: &FilterPlan) -> Result<Option<Event>> {
        self.database
            .collection::<Document>(collection)
            .find_one(filter_document(filter)?, None)
            .await
            .map_err(Error::backend)?
            .map(into_event)
            .transpose()
    }

    async fn shutdown(&self) -> Result<()> {
        self.client.clone().shutdown().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use er_core::{Operator, Params};

    #[test]
    fn test_supported_schemes() {
        assert!(MongoDriver.supports_scheme("mongodb"));
        assert!(MongoDriver.supports_scheme("mongodb+srv"));
        assert!(!MongoDriver.supports_scheme("memory"));
    }

    #[test]
    fn test_filter_document() {
        let mut params = Params::new();
        params.add(Operator::Eq, "meta.type", "EiffelActivityTriggeredEvent");
        params.add(Operator::Gt, "meta.time", "5");
        let document = filter_document(&FilterPlan::build(&params)).unwrap();
        assert_eq!(
            document,
            doc! {
                "meta.time": { "$gt": "5" },
                "meta.type": { "$eq": "EiffelActivityTriggeredEvent" },
            }
        );
    }

    #[test]
    fn test_into_event() {
        let event = into_event(doc! { "meta": { "id": "x", "time": 5_i64 } }).unwrap();
        assert_eq!(
            Value::Object(event),
            serde_json::json!({ "meta": { "id": "x", "time": 5 } })
        );
    }
}
