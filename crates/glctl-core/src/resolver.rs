//! Name-to-resource resolution
//!
//! Turns a human name (within a region) into a [`ResourceHandle`] with one filtered
//! list read. "Not found" is `Ok(None)`; a failing read is a
//! [`CoreError::Resolution`], which aborts the batch.

use std::ops::Deref;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::{CoreError, Result};
use crate::http::ApiRequest;
use crate::session::SessionContext;

/// Which API a resource lives behind
///
/// The two families have separate role models, which matters for the
/// permission-denied remediation text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiFamily {
    /// Global platform API
    Platform,
    /// Regional compute-management API
    Regional,
}

/// A remote resource type addressable by name
pub trait Resource: DeserializeOwned {
    /// Label used in messages, e.g. "Webhook"
    const KIND: &'static str;

    const FAMILY: ApiFamily;

    /// Field the server-side name filter applies to
    const NAME_FIELD: &'static str = "name";

    fn id(&self) -> &str;

    fn name(&self) -> &str;

    /// Region carried by the resource itself, for platform-wide collections
    fn region(&self) -> Option<&str> {
        None
    }

    /// Collection URL for `region`
    fn collection_url(session: &SessionContext, region: &str) -> Result<String>;
}

/// A resolved resource together with the region it was found in
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceHandle<T> {
    region: String,
    resource: T,
}

impl<T: Resource> ResourceHandle<T> {
    pub fn new(region: impl Into<String>, resource: T) -> Self {
        Self {
            region: region.into(),
            resource,
        }
    }

    pub fn id(&self) -> &str {
        self.resource.id()
    }

    pub fn name(&self) -> &str {
        self.resource.name()
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn into_inner(self) -> T {
        self.resource
    }

    /// URL of this item within its collection
    pub fn item_url(&self, session: &SessionContext) -> Result<String> {
        Ok(format!(
            "{}/{}",
            T::collection_url(session, &self.region)?,
            self.id()
        ))
    }
}

impl<T> Deref for ResourceHandle<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.resource
    }
}

/// Quote a value as an OData string literal
pub fn odata_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// `<field> eq '<value>'`
pub fn eq_filter(field: &str, value: &str) -> String {
    format!("{} eq {}", field, odata_literal(value))
}

/// Append query parameters to a URL
pub fn with_query(url: &str, pairs: &[(&str, &str)]) -> Result<String> {
    let mut url = Url::parse(url)?;
    {
        let mut query = url.query_pairs_mut();
        for (key, value) in pairs {
            query.append_pair(key, value);
        }
    }
    Ok(url.into())
}

/// Placeholder rendered in dry-run URLs where an id would be resolved
pub fn placeholder_id(kind: &str, name: &str) -> String {
    format!("<{}-id:{}>", kind.to_lowercase().replace(' ', "-"), name)
}

/// Item URL for a resolved target, or a placeholder URL when there is none
pub fn target_url<T: Resource>(
    session: &SessionContext,
    region: &str,
    name: &str,
    target: Option<&ResourceHandle<T>>,
) -> Result<String> {
    match target {
        Some(handle) => handle.item_url(session),
        None => Ok(format!(
            "{}/{}",
            T::collection_url(session, region)?,
            placeholder_id(T::KIND, name)
        )),
    }
}

/// GET a collection and decode its items
///
/// Accepts both the `{"items": [...]}` envelope and a bare array.
pub async fn fetch_items<T: DeserializeOwned>(session: &SessionContext, url: &str) -> Result<Vec<T>> {
    let response = session.client().invoke(&ApiRequest::get(url), false).await?;
    let body = response.map(|r| r.body).unwrap_or(Value::Null);

    let items = match body {
        Value::Object(mut map) => map.remove("items").unwrap_or(Value::Array(Vec::new())),
        Value::Array(_) => body,
        _ => Value::Array(Vec::new()),
    };

    Ok(serde_json::from_value(items)?)
}

/// Look up a resource by exact, case-sensitive name within `region`
pub async fn resolve<T: Resource>(
    session: &SessionContext,
    region: &str,
    name: &str,
) -> Result<Option<ResourceHandle<T>>> {
    let base = T::collection_url(session, region)?;
    let url = with_query(&base, &[("filter", &eq_filter(T::NAME_FIELD, name))])?;

    let items: Vec<T> = fetch_items(session, &url)
        .await
        .map_err(|e| CoreError::resolution(format!("{} '{}'", T::KIND, name), e))?;

    let found = items.into_iter().find(|item| {
        item.name() == name && item.region().is_none_or(|r| r == region)
    });

    debug!(
        "{} '{}' in region '{}': {}",
        T::KIND,
        name,
        region,
        if found.is_some() { "found" } else { "not found" }
    );

    Ok(found.map(|resource| ResourceHandle::new(region, resource)))
}

/// All resources of a collection
pub async fn list<T: Resource>(session: &SessionContext, region: &str) -> Result<Vec<T>> {
    let url = T::collection_url(session, region)?;
    fetch_items(session, &url).await
}
