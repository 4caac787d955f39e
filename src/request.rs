//! Immutable descriptions of a single remote call.
//!
//! Per-endpoint builders assemble a [`RequestDescriptor`] and hand it to the
//! [`Dispatcher`](crate::Dispatcher). The descriptor knows nothing about how
//! it will be invoked; it only records the endpoint, the verb, the parameter
//! bindings in order, and the shape of the expected response.

use std::fmt;

use serde_json::Value;
use url::Url;

use crate::cursor::Cursor;
use crate::error::ApiError;

/// HTTP verbs used by the REST API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl Method {
    /// Upper-case verb as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Delete => "DELETE",
        }
    }

    /// POST parameters travel in a form-encoded body instead of the query string.
    pub fn carries_form_body(&self) -> bool {
        matches!(self, Method::Post)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a parameter binding ends up in the outgoing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamLocation {
    /// Substituted into a `{name}` placeholder of the path template.
    Path,
    /// Query string for GET/DELETE, form body for POST.
    Query,
}

/// One parameter binding. Optional bindings without a value are skipped
/// when the request is serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub value: Option<String>,
    pub required: bool,
    pub location: ParamLocation,
}

/// What the response body is expected to decode into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseShape {
    /// A single JSON entity.
    Single,
    /// A JSON array of entities.
    List,
    /// A cursored page whose items live under `items_key` (`ids`, `users`, `lists`).
    CursoredPage { items_key: &'static str },
    /// The body as text, uninterpreted.
    Raw,
    /// No body is expected.
    NoContent,
}

/// Immutable description of one logical call, independent of invocation mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    path_template: String,
    method: Method,
    params: Vec<Param>,
    json_body: Option<Value>,
    shape: ResponseShape,
}

impl RequestDescriptor {
    /// Starts a descriptor for `method` on `path_template`.
    ///
    /// # Parameters
    ///
    /// - `method`: HTTP verb
    /// - `path_template`: Path relative to the API root; `{name}` segments are bound with [`RequestBuilder::path`]
    ///
    /// # Example
    ///
    /// ```rust
    /// use twitter_rest::{Method, RequestDescriptor};
    ///
    /// let descriptor = RequestDescriptor::builder(Method::Get, "users/show.json")
    ///     .required("screen_name", "rustlang")
    ///     .build();
    /// assert_eq!(descriptor.method(), Method::Get);
    /// ```
    pub fn builder(method: Method, path_template: impl Into<String>) -> RequestBuilder {
        RequestBuilder {
            descriptor: RequestDescriptor {
                path_template: path_template.into(),
                method,
                params: Vec::new(),
                json_body: None,
                shape: ResponseShape::Single,
            },
        }
    }

    /// Shorthand for a GET [`builder`](Self::builder).
    pub fn get(path_template: impl Into<String>) -> RequestBuilder {
        Self::builder(Method::Get, path_template)
    }

    /// Shorthand for a POST [`builder`](Self::builder).
    pub fn post(path_template: impl Into<String>) -> RequestBuilder {
        Self::builder(Method::Post, path_template)
    }

    /// Shorthand for a DELETE [`builder`](Self::builder).
    pub fn delete(path_template: impl Into<String>) -> RequestBuilder {
        Self::builder(Method::Delete, path_template)
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path_template(&self) -> &str {
        &self.path_template
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn shape(&self) -> &ResponseShape {
        &self.shape
    }

    pub fn json_body(&self) -> Option<&Value> {
        self.json_body.as_ref()
    }

    /// Query bindings become a form body only for POSTs without a JSON body.
    fn uses_form_body(&self) -> bool {
        self.method.carries_form_body() && self.json_body.is_none()
    }

    /// Query/form bindings that carry a value, in binding order.
    ///
    /// Repeated names are kept as-is; some batch endpoints depend on it.
    pub fn query_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params
            .iter()
            .filter(|p| p.location == ParamLocation::Query)
            .filter_map(|p| p.value.as_deref().map(|v| (p.name.as_str(), v)))
    }

    /// Substitutes path bindings into the template.
    pub fn render_path(&self) -> Result<String, ApiError> {
        let mut rendered = String::with_capacity(self.path_template.len());
        let mut rest = self.path_template.as_str();

        while let Some(open) = rest.find('{') {
            rendered.push_str(&rest[..open]);
            let close = rest[open..].find('}').ok_or_else(|| {
                ApiError::InvalidRequest(format!(
                    "unterminated placeholder in path '{}'",
                    self.path_template
                ))
            })? + open;
            let name = &rest[open + 1..close];
            let value = self
                .params
                .iter()
                .find(|p| p.location == ParamLocation::Path && p.name == name)
                .and_then(|p| p.value.as_deref())
                .ok_or_else(|| {
                    ApiError::InvalidRequest(format!(
                        "path parameter '{}' is not bound for '{}'",
                        name, self.path_template
                    ))
                })?;
            rendered.push_str(&urlencoding::encode(value));
            rest = &rest[close + 1..];
        }
        rendered.push_str(rest);

        Ok(rendered)
    }

    /// Resolves the endpoint against `base_url`, appending query bindings
    /// for GET/DELETE.
    pub fn url(&self, base_url: &Url) -> Result<Url, ApiError> {
        let path = self.render_path()?;
        let mut base = base_url.clone();
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        let mut url = base.join(path.trim_start_matches('/')).map_err(|e| {
            ApiError::InvalidRequest(format!("cannot resolve '{}': {}", path, e))
        })?;

        if !self.uses_form_body() {
            let mut pairs = self.query_pairs().peekable();
            if pairs.peek().is_some() {
                url.query_pairs_mut().extend_pairs(pairs);
            }
        }

        Ok(url)
    }

    /// Content type and encoded body, if the request carries one.
    pub fn body(&self) -> Result<Option<(&'static str, String)>, ApiError> {
        if let Some(json) = &self.json_body {
            return Ok(Some(("application/json", json.to_string())));
        }
        if !self.uses_form_body() {
            return Ok(None);
        }
        let pairs: Vec<(&str, &str)> = self.query_pairs().collect();
        serde_urlencoded::to_string(&pairs)
            .map(|body| Some(("application/x-www-form-urlencoded", body)))
            .map_err(|e| ApiError::InvalidRequest(format!("cannot encode form body: {}", e)))
    }
}

/// Accumulates bindings for a [`RequestDescriptor`].
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    descriptor: RequestDescriptor,
}

impl RequestBuilder {
    /// Binds a `{name}` placeholder of the path template.
    pub fn path(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.descriptor.params.push(Param {
            name: name.into(),
            value: Some(value.to_string()),
            required: true,
            location: ParamLocation::Path,
        });
        self
    }

    /// Binds a query (or form) parameter that is always sent.
    pub fn required(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.descriptor.params.push(Param {
            name: name.into(),
            value: Some(value.to_string()),
            required: true,
            location: ParamLocation::Query,
        });
        self
    }

    /// Binds a parameter that is skipped when `value` is `None`.
    pub fn optional<V: ToString>(mut self, name: impl Into<String>, value: Option<V>) -> Self {
        self.descriptor.params.push(Param {
            name: name.into(),
            value: value.map(|v| v.to_string()),
            required: false,
            location: ParamLocation::Query,
        });
        self
    }

    /// Binds the same name once per value, preserving order.
    pub fn repeated<V: ToString>(
        mut self,
        name: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        for value in values {
            self = self.required(name, value);
        }
        self
    }

    /// Binds the `cursor` parameter.
    pub fn cursor(self, cursor: Cursor) -> Self {
        self.required("cursor", cursor.to_param())
    }

    /// Sends `body` as JSON; query bindings then stay in the query string.
    pub fn json(mut self, body: Value) -> Self {
        self.descriptor.json_body = Some(body);
        self
    }

    pub fn shape(mut self, shape: ResponseShape) -> Self {
        self.descriptor.shape = shape;
        self
    }

    pub fn cursored(self, items_key: &'static str) -> Self {
        self.shape(ResponseShape::CursoredPage { items_key })
    }

    /// Freezes the bindings into a descriptor.
    pub fn build(self) -> RequestDescriptor {
        self.descriptor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://api.twitter.com/1.1").unwrap()
    }

    #[test]
    fn query_keeps_order_and_duplicates() {
        let descriptor = RequestDescriptor::get("users/lookup.json")
            .repeated("user_id", [1, 2, 3])
            .optional("include_entities", None::<bool>)
            .shape(ResponseShape::List)
            .build();

        let url = descriptor.url(&base()).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.twitter.com/1.1/users/lookup.json?user_id=1&user_id=2&user_id=3"
        );
    }

    #[test]
    fn post_parameters_go_to_form_body() {
        let descriptor = RequestDescriptor::post("friendships/create.json")
            .required("screen_name", "rustlang")
            .optional("follow", Some(true))
            .build();

        assert_eq!(
            descriptor.url(&base()).unwrap().as_str(),
            "https://api.twitter.com/1.1/friendships/create.json"
        );
        assert_eq!(
            descriptor.body().unwrap(),
            Some((
                "application/x-www-form-urlencoded",
                "screen_name=rustlang&follow=true".to_string()
            ))
        );
    }

    #[test]
    fn json_body_keeps_query_in_url() {
        let descriptor = RequestDescriptor::post("direct_messages/events/new.json")
            .required("include_entities", false)
            .json(serde_json::json!({"event": {"type": "message_create"}}))
            .build();

        assert_eq!(
            descriptor.url(&base()).unwrap().query(),
            Some("include_entities=false")
        );
        let (content_type, body) = descriptor.body().unwrap().unwrap();
        assert_eq!(content_type, "application/json");
        assert_eq!(body, r#"{"event":{"type":"message_create"}}"#);
    }

    #[test]
    fn path_placeholders_are_encoded() {
        let descriptor = RequestDescriptor::get("geo/id/{place_id}.json")
            .path("place_id", "df51dec6f4ee2b2c")
            .build();
        assert_eq!(descriptor.render_path().unwrap(), "geo/id/df51dec6f4ee2b2c.json");

        let spaced = RequestDescriptor::get("lists/{slug}.json")
            .path("slug", "a b")
            .build();
        assert_eq!(spaced.render_path().unwrap(), "lists/a%20b.json");
    }

    #[test]
    fn unbound_placeholder_is_rejected() {
        let descriptor = RequestDescriptor::get("geo/id/{place_id}.json").build();
        assert!(matches!(
            descriptor.render_path(),
            Err(ApiError::InvalidRequest(_))
        ));
    }
}
